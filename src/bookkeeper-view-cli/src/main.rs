// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bookkeeper_view::diagram::{PngRenderOpts, render_png};
use bookkeeper_view::{LayoutConfig, ViewConfig};

mod trace;

use trace::{load_trace, replay};

#[derive(Parser, Debug)]
#[command(name = "bkview", version, about = "Replay BookKeeper model traces as diagrams")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write one SVG per trace frame
    Render {
        /// JSON array of {clock, changes, vars} frames
        trace: PathBuf,
        /// JSON layout overrides; unset fields keep their defaults
        #[arg(long)]
        layout: Option<PathBuf>,
        /// Model function computing a writer's last-add-confirmed
        #[arg(long)]
        ack_function: Option<String>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Only write this frame (0-based)
        #[arg(long)]
        frame: Option<usize>,
        /// Also rasterize each frame to PNG at this pixel width
        #[arg(long)]
        png_width: Option<u32>,
    },
    /// Print a client's context menu at a frame
    Menu {
        trace: PathBuf,
        #[arg(long)]
        frame: usize,
        #[arg(long)]
        client: u32,
    },
    /// Print JSON schemas for the model variables a trace frame carries
    Schema,
}

fn load_config(layout: Option<&Path>, ack_function: Option<String>) -> Result<ViewConfig> {
    let mut config = ViewConfig::default();
    if let Some(path) = layout {
        let contents =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let layout: LayoutConfig = serde_json::from_str(&contents)
            .with_context(|| format!("parsing layout {}", path.display()))?;
        layout
            .validate()
            .with_context(|| format!("invalid layout {}", path.display()))?;
        config.layout = layout;
    }
    if let Some(function) = ack_function {
        config.ack_function = function;
    }
    Ok(config)
}

fn render(
    trace: &Path,
    config: &ViewConfig,
    out_dir: &Path,
    only: Option<usize>,
    png_width: Option<u32>,
) -> Result<()> {
    let frames = load_trace(trace)?;
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut written = 0;
    replay(&frames, config, only, |index, view| {
        if only.is_some_and(|n| n != index) {
            return Ok(());
        }
        let path = out_dir.join(format!("frame-{:04}.svg", index));
        fs::write(&path, view.render_svg())
            .with_context(|| format!("writing {}", path.display()))?;
        if let Some(width) = png_width {
            let opts = PngRenderOpts { width: Some(width) };
            let png = render_png(view.scene(), &view.layout(), &opts)?;
            let path = path.with_extension("png");
            fs::write(&path, png).with_context(|| format!("writing {}", path.display()))?;
        }
        written += 1;
        Ok(())
    })?;

    info!(frames = written, out_dir = %out_dir.display(), "rendered");
    Ok(())
}

fn write_menu(out: &mut impl Write, trace: &Path, frame: usize, client: u32) -> Result<()> {
    let frames = load_trace(trace)?;
    let mut entries = Vec::new();
    replay(&frames, &ViewConfig::default(), Some(frame), |index, view| {
        if index == frame {
            entries = view.context_menu(client)?;
        }
        Ok(())
    })?;

    for entry in entries {
        let args = serde_json::to_string(&entry.command.args())?;
        writeln!(out, "{}\t{}\t{}", entry.command.identifier(), args, entry.label)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            trace,
            layout,
            ack_function,
            out_dir,
            frame,
            png_width,
        } => {
            let config = load_config(layout.as_deref(), ack_function)?;
            render(&trace, &config, &out_dir, frame, png_width)
        }
        Commands::Menu {
            trace,
            frame,
            client,
        } => write_menu(&mut io::stdout().lock(), &trace, frame, client),
        Commands::Schema => {
            let schemas = bookkeeper_view::datamodel::variable_schemas();
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            Ok(())
        }
    }
}

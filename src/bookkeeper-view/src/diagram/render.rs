// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::diagram::common::{escape_xml_attr, escape_xml_text, js_format_number};
use crate::diagram::constants::VIEW_BOX_MARGIN;
use crate::diagram::layout::Layout;
use crate::diagram::scene::{Color, ElementKind, Scene, Shape, StrokeStyle, Text, VisualElement};

const RENDER_STYLES: &str = r#"
/* Canvas */
.bk-canvas text {
  fill: #000000;
  font-family: "Roboto Light", "Roboto", "Open Sans", "Arial", sans-serif;
  font-weight: 300;
  text-anchor: middle;
  white-space: nowrap;
}

.bk-canvas rect {
  stroke: #000000;
}

/* Fills */
.bk-neutral { fill: #ffffff; }
.bk-active { fill: #8fd19e; }
.bk-pending { fill: #ffd27f; }
.bk-storage { fill: #d6e4f0; }
.bk-coordination { fill: #e3d7f4; }
.bk-message { fill: #2299dd; stroke: none; }

/* Text colors */
.bk-canvas text.bk-text { fill: #000000; }
.bk-canvas text.bk-fenced { fill: #cc3333; }

/* A writer whose entries are not acknowledged yet */
.bk-catching-up rect {
  stroke-dasharray: 12px 6px;
}
"#;

fn color_class(color: Color) -> &'static str {
    match color {
        Color::Neutral => "bk-neutral",
        Color::Active => "bk-active",
        Color::Pending => "bk-pending",
        Color::Storage => "bk-storage",
        Color::Coordination => "bk-coordination",
        Color::Message => "bk-message",
        Color::Text => "bk-text",
        Color::Fenced => "bk-fenced",
    }
}

fn kind_class(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Coordinator => "bk-coordinator",
        ElementKind::Client => "bk-client",
        ElementKind::Peer => "bk-bookie",
        ElementKind::Message => "bk-network-message",
        ElementKind::LedgerLabel => "bk-ledger",
    }
}

fn render_text(text: &Text, font_size: f64) -> String {
    format!(
        "<text x=\"{}\" y=\"{}\" class=\"{}\" style=\"font-size: {}px;\">{}</text>",
        js_format_number(text.at.x),
        js_format_number(text.at.y),
        color_class(text.color),
        js_format_number(font_size),
        escape_xml_text(&text.content)
    )
}

fn render_element(element: &VisualElement, font_size: f64) -> String {
    let attrs = element.attrs();

    let mut class = kind_class(attrs.kind).to_owned();
    if attrs.stroke == StrokeStyle::CatchingUp {
        class.push_str(" bk-catching-up");
    }

    let mut svg = String::new();
    svg.push_str(&format!(
        "<g class=\"{}\" data-id=\"{}\">",
        escape_xml_attr(&class),
        element.id()
    ));

    match attrs.shape {
        Shape::Rect(b) => {
            svg.push_str(&format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" class=\"{}\"></rect>",
                js_format_number(b.x),
                js_format_number(b.y),
                js_format_number(b.width),
                js_format_number(b.height),
                color_class(attrs.fill)
            ));
        }
        Shape::Dot { center, r } => {
            svg.push_str(&format!(
                "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" class=\"{}\"></circle>",
                js_format_number(center.x),
                js_format_number(center.y),
                js_format_number(r),
                color_class(attrs.fill)
            ));
        }
        Shape::None => {}
    }

    if let Some(label) = &attrs.label {
        svg.push_str(&render_text(label, font_size));
    }
    if let Some(text) = &attrs.text {
        svg.push_str(&render_text(text, font_size));
    }
    for child in element.children().iter() {
        svg.push_str(&render_element(child, font_size));
    }

    svg.push_str("</g>");
    svg
}

/// Serializes the scene as a standalone SVG document. Collections paint in
/// the order they were first reconciled.
pub fn render_svg(scene: &Scene, layout: &Layout) -> String {
    let config = layout.config();
    let extent = layout.extent();

    let left = (extent.x - VIEW_BOX_MARGIN).floor() as i64;
    let top = (extent.y - VIEW_BOX_MARGIN).floor() as i64;
    let width = (extent.width + 2.0 * VIEW_BOX_MARGIN).ceil() as i64;
    let height = (extent.height + 2.0 * VIEW_BOX_MARGIN).ceil() as i64;

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg style=\"width: {}; height: {};\" xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" preserveAspectRatio=\"xMinYMin\" class=\"bk-canvas\">",
        width, height, left, top, width, height
    ));
    svg.push_str("<style>\n");
    svg.push_str(RENDER_STYLES);
    svg.push_str(&format!(
        ".bk-canvas rect {{ stroke-width: {}px; }}\n",
        js_format_number(config.stroke_width)
    ));
    svg.push_str("</style>\n");

    for collection in scene.collections() {
        svg.push_str(&format!("<g class=\"bk-{}\">", escape_xml_attr(collection.name())));
        for element in collection.iter() {
            svg.push_str(&render_element(element, config.font_size));
        }
        svg.push_str("</g>");
    }

    svg.push_str("</svg>");
    svg
}

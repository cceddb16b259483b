//! HTML serialization of mounted React trees.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Numeric style properties that take no unit.
const UNITLESS_STYLES: &[&str] = &[
    "flex",
    "flexGrow",
    "flexShrink",
    "fontWeight",
    "lineHeight",
    "opacity",
    "order",
    "zIndex",
    "zoom",
];

/// One node of a tree produced by the React bindings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub(crate) enum MountedNode {
    Text {
        text: String,
    },
    Element {
        tag: String,
        #[serde(default)]
        attrs: Map<String, Value>,
        #[serde(default)]
        children: Vec<MountedNode>,
    },
}

pub(crate) fn render_html(nodes: &[MountedNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &MountedNode, out: &mut String) {
    match node {
        MountedNode::Text { text } => out.push_str(&escape(text, false)),
        MountedNode::Element {
            tag,
            attrs,
            children,
        } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                write_attr(name, value, out);
            }

            if VOID_ELEMENTS.contains(&tag.as_str()) {
                out.push_str("/>");
                return;
            }

            out.push('>');
            for child in children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn write_attr(name: &str, value: &Value, out: &mut String) {
    let name = match name {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    };

    let rendered = match value {
        Value::Null | Value::Bool(false) => return,
        Value::Bool(true) => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Object(style) if name == "style" => style_text(style),
        Value::Object(_) | Value::Array(_) => return,
    };

    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(&rendered, true));
    out.push('"');
}

fn style_text(style: &Map<String, Value>) -> String {
    let mut declarations = Vec::new();
    for (property, value) in style {
        let value = match value {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) if UNITLESS_STYLES.contains(&property.as_str()) => n.to_string(),
            Value::Number(n) => format!("{}px", n),
            _ => continue,
        };
        declarations.push(format!("{}:{}", kebab_case(property), value));
    }
    declarations.join(";")
}

fn kebab_case(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

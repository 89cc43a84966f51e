//! The attribute layer: pure, per-kind mappings between a node's typed
//! attributes and its markup attribute list.
//!
//! Serialization emits attributes in declared order and omits unset values
//! entirely. Extraction prefers explicit `data-*` attributes, then native
//! attributes, then inline style — so markup produced elsewhere still folds
//! into the same attribute set.

use serde_json::Value;
use vellum_core::Attrs;

use crate::style;

pub type MarkupAttrs = Vec<(String, String)>;

fn get_str<'a>(attrs: &'a Attrs, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

fn get_u32(attrs: &Attrs, key: &str) -> Option<u32> {
    attrs.get(key).and_then(|v| v.as_u64()).map(|v| v as u32)
}

fn push(out: &mut MarkupAttrs, name: &str, value: impl Into<String>) {
    out.push((name.to_string(), value.into()));
}

fn push_opt(out: &mut MarkupAttrs, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        push(out, name, value);
    }
}

/// Dimensions carry their unit (`"300px"`) or `"auto"`; only concrete pixel
/// sizes contribute to the derived style.
fn style_dimension(attrs: &Attrs, key: &str) -> Option<String> {
    let value = get_str(attrs, key)?;
    style::px_value(value).map(style::px_string)
}

pub fn image_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let mut out = MarkupAttrs::new();
    push_opt(&mut out, "src", get_str(attrs, "src"));
    push_opt(&mut out, "alt", get_str(attrs, "alt"));
    push_opt(&mut out, "title", get_str(attrs, "title"));
    push_opt(&mut out, "data-width", get_str(attrs, "width"));
    push_opt(&mut out, "data-height", get_str(attrs, "height"));
    push_opt(&mut out, "data-align", get_str(attrs, "align"));
    push_opt(&mut out, "data-border", get_str(attrs, "border"));

    // Dimensions first, border appended after so it wins override order.
    let composed = style::compose(&[
        ("width", style_dimension(attrs, "width")),
        ("height", style_dimension(attrs, "height")),
        ("border", get_str(attrs, "border").map(|s| s.to_string())),
    ]);
    push_opt(&mut out, "style", composed.as_deref());
    out
}

pub fn image_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    let style = get("style").unwrap_or_default();

    if let Some(src) = get("src") {
        attrs.insert("src".to_string(), Value::String(src));
    }
    for key in ["alt", "title"] {
        if let Some(value) = get(key).filter(|v| !v.is_empty()) {
            attrs.insert(key.to_string(), Value::String(value));
        }
    }
    for (attr_key, data_key, css_key) in [
        ("width", "data-width", "width"),
        ("height", "data-height", "height"),
    ] {
        let value = get(data_key)
            .or_else(|| style::property(&style, css_key))
            .or_else(|| {
                get(attr_key)
                    .and_then(|v| style::px_value(&v))
                    .map(style::px_string)
            });
        if let Some(value) = value {
            attrs.insert(attr_key.to_string(), Value::String(value));
        }
    }
    if let Some(align) = get("data-align") {
        attrs.insert("align".to_string(), Value::String(align));
    }
    if let Some(border) = get("data-border").or_else(|| style::property(&style, "border")) {
        attrs.insert("border".to_string(), Value::String(border));
    }
    attrs
}

pub fn video_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let mut out = MarkupAttrs::new();
    push_opt(&mut out, "src", get_str(attrs, "src"));
    if attrs.get("controls").and_then(|v| v.as_bool()).unwrap_or(false) {
        push(&mut out, "controls", "");
    }
    push_opt(&mut out, "data-width", get_str(attrs, "width"));
    push_opt(&mut out, "data-height", get_str(attrs, "height"));

    let composed = style::compose(&[
        ("width", style_dimension(attrs, "width")),
        ("height", style_dimension(attrs, "height")),
    ]);
    push_opt(&mut out, "style", composed.as_deref());
    out
}

pub fn video_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    let style = get("style").unwrap_or_default();

    if let Some(src) = get("src") {
        attrs.insert("src".to_string(), Value::String(src));
    }
    attrs.insert("controls".to_string(), Value::Bool(get("controls").is_some()));
    for (attr_key, data_key) in [("width", "data-width"), ("height", "data-height")] {
        let value = get(data_key)
            .or_else(|| style::property(&style, attr_key))
            .or_else(|| {
                get(attr_key)
                    .and_then(|v| style::px_value(&v))
                    .map(style::px_string)
            });
        if let Some(value) = value {
            attrs.insert(attr_key.to_string(), Value::String(value));
        }
    }
    attrs
}

pub fn audio_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let mut out = MarkupAttrs::new();
    push_opt(&mut out, "src", get_str(attrs, "src"));
    if attrs.get("controls").and_then(|v| v.as_bool()).unwrap_or(false) {
        push(&mut out, "controls", "");
    }
    out
}

pub fn audio_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    if let Some(src) = get("src") {
        attrs.insert("src".to_string(), Value::String(src));
    }
    attrs.insert("controls".to_string(), Value::Bool(get("controls").is_some()));
    attrs
}

pub fn link_card_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let mut out = MarkupAttrs::new();
    push(&mut out, "data-type", "link-card");
    push_opt(&mut out, "data-href", get_str(attrs, "href"));
    push_opt(&mut out, "data-card-type", get_str(attrs, "card_type"));
    push_opt(&mut out, "data-title", get_str(attrs, "title"));
    push_opt(&mut out, "data-description", get_str(attrs, "description"));
    push_opt(&mut out, "data-image", get_str(attrs, "image"));
    push_opt(&mut out, "data-site-name", get_str(attrs, "site_name"));
    push_opt(&mut out, "data-domain", get_str(attrs, "domain"));
    out
}

pub fn link_card_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    for (attr_key, data_key) in [
        ("href", "data-href"),
        ("card_type", "data-card-type"),
        ("title", "data-title"),
        ("description", "data-description"),
        ("image", "data-image"),
        ("site_name", "data-site-name"),
        ("domain", "data-domain"),
    ] {
        if let Some(value) = get(data_key).filter(|v| !v.is_empty()) {
            attrs.insert(attr_key.to_string(), Value::String(value));
        }
    }
    attrs
}

/// Cell style is carried entirely by the derived `style` string, composed in
/// a fixed order: background, text color, border, padding, alignment.
pub fn cell_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let border = match (
        get_u32(attrs, "border_width"),
        get_str(attrs, "border_style"),
        get_str(attrs, "border_color"),
    ) {
        (Some(width), Some(style), Some(color)) => {
            Some(style::border_shorthand(width, style, color))
        }
        _ => None,
    };

    let composed = style::compose(&[
        (
            "background-color",
            get_str(attrs, "background").map(|s| s.to_string()),
        ),
        ("color", get_str(attrs, "color").map(|s| s.to_string())),
        ("border", border),
        ("padding", get_u32(attrs, "padding").map(style::px_string)),
        (
            "text-align",
            get_str(attrs, "align").map(|s| s.to_string()),
        ),
    ]);

    let mut out = MarkupAttrs::new();
    push_opt(&mut out, "style", composed.as_deref());
    out
}

pub fn cell_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    let style = get("style").unwrap_or_default();

    if let Some(background) = style::property(&style, "background-color") {
        attrs.insert("background".to_string(), Value::String(background));
    }
    if let Some(color) = style::property(&style, "color") {
        attrs.insert("color".to_string(), Value::String(color));
    }
    if let Some(border) = style::property(&style, "border")
        && let Some((width, border_style, color)) = style::parse_border_shorthand(&border)
    {
        attrs.insert("border_width".to_string(), Value::from(width));
        attrs.insert("border_style".to_string(), Value::String(border_style));
        attrs.insert("border_color".to_string(), Value::String(color));
    }
    if let Some(padding) = style::property(&style, "padding").and_then(|v| style::px_value(&v)) {
        attrs.insert("padding".to_string(), Value::from(padding));
    }
    if let Some(align) = style::property(&style, "text-align") {
        attrs.insert("align".to_string(), Value::String(align));
    }
    attrs
}

pub fn code_block_markup_attrs(attrs: &Attrs) -> MarkupAttrs {
    let mut out = MarkupAttrs::new();
    if let Some(language) = get_str(attrs, "language") {
        push(&mut out, "class", format!("language-{language}"));
    }
    out
}

pub fn code_block_attrs(get: impl Fn(&str) -> Option<String>) -> Attrs {
    let mut attrs = Attrs::default();
    let class = get("class").unwrap_or_default();
    if let Some(language) = class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-"))
    {
        attrs.insert("language".to_string(), Value::String(language.to_string()));
    }
    attrs
}

//! Inline `style` strings: composition in declared order, and parsing back
//! into declarations.
//!
//! Composition order is part of the serialization contract — later
//! declarations override earlier ones in CSS, so each node kind appends its
//! declarations in a fixed sequence.

/// Compose declarations into a `style` value, skipping empty ones. Returns
/// `None` when nothing survives, so callers omit the attribute entirely.
pub fn compose(decls: &[(&str, Option<String>)]) -> Option<String> {
    let mut out = String::new();
    for (name, value) in decls {
        let Some(value) = value else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(';');
        }
        out.push_str(name);
        out.push(':');
        out.push_str(value);
    }
    (!out.is_empty()).then_some(out)
}

/// Split a `style` value into `(property, value)` declarations.
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_ascii_lowercase(), value.to_string()))
        })
        .collect()
}

/// Look up one property in a `style` value.
pub fn property(style: &str, name: &str) -> Option<String> {
    declarations(style)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// `"300px"` → `300`. Bare numbers are accepted too.
pub fn px_value(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    let digits = trimmed.strip_suffix("px").unwrap_or(trimmed).trim();
    digits.parse().ok()
}

/// `300` → `"300px"`.
pub fn px_string(value: u32) -> String {
    format!("{value}px")
}

/// `"1px solid #dee2e6"` → `(1, "solid", "#dee2e6")`.
pub fn parse_border_shorthand(value: &str) -> Option<(u32, String, String)> {
    let mut parts = value.split_whitespace();
    let width = px_value(parts.next()?)?;
    let style = parts.next()?.to_string();
    let color = parts.next()?.to_string();
    Some((width, style, color))
}

pub fn border_shorthand(width: u32, style: &str, color: &str) -> String {
    format!("{width}px {style} {color}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_skips_unset_and_preserves_order() {
        let style = compose(&[
            ("width", Some("300px".to_string())),
            ("height", None),
            ("border", Some("1px solid #000".to_string())),
        ]);
        assert_eq!(style.as_deref(), Some("width:300px;border:1px solid #000"));
        assert_eq!(compose(&[("width", None)]), None);
    }

    #[test]
    fn border_shorthand_round_trips() {
        let s = border_shorthand(2, "dashed", "#ffc107");
        assert_eq!(
            parse_border_shorthand(&s),
            Some((2, "dashed".to_string(), "#ffc107".to_string()))
        );
    }

    #[test]
    fn px_value_accepts_suffixed_and_bare() {
        assert_eq!(px_value("300px"), Some(300));
        assert_eq!(px_value("150"), Some(150));
        assert_eq!(px_value("auto"), None);
    }
}

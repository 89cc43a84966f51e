//! Document → markup. Hand-written emission with explicit escaping; no
//! pretty-printing, so serializing is stable across round trips.

use vellum_core::{AtomNode, Document, ElementNode, Marks, Node};

use crate::attrs::{
    self, audio_markup_attrs, cell_markup_attrs, image_markup_attrs, link_card_markup_attrs,
    video_markup_attrs,
};

pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    write_nodes(&mut out, &doc.children);
    out
}

fn write_nodes(out: &mut String, nodes: &[Node]) {
    for node in nodes {
        write_node(out, node);
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(el) => write_element(out, el),
        Node::Atom(atom) => write_atom(out, atom),
        Node::Text(text) => {
            if !text.text.is_empty() {
                write_marked_text(out, &text.text, &text.marks);
            }
        }
    }
}

fn write_element(out: &mut String, el: &ElementNode) {
    match el.kind.as_str() {
        "paragraph" => wrap(out, "p", &[], &el.children),
        "heading" => {
            let level = el
                .attrs
                .get("level")
                .and_then(|v| v.as_u64())
                .unwrap_or(1)
                .clamp(1, 6);
            let tag = format!("h{level}");
            wrap(out, &tag, &[], &el.children);
        }
        "blockquote" => wrap(out, "blockquote", &[], &el.children),
        "code_block" => {
            out.push_str("<pre>");
            open_tag(out, "code", &attrs::code_block_markup_attrs(&el.attrs));
            for child in &el.children {
                if let Node::Text(t) = child {
                    escape_text(out, &t.text);
                }
            }
            out.push_str("</code></pre>");
        }
        "bullet_list" => wrap(out, "ul", &[], &el.children),
        "ordered_list" => wrap(out, "ol", &[], &el.children),
        "list_item" => wrap(out, "li", &[], &el.children),
        "table" => wrap(out, "table", &[], &el.children),
        "table_row" => wrap(out, "tr", &[], &el.children),
        "table_cell" => wrap(out, "td", &cell_markup_attrs(&el.attrs), &el.children),
        "table_header" => wrap(out, "th", &cell_markup_attrs(&el.attrs), &el.children),
        _ => {
            // Unregistered wrapper: keep the content, drop the shell.
            write_nodes(out, &el.children);
        }
    }
}

fn write_atom(out: &mut String, atom: &AtomNode) {
    match atom.kind.as_str() {
        "image" => {
            // An image that is also a link stays one atomic node; the anchor
            // only exists on the wire.
            let link_href = atom.attrs.get("link_href").and_then(|v| v.as_str());
            if let Some(href) = link_href {
                open_tag(out, "a", &[("href".to_string(), href.to_string())]);
            }
            void_tag(out, "img", &image_markup_attrs(&atom.attrs));
            if link_href.is_some() {
                out.push_str("</a>");
            }
        }
        "video" => {
            open_tag(out, "video", &video_markup_attrs(&atom.attrs));
            out.push_str("</video>");
        }
        "audio" => {
            open_tag(out, "audio", &audio_markup_attrs(&atom.attrs));
            out.push_str("</audio>");
        }
        "link_card" => {
            open_tag(out, "div", &link_card_markup_attrs(&atom.attrs));
            out.push_str("</div>");
        }
        "divider" => out.push_str("<hr>"),
        _ => {}
    }
}

fn wrap(out: &mut String, tag: &str, markup_attrs: &[(String, String)], children: &[Node]) {
    open_tag(out, tag, markup_attrs);
    write_nodes(out, children);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Mark wrappers nest in a fixed order so output is deterministic; parsing
/// flattens any order back into the same mark set.
fn write_marked_text(out: &mut String, text: &str, marks: &Marks) {
    let mut close_stack: Vec<&str> = Vec::new();

    if let Some(href) = &marks.link {
        open_tag(out, "a", &[("href".to_string(), href.clone())]);
        close_stack.push("a");
    }
    if marks.bold {
        out.push_str("<strong>");
        close_stack.push("strong");
    }
    if marks.italic {
        out.push_str("<em>");
        close_stack.push("em");
    }
    if marks.underline {
        out.push_str("<u>");
        close_stack.push("u");
    }
    if marks.strikethrough {
        out.push_str("<s>");
        close_stack.push("s");
    }
    if let Some(color) = &marks.color {
        open_tag(
            out,
            "span",
            &[("style".to_string(), format!("color:{color}"))],
        );
        close_stack.push("span");
    }
    if let Some(highlight) = &marks.highlight {
        open_tag(
            out,
            "mark",
            &[("style".to_string(), format!("background-color:{highlight}"))],
        );
        close_stack.push("mark");
    }
    if marks.code {
        out.push_str("<code>");
        close_stack.push("code");
    }

    escape_text(out, text);

    for tag in close_stack.into_iter().rev() {
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    }
}

fn open_tag(out: &mut String, tag: &str, markup_attrs: &[(String, String)]) {
    out.push('<');
    out.push_str(tag);
    for (name, value) in markup_attrs {
        out.push(' ');
        out.push_str(name);
        if !value.is_empty() {
            out.push_str("=\"");
            escape_attr(out, value);
            out.push('"');
        }
    }
    out.push('>');
}

fn void_tag(out: &mut String, tag: &str, markup_attrs: &[(String, String)]) {
    open_tag(out, tag, markup_attrs);
}

fn escape_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

//! Markup → Document. html5ever does the tag-soup work; this module folds
//! the resulting DOM into typed nodes.
//!
//! Policy for unregistered markup: wrappers are unwrapped (their children
//! rejoin the flow), unknown void elements are dropped. Content survives,
//! structure does not.

use serde_json::Value;
use vellum_core::{Attrs, Document, Marks, Node};

use crate::attrs;
use crate::dom::{Dom, DomId, parse_fragment};

pub fn from_html(html: &str) -> Document {
    let (dom, body) = parse_fragment(html);
    let children = fold_blocks(&dom, dom.children(body));
    Document { children }
}

const INLINE_TAGS: &[&str] = &[
    "a", "strong", "b", "em", "i", "u", "s", "del", "strike", "code", "span", "mark", "sub",
    "sup", "small", "br",
];

fn is_inline_tag(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

/// Fold a block context's children, wrapping stray inline runs into
/// implicit paragraphs.
fn fold_blocks(dom: &Dom, ids: &[DomId]) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut run: Vec<Node> = Vec::new();

    let mut flush = |run: &mut Vec<Node>, out: &mut Vec<Node>| {
        if run.is_empty() {
            return;
        }
        out.push(Node::element("paragraph", Attrs::default(), std::mem::take(run)));
    };

    for &id in ids {
        if let Some(text) = dom.text(id) {
            if text.trim().is_empty() && run.is_empty() {
                // Incidental whitespace between blocks.
                continue;
            }
            run.push(Node::text(text, Marks::default()));
            continue;
        }
        let Some(tag) = dom.tag_name(id) else {
            continue;
        };

        if tag == "a" && anchor_wraps_single_image(dom, id) {
            flush(&mut run, &mut out);
            out.extend(image_from_anchor(dom, id));
            continue;
        }
        if is_inline_tag(tag) {
            collect_inline(dom, id, &Marks::default(), &mut run);
            continue;
        }

        flush(&mut run, &mut out);
        out.extend(block_nodes(dom, id));
    }

    flush(&mut run, &mut out);
    out
}

fn block_nodes(dom: &Dom, id: DomId) -> Vec<Node> {
    let Some(tag) = dom.tag_name(id) else {
        return Vec::new();
    };
    let get = |name: &str| dom.attr(id, name).map(|v| v.to_string());

    match tag {
        "p" => vec![Node::element(
            "paragraph",
            Attrs::default(),
            ensure_inline(inline_children(dom, id)),
        )],
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: u64 = tag[1..].parse().unwrap_or(1);
            let mut node_attrs = Attrs::default();
            node_attrs.insert("level".to_string(), Value::from(level));
            vec![Node::element(
                "heading",
                node_attrs,
                ensure_inline(inline_children(dom, id)),
            )]
        }
        "blockquote" => vec![Node::element(
            "blockquote",
            Attrs::default(),
            fold_blocks(dom, dom.children(id)),
        )],
        "pre" => {
            let code = dom
                .children(id)
                .iter()
                .copied()
                .find(|&c| dom.tag_name(c) == Some("code"));
            let (attr_source, text_source) = match code {
                Some(code) => (code, code),
                None => (id, id),
            };
            let get_code = |name: &str| dom.attr(attr_source, name).map(|v| v.to_string());
            vec![Node::element(
                "code_block",
                attrs::code_block_attrs(get_code),
                vec![Node::text(text_content(dom, text_source), Marks::default())],
            )]
        }
        "ul" | "ol" => {
            let kind = if tag == "ul" { "bullet_list" } else { "ordered_list" };
            let items: Vec<Node> = dom
                .children(id)
                .iter()
                .copied()
                .filter(|&c| dom.tag_name(c) == Some("li"))
                .map(|li| {
                    Node::element("list_item", Attrs::default(), fold_blocks(dom, dom.children(li)))
                })
                .collect();
            if items.is_empty() {
                return Vec::new();
            }
            vec![Node::element(kind, Attrs::default(), items)]
        }
        "table" => {
            let mut rows = Vec::new();
            collect_table_rows(dom, id, &mut rows);
            if rows.is_empty() {
                return Vec::new();
            }
            vec![Node::element("table", Attrs::default(), rows)]
        }
        "hr" => vec![Node::atom("divider", Attrs::default())],
        "img" => vec![Node::atom("image", attrs::image_attrs(get))],
        "video" => vec![Node::atom("video", attrs::video_attrs(get))],
        "audio" => vec![Node::atom("audio", attrs::audio_attrs(get))],
        "div" if dom.attr(id, "data-type") == Some("link-card") => {
            vec![Node::atom("link_card", attrs::link_card_attrs(get))]
        }
        // Unknown wrapper: fold its children into the flow.
        _ => fold_blocks(dom, dom.children(id)),
    }
}

/// Rows of a table, looking through `thead`/`tbody`/`tfoot` the parser
/// inserts. Ragged row widths are kept as-is.
fn collect_table_rows(dom: &Dom, id: DomId, rows: &mut Vec<Node>) {
    for &child in dom.children(id) {
        match dom.tag_name(child) {
            Some("tr") => {
                let cells: Vec<Node> = dom
                    .children(child)
                    .iter()
                    .copied()
                    .filter_map(|cell| {
                        let kind = match dom.tag_name(cell)? {
                            "td" => "table_cell",
                            "th" => "table_header",
                            _ => return None,
                        };
                        let get = |name: &str| dom.attr(cell, name).map(|v| v.to_string());
                        Some(Node::element(
                            kind,
                            attrs::cell_attrs(get),
                            fold_blocks(dom, dom.children(cell)),
                        ))
                    })
                    .collect();
                rows.push(Node::element("table_row", Attrs::default(), cells));
            }
            Some("thead") | Some("tbody") | Some("tfoot") => {
                collect_table_rows(dom, child, rows);
            }
            _ => {}
        }
    }
}

fn inline_children(dom: &Dom, id: DomId) -> Vec<Node> {
    let mut out = Vec::new();
    for &child in dom.children(id) {
        collect_inline(dom, child, &Marks::default(), &mut out);
    }
    out
}

fn ensure_inline(mut children: Vec<Node>) -> Vec<Node> {
    if children.is_empty() {
        children.push(Node::text("", Marks::default()));
    }
    children
}

/// Walk inline markup accumulating marks; any nesting order folds into the
/// same flat mark set.
fn collect_inline(dom: &Dom, id: DomId, marks: &Marks, out: &mut Vec<Node>) {
    if let Some(text) = dom.text(id) {
        out.push(Node::text(text, marks.clone()));
        return;
    }
    let Some(tag) = dom.tag_name(id) else {
        return;
    };

    let mut next = marks.clone();
    match tag {
        "strong" | "b" => next.bold = true,
        "em" | "i" => next.italic = true,
        "u" => next.underline = true,
        "s" | "del" | "strike" => next.strikethrough = true,
        "code" => next.code = true,
        "a" => {
            next.link = dom.attr(id, "href").map(|v| v.to_string());
        }
        "span" => {
            let style = dom.attr(id, "style").unwrap_or_default();
            if let Some(color) = crate::style::property(style, "color") {
                next.color = Some(color);
            }
        }
        "mark" => {
            let style = dom.attr(id, "style").unwrap_or_default();
            next.highlight = Some(
                crate::style::property(style, "background-color")
                    .unwrap_or_else(|| "#ffff00".to_string()),
            );
        }
        "br" => return,
        // Unknown inline wrapper: recurse with marks unchanged.
        _ => {}
    }

    for &child in dom.children(id) {
        collect_inline(dom, child, &next, out);
    }
}

/// `<a href="…"><img …></a>` is one atomic image node; the anchor's target
/// folds into the image's `link_href` attribute.
fn anchor_wraps_single_image(dom: &Dom, id: DomId) -> bool {
    let mut saw_image = false;
    for &child in dom.children(id) {
        match dom.tag_name(child) {
            Some("img") if !saw_image => saw_image = true,
            Some(_) => return false,
            None => {
                if dom.text(child).is_some_and(|t| !t.trim().is_empty()) {
                    return false;
                }
            }
        }
    }
    saw_image
}

fn image_from_anchor(dom: &Dom, id: DomId) -> Option<Node> {
    let img = dom
        .children(id)
        .iter()
        .copied()
        .find(|&c| dom.tag_name(c) == Some("img"))?;
    let get = |name: &str| dom.attr(img, name).map(|v| v.to_string());
    let mut image_attrs = attrs::image_attrs(get);
    if let Some(href) = dom.attr(id, "href") {
        image_attrs.insert("link_href".to_string(), Value::String(href.to_string()));
    }
    Some(Node::atom("image", image_attrs))
}

fn text_content(dom: &Dom, id: DomId) -> String {
    fn walk(dom: &Dom, id: DomId, out: &mut String) {
        if let Some(text) = dom.text(id) {
            out.push_str(text);
            return;
        }
        for &child in dom.children(id) {
            walk(dom, child, out);
        }
    }
    let mut out = String::new();
    for &child in dom.children(id) {
        walk(dom, child, &mut out);
    }
    out
}

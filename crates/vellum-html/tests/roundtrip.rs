use serde_json::Value;
use vellum_core::{Attrs, Document, Marks, Node, TextNode};
use vellum_html::{from_html, to_html};

fn attrs(pairs: &[(&str, Value)]) -> Attrs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn doc(children: Vec<Node>) -> Document {
    Document { children }
}

/// Serialize → parse → compare. The markup is also re-serialized to check
/// the second pass is byte-identical (serialization is idempotent).
fn assert_round_trip(document: &Document) {
    let html = to_html(document);
    let parsed = from_html(&html);
    assert_eq!(&parsed, document, "markup was: {html}");
    assert_eq!(to_html(&parsed), html);
}

#[test]
fn paragraph_and_heading_round_trip() {
    assert_round_trip(&doc(vec![
        Node::paragraph("plain text"),
        Node::element(
            "heading",
            attrs(&[("level", Value::from(3u64))]),
            vec![Node::text("title", Marks::default())],
        ),
    ]));
}

#[test]
fn marks_round_trip_through_fixed_nesting() {
    let marked = |text: &str, marks: Marks| Node::Text(TextNode {
        text: text.to_string(),
        marks,
    });

    assert_round_trip(&doc(vec![Node::element(
        "paragraph",
        Attrs::default(),
        vec![
            marked(
                "bold italic",
                Marks {
                    bold: true,
                    italic: true,
                    ..Marks::default()
                },
            ),
            marked(" linked", Marks {
                link: Some("https://example.com".to_string()),
                underline: true,
                ..Marks::default()
            }),
            marked(" tinted", Marks {
                color: Some("#ff0000".to_string()),
                highlight: Some("#fff59d".to_string()),
                ..Marks::default()
            }),
            marked(" code", Marks {
                code: true,
                strikethrough: true,
                ..Marks::default()
            }),
        ],
    )]));
}

#[test]
fn image_round_trips_all_attributes() {
    assert_round_trip(&doc(vec![Node::atom(
        "image",
        attrs(&[
            ("src", Value::from("https://example.com/a.png")),
            ("alt", Value::from("A diagram")),
            ("title", Value::from("Diagram")),
            ("width", Value::from("300px")),
            ("height", Value::from("200px")),
            ("align", Value::from("center")),
            ("border", Value::from("2px solid #000000")),
        ]),
    )]));
}

#[test]
fn image_with_auto_dimensions_round_trips() {
    assert_round_trip(&doc(vec![Node::atom(
        "image",
        attrs(&[
            ("src", Value::from("https://example.com/a.png")),
            ("width", Value::from("auto")),
            ("height", Value::from("auto")),
        ]),
    )]));
}

#[test]
fn linked_image_stays_one_atomic_node() {
    let document = doc(vec![Node::atom(
        "image",
        attrs(&[
            ("src", Value::from("https://example.com/a.png")),
            ("link_href", Value::from("https://example.com/page")),
        ]),
    )]);

    let html = to_html(&document);
    assert!(html.starts_with("<a href=\"https://example.com/page\"><img"));

    let parsed = from_html(&html);
    assert_eq!(parsed.children.len(), 1);
    assert!(matches!(
        &parsed.children[0],
        Node::Atom(atom) if atom.kind == "image"
            && atom.attrs.get("link_href").and_then(|v| v.as_str())
                == Some("https://example.com/page")
    ));
    assert_round_trip(&document);
}

#[test]
fn video_and_audio_round_trip() {
    assert_round_trip(&doc(vec![
        Node::atom(
            "video",
            attrs(&[
                ("src", Value::from("https://example.com/clip.mp4")),
                ("controls", Value::Bool(true)),
                ("width", Value::from("640px")),
                ("height", Value::from("360px")),
            ]),
        ),
        Node::atom(
            "audio",
            attrs(&[
                ("src", Value::from("blob:vellum/3")),
                ("controls", Value::Bool(true)),
            ]),
        ),
    ]));
}

#[test]
fn link_card_round_trips_with_and_without_optionals() {
    assert_round_trip(&doc(vec![Node::atom(
        "link_card",
        attrs(&[
            ("href", Value::from("https://github.com/rust-lang/rust")),
            ("card_type", Value::from("github")),
            ("title", Value::from("rust-lang/rust")),
            ("description", Value::from("The Rust language")),
            ("image", Value::from("https://example.com/og.png")),
            ("site_name", Value::from("GitHub")),
            ("domain", Value::from("github.com")),
        ]),
    )]));

    // Optionals absent: nothing is serialized as an empty attribute.
    let minimal = doc(vec![Node::atom(
        "link_card",
        attrs(&[
            ("href", Value::from("https://example.com")),
            ("card_type", Value::from("generic")),
        ]),
    )]);
    let html = to_html(&minimal);
    assert!(!html.contains("data-title"));
    assert!(!html.contains("=\"\""));
    assert_round_trip(&minimal);
}

#[test]
fn styled_table_cells_round_trip() {
    let styled_cell = Node::element(
        "table_cell",
        attrs(&[
            ("background", Value::from("#ffcc00")),
            ("color", Value::from("#212529")),
            ("border_width", Value::from(1u64)),
            ("border_style", Value::from("solid")),
            ("border_color", Value::from("#dee2e6")),
            ("padding", Value::from(8u64)),
            ("align", Value::from("center")),
        ]),
        vec![Node::paragraph("styled")],
    );
    let plain_cell = Node::element(
        "table_cell",
        Attrs::default(),
        vec![Node::paragraph("plain")],
    );
    let header = Node::element(
        "table_header",
        Attrs::default(),
        vec![Node::paragraph("head")],
    );

    assert_round_trip(&doc(vec![Node::element(
        "table",
        Attrs::default(),
        vec![
            Node::element("table_row", Attrs::default(), vec![header.clone(), header]),
            Node::element(
                "table_row",
                Attrs::default(),
                vec![styled_cell, plain_cell],
            ),
        ],
    )]));
}

#[test]
fn cell_style_composition_order_is_fixed() {
    let cell = Node::element(
        "table_cell",
        attrs(&[
            ("background", Value::from("#ffcc00")),
            ("color", Value::from("#000000")),
            ("border_width", Value::from(1u64)),
            ("border_style", Value::from("solid")),
            ("border_color", Value::from("#cccccc")),
            ("padding", Value::from(4u64)),
            ("align", Value::from("right")),
        ]),
        vec![Node::paragraph("x")],
    );
    let html = to_html(&doc(vec![Node::element(
        "table",
        Attrs::default(),
        vec![Node::element("table_row", Attrs::default(), vec![cell])],
    )]));

    assert!(html.contains(
        "style=\"background-color:#ffcc00;color:#000000;\
         border:1px solid #cccccc;padding:4px;text-align:right\""
    ));
}

#[test]
fn lists_blockquote_code_block_and_divider_round_trip() {
    let item = |text: &str| {
        Node::element(
            "list_item",
            Attrs::default(),
            vec![Node::paragraph(text)],
        )
    };
    assert_round_trip(&doc(vec![
        Node::element("bullet_list", Attrs::default(), vec![item("one"), item("two")]),
        Node::element("ordered_list", Attrs::default(), vec![item("first")]),
        Node::element(
            "blockquote",
            Attrs::default(),
            vec![Node::paragraph("quoted")],
        ),
        Node::element(
            "code_block",
            attrs(&[("language", Value::from("rust"))]),
            vec![Node::text("fn main() {}", Marks::default())],
        ),
        Node::atom("divider", Attrs::default()),
        Node::paragraph(""),
    ]));
}

#[test]
fn nested_list_round_trips() {
    let inner = Node::element(
        "bullet_list",
        Attrs::default(),
        vec![Node::element(
            "list_item",
            Attrs::default(),
            vec![Node::paragraph("nested")],
        )],
    );
    let outer_item = Node::element(
        "list_item",
        Attrs::default(),
        vec![Node::paragraph("outer"), inner],
    );
    assert_round_trip(&doc(vec![Node::element(
        "bullet_list",
        Attrs::default(),
        vec![outer_item],
    )]));
}

#[test]
fn text_escaping_survives_round_trip() {
    assert_round_trip(&doc(vec![Node::paragraph("a < b && c > d")]));
}

#[test]
fn unknown_wrappers_unwrap_and_unknown_voids_drop() {
    let parsed = from_html(
        "<section><p>kept</p></section><iframe src=\"x\"></iframe><p>after</p>",
    );
    assert_eq!(parsed.children.len(), 2);
    assert!(matches!(
        &parsed.children[0],
        Node::Element(el) if el.kind == "paragraph"
    ));
}

#[test]
fn bare_inline_content_wraps_into_a_paragraph() {
    let parsed = from_html("loose <strong>text</strong>");
    assert_eq!(parsed.children.len(), 1);
    let Node::Element(block) = &parsed.children[0] else {
        panic!("expected paragraph");
    };
    assert_eq!(block.kind, "paragraph");
    assert!(block.children.iter().any(|n| matches!(
        n,
        Node::Text(t) if t.marks.bold && t.text == "text"
    )));
}

#[test]
fn native_width_attribute_is_a_parse_fallback() {
    let parsed = from_html("<img src=\"x.png\" width=\"300\" height=\"150\">");
    assert!(matches!(
        &parsed.children[0],
        Node::Atom(atom) if atom.attrs.get("width").and_then(|v| v.as_str()) == Some("300px")
            && atom.attrs.get("height").and_then(|v| v.as_str()) == Some("150px")
    ));
}

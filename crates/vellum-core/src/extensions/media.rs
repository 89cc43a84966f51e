use serde_json::Value;

use crate::extension::{
    CommandError, CommandSpec, ContentModel, Extension, NodeRole, NodeSpec, QuerySpec,
};
use crate::model::{Attrs, Node, Point, Selection};
use crate::step::{Step, Transaction};

use super::support::{block_insert_position, bool_arg, child_path, string_arg};

/// Embedded media atoms. All three are fully attribute-driven; their
/// insertion commands require `src` and refuse to create partial nodes.
pub struct MediaExtension;

impl Extension for MediaExtension {
    fn id(&self) -> &'static str {
        "media"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![
            NodeSpec {
                kind: "image".to_string(),
                role: NodeRole::Block,
                atom: true,
                content: ContentModel::None,
            },
            NodeSpec {
                kind: "video".to_string(),
                role: NodeRole::Block,
                atom: true,
                content: ContentModel::None,
            },
            NodeSpec {
                kind: "audio".to_string(),
                role: NodeRole::Block,
                atom: true,
                content: ContentModel::None,
            },
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", "Insert image", |editor, args| {
                let args = args.as_ref();
                let src = string_arg(args, "src")
                    .ok_or_else(|| CommandError::new("missing args.src"))?;

                let mut attrs = Attrs::default();
                attrs.insert("src".to_string(), Value::String(src));
                attrs.insert("width".to_string(), Value::String("auto".to_string()));
                attrs.insert("height".to_string(), Value::String("auto".to_string()));
                for key in ["alt", "title", "align", "border", "link_href"] {
                    if let Some(value) = string_arg(args, key) {
                        attrs.insert(key.to_string(), Value::String(value));
                    }
                }
                for key in ["width", "height"] {
                    if let Some(value) = string_arg(args, key) {
                        attrs.insert(key.to_string(), Value::String(value));
                    }
                }

                let tx = insert_atom_block(editor, Node::atom("image", attrs), "image.insert");
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert image: {e}")))?;
                Ok(true)
            })
            .description("Insert an image node after the caret block.")
            .keywords(["image", "img", "media", "picture"]),
            CommandSpec::new("video.insert", "Insert video", |editor, args| {
                let args = args.as_ref();
                let src = string_arg(args, "src")
                    .ok_or_else(|| CommandError::new("missing args.src"))?;

                let mut attrs = Attrs::default();
                attrs.insert("src".to_string(), Value::String(src));
                attrs.insert(
                    "controls".to_string(),
                    Value::Bool(bool_arg(args, "controls").unwrap_or(true)),
                );
                for key in ["width", "height"] {
                    if let Some(value) = string_arg(args, key) {
                        attrs.insert(key.to_string(), Value::String(value));
                    }
                }

                let tx = insert_atom_block(editor, Node::atom("video", attrs), "video.insert");
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert video: {e}")))?;
                Ok(true)
            })
            .description("Insert a video node after the caret block.")
            .keywords(["video", "media"]),
            CommandSpec::new("audio.insert", "Insert audio", |editor, args| {
                let args = args.as_ref();
                let src = string_arg(args, "src")
                    .ok_or_else(|| CommandError::new("missing args.src"))?;

                let mut attrs = Attrs::default();
                attrs.insert("src".to_string(), Value::String(src));
                attrs.insert(
                    "controls".to_string(),
                    Value::Bool(bool_arg(args, "controls").unwrap_or(true)),
                );

                let tx = insert_atom_block(editor, Node::atom("audio", attrs), "audio.insert");
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert audio: {e}")))?;
                Ok(true)
            })
            .description("Insert an audio node after the caret block.")
            .keywords(["audio", "recording", "media"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("media.atom_kind_at", |editor, args| {
            let path = super::support::path_arg(args.as_ref(), "path");
            let kind = path
                .and_then(|p| editor.doc().node(&p).cloned())
                .and_then(|n| match n {
                    Node::Atom(a) => Some(a.kind),
                    _ => None,
                });
            Ok(kind.map(Value::String).unwrap_or(Value::Null))
        })]
    }
}

/// Insert an atom after the caret block with a fresh paragraph following it,
/// caret landing in the paragraph.
pub(crate) fn insert_atom_block(
    editor: &crate::editor::Editor,
    node: Node,
    origin: &str,
) -> Transaction {
    let (parent, insert_at) = block_insert_position(editor);
    let atom_path = child_path(&parent, insert_at);
    let paragraph_path = child_path(&parent, insert_at + 1);
    let caret = child_path(&paragraph_path, 0);

    Transaction::new(vec![
        Step::InsertNode {
            path: atom_path,
            node,
        },
        Step::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(caret, 0)))
    .origin(format!("command:{origin}"))
}

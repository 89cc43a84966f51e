use serde_json::Value;

use crate::extension::{CommandError, CommandSpec, ContentModel, Extension, NodeRole, NodeSpec};
use crate::model::{Attrs, Node};

use super::media::insert_atom_block;
use super::support::string_arg;

/// The link-card atom: a fetched URL preview rendered from attributes alone.
/// Metadata resolution happens outside the core; insertion only validates
/// `href` and records whatever the resolver produced.
pub struct LinkCardExtension;

impl Extension for LinkCardExtension {
    fn id(&self) -> &'static str {
        "link_card"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec {
            kind: "link_card".to_string(),
            role: NodeRole::Block,
            atom: true,
            content: ContentModel::None,
        }]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("link_card.insert", "Insert link card", |editor, args| {
                let args = args.as_ref();
                let href = string_arg(args, "href")
                    .ok_or_else(|| CommandError::new("missing args.href"))?;

                let mut attrs = Attrs::default();
                attrs.insert("href".to_string(), Value::String(href));
                attrs.insert(
                    "card_type".to_string(),
                    Value::String(
                        string_arg(args, "card_type").unwrap_or_else(|| "generic".to_string()),
                    ),
                );
                for key in ["title", "description", "image", "site_name", "domain"] {
                    if let Some(value) = string_arg(args, key) {
                        attrs.insert(key.to_string(), Value::String(value));
                    }
                }

                let tx =
                    insert_atom_block(editor, Node::atom("link_card", attrs), "link_card.insert");
                editor
                    .apply(tx)
                    .map_err(|e| CommandError::new(format!("failed to insert link card: {e}")))?;
                Ok(true)
            })
            .description("Insert a link-card node carrying resolved metadata.")
            .keywords(["link", "card", "preview", "embed"]),
        ]
    }
}

//! The document container: owns the live editor, feeds it markup, and emits
//! serialized markup upward after each logical edit.

use serde_json::Value;
use vellum_core::{CommandError, Document, Editor, ExtensionRegistry, Point, Selection, Transaction};

use crate::{reader, writer};

pub type ChangeListener = Box<dyn FnMut(&str)>;

/// Owns editor lifecycle and the last-emitted markup string.
///
/// Change flow: every applied edit serializes once and calls the listener
/// once — but only when the markup actually changed. Incoming content equal
/// to the last-emitted string is an echo of our own emission and is ignored;
/// anything else replaces the document wholesale (switching notes).
pub struct DocumentContainer {
    editor: Editor,
    last_emitted: String,
    on_change: ChangeListener,
}

impl DocumentContainer {
    pub fn new(content: &str, on_change: ChangeListener) -> Self {
        let editor = editor_for(content);
        let last_emitted = writer::to_html(editor.doc());
        Self {
            editor,
            last_emitted,
            on_change,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn markup(&self) -> &str {
        &self.last_emitted
    }

    /// New `content` from the owner. Echoes of our own last emission are
    /// ignored so the cursor survives the feedback loop.
    pub fn set_content(&mut self, content: &str) {
        if content == self.last_emitted {
            log::debug!("container: ignoring echoed content ({} bytes)", content.len());
            return;
        }
        self.editor = editor_for(content);
        self.last_emitted = writer::to_html(self.editor.doc());
    }

    /// Run a command; on success, serialize and emit exactly once.
    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<bool, CommandError> {
        let applied = self.editor.run_command(id, args)?;
        if applied {
            self.emit_if_changed();
        }
        Ok(applied)
    }

    /// Apply a transaction directly (interactive node behaviors commit
    /// attribute updates this way), then emit.
    pub fn apply(&mut self, tx: Transaction) -> Result<(), vellum_core::ApplyError> {
        self.editor.apply(tx)?;
        self.emit_if_changed();
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let done = self.editor.undo();
        if done {
            self.emit_if_changed();
        }
        done
    }

    pub fn redo(&mut self) -> bool {
        let done = self.editor.redo();
        if done {
            self.emit_if_changed();
        }
        done
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.editor.set_selection(selection);
    }

    fn emit_if_changed(&mut self) {
        let markup = writer::to_html(self.editor.doc());
        if markup == self.last_emitted {
            return;
        }
        self.last_emitted = markup;
        (self.on_change)(&self.last_emitted);
    }
}

fn editor_for(content: &str) -> Editor {
    let doc = if content.trim().is_empty() {
        Document {
            children: vec![vellum_core::Node::paragraph("")],
        }
    } else {
        reader::from_html(content)
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, ExtensionRegistry::standard())
}

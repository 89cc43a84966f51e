use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::extension::{CommandError, ExtensionRegistry, QueryError};
use crate::model::{Document, Node, PathError, Point, Selection};
use crate::step::{Step, Transaction, apply_step};

#[derive(Debug)]
pub enum ApplyError {
    InvalidPath(String),
    NormalizeDiverged,
}

impl From<PathError> for ApplyError {
    fn from(value: PathError) -> Self {
        ApplyError::InvalidPath(value.0)
    }
}

impl std::fmt::Display for ApplyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplyError::InvalidPath(msg) => write!(f, "invalid path: {msg}"),
            ApplyError::NormalizeDiverged => write!(f, "normalize passes did not converge"),
        }
    }
}

#[derive(Debug, Clone)]
struct UndoRecord {
    inverse_steps: Vec<Step>,
    selection_before: Selection,
    selection_after: Selection,
}

#[derive(Debug, Default)]
pub struct EditorConfig {
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
}

impl EditorConfig {
    fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        self
    }
}

/// The live document plus its selection, history, and registered node types.
/// All mutation goes through [`Editor::apply`]; every applied transaction is
/// exactly one undo step.
pub struct Editor {
    doc: Document,
    selection: Selection,
    registry: ExtensionRegistry,
    config: EditorConfig,
    undo_stack: Vec<UndoRecord>,
    redo_stack: Vec<UndoRecord>,
}

impl Editor {
    pub fn new(doc: Document, selection: Selection, registry: ExtensionRegistry) -> Self {
        let mut editor = Self {
            doc,
            selection,
            registry,
            config: EditorConfig::default().with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        };
        editor.normalize_in_place();
        editor
    }

    /// An empty document with the full standard node-type set.
    pub fn standard() -> Self {
        let doc = Document {
            children: vec![Node::paragraph("")],
        };
        let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
        Self::new(doc, selection, ExtensionRegistry::standard())
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = self.registry.normalize_selection(&self.doc, &selection);
    }

    pub fn registry(&self) -> &ExtensionRegistry {
        &self.registry
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), ApplyError> {
        let selection_before = self.selection.clone();

        let mut inverse_steps: Vec<Step> = Vec::new();
        for step in tx.steps {
            let inverse = apply_step(&mut self.doc, &mut self.selection, step)?;
            inverse_steps.push(inverse);
        }

        if let Some(selection) = tx.selection_after {
            self.selection = selection;
        }

        let mut inverse_normalize = self.normalize_with_inverse()?;
        inverse_steps.append(&mut inverse_normalize);
        inverse_steps.reverse();

        self.selection = self
            .registry
            .normalize_selection(&self.doc, &self.selection);

        self.undo_stack.push(UndoRecord {
            inverse_steps,
            selection_before,
            selection_after: self.selection.clone(),
        });
        self.redo_stack.clear();
        if self.undo_stack.len() > self.config.max_undo {
            self.undo_stack.remove(0);
        }

        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        let Some(record) = self.undo_stack.pop() else {
            return false;
        };
        let UndoRecord {
            inverse_steps,
            selection_before,
            selection_after,
        } = record;

        let mut redo_steps = Vec::new();
        for step in inverse_steps {
            match apply_step(&mut self.doc, &mut self.selection, step) {
                Ok(inverse) => redo_steps.push(inverse),
                Err(err) => {
                    log::warn!("undo stopped mid-record: {}", err.0);
                    break;
                }
            }
        }
        redo_steps.reverse();

        self.selection = selection_before.clone();
        self.normalize_in_place();

        self.redo_stack.push(UndoRecord {
            inverse_steps: redo_steps,
            selection_before,
            selection_after,
        });
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(record) = self.redo_stack.pop() else {
            return false;
        };
        let UndoRecord {
            inverse_steps,
            selection_before,
            selection_after,
        } = record;

        let mut undo_steps = Vec::new();
        for step in inverse_steps {
            match apply_step(&mut self.doc, &mut self.selection, step) {
                Ok(inverse) => undo_steps.push(inverse),
                Err(err) => {
                    log::warn!("redo stopped mid-record: {}", err.0);
                    break;
                }
            }
        }
        undo_steps.reverse();

        self.selection = selection_after.clone();
        self.normalize_in_place();

        self.undo_stack.push(UndoRecord {
            inverse_steps: undo_steps,
            selection_before,
            selection_after,
        });
        true
    }

    /// Dispatch a registered command. `Ok(false)` means the command's
    /// preconditions failed and nothing changed.
    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<bool, CommandError> {
        let Some(command) = self.registry.command(id) else {
            return Err(CommandError::new(format!("unknown command: {id}")));
        };
        (command.handler)(self, args)
    }

    pub fn run_query_json(&self, id: &str, args: Option<Value>) -> Result<Value, QueryError> {
        let Some(query) = self.registry.query(id) else {
            return Err(QueryError::new(format!("unknown query: {id}")));
        };
        (query.handler)(self, args)
    }

    pub fn run_query<T>(&self, id: &str, args: Option<Value>) -> Result<T, QueryError>
    where
        T: DeserializeOwned,
    {
        let value = self.run_query_json(id, args)?;
        serde_json::from_value(value)
            .map_err(|err| QueryError::new(format!("failed to decode query result: {err}")))
    }

    fn normalize_in_place(&mut self) {
        let _ = self.normalize_with_inverse();
        self.selection = self
            .registry
            .normalize_selection(&self.doc, &self.selection);
    }

    fn normalize_with_inverse(&mut self) -> Result<Vec<Step>, ApplyError> {
        let mut inverse_steps = Vec::new();
        for _ in 0..self.config.max_normalize_iterations {
            let steps = self.registry.normalize(&self.doc);
            if steps.is_empty() {
                return Ok(inverse_steps);
            }
            for step in steps {
                let inverse = apply_step(&mut self.doc, &mut self.selection, step)?;
                inverse_steps.push(inverse);
            }
        }
        Err(ApplyError::NormalizeDiverged)
    }
}

pub mod attrs;
mod container;
mod dom;
mod reader;
pub mod style;
mod writer;

pub use crate::container::{ChangeListener, DocumentContainer};
pub use crate::reader::from_html;
pub use crate::writer::to_html;

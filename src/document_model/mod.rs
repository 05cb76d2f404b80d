/// Document model subsystem - the line store and the state that rides on it
///
/// Holds the document lines, dot and cut buffer, the mark table, the undo
/// stack, the cached search state and the file reader/writer.
pub mod document;
pub mod file_io;
pub mod marks;
pub mod search_state;
pub mod undo;

pub use document::{Document, LineId, terminated};
pub use marks::MarkTable;
pub use search_state::{LastSubstitution, SearchDirection, SearchState};
pub use undo::{UndoAction, UndoEntry, UndoStack};

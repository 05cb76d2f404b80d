/// Controller subsystem - Runs command lines against an editing session
///
/// The session owns all editor state. The editor controller reads command
/// lines, dispatches them and reports errors; the command groups live in
/// their own modules as further `impl` blocks on the controller.
pub mod edit_commands;
pub mod editor;
pub mod file_commands;
pub mod help;
pub mod print_commands;
pub mod search_commands;
pub mod session;
pub mod undo_commands;

pub use editor::{EditorController, Flow};
pub use session::Session;

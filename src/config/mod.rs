/// Configuration subsystem - Editor settings and preferences
///
/// Loads settings from a .redrc file and applies them to a session before
/// command-line flags get their say.
pub mod rc;

pub use rc::{RcConfig, RcLoader};

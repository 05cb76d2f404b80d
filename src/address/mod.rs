/// Address subsystem - Parsing and resolving line addresses
///
/// An address string is split into atoms by the tokenizer, folded into a line
/// number by the resolver, and paired up with a separator by the range module.

pub mod range;
pub mod resolver;
pub mod tokenizer;

pub use range::{AddressRange, LineRange, Separator};
pub use resolver::LineLookup;
pub use tokenizer::{Address, Atom};

//! Note templates: built-in definitions, the prompt compiler, and the
//! legacy flat-prompt parser used when seeding.

pub mod builtin;
pub mod compiler;
pub mod parser;

pub use builtin::{BuiltinTemplate, BUILTIN_TEMPLATES};
pub use compiler::compile;
pub use parser::{leading_instructions, parse_sections};

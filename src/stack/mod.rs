//! Language runtimes a submission can target.
//!
//! Each [`LanguageId`] maps to one [`Runtime`] capability object in the
//! [`RuntimeRegistry`]. The validator asks a runtime how its source is lexed;
//! the generator asks it for a base image, a dependency step and a start
//! command.

#[macro_use]
pub mod id_enum_macro;

pub mod language_id;
pub mod registry;
pub mod runtime;

pub use language_id::{LanguageId, UnknownLanguage};
pub use registry::RuntimeRegistry;
pub use runtime::{EntrypointEvidence, LexicalProfile, Runtime, StringDelimiter};

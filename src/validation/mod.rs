//! Source validation stage

pub mod lexer;
pub mod rules;
pub mod validator;

pub use rules::SourceRule;
pub use validator::{default_rules, Validator};

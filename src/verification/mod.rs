//! Build-file verification stage

pub mod rules;
pub mod verifier;

pub use rules::VerificationRule;
pub use verifier::Verifier;

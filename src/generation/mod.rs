//! Build-file generation stage

pub mod generator;

pub use generator::{Entrypoint, GeneratedBuild, GenerationError, Generator, GeneratorConfig};

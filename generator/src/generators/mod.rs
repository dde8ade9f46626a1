#[cfg(feature = "generator-rust")]
mod rust;

#[cfg(not(any(feature = "generator-rust")))]
compile_error!("At least one generator must be enabled");

use clap::ValueEnum;
use dt_botdoc::Registry;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Generator {
    #[cfg(feature = "generator-rust")]
    Rust,
}

impl Generator {
    pub fn generate(
        &self,
        registry: &Registry,
        options: &Options,
    ) -> Result<GeneratedCode, RenderError> {
        match *self {
            #[cfg(feature = "generator-rust")]
            Self::Rust => rust::generate(registry, options),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Path under which request files refer to the generated types.
    pub types_module: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            types_module: "super::super::types".to_string(),
        }
    }
}

/// Source of one generated request file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedRequest {
    pub file_stem: String,
    pub source: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedCode {
    pub types: String,
    pub requests: Vec<GeneratedRequest>,
    /// Module file declaring every request file.
    pub requests_mod: String,
}

#[derive(Debug, Error)]
#[error("failed to render {item}: {message}")]
pub struct RenderError {
    pub item: String,
    pub message: String,
}

impl RenderError {
    pub fn new(item: impl Into<String>, message: impl ToString) -> Self {
        Self {
            item: item.into(),
            message: message.to_string(),
        }
    }
}

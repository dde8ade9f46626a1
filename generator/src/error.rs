use std::{io, path::PathBuf};

use dt_botdoc::ExtractError;
use thiserror::Error;

use crate::{generators::RenderError, output::OutputError};

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read {}", path.display())]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to extract the API reference")]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

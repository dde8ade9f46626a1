use std::{fs, path::PathBuf};

use tracing::info;

use crate::error::GeneratorError;

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Reads the reference page from a URL or a local file.
pub fn load(input: &str) -> Result<String, GeneratorError> {
    if is_url(input) {
        info!(url = input, "downloading API reference");
        fetch(input).map_err(|source| GeneratorError::Fetch {
            url: input.to_string(),
            source,
        })
    } else {
        info!(path = input, "reading API reference");
        fs::read_to_string(input).map_err(|source| GeneratorError::ReadInput {
            path: PathBuf::from(input),
            source,
        })
    }
}

fn fetch(url: &str) -> Result<String, reqwest::Error> {
    reqwest::blocking::get(url)?.error_for_status()?.text()
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("content container <div id={id:?}> not found in document")]
    ContentNotFound { id: &'static str },
    #[error("unexpected number of columns ({columns}) in fields table of section {section:?}")]
    UnexpectedTableShape { section: String, columns: usize },
}

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::generators::GeneratedCode;

pub const TYPES_FILE: &str = "types.rs";
pub const REQUESTS_DIR: &str = "requests";
pub const REQUESTS_MOD: &str = "mod.rs";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to clear directory {}", path.display())]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn write_file(path: PathBuf, contents: &str) -> Result<(), OutputError> {
    debug!(path = %path.display(), "writing");
    fs::write(&path, contents).map_err(|source| OutputError::Write { path, source })
}

/// Writes `types.rs` and the `requests` module into `dir`.
///
/// The requests directory is recreated from scratch so methods removed from the reference do not
/// linger.
pub fn write(dir: &Path, code: &GeneratedCode) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|source| OutputError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    write_file(dir.join(TYPES_FILE), &code.types)?;

    let requests_dir = dir.join(REQUESTS_DIR);
    match fs::remove_dir_all(&requests_dir) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(OutputError::RemoveDir {
                path: requests_dir,
                source,
            })
        }
    }
    fs::create_dir(&requests_dir).map_err(|source| OutputError::CreateDir {
        path: requests_dir.clone(),
        source,
    })?;

    for request in &code.requests {
        write_file(
            requests_dir.join(format!("{}.rs", request.file_stem)),
            &request.source,
        )?;
    }
    write_file(requests_dir.join(REQUESTS_MOD), &code.requests_mod)?;

    info!(
        dir = %dir.display(),
        requests = code.requests.len(),
        "wrote generated sources"
    );
    Ok(())
}

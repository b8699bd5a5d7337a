//! Mapping album directories on the importing host to paths below the
//! media server's library root.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// A `/`-separated path relative to the library root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativePath(pub String);

impl RelativePath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RelativePath {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathResolutionError {
    #[error("{item} is not inside the library directory {root}")]
    NotUnderRoot { item: PathBuf, root: PathBuf },
    #[error("path {path} is not valid UTF-8")]
    NonUtf8 { path: PathBuf },
}

/// Express `item_dir` relative to `library_dir`.
///
/// Matching is component-wise, so `/data/music2` is not inside `/data/music`
/// and trailing separators on either side do not matter.
pub fn relative_album_path(
    item_dir: &Path,
    library_dir: &Path,
) -> Result<RelativePath, PathResolutionError> {
    let rest = item_dir
        .strip_prefix(library_dir)
        .map_err(|_| PathResolutionError::NotUnderRoot {
            item: item_dir.to_path_buf(),
            root: library_dir.to_path_buf(),
        })?;

    let mut parts = Vec::new();
    for component in rest.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str().ok_or_else(|| PathResolutionError::NonUtf8 {
                    path: item_dir.to_path_buf(),
                })?;
                parts.push(part);
            }
            Component::CurDir => {}
            // `..` would climb back out of the library
            _ => {
                return Err(PathResolutionError::NotUnderRoot {
                    item: item_dir.to_path_buf(),
                    root: library_dir.to_path_buf(),
                })
            }
        }
    }

    Ok(RelativePath(parts.join("/")))
}

//! Error types for tiles-dl
//!
//! Every failure a single download task can hit is represented here, so the
//! worker pool can log it with context and move on to the next task.

use std::fmt;
use std::path::PathBuf;

/// Which request of a task hit a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStep {
    /// The tile's `File:` page
    Page,
    /// The image the page points to
    Image,
}

impl fmt::Display for FetchStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStep::Page => f.write_str("page fetch"),
            FetchStep::Image => f.write_str("image fetch"),
        }
    }
}

/// Main error type for tiles-dl operations
#[derive(Debug)]
pub enum Error {
    /// Category code not recognized, or a category that has no index range
    InvalidCategory(String),

    /// Index outside the category's inclusive range
    InvalidIndex {
        category: String,
        index: u32,
    },

    /// Current working directory could not be determined
    PathResolution(std::io::Error),

    /// Transport-level HTTP failure (connect, timeout, body read)
    Upstream {
        step: FetchStep,
        source: reqwest::Error,
    },

    /// Page request answered with something other than 200 OK
    UnexpectedStatus {
        url: String,
        status: u16,
    },

    /// Page or selector could not be parsed
    Parse(String),

    /// Selector matched nothing, or the match carries no `src`
    SelectorNotFound(String),

    /// Destination directory could not be created
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Destination file could not be created or truncated
    FileCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Copying the response body into the destination file failed
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// A worker or the task producer died before reporting back
    Worker(String),

    /// File I/O error
    IoError(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCategory(category) => {
                write!(f, "Invalid tiles category '{}'", category)
            }
            Error::InvalidIndex { category, index } => {
                write!(f, "Invalid index {} for tiles category '{}'", index, category)
            }
            Error::PathResolution(_) => {
                write!(f, "Could not resolve working directory")
            }
            Error::Upstream { step, .. } => {
                write!(f, "Upstream error during {}", step)
            }
            Error::UnexpectedStatus { url, status } => {
                write!(f, "Unexpected status code {} from {}", status, url)
            }
            Error::Parse(msg) => {
                write!(f, "Parse error: {}", msg)
            }
            Error::SelectorNotFound(selector) => {
                write!(f, "{} not found", selector)
            }
            Error::DirectoryCreate { path, .. } => {
                write!(f, "Failed to create directory {}", path.display())
            }
            Error::FileCreate { path, .. } => {
                write!(f, "Failed to create file {}", path.display())
            }
            Error::Write { path, .. } => {
                write!(f, "Failed to write {}", path.display())
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::Worker(msg) => {
                write!(f, "Worker failure: {}", msg)
            }
            Error::IoError(_) => {
                write!(f, "I/O error")
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::PathResolution(err) | Error::IoError(err) => Some(err),
            Error::DirectoryCreate { source, .. }
            | Error::FileCreate { source, .. }
            | Error::Write { source, .. } => Some(source),
            Error::Upstream { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl Error {
    /// Transport failure while fetching a tile page
    pub fn page_fetch(source: reqwest::Error) -> Self {
        Error::Upstream {
            step: FetchStep::Page,
            source,
        }
    }

    /// Transport failure while fetching an image
    pub fn image_fetch(source: reqwest::Error) -> Self {
        Error::Upstream {
            step: FetchStep::Image,
            source,
        }
    }

    /// This error followed by every underlying cause, separated by `: `
    pub fn with_causes(&self) -> String {
        let mut message = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            message.push_str(": ");
            message.push_str(&err.to_string());
            cause = std::error::Error::source(err);
        }
        message
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

/// Convenience result type for tiles-dl operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_display_selector_not_found() {
        let err = Error::SelectorNotFound("#file > a > img".to_string());
        assert_eq!(err.to_string(), "#file > a > img not found");
    }

    #[test]
    fn test_display_invalid_index() {
        let err = Error::InvalidIndex {
            category: "z".to_string(),
            index: 8,
        };
        assert_eq!(err.to_string(), "Invalid index 8 for tiles category 'z'");
    }

    #[test]
    fn test_io_backed_variants_expose_source() {
        let err = Error::FileCreate {
            path: PathBuf::from("/nowhere/1m.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/nowhere/1m.png"));
        assert_eq!(err.with_causes(), "Failed to create file /nowhere/1m.png: denied");

        let err = Error::UnexpectedStatus {
            url: "http://wiki/File:1m.png".to_string(),
            status: 500,
        };
        assert!(err.source().is_none());
        assert_eq!(err.with_causes(), err.to_string());
    }

    #[test]
    fn test_fetch_step_names() {
        assert_eq!(FetchStep::Page.to_string(), "page fetch");
        assert_eq!(FetchStep::Image.to_string(), "image fetch");
    }
}

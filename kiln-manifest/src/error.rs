use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type for manifest operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("failed to read '{path}'")]
    #[diagnostic(help("the project directory must contain a package.json"))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse package.json")]
    #[diagnostic(code(kiln::manifest::parse))]
    Parse {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid package.json: {message}")]
    #[diagnostic(code(kiln::manifest::invalid))]
    Validation { message: String },
}

impl Error {
    /// Create an io error with the offending path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Box<Self> {
        Box::new(Error::Io { path: path.into(), source })
    }

    /// Create a parse error from a serde_json error
    pub fn parse(source: serde_json::Error) -> Box<Self> {
        Box::new(Error::Parse { source })
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Box<Self> {
        Box::new(Error::Validation { message: message.into() })
    }
}

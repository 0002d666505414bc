use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Result type for engine operations (boxed to reduce size on stack)
pub type Result<T> = std::result::Result<T, Box<Error>>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("plugin '{id}' failed")]
    #[diagnostic(code(kiln::generator::plugin_failed))]
    PluginExecution {
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("config file '{filename}' for '{key}' already exists")]
    #[diagnostic(
        code(kiln::generator::transform_conflict),
        help("remove the existing file or keep the '{key}' field in package.json")
    )]
    TransformConflict { key: String, filename: String },

    #[error("cannot render '{key}' as {format}: {reason}")]
    #[diagnostic(code(kiln::generator::transform_render))]
    TransformRender {
        key: String,
        format: &'static str,
        reason: String,
    },

    #[error("failed to parse '{path}' for code injection: {reason}")]
    #[diagnostic(
        code(kiln::generator::codemod_parse),
        help("the file must be valid source so injected code lands in a known place")
    )]
    CodemodParse {
        path: String,
        reason: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Manifest(#[from] Box<kiln_manifest::Error>),

    #[error("generate() was already run on this instance")]
    #[diagnostic(help("construct a fresh Generator for every generation run"))]
    AlreadyRun,

    #[error("failed to render template from '{path}'")]
    Template {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write the project to '{context}'")]
    Flush {
        context: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Wrap a plugin-raised error with the offending plugin id
    pub fn plugin(id: impl Into<String>, source: eyre::Report) -> Box<Self> {
        Box::new(Error::PluginExecution {
            id: id.into(),
            source: source.into(),
        })
    }

    /// Create a codemod parse error with the offending source attached
    pub fn codemod(
        path: impl Into<String>,
        reason: impl Into<String>,
        src: &str,
        span: Option<SourceSpan>,
    ) -> Box<Self> {
        let path = path.into();
        Box::new(Error::CodemodParse {
            src: NamedSource::new(&path, src.to_string()),
            path,
            reason: reason.into(),
            span,
        })
    }

    /// Create a transform conflict error
    pub fn transform_conflict(key: impl Into<String>, filename: impl Into<String>) -> Box<Self> {
        Box::new(Error::TransformConflict {
            key: key.into(),
            filename: filename.into(),
        })
    }
}

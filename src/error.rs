use std::path::PathBuf;
use thiserror::Error;

/// Builds a [`FormatError`] from a message or a format string.
macro_rules! malformed {
    ($msg:expr) => {
        crate::error::FormatError::new($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        crate::error::FormatError::new(format!($fmt, $($arg)*))
    };
}

pub(crate) use malformed;

/// A violation of the binary class format, without unit context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct FormatError {
    pub message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that abort an analysis run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("malformed class {unit}: {source}")]
    MalformedClass {
        unit: String,
        #[source]
        source: FormatError,
    },

    #[error("failed to parse layout {}: {message}", path.display())]
    XmlParse { path: PathBuf, message: String },

    #[error("I/O error on {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl AnalysisError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;

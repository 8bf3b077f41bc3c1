use crate::decoration::DecorationError;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("unknown grouping strategy: {0}")]
    UnknownGroupingStrategy(String),

    #[error("unknown path sort strategy: {0}")]
    UnknownPathSortStrategy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A dependency specification that no registered module could satisfy.
    #[error(
        "module `{module}` has an unfulfilled dependency `{spec}` (tried: {})",
        tried_list(.tried)
    )]
    UnfulfilledDependency {
        module: String,
        spec: String,
        tried: Vec<String>,
    },

    /// A type could not be decorated while walking the API surface.
    #[error("{source} (at {path})")]
    Traversal {
        path: String,
        #[source]
        source: DecorationError,
    },
}

fn tried_list(tried: &[String]) -> String {
    if tried.is_empty() {
        "no modules".to_string()
    } else {
        tried.join(", ")
    }
}

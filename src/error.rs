use thiserror::Error;

/// Domain failures that callers may want to distinguish
#[derive(Error, Debug)]
pub enum ScoutError {
    /// The listing marker never became visible on a results page
    #[error("page {page} did not load any listings")]
    PageLoad { page: usize },

    /// Free-text location could not be turned into a search
    #[error("{0}")]
    InvalidLocation(String),

    /// Page bound was neither a positive number nor "all"
    #[error("invalid page count: {0}")]
    InvalidPaging(String),

    /// Writing an export file failed
    #[error("export failed: {0}")]
    Export(String),
}

use thiserror::Error;

/// Everything that can go wrong between scraping the catalog page and the
/// last blob upload.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage authentication failed: {0}")]
    Auth(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("failed to parse page: {0}")]
    Parse(String),

    #[error("transfer of {item} failed: {reason}")]
    Transfer { item: String, reason: String },

    #[error("invalid input: {0}")]
    Input(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl PipelineError {
    pub fn transfer(item: impl ToString, reason: impl ToString) -> Self {
        PipelineError::Transfer {
            item: item.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn fetch(url: impl ToString, reason: impl ToString) -> Self {
        PipelineError::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Fatal errors abort a batch no matter which failure policy is in use.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PipelineError::Config(_) | PipelineError::Auth(_))
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Config(_) | PipelineError::Input(_) => 2,
            _ => 1,
        }
    }
}

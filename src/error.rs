use thiserror::Error;

/// Unified error type for git-flow operations
#[derive(Error, Debug)]
pub enum GitFlowError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Unresolved merge conflicts; `remediation` is the exact command sequence for the operator
    #[error(
        "Merge conflict: unresolved files [{}] [from {source_ref} to {target_branch}]\n{remediation}",
        join_files(.files)
    )]
    Conflict {
        files: Vec<String>,
        source_ref: String,
        target_branch: String,
        remediation: String,
    },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("External command failed: {command} (exit code {})\n{stderr}", exit_code(.code))]
    ExternalFailure {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_files(files: &[String]) -> String {
    files.join(", ")
}

fn exit_code(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string())
}

/// Convenience type alias for Results in git-flow
pub type Result<T> = std::result::Result<T, GitFlowError>;

impl GitFlowError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        GitFlowError::InvalidFormat(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GitFlowError::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        GitFlowError::AlreadyExists(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        GitFlowError::PreconditionFailed(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GitFlowError::Config(msg.into())
    }
}

impl From<toml::de::Error> for GitFlowError {
    fn from(err: toml::de::Error) -> Self {
        GitFlowError::Config(err.to_string())
    }
}

impl From<regex::Error> for GitFlowError {
    fn from(err: regex::Error) -> Self {
        GitFlowError::Config(format!("invalid pattern: {}", err))
    }
}

use crate::models::upload::UploadVerdict;
use crate::services::session::Session;

/// Problems caught locally, before anything is sent to the service.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Please log in first.")]
    NotLoggedIn,

    #[error("Please upload at least {required} selfies.")]
    InsufficientUploads { count: usize, required: usize },

    #[error("One or more files are invalid.")]
    InvalidUploads { rejected: Vec<(String, UploadVerdict)> },

    #[error("Unknown package: {0}")]
    UnknownPlan(String),

    #[error("Invalid input: {0}")]
    Invalid(#[from] garde::Report),
}

/// Fail with [`ValidationError::NotLoggedIn`] when login is required and
/// the session has no credential.
pub fn require_session(session: &Session, require_login: bool) -> Result<(), ValidationError> {
    if require_login && !session.is_authenticated() {
        return Err(ValidationError::NotLoggedIn);
    }
    Ok(())
}

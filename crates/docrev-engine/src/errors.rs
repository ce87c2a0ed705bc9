use docrev_remote::RemoteError;

#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("remote client unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote call failed: {0}")]
    Transport(String),

    #[error("invalid input: {0}")]
    Validation(String),
}

impl From<RemoteError> for EngineError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotInstalled | RemoteError::NotAuthenticated(_) => {
                Self::RemoteUnavailable(err.to_string())
            }
            RemoteError::NotFound(msg) => Self::NotFound(msg),
            RemoteError::Transport(msg) => Self::Transport(msg),
        }
    }
}

use std::{ops::Deref, sync::Arc};

use gh::GhCli;

mod gh;
pub mod models;
pub mod traits;

pub use traits::RemoteRepository;

#[derive(thiserror::Error, Debug)]
pub enum RemoteError {
    #[error("gh is not installed, get it from https://cli.github.com")]
    NotInstalled,

    #[error("gh is not logged in, run `gh auth login`: {0}")]
    NotAuthenticated(String),

    #[error("{0}")]
    NotFound(String),

    #[error("remote call failed: {0}")]
    Transport(String),
}

/// Handle to the configured remote review platform.
///
/// Everything behind it goes through the [`RemoteRepository`] trait, so
/// callers never see which transport is in play.
#[derive(Clone)]
pub struct RemoteProvider {
    provider: Arc<dyn RemoteRepository>,
}

impl RemoteProvider {
    pub fn gh() -> Result<Self, RemoteError> {
        let gh = Arc::new(GhCli::new()?);

        Ok(Self { provider: gh })
    }

    pub fn new(provider: Arc<dyn RemoteRepository>) -> Self {
        Self { provider }
    }
}

impl Deref for RemoteProvider {
    type Target = Arc<dyn RemoteRepository>;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

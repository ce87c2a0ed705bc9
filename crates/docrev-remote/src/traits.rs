use async_trait::async_trait;

use crate::{
    models::{PrCommitWire, PrFileWire, PrInfoWire, RemoteReviewCommentWire, RepoId, ReviewVerdict},
    RemoteError,
};

/// The consumed contract towards the remote review platform.
///
/// `repo` is `None` for the repository the working directory belongs to;
/// passing an explicit [`RepoId`] redirects the query, which is how
/// fork-parent lookups are expressed.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    async fn pr_info(&self, number: u64, repo: Option<&RepoId>)
        -> Result<PrInfoWire, RemoteError>;

    async fn pr_files(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<PrFileWire>, RemoteError>;

    async fn pr_commits(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<PrCommitWire>, RemoteError>;

    async fn pr_review_comments(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<RemoteReviewCommentWire>, RemoteError>;

    /// Creates a comment on the pull request and returns the created remote
    /// id.
    async fn create_review_comment(&self, number: u64, body: &str) -> Result<u64, RemoteError>;

    async fn submit_review(&self, number: u64, verdict: ReviewVerdict) -> Result<(), RemoteError>;

    /// Checks out the pull request head under `local_branch`, fast-forwarding
    /// when the branch already exists.
    async fn checkout_branch(&self, number: u64, local_branch: &str) -> Result<(), RemoteError>;

    /// Resolves the pull request associated with the checked-out branch, if
    /// any.
    async fn current_pr_number(&self, repo: Option<&RepoId>) -> Result<Option<u64>, RemoteError>;

    async fn repo_fork_parent(&self) -> Result<Option<RepoId>, RemoteError>;

    fn is_installed(&self) -> bool;

    async fn is_authenticated(&self) -> bool;
}

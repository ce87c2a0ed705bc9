use chrono::{DateTime, Utc};
use docrev_remote::{
    models::{PrCommitWire, PrFileWire, PrInfoWire, RemoteReviewCommentWire, RepoId},
    RemoteError, RemoteProvider,
};

use crate::errors::EngineError;

#[derive(Debug, Clone)]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub author: String,
    pub body: Option<String>,
    pub base_branch: String,
    pub head_branch: String,
    pub url: String,
}

impl From<PrInfoWire> for PrInfo {
    fn from(wire: PrInfoWire) -> Self {
        Self {
            number: wire.number,
            title: wire.title,
            state: wire.state,
            author: wire.user.login,
            body: wire.body,
            base_branch: wire.base.name,
            head_branch: wire.head.name,
            url: wire.html_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
    Renamed,
}

#[derive(Debug, Clone)]
pub struct PrFileChange {
    pub path: String,
    pub kind: ChangeKind,
    pub additions: u64,
    pub deletions: u64,
    pub previous_path: Option<String>,
}

impl From<PrFileWire> for PrFileChange {
    fn from(wire: PrFileWire) -> Self {
        let kind = match wire.status.as_str() {
            "added" => ChangeKind::Added,
            "removed" => ChangeKind::Removed,
            "renamed" => ChangeKind::Renamed,
            _ => ChangeKind::Modified,
        };

        Self {
            path: wire.filename,
            kind,
            additions: wire.additions,
            deletions: wire.deletions,
            previous_path: wire.previous_filename,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrCommit {
    pub sha: String,
    pub message: String,
    pub author: String,
    pub date: DateTime<Utc>,
}

impl From<PrCommitWire> for PrCommit {
    fn from(wire: PrCommitWire) -> Self {
        Self {
            sha: wire.sha,
            message: wire.commit.message,
            author: wire.commit.author.name,
            date: wire.commit.author.date,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrDetails {
    pub info: PrInfo,
    pub files: Vec<PrFileChange>,
    pub commits: Vec<PrCommit>,
    pub total_files: usize,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub total_commits: usize,
}

/// Read-only view of remote pull-request state, normalized from the wire
/// shapes. Nothing is cached, every call fetches fresh.
///
/// When the local repository is a fork, metadata queries are transparently
/// redirected to the fork parent, pull requests against the upstream project
/// are not visible from the fork's own identity.
#[derive(Clone)]
pub struct PrMetadataService {
    provider: RemoteProvider,
}

impl PrMetadataService {
    pub fn new(provider: RemoteProvider) -> Self {
        Self { provider }
    }

    /// Checked proactively before PR operations so callers get actionable
    /// guidance instead of a failed call.
    pub async fn ensure_available(&self) -> Result<(), EngineError> {
        if !self.provider.is_installed() {
            return Err(EngineError::RemoteUnavailable(
                "gh is not installed, get it from https://cli.github.com".to_string(),
            ));
        }
        if !self.provider.is_authenticated().await {
            return Err(EngineError::RemoteUnavailable(
                "gh is not logged in, run `gh auth login`".to_string(),
            ));
        }

        Ok(())
    }

    async fn target_repo(&self) -> Result<Option<RepoId>, EngineError> {
        let parent = self.provider.repo_fork_parent().await?;
        if let Some(parent) = &parent {
            tracing::debug!("fork detected, redirecting queries to {parent}");
        }

        Ok(parent)
    }

    pub async fn pr_info(&self, number: u64) -> Result<Option<PrInfo>, EngineError> {
        let repo = self.target_repo().await?;

        match self.provider.pr_info(number, repo.as_ref()).await {
            Ok(wire) => Ok(Some(wire.into())),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn pr_files(&self, number: u64) -> Result<Vec<PrFileChange>, EngineError> {
        let repo = self.target_repo().await?;
        let files = self.provider.pr_files(number, repo.as_ref()).await?;

        Ok(files.into_iter().map(Into::into).collect())
    }

    pub async fn pr_commits(&self, number: u64) -> Result<Vec<PrCommit>, EngineError> {
        let repo = self.target_repo().await?;
        let commits = self.provider.pr_commits(number, repo.as_ref()).await?;

        Ok(commits.into_iter().map(Into::into).collect())
    }

    /// Info, files and commits fetched concurrently. A missing PR yields
    /// `None`; files or commits failing degrades those lists to empty rather
    /// than failing the aggregate.
    pub async fn pr_details(&self, number: u64) -> Result<Option<PrDetails>, EngineError> {
        let repo = self.target_repo().await?;

        let (info, files, commits) = tokio::join!(
            self.provider.pr_info(number, repo.as_ref()),
            self.provider.pr_files(number, repo.as_ref()),
            self.provider.pr_commits(number, repo.as_ref()),
        );

        let info: PrInfo = match info {
            Ok(wire) => wire.into(),
            Err(RemoteError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let files: Vec<PrFileChange> = files
            .map(|fs| fs.into_iter().map(Into::into).collect())
            .unwrap_or_else(|e| {
                tracing::warn!("failed to fetch files for pr {number}: {e}");
                Vec::new()
            });
        let commits: Vec<PrCommit> = commits
            .map(|cs| cs.into_iter().map(Into::into).collect())
            .unwrap_or_else(|e| {
                tracing::warn!("failed to fetch commits for pr {number}: {e}");
                Vec::new()
            });

        Ok(Some(PrDetails {
            total_files: files.len(),
            total_additions: files.iter().map(|f| f.additions).sum(),
            total_deletions: files.iter().map(|f| f.deletions).sum(),
            total_commits: commits.len(),
            info,
            files,
            commits,
        }))
    }

    /// Raw remote review comments for reconciliation.
    pub async fn pr_comments(
        &self,
        number: u64,
    ) -> Result<Vec<RemoteReviewCommentWire>, EngineError> {
        let repo = self.target_repo().await?;

        Ok(self
            .provider
            .pr_review_comments(number, repo.as_ref())
            .await?)
    }

    /// PR of the checked-out branch, looked up in the current repository
    /// first and in the fork parent second.
    pub async fn current_pr_number(&self) -> Result<Option<u64>, EngineError> {
        if let Some(number) = self.provider.current_pr_number(None).await? {
            return Ok(Some(number));
        }

        if let Some(parent) = self.provider.repo_fork_parent().await? {
            return Ok(self.provider.current_pr_number(Some(&parent)).await?);
        }

        Ok(None)
    }

    /// Checks the PR out under a deterministic local branch name and returns
    /// that name.
    pub async fn checkout_pr(&self, number: u64, title: &str) -> Result<String, EngineError> {
        let branch = format!("pr-{number}/{}", slugify(title));
        self.provider.checkout_branch(number, &branch).await?;

        tracing::info!("checked out pr {number} as {branch}");

        Ok(branch)
    }

    /// Changed files this tool can review: inside the locale's directory
    /// convention and carrying the documentation extension.
    pub fn reviewable_files(
        &self,
        files: &[PrFileChange],
        locale: &str,
    ) -> Vec<PrFileChange> {
        files
            .iter()
            .filter(|f| is_locale_path(&f.path, locale) && f.path.ends_with(".md"))
            .cloned()
            .collect()
    }
}

fn is_locale_path(path: &str, locale: &str) -> bool {
    path.starts_with(&format!("content/{locale}/"))
        || path.starts_with(&format!("i18n/{locale}/"))
        || path.contains(&format!("/{locale}/"))
        || path.contains(&format!("_{locale}_"))
}

/// Lowercased, non-alphanumeric runs (Hangul counts as alphanumeric here)
/// collapsed to single hyphens, trimmed, capped at 50 characters.
fn slugify(title: &str) -> String {
    let mut slug = String::new();
    let mut pending_hyphen = false;

    for c in title.to_lowercase().chars() {
        let keep = c.is_ascii_alphanumeric() || ('\u{ac00}'..='\u{d7a3}').contains(&c);
        if keep {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug.chars().take(50).collect()
}

use std::{path::PathBuf, process::Stdio};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use which::which;

use crate::{
    models::{
        CreatedCommentWire, PrCommitWire, PrFileWire, PrInfoWire, PrNumberWire,
        RemoteReviewCommentWire, RepoId, RepoViewWire, ReviewVerdict,
    },
    traits::RemoteRepository,
    RemoteError,
};

/// `RemoteRepository` backed by the `gh` command line client.
///
/// Every call shells out and parses JSON stdout. Request bodies are piped
/// over stdin (`--input -`), so user-authored text never crosses a shell
/// quoting boundary.
pub struct GhCli {
    program: PathBuf,
}

impl GhCli {
    pub fn new() -> Result<Self, RemoteError> {
        let program = which("gh").map_err(|_| {
            tracing::debug!("gh is not on path");
            RemoteError::NotInstalled
        })?;

        tracing::debug!("gh is on path: {}", program.display());

        Ok(Self { program })
    }

    async fn run(&self, args: &[&str], input: Option<&str>) -> Result<String, RemoteError> {
        tracing::trace!("gh {}", args.join(" "));

        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| RemoteError::Transport(format!("failed to spawn gh: {e}")))?;

        if let Some(input) = input {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| RemoteError::Transport("gh stdin was not captured".into()))?;
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| RemoteError::Transport(format!("failed to write gh stdin: {e}")))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RemoteError::Transport(format!("gh did not finish: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("gh failed: {stderr}");

            let lowered = stderr.to_lowercase();
            if lowered.contains("http 404")
                || lowered.contains("not found")
                || lowered.contains("could not resolve")
                || lowered.contains("no pull requests found")
            {
                return Err(RemoteError::NotFound(stderr));
            }
            if lowered.contains("auth login") || lowered.contains("authentication") {
                return Err(RemoteError::NotAuthenticated(stderr));
            }

            return Err(RemoteError::Transport(stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn api<T: DeserializeOwned>(
        &self,
        args: &[&str],
        input: Option<&str>,
    ) -> Result<T, RemoteError> {
        let raw = self.run(args, input).await?;

        serde_json::from_str(&raw)
            .map_err(|e| RemoteError::Transport(format!("unexpected gh response: {e}")))
    }

    /// Path prefix for `gh api`. When no repository is given the literal
    /// `{owner}/{repo}` placeholders are left in, which gh substitutes from
    /// the working directory's remote.
    fn repo_path(repo: Option<&RepoId>) -> String {
        match repo {
            Some(repo) => format!("repos/{repo}"),
            None => "repos/{owner}/{repo}".to_string(),
        }
    }
}

#[async_trait]
impl RemoteRepository for GhCli {
    async fn pr_info(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<PrInfoWire, RemoteError> {
        let path = format!("{}/pulls/{number}", Self::repo_path(repo));

        self.api(&["api", &path], None).await
    }

    async fn pr_files(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<PrFileWire>, RemoteError> {
        let path = format!("{}/pulls/{number}/files?per_page=100", Self::repo_path(repo));

        self.api(&["api", "--paginate", &path], None).await
    }

    async fn pr_commits(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<PrCommitWire>, RemoteError> {
        let path = format!(
            "{}/pulls/{number}/commits?per_page=100",
            Self::repo_path(repo)
        );

        self.api(&["api", "--paginate", &path], None).await
    }

    async fn pr_review_comments(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<Vec<RemoteReviewCommentWire>, RemoteError> {
        let path = format!(
            "{}/pulls/{number}/comments?per_page=100",
            Self::repo_path(repo)
        );

        self.api(&["api", "--paginate", &path], None).await
    }

    async fn create_review_comment(&self, number: u64, body: &str) -> Result<u64, RemoteError> {
        let path = format!("{}/issues/{number}/comments", Self::repo_path(None));
        let payload = serde_json::json!({ "body": body }).to_string();

        let created: CreatedCommentWire = self
            .api(&["api", "-X", "POST", &path, "--input", "-"], Some(&payload))
            .await?;

        Ok(created.id)
    }

    async fn submit_review(&self, number: u64, verdict: ReviewVerdict) -> Result<(), RemoteError> {
        let path = format!("{}/pulls/{number}/reviews", Self::repo_path(None));
        let payload = serde_json::json!({ "event": verdict.as_event() }).to_string();

        self.run(&["api", "-X", "POST", &path, "--input", "-"], Some(&payload))
            .await?;

        Ok(())
    }

    async fn checkout_branch(&self, number: u64, local_branch: &str) -> Result<(), RemoteError> {
        let number = number.to_string();

        self.run(
            &["pr", "checkout", &number, "--branch", local_branch],
            None,
        )
        .await?;

        Ok(())
    }

    async fn current_pr_number(&self, repo: Option<&RepoId>) -> Result<Option<u64>, RemoteError> {
        let repo = repo.map(|r| r.to_string());
        let mut args = vec!["pr", "view", "--json", "number"];
        if let Some(repo) = repo.as_deref() {
            args.push("--repo");
            args.push(repo);
        }

        match self.api::<PrNumberWire>(&args, None).await {
            Ok(pr) => Ok(Some(pr.number)),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn repo_fork_parent(&self) -> Result<Option<RepoId>, RemoteError> {
        let view: RepoViewWire = self.api(&["repo", "view", "--json", "parent"], None).await?;

        Ok(view
            .parent
            .map(|parent| RepoId::new(parent.owner.login, parent.name)))
    }

    fn is_installed(&self) -> bool {
        self.program.exists()
    }

    async fn is_authenticated(&self) -> bool {
        self.run(&["auth", "status"], None).await.is_ok()
    }
}

//! In-memory `RemoteRepository` double backing the service and sync tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::Utc;
use docrev_remote::{
    models::{
        BranchRefWire, CommitAuthorWire, CommitDetailWire, PrCommitWire, PrFileWire, PrInfoWire,
        ReactionsWire, RemoteReviewCommentWire, RepoId, ReviewVerdict, UserWire,
    },
    RemoteError, RemoteRepository,
};

#[derive(Default)]
pub(crate) struct FakeRemote {
    fork_parent: Option<RepoId>,
    prs: Mutex<HashMap<u64, PrInfoWire>>,
    files: Mutex<HashMap<u64, Vec<PrFileWire>>>,
    commits: Mutex<HashMap<u64, Vec<PrCommitWire>>>,
    review_comments: Mutex<HashMap<u64, Vec<RemoteReviewCommentWire>>>,
    current_pr: Mutex<Option<(Option<String>, u64)>>,
    queried: Mutex<Vec<Option<String>>>,
    checkouts: Mutex<Vec<(u64, String)>>,
    created_bodies: Mutex<Vec<String>>,
    reviews: Mutex<Vec<(u64, &'static str)>>,
    fail_files: Mutex<bool>,
    fail_create_containing: Mutex<Option<String>>,
    next_comment_id: AtomicU64,
}

impl FakeRemote {
    pub(crate) fn with_fork_parent(mut self, parent: RepoId) -> Self {
        self.fork_parent = Some(parent);
        self
    }

    pub(crate) fn put_pr(&self, number: u64, title: &str, state: &str) {
        self.prs.lock().unwrap().insert(
            number,
            PrInfoWire {
                number,
                title: title.to_string(),
                state: state.to_string(),
                body: None,
                html_url: format!("https://example.com/pull/{number}"),
                user: UserWire {
                    login: "author".to_string(),
                },
                base: BranchRefWire {
                    name: "main".to_string(),
                },
                head: BranchRefWire {
                    name: "topic".to_string(),
                },
            },
        );
    }

    pub(crate) fn put_file(
        &self,
        number: u64,
        path: &str,
        status: &str,
        additions: u64,
        deletions: u64,
    ) {
        self.files
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(PrFileWire {
                filename: path.to_string(),
                status: status.to_string(),
                additions,
                deletions,
                previous_filename: None,
            });
    }

    pub(crate) fn put_commit(&self, number: u64, sha: &str, message: &str) {
        self.commits
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(PrCommitWire {
                sha: sha.to_string(),
                commit: CommitDetailWire {
                    message: message.to_string(),
                    author: CommitAuthorWire {
                        name: "author".to_string(),
                        date: Utc::now(),
                    },
                },
            });
    }

    pub(crate) fn put_review_comment(&self, number: u64, id: u64, path: &str, line: u64, body: &str) {
        self.review_comments
            .lock()
            .unwrap()
            .entry(number)
            .or_default()
            .push(RemoteReviewCommentWire {
                id,
                path: path.to_string(),
                line: Some(line),
                original_line: None,
                body: body.to_string(),
                user: UserWire {
                    login: "upstream-reviewer".to_string(),
                },
                created_at: Utc::now(),
                diff_hunk: String::new(),
                reactions: ReactionsWire::default(),
            });
    }

    pub(crate) fn set_current_pr(&self, repo: Option<String>, number: u64) {
        *self.current_pr.lock().unwrap() = Some((repo, number));
    }

    pub(crate) fn fail_files(&self) {
        *self.fail_files.lock().unwrap() = true;
    }

    pub(crate) fn fail_create_containing(&self, needle: &str) {
        *self.fail_create_containing.lock().unwrap() = Some(needle.to_string());
    }

    pub(crate) fn queried_repos(&self) -> Vec<Option<String>> {
        self.queried.lock().unwrap().clone()
    }

    pub(crate) fn checked_out(&self) -> Vec<(u64, String)> {
        self.checkouts.lock().unwrap().clone()
    }

    pub(crate) fn created_bodies(&self) -> Vec<String> {
        self.created_bodies.lock().unwrap().clone()
    }

    pub(crate) fn submitted_reviews(&self) -> Vec<(u64, &'static str)> {
        self.reviews.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteRepository for FakeRemote {
    async fn pr_info(
        &self,
        number: u64,
        repo: Option<&RepoId>,
    ) -> Result<PrInfoWire, RemoteError> {
        self.queried
            .lock()
            .unwrap()
            .push(repo.map(|r| r.to_string()));

        self.prs
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("pull request {number} not found")))
    }

    async fn pr_files(
        &self,
        number: u64,
        _repo: Option<&RepoId>,
    ) -> Result<Vec<PrFileWire>, RemoteError> {
        if *self.fail_files.lock().unwrap() {
            return Err(RemoteError::Transport("files endpoint down".to_string()));
        }

        Ok(self
            .files
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn pr_commits(
        &self,
        number: u64,
        _repo: Option<&RepoId>,
    ) -> Result<Vec<PrCommitWire>, RemoteError> {
        Ok(self
            .commits
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn pr_review_comments(
        &self,
        number: u64,
        _repo: Option<&RepoId>,
    ) -> Result<Vec<RemoteReviewCommentWire>, RemoteError> {
        Ok(self
            .review_comments
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_review_comment(&self, _number: u64, body: &str) -> Result<u64, RemoteError> {
        if let Some(needle) = self.fail_create_containing.lock().unwrap().as_deref() {
            if body.contains(needle) {
                return Err(RemoteError::Transport("comment rejected".to_string()));
            }
        }

        self.created_bodies.lock().unwrap().push(body.to_string());

        Ok(1000 + self.next_comment_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn submit_review(&self, number: u64, verdict: ReviewVerdict) -> Result<(), RemoteError> {
        self.reviews.lock().unwrap().push((number, verdict.as_event()));

        Ok(())
    }

    async fn checkout_branch(&self, number: u64, local_branch: &str) -> Result<(), RemoteError> {
        self.checkouts
            .lock()
            .unwrap()
            .push((number, local_branch.to_string()));

        Ok(())
    }

    async fn current_pr_number(&self, repo: Option<&RepoId>) -> Result<Option<u64>, RemoteError> {
        let current = self.current_pr.lock().unwrap();
        Ok(match current.as_ref() {
            Some((expected_repo, number))
                if *expected_repo == repo.map(|r| r.to_string()) =>
            {
                Some(*number)
            }
            _ => None,
        })
    }

    async fn repo_fork_parent(&self) -> Result<Option<RepoId>, RemoteError> {
        Ok(self.fork_parent.clone())
    }

    fn is_installed(&self) -> bool {
        true
    }

    async fn is_authenticated(&self) -> bool {
        true
    }
}

use serde::Deserialize;

/// `owner/name` pair identifying a repository on the remote platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approve,
    Comment,
    RequestChanges,
}

impl ReviewVerdict {
    /// Wire name of the review event on the remote API.
    pub fn as_event(&self) -> &'static str {
        match self {
            ReviewVerdict::Approve => "APPROVE",
            ReviewVerdict::Comment => "COMMENT",
            ReviewVerdict::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserWire {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BranchRefWire {
    #[serde(rename = "ref")]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrInfoWire {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    pub user: UserWire,
    pub base: BranchRefWire,
    pub head: BranchRefWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrFileWire {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthorWire {
    pub name: String,
    pub date: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetailWire {
    pub message: String,
    pub author: CommitAuthorWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrCommitWire {
    pub sha: String,
    pub commit: CommitDetailWire,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReactionsWire {
    #[serde(default)]
    pub total_count: u32,
    #[serde(default, rename = "+1")]
    pub plus_one: u32,
    #[serde(default, rename = "-1")]
    pub minus_one: u32,
    #[serde(default)]
    pub laugh: u32,
    #[serde(default)]
    pub confused: u32,
    #[serde(default)]
    pub heart: u32,
    #[serde(default)]
    pub hooray: u32,
    #[serde(default)]
    pub rocket: u32,
    #[serde(default)]
    pub eyes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteReviewCommentWire {
    pub id: u64,
    pub path: String,
    #[serde(default)]
    pub line: Option<u64>,
    #[serde(default)]
    pub original_line: Option<u64>,
    pub body: String,
    pub user: UserWire,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub diff_hunk: String,
    #[serde(default)]
    pub reactions: ReactionsWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedCommentWire {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoParentWire {
    pub name: String,
    pub owner: UserWire,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoViewWire {
    #[serde(default)]
    pub parent: Option<RepoParentWire>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrNumberWire {
    pub number: u64,
}

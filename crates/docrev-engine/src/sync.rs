use docrev_remote::{
    models::{RemoteReviewCommentWire, ReviewVerdict},
    RemoteProvider,
};

use crate::{
    comments::{CommentLifecycleManager, CommentType, ReviewComment, Suggestion},
    errors::EngineError,
    pr_meta::PrMetadataService,
};

/// Reconciliation between local comment state and the remote review
/// platform.
///
/// Importing maps remote comments to local values without deduplicating,
/// merge policy belongs to the caller. Pushing renders suggestion comments
/// as fenced ```suggestion``` blocks and records the created remote id back
/// onto the local comment, so a pushed comment leaves the unsynced set.
pub struct RemoteSyncAdapter {
    provider: RemoteProvider,
    metadata: PrMetadataService,
}

impl RemoteSyncAdapter {
    pub fn new(provider: RemoteProvider) -> Self {
        let metadata = PrMetadataService::new(provider.clone());

        Self { provider, metadata }
    }

    /// Fetches the PR's review comments and maps each to a local
    /// `ReviewComment` for the caller to merge.
    pub async fn import_remote_comments(
        &self,
        number: u64,
    ) -> Result<Vec<ReviewComment>, EngineError> {
        let wire = self.metadata.pr_comments(number).await?;
        tracing::debug!("importing {} remote comments from pr {number}", wire.len());

        Ok(wire.into_iter().map(comment_from_remote).collect())
    }

    /// Creates the remote counterpart of one local comment and returns the
    /// created remote id.
    pub async fn push_comment(
        &self,
        comment: &ReviewComment,
        number: u64,
    ) -> Result<u64, EngineError> {
        let body = render_comment_body(comment);

        Ok(self.provider.create_review_comment(number, &body).await?)
    }

    /// Pushes every unresolved comment that has no remote id yet.
    ///
    /// With a verdict, a single review action covers the whole PR and the
    /// candidate count is returned. Without one, candidates are pushed
    /// sequentially; a single failure is logged and skipped, the rest of the
    /// batch continues, and the count of successful pushes is returned.
    pub async fn push_all_unsynced(
        &self,
        comments: &mut CommentLifecycleManager,
        number: u64,
        verdict: Option<ReviewVerdict>,
    ) -> Result<usize, EngineError> {
        let candidates: Vec<ReviewComment> = comments
            .unresolved_comments()
            .into_iter()
            .filter(|c| c.remote_comment_id.is_none())
            .collect();

        if let Some(verdict) = verdict {
            self.provider.submit_review(number, verdict).await?;
            tracing::info!(
                "submitted {} review for pr {number} covering {} comments",
                verdict.as_event(),
                candidates.len()
            );
            return Ok(candidates.len());
        }

        let mut pushed = 0;
        for comment in &candidates {
            match self.push_comment(comment, number).await {
                Ok(remote_id) => {
                    comments.record_remote_id(&comment.id, remote_id).await?;
                    pushed += 1;
                }
                Err(e) => {
                    tracing::warn!("failed to push comment {}: {e}", comment.id);
                }
            }
        }

        tracing::info!("pushed {pushed}/{} comments to pr {number}", candidates.len());

        Ok(pushed)
    }

    /// Convenience pass-through for callers that did not name a target PR.
    pub async fn current_pr_number(&self) -> Result<Option<u64>, EngineError> {
        self.metadata.current_pr_number().await
    }
}

fn render_comment_body(comment: &ReviewComment) -> String {
    match &comment.suggestion {
        Some(suggestion) => {
            let mut body = format!("```suggestion\n{}\n```", suggestion.suggested);
            if !comment.body.is_empty() {
                body.push_str("\n\n");
                body.push_str(&comment.body);
            }
            body
        }
        None => comment.body.clone(),
    }
}

fn comment_from_remote(wire: RemoteReviewCommentWire) -> ReviewComment {
    let (suggestion, body) = match extract_suggestion(&wire.body) {
        Some((suggested, remainder)) => (
            Some(Suggestion {
                // the original side is not recoverable from the remote API
                original: String::new(),
                suggested,
            }),
            remainder,
        ),
        None => (None, wire.body),
    };

    ReviewComment {
        id: format!("remote-{}", wire.id),
        file_path: wire.path,
        line_number: wire.line.or(wire.original_line).unwrap_or(1) as u32,
        author: wire.user.login,
        body,
        comment_type: if suggestion.is_some() {
            CommentType::Suggestion
        } else {
            CommentType::General
        },
        created_at: wire.created_at,
        resolved: false,
        replies: Vec::new(),
        suggestion,
        remote_comment_id: Some(wire.id),
    }
}

/// Splits a fenced ```suggestion``` block out of a comment body, returning
/// the fenced content and the remaining free text.
fn extract_suggestion(body: &str) -> Option<(String, String)> {
    let start = body.find("```suggestion")?;
    let fenced = &body[start..];
    let content_offset = fenced.find('\n')? + 1;
    let content = &fenced[content_offset..];
    let end = content.find("```")?;

    let suggested = content[..end].trim_end_matches('\n').to_string();

    let mut remainder = body[..start].trim().to_string();
    let tail = content[end + 3..].trim();
    if !tail.is_empty() {
        if !remainder.is_empty() {
            remainder.push_str("\n\n");
        }
        remainder.push_str(tail);
    }

    Some((suggested, remainder))
}

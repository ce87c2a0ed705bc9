use std::{path::Path, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    context::{Editor, ThreadRegistry, WorkspaceContext},
    errors::EngineError,
    store::{AnnotationStore, CommentMap},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentType {
    General,
    Suggestion,
    Question,
    Terminology,
    Grammar,
    Style,
}

/// Proposed literal replacement for the anchor line's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub original: String,
    pub suggested: String,
}

/// 1-based inclusive line range; `start` is the anchor line a comment is
/// attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: u32,
    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn line(line: u32) -> Self {
        Self::new(line, line)
    }
}

/// A line-anchored review comment.
///
/// Local comments are minted with a UUID; comments imported from the remote
/// review platform carry a `remote-<id>` id instead. The file path and line
/// number stay as recorded at creation even when the document drifts,
/// suggestion application verifies the line before touching it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewComment {
    pub id: String,
    pub file_path: String,
    pub line_number: u32,
    pub author: String,
    pub body: String,
    #[serde(rename = "type")]
    pub comment_type: CommentType,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
    #[serde(default)]
    pub replies: Vec<ReviewComment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_comment_id: Option<u64>,
}

impl ReviewComment {
    /// A comment that exists only locally and is still open.
    pub fn is_unsynced(&self) -> bool {
        !self.resolved && self.remote_comment_id.is_none()
    }
}

/// The single authority mutating comment state.
///
/// Owns an in-memory mirror of the annotation store, refreshed once at
/// construction, and flushes the whole map back after every mutation.
pub struct CommentLifecycleManager {
    store: AnnotationStore,
    context: WorkspaceContext,
    editor: Arc<dyn Editor>,
    comments: CommentMap,
    threads: Option<Arc<dyn ThreadRegistry>>,
}

impl CommentLifecycleManager {
    pub async fn new(
        store: AnnotationStore,
        context: WorkspaceContext,
        editor: Arc<dyn Editor>,
    ) -> Self {
        let comments = store.load().await;

        Self {
            store,
            context,
            editor,
            comments,
            threads: None,
        }
    }

    /// Lets the UI layer get told when a comment's live thread handle should
    /// be released.
    pub fn set_thread_registry(&mut self, threads: Arc<dyn ThreadRegistry>) {
        self.threads = Some(threads);
    }

    pub async fn add_comment(
        &mut self,
        file_path: &str,
        range: LineRange,
        body: &str,
        comment_type: CommentType,
    ) -> Result<ReviewComment, EngineError> {
        if comment_type == CommentType::Suggestion {
            return Err(EngineError::Validation(
                "suggestion comments are created through add_suggestion".to_string(),
            ));
        }

        self.mint(file_path, range, body, comment_type, None).await
    }

    pub async fn add_suggestion(
        &mut self,
        file_path: &str,
        range: LineRange,
        original: &str,
        suggested: &str,
        reason: &str,
    ) -> Result<ReviewComment, EngineError> {
        let suggestion = Suggestion {
            original: original.to_string(),
            suggested: suggested.to_string(),
        };

        self.mint(
            file_path,
            range,
            reason,
            CommentType::Suggestion,
            Some(suggestion),
        )
        .await
    }

    /// Appends a reply under an existing top-level comment.
    pub async fn add_reply(
        &mut self,
        parent_id: &str,
        body: &str,
    ) -> Result<ReviewComment, EngineError> {
        let reply = ReviewComment {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: String::new(),
            line_number: 0,
            author: self.context.user.clone(),
            body: body.to_string(),
            comment_type: CommentType::General,
            created_at: Utc::now(),
            resolved: false,
            replies: Vec::new(),
            suggestion: None,
            remote_comment_id: None,
        };

        let parent = self
            .find_mut(parent_id)
            .ok_or_else(|| EngineError::NotFound(format!("comment {parent_id} not found")))?;

        let mut reply = reply;
        reply.file_path = parent.file_path.clone();
        reply.line_number = parent.line_number;
        parent.replies.push(reply.clone());

        self.persist().await?;

        Ok(reply)
    }

    /// Inserts an already-built comment, typically one imported from the
    /// remote platform. Ids already present are skipped, the manager is the
    /// id-uniqueness authority; returns whether the comment was added.
    pub async fn insert_comment(&mut self, comment: ReviewComment) -> Result<bool, EngineError> {
        if self.find(&comment.id).is_some() {
            tracing::debug!("skipping duplicate comment {}", comment.id);
            return Ok(false);
        }

        self.comments
            .entry(comment.file_path.clone())
            .or_default()
            .push(comment);
        self.persist().await?;

        Ok(true)
    }

    /// Replaces the anchor line with the suggested text, then resolves the
    /// comment. The comment stays open when the edit fails or when the line
    /// no longer matches `suggestion.original` (imports carry an empty
    /// `original` and skip that check).
    pub async fn apply_suggestion(&mut self, id: &str) -> Result<(), EngineError> {
        let comment = self
            .find(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("comment {id} not found")))?;
        let suggestion = comment
            .suggestion
            .ok_or_else(|| EngineError::NotFound(format!("comment {id} has no suggestion")))?;

        let path = Path::new(&comment.file_path);
        if !suggestion.original.is_empty() {
            let current = self.editor.line_text(path, comment.line_number).await?;
            if current != suggestion.original {
                return Err(EngineError::Validation(format!(
                    "line {} of {} changed since the suggestion was made",
                    comment.line_number, comment.file_path
                )));
            }
        }

        self.editor
            .replace_line(path, comment.line_number, &suggestion.suggested)
            .await?;

        self.resolve_comment(id).await
    }

    /// Resolves the comment without touching the document.
    pub async fn reject_suggestion(&mut self, id: &str) -> Result<(), EngineError> {
        self.resolve_comment(id).await
    }

    pub async fn resolve_comment(&mut self, id: &str) -> Result<(), EngineError> {
        let comment = self
            .find_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("comment {id} not found")))?;
        comment.resolved = true;

        if let Some(threads) = &self.threads {
            threads.release(id);
        }

        self.persist().await
    }

    /// Records the remote id a push created, taking the comment out of the
    /// unsynced set.
    pub async fn record_remote_id(
        &mut self,
        id: &str,
        remote_comment_id: u64,
    ) -> Result<(), EngineError> {
        let comment = self
            .find_mut(id)
            .ok_or_else(|| EngineError::NotFound(format!("comment {id} not found")))?;
        comment.remote_comment_id = Some(remote_comment_id);

        self.persist().await
    }

    /// All open top-level comments across every file.
    pub fn unresolved_comments(&self) -> Vec<ReviewComment> {
        self.comments
            .values()
            .flatten()
            .filter(|c| !c.resolved)
            .cloned()
            .collect()
    }

    pub fn file_comments(&self, file_path: &str) -> Vec<ReviewComment> {
        self.comments.get(file_path).cloned().unwrap_or_default()
    }

    pub fn all_comments(&self) -> Vec<ReviewComment> {
        self.comments.values().flatten().cloned().collect()
    }

    async fn mint(
        &mut self,
        file_path: &str,
        range: LineRange,
        body: &str,
        comment_type: CommentType,
        suggestion: Option<Suggestion>,
    ) -> Result<ReviewComment, EngineError> {
        let comment = ReviewComment {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            line_number: range.start,
            author: self.context.user.clone(),
            body: body.to_string(),
            comment_type,
            created_at: Utc::now(),
            resolved: false,
            replies: Vec::new(),
            suggestion,
            remote_comment_id: None,
        };

        self.comments
            .entry(file_path.to_string())
            .or_default()
            .push(comment.clone());
        self.persist().await?;

        tracing::debug!("added {comment_type:?} comment {} on {file_path}", comment.id);

        Ok(comment)
    }

    fn find(&self, id: &str) -> Option<&ReviewComment> {
        fn walk<'a>(comments: &'a [ReviewComment], id: &str) -> Option<&'a ReviewComment> {
            for comment in comments {
                if comment.id == id {
                    return Some(comment);
                }
                if let Some(found) = walk(&comment.replies, id) {
                    return Some(found);
                }
            }
            None
        }

        self.comments.values().find_map(|cs| walk(cs, id))
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut ReviewComment> {
        fn walk<'a>(
            comments: &'a mut [ReviewComment],
            id: &str,
        ) -> Option<&'a mut ReviewComment> {
            for comment in comments {
                if comment.id == id {
                    return Some(comment);
                }
                if let Some(found) = walk(&mut comment.replies, id) {
                    return Some(found);
                }
            }
            None
        }

        self.comments.values_mut().find_map(|cs| walk(cs, id))
    }

    async fn persist(&self) -> Result<(), EngineError> {
        self.store.save(&self.comments).await
    }
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use crate::{
        context::{FsEditor, ThreadRegistry, WorkspaceContext},
        errors::EngineError,
        store::AnnotationStore,
    };

    use super::{CommentLifecycleManager, CommentType, LineRange};

    async fn manager(dir: &tempfile::TempDir) -> CommentLifecycleManager {
        let context = WorkspaceContext::new(Some(dir.path().to_path_buf()), "reviewer", "ko");
        let store = AnnotationStore::new(&context);
        let editor = Arc::new(FsEditor::new(dir.path()));

        CommentLifecycleManager::new(store, context, editor).await
    }

    #[tokio::test]
    async fn test_add_comment_persists_and_reloads() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;

        let added = comments
            .add_comment(
                "content/ko/docs/a.md",
                LineRange::line(4),
                "주석이 누락되었습니다",
                CommentType::Grammar,
            )
            .await?;
        assert!(!added.resolved);
        assert!(added.suggestion.is_none());
        assert!(added.is_unsynced());

        // a fresh manager over the same workspace sees the persisted comment
        let reloaded = manager(&dir).await;
        let file = reloaded.file_comments("content/ko/docs/a.md");
        assert_eq!(file.len(), 1);
        assert_eq!(file[0].id, added.id);
        assert_eq!(file[0].author, "reviewer");

        Ok(())
    }

    #[tokio::test]
    async fn test_suggestion_invariant_holds_on_create() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;

        let err = comments
            .add_comment("a.md", LineRange::line(1), "", CommentType::Suggestion)
            .await;
        assert!(matches!(err, Err(EngineError::Validation(_))));

        let suggestion = comments
            .add_suggestion("a.md", LineRange::line(1), "foo", "bar", "typo")
            .await?;
        assert_eq!(suggestion.comment_type, CommentType::Suggestion);
        assert!(suggestion.suggestion.is_some());

        for comment in comments.all_comments() {
            assert_eq!(
                comment.comment_type == CommentType::Suggestion,
                comment.suggestion.is_some()
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_suggestion_rewrites_anchor_line() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(
            dir.path().join("doc.md"),
            "line one\nline two\nfoo\nline four\n",
        )
        .await?;

        let mut comments = manager(&dir).await;
        let suggestion = comments
            .add_suggestion("doc.md", LineRange::line(3), "foo", "bar", "use bar")
            .await?;

        comments.apply_suggestion(&suggestion.id).await?;

        let content = tokio::fs::read_to_string(dir.path().join("doc.md")).await?;
        assert_eq!(content, "line one\nline two\nbar\nline four\n");
        assert!(comments.file_comments("doc.md")[0].resolved);

        Ok(())
    }

    #[tokio::test]
    async fn test_apply_suggestion_refuses_drifted_line() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join("doc.md"), "foo\n").await?;

        let mut comments = manager(&dir).await;
        let suggestion = comments
            .add_suggestion("doc.md", LineRange::line(1), "foo", "bar", "")
            .await?;

        // the document moves on under the comment
        tokio::fs::write(dir.path().join("doc.md"), "something else\n").await?;

        let err = comments.apply_suggestion(&suggestion.id).await;
        assert!(matches!(err, Err(EngineError::Validation(_))));

        // the failed edit must not resolve the comment
        assert!(!comments.file_comments("doc.md")[0].resolved);
        let content = tokio::fs::read_to_string(dir.path().join("doc.md")).await?;
        assert_eq!(content, "something else\n");

        Ok(())
    }

    #[tokio::test]
    async fn test_reject_suggestion_resolves_without_editing() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        tokio::fs::write(dir.path().join("doc.md"), "foo\n").await?;

        let mut comments = manager(&dir).await;
        let suggestion = comments
            .add_suggestion("doc.md", LineRange::line(1), "foo", "bar", "")
            .await?;

        comments.reject_suggestion(&suggestion.id).await?;

        assert!(comments.file_comments("doc.md")[0].resolved);
        let content = tokio::fs::read_to_string(dir.path().join("doc.md")).await?;
        assert_eq!(content, "foo\n");

        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent_and_releases_thread() -> anyhow::Result<()> {
        #[derive(Default)]
        struct Released(Mutex<Vec<String>>);

        impl ThreadRegistry for Released {
            fn release(&self, comment_id: &str) {
                self.0.lock().unwrap().push(comment_id.to_string());
            }
        }

        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;
        let released = Arc::new(Released::default());
        comments.set_thread_registry(released.clone());

        let added = comments
            .add_comment("a.md", LineRange::line(1), "hm", CommentType::Question)
            .await?;

        comments.resolve_comment(&added.id).await?;
        comments.resolve_comment(&added.id).await?;

        assert!(comments.file_comments("a.md")[0].resolved);
        assert_eq!(
            *released.0.lock().unwrap(),
            vec![added.id.clone(), added.id.clone()]
        );

        let missing = comments.resolve_comment("nope").await;
        assert!(matches!(missing, Err(EngineError::NotFound(_))));

        Ok(())
    }

    #[tokio::test]
    async fn test_unresolved_filter_spans_files_and_ignores_sync_state() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;

        let a = comments
            .add_comment("a.md", LineRange::line(1), "open", CommentType::General)
            .await?;
        let b = comments
            .add_comment("b.md", LineRange::line(2), "pushed", CommentType::Style)
            .await?;
        comments.record_remote_id(&b.id, 99).await?;
        let c = comments
            .add_comment("b.md", LineRange::line(3), "done", CommentType::General)
            .await?;
        comments.resolve_comment(&c.id).await?;

        let unresolved = comments.unresolved_comments();
        let mut ids = unresolved.iter().map(|c| c.id.as_str()).collect::<Vec<_>>();
        ids.sort();
        let mut expected = vec![a.id.as_str(), b.id.as_str()];
        expected.sort();
        assert_eq!(ids, expected);

        Ok(())
    }

    #[tokio::test]
    async fn test_replies_nest_under_parent() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;

        let parent = comments
            .add_comment("a.md", LineRange::line(7), "?", CommentType::Question)
            .await?;
        let reply = comments.add_reply(&parent.id, "answered").await?;

        let file = comments.file_comments("a.md");
        assert_eq!(file.len(), 1);
        assert_eq!(file[0].replies.len(), 1);
        assert_eq!(file[0].replies[0].id, reply.id);
        assert_eq!(file[0].replies[0].line_number, 7);

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_comment_skips_duplicate_ids() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let mut comments = manager(&dir).await;

        let added = comments
            .add_comment("a.md", LineRange::line(1), "x", CommentType::General)
            .await?;

        let again = added.clone();
        assert!(!comments.insert_comment(again).await?);
        assert_eq!(comments.all_comments().len(), 1);

        Ok(())
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::errors::EngineError;

/// Explicit workspace state, passed into every component at construction.
///
/// Nothing in the engine reads ambient host state; whatever the surrounding
/// command layer knows about the workspace arrives through this value.
#[derive(Clone, Debug)]
pub struct WorkspaceContext {
    /// Root of the workspace, `None` when the caller runs outside one. With
    /// no root, persistence degrades to logged no-ops.
    pub root: Option<PathBuf>,
    pub user: String,
    pub locale: String,
}

impl WorkspaceContext {
    pub fn new(
        root: Option<PathBuf>,
        user: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            root,
            user: user.into(),
            locale: locale.into(),
        }
    }
}

/// Document access consumed by suggestion application. Line numbers are
/// 1-based.
#[async_trait]
pub trait Editor: Send + Sync {
    async fn line_text(&self, path: &Path, line_number: u32) -> Result<String, EngineError>;

    async fn replace_line(
        &self,
        path: &Path,
        line_number: u32,
        text: &str,
    ) -> Result<(), EngineError>;
}

/// Editor over plain files, resolving comment paths against the workspace
/// root.
pub struct FsEditor {
    root: PathBuf,
}

impl FsEditor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[async_trait]
impl Editor for FsEditor {
    async fn line_text(&self, path: &Path, line_number: u32) -> Result<String, EngineError> {
        let resolved = self.resolve(path);
        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| EngineError::NotFound(format!("{}: {e}", resolved.display())))?;

        if line_number == 0 {
            return Err(EngineError::Validation(
                "line numbers are 1-based".to_string(),
            ));
        }

        content
            .lines()
            .nth((line_number - 1) as usize)
            .map(|l| l.to_string())
            .ok_or_else(|| {
                EngineError::Validation(format!(
                    "{} has no line {line_number}",
                    resolved.display()
                ))
            })
    }

    async fn replace_line(
        &self,
        path: &Path,
        line_number: u32,
        text: &str,
    ) -> Result<(), EngineError> {
        let resolved = self.resolve(path);
        let content = tokio::fs::read_to_string(&resolved)
            .await
            .map_err(|e| EngineError::NotFound(format!("{}: {e}", resolved.display())))?;

        // split('\n') keeps the trailing empty segment, so a final newline
        // survives the join.
        let mut lines = content.split('\n').collect::<Vec<_>>();
        let index = line_number.saturating_sub(1) as usize;
        if line_number == 0 || index >= lines.len() {
            return Err(EngineError::Validation(format!(
                "{} has no line {line_number}",
                resolved.display()
            )));
        }

        lines[index] = text;
        tokio::fs::write(&resolved, lines.join("\n"))
            .await
            .map_err(|e| EngineError::Persistence(format!("{}: {e}", resolved.display())))
    }
}

/// Hook the UI layer registers so resolving a comment releases its live
/// comment-thread handle. The engine only signals; the handle map itself
/// lives with the UI.
pub trait ThreadRegistry: Send + Sync {
    fn release(&self, comment_id: &str);
}

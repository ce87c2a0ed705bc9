use std::{collections::BTreeMap, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{comments::ReviewComment, context::WorkspaceContext, errors::EngineError};

const STORE_FILE: &str = ".review-annotations.json";
const STORE_VERSION: &str = "1.0";

pub type CommentMap = BTreeMap<String, Vec<ReviewComment>>;

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: String,
    comments: CommentMap,
}

/// JSON-backed persistence for the comment set, one document per workspace.
///
/// The whole map is serialized on every save; there is no per-file delta and
/// no file locking, single-writer access is assumed. Without a resolvable
/// workspace root every operation degrades to a logged no-op so callers are
/// never blocked on persistence.
pub struct AnnotationStore {
    path: Option<PathBuf>,
}

impl AnnotationStore {
    pub fn new(context: &WorkspaceContext) -> Self {
        let path = context.root.as_ref().map(|root| root.join(STORE_FILE));
        if path.is_none() {
            tracing::warn!("no workspace root, review annotations will not be persisted");
        }

        Self { path }
    }

    /// Loads the persisted comment map. A missing or unparsable backing file
    /// yields an empty map, first run and corrupted state both start clean.
    pub async fn load(&self) -> CommentMap {
        let Some(path) = &self.path else {
            return CommentMap::new();
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(_) => return CommentMap::new(),
        };

        match serde_json::from_str::<StoreDocument>(&raw) {
            Ok(doc) => doc.comments,
            Err(e) => {
                tracing::warn!("discarding unparsable annotation store: {e}");
                CommentMap::new()
            }
        }
    }

    pub async fn save(&self, comments: &CommentMap) -> Result<(), EngineError> {
        let Some(path) = &self.path else {
            tracing::warn!("no workspace root, skipping annotation save");
            return Ok(());
        };

        let doc = StoreDocument {
            version: STORE_VERSION.to_string(),
            comments: comments.clone(),
        };
        let raw = serde_json::to_string_pretty(&doc)
            .map_err(|e| EngineError::Persistence(e.to_string()))?;

        tokio::fs::write(path, raw)
            .await
            .map_err(|e| EngineError::Persistence(format!("{}: {e}", path.display())))
    }

    pub async fn load_file_comments(&self, file_path: &str) -> Vec<ReviewComment> {
        self.load().await.remove(file_path).unwrap_or_default()
    }

    /// Read-modify-write of one file's comment list against the whole store.
    pub async fn save_file_comments(
        &self,
        file_path: &str,
        comments: Vec<ReviewComment>,
    ) -> Result<(), EngineError> {
        let mut map = self.load().await;
        map.insert(file_path.to_string(), comments);

        self.save(&map).await
    }
}

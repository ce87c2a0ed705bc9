pub mod comments;
pub mod context;
pub mod errors;
pub mod pr_meta;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use comments::{
    CommentLifecycleManager, CommentType, LineRange, ReviewComment, Suggestion,
};
pub use context::{Editor, FsEditor, ThreadRegistry, WorkspaceContext};
pub use errors::EngineError;
pub use pr_meta::{
    ChangeKind, PrCommit, PrDetails, PrFileChange, PrInfo, PrMetadataService,
};
pub use store::AnnotationStore;
pub use sync::RemoteSyncAdapter;

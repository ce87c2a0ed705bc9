use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use docrev_engine::{
    AnnotationStore, CommentLifecycleManager, CommentType, FsEditor, LineRange,
    PrMetadataService, RemoteSyncAdapter, ReviewComment, WorkspaceContext,
};
use docrev_remote::{models::ReviewVerdict, RemoteProvider};

use crate::config::ApplicationConfig;

#[derive(Parser)]
#[command(
    name = "docrev",
    version,
    about = "line-anchored review annotations for localized docs pull requests"
)]
pub struct Command {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Author and manage local review comments
    Comment {
        #[command(subcommand)]
        command: CommentCommands,
    },
    /// Inspect and check out pull requests
    Pr {
        #[command(subcommand)]
        command: PrCommands,
    },
    /// Reconcile local comments with the remote review
    Sync {
        #[command(subcommand)]
        command: SyncCommands,
    },
}

#[derive(Subcommand)]
enum CommentCommands {
    /// Attach a comment to a line
    Add {
        file: String,
        line: u32,
        body: String,
        #[arg(long, value_enum, default_value = "general")]
        kind: CommentKind,
    },
    /// Attach a suggested replacement for a line's text
    Suggest {
        file: String,
        line: u32,
        original: String,
        suggested: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// List comments, unresolved ones by default
    List {
        #[arg(long)]
        all: bool,
    },
    Resolve {
        id: String,
    },
    /// Apply a suggestion to the document and resolve it
    Apply {
        id: String,
    },
    /// Resolve a suggestion without touching the document
    Reject {
        id: String,
    },
}

#[derive(Subcommand)]
enum PrCommands {
    View {
        number: u64,
    },
    Files {
        number: u64,
        /// Only files this tool can review for the configured locale
        #[arg(long)]
        reviewable: bool,
    },
    Commits {
        number: u64,
    },
    /// Check the pull request out under a deterministic local branch
    Checkout {
        number: u64,
    },
}

#[derive(Subcommand)]
enum SyncCommands {
    /// Import remote review comments as local annotations
    Pull {
        number: Option<u64>,
    },
    /// Push unsynced local comments to the remote review
    Push {
        number: Option<u64>,
        /// Submit a single review verdict instead of individual comments
        #[arg(long, value_enum)]
        verdict: Option<VerdictArg>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CommentKind {
    General,
    Question,
    Terminology,
    Grammar,
    Style,
}

impl From<CommentKind> for CommentType {
    fn from(kind: CommentKind) -> Self {
        match kind {
            CommentKind::General => CommentType::General,
            CommentKind::Question => CommentType::Question,
            CommentKind::Terminology => CommentType::Terminology,
            CommentKind::Grammar => CommentType::Grammar,
            CommentKind::Style => CommentType::Style,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum VerdictArg {
    Approve,
    Comment,
    RequestChanges,
}

impl From<VerdictArg> for ReviewVerdict {
    fn from(verdict: VerdictArg) -> Self {
        match verdict {
            VerdictArg::Approve => ReviewVerdict::Approve,
            VerdictArg::Comment => ReviewVerdict::Comment,
            VerdictArg::RequestChanges => ReviewVerdict::RequestChanges,
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Command::parse();

    let root = std::env::current_dir().ok();
    let config = ApplicationConfig::load(root.as_deref()).await?;
    let context = WorkspaceContext::new(root, config.author, config.locale);

    match cli.command {
        Commands::Comment { command } => comment(command, &context).await,
        Commands::Pr { command } => pr(command, &context).await,
        Commands::Sync { command } => sync(command, &context).await,
    }
}

async fn comment(command: CommentCommands, context: &WorkspaceContext) -> anyhow::Result<()> {
    let mut comments = lifecycle(context).await;

    match command {
        CommentCommands::Add {
            file,
            line,
            body,
            kind,
        } => {
            let added = comments
                .add_comment(&file, LineRange::line(line), &body, kind.into())
                .await?;
            println!("added comment {}", added.id);
        }
        CommentCommands::Suggest {
            file,
            line,
            original,
            suggested,
            reason,
        } => {
            let added = comments
                .add_suggestion(&file, LineRange::line(line), &original, &suggested, &reason)
                .await?;
            println!("added suggestion {}", added.id);
        }
        CommentCommands::List { all } => {
            let listed = if all {
                comments.all_comments()
            } else {
                comments.unresolved_comments()
            };
            if listed.is_empty() {
                println!("no comments");
            }
            for comment in listed {
                print_comment(&comment);
            }
        }
        CommentCommands::Resolve { id } => {
            comments.resolve_comment(&id).await?;
            println!("resolved {id}");
        }
        CommentCommands::Apply { id } => {
            comments.apply_suggestion(&id).await?;
            println!("applied and resolved {id}");
        }
        CommentCommands::Reject { id } => {
            comments.reject_suggestion(&id).await?;
            println!("rejected {id}");
        }
    }

    Ok(())
}

async fn pr(command: PrCommands, context: &WorkspaceContext) -> anyhow::Result<()> {
    let meta = metadata().await?;

    match command {
        PrCommands::View { number } => {
            let Some(details) = meta.pr_details(number).await? else {
                anyhow::bail!("pull request {number} not found");
            };
            let info = &details.info;

            println!("#{} {} ({})", info.number, info.title, info.state);
            println!("{} wants to merge {} -> {}", info.author, info.head_branch, info.base_branch);
            println!("{}", info.url);
            println!(
                "{} files, +{} -{}, {} commits",
                details.total_files,
                details.total_additions,
                details.total_deletions,
                details.total_commits
            );
        }
        PrCommands::Files { number, reviewable } => {
            let mut files = meta.pr_files(number).await?;
            if reviewable {
                files = meta.reviewable_files(&files, &context.locale);
            }
            for file in files {
                println!("{:?}\t+{} -{}\t{}", file.kind, file.additions, file.deletions, file.path);
            }
        }
        PrCommands::Commits { number } => {
            for commit in meta.pr_commits(number).await? {
                let subject = commit.message.lines().next().unwrap_or_default().to_string();
                println!("{} {} ({}, {})", &commit.sha[..commit.sha.len().min(8)], subject, commit.author, ago(commit.date));
            }
        }
        PrCommands::Checkout { number } => {
            let Some(info) = meta.pr_info(number).await? else {
                anyhow::bail!("pull request {number} not found");
            };
            let branch = meta.checkout_pr(number, &info.title).await?;
            println!("checked out #{number} as {branch}");
        }
    }

    Ok(())
}

async fn sync(command: SyncCommands, context: &WorkspaceContext) -> anyhow::Result<()> {
    let provider = provider()?;
    let meta = PrMetadataService::new(provider.clone());
    meta.ensure_available().await?;
    let sync = RemoteSyncAdapter::new(provider);
    let mut comments = lifecycle(context).await;

    match command {
        SyncCommands::Pull { number } => {
            let number = resolve_pr_number(&meta, number).await?;

            let imported = sync.import_remote_comments(number).await?;
            let total = imported.len();
            let mut added = 0;
            for comment in imported {
                if comments.insert_comment(comment).await? {
                    added += 1;
                }
            }
            println!("imported {added} new comments from #{number} ({} already known)", total - added);
        }
        SyncCommands::Push { number, verdict } => {
            let number = resolve_pr_number(&meta, number).await?;

            match verdict {
                Some(verdict) => {
                    let count = sync
                        .push_all_unsynced(&mut comments, number, Some(verdict.into()))
                        .await?;
                    println!("submitted review for #{number} covering {count} comments");
                }
                None => {
                    let count = sync.push_all_unsynced(&mut comments, number, None).await?;
                    println!("pushed {count} comments to #{number}");
                }
            }
        }
    }

    Ok(())
}

async fn lifecycle(context: &WorkspaceContext) -> CommentLifecycleManager {
    let store = AnnotationStore::new(context);
    let editor_root = context.root.clone().unwrap_or_else(|| ".".into());
    let editor = Arc::new(FsEditor::new(editor_root));

    CommentLifecycleManager::new(store, context.clone(), editor).await
}

fn provider() -> anyhow::Result<RemoteProvider> {
    Ok(RemoteProvider::gh()?)
}

async fn metadata() -> anyhow::Result<PrMetadataService> {
    let meta = PrMetadataService::new(provider()?);
    meta.ensure_available().await?;

    Ok(meta)
}

async fn resolve_pr_number(
    meta: &PrMetadataService,
    number: Option<u64>,
) -> anyhow::Result<u64> {
    if let Some(number) = number {
        return Ok(number);
    }

    meta.current_pr_number()
        .await?
        .ok_or_else(|| anyhow::anyhow!("no pull request for the current branch, pass a number"))
}

fn print_comment(comment: &ReviewComment) {
    let state = if comment.resolved { "resolved" } else { "open" };
    let synced = if comment.remote_comment_id.is_some() {
        "synced"
    } else {
        "local"
    };

    println!(
        "{} [{:?}/{state}/{synced}] {}:{} ({}, {})",
        comment.id,
        comment.comment_type,
        comment.file_path,
        comment.line_number,
        comment.author,
        ago(comment.created_at)
    );
    if !comment.body.is_empty() {
        println!("    {}", comment.body);
    }
    if let Some(suggestion) = &comment.suggestion {
        println!("    - {}", suggestion.original);
        println!("    + {}", suggestion.suggested);
    }
    for reply in &comment.replies {
        println!("    > {} ({})", reply.body, reply.author);
    }
}

fn ago(date: chrono::DateTime<chrono::Utc>) -> String {
    let duration = (chrono::Utc::now() - date).to_std().unwrap_or_default();

    timeago::Formatter::new().convert(duration)
}

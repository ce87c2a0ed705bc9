use std::path::Path;

use anyhow::Context;
use kdl::KdlDocument;

const CONFIG_FILE: &str = ".docrev.kdl";

/// Workspace-local settings, read from `.docrev.kdl` at the workspace root:
///
/// ```kdl
/// config {
///     author "jihoon"
///     locale "ko"
/// }
/// ```
#[derive(Clone, Debug)]
pub struct ApplicationConfig {
    pub author: String,
    pub locale: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        let author = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "reviewer".to_string());

        Self {
            author,
            locale: "ko".to_string(),
        }
    }
}

impl ApplicationConfig {
    pub async fn load(root: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        let Some(root) = root else {
            return Ok(config);
        };
        let path = root.join(CONFIG_FILE);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(_) => return Ok(config),
        };

        let doc: KdlDocument = raw
            .parse()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if let Some(children) = doc.get("config").and_then(|n| n.children()) {
            if let Some(author) = string_entry(children, "author") {
                config.author = author;
            }
            if let Some(locale) = string_entry(children, "locale") {
                config.locale = locale;
            }
        }

        Ok(config)
    }
}

fn string_entry(doc: &KdlDocument, name: &str) -> Option<String> {
    doc.get(name)?
        .entries()
        .first()?
        .value()
        .as_string()
        .map(|s| s.to_string())
}

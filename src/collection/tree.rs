use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// The only ranklist file format this tool reads.
pub const SRK_FORMAT: &str = "srk.json";

/// `config.yaml` at the root of a collection.
#[derive(Debug, Deserialize)]
pub struct CollectionConfig {
    pub root: CollectionRoot,
}

#[derive(Debug, Deserialize)]
pub struct CollectionRoot {
    #[serde(default)]
    pub children: Vec<CollectionItem>,
}

/// A node of the collection tree: a directory when it has `children`,
/// a ranklist file when it has `format`.
#[derive(Debug, Deserialize)]
pub struct CollectionItem {
    pub path: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub children: Option<Vec<CollectionItem>>,
}

/// A ranklist file found in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanklistEntry {
    /// The item's own `path`; identifies the ranklist across tools.
    pub unique_key: String,
    pub file_path: PathBuf,
}

/// Read `<dir>/config.yaml` and list every ranklist file, depth-first in
/// config order.
pub fn enumerate_collection(dir: &Path) -> Result<Vec<RanklistEntry>> {
    let config_path = dir.join("config.yaml");
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read collection config at {}", config_path.display()))?;
    let config: CollectionConfig = serde_saphyr::from_str(&content).with_context(|| {
        format!("Failed to parse collection config: invalid YAML in {}", config_path.display())
    })?;

    let mut entries = Vec::new();
    for item in &config.root.children {
        collect_item(dir, item, "", &mut entries)?;
    }
    Ok(entries)
}

fn collect_item(dir: &Path, item: &CollectionItem, base: &str, out: &mut Vec<RanklistEntry>) -> Result<()> {
    let item_path = item.path.replace('\\', "/");
    let current = join_path(base, &item_path);

    if let Some(children) = &item.children {
        for child in children {
            collect_item(dir, child, &current, out)?;
        }
        return Ok(());
    }

    match item.format.as_deref() {
        Some(SRK_FORMAT) => {
            out.push(RanklistEntry {
                unique_key: item_path,
                file_path: dir.join(format!("{}.{}", current, SRK_FORMAT)),
            });
            Ok(())
        }
        Some(other) => bail!("Parse failed for {}: unknown file format {}", current, other),
        None => bail!(
            "Parse failed for {}: it must be a dir (with children) or a file (with format)",
            current
        ),
    }
}

fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::ranklist::{write_back, Ranklist};

/// A ranklist file as read from disk: the JSON document and its typed view.
#[derive(Debug, Clone)]
pub struct RanklistFile {
    /// The file's top-level object, key order preserved.
    pub document: Map<String, Value>,
    pub ranklist: Ranklist,
}

/// Read and parse a ranklist file.
///
/// Any failure here, including an unknown time unit, means the input is
/// corrupt.
pub fn load_ranklist(path: &Path) -> Result<RanklistFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ranklist at {}", path.display()))?;
    let document: Map<String, Value> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse ranklist at {}", path.display()))?;
    let ranklist = Ranklist::from_document(&document)
        .with_context(|| format!("Failed to parse ranklist at {}", path.display()))?;
    Ok(RanklistFile { document, ranklist })
}

/// Write the ranklist's changes into its document and save it atomically,
/// pretty-printed with two-space indentation.
///
/// The file is never left half-written: readers see either the old or the
/// new content.
pub fn save_ranklist(path: &Path, file: &RanklistFile) -> Result<()> {
    let mut document = file.document.clone();
    write_back(&file.ranklist, &mut document)
        .with_context(|| format!("Failed to update ranklist document for {}", path.display()))?;

    let mut out = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    serde_json::to_writer_pretty(&mut out, &document).context("Failed to serialize ranklist")?;

    out.commit()
        .with_context(|| format!("Failed to save ranklist at {}", path.display()))?;

    Ok(())
}

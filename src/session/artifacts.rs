//! Saving files the agent produced to local disk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{AgentLabError, Result};
use crate::service::AgentService;
use crate::types::FilePathAnnotation;

/// Local file name for an annotation such as `sandbox:/mnt/data/blog.md`.
pub fn artifact_file_name(annotation: &FilePathAnnotation) -> Result<String> {
    let path = annotation
        .text
        .strip_prefix("sandbox:")
        .unwrap_or(&annotation.text);
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            AgentLabError::InvalidArgument(format!(
                "annotation {:?} does not name a file",
                annotation.text
            ))
        })
}

/// Download each annotated file into `dir`, once per file id.
///
/// Failures are logged and skipped; the returned paths are the files that
/// were written. Two files with the same base name are kept apart by
/// prefixing the later one with its file id.
pub async fn save_artifacts(
    service: &dyn AgentService,
    annotations: &[FilePathAnnotation],
    dir: &Path,
) -> Vec<PathBuf> {
    if annotations.is_empty() {
        return Vec::new();
    }
    if let Err(err) = tokio::fs::create_dir_all(dir).await {
        warn!(dir = %dir.display(), error = %err, "cannot create artifact directory");
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut names = HashSet::new();
    let mut saved = Vec::new();
    for annotation in annotations {
        if !seen.insert(annotation.file_id.as_str()) {
            continue;
        }
        let name = match artifact_file_name(annotation) {
            Ok(name) => unique_name(&mut names, name, &annotation.file_id),
            Err(err) => {
                warn!(file_id = %annotation.file_id, error = %err, "artifact skipped");
                continue;
            }
        };
        let target = dir.join(name);
        match save_one(service, &annotation.file_id, &target).await {
            Ok(()) => {
                info!(file_id = %annotation.file_id, path = %target.display(), "saved artifact");
                saved.push(target);
            }
            Err(err) => warn!(file_id = %annotation.file_id, error = %err, "artifact not saved"),
        }
    }
    saved
}

fn unique_name(names: &mut HashSet<String>, name: String, file_id: &str) -> String {
    if names.insert(name.clone()) {
        return name;
    }
    let renamed = format!("{file_id}-{name}");
    warn!(name = %name, renamed = %renamed, "artifact name already used");
    names.insert(renamed.clone());
    renamed
}

async fn save_one(service: &dyn AgentService, file_id: &str, target: &Path) -> Result<()> {
    let bytes = service.file_content(file_id).await?;
    tokio::fs::write(target, &bytes).await?;
    Ok(())
}

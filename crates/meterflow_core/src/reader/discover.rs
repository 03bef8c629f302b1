//! Source discovery: expand dropped files and folders into the list of
//! XML source files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::workers::CancelToken;

/// Collect `.xml` files from a mix of file and directory paths.
///
/// Directories are walked recursively; duplicates are dropped; within a
/// directory, entries are visited in sorted order so the result is
/// deterministic. The cancel token is observed between directory reads,
/// returning whatever was collected so far.
pub fn collect_source_files(paths: &[PathBuf], cancel: &CancelToken) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    let mut seen = HashSet::new();

    for raw in paths {
        if cancel.is_cancelled() {
            return collected;
        }
        let path = raw.as_path();
        if path.as_os_str().is_empty() {
            continue;
        }
        if path.is_file() {
            push_if_xml(path, &mut collected, &mut seen);
        } else if path.is_dir() {
            walk_directory(path, cancel, &mut collected, &mut seen);
        }
    }
    collected
}

fn walk_directory(
    dir: &Path,
    cancel: &CancelToken,
    collected: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) {
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        if cancel.is_cancelled() {
            return;
        }
        let Ok(entries) = fs::read_dir(&current) else {
            tracing::warn!("cannot read directory {}", current.display());
            continue;
        };
        let mut children: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
        children.sort();
        // Depth-first, keeping sorted order within each directory.
        for child in children.iter().rev().filter(|p| p.is_dir()) {
            pending.push(child.clone());
        }
        for child in children.iter().filter(|p| p.is_file()) {
            if cancel.is_cancelled() {
                return;
            }
            push_if_xml(child, collected, seen);
        }
    }
}

fn push_if_xml(path: &Path, collected: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>) {
    let is_xml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
    if is_xml && seen.insert(path.to_path_buf()) {
        collected.push(path.to_path_buf());
    }
}

use std::env;
use std::path::{Path, PathBuf};

use unipm_constants::{LOCKFILES, MANIFEST_FILE, PROJECT_ROOT_ENV};

use crate::io::read_package_json_file;

/// Resolves the project root for `cwd`: the env override when set,
/// otherwise the highest ancestor carrying a lockfile or `.git`,
/// otherwise `cwd` itself.
pub fn project_root(cwd: &Path) -> PathBuf {
    if let Ok(root) = env::var(PROJECT_ROOT_ENV) {
        if !root.is_empty() {
            return PathBuf::from(root);
        }
    }

    let mut highest: Option<PathBuf> = None;
    for dir in cwd.ancestors() {
        let has_marker = dir.join(".git").exists()
            || LOCKFILES.iter().any(|lock| dir.join(lock).exists());
        if has_marker {
            highest = Some(dir.to_path_buf());
        }
    }
    highest.unwrap_or_else(|| cwd.to_path_buf())
}

/// Collects manifest paths in discovery order: every `package.json` on
/// the walk from `cwd` up to and including `root`, then any manifest in
/// an ancestor directory of a story path (under `root`) not already seen.
/// The story-path pass covers monorepo layouts where the relevant
/// manifest is not a strict ancestor of the working directory.
pub fn discover_manifests(cwd: &Path, root: &Path, story_paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut manifests: Vec<PathBuf> = Vec::new();

    for dir in cwd.ancestors() {
        let candidate = dir.join(MANIFEST_FILE);
        if candidate.is_file() {
            manifests.push(candidate);
        }
        if dir == root {
            break;
        }
    }

    for story in story_paths {
        let start = if story.is_dir() {
            story.as_path()
        } else {
            story.parent().unwrap_or(story.as_path())
        };
        for dir in start.ancestors() {
            if !dir.starts_with(root) {
                break;
            }
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() && !manifests.contains(&candidate) {
                manifests.push(candidate);
            }
            if dir == root {
                break;
            }
        }
    }

    manifests
}

/// The first discovered manifest declaring a dependency on the
/// orchestrated tool, falling back to the first manifest.
pub fn primary_manifest(manifests: &[PathBuf], tool_package: Option<&str>) -> Option<PathBuf> {
    if let Some(tool) = tool_package {
        for path in manifests {
            if let Ok(pkg) = read_package_json_file(path) {
                if pkg.declares(tool) {
                    return Some(path.clone());
                }
            }
        }
    }
    manifests.first().cloned()
}

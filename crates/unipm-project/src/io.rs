use std::fs;
use std::path::Path;

use unipm_constants::MANIFEST_FILE;

use crate::package_json::PackageJson;

pub fn read_package_json(project_dir: &Path) -> anyhow::Result<PackageJson> {
    read_package_json_file(&project_dir.join(MANIFEST_FILE))
}

pub fn read_package_json_file(path: &Path) -> anyhow::Result<PackageJson> {
    let content = fs::read_to_string(path)?;
    let parsed: PackageJson = serde_json::from_str(&content)?;
    Ok(parsed)
}

/// Writes a manifest with 2-space indentation and a trailing newline,
/// pruning empty dependency maps first. The write goes through a sibling
/// temp file and rename so a crash never leaves a half-written manifest.
pub fn write_package_json_file(path: &Path, pkg: &mut PackageJson) -> anyhow::Result<()> {
    pkg.prune_empty_sections();
    let mut content = serde_json::to_string_pretty(pkg)?;
    content.push('\n');

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, &content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

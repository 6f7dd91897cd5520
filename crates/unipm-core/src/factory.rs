use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use unipm_backend::PackageManagerKind;
use unipm_constants::{
    BUN_BINARY_LOCKFILE, BUN_TEXT_LOCKFILE, LOCKFILES, PNPM_LOCKFILE, USER_AGENT_ENV,
    YARN_BERRY_RC_FILE, YARN_LOCKFILE,
};
use unipm_error::{PackageManagerError, Result};
use unipm_executor::ExecOptions;

use crate::cache::VersionCache;
use crate::catalog::Catalog;
use crate::manager::PackageManager;

/// Inputs identifying one facade instance.
#[derive(Debug, Clone, Default)]
pub struct FactoryOptions {
    /// Skips detection entirely.
    pub force: Option<PackageManagerKind>,
    /// Defaults to the process working directory.
    pub cwd: Option<PathBuf>,
    /// Tool configuration directory, searched for manifests like a story
    /// path.
    pub config_dir: Option<PathBuf>,
    pub story_paths: Vec<PathBuf>,
}

type InstanceKey = (
    Option<PackageManagerKind>,
    Option<PathBuf>,
    PathBuf,
    Vec<PathBuf>,
);

/// Creates and caches facade instances. The factory owns the shared
/// version cache; every instance it hands out memoizes into the same one.
pub struct PackageManagerFactory {
    catalog: Catalog,
    cache: Arc<VersionCache>,
    instances: Mutex<HashMap<InstanceKey, Arc<PackageManager>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PackageManagerFactory {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            cache: Arc::new(VersionCache::new()),
            instances: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, opts: &FactoryOptions) -> Result<Arc<PackageManager>> {
        let cwd = match &opts.cwd {
            Some(dir) => dir.clone(),
            None => env::current_dir()?,
        };
        let key: InstanceKey = (
            opts.force,
            opts.config_dir.clone(),
            cwd.clone(),
            opts.story_paths.clone(),
        );
        if let Some(existing) = lock(&self.instances).get(&key) {
            return Ok(Arc::clone(existing));
        }

        let kind = match opts.force {
            Some(kind) => kind,
            None => detect(&cwd)?,
        };
        unipm_logger::debug(&format!("Using {kind} in {}", cwd.display()));

        let mut story_paths = opts.story_paths.clone();
        if let Some(dir) = &opts.config_dir {
            story_paths.push(dir.clone());
        }
        let instance = Arc::new(PackageManager::new(
            kind,
            cwd,
            &story_paths,
            Arc::clone(&self.cache),
            self.catalog.clone(),
        ));
        lock(&self.instances).insert(key, Arc::clone(&instance));
        Ok(instance)
    }

    /// Drops every cached instance and memoized version.
    pub fn clear(&self) {
        lock(&self.instances).clear();
        self.cache.clear();
    }

    #[must_use]
    pub fn version_cache(&self) -> Arc<VersionCache> {
        Arc::clone(&self.cache)
    }
}

/// Detects the package manager governing `cwd`: the launcher's user-agent
/// variable first, then the nearest lockfile confirmed by a version probe
/// of its binary, then any binary that responds. Nothing responding is a
/// hard error; there is no silent default.
pub fn detect(cwd: &Path) -> Result<PackageManagerKind> {
    if let Some(kind) = env::var(USER_AGENT_ENV).ok().as_deref().and_then(parse_user_agent) {
        unipm_logger::debug(&format!("{USER_AGENT_ENV} identifies {kind}"));
        return Ok(kind);
    }

    if let Some(kind) = nearest_lockfile_kind(cwd) {
        if probe_version(kind.backend().bin()).is_some() {
            return Ok(kind);
        }
        unipm_logger::debug(&format!(
            "{kind} owns the nearest lockfile but its binary did not respond"
        ));
    }

    fallback_probe().ok_or_else(|| {
        PackageManagerError::DetectionFailed(format!(
            "no package manager responded for {}",
            cwd.display()
        ))
    })
}

/// Parses `npm_config_user_agent`, e.g. `yarn/3.6.4 npm/? node/v18.17.0`.
/// The yarn major version separates Classic from Berry.
fn parse_user_agent(agent: &str) -> Option<PackageManagerKind> {
    let leading = agent.split_whitespace().next()?;
    let (tool, version) = leading.split_once('/')?;
    match tool {
        "npm" => Some(PackageManagerKind::Npm),
        "pnpm" => Some(PackageManagerKind::Pnpm),
        "bun" => Some(PackageManagerKind::Bun),
        "yarn" => Some(yarn_kind_for_version(version)),
        _ => None,
    }
}

fn yarn_kind_for_version(version: &str) -> PackageManagerKind {
    let major = version.split('.').next().and_then(|m| m.parse::<u32>().ok());
    if major == Some(1) {
        PackageManagerKind::YarnClassic
    } else {
        PackageManagerKind::YarnBerry
    }
}

fn nearest_lockfile_kind(cwd: &Path) -> Option<PackageManagerKind> {
    for dir in cwd.ancestors() {
        for lock in LOCKFILES {
            if dir.join(lock).is_file() {
                return Some(match *lock {
                    BUN_BINARY_LOCKFILE | BUN_TEXT_LOCKFILE => PackageManagerKind::Bun,
                    PNPM_LOCKFILE => PackageManagerKind::Pnpm,
                    YARN_LOCKFILE => yarn_flavor(dir),
                    _ => PackageManagerKind::Npm,
                });
            }
        }
    }
    None
}

/// A `yarn.lock` alone does not tell Classic from Berry; the Berry rc
/// file does, and failing that the installed binary's version.
fn yarn_flavor(dir: &Path) -> PackageManagerKind {
    if dir.join(YARN_BERRY_RC_FILE).is_file() {
        return PackageManagerKind::YarnBerry;
    }
    match probe_version("yarn") {
        Some(version) => yarn_kind_for_version(&version),
        None => PackageManagerKind::YarnClassic,
    }
}

fn fallback_probe() -> Option<PackageManagerKind> {
    for bin in ["npm", "pnpm", "yarn", "bun"] {
        if let Some(version) = probe_version(bin) {
            return Some(match bin {
                "npm" => PackageManagerKind::Npm,
                "pnpm" => PackageManagerKind::Pnpm,
                "yarn" => yarn_kind_for_version(&version),
                _ => PackageManagerKind::Bun,
            });
        }
    }
    None
}

/// Synchronous `--version` probe; detection runs before the async runtime
/// exists.
fn probe_version(bin: &str) -> Option<String> {
    let opts = ExecOptions::new(bin, &["--version"]).ignore_error();
    match unipm_executor::execute_sync(&opts) {
        Ok(output) if output.success() => Some(output.stdout.trim().to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_user_agent_parsing() {
        assert_eq!(
            parse_user_agent("npm/10.2.4 node/v20.11.0 linux x64"),
            Some(PackageManagerKind::Npm)
        );
        assert_eq!(
            parse_user_agent("pnpm/9.1.0 npm/? node/v20.11.0 linux x64"),
            Some(PackageManagerKind::Pnpm)
        );
        assert_eq!(
            parse_user_agent("bun/1.1.8 npm/? node/v21.6.0 linux x64"),
            Some(PackageManagerKind::Bun)
        );
        assert_eq!(parse_user_agent("cargo/1.79.0"), None);
        assert_eq!(parse_user_agent(""), None);
    }

    #[test]
    fn test_yarn_major_version_is_the_berry_marker() {
        assert_eq!(
            parse_user_agent("yarn/1.22.19 npm/? node/v16.20.0 darwin arm64"),
            Some(PackageManagerKind::YarnClassic)
        );
        assert_eq!(
            parse_user_agent("yarn/3.6.4 npm/? node/v18.17.0 darwin arm64"),
            Some(PackageManagerKind::YarnBerry)
        );
        assert_eq!(
            parse_user_agent("yarn/4.1.0 npm/? node/v20.11.0 linux x64"),
            Some(PackageManagerKind::YarnBerry)
        );
    }

    #[test]
    fn test_forced_kind_beats_lockfiles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PNPM_LOCKFILE), "lockfileVersion: '9.0'\n").unwrap();
        fs::write(dir.path().join("package.json"), "{\"name\":\"demo\"}\n").unwrap();

        let factory = PackageManagerFactory::new(Catalog::default());
        let opts = FactoryOptions {
            force: Some(PackageManagerKind::Bun),
            cwd: Some(dir.path().to_path_buf()),
            ..FactoryOptions::default()
        };
        let manager = factory.get(&opts).unwrap();
        assert_eq!(manager.kind(), PackageManagerKind::Bun);
    }

    #[test]
    fn test_same_inputs_share_an_instance() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{\"name\":\"demo\"}\n").unwrap();

        let factory = PackageManagerFactory::new(Catalog::default());
        let opts = FactoryOptions {
            force: Some(PackageManagerKind::Npm),
            cwd: Some(dir.path().to_path_buf()),
            ..FactoryOptions::default()
        };
        let first = factory.get(&opts).unwrap();
        let second = factory.get(&opts).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        factory.clear();
        let third = factory.get(&opts).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_nearest_lockfile_walks_upward() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("packages/app");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(PNPM_LOCKFILE), "lockfileVersion: '9.0'\n").unwrap();

        assert_eq!(
            nearest_lockfile_kind(&nested),
            Some(PackageManagerKind::Pnpm)
        );
    }

    #[test]
    fn test_lockfile_precedence_prefers_specific_tools() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(unipm_constants::NPM_LOCKFILE), "{}\n").unwrap();
        fs::write(dir.path().join(PNPM_LOCKFILE), "lockfileVersion: '9.0'\n").unwrap();

        assert_eq!(
            nearest_lockfile_kind(dir.path()),
            Some(PackageManagerKind::Pnpm)
        );
    }
}

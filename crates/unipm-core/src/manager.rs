use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use unipm_backend::{
    BackendContext, CommandLine, InstallationMetadata, PackageManagerBackend, PackageManagerKind,
};
use unipm_constants::{CI_ENV, DEFAULT_TREE_DEPTH, MANIFEST_FILE, PNPM_WORKSPACE_FILE};
use unipm_error::{PackageManagerError, Result};
use unipm_executor::{ExecOptions, ExecOutput, ExecResult};
use unipm_project::{DependencyKind, PackageJson, read_package_json_file, write_package_json_file};
use unipm_utils::package_spec::{format_package_spec, parse_package_spec};

use crate::cache::VersionCache;
use crate::catalog::Catalog;

/// Options for [`PackageManager::add_dependencies`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AddOptions {
    pub dev: bool,
    /// Write the resolved specifiers into the manifest without invoking
    /// the underlying CLI.
    pub skip_install: bool,
}

/// One polymorphic interface over the five JS package-manager CLIs.
/// The backend supplies command templates and parsers; this facade owns
/// manifest discovery, subprocess orchestration and caching.
pub struct PackageManager {
    backend: Box<dyn PackageManagerBackend>,
    cwd: PathBuf,
    project_root: PathBuf,
    manifests: Vec<PathBuf>,
    primary_manifest: Option<PathBuf>,
    cache: Arc<VersionCache>,
    catalog: Catalog,
}

impl PackageManager {
    #[must_use]
    pub fn new(
        kind: PackageManagerKind,
        cwd: PathBuf,
        story_paths: &[PathBuf],
        cache: Arc<VersionCache>,
        catalog: Catalog,
    ) -> Self {
        let project_root = unipm_project::project_root(&cwd);
        let manifests = unipm_project::discover_manifests(&cwd, &project_root, story_paths);
        let primary_manifest = unipm_project::primary_manifest(&manifests, catalog.tool_package());
        Self {
            backend: kind.backend(),
            cwd,
            project_root,
            manifests,
            primary_manifest,
            cache,
            catalog,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PackageManagerKind {
        self.backend.kind()
    }

    #[must_use]
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    #[must_use]
    pub fn primary_manifest_path(&self) -> Option<&Path> {
        self.primary_manifest.as_deref()
    }

    fn context(&self) -> BackendContext {
        BackendContext {
            is_ci: env::var_os(CI_ENV).is_some(),
            workspace_root: self.cwd.join(PNPM_WORKSPACE_FILE).is_file(),
        }
    }

    async fn exec(&self, cmd: CommandLine) -> ExecResult {
        let opts = ExecOptions {
            command: cmd.program,
            args: cmd.args,
            cwd: Some(self.cwd.clone()),
            ..ExecOptions::default()
        };
        unipm_executor::execute(&opts).await
    }

    /// Resolves the version to use for `name`: the registry's latest (in
    /// range when constrained), except that a catalog-pinned version wins
    /// unless the registry one is strictly newer. When the registry is
    /// unreachable a pinned version still resolves, with a warning.
    pub async fn get_version(&self, name: &str, constraint: Option<&str>) -> Result<String> {
        let latest = self.fetch_latest(name, constraint).await;
        let pinned = self
            .catalog
            .pinned_version(name)
            .filter(|current| constraint.is_none_or(|c| unipm_utils::satisfies(current, c)));

        match (latest, pinned) {
            (Some(latest), Some(current)) => {
                if unipm_utils::is_strictly_greater(&latest, current) {
                    Ok(latest)
                } else {
                    Ok(current.to_string())
                }
            }
            (Some(latest), None) => Ok(latest),
            (None, Some(current)) => {
                unipm_logger::warn(&format!(
                    "Failed to resolve the latest version of {name} from the registry, using {current}"
                ));
                Ok(current.to_string())
            }
            (None, None) => Err(PackageManagerError::VersionResolutionFailed(
                name.to_string(),
                constraint.unwrap_or("latest").to_string(),
            )),
        }
    }

    async fn fetch_latest(&self, name: &str, constraint: Option<&str>) -> Option<String> {
        let key = VersionCache::latest_key(name, constraint);
        if let Some(cached) = self.cache.get_latest(&key) {
            return cached;
        }

        let spec = match constraint {
            Some(range) => format_package_spec(name, range),
            None => name.to_string(),
        };
        let resolved = match self.exec(self.backend.version_command(&spec)).await {
            Ok(output) => self.backend.parse_version_output(&output.stdout),
            Err(err) => {
                unipm_logger::debug(&format!("Registry version query for {spec} failed: {err}"));
                None
            }
        };
        self.cache.set_latest(&key, resolved.clone());
        resolved
    }

    /// Turns loose specifiers into fully versioned ones, resolving in
    /// parallel. A specifier that already carries a version and names a
    /// package outside the catalog passes through untouched. Catalog
    /// packages resolve to `name@^latest` when the registry agrees with
    /// the pin, and to the exact pinned version when it does not.
    pub async fn get_versioned_packages(&self, specs: &[String]) -> Result<Vec<String>> {
        futures::future::try_join_all(specs.iter().map(|spec| self.versioned_spec(spec))).await
    }

    async fn versioned_spec(&self, spec: &str) -> Result<String> {
        let (name, constraint) = parse_package_spec(spec);
        let pinned = self.catalog.pinned_version(&name).filter(|current| {
            constraint
                .as_deref()
                .is_none_or(|c| unipm_utils::satisfies(current, c))
        });

        let Some(current) = pinned else {
            if constraint.is_some() {
                return Ok(spec.to_string());
            }
            let latest = self.get_version(&name, None).await?;
            return Ok(format_package_spec(&name, &unipm_utils::format_caret(&latest)));
        };

        // The registry's own answer decides between caret and exact pin.
        // get_version folds a registry release older than the pin back
        // into the pin, which would hide the disagreement here.
        let version = match self.fetch_latest(&name, constraint.as_deref()).await {
            Some(latest) if latest == current => unipm_utils::format_caret(current),
            Some(_) => current.to_string(),
            None => {
                unipm_logger::warn(&format!(
                    "Failed to resolve the latest version of {name} from the registry, using {current}"
                ));
                unipm_utils::format_caret(current)
            }
        };
        Ok(format_package_spec(&name, &version))
    }

    /// Adds dependencies either by running the CLI (full install) or by
    /// editing the primary manifest directly (`skip_install`).
    pub async fn add_dependencies(&self, opts: &AddOptions, specs: &[String]) -> Result<()> {
        if specs.is_empty() {
            return Ok(());
        }

        if opts.skip_install {
            let versioned = self.get_versioned_packages(specs).await?;
            let path = self.primary_manifest.as_ref().ok_or_else(|| {
                PackageManagerError::ManifestError(format!(
                    "no {MANIFEST_FILE} found near {}",
                    self.cwd.display()
                ))
            })?;
            let mut pkg = read_package_json_file(path)?;
            let kind = if opts.dev {
                DependencyKind::DevDependencies
            } else {
                DependencyKind::Dependencies
            };
            for spec in &versioned {
                let (name, version) = parse_package_spec(spec);
                let version = version.ok_or_else(|| {
                    PackageManagerError::InstallFailed(format!("unversioned specifier '{spec}'"))
                })?;
                pkg.add_dependency(kind, &name, &version);
            }
            write_package_json_file(path, &mut pkg)?;
        } else {
            let cmd = self.backend.add_command(&self.context(), specs, opts.dev);
            self.run_install(cmd).await?;
        }

        self.cache.invalidate_installed();
        Ok(())
    }

    /// Removes dependencies from the first discovered manifest that
    /// actually declares any of them; later manifests are left alone.
    pub fn remove_dependencies(&self, names: &[String]) -> Result<()> {
        for path in &self.manifests {
            let mut pkg = read_package_json_file(path)?;
            let mut modified = false;
            for name in names {
                modified |= pkg.remove_dependency(name);
            }
            if modified {
                write_package_json_file(path, &mut pkg)
                    .map_err(|err| PackageManagerError::RemoveFailed(err.to_string()))?;
                self.cache.invalidate_installed();
                return Ok(());
            }
        }
        unipm_logger::warn(&format!(
            "None of the discovered manifests declare {}",
            names.join(", ")
        ));
        Ok(())
    }

    pub async fn install_dependencies(&self) -> Result<()> {
        let cmd = self.backend.install_command(&self.context());
        self.run_install(cmd).await?;
        self.cache.invalidate_installed();
        Ok(())
    }

    async fn run_install(&self, cmd: CommandLine) -> Result<ExecOutput> {
        match self.exec(cmd).await {
            Ok(output) => Ok(output),
            Err(err) => {
                let logs = err.combined_output();
                if !logs.is_empty() {
                    unipm_logger::error(&logs);
                }
                Err(PackageManagerError::InstallFailed(
                    self.backend.parse_error_logs(&logs),
                ))
            }
        }
    }

    /// Advisory dependency-tree query. A deep listing that fails for any
    /// reason is retried once as a shallow one; a second failure is
    /// reported as absence, never as an error.
    pub async fn find_installations(&self, patterns: &[String]) -> Option<InstallationMetadata> {
        self.find_installations_at(patterns, DEFAULT_TREE_DEPTH).await
    }

    pub async fn find_installations_at(
        &self,
        patterns: &[String],
        depth: u32,
    ) -> Option<InstallationMetadata> {
        match self.query_installations(patterns, depth).await {
            Some(metadata) => Some(metadata),
            None if depth > 0 => {
                unipm_logger::debug(&format!(
                    "Dependency listing at depth {depth} failed, retrying at depth 0"
                ));
                self.query_installations(patterns, 0).await
            }
            None => None,
        }
    }

    async fn query_installations(
        &self,
        patterns: &[String],
        depth: u32,
    ) -> Option<InstallationMetadata> {
        let cmd = self.backend.list_command(patterns, depth);
        match self.exec(cmd).await {
            Ok(output) => self.backend.parse_installations(&output.stdout, patterns),
            Err(err) => {
                unipm_logger::debug(&format!("Dependency listing failed: {err}"));
                None
            }
        }
    }

    /// Installed version of a single package, memoized including absence.
    pub async fn get_installed_version(&self, name: &str) -> Option<String> {
        if let Some(cached) = self.cache.get_installed(name) {
            return cached;
        }

        let patterns = vec![name.to_string()];
        let version = self.find_installations(&patterns).await.and_then(|meta| {
            meta.dependencies
                .get(name)
                .and_then(|records| records.first().map(|record| record.version.clone()))
        });
        self.cache.set_installed(name, version.clone());
        version
    }

    pub async fn get_registry_url(&self) -> Option<String> {
        match self.exec(self.backend.registry_command()).await {
            Ok(output) => unipm_backend::parse_registry_output(&output.stdout),
            Err(_) => None,
        }
    }

    /// Runs a manifest script with inherited stdio.
    pub async fn run_script(&self, script: &str, args: &[String]) -> Result<()> {
        let cmd = self.backend.run_command(script, args);
        let opts = ExecOptions {
            command: cmd.program,
            args: cmd.args,
            cwd: Some(self.cwd.clone()),
            print_output: true,
            ..ExecOptions::default()
        };
        match unipm_executor::execute(&opts).await {
            Ok(_) => Ok(()),
            Err(err) => Err(PackageManagerError::ScriptFailed(
                script.to_string(),
                err.status.unwrap_or(-1),
            )),
        }
    }

    /// Reads an installed module's manifest. Plug-n-play installs keep it
    /// inside an archive, reached through the backend's probe command;
    /// everything else is a conventional `node_modules` read.
    pub async fn read_module_manifest(&self, name: &str) -> Result<PackageJson> {
        if let Some(cmd) = self.backend.pnp_probe_command(&self.project_root, name) {
            if let Ok(output) = self.exec(cmd).await {
                if let Ok(pkg) = serde_json::from_str::<PackageJson>(output.stdout.trim()) {
                    return Ok(pkg);
                }
            }
        }

        let path = unipm_utils::module_dir(&self.project_root.join("node_modules"), name)
            .join(MANIFEST_FILE);
        Ok(read_package_json_file(&path)?)
    }
}

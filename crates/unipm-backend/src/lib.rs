pub mod bun;
pub mod npm;
pub mod parse;
pub mod pnpm;
pub mod yarn_berry;
pub mod yarn_classic;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub use bun::BunBackend;
pub use npm::NpmBackend;
pub use parse::{DependencyRecord, InstallationMetadata};
pub use pnpm::PnpmBackend;
pub use yarn_berry::YarnBerryBackend;
pub use yarn_classic::YarnClassicBackend;

/// Identity of a concrete package-manager CLI. Immutable once a facade
/// instance has been constructed around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManagerKind {
    Npm,
    Pnpm,
    YarnClassic,
    YarnBerry,
    Bun,
}

impl PackageManagerKind {
    pub const ALL: &[Self] = &[
        Self::Npm,
        Self::Pnpm,
        Self::YarnClassic,
        Self::YarnBerry,
        Self::Bun,
    ];

    #[must_use]
    pub fn backend(self) -> Box<dyn PackageManagerBackend> {
        match self {
            Self::Npm => Box::new(NpmBackend),
            Self::Pnpm => Box::new(PnpmBackend),
            Self::YarnClassic => Box::new(YarnClassicBackend),
            Self::YarnBerry => Box::new(YarnBerryBackend),
            Self::Bun => Box::new(BunBackend),
        }
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::Pnpm => write!(f, "pnpm"),
            Self::YarnClassic => write!(f, "yarn1"),
            Self::YarnBerry => write!(f, "yarn2"),
            Self::Bun => write!(f, "bun"),
        }
    }
}

impl FromStr for PackageManagerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "npm" => Ok(Self::Npm),
            "pnpm" => Ok(Self::Pnpm),
            "yarn" | "yarn1" => Ok(Self::YarnClassic),
            "berry" | "yarn2" => Ok(Self::YarnBerry),
            "bun" => Ok(Self::Bun),
            other => Err(format!("unknown package manager '{other}'")),
        }
    }
}

/// One command invocation as program + argument vector. Argument lists
/// are fixed templates; downstream tooling may assert on them verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    #[must_use]
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I: IntoIterator<Item = S>, S: Into<String>>(mut self, args: I) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Environment facts backends fold into their command templates. Computed
/// once by the facade so the backends themselves stay pure.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendContext {
    /// A recognized CI signal is present.
    pub is_ci: bool,
    /// The working directory is a workspace root (pnpm's marker file).
    pub workspace_root: bool,
}

/// The minimal per-backend contract. Everything here is pure — command
/// templates in, parsed structures out — so the five implementations are
/// trivially testable and all subprocess orchestration lives in one
/// place, the facade.
pub trait PackageManagerBackend: Send + Sync {
    fn kind(&self) -> PackageManagerKind;

    /// Short uppercase label used in classified error strings.
    fn label(&self) -> &'static str;

    /// The executable name (pre shim resolution).
    fn bin(&self) -> &'static str;

    fn lockfile(&self) -> &'static str;

    fn install_command(&self, ctx: &BackendContext) -> CommandLine;

    fn add_command(&self, ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine;

    fn run_command(&self, script: &str, args: &[String]) -> CommandLine;

    /// Latest-version query for a `name` or `name@constraint` spec.
    fn version_command(&self, spec: &str) -> CommandLine;

    fn registry_command(&self) -> CommandLine;

    fn list_command(&self, patterns: &[String], depth: u32) -> CommandLine;

    fn parse_version_output(&self, raw: &str) -> Option<String>;

    fn parse_installations(&self, raw: &str, patterns: &[String])
    -> Option<InstallationMetadata>;

    /// Maps raw CLI output to a human-readable classification. Never
    /// fails; unrecognized input degrades to `"<label> error"`.
    fn parse_error_logs(&self, logs: &str) -> String;

    fn info_command_hint(&self) -> &'static str;

    fn dedupe_command_hint(&self) -> &'static str;

    /// Command that prints a module's manifest through the backend's
    /// plug-n-play API, when the project uses one. `None` means "use the
    /// conventional node_modules lookup".
    fn pnp_probe_command(&self, project_root: &Path, name: &str) -> Option<CommandLine> {
        let _ = (project_root, name);
        None
    }
}

/// Interprets a registry-URL query's stdout. The CLIs print the literal
/// string `undefined` when nothing is configured; that means absent, not
/// a URL.
#[must_use]
pub fn parse_registry_output(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() || trimmed == "undefined" {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// npm-style version output: a JSON string for a single match, a JSON
/// array (ascending) when a range matched several. Non-JSON single-token
/// output is accepted as-is for CLIs that print the bare version.
#[must_use]
pub fn parse_json_version(raw: &str) -> Option<String> {
    match serde_json::from_str::<serde_json::Value>(raw.trim()) {
        Ok(serde_json::Value::String(version)) => Some(version),
        Ok(serde_json::Value::Array(versions)) => versions
            .last()
            .and_then(serde_json::Value::as_str)
            .map(ToString::to_string),
        _ => {
            let trimmed = raw.trim();
            if !trimmed.is_empty() && !trimmed.contains(char::is_whitespace) {
                Some(trimmed.trim_matches('"').to_string())
            } else {
                None
            }
        }
    }
}

/// Splits `name@version` at the last `@`, keeping scoped names intact.
#[must_use]
pub fn split_name_version(entry: &str) -> Option<(&str, &str)> {
    let at = entry.rfind('@')?;
    if at == 0 {
        return None;
    }
    Some((&entry[..at], &entry[at + 1..]))
}

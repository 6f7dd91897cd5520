use lazy_static::lazy_static;
use regex::Regex;
use unipm_constants::BUN_BINARY_LOCKFILE;

use crate::npm;
use crate::parse::InstallationMetadata;
use crate::{BackendContext, CommandLine, PackageManagerBackend, PackageManagerKind};

pub const BUN_ERRORS: &[(&str, &str)] = &[
    ("ConnectionRefused", "Network connection refused."),
    ("FileNotFound", "File or directory not found."),
    ("failed to resolve", "Could not resolve the requested version."),
    ("lockfile had changes", "Lockfile is out of date."),
    ("package not found", "Package not found in the registry."),
];

lazy_static! {
    static ref BUN_ERROR_LINE_RE: Regex = Regex::new(r"(?m)^error: (.+)$").unwrap();
}

/// Bun installs with its own CLI but has no deep-listing output this
/// parser understands, so version and tree queries are delegated to
/// npm's CLI and parsed with npm's decoders.
pub struct BunBackend;

impl PackageManagerBackend for BunBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Bun
    }

    fn label(&self) -> &'static str {
        "BUN"
    }

    fn bin(&self) -> &'static str {
        "bun"
    }

    fn lockfile(&self) -> &'static str {
        BUN_BINARY_LOCKFILE
    }

    fn install_command(&self, _ctx: &BackendContext) -> CommandLine {
        CommandLine::new("bun", &["install"])
    }

    fn add_command(&self, _ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine {
        let mut cmd = CommandLine::new("bun", &["add"]).args(specs.iter().cloned());
        if dev {
            cmd = cmd.arg("--dev");
        }
        cmd
    }

    fn run_command(&self, script: &str, args: &[String]) -> CommandLine {
        let mut cmd = CommandLine::new("bun", &["run", script]);
        if !args.is_empty() {
            cmd = cmd.args(args.iter().cloned());
        }
        cmd
    }

    fn version_command(&self, spec: &str) -> CommandLine {
        CommandLine::new("npm", &["info", spec, "version", "--json"])
    }

    fn registry_command(&self) -> CommandLine {
        CommandLine::new("npm", &["config", "get", "registry"])
    }

    fn list_command(&self, _patterns: &[String], depth: u32) -> CommandLine {
        CommandLine::new("npm", &["ls", "--json"]).arg(format!("--depth={depth}"))
    }

    fn parse_version_output(&self, raw: &str) -> Option<String> {
        crate::parse_json_version(raw)
    }

    fn parse_installations(
        &self,
        raw: &str,
        patterns: &[String],
    ) -> Option<InstallationMetadata> {
        let root: serde_json::Value = serde_json::from_str(raw).ok()?;
        let mut acc = crate::parse::DependencyAccumulator::new(patterns);
        npm::visit_tree(&root, &mut acc);
        Some(acc.finish(npm::INFO_COMMAND, npm::DEDUPE_COMMAND))
    }

    fn parse_error_logs(&self, logs: &str) -> String {
        for caps in BUN_ERROR_LINE_RE.captures_iter(logs) {
            let line = &caps[1];
            if let Some((_, text)) = BUN_ERRORS
                .iter()
                .find(|(fragment, _)| line.contains(fragment))
            {
                return format!("BUN error - {text}");
            }
        }
        "BUN error".to_string()
    }

    fn info_command_hint(&self) -> &'static str {
        npm::INFO_COMMAND
    }

    fn dedupe_command_hint(&self) -> &'static str {
        npm::DEDUPE_COMMAND
    }
}

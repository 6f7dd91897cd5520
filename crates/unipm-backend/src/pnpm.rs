use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unipm_constants::PNPM_LOCKFILE;

use crate::parse::{DependencyAccumulator, InstallationMetadata};
use crate::{BackendContext, CommandLine, PackageManagerBackend, PackageManagerKind};

pub const INFO_COMMAND: &str = "pnpm list --depth=1";
pub const DEDUPE_COMMAND: &str = "pnpm dedupe";

/// pnpm error codes, without their `ERR_PNPM_` prefix.
pub const PNPM_ERROR_CODES: &[(&str, &str)] = &[
    ("FETCH_401", "Authentication required for the registry."),
    ("FETCH_403", "Access to the package is forbidden."),
    ("FETCH_404", "Package not found in the registry."),
    ("LOCKFILE_BREAKING_CHANGE", "Lockfile was created by an incompatible pnpm version."),
    ("NO_MATCHING_VERSION", "No version matching the requested range."),
    ("OUTDATED_LOCKFILE", "Lockfile is out of date with package.json."),
    ("PEER_DEP_ISSUES", "Unmet or conflicting peer dependencies."),
    ("RECURSIVE_RUN_NO_SCRIPT", "Script missing from one of the workspace projects."),
    ("REGISTRIES_MISMATCH", "Registry configuration does not match the lockfile."),
    ("UNSUPPORTED_ENGINE", "Unsupported Node.js engine."),
];

lazy_static! {
    static ref PNPM_CODE_RE: Regex = Regex::new(r"ERR_PNPM_([A-Z0-9_]+)").unwrap();
}

pub struct PnpmBackend;

impl PackageManagerBackend for PnpmBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Pnpm
    }

    fn label(&self) -> &'static str {
        "PNPM"
    }

    fn bin(&self) -> &'static str {
        "pnpm"
    }

    fn lockfile(&self) -> &'static str {
        PNPM_LOCKFILE
    }

    fn install_command(&self, _ctx: &BackendContext) -> CommandLine {
        CommandLine::new("pnpm", &["install"])
    }

    /// Adding from a workspace root requires telling pnpm not to restrict
    /// the operation to the root project.
    fn add_command(&self, ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine {
        let mut cmd = CommandLine::new("pnpm", &["add"]).args(specs.iter().cloned());
        if dev {
            cmd = cmd.arg("--save-dev");
        }
        if ctx.workspace_root {
            cmd = cmd.arg("--ignore-workspace-root-check");
        }
        cmd
    }

    fn run_command(&self, script: &str, args: &[String]) -> CommandLine {
        let mut cmd = CommandLine::new("pnpm", &["run", script]);
        if !args.is_empty() {
            cmd = cmd.arg("--").args(args.iter().cloned());
        }
        cmd
    }

    fn version_command(&self, spec: &str) -> CommandLine {
        CommandLine::new("pnpm", &["info", spec, "version", "--json"])
    }

    fn registry_command(&self) -> CommandLine {
        CommandLine::new("pnpm", &["config", "get", "registry"])
    }

    fn list_command(&self, _patterns: &[String], depth: u32) -> CommandLine {
        CommandLine::new("pnpm", &["list", "--json"]).arg(format!("--depth={depth}"))
    }

    fn parse_version_output(&self, raw: &str) -> Option<String> {
        crate::parse_json_version(raw)
    }

    /// pnpm prints a flat JSON array of projects, each carrying nested
    /// dependency maps whose nodes know their own store path.
    fn parse_installations(
        &self,
        raw: &str,
        patterns: &[String],
    ) -> Option<InstallationMetadata> {
        let root: Value = serde_json::from_str(raw).ok()?;
        let projects = root.as_array()?;
        let mut acc = DependencyAccumulator::new(patterns);
        for project in projects {
            visit_project(project, &mut acc);
        }
        Some(acc.finish(INFO_COMMAND, DEDUPE_COMMAND))
    }

    fn parse_error_logs(&self, logs: &str) -> String {
        if let Some(caps) = PNPM_CODE_RE.captures(logs) {
            let code = &caps[1];
            if let Some((_, text)) = PNPM_ERROR_CODES.iter().find(|(known, _)| *known == code) {
                return format!("PNPM error {code} - {text}");
            }
            return format!("PNPM error {code}");
        }
        "PNPM error".to_string()
    }

    fn info_command_hint(&self) -> &'static str {
        INFO_COMMAND
    }

    fn dedupe_command_hint(&self) -> &'static str {
        DEDUPE_COMMAND
    }
}

fn visit_project(project: &Value, acc: &mut DependencyAccumulator) {
    for section in ["dependencies", "devDependencies", "optionalDependencies"] {
        if let Some(children) = project.get(section).and_then(Value::as_object) {
            for (name, node) in children {
                visit_node(name, node, acc);
            }
        }
    }
}

fn visit_node(name: &str, node: &Value, acc: &mut DependencyAccumulator) {
    if let Some(version) = node.get("version").and_then(Value::as_str) {
        let location = node.get("path").and_then(Value::as_str).unwrap_or("");
        acc.record(name, version, location);
    }
    if let Some(children) = node.get("dependencies").and_then(Value::as_object) {
        for (child_name, child) in children {
            visit_node(child_name, child, acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_fallback() {
        assert_eq!(PnpmBackend.parse_error_logs("garbage"), "PNPM error");
    }

    #[test]
    fn test_peer_dep_issue_classification() {
        let logs = "ERR_PNPM_PEER_DEP_ISSUES  Unmet peer dependencies";
        assert_eq!(
            PnpmBackend.parse_error_logs(logs),
            "PNPM error PEER_DEP_ISSUES - Unmet or conflicting peer dependencies."
        );
    }

    #[test]
    fn test_workspace_root_flag_only_when_marker_present() {
        let specs = vec!["react@^18.0.0".to_string()];
        let ctx = BackendContext {
            workspace_root: true,
            ..BackendContext::default()
        };
        let cmd = PnpmBackend.add_command(&ctx, &specs, false);
        assert_eq!(
            cmd.args,
            vec!["add", "react@^18.0.0", "--ignore-workspace-root-check"]
        );

        let cmd = PnpmBackend.add_command(&BackendContext::default(), &specs, true);
        assert_eq!(cmd.args, vec!["add", "react@^18.0.0", "--save-dev"]);
    }

    #[test]
    fn test_flat_project_list_parse() {
        let raw = r#"[
            {
                "name": "app",
                "path": "/repo/app",
                "dependencies": {
                    "x": {
                        "version": "1.0.0",
                        "path": "/repo/node_modules/.pnpm/x@1.0.0",
                        "dependencies": {
                            "y": { "version": "2.0.0", "path": "/repo/node_modules/.pnpm/y@2.0.0" }
                        }
                    }
                },
                "devDependencies": {
                    "y": { "version": "1.0.0", "path": "/repo/node_modules/.pnpm/y@1.0.0" }
                }
            }
        ]"#;
        let meta = PnpmBackend.parse_installations(raw, &[]).unwrap();
        assert_eq!(
            meta.duplicated_dependencies.get("y"),
            Some(&vec!["1.0.0".to_string(), "2.0.0".to_string()])
        );
        assert_eq!(
            meta.dependencies["x"][0].location,
            "/repo/node_modules/.pnpm/x@1.0.0"
        );
        assert_eq!(meta.dedupe_command, DEDUPE_COMMAND);
    }

    #[test]
    fn test_non_array_output_is_absent() {
        assert!(PnpmBackend.parse_installations("{}", &[]).is_none());
    }
}

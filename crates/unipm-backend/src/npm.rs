use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unipm_constants::NPM_LOCKFILE;

use crate::parse::{DependencyAccumulator, InstallationMetadata};
use crate::{BackendContext, CommandLine, PackageManagerBackend, PackageManagerKind};

pub const INFO_COMMAND: &str = "npm ls --depth=1";
pub const DEDUPE_COMMAND: &str = "npm dedupe";

/// Static catalog of npm error codes and their human-readable meaning.
pub const NPM_ERROR_CODES: &[(&str, &str)] = &[
    ("E401", "Authentication failed or is required."),
    ("E403", "Access to the resource is forbidden."),
    ("E404", "Requested resource not found."),
    ("EACCES", "Permission issue."),
    ("EAI_AGAIN", "DNS lookup timed out."),
    ("EBADENGINE", "Engine compatibility check failed."),
    ("EBADPLATFORM", "Platform not supported."),
    ("EEXIST", "File already exists."),
    ("EINVALIDTYPE", "Invalid type error in a command argument."),
    ("EISGIT", "Directory is a git repository."),
    ("EJSONPARSE", "Malformed package.json."),
    ("ENOENT", "File or directory not found."),
    ("ENOGIT", "Git is not installed or not found in PATH."),
    ("ENOSPC", "Insufficient disk space."),
    ("ENOVERSIONS", "No versions available for the requested package."),
    ("EOTP", "One-time password required."),
    ("EPERM", "Operation not permitted."),
    ("ERESOLVE", "Dependency resolution error."),
    ("ETARGET", "Requested version or tag does not exist."),
    ("ETIMEDOUT", "Network request timed out."),
    (
        "EUNSUPPORTEDPROTOCOL",
        "Unsupported protocol in dependency specifier.",
    ),
];

lazy_static! {
    // Old npm prints `npm ERR! code ERESOLVE`, npm >= 10 `npm error code ERESOLVE`.
    static ref NPM_CODE_RE: Regex =
        Regex::new(r"npm (?:ERR!|error) code (\w+)").unwrap();
}

fn classify(logs: &str) -> String {
    if let Some(caps) = NPM_CODE_RE.captures(logs) {
        let code = &caps[1];
        if let Some((_, text)) = NPM_ERROR_CODES.iter().find(|(known, _)| *known == code) {
            return format!("NPM error {code} - {text}");
        }
        return format!("NPM error {code}");
    }
    "NPM error".to_string()
}

/// Walks npm's nested `npm ls --json` tree. Deduped placeholder nodes
/// carry no version and are skipped (but still descended into).
pub(crate) fn visit_tree(node: &Value, acc: &mut DependencyAccumulator) {
    let Some(children) = node.get("dependencies").and_then(Value::as_object) else {
        return;
    };
    for (name, child) in children {
        if let Some(version) = child.get("version").and_then(Value::as_str) {
            let location = child
                .get("path")
                .or_else(|| child.get("resolved"))
                .and_then(Value::as_str)
                .unwrap_or("");
            acc.record(name, version, location);
        }
        visit_tree(child, acc);
    }
}

pub struct NpmBackend;

impl PackageManagerBackend for NpmBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::Npm
    }

    fn label(&self) -> &'static str {
        "NPM"
    }

    fn bin(&self) -> &'static str {
        "npm"
    }

    fn lockfile(&self) -> &'static str {
        NPM_LOCKFILE
    }

    fn install_command(&self, _ctx: &BackendContext) -> CommandLine {
        CommandLine::new("npm", &["install"])
    }

    fn add_command(&self, _ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine {
        let mut cmd = CommandLine::new("npm", &["install"]).args(specs.iter().cloned());
        if dev {
            cmd = cmd.arg("--save-dev");
        }
        cmd
    }

    fn run_command(&self, script: &str, args: &[String]) -> CommandLine {
        let mut cmd = CommandLine::new("npm", &["run", script]);
        if !args.is_empty() {
            cmd = cmd.arg("--").args(args.iter().cloned());
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
        let root: Value = serde_json::from_str(raw).ok()?;
        let mut acc = DependencyAccumulator::new(patterns);
        visit_tree(&root, &mut acc);
        Some(acc.finish(INFO_COMMAND, DEDUPE_COMMAND))
    }

    fn parse_error_logs(&self, logs: &str) -> String {
        classify(logs)
    }

    fn info_command_hint(&self) -> &'static str {
        INFO_COMMAND
    }

    fn dedupe_command_hint(&self) -> &'static str {
        DEDUPE_COMMAND
    }

    fn pnp_probe_command(&self, _project_root: &Path, _name: &str) -> Option<CommandLine> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_logs_fall_back_to_generic() {
        assert_eq!(NpmBackend.parse_error_logs("something exploded"), "NPM error");
    }

    #[test]
    fn test_eresolve_trace_is_classified() {
        let logs = "npm ERR! code ERESOLVE\nnpm ERR! ERESOLVE unable to resolve dependency tree";
        assert_eq!(
            NpmBackend.parse_error_logs(logs),
            "NPM error ERESOLVE - Dependency resolution error."
        );
    }

    #[test]
    fn test_new_style_error_lines_are_classified() {
        let logs = "npm error code ETARGET\nnpm error notarget No matching version found";
        assert_eq!(
            NpmBackend.parse_error_logs(logs),
            "NPM error ETARGET - Requested version or tag does not exist."
        );
    }

    #[test]
    fn test_unknown_code_keeps_the_code_without_suffix() {
        assert_eq!(
            NpmBackend.parse_error_logs("npm ERR! code EWHATEVER"),
            "NPM error EWHATEVER"
        );
    }

    #[test]
    fn test_list_command_template() {
        let cmd = NpmBackend.list_command(&[], 99);
        assert_eq!(cmd.program, "npm");
        assert_eq!(cmd.args, vec!["ls", "--json", "--depth=99"]);
    }

    #[test]
    fn test_tree_parse_collects_nested_duplicates() {
        let raw = r#"{
            "name": "demo",
            "dependencies": {
                "x": {
                    "version": "1.0.0",
                    "dependencies": {
                        "y": { "version": "2.0.0" }
                    }
                },
                "z": {
                    "version": "1.0.0",
                    "dependencies": {
                        "y": { "version": "1.5.0" }
                    }
                }
            }
        }"#;
        let meta = NpmBackend.parse_installations(raw, &[]).unwrap();
        assert_eq!(meta.dependencies["y"].len(), 2);
        assert_eq!(
            meta.duplicated_dependencies.get("y"),
            Some(&vec!["1.5.0".to_string(), "2.0.0".to_string()])
        );
        assert!(meta.duplicated_dependencies.get("x").is_none());
        assert_eq!(meta.info_command, INFO_COMMAND);
    }

    #[test]
    fn test_parse_is_idempotent() {
        let raw = r#"{"dependencies":{"x":{"version":"1.0.0"}}}"#;
        let first = NpmBackend.parse_installations(raw, &[]).unwrap();
        let second = NpmBackend.parse_installations(raw, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_non_json_output_is_absent_not_a_crash() {
        assert!(NpmBackend.parse_installations("npm ERR! oops", &[]).is_none());
    }
}

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unipm_constants::YARN_LOCKFILE;

use crate::parse::{DependencyAccumulator, InstallationMetadata};
use crate::{BackendContext, CommandLine, PackageManagerBackend, PackageManagerKind};

pub const INFO_COMMAND: &str = "yarn why";
// Yarn 1 never grew a dedupe subcommand.
pub const DEDUPE_COMMAND: &str = "npx yarn-deduplicate";

/// Yarn 1 has no error codes; known failures are recognized by message
/// fragments on its `error ...` lines.
pub const YARN1_ERRORS: &[(&str, &str)] = &[
    ("Couldn't find any versions", "No version matching the requested range."),
    ("Couldn't find package", "Package not found in the registry."),
    ("Incorrect integrity when fetching", "Integrity check failed."),
    (
        "There appears to be trouble with your network connection",
        "Network connection trouble.",
    ),
    ("Your lockfile needs to be updated", "Lockfile is out of date."),
    ("code E401", "Authentication failed or is required."),
    ("code E404", "Requested resource not found."),
    ("EACCES", "Permission issue."),
];

lazy_static! {
    static ref YARN1_ERROR_LINE_RE: Regex = Regex::new(r"(?m)^error (.+)$").unwrap();
}

pub struct YarnClassicBackend;

impl YarnClassicBackend {
    /// Outside CI the workspace-root guard is disabled so a monorepo
    /// package can be targeted directly; CI keeps yarn's default guard.
    fn workspace_args(ctx: &BackendContext) -> Option<&'static str> {
        if ctx.is_ci {
            None
        } else {
            Some("--ignore-workspace-root-check")
        }
    }
}

impl PackageManagerBackend for YarnClassicBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::YarnClassic
    }

    fn label(&self) -> &'static str {
        "YARN1"
    }

    fn bin(&self) -> &'static str {
        "yarn"
    }

    fn lockfile(&self) -> &'static str {
        YARN_LOCKFILE
    }

    fn install_command(&self, ctx: &BackendContext) -> CommandLine {
        let mut cmd = CommandLine::new("yarn", &["install"]);
        if let Some(flag) = Self::workspace_args(ctx) {
            cmd = cmd.arg(flag);
        }
        cmd
    }

    fn add_command(&self, ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine {
        let mut cmd = CommandLine::new("yarn", &["add"]).args(specs.iter().cloned());
        if dev {
            cmd = cmd.arg("--dev");
        }
        if let Some(flag) = Self::workspace_args(ctx) {
            cmd = cmd.arg(flag);
        }
        cmd
    }

    fn run_command(&self, script: &str, args: &[String]) -> CommandLine {
        let mut cmd = CommandLine::new("yarn", &["run", script]);
        if !args.is_empty() {
            cmd = cmd.args(args.iter().cloned());
        }
        cmd
    }

    fn version_command(&self, spec: &str) -> CommandLine {
        CommandLine::new("yarn", &["info", spec, "version", "--json"])
    }

    fn registry_command(&self) -> CommandLine {
        CommandLine::new("yarn", &["config", "get", "registry"])
    }

    fn list_command(&self, patterns: &[String], _depth: u32) -> CommandLine {
        let mut cmd = CommandLine::new("yarn", &["list"]);
        if !patterns.is_empty() {
            // A single space-joined --pattern argument; yarn treats the
            // spaces as alternatives.
            cmd = cmd.arg("--pattern").arg(patterns.join(" "));
        }
        cmd.arg("--recursive").arg("--json")
    }

    /// Yarn 1 wraps values: `{"type":"inspect","data":"1.2.3"}`.
    fn parse_version_output(&self, raw: &str) -> Option<String> {
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        match value.get("data") {
            Some(Value::String(version)) => Some(version.clone()),
            Some(Value::Array(versions)) => versions
                .last()
                .and_then(Value::as_str)
                .map(ToString::to_string),
            _ => None,
        }
    }

    /// `yarn list --json` emits a `tree` document whose nodes are
    /// `name@version` strings with nested children.
    fn parse_installations(
        &self,
        raw: &str,
        patterns: &[String],
    ) -> Option<InstallationMetadata> {
        let root: Value = serde_json::from_str(raw).ok()?;
        let trees = root
            .get("data")
            .and_then(|data| data.get("trees"))
            .and_then(Value::as_array)?;
        let mut acc = DependencyAccumulator::new(patterns);
        for tree in trees {
            visit_tree_node(tree, &mut acc);
        }
        Some(acc.finish(INFO_COMMAND, DEDUPE_COMMAND))
    }

    fn parse_error_logs(&self, logs: &str) -> String {
        for caps in YARN1_ERROR_LINE_RE.captures_iter(logs) {
            let line = &caps[1];
            if let Some((_, text)) = YARN1_ERRORS
                .iter()
                .find(|(fragment, _)| line.contains(fragment))
            {
                return format!("YARN1 error - {text}");
            }
        }
        "YARN1 error".to_string()
    }

    fn info_command_hint(&self) -> &'static str {
        INFO_COMMAND
    }

    fn dedupe_command_hint(&self) -> &'static str {
        DEDUPE_COMMAND
    }
}

fn visit_tree_node(node: &Value, acc: &mut DependencyAccumulator) {
    if let Some(entry) = node.get("name").and_then(Value::as_str) {
        if let Some((name, version)) = crate::split_name_version(entry) {
            acc.record(name, version, "");
        }
    }
    if let Some(children) = node.get("children").and_then(Value::as_array) {
        for child in children {
            visit_tree_node(child, acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_fallback_is_exact() {
        assert_eq!(
            YarnClassicBackend.parse_error_logs("warning something minor"),
            "YARN1 error"
        );
    }

    #[test]
    fn test_missing_package_classification() {
        let logs = "yarn add v1.22.19\nerror Couldn't find package \"nope\" on the \"npm\" registry.";
        assert_eq!(
            YarnClassicBackend.parse_error_logs(logs),
            "YARN1 error - Package not found in the registry."
        );
    }

    #[test]
    fn test_ci_drops_workspace_root_flag() {
        let specs = vec!["react".to_string()];
        let local = YarnClassicBackend.add_command(&BackendContext::default(), &specs, false);
        assert_eq!(
            local.args,
            vec!["add", "react", "--ignore-workspace-root-check"]
        );

        let ci = BackendContext {
            is_ci: true,
            ..BackendContext::default()
        };
        let on_ci = YarnClassicBackend.add_command(&ci, &specs, true);
        assert_eq!(on_ci.args, vec!["add", "react", "--dev"]);
    }

    #[test]
    fn test_inspect_wrapper_version_parse() {
        let raw = r#"{"type":"inspect","data":"1.22.19"}"#;
        assert_eq!(
            YarnClassicBackend.parse_version_output(raw),
            Some("1.22.19".to_string())
        );
    }

    #[test]
    fn test_tree_parse_with_scoped_names() {
        let raw = r#"{
            "type": "tree",
            "data": {
                "type": "list",
                "trees": [
                    {
                        "name": "@scope/ui@1.0.0",
                        "children": [
                            { "name": "x@2.0.0", "children": [] }
                        ]
                    },
                    { "name": "x@1.0.0", "children": [] }
                ]
            }
        }"#;
        let meta = YarnClassicBackend
            .parse_installations(raw, &["@scope/*".to_string(), "x".to_string()])
            .unwrap();
        assert_eq!(meta.dependencies["@scope/ui"][0].version, "1.0.0");
        assert_eq!(
            meta.duplicated_dependencies.get("x"),
            Some(&vec!["1.0.0".to_string(), "2.0.0".to_string()])
        );
    }

    #[test]
    fn test_list_command_joins_patterns() {
        let cmd = YarnClassicBackend.list_command(
            &["@scope/*".to_string(), "other".to_string()],
            99,
        );
        assert_eq!(
            cmd.args,
            vec!["list", "--pattern", "@scope/* other", "--recursive", "--json"]
        );
    }
}

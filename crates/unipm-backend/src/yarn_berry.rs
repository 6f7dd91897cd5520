use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unipm_constants::{PNP_LOADER_FILE, YARN_LOCKFILE};

use crate::parse::{DependencyAccumulator, InstallationMetadata};
use crate::{BackendContext, CommandLine, PackageManagerBackend, PackageManagerKind};

pub const INFO_COMMAND: &str = "yarn why";
pub const DEDUPE_COMMAND: &str = "yarn dedupe";

/// Yarn Berry diagnostic codes and their symbolic names. Informational
/// `YN0000` is deliberately absent — it prefixes normal output.
pub const YARN2_ERROR_CODES: &[(&str, &str)] = &[
    ("YN0001", "EXCEPTION"),
    ("YN0002", "MISSING_PEER_DEPENDENCY"),
    ("YN0003", "CYCLIC_DEPENDENCIES"),
    ("YN0005", "BUILD_DISABLED"),
    ("YN0009", "BUILD_FAILED"),
    ("YN0010", "RESOLVER_NOT_FOUND"),
    ("YN0011", "FETCHER_NOT_FOUND"),
    ("YN0012", "LINKER_NOT_FOUND"),
    ("YN0013", "FETCH_NOT_CACHED"),
    ("YN0015", "REMOTE_INVALID"),
    ("YN0016", "REMOTE_NOT_FOUND"),
    ("YN0018", "CACHE_CHECKSUM_MISMATCH"),
    ("YN0020", "MISSING_LOCKFILE_ENTRY"),
    ("YN0021", "WORKSPACE_NOT_FOUND"),
    ("YN0028", "FROZEN_LOCKFILE_EXCEPTION"),
    ("YN0030", "FETCH_FAILED"),
    ("YN0035", "NETWORK_ERROR"),
    ("YN0041", "INVALID_AUTHENTICATION"),
    ("YN0046", "AUTOMERGE_FAILED_TO_PARSE"),
    ("YN0047", "AUTOMERGE_IMMUTABLE"),
    ("YN0059", "INVALID_RANGE_PEER_DEPENDENCY"),
    ("YN0060", "INCOMPATIBLE_PEER_DEPENDENCY"),
    ("YN0062", "INCOMPATIBLE_OS"),
    ("YN0063", "INCOMPATIBLE_CPU"),
    ("YN0071", "NM_CANT_INSTALL_EXTERNAL_SOFT_LINK"),
    ("YN0076", "INCOMPATIBLE_ARCHITECTURE"),
    ("YN0080", "NETWORK_DISABLED"),
    ("YN0081", "NETWORK_UNSAFE_HTTP"),
    ("YN0082", "RESOLUTION_FAILED"),
];

lazy_static! {
    static ref YARN2_CODE_RE: Regex = Regex::new(r"(YN\d{4}): (.+)").unwrap();
}

pub struct YarnBerryBackend;

impl PackageManagerBackend for YarnBerryBackend {
    fn kind(&self) -> PackageManagerKind {
        PackageManagerKind::YarnBerry
    }

    fn label(&self) -> &'static str {
        "YARN2"
    }

    fn bin(&self) -> &'static str {
        "yarn"
    }

    fn lockfile(&self) -> &'static str {
        YARN_LOCKFILE
    }

    fn install_command(&self, _ctx: &BackendContext) -> CommandLine {
        CommandLine::new("yarn", &["install"])
    }

    fn add_command(&self, _ctx: &BackendContext, specs: &[String], dev: bool) -> CommandLine {
        let mut cmd = CommandLine::new("yarn", &["add"]).args(specs.iter().cloned());
        if dev {
            cmd = cmd.arg("--dev");
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
        CommandLine::new("yarn", &["npm", "info", spec, "--fields", "version", "--json"])
    }

    fn registry_command(&self) -> CommandLine {
        CommandLine::new("yarn", &["config", "get", "npmRegistryServer"])
    }

    fn list_command(&self, patterns: &[String], _depth: u32) -> CommandLine {
        CommandLine::new("yarn", &["info", "--name-only", "--recursive"])
            .args(patterns.iter().cloned())
    }

    /// `yarn npm info --fields version --json` prints one JSON object.
    fn parse_version_output(&self, raw: &str) -> Option<String> {
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        value
            .get("version")
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }

    /// Line-oriented output: one `name@npm:version` locator per line,
    /// quoted. Workspace and virtual locators are not installations and
    /// are skipped.
    fn parse_installations(
        &self,
        raw: &str,
        patterns: &[String],
    ) -> Option<InstallationMetadata> {
        let mut acc = DependencyAccumulator::new(patterns);
        let mut saw_entry = false;
        for line in raw.lines() {
            let entry = line.trim().trim_matches('"');
            if entry.is_empty() {
                continue;
            }
            saw_entry = true;
            let Some(split) = entry.rfind("@npm:") else {
                continue;
            };
            let name = &entry[..split];
            let version = &entry[split + "@npm:".len()..];
            // Parameterized locators carry resolution params after `::`.
            let version = version.split("::").next().unwrap_or(version);
            acc.record(name, version, "");
        }
        if saw_entry {
            Some(acc.finish(INFO_COMMAND, DEDUPE_COMMAND))
        } else {
            None
        }
    }

    /// A single Berry failure often reports several structured codes;
    /// each recognized one contributes a block naming the code and its
    /// first detail line.
    fn parse_error_logs(&self, logs: &str) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let mut seen: Vec<String> = Vec::new();
        for caps in YARN2_CODE_RE.captures_iter(logs) {
            let code = caps[1].to_string();
            if seen.contains(&code) {
                continue;
            }
            let Some((_, symbol)) = YARN2_ERROR_CODES.iter().find(|(known, _)| *known == code)
            else {
                continue;
            };
            let detail = caps[2].trim_start_matches(['│', '┌', '└', ' ']).trim();
            blocks.push(format!("{code} - {symbol}\n{detail}"));
            seen.push(code);
        }
        if blocks.is_empty() {
            "YARN2 error".to_string()
        } else {
            blocks.join("\n\n")
        }
    }

    fn info_command_hint(&self) -> &'static str {
        INFO_COMMAND
    }

    fn dedupe_command_hint(&self) -> &'static str {
        DEDUPE_COMMAND
    }

    /// PnP installs keep manifests inside zip archives; reading one needs
    /// the loader's virtual filesystem, reached through node. Absent the
    /// loader file, callers fall back to a node_modules lookup.
    fn pnp_probe_command(&self, project_root: &Path, name: &str) -> Option<CommandLine> {
        let loader = project_root.join(PNP_LOADER_FILE);
        if !loader.is_file() {
            return None;
        }
        let script = format!(
            "console.log(JSON.stringify(require('{name}/package.json')))"
        );
        Some(
            CommandLine::new("node", &["--require"])
                .arg(loader.to_string_lossy().into_owned())
                .arg("-e")
                .arg(script),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_fallback() {
        assert_eq!(
            YarnBerryBackend.parse_error_logs("Usage Error: something"),
            "YARN2 error"
        );
    }

    #[test]
    fn test_multiple_codes_become_blocks() {
        let logs = "\
➤ YN0000: ┌ Resolution step
➤ YN0001: │ Error: something broke badly
➤ YN0060: │ react is listed by your project with version 18.0.0
➤ YN0001: │ repeated exception detail
➤ YN0000: └ Completed";
        let classified = YarnBerryBackend.parse_error_logs(logs);
        let blocks: Vec<&str> = classified.split("\n\n").collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            "YN0001 - EXCEPTION\nError: something broke badly"
        );
        assert_eq!(
            blocks[1],
            "YN0060 - INCOMPATIBLE_PEER_DEPENDENCY\nreact is listed by your project with version 18.0.0"
        );
    }

    #[test]
    fn test_informational_code_alone_is_generic() {
        let logs = "➤ YN0000: · Yarn 4.0.2\n➤ YN0000: └ Completed in 0s 82ms";
        assert_eq!(YarnBerryBackend.parse_error_logs(logs), "YARN2 error");
    }

    #[test]
    fn test_name_only_listing_parse() {
        let raw = "\
\"@scope/ui@npm:1.0.0\"
\"x@npm:2.0.0\"
\"x@npm:1.0.0\"
\"app@workspace:.\"
";
        let meta = YarnBerryBackend.parse_installations(raw, &[]).unwrap();
        assert_eq!(
            meta.duplicated_dependencies.get("x"),
            Some(&vec!["1.0.0".to_string(), "2.0.0".to_string()])
        );
        assert_eq!(meta.dependencies["@scope/ui"][0].version, "1.0.0");
        assert!(!meta.dependencies.contains_key("app"));
    }

    #[test]
    fn test_version_field_object_parse() {
        let raw = r#"{"version":"8.3.0"}"#;
        assert_eq!(
            YarnBerryBackend.parse_version_output(raw),
            Some("8.3.0".to_string())
        );
    }

    #[test]
    fn test_pnp_probe_requires_loader_file() {
        let missing = YarnBerryBackend
            .pnp_probe_command(Path::new("/definitely/not/there"), "react");
        assert!(missing.is_none());
    }
}

use std::collections::BTreeMap;

use regex::Regex;
use unipm_utils::insert_sorted;

/// The smallest unit of a resolution result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    pub name: String,
    pub version: String,
    pub location: String,
}

/// Normalized result of a dependency-tree query. Built fresh per query,
/// never persisted. Map keys are sorted, so re-parsing identical input
/// yields identical metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstallationMetadata {
    pub dependencies: BTreeMap<String, Vec<DependencyRecord>>,
    /// Names resolved to more than one distinct version, with the full
    /// version list sorted ascending.
    pub duplicated_dependencies: BTreeMap<String, Vec<String>>,
    /// Backend-specific hint for inspecting a single dependency.
    pub info_command: String,
    /// Backend-specific hint for collapsing duplicates.
    pub dedupe_command: String,
}

/// Shared "accumulate records, detect duplicates" reducer. Each backend
/// decodes its own output shape and feeds every visited node through
/// [`DependencyAccumulator::record`], so duplicate detection is written
/// (and tested) exactly once.
pub struct DependencyAccumulator {
    patterns: Vec<Regex>,
    dependencies: BTreeMap<String, Vec<DependencyRecord>>,
    histories: BTreeMap<String, Vec<String>>,
}

impl DependencyAccumulator {
    #[must_use]
    pub fn new(patterns: &[String]) -> Self {
        Self {
            patterns: patterns.iter().filter_map(|p| compile_pattern(p)).collect(),
            dependencies: BTreeMap::new(),
            histories: BTreeMap::new(),
        }
    }

    /// An empty pattern list matches everything.
    fn matches(&self, name: &str) -> bool {
        self.patterns.is_empty() || self.patterns.iter().any(|re| re.is_match(name))
    }

    pub fn record(&mut self, name: &str, version: &str, location: &str) {
        if !self.matches(name) {
            return;
        }

        let records = self.dependencies.entry(name.to_string()).or_default();
        // The same (name, version) pair showing up under several parents
        // is one installation, not a duplicate.
        if records.iter().any(|r| r.version == version) {
            return;
        }

        records.push(DependencyRecord {
            name: name.to_string(),
            version: version.to_string(),
            location: location.to_string(),
        });
        insert_sorted(
            self.histories.entry(name.to_string()).or_default(),
            version,
        );
    }

    #[must_use]
    pub fn finish(self, info_command: &str, dedupe_command: &str) -> InstallationMetadata {
        let Self {
            dependencies,
            histories,
            ..
        } = self;
        let duplicated_dependencies = histories
            .into_iter()
            .filter(|(_, versions)| versions.len() > 1)
            .collect();

        InstallationMetadata {
            dependencies,
            duplicated_dependencies,
            info_command: info_command.to_string(),
            dedupe_command: dedupe_command.to_string(),
        }
    }
}

/// Compiles a glob-style name pattern (`*` matches any substring) into an
/// anchored regex; every other character is taken literally.
fn compile_pattern(pattern: &str) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{body}$")).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_pattern_scoped_wildcard() {
        let acc = DependencyAccumulator::new(&strings(&["@scope/*"]));
        assert!(acc.matches("@scope/foo"));
        assert!(acc.matches("@scope/bar"));
        assert!(!acc.matches("@other/foo"));
    }

    #[test]
    fn test_pattern_literal_dots_are_not_wildcards() {
        let acc = DependencyAccumulator::new(&strings(&["lodash.merge"]));
        assert!(acc.matches("lodash.merge"));
        assert!(!acc.matches("lodashxmerge"));
    }

    #[test]
    fn test_empty_patterns_match_all() {
        let acc = DependencyAccumulator::new(&[]);
        assert!(acc.matches("anything"));
    }

    #[test]
    fn test_two_versions_are_a_duplicate_sorted_ascending() {
        let mut acc = DependencyAccumulator::new(&[]);
        acc.record("x", "2.0.0", "a/node_modules/x");
        acc.record("x", "1.0.0", "b/node_modules/x");
        let meta = acc.finish("", "");
        assert_eq!(
            meta.duplicated_dependencies.get("x"),
            Some(&vec!["1.0.0".to_string(), "2.0.0".to_string()])
        );
        // Record order follows first discovery, not version order.
        let records = &meta.dependencies["x"];
        assert_eq!(records[0].version, "2.0.0");
        assert_eq!(records[1].version, "1.0.0");
    }

    #[test]
    fn test_same_version_twice_is_not_a_duplicate() {
        let mut acc = DependencyAccumulator::new(&[]);
        acc.record("x", "1.0.0", "a/node_modules/x");
        acc.record("x", "1.0.0", "b/node_modules/x");
        let meta = acc.finish("", "");
        assert!(meta.duplicated_dependencies.is_empty());
        assert_eq!(meta.dependencies["x"].len(), 1);
    }

    #[test]
    fn test_non_matching_names_are_skipped() {
        let mut acc = DependencyAccumulator::new(&strings(&["@scope/*"]));
        acc.record("react", "18.2.0", "");
        acc.record("@scope/ui", "1.0.0", "");
        let meta = acc.finish("", "");
        assert_eq!(meta.dependencies.len(), 1);
        assert!(meta.dependencies.contains_key("@scope/ui"));
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A project manifest. Field order is preserved on rewrite; empty
/// dependency maps are pruned to `None` before serialization so they are
/// omitted entirely, never written as `{}`.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct PackageJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<IndexMap<String, String>>,
    #[serde(rename = "devDependencies", skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<IndexMap<String, String>>,
    #[serde(rename = "peerDependencies", skip_serializing_if = "Option::is_none")]
    pub peer_dependencies: Option<IndexMap<String, String>>,
    /// npm's override map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overrides: Option<IndexMap<String, serde_json::Value>>,
    /// Yarn's equivalent of `overrides`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolutions: Option<IndexMap<String, String>>,
    /// Workspace marker; shape differs between npm/yarn (array) and
    /// nested forms, so it stays a raw value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<serde_json::Value>,
    #[serde(rename = "eslintConfig", skip_serializing_if = "Option::is_none")]
    pub eslint_config: Option<serde_json::Value>,
    // Catch-all so unknown fields survive a rewrite.
    #[serde(flatten)]
    pub other: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyKind {
    Dependencies,
    DevDependencies,
    PeerDependencies,
}

impl PackageJson {
    fn map_for(&mut self, kind: DependencyKind) -> &mut IndexMap<String, String> {
        let slot = match kind {
            DependencyKind::Dependencies => &mut self.dependencies,
            DependencyKind::DevDependencies => &mut self.dev_dependencies,
            DependencyKind::PeerDependencies => &mut self.peer_dependencies,
        };
        slot.get_or_insert_with(IndexMap::new)
    }

    pub fn add_dependency(&mut self, kind: DependencyKind, name: &str, version: &str) {
        self.map_for(kind).insert(name.to_string(), version.to_string());
    }

    /// Removes `name` from every dependency map. Returns true when any
    /// map actually contained it.
    pub fn remove_dependency(&mut self, name: &str) -> bool {
        let mut removed = false;
        for map in [
            &mut self.dependencies,
            &mut self.dev_dependencies,
            &mut self.peer_dependencies,
        ]
        .into_iter()
        .flatten()
        {
            removed |= map.shift_remove(name).is_some();
        }
        removed
    }

    pub fn dependency_version(&self, name: &str) -> Option<&str> {
        for map in [
            &self.dependencies,
            &self.dev_dependencies,
            &self.peer_dependencies,
        ]
        .into_iter()
        .flatten()
        {
            if let Some(version) = map.get(name) {
                return Some(version);
            }
        }
        None
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependency_version(name).is_some()
    }

    /// Declares-on check used for primary-manifest selection: only
    /// `dependencies` and `devDependencies` count as declaring a tool.
    pub fn declares(&self, name: &str) -> bool {
        [&self.dependencies, &self.dev_dependencies]
            .into_iter()
            .flatten()
            .any(|map| map.contains_key(name))
    }

    /// Prunes empty dependency maps so they vanish from the output.
    pub fn prune_empty_sections(&mut self) {
        for slot in [
            &mut self.dependencies,
            &mut self.dev_dependencies,
            &mut self.peer_dependencies,
            &mut self.resolutions,
        ] {
            if slot.as_ref().is_some_and(IndexMap::is_empty) {
                *slot = None;
            }
        }
        if self.overrides.as_ref().is_some_and(IndexMap::is_empty) {
            self.overrides = None;
        }
    }
}

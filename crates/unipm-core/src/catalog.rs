use std::collections::HashMap;

/// First-party package catalog of the orchestrating tool: its own package
/// name (used to pick the primary manifest) and the versions it ships
/// pinned at build time. Version resolution prefers a pinned version over
/// whatever the registry reports, unless the registry is strictly newer.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tool_package: Option<String>,
    pinned: HashMap<String, String>,
}

impl Catalog {
    #[must_use]
    pub fn new(tool_package: Option<&str>, pinned: HashMap<String, String>) -> Self {
        Self {
            tool_package: tool_package.map(ToString::to_string),
            pinned,
        }
    }

    #[must_use]
    pub fn tool_package(&self) -> Option<&str> {
        self.tool_package.as_deref()
    }

    #[must_use]
    pub fn pinned_version(&self, name: &str) -> Option<&str> {
        self.pinned.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let pinned = HashMap::from([("toolkit-cli".to_string(), "8.3.0".to_string())]);
        let catalog = Catalog::new(Some("toolkit"), pinned);
        assert_eq!(catalog.tool_package(), Some("toolkit"));
        assert_eq!(catalog.pinned_version("toolkit-cli"), Some("8.3.0"));
        assert_eq!(catalog.pinned_version("react"), None);
    }
}

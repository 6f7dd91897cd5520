use std::path::{Path, PathBuf};

/// Directory of an installed module under `node_modules`, scope-aware:
/// `@scope/pkg` lives at `node_modules/@scope/pkg`.
pub fn module_dir(node_modules: &Path, name: &str) -> PathBuf {
    if let Some(rest) = name.strip_prefix('@') {
        if let Some(slash) = rest.find('/') {
            let scope = &name[..slash + 1];
            let pkg = &rest[slash..][1..];
            return node_modules.join(scope).join(pkg);
        }
    }
    node_modules.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_module_dir() {
        let dir = module_dir(Path::new("node_modules"), "react");
        assert_eq!(dir, Path::new("node_modules/react"));
    }

    #[test]
    fn test_scoped_module_dir() {
        let dir = module_dir(Path::new("node_modules"), "@scope/pkg");
        assert_eq!(dir, Path::new("node_modules/@scope/pkg"));
    }
}

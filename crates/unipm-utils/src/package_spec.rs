/// Splits a `name[@version]` specifier into name and optional version.
///
/// Scoped packages keep their leading `@`: `@scope/pkg@1.2.3` splits at
/// the second `@`, a bare `@scope/pkg` has no version part.
pub fn parse_package_spec(spec: &str) -> (String, Option<String>) {
    let search_from = if spec.starts_with('@') {
        // Skip the scope marker; the version separator can only come
        // after the scope/name slash.
        spec.find('/').map_or(spec.len(), |slash| slash + 1)
    } else {
        0
    };

    match spec[search_from..].find('@') {
        Some(at) if search_from + at > 0 => {
            let split = search_from + at;
            let name = spec[..split].to_string();
            let version = spec[split + 1..].to_string();
            if version.is_empty() {
                (name, None)
            } else {
                (name, Some(version))
            }
        }
        _ => (spec.to_string(), None),
    }
}

/// Rebuilds a specifier from its parts.
pub fn format_package_spec(name: &str, version: &str) -> String {
    format!("{name}@{version}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_name() {
        assert_eq!(parse_package_spec("react"), ("react".to_string(), None));
    }

    #[test]
    fn test_name_with_version() {
        assert_eq!(
            parse_package_spec("react@18.2.0"),
            ("react".to_string(), Some("18.2.0".to_string()))
        );
    }

    #[test]
    fn test_scoped_name() {
        assert_eq!(
            parse_package_spec("@scope/pkg"),
            ("@scope/pkg".to_string(), None)
        );
    }

    #[test]
    fn test_scoped_name_with_version() {
        assert_eq!(
            parse_package_spec("@scope/pkg@1.0.0-rc.1"),
            ("@scope/pkg".to_string(), Some("1.0.0-rc.1".to_string()))
        );
    }

    #[test]
    fn test_range_version() {
        assert_eq!(
            parse_package_spec("eslint@^8.0.0"),
            ("eslint".to_string(), Some("^8.0.0".to_string()))
        );
    }

    #[test]
    fn test_trailing_at() {
        assert_eq!(parse_package_spec("react@"), ("react".to_string(), None));
    }
}

use semver::{Version, VersionReq};

/// Parses a version string leniently: leading range sigils and a `v`
/// prefix are tolerated, since CLI output mixes `1.2.3`, `v1.2.3` and
/// `^1.2.3` freely.
pub fn parse_loose(version: &str) -> Option<Version> {
    let trimmed = version
        .trim()
        .trim_start_matches(['^', '~', '='])
        .trim_start_matches('v');
    Version::parse(trimmed).ok()
}

/// True when `candidate` is a strictly newer release than `baseline`.
/// Unparseable input never counts as newer.
pub fn is_strictly_greater(candidate: &str, baseline: &str) -> bool {
    match (parse_loose(candidate), parse_loose(baseline)) {
        (Some(c), Some(b)) => c > b,
        _ => false,
    }
}

/// True when `version` satisfies `constraint`. An unparseable constraint
/// is treated as satisfied — this layer only does simple constraint
/// checks, full range algebra belongs to the underlying CLI.
pub fn satisfies(version: &str, constraint: &str) -> bool {
    let Some(parsed) = parse_loose(version) else {
        return false;
    };
    match VersionReq::parse(constraint.trim()) {
        Ok(req) => req.matches(&parsed),
        Err(_) => true,
    }
}

/// Prefixes a caret unless the string already carries range syntax.
pub fn format_caret(version: &str) -> String {
    if version.starts_with(['^', '~', '>', '<', '=']) || version.contains(' ') {
        version.to_string()
    } else {
        format!("^{version}")
    }
}

/// Insertion sort step keeping a version history ascending. Semver order
/// when both sides parse, lexicographic otherwise.
pub fn insert_sorted(history: &mut Vec<String>, version: &str) {
    let position = history
        .iter()
        .position(|existing| compare(version, existing) == std::cmp::Ordering::Less)
        .unwrap_or(history.len());
    history.insert(position, version.to_string());
}

fn compare(a: &str, b: &str) -> std::cmp::Ordering {
    match (parse_loose(a), parse_loose(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loose_variants() {
        assert!(parse_loose("1.2.3").is_some());
        assert!(parse_loose("v1.2.3").is_some());
        assert!(parse_loose("^1.2.3").is_some());
        assert!(parse_loose("not-a-version").is_none());
    }

    #[test]
    fn test_strictly_greater() {
        assert!(is_strictly_greater("8.3.1", "8.3.0"));
        assert!(!is_strictly_greater("8.3.0", "8.3.0"));
        assert!(!is_strictly_greater("8.2.9", "8.3.0"));
        assert!(!is_strictly_greater("garbage", "8.3.0"));
    }

    #[test]
    fn test_satisfies() {
        assert!(satisfies("8.3.0", "^8.0.0"));
        assert!(!satisfies("9.0.0", "^8.0.0"));
        // Unparseable constraints are not this layer's business.
        assert!(satisfies("8.3.0", "workspace:*"));
    }

    #[test]
    fn test_format_caret() {
        assert_eq!(format_caret("8.3.0"), "^8.3.0");
        assert_eq!(format_caret("^8.3.0"), "^8.3.0");
        assert_eq!(format_caret("~8.3.0"), "~8.3.0");
        assert_eq!(format_caret(">=2.0.0 <3.0.0"), ">=2.0.0 <3.0.0");
    }

    #[test]
    fn test_insert_sorted() {
        let mut history = Vec::new();
        insert_sorted(&mut history, "2.0.0");
        insert_sorted(&mut history, "1.0.0");
        insert_sorted(&mut history, "1.10.0");
        insert_sorted(&mut history, "1.9.0");
        assert_eq!(history, vec!["1.0.0", "1.9.0", "1.10.0", "2.0.0"]);
    }
}

//! Candidate database host resolution.
//!
//! Produces the ordered list of host names the connection manager tries.
//! An explicit override short-circuits everything; otherwise names are built
//! from the service name, namespace hints, and the cluster DNS suffix.

use std::path::Path;

use tally_config::DatabaseConfig;

/// Ordered, de-duplicated candidate hosts for `config`.
///
/// Never empty: with no hints at all the bare service name is still present.
/// The only side effect is a best-effort read of the namespace file.
#[must_use]
pub fn resolve_candidates(config: &DatabaseConfig) -> Vec<String> {
    if let Some(host) = config.host_override() {
        return vec![host.to_string()];
    }
    let detected = read_namespace_file(&config.namespace_file);
    build_candidates(config, detected.as_deref())
}

/// Discovery without touching the filesystem. `detected_namespace` stands in
/// for the namespace file's contents.
#[must_use]
pub fn build_candidates(config: &DatabaseConfig, detected_namespace: Option<&str>) -> Vec<String> {
    if let Some(host) = config.host_override() {
        return vec![host.to_string()];
    }

    let service = config.discovery_service();
    let suffix = config.cluster_suffix.trim();
    let namespaces = [
        Some(config.namespace.as_str()),
        detected_namespace,
        Some(config.fallback_namespace.as_str()),
    ];

    let mut candidates = Vec::new();
    for namespace in namespaces.into_iter().flatten().map(str::trim) {
        if namespace.is_empty() {
            continue;
        }
        push_unique(&mut candidates, &qualify(&format!("{service}.{namespace}"), suffix));
    }
    push_unique(&mut candidates, service);
    push_unique(&mut candidates, &qualify(service, suffix));
    candidates
}

/// Read the namespace the process runs in, if the runtime provides it.
///
/// A missing, unreadable, or blank file is an expected outcome and yields `None`.
#[must_use]
pub fn read_namespace_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(contents) => {
            let namespace = contents.trim();
            (!namespace.is_empty()).then(|| namespace.to_string())
        }
        Err(error) => {
            tracing::debug!(path = %path.display(), %error, "no namespace hint");
            None
        }
    }
}

fn qualify(name: &str, suffix: &str) -> String {
    if suffix.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{suffix}")
    }
}

fn push_unique(candidates: &mut Vec<String>, host: &str) {
    let host = host.trim();
    if host.is_empty() || candidates.iter().any(|c| c == host) {
        return;
    }
    candidates.push(host.to_string());
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn config(namespace: &str) -> DatabaseConfig {
        DatabaseConfig {
            service_name: "postgres".into(),
            namespace: namespace.into(),
            fallback_namespace: "default".into(),
            cluster_suffix: "svc.cluster.local".into(),
            ..Default::default()
        }
    }

    #[rstest]
    #[case("", None)]
    #[case("prod", None)]
    #[case("prod", Some("staging"))]
    #[case("", Some("prod"))]
    fn explicit_override_wins_over_every_hint(
        #[case] namespace: &str,
        #[case] detected: Option<&str>,
    ) {
        let config = DatabaseConfig {
            host: "db.example.com".into(),
            ..config(namespace)
        };
        assert_eq!(build_candidates(&config, detected), vec!["db.example.com"]);
    }

    #[test]
    fn full_priority_order() {
        assert_eq!(
            build_candidates(&config("prod"), Some("staging")),
            vec![
                "postgres.prod.svc.cluster.local",
                "postgres.staging.svc.cluster.local",
                "postgres.default.svc.cluster.local",
                "postgres",
                "postgres.svc.cluster.local",
            ]
        );
    }

    #[test]
    fn no_hints_still_yields_fallback_and_bare_service() {
        assert_eq!(
            build_candidates(&config(""), None),
            vec![
                "postgres.default.svc.cluster.local",
                "postgres",
                "postgres.svc.cluster.local",
            ]
        );
    }

    #[rstest]
    #[case("default", Some("default"))]
    #[case("prod", Some("prod"))]
    #[case("prod", Some("default"))]
    #[case("  prod ", Some("prod\n"))]
    fn repeated_namespaces_are_deduplicated(
        #[case] namespace: &str,
        #[case] detected: Option<&str>,
    ) {
        let candidates = build_candidates(&config(namespace), detected);
        let unique: HashSet<_> = candidates.iter().collect();
        assert_eq!(unique.len(), candidates.len(), "duplicates in {candidates:?}");
        assert_eq!(candidates[0], format!("postgres.{}.svc.cluster.local", namespace.trim()));
    }

    #[test]
    fn empty_suffix_does_not_produce_blank_or_dotted_names() {
        let config = DatabaseConfig {
            cluster_suffix: String::new(),
            ..config("prod")
        };
        assert_eq!(
            build_candidates(&config, None),
            vec!["postgres.prod", "postgres.default", "postgres"]
        );
    }

    #[test]
    fn namespace_file_is_read_and_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("namespace");
        std::fs::write(&path, "team-a\n").unwrap();
        assert_eq!(read_namespace_file(&path), Some("team-a".to_string()));

        let config = DatabaseConfig {
            namespace_file: path,
            ..config("")
        };
        assert_eq!(
            resolve_candidates(&config)[0],
            "postgres.team-a.svc.cluster.local"
        );
    }

    #[test]
    fn missing_or_blank_namespace_file_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_namespace_file(&dir.path().join("absent")), None);

        let blank = dir.path().join("blank");
        std::fs::write(&blank, "  \n").unwrap();
        assert_eq!(read_namespace_file(&blank), None);

        // A directory cannot be read as a file.
        assert_eq!(read_namespace_file(dir.path()), None);
    }
}

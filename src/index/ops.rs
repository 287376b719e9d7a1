//! Load-query-store operations over an index document

#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::index::error::IndexError;
use crate::index::types::{PackageInfo, RepoIndex, SUGGESTED_VERSION_CODE};

/// Trait for loading and storing a whole index document
#[cfg_attr(test, automock)]
pub trait IndexStorer {
    /// Load the full document
    fn load(&self) -> Result<RepoIndex, IndexError>;

    /// Replace the full document
    fn store(&self, index: &RepoIndex) -> Result<(), IndexError>;
}

/// What [`redact_version_codes`] stripped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactionSummary {
    /// Apps that carried `suggestedVersionCode`
    pub suggested_version_codes: usize,
    /// Package builds that carried a non-zero `versionCode`
    pub version_codes: usize,
}

/// Look up the latest build of a package without rewriting the document
pub fn latest_package<S: IndexStorer>(
    storer: &S,
    package_name: &str,
) -> Result<Option<PackageInfo>, IndexError> {
    let mut index = storer.load()?;

    let latest = index.find_latest_package(package_name).cloned();
    match &latest {
        Some(package) => debug!(
            "Latest build of {} is {} ({})",
            package_name, package.version_name, package.apk_name
        ),
        None => debug!("No builds found for {}", package_name),
    }

    Ok(latest)
}

/// Strip every version code from the document and store it back
pub fn redact_version_codes<S: IndexStorer>(storer: &S) -> Result<RedactionSummary, IndexError> {
    let mut index = storer.load()?;

    let summary = RedactionSummary {
        suggested_version_codes: index
            .apps
            .iter()
            .filter(|app| app.contains_key(SUGGESTED_VERSION_CODE))
            .count(),
        version_codes: index
            .packages
            .values()
            .flatten()
            .filter(|package| package.version_code() != 0)
            .count(),
    };

    index.remove_version_code();
    storer.store(&index)?;

    info!(
        "Redacted {} suggested version codes and {} version codes",
        summary.suggested_version_codes, summary.version_codes
    );
    Ok(summary)
}

/// Load the document and store it back unchanged
pub fn rewrite<S: IndexStorer>(storer: &S) -> Result<(), IndexError> {
    let index = storer.load()?;
    storer.store(&index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn sample_index() -> RepoIndex {
        serde_json::from_value(json!({
            "repo": {"name": "Example"},
            "requests": {},
            "apps": [
                {"packageName": "org.example.app", "suggestedVersionCode": "3"},
                {"packageName": "org.example.other"}
            ],
            "packages": {
                "org.example.app": [
                    {"packageName": "org.example.app", "versionName": "1.0.0", "versionCode": 1},
                    {"packageName": "org.example.app", "versionName": "1.2.0", "versionCode": 3},
                    {"packageName": "org.example.app", "versionName": "1.1.0"}
                ],
                "org.example.other": [
                    {"packageName": "org.example.other", "versionName": "0.1", "versionCode": 0}
                ]
            }
        }))
        .unwrap()
    }

    fn unavailable() -> IndexError {
        IndexError::DocumentUnavailable {
            path: PathBuf::from("/srv/repo/index-v1.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
    }

    #[test]
    fn latest_package_returns_highest_version_without_storing() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().times(1).returning(|| Ok(sample_index()));
        storer.expect_store().never();

        let latest = latest_package(&storer, "org.example.app").unwrap().unwrap();

        assert_eq!(latest.version_name, "1.2.0");
        assert_eq!(latest.version_code, Some(3));
    }

    #[test]
    fn latest_package_returns_none_for_unknown_package() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Ok(sample_index()));

        let latest = latest_package(&storer, "org.example.missing").unwrap();

        assert!(latest.is_none());
    }

    #[test]
    fn latest_package_propagates_load_error() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Err(unavailable()));

        let result = latest_package(&storer, "org.example.app");

        assert!(matches!(result, Err(IndexError::DocumentUnavailable { .. })));
    }

    #[test]
    fn redact_version_codes_counts_and_stores_redacted_index() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Ok(sample_index()));
        storer
            .expect_store()
            .times(1)
            .withf(|index: &RepoIndex| {
                index
                    .apps
                    .iter()
                    .all(|app| !app.contains_key(SUGGESTED_VERSION_CODE))
                    && index
                        .packages
                        .values()
                        .flatten()
                        .all(|package| package.version_code.is_none())
            })
            .returning(|_| Ok(()));

        let summary = redact_version_codes(&storer).unwrap();

        assert_eq!(
            summary,
            RedactionSummary {
                suggested_version_codes: 1,
                version_codes: 2,
            }
        );
    }

    #[test]
    fn redact_version_codes_does_not_store_when_load_fails() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Err(unavailable()));
        storer.expect_store().never();

        let result = redact_version_codes(&storer);

        assert!(matches!(result, Err(IndexError::DocumentUnavailable { .. })));
    }

    #[test]
    fn redact_version_codes_propagates_store_error() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Ok(sample_index()));
        storer.expect_store().returning(|_| {
            Err(IndexError::StorageFailed {
                path: PathBuf::from("/srv/repo/index-v1.json.tmp"),
                source: std::io::Error::other("disk full"),
            })
        });

        let result = redact_version_codes(&storer);

        assert!(matches!(result, Err(IndexError::StorageFailed { .. })));
    }

    #[test]
    fn rewrite_stores_loaded_index_unchanged() {
        let mut storer = MockIndexStorer::new();
        storer.expect_load().returning(|| Ok(sample_index()));
        storer
            .expect_store()
            .times(1)
            .withf(|index: &RepoIndex| *index == sample_index())
            .returning(|_| Ok(()));

        rewrite(&storer).unwrap();
    }
}

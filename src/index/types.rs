//! In-memory model of a repository index document

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::version::semver::compare_version_names;

/// App entry field stripped by [`RepoIndex::remove_version_code`]
pub const SUGGESTED_VERSION_CODE: &str = "suggestedVersionCode";

/// Full index document
///
/// `repo`, `requests` and the `apps` entries are kept as open maps so fields
/// this crate does not know about survive a load/store cycle.
///
/// `null` is accepted wherever a collection or scalar is expected and decodes
/// to the empty/zero value, as written by encoders that emit nil collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoIndex {
    #[serde(deserialize_with = "null_as_default")]
    pub repo: Map<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub requests: Map<String, Value>,
    #[serde(deserialize_with = "nullable_apps")]
    pub apps: Vec<Map<String, Value>>,
    /// Package name to every known build of that package
    #[serde(deserialize_with = "nullable_packages")]
    pub packages: IndexMap<String, Vec<PackageInfo>>,
}

/// One concrete package build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PackageInfo {
    /// Time the build was added, in milliseconds since UNIX epoch
    #[serde(deserialize_with = "null_as_default")]
    pub added: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub apk_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hash_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub min_sdk_version: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub nativecode: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub package_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sig: String,
    #[serde(deserialize_with = "null_as_default")]
    pub signer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub target_sdk_version: u32,
    /// `None` when absent from the document or redacted.
    /// Never emitted when `None` or zero.
    #[serde(skip_serializing_if = "is_absent_version_code")]
    pub version_code: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub version_name: String,
    /// Per-build fields not modelled above (permissions, features, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_apps<'de, D>(deserializer: D) -> Result<Vec<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let apps: Option<Vec<Option<Map<String, Value>>>> = Option::deserialize(deserializer)?;
    Ok(apps
        .unwrap_or_default()
        .into_iter()
        .map(Option::unwrap_or_default)
        .collect())
}

fn nullable_packages<'de, D>(
    deserializer: D,
) -> Result<IndexMap<String, Vec<PackageInfo>>, D::Error>
where
    D: Deserializer<'de>,
{
    let packages: Option<IndexMap<String, Option<Vec<PackageInfo>>>> =
        Option::deserialize(deserializer)?;
    Ok(packages
        .unwrap_or_default()
        .into_iter()
        .map(|(name, builds)| (name, builds.unwrap_or_default()))
        .collect())
}

fn is_absent_version_code(code: &Option<i64>) -> bool {
    code.is_none_or(|code| code == 0)
}

impl PackageInfo {
    /// Version code with the zero sentinel standing in for "absent"
    pub fn version_code(&self) -> i64 {
        self.version_code.unwrap_or(0)
    }

    /// `added` as a UTC timestamp, if it is within chrono's range
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.added)
    }
}

impl RepoIndex {
    /// All builds recorded for a package, in their current order
    pub fn package(&self, package_name: &str) -> Option<&[PackageInfo]> {
        self.packages.get(package_name).map(Vec::as_slice)
    }

    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Find the build with the highest version name for a package
    ///
    /// Returns `None` when the package is unknown or has no builds.
    /// The package's build list is left sorted by ascending version, so its
    /// previous order is lost. Builds with equal versions keep their relative
    /// order and the last of them wins.
    pub fn find_latest_package(&mut self, package_name: &str) -> Option<&PackageInfo> {
        let packages = self.packages.get_mut(package_name)?;
        sort_by_version(packages);
        packages.last()
    }

    /// Latest build of every package, in index order
    ///
    /// Sorts every build list the same way [`Self::find_latest_package`] does.
    pub fn latest_packages(&mut self) -> Vec<(&str, &PackageInfo)> {
        for packages in self.packages.values_mut() {
            sort_by_version(packages);
        }

        self.packages
            .iter()
            .filter_map(|(name, packages)| packages.last().map(|latest| (name.as_str(), latest)))
            .collect()
    }

    /// Strip `suggestedVersionCode` from every app and clear every build's version code
    pub fn remove_version_code(&mut self) {
        for app in &mut self.apps {
            app.shift_remove(SUGGESTED_VERSION_CODE);
        }

        for package in self.packages.values_mut().flatten() {
            package.version_code = None;
        }
    }
}

fn sort_by_version(packages: &mut [PackageInfo]) {
    packages.sort_by(|a, b| compare_version_names(&a.version_name, &b.version_name));
}

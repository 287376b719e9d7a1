use std::cmp::Ordering;

use semver::{BuildMetadata, Prerelease};

/// A leniently parsed version name
///
/// Unlike `semver::Version` the release part may have any number of numeric
/// segments, with leading zeros allowed (`1.2.3.4`, `2024.01.15`). Pre-release
/// and build identifiers follow semver rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionName {
    /// Numeric release segments, as written
    pub release: Vec<u64>,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl VersionName {
    /// Compare by precedence.
    ///
    /// Release segments are compared numerically, the shorter one padded with
    /// zeros (`1.2` == `1.2.0` == `1.2.0.0`). A pre-release sorts below its
    /// release. Build metadata is ignored.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        let segment = |release: &[u64], i: usize| release.get(i).copied().unwrap_or(0);

        for i in 0..len {
            match segment(&self.release, i).cmp(&segment(&other.release, i)) {
                Ordering::Equal => {}
                ordering => return ordering,
            }
        }

        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }
}

/// Parse a version name, normalizing common variations.
///
/// Strips surrounding whitespace and a single leading `v`/`V`. The
/// pre-release may follow the release with or without a `-`.
///
/// Examples:
/// - "1" -> release [1]
/// - "v1.2.3.4" -> release [1, 2, 3, 4]
/// - "2024.01.15" -> release [2024, 1, 15]
/// - "1.2-beta.1" -> release [1, 2], pre "beta.1"
/// - "1.0beta" -> release [1, 0], pre "beta"
pub fn parse_version_name(version: &str) -> Option<VersionName> {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);

    let (version, build) = match version.split_once('+') {
        Some((version, build)) if !build.is_empty() => (version, BuildMetadata::new(build).ok()?),
        Some(_) => return None,
        None => (version, BuildMetadata::EMPTY),
    };

    let core_end = version
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(version.len());
    let (core, pre) = version.split_at(core_end);

    let release = core
        .split('.')
        .map(|segment| segment.parse::<u64>().ok())
        .collect::<Option<Vec<_>>>()?;

    let pre = match pre.strip_prefix('-') {
        Some("") => return None,
        Some(pre) => pre,
        None => pre,
    };
    let pre = Prerelease::new(pre).ok()?;

    Some(VersionName {
        release,
        pre,
        build,
    })
}

/// Order two version names by precedence.
///
/// Never fails: a name that does not parse sorts below every name that does,
/// and two unparsable names compare equal so a stable sort keeps their order.
pub fn compare_version_names(a: &str, b: &str) -> Ordering {
    match (parse_version_name(a), parse_version_name(b)) {
        (Some(a), Some(b)) => a.cmp_precedence(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

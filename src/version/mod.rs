//! Release string parsing and semantic version ordering.
//!
//! Releases look like `package@version` (the package part is optional).
//! A version is parsed as `major[.minor[.patch[.revision]]][-pre][+build]`;
//! pre-release and build metadata follow semver identifier rules.
//!
//! Parse failures are reported through [`VersionError`], which callers in
//! the resolution path deliberately swallow.

use regex::Regex;
use semver::{BuildMetadata, Prerelease};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<major>\d+)(?:\.(?P<minor>\d+)(?:\.(?P<patch>\d+)(?:\.(?P<revision>\d+))?)?)?(?:-(?P<pre>[0-9A-Za-z.-]+))?(?:\+(?P<build>[0-9A-Za-z.-]+))?$",
    )
    .expect("version regex compiles")
});

/// Release names that are reserved and never valid.
const RESERVED_RELEASES: &[&str] = &[".", "..", "latest"];

/// Why a release or version string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("release is empty")]
    Empty,

    #[error("release contains invalid characters: {0:?}")]
    InvalidCharacters(String),

    #[error("release name is reserved: {0}")]
    Reserved(String),

    #[error("not a semantic version: {version}: {reason}")]
    NotSemver { version: String, reason: String },
}

/// A numerically comparable version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    pub pre: Prerelease,
    pub build: BuildMetadata,
}

impl ParsedVersion {
    /// Parse a bare version (no package prefix).
    ///
    /// # Errors
    ///
    /// Returns `VersionError::NotSemver` if the string does not match the
    /// version grammar or a component exceeds the signed 64-bit range.
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let not_semver = |reason: &str| VersionError::NotSemver {
            version: version.to_string(),
            reason: reason.to_string(),
        };

        let caps = VERSION_RE
            .captures(version)
            .ok_or_else(|| not_semver("does not match major[.minor[.patch[.revision]]]"))?;

        let component = |name: &str| -> Result<u64, VersionError> {
            caps.name(name).map_or(Ok(0), |m| {
                m.as_str()
                    .parse::<u64>()
                    .ok()
                    .filter(|value| i64::try_from(*value).is_ok())
                    .ok_or_else(|| not_semver("numeric component out of range"))
            })
        };

        let pre = match caps.name("pre") {
            Some(m) => Prerelease::new(m.as_str()).map_err(|e| not_semver(&e.to_string()))?,
            None => Prerelease::EMPTY,
        };
        let build = match caps.name("build") {
            Some(m) => BuildMetadata::new(m.as_str()).map_err(|e| not_semver(&e.to_string()))?,
            None => BuildMetadata::EMPTY,
        };

        Ok(Self {
            major: component("major")?,
            minor: component("minor")?,
            patch: component("patch")?,
            revision: component("revision")?,
            pre,
            build,
        })
    }
}

impl fmt::Display for ParsedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if self.revision != 0 {
            write!(f, ".{}", self.revision)?;
        }
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        if !self.build.is_empty() {
            write!(f, "+{}", self.build)?;
        }
        Ok(())
    }
}

/// A release string split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub package: Option<String>,
    pub version_raw: String,
    pub version_parsed: Option<ParsedVersion>,
}

/// Split a release string into package and version.
///
/// The version part is parsed when possible; a version that is not semver
/// still yields a valid `ReleaseInfo` with `version_parsed == None`.
///
/// # Errors
///
/// Returns an error if the release is empty, reserved, or contains
/// whitespace control characters or path separators.
pub fn parse_release(release: &str) -> Result<ReleaseInfo, VersionError> {
    if release.trim().is_empty() {
        return Err(VersionError::Empty);
    }
    if release
        .chars()
        .any(|c| matches!(c, '\n' | '\r' | '\t' | '\x0c' | '/' | '\\'))
    {
        return Err(VersionError::InvalidCharacters(release.to_string()));
    }
    if RESERVED_RELEASES.contains(&release) {
        return Err(VersionError::Reserved(release.to_string()));
    }

    let (package, version_raw) = match release.split_once('@') {
        Some((package, version)) if !package.is_empty() && !version.is_empty() => {
            (Some(package.to_string()), version.to_string())
        }
        _ => (None, release.to_string()),
    };
    let version_parsed = ParsedVersion::parse(&version_raw).ok();

    Ok(ReleaseInfo {
        package,
        version_raw,
        version_parsed,
    })
}

/// Parse the version part of a release into a comparable version.
///
/// # Errors
///
/// Returns an error if the release is invalid or its version is not semver.
pub fn parse_comparable(release: &str) -> Result<ParsedVersion, VersionError> {
    let info = parse_release(release)?;
    match info.version_parsed {
        Some(parsed) => Ok(parsed),
        None => ParsedVersion::parse(&info.version_raw),
    }
}

/// Order two versions by precedence.
///
/// Numeric components compare first, then the pre-release: a version
/// without a pre-release ranks above the same version with one. Build
/// metadata never affects ordering.
#[must_use]
pub fn compare_versions(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
    (a.major, a.minor, a.patch, a.revision)
        .cmp(&(b.major, b.minor, b.patch, b.revision))
        .then_with(|| match (a.pre.is_empty(), b.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.pre.cmp(&b.pre),
        })
}

/// Does this release follow the `package@semver` format?
#[must_use]
pub fn is_semver_version(release: &str) -> bool {
    parse_release(release)
        .map(|info| info.package.is_some() && info.version_parsed.is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> ParsedVersion {
        parse_comparable(s).unwrap()
    }

    #[test]
    fn test_parse_release_with_package() {
        let info = parse_release("backend@1.2.3-rc.1+42").unwrap();
        assert_eq!(info.package.as_deref(), Some("backend"));
        assert_eq!(info.version_raw, "1.2.3-rc.1+42");
        let parsed = info.version_parsed.unwrap();
        assert_eq!((parsed.major, parsed.minor, parsed.patch), (1, 2, 3));
        assert_eq!(parsed.pre.as_str(), "rc.1");
        assert_eq!(parsed.build.as_str(), "42");
    }

    #[test]
    fn test_parse_release_without_package() {
        let info = parse_release("2.0").unwrap();
        assert_eq!(info.package, None);
        assert_eq!(info.version_parsed.unwrap().minor, 0);
    }

    #[test]
    fn test_parse_release_free_form() {
        let info = parse_release("app@abc123def").unwrap();
        assert_eq!(info.package.as_deref(), Some("app"));
        assert!(info.version_parsed.is_none());
        assert!(parse_comparable("app@abc123def").is_err());
    }

    #[test]
    fn test_parse_release_rejects_invalid() {
        assert_eq!(parse_release("  "), Err(VersionError::Empty));
        assert!(matches!(
            parse_release("a/b"),
            Err(VersionError::InvalidCharacters(_))
        ));
        assert!(matches!(
            parse_release("latest"),
            Err(VersionError::Reserved(_))
        ));
    }

    #[test]
    fn test_revision_component() {
        let parsed = v("pkg@1.2.3.4");
        assert_eq!(parsed.revision, 4);
        assert_eq!(parsed.to_string(), "1.2.3.4");
    }

    #[test]
    fn test_component_out_of_range() {
        assert!(ParsedVersion::parse("99999999999999999999").is_err());
        assert!(ParsedVersion::parse("9223372036854775808").is_err());
        assert!(ParsedVersion::parse("9223372036854775807").is_ok());
    }

    #[test]
    fn test_compare_numeric() {
        assert_eq!(compare_versions(&v("a@1.10.0"), &v("a@1.9.0")), Ordering::Greater);
        assert_eq!(compare_versions(&v("a@1.0"), &v("a@1.0.0")), Ordering::Equal);
        assert_eq!(compare_versions(&v("a@1.0.0.1"), &v("a@1.0.0")), Ordering::Greater);
    }

    #[test]
    fn test_compare_prerelease() {
        assert_eq!(
            compare_versions(&v("a@1.0.0-alpha"), &v("a@1.0.0")),
            Ordering::Less
        );
        assert_eq!(
            compare_versions(&v("a@1.0.0-beta"), &v("a@1.0.0-alpha")),
            Ordering::Greater
        );
        assert_eq!(
            compare_versions(&v("a@1.0.0-rc.2"), &v("a@1.0.0-rc.10")),
            Ordering::Less
        );
    }

    #[test]
    fn test_build_metadata_ignored() {
        assert_eq!(
            compare_versions(&v("a@1.0.0+100"), &v("a@1.0.0+200")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_is_semver_version() {
        assert!(is_semver_version("backend@1.2.3"));
        assert!(is_semver_version("backend@2"));
        assert!(!is_semver_version("1.2.3"));
        assert!(!is_semver_version("backend@nightly"));
        assert!(!is_semver_version(""));
    }
}

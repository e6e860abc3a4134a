use crate::error::{GitFlowError, Result};
use std::fmt;

/// Numeric version identifier.
///
/// A release version has two components (`major.minor`), a tag version has three
/// (`major.minor.patch`). `development` marks a descriptor version that is still in
/// development (`2.1.0-SNAPSHOT`); it never takes part in ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VersionId {
    pub major: u64,
    pub minor: u64,
    pub patch: Option<u64>,
    pub development: bool,
}

impl VersionId {
    /// Create a two-component release version
    pub fn release(major: u64, minor: u64) -> Self {
        VersionId {
            major,
            minor,
            patch: None,
            development: false,
        }
    }

    /// Create a three-component tag version
    pub fn tag(major: u64, minor: u64, patch: u64) -> Self {
        VersionId {
            major,
            minor,
            patch: Some(patch),
            development: false,
        }
    }

    pub fn is_release(&self) -> bool {
        self.patch.is_none()
    }

    /// Same version with the development marker set
    pub fn as_development(self) -> Self {
        VersionId {
            development: true,
            ..self
        }
    }

    /// Same version without the development marker
    pub fn as_final(self) -> Self {
        VersionId {
            development: false,
            ..self
        }
    }

    /// The release line (`major.minor`) this version belongs to
    pub fn release_line(&self) -> Self {
        VersionId::release(self.major, self.minor)
    }

    /// Extend a release version into the first tag version of its line
    pub fn first_tag(&self) -> Self {
        VersionId::tag(self.major, self.minor, 0)
    }

    /// Components in order, two or three of them
    pub fn components(&self) -> Vec<u64> {
        let mut parts = vec![self.major, self.minor];
        if let Some(patch) = self.patch {
            parts.push(patch);
        }
        parts
    }

    /// Render the version as written into the build descriptor
    pub fn descriptor_string(&self, development_suffix: &str) -> String {
        if self.development {
            format!("{}{}", self, development_suffix)
        } else {
            self.to_string()
        }
    }

    /// Parse a version read from the build descriptor, e.g. `2.1.0-SNAPSHOT`.
    ///
    /// Any pre-release part counts as the development marker.
    pub fn parse_descriptor(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let parsed = semver::Version::parse(raw).map_err(|e| {
            GitFlowError::invalid_format(format!("descriptor version '{}': {}", raw, e))
        })?;

        Ok(VersionId {
            major: parsed.major,
            minor: parsed.minor,
            patch: Some(parsed.patch),
            development: !parsed.pre.is_empty(),
        })
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(VersionId::release(2, 1).to_string(), "2.1");
        assert_eq!(VersionId::tag(2, 1, 10).to_string(), "2.1.10");
        assert_eq!(VersionId::tag(2, 1, 0).as_development().to_string(), "2.1.0");
    }

    #[test]
    fn test_descriptor_string() {
        let v = VersionId::tag(2, 1, 0);
        assert_eq!(v.descriptor_string("-SNAPSHOT"), "2.1.0");
        assert_eq!(v.as_development().descriptor_string("-SNAPSHOT"), "2.1.0-SNAPSHOT");
        assert_eq!(v.as_development().descriptor_string(""), "2.1.0");
    }

    #[test]
    fn test_parse_descriptor() {
        let v = VersionId::parse_descriptor("2.1.0-SNAPSHOT\n").unwrap();
        assert_eq!(v, VersionId::tag(2, 1, 0).as_development());

        let v = VersionId::parse_descriptor("1.12.3").unwrap();
        assert_eq!(v, VersionId::tag(1, 12, 3));
        assert!(!v.development);
    }

    #[test]
    fn test_parse_descriptor_invalid() {
        let err = VersionId::parse_descriptor("${revision}").unwrap_err();
        assert!(matches!(err, GitFlowError::InvalidFormat(_)));
    }

    #[test]
    fn test_release_line_and_first_tag() {
        let v = VersionId::tag(3, 4, 7).as_development();
        assert_eq!(v.release_line(), VersionId::release(3, 4));
        assert_eq!(VersionId::release(3, 4).first_tag(), VersionId::tag(3, 4, 0));
        assert_eq!(v.components(), vec![3, 4, 7]);
        assert!(v.release_line().is_release());
    }
}

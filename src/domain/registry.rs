use tracing::debug;

use super::comparator::compare;
use super::pattern::FlowPattern;
use super::tag::TagRef;
use super::version::VersionId;
use crate::error::{GitFlowError, Result};

/// Finds the current tag of a release line, or of the whole repository, in an
/// unordered tag listing that may contain tags outside the naming scheme.
pub struct TagRegistry<'a> {
    pattern: &'a FlowPattern,
}

impl<'a> TagRegistry<'a> {
    pub fn new(pattern: &'a FlowPattern) -> Self {
        TagRegistry { pattern }
    }

    /// Latest tag by tagger time, optionally restricted to one release line.
    ///
    /// Tags whose name is not a `major.minor.patch` version are skipped. A tag that
    /// qualifies but has no tagger time is an error.
    /// Equal timestamps are broken by version so the higher tag wins.
    pub fn find_last_tag(
        &self,
        tags: &[TagRef],
        scope: Option<&VersionId>,
    ) -> Result<Option<(TagRef, VersionId)>> {
        let prefix = scope.map(|release| self.pattern.tag_ref_prefix(release));

        let mut candidates = Vec::new();
        for tag in tags {
            if let Some(prefix) = &prefix {
                if !tag.name.starts_with(prefix.as_str()) {
                    continue;
                }
            }

            let version = match self.pattern.tag_version(tag) {
                Ok(version) => version,
                Err(_) => {
                    debug!("Ignoring tag outside the version scheme: {}", tag.name);
                    continue;
                }
            };

            let created_at = tag.created_at.ok_or_else(|| {
                GitFlowError::invalid_format(format!(
                    "tag {} has no tagger timestamp; recreate it as an annotated tag",
                    tag.name
                ))
            })?;

            candidates.push((created_at, version, tag));
        }

        candidates.sort_by(|(ta, va, _), (tb, vb, _)| ta.cmp(tb).then_with(|| compare(va, vb)));

        Ok(candidates
            .pop()
            .map(|(_, version, tag)| (tag.clone(), version)))
    }

    /// Version of the latest tag, see [`TagRegistry::find_last_tag`]
    pub fn last_version(&self, tags: &[TagRef], scope: Option<&VersionId>) -> Result<Option<VersionId>> {
        Ok(self.find_last_tag(tags, scope)?.map(|(_, version)| version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BranchesConfig;

    fn pattern() -> FlowPattern {
        FlowPattern::new(&BranchesConfig::default()).unwrap()
    }

    fn tag(name: &str, at: i64) -> TagRef {
        TagRef::new(format!("refs/tags/{}", name), Some(at))
    }

    #[test]
    fn test_scoped_lookup_ignores_other_lines() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.5.0", 300), tag("1.4.3", 200), tag("1.4.1", 100)];

        let (found, version) = registry
            .find_last_tag(&tags, Some(&VersionId::release(1, 4)))
            .unwrap()
            .unwrap();
        assert_eq!(found.name, "refs/tags/1.4.3");
        assert_eq!(version, VersionId::tag(1, 4, 3));
    }

    #[test]
    fn test_order_is_by_timestamp_not_input_or_version() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.4.3", 100), tag("1.4.1", 200)];

        let last = registry
            .last_version(&tags, Some(&VersionId::release(1, 4)))
            .unwrap();
        assert_eq!(last, Some(VersionId::tag(1, 4, 1)));

        let reversed: Vec<TagRef> = tags.into_iter().rev().collect();
        let last = registry
            .last_version(&reversed, Some(&VersionId::release(1, 4)))
            .unwrap();
        assert_eq!(last, Some(VersionId::tag(1, 4, 1)));
    }

    #[test]
    fn test_global_lookup() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.4.1", 100), tag("1.5.0", 300), tag("1.4.3", 200)];
        assert_eq!(
            registry.last_version(&tags, None).unwrap(),
            Some(VersionId::tag(1, 5, 0))
        );
    }

    #[test]
    fn test_scope_prefix_does_not_match_longer_minor() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.40.0", 300), tag("1.4.2", 100)];
        assert_eq!(
            registry
                .last_version(&tags, Some(&VersionId::release(1, 4)))
                .unwrap(),
            Some(VersionId::tag(1, 4, 2))
        );
    }

    #[test]
    fn test_non_conforming_tags_discarded() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![
            tag("1.4.2", 100),
            tag("1.4.3-rc1", 500),
            tag("1.4.x", 600),
            TagRef::new("refs/tags/nightly", None),
        ];
        assert_eq!(
            registry
                .last_version(&tags, Some(&VersionId::release(1, 4)))
                .unwrap(),
            Some(VersionId::tag(1, 4, 2))
        );
        assert_eq!(
            registry.last_version(&tags, None).unwrap(),
            Some(VersionId::tag(1, 4, 2))
        );
    }

    #[test]
    fn test_empty_result() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        assert!(registry.find_last_tag(&[], None).unwrap().is_none());
        let tags = vec![tag("1.5.0", 1)];
        assert!(registry
            .find_last_tag(&tags, Some(&VersionId::release(1, 4)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_missing_timestamp_is_an_error() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.4.2", 100), TagRef::new("refs/tags/1.4.3", None)];
        let err = registry
            .find_last_tag(&tags, Some(&VersionId::release(1, 4)))
            .unwrap_err();
        assert!(matches!(err, GitFlowError::InvalidFormat(_)));
        assert!(err.to_string().contains("refs/tags/1.4.3"));
    }

    #[test]
    fn test_equal_timestamps_prefer_higher_version() {
        let p = pattern();
        let registry = TagRegistry::new(&p);
        let tags = vec![tag("1.4.9", 100), tag("1.4.10", 100), tag("1.4.2", 100)];
        assert_eq!(
            registry.last_version(&tags, None).unwrap(),
            Some(VersionId::tag(1, 4, 10))
        );
    }
}

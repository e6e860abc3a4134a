//! Ordering and increment rules over release and tag versions

use std::cmp::Ordering;

use super::version::VersionId;
use crate::error::{GitFlowError, Result};

/// Side of a merge that wins for a conflicting file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The branch being merged into
    Ours,
    /// The incoming ref
    Theirs,
    /// The common ancestor
    Base,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Ours => "ours",
            Stage::Theirs => "theirs",
            Stage::Base => "base",
        };
        write!(f, "{}", name)
    }
}

/// Compare two versions component-wise, left to right.
///
/// Only the components both versions have are compared, so a release version
/// equals every tag version of its line: `compare(1.4, 1.4.7) == Equal`.
pub fn compare(a: &VersionId, b: &VersionId) -> Ordering {
    a.components()
        .iter()
        .zip(b.components().iter())
        .map(|(x, y)| x.cmp(y))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// True when `release` is at or behind the release line of `current`
pub fn is_release_not_newer_than(release: &VersionId, current: &VersionId) -> bool {
    compare(release, current) != Ordering::Greater
}

/// True when `release` is strictly behind the release line of `current`
pub fn is_release_older_than(release: &VersionId, current: &VersionId) -> bool {
    compare(release, current) == Ordering::Less
}

/// Next patch of a tag version
pub fn increment(version: &VersionId) -> Result<VersionId> {
    match version.patch {
        Some(patch) => {
            let next = patch.checked_add(1).ok_or_else(|| {
                GitFlowError::invalid_format(format!("patch component of {} overflows", version))
            })?;
            Ok(VersionId {
                patch: Some(next),
                ..*version
            })
        }
        None => Err(GitFlowError::invalid_format(format!(
            "{} is not a tag version, cannot increment",
            version
        ))),
    }
}

/// Next tag version of a release line.
///
/// The first tag of a line is `<release>.0`; afterwards it is the increment of the
/// newest tag `lookup_last_tag` reports for the line.
pub fn increment_based_on_last_tag<F>(release: &VersionId, lookup_last_tag: F) -> Result<VersionId>
where
    F: FnOnce(&VersionId) -> Result<Option<VersionId>>,
{
    match lookup_last_tag(&release.release_line())? {
        Some(last) => increment(&last),
        None => Ok(release.first_tag()),
    }
}

/// Side the build descriptor takes when `release` is merged into a branch at `current`
pub fn define_stage_for_merge(current: &VersionId, release: &VersionId) -> Stage {
    if is_release_not_newer_than(release, current) {
        Stage::Ours
    } else {
        Stage::Theirs
    }
}

use regex::Regex;

use super::branch::{BranchKind, DevBranchName};
use super::tag::TagRef;
use super::version::VersionId;
use crate::config::BranchesConfig;
use crate::error::{GitFlowError, Result};

const RELEASE_PATTERN: &str = r"^[0-9]+\.[0-9]+$";
const TAG_PATTERN: &str = r"^[0-9]+\.[0-9]+\.[0-9]+$";

/// Version shapes and the branch/tag naming scheme.
///
/// All branch and tag names used by the workflow are produced here from the
/// configured prefixes and separator.
#[derive(Debug, Clone)]
pub struct FlowPattern {
    release_re: Regex,
    tag_re: Regex,
    names: BranchesConfig,
}

impl FlowPattern {
    pub fn new(names: &BranchesConfig) -> Result<Self> {
        Ok(FlowPattern {
            release_re: Regex::new(RELEASE_PATTERN)?,
            tag_re: Regex::new(TAG_PATTERN)?,
            names: names.clone(),
        })
    }

    pub fn origin(&self) -> &str {
        &self.names.origin
    }

    pub fn master(&self) -> &str {
        &self.names.master
    }

    pub fn develop(&self) -> &str {
        &self.names.develop
    }

    /// Parse a `major.minor` release version
    pub fn parse_release_version(&self, s: &str) -> Result<VersionId> {
        if !self.release_re.is_match(s) {
            return Err(GitFlowError::invalid_format(format!(
                "'{}' is not a release version (expected major.minor, e.g. 1.2)",
                s
            )));
        }
        let parts = parse_components(s)?;
        Ok(VersionId::release(parts[0], parts[1]))
    }

    /// Parse a `major.minor.patch` tag version
    pub fn parse_tag_version(&self, s: &str) -> Result<VersionId> {
        if !self.tag_re.is_match(s) {
            return Err(GitFlowError::invalid_format(format!(
                "'{}' is not a tag version (expected major.minor.patch, e.g. 1.2.3)",
                s
            )));
        }
        let parts = parse_components(s)?;
        Ok(VersionId::tag(parts[0], parts[1], parts[2]))
    }

    pub fn build_release_branch_name(&self, version: &VersionId) -> String {
        format!(
            "{}{}{}",
            self.names.release_prefix,
            self.names.separator,
            version.release_line()
        )
    }

    pub fn build_hotfix_branch_name(&self, label: &str) -> String {
        format!("{}{}{}", self.names.hotfix_prefix, self.names.separator, label)
    }

    pub fn build_dev_branch_name(&self, kind: BranchKind, version: &VersionId, label: &str) -> String {
        format!("{}{}", self.dev_branch_prefix(kind, version), label)
    }

    /// Prefix shared by every development branch of a kind on one release line, separator included
    pub fn dev_branch_prefix(&self, kind: BranchKind, version: &VersionId) -> String {
        format!(
            "{}{}{}{}",
            self.prefix_for(kind),
            self.names.separator,
            version.release_line(),
            self.names.separator
        )
    }

    /// Tag name for a version, without namespace (`2.1.0`)
    pub fn tag_name(&self, version: &VersionId) -> String {
        version.to_string()
    }

    /// Full tag ref for a version (`refs/tags/2.1.0`)
    pub fn tag_ref_name(&self, version: &VersionId) -> String {
        format!("{}{}", self.tag_namespace_prefix(), version)
    }

    /// Ref prefix selecting every tag of one release line (`refs/tags/2.1.`)
    pub fn tag_ref_prefix(&self, release: &VersionId) -> String {
        format!(
            "{}{}.{}.",
            self.tag_namespace_prefix(),
            release.major,
            release.minor
        )
    }

    /// Strip the tag namespace from a ref name
    pub fn strip_tag_namespace<'a>(&self, ref_name: &'a str) -> &'a str {
        let namespace = self.tag_namespace_prefix();
        ref_name.strip_prefix(namespace.as_str()).unwrap_or(ref_name)
    }

    /// Ref paths always use `/`, whatever the branch separator is
    fn tag_namespace_prefix(&self) -> String {
        format!("{}/", self.names.tag_namespace.trim_end_matches('/'))
    }

    /// Version a tag ref stands for
    pub fn tag_version(&self, tag: &TagRef) -> Result<VersionId> {
        self.parse_tag_version(self.strip_tag_namespace(&tag.name))
    }

    /// Classify a short branch name by its prefix
    pub fn branch_kind(&self, name: &str) -> Option<BranchKind> {
        if name == self.names.master {
            return Some(BranchKind::Master);
        }
        if name == self.names.develop {
            return Some(BranchKind::Develop);
        }

        let (prefix, _) = name.split_once(self.names.separator.as_str())?;
        [
            BranchKind::Release,
            BranchKind::Hotfix,
            BranchKind::Feature,
            BranchKind::Bugfix,
        ]
        .into_iter()
        .find(|kind| self.prefix_for(*kind) == prefix)
    }

    /// Validate a `<feature|bugfix>/<release>/<label>` name
    pub fn validate_full_branch_name(&self, full_name: &str) -> Result<DevBranchName> {
        let invalid = || {
            GitFlowError::invalid_format(format!(
                "'{}' must look like {}{sep}<major.minor>{sep}<name> or {}{sep}<major.minor>{sep}<name>",
                full_name,
                self.names.feature_prefix,
                self.names.bugfix_prefix,
                sep = self.names.separator
            ))
        };

        let kind = self
            .branch_kind(full_name)
            .filter(BranchKind::is_development)
            .ok_or_else(invalid)?;

        let mut parts = full_name.splitn(3, self.names.separator.as_str()).skip(1);
        let (release, label) = match (parts.next(), parts.next()) {
            (Some(r), Some(l)) if !l.is_empty() => (r, l),
            _ => return Err(invalid()),
        };

        let release = self.parse_release_version(release)?;

        Ok(DevBranchName {
            kind,
            release,
            label: label.to_string(),
            full_name: full_name.to_string(),
        })
    }

    fn prefix_for(&self, kind: BranchKind) -> &str {
        match kind {
            BranchKind::Master => &self.names.master,
            BranchKind::Develop => &self.names.develop,
            BranchKind::Release => &self.names.release_prefix,
            BranchKind::Hotfix => &self.names.hotfix_prefix,
            BranchKind::Feature => &self.names.feature_prefix,
            BranchKind::Bugfix => &self.names.bugfix_prefix,
        }
    }
}

fn parse_components(s: &str) -> Result<Vec<u64>> {
    s.split('.')
        .map(|part| {
            part.parse::<u64>().map_err(|_| {
                GitFlowError::invalid_format(format!("version component '{}' in '{}'", part, s))
            })
        })
        .collect()
}

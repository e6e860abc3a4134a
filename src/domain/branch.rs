use std::fmt;

use super::version::VersionId;

/// Role of a branch in the workflow, derived from its name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Master,
    Develop,
    Release,
    Hotfix,
    Feature,
    Bugfix,
}

impl BranchKind {
    /// Development branches live under a release line with a free-form label
    pub fn is_development(&self) -> bool {
        matches!(self, BranchKind::Feature | BranchKind::Bugfix)
    }
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BranchKind::Master => "master",
            BranchKind::Develop => "develop",
            BranchKind::Release => "release",
            BranchKind::Hotfix => "hotfix",
            BranchKind::Feature => "feature",
            BranchKind::Bugfix => "bugfix",
        };
        write!(f, "{}", name)
    }
}

/// A branch as listed by the repository.
///
/// `name` is the short name (`release/2.1`); `remote` is set for remote-tracking
/// branches and holds the remote they belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BranchRef {
    pub name: String,
    pub remote: Option<String>,
}

impl BranchRef {
    pub fn local(name: impl Into<String>) -> Self {
        BranchRef {
            name: name.into(),
            remote: None,
        }
    }

    pub fn remote(remote: impl Into<String>, name: impl Into<String>) -> Self {
        BranchRef {
            name: name.into(),
            remote: Some(remote.into()),
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Name usable as a merge or checkout source (`origin/release/2.1` for remote branches)
    pub fn qualified_name(&self) -> String {
        match &self.remote {
            Some(remote) => format!("{}/{}", remote, self.name),
            None => self.name.clone(),
        }
    }
}

/// A validated `<feature|bugfix>/<release>/<label>` branch name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevBranchName {
    pub kind: BranchKind,
    pub release: VersionId,
    pub label: String,
    pub full_name: String,
}

impl fmt::Display for DevBranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_name)
    }
}

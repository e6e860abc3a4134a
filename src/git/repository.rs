use crate::command::CommandExecutor;
use crate::domain::{BranchRef, Stage, TagRef};
use crate::error::{GitFlowError, Result};
use crate::git::{CommitId, MergeOutcome, MergeStrategy, Repository};
use git2::{BranchType, ErrorCode, ObjectType, Repository as Git2Repo};
use std::path::Path;
use tracing::{debug, info, warn};

/// Credentials for authenticated remotes
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Working copy driven through `git2` and the `git` binary.
///
/// Reads, tags, pushes and remote deletions go through `git2`; operations that
/// rewrite the working tree (checkout, merge, commit, revert, reset) run the `git`
/// executable so its merge machinery and hooks apply.
pub struct Git2Repository {
    repo: Git2Repo,
    git: CommandExecutor,
    remote: String,
    credentials: Credentials,
    tag_namespace: String,
}

impl Git2Repository {
    /// Open or discover a git repository with a working tree
    pub fn open<P: AsRef<Path>>(path: P, remote: &str, credentials: Credentials) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| GitFlowError::precondition("repository has no working tree"))?
            .to_path_buf();

        Ok(Git2Repository {
            repo,
            git: CommandExecutor::git(workdir),
            remote: remote.to_string(),
            credentials,
            tag_namespace: "refs/tags".to_string(),
        })
    }

    /// Keep tags under `namespace` instead of `refs/tags`
    pub fn with_tag_namespace(mut self, namespace: &str) -> Self {
        self.tag_namespace = namespace.trim_end_matches('/').to_string();
        self
    }

    fn tag_ref(&self, name: &str) -> String {
        format!("{}/{}", self.tag_namespace, name)
    }

    fn has_local_branch(&self, name: &str) -> bool {
        self.repo.find_branch(name, BranchType::Local).is_ok()
    }

    fn has_remote_branch(&self, name: &str) -> bool {
        self.repo
            .find_branch(&format!("{}/{}", self.remote, name), BranchType::Remote)
            .is_ok()
    }

    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let credentials = &self.credentials;
        let mut callbacks = git2::RemoteCallbacks::new();

        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                if let (Some(username), Some(password)) =
                    (&credentials.username, &credentials.password)
                {
                    return git2::Cred::userpass_plaintext(username, password);
                }
            }

            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let user = username_from_url.unwrap_or("git");
                if let Some(home) = dirs::home_dir() {
                    for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                        let path = home.join(".ssh").join(key);
                        if path.exists() {
                            if let Ok(cred) = git2::Cred::ssh_key(user, None, &path, None) {
                                return Ok(cred);
                            }
                        }
                    }
                }

                if let Ok(cred) = git2::Cred::ssh_key_from_agent(user) {
                    return Ok(cred);
                }
            }

            git2::Cred::default()
        });

        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => {
                warn!("Remote rejected {}: {}", refname, status);
                Err(git2::Error::from_str(&format!(
                    "push of {} rejected: {}",
                    refname, status
                )))
            }
            None => Ok(()),
        });

        callbacks
    }

    fn push_refspecs(&self, refspecs: &[String]) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(&self.remote)
            .map_err(|_| GitFlowError::not_found(format!("remote '{}'", self.remote)))?;

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(self.remote_callbacks());

        debug!("Pushing {} to {}", refspecs.join(" "), self.remote);
        remote
            .push(refspecs, Some(&mut push_options))
            .map_err(|e| GitFlowError::ExternalFailure {
                command: format!("push {} {}", self.remote, refspecs.join(" ")),
                code: None,
                stderr: e.message().to_string(),
            })
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        self.git.execute(args)
    }
}

impl Repository for Git2Repository {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(GitFlowError::precondition("HEAD is detached"));
        }
        head.shorthand()
            .map(|name| name.to_string())
            .ok_or_else(|| GitFlowError::invalid_format("branch name is not valid UTF-8"))
    }

    fn checkout(&self, branch: &str, force: bool) -> Result<()> {
        let mut args = vec!["checkout"];
        if force {
            args.push("-f");
        }

        let tracking = format!("{}/{}", self.remote, branch);
        if self.has_local_branch(branch) {
            args.push(branch);
        } else if self.has_remote_branch(branch) {
            args.extend(["-b", branch, "--track", tracking.as_str()]);
        } else {
            return Err(GitFlowError::not_found(format!("branch {}", branch)));
        }

        self.run_git(&args)?;
        Ok(())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        if self.has_local_branch(name) {
            return Err(GitFlowError::already_exists(format!("branch {}", name)));
        }
        self.run_git(&["checkout", "-b", name])?;
        Ok(())
    }

    fn delete_branch(&self, name: &str, remote: bool) -> Result<()> {
        if !remote {
            self.run_git(&["branch", "-D", name])?;
            return Ok(());
        }

        self.push_refspecs(&[format!(":refs/heads/{}", name)])?;
        let tracking = format!("refs/remotes/{}/{}", self.remote, name);
        if let Ok(mut reference) = self.repo.find_reference(&tracking) {
            reference.delete()?;
        }
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<BranchRef>> {
        let mut result = Vec::new();
        for entry in self.repo.branches(None)? {
            let (branch, kind) = entry?;
            let name = match branch.name()? {
                Some(name) => name.to_string(),
                None => continue,
            };

            match kind {
                BranchType::Local => result.push(BranchRef::local(name)),
                BranchType::Remote => {
                    if let Some((remote, short)) = name.split_once('/') {
                        if short != "HEAD" {
                            result.push(BranchRef::remote(remote, short));
                        }
                    }
                }
            }
        }
        Ok(result)
    }

    fn list_tags(&self) -> Result<Vec<TagRef>> {
        let mut tags = Vec::new();
        for reference in self.repo.references_glob(&self.tag_ref("*"))? {
            let reference = reference?;
            let name = match reference.name() {
                Some(name) => name.to_string(),
                None => continue,
            };
            // Lightweight tags have no tag object and therefore no tagger time
            let created_at = reference
                .peel_to_tag()
                .ok()
                .and_then(|tag| tag.tagger().map(|sig| sig.when().seconds()));
            tags.push(TagRef::new(name, created_at));
        }
        Ok(tags)
    }

    fn tag(&self, name: &str, message: &str) -> Result<TagRef> {
        let ref_name = self.tag_ref(name);
        if self.repo.find_reference(&ref_name).is_ok() {
            return Err(GitFlowError::already_exists(format!("tag {}", name)));
        }

        let target = self.repo.head()?.peel(ObjectType::Commit)?;
        let signature = self.repo.signature()?;
        let oid = self
            .repo
            .tag_annotation_create(name, &target, &signature, message)?;

        match self.repo.reference(&ref_name, oid, false, message) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::Exists => {
                return Err(GitFlowError::already_exists(format!("tag {}", name)));
            }
            Err(e) => return Err(e.into()),
        }

        info!("Created tag {}", ref_name);
        Ok(TagRef::new(ref_name, Some(signature.when().seconds())))
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        let ref_name = self.tag_ref(name);
        self.repo.find_reference(&ref_name)?.delete()?;
        self.push_refspecs(&[format!(":{}", ref_name)])
    }

    fn merge(&self, source: &str, strategy: MergeStrategy) -> Result<MergeOutcome> {
        let mut args = vec!["merge", "--no-edit"];
        args.extend_from_slice(strategy.args());
        args.push(source);

        let output = self.git.output(&args)?;
        if output.success() {
            return Ok(MergeOutcome::clean());
        }

        // Unmerged index entries are the conflict signal; git's messages may be translated
        let unmerged = self.run_git(&["diff", "--name-only", "--diff-filter=U"])?;
        let conflicts: Vec<String> = unmerged
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if conflicts.is_empty() {
            return Err(GitFlowError::ExternalFailure {
                command: format!("git {}", args.join(" ")),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(MergeOutcome { conflicts })
    }

    fn checkout_file(&self, branch: &str, path: &str, stage: Stage) -> Result<()> {
        debug!("Taking {} side of {} on {}", stage, path, branch);
        match stage {
            Stage::Ours => self.run_git(&["checkout", "--ours", "--", path])?,
            Stage::Theirs => self.run_git(&["checkout", "--theirs", "--", path])?,
            Stage::Base => self.run_git(&["checkout-index", "-f", "--stage=1", "--", path])?,
        };
        self.run_git(&["add", "--", path])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<CommitId> {
        self.run_git(&["add", "-A"])?;
        self.run_git(&["commit", "--allow-empty", "-m", message])?;
        let id = self.run_git(&["rev-parse", "HEAD"])?;
        Ok(CommitId(id.trim().to_string()))
    }

    fn revert(&self, commit: &CommitId) -> Result<()> {
        self.run_git(&["revert", "--no-edit", commit.0.as_str()])?;
        Ok(())
    }

    fn reset_hard(&self, target: &str) -> Result<()> {
        self.run_git(&["reset", "--hard", target])?;
        Ok(())
    }

    fn push(&self) -> Result<()> {
        let branch = self.current_branch()?;
        self.push_refspecs(&[format!("refs/heads/{0}:refs/heads/{0}", branch)])
    }

    fn push_branch(&self, name: &str) -> Result<()> {
        self.push_refspecs(&[format!("refs/heads/{0}:refs/heads/{0}", name)])?;

        let mut branch = self.repo.find_branch(name, BranchType::Local)?;
        let upstream = format!("{}/{}", self.remote, name);
        if let Err(e) = branch.set_upstream(Some(upstream.as_str())) {
            warn!("Could not set upstream of {} to {}: {}", name, upstream, e);
        }
        Ok(())
    }

    fn push_all(&self) -> Result<()> {
        let mut refspecs = Vec::new();
        for glob in ["refs/heads/*".to_string(), self.tag_ref("*")] {
            for reference in self.repo.references_glob(&glob)? {
                if let Some(name) = reference?.name() {
                    refspecs.push(format!("{0}:{0}", name));
                }
            }
        }
        self.push_refspecs(&refspecs)
    }

    fn describe(&self) -> Result<String> {
        let mut options = git2::DescribeOptions::new();
        options.describe_tags().show_commit_oid_as_fallback(true);
        let describe = self.repo.describe(&options)?;

        let mut format = git2::DescribeFormatOptions::new();
        format.abbreviated_size(7);
        Ok(describe.format(Some(&format))?)
    }
}

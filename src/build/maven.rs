use crate::build::BuildTool;
use crate::command::CommandExecutor;
use crate::config::BuildConfig;
use crate::error::{GitFlowError, Result};
use std::path::Path;
use tracing::info;

/// Maven adapter
pub struct Maven {
    exec: CommandExecutor,
    offline: bool,
    profiles: Vec<String>,
}

impl Maven {
    pub fn new(workdir: impl AsRef<Path>, config: &BuildConfig) -> Self {
        Maven {
            exec: CommandExecutor::new(config.executable.clone(), workdir),
            offline: config.offline,
            profiles: config.profiles.clone(),
        }
    }

    fn set_version_args(version: &str) -> Vec<String> {
        vec![
            "versions:set".to_string(),
            "-DgenerateBackupPoms=false".to_string(),
            format!("-DnewVersion={}", version),
            "-DskipTests".to_string(),
        ]
    }

    fn compile_args(&self, skip_tests: bool) -> Vec<String> {
        let mut args = vec!["clean".to_string(), "install".to_string()];
        if skip_tests {
            args.push("-DskipTests".to_string());
        }
        if self.offline {
            args.push("-o".to_string());
        }
        if !self.profiles.is_empty() {
            args.push("-P".to_string());
            args.push(self.profiles.join(","));
        }
        args
    }
}

impl BuildTool for Maven {
    fn set_version(&self, version: &str) -> Result<()> {
        info!("Setting project version to {}", version);
        self.exec.execute(&Self::set_version_args(version))?;
        Ok(())
    }

    fn compile(&self, skip_tests: bool) -> Result<()> {
        info!("Building project{}", if skip_tests { " (tests skipped)" } else { "" });
        self.exec.execute(&self.compile_args(skip_tests))?;
        Ok(())
    }

    fn current_version(&self) -> Result<String> {
        let out = self.exec.execute(&[
            "help:evaluate",
            "-Dexpression=project.version",
            "-q",
            "-DforceStdout",
        ])?;
        let version = out.trim();
        if version.is_empty() {
            return Err(GitFlowError::not_found("project version in build descriptor"));
        }
        Ok(version.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_version_args() {
        assert_eq!(
            Maven::set_version_args("2.1.0-SNAPSHOT"),
            vec![
                "versions:set",
                "-DgenerateBackupPoms=false",
                "-DnewVersion=2.1.0-SNAPSHOT",
                "-DskipTests"
            ]
        );
    }

    #[test]
    fn test_compile_args_default() {
        let maven = Maven::new(".", &BuildConfig::default());
        assert_eq!(maven.compile_args(false), vec!["clean", "install"]);
    }

    #[test]
    fn test_compile_args_all_options() {
        let config = BuildConfig {
            offline: true,
            profiles: vec!["ci".to_string(), "release".to_string()],
            ..BuildConfig::default()
        };
        let maven = Maven::new(".", &config);
        assert_eq!(
            maven.compile_args(true),
            vec!["clean", "install", "-DskipTests", "-o", "-P", "ci,release"]
        );
    }

    #[test]
    fn test_missing_executable_fails() {
        let config = BuildConfig {
            executable: "definitely-not-maven-xyz".to_string(),
            ..BuildConfig::default()
        };
        let maven = Maven::new(".", &config);
        assert!(matches!(
            maven.compile(true),
            Err(GitFlowError::ExternalFailure { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Represents the complete configuration for git-flow.
///
/// Contains the branch naming scheme, version suffixes, build tool settings and behavior options.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub versions: VersionsConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub behavior: BehaviorConfig,
}

fn default_origin() -> String {
    "origin".to_string()
}

fn default_master() -> String {
    "master".to_string()
}

fn default_develop() -> String {
    "develop".to_string()
}

fn default_release_prefix() -> String {
    "release".to_string()
}

fn default_hotfix_prefix() -> String {
    "hotfix".to_string()
}

fn default_feature_prefix() -> String {
    "feature".to_string()
}

fn default_bugfix_prefix() -> String {
    "bugfix".to_string()
}

fn default_tag_namespace() -> String {
    "refs/tags".to_string()
}

fn default_separator() -> String {
    "/".to_string()
}

/// Branch and tag naming scheme.
///
/// Every branch name the workflow builds or recognises is derived from these values.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BranchesConfig {
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_master")]
    pub master: String,

    #[serde(default = "default_develop")]
    pub develop: String,

    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,

    #[serde(default = "default_hotfix_prefix")]
    pub hotfix_prefix: String,

    #[serde(default = "default_feature_prefix")]
    pub feature_prefix: String,

    #[serde(default = "default_bugfix_prefix")]
    pub bugfix_prefix: String,

    #[serde(default = "default_tag_namespace")]
    pub tag_namespace: String,

    #[serde(default = "default_separator")]
    pub separator: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            origin: default_origin(),
            master: default_master(),
            develop: default_develop(),
            release_prefix: default_release_prefix(),
            hotfix_prefix: default_hotfix_prefix(),
            feature_prefix: default_feature_prefix(),
            bugfix_prefix: default_bugfix_prefix(),
            tag_namespace: default_tag_namespace(),
            separator: default_separator(),
        }
    }
}

fn default_development_suffix() -> String {
    "-SNAPSHOT".to_string()
}

/// Version formatting.
///
/// `development_suffix` marks descriptor versions that are still in development.
/// Tags never carry it. An empty suffix disables the marker.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VersionsConfig {
    #[serde(default = "default_development_suffix")]
    pub development_suffix: String,
}

impl Default for VersionsConfig {
    fn default() -> Self {
        VersionsConfig {
            development_suffix: default_development_suffix(),
        }
    }
}

fn default_executable() -> String {
    "mvn".to_string()
}

fn default_descriptor() -> String {
    "pom.xml".to_string()
}

/// Build tool settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BuildConfig {
    #[serde(default = "default_executable")]
    pub executable: String,

    /// Build descriptor file; conflicts on it are resolved automatically during merges
    #[serde(default = "default_descriptor")]
    pub descriptor: String,

    #[serde(default)]
    pub skip_tests: bool,

    #[serde(default)]
    pub offline: bool,

    #[serde(default)]
    pub profiles: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            executable: default_executable(),
            descriptor: default_descriptor(),
            skip_tests: false,
            offline: false,
            profiles: Vec::new(),
        }
    }
}

/// Configuration for behavior customization.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct BehaviorConfig {
    /// Delete the development branch once finish-development merged it
    #[serde(default)]
    pub delete_branch_after: bool,
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitflow.toml` in current directory
/// 3. `.gitflow.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Arguments
/// * `config_path` - Optional path to custom configuration file
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If file exists but cannot be read or parsed
pub fn load_config(config_path: Option<&str>) -> Result<Config> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./gitflow.toml").exists() {
        fs::read_to_string("./gitflow.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join(".gitflow.toml");
        if config_path.exists() {
            fs::read_to_string(config_path)?
        } else {
            return Ok(Config::default());
        }
    } else {
        return Ok(Config::default());
    };

    let config: Config = toml::from_str(&config_str)?;
    Ok(config)
}

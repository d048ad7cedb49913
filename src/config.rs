//! Configuration Management
//!
//! Handles persistent defaults for ec2-subnets.

use crate::aws::credentials::{get_profile_region, DEFAULT_PROFILE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_REGION: &str = "us-east-1";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Last used AWS profile
    #[serde(default)]
    pub profile: Option<String>,
    /// Last used region
    #[serde(default)]
    pub region: Option<String>,
    /// EC2 endpoint override (LocalStack, VPC endpoints)
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ec2-subnets").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring unreadable config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Get effective profile (CLI > config > AWS_PROFILE > default)
    pub fn effective_profile(&self, cli: Option<&str>) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.profile.clone())
            .or_else(|| std::env::var("AWS_PROFILE").ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string())
    }

    /// Get effective region (CLI > config > AWS_REGION > profile region > us-east-1)
    pub fn effective_region(&self, cli: Option<&str>, profile: &str) -> String {
        cli.map(|s| s.to_string())
            .or_else(|| self.region.clone())
            .or_else(env_region)
            .or_else(|| get_profile_region(profile))
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }

    /// Get effective endpoint override (CLI > config)
    pub fn effective_endpoint(&self, cli: Option<&str>) -> Option<String> {
        cli.map(|s| s.to_string()).or_else(|| self.endpoint_url.clone())
    }
}

fn env_region() -> Option<String> {
    ["AWS_REGION", "AWS_DEFAULT_REGION"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|r| !r.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ec2-subnets-test-{}-{}", std::process::id(), name))
            .join("config.json")
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let config = Config {
            profile: Some("prod".into()),
            region: Some("eu-west-1".into()),
            endpoint_url: None,
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), config);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_missing_or_corrupt_file_gives_default() {
        let path = temp_path("corrupt");
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_cli_wins() {
        let config = Config {
            profile: Some("saved".into()),
            region: Some("eu-west-1".into()),
            endpoint_url: Some("http://localhost:4566".into()),
        };
        assert_eq!(config.effective_profile(Some("cli")), "cli");
        assert_eq!(config.effective_profile(None), "saved");
        assert_eq!(config.effective_region(Some("ap-south-1"), "saved"), "ap-south-1");
        assert_eq!(config.effective_region(None, "saved"), "eu-west-1");
        assert_eq!(
            config.effective_endpoint(None).as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(
            config.effective_endpoint(Some("http://other")).as_deref(),
            Some("http://other")
        );
    }
}

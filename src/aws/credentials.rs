//! AWS Credentials
//!
//! Resolves static credentials for a profile from:
//! - Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN)
//! - The shared credentials file (~/.aws/credentials or AWS_SHARED_CREDENTIALS_FILE)

use anyhow::anyhow;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Profile used when none is configured
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum CredentialsError {
    #[error("no credentials found for profile '{profile}'")]
    NotFound { profile: String },

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// AWS credentials
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &mask_credential(&self.access_key_id))
            .field("secret_access_key", &"****")
            .field("session_token", &self.session_token.as_ref().map(|_| "****"))
            .finish()
    }
}

/// Mask credential values for logging
pub fn mask_credential(value: &str) -> String {
    if value.len() <= 8 {
        "*".repeat(value.len())
    } else {
        format!("{}...{}", &value[..4], &value[value.len() - 4..])
    }
}

/// Load credentials for a given profile
///
/// Environment variables only apply to the default profile; a named profile
/// always reads the shared credentials file.
pub fn load_credentials(profile: &str) -> Result<Credentials, CredentialsError> {
    if profile == DEFAULT_PROFILE {
        if let Some(creds) = load_from_env() {
            debug!("Loaded credentials from environment variables");
            return Ok(creds);
        }
    }

    match load_from_credentials_file(profile)? {
        Some(creds) => {
            debug!("Loaded credentials for profile '{}' from credentials file", profile);
            Ok(creds)
        }
        None => Err(CredentialsError::NotFound {
            profile: profile.to_string(),
        }),
    }
}

fn load_from_env() -> Option<Credentials> {
    let access_key_id = env::var("AWS_ACCESS_KEY_ID").ok()?;
    let secret_access_key = env::var("AWS_SECRET_ACCESS_KEY").ok()?;
    let session_token = env::var("AWS_SESSION_TOKEN").ok();

    Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token,
    })
}

/// Get AWS config directory
pub fn aws_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(path) = env::var("AWS_CONFIG_FILE") {
        if let Some(parent) = PathBuf::from(path).parent() {
            return Ok(parent.to_path_buf());
        }
    }

    dirs::home_dir()
        .map(|h| h.join(".aws"))
        .ok_or_else(|| anyhow!("Could not find home directory"))
}

/// Parse an INI-style file into sections
///
/// `[profile name]` headers (config file style) are normalized to `name`.
pub fn parse_ini_file(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current_section = String::new();

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            current_section = line[1..line.len() - 1].trim().to_string();
            if let Some(name) = current_section.strip_prefix("profile ") {
                current_section = name.trim().to_string();
            }
            sections.entry(current_section.clone()).or_default();
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if !current_section.is_empty() {
                sections
                    .entry(current_section.clone())
                    .or_default()
                    .insert(key.trim().to_string(), value.trim().to_string());
            }
        }
    }

    sections
}

/// Load credentials from ~/.aws/credentials or AWS_SHARED_CREDENTIALS_FILE
///
/// `Ok(None)` means the file or the profile does not exist; a profile that
/// exists but is missing a key is an error.
fn load_from_credentials_file(profile: &str) -> Result<Option<Credentials>, CredentialsError> {
    let creds_path = if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        PathBuf::from(path)
    } else {
        aws_config_dir()?.join("credentials")
    };

    let Ok(content) = fs::read_to_string(&creds_path) else {
        debug!("No credentials file at {:?}", creds_path);
        return Ok(None);
    };

    credentials_from_ini(&content, profile)
}

fn credentials_from_ini(content: &str, profile: &str) -> Result<Option<Credentials>, CredentialsError> {
    let sections = parse_ini_file(content);
    let Some(section) = sections.get(profile) else {
        return Ok(None);
    };

    let access_key_id = section
        .get("aws_access_key_id")
        .ok_or_else(|| anyhow!("aws_access_key_id not found for profile '{}'", profile))?
        .clone();

    let secret_access_key = section
        .get("aws_secret_access_key")
        .ok_or_else(|| anyhow!("aws_secret_access_key not found for profile '{}'", profile))?
        .clone();

    Ok(Some(Credentials {
        access_key_id,
        secret_access_key,
        session_token: section.get("aws_session_token").cloned(),
    }))
}

/// Region configured for a profile in ~/.aws/config
pub fn get_profile_region(profile: &str) -> Option<String> {
    let config_path = aws_config_dir().ok()?.join("config");
    let content = fs::read_to_string(config_path).ok()?;
    parse_ini_file(&content).get(profile)?.get("region").cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CREDENTIALS: &str = r#"
# shared credentials
[default]
aws_access_key_id = AKIADEFAULT0000000
aws_secret_access_key = secret-default

[audit]
aws_access_key_id=AKIAAUDIT000000000
aws_secret_access_key=secret-audit
aws_session_token=token-audit

[broken]
aws_access_key_id = AKIABROKEN00000000
"#;

    #[test]
    fn test_parse_ini_sections() {
        let sections = parse_ini_file("[profile dev]\nregion = eu-west-1\n\n[default]\nregion=us-east-2\n");
        assert_eq!(sections["dev"]["region"], "eu-west-1");
        assert_eq!(sections["default"]["region"], "us-east-2");
    }

    #[test]
    fn test_credentials_for_named_profile() {
        let creds = credentials_from_ini(CREDENTIALS, "audit").unwrap().unwrap();
        assert_eq!(creds.access_key_id, "AKIAAUDIT000000000");
        assert_eq!(creds.secret_access_key, "secret-audit");
        assert_eq!(creds.session_token.as_deref(), Some("token-audit"));
    }

    #[test]
    fn test_missing_profile_is_none() {
        assert!(credentials_from_ini(CREDENTIALS, "nope").unwrap().is_none());
    }

    #[test]
    fn test_incomplete_profile_is_error() {
        assert!(credentials_from_ini(CREDENTIALS, "broken").is_err());
    }

    #[test]
    fn test_mask_credential() {
        assert_eq!(mask_credential("short"), "*****");
        assert_eq!(mask_credential("AKIAABCDEFGHIJKL"), "AKIA...IJKL");
    }

    #[test]
    fn test_debug_does_not_leak_secret() {
        let creds = Credentials {
            access_key_id: "AKIAABCDEFGHIJKL".to_string(),
            secret_access_key: "very-secret".to_string(),
            session_token: None,
        };
        let shown = format!("{:?}", creds);
        assert!(!shown.contains("very-secret"));
        assert!(shown.contains("AKIA...IJKL"));
    }
}

//! EC2 Client
//!
//! Main client for the EC2 API, combining credentials and the signed HTTP
//! client for a single region.

use super::credentials::{load_credentials, Credentials};
use super::error::ApiError;
use super::http::{AwsHttpClient, EC2};
use anyhow::{Context, Result};

/// Region-scoped EC2 client
#[derive(Clone)]
pub struct Ec2Client {
    pub http: AwsHttpClient,
    pub region: String,
}

impl Ec2Client {
    /// Create a client from already-resolved credentials
    pub fn new(credentials: Credentials, region: &str, endpoint_url: Option<String>) -> Result<Self> {
        let http = AwsHttpClient::new(credentials, region, endpoint_url)?;

        Ok(Self {
            http,
            region: region.to_string(),
        })
    }

    /// Create a client for a profile, loading its credentials
    pub async fn connect(profile: &str, region: &str, endpoint_url: Option<String>) -> Result<Self> {
        let profile_owned = profile.to_string();

        // File reads stay off the async workers
        let credentials = tokio::task::spawn_blocking(move || load_credentials(&profile_owned))
            .await
            .context("Credential loading task failed")??;

        Self::new(credentials, region, endpoint_url)
    }

    /// Invoke an EC2 action and return the XML body
    pub async fn call(&self, action: &str, params: &[(String, String)]) -> Result<String> {
        self.http
            .query_request(&EC2, action, params)
            .await
            .with_context(|| format!("{} failed in {}", action, self.region))
    }
}

/// Format AWS errors into short user-facing messages
pub fn format_aws_error(err: &anyhow::Error) -> String {
    if let Some(api) = err.chain().find_map(|c| c.downcast_ref::<ApiError>()) {
        return match api.code.as_str() {
            "AuthFailure" | "InvalidClientTokenId" | "SignatureDoesNotMatch" => {
                "Invalid credentials - run 'aws configure'".to_string()
            }
            "ExpiredToken" | "RequestExpired" => {
                "Credentials expired - refresh or reconfigure".to_string()
            }
            "UnauthorizedOperation" | "AccessDenied" => {
                "Access denied - check IAM permissions for ec2:DescribeSubnets".to_string()
            }
            "RequestLimitExceeded" | "Throttling" => {
                "Rate limit exceeded. Please try again later.".to_string()
            }
            _ => format!("{}: {}", api.code, api.message),
        };
    }

    let err_str = format!("{:#}", err);
    if err_str.contains("no credentials found") {
        return "No credentials - set AWS_ACCESS_KEY_ID or run 'aws configure'".to_string();
    }
    if err_str.contains("Failed to send request") {
        return "Connection failed - check network and region".to_string();
    }

    if err_str.chars().count() > 120 {
        format!("{}...", err_str.chars().take(120).collect::<String>())
    } else {
        err_str
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(code: &str) -> anyhow::Error {
        ApiError {
            status: 400,
            code: code.to_string(),
            message: "boom".to_string(),
            request_id: None,
        }
        .into()
    }

    #[test]
    fn test_format_known_codes() {
        assert!(format_aws_error(&api_error("AuthFailure")).contains("Invalid credentials"));
        assert!(format_aws_error(&api_error("UnauthorizedOperation")).contains("Access denied"));
        assert!(format_aws_error(&api_error("RequestLimitExceeded")).contains("Rate limit"));
    }

    #[test]
    fn test_format_unknown_code_keeps_message() {
        assert_eq!(
            format_aws_error(&api_error("InvalidParameterValue")),
            "InvalidParameterValue: boom"
        );
    }

    #[test]
    fn test_format_truncates_long_errors() {
        let err = anyhow::anyhow!("{}", "e".repeat(300));
        let shown = format_aws_error(&err);
        assert!(shown.ends_with("..."));
        assert!(shown.len() < 200);
    }
}

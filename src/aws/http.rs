//! HTTP utilities for AWS Query-protocol calls
//!
//! Requests are signed with SigV4 and sent with a plain reqwest client.

use super::credentials::{mask_credential, Credentials};
use super::error::ApiError;
use anyhow::{anyhow, Context, Result};
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4::SigningParams;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::Client;
use std::time::SystemTime;
use tracing::{debug, trace, warn};

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 500;

/// Query-protocol service definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceDefinition {
    /// Service signing name
    pub signing_name: &'static str,
    /// Endpoint host prefix
    pub endpoint_prefix: &'static str,
    /// API version sent with every action
    pub api_version: &'static str,
}

pub const EC2: ServiceDefinition = ServiceDefinition {
    signing_name: "ec2",
    endpoint_prefix: "ec2",
    api_version: "2016-11-15",
};

/// Truncate a body for logging
fn truncate_for_log(body: &str) -> String {
    if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    }
}

/// Signed HTTP client for one region
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
    credentials: Credentials,
    region: String,
    endpoint_url: Option<String>,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    ///
    /// `endpoint_url` replaces the regional endpoint for every service
    /// (LocalStack, test servers).
    pub fn new(credentials: Credentials, region: &str, endpoint_url: Option<String>) -> Result<Self> {
        debug!(
            "Creating AWS HTTP client for region: {}, access_key: {}, endpoint_url: {:?}",
            region,
            mask_credential(&credentials.access_key_id),
            endpoint_url
        );

        let client = Client::builder()
            .user_agent(concat!("ec2-subnets/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials,
            region: region.to_string(),
            endpoint_url,
        })
    }

    /// Endpoint for a service in this client's region
    pub fn endpoint(&self, service: &ServiceDefinition) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            return endpoint.trim_end_matches('/').to_string();
        }

        let domain = if self.region.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        };
        format!("https://{}.{}.{}", service.endpoint_prefix, self.region, domain)
    }

    /// Build the request URL for a Query-protocol action
    pub fn query_url(
        &self,
        service: &ServiceDefinition,
        action: &str,
        params: &[(String, String)],
    ) -> String {
        let mut query = vec![
            format!("Action={}", urlencoding::encode(action)),
            format!("Version={}", urlencoding::encode(service.api_version)),
        ];
        query.extend(
            params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v))),
        );

        format!("{}/?{}", self.endpoint(service), query.join("&"))
    }

    /// Make a Query protocol request and return the raw XML body
    ///
    /// Non-2xx answers are returned as [`ApiError`].
    pub async fn query_request(
        &self,
        service: &ServiceDefinition,
        action: &str,
        params: &[(String, String)],
    ) -> Result<String> {
        debug!("Query request: service={}, action={}", service.signing_name, action);
        trace!("Query params: {:?}", params);

        let url = self.query_url(service, action, params);
        self.signed_post(service, &url).await
    }

    async fn signed_post(&self, service: &ServiceDefinition, url: &str) -> Result<String> {
        let parsed_url = url::Url::parse(url).with_context(|| format!("Invalid endpoint URL: {}", url))?;
        let host = match (parsed_url.host_str(), parsed_url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(anyhow!("Invalid URL: {}", url)),
        };
        let path_and_query = match parsed_url.query() {
            Some(query) => format!("{}?{}", parsed_url.path(), query),
            None => parsed_url.path().to_string(),
        };

        let headers = [("host".to_string(), host)];

        let creds = aws_credential_types::Credentials::new(
            &self.credentials.access_key_id,
            &self.credentials.secret_access_key,
            self.credentials.session_token.clone(),
            None,
            "ec2-subnets",
        );
        let identity: Identity = creds.into();

        let signing_params = SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(service.signing_name)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()?
            .into();

        let signable_request = SignableRequest::new(
            "POST",
            &path_and_query,
            headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            SignableBody::Bytes(&[]),
        )?;

        let (signing_instructions, _signature) =
            sign(signable_request, &signing_params)?.into_parts();

        let mut request = self.client.post(url);
        for (name, value) in signing_instructions.headers() {
            request = request.header(name.to_string(), value.to_string());
        }

        debug!("POST {}", url);
        let response = request.send().await.context("Failed to send request")?;
        let status = response.status();
        let text = response
            .text()
            .await
            .context("Failed to read response body")?;

        debug!("Response status: {}", status);
        trace!("Response body: {}", truncate_for_log(&text));

        if !status.is_success() {
            warn!("AWS request failed: status={}, body={}", status, truncate_for_log(&text));
            return Err(ApiError::from_response(status.as_u16(), &text).into());
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_credentials() -> Credentials {
        Credentials {
            access_key_id: "TESTACCESSKEY".to_string(),
            secret_access_key: "TESTSECRETKEY".to_string(),
            session_token: None,
        }
    }

    #[test]
    fn test_regional_endpoint() {
        let client = AwsHttpClient::new(dummy_credentials(), "eu-west-1", None).unwrap();
        assert_eq!(client.endpoint(&EC2), "https://ec2.eu-west-1.amazonaws.com");
    }

    #[test]
    fn test_china_endpoint_domain() {
        let client = AwsHttpClient::new(dummy_credentials(), "cn-north-1", None).unwrap();
        assert_eq!(client.endpoint(&EC2), "https://ec2.cn-north-1.amazonaws.com.cn");
    }

    #[test]
    fn test_endpoint_override() {
        let client = AwsHttpClient::new(
            dummy_credentials(),
            "us-east-1",
            Some("http://localhost:4566/".to_string()),
        )
        .unwrap();
        assert_eq!(client.endpoint(&EC2), "http://localhost:4566");
    }

    #[test]
    fn test_query_url_encodes_params() {
        let client = AwsHttpClient::new(dummy_credentials(), "us-east-1", None).unwrap();
        let url = client.query_url(
            &EC2,
            "DescribeSubnets",
            &[("Filter.1.Name".to_string(), "cidr-block".to_string()),
              ("Filter.1.Value.1".to_string(), "10.0.0.0/24".to_string())],
        );
        assert_eq!(
            url,
            "https://ec2.us-east-1.amazonaws.com/?Action=DescribeSubnets&Version=2016-11-15\
             &Filter.1.Name=cidr-block&Filter.1.Value.1=10.0.0.0%2F24"
        );
    }

    #[test]
    fn test_truncate_for_log() {
        let long = "x".repeat(MAX_LOG_BODY_LENGTH + 10);
        let shown = truncate_for_log(&long);
        assert!(shown.contains("truncated"));
        assert_eq!(truncate_for_log("short"), "short");
    }
}

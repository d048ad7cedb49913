//! `DescribeSubnets` request shape and the client seam

use super::model::DescribeSubnetsOutput;
use crate::aws::client::Ec2Client;
use crate::resource::filter::UpstreamFilter;
use anyhow::Result;
use std::future::Future;

/// Parameters of one `DescribeSubnets` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeSubnetsInput {
    pub filters: Vec<UpstreamFilter>,
    pub subnet_ids: Vec<String>,
    pub max_results: Option<i64>,
    pub next_token: Option<String>,
}

impl DescribeSubnetsInput {
    /// Query protocol parameters (`Filter.N.Name`, `Filter.N.Value.M`, ...)
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        for (i, filter) in self.filters.iter().enumerate() {
            let n = i + 1;
            params.push((format!("Filter.{}.Name", n), filter.name.clone()));
            for (j, value) in filter.values.iter().enumerate() {
                params.push((format!("Filter.{}.Value.{}", n, j + 1), value.clone()));
            }
        }

        for (i, id) in self.subnet_ids.iter().enumerate() {
            params.push((format!("SubnetId.{}", i + 1), id.clone()));
        }

        if let Some(max) = self.max_results {
            params.push(("MaxResults".to_string(), max.to_string()));
        }
        if let Some(token) = &self.next_token {
            params.push(("NextToken".to_string(), token.clone()));
        }

        params
    }
}

/// Upstream calls the subnet table needs
pub trait SubnetApi {
    fn describe_subnets(
        &self,
        input: &DescribeSubnetsInput,
    ) -> impl Future<Output = Result<DescribeSubnetsOutput>> + Send;
}

impl SubnetApi for Ec2Client {
    async fn describe_subnets(&self, input: &DescribeSubnetsInput) -> Result<DescribeSubnetsOutput> {
        let params = input.to_query_params();
        tracing::debug!("DescribeSubnets in {} with {} params", self.region, params.len());
        let body = self.call("DescribeSubnets", &params).await?;
        DescribeSubnetsOutput::from_xml(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_empty_input_has_no_params() {
        assert!(DescribeSubnetsInput::default().to_query_params().is_empty());
    }

    #[test]
    fn test_filters_are_numbered_from_one() {
        let input = DescribeSubnetsInput {
            filters: vec![
                UpstreamFilter::new("vpc-id", vec!["vpc-1".into(), "vpc-2".into()]),
                UpstreamFilter::new("default-for-az", vec!["true".into()]),
            ],
            ..Default::default()
        };
        let params = input.to_query_params();
        assert_eq!(params.len(), 5);
        assert_eq!(param(&params, "Filter.1.Name"), Some("vpc-id"));
        assert_eq!(param(&params, "Filter.1.Value.1"), Some("vpc-1"));
        assert_eq!(param(&params, "Filter.1.Value.2"), Some("vpc-2"));
        assert_eq!(param(&params, "Filter.2.Name"), Some("default-for-az"));
        assert_eq!(param(&params, "Filter.2.Value.1"), Some("true"));
    }

    #[test]
    fn test_ids_and_paging() {
        let input = DescribeSubnetsInput {
            subnet_ids: vec!["subnet-1".into()],
            max_results: Some(5),
            next_token: Some("tok".into()),
            ..Default::default()
        };
        let params = input.to_query_params();
        assert_eq!(param(&params, "SubnetId.1"), Some("subnet-1"));
        assert_eq!(param(&params, "MaxResults"), Some("5"));
        assert_eq!(param(&params, "NextToken"), Some("tok"));
    }
}

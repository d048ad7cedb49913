//! Subnet hydrate calls
//!
//! List pages through `DescribeSubnets` until the row budget is spent or the
//! upstream runs out of pages. Get looks up a single subnet id.

use super::api::{DescribeSubnetsInput, SubnetApi};
use super::model::Subnet;
use crate::resource::filter::translate;
use crate::resource::query::QueryData;
use anyhow::Result;

/// Stream every subnet matching the pushed-down filters
pub async fn list_vpc_subnets<A: SubnetApi>(api: &A, d: &mut QueryData<'_, Subnet>) -> Result<()> {
    let table = d.table();
    let mut input = DescribeSubnetsInput {
        filters: translate(&d.quals, &table.filter_map),
        max_results: Some(table.page_size_for_limit(d.context.limit)),
        ..Default::default()
    };

    let mut pages = 0;
    loop {
        if d.rows_remaining() == 0 {
            tracing::debug!("Row budget spent before page {}, stopping", pages + 1);
            return Ok(());
        }

        let output = api.describe_subnets(&input).await?;
        pages += 1;
        tracing::debug!(
            "Page {} returned {} subnets (more: {})",
            pages,
            output.subnets.len(),
            output.next_token.is_some()
        );

        for subnet in output.subnets {
            d.stream_list_item(subnet);
            if d.rows_remaining() == 0 {
                return Ok(());
            }
        }

        match output.next_token {
            Some(token) => input.next_token = Some(token),
            None => return Ok(()),
        }
    }
}

/// Look up one subnet by id
///
/// `Ok(None)` when the upstream returns nothing. Errors are returned as is.
pub async fn get_vpc_subnet<A: SubnetApi>(api: &A, subnet_id: &str) -> Result<Option<Subnet>> {
    let input = DescribeSubnetsInput {
        subnet_ids: vec![subnet_id.to_string()],
        ..Default::default()
    };

    let output = api.describe_subnets(&input).await?;
    Ok(output.subnets.into_iter().next())
}

/// Run a query: get path on `subnet_id = '...'`, list path otherwise
pub async fn execute<A: SubnetApi>(api: &A, d: &mut QueryData<'_, Subnet>) -> Result<()> {
    let table = d.table();

    let Some(subnet_id) = d.key_column_qual_string(&table.get.key_column).map(str::to_string) else {
        return list_vpc_subnets(api, d).await;
    };

    match get_vpc_subnet(api, &subnet_id).await {
        Ok(Some(subnet)) => d.stream_get_item(subnet),
        Ok(None) => tracing::debug!("Subnet {} not found", subnet_id),
        Err(e) if table.get.should_ignore_error(&e) => {
            tracing::debug!("Ignoring get error for {}: {:#}", subnet_id, e);
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

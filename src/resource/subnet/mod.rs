//! `aws_vpc_subnet`: EC2 subnets of one region
//!
//! - [`model`] - Subnet records decoded from `DescribeSubnets`
//! - [`api`] - Request encoding and the [`SubnetApi`] seam
//! - [`fetcher`] - List/get hydrate calls and query routing
//! - [`transform`] - Column transforms and table binding

pub mod api;
pub mod fetcher;
pub mod model;
pub mod transform;

pub use api::{DescribeSubnetsInput, SubnetApi};
pub use fetcher::{execute, get_vpc_subnet, list_vpc_subnets};
pub use model::{DescribeSubnetsOutput, Subnet, Tag};
pub use transform::{arn_to_akas, subnet_table, subnet_title, tags_to_map, TABLE_NAME};

//! AWS API interaction module
//!
//! Just enough of the EC2 Query protocol to drive the subnet table.
//!
//! # Module Structure
//!
//! - [`credentials`] - Static credentials from the environment or shared file
//! - [`http`] - SigV4-signed Query-protocol requests
//! - [`client`] - Region-scoped EC2 client
//! - [`error`] - Typed EC2 API errors
//! - [`xml`] - XML response decoding

pub mod client;
pub mod credentials;
pub mod error;
pub mod http;
pub mod xml;

pub use client::{format_aws_error, Ec2Client};
pub use error::ApiError;

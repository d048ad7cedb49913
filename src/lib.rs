//! EC2 VPC subnets as a queryable resource table

pub mod aws;
pub mod config;
pub mod resource;

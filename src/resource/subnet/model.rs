//! EC2 subnet records
//!
//! Decoded from `DescribeSubnets` XML (via [`xml_to_json`]) and serialized
//! with the SDK's PascalCase names for JSON columns.

use crate::aws::xml::{set_items, xml_to_json};
use anyhow::{anyhow, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ipv6CidrBlockState {
    pub state: Option<String>,
    pub status_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SubnetIpv6CidrBlockAssociation {
    pub association_id: Option<String>,
    pub ipv6_cidr_block: Option<String>,
    pub ipv6_cidr_block_state: Option<Ipv6CidrBlockState>,
}

/// One EC2 subnet as returned by `DescribeSubnets`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub subnet_id: Option<String>,
    pub subnet_arn: Option<String>,
    pub vpc_id: Option<String>,
    pub cidr_block: Option<String>,
    pub state: Option<String>,
    pub owner_id: Option<String>,
    pub assign_ipv6_address_on_creation: Option<bool>,
    pub available_ip_address_count: Option<i64>,
    pub availability_zone: Option<String>,
    pub availability_zone_id: Option<String>,
    pub customer_owned_ipv4_pool: Option<String>,
    pub default_for_az: Option<bool>,
    pub map_customer_owned_ip_on_launch: Option<bool>,
    pub map_public_ip_on_launch: Option<bool>,
    pub outpost_arn: Option<String>,
    pub ipv6_cidr_block_association_set: Vec<SubnetIpv6CidrBlockAssociation>,
    pub tags: Vec<Tag>,
}

fn text(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn boolean(value: &Value, field: &str) -> Option<bool> {
    match value.get(field).and_then(|v| v.as_str()) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

fn integer(value: &Value, field: &str) -> Option<i64> {
    value.get(field).and_then(|v| v.as_str()).and_then(|s| s.parse().ok())
}

impl From<&Value> for Tag {
    fn from(value: &Value) -> Self {
        Self {
            key: text(value, "key").unwrap_or_default(),
            // `<value/>` decodes to null: an empty tag value
            value: text(value, "value").unwrap_or_default(),
        }
    }
}

impl From<&Value> for SubnetIpv6CidrBlockAssociation {
    fn from(value: &Value) -> Self {
        Self {
            association_id: text(value, "associationId"),
            ipv6_cidr_block: text(value, "ipv6CidrBlock"),
            ipv6_cidr_block_state: value.get("ipv6CidrBlockState").map(|s| Ipv6CidrBlockState {
                state: text(s, "state"),
                status_message: text(s, "statusMessage"),
            }),
        }
    }
}

impl From<&Value> for Subnet {
    fn from(value: &Value) -> Self {
        Self {
            subnet_id: text(value, "subnetId"),
            subnet_arn: text(value, "subnetArn"),
            vpc_id: text(value, "vpcId"),
            cidr_block: text(value, "cidrBlock"),
            state: text(value, "state"),
            owner_id: text(value, "ownerId"),
            assign_ipv6_address_on_creation: boolean(value, "assignIpv6AddressOnCreation"),
            available_ip_address_count: integer(value, "availableIpAddressCount"),
            availability_zone: text(value, "availabilityZone"),
            availability_zone_id: text(value, "availabilityZoneId"),
            customer_owned_ipv4_pool: text(value, "customerOwnedIpv4Pool"),
            default_for_az: boolean(value, "defaultForAz"),
            map_customer_owned_ip_on_launch: boolean(value, "mapCustomerOwnedIpOnLaunch"),
            map_public_ip_on_launch: boolean(value, "mapPublicIpOnLaunch"),
            outpost_arn: text(value, "outpostArn"),
            ipv6_cidr_block_association_set: set_items(value.get("ipv6CidrBlockAssociationSet"))
                .into_iter()
                .map(SubnetIpv6CidrBlockAssociation::from)
                .collect(),
            tags: set_items(value.get("tagSet")).into_iter().map(Tag::from).collect(),
        }
    }
}

/// One page of `DescribeSubnets`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescribeSubnetsOutput {
    pub subnets: Vec<Subnet>,
    /// Absent on the last page
    pub next_token: Option<String>,
}

impl DescribeSubnetsOutput {
    pub fn from_xml(body: &str) -> Result<Self> {
        let json = xml_to_json(body)?;
        let response = json
            .get("DescribeSubnetsResponse")
            .ok_or_else(|| anyhow!("Missing DescribeSubnetsResponse element"))?;

        let subnets = set_items(response.get("subnetSet"))
            .into_iter()
            .map(Subnet::from)
            .collect();
        let next_token = text(response, "nextToken").filter(|t| !t.is_empty());

        Ok(Self { subnets, next_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SUBNETS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeSubnetsResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
    <requestId>7a62c49f-347e-4fc4-9331-6e8eEXAMPLE</requestId>
    <subnetSet>
        <item>
            <subnetId>subnet-0a1b2c3d</subnetId>
            <subnetArn>arn:aws:ec2:us-east-1:111122223333:subnet/subnet-0a1b2c3d</subnetArn>
            <state>available</state>
            <vpcId>vpc-1a2b3c4d</vpcId>
            <ownerId>111122223333</ownerId>
            <cidrBlock>10.0.1.0/24</cidrBlock>
            <ipv6CidrBlockAssociationSet>
                <item>
                    <ipv6CidrBlock>2600:1f14:abc:100::/64</ipv6CidrBlock>
                    <associationId>subnet-cidr-assoc-01</associationId>
                    <ipv6CidrBlockState>
                        <state>associated</state>
                    </ipv6CidrBlockState>
                </item>
            </ipv6CidrBlockAssociationSet>
            <availableIpAddressCount>251</availableIpAddressCount>
            <availabilityZone>us-east-1a</availabilityZone>
            <availabilityZoneId>use1-az4</availabilityZoneId>
            <defaultForAz>false</defaultForAz>
            <mapPublicIpOnLaunch>true</mapPublicIpOnLaunch>
            <assignIpv6AddressOnCreation>false</assignIpv6AddressOnCreation>
            <mapCustomerOwnedIpOnLaunch>false</mapCustomerOwnedIpOnLaunch>
            <tagSet>
                <item>
                    <key>Name</key>
                    <value>public-a</value>
                </item>
                <item>
                    <key>Empty</key>
                    <value/>
                </item>
            </tagSet>
        </item>
        <item>
            <subnetId>subnet-9f8e7d6c</subnetId>
            <state>pending</state>
            <vpcId>vpc-1a2b3c4d</vpcId>
            <cidrBlock>10.0.2.0/24</cidrBlock>
            <availableIpAddressCount>4091</availableIpAddressCount>
            <defaultForAz>true</defaultForAz>
        </item>
    </subnetSet>
    <nextToken>page-2</nextToken>
</DescribeSubnetsResponse>"#;

    #[test]
    fn test_decode_page_with_two_subnets() {
        let page = DescribeSubnetsOutput::from_xml(TWO_SUBNETS).unwrap();
        assert_eq!(page.subnets.len(), 2);
        assert_eq!(page.next_token.as_deref(), Some("page-2"));

        let first = &page.subnets[0];
        assert_eq!(first.subnet_id.as_deref(), Some("subnet-0a1b2c3d"));
        assert_eq!(first.available_ip_address_count, Some(251));
        assert_eq!(first.map_public_ip_on_launch, Some(true));
        assert_eq!(first.default_for_az, Some(false));
        assert_eq!(first.customer_owned_ipv4_pool, None);
        assert_eq!(first.ipv6_cidr_block_association_set.len(), 1);
        assert_eq!(
            first.ipv6_cidr_block_association_set[0]
                .ipv6_cidr_block_state
                .as_ref()
                .and_then(|s| s.state.as_deref()),
            Some("associated")
        );
        assert_eq!(
            first.tags,
            vec![
                Tag { key: "Name".into(), value: "public-a".into() },
                Tag { key: "Empty".into(), value: String::new() },
            ]
        );

        let second = &page.subnets[1];
        assert_eq!(second.state.as_deref(), Some("pending"));
        assert!(second.tags.is_empty());
        assert!(second.subnet_arn.is_none());
    }

    #[test]
    fn test_decode_single_subnet_last_page() {
        let body = r#"<DescribeSubnetsResponse><requestId>r</requestId><subnetSet><item><subnetId>subnet-1</subnetId><tagSet><item><key>Env</key><value>prod</value></item></tagSet></item></subnetSet></DescribeSubnetsResponse>"#;
        let page = DescribeSubnetsOutput::from_xml(body).unwrap();
        assert_eq!(page.subnets.len(), 1);
        assert_eq!(page.subnets[0].tags.len(), 1);
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_tag_text_is_not_trimmed() {
        let body = "<DescribeSubnetsResponse><subnetSet>\n  <item><subnetId>subnet-1</subnetId><tagSet><item><key> Owner </key><value>team a  </value></item></tagSet></item>\n</subnetSet></DescribeSubnetsResponse>";
        let page = DescribeSubnetsOutput::from_xml(body).unwrap();
        assert_eq!(
            page.subnets[0].tags,
            vec![Tag { key: " Owner ".into(), value: "team a  ".into() }]
        );
    }

    #[test]
    fn test_decode_formatted_empty_set() {
        let body = "<DescribeSubnetsResponse>\n  <subnetSet>\n  </subnetSet>\n</DescribeSubnetsResponse>";
        assert!(DescribeSubnetsOutput::from_xml(body).unwrap().subnets.is_empty());
    }

    #[test]
    fn test_decode_empty_set() {
        let body = "<DescribeSubnetsResponse><requestId>r</requestId><subnetSet/></DescribeSubnetsResponse>";
        let page = DescribeSubnetsOutput::from_xml(body).unwrap();
        assert!(page.subnets.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_decode_rejects_other_documents() {
        assert!(DescribeSubnetsOutput::from_xml("<DescribeVpcsResponse/>").is_err());
    }

    #[test]
    fn test_serializes_with_sdk_names() {
        let tag = Tag { key: "Name".into(), value: "a".into() };
        assert_eq!(
            serde_json::to_value(&tag).unwrap(),
            serde_json::json!({"Key": "Name", "Value": "a"})
        );
    }
}

//! Column transforms for `aws_vpc_subnet`

use super::model::{Subnet, Tag};
use crate::resource::query::{Hydrated, TransformData};
use crate::resource::table::{registered, DefinitionError, Table, TransformFn};
use serde_json::{Map, Value};

pub const TABLE_NAME: &str = "aws_vpc_subnet";

/// Tag list as a key/value map; later duplicates overwrite earlier ones
pub fn tags_to_map(tags: &[Tag]) -> Map<String, Value> {
    let mut map = Map::new();
    for tag in tags {
        map.insert(tag.key.clone(), Value::String(tag.value.clone()));
    }
    map
}

/// Last `Name` tag if non-empty, else the subnet id
pub fn subnet_title(hydrated: &Hydrated<Subnet>) -> String {
    let subnet = match hydrated {
        Hydrated::List(subnet) => subnet,
        Hydrated::Get(subnet) => subnet,
    };

    subnet
        .tags
        .iter()
        .rev()
        .find(|t| t.key == "Name")
        .map(|t| t.value.clone())
        .filter(|v| !v.is_empty())
        .or_else(|| subnet.subnet_id.clone())
        .unwrap_or_default()
}

pub fn arn_to_akas(arn: &str) -> Vec<String> {
    vec![arn.to_string()]
}

/// Parsed `arn:<partition>:<service>:<region>:<account>:<resource>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account_id: &'a str,
    pub resource: &'a str,
}

impl<'a> Arn<'a> {
    pub fn parse(arn: &'a str) -> Option<Self> {
        let mut parts = arn.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }
        let arn = Arn {
            partition: parts.next()?,
            service: parts.next()?,
            region: parts.next()?,
            account_id: parts.next()?,
            resource: parts.next()?,
        };
        if arn.partition.is_empty() || arn.resource.is_empty() {
            return None;
        }
        Some(arn)
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

fn opt_bool(value: Option<bool>) -> Value {
    value.map(Value::Bool).unwrap_or(Value::Null)
}

fn subnet<'a>(d: &TransformData<'a, Subnet>) -> &'a Subnet {
    d.hydrated.item()
}

fn parsed_arn<'a>(d: &'a TransformData<'_, Subnet>) -> Option<Arn<'a>> {
    subnet(d).subnet_arn.as_deref().and_then(Arn::parse)
}

fn column_subnet_id(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).subnet_id)
}

fn column_subnet_arn(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).subnet_arn)
}

fn column_vpc_id(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).vpc_id)
}

fn column_cidr_block(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).cidr_block)
}

fn column_state(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).state)
}

fn column_owner_id(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).owner_id)
}

fn column_assign_ipv6(d: &TransformData<'_, Subnet>) -> Value {
    opt_bool(subnet(d).assign_ipv6_address_on_creation)
}

fn column_available_ips(d: &TransformData<'_, Subnet>) -> Value {
    subnet(d)
        .available_ip_address_count
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn column_availability_zone(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).availability_zone)
}

fn column_availability_zone_id(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).availability_zone_id)
}

fn column_customer_owned_pool(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).customer_owned_ipv4_pool)
}

fn column_default_for_az(d: &TransformData<'_, Subnet>) -> Value {
    opt_bool(subnet(d).default_for_az)
}

fn column_map_customer_owned_ip(d: &TransformData<'_, Subnet>) -> Value {
    opt_bool(subnet(d).map_customer_owned_ip_on_launch)
}

fn column_map_public_ip(d: &TransformData<'_, Subnet>) -> Value {
    opt_bool(subnet(d).map_public_ip_on_launch)
}

fn column_outpost_arn(d: &TransformData<'_, Subnet>) -> Value {
    opt_string(&subnet(d).outpost_arn)
}

fn column_ipv6_associations(d: &TransformData<'_, Subnet>) -> Value {
    serde_json::to_value(&subnet(d).ipv6_cidr_block_association_set).unwrap_or(Value::Null)
}

fn column_tags_src(d: &TransformData<'_, Subnet>) -> Value {
    serde_json::to_value(&subnet(d).tags).unwrap_or(Value::Null)
}

fn column_tags(d: &TransformData<'_, Subnet>) -> Value {
    Value::Object(tags_to_map(&subnet(d).tags))
}

fn column_title(d: &TransformData<'_, Subnet>) -> Value {
    Value::String(subnet_title(d.hydrated))
}

fn column_akas(d: &TransformData<'_, Subnet>) -> Value {
    match &subnet(d).subnet_arn {
        Some(arn) => Value::from(arn_to_akas(arn)),
        None => Value::Null,
    }
}

fn column_partition(d: &TransformData<'_, Subnet>) -> Value {
    parsed_arn(d)
        .map(|arn| Value::String(arn.partition.to_string()))
        .unwrap_or(Value::Null)
}

fn column_region(d: &TransformData<'_, Subnet>) -> Value {
    Value::String(d.region.to_string())
}

fn column_account_id(d: &TransformData<'_, Subnet>) -> Value {
    parsed_arn(d)
        .map(|arn| Value::String(arn.account_id.to_string()))
        .unwrap_or(Value::Null)
}

/// Transform for a column of `aws_vpc_subnet`
pub fn subnet_column(name: &str) -> Option<TransformFn<Subnet>> {
    let transform: TransformFn<Subnet> = match name {
        "subnet_id" => column_subnet_id,
        "subnet_arn" => column_subnet_arn,
        "vpc_id" => column_vpc_id,
        "cidr_block" => column_cidr_block,
        "state" => column_state,
        "owner_id" => column_owner_id,
        "assign_ipv6_address_on_creation" => column_assign_ipv6,
        "available_ip_address_count" => column_available_ips,
        "availability_zone" => column_availability_zone,
        "availability_zone_id" => column_availability_zone_id,
        "customer_owned_ipv4_pool" => column_customer_owned_pool,
        "default_for_az" => column_default_for_az,
        "map_customer_owned_ip_on_launch" => column_map_customer_owned_ip,
        "map_public_ip_on_launch" => column_map_public_ip,
        "outpost_arn" => column_outpost_arn,
        "ipv6_cidr_block_association_set" => column_ipv6_associations,
        "tags_src" => column_tags_src,
        "tags" => column_tags,
        "title" => column_title,
        "akas" => column_akas,
        "partition" => column_partition,
        "region" => column_region,
        "account_id" => column_account_id,
        _ => return None,
    };
    Some(transform)
}

/// Bind the registered `aws_vpc_subnet` definition
pub fn subnet_table() -> Result<Table<Subnet>, DefinitionError> {
    Table::bind(registered(TABLE_NAME)?, subnet_column)
}

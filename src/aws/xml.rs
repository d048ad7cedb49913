//! XML decoding for Query-protocol responses
//!
//! EC2 answers in XML. Responses are folded into `serde_json::Value` so the
//! rest of the crate can walk them the same way it walks JSON: repeated child
//! elements become arrays, leaf elements become strings, empty elements
//! become `null`. Leaf text is kept verbatim; whitespace between child
//! elements is dropped.

use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Parse an XML document into a JSON value
pub fn xml_to_json(xml: &str) -> Result<Value> {
    let mut reader = Reader::from_str(xml);

    let mut root_map: Map<String, Value> = Map::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let child_value = parse_element(&mut reader)?;
                root_map.insert(tag_name, child_value);
            }
            Ok(Event::Empty(e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                root_map.insert(tag_name, Value::Null);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(anyhow!("XML parse error: {}", e)),
        }
        buf.clear();
    }

    Ok(Value::Object(root_map))
}

fn parse_element(reader: &mut Reader<&[u8]>) -> Result<Value> {
    let mut map: Map<String, Value> = Map::new();
    let mut buf = Vec::new();
    let mut current_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                let child_value = parse_element(reader)?;
                insert_child(&mut map, tag_name, child_value);
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| anyhow!("XML parse error: {}", e))?;
                current_text.push_str(&text);
            }
            Ok(Event::CData(e)) => {
                current_text.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Ok(Event::Empty(e)) => {
                let tag_name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                insert_child(&mut map, tag_name, Value::Null);
            }
            Ok(Event::End(_)) | Ok(Event::Eof) => break,
            Err(e) => return Err(anyhow!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    if !map.is_empty() {
        Ok(Value::Object(map))
    } else if current_text.is_empty() {
        Ok(Value::Null)
    } else {
        Ok(Value::String(current_text))
    }
}

/// Repeated tags collapse into an array in document order
fn insert_child(map: &mut Map<String, Value>, tag_name: String, child_value: Value) {
    if let Some(existing) = map.get_mut(&tag_name) {
        match existing {
            Value::Array(arr) => arr.push(child_value),
            _ => {
                let old = existing.take();
                *existing = Value::Array(vec![old, child_value]);
            }
        }
    } else {
        map.insert(tag_name, child_value);
    }
}

/// Items of an EC2 `<xxxSet><item/>...</xxxSet>` list
///
/// A set with one `item` decodes to an object and a set with several decodes
/// to an array; both come back as a slice-like list here. Missing or empty
/// sets yield no items.
pub fn set_items(value: Option<&Value>) -> Vec<&Value> {
    match value.and_then(|v| v.get("item")) {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(item) => vec![item],
    }
}

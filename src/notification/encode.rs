//! JSON encoding of notification messages
//!
//! [`Encoder::encode`] writes the typed document as indented JSON.
//! [`Encoder::merge_properties`] takes an already-encoded document and adds
//! caller-supplied keys to its `properties` object. Merged output is written
//! with every object's keys in sorted order so identical inputs give identical
//! bytes.

use super::message::NotificationMessage;
use crate::error::{PublishError, PublishResult};
use serde_json::{Map, Value};

/// Extra property names and values merged into `properties`
pub type ExtraProperties = Map<String, Value>;

pub struct Encoder;

impl Encoder {
    /// Indented JSON; absent optional fields are omitted
    pub fn encode(msg: &NotificationMessage) -> PublishResult<Vec<u8>> {
        serde_json::to_vec_pretty(msg).map_err(|e| PublishError::encoding("encode message", e))
    }

    /// Encode and merge `extra` into `properties` in one step
    pub fn encode_with_properties(
        msg: &NotificationMessage,
        extra: Option<&ExtraProperties>,
    ) -> PublishResult<Vec<u8>> {
        let encoded = Self::encode(msg)?;
        Self::merge_properties(&encoded, extra)
    }

    /// Merge `extra` into the `properties` object of an encoded document
    ///
    /// An absent or empty mapping returns the document unchanged. On a key
    /// collision the extra value wins. Only keys inside `properties` are ever
    /// touched; a document without a `properties` object is an error.
    pub fn merge_properties(
        document: &[u8],
        extra: Option<&ExtraProperties>,
    ) -> PublishResult<Vec<u8>> {
        let extra = match extra {
            Some(extra) if !extra.is_empty() => extra,
            _ => return Ok(document.to_vec()),
        };

        let mut root: Value = serde_json::from_slice(document)
            .map_err(|e| PublishError::encoding("decode document for merge", e))?;

        let properties = root
            .as_object_mut()
            .ok_or_else(|| PublishError::merge("document is not a JSON object"))?
            .get_mut("properties")
            .and_then(Value::as_object_mut)
            .ok_or_else(|| PublishError::merge("document has no properties object"))?;

        for (key, value) in extra {
            properties.insert(key.clone(), value.clone());
        }

        serde_json::to_vec_pretty(&sort_keys(root))
            .map_err(|e| PublishError::encoding("re-encode merged document", e))
    }
}

/// Rebuild every object with keys in ascending order
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|(a, _), (b, _)| a.cmp(b));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{Integrity, Link, Properties};
    use serde_json::json;
    use uuid::Uuid;

    fn squash(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec())
            .unwrap()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect()
    }

    fn fixed_message() -> NotificationMessage {
        NotificationMessage {
            id: Uuid::nil(),
            conforms_to: vec![],
            kind: "TYPE".to_string(),
            geometry: None,
            properties: Properties {
                data_id: "DATAID".to_string(),
                pubtime: "PUBTIME".to_string(),
                integrity: Integrity {
                    method: "METHOD".to_string(),
                    value: "VALUE".to_string(),
                },
                metadata_id: None,
                temporal: None,
            },
            links: vec![],
        }
    }

    fn extra(value: Value) -> ExtraProperties {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_encode_is_indented() {
        let bytes = Encoder::encode(&fixed_message()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n  \"id\""));
    }

    #[test]
    fn test_merge_adds_sorted_properties() {
        let merged = Encoder::encode_with_properties(
            &fixed_message(),
            Some(&extra(json!({
                "myNewProperty": true,
                "myOtherProperty": 0,
                "myAnotherProperty": "XXX"
            }))),
        )
        .unwrap();

        let expected = squash(
            br#"{
                "conformsTo": [],
                "geometry": null,
                "id": "00000000-0000-0000-0000-000000000000",
                "links": [],
                "properties": {
                    "data_id": "DATAID",
                    "integrity": {"method": "METHOD", "value": "VALUE"},
                    "myAnotherProperty": "XXX",
                    "myNewProperty": true,
                    "myOtherProperty": 0,
                    "pubtime": "PUBTIME"
                },
                "type": "TYPE"
            }"#,
        );
        assert_eq!(squash(&merged), expected);
    }

    #[test]
    fn test_empty_or_absent_merge_is_plain_encoding() {
        let msg = fixed_message();
        let plain = Encoder::encode(&msg).unwrap();

        assert_eq!(Encoder::encode_with_properties(&msg, None).unwrap(), plain);
        assert_eq!(
            Encoder::encode_with_properties(&msg, Some(&ExtraProperties::new())).unwrap(),
            plain
        );
    }

    #[test]
    fn test_data_domain_merge_preserves_existing_properties() {
        let msg = fixed_message();
        let merged =
            Encoder::encode_with_properties(&msg, Some(&extra(json!({"dataDomain": "X"}))))
                .unwrap();

        let before: Value = serde_json::from_slice(&Encoder::encode(&msg).unwrap()).unwrap();
        let after: Value = serde_json::from_slice(&merged).unwrap();

        assert_eq!(after["properties"]["dataDomain"], "X");
        for (key, value) in before["properties"].as_object().unwrap() {
            assert_eq!(&after["properties"][key], value, "property {key} changed");
        }
        assert_eq!(after["id"], before["id"]);
        assert_eq!(after["links"], before["links"]);
        assert!(after.get("dataDomain").is_none());
    }

    #[test]
    fn test_collision_extra_value_wins() {
        let merged = Encoder::encode_with_properties(
            &fixed_message(),
            Some(&extra(json!({"data_id": "OVERRIDDEN"}))),
        )
        .unwrap();
        let after: Value = serde_json::from_slice(&merged).unwrap();
        assert_eq!(after["properties"]["data_id"], "OVERRIDDEN");
    }

    #[test]
    fn test_merge_is_reproducible() {
        let msg = fixed_message();
        let props = extra(json!({"b": 1, "a": {"z": 1, "y": 2}}));
        let first = Encoder::encode_with_properties(&msg, Some(&props)).unwrap();
        let second = Encoder::merge_properties(&first, Some(&props)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_rejects_document_without_properties() {
        let result = Encoder::merge_properties(br#"{"id": "x"}"#, Some(&extra(json!({"k": 1}))));
        assert!(matches!(result, Err(PublishError::Merge { .. })));

        let result = Encoder::merge_properties(br#"[1, 2]"#, Some(&extra(json!({"k": 1}))));
        assert!(matches!(result, Err(PublishError::Merge { .. })));
    }

    #[test]
    fn test_merge_rejects_invalid_json() {
        let result = Encoder::merge_properties(b"not json", Some(&extra(json!({"k": 1}))));
        assert!(matches!(result, Err(PublishError::Encoding { .. })));
    }

    #[test]
    fn test_optional_fields_never_null() {
        let text = String::from_utf8(Encoder::encode(&fixed_message()).unwrap()).unwrap();
        assert!(!text.contains("metadata_id"));
        assert!(!text.contains("datetime"));
    }
}

//! End-to-end notification construction tests
//!
//! Build a message from a real file on disk, encode it, and check the JSON a
//! subscriber would receive.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;
use wispub::config::DataRequest;
use wispub::notification::{Encoder, MessageBuilder, TemporalExtent};
use wispub::{PreparedNotification, PublishError};

fn write_product(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn request(input: &Path, topic: &str) -> DataRequest {
    DataRequest {
        input: input.to_path_buf(),
        topic: topic.to_string(),
        download_url: Url::parse("http://example/data/f.bin").unwrap(),
        mime_type: None,
        metadata_id: None,
        temporal: None,
        data_domain: None,
    }
}

fn encode(request: &DataRequest) -> Value {
    let message = MessageBuilder::build(request).unwrap();
    serde_json::from_slice(&Encoder::encode(&message).unwrap()).unwrap()
}

#[test]
fn test_ten_byte_file_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "f.bin", b"0123456789");

    let doc = encode(&request(&input, "origin/a/wis2/center/data"));

    assert_eq!(doc["type"], "Feature");
    assert_eq!(
        doc["conformsTo"],
        serde_json::json!(["http://wis.wmo.int/spec/wnm/1/conf/core"])
    );
    assert!(doc["geometry"].is_null());
    assert_eq!(doc["properties"]["data_id"], "center/data/f.bin");
    assert_eq!(doc["properties"]["integrity"]["method"], "sha512");
    assert_eq!(doc["links"][0]["href"], "http://example/data/f.bin");
    assert_eq!(doc["links"][0]["rel"], "canonical");
    assert_eq!(doc["links"][0]["type"], "application/octet-stream");
    assert_eq!(doc["links"][0]["length"], 10);

    let properties = doc["properties"].as_object().unwrap();
    assert!(!properties.contains_key("datetime"));
    assert!(!properties.contains_key("start_datetime"));
    assert!(!properties.contains_key("end_datetime"));
    assert!(!properties.contains_key("metadata_id"));
}

#[test]
fn test_data_id_keeps_everything_after_routing_prefix() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "file.nc", b"CDF\x01");

    let doc = encode(&request(&input, "a/b/center/sub/topic"));
    assert_eq!(doc["properties"]["data_id"], "center/sub/topic/file.nc");
    assert_eq!(doc["links"][0]["type"], "application/netcdf");
}

#[test]
fn test_single_datetime_is_exclusive() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "obs.bufr", b"BUFR");
    let mut req = request(&input, "origin/a/wis2/center/data");
    req.temporal = TemporalExtent::parse("2024-05-01T12:30:00+02:00").unwrap();

    let doc = encode(&req);
    let properties = doc["properties"].as_object().unwrap();
    assert_eq!(properties["datetime"], "2024-05-01T10:30:00Z");
    assert!(!properties.contains_key("start_datetime"));
    assert!(!properties.contains_key("end_datetime"));
}

#[test]
fn test_datetime_pair_is_exclusive() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "obs.bufr.bin", b"BUFR");
    let mut req = request(&input, "origin/a/wis2/center/data");
    req.temporal = TemporalExtent::parse("2024-05-01T00:00:00Z,2024-05-01T00:05:00Z").unwrap();

    let doc = encode(&req);
    let properties = doc["properties"].as_object().unwrap();
    assert_eq!(properties["start_datetime"], "2024-05-01T00:00:00Z");
    assert_eq!(properties["end_datetime"], "2024-05-01T00:05:00Z");
    assert!(!properties.contains_key("datetime"));
    assert_eq!(doc["links"][0]["type"], "application/bufr");
}

#[test]
fn test_malformed_datetime_names_the_bad_value() {
    let err = TemporalExtent::parse("2024-05-01T00:00:00Z,yesterday").unwrap_err();
    assert!(matches!(err, PublishError::Validation { .. }));
    assert!(err.to_string().contains("yesterday"));
    assert!(err.to_string().contains("end"));
}

#[test]
fn test_integrity_matches_file_content() {
    let dir = TempDir::new().unwrap();
    let a = write_product(&dir, "a.bin", b"abc");
    let b = write_product(&dir, "b.bin", b"abd");

    let doc_a = encode(&request(&a, "origin/a/wis2/center/data"));
    let doc_b = encode(&request(&b, "origin/a/wis2/center/data"));

    assert_eq!(
        doc_a["properties"]["integrity"]["value"],
        "3a81oZNherrMQXNJriBBMRLm+k6JqX6iCp7u5ktV05ohkpkqJ0/BqDa6PCOj/uu9RU1EI2Q86A4qmslPpUyknw=="
    );
    assert_ne!(
        doc_a["properties"]["integrity"]["value"],
        doc_b["properties"]["integrity"]["value"]
    );
}

#[test]
fn test_prepared_notification_merges_data_domain() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "f.grib.bin", b"GRIB");
    let mut req = request(&input, "origin/a/wis2/center/data/core/weather");
    req.data_domain = Some("DBNet".to_string());
    req.metadata_id = Some("urn:wmo:md:center:nwp".to_string());

    let prepared = PreparedNotification::data(&req).unwrap();
    let doc: Value = serde_json::from_slice(&prepared.payload).unwrap();

    assert_eq!(prepared.topic, "origin/a/wis2/center/data/core/weather");
    assert_eq!(doc["properties"]["dataDomain"], "DBNet");
    assert_eq!(doc["properties"]["metadata_id"], "urn:wmo:md:center:nwp");
    assert_eq!(doc["properties"]["data_id"], "center/data/core/weather/f.grib.bin");
    assert_eq!(doc["links"][0]["type"], "application/grib");
}

#[test]
fn test_short_topic_rejected() {
    let dir = TempDir::new().unwrap();
    let input = write_product(&dir, "f.bin", b"x");
    let result = MessageBuilder::build(&request(&input, "origin/a"));
    assert!(matches!(result, Err(PublishError::Validation { .. })));
}

#[test]
fn test_unreadable_input_is_io_error() {
    let result = MessageBuilder::build(&request(
        Path::new("/no/such/product.bufr"),
        "origin/a/wis2/center/data",
    ));
    assert!(matches!(result, Err(PublishError::Io { .. })));
}

//! WIS 2.0 topic handling
//!
//! Topics look like `origin/a/wis2/<center>/data/...`. The first two segments
//! are the routing prefix and do not belong in a `data_id`; neither does the
//! `wis2` system segment when it directly follows them.

use crate::error::{PublishError, PublishResult};

/// Segments dropped from the front of a topic when deriving a data id
const ROUTING_PREFIX_SEGMENTS: usize = 2;

const WIS2_SYSTEM_SEGMENT: &str = "wis2";

/// Derive the stable `data_id` for `file_name` published on `topic`
///
/// `data_id("a/b/center/sub/topic", "file.nc") == "center/sub/topic/file.nc"`
/// and `data_id("origin/a/wis2/center/data", "f.bin") == "center/data/f.bin"`.
/// Empty segments are dropped when joining.
pub fn data_id(topic: &str, file_name: &str) -> PublishResult<String> {
    let segments: Vec<&str> = topic.split('/').collect();
    if segments.len() <= ROUTING_PREFIX_SEGMENTS {
        return Err(PublishError::validation(format!(
            "topic '{topic}' has too few segments to derive a data id"
        )));
    }

    let mut rest = &segments[ROUTING_PREFIX_SEGMENTS..];
    if rest.len() > 1 && rest[0] == WIS2_SYSTEM_SEGMENT {
        rest = &rest[1..];
    }

    let joined = rest
        .iter()
        .copied()
        .chain(std::iter::once(file_name))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    Ok(joined)
}

/// Topic a center's WCMP2 metadata records are published on
pub fn metadata_topic(center: &str) -> String {
    format!(
        "origin/a/wis2/{}/metadata/core/wcmp2",
        center.trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_data_id_strips_routing_prefix() {
        assert_eq!(
            data_id("a/b/center/sub/topic", "file.nc").unwrap(),
            "center/sub/topic/file.nc"
        );
    }

    #[test]
    fn test_data_id_strips_wis2_system_segment() {
        assert_eq!(
            data_id("origin/a/wis2/center/data", "f.bin").unwrap(),
            "center/data/f.bin"
        );
        assert_eq!(
            data_id("cache/a/wis2/us-ssec/data/core/weather", "x.bufr").unwrap(),
            "us-ssec/data/core/weather/x.bufr"
        );
        // Kept when nothing would follow it
        assert_eq!(data_id("origin/a/wis2", "f").unwrap(), "wis2/f");
    }

    #[test]
    fn test_data_id_minimum_topic() {
        assert_eq!(data_id("a/b/c", "f").unwrap(), "c/f");
    }

    #[test]
    fn test_data_id_rejects_short_topics() {
        for topic in ["", "a", "a/b"] {
            assert!(
                matches!(data_id(topic, "f"), Err(PublishError::Validation { .. })),
                "topic {topic:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_data_id_skips_empty_segments() {
        assert_eq!(data_id("a/b/c//d/", "f").unwrap(), "c/d/f");
    }

    #[test]
    fn test_metadata_topic() {
        assert_eq!(
            metadata_topic("US-SSEC"),
            "origin/a/wis2/us-ssec/metadata/core/wcmp2"
        );
    }

    proptest! {
        #[test]
        fn data_id_is_deterministic(
            parts in proptest::collection::vec("[a-v0-9-]{1,8}", 3..8),
            file in "[a-z0-9]{1,8}\\.[a-z]{1,4}",
        ) {
            let topic = parts.join("/");
            let first = data_id(&topic, &file).unwrap();
            let second = data_id(&topic, &file).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(first.ends_with(&file));
            let expected_prefix = parts[2..].join("/");
            prop_assert!(first.starts_with(&expected_prefix));
        }
    }
}

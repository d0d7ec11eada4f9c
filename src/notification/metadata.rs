//! WCMP2 metadata records
//!
//! A metadata notification is a discovery record the operator already wrote.
//! It is checked to be a JSON object and then published byte for byte.

use crate::error::{PublishError, PublishResult};
use serde_json::Value;
use std::path::Path;

/// Read a metadata record, rejecting anything that is not a JSON object
pub fn load_metadata_record(path: &Path) -> PublishResult<Vec<u8>> {
    let body = std::fs::read(path).map_err(|e| PublishError::io("read", path, e))?;

    let parsed: Value = serde_json::from_slice(&body)
        .map_err(|e| PublishError::encoding("parse metadata record", e))?;
    if !parsed.is_object() {
        return Err(PublishError::validation(format!(
            "metadata record {} is not a JSON object",
            path.display()
        )));
    }

    Ok(body)
}

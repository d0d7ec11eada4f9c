//! Content integrity: SHA-512 over the full file, base64 encoded
//!
//! The file is streamed through the hasher in fixed-size chunks and the byte
//! count is taken from the same pass, so the recorded length always matches
//! the bytes that were hashed.

use crate::error::{PublishError, PublishResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Method name published alongside the digest
pub const INTEGRITY_METHOD: &str = "sha512";

const CHUNK_SIZE: usize = 64 * 1024;

/// Digest method and value pair
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Integrity {
    pub method: String,
    pub value: String,
}

impl Integrity {
    pub fn sha512(value: String) -> Self {
        Self {
            method: INTEGRITY_METHOD.to_string(),
            value,
        }
    }
}

/// Result of one read pass over the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub integrity: Integrity,
    /// Bytes read, which is also the length the digest covers
    pub length: u64,
}

/// Hash everything `reader` yields
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<ContentDigest> {
    let mut hasher = Sha512::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut length = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
        length += n as u64;
    }

    Ok(ContentDigest {
        integrity: Integrity::sha512(STANDARD.encode(hasher.finalize())),
        length,
    })
}

/// Open and hash a file
///
/// Open failures are I/O errors; failures partway through the stream are
/// checksum errors.
pub fn digest_file(path: &Path) -> PublishResult<ContentDigest> {
    let file = File::open(path).map_err(|e| PublishError::io("open", path, e))?;
    digest_reader(file).map_err(|e| PublishError::checksum(path, e))
}

//! Content-and-path fingerprinting for layer entries.
//!
//! A fingerprint is computed in two stages:
//! 1. the entry's bytes are streamed through a 64-bit MetroHash accumulator;
//! 2. the decimal text of that digest, followed by the entry's absolute logical path,
//!    is fed into a fresh accumulator whose digest is the fingerprint.
//!
//! Two files with identical bytes at different paths therefore never share a fingerprint.

use metrohash::MetroHash64;
use std::hash::Hasher;
use std::io::{self, ErrorKind, Read};

const CHUNK_SIZE: usize = 1024;

/// Returns the absolute form of a logical path inside the image filesystem.
///
/// Missing leading slashes are added and repeated slashes are collapsed.
pub fn absolute_path(path: &str) -> String {
    let mut abs = String::with_capacity(path.len() + 1);
    if !path.starts_with('/') {
        abs.push('/');
    }
    for ch in path.chars() {
        if ch == '/' && abs.ends_with('/') {
            continue;
        }
        abs.push(ch);
    }
    abs
}

/// Streams `content` to EOF and returns its path-salted fingerprint.
///
/// Any read failure is returned as-is; the stream is never silently truncated.
pub fn fingerprint<R: Read>(mut content: R, logical_path: &str) -> io::Result<u64> {
    let mut content_hasher = MetroHash64::default();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        match content.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => content_hasher.write(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    let content_hash = content_hasher.finish().to_string();

    let mut final_hasher = MetroHash64::default();
    final_hasher.write(content_hash.as_bytes());
    final_hasher.write(absolute_path(logical_path).as_bytes());

    Ok(final_hasher.finish())
}

//! Serializable per-layer export.
//!
//! [`LayerExport`] only holds what its producer hands it; no validation or derived
//! computation happens here. The JSON shape is:
//!
//! ```json
//! {
//!   "index": 0,
//!   "id": "sha256:…",
//!   "digestId": "sha256:…",
//!   "sizeBytes": 1234,
//!   "command": "RUN apk add curl",
//!   "fileList": [{ "AbsPath": "/etc/hosts", "NodeData": { "path": "etc/hosts", … } }]
//! }
//! ```

use crate::file_info::FileInfo;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// A file record together with its absolute path in the layer tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsNodeData {
    #[serde(rename = "AbsPath")]
    pub abs_path: String,
    #[serde(rename = "NodeData")]
    pub node_data: FileInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerExport {
    pub index: usize,
    pub id: String,
    #[serde(rename = "digestId")]
    pub digest_id: String,
    #[serde(rename = "sizeBytes")]
    pub size_bytes: u64,
    pub command: String,
    /// Kept in the order the producer supplied.
    #[serde(rename = "fileList")]
    pub file_list: Vec<AbsNodeData>,
}

impl LayerExport {
    pub fn new(
        index: usize,
        id: String,
        digest_id: String,
        size_bytes: u64,
        command: String,
        files: impl IntoIterator<Item = (String, FileInfo)>,
    ) -> Self {
        let file_list = files
            .into_iter()
            .map(|(abs_path, node_data)| AbsNodeData {
                abs_path,
                node_data,
            })
            .collect();

        Self {
            index,
            id,
            digest_id,
            size_bytes,
            command,
            file_list,
        }
    }

    pub fn write_json<W: Write>(&self, writer: W, pretty: bool) -> Result<()> {
        let written = if pretty {
            serde_json::to_writer_pretty(writer, self)
        } else {
            serde_json::to_writer(writer, self)
        };
        written.context("Failed to serialize layer export")
    }
}

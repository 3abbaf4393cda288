//! Model artifact storage
//!
//! Layout: one JSON header line, then the JSON payload.
//! The header carries a SHA-256 of the payload bytes; loading refuses
//! any artifact whose payload does not match it.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::params::ForestParams;
use crate::constants::MODEL_TYPE;
use crate::logic::error::{CoreError, CoreResult};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub model_type: String,
    pub created_at: DateTime<Utc>,
    pub n_features: usize,
    pub params: ForestParams,
    /// Hex SHA-256 of the payload
    pub checksum: String,
    pub payload_len: usize,
}

fn checksum(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Write header + payload, creating parent directories
pub fn write_artifact<T: Serialize>(
    path: &Path,
    n_features: usize,
    params: &ForestParams,
    payload: &T,
) -> CoreResult<ArtifactHeader> {
    let body = serde_json::to_vec(payload)?;
    let header = ArtifactHeader {
        format_version: ARTIFACT_FORMAT_VERSION,
        model_type: MODEL_TYPE.to_string(),
        created_at: Utc::now(),
        n_features,
        params: params.clone(),
        checksum: checksum(&body),
        payload_len: body.len(),
    };

    let mut out = serde_json::to_vec(&header)?;
    out.push(b'\n');
    out.extend_from_slice(&body);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, out)?;

    Ok(header)
}

/// Read only the header line
pub fn read_header(path: &Path) -> CoreResult<ArtifactHeader> {
    let data = fs::read(path)?;
    let (header, _) = split_header(&data)?;
    Ok(header)
}

/// Read and verify an artifact
pub fn read_artifact<T: DeserializeOwned>(path: &Path) -> CoreResult<(ArtifactHeader, T)> {
    if !path.exists() {
        return Err(CoreError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("model artifact not found: {}", path.display()),
        )));
    }

    let data = fs::read(path)?;
    let (header, body) = split_header(&data)?;

    if header.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(CoreError::Artifact(format!(
            "unsupported format version {} (expected {})",
            header.format_version, ARTIFACT_FORMAT_VERSION
        )));
    }
    if header.model_type != MODEL_TYPE {
        return Err(CoreError::Artifact(format!(
            "unexpected model type '{}'",
            header.model_type
        )));
    }
    if body.len() != header.payload_len || checksum(body) != header.checksum {
        return Err(CoreError::Artifact("checksum mismatch".to_string()));
    }

    let payload = serde_json::from_slice(body)?;
    Ok((header, payload))
}

fn split_header(data: &[u8]) -> CoreResult<(ArtifactHeader, &[u8])> {
    let newline = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| CoreError::Artifact("missing header line".to_string()))?;

    let header: ArtifactHeader = serde_json::from_slice(&data[..newline])
        .map_err(|e| CoreError::Artifact(format!("invalid header: {}", e)))?;

    Ok((header, &data[newline + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_header_describes_payload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("m.model");
        let payload = vec![1.5f64, 2.5];

        let written = write_artifact(&path, 2, &ForestParams::default(), &payload).unwrap();
        let header = read_header(&path).unwrap();

        assert_eq!(header, written);
        assert_eq!(header.model_type, MODEL_TYPE);
        assert_eq!(header.n_features, 2);
        assert_eq!(header.checksum.len(), 64);

        let (_, loaded): (_, Vec<f64>) = read_artifact(&path).unwrap();
        assert_eq!(loaded, payload);
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.model");
        write_artifact(&path, 1, &ForestParams::default(), &vec![1u32, 2, 3]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("[1,2,3]", "[1,2,4]")).unwrap();

        let err = read_artifact::<Vec<u32>>(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.model");
        fs::write(&path, "not an artifact").unwrap();

        assert!(matches!(
            read_artifact::<Vec<u32>>(&path),
            Err(CoreError::Artifact(_))
        ));
    }
}

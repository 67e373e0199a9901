//! Annotation image materialization.
//!
//! Telestration overlays arrive embedded in the request as base64 data
//! URLs. They are decoded to real files in the OS temp directory so
//! ffmpeg can take them as inputs, and registered for cleanup.

use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use matchcut_common::{MatchcutError, MatchcutResult};

use crate::temp::{unique_temp_path, ArtifactKind, TempArtifacts};

/// Decode a `data:<mime>;base64,<payload>` string and write it to a
/// uniquely-named temp file. `tag` disambiguates the file name
/// (e.g. "ann1" / "ann2" for the two angles).
pub async fn materialize_annotation(
    data_url: &str,
    tag: &str,
    temps: &mut TempArtifacts,
) -> MatchcutResult<PathBuf> {
    let bytes = decode_data_url(data_url)?;

    let path = unique_temp_path(&format!("matchcut_{tag}"), "png");
    tokio::fs::write(&path, &bytes).await?;
    temps.register(&path, ArtifactKind::Annotation);

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Materialized annotation");
    Ok(path)
}

/// Validate the data-URL shape and decode the payload.
fn decode_data_url(data_url: &str) -> MatchcutResult<Vec<u8>> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| MatchcutError::annotation_decode("missing data: prefix"))?;

    let (mime, payload) = rest
        .split_once(";base64,")
        .ok_or_else(|| MatchcutError::annotation_decode("missing ;base64, separator"))?;

    if mime.is_empty() {
        return Err(MatchcutError::annotation_decode("empty mime type"));
    }

    BASE64
        .decode(payload)
        .map_err(|e| MatchcutError::annotation_decode(format!("invalid base64 payload: {e}")))
}

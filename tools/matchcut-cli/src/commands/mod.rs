//! CLI subcommands.

pub mod check;
pub mod export;
pub mod inspect;

use std::path::{Path, PathBuf};

use matchcut_export_model::ExportRequest;

pub(crate) fn load_request(path: &Path) -> anyhow::Result<ExportRequest> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read request {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse request {}: {e}", path.display()))
}

/// Binary lookup order: explicit CLI flag, configured path, `PATH`.
pub(crate) fn resolve_binary(name: &str, explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path);
        }
        return Err(anyhow::anyhow!("{name} not found at {}", path.display()));
    }
    which::which(name).map_err(|e| anyhow::anyhow!("{name} not found on PATH: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_request_parses_minimal_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"sourcePath": "/video/match.mp4", "clips": [
                {"id": "c1", "actionName": "Scrum", "startTime": 1.0, "endTime": 9.0}
            ]}"#,
        )
        .unwrap();

        let request = load_request(&path).unwrap();
        assert_eq!(request.clips.len(), 1);
    }

    #[test]
    fn test_load_request_reports_the_offending_path() {
        let err = load_request(Path::new("/nonexistent/request.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/request.json"));
    }

    #[test]
    fn test_explicit_binary_must_exist() {
        assert!(resolve_binary("ffmpeg", Some(PathBuf::from("/nonexistent/ffmpeg"))).is_err());
    }
}

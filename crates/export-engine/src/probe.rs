//! Source stream probing via ffprobe.

use std::path::Path;

use matchcut_clip_core::FrameSize;

/// Probe the frame size of the first video stream. Returns `None` when
/// ffprobe is unavailable or its output is unusable; callers fall back
/// to [`FrameSize::FALLBACK`].
pub async fn probe_frame_size(ffprobe: &Path, source: &Path) -> Option<FrameSize> {
    let output = tokio::process::Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height",
            "-of",
            "csv=p=0:s=x",
        ])
        .arg(source)
        .output()
        .await
        .ok()?;

    if !output.status.success() {
        tracing::warn!(
            source = %source.display(),
            code = ?output.status.code(),
            "ffprobe exited non-zero"
        );
        return None;
    }

    let raw = String::from_utf8(output.stdout).ok()?;
    parse_dimensions(&raw)
}

fn parse_dimensions(raw: &str) -> Option<FrameSize> {
    let line = raw.lines().next()?.trim();
    let (w, h) = line.split_once('x')?;
    let width = w.parse::<u32>().ok()?;
    let height = h.parse::<u32>().ok()?;
    if width == 0 || height == 0 {
        return None;
    }
    Some(FrameSize { width, height })
}

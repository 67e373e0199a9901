//! The export entry point.
//!
//! `export_clips` is the only operation crossing the public boundary.
//! It validates the request, resolves sources and the output directory,
//! probes the frame size, and hands off to the assembler. Every failure
//! is folded into the `ExportResult` envelope after the temp sweep; the
//! function itself never returns an error.

use std::path::{Path, PathBuf};

use matchcut_clip_core::FrameSize;
use matchcut_common::{MatchcutError, MatchcutResult};
use matchcut_export_model::{AngleOption, CompositionMode, ExportRequest, ExportResult};

use crate::assemble::{AnnotationAngle, ClipAssembler};
use crate::fonts::{resolve_fonts, FontResolver};
use crate::probe::probe_frame_size;
use crate::temp::TempArtifacts;

/// Fallback seam for the destination directory, consulted only when the
/// request carries none. A `None` from here is a user cancellation.
pub trait OutputDirResolver: Send + Sync {
    fn resolve_output_dir(&self) -> Option<PathBuf>;
}

/// Always resolves to one fixed directory.
pub struct FixedOutputDir(pub PathBuf);

impl OutputDirResolver for FixedOutputDir {
    fn resolve_output_dir(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Never resolves; a request without a directory becomes a cancellation.
pub struct NoOutputDir;

impl OutputDirResolver for NoOutputDir {
    fn resolve_output_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// Host environment for one export run.
pub struct ExportContext<'a> {
    pub ffmpeg: &'a Path,
    pub ffprobe: &'a Path,
    pub output_dir_resolver: &'a dyn OutputDirResolver,
    pub font_resolver: &'a dyn FontResolver,
}

/// Run one export request to completion.
///
/// Temporary artifacts are swept on both the success and the failure
/// branch before the result is produced.
pub async fn export_clips(request: &ExportRequest, ctx: &ExportContext<'_>) -> ExportResult {
    let mut temps = TempArtifacts::new();
    let outcome = run_export(request, ctx, &mut temps).await;

    let swept = temps.sweep().await;
    if swept > 0 {
        tracing::debug!(swept, "Swept remaining temp artifacts");
    }

    match outcome {
        Ok(()) => ExportResult::ok(),
        Err(err) => {
            tracing::error!(error = %err, "Export failed");
            ExportResult::failure(err.to_string())
        }
    }
}

async fn run_export(
    request: &ExportRequest,
    ctx: &ExportContext<'_>,
    temps: &mut TempArtifacts,
) -> MatchcutResult<()> {
    validate_request(request)?;
    let sources = resolve_sources(request)?;
    let output_dir = resolve_output_dir(request, ctx.output_dir_resolver)?;
    tokio::fs::create_dir_all(&output_dir).await?;

    let frame = probe_frame_size(ctx.ffprobe, &sources.source)
        .await
        .unwrap_or(FrameSize::FALLBACK);
    // The secondary stream keeps its own dimensions until the pre-stack
    // scale, so its annotation needs its own probed size.
    let secondary_frame = match &sources.secondary {
        Some(secondary) => probe_frame_size(ctx.ffprobe, secondary)
            .await
            .unwrap_or(FrameSize::FALLBACK),
        None => frame,
    };
    let fonts = resolve_fonts(ctx.font_resolver);

    tracing::info!(
        source = %sources.source.display(),
        dual = sources.secondary.is_some(),
        mode = ?request.export_mode,
        clips = request.clips.len(),
        width = frame.width,
        height = frame.height,
        "Starting export"
    );

    let assembler = ClipAssembler {
        ffmpeg: ctx.ffmpeg,
        fonts: &fonts,
        frame,
        secondary_frame,
        source: &sources.source,
        secondary_source: sources.secondary.as_deref(),
        annotation_angle: sources.annotation_angle,
        overlay: &request.overlay,
        output_file_name: request.output_file_name.as_deref(),
    };
    assembler
        .run(&request.clips, request.export_mode, &output_dir, temps)
        .await
}

/// Fast-fail checks before any file or process work.
fn validate_request(request: &ExportRequest) -> MatchcutResult<()> {
    if request.source_path.as_os_str().is_empty() {
        return Err(MatchcutError::invalid_request("no source video given"));
    }
    if !request.source_path.exists() {
        return Err(MatchcutError::FileNotFound {
            path: request.source_path.clone(),
        });
    }
    if request.clips.is_empty() {
        return Err(MatchcutError::invalid_request("no clips to export"));
    }
    for clip in &request.clips {
        if clip.end_time < clip.start_time {
            return Err(MatchcutError::invalid_request(format!(
                "clip {}: end time {} precedes start time {}",
                clip.id, clip.end_time, clip.start_time
            )));
        }
    }
    Ok(())
}

/// Concrete sources for one export, derived from the request's
/// composition mode and angle option.
pub struct ResolvedSources {
    pub source: PathBuf,
    /// Present only when dual-angle composition is active.
    pub secondary: Option<PathBuf>,
    pub annotation_angle: AnnotationAngle,
}

/// Turn the request's composition mode and angle option into concrete
/// sources.
///
/// Dual composition is active when explicitly requested, or when the
/// angle option is `all` and a secondary source exists. `angle2` with
/// no secondary source falls back to the primary video but keeps the
/// secondary angle's annotations.
pub fn resolve_sources(request: &ExportRequest) -> MatchcutResult<ResolvedSources> {
    let primary = request.source_path.clone();
    let secondary = request.source_path2.clone();

    if request.mode == CompositionMode::Dual {
        let secondary = secondary.ok_or(MatchcutError::DualSourceMissing)?;
        if !secondary.exists() {
            return Err(MatchcutError::FileNotFound { path: secondary });
        }
        return Ok(ResolvedSources {
            source: primary,
            secondary: Some(secondary),
            annotation_angle: AnnotationAngle::Primary,
        });
    }

    let resolved = match request.angle_option {
        AngleOption::All => match secondary {
            Some(secondary) if secondary.exists() => ResolvedSources {
                source: primary,
                secondary: Some(secondary),
                annotation_angle: AnnotationAngle::Primary,
            },
            _ => ResolvedSources {
                source: primary,
                secondary: None,
                annotation_angle: AnnotationAngle::Primary,
            },
        },
        AngleOption::Angle1 => ResolvedSources {
            source: primary,
            secondary: None,
            annotation_angle: AnnotationAngle::Primary,
        },
        AngleOption::Angle2 => ResolvedSources {
            source: secondary.filter(|p| p.exists()).unwrap_or(primary),
            secondary: None,
            annotation_angle: AnnotationAngle::Secondary,
        },
    };
    Ok(resolved)
}

fn resolve_output_dir(
    request: &ExportRequest,
    resolver: &dyn OutputDirResolver,
) -> MatchcutResult<PathBuf> {
    if let Some(dir) = &request.output_dir {
        return Ok(dir.clone());
    }
    resolver
        .resolve_output_dir()
        .ok_or(MatchcutError::UserCancelled)
}

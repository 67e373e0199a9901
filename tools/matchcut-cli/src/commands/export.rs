//! Run an export request.

use std::path::PathBuf;

use matchcut_common::config::AppConfig;
use matchcut_export_engine::{
    export_clips, ExportContext, FixedOutputDir, NoOutputDir, OutputDirResolver,
    PlatformFontResolver,
};

pub async fn run(
    request_path: PathBuf,
    output_dir: Option<PathBuf>,
    ffmpeg: Option<PathBuf>,
    ffprobe: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = AppConfig::load();
    let mut request = super::load_request(&request_path)?;

    let ffmpeg = super::resolve_binary("ffmpeg", ffmpeg.or_else(|| config.ffmpeg_path.clone()))?;
    let ffprobe =
        super::resolve_binary("ffprobe", ffprobe.or_else(|| config.ffprobe_path.clone()))?;

    // The CLI flag wins over whatever the request carries.
    if let Some(dir) = output_dir {
        request.output_dir = Some(dir);
    }

    // With no interactive prompt available, the configured default
    // directory is the only fallback.
    let resolver: Box<dyn OutputDirResolver> = match config.output_dir.clone() {
        Some(dir) => Box::new(FixedOutputDir(dir)),
        None => Box::new(NoOutputDir),
    };

    println!(
        "Exporting {} clip(s) from {}",
        request.clips.len(),
        request.source_path.display()
    );

    let ctx = ExportContext {
        ffmpeg: &ffmpeg,
        ffprobe: &ffprobe,
        output_dir_resolver: resolver.as_ref(),
        font_resolver: &PlatformFontResolver,
    };
    let result = export_clips(&request, &ctx).await;

    if result.success {
        println!("Export complete.");
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            result.error.unwrap_or_else(|| "export failed".to_string())
        ))
    }
}

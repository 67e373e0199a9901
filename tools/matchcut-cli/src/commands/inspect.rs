//! Print the planned transcoder invocations without running them.
//!
//! Annotation images are still decoded to temp files so the printed
//! argument vectors are the real ones; everything is swept before the
//! command returns.

use std::path::{Path, PathBuf};

use matchcut_clip_core::{group_by_action, sort_by_start_time, FrameSize};
use matchcut_export_engine::assemble::ClipAssembler;
use matchcut_export_engine::{resolve_fonts, resolve_sources, PlatformFontResolver, TempArtifacts};
use matchcut_export_model::{ClipSpec, ExportMode};

pub async fn run(request_path: PathBuf) -> anyhow::Result<()> {
    let request = super::load_request(&request_path)?;

    // Same angle/composition resolution the export itself uses.
    let sources = resolve_sources(&request)?;
    let dual = sources.secondary.is_some();

    let fonts = resolve_fonts(&PlatformFontResolver);
    let assembler = ClipAssembler {
        ffmpeg: Path::new("ffmpeg"),
        fonts: &fonts,
        frame: FrameSize::FALLBACK,
        secondary_frame: FrameSize::FALLBACK,
        source: &sources.source,
        secondary_source: sources.secondary.as_deref(),
        annotation_angle: sources.annotation_angle,
        overlay: &request.overlay,
        output_file_name: request.output_file_name.as_deref(),
    };

    println!(
        "Planned invocations ({:?} mode, {}, frame assumed {}x{}):",
        request.export_mode,
        if dual { "dual angle" } else { "single angle" },
        FrameSize::FALLBACK.width,
        FrameSize::FALLBACK.height,
    );
    println!();

    let mut temps = TempArtifacts::new();
    let outcome = print_plans(&assembler, &request.clips, request.export_mode, &mut temps).await;
    temps.sweep().await;
    outcome
}

async fn print_plans(
    assembler: &ClipAssembler<'_>,
    clips: &[ClipSpec],
    mode: ExportMode,
    temps: &mut TempArtifacts,
) -> anyhow::Result<()> {
    match mode {
        ExportMode::Single => {
            for (n, idx) in sort_by_start_time(clips).into_iter().enumerate() {
                print_clip_plan(assembler, &clips[idx], &format!("render_{n}.mp4 (temp)"), temps)
                    .await?;
            }
            println!(
                "then: concat demuxer -> {}",
                assembler.combined_file_name()
            );
        }
        ExportMode::PerInstance => {
            for clip in clips {
                let name = assembler.instance_file_name(clip);
                print_clip_plan(assembler, clip, &name, temps).await?;
            }
        }
        ExportMode::PerRow => {
            for (action, members) in group_by_action(clips) {
                for (n, clip) in members.iter().enumerate() {
                    print_clip_plan(assembler, clip, &format!("render_{n}.mp4 (temp)"), temps)
                        .await?;
                }
                println!(
                    "then: concat demuxer -> {}",
                    assembler.row_file_name(&action)
                );
            }
        }
    }
    Ok(())
}

async fn print_clip_plan(
    assembler: &ClipAssembler<'_>,
    clip: &ClipSpec,
    output_name: &str,
    temps: &mut TempArtifacts,
) -> anyhow::Result<()> {
    let plan = assembler
        .plan_clip(clip, Path::new(output_name), temps)
        .await?;
    println!("clip {} ({}):", clip.id, clip.action_name);
    println!("  ffmpeg {}", shell_join(&plan.args));
    println!();
    Ok(())
}

/// Join arguments for display, quoting anything the shell would split.
fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.is_empty()
                || arg
                    .chars()
                    .any(|c| c.is_whitespace() || "'\"\\$;[]()".contains(c))
            {
                format!("'{}'", arg.replace('\'', r"'\''"))
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

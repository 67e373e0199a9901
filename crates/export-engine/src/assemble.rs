//! Per-mode export sequencing.
//!
//! Renders clips one transcoder process at a time, in the order the
//! final output needs them, and handles the concatenation step for the
//! `single` and `perRow` modes. Per-clip argument vectors are built
//! here from the filter graphs produced by `matchcut-clip-core`.

use std::path::{Path, PathBuf};

use matchcut_clip_core::graph::{
    build_dual_angle_graph, build_single_angle_graph, BuiltGraph, CaptionBlock, ClipTiming,
    DualAngleParams, FontPaths, FrameSize, FreezeWindow, SingleAngleParams,
};
use matchcut_clip_core::textsafe::{wrap_text, WRAP_BUDGET};
use matchcut_clip_core::{compose_overlay_lines, group_by_action, sanitize_action_name,
    sort_by_start_time, OverlayLine};
use matchcut_common::MatchcutResult;
use matchcut_export_model::{ClipSpec, ExportMode, OverlayConfig};

use crate::annotate::materialize_annotation;
use crate::runner::run_transcoder;
use crate::temp::{unique_temp_path, ArtifactKind, TempArtifacts};

/// Which annotation field feeds a single-angle render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationAngle {
    Primary,
    Secondary,
}

/// One planned transcoder invocation.
#[derive(Debug, Clone)]
pub struct ClipInvocation {
    pub args: Vec<String>,
    pub output: PathBuf,
}

/// Sequences all renders and concatenations for one export request.
pub struct ClipAssembler<'a> {
    pub ffmpeg: &'a Path,
    pub fonts: &'a FontPaths,
    /// Probed frame size of the active (primary) source.
    pub frame: FrameSize,
    /// Probed frame size of the secondary source; equal to `frame` for
    /// single-angle exports.
    pub secondary_frame: FrameSize,
    /// The active source for this export (already angle-resolved).
    pub source: &'a Path,
    /// Present only when dual-angle composition is active.
    pub secondary_source: Option<&'a Path>,
    /// Which annotation image single-angle renders use.
    pub annotation_angle: AnnotationAngle,
    pub overlay: &'a OverlayConfig,
    pub output_file_name: Option<&'a str>,
}

impl ClipAssembler<'_> {
    fn dual(&self) -> bool {
        self.secondary_source.is_some()
    }

    /// Run the whole request: per-clip renders, then the mode's
    /// grouping/concatenation. Temporaries from intermediate renders
    /// are deleted as soon as their consuming concat finishes.
    pub async fn run(
        &self,
        clips: &[ClipSpec],
        mode: ExportMode,
        output_dir: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        match mode {
            ExportMode::Single => self.run_single(clips, output_dir, temps).await,
            ExportMode::PerInstance => self.run_per_instance(clips, output_dir, temps).await,
            ExportMode::PerRow => self.run_per_row(clips, output_dir, temps).await,
        }
    }

    /// All clips, ascending start time, concatenated into one file.
    async fn run_single(
        &self,
        clips: &[ClipSpec],
        output_dir: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        let mut renders = Vec::with_capacity(clips.len());
        for idx in sort_by_start_time(clips) {
            let render = unique_temp_path("matchcut_render", "mp4");
            temps.register(&render, ArtifactKind::Render);
            self.render_clip(&clips[idx], &render, temps).await?;
            renders.push(render);
        }

        let output = output_dir.join(self.combined_file_name());
        self.concat(&renders, &output, temps).await?;
        for render in &renders {
            temps.remove_now(render).await;
        }

        tracing::info!(output = %output.display(), clips = clips.len(), "Combined export done");
        Ok(())
    }

    /// Each clip straight to its own named output; no concatenation.
    async fn run_per_instance(
        &self,
        clips: &[ClipSpec],
        output_dir: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        for clip in clips {
            let output = output_dir.join(self.instance_file_name(clip));
            self.render_clip(clip, &output, temps).await?;
        }
        Ok(())
    }

    /// Clips grouped by action (first-seen order), one concatenated
    /// output per group.
    async fn run_per_row(
        &self,
        clips: &[ClipSpec],
        output_dir: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        for (action, members) in group_by_action(clips) {
            let mut renders = Vec::with_capacity(members.len());
            for clip in &members {
                let render = unique_temp_path("matchcut_render", "mp4");
                temps.register(&render, ArtifactKind::Render);
                self.render_clip(clip, &render, temps).await?;
                renders.push(render);
            }

            let output = output_dir.join(self.row_file_name(&action));
            self.concat(&renders, &output, temps).await?;
            // Group temporaries go as soon as their concat is done; the
            // final sweep then finds nothing left for them.
            for render in &renders {
                temps.remove_now(render).await;
            }

            tracing::info!(action = %action, output = %output.display(), "Row export done");
        }
        Ok(())
    }

    async fn render_clip(
        &self,
        clip: &ClipSpec,
        output: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        let invocation = self.plan_clip(clip, output, temps).await?;
        tracing::info!(
            clip = %clip.id,
            action = %clip.action_name,
            output = %output.display(),
            "Rendering clip"
        );
        run_transcoder(self.ffmpeg, &invocation.args).await
    }

    /// Build the full argument vector for one clip render, materializing
    /// any annotation images it needs.
    pub async fn plan_clip(
        &self,
        clip: &ClipSpec,
        output: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<ClipInvocation> {
        let timing = ClipTiming::for_range(clip.start_time, clip.end_time);
        let freeze =
            FreezeWindow::resolve(clip.freeze_at, clip.freeze_duration, timing.duration_secs);
        let lines = self.caption_lines(clip);

        let mut args: Vec<String> = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];

        let built = if let Some(secondary) = self.secondary_source {
            push_input(&mut args, timing, self.source);
            push_input(&mut args, timing, secondary);

            let mut next_input = 2usize;
            let mut primary_input = None;
            if let Some(url) = clip.annotation_png_primary.as_deref() {
                let path = materialize_annotation(url, "ann1", temps).await?;
                args.push("-i".to_string());
                args.push(path.display().to_string());
                primary_input = Some(next_input);
                next_input += 1;
            }
            let mut secondary_input = None;
            if let Some(url) = clip.annotation_png_secondary.as_deref() {
                let path = materialize_annotation(url, "ann2", temps).await?;
                args.push("-i".to_string());
                args.push(path.display().to_string());
                secondary_input = Some(next_input);
            }

            build_dual_angle_graph(&DualAngleParams {
                freeze,
                annotation_primary_input: primary_input,
                annotation_secondary_input: secondary_input,
                caption: caption_block(&lines, self.fonts),
                frame: self.frame,
                secondary_frame: self.secondary_frame,
            })
        } else {
            push_input(&mut args, timing, self.source);

            let annotation_url = match self.annotation_angle {
                AnnotationAngle::Primary => clip.annotation_png_primary.as_deref(),
                AnnotationAngle::Secondary => clip.annotation_png_secondary.as_deref(),
            };
            let mut annotation_input = None;
            if let Some(url) = annotation_url {
                let path = materialize_annotation(url, "ann1", temps).await?;
                args.push("-i".to_string());
                args.push(path.display().to_string());
                annotation_input = Some(1);
            }

            build_single_angle_graph(&SingleAngleParams {
                freeze,
                annotation_input,
                caption: caption_block(&lines, self.fonts),
                frame: self.frame,
            })
        };

        push_output_args(&mut args, &built, output);
        Ok(ClipInvocation {
            args,
            output: output.to_path_buf(),
        })
    }

    /// Composed and wrapped caption lines, empty when overlay is off.
    fn caption_lines(&self, clip: &ClipSpec) -> Vec<OverlayLine> {
        if !self.overlay.enabled {
            return Vec::new();
        }
        compose_overlay_lines(clip, self.overlay)
            .into_iter()
            .map(|line| OverlayLine {
                text: wrap_text(&line.text, WRAP_BUDGET),
                is_bold: line.is_bold,
            })
            .collect()
    }

    /// Re-encode concat of already-rendered files through the concat
    /// demuxer. The list file is deleted whatever the outcome.
    async fn concat(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        temps: &mut TempArtifacts,
    ) -> MatchcutResult<()> {
        let list = write_concat_list(inputs, temps).await?;
        let mut args: Vec<String> = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-i".to_string(),
            list.display().to_string(),
        ];
        args.extend(codec_args());
        args.push(output.display().to_string());

        let result = run_transcoder(self.ffmpeg, &args).await;
        temps.remove_now(&list).await;
        result
    }

    fn dual_suffix(&self) -> &'static str {
        if self.dual() {
            "_dual"
        } else {
            ""
        }
    }

    /// File-name prefix from the request's output file name stem.
    fn prefix(&self) -> String {
        match self.output_file_name {
            Some(name) => {
                let stem = Path::new(name)
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_default();
                if stem.is_empty() {
                    String::new()
                } else {
                    format!("{stem}_")
                }
            }
            None => String::new(),
        }
    }

    pub fn combined_file_name(&self) -> String {
        match self.output_file_name {
            Some(name) if Path::new(name).extension().is_some() => name.to_string(),
            Some(name) => format!("{name}.mp4"),
            None => format!(
                "combined_{}{}.mp4",
                chrono::Utc::now().timestamp_millis(),
                self.dual_suffix()
            ),
        }
    }

    pub fn instance_file_name(&self, clip: &ClipSpec) -> String {
        format!(
            "{}{}_{}_{}-{}{}.mp4",
            self.prefix(),
            sanitize_action_name(&clip.action_name),
            clip.action_index.unwrap_or(1),
            clip.start_time.round() as i64,
            clip.end_time.round() as i64,
            self.dual_suffix()
        )
    }

    pub fn row_file_name(&self, action: &str) -> String {
        format!(
            "{}{}_row{}.mp4",
            self.prefix(),
            sanitize_action_name(action),
            self.dual_suffix()
        )
    }
}

fn caption_block<'a>(lines: &'a [OverlayLine], fonts: &'a FontPaths) -> Option<CaptionBlock<'a>> {
    if lines.is_empty() {
        None
    } else {
        Some(CaptionBlock { lines, fonts })
    }
}

fn push_input(args: &mut Vec<String>, timing: ClipTiming, source: &Path) {
    args.push("-ss".to_string());
    args.push(format!("{:.3}", timing.seek_secs));
    args.push("-t".to_string());
    args.push(format!("{:.3}", timing.duration_secs));
    args.push("-i".to_string());
    args.push(source.display().to_string());
}

fn push_output_args(args: &mut Vec<String>, built: &BuiltGraph, output: &Path) {
    if !built.graph.is_empty() {
        args.push("-filter_complex".to_string());
        args.push(built.graph.serialize());
    }
    args.push("-map".to_string());
    args.push(built.video_map.clone());
    args.push("-map".to_string());
    args.push(built.audio_map.clone());
    args.extend(codec_args());
    args.push(output.display().to_string());
}

fn codec_args() -> Vec<String> {
    vec![
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
    ]
}

/// Write the concat demuxer list: one `file '<path>'` line per input,
/// embedded single quotes escaped.
async fn write_concat_list(
    inputs: &[PathBuf],
    temps: &mut TempArtifacts,
) -> MatchcutResult<PathBuf> {
    let mut content = String::new();
    for input in inputs {
        content.push_str(&format!("file '{}'\n", escape_concat_path(input)));
    }

    let path = unique_temp_path("matchcut_concat", "txt");
    tokio::fs::write(&path, content).await?;
    temps.register(&path, ArtifactKind::ConcatList);
    Ok(path)
}

fn escape_concat_path(path: &Path) -> String {
    path.display().to_string().replace('\'', r"'\''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use matchcut_export_model::ClipLabel;

    fn clip(id: &str, action: &str, start: f64, end: f64) -> ClipSpec {
        ClipSpec {
            id: id.to_string(),
            action_name: action.to_string(),
            start_time: start,
            end_time: end,
            freeze_at: None,
            freeze_duration: None,
            labels: vec![],
            memo: None,
            action_index: None,
            annotation_png_primary: None,
            annotation_png_secondary: None,
        }
    }

    fn assembler<'a>(
        fonts: &'a FontPaths,
        overlay: &'a OverlayConfig,
        secondary: Option<&'a Path>,
    ) -> ClipAssembler<'a> {
        ClipAssembler {
            ffmpeg: Path::new("/bin/true"),
            fonts,
            frame: FrameSize::FALLBACK,
            secondary_frame: FrameSize::FALLBACK,
            source: Path::new("/video/match.mp4"),
            secondary_source: secondary,
            annotation_angle: AnnotationAngle::Primary,
            overlay,
            output_file_name: None,
        }
    }

    #[tokio::test]
    async fn test_plan_floors_short_clip_duration() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let asm = assembler(&fonts, &overlay, None);
        let mut temps = TempArtifacts::new();

        let clip = clip("c", "Tackle", 100.0, 100.2);
        let plan = asm
            .plan_clip(&clip, Path::new("/out/c.mp4"), &mut temps)
            .await
            .unwrap();

        let t_pos = plan.args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(plan.args[t_pos + 1], "0.500");
        let ss_pos = plan.args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(plan.args[ss_pos + 1], "100.000");
    }

    #[tokio::test]
    async fn test_plan_bare_clip_maps_raw_streams_without_filter() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let asm = assembler(&fonts, &overlay, None);
        let mut temps = TempArtifacts::new();

        let plan = asm
            .plan_clip(&clip("c", "Try", 5.0, 15.0), Path::new("/out/c.mp4"), &mut temps)
            .await
            .unwrap();

        assert!(!plan.args.iter().any(|a| a == "-filter_complex"));
        let maps: Vec<&String> = plan
            .args
            .iter()
            .enumerate()
            .filter(|(i, _)| *i > 0 && plan.args[i - 1] == "-map")
            .map(|(_, a)| a)
            .collect();
        assert_eq!(maps, ["0:v", "0:a?"]);
        assert!(plan.args.ends_with(&[
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "veryfast".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "/out/c.mp4".to_string(),
        ]));
    }

    #[tokio::test]
    async fn test_plan_dual_seeks_both_inputs() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let secondary = Path::new("/video/angle2.mp4");
        let asm = assembler(&fonts, &overlay, Some(secondary));
        let mut temps = TempArtifacts::new();

        let plan = asm
            .plan_clip(&clip("c", "Maul", 10.0, 20.0), Path::new("/out/c.mp4"), &mut temps)
            .await
            .unwrap();

        let seeks = plan.args.iter().filter(|a| *a == "-ss").count();
        assert_eq!(seeks, 2);
        assert!(plan.args.iter().any(|a| a == "/video/angle2.mp4"));
        assert!(plan.args.iter().any(|a| a == "-filter_complex"));
        assert!(plan.args.iter().any(|a| a.contains("hstack=inputs=2")));
    }

    #[tokio::test]
    async fn test_plan_caption_lines_flow_into_graph() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig {
            enabled: true,
            ..OverlayConfig::default()
        };
        let asm = assembler(&fonts, &overlay, None);
        let mut temps = TempArtifacts::new();

        let mut c = clip("c", "Scrum", 0.0, 10.0);
        c.labels = vec![ClipLabel {
            group: "Outcome".to_string(),
            name: "Won".to_string(),
        }];
        let plan = asm
            .plan_clip(&c, Path::new("/out/c.mp4"), &mut temps)
            .await
            .unwrap();

        let graph_pos = plan
            .args
            .iter()
            .position(|a| a == "-filter_complex")
            .unwrap();
        let graph = &plan.args[graph_pos + 1];
        assert!(graph.contains("drawbox="));
        assert!(graph.contains("text='#1 Scrum'"));
        assert!(graph.contains(r"text='Outcome\: Won'"));
    }

    #[test]
    fn test_output_file_names() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let mut asm = assembler(&fonts, &overlay, None);
        asm.output_file_name = Some("final.mp4");

        let c = clip("c", "Scrum Won", 9.6, 20.4);
        assert_eq!(asm.combined_file_name(), "final.mp4");
        assert_eq!(asm.instance_file_name(&c), "final_Scrum_Won_1_10-20.mp4");
        assert_eq!(asm.row_file_name("Scrum Won"), "final_Scrum_Won_row.mp4");

        asm.output_file_name = None;
        assert!(asm.combined_file_name().starts_with("combined_"));
        assert!(asm.combined_file_name().ends_with(".mp4"));
    }

    #[test]
    fn test_dual_suffix_in_names() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let secondary = Path::new("/video/angle2.mp4");
        let asm = assembler(&fonts, &overlay, Some(secondary));

        let c = clip("c", "Try", 0.0, 8.0);
        assert_eq!(asm.instance_file_name(&c), "Try_1_0-8_dual.mp4");
        assert_eq!(asm.row_file_name("Try"), "Try_row_dual.mp4");
    }

    #[tokio::test]
    async fn test_concat_list_escapes_quotes_and_is_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("it's.mp4");
        let mut temps = TempArtifacts::new();

        let list = write_concat_list(&[odd.clone()], &mut temps).await.unwrap();
        let content = std::fs::read_to_string(&list).unwrap();
        assert!(content.contains(r"it'\''s.mp4"));
        assert!(content.starts_with("file '"));

        temps.sweep().await;
        assert!(!list.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_single_mode_drains_render_temps_after_concat() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let dir = tempfile::tempdir().unwrap();
        // /bin/true stands in for ffmpeg: every invocation "succeeds".
        let asm = assembler(&fonts, &overlay, None);
        let mut temps = TempArtifacts::new();

        let clips = vec![clip("b", "Try", 20.0, 30.0), clip("a", "Try", 0.0, 10.0)];
        asm.run(&clips, ExportMode::Single, dir.path(), &mut temps)
            .await
            .unwrap();

        // Renders and the concat list were all removed eagerly.
        assert!(temps.tracked_paths().is_empty());
    }

    #[tokio::test]
    async fn test_plan_dual_scales_secondary_annotation_to_secondary_frame() {
        // 1x1 transparent PNG.
        const PNG_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let secondary = Path::new("/video/angle2.mp4");
        let mut asm = assembler(&fonts, &overlay, Some(secondary));
        asm.secondary_frame = FrameSize {
            width: 1280,
            height: 720,
        };
        let mut temps = TempArtifacts::new();

        let mut c = clip("c", "Ruck", 0.0, 10.0);
        c.annotation_png_secondary = Some(PNG_URL.to_string());
        let plan = asm
            .plan_clip(&c, Path::new("/out/c.mp4"), &mut temps)
            .await
            .unwrap();

        let graph_pos = plan
            .args
            .iter()
            .position(|a| a == "-filter_complex")
            .unwrap();
        // The annotation matches the secondary stream's own dimensions,
        // not the primary's.
        assert!(plan.args[graph_pos + 1].contains("scale=1280:720"));
        temps.sweep().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_per_row_mode_writes_one_output_per_action_group() {
        use std::os::unix::fs::PermissionsExt;

        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("out");
        std::fs::create_dir(&out_dir).unwrap();

        // Stand-in transcoder that creates its output (the last
        // argument), so concat results actually land on disk.
        let fake = dir.path().join("fake-ffmpeg");
        std::fs::write(&fake, "#!/bin/sh\nfor last; do :; done\n: > \"$last\"\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut asm = assembler(&fonts, &overlay, None);
        asm.ffmpeg = &fake;
        let mut temps = TempArtifacts::new();

        let clips = vec![
            clip("a", "Scrum", 0.0, 10.0),
            clip("b", "Lineout", 20.0, 30.0),
            clip("c", "Scrum", 40.0, 50.0),
        ];
        asm.run(&clips, ExportMode::PerRow, &out_dir, &mut temps)
            .await
            .unwrap();

        assert!(out_dir.join("Scrum_row.mp4").exists());
        assert!(out_dir.join("Lineout_row.mp4").exists());
        // Each group's render temps and concat list were removed as soon
        // as the group's concat finished.
        assert!(temps.tracked_paths().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_render_leaves_temps_for_final_sweep() {
        let fonts = FontPaths::default();
        let overlay = OverlayConfig::default();
        let dir = tempfile::tempdir().unwrap();
        let mut asm = assembler(&fonts, &overlay, None);
        asm.ffmpeg = Path::new("/bin/false");
        let mut temps = TempArtifacts::new();

        let clips = vec![clip("a", "Try", 0.0, 10.0)];
        let err = asm
            .run(&clips, ExportMode::Single, dir.path(), &mut temps)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            matchcut_common::MatchcutError::ExternalProcess { .. }
        ));
        // The failed clip's render temp stays tracked for the caller's
        // final sweep.
        assert_eq!(temps.tracked_paths().len(), 1);
        assert_eq!(temps.sweep().await, 1);
    }
}

//! Typed ffmpeg filter graph construction.
//!
//! The graph is held as an ordered list of typed steps (labeled inputs,
//! filter body, labeled outputs) and serialized once into
//! `-filter_complex` syntax. Keeping the structure typed lets tests
//! assert on step ordering and label wiring without string matching.

use std::path::PathBuf;

use crate::overlay::OverlayLine;
use crate::textsafe::{
    caption_box_height, escape_filter_text, line_style, rendered_line_count,
    CAPTION_FIRST_LINE_OFFSET, CAPTION_LINE_STEP,
};

/// Minimum duration passed to the transcoder for any clip.
pub const MIN_CLIP_DURATION_SECS: f64 = 0.5;

/// One filter-graph clause: `[in..]body[out..]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStep {
    pub inputs: Vec<String>,
    pub body: String,
    pub outputs: Vec<String>,
}

impl FilterStep {
    pub fn new(
        inputs: impl IntoIterator<Item = impl Into<String>>,
        body: impl Into<String>,
        outputs: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            body: body.into(),
            outputs: outputs.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered filter steps for one transcoder invocation.
#[derive(Debug, Clone, Default)]
pub struct FilterGraph {
    pub steps: Vec<FilterStep>,
}

impl FilterGraph {
    pub fn push(&mut self, step: FilterStep) {
        self.steps.push(step);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Render the graph in ffmpeg `-filter_complex` syntax:
    /// `;`-separated clauses of `[in..]body[out..]`.
    pub fn serialize(&self) -> String {
        self.steps
            .iter()
            .map(|step| {
                let mut clause = String::new();
                for input in &step.inputs {
                    clause.push('[');
                    clause.push_str(input);
                    clause.push(']');
                }
                clause.push_str(&step.body);
                for output in &step.outputs {
                    clause.push('[');
                    clause.push_str(output);
                    clause.push(']');
                }
                clause
            })
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Verify label wiring: every non-stream input label must have been
    /// produced by an earlier step and is consumed at most once.
    ///
    /// Stream specifiers like `0:v` pass through untouched.
    pub fn check_structure(&self) -> Result<(), String> {
        let mut available: Vec<&str> = Vec::new();
        for (idx, step) in self.steps.iter().enumerate() {
            for input in &step.inputs {
                if input.contains(':') {
                    continue;
                }
                match available.iter().position(|label| label == input) {
                    Some(pos) => {
                        available.remove(pos);
                    }
                    None => {
                        return Err(format!(
                            "step {idx} consumes unbound label [{input}]"
                        ));
                    }
                }
            }
            for output in &step.outputs {
                if available.iter().any(|label| label == output) {
                    return Err(format!("step {idx} rebinds live label [{output}]"));
                }
                available.push(output);
            }
        }
        Ok(())
    }
}

/// Seek and duration arguments for the transcoder input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipTiming {
    pub seek_secs: f64,
    pub duration_secs: f64,
}

impl ClipTiming {
    /// Timing for a `[start, end]` segment: seek floored at zero,
    /// duration floored at [`MIN_CLIP_DURATION_SECS`].
    pub fn for_range(start_time: f64, end_time: f64) -> Self {
        Self {
            seek_secs: start_time.max(0.0),
            duration_secs: (end_time - start_time).max(MIN_CLIP_DURATION_SECS),
        }
    }
}

/// Resolved freeze-frame effect: hold the frame at `at` (clip-relative
/// seconds) for `hold` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreezeWindow {
    pub at: f64,
    pub hold: f64,
}

impl FreezeWindow {
    /// Resolve a clip's freeze parameters. The effect is active only
    /// when a position is present and the duration is strictly
    /// positive; the position is clamped into `[0, clip_duration]`.
    pub fn resolve(
        freeze_at: Option<f64>,
        freeze_duration: Option<f64>,
        clip_duration: f64,
    ) -> Option<Self> {
        let at = freeze_at?;
        let hold = freeze_duration.unwrap_or(0.0);
        if hold <= 0.0 {
            return None;
        }
        Some(Self {
            at: at.clamp(0.0, clip_duration),
            hold,
        })
    }

    pub fn end(&self) -> f64 {
        self.at + self.hold
    }
}

/// Probed output frame size of the base video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Fallback when probing is unavailable.
    pub const FALLBACK: FrameSize = FrameSize {
        width: 1920,
        height: 1080,
    };
}

/// Best-effort font lookup result, bold and regular weights.
#[derive(Debug, Clone, Default)]
pub struct FontPaths {
    pub bold: Option<PathBuf>,
    pub regular: Option<PathBuf>,
}

impl FontPaths {
    fn for_line(&self, is_bold: bool) -> Option<&PathBuf> {
        if is_bold {
            self.bold.as_ref().or(self.regular.as_ref())
        } else {
            self.regular.as_ref()
        }
    }
}

/// Caption branch input: composed (already wrapped) lines plus fonts.
#[derive(Debug, Clone)]
pub struct CaptionBlock<'a> {
    pub lines: &'a [OverlayLine],
    pub fonts: &'a FontPaths,
}

/// Inputs for the single-angle graph builder.
#[derive(Debug, Clone)]
pub struct SingleAngleParams<'a> {
    pub freeze: Option<FreezeWindow>,
    /// Transcoder input index of the annotation image, when present.
    pub annotation_input: Option<usize>,
    /// Caption branch; `None` when overlay is disabled or empty.
    pub caption: Option<CaptionBlock<'a>>,
    pub frame: FrameSize,
}

/// Inputs for the dual-angle graph builder. The primary source is
/// transcoder input 0 and the secondary input 1.
#[derive(Debug, Clone)]
pub struct DualAngleParams<'a> {
    pub freeze: Option<FreezeWindow>,
    pub annotation_primary_input: Option<usize>,
    pub annotation_secondary_input: Option<usize>,
    pub caption: Option<CaptionBlock<'a>>,
    /// Frame size of the primary source.
    pub frame: FrameSize,
    /// Frame size of the secondary source. Its annotation must match
    /// the secondary stream, which keeps its own dimensions until the
    /// pre-stack scale.
    pub secondary_frame: FrameSize,
}

/// A built graph plus the stream-map directives for the output.
#[derive(Debug, Clone)]
pub struct BuiltGraph {
    pub graph: FilterGraph,
    /// `-map` argument for video: a `[label]` when filter steps exist,
    /// the raw input view otherwise.
    pub video_map: String,
    /// `-map` argument for audio: the freeze-branch label when used,
    /// else the optional raw audio track.
    pub audio_map: String,
}

/// Build the filter graph for one single-angle clip render.
///
/// Step order: freeze branch, annotation overlay, caption branch. Each
/// branch is skipped entirely when its inputs are absent.
pub fn build_single_angle_graph(params: &SingleAngleParams<'_>) -> BuiltGraph {
    let mut graph = FilterGraph::default();

    let mut video = "0:v".to_string();
    let mut audio_map = "0:a?".to_string();

    if let Some(freeze) = &params.freeze {
        video = push_freeze_video(&mut graph, &video, freeze, "");
        audio_map = format!("[{}]", push_freeze_audio(&mut graph, "0:a", freeze, ""));
    }

    if let Some(ann_input) = params.annotation_input {
        video = push_annotation_overlay(
            &mut graph,
            &video,
            ann_input,
            params.frame,
            params.freeze.as_ref(),
            "",
        );
    }

    if let Some(caption) = &params.caption {
        if !caption.lines.is_empty() {
            video = push_caption_steps(&mut graph, &video, caption);
        }
    }

    let video_map = if graph.is_empty() {
        "0:v".to_string()
    } else {
        format!("[{video}]")
    };

    BuiltGraph {
        graph,
        video_map,
        audio_map,
    }
}

/// Build the filter graph for one dual-angle clip render.
///
/// The freeze branch applies independently to both videos and to the
/// primary audio only; each angle takes its own annotation overlay; the
/// secondary is scaled to the primary's height and the two are
/// horizontally stacked before the shared caption branch.
pub fn build_dual_angle_graph(params: &DualAngleParams<'_>) -> BuiltGraph {
    let mut graph = FilterGraph::default();

    let mut primary = "0:v".to_string();
    let mut secondary = "1:v".to_string();
    let mut audio_map = "0:a?".to_string();

    if let Some(freeze) = &params.freeze {
        primary = push_freeze_video(&mut graph, &primary, freeze, "a1");
        secondary = push_freeze_video(&mut graph, &secondary, freeze, "a2");
        audio_map = format!("[{}]", push_freeze_audio(&mut graph, "0:a", freeze, "a1"));
    }

    if let Some(ann_input) = params.annotation_primary_input {
        primary = push_annotation_overlay(
            &mut graph,
            &primary,
            ann_input,
            params.frame,
            params.freeze.as_ref(),
            "a1",
        );
    }
    if let Some(ann_input) = params.annotation_secondary_input {
        secondary = push_annotation_overlay(
            &mut graph,
            &secondary,
            ann_input,
            params.secondary_frame,
            params.freeze.as_ref(),
            "a2",
        );
    }

    // hstack requires matching heights; follow the primary angle.
    graph.push(FilterStep::new(
        [secondary.as_str()],
        format!("scale=-2:{}", params.frame.height),
        ["v_a2_scaled"],
    ));
    graph.push(FilterStep::new(
        [primary.as_str(), "v_a2_scaled"],
        "hstack=inputs=2",
        ["v_stack"],
    ));

    let mut video = "v_stack".to_string();
    match &params.caption {
        Some(caption) if !caption.lines.is_empty() => {
            video = push_caption_steps(&mut graph, &video, caption);
        }
        _ => {
            // Explicit rename keeps downstream mapping uniform.
            graph.push(FilterStep::new(["v_stack"], "null", ["v_out"]));
            video = "v_out".to_string();
        }
    }

    BuiltGraph {
        graph,
        video_map: format!("[{video}]"),
        audio_map,
    }
}

/// Freeze the video stream: split at the freeze point, re-baseline both
/// segments, clone-pad the pre-segment, concat back together.
fn push_freeze_video(
    graph: &mut FilterGraph,
    source: &str,
    freeze: &FreezeWindow,
    tag: &str,
) -> String {
    let pre_src = format!("v{tag}_pre_src");
    let post_src = format!("v{tag}_post_src");
    let pre = format!("v{tag}_pre");
    let post = format!("v{tag}_post");
    let hold = format!("v{tag}_hold");
    let out = format!("v{tag}_freeze");

    graph.push(FilterStep::new(
        [source],
        "split=2",
        [pre_src.as_str(), post_src.as_str()],
    ));
    graph.push(FilterStep::new(
        [pre_src.as_str()],
        format!("trim=end={:.3},setpts=PTS-STARTPTS", freeze.at),
        [pre.as_str()],
    ));
    graph.push(FilterStep::new(
        [post_src.as_str()],
        format!("trim=start={:.3},setpts=PTS-STARTPTS", freeze.at),
        [post.as_str()],
    ));
    graph.push(FilterStep::new(
        [pre.as_str()],
        format!("tpad=stop_mode=clone:stop_duration={:.3}", freeze.hold),
        [hold.as_str()],
    ));
    graph.push(FilterStep::new(
        [hold.as_str(), post.as_str()],
        "concat=n=2:v=1:a=0",
        [out.as_str()],
    ));
    out
}

/// Mirror of the video freeze on the audio stream, padding the held
/// window with silence.
fn push_freeze_audio(
    graph: &mut FilterGraph,
    source: &str,
    freeze: &FreezeWindow,
    tag: &str,
) -> String {
    let pre_src = format!("a{tag}_pre_src");
    let post_src = format!("a{tag}_post_src");
    let pre = format!("a{tag}_pre");
    let post = format!("a{tag}_post");
    let hold = format!("a{tag}_hold");
    let out = format!("a{tag}_freeze");

    graph.push(FilterStep::new(
        [source],
        "asplit=2",
        [pre_src.as_str(), post_src.as_str()],
    ));
    graph.push(FilterStep::new(
        [pre_src.as_str()],
        format!("atrim=end={:.3},asetpts=PTS-STARTPTS", freeze.at),
        [pre.as_str()],
    ));
    graph.push(FilterStep::new(
        [post_src.as_str()],
        format!("atrim=start={:.3},asetpts=PTS-STARTPTS", freeze.at),
        [post.as_str()],
    ));
    graph.push(FilterStep::new(
        [pre.as_str()],
        format!("apad=pad_dur={:.3}", freeze.hold),
        [hold.as_str()],
    ));
    graph.push(FilterStep::new(
        [hold.as_str(), post.as_str()],
        "concat=n=2:v=0:a=1",
        [out.as_str()],
    ));
    out
}

/// Composite one annotation image over the base video. When a freeze is
/// active the overlay is visible only during the held window.
fn push_annotation_overlay(
    graph: &mut FilterGraph,
    base: &str,
    annotation_input: usize,
    frame: FrameSize,
    freeze: Option<&FreezeWindow>,
    tag: &str,
) -> String {
    let ann = format!("ann{tag}");
    let out = format!("v{tag}_ann");

    graph.push(FilterStep::new(
        [format!("{annotation_input}:v")],
        format!("format=rgba,scale={}:{}", frame.width, frame.height),
        [ann.as_str()],
    ));

    let enable = freeze
        .map(|f| format!(":enable='between(t,{:.3},{:.3})'", f.at, f.end()))
        .unwrap_or_default();

    graph.push(FilterStep::new(
        [base, ann.as_str()],
        format!("overlay=0:0{enable}"),
        [out.as_str()],
    ));
    out
}

/// Caption branch: background box, then one drawtext per caption line,
/// first line anchored near the bottom and subsequent lines stacked
/// upward.
fn push_caption_steps(graph: &mut FilterGraph, base: &str, caption: &CaptionBlock<'_>) -> String {
    let box_height = caption_box_height(caption.lines);

    graph.push(FilterStep::new(
        [base],
        format!("drawbox=x=0:y=ih-{box_height}:w=iw:h={box_height}:color=black@0.55:t=fill"),
        ["v_cap0"],
    ));

    let mut current = "v_cap0".to_string();
    let mut offset = CAPTION_FIRST_LINE_OFFSET;

    for (idx, line) in caption.lines.iter().enumerate() {
        let style = line_style(idx);
        let text = escape_filter_text(&line.text);
        let mut body = format!(
            "drawtext=text='{text}':fontsize={}:fontcolor={}:x=24:y=h-{offset}",
            style.font_size, style.color
        );
        if let Some(font) = caption.fonts.for_line(line.is_bold) {
            body.push_str(&format!(
                ":fontfile='{}'",
                escape_filter_text(&font.display().to_string())
            ));
        }

        let next = format!("v_cap{}", idx + 1);
        graph.push(FilterStep::new(
            [current.as_str()],
            body,
            [next.as_str()],
        ));
        current = next;
        offset += CAPTION_LINE_STEP * rendered_line_count(&line.text) as u32;
    }

    current
}

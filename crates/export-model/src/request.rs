//! Export request payload and result types.
//!
//! The request arrives as camelCase JSON from the tagging UI and is
//! immutable for the duration of one export.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One export action from the UI: which clips, which sources, how to
/// group the outputs, and what to burn into the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Primary (angle 1) source video.
    pub source_path: PathBuf,

    /// Secondary (angle 2) source video, when a second camera exists.
    #[serde(default)]
    pub source_path2: Option<PathBuf>,

    /// Whether the user asked for a single- or dual-angle composition.
    #[serde(default)]
    pub mode: CompositionMode,

    /// How the clips are grouped into output files.
    #[serde(default)]
    pub export_mode: ExportMode,

    /// Which camera angle(s) to draw from.
    #[serde(default)]
    pub angle_option: AngleOption,

    /// Destination directory. When absent the caller is prompted.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// File name for `single` mode output; also the prefix stem for the
    /// other modes.
    #[serde(default)]
    pub output_file_name: Option<String>,

    /// Tagged segments to export.
    pub clips: Vec<ClipSpec>,

    /// Burned-in caption configuration.
    #[serde(default)]
    pub overlay: OverlayConfig,
}

/// Single- vs dual-angle composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    #[default]
    Single,
    Dual,
}

/// Output grouping: one combined file, one file per clip, or one file
/// per action row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExportMode {
    #[default]
    Single,
    PerInstance,
    PerRow,
}

/// Which camera angle(s) the export draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleOption {
    /// Both angles when a secondary source exists; primary otherwise.
    #[default]
    All,
    Angle1,
    Angle2,
}

/// One tagged segment on the match timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSpec {
    /// Stable identifier assigned by the tagging UI.
    pub id: String,

    /// Action name the analyst tagged (e.g. "Scrum").
    pub action_name: String,

    /// Segment start, seconds from the start of the source.
    pub start_time: f64,

    /// Segment end, seconds from the start of the source.
    pub end_time: f64,

    /// Freeze-frame position, seconds within the clip.
    #[serde(default)]
    pub freeze_at: Option<f64>,

    /// Freeze-frame hold duration in seconds; the effect is active only
    /// when strictly positive.
    #[serde(default)]
    pub freeze_duration: Option<f64>,

    /// Labels attached to the tagged event.
    #[serde(default)]
    pub labels: Vec<ClipLabel>,

    /// Free-text memo.
    #[serde(default)]
    pub memo: Option<String>,

    /// 1-based occurrence index of this action.
    #[serde(default)]
    pub action_index: Option<u32>,

    /// Telestration image for the primary angle (`data:<mime>;base64,..`).
    #[serde(default)]
    pub annotation_png_primary: Option<String>,

    /// Telestration image for the secondary angle.
    #[serde(default)]
    pub annotation_png_secondary: Option<String>,
}

impl ClipSpec {
    /// Nominal clip duration in seconds. May be negative for an
    /// inverted range; validation rejects those before rendering.
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// A grouped label on a tagged event, e.g. group "Outcome", name "Won".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipLabel {
    #[serde(default)]
    pub group: String,
    pub name: String,
}

/// Burned-in caption configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    /// Master switch; when false no caption steps are emitted.
    pub enabled: bool,

    pub show_action_name: bool,
    pub show_action_index: bool,
    pub show_labels: bool,
    pub show_memo: bool,

    /// Optional template for the headline caption line. Placeholders
    /// `{actionName}`, `{actionIndex}`, `{labels}`, and `{memo}` are
    /// resolved against the clip; when non-empty the rendered template
    /// replaces the default name line.
    #[serde(default)]
    pub text_template: Option<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            show_action_name: true,
            show_action_index: true,
            show_labels: true,
            show_memo: true,
            text_template: None,
        }
    }
}

/// The only value returned across the public export boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,

    /// Human-readable failure message; present only when `success` is
    /// false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

//! Matchcut Clip Core — export planning
//!
//! Turns tagged segments plus overlay options into the data the export
//! engine feeds to ffmpeg:
//! - **Overlay composition:** clip + overlay flags → ordered caption lines
//! - **Text layout:** word wrap, filter-text escaping, caption box sizing
//! - **Filter graphs:** typed step sequences for freeze, annotation,
//!   caption, and dual-angle stacking
//! - **Grouping:** start-time ordering and per-action grouping
//!
//! This crate is pure computation — no I/O, no process handling.
//! All inputs are data; all outputs are data.

pub mod graph;
pub mod group;
pub mod overlay;
pub mod textsafe;

pub use graph::{
    build_dual_angle_graph, build_single_angle_graph, BuiltGraph, CaptionBlock, ClipTiming,
    DualAngleParams, FilterGraph, FilterStep, FontPaths, FrameSize, FreezeWindow,
    SingleAngleParams, MIN_CLIP_DURATION_SECS,
};
pub use group::{group_by_action, sanitize_action_name, sort_by_start_time};
pub use overlay::{compose_overlay_lines, OverlayLine};

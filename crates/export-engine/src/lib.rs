//! Matchcut Export Engine
//!
//! Effectful half of the export pipeline: materializes annotation
//! images, orchestrates the external ffmpeg transcoder, sequences
//! per-mode renders and concatenation, and guarantees cleanup of every
//! temporary artifact on success and failure paths alike.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ExportRequest ──┐
//!                 ├── validate / resolve sources & output dir
//! annotations ────┤         │
//!                 │         ├── per-clip filter graph (clip-core)
//! probed frame ───┘         │
//!                           ├── ffmpeg render (one process at a time)
//!                           │
//!                           ├── concat (single / perRow modes)
//!                           ▼
//!                    temp sweep → ExportResult
//! ```

pub mod annotate;
pub mod assemble;
pub mod export;
pub mod fonts;
pub mod probe;
pub mod runner;
pub mod temp;

pub use assemble::{AnnotationAngle, ClipAssembler, ClipInvocation};
pub use export::{
    export_clips, resolve_sources, ExportContext, FixedOutputDir, NoOutputDir, OutputDirResolver,
    ResolvedSources,
};
pub use fonts::{resolve_fonts, FontResolver, PlatformFontResolver};
pub use temp::{ArtifactKind, TempArtifacts};

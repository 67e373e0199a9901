//! Matchcut Export Model
//!
//! The data contract between the UI collaborator and the export core:
//! one [`ExportRequest`] in, one [`ExportResult`] out. Everything here
//! is plain data; no I/O, no process handling.

pub mod request;

pub use request::*;

//! Shared leaf types for the opsview display console.
//!
//! This crate holds everything the display engine and a hosting application
//! need to agree on: the parsed markup document model, color values, live
//! parameter sample records, the error taxonomy, and the console
//! configuration file. It has no dependency on the engine crate.

pub mod color;
pub mod config;
pub mod error;
pub mod markup;
pub mod sample;

pub use color::Color;
pub use error::MarkupError;
pub use markup::{parse_markup, MarkupDocument, NodeId, NodeRef};
pub use sample::{AcquisitionStatus, MonitoringResult, ParameterSample, Sample, Value};

//! Display rendering and live data-binding engine.
//!
//! Pipeline: markup text → [`opsview_model::MarkupDocument`] →
//! [`Display::parse_and_draw`] (widget tree + trigger index) → inbound
//! parameter samples → [`Display::process_parameter_samples`] (dispatch) →
//! [`Display::digest`] (redraw dirty widgets) → scene/SVG mutation.
//!
//! Everything is synchronous and single-threaded; the host's event loop
//! calls dispatch per delivery and digest on a fixed cadence.

pub mod binding;
pub mod buffer;
pub mod commands;
pub mod display;
pub mod frame;
pub mod numfmt;
pub mod resource;
pub mod scene;
pub mod style;
pub mod symbol;
pub mod widgets;

pub use display::{ComputationDef, Display};
pub use frame::{DisplayFrame, FrameId, FrameStack};
pub use resource::{DirectoryResolver, ResourceResolver};

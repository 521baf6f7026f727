//! Depthdrift turns a single still photograph plus a per-pixel depth estimate into a short
//! clip with a synthetic parallax ("2.5D") effect: regions estimated as closer to the camera
//! shift more than distant regions as a virtual camera eases through a small diagonal sweep.
//!
//! The pipeline is:
//!
//! - normalize a raw depth grid into a [`DepthMap`] and invert it (closer moves more)
//! - per frame, derive eased shift magnitudes ([`shifts_for_frame`])
//! - rebuild a [`DisplacementField`] of absolute sampling coordinates
//! - [`resample`](warp::resample) the source photo through the field (bilinear, reflect border)
//! - stream frames in timeline order into a [`FrameSink`]
//!
//! Depth estimation and video encoding stay outside the core: depth enters through the
//! [`DepthEstimator`] trait, frames leave through [`FrameSink`] (the built-in
//! [`FfmpegSink`] pipes raw rgb24 into a system `ffmpeg`).
#![forbid(unsafe_code)]

mod foundation;

pub mod depth;
/// Frame sinks (ordered frame consumers, MP4 output via system `ffmpeg`).
pub mod encode;
pub mod field;
pub mod motion;
pub mod session;
pub mod warp;

pub use crate::depth::{DepthEstimator, DepthMap, GrayImageDepth, normalize_depth};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::field::DisplacementField;
pub use crate::foundation::core::{Fps, FrameIndex};
pub use crate::foundation::error::{DriftError, DriftResult};
pub use crate::foundation::frame::FrameRgb;
pub use crate::foundation::grid::ScalarGrid;
pub use crate::motion::{MotionParams, VERTICAL_SHIFT_RATIO, shifts_for_frame};
pub use crate::session::{ParallaxSession, SessionOpts, SessionStats};

//! Thumbnail generation for img10.
//!
//! Two layers:
//!
//! - [`plan`] - pure integer geometry mapping a source size and a
//!   [`ThumbnailSpec`](img10_core::ThumbnailSpec) onto resize, crop and pad
//!   steps
//! - [`ThumbnailGenerator`] - a [`Renderer`] that decodes with the `image`
//!   crate, applies the plan with Lanczos3 resampling and encodes the result
//!
//! # Example
//!
//! ```
//! use img10_core::{FitMode, OutputFormat, ThumbnailSpec};
//! use img10_thumbnail::plan;
//!
//! let spec = ThumbnailSpec::new(200, 200, FitMode::Crop, OutputFormat::Jpeg);
//! let plan = plan(4000, 3000, &spec, false, false);
//! assert_eq!(plan.output(), (200, 200));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod generator;
mod geometry;

pub use generator::{
    GeneratorConfig, Renderer, Rendition, ThumbnailGenerator, probe_dimensions, render_async,
};
pub use geometry::{CropWindow, Padding, RenderPlan, plan};

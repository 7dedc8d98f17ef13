//! Pure integer geometry for fit modes.
//!
//! All sizes are rounded down to whole pixels and never drop below one.

use img10_core::{FitMode, ThumbnailSpec};

/// Rectangle in pixel coordinates of the resized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Window width
    pub width: u32,
    /// Window height
    pub height: u32,
}

/// Placement of the resized image on a padded canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    /// Canvas width
    pub canvas_width: u32,
    /// Canvas height
    pub canvas_height: u32,
    /// Left offset of the image on the canvas
    pub x: u32,
    /// Top offset of the image on the canvas
    pub y: u32,
}

/// Steps that turn a source of known size into a rendition.
///
/// Applied in order: resize to `resize`, then `crop`, then `pad`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPlan {
    /// Size after resampling
    pub resize: (u32, u32),
    /// Centre crop applied after resampling
    pub crop: Option<CropWindow>,
    /// Canvas the result is placed on
    pub pad: Option<Padding>,
}

impl RenderPlan {
    /// Dimensions of the final rendition.
    pub fn output(&self) -> (u32, u32) {
        if let Some(pad) = self.pad {
            (pad.canvas_width, pad.canvas_height)
        } else if let Some(crop) = self.crop {
            (crop.width, crop.height)
        } else {
            self.resize
        }
    }

    /// Whether the source must be resampled at all.
    pub fn resamples(&self, source: (u32, u32)) -> bool {
        self.resize != source
    }
}

/// `value * num / den`, rounded down, at least one.
fn scale_floor(value: u32, num: u32, den: u32) -> u32 {
    let scaled = u64::from(value) * u64::from(num) / u64::from(den.max(1));
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

/// Plan a rendition of a `src_width×src_height` source.
///
/// - `contain` fits the source inside the target box; the limiting edge
///   equals its bound. With `pad`, the result is centred on a canvas of
///   exactly the target size.
/// - `crop` covers the target box and centre-crops to it.
///
/// Without `allow_upscale` a source that already fits is kept at native
/// size, and `crop` clamps its window to the source.
///
/// The spec is assumed valid (non-zero target dimensions).
pub fn plan(
    src_width: u32,
    src_height: u32,
    spec: &ThumbnailSpec,
    allow_upscale: bool,
    pad: bool,
) -> RenderPlan {
    let (sw, sh) = (src_width.max(1), src_height.max(1));
    let (tw, th) = ((*spec.width()).max(1), (*spec.height()).max(1));

    match spec.fit() {
        FitMode::Contain => {
            let fits = sw <= tw && sh <= th;
            let resize = if fits && !allow_upscale {
                (sw, sh)
            } else if u64::from(tw) * u64::from(sh) <= u64::from(th) * u64::from(sw) {
                // Width is the limiting edge.
                (tw, scale_floor(sh, tw, sw).min(th))
            } else {
                (scale_floor(sw, th, sh).min(tw), th)
            };

            let pad = pad.then(|| Padding {
                canvas_width: tw,
                canvas_height: th,
                x: (tw - resize.0) / 2,
                y: (th - resize.1) / 2,
            });
            RenderPlan {
                resize,
                crop: None,
                pad,
            }
        }
        FitMode::Crop => {
            let covered = sw >= tw && sh >= th;
            let resize = if !covered && !allow_upscale {
                (sw, sh)
            } else if u64::from(tw) * u64::from(sh) >= u64::from(th) * u64::from(sw) {
                // Width ratio dominates: match width, overflow height.
                (tw, scale_floor(sh, tw, sw).max(th))
            } else {
                (scale_floor(sw, th, sh).max(tw), th)
            };

            let width = tw.min(resize.0);
            let height = th.min(resize.1);
            RenderPlan {
                resize,
                crop: Some(CropWindow {
                    x: (resize.0 - width) / 2,
                    y: (resize.1 - height) / 2,
                    width,
                    height,
                }),
                pad: None,
            }
        }
    }
}

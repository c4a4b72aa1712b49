use crate::{CompositionError, Palette};
use image::{imageops, Rgb, RgbImage};
use log::{info, warn};
use palette::Srgb;

/// What to do when the cropped image plus its frame does not fit on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OversizePolicy {
    /// Return [`CompositionError::OversizeComposition`].
    #[default]
    Reject,
    /// Paste anyway and let the canvas edges clip the frame and image.
    Clip,
}

/// A builder struct to specify how an image is placed on the wallpaper canvas.
///
/// # Examples
/// ```
/// # use calframe::{FrameOptions, OversizePolicy};
/// let options = FrameOptions::new()
///     .resolution(1920, 1080)
///     .frame_width(10)
///     .crop(100)
///     .oversize(OversizePolicy::Clip);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameOptions {
    /// Width and height of the canvas.
    resolution: (u32, u32),
    /// Thickness of the frame around the image.
    frame_width: u32,
    /// Total number of pixels to crop from each dimension.
    crop: u32,
    /// Swap the background and frame colors.
    invert: bool,
    /// Handling of compositions larger than the canvas.
    oversize: OversizePolicy,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameOptions {
    /// Creates a new [`FrameOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolution: (2560, 1440),
            frame_width: 10,
            crop: 0,
            invert: false,
            oversize: OversizePolicy::Reject,
        }
    }

    /// Sets the canvas resolution.
    ///
    /// The default is `2560x1440`.
    #[must_use]
    pub const fn resolution(mut self, width: u32, height: u32) -> Self {
        self.resolution = (width, height);
        self
    }

    /// Sets the frame width in pixels.
    ///
    /// The default is `10`.
    #[must_use]
    pub const fn frame_width(mut self, frame_width: u32) -> Self {
        self.frame_width = frame_width;
        self
    }

    /// Sets the crop amount in pixels.
    ///
    /// Half of it, rounded down, is removed from each of the four sides.
    /// Images too tall to fit on the canvas together with their frame get the excess
    /// height, rounded up to an even number, added to this amount.
    ///
    /// The default is `0`.
    #[must_use]
    pub const fn crop(mut self, crop: u32) -> Self {
        self.crop = crop;
        self
    }

    /// Sets whether to paint the background with the darkest palette color
    /// and the frame with the second darkest, instead of the other way around.
    ///
    /// The default is `false`.
    #[must_use]
    pub const fn invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Sets the [`OversizePolicy`].
    ///
    /// The default is [`OversizePolicy::Reject`].
    #[must_use]
    pub const fn oversize(mut self, policy: OversizePolicy) -> Self {
        self.oversize = policy;
        self
    }

    /// Returns the canvas resolution.
    #[must_use]
    pub const fn get_resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Computes where a `width` x `height` source image ends up on the canvas.
    ///
    /// # Errors
    /// - [`CompositionError::ZeroResolution`] if the canvas has a zero side.
    /// - [`CompositionError::CropExceedsImage`] if cropping leaves no pixels.
    /// - [`CompositionError::OversizeComposition`] if the framed image or the square frame
    ///   behind it reaches past the canvas and the policy is [`OversizePolicy::Reject`].
    pub fn layout(&self, width: u32, height: u32) -> Result<Layout, CompositionError> {
        let (canvas_w, canvas_h) = self.resolution;
        if canvas_w == 0 || canvas_h == 0 {
            return Err(CompositionError::ZeroResolution);
        }

        let frame = u64::from(self.frame_width) * 2;

        // crop tall images until the framed height fits, rounding up so the margins stay even
        let excess = (u64::from(height) + frame).saturating_sub(u64::from(canvas_h));
        let excess = u32::try_from(excess + excess % 2).unwrap_or(u32::MAX);
        let crop = self.crop.saturating_add(excess);
        let margin = crop / 2;
        if u64::from(margin) * 2 >= u64::from(width.min(height)) {
            return Err(CompositionError::CropExceedsImage { crop, width, height });
        }
        let cropped = (width - 2 * margin, height - 2 * margin);

        let required_w = u64::from(cropped.0) + frame;
        let required_h = u64::from(cropped.1) + frame;
        // the square frame reaches below the image when the image is wider than tall
        let top = u64::from(canvas_h).saturating_sub(required_h) / 2;
        let bottom = required_h.max(top + required_w);
        if required_w > u64::from(canvas_w) || bottom > u64::from(canvas_h) {
            let saturate = |x: u64| u32::try_from(x).unwrap_or(u32::MAX);
            let required = (saturate(required_w), saturate(bottom));
            match self.oversize {
                OversizePolicy::Reject => {
                    return Err(CompositionError::OversizeComposition {
                        required,
                        canvas: self.resolution,
                    })
                }
                OversizePolicy::Clip => warn!(
                    "framed image of {}x{} is clipped to the {canvas_w}x{canvas_h} canvas",
                    required.0, required.1
                ),
            }
        }

        #[allow(clippy::cast_possible_wrap)]
        let (frame, required_w, required_h) = (frame as i64, required_w as i64, required_h as i64);
        let frame_origin = (
            (i64::from(canvas_w) - required_w).div_euclid(2),
            (i64::from(canvas_h) - required_h).div_euclid(2),
        );

        Ok(Layout {
            margin,
            cropped,
            frame_origin,
            frame_side: required_w,
            image_origin: (frame_origin.0 + frame / 2, frame_origin.1 + frame / 2),
        })
    }
}

/// The placement of a source image on the canvas, as computed by [`FrameOptions::layout`].
///
/// Coordinates are relative to the canvas top left corner and may be negative
/// when the composition is clipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    /// Number of pixels cropped from each side of the source image.
    pub margin: u32,
    /// Width and height of the cropped image.
    pub cropped: (u32, u32),
    /// Top left corner of the frame rectangle.
    pub frame_origin: (i64, i64),
    /// Side of the frame rectangle, which is always square.
    ///
    /// It is the cropped width plus twice the frame width, even for images
    /// whose height differs from their width.
    pub frame_side: i64,
    /// Top left corner of the pasted image.
    pub image_origin: (i64, i64),
}

/// Clamps the half open range `start..start + len` to `0..max`.
fn clip(start: i64, len: i64, max: u32) -> std::ops::Range<u32> {
    let clamp = |x: i64| u32::try_from(x.clamp(0, i64::from(max))).unwrap_or(max);
    clamp(start)..clamp(start.saturating_add(len))
}

fn rgb(color: Srgb<u8>) -> Rgb<u8> {
    Rgb([color.red, color.green, color.blue])
}

/// Composes `image` onto a wallpaper canvas framed with colors from `palette`.
///
/// The canvas is filled with `palette[1]` and a square of `palette[0]` is drawn behind
/// the centered image (the two are swapped if [`FrameOptions::invert`] is set).
/// The returned canvas always has the configured resolution.
///
/// # Errors
/// [`CompositionError::PaletteTooSmall`] if `palette` has fewer than two colors,
/// or any error from [`FrameOptions::layout`].
pub fn compose(
    image: &RgbImage,
    palette: &Palette,
    options: &FrameOptions,
) -> Result<RgbImage, CompositionError> {
    let (frame, background) = match palette.colors() {
        &[dark, light, ..] => {
            if options.invert {
                (light, dark)
            } else {
                (dark, light)
            }
        }
        colors => return Err(CompositionError::PaletteTooSmall { len: colors.len() }),
    };

    let layout = options.layout(image.width(), image.height())?;
    let (canvas_w, canvas_h) = options.resolution;
    info!(
        "composing {}x{} image (cropped to {}x{}) onto {canvas_w}x{canvas_h} canvas",
        image.width(),
        image.height(),
        layout.cropped.0,
        layout.cropped.1
    );

    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, rgb(background));

    let frame = rgb(frame);
    let xs = clip(layout.frame_origin.0, layout.frame_side, canvas_w);
    for y in clip(layout.frame_origin.1, layout.frame_side, canvas_h) {
        for x in xs.clone() {
            canvas.put_pixel(x, y, frame);
        }
    }

    let (width, height) = layout.cropped;
    let cropped = imageops::crop_imm(image, layout.margin, layout.margin, width, height);
    imageops::replace(
        &mut canvas,
        &*cropped,
        layout.image_origin.0,
        layout.image_origin.1,
    );

    Ok(canvas)
}

//! Contains the types and functions for the high level pipeline builder API.

mod frame;
mod palette_pipeline;

pub use frame::{compose, FrameOptions, Layout, OversizePolicy};
pub use palette_pipeline::{thumbnail_dimensions, PaletteExtractor};

use crate::{Error, Palette, PaletteSize};
use image::RgbImage;

/// A builder struct that turns a source image into a framed wallpaper.
///
/// The two frame colors are extracted from the whole, uncropped source image.
/// The palette size of the given [`PaletteExtractor`] is ignored, since composition
/// always uses a two color palette.
///
/// # Examples
/// ```no_run
/// # use calframe::{FrameOptions, WallpaperPipeline};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
///
/// let (palette, wallpaper) = WallpaperPipeline::new()
///     .frame(FrameOptions::new().resolution(1920, 1080).crop(100))
///     .render(&img)?;
///
/// wallpaper.save("wallpaper.png")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WallpaperPipeline {
    /// Palette extraction settings.
    extractor: PaletteExtractor,
    /// Placement settings.
    frame: FrameOptions,
}

impl WallpaperPipeline {
    /// Creates a new [`WallpaperPipeline`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extractor: PaletteExtractor::new().palette_size(PaletteSize::FRAME),
            frame: FrameOptions::new(),
        }
    }

    /// Sets the [`PaletteExtractor`] used to find the frame colors.
    #[must_use]
    pub const fn extractor(mut self, extractor: PaletteExtractor) -> Self {
        self.extractor = extractor.palette_size(PaletteSize::FRAME);
        self
    }

    /// Sets the [`FrameOptions`].
    #[must_use]
    pub const fn frame(mut self, frame: FrameOptions) -> Self {
        self.frame = frame;
        self
    }

    /// Extracts the frame colors from `image` and composes the wallpaper.
    ///
    /// Returns the palette alongside the canvas.
    ///
    /// # Errors
    /// [`Error::Palette`] or [`Error::Composition`] from the respective step.
    pub fn render(&self, image: &RgbImage) -> Result<(Palette, RgbImage), Error> {
        let palette = self.extractor.palette(image)?;
        let canvas = compose(image, &palette, &self.frame)?;
        Ok((palette, canvas))
    }

    /// Same as [`WallpaperPipeline::render`], but extracts the palette in parallel.
    ///
    /// # Errors
    /// Same as [`WallpaperPipeline::render`].
    #[cfg(feature = "threads")]
    pub fn render_par(&self, image: &RgbImage) -> Result<(Palette, RgbImage), Error> {
        let palette = self.extractor.palette_par(image)?;
        let canvas = compose(image, &palette, &self.frame)?;
        Ok((palette, canvas))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{tests::two_tone_image, CompositionError, KmeansOptions, PaletteError};
    use image::Rgb;
    use palette::Srgb;

    fn pipeline() -> WallpaperPipeline {
        WallpaperPipeline::new()
            .extractor(PaletteExtractor::new().kmeans(KmeansOptions::new().seed(4)))
            .frame(FrameOptions::new().resolution(800, 600))
    }

    #[test]
    fn render_two_tone() {
        let img = two_tone_image(200, 100, 50, [30, 30, 30], [180, 160, 140]);
        let (palette, canvas) = pipeline().render(&img).unwrap();

        assert_eq!(palette.colors(), &[Srgb::new(30, 30, 30), Srgb::new(180, 160, 140)]);
        assert_eq!(canvas.dimensions(), (800, 600));
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([180, 160, 140]));
        // frame starts at (290, 240), image at (300, 250)
        assert_eq!(canvas.get_pixel(295, 245), &Rgb([30, 30, 30]));
        assert_eq!(canvas.get_pixel(300, 250), &Rgb([30, 30, 30]));
        assert_eq!(canvas.get_pixel(499, 349), &Rgb([180, 160, 140]));
    }

    #[test]
    fn extractor_palette_size_is_ignored() {
        let img = two_tone_image(20, 20, 10, [0, 0, 0], [255, 255, 255]);
        let extractor = PaletteExtractor::new()
            .palette_size(5.into())
            .kmeans(KmeansOptions::new().seed(0));
        let pipeline = pipeline().extractor(extractor);
        let (palette, _) = pipeline.render(&img).unwrap();
        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn tall_image_renders_with_default_policy() {
        let img = two_tone_image(100, 200, 50, [30, 30, 30], [180, 160, 140]);
        let pipeline = pipeline().frame(FrameOptions::new().resolution(400, 150));
        let (_, canvas) = pipeline.render(&img).unwrap();

        assert_eq!(canvas.dimensions(), (400, 150));
        // cropped to 30x130, frame starts at (175, 0), image at (185, 10)
        assert_eq!(canvas.get_pixel(0, 149), &Rgb([180, 160, 140]));
        assert_eq!(canvas.get_pixel(180, 5), &Rgb([30, 30, 30]));
        assert_eq!(canvas.get_pixel(185, 10), &Rgb([30, 30, 30]));
        assert_eq!(canvas.get_pixel(214, 139), &Rgb([180, 160, 140]));
    }

    #[test]
    fn errors_are_forwarded() {
        let uniform = two_tone_image(20, 20, 10, [9, 9, 9], [9, 9, 9]);
        assert!(matches!(
            pipeline().render(&uniform),
            Err(Error::Palette(PaletteError::InsufficientDistinctColors { requested: 2, available: 1 }))
        ));

        let img = two_tone_image(40, 10, 20, [0, 0, 0], [255, 255, 255]);
        let pipeline = pipeline().frame(FrameOptions::new().resolution(30, 30));
        assert!(matches!(
            pipeline.render(&img),
            Err(Error::Composition(CompositionError::OversizeComposition { .. }))
        ));
    }

    #[test]
    #[cfg(feature = "threads")]
    fn single_and_multi_threaded_match() {
        let img = crate::tests::noise_image(120, 90);
        let pipeline = pipeline();
        let (palette, canvas) = pipeline.render(&img).unwrap();
        let (palette_par, canvas_par) = pipeline.render_par(&img).unwrap();
        assert_eq!(palette, palette_par);
        assert_eq!(canvas, canvas_par);
    }
}

use crate::{
    kmeans, KmeansOptions, Palette, PaletteError, PaletteSize, UniqueColorCounts,
    MAX_THUMBNAIL_SIDE,
};
use image::{imageops, RgbImage};
use log::info;
use std::borrow::Cow;

/// A builder struct to extract a palette of representative colors from an image.
///
/// The image is first shrunk so that neither side exceeds
/// [`thumbnail_side`](PaletteExtractor::thumbnail_side) pixels, its pixels are deduplicated
/// into weighted colors, and weighted k-means reduces those to the palette.
///
/// # Examples
/// ```no_run
/// # use calframe::{KmeansOptions, PaletteExtractor};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
///
/// let palette = PaletteExtractor::new()
///     .palette_size(2.into())
///     .kmeans(KmeansOptions::new().seed(7))
///     .palette(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteExtractor {
    /// The number of colors to extract.
    k: PaletteSize,
    /// The longest allowed side of the working image.
    thumbnail_side: u32,
    /// Options passed on to k-means.
    kmeans: KmeansOptions,
}

impl Default for PaletteExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteExtractor {
    /// Creates a new [`PaletteExtractor`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            k: PaletteSize::from_u8(3),
            thumbnail_side: MAX_THUMBNAIL_SIDE,
            kmeans: KmeansOptions::new(),
        }
    }

    /// Sets the number of colors in the palette.
    ///
    /// The default is `3`.
    #[must_use]
    pub const fn palette_size(mut self, size: PaletteSize) -> Self {
        self.k = size;
        self
    }

    /// Sets the longest side of the working image.
    ///
    /// The default is [`MAX_THUMBNAIL_SIDE`]. Smaller images are never enlarged.
    #[must_use]
    pub const fn thumbnail_side(mut self, side: u32) -> Self {
        self.thumbnail_side = side;
        self
    }

    /// Sets the k-means options.
    #[must_use]
    pub const fn kmeans(mut self, options: KmeansOptions) -> Self {
        self.kmeans = options;
        self
    }

    /// Returns the configured palette size.
    #[must_use]
    pub const fn get_palette_size(&self) -> PaletteSize {
        self.k
    }

    /// Shrinks `image` to fit in a `thumbnail_side` square, keeping its aspect ratio.
    #[must_use]
    pub fn thumbnail<'a>(&self, image: &'a RgbImage) -> Cow<'a, RgbImage> {
        let (width, height) = image.dimensions();
        let (w, h) = thumbnail_dimensions(width, height, self.thumbnail_side);
        if (w, h) == (width, height) {
            Cow::Borrowed(image)
        } else {
            Cow::Owned(imageops::thumbnail(image, w, h))
        }
    }

    /// Builds the weighted points for k-means.
    fn color_counts(&self, image: &RgbImage) -> Result<UniqueColorCounts, PaletteError> {
        if self.k.into_inner() == 0 {
            return Err(PaletteError::ZeroPaletteSize);
        }

        let thumbnail = self.thumbnail(image);
        let counts = UniqueColorCounts::try_from_rgbimage(&thumbnail)?;
        info!(
            "extracting {} colors from {}x{} thumbnail with {} distinct colors",
            self.k,
            thumbnail.width(),
            thumbnail.height(),
            counts.num_colors()
        );
        Ok(counts)
    }

    /// Computes the palette, darkest color first.
    ///
    /// # Errors
    /// Any [`PaletteError`], most commonly
    /// [`PaletteError::InsufficientDistinctColors`] for near-uniform images.
    pub fn palette(&self, image: &RgbImage) -> Result<Palette, PaletteError> {
        let counts = self.color_counts(image)?;
        let output = kmeans::palette(&counts.points(), self.k.into(), &self.kmeans)?;
        let palette = Palette::from_centers(&output.centers());
        info!("palette {} after {} iterations", palette.to_hex().join(" "), output.iterations);
        Ok(palette)
    }

    /// Computes the palette in parallel. The result is identical to [`PaletteExtractor::palette`].
    ///
    /// # Errors
    /// Same as [`PaletteExtractor::palette`].
    #[cfg(feature = "threads")]
    pub fn palette_par(&self, image: &RgbImage) -> Result<Palette, PaletteError> {
        let counts = self.color_counts(image)?;
        let output = kmeans::palette_par(&counts.points(), self.k.into(), &self.kmeans)?;
        let palette = Palette::from_centers(&output.centers());
        info!("palette {} after {} iterations", palette.to_hex().join(" "), output.iterations);
        Ok(palette)
    }
}

/// The size of `width` x `height` scaled down to fit in a `side` square.
///
/// The longer side becomes `side`, the shorter is rounded to the nearest pixel (at least 1).
/// Sizes that already fit are returned unchanged.
#[must_use]
pub fn thumbnail_dimensions(width: u32, height: u32, side: u32) -> (u32, u32) {
    if width <= side && height <= side {
        return (width, height);
    }

    let scale = |short: u32, long: u32| {
        let scaled = (u64::from(short) * u64::from(side) + u64::from(long) / 2) / u64::from(long);
        #[allow(clippy::cast_possible_truncation)]
        {
            scaled.max(1) as u32
        }
    };

    if width >= height {
        (side, scale(height, width))
    } else {
        (scale(width, height), side)
    }
}

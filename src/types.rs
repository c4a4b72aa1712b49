//! Contains various types needed across the crate.

use crate::MAX_PIXELS;
use image::RgbImage;
use palette::{cast::ComponentsAs, Srgb};
use std::{
    error::Error,
    fmt::{Debug, Display},
    ops::Deref,
};

/// An error type for when the length of an input (e.g., `Vec` or slice)
/// is above the maximum supported value.
///
/// The inner value is the maximum supported value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AboveMaxLen<T>(pub T);

impl<T: Display> Display for AboveMaxLen<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "above the maximum length of {}", self.0)
    }
}

impl<T: Debug + Display> Error for AboveMaxLen<T> {}

/// A simple new type wrapper around `&'a [Srgb<u8>]` with the invariant that the length of the
/// inner slice must not be greater than [`MAX_PIXELS`].
///
/// # Examples
/// ```no_run
/// # use calframe::ColorSlice;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let img = image::open("some image")?.into_rgb8();
/// let colors = ColorSlice::try_from(&img)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorSlice<'a>(&'a [Srgb<u8>]);

impl<'a> ColorSlice<'a> {
    /// Returns the length of the slice as a `u32`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn num_colors(&self) -> u32 {
        self.0.len() as u32
    }
}

impl<'a> AsRef<[Srgb<u8>]> for ColorSlice<'a> {
    fn as_ref(&self) -> &[Srgb<u8>] {
        self
    }
}

impl<'a> Deref for ColorSlice<'a> {
    type Target = [Srgb<u8>];

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<'a> TryFrom<&'a [Srgb<u8>]> for ColorSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(slice: &'a [Srgb<u8>]) -> Result<Self, Self::Error> {
        if slice.len() <= MAX_PIXELS as usize {
            Ok(Self(slice))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

impl<'a> TryFrom<&'a RgbImage> for ColorSlice<'a> {
    type Error = AboveMaxLen<u32>;

    fn try_from(image: &'a RgbImage) -> Result<Self, Self::Error> {
        let pixels = image.pixels().len();
        if pixels <= MAX_PIXELS as usize {
            let buf = &image.as_raw()[..(pixels * 3)];
            Ok(Self(buf.components_as()))
        } else {
            Err(AboveMaxLen(MAX_PIXELS))
        }
    }
}

/// A point in `N` dimensional color space together with the number of pixels sharing it.
///
/// Points are produced once from an image's color histogram and never modified afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPoint<const N: usize> {
    /// The position of the point.
    coords: [f32; N],
    /// The number of pixels with exactly this color.
    count: u32,
}

impl<const N: usize> WeightedPoint<N> {
    /// Creates a new [`WeightedPoint`] at `coords` carrying `count` pixels.
    #[must_use]
    pub const fn new(coords: [f32; N], count: u32) -> Self {
        Self { coords, count }
    }

    /// The position of this point.
    #[must_use]
    pub const fn coords(&self) -> [f32; N] {
        self.coords
    }

    /// The number of pixels this point stands for.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }
}

/// The number of colors to extract from an image.
///
/// A size of `0` is representable but rejected by [`PaletteExtractor`](crate::PaletteExtractor)
/// with [`PaletteError::ZeroPaletteSize`](crate::PaletteError::ZeroPaletteSize).
///
/// # Examples
/// ```
/// # use calframe::PaletteSize;
/// let size = PaletteSize::from(2);
/// let size: PaletteSize = 3.into();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PaletteSize(u8);

impl PaletteSize {
    /// The two color palette consumed by [`compose`](crate::compose).
    pub const FRAME: Self = Self(2);

    /// Creates a [`PaletteSize`] from a `u8` in a `const` context.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }

    /// Gets the inner `u8` value.
    #[must_use]
    pub const fn into_inner(self) -> u8 {
        self.0
    }
}

impl Default for PaletteSize {
    fn default() -> Self {
        Self::from_u8(3)
    }
}

impl From<u8> for PaletteSize {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl From<PaletteSize> for usize {
    fn from(value: PaletteSize) -> Self {
        value.0.into()
    }
}

impl Display for PaletteSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ordered set of representative colors, darkest first.
///
/// Colors are sorted by ascending mean channel value.
/// Colors with equal means keep the order they were given in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette(Vec<Srgb<u8>>);

impl Palette {
    /// Creates a [`Palette`] from raw cluster centers.
    ///
    /// Each channel is rounded to the nearest integer and clamped to `0..=255`.
    #[must_use]
    pub fn from_centers(centers: &[[f32; 3]]) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let colors = centers
            .iter()
            .map(|center| {
                let [r, g, b] = center.map(|c| c.round().clamp(0.0, 255.0) as u8);
                Srgb::new(r, g, b)
            })
            .collect();

        Self::from_colors(colors)
    }

    /// Creates a [`Palette`] by sorting the given colors by brightness.
    #[must_use]
    pub fn from_colors(mut colors: Vec<Srgb<u8>>) -> Self {
        // the sum orders the same way as the mean, without float comparisons
        colors.sort_by_key(|c| u16::from(c.red) + u16::from(c.green) + u16::from(c.blue));
        Self(colors)
    }

    /// Returns the colors, darkest first.
    #[must_use]
    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.0
    }

    /// Consumes the palette, returning the inner `Vec`.
    #[must_use]
    pub fn into_inner(self) -> Vec<Srgb<u8>> {
        self.0
    }

    /// Formats each color as a `#rrggbb` string.
    #[must_use]
    pub fn to_hex(&self) -> Vec<String> {
        self.0
            .iter()
            .map(|c| format!("#{:02x}{:02x}{:02x}", c.red, c.green, c.blue))
            .collect()
    }
}

impl Deref for Palette {
    type Target = [Srgb<u8>];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Palette> for Vec<Srgb<u8>> {
    fn from(value: Palette) -> Self {
        value.into_inner()
    }
}

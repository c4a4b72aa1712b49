//! Turns an illustration into a framed desktop wallpaper colored by the image itself.
//!
//! `calframe` reduces a source image to a small palette using weighted k-means over
//! the image's deduplicated colors, then composites the image onto a fixed-size canvas:
//! the background is filled with one palette color and a frame around the image with another.
//!
//! Fetching images, writing files, and setting the desktop background are left to
//! the small capability traits in [`collaborators`].
//!
//! # Features
//! - `threads`: assigns points to clusters in parallel via `rayon`.
//!   Results are identical to the single threaded path.
//!
//! # Example
//! ```no_run
//! # use calframe::{FrameOptions, KmeansOptions, PaletteExtractor, WallpaperPipeline};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let img = image::open("some image")?.into_rgb8();
//!
//! let pipeline = WallpaperPipeline::new()
//!     .extractor(PaletteExtractor::new().kmeans(KmeansOptions::new().seed(42)))
//!     .frame(FrameOptions::new().resolution(1920, 1080).crop(100));
//!
//! let (palette, wallpaper) = pipeline.render(&img)?;
//! println!("{:?}", palette.to_hex());
//! wallpaper.save("wallpaper.png")?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(
    clippy::pedantic,
    clippy::cargo,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,
    clippy::unwrap_in_result,
    clippy::expect_used,
    clippy::unneeded_field_pattern,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::unnecessary_self_imports,
    clippy::str_to_string,
    clippy::string_to_string,
    clippy::string_slice,
    missing_docs,
    clippy::missing_docs_in_private_items,
    rustdoc::all,
    clippy::float_cmp_const,
    clippy::lossy_float_literal
)]
#![allow(
    clippy::doc_markdown,
    clippy::module_name_repetitions,
    clippy::many_single_char_names,
    clippy::missing_panics_doc,
    clippy::unreadable_literal,
    clippy::wildcard_imports
)]

mod api;
mod color_counts;
mod error;
mod types;

pub mod collaborators;
pub mod kmeans;

pub use api::*;
pub use color_counts::UniqueColorCounts;
pub use error::*;
pub use kmeans::{EmptyClusterPolicy, KmeansOptions};
pub use types::*;

/// The maximum supported image size in number of pixels is `u32::MAX`.
pub const MAX_PIXELS: u32 = u32::MAX;

/// Images are shrunk so that neither side exceeds this many pixels before palette extraction.
pub const MAX_THUMBNAIL_SIDE: u32 = 200;

/// k-means stops once no center moves by this distance or more in one iteration.
pub const DEFAULT_CONVERGENCE_THRESHOLD: f32 = 1.0;

/// k-means gives up with [`PaletteError::NonConvergence`] after this many iterations.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

#[cfg(test)]
pub(crate) mod tests {
    use image::{Rgb, RgbImage};
    use palette::Srgb;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    /// `len` pseudo random colors drawn from a fixed seed.
    pub fn test_colors(len: usize) -> Vec<Srgb<u8>> {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(7);
        (0..len)
            .map(|_| Srgb::new(rng.gen(), rng.gen(), rng.gen()))
            .collect()
    }

    /// A `width` x `height` image filled with pseudo random colors.
    pub fn noise_image(width: u32, height: u32) -> RgbImage {
        let mut rng = Xoroshiro128PlusPlus::seed_from_u64(11);
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
    }

    /// A `width` x `height` image whose left `split` columns are `left` and the rest `right`.
    pub fn two_tone_image(
        width: u32,
        height: u32,
        split: u32,
        left: [u8; 3],
        right: [u8; 3],
    ) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| if x < split { Rgb(left) } else { Rgb(right) })
    }
}

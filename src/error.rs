//! Error types for palette extraction and composition.

use crate::{collaborators::SetWallpaperError, AboveMaxLen};
use std::{
    error::Error as StdError,
    fmt::{self, Display},
};

/// The reasons palette extraction can fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteError {
    /// A palette of zero colors was requested.
    ZeroPaletteSize,
    /// The image has fewer distinct colors than the requested palette size.
    InsufficientDistinctColors {
        /// The requested palette size.
        requested: usize,
        /// The number of distinct colors in the (downscaled) image.
        available: usize,
    },
    /// A cluster lost all of its points and [`EmptyClusterPolicy::Fail`](crate::EmptyClusterPolicy::Fail) was set.
    DegenerateCluster {
        /// The index of the empty cluster.
        cluster: usize,
        /// The iteration (starting at 1) in which the cluster became empty.
        iteration: u32,
    },
    /// The centers were still moving when the iteration limit was reached.
    NonConvergence {
        /// The number of iterations that were run.
        iterations: u32,
        /// The largest center displacement in the final iteration.
        max_shift: f32,
    },
    /// The image has more pixels than supported.
    ///
    /// Only possible when [`PaletteExtractor::thumbnail_side`](crate::PaletteExtractor::thumbnail_side)
    /// is raised far enough that the working image is not shrunk below [`MAX_PIXELS`](crate::MAX_PIXELS).
    TooManyPixels(AboveMaxLen<u32>),
}

impl Display for PaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPaletteSize => write!(f, "palette size must be at least 1"),
            Self::InsufficientDistinctColors { requested, available } => write!(
                f,
                "requested {requested} colors but the image only has {available} distinct colors"
            ),
            Self::DegenerateCluster { cluster, iteration } => {
                write!(f, "cluster {cluster} has no points in iteration {iteration}")
            }
            Self::NonConvergence { iterations, max_shift } => write!(
                f,
                "k-means did not converge after {iterations} iterations (last shift {max_shift})"
            ),
            Self::TooManyPixels(err) => write!(f, "image is too large: {err}"),
        }
    }
}

impl StdError for PaletteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::TooManyPixels(err) => Some(err),
            _ => None,
        }
    }
}

impl From<AboveMaxLen<u32>> for PaletteError {
    fn from(err: AboveMaxLen<u32>) -> Self {
        Self::TooManyPixels(err)
    }
}

/// The reasons composition can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionError {
    /// The palette has fewer than the two colors needed for background and frame.
    PaletteTooSmall {
        /// The number of colors in the given palette.
        len: usize,
    },
    /// The target resolution has a zero side.
    ZeroResolution,
    /// Cropping would remove the entire image.
    CropExceedsImage {
        /// The total crop amount, including any automatic height crop.
        crop: u32,
        /// The width of the source image.
        width: u32,
        /// The height of the source image.
        height: u32,
    },
    /// The cropped image plus its frame does not fit on the canvas
    /// and [`OversizePolicy::Reject`](crate::OversizePolicy::Reject) was set.
    OversizeComposition {
        /// The canvas size the composition needs where it is placed: the framed width,
        /// and the lowest row reached by the framed image or the square frame behind it.
        required: (u32, u32),
        /// The width and height of the canvas.
        canvas: (u32, u32),
    },
}

impl Display for CompositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PaletteTooSmall { len } => {
                write!(f, "composition needs a palette of at least 2 colors, got {len}")
            }
            Self::ZeroResolution => write!(f, "canvas resolution must be non-zero"),
            Self::CropExceedsImage { crop, width, height } => {
                write!(f, "cropping {crop} pixels leaves nothing of a {width}x{height} image")
            }
            Self::OversizeComposition { required, canvas } => write!(
                f,
                "framed image of {}x{} does not fit on a {}x{} canvas",
                required.0, required.1, canvas.0, canvas.1
            ),
        }
    }
}

impl StdError for CompositionError {}

/// Any failure while turning an image into a wallpaper.
#[derive(Debug)]
pub enum Error {
    /// Palette extraction failed.
    Palette(PaletteError),
    /// Composition failed.
    Composition(CompositionError),
    /// Setting the wallpaper failed.
    Wallpaper(SetWallpaperError),
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Palette(err) => write!(f, "palette extraction failed: {err}"),
            Self::Composition(err) => write!(f, "composition failed: {err}"),
            Self::Wallpaper(err) => write!(f, "setting the wallpaper failed: {err}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Palette(err) => Some(err),
            Self::Composition(err) => Some(err),
            Self::Wallpaper(err) => Some(err),
        }
    }
}

impl From<PaletteError> for Error {
    fn from(err: PaletteError) -> Self {
        Self::Palette(err)
    }
}

impl From<CompositionError> for Error {
    fn from(err: CompositionError) -> Self {
        Self::Composition(err)
    }
}

impl From<SetWallpaperError> for Error {
    fn from(err: SetWallpaperError) -> Self {
        Self::Wallpaper(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{collaborators::Desktop, MAX_PIXELS};

    fn detect(os: &str) -> Result<Desktop, Error> {
        Ok(Desktop::from_env(os, |_| None)?)
    }

    #[test]
    fn wallpaper_errors_convert() {
        assert!(matches!(detect("macos"), Ok(Desktop::MacOs)));

        let err = detect("plan9").unwrap_err();
        assert!(matches!(
            &err,
            Error::Wallpaper(SetWallpaperError::UnsupportedEnvironment(env)) if env == "platform plan9"
        ));
        assert_eq!(
            err.to_string(),
            "setting the wallpaper failed: unsupported environment: platform plan9"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn pixel_limit_errors_convert() {
        let err = PaletteError::from(AboveMaxLen(MAX_PIXELS));
        assert_eq!(err, PaletteError::TooManyPixels(AboveMaxLen(MAX_PIXELS)));
        assert_eq!(
            err.to_string(),
            format!("image is too large: above the maximum length of {MAX_PIXELS}")
        );
        assert!(err.source().is_some());

        let err = Error::from(err);
        assert!(matches!(err, Error::Palette(PaletteError::TooManyPixels(_))));
    }
}

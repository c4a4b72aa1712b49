//! Contains the code for color/pixel deduplication.

use crate::{AboveMaxLen, ColorSlice, WeightedPoint};
use bitvec::vec::BitVec;
use image::RgbImage;
use palette::{cast::AsArrays, Srgb};
use std::ops::Range;

/// A byte-sized Radix
const RADIX: usize = u8::MAX as usize + 1;

/// Returns the range associated with the `i`-th chunk.
#[inline]
fn chunk_range(chunks: &[u32], i: usize) -> Range<usize> {
    (chunks[i] as usize)..(chunks[i + 1] as usize)
}

/// Computes the prefix sum of the slice in place.
#[inline]
fn prefix_sum(counts: &mut [u32]) {
    for i in 1..counts.len() {
        counts[i] += counts[i - 1];
    }
}

/// Deduplicated colors and their frequency counts, i.e., the color histogram of an image.
///
/// Colors are stored in ascending `(red, green, blue)` order and every count is nonzero.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniqueColorCounts {
    /// The unique colors.
    colors: Vec<Srgb<u8>>,
    /// The number of times each color was present in the original color slice/image.
    counts: Vec<u32>,
    /// The total number of pixels/colors in the original color slice/image.
    total_count: u32,
}

impl UniqueColorCounts {
    /// Returns the slice of unique colors.
    #[must_use]
    pub fn colors(&self) -> &[Srgb<u8>] {
        &self.colors
    }

    /// Returns a slice for the number of times each unique color was present in the original color slice/image.
    #[must_use]
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Returns the number of original pixels/colors.
    ///
    /// This is equal to the sum of [`UniqueColorCounts::counts`].
    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// Returns the number of unique colors.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn num_colors(&self) -> u32 {
        self.colors.len() as u32
    }

    /// Whether there are no colors at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Creates a new [`UniqueColorCounts`] from a [`ColorSlice`].
    #[must_use]
    pub fn new(pixels: ColorSlice) -> Self {
        if pixels.is_empty() {
            return Self::default();
        }

        let total_count = pixels.num_colors();

        let mut colors = Vec::new();
        let mut counts = Vec::new();
        let mut green_blue = vec![[0; 2]; pixels.len()];

        let mut lower_counts = vec![[0u32; RADIX]; RADIX];
        let mut bitmask: BitVec = BitVec::repeat(false, RADIX * RADIX);

        // counting sort on red, leaving `red_prefix[r]` at the start of bucket `r`
        let mut red_prefix = vec![0u32; RADIX + 1];
        for &[r, ..] in pixels.as_arrays() {
            red_prefix[usize::from(r)] += 1;
        }
        prefix_sum(&mut red_prefix);

        for &[r, g, b] in pixels.as_arrays() {
            let r = usize::from(r);
            let j = red_prefix[r] - 1;
            green_blue[j as usize] = [g, b];
            red_prefix[r] = j;
        }
        red_prefix[RADIX] = total_count;

        for r in 0..RADIX {
            let chunk = chunk_range(&red_prefix, r);
            if chunk.is_empty() {
                continue;
            }

            let green_blue = &green_blue[chunk.clone()];
            #[allow(clippy::cast_possible_truncation)]
            let red = r as u8;

            if chunk.len() < RADIX * RADIX / 4 {
                // sparse bucket: only visit the occupied cells
                for gb in green_blue {
                    let [g, b] = gb.map(usize::from);
                    lower_counts[g][b] += 1;
                    bitmask.set(g * RADIX + b, true);
                }

                for i in bitmask.iter_ones() {
                    let g = i / RADIX;
                    let b = i % RADIX;
                    #[allow(clippy::cast_possible_truncation)]
                    colors.push(Srgb::new(red, g as u8, b as u8));
                    counts.push(lower_counts[g][b]);
                    lower_counts[g][b] = 0;
                }

                bitmask.fill(false);
            } else {
                for &[g, b] in green_blue {
                    lower_counts[usize::from(g)][usize::from(b)] += 1;
                }

                for (g, row) in lower_counts.iter_mut().enumerate() {
                    for (b, count) in row.iter_mut().enumerate() {
                        if *count > 0 {
                            #[allow(clippy::cast_possible_truncation)]
                            colors.push(Srgb::new(red, g as u8, b as u8));
                            counts.push(*count);
                            *count = 0;
                        }
                    }
                }
            }
        }

        Self { colors, counts, total_count }
    }

    /// Tries to create a new [`UniqueColorCounts`] from a [`RgbImage`].
    ///
    /// # Errors
    /// Return an error if the number of pixels in the image are above [`MAX_PIXELS`](crate::MAX_PIXELS).
    pub fn try_from_rgbimage(image: &RgbImage) -> Result<Self, AboveMaxLen<u32>> {
        image.try_into().map(Self::new)
    }

    /// Converts the histogram into weighted points in RGB space, one per unique color.
    #[must_use]
    pub fn points(&self) -> Vec<WeightedPoint<3>> {
        self.colors
            .iter()
            .zip(&self.counts)
            .map(|(color, &count)| {
                let [r, g, b] = [color.red, color.green, color.blue].map(f32::from);
                WeightedPoint::new([r, g, b], count)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tests::*;
    use rand::{seq::SliceRandom, SeedableRng};
    use rand_xoshiro::Xoroshiro128PlusPlus;

    fn assert_valid_unique(unique: &UniqueColorCounts, colors: ColorSlice) {
        assert_eq!(unique.total_count(), colors.num_colors());
        assert_eq!(unique.counts().iter().sum::<u32>(), colors.num_colors());
        assert!(unique.counts().iter().all(|&count| count > 0));

        let unique = unique.colors();
        for i in 1..unique.len() {
            assert!(unique[i - 1].into_components() < unique[i].into_components());
        }
    }

    #[test]
    fn empty_input() {
        let colors: &[Srgb<u8>] = &[];
        let unique = UniqueColorCounts::new(ColorSlice::try_from(colors).unwrap());
        assert!(unique.is_empty() && unique.colors().is_empty() && unique.counts().is_empty());
        assert_eq!(unique.total_count(), 0);
        assert!(unique.points().is_empty());
    }

    fn add_duplicate_color_with_data(colors: Vec<Srgb<u8>>) {
        let colors = {
            let mut colors = colors;
            let len = colors.len();
            colors[len - 1] = colors[0];
            colors
        };

        let duplicate = colors[0];
        let without_duplicate = ColorSlice::try_from(&colors[..(colors.len() - 1)]).unwrap();
        let with_duplicate = ColorSlice::try_from(colors.as_slice()).unwrap();

        let expected = {
            let mut unique = UniqueColorCounts::new(without_duplicate);
            let i = unique.colors().iter().position(|&c| c == duplicate).unwrap();
            unique.counts[i] += 1;
            unique.total_count += 1;
            unique
        };
        let actual = UniqueColorCounts::new(with_duplicate);
        assert_valid_unique(&actual, with_duplicate);
        assert_eq!(actual, expected);
    }

    #[test]
    fn add_duplicate_color() {
        let colors = test_colors(1024);
        add_duplicate_color_with_data(colors.clone());

        // dense buckets
        add_duplicate_color_with_data([colors.as_slice(); 256].concat());
    }

    #[test]
    fn reordered_input() {
        let colors = [test_colors(1024).as_slice(); 64].concat();
        let mut reordered = colors.clone();
        reordered.shuffle(&mut Xoroshiro128PlusPlus::seed_from_u64(0));

        let expected = UniqueColorCounts::new(ColorSlice::try_from(colors.as_slice()).unwrap());
        let reordered = ColorSlice::try_from(reordered.as_slice()).unwrap();
        let actual = UniqueColorCounts::new(reordered);
        assert_valid_unique(&actual, reordered);
        assert_eq!(actual, expected);
    }

    #[test]
    fn image_histogram() {
        let img = two_tone_image(4, 4, 1, [10, 10, 10], [200, 200, 200]);
        let unique = UniqueColorCounts::try_from_rgbimage(&img).unwrap();

        assert_eq!(unique.colors(), &[Srgb::new(10, 10, 10), Srgb::new(200, 200, 200)]);
        assert_eq!(unique.counts(), &[4, 12]);
        assert_eq!(
            unique.points(),
            vec![
                WeightedPoint::new([10.0; 3], 4),
                WeightedPoint::new([200.0; 3], 12),
            ]
        );
    }
}

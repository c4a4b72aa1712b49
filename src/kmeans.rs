//! Weighted k-means (Lloyd's algorithm) over deduplicated colors.
//!
//! Each point carries the number of pixels that share its color, so an image only needs
//! one point per distinct color. Every iteration assigns each point to its nearest center
//! (ties go to the lowest cluster index), then moves each center to the count-weighted
//! mean of its points. Iteration stops once no center moves by
//! [`KmeansOptions::convergence_threshold`] or more.
//!
//! The algorithm works for any dimensionality `N`, although this crate only uses `N = 3` (RGB).

use crate::{
    PaletteError, WeightedPoint, DEFAULT_CONVERGENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS,
};
use log::{debug, warn};
use ordered_float::OrderedFloat;
use rand::{seq::index, SeedableRng};
use rand_xoshiro::Xoroshiro128PlusPlus;

#[cfg(feature = "threads")]
use rayon::prelude::*;

/// What to do with a cluster that has no points assigned to it after an assignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyClusterPolicy {
    /// Keep the cluster's previous center and report it in [`KmeansOutput::stale`].
    #[default]
    RetainPrevious,
    /// Move the center onto the point that is farthest from its nearest center.
    ///
    /// Ties go to the earliest point. When several clusters are empty in the same iteration,
    /// each reseed accounts for the centers placed before it, so no point is picked twice.
    ReseedFarthest,
    /// Stop with [`PaletteError::DegenerateCluster`].
    Fail,
}

/// A builder struct to specify the parameters for k-means.
///
/// # Examples
/// ```
/// # use calframe::{EmptyClusterPolicy, KmeansOptions};
/// let options = KmeansOptions::new()
///     .convergence_threshold(0.5)
///     .empty_cluster_policy(EmptyClusterPolicy::ReseedFarthest)
///     .seed(42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmeansOptions {
    /// Stop once the largest center displacement is strictly below this distance.
    convergence_threshold: f32,
    /// The maximum number of assign/update iterations.
    max_iterations: u32,
    /// How to handle clusters that lose all of their points.
    empty_cluster_policy: EmptyClusterPolicy,
    /// The seed for choosing the initial centers, or `None` to draw one from system entropy.
    seed: Option<u64>,
}

impl Default for KmeansOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl KmeansOptions {
    /// Creates a new [`KmeansOptions`] with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            convergence_threshold: DEFAULT_CONVERGENCE_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            empty_cluster_policy: EmptyClusterPolicy::RetainPrevious,
            seed: None,
        }
    }

    /// Sets the convergence threshold in color space units.
    ///
    /// The default is [`DEFAULT_CONVERGENCE_THRESHOLD`].
    #[must_use]
    pub const fn convergence_threshold(mut self, threshold: f32) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    /// Sets the maximum number of iterations before giving up with
    /// [`PaletteError::NonConvergence`].
    ///
    /// The default is [`DEFAULT_MAX_ITERATIONS`].
    #[must_use]
    pub const fn max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the policy for clusters left without points.
    ///
    /// The default is [`EmptyClusterPolicy::RetainPrevious`].
    #[must_use]
    pub const fn empty_cluster_policy(mut self, policy: EmptyClusterPolicy) -> Self {
        self.empty_cluster_policy = policy;
        self
    }

    /// Sets the seed used to pick the initial centers.
    ///
    /// Without a seed, the initial centers differ from run to run.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Returns the configured seed, if any.
    #[must_use]
    pub const fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Creates the random number generator for the initial centers.
    fn rng(&self) -> Xoroshiro128PlusPlus {
        match self.seed {
            Some(seed) => Xoroshiro128PlusPlus::seed_from_u64(seed),
            None => Xoroshiro128PlusPlus::from_entropy(),
        }
    }
}

/// Explicit starting centers for k-means.
#[derive(Debug, Clone, PartialEq)]
#[repr(transparent)]
pub struct Centroids<const N: usize>(Vec<[f32; N]>);

impl<const N: usize> Centroids<N> {
    /// Returns the inner `Vec` of centers.
    #[must_use]
    pub fn into_inner(self) -> Vec<[f32; N]> {
        self.0
    }

    /// The number of centers, i.e., `k`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no centers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<const N: usize> From<Vec<[f32; N]>> for Centroids<N> {
    fn from(centers: Vec<[f32; N]>) -> Self {
        Self(centers)
    }
}

/// A cluster at the end of an iteration: its center and the points assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster<const N: usize> {
    /// The points assigned to this cluster in the final iteration.
    points: Vec<WeightedPoint<N>>,
    /// The weighted centroid of `points`, or the retained/reseeded center if `points` is empty.
    center: [f32; N],
}

impl<const N: usize> Cluster<N> {
    /// The center of this cluster. It need not be one of the observed colors.
    #[must_use]
    pub const fn center(&self) -> [f32; N] {
        self.center
    }

    /// The points assigned to this cluster.
    #[must_use]
    pub fn points(&self) -> &[WeightedPoint<N>] {
        &self.points
    }

    /// The total number of pixels assigned to this cluster.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.points.iter().map(|p| u64::from(p.count())).sum()
    }

    /// The dimensionality of the color space.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        N
    }
}

/// The result of a converged k-means run.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansOutput<const N: usize> {
    /// The final clusters, in the same order as the initial centers.
    pub clusters: Vec<Cluster<N>>,
    /// The number of iterations that were run.
    pub iterations: u32,
    /// The largest center displacement in the final iteration.
    ///
    /// This is always below the convergence threshold.
    pub max_shift: f32,
    /// Indices of clusters that were empty in the final iteration and kept their previous center.
    pub stale: Vec<usize>,
}

impl<const N: usize> KmeansOutput<N> {
    /// The final cluster centers.
    #[must_use]
    pub fn centers(&self) -> Vec<[f32; N]> {
        self.clusters.iter().map(Cluster::center).collect()
    }
}

/// Euclidean distance in raw, unnormalized component space.
#[inline]
fn distance<const N: usize>(a: &[f32; N], b: &[f32; N]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f32>()
        .sqrt()
}

/// Returns the index of and distance to the nearest center. The first minimum wins.
#[inline]
fn nearest<const N: usize>(centers: &[[f32; N]], point: &[f32; N]) -> (usize, f32) {
    let mut best = 0;
    let mut best_distance = f32::INFINITY;
    for (i, center) in centers.iter().enumerate() {
        let d = distance(center, point);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    (best, best_distance)
}

/// The count-weighted mean of `points`, or `None` if there are no points.
fn weighted_centroid<const N: usize>(points: &[WeightedPoint<N>]) -> Option<[f32; N]> {
    let mut sums = [0.0f64; N];
    let mut total = 0u64;
    for point in points {
        let count = point.count();
        total += u64::from(count);
        for (sum, c) in sums.iter_mut().zip(point.coords()) {
            *sum += f64::from(c) * f64::from(count);
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    (total > 0).then(|| sums.map(|sum| (sum / total as f64) as f32))
}

/// The nearest center index and distance for every point.
type Assignment = Vec<(usize, f32)>;

/// The mutable state of a k-means run.
struct State<'a, const N: usize> {
    /// The points to cluster.
    points: &'a [WeightedPoint<N>],
    /// The current centers.
    centers: Vec<[f32; N]>,
    /// Options for this run.
    options: KmeansOptions,
}

impl<'a, const N: usize> State<'a, N> {
    /// Assigns each point to its nearest center.
    fn assign(&self) -> Assignment {
        self.points
            .iter()
            .map(|p| nearest(&self.centers, &p.coords()))
            .collect()
    }

    /// Assigns each point to its nearest center in parallel.
    ///
    /// Each point is handled independently, so the result equals [`State::assign`].
    #[cfg(feature = "threads")]
    fn assign_par(&self) -> Assignment {
        self.points
            .par_iter()
            .map(|p| nearest(&self.centers, &p.coords()))
            .collect()
    }

    /// Moves every center to the weighted centroid of its points and returns the new
    /// clusters, the largest displacement, and the clusters that kept a stale center.
    fn update(
        &mut self,
        assignment: &Assignment,
        iteration: u32,
    ) -> Result<(Vec<Cluster<N>>, f32, Vec<usize>), PaletteError> {
        let k = self.centers.len();
        let mut members = vec![Vec::new(); k];
        for (&point, &(cluster, _)) in self.points.iter().zip(assignment) {
            members[cluster].push(point);
        }

        let mut new_centers = Vec::with_capacity(k);
        let mut empty = Vec::new();
        for (i, points) in members.iter().enumerate() {
            if let Some(center) = weighted_centroid(points) {
                new_centers.push(center);
            } else {
                new_centers.push(self.centers[i]);
                empty.push(i);
            }
        }

        let mut stale = Vec::new();
        if !empty.is_empty() {
            match self.options.empty_cluster_policy {
                EmptyClusterPolicy::Fail => {
                    return Err(PaletteError::DegenerateCluster { cluster: empty[0], iteration });
                }
                EmptyClusterPolicy::RetainPrevious => {
                    warn!(
                        "{} clusters are empty in iteration {iteration}, keeping their centers",
                        empty.len()
                    );
                    stale = empty;
                }
                EmptyClusterPolicy::ReseedFarthest => {
                    let mut distances = assignment.iter().map(|&(_, d)| d).collect::<Vec<_>>();
                    for &cluster in &empty {
                        // rev so that max_by_key picks the earliest of equally far points
                        let Some((farthest, _)) = distances
                            .iter()
                            .enumerate()
                            .rev()
                            .max_by_key(|&(_, &d)| OrderedFloat(d))
                        else {
                            break;
                        };

                        let center = self.points[farthest].coords();
                        warn!(
                            "cluster {cluster} is empty in iteration {iteration}, reseeding at point {farthest}"
                        );
                        new_centers[cluster] = center;
                        for (d, p) in distances.iter_mut().zip(self.points) {
                            *d = d.min(distance(&center, &p.coords()));
                        }
                    }
                }
            }
        }

        let max_shift = self
            .centers
            .iter()
            .zip(&new_centers)
            .map(|(old, new)| distance(old, new))
            .fold(0.0, f32::max);

        let clusters = members
            .into_iter()
            .zip(&new_centers)
            .map(|(points, &center)| Cluster { points, center })
            .collect();

        self.centers = new_centers;
        Ok((clusters, max_shift, stale))
    }

    /// Runs assign/update iterations until convergence or the iteration limit.
    fn run(
        mut self,
        assign: impl Fn(&Self) -> Assignment,
    ) -> Result<KmeansOutput<N>, PaletteError> {
        let mut max_shift = f32::INFINITY;
        for iteration in 1..=self.options.max_iterations {
            let assignment = assign(&self);
            let (clusters, shift, stale) = self.update(&assignment, iteration)?;
            max_shift = shift;
            debug!("k-means iteration {iteration}: max center shift {shift}");

            if shift < self.options.convergence_threshold {
                return Ok(KmeansOutput { clusters, iterations: iteration, max_shift, stale });
            }
        }

        warn!(
            "k-means stopped after {} iterations with a max shift of {max_shift}",
            self.options.max_iterations
        );
        Err(PaletteError::NonConvergence {
            iterations: self.options.max_iterations,
            max_shift,
        })
    }
}

/// Validates `k` against the points and picks `k` distinct points as the initial centers.
fn initial_centers<const N: usize>(
    points: &[WeightedPoint<N>],
    k: usize,
    options: &KmeansOptions,
) -> Result<Vec<[f32; N]>, PaletteError> {
    if k == 0 {
        return Err(PaletteError::ZeroPaletteSize);
    }
    if points.len() < k {
        return Err(PaletteError::InsufficientDistinctColors {
            requested: k,
            available: points.len(),
        });
    }

    let mut rng = options.rng();
    Ok(index::sample(&mut rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].coords())
        .collect())
}

/// Clusters `points` into `k` clusters, starting from `k` distinct points chosen at random.
///
/// The points should be distinct; use [`UniqueColorCounts`](crate::UniqueColorCounts) to build them.
///
/// # Errors
/// - [`PaletteError::ZeroPaletteSize`] if `k` is `0`.
/// - [`PaletteError::InsufficientDistinctColors`] if there are fewer than `k` points.
/// - [`PaletteError::DegenerateCluster`] if a cluster empties under [`EmptyClusterPolicy::Fail`].
/// - [`PaletteError::NonConvergence`] if the iteration limit is reached.
pub fn palette<const N: usize>(
    points: &[WeightedPoint<N>],
    k: usize,
    options: &KmeansOptions,
) -> Result<KmeansOutput<N>, PaletteError> {
    let centers = initial_centers(points, k, options)?;
    palette_with_centroids(points, centers.into(), options)
}

/// Clusters `points` starting from the given centers.
///
/// The seed in `options` is unused since no random choices are made.
///
/// # Errors
/// Same as [`palette`], except that the number of points is not checked against `k`.
pub fn palette_with_centroids<const N: usize>(
    points: &[WeightedPoint<N>],
    centroids: Centroids<N>,
    options: &KmeansOptions,
) -> Result<KmeansOutput<N>, PaletteError> {
    if centroids.is_empty() {
        return Err(PaletteError::ZeroPaletteSize);
    }

    let state = State { points, centers: centroids.into_inner(), options: *options };
    state.run(State::assign)
}

/// Parallel version of [`palette`]. The result is identical for the same seed.
///
/// # Errors
/// Same as [`palette`].
#[cfg(feature = "threads")]
pub fn palette_par<const N: usize>(
    points: &[WeightedPoint<N>],
    k: usize,
    options: &KmeansOptions,
) -> Result<KmeansOutput<N>, PaletteError> {
    let centers = initial_centers(points, k, options)?;
    palette_with_centroids_par(points, centers.into(), options)
}

/// Parallel version of [`palette_with_centroids`].
///
/// # Errors
/// Same as [`palette_with_centroids`].
#[cfg(feature = "threads")]
pub fn palette_with_centroids_par<const N: usize>(
    points: &[WeightedPoint<N>],
    centroids: Centroids<N>,
    options: &KmeansOptions,
) -> Result<KmeansOutput<N>, PaletteError> {
    if centroids.is_empty() {
        return Err(PaletteError::ZeroPaletteSize);
    }

    let state = State { points, centers: centroids.into_inner(), options: *options };
    state.run(State::assign_par)
}

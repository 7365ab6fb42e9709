//! Preview analysis derived from an evaluated grid.

pub mod contours;
pub mod cross_section;
pub mod statistics;

pub use contours::{contour_levels, generate_contours, ContourLevel, ContourSegment};
pub use cross_section::{bilinear_sample, sample_cross_section, CrossSectionSample, WorldPoint};
pub use statistics::{compute_histogram, compute_statistics, Histogram, Statistics, DEFAULT_HISTOGRAM_BINS};

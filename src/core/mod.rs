//! Core spectrum quality metrics

pub mod aggregate;
pub mod cloud;
pub mod noise;
pub mod smooth;
pub mod wavelength;

// Re-export main types
pub use aggregate::{AggregatorParams, QualitySummary, SpectrumAggregator};
pub use cloud::{fit_cloud_slope, is_cloud, CloudSlopeFit, CloudSlopeParams};
pub use noise::excess_error_ratio;
pub use smooth::smooth;
pub use wavelength::{BandWindows, CloudThresholds, VisSubsets, WavelengthGrid};

//! specqa: spectrum quality metrics for imaging spectrometer reflectance
//! products.
//!
//! A single streaming pass over an ENVI-style reflectance cube computes one
//! excess-error ratio per pixel spectrum (water-band divergence from a
//! locally smoothed reference, normalized by clean reference intervals),
//! screens cloud spectra, optionally fits visible-range cloud slopes, and
//! aggregates everything into percentile statistics and per-wavelength
//! median residual curves.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use crate::core::{
    AggregatorParams, CloudSlopeParams, QualitySummary, SpectrumAggregator, WavelengthGrid,
};
pub use crate::io::{find_header, EnviHeader, LineReader};
pub use crate::types::{LineFrame, QaError, QaResult, Reflectance};

use ndarray::Array2;

/// Per-channel reflectance value
pub type Reflectance = f32;

/// One raster line reshaped to pixel order (samples x bands)
pub type LineFrame = Array2<Reflectance>;

/// Values below this sentinel mark fill / no-data spectra
pub const FILL_THRESHOLD: Reflectance = -9990.0;

/// Error types for spectrum quality processing
#[derive(Debug, thiserror::Error)]
pub enum QaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type for spectrum quality operations
pub type QaResult<T> = Result<T, QaError>;

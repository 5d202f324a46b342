//! Error Types
//!
//! The main error type [`ArdentError`] covers all failure modes including GPU
//! initialization failures, asset loading and decoding errors, and tracking
//! calibration errors. All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, ArdentError>`.

use thiserror::Error;

/// The main error type for the Ardent AR framework.
#[derive(Error, Debug)]
pub enum ArdentError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter or surface.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create the window surface.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// glTF parsing or decoding error.
    #[error("glTF error: {0}")]
    GltfError(String),

    // ========================================================================
    // Tracking Errors
    // ========================================================================
    /// Camera calibration data could not be parsed.
    #[error("Calibration data error: {0}")]
    CalibrationError(String),

    /// An anchor was referenced that was never assembled.
    #[error("Anchor index out of bounds: {index} (anchor count: {count})")]
    AnchorIndexOutOfBounds {
        /// The invalid index.
        index: usize,
        /// Number of anchors assembled at startup.
        count: usize,
    },

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<gltf::Error> for ArdentError {
    fn from(err: gltf::Error) -> Self {
        ArdentError::GltfError(err.to_string())
    }
}

/// Alias for `Result<T, ArdentError>`.
pub type Result<T> = std::result::Result<T, ArdentError>;

//! Error types for startup and GPU setup.
//!
//! Interaction outcomes (a click that hits nothing, or hits geometry without
//! artifact metadata) are not errors and never appear here. Only failures that
//! stop the museum from starting or presenting a frame are represented.

use thiserror::Error;

/// Main error type for the museum application.
#[derive(Error, Debug)]
pub enum VitrineError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface texture unavailable: {0}")]
    SurfaceTexture(#[from] wgpu::SurfaceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("font error: {0}")]
    Font(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for museum operations.
pub type Result<T> = std::result::Result<T, VitrineError>;

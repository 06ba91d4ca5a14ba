//! Error types shared across the viewer
//!
//! Model loading failures are non-fatal and only ever reach the log. Render
//! errors during setup are fatal; per-frame surface errors are recovered by
//! the application shell where wgpu allows it.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while fetching or parsing the pawn model.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Reading an asset file from disk failed.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The MTL material library could not be parsed.
    #[error("failed to parse material library {path}: {source}")]
    Material {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    /// The OBJ geometry could not be parsed.
    #[error("failed to parse geometry {path}: {source}")]
    Geometry {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    /// The geometry parsed but contained no meshes.
    #[error("geometry {path} contains no meshes")]
    Empty { path: PathBuf },
    /// The loader thread went away without reporting a result.
    #[error("model loader stopped before reporting a result")]
    Disconnected,
}

/// Failures acquiring or using the GPU rendering context.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create window surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("failed to acquire frame: {0}")]
    Frame(#[from] wgpu::SurfaceError),
}

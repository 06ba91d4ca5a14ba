//! Background model loading
//!
//! [`ModelLoader`] reads the material library and geometry on its own thread
//! and reports back through a [`LoadHandle`]. The render thread polls the
//! handle once per frame and appends the finished [`ModelPatch`] between
//! frames.

pub mod loader;

pub use loader::{LoadEvent, LoadHandle, ModelLoader, ModelPatch};

//! Asset loading: model files and texture images

pub mod image_loader;
pub mod model_loader;

pub use image_loader::ImageData;
pub use model_loader::{ModelLoadError, ModelLoader};

use thiserror::Error;

/// Errors for non-geometry asset loading
#[derive(Error, Debug)]
pub enum AssetError {
    /// Asset could not be decoded or read
    #[error("asset load failed: {0}")]
    LoadFailed(String),
}

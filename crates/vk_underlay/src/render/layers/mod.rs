//! Render layers: the textured mesh in front, the fullscreen quad behind

pub mod background_layer;
pub mod mesh_layer;

pub use background_layer::BackgroundLayer;
pub use mesh_layer::MeshLayer;

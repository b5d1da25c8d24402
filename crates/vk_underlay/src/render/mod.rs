//! Rendering core
//!
//! Resource wrappers, layers and the frame sequencer that plugs into the
//! host's pre-frame and record callbacks.

pub mod host;
pub mod jobs;
pub mod layers;
pub mod mesh;
pub mod underlay;
pub mod vulkan;

pub use host::{HostDeviceContext, RenderHost, ShaderAsset};
pub use jobs::RenderJobQueue;
pub use mesh::{Mesh, Vertex};
pub use underlay::{resolve_geometry, GeometrySource, Underlay};
pub use vulkan::{VulkanError, VulkanResult};

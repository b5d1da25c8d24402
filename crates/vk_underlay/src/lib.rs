//! # vk_underlay
//!
//! A Vulkan underlay rendering core: a textured 3D mesh (the built-in cube
//! or a loaded model) plus an optional fullscreen background, drawn into
//! frames owned by a host rendering engine.
//!
//! The host owns the Vulkan instance, device, render pass, window and frame
//! pacing, and exposes them through the [`render::RenderHost`] trait. The
//! underlay owns every GPU resource it creates — buffers, images, samplers,
//! descriptors, pipelines — and performs all work synchronously inside the
//! host's two callbacks:
//!
//! ```rust,no_run
//! use vk_underlay::prelude::*;
//!
//! # fn demo(host: &mut dyn RenderHost, jobs: &RenderJobQueue) {
//! let mut underlay = Underlay::default();
//! underlay.set_geometry_source(GeometrySource::Builtin);
//!
//! // Once per frame, on the host's render thread, in this order:
//! underlay.pre_frame(host);
//! underlay.record_frame(host);
//!
//! // On scene invalidation: teardown is deferred to the render thread.
//! underlay.release_resources(jobs);
//! jobs.run_pending(); // host calls this before its next sync point
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod assets;
pub mod config;
pub mod foundation;
pub mod render;

/// Common imports for host integrations
pub mod prelude {
    pub use crate::assets::{ImageData, ModelLoadError, ModelLoader};
    pub use crate::config::UnderlayConfig;
    pub use crate::foundation::math::{Mat4, Point3, Vec3};
    pub use crate::render::{
        GeometrySource, HostDeviceContext, Mesh, RenderHost, RenderJobQueue, ShaderAsset,
        Underlay, Vertex,
    };
}

#[macro_use]
mod par;

pub mod backdrop;
pub mod color;
pub mod config;
pub mod culling;
pub mod heightmap;
pub mod keyframes;
pub mod mesh;
pub mod particles;
pub mod placement;
pub mod scene;
pub mod surface_sampler;
pub mod terrain;

pub mod camera;
pub mod geometry;
pub mod gpu_context;
pub mod instancing;
pub mod material;
pub mod pipeline;
pub mod sky;
pub mod world;

mod backdrop_pass;
mod instanced_pass;
mod particle_pass;
mod terrain_pass;

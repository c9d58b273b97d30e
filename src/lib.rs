mod bsdf;
mod camera;
mod environment;
pub mod geometry;
mod integrator;
mod material;
mod renderer;
mod scene;
mod screen_block;
mod util;

pub use crate::renderer::{RenderError, RenderProgress, RenderSettings, render};
pub use camera::Camera;
pub use environment::{Environment, EnvironmentError};
pub use integrator::Integrator;
pub use material::Material;
pub use scene::{Scene, SceneError};

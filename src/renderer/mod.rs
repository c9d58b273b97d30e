mod machinery;
mod worker;

use std::num::{NonZeroU32, NonZeroUsize};

use thiserror::Error;

pub use crate::renderer::machinery::{RenderProgress, render};
use crate::environment::EnvironmentError;
use crate::integrator::{Integrator, MAX_BOUNCES};

#[derive(Copy, Clone, Debug)]
pub struct RenderSettings {
    pub tile_size: NonZeroU32,
    pub sample_count: NonZeroU32,
    /// Maximum path length. Must be `<= `[`crate::integrator::MAX_BOUNCES`].
    pub max_bounces: u32,
    /// Linear-to-display exposure applied by the Reinhard-style tone map.
    pub exposure: f32,
    pub integrator: Integrator,
    /// Number of worker threads to use. `None` uses one per available core.
    pub threads: Option<NonZeroUsize>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        RenderSettings {
            tile_size: NonZeroU32::new(32).unwrap(),
            sample_count: NonZeroU32::new(16).unwrap(),
            max_bounces: 8,
            exposure: 1.0,
            integrator: Integrator::default(),
            threads: None,
        }
    }
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.max_bounces as usize > MAX_BOUNCES {
            return Err(RenderError::InvalidConfig(format!(
                "max_bounces must be at most {MAX_BOUNCES}, got {}",
                self.max_bounces
            )));
        }
        if !self.exposure.is_finite() || self.exposure < 0.0 {
            return Err(RenderError::InvalidConfig(
                "exposure must be a non-negative, finite number".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("render region lies outside the image bounds")]
    InvalidRegion,

    #[error("unsupported environment data: {0}")]
    UnsupportedEnvironment(#[from] EnvironmentError),

    #[error("no CPU cores are available to render with")]
    NoWorkers,

    #[error("failed to spawn a worker thread: {0}")]
    SpawnFailed(#[from] std::io::Error),
}

//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the application core and an
//! external system. Implementations live in `src/adapters/`.

pub mod image_generator;
pub mod media_target;

pub use image_generator::{ImageGenerator, InferenceRequest};
pub use media_target::MediaTarget;

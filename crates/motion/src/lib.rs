//! Sprite motion for the dancing glyphs animation.
//!
//! [`Wave`] strategies place sprites and move them as closed-form functions of
//! elapsed time; [`Sprite`] turns the result into pixel-space quad corners.

pub mod sprite;
pub mod vector;
pub mod wave;

pub use sprite::Sprite;
pub use vector::{Matrix2x2, Vector2};
pub use wave::{
    CircularParams, CircularWave, LineParams, LineWave, Wave, DEFAULT_ASPECT_RATIO,
    MIN_SIZE_FACTOR,
};

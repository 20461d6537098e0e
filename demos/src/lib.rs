//! # Penumbra Demos
//!
//! ## Available Demos
//!
//! - `moment_shadows` - Bouncing spheres over a plane, lit by one orbiting
//!   light, with VSM or MSM soft shadows
//!
//! The [`controls`] module maps keys to the live shadow parameters.

pub mod controls;

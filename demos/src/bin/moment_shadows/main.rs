//! # Moment Shadows Demo
//!
//! Demonstrates:
//! - Variance and moment shadow maps from a single directional light
//! - Separable Gaussian blur of the shadow map in compute, 0 to 8 iterations
//! - Three frames in flight with per-frame descriptor slots
//! - Keyboard control of every live parameter (see `penumbra_demos::controls`)
//!
//! ```bash
//! cargo run --bin moment_shadows -- --technique msm --blur-count 3
//! cargo run --bin moment_shadows -- --backend dummy --max-frames 10
//! ```

mod args;
mod demo;

use penumbra_app::App;
use penumbra_app::AppArgs;

fn main() -> Result<(), winit::error::EventLoopError> {
    let args = <args::DemoArgs as AppArgs>::parse();
    let demo = demo::MomentShadowsDemo::new(args.settings(), args.seed);
    App::run(demo, args)
}

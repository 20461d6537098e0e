use penumbra_app::{AppContext, AppHandler, DrawContext};
use penumbra_demos::controls::{self, Control};
use penumbra_graphics::GraphicsError;
use penumbra_graphics::shadows::{ShadowPipelineConfig, ShadowPipelineContext, ShadowSettings};
use winit::event::KeyEvent;
use winit::keyboard::PhysicalKey;

/// Frames between two status lines in the log.
const STATUS_INTERVAL: u64 = 600;

pub struct MomentShadowsDemo {
    initial: ShadowSettings,
    seed: u64,
    shadows: Option<ShadowPipelineContext>,
    exit_requested: bool,
}

impl MomentShadowsDemo {
    pub fn new(initial: ShadowSettings, seed: u64) -> Self {
        Self {
            initial,
            seed,
            shadows: None,
            exit_requested: false,
        }
    }

    fn on_control(
        shadows: &mut ShadowPipelineContext,
        ctx: &mut AppContext,
        control: Control,
    ) -> Result<(), GraphicsError> {
        match control {
            Control::Technique(technique) => {
                let active = shadows.set_technique(technique);
                if active != technique {
                    log::warn!("{technique} unavailable on this device, staying on {active}");
                }
            }
            Control::ToggleVsync => {
                let vsync = !shadows.settings().vsync;
                shadows.set_vsync(vsync, |vsync| ctx.set_surface_vsync(vsync))?;
            }
            Control::Exit => {}
            other => {
                other.apply(shadows.settings_mut());
                let settings = shadows.settings();
                log::info!(
                    "blur {} | bounce {:.1} | light r={:.1} incl={:.1} az={:.1} I={:.2} A={:.2}",
                    settings.blur_count(),
                    settings.bounce_speed(),
                    settings.light.radius(),
                    settings.light.inclination(),
                    settings.light.azimuth(),
                    settings.light.intensity().x,
                    settings.light.ambient().x
                );
            }
        }
        Ok(())
    }
}

impl AppHandler for MomentShadowsDemo {
    fn on_init(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
        log::info!("Initializing Moment Shadows demo");

        let config = ShadowPipelineConfig::default()
            .with_seed(self.seed)
            .with_output(ctx.surface_format(), ctx.width(), ctx.height());
        let mut settings = self.initial.clone();
        settings.vsync = ctx.vsync();

        let mut shadows = ShadowPipelineContext::new(ctx.device(), config, settings)?;
        let requested = self.initial.technique;
        if shadows.set_technique(requested) != requested {
            log::warn!("{requested} unavailable on this device, using VSM");
        }
        log::info!("{}", controls::HELP);

        self.shadows = Some(shadows);
        Ok(())
    }

    fn on_resize(&mut self, ctx: &mut AppContext) -> Result<(), GraphicsError> {
        match &mut self.shadows {
            Some(shadows) => shadows.resize(ctx.width(), ctx.height()),
            None => Ok(()),
        }
    }

    fn on_update(&mut self, ctx: &mut AppContext) -> bool {
        if self.exit_requested {
            return false;
        }
        if let Some(shadows) = &mut self.shadows {
            shadows.update(ctx.delta_time());
        }
        true
    }

    fn on_draw(&mut self, ctx: DrawContext) -> Result<(), GraphicsError> {
        let Some(shadows) = &mut self.shadows else {
            ctx.present();
            return Ok(());
        };

        let record = shadows.render_frame(ctx.output())?;
        ctx.present();

        if record.frame_number % STATUS_INTERVAL == 0 {
            log::info!(
                "Frame {}: {} with {} blurs, {} passes, {} barriers",
                record.frame_number,
                record.technique,
                record.blur_count,
                record.pass_count,
                record.barrier_count
            );
        }
        Ok(())
    }

    fn on_key(&mut self, ctx: &mut AppContext, event: &KeyEvent) {
        if !event.state.is_pressed() {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(control) = Control::from_key(code) else {
            return;
        };
        // Held V would flip vsync every repeat.
        if event.repeat && control == Control::ToggleVsync {
            return;
        }

        if control == Control::Exit {
            self.exit_requested = true;
            return;
        }
        if let Some(shadows) = &mut self.shadows
            && let Err(e) = Self::on_control(shadows, ctx, control)
        {
            log::error!("Failed to apply {:?}: {}", control, e);
        }
    }

    fn on_shutdown(&mut self, _ctx: &mut AppContext) {
        log::info!("Shutting down Moment Shadows demo");
        if let Some(shadows) = self.shadows.take()
            && let Err(e) = shadows.shutdown()
        {
            log::error!("Shadow pipeline teardown failed: {}", e);
        }
    }
}

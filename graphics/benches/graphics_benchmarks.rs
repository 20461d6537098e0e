use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use penumbra_graphics::shadows::{
    BlurPhase, BlurSlotLayout, LightState, SceneObjectSet, ShadowPipelineConfig,
    ShadowPipelineContext, ShadowSettings, SphereLayout, Technique,
};
use penumbra_graphics::{
    GraphicsInstance, RenderTarget, TextureDescriptor, TextureFormat, TextureUsage,
};

// ---------------------------------------------------------------------------
// Frame recording on the dummy backend
// ---------------------------------------------------------------------------

fn bench_render_frame(c: &mut Criterion) {
    let device = GraphicsInstance::dummy().create_device().unwrap();
    let config = ShadowPipelineConfig::default().with_output(TextureFormat::Bgra8UnormSrgb, 1280, 720);
    let output = RenderTarget::from_texture(
        device
            .create_texture(
                &TextureDescriptor::new_2d(
                    1280,
                    720,
                    TextureFormat::Bgra8UnormSrgb,
                    TextureUsage::RENDER_ATTACHMENT,
                )
                .with_label("output"),
            )
            .unwrap(),
    );

    let mut group = c.benchmark_group("render_frame");
    for technique in Technique::ALL {
        let mut settings = ShadowSettings::default();
        settings.technique = technique;
        let mut context = ShadowPipelineContext::new(&device, config.clone(), settings).unwrap();

        for blur_count in [0, 1, 8] {
            context.settings_mut().set_blur_count(blur_count);
            group.bench_with_input(
                BenchmarkId::new(technique.name(), blur_count),
                &blur_count,
                |b, _| {
                    b.iter(|| {
                        context.update(1.0 / 60.0);
                        black_box(context.render_frame(output.clone()).unwrap());
                    });
                },
            );
        }
        context.shutdown().unwrap();
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Scene animation
// ---------------------------------------------------------------------------

fn bench_scene_update(c: &mut Criterion) {
    let light = LightState::default();
    c.bench_function("scene_update_29_spheres", |b| {
        let mut scene = SceneObjectSet::new(1, &SphereLayout::grid());
        b.iter(|| {
            scene.update(black_box(1.0 / 60.0), 1.0, &light);
        });
    });
}

// ---------------------------------------------------------------------------
// Blur slot addressing
// ---------------------------------------------------------------------------

fn bench_blur_slots(c: &mut Criterion) {
    let slots = BlurSlotLayout::new(8, 3);
    c.bench_function("blur_slot_sweep", |b| {
        b.iter(|| {
            let mut sum = 0u32;
            for frame in 0..3 {
                for iteration in 0..8 {
                    sum += slots.blur_descriptor_slot(frame, iteration, BlurPhase::Horizontal);
                    sum += slots.blur_descriptor_slot(frame, iteration, BlurPhase::Vertical);
                }
            }
            black_box(sum)
        });
    });
}

criterion_group!(benches, bench_render_frame, bench_scene_update, bench_blur_slots);
criterion_main!(benches);

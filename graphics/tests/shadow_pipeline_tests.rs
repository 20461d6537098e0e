//! Integration tests for the shadow pipeline.
//!
//! These tests drive [`ShadowPipelineContext`] end to end on the dummy
//! backend and check the recorded command stream: pass order, state
//! transitions, dispatch sizes, descriptor slots and teardown order.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test --test shadow_pipeline_tests
//! ```

mod common;

use std::collections::HashSet;

use rstest::rstest;

use common::{
    Backend, TestContext, created, dispatches, draws, pass_names, released, transitions,
};
use penumbra_graphics::materials::{BoundResource, MaterialDescriptor, ShaderSource};
use penumbra_graphics::shader::validate_material;
use penumbra_graphics::shadows::{
    ShadowPipelineConfig, ShadowPipelineContext, ShadowSettings, Technique, blur_layout,
    blur_source, frame_layout, light_layout, object_layout,
};
use penumbra_graphics::{
    DummyBackend, DummyEvent, GraphicsError, GraphicsInstance, ResourceState, TextureFormat,
    VertexLayout,
};

fn settings(technique: Technique, blur_count: u32) -> ShadowSettings {
    let mut settings = ShadowSettings::default();
    settings.technique = technique;
    settings.set_blur_count(blur_count);
    settings
}

/// Transitions placed before `pass`, as an unordered set.
fn transitions_into(
    events: &[DummyEvent],
    pass: &str,
) -> HashSet<(String, ResourceState)> {
    transitions(events)
        .into_iter()
        .filter(|(p, _, _)| p == pass)
        .map(|(_, texture, to)| (texture, to))
        .collect()
}

fn set(entries: &[(&str, ResourceState)]) -> HashSet<(String, ResourceState)> {
    entries.iter().map(|(t, s)| (t.to_string(), *s)).collect()
}

/// Label of the texture bound as `shadowMap` in the main pass's frame slot.
fn bound_shadow_map(ctx: &TestContext, slot: usize) -> String {
    let group = ctx.context.frame_table().group(slot as u32).unwrap();
    group
        .entries
        .iter()
        .find(|e| e.binding == 3)
        .and_then(|e| match &e.resource {
            BoundResource::Texture(texture) => texture.label().map(str::to_string),
            _ => None,
        })
        .unwrap()
}

// ============================================================================
// Blur state machine
// ============================================================================

#[rstest]
#[case(0)]
#[case(1)]
#[case(2)]
#[case(3)]
#[case(4)]
#[case(5)]
#[case(6)]
#[case(7)]
#[case(8)]
fn test_blur_transitions(#[case] blur_count: u32) {
    use ResourceState::{ShaderResource, UnorderedAccess};

    let mut ctx = TestContext::recording(settings(Technique::Vsm, blur_count));
    ctx.take_events();

    // The first frame starts from undefined state, the second from the
    // state the first one left behind. Both must emit the same blur pattern.
    for _ in 0..2 {
        ctx.context.render_frame(ctx.output.clone()).unwrap();
        let events = ctx.take_events();

        let blur_passes: Vec<_> = pass_names(&events)
            .into_iter()
            .filter(|name| name.starts_with("blur_"))
            .collect();
        assert_eq!(blur_passes.len() as u32, 2 * blur_count);

        let blur_transitions = transitions(&events)
            .into_iter()
            .filter(|(pass, _, _)| pass.starts_with("blur_"))
            .count();
        assert_eq!(blur_transitions as u32, 4 * blur_count);

        for i in 0..blur_count {
            let source = if i == 0 {
                "shadow_map_vsm"
            } else {
                "blur_vertical_vsm"
            };
            assert_eq!(
                transitions_into(&events, &format!("blur_horizontal_{i}")),
                set(&[
                    (source, ShaderResource),
                    ("blur_horizontal_vsm", UnorderedAccess)
                ])
            );
            assert_eq!(
                transitions_into(&events, &format!("blur_vertical_{i}")),
                set(&[
                    ("blur_horizontal_vsm", ShaderResource),
                    ("blur_vertical_vsm", UnorderedAccess)
                ])
            );
        }

        let expected_source = if blur_count == 0 {
            "shadow_map_vsm"
        } else {
            "blur_vertical_vsm"
        };
        assert!(
            transitions_into(&events, "main")
                .contains(&(expected_source.to_string(), ShaderResource))
        );
    }
}

#[rstest]
#[case(2)]
#[case(5)]
#[case(8)]
fn test_ping_pong_chains_iterations(#[case] blur_count: u32) {
    let mut ctx = TestContext::recording(settings(Technique::Vsm, blur_count));
    ctx.take_events();
    ctx.context.render_frame(ctx.output.clone()).unwrap();
    let events = ctx.take_events();

    for k in 1..blur_count {
        let written_by_previous: HashSet<_> =
            transitions_into(&events, &format!("blur_vertical_{}", k - 1))
                .into_iter()
                .filter(|(_, state)| *state == ResourceState::UnorderedAccess)
                .map(|(texture, _)| texture)
                .collect();
        let read_by_current: HashSet<_> =
            transitions_into(&events, &format!("blur_horizontal_{k}"))
                .into_iter()
                .filter(|(_, state)| *state == ResourceState::ShaderResource)
                .map(|(texture, _)| texture)
                .collect();
        assert_eq!(written_by_previous, read_by_current);
    }
}

#[test]
fn test_descriptor_slots_disjoint_across_frames() {
    let mut ctx = TestContext::recording(settings(Technique::Vsm, 8));
    ctx.take_events();

    let mut blur_slots = HashSet::new();
    let mut object_slots = HashSet::new();
    let mut frame_slots = Vec::new();
    for _ in 0..3 {
        ctx.context.render_frame(ctx.output.clone()).unwrap();
        for event in ctx.take_events() {
            match event {
                DummyEvent::Dispatch { bindings, .. } => {
                    for binding in bindings {
                        assert!(
                            blur_slots.insert((binding.table, binding.slot)),
                            "blur slot {} reused",
                            binding.slot
                        );
                    }
                }
                DummyEvent::Draw { pass, bindings, .. } => {
                    for binding in bindings {
                        match binding.table.as_str() {
                            "objects" => {
                                object_slots.insert((pass.clone(), binding.slot));
                            }
                            "frame" => frame_slots.push(binding.slot),
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
    }
    assert_eq!(blur_slots.len(), 3 * 8 * 2);
    // 27 spheres and the plane in the shadow pass, plus the locator in the
    // main pass, each frame in its own object slots.
    assert_eq!(object_slots.len(), 3 * (28 + 29));
    let distinct_frames: HashSet<_> = frame_slots.into_iter().collect();
    assert_eq!(distinct_frames, HashSet::from([0, 1, 2]));
}

// ============================================================================
// Frame ring
// ============================================================================

#[test]
fn test_slot_reused_only_after_fence() {
    let mut ctx = TestContext::deferred(ShadowSettings::default());
    let device = ctx.device.clone();
    let dummy = device.dummy().unwrap();

    let first = ctx.context.render_frame(ctx.output.clone()).unwrap();
    ctx.context.render_frame(ctx.output.clone()).unwrap();
    ctx.context.render_frame(ctx.output.clone()).unwrap();
    assert_eq!(dummy.pending_count(), 3);
    assert!(!ctx.context.ring().is_slot_ready(0));
    assert!(!first.fence.is_signaled());

    assert!(dummy.complete_oldest());
    assert!(first.fence.is_signaled());
    assert!(ctx.context.ring().is_slot_ready(0));

    let fourth = ctx.context.render_frame(ctx.output.clone()).unwrap();
    assert_eq!(fourth.slot, 0);
    assert_eq!(fourth.frame_number, 4);
    assert_eq!(dummy.pending_count(), 3);

    dummy.complete_all();
    assert!(ctx.context.ring().is_idle());
}

#[test]
fn test_device_lost_surfaces_from_render_frame() {
    let mut ctx = TestContext::deferred(ShadowSettings::default());
    let device = ctx.device.clone();
    let dummy = device.dummy().unwrap();

    for _ in 0..3 {
        ctx.context.render_frame(ctx.output.clone()).unwrap();
    }
    dummy.lose_device();
    ctx.take_events();

    let result = ctx.context.render_frame(ctx.output.clone());
    assert!(matches!(result, Err(GraphicsError::DeviceLost)));
    assert_eq!(ctx.context.ring().frame_count(), 3);
    assert!(ctx.context.ring().slot(0).commands().is_some());
    // Nothing was written into the slot the GPU never released.
    assert!(ctx.take_events().is_empty());

    assert!(matches!(ctx.context.shutdown(), Err(GraphicsError::DeviceLost)));
}

// ============================================================================
// Scene
// ============================================================================

#[test]
fn test_same_seed_same_frames() {
    let run = |seed: u64| {
        let mut ctx = TestContext::with_backend(
            DummyBackend::new(),
            ShadowPipelineConfig::default()
                .with_seed(seed)
                .with_shadow_map_size(256),
            ShadowSettings::default(),
        );
        let mut scenes = Vec::new();
        for dt in [0.016, 0.016, 0.033, 0.1] {
            ctx.context.update(dt);
            ctx.context.render_frame(ctx.output.clone()).unwrap();
            scenes.push(ctx.context.scene().clone());
        }
        scenes
    };
    assert_eq!(run(9), run(9));
    assert_ne!(run(9), run(10));
}

#[test]
fn test_scene_larger_than_object_capacity() {
    let device = GraphicsInstance::dummy().create_device().unwrap();
    let config = ShadowPipelineConfig::default().with_object_capacity(16);
    let result = ShadowPipelineContext::new(&device, config, ShadowSettings::default());
    assert!(matches!(result, Err(GraphicsError::InvalidParameter(_))));
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_vsm_two_blurs_end_to_end() {
    let mut ctx = TestContext::recording(settings(Technique::Vsm, 2));
    let light = ctx.context.settings().light;
    assert_eq!(
        (light.radius(), light.inclination(), light.azimuth()),
        (100.0, 60.0, 0.0)
    );

    let (target, _) = ctx.context.targets(Technique::Vsm).unwrap();
    assert_eq!((target.color.width(), target.color.height()), (2048, 2048));
    assert_eq!(target.color.format(), TextureFormat::Rg32Float);
    ctx.take_events();

    ctx.context.update(0.016);
    let record = ctx.context.render_frame(ctx.output.clone()).unwrap();
    let events = ctx.take_events();

    assert_eq!(
        pass_names(&events),
        vec![
            "shadow_map",
            "blur_horizontal_0",
            "blur_vertical_0",
            "blur_horizontal_1",
            "blur_vertical_1",
            "main"
        ]
    );
    let groups: Vec<_> = dispatches(&events).into_iter().map(|(_, g)| g).collect();
    assert_eq!(groups, vec![[129, 129, 1]; 4]);

    assert_eq!(record.shadow_source.label(), Some("blur_vertical_vsm"));
    assert_eq!(bound_shadow_map(&ctx, record.slot), "blur_vertical_vsm");

    let shadow_draws = draws(&events, "shadow_map");
    let main_draws = draws(&events, "main");
    assert_eq!(shadow_draws.iter().filter(|m| **m == "sphere").count(), 27);
    assert!(!shadow_draws.contains(&"locator"));
    assert_eq!(main_draws.len(), shadow_draws.len() + 1);
    assert_eq!(main_draws.last(), Some(&"locator"));
    assert!(events.iter().any(|e| matches!(e, DummyEvent::Submit { passes: 6, .. })));
}

#[test]
fn test_no_blur_end_to_end() {
    let mut ctx = TestContext::recording(settings(Technique::Vsm, 0));
    ctx.take_events();
    let record = ctx.context.render_frame(ctx.output.clone()).unwrap();
    let events = ctx.take_events();

    assert!(dispatches(&events).is_empty());
    assert_eq!(pass_names(&events), vec!["shadow_map", "main"]);
    assert_eq!(record.shadow_source.label(), Some("shadow_map_vsm"));
    assert_eq!(bound_shadow_map(&ctx, record.slot), "shadow_map_vsm");
    assert_eq!(
        transitions_into(&events, "main")
            .into_iter()
            .filter(|(texture, _)| texture.starts_with("shadow_map"))
            .collect::<Vec<_>>(),
        vec![("shadow_map_vsm".to_string(), ResourceState::ShaderResource)]
    );
}

#[rstest]
#[case::vsm(Technique::Vsm, TextureFormat::Rg32Float)]
#[case::msm(Technique::Msm, TextureFormat::Rgba16Unorm)]
fn test_technique_targets(#[case] technique: Technique, #[case] format: TextureFormat) {
    let mut ctx = TestContext::recording(settings(technique, 1));
    let (target, scratch) = ctx.context.targets(technique).unwrap();
    assert_eq!(target.color.format(), format);
    assert_eq!(scratch.horizontal.format(), format);
    assert_eq!(scratch.vertical.format(), format);

    let record = ctx.context.render_frame(ctx.output.clone()).unwrap();
    assert_eq!(record.technique, technique);
    assert_eq!(
        record.shadow_source.label().map(str::to_string),
        Some(format!("blur_vertical_{}", technique.name()))
    );
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn test_teardown_releases_in_reverse_creation_order() {
    let device = penumbra_graphics::GraphicsInstance::with_backend(
        penumbra_graphics::GpuBackend::Dummy(DummyBackend::recording()),
    )
    .create_device()
    .unwrap();
    let context = penumbra_graphics::shadows::ShadowPipelineContext::new(
        &device,
        ShadowPipelineConfig::default(),
        ShadowSettings::default(),
    )
    .unwrap();
    let mut creation = created(&device.dummy().unwrap().take_events());
    assert!(!creation.is_empty());

    context.shutdown().unwrap();
    let events = device.dummy().unwrap().take_events();

    let first_release = events
        .iter()
        .position(|e| matches!(e, DummyEvent::Release { .. }))
        .unwrap();
    let first_wait = events
        .iter()
        .position(|e| *e == DummyEvent::WaitIdle)
        .unwrap();
    assert!(first_wait < first_release);

    creation.reverse();
    assert_eq!(released(&events), creation);
}

// ============================================================================
// Shaders
// ============================================================================

#[rstest]
#[case::vsm(Technique::Vsm)]
#[case::msm(Technique::Msm)]
fn test_shaders_match_layouts(#[case] technique: Technique) {
    let desc = technique.desc();

    let shadow = desc.shadow_shader_pair;
    validate_material(
        &MaterialDescriptor::new()
            .with_shader(ShaderSource::vertex(shadow.source, shadow.vertex_entry))
            .with_shader(ShaderSource::fragment(shadow.source, shadow.fragment_entry))
            .with_binding_layout(light_layout())
            .with_binding_layout(object_layout())
            .with_vertex_layout(VertexLayout::position_only()),
    )
    .unwrap();

    let main = desc.main_shader_pair;
    validate_material(
        &MaterialDescriptor::new()
            .with_shader(ShaderSource::vertex(main.source, main.vertex_entry))
            .with_shader(ShaderSource::fragment(main.source, main.fragment_entry))
            .with_binding_layout(frame_layout())
            .with_binding_layout(object_layout())
            .with_vertex_layout(VertexLayout::position_normal()),
    )
    .unwrap();

    let format = desc.render_target_format;
    validate_material(
        &MaterialDescriptor::new()
            .with_shader(ShaderSource::compute(blur_source(format).unwrap(), "cs_main"))
            .with_binding_layout(blur_layout(format)),
    )
    .unwrap();
}

// ============================================================================
// Backends
// ============================================================================

#[rstest]
#[case::dummy(Backend::Dummy)]
#[case::webgpu(Backend::WebGpu)]
fn test_render_and_shutdown(#[case] backend: Backend) {
    let Some(mut ctx) = TestContext::for_backend(backend, ShadowSettings::default()) else {
        eprintln!("Backend {:?} not available, skipping", backend);
        return;
    };
    for blur_count in [0, 1, 3] {
        ctx.context.settings_mut().set_blur_count(blur_count);
        ctx.context.update(0.016);
        let record = ctx.context.render_frame(ctx.output.clone()).unwrap();
        assert_eq!(record.pass_count as u32, 2 + 2 * blur_count);
    }
    ctx.context.shutdown().unwrap();
}

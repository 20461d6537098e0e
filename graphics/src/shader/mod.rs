//! WGSL validation.
//!
//! Every material's shaders go through naga before the backend sees them:
//! the source is parsed, validated, and checked against the material
//! descriptor. Each entry point must exist with the right stage, and every
//! resource it uses must be declared by the material's binding layouts with
//! a matching kind.

use std::collections::HashMap;

use naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use crate::error::GraphicsError;
use crate::materials::{BindingType, MaterialDescriptor, ShaderStage};

/// A parsed and validated WGSL module.
#[derive(Debug)]
pub struct ValidatedModule {
    pub module: naga::Module,
    pub info: ModuleInfo,
}

/// Parse and validate a WGSL source.
pub fn validate_wgsl(source: &str, label: &str) -> Result<ValidatedModule, GraphicsError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| {
        GraphicsError::ShaderCompilationFailed(format!(
            "{label}: {}",
            e.emit_to_string(source)
        ))
    })?;

    let mut validator = Validator::new(ValidationFlags::all(), Capabilities::all());
    let info = validator.validate(&module).map_err(|e| {
        GraphicsError::ShaderCompilationFailed(format!(
            "{label}: {}",
            e.emit_to_string(source)
        ))
    })?;

    Ok(ValidatedModule { module, info })
}

fn naga_stage(stage: ShaderStage) -> naga::ShaderStage {
    match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
        ShaderStage::Compute => naga::ShaderStage::Compute,
    }
}

fn global_matches(module: &naga::Module, var: &naga::GlobalVariable, binding_type: &BindingType) -> bool {
    let inner = &module.types[var.ty].inner;
    match (binding_type, inner) {
        (BindingType::UniformBuffer, _) => var.space == naga::AddressSpace::Uniform,
        (
            BindingType::Texture { .. },
            naga::TypeInner::Image {
                class: naga::ImageClass::Sampled { .. },
                ..
            },
        ) => true,
        (
            BindingType::StorageTexture(_),
            naga::TypeInner::Image {
                class: naga::ImageClass::Storage { .. },
                ..
            },
        ) => true,
        (BindingType::Sampler { .. }, naga::TypeInner::Sampler { comparison: false }) => true,
        _ => false,
    }
}

/// Validate every shader of a material against its descriptor.
///
/// Identical sources are parsed once.
pub fn validate_material(descriptor: &MaterialDescriptor) -> Result<(), GraphicsError> {
    let label = descriptor.label.as_deref().unwrap_or("unnamed");
    if descriptor.shaders.is_empty() {
        return Err(GraphicsError::InvalidParameter(format!(
            "material {label} has no shaders"
        )));
    }

    let mut modules: HashMap<&str, ValidatedModule> = HashMap::new();

    for shader in &descriptor.shaders {
        let source: &str = &shader.source;
        if !modules.contains_key(source) {
            modules.insert(source, validate_wgsl(source, label)?);
        }
        let validated = &modules[source];

        let Some((index, entry)) = validated
            .module
            .entry_points
            .iter()
            .enumerate()
            .find(|(_, ep)| ep.name == shader.entry_point)
        else {
            return Err(GraphicsError::ShaderCompilationFailed(format!(
                "{label}: entry point {} not found",
                shader.entry_point
            )));
        };

        if entry.stage != naga_stage(shader.stage) {
            return Err(GraphicsError::ShaderCompilationFailed(format!(
                "{label}: entry point {} is a {:?} shader, expected {:?}",
                shader.entry_point, entry.stage, shader.stage
            )));
        }

        let function_info = validated.info.get_entry_point(index);
        for (handle, var) in validated.module.global_variables.iter() {
            let Some(binding) = &var.binding else {
                continue;
            };
            if function_info[handle].is_empty() {
                continue;
            }

            let declared = descriptor
                .binding_layouts
                .get(binding.group as usize)
                .and_then(|layout| layout.entry(binding.binding));
            match declared {
                Some(entry) if global_matches(&validated.module, var, &entry.binding_type) => {}
                Some(entry) => {
                    return Err(GraphicsError::ShaderCompilationFailed(format!(
                        "{label}: {} uses @group({}) @binding({}) as a different kind than the declared {:?}",
                        shader.entry_point, binding.group, binding.binding, entry.binding_type
                    )));
                }
                None => {
                    return Err(GraphicsError::ShaderCompilationFailed(format!(
                        "{label}: {} uses undeclared @group({}) @binding({})",
                        shader.entry_point, binding.group, binding.binding
                    )));
                }
            }
        }
    }

    Ok(())
}

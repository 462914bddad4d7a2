//! WGSL shader sources, compilation and vertex-input reflection.
//!
//! Both backends compile through [`compile`]: the source is parsed and
//! validated with naga, the requested entry point is located, and the
//! vertex stage's `@location` inputs are reflected so an input layout can
//! be checked against them.  Parse and validation failures come back as
//! `ResourceCreation` errors carrying naga's rendered diagnostic.

use std::borrow::Cow;
use std::fmt;

use crate::error::{GraphicsError, ResourceKind};

/// Vertex shader of the blended-Phong material.
pub const BLENDED_PHONG_VS: ShaderSource = ShaderSource::wgsl(
    "blended_phong_vs",
    include_str!("../../../../assets/shaders/blended_phong_vs.wgsl"),
    "vs_main",
);

/// Pixel shader of the blended-Phong material.
pub const BLENDED_PHONG_PS: ShaderSource = ShaderSource::wgsl(
    "blended_phong_ps",
    include_str!("../../../../assets/shaders/blended_phong_ps.wgsl"),
    "ps_main",
);

/// Pipeline stage a program runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    pub(crate) fn resource_kind(self) -> ResourceKind {
        match self {
            Self::Vertex => ResourceKind::VertexShader,
            Self::Pixel => ResourceKind::PixelShader,
        }
    }

    fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Pixel => naga::ShaderStage::Fragment,
        }
    }

    pub fn to_wgpu(self) -> wgpu::ShaderStages {
        match self {
            Self::Vertex => wgpu::ShaderStages::VERTEX,
            Self::Pixel => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

/// A named WGSL program and the entry point to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: Cow<'static, str>,
    pub code: Cow<'static, str>,
    pub entry_point: Cow<'static, str>,
}

impl ShaderSource {
    pub const fn wgsl(name: &'static str, code: &'static str, entry_point: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            code: Cow::Borrowed(code),
            entry_point: Cow::Borrowed(entry_point),
        }
    }

    /// Source built at runtime (generated or read by the caller).
    pub fn owned(name: impl Into<String>, code: impl Into<String>, entry_point: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            code: Cow::Owned(code.into()),
            entry_point: Cow::Owned(entry_point.into()),
        }
    }
}

/// Shader-side type of a vertex input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Float(u8),
    Uint(u8),
    Sint(u8),
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (scalar, n) = match *self {
            Self::Float(n) => ("f32", n),
            Self::Uint(n) => ("u32", n),
            Self::Sint(n) => ("i32", n),
        };
        if n == 1 {
            f.write_str(scalar)
        } else {
            write!(f, "vec{n}<{scalar}>")
        }
    }
}

/// One `@location` input of a vertex entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInput {
    pub location: u32,
    pub name: String,
    pub ty: InputType,
}

/// What the input-layout check needs to know about a compiled program.
///
/// Pixel programs reflect no inputs: their varyings are matched by the
/// pipeline, not by the input layout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShaderReflection {
    pub name: String,
    pub inputs: Vec<ShaderInput>,
}

/// A parsed, validated program.
#[derive(Debug)]
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub module: naga::Module,
    pub reflection: ShaderReflection,
}

/// Parses, validates and reflects `source` for `stage`.
pub fn compile(stage: ShaderStage, source: &ShaderSource) -> Result<CompiledShader, GraphicsError> {
    let kind = stage.resource_kind();
    let fail = |diagnostic: String| {
        log::warn!("shader `{}` rejected: {}", source.name, diagnostic);
        GraphicsError::resource(kind, format!("`{}`: {}", source.name, diagnostic))
    };

    let module = naga::front::wgsl::parse_str(&source.code)
        .map_err(|e| fail(e.emit_to_string(&source.code)))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| fail(e.emit_to_string(&source.code)))?;

    let entry = module
        .entry_points
        .iter()
        .find(|ep| ep.name == source.entry_point && ep.stage == stage.naga())
        .ok_or_else(|| fail(format!("no {:?} entry point `{}`", stage, source.entry_point)))?;

    let inputs = match stage {
        ShaderStage::Vertex => reflect_inputs(&module, &entry.function).map_err(fail)?,
        ShaderStage::Pixel => Vec::new(),
    };

    log::debug!(
        "compiled {:?} shader `{}` ({} inputs)",
        stage,
        source.name,
        inputs.len()
    );

    Ok(CompiledShader {
        stage,
        reflection: ShaderReflection {
            name: source.name.to_string(),
            inputs,
        },
        module,
    })
}

fn reflect_inputs(module: &naga::Module, function: &naga::Function) -> Result<Vec<ShaderInput>, String> {
    let mut inputs = Vec::new();
    for arg in &function.arguments {
        let arg_name = arg.name.clone().unwrap_or_default();
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => {
                inputs.push(ShaderInput {
                    location: *location,
                    ty: input_type(module, arg.ty, &arg_name)?,
                    name: arg_name,
                });
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                // a struct argument carries its bindings on the members
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    for member in members {
                        if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                            let name = member.name.clone().unwrap_or_default();
                            inputs.push(ShaderInput {
                                location: *location,
                                ty: input_type(module, member.ty, &name)?,
                                name,
                            });
                        }
                    }
                }
            }
        }
    }
    inputs.sort_by_key(|i| i.location);
    Ok(inputs)
}

fn input_type(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    name: &str,
) -> Result<InputType, String> {
    let (scalar, components) = match &module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) => (*scalar, 1),
        naga::TypeInner::Vector { size, scalar } => {
            let n = match size {
                naga::VectorSize::Bi => 2,
                naga::VectorSize::Tri => 3,
                naga::VectorSize::Quad => 4,
            };
            (*scalar, n)
        }
        other => return Err(format!("input `{name}` has unsupported type {other:?}")),
    };
    match scalar.kind {
        naga::ScalarKind::Float => Ok(InputType::Float(components)),
        naga::ScalarKind::Uint => Ok(InputType::Uint(components)),
        naga::ScalarKind::Sint => Ok(InputType::Sint(components)),
        other => Err(format!("input `{name}` has unsupported scalar kind {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blended_phong_vs_reflects_three_inputs() {
        let vs = compile(ShaderStage::Vertex, &BLENDED_PHONG_VS).unwrap();
        let locations: Vec<_> = vs.reflection.inputs.iter().map(|i| (i.location, i.ty)).collect();
        assert_eq!(
            locations,
            vec![
                (0, InputType::Float(3)),
                (1, InputType::Float(3)),
                (2, InputType::Float(4)),
            ]
        );
    }

    #[test]
    fn blended_phong_ps_compiles() {
        let ps = compile(ShaderStage::Pixel, &BLENDED_PHONG_PS).unwrap();
        assert!(ps.reflection.inputs.is_empty());
    }

    #[test]
    fn syntax_error_is_a_resource_error() {
        let broken = ShaderSource::owned("broken", "@vertex fn vs_main( -> {", "vs_main");
        let err = compile(ShaderStage::Vertex, &broken).unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ResourceCreation {
                kind: ResourceKind::VertexShader,
                ..
            }
        ));
    }

    #[test]
    fn wrong_stage_entry_point_is_rejected() {
        let err = compile(ShaderStage::Pixel, &BLENDED_PHONG_VS).unwrap_err();
        assert!(err.to_string().contains("entry point"));
    }

    #[test]
    fn argument_inputs_are_reflected() {
        let src = ShaderSource::owned(
            "args",
            "@vertex fn main(@location(1) uv: vec2<f32>, @location(0) id: u32) -> @builtin(position) vec4<f32> {\n\
             return vec4<f32>(uv, f32(id), 1.0);\n}\n",
            "main",
        );
        let vs = compile(ShaderStage::Vertex, &src).unwrap();
        assert_eq!(vs.reflection.inputs[0].ty, InputType::Uint(1));
        assert_eq!(vs.reflection.inputs[1].ty, InputType::Float(2));
    }
}

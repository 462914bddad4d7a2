//! Vertex layout descriptions.
//!
//! A [`VertexLayout`] is the ordered attribute list of one vertex struct:
//! semantic, format, byte offset and the shader location it feeds.  It must
//! match both the memory layout of the struct and the inputs the paired
//! vertex shader declares; the two checks live in
//! [`VertexLayout::validate`] and [`VertexLayout::validate_against`] and are
//! run by every backend when an input layout is created.

use std::fmt;

use crate::error::{GraphicsError, ResourceKind};
use crate::shader::{InputType, ShaderReflection};

/// Format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    Float32x4,
    /// Four bytes normalised to `0.0..=1.0` (`R8G8B8A8_UNORM`).
    Unorm8x4,
    Uint32,
}

impl VertexFormat {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
            Self::Unorm8x4 => 4,
            Self::Uint32 => 4,
        }
    }

    /// The shader-side type this format is read as.
    pub const fn shader_type(self) -> InputType {
        match self {
            Self::Float32x2 => InputType::Float(2),
            Self::Float32x3 => InputType::Float(3),
            Self::Float32x4 | Self::Unorm8x4 => InputType::Float(4),
            Self::Uint32 => InputType::Uint(1),
        }
    }

    pub fn to_wgpu(self) -> wgpu::VertexFormat {
        match self {
            Self::Float32x2 => wgpu::VertexFormat::Float32x2,
            Self::Float32x3 => wgpu::VertexFormat::Float32x3,
            Self::Float32x4 => wgpu::VertexFormat::Float32x4,
            Self::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
            Self::Uint32 => wgpu::VertexFormat::Uint32,
        }
    }
}

/// Meaning of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position,
    Normal,
    Color,
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Position => "POSITION",
            Self::Normal => "NORMAL",
            Self::Color => "COLOR",
        };
        f.write_str(name)
    }
}

/// One attribute of a vertex struct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: Semantic,
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    /// `@location(n)` of the matching vertex shader input.
    pub shader_location: u32,
}

impl VertexAttribute {
    pub const fn new(
        semantic: Semantic,
        format: VertexFormat,
        offset: u32,
        shader_location: u32,
    ) -> Self {
        Self {
            semantic,
            format,
            offset,
            shader_location,
        }
    }

    const fn end(&self) -> u32 {
        self.offset + self.format.size()
    }
}

/// Ordered attribute list of one vertex struct plus its stride.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    pub fn new(stride: u32, attributes: impl Into<Vec<VertexAttribute>>) -> Self {
        Self {
            stride,
            attributes: attributes.into(),
        }
    }

    /// Checks the layout against the vertex memory it describes: every
    /// attribute inside the stride, no two attributes overlapping, no
    /// shader location fed twice.
    pub fn validate(&self) -> Result<(), GraphicsError> {
        if self.attributes.is_empty() {
            return Err(layout_error("layout has no attributes"));
        }
        for (i, a) in self.attributes.iter().enumerate() {
            if a.end() > self.stride {
                return Err(layout_error(format!(
                    "{} at offset {} ({} bytes) overruns the {}-byte vertex",
                    a.semantic,
                    a.offset,
                    a.format.size(),
                    self.stride
                )));
            }
            for b in &self.attributes[i + 1..] {
                if a.offset < b.end() && b.offset < a.end() {
                    return Err(layout_error(format!(
                        "{} ({}..{}) overlaps {} ({}..{})",
                        a.semantic,
                        a.offset,
                        a.end(),
                        b.semantic,
                        b.offset,
                        b.end()
                    )));
                }
                if a.shader_location == b.shader_location {
                    return Err(layout_error(format!(
                        "{} and {} both feed location {}",
                        a.semantic, b.semantic, a.shader_location
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that every input the vertex shader declares is fed by an
    /// attribute of a compatible format.
    pub fn validate_against(&self, reflection: &ShaderReflection) -> Result<(), GraphicsError> {
        for input in &reflection.inputs {
            let attr = self
                .attributes
                .iter()
                .find(|a| a.shader_location == input.location)
                .ok_or_else(|| {
                    layout_error(format!(
                        "shader `{}` input `{}` at location {} has no attribute",
                        reflection.name, input.name, input.location
                    ))
                })?;
            if attr.format.shader_type() != input.ty {
                return Err(layout_error(format!(
                    "{} is {:?} but shader `{}` reads location {} as {}",
                    attr.semantic, attr.format, reflection.name, input.location, input.ty
                )));
            }
        }
        Ok(())
    }

    /// wgpu attribute array for this layout.
    pub fn wgpu_attributes(&self) -> Vec<wgpu::VertexAttribute> {
        self.attributes
            .iter()
            .map(|a| wgpu::VertexAttribute {
                format: a.format.to_wgpu(),
                offset: a.offset as wgpu::BufferAddress,
                shader_location: a.shader_location,
            })
            .collect()
    }
}

fn layout_error(diagnostic: impl Into<String>) -> GraphicsError {
    GraphicsError::resource(ResourceKind::InputLayout, diagnostic)
}

/// Type-erased vertex data ready for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexData {
    pub bytes: Vec<u8>,
    pub stride: u32,
    pub count: u32,
}

impl VertexData {
    pub fn from_slice<V: bytemuck::Pod>(vertices: &[V]) -> Self {
        Self {
            bytes: bytemuck::cast_slice(vertices).to_vec(),
            stride: std::mem::size_of::<V>() as u32,
            count: vertices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::ShaderInput;

    fn phong_layout() -> VertexLayout {
        VertexLayout::new(
            32,
            [
                VertexAttribute::new(Semantic::Position, VertexFormat::Float32x3, 0, 0),
                VertexAttribute::new(Semantic::Normal, VertexFormat::Float32x3, 12, 1),
                VertexAttribute::new(Semantic::Color, VertexFormat::Unorm8x4, 24, 2),
            ],
        )
    }

    fn reflection() -> ShaderReflection {
        let input = |location, name: &str, ty| ShaderInput {
            location,
            name: name.to_string(),
            ty,
        };
        ShaderReflection {
            name: "test_vs".to_string(),
            inputs: vec![
                input(0, "position", InputType::Float(3)),
                input(1, "normal", InputType::Float(3)),
                input(2, "color", InputType::Float(4)),
            ],
        }
    }

    #[test]
    fn phong_layout_is_valid() {
        let layout = phong_layout();
        layout.validate().unwrap();
        layout.validate_against(&reflection()).unwrap();
    }

    #[test]
    fn overlapping_offset_is_rejected() {
        let mut layout = phong_layout();
        layout.attributes[2].offset = 20;
        let err = layout.validate().unwrap_err();
        assert!(matches!(
            err,
            GraphicsError::ResourceCreation {
                kind: ResourceKind::InputLayout,
                ..
            }
        ));
    }

    #[test]
    fn attribute_past_stride_is_rejected() {
        let mut layout = phong_layout();
        layout.stride = 26;
        assert!(layout.validate().is_err());
    }

    #[test]
    fn wrong_format_is_rejected_by_shader_check() {
        let mut layout = phong_layout();
        layout.attributes[1].format = VertexFormat::Float32x2;
        assert!(layout.validate().is_ok());
        assert!(layout.validate_against(&reflection()).is_err());
    }

    #[test]
    fn missing_input_is_rejected() {
        let mut layout = phong_layout();
        layout.attributes.pop();
        let err = layout.validate_against(&reflection()).unwrap_err();
        assert!(err.to_string().contains("location 2"));
    }
}

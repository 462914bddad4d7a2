//! Renderer error types.

use std::fmt;

use thiserror::Error;

/// Category of GPU resource a failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    VertexBuffer,
    IndexBuffer,
    ConstantBuffer,
    VertexShader,
    PixelShader,
    InputLayout,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VertexBuffer => "vertex buffer",
            Self::IndexBuffer => "index buffer",
            Self::ConstantBuffer => "constant buffer",
            Self::VertexShader => "vertex shader",
            Self::PixelShader => "pixel shader",
            Self::InputLayout => "input layout",
        };
        f.write_str(name)
    }
}

/// Errors raised while building meshes, creating bindings or drawing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphicsError {
    /// Bad mesh-generation or construction input, detected before any GPU
    /// resource is touched.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The device rejected a resource.
    #[error("{kind} creation failed: {diagnostic}")]
    ResourceCreation {
        kind: ResourceKind,
        diagnostic: String,
    },

    /// Static bindings were added for a drawable type that already has them.
    #[error("static bindings for `{shape}` are already initialised")]
    DuplicateStaticInit { shape: &'static str },

    /// Activation or draw failed (device lost, incomplete pipeline state).
    #[error("draw failed: {0}")]
    DrawTime(String),
}

impl GraphicsError {
    pub(crate) fn resource(kind: ResourceKind, diagnostic: impl Into<String>) -> Self {
        Self::ResourceCreation {
            kind,
            diagnostic: diagnostic.into(),
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    pub(crate) fn draw(message: impl Into<String>) -> Self {
        Self::DrawTime(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_errors_name_the_kind() {
        let err = GraphicsError::resource(ResourceKind::PixelShader, "unknown identifier `foo`");
        assert_eq!(
            err.to_string(),
            "pixel shader creation failed: unknown identifier `foo`"
        );
    }

    #[test]
    fn duplicate_init_names_the_shape() {
        let err = GraphicsError::DuplicateStaticInit { shape: "pyramid" };
        assert_eq!(
            err.to_string(),
            "static bindings for `pyramid` are already initialised"
        );
    }
}

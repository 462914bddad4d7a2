//! Resource bindings: GPU objects that can be activated against a
//! [`RenderContext`].
//!
//! Every binding is created once through the context (construction fails
//! with `ResourceCreation` when the context rejects it) and re-activated on
//! each draw through [`Bindable::bind`].  Bindings shared by every drawable
//! of a type live in the [`StaticRegistry`](crate::registry::StaticRegistry)
//! behind `Arc<dyn Bindable>`.
//!
//! | Type             | Activation                                  |
//! |------------------|---------------------------------------------|
//! | [`VertexBuffer`] | `set_vertex_buffer(id, stride)`             |
//! | [`IndexBuffer`]  | `set_index_buffer(id)`                      |
//! | [`VertexShader`] | `set_shader(Vertex, id)`                    |
//! | [`PixelShader`]  | `set_shader(Pixel, id)`                     |
//! | [`InputLayout`]  | `set_input_layout(id)`                      |
//! | [`Topology`]     | `set_topology(t)`                           |
//! | [`ConstantBuffer`] | `set_constant_buffer(stage, slot, id)`    |
//! | [`TransformCbuf`]  | per draw, via `update_and_bind`           |

mod buffer;
mod constant;
mod layout;
mod shader;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use constant::{ConstantBuffer, TransformCbuf, Transforms, TRANSFORM_SLOT};
pub use layout::{InputLayout, Topology};
pub use shader::{PixelShader, VertexShader};

use std::fmt;

use crate::context::RenderContext;
use crate::error::GraphicsError;

/// What a binding activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    VertexBuffer,
    IndexBuffer,
    VertexShader,
    PixelShader,
    InputLayout,
    Topology,
    VertexConstants,
    PixelConstants,
}

impl BindingKind {
    /// Shaders, input layout and topology.  These are activated before any
    /// data binding.
    pub fn is_pipeline_state(self) -> bool {
        matches!(
            self,
            Self::VertexShader | Self::PixelShader | Self::InputLayout | Self::Topology
        )
    }
}

/// Something that can be activated against a rendering context.
pub trait Bindable: fmt::Debug {
    fn bind(&self, ctx: &mut dyn RenderContext) -> Result<(), GraphicsError>;
    fn kind(&self) -> BindingKind;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_shaders_layout_and_topology_are_pipeline_state() {
        let pipeline: Vec<_> = [
            BindingKind::VertexBuffer,
            BindingKind::IndexBuffer,
            BindingKind::VertexShader,
            BindingKind::PixelShader,
            BindingKind::InputLayout,
            BindingKind::Topology,
            BindingKind::VertexConstants,
            BindingKind::PixelConstants,
        ]
        .into_iter()
        .filter(|k| k.is_pipeline_state())
        .collect();
        assert_eq!(
            pipeline,
            vec![
                BindingKind::VertexShader,
                BindingKind::PixelShader,
                BindingKind::InputLayout,
                BindingKind::Topology,
            ]
        );
    }
}

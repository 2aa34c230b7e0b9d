/// Corner of the shared unit quad. Every sprite is this quad transformed by
/// its instance's model matrix.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl QuadVertex {
    /// Unit quad centred on the origin. `tex_coords` run top-to-bottom to
    /// match image row order.
    pub const UNIT_QUAD: [QuadVertex; 4] = [
        QuadVertex {
            position: [-0.5, -0.5],
            tex_coords: [0.0, 1.0],
        },
        QuadVertex {
            position: [0.5, -0.5],
            tex_coords: [1.0, 1.0],
        },
        QuadVertex {
            position: [0.5, 0.5],
            tex_coords: [1.0, 0.0],
        },
        QuadVertex {
            position: [-0.5, 0.5],
            tex_coords: [0.0, 0.0],
        },
    ];

    pub const UNIT_QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // position
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(QuadVertex, position) as wgpu::BufferAddress,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                // tex_coords
                wgpu::VertexAttribute {
                    offset: std::mem::offset_of!(QuadVertex, tex_coords) as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Per-draw data: the model matrix and the UV sub-rectangle
/// `[u, v, width, height]` selected by the animation frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SpriteInstance {
    pub model: [[f32; 4]; 4],
    pub uv_rect: [f32; 4],
}

impl SpriteInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 80);
        assert_eq!(SpriteInstance::layout().attributes.len(), 5);
    }

    #[test]
    fn unit_quad_top_edge_samples_first_row() {
        for vertex in QuadVertex::UNIT_QUAD {
            let top = vertex.position[1] > 0.0;
            assert_eq!(vertex.tex_coords[1] == 0.0, top);
        }
    }
}

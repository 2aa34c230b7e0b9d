use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
}

/// Orthographic camera measured in world units rather than pixels: the
/// visible area is `2 * half_extents` wide and tall, centred on `position`.
pub struct Camera2D {
    pub position: Vec2,
    pub half_extents: Vec2,
}

impl Camera2D {
    pub fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            half_extents: Vec2::new(half_width, half_height),
        }
    }

    /// Camera whose vertical extent follows the window aspect ratio.
    pub fn for_viewport(half_width: f32, viewport_width: u32, viewport_height: u32) -> Self {
        let aspect = viewport_height.max(1) as f32 / viewport_width.max(1) as f32;
        Self::new(half_width, half_width * aspect)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(
            -self.half_extents.x,
            self.half_extents.x,
            -self.half_extents.y,
            self.half_extents.y,
            -1.0,
            1.0,
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(-self.position.extend(0.0))
    }

    pub fn build_uniform(&self) -> CameraUniform {
        CameraUniform {
            projection: self.projection().to_cols_array_2d(),
            view: self.view().to_cols_array_2d(),
        }
    }
}

pub mod camera;
pub mod gpu_context;
pub mod sprite_pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use gpu_context::GpuContext;
pub use sprite_pipeline::SpritePipeline;
pub use texture::{decode_rgba, DecodedImage, Texture, TextureId, TextureRegistry};
pub use vertex::{QuadVertex, SpriteInstance};

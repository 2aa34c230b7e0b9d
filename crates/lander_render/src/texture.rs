//! Texture loading: image file → RGBA8 pixels → GPU texture + bind group.
//!
//! Decoding is split from upload so the CPU half can be exercised without a
//! device. Entities refer to textures through `TextureId`, an index into the
//! `TextureRegistry`; they never hold pixel data.

use std::collections::HashMap;
use std::path::Path;

use crate::sprite_pipeline::SpritePipeline;

/// Decoded pixels, rows stored top-to-bottom, 4 bytes per pixel.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn decode_rgba(path: &Path) -> Result<DecodedImage, String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read texture '{}': {e}", path.display()))?;
    decode_rgba_from_memory(&bytes, &path.display().to_string())
}

pub fn decode_rgba_from_memory(bytes: &[u8], label: &str) -> Result<DecodedImage, String> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| format!("Failed to decode texture '{label}': {e}"))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(format!("Texture '{label}' has zero size"));
    }
    Ok(DecodedImage {
        rgba: image.into_raw(),
        width,
        height,
    })
}

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl Texture {
    pub fn from_path(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
    ) -> Result<Self, String> {
        let image = decode_rgba(path)?;
        Ok(Self::from_rgba8(
            device,
            queue,
            &image.rgba,
            image.width,
            image.height,
            &path.display().to_string(),
        ))
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        // Pixel art: nearest filtering, repeat wrapping.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size: (width, height),
        }
    }
}

/// Handle to a texture held by a `TextureRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u32);

pub struct GpuSpriteTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

/// Owns every uploaded texture. Loading the same path twice returns the
/// same id, so the 11 lava blocks share one upload.
#[derive(Default)]
pub struct TextureRegistry {
    textures: Vec<GpuSpriteTexture>,
    by_path: HashMap<String, TextureId>,
}

impl TextureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &SpritePipeline,
        path: &str,
    ) -> Result<TextureId, String> {
        if let Some(&id) = self.by_path.get(path) {
            return Ok(id);
        }
        let texture = Texture::from_path(device, queue, Path::new(path))?;
        log::info!(
            "Loaded texture '{}' ({}x{})",
            path,
            texture.size.0,
            texture.size.1
        );
        let bind_group = pipeline.create_texture_bind_group(device, &texture);
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(GpuSpriteTexture {
            texture,
            bind_group,
        });
        self.by_path.insert(path.to_string(), id);
        Ok(id)
    }

    pub fn get(&self, id: TextureId) -> Option<&GpuSpriteTexture> {
        self.textures.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn estimate_memory_bytes(&self) -> usize {
        self.textures
            .iter()
            .map(|t| (t.texture.size.0 as usize) * (t.texture.size.1 as usize) * 4)
            .sum()
    }
}

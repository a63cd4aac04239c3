// ============================================================================
// SKIN TEXTURE — live feed of the composite into the 3D preview
// ============================================================================

use std::sync::Arc;

use image::RgbaImage;

use super::context::GpuContext;

/// Anything that can receive the composite texture (a GPU texture, a test
/// recorder, an offscreen encoder).
pub trait TextureSink {
    /// Receive the full `width`×`height` RGBA raster.
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]);
}

/// Dirty-flag contract between the layer stack and the renderer.
///
/// The composite raster is the texture source; nothing is copied on write.
/// Every recomposite bumps the generation and the renderer re-samples the
/// raster on its next frame when the generation moved.
#[derive(Clone, Debug)]
pub struct TextureBridge {
    generation: u64,
    presented_generation: u64,
}

impl Default for TextureBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureBridge {
    /// Starts dirty so the first frame always uploads.
    pub fn new() -> Self {
        Self {
            generation: 1,
            presented_generation: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn is_dirty(&self) -> bool {
        self.generation != self.presented_generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Called once per frame.  Hands the current composite to `sink` only if
    /// it changed since the last presented frame; returns whether it did.
    pub fn present(&mut self, composite: &RgbaImage, sink: &mut dyn TextureSink) -> bool {
        if !self.is_dirty() {
            return false;
        }
        sink.upload(composite.width(), composite.height(), composite.as_raw());
        self.presented_generation = self.generation;
        true
    }
}

// ============================================================================
// GPU-SIDE TEXTURE
// ============================================================================

/// The skin as a wgpu texture, sampled with nearest filtering so texels stay
/// crisp on the rig.
pub struct SkinTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    queue: Arc<wgpu::Queue>,
    /// Number of uploads performed, for diagnostics.
    pub uploads: u64,
}

impl SkinTexture {
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Self {
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SkinTexture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("SkinTexture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
            queue: Arc::clone(&ctx.queue),
            uploads: 0,
        }
    }
}

impl TextureSink for SkinTexture {
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) {
        if width != self.width || height != self.height {
            log_err!(
                "SkinTexture: composite is {}x{} but texture is {}x{}, upload skipped",
                width,
                height,
                self.width,
                self.height
            );
            return;
        }

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        self.uploads += 1;
    }
}

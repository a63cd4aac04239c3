// ============================================================================
// GPU CONTEXT — device and queue for the 3D preview
// ============================================================================

use std::sync::Arc;

/// Adapter preference from the `preferred_gpu` setting.
pub fn power_preference(preferred_gpu: &str) -> wgpu::PowerPreference {
    match preferred_gpu.trim().to_ascii_lowercase().as_str() {
        "low power" | "low-power" | "integrated" => wgpu::PowerPreference::LowPower,
        "none" | "any" => wgpu::PowerPreference::None,
        _ => wgpu::PowerPreference::HighPerformance,
    }
}

/// Device, queue and the few adapter facts the preview needs.  The editing
/// core never depends on it: without an adapter there is simply no preview.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    pub backend: wgpu::Backend,
    pub max_texture_dim: u32,
}

impl GpuContext {
    /// Blocking init: hardware adapter first, software rasterizer second.
    pub fn new(preferred_gpu: &str) -> Option<Self> {
        let power = power_preference(preferred_gpu);
        for software in [false, true] {
            match pollster::block_on(Self::request(power, software)) {
                Some(ctx) => return Some(ctx),
                None if !software => log_warn!("[GPU] no hardware adapter, trying software"),
                None => log_warn!("[GPU] no adapter at all, 3D preview disabled"),
            }
        }
        None
    }

    async fn request(power: wgpu::PowerPreference, software: bool) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None,
                force_fallback_adapter: software,
            })
            .await?;

        let info = adapter.get_info();
        let max_texture_dim = adapter.limits().max_texture_dimension_2d;
        let descriptor = wgpu::DeviceDescriptor {
            label: Some("hyskin_preview"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits()),
        };
        let (device, queue) = match adapter.request_device(&descriptor, None).await {
            Ok(pair) => pair,
            Err(e) => {
                log_err!("[GPU] {} refused a device: {}", info.name, e);
                return None;
            }
        };

        log_info!("[GPU] {} ({:?}), max texture {}", info.name, info.backend, max_texture_dim);
        Some(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name: info.name,
            backend: info.backend,
            max_texture_dim,
        })
    }

    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width.max(height) <= self.max_texture_dim
    }

    /// Submit pending writes and wait for the queue to drain.
    pub fn flush(&self) {
        self.queue.submit(None);
        self.device.poll(wgpu::Maintain::Wait);
    }
}

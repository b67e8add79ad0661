use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::window::Window;

use crate::config::GpuConfig;
use crate::error::{GpuError, Result};

/// Check if WebGPU is exposed by the browser.
#[cfg(target_arch = "wasm32")]
fn is_webgpu_supported() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    let navigator = window.navigator();
    match js_sys::Reflect::get(&navigator, &wasm_bindgen::JsValue::from_str("gpu")) {
        Ok(val) => !val.is_undefined() && !val.is_null(),
        Err(_) => false,
    }
}

/// Main GPU context managing wgpu device, queue, and surface
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub config: GpuConfig,
    /// Set from the device-lost callback.
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Initialize GPU context for a window with default configuration.
    ///
    /// This is async to support both native and WASM backends.
    /// On native, use `pollster::block_on()` to call this.
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        Self::with_config(window, GpuConfig::default()).await
    }

    /// Initialize GPU context for a window with custom configuration.
    pub async fn with_config(window: Arc<Window>, config: GpuConfig) -> Result<Self> {
        #[cfg(target_arch = "wasm32")]
        {
            // A failed WebGPU surface can taint the canvas for the WebGL
            // fallback, so the browser build always goes through WebGL.
            if is_webgpu_supported() {
                log::info!("WebGPU detected but using WebGL backend");
            }
            Self::new_with_backend(window, wgpu::Backends::GL, config).await
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::new_with_backend(window, wgpu::Backends::PRIMARY, config).await
        }
    }

    async fn new_with_backend(
        window: Arc<Window>,
        backends: wgpu::Backends,
        config: GpuConfig,
    ) -> Result<Self> {
        log::debug!("Initializing GPU with backends: {:?}", backends);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        let info = adapter.get_info();
        log::info!("GPU adapter: {} ({:?})", info.name, info.backend);

        // WebGL2 has no compute, so start from its limits and lift the
        // resolution limits to what the adapter offers. Large panoramas need
        // the biggest 2D texture we can get.
        let limits = wgpu::Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Panorama Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                memory_hints: wgpu::MemoryHints::default(),
                experimental_features: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);
        device.set_device_lost_callback(move |reason, message| {
            log::error!("GPU device lost ({:?}): {}", reason, message);
            lost_flag.store(true, Ordering::SeqCst);
        });

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let present_mode = if surface_caps.present_modes.contains(&config.present_mode) {
            config.present_mode
        } else {
            wgpu::PresentMode::Fifo
        };

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: config.max_frame_latency,
        };

        surface.configure(&device, &surface_config);

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            config,
            lost,
        })
    }

    /// Handle window resize
    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        self.surface_config.width = new_width.max(1);
        self.surface_config.height = new_height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Reconfigure the surface after it was lost or became outdated.
    pub fn reconfigure(&self) {
        self.surface.configure(&self.device, &self.surface_config);
    }

    /// Whether the device reported itself lost.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    /// Largest width/height a 2D texture may have on this device.
    pub fn max_texture_dimension(&self) -> u32 {
        self.device.limits().max_texture_dimension_2d
    }

    pub fn width(&self) -> u32 {
        self.surface_config.width
    }

    pub fn height(&self) -> u32 {
        self.surface_config.height
    }
}

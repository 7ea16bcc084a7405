//! Global WebGPU context wrapper

use std::sync::Arc;
use wgpu_core::global::Global;
use wgpu_types as wgt;

/// Wrapper around the global WebGPU context samplers are created in
pub struct SamplerContext {
    inner: Arc<Global>,
    instance_desc: wgt::InstanceDescriptor,
}

impl SamplerContext {
    /// Create a new context with validation chosen by build profile
    pub fn new(name: &str) -> Self {
        log::debug!("Initializing sampler context '{}'", name);

        let flags = if cfg!(debug_assertions) {
            log::info!("Debug build detected - enabling advanced validation");
            wgt::InstanceFlags::advanced_debugging()
        } else {
            wgt::InstanceFlags::debugging()
        };

        let instance_desc = wgt::InstanceDescriptor {
            backends: Self::enabled_backends(),
            flags,
            ..Default::default()
        };

        log::debug!("Instance flags: {:?}", flags);
        Self::from_global(Arc::new(Global::new(name, &instance_desc, None)), instance_desc)
    }

    /// Wrap a global owned by the rest of the renderer
    pub fn from_global(global: Arc<Global>, instance_desc: wgt::InstanceDescriptor) -> Self {
        Self {
            inner: global,
            instance_desc,
        }
    }

    /// Get the inner global context
    pub fn inner(&self) -> &Arc<Global> {
        &self.inner
    }

    pub fn instance_desc(&self) -> &wgt::InstanceDescriptor {
        &self.instance_desc
    }

    /// Backends compiled in through cargo features
    pub fn enabled_backends() -> wgt::Backends {
        let mut backends = wgt::Backends::empty();
        if cfg!(feature = "vulkan") {
            backends |= wgt::Backends::VULKAN;
        }
        if cfg!(feature = "metal") {
            backends |= wgt::Backends::METAL;
        }
        if cfg!(feature = "dx12") {
            backends |= wgt::Backends::DX12;
        }
        if cfg!(feature = "gles") {
            backends |= wgt::Backends::GL;
        }
        backends
    }
}

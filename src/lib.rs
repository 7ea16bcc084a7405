//! Memoizing cache of native GPU samplers
//!
//! Callers describe a sampler with a [`SamplerDescriptor`] and ask a
//! [`SamplerCache`] for it. The first request for a descriptor creates the
//! native sampler through a [`SamplerFactory`]; later requests for an equal
//! descriptor return the same handle. [`SamplerCache::terminate`] destroys
//! everything at shutdown.
//!
//! Two factories are provided: [`SamplerDevice`] on top of wgpu-core and,
//! with the `vulkan` feature, [`VulkanSamplerFactory`] on top of `ash`, which
//! also supports platform external formats through YCbCr conversions.

mod cache;
mod context;
mod conversion;
mod device;
mod error;
mod factory;
pub mod logging;
mod sampler;
#[cfg(feature = "vulkan")]
mod vulkan;

pub use cache::{CacheStats, SamplerCache, SharedSamplerCache};
pub use context::SamplerContext;
pub use conversion::{StandardSamplerInfo, LOD_CLAMP_NONE, NON_MIPMAPPED_MAX_LOD};
pub use device::SamplerDevice;
pub use error::{Result, SamplerCacheError};
pub use factory::SamplerFactory;
pub use sampler::{
    ChannelSwizzle, ChromaLocation, CompareFunc, CompareMode, ExternalFormat, MagFilter,
    MinFilter, SamplerDescriptor, SamplerParams, WrapMode, YcbcrConversion, YcbcrModel,
    YcbcrRange,
};
#[cfg(feature = "vulkan")]
pub use vulkan::VulkanSamplerFactory;

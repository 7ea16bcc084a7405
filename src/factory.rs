//! Native sampler creation contract consumed by the cache

use std::fmt::Debug;

use crate::conversion::StandardSamplerInfo;
use crate::error::Result;
use crate::sampler::{ExternalFormat, SamplerParams, YcbcrConversion};

/// Creates and destroys native samplers on behalf of [`crate::SamplerCache`]
///
/// The device is always passed explicitly, so a factory never reaches for
/// ambient global state and can be replaced by a mock in tests. All calls
/// are synchronous.
pub trait SamplerFactory {
    /// Owning device or context
    type Device;
    /// Opaque native sampler handle
    type Handle: Copy + Eq + Debug;

    fn device(&self) -> &Self::Device;

    /// Create a sampler from fully translated parameters
    fn create_standard_sampler(
        &self,
        device: &Self::Device,
        info: &StandardSamplerInfo,
    ) -> Result<Self::Handle>;

    /// Create a sampler for a platform external format
    ///
    /// Receives the untranslated parameters; the generic translation is never
    /// computed for this path.
    fn create_external_sampler(
        &self,
        device: &Self::Device,
        conversion: &YcbcrConversion,
        params: SamplerParams,
        external_format: ExternalFormat,
    ) -> Result<Self::Handle>;

    fn destroy_sampler(&self, device: &Self::Device, handle: Self::Handle);
}

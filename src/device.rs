//! wgpu-core sampler factory

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use wgpu_core::id;
use wgpu_core::resource;
use wgpu_types as wgt;

use crate::context::SamplerContext;
use crate::conversion::StandardSamplerInfo;
use crate::error::{Result, SamplerCacheError};
use crate::factory::SamplerFactory;
use crate::sampler::{ExternalFormat, SamplerParams, YcbcrConversion};

/// Creates samplers on a wgpu-core device
pub struct SamplerDevice {
    context: Arc<SamplerContext>,
    device_id: id::DeviceId,
    label: String,
}

impl SamplerDevice {
    pub fn new(context: Arc<SamplerContext>, device_id: id::DeviceId) -> Self {
        Self::with_label(context, device_id, "Cached Sampler")
    }

    /// Use `label` for every sampler created on this device
    pub fn with_label(
        context: Arc<SamplerContext>,
        device_id: id::DeviceId,
        label: impl Into<String>,
    ) -> Self {
        Self {
            context,
            device_id,
            label: label.into(),
        }
    }

    pub fn context(&self) -> &Arc<SamplerContext> {
        &self.context
    }

    /// Build the wgpu-core descriptor for translated parameters
    ///
    /// wgpu only honours a border colour with `ClampToBorder` and rejects
    /// anisotropy unless every filter is linear, so both are adjusted here.
    pub fn sampler_descriptor<'a>(
        info: &StandardSamplerInfo,
        label: &'a str,
    ) -> Result<resource::SamplerDescriptor<'a>> {
        if info.unnormalized_coordinates {
            return Err(SamplerCacheError::invalid_parameter(
                "unnormalized_coordinates",
                "not supported by wgpu",
            ));
        }

        let all_linear = info.mag_filter == wgt::FilterMode::Linear
            && info.min_filter == wgt::FilterMode::Linear
            && info.mipmap_filter == wgt::MipmapFilterMode::Linear;
        let anisotropy_clamp = if info.anisotropy_enable && !all_linear {
            log::warn!(
                "Dropping anisotropy {} for non-linear filters {:?}/{:?}/{:?}",
                info.max_anisotropy,
                info.mag_filter,
                info.min_filter,
                info.mipmap_filter
            );
            1
        } else {
            info.anisotropy_clamp()
        };

        let border_color = info
            .address_modes
            .contains(&wgt::AddressMode::ClampToBorder)
            .then_some(info.border_color);

        Ok(resource::SamplerDescriptor {
            label: Some(Cow::Borrowed(label)),
            address_modes: info.address_modes,
            mag_filter: info.mag_filter,
            min_filter: info.min_filter,
            mipmap_filter: info.mipmap_filter,
            lod_min_clamp: info.min_lod,
            lod_max_clamp: info.max_lod,
            compare: info.compare_enable.then_some(info.compare),
            anisotropy_clamp,
            border_color,
        })
    }
}

impl SamplerFactory for SamplerDevice {
    type Device = id::DeviceId;
    type Handle = id::SamplerId;

    fn device(&self) -> &id::DeviceId {
        &self.device_id
    }

    fn create_standard_sampler(
        &self,
        device: &id::DeviceId,
        info: &StandardSamplerInfo,
    ) -> Result<id::SamplerId> {
        let desc = Self::sampler_descriptor(info, &self.label)?;

        let global = self.context.inner();
        let (sampler_id, error) = global.device_create_sampler(*device, &desc, None);
        let sampler_id = resolve_created(sampler_id, error, |id| global.sampler_drop(id))?;

        log::debug!("Created wgpu sampler {:?} on device {:?}", sampler_id, device);
        Ok(sampler_id)
    }

    fn create_external_sampler(
        &self,
        _device: &id::DeviceId,
        _conversion: &YcbcrConversion,
        _params: SamplerParams,
        external_format: ExternalFormat,
    ) -> Result<id::SamplerId> {
        Err(SamplerCacheError::ExternalFormatUnsupported {
            format: external_format,
        })
    }

    fn destroy_sampler(&self, device: &id::DeviceId, handle: id::SamplerId) {
        log::debug!("Dropping wgpu sampler {:?} on device {:?}", handle, device);
        self.context.inner().sampler_drop(handle);
    }
}

/// Turn a wgpu-core `(id, error)` pair into a `Result`
///
/// wgpu-core registers an id even when creation fails; that id is released
/// through `drop_id` before the error is returned.
fn resolve_created<I, E: fmt::Debug>(
    id: I,
    error: Option<E>,
    drop_id: impl FnOnce(I),
) -> Result<I> {
    match error {
        None => Ok(id),
        Some(e) => {
            drop_id(id);
            Err(SamplerCacheError::Wgpu(format!("{:?}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{CompareFunc, MagFilter, MinFilter, SamplerParams, WrapMode};

    #[test]
    fn test_descriptor_for_trilinear_anisotropic() {
        let params = SamplerParams::default()
            .with_filter(MagFilter::Linear, MinFilter::LinearMipmapLinear)
            .with_wrap(WrapMode::Repeat)
            .with_anisotropy_log2(3);
        let info = StandardSamplerInfo::from_params(&params);
        let desc = SamplerDevice::sampler_descriptor(&info, "Test Sampler").unwrap();

        assert_eq!(desc.label.as_deref(), Some("Test Sampler"));
        assert_eq!(desc.address_modes, [wgt::AddressMode::Repeat; 3]);
        assert_eq!(desc.anisotropy_clamp, 8);
        assert_eq!(desc.compare, None);
        assert_eq!(desc.border_color, None);
        assert_eq!(desc.lod_min_clamp, 0.0);
    }

    #[test]
    fn test_anisotropy_dropped_for_nearest() {
        let params = SamplerParams::default().with_anisotropy_log2(2);
        let info = StandardSamplerInfo::from_params(&params);
        let desc = SamplerDevice::sampler_descriptor(&info, "Nearest").unwrap();

        assert_eq!(desc.anisotropy_clamp, 1);
    }

    #[test]
    fn test_compare_forwarded_only_when_enabled() {
        let info = StandardSamplerInfo::from_params(&SamplerParams::default());
        let desc = SamplerDevice::sampler_descriptor(&info, "Plain").unwrap();
        assert_eq!(desc.compare, None);

        let params = SamplerParams::default().with_compare(CompareFunc::L);
        let info = StandardSamplerInfo::from_params(&params);
        let desc = SamplerDevice::sampler_descriptor(&info, "Shadow").unwrap();
        assert_eq!(desc.compare, Some(wgt::CompareFunction::Less));
    }

    #[test]
    fn test_failed_creation_drops_error_id() {
        let mut dropped = Vec::new();
        let result = resolve_created(7u32, Some("InvalidAnisotropy(0)"), |id| dropped.push(id));

        assert!(matches!(result, Err(SamplerCacheError::Wgpu(_))));
        assert_eq!(dropped, vec![7]);
    }

    #[test]
    fn test_successful_creation_keeps_id() {
        let mut dropped = Vec::new();
        let result = resolve_created(3u32, None::<String>, |id| dropped.push(id));

        assert_eq!(result.unwrap(), 3);
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_unnormalized_coordinates_rejected() {
        let mut info = StandardSamplerInfo::from_params(&SamplerParams::default());
        info.unnormalized_coordinates = true;

        assert!(matches!(
            SamplerDevice::sampler_descriptor(&info, "Raw"),
            Err(SamplerCacheError::InvalidParameter { .. })
        ));
    }
}

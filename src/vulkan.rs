//! Vulkan sampler factory built on `ash`
//!
//! Standard samplers map one to one onto `vkCreateSampler`. External formats
//! need a `VkSamplerYcbcrConversion` chained with `VkExternalFormatANDROID`;
//! the factory owns those conversions, shares one per (conversion, format)
//! pair and destroys it when its last sampler is destroyed.

use ash::vk;
use hashbrown::HashMap;
use parking_lot::Mutex;
use wgpu_types as wgt;

use crate::conversion::StandardSamplerInfo;
use crate::error::{Result, SamplerCacheError};
use crate::factory::SamplerFactory;
use crate::sampler::{
    ChannelSwizzle, ChromaLocation, ExternalFormat, MagFilter, SamplerParams, YcbcrConversion,
    YcbcrModel, YcbcrRange,
};

type ConversionKey = (YcbcrConversion, ExternalFormat);

struct SharedConversion {
    handle: vk::SamplerYcbcrConversion,
    samplers: usize,
}

#[derive(Default)]
struct ConversionRegistry {
    conversions: HashMap<ConversionKey, SharedConversion>,
    /// Samplers created through the external path and the conversion they use
    external_samplers: HashMap<vk::Sampler, ConversionKey>,
}

impl ConversionRegistry {
    /// Create a sampler bound to the shared conversion for `key`
    ///
    /// The conversion is created on first use. If the sampler cannot be
    /// created, the reference taken for it is released again.
    fn create_sampler(
        &mut self,
        key: ConversionKey,
        create_conversion: impl FnOnce(&ConversionKey) -> Result<vk::SamplerYcbcrConversion>,
        create_sampler: impl FnOnce(vk::SamplerYcbcrConversion) -> Result<vk::Sampler>,
        destroy_conversion: impl FnOnce(vk::SamplerYcbcrConversion),
    ) -> Result<vk::Sampler> {
        let conversion = self.acquire(key, create_conversion)?;
        match create_sampler(conversion) {
            Ok(sampler) => {
                self.external_samplers.insert(sampler, key);
                Ok(sampler)
            }
            Err(e) => {
                self.release(key, destroy_conversion);
                Err(e)
            }
        }
    }

    /// Forget `sampler`, destroying its conversion if it was the last user
    ///
    /// Samplers from the standard path are not tracked and leave the
    /// registry untouched.
    fn sampler_destroyed(
        &mut self,
        sampler: vk::Sampler,
        destroy_conversion: impl FnOnce(vk::SamplerYcbcrConversion),
    ) {
        if let Some(key) = self.external_samplers.remove(&sampler) {
            self.release(key, destroy_conversion);
        }
    }

    fn acquire(
        &mut self,
        key: ConversionKey,
        create_conversion: impl FnOnce(&ConversionKey) -> Result<vk::SamplerYcbcrConversion>,
    ) -> Result<vk::SamplerYcbcrConversion> {
        if let Some(shared) = self.conversions.get_mut(&key) {
            shared.samplers += 1;
            return Ok(shared.handle);
        }

        let handle = create_conversion(&key)?;
        self.conversions.insert(
            key,
            SharedConversion {
                handle,
                samplers: 1,
            },
        );
        Ok(handle)
    }

    fn release(
        &mut self,
        key: ConversionKey,
        destroy_conversion: impl FnOnce(vk::SamplerYcbcrConversion),
    ) {
        let Some(shared) = self.conversions.get_mut(&key) else {
            log::error!("Released unknown YCbCr conversion for external format {}", key.1);
            return;
        };

        shared.samplers -= 1;
        if shared.samplers == 0 {
            let handle = shared.handle;
            self.conversions.remove(&key);
            destroy_conversion(handle);
        }
    }
}

/// Creates native Vulkan samplers on an `ash` device
pub struct VulkanSamplerFactory {
    device: ash::Device,
    registry: Mutex<ConversionRegistry>,
}

impl VulkanSamplerFactory {
    /// The device must have been created with Vulkan 1.1 (or
    /// `VK_KHR_sampler_ycbcr_conversion`) for external formats to work
    pub fn new(device: ash::Device) -> Self {
        Self {
            device,
            registry: Mutex::new(ConversionRegistry::default()),
        }
    }

    /// Number of YCbCr conversions currently alive
    pub fn live_conversions(&self) -> usize {
        self.registry.lock().conversions.len()
    }

    pub fn sampler_create_info<'a>(info: &StandardSamplerInfo) -> vk::SamplerCreateInfo<'a> {
        vk::SamplerCreateInfo::default()
            .mag_filter(filter(info.mag_filter))
            .min_filter(filter(info.min_filter))
            .mipmap_mode(mipmap_mode(info.mipmap_filter))
            .address_mode_u(address_mode(info.address_modes[0]))
            .address_mode_v(address_mode(info.address_modes[1]))
            .address_mode_w(address_mode(info.address_modes[2]))
            .anisotropy_enable(info.anisotropy_enable)
            .max_anisotropy(info.max_anisotropy)
            .compare_enable(info.compare_enable)
            .compare_op(compare_op(info.compare))
            .min_lod(info.min_lod)
            .max_lod(info.max_lod)
            .border_color(border_color(info.border_color))
            .unnormalized_coordinates(info.unnormalized_coordinates)
    }

    /// Conversion info without the external format chained in
    pub fn ycbcr_conversion_create_info<'a>(
        conversion: &YcbcrConversion,
    ) -> vk::SamplerYcbcrConversionCreateInfo<'a> {
        let [r, g, b, a] = conversion.swizzle.map(component_swizzle);
        vk::SamplerYcbcrConversionCreateInfo::default()
            .format(vk::Format::UNDEFINED)
            .ycbcr_model(ycbcr_model(conversion.model))
            .ycbcr_range(ycbcr_range(conversion.range))
            .components(vk::ComponentMapping { r, g, b, a })
            .x_chroma_offset(chroma_location(conversion.x_chroma_offset))
            .y_chroma_offset(chroma_location(conversion.y_chroma_offset))
            .chroma_filter(mag_filter(conversion.chroma_filter))
            .force_explicit_reconstruction(false)
    }

    /// Sampler info for a YCbCr sampler, without the conversion chained in
    ///
    /// Vulkan requires clamp-to-edge addressing, no anisotropy and normalized
    /// coordinates here, and min/mag filters must match the chroma filter.
    /// External images carry a single mip level and are never compared, so
    /// none of the fields of `_params` survive into the sampler.
    pub fn external_sampler_create_info<'a>(
        conversion: &YcbcrConversion,
        _params: SamplerParams,
    ) -> vk::SamplerCreateInfo<'a> {
        let chroma = mag_filter(conversion.chroma_filter);

        vk::SamplerCreateInfo::default()
            .mag_filter(chroma)
            .min_filter(chroma)
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
            .anisotropy_enable(false)
            .max_anisotropy(1.0)
            .compare_enable(false)
            .min_lod(0.0)
            .max_lod(0.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
    }

    fn create_conversion(
        device: &ash::Device,
        key: &ConversionKey,
    ) -> Result<vk::SamplerYcbcrConversion> {
        let mut external = vk::ExternalFormatANDROID::default().external_format(key.1.raw());
        let create_info = Self::ycbcr_conversion_create_info(&key.0).push_next(&mut external);

        let handle = unsafe { device.create_sampler_ycbcr_conversion(&create_info, None) }
            .map_err(|e| {
                SamplerCacheError::ycbcr_conversion(format!(
                    "external format {}: {:?}",
                    key.1, e
                ))
            })?;

        log::info!("Created YCbCr conversion {:?} for external format {}", handle, key.1);
        Ok(handle)
    }

    fn destroy_conversion(device: &ash::Device, handle: vk::SamplerYcbcrConversion) {
        unsafe { device.destroy_sampler_ycbcr_conversion(handle, None) };
        log::debug!("Destroyed YCbCr conversion {:?}", handle);
    }
}

impl SamplerFactory for VulkanSamplerFactory {
    type Device = ash::Device;
    type Handle = vk::Sampler;

    fn device(&self) -> &ash::Device {
        &self.device
    }

    fn create_standard_sampler(
        &self,
        device: &ash::Device,
        info: &StandardSamplerInfo,
    ) -> Result<vk::Sampler> {
        let create_info = Self::sampler_create_info(info);
        let sampler = unsafe { device.create_sampler(&create_info, None) }?;
        Ok(sampler)
    }

    fn create_external_sampler(
        &self,
        device: &ash::Device,
        conversion: &YcbcrConversion,
        params: SamplerParams,
        external_format: ExternalFormat,
    ) -> Result<vk::Sampler> {
        let key = (*conversion, external_format);
        self.registry.lock().create_sampler(
            key,
            |key| Self::create_conversion(device, key),
            |handle| {
                let mut conversion_info =
                    vk::SamplerYcbcrConversionInfo::default().conversion(handle);
                let create_info = Self::external_sampler_create_info(conversion, params)
                    .push_next(&mut conversion_info);
                let sampler = unsafe { device.create_sampler(&create_info, None) }?;
                Ok(sampler)
            },
            |handle| Self::destroy_conversion(device, handle),
        )
    }

    fn destroy_sampler(&self, device: &ash::Device, handle: vk::Sampler) {
        unsafe { device.destroy_sampler(handle, None) };

        self.registry
            .lock()
            .sampler_destroyed(handle, |conversion| Self::destroy_conversion(device, conversion));
    }
}

impl Drop for VulkanSamplerFactory {
    fn drop(&mut self) {
        let registry = self.registry.get_mut();
        if !registry.conversions.is_empty() {
            log::warn!(
                "Vulkan sampler factory dropped with {} live YCbCr conversions",
                registry.conversions.len()
            );
        }
    }
}

fn filter(mode: wgt::FilterMode) -> vk::Filter {
    match mode {
        wgt::FilterMode::Nearest => vk::Filter::NEAREST,
        wgt::FilterMode::Linear => vk::Filter::LINEAR,
    }
}

fn mag_filter(filter: MagFilter) -> vk::Filter {
    match filter {
        MagFilter::Nearest => vk::Filter::NEAREST,
        MagFilter::Linear => vk::Filter::LINEAR,
    }
}

fn mipmap_mode(mode: wgt::MipmapFilterMode) -> vk::SamplerMipmapMode {
    match mode {
        wgt::MipmapFilterMode::Nearest => vk::SamplerMipmapMode::NEAREST,
        wgt::MipmapFilterMode::Linear => vk::SamplerMipmapMode::LINEAR,
    }
}

fn address_mode(mode: wgt::AddressMode) -> vk::SamplerAddressMode {
    match mode {
        wgt::AddressMode::ClampToEdge => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        wgt::AddressMode::Repeat => vk::SamplerAddressMode::REPEAT,
        wgt::AddressMode::MirrorRepeat => vk::SamplerAddressMode::MIRRORED_REPEAT,
        wgt::AddressMode::ClampToBorder => vk::SamplerAddressMode::CLAMP_TO_BORDER,
    }
}

fn compare_op(func: wgt::CompareFunction) -> vk::CompareOp {
    match func {
        wgt::CompareFunction::Never => vk::CompareOp::NEVER,
        wgt::CompareFunction::Less => vk::CompareOp::LESS,
        wgt::CompareFunction::Equal => vk::CompareOp::EQUAL,
        wgt::CompareFunction::LessEqual => vk::CompareOp::LESS_OR_EQUAL,
        wgt::CompareFunction::Greater => vk::CompareOp::GREATER,
        wgt::CompareFunction::NotEqual => vk::CompareOp::NOT_EQUAL,
        wgt::CompareFunction::GreaterEqual => vk::CompareOp::GREATER_OR_EQUAL,
        wgt::CompareFunction::Always => vk::CompareOp::ALWAYS,
    }
}

fn border_color(color: wgt::SamplerBorderColor) -> vk::BorderColor {
    match color {
        wgt::SamplerBorderColor::OpaqueBlack => vk::BorderColor::INT_OPAQUE_BLACK,
        wgt::SamplerBorderColor::OpaqueWhite => vk::BorderColor::INT_OPAQUE_WHITE,
        wgt::SamplerBorderColor::TransparentBlack | wgt::SamplerBorderColor::Zero => {
            vk::BorderColor::INT_TRANSPARENT_BLACK
        }
    }
}

fn ycbcr_model(model: YcbcrModel) -> vk::SamplerYcbcrModelConversion {
    match model {
        YcbcrModel::RgbIdentity => vk::SamplerYcbcrModelConversion::RGB_IDENTITY,
        YcbcrModel::YcbcrIdentity => vk::SamplerYcbcrModelConversion::YCBCR_IDENTITY,
        YcbcrModel::Ycbcr709 => vk::SamplerYcbcrModelConversion::YCBCR_709,
        YcbcrModel::Ycbcr601 => vk::SamplerYcbcrModelConversion::YCBCR_601,
        YcbcrModel::Ycbcr2020 => vk::SamplerYcbcrModelConversion::YCBCR_2020,
    }
}

fn ycbcr_range(range: YcbcrRange) -> vk::SamplerYcbcrRange {
    match range {
        YcbcrRange::ItuFull => vk::SamplerYcbcrRange::ITU_FULL,
        YcbcrRange::ItuNarrow => vk::SamplerYcbcrRange::ITU_NARROW,
    }
}

fn component_swizzle(swizzle: ChannelSwizzle) -> vk::ComponentSwizzle {
    match swizzle {
        ChannelSwizzle::Identity => vk::ComponentSwizzle::IDENTITY,
        ChannelSwizzle::Zero => vk::ComponentSwizzle::ZERO,
        ChannelSwizzle::One => vk::ComponentSwizzle::ONE,
        ChannelSwizzle::R => vk::ComponentSwizzle::R,
        ChannelSwizzle::G => vk::ComponentSwizzle::G,
        ChannelSwizzle::B => vk::ComponentSwizzle::B,
        ChannelSwizzle::A => vk::ComponentSwizzle::A,
    }
}

fn chroma_location(location: ChromaLocation) -> vk::ChromaLocation {
    match location {
        ChromaLocation::CositedEven => vk::ChromaLocation::COSITED_EVEN,
        ChromaLocation::Midpoint => vk::ChromaLocation::MIDPOINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{CompareFunc, MinFilter, WrapMode};
    use ash::vk::Handle;
    use std::cell::{Cell, RefCell};

    /// Hands out sequential conversion and sampler handles, recording destroys
    #[derive(Default)]
    struct FakeDevice {
        next: Cell<u64>,
        conversions_created: Cell<usize>,
        destroyed: RefCell<Vec<vk::SamplerYcbcrConversion>>,
    }

    impl FakeDevice {
        fn next(&self) -> u64 {
            self.next.set(self.next.get() + 1);
            self.next.get()
        }

        fn create_conversion(&self) -> Result<vk::SamplerYcbcrConversion> {
            self.conversions_created.set(self.conversions_created.get() + 1);
            Ok(vk::SamplerYcbcrConversion::from_raw(self.next()))
        }

        fn create_sampler(
            &self,
            registry: &mut ConversionRegistry,
            key: ConversionKey,
        ) -> vk::Sampler {
            registry
                .create_sampler(
                    key,
                    |_| self.create_conversion(),
                    |_| Ok(vk::Sampler::from_raw(self.next())),
                    |c| self.destroyed.borrow_mut().push(c),
                )
                .unwrap()
        }

        fn destroy_sampler(&self, registry: &mut ConversionRegistry, sampler: vk::Sampler) {
            registry.sampler_destroyed(sampler, |c| self.destroyed.borrow_mut().push(c));
        }
    }

    fn video_key() -> ConversionKey {
        let conversion = YcbcrConversion {
            model: YcbcrModel::Ycbcr709,
            chroma_filter: MagFilter::Linear,
            ..Default::default()
        };
        (conversion, ExternalFormat::new(0x3b))
    }

    #[test]
    fn test_samplers_share_one_conversion() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();

        let first = device.create_sampler(&mut registry, video_key());
        let second = device.create_sampler(&mut registry, video_key());

        assert_ne!(first, second);
        assert_eq!(device.conversions_created.get(), 1);
        assert_eq!(registry.conversions.len(), 1);
        assert_eq!(registry.conversions[&video_key()].samplers, 2);
        assert_eq!(registry.external_samplers.len(), 2);
    }

    #[test]
    fn test_conversion_destroyed_after_last_sampler() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();

        let first = device.create_sampler(&mut registry, video_key());
        let second = device.create_sampler(&mut registry, video_key());
        let conversion = registry.conversions[&video_key()].handle;

        device.destroy_sampler(&mut registry, first);
        assert!(device.destroyed.borrow().is_empty());
        assert_eq!(registry.conversions[&video_key()].samplers, 1);

        device.destroy_sampler(&mut registry, second);
        assert_eq!(*device.destroyed.borrow(), vec![conversion]);
        assert!(registry.conversions.is_empty());
        assert!(registry.external_samplers.is_empty());
    }

    #[test]
    fn test_distinct_formats_get_distinct_conversions() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();
        let (conversion, _) = video_key();

        device.create_sampler(&mut registry, video_key());
        device.create_sampler(&mut registry, (conversion, ExternalFormat::new(0x3c)));

        assert_eq!(device.conversions_created.get(), 2);
        assert_eq!(registry.conversions.len(), 2);
    }

    #[test]
    fn test_failed_sampler_releases_conversion() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();

        let result = registry.create_sampler(
            video_key(),
            |_| device.create_conversion(),
            |_| Err(SamplerCacheError::from(vk::Result::ERROR_OUT_OF_DEVICE_MEMORY)),
            |c| device.destroyed.borrow_mut().push(c),
        );

        assert!(matches!(result, Err(SamplerCacheError::OutOfMemory { .. })));
        assert_eq!(device.destroyed.borrow().len(), 1);
        assert!(registry.conversions.is_empty());
        assert!(registry.external_samplers.is_empty());
    }

    #[test]
    fn test_failed_sampler_keeps_shared_conversion() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();
        device.create_sampler(&mut registry, video_key());

        let result = registry.create_sampler(
            video_key(),
            |_| device.create_conversion(),
            |_| Err(SamplerCacheError::from(vk::Result::ERROR_DEVICE_LOST)),
            |c| device.destroyed.borrow_mut().push(c),
        );

        assert!(result.is_err());
        assert!(device.destroyed.borrow().is_empty());
        assert_eq!(registry.conversions[&video_key()].samplers, 1);
    }

    #[test]
    fn test_failed_conversion_registers_nothing() {
        let mut registry = ConversionRegistry::default();

        let result = registry.create_sampler(
            video_key(),
            |_| Err(SamplerCacheError::ycbcr_conversion("format not supported")),
            |_| panic!("sampler created without a conversion"),
            |_| panic!("nothing to destroy"),
        );

        assert!(matches!(result, Err(SamplerCacheError::YcbcrConversion { .. })));
        assert!(registry.conversions.is_empty());
    }

    #[test]
    fn test_standard_sampler_leaves_registry_untouched() {
        let device = FakeDevice::default();
        let mut registry = ConversionRegistry::default();
        device.create_sampler(&mut registry, video_key());

        device.destroy_sampler(&mut registry, vk::Sampler::from_raw(0xdead));

        assert!(device.destroyed.borrow().is_empty());
        assert_eq!(registry.conversions[&video_key()].samplers, 1);
        assert_eq!(registry.external_samplers.len(), 1);
    }

    #[test]
    fn test_ycbcr_models() {
        assert_eq!(
            ycbcr_model(YcbcrModel::RgbIdentity),
            vk::SamplerYcbcrModelConversion::RGB_IDENTITY
        );
        assert_eq!(
            ycbcr_model(YcbcrModel::YcbcrIdentity),
            vk::SamplerYcbcrModelConversion::YCBCR_IDENTITY
        );
        assert_eq!(
            ycbcr_model(YcbcrModel::Ycbcr2020),
            vk::SamplerYcbcrModelConversion::YCBCR_2020
        );
    }

    #[test]
    fn test_standard_create_info() {
        let params = SamplerParams::default()
            .with_filter(MagFilter::Linear, MinFilter::NearestMipmapLinear)
            .with_wrap(WrapMode::MirroredRepeat)
            .with_anisotropy_log2(2)
            .with_compare(CompareFunc::Ne);
        let info = StandardSamplerInfo::from_params(&params);
        let create_info = VulkanSamplerFactory::sampler_create_info(&info);

        assert_eq!(create_info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(create_info.min_filter, vk::Filter::NEAREST);
        assert_eq!(create_info.mipmap_mode, vk::SamplerMipmapMode::LINEAR);
        assert_eq!(create_info.address_mode_u, vk::SamplerAddressMode::MIRRORED_REPEAT);
        assert_eq!(create_info.address_mode_w, vk::SamplerAddressMode::MIRRORED_REPEAT);
        assert_eq!(create_info.anisotropy_enable, vk::TRUE);
        assert_eq!(create_info.max_anisotropy, 4.0);
        assert_eq!(create_info.compare_enable, vk::TRUE);
        assert_eq!(create_info.compare_op, vk::CompareOp::NOT_EQUAL);
        assert_eq!(create_info.max_lod, crate::conversion::LOD_CLAMP_NONE);
        assert_eq!(create_info.border_color, vk::BorderColor::INT_OPAQUE_BLACK);
        assert_eq!(create_info.unnormalized_coordinates, vk::FALSE);
    }

    #[test]
    fn test_ycbcr_conversion_create_info() {
        let conversion = YcbcrConversion {
            model: YcbcrModel::Ycbcr601,
            range: YcbcrRange::ItuNarrow,
            swizzle: [
                ChannelSwizzle::B,
                ChannelSwizzle::G,
                ChannelSwizzle::R,
                ChannelSwizzle::One,
            ],
            x_chroma_offset: ChromaLocation::Midpoint,
            y_chroma_offset: ChromaLocation::CositedEven,
            chroma_filter: MagFilter::Linear,
        };
        let info = VulkanSamplerFactory::ycbcr_conversion_create_info(&conversion);

        assert_eq!(info.format, vk::Format::UNDEFINED);
        assert_eq!(info.ycbcr_model, vk::SamplerYcbcrModelConversion::YCBCR_601);
        assert_eq!(info.ycbcr_range, vk::SamplerYcbcrRange::ITU_NARROW);
        assert_eq!(info.components.r, vk::ComponentSwizzle::B);
        assert_eq!(info.components.a, vk::ComponentSwizzle::ONE);
        assert_eq!(info.x_chroma_offset, vk::ChromaLocation::MIDPOINT);
        assert_eq!(info.chroma_filter, vk::Filter::LINEAR);
    }

    #[test]
    fn test_external_sampler_follows_chroma_filter() {
        let conversion = YcbcrConversion {
            chroma_filter: MagFilter::Linear,
            ..Default::default()
        };
        let params = SamplerParams::default()
            .with_filter(MagFilter::Nearest, MinFilter::NearestMipmapLinear)
            .with_wrap(WrapMode::Repeat)
            .with_anisotropy_log2(3)
            .with_compare(CompareFunc::G);
        let info = VulkanSamplerFactory::external_sampler_create_info(&conversion, params);

        assert_eq!(info.mag_filter, vk::Filter::LINEAR);
        assert_eq!(info.min_filter, vk::Filter::LINEAR);
        assert_eq!(info.mipmap_mode, vk::SamplerMipmapMode::NEAREST);
        assert_eq!(info.address_mode_u, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(info.address_mode_v, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(info.address_mode_w, vk::SamplerAddressMode::CLAMP_TO_EDGE);
        assert_eq!(info.anisotropy_enable, vk::FALSE);
        assert_eq!(info.compare_enable, vk::FALSE);
        assert_eq!(info.max_lod, 0.0);
        assert_eq!(info.unnormalized_coordinates, vk::FALSE);
    }
}

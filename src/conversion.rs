//! Translation of compact sampler parameters into backend-neutral creation info

use wgpu_types as wgt;

use crate::sampler::{CompareFunc, CompareMode, MagFilter, MinFilter, SamplerParams, WrapMode};

/// Max LOD for min filters without mipmaps; keeps sampling on the base level
pub const NON_MIPMAPPED_MAX_LOD: f32 = 0.25;

/// Max LOD meaning "no clamp" (matches `VK_LOD_CLAMP_NONE`)
pub const LOD_CLAMP_NONE: f32 = 1000.0;

/// Fully translated parameters for the generic sampler creation path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardSamplerInfo {
    pub mag_filter: wgt::FilterMode,
    pub min_filter: wgt::FilterMode,
    pub mipmap_filter: wgt::MipmapFilterMode,
    /// U, V, W
    pub address_modes: [wgt::AddressMode; 3],
    pub anisotropy_enable: bool,
    pub max_anisotropy: f32,
    pub compare_enable: bool,
    pub compare: wgt::CompareFunction,
    pub min_lod: f32,
    pub max_lod: f32,
    /// Always an integer opaque black border
    pub border_color: wgt::SamplerBorderColor,
    pub unnormalized_coordinates: bool,
}

impl StandardSamplerInfo {
    pub fn from_params(params: &SamplerParams) -> Self {
        let anisotropy_log2 = params.anisotropy_log2.min(SamplerParams::MAX_ANISOTROPY_LOG2);
        Self {
            mag_filter: mag_filter(params.filter_mag),
            min_filter: min_filter(params.filter_min),
            mipmap_filter: mipmap_filter(params.filter_min),
            address_modes: [
                address_mode(params.wrap_s),
                address_mode(params.wrap_t),
                address_mode(params.wrap_r),
            ],
            anisotropy_enable: anisotropy_log2 != 0,
            max_anisotropy: (1u32 << anisotropy_log2) as f32,
            compare_enable: params.compare_mode != CompareMode::None,
            compare: compare_function(params.compare_func),
            min_lod: 0.0,
            max_lod: max_lod(params.filter_min),
            border_color: wgt::SamplerBorderColor::OpaqueBlack,
            unnormalized_coordinates: false,
        }
    }

    /// Integer anisotropy clamp as used by wgpu (1 when disabled)
    pub fn anisotropy_clamp(&self) -> u16 {
        if self.anisotropy_enable {
            self.max_anisotropy as u16
        } else {
            1
        }
    }
}

pub fn mag_filter(filter: MagFilter) -> wgt::FilterMode {
    match filter {
        MagFilter::Nearest => wgt::FilterMode::Nearest,
        MagFilter::Linear => wgt::FilterMode::Linear,
    }
}

pub fn min_filter(filter: MinFilter) -> wgt::FilterMode {
    match filter {
        MinFilter::Nearest | MinFilter::NearestMipmapNearest | MinFilter::NearestMipmapLinear => {
            wgt::FilterMode::Nearest
        }
        MinFilter::Linear | MinFilter::LinearMipmapNearest | MinFilter::LinearMipmapLinear => {
            wgt::FilterMode::Linear
        }
    }
}

pub fn mipmap_filter(filter: MinFilter) -> wgt::MipmapFilterMode {
    match filter {
        MinFilter::NearestMipmapLinear | MinFilter::LinearMipmapLinear => {
            wgt::MipmapFilterMode::Linear
        }
        _ => wgt::MipmapFilterMode::Nearest,
    }
}

pub fn address_mode(mode: WrapMode) -> wgt::AddressMode {
    match mode {
        WrapMode::ClampToEdge => wgt::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgt::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgt::AddressMode::MirrorRepeat,
    }
}

pub fn compare_function(func: CompareFunc) -> wgt::CompareFunction {
    match func {
        CompareFunc::Le => wgt::CompareFunction::LessEqual,
        CompareFunc::Ge => wgt::CompareFunction::GreaterEqual,
        CompareFunc::L => wgt::CompareFunction::Less,
        CompareFunc::G => wgt::CompareFunction::Greater,
        CompareFunc::E => wgt::CompareFunction::Equal,
        CompareFunc::Ne => wgt::CompareFunction::NotEqual,
        CompareFunc::A => wgt::CompareFunction::Always,
        CompareFunc::N => wgt::CompareFunction::Never,
    }
}

pub fn max_lod(filter: MinFilter) -> f32 {
    if filter.uses_mipmaps() {
        LOD_CLAMP_NONE
    } else {
        NON_MIPMAPPED_MAX_LOD
    }
}

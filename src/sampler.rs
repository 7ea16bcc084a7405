//! Sampler descriptors
//!
//! A [`SamplerDescriptor`] is the cache key: an immutable, fully comparable
//! description of how a texture is sampled. Equality and hashing are
//! structural over every field, including the nested [`SamplerParams`] and
//! [`YcbcrConversion`] records.

use std::fmt;

/// Magnification filter, also used as the chroma filter of a YCbCr conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MagFilter {
    #[default]
    Nearest,
    Linear,
}

/// Minification filter; the mipmap variants also select the mipmap mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MinFilter {
    #[default]
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl MinFilter {
    /// Whether this filter samples from more than the base mip level
    pub fn uses_mipmaps(self) -> bool {
        !matches!(self, MinFilter::Nearest | MinFilter::Linear)
    }
}

/// Texture coordinate wrapping for one axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirroredRepeat,
}

/// Whether depth comparison is performed when sampling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompareMode {
    #[default]
    None,
    CompareToTexture,
}

/// Comparison function used when `CompareMode::CompareToTexture` is set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Less or equal
    #[default]
    Le,
    /// Greater or equal
    Ge,
    /// Strictly less than
    L,
    /// Strictly greater than
    G,
    /// Equal
    E,
    /// Not equal
    Ne,
    /// Always
    A,
    /// Never
    N,
}

/// Compact sampling parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SamplerParams {
    pub filter_mag: MagFilter,
    pub filter_min: MinFilter,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub wrap_r: WrapMode,
    /// log2 of the anisotropy level; 0 disables anisotropic filtering
    pub anisotropy_log2: u8,
    pub compare_mode: CompareMode,
    pub compare_func: CompareFunc,
}

impl SamplerParams {
    /// Largest supported `anisotropy_log2` (128x)
    pub const MAX_ANISOTROPY_LOG2: u8 = 7;

    pub fn with_filter(mut self, mag: MagFilter, min: MinFilter) -> Self {
        self.filter_mag = mag;
        self.filter_min = min;
        self
    }

    /// Use the same wrap mode on all three axes
    pub fn with_wrap(mut self, mode: WrapMode) -> Self {
        self.wrap_s = mode;
        self.wrap_t = mode;
        self.wrap_r = mode;
        self
    }

    /// Clamped to [`Self::MAX_ANISOTROPY_LOG2`]
    pub fn with_anisotropy_log2(mut self, log2: u8) -> Self {
        self.anisotropy_log2 = log2.min(Self::MAX_ANISOTROPY_LOG2);
        self
    }

    pub fn with_compare(mut self, func: CompareFunc) -> Self {
        self.compare_mode = CompareMode::CompareToTexture;
        self.compare_func = func;
        self
    }
}

/// Platform external pixel format identifier (e.g. an Android hardware buffer format)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExternalFormat(u64);

impl ExternalFormat {
    /// Sentinel selecting the generic creation path
    pub const INVALID: ExternalFormat = ExternalFormat(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for ExternalFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Color model of a YCbCr conversion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum YcbcrModel {
    #[default]
    RgbIdentity,
    YcbcrIdentity,
    Ycbcr709,
    Ycbcr601,
    Ycbcr2020,
}

/// Value range of encoded YCbCr samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum YcbcrRange {
    #[default]
    ItuFull,
    ItuNarrow,
}

/// Source of one output channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChannelSwizzle {
    #[default]
    Identity,
    Zero,
    One,
    R,
    G,
    B,
    A,
}

/// Location of downsampled chroma samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChromaLocation {
    #[default]
    CositedEven,
    Midpoint,
}

/// YCbCr conversion parameters; only meaningful for external formats
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct YcbcrConversion {
    pub model: YcbcrModel,
    pub range: YcbcrRange,
    /// R, G, B, A in that order
    pub swizzle: [ChannelSwizzle; 4],
    pub x_chroma_offset: ChromaLocation,
    pub y_chroma_offset: ChromaLocation,
    pub chroma_filter: MagFilter,
}

/// Cache key describing a sampler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SamplerDescriptor {
    pub params: SamplerParams,
    pub external_format: ExternalFormat,
    pub ycbcr_conversion: YcbcrConversion,
}

impl SamplerDescriptor {
    /// Descriptor for the generic creation path
    pub fn new(params: SamplerParams) -> Self {
        Self {
            params,
            external_format: ExternalFormat::INVALID,
            ycbcr_conversion: YcbcrConversion::default(),
        }
    }

    /// Descriptor for a platform external format
    pub fn external(
        params: SamplerParams,
        external_format: ExternalFormat,
        ycbcr_conversion: YcbcrConversion,
    ) -> Self {
        Self {
            params,
            external_format,
            ycbcr_conversion,
        }
    }

    pub fn uses_external_format(&self) -> bool {
        self.external_format.is_valid()
    }
}

impl From<SamplerParams> for SamplerDescriptor {
    fn from(params: SamplerParams) -> Self {
        Self::new(params)
    }
}

//! Error types for the sampler cache
//!
//! Every error in this crate describes a failed native sampler creation.
//! None of them are transient: the cache never retries and never stores a
//! partial entry, so callers should treat an `Err` as a defect in their
//! parameters or their device rather than something to try again.

use std::fmt;
use thiserror::Error;

use crate::sampler::ExternalFormat;

/// Result type alias for sampler cache operations
pub type Result<T> = std::result::Result<T, SamplerCacheError>;

/// Main error type for sampler creation
#[derive(Error, Debug)]
pub enum SamplerCacheError {
    // === Creation errors ===
    #[error("Unable to create sampler: {reason}")]
    SamplerCreation { reason: String },

    #[error("External format {format} is not supported by this backend")]
    ExternalFormatUnsupported { format: ExternalFormat },

    #[error("Unable to create YCbCr conversion: {reason}")]
    YcbcrConversion { reason: String },

    // === Device errors ===
    #[error("Device lost: {reason}")]
    DeviceLost { reason: String },

    #[error("Out of device memory: {context}")]
    OutOfMemory { context: String },

    // === Parameter errors ===
    #[error("Invalid parameter: {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    // === Backend errors ===
    #[error("WGPU error: {0}")]
    Wgpu(String),

    #[cfg(feature = "vulkan")]
    #[error("Vulkan error: {0}")]
    Vulkan(ash::vk::Result),
}

impl SamplerCacheError {
    /// Create a sampler creation error
    pub fn sampler_creation(reason: impl fmt::Display) -> Self {
        Self::SamplerCreation {
            reason: reason.to_string(),
        }
    }

    /// Create a YCbCr conversion error
    pub fn ycbcr_conversion(reason: impl fmt::Display) -> Self {
        Self::YcbcrConversion {
            reason: reason.to_string(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::InvalidParameter {
            parameter: parameter.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an out-of-memory error
    pub fn out_of_memory(context: impl fmt::Display) -> Self {
        Self::OutOfMemory {
            context: context.to_string(),
        }
    }
}

#[cfg(feature = "vulkan")]
impl From<ash::vk::Result> for SamplerCacheError {
    fn from(result: ash::vk::Result) -> Self {
        use ash::vk;
        match result {
            vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
                Self::out_of_memory(format!("{:?}", result))
            }
            vk::Result::ERROR_DEVICE_LOST => Self::DeviceLost {
                reason: format!("{:?}", result),
            },
            other => Self::Vulkan(other),
        }
    }
}

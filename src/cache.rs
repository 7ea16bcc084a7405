//! Sampler caching
//!
//! Native samplers are memoized by [`SamplerDescriptor`] so that identical
//! sampling configurations share one native object. The cache owns every
//! handle it returns; callers must never destroy them. All handles are
//! destroyed together by [`SamplerCache::terminate`].
//!
//! [`SamplerCache`] takes `&mut self` for both operations and provides no
//! internal locking. [`SharedSamplerCache`] puts a single mutex around both
//! operations for callers that need to share the cache between threads.

use hashbrown::HashMap;
use parking_lot::{Mutex, MutexGuard};

use crate::conversion::StandardSamplerInfo;
use crate::error::Result;
use crate::factory::SamplerFactory;
use crate::sampler::SamplerDescriptor;

/// Cache statistics for monitoring effectiveness
///
/// Diagnostics only. Updating them is the one thing a cache hit does; a hit
/// never touches the stored samplers or calls into the factory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: usize,
    /// Lookups that had to call the factory
    pub misses: usize,
    /// Samplers successfully created
    pub created: usize,
    /// Samplers destroyed by `terminate`
    pub destroyed: usize,
    /// Samplers currently owned by the cache
    pub live: usize,
}

/// Memoizing sampler cache
pub struct SamplerCache<F: SamplerFactory> {
    factory: F,
    samplers: HashMap<SamplerDescriptor, F::Handle>,
    stats: CacheStats,
}

impl<F: SamplerFactory> SamplerCache<F> {
    /// Create an empty cache creating its samplers through `factory`
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            samplers: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// Get or create the sampler for `descriptor`
    ///
    /// Equal descriptors always yield the same handle until [`Self::terminate`].
    /// The factory is called only on a miss. A creation error leaves the
    /// cache unchanged and is not retried; it indicates invalid parameters or
    /// a broken device and should be treated as fatal by the caller.
    pub fn get_or_create(&mut self, descriptor: &SamplerDescriptor) -> Result<F::Handle> {
        if let Some(&handle) = self.samplers.get(descriptor) {
            log::debug!("Sampler cache HIT: {:?}", handle);
            self.stats.hits += 1;
            return Ok(handle);
        }

        log::debug!("Sampler cache MISS: {:?}", descriptor);
        self.stats.misses += 1;

        let device = self.factory.device();
        let created = if descriptor.uses_external_format() {
            self.factory.create_external_sampler(
                device,
                &descriptor.ycbcr_conversion,
                descriptor.params,
                descriptor.external_format,
            )
        } else {
            let info = StandardSamplerInfo::from_params(&descriptor.params);
            self.factory.create_standard_sampler(device, &info)
        };

        let handle = created.map_err(|e| {
            log::error!("Unable to create sampler for {:?}: {}", descriptor, e);
            e
        })?;

        self.samplers.insert(*descriptor, handle);
        self.stats.created += 1;
        self.stats.live = self.samplers.len();

        log::info!(
            "Created and cached sampler {:?} (external format: {})",
            handle,
            descriptor.external_format
        );
        Ok(handle)
    }

    /// Destroy every cached sampler and empty the cache
    ///
    /// Handles previously returned by [`Self::get_or_create`] are invalid
    /// afterwards. The cache stays usable and calling this on an empty cache
    /// does nothing.
    pub fn terminate(&mut self) {
        if self.samplers.is_empty() {
            return;
        }

        let device = self.factory.device();
        let count = self.samplers.len();
        for (_, handle) in self.samplers.drain() {
            self.factory.destroy_sampler(device, handle);
        }
        self.stats.destroyed += count;
        self.stats.live = 0;

        log::info!("Terminated sampler cache: {} samplers destroyed", count);
    }

    /// Get cache statistics
    ///
    /// These counters are not part of the caching contract and have no
    /// effect on which handle a lookup returns.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The factory samplers are created with
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: SamplerFactory> Drop for SamplerCache<F> {
    fn drop(&mut self) {
        if !self.samplers.is_empty() {
            log::warn!(
                "Sampler cache dropped with {} live samplers; call terminate() before dropping",
                self.samplers.len()
            );
        }
    }
}

/// [`SamplerCache`] behind a single lock guarding both operations
pub struct SharedSamplerCache<F: SamplerFactory> {
    inner: Mutex<SamplerCache<F>>,
}

impl<F: SamplerFactory> SharedSamplerCache<F> {
    pub fn new(factory: F) -> Self {
        Self {
            inner: Mutex::new(SamplerCache::new(factory)),
        }
    }

    pub fn get_or_create(&self, descriptor: &SamplerDescriptor) -> Result<F::Handle> {
        self.inner.lock().get_or_create(descriptor)
    }

    pub fn terminate(&self) {
        self.inner.lock().terminate();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats()
    }

    /// Lock the cache for a sequence of operations
    pub fn lock(&self) -> MutexGuard<'_, SamplerCache<F>> {
        self.inner.lock()
    }
}

impl<F: SamplerFactory> From<SamplerCache<F>> for SharedSamplerCache<F> {
    fn from(cache: SamplerCache<F>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }
}

//! Translation configuration.

use crate::image::CompositeMode;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options for [`crate::LegacyImageCreator`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TranslationConfig {
    /// Allow virtual stacks for merged chunked data. When false, merged
    /// images are always materialized.
    pub allow_virtual: bool,
    /// Split existing local sources into directory and file name.
    pub resolve_local_origin: bool,
    /// Mode given to composite wrappers.
    pub composite_mode: CompositeMode,
    /// Copy pixel planes in parallel.
    pub parallel_copy: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            allow_virtual: true,
            resolve_local_origin: true,
            composite_mode: CompositeMode::Composite,
            parallel_copy: true,
        }
    }
}

impl TranslationConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables virtual stacks.
    #[must_use]
    pub fn with_allow_virtual(mut self, allow: bool) -> Self {
        self.allow_virtual = allow;
        self
    }

    /// Enables or disables the local filesystem check for the origin.
    #[must_use]
    pub fn with_resolve_local_origin(mut self, resolve: bool) -> Self {
        self.resolve_local_origin = resolve;
        self
    }

    /// Sets the composite mode.
    #[must_use]
    pub fn with_composite_mode(mut self, mode: CompositeMode) -> Self {
        self.composite_mode = mode;
        self
    }

    /// Enables or disables parallel plane copies.
    #[must_use]
    pub fn with_parallel_copy(mut self, parallel: bool) -> Self {
        self.parallel_copy = parallel;
        self
    }
}

//! Runtime configuration.

/// Default cap on follow-up flush passes.
pub const DEFAULT_MAX_FLUSH_PASSES: usize = 64;

/// Tunables for a [`Runtime`](crate::Runtime).
///
/// ```ignore
/// let config = RuntimeConfig::default()
///     .max_flush_passes(8)
///     .warn_on_duplicate_keys(false);
/// let mut runtime = Runtime::with_config(config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of passes a single flush may run before giving up with
    /// [`Error::UpdateLoop`](crate::Error::UpdateLoop). Follow-up passes
    /// happen when `did_mount`/`did_update` hooks schedule more updates.
    pub max_flush_passes: usize,
    /// Emit a warning when siblings share a key.
    pub warn_on_duplicate_keys: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_passes: DEFAULT_MAX_FLUSH_PASSES,
            warn_on_duplicate_keys: true,
        }
    }
}

impl RuntimeConfig {
    /// Set the flush pass cap (clamped to at least one pass).
    pub fn max_flush_passes(mut self, passes: usize) -> Self {
        self.max_flush_passes = passes.max(1);
        self
    }

    /// Enable or disable duplicate key warnings.
    pub fn warn_on_duplicate_keys(mut self, warn: bool) -> Self {
        self.warn_on_duplicate_keys = warn;
        self
    }
}

//! Arena configuration parameters.

/// Configuration for an arena family.
///
/// Read once when the arena is created; every handle derived from that
/// arena shares the resulting settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Target size of each block in bytes.
    ///
    /// Default: 10_240. Values below [`ArenaConfig::MIN_BLOCK_SIZE`] are
    /// raised to the floor when the arena is built.
    pub default_block_size: usize,
}

impl ArenaConfig {
    /// Default block size in bytes.
    pub const DEFAULT_BLOCK_SIZE: usize = 10_240;

    /// Smallest block size an arena will use.
    pub const MIN_BLOCK_SIZE: usize = 256;

    /// Create a config with the given target block size.
    pub fn new(default_block_size: usize) -> Self {
        Self { default_block_size }
    }

    /// Block size the arena will actually use, after applying the floor.
    pub fn effective_block_size(&self) -> usize {
        self.default_block_size.max(Self::MIN_BLOCK_SIZE)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BLOCK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_size_is_10k() {
        let config = ArenaConfig::default();
        assert_eq!(config.effective_block_size(), 10_240);
    }

    #[test]
    fn small_block_size_raised_to_floor() {
        let config = ArenaConfig::new(16);
        assert_eq!(config.default_block_size, 16);
        assert_eq!(config.effective_block_size(), 256);
    }

    #[test]
    fn block_size_at_floor_preserved() {
        assert_eq!(ArenaConfig::new(256).effective_block_size(), 256);
        assert_eq!(ArenaConfig::new(65_536).effective_block_size(), 65_536);
    }
}

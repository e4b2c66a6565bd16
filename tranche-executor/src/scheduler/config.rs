//! Program configuration.

/// Pool sizes of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Idle run states kept for reuse.
    pub run_pool_size: usize,
    /// Idle writer buffers kept for reuse.
    pub buffer_pool_size: usize,
    /// Initial capacity of a fresh writer buffer, in bytes.
    pub buffer_capacity: usize,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            run_pool_size: 16,
            buffer_pool_size: 64,
            buffer_capacity: 4096,
        }
    }
}

impl ProgramConfig {
    /// Create configuration from environment variables.
    ///
    /// Reads the following environment variables, falling back to the
    /// defaults when unset or unparsable:
    /// - `TRANCHE_RUN_POOL_SIZE`: idle run states kept
    /// - `TRANCHE_BUFFER_POOL_SIZE`: idle writer buffers kept
    /// - `TRANCHE_BUFFER_CAPACITY`: initial writer buffer capacity
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            run_pool_size: env_usize("TRANCHE_RUN_POOL_SIZE").unwrap_or(defaults.run_pool_size),
            buffer_pool_size: env_usize("TRANCHE_BUFFER_POOL_SIZE")
                .unwrap_or(defaults.buffer_pool_size),
            buffer_capacity: env_usize("TRANCHE_BUFFER_CAPACITY")
                .unwrap_or(defaults.buffer_capacity),
        }
    }

    /// Set the number of idle run states kept.
    pub fn with_run_pool_size(mut self, size: usize) -> Self {
        self.run_pool_size = size;
        self
    }

    /// Set the number of idle writer buffers kept.
    pub fn with_buffer_pool_size(mut self, size: usize) -> Self {
        self.buffer_pool_size = size;
        self
    }

    /// Set the initial capacity of writer buffers.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|s| s.parse::<usize>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders() {
        let config = ProgramConfig::default()
            .with_run_pool_size(2)
            .with_buffer_pool_size(3)
            .with_buffer_capacity(128);
        assert_eq!(config.run_pool_size, 2);
        assert_eq!(config.buffer_pool_size, 3);
        assert_eq!(config.buffer_capacity, 128);
    }

    #[test]
    fn from_env_without_variables() {
        // Unset variables fall back to the defaults.
        let config = ProgramConfig::from_env();
        assert!(config.buffer_capacity > 0);
    }
}

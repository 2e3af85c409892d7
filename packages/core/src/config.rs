//! Configuration for the tree cache
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for a single store call
const MAX_STORE_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for `TreeCache`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeCacheConfig {
    /// Deadline applied to every store call made while the cache lock is held
    pub store_timeout: Duration,

    /// Compact the store's append log before a forced reload
    pub compact_on_reload: bool,

    /// Capacity of the domain event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for TreeCacheConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(30),
            compact_on_reload: true,
            event_channel_capacity: 128,
        }
    }
}

impl TreeCacheConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.store_timeout.is_zero() {
            return Err("store_timeout must be greater than 0".to_string());
        }

        if self.store_timeout > MAX_STORE_TIMEOUT {
            return Err(format!(
                "store_timeout cannot exceed {:?} (the cache lock is held for the whole call)",
                MAX_STORE_TIMEOUT
            ));
        }

        if self.event_channel_capacity == 0 {
            return Err("event_channel_capacity must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TreeCacheConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = TreeCacheConfig {
            store_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_excessive_timeout_rejected() {
        let config = TreeCacheConfig {
            store_timeout: Duration::from_secs(3600),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("store_timeout cannot exceed"));
    }

    #[test]
    fn test_zero_channel_capacity_rejected() {
        let config = TreeCacheConfig {
            event_channel_capacity: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: TreeCacheConfig =
            serde_json::from_str(r#"{ "compact_on_reload": false }"#).unwrap();
        assert!(!config.compact_on_reload);
        assert_eq!(config.store_timeout, Duration::from_secs(30));
        assert_eq!(config.event_channel_capacity, 128);
    }
}

use serde::Deserialize;

use crate::pool::PoolConfig;

/// What the channel does when a receive reports `BufferTooSmall`.
///
/// Whether the native layer keeps the message queued after an undersized
/// receive depends on the vendor; pick the policy that matches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndersizedReceive {
    /// Re-poll and retry exactly once with a buffer of the newly reported size.
    #[default]
    RetryOnce,
    /// Surface the error immediately.
    Surface,
}

/// Configuration for a [`Channel`](crate::Channel).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Receive buffer pool retention policy.
    pub pool: PoolConfig,
    /// Vendor-documented payload ceiling. Advisory only: larger sends are
    /// logged and still attempted.
    pub advisory_max_payload: Option<usize>,
    /// Policy for undersized receives.
    pub undersized: UndersizedReceive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChannelConfig::default();
        assert_eq!(config.undersized, UndersizedReceive::RetryOnce);
        assert_eq!(config.advisory_max_payload, None);
        assert_eq!(config.pool, PoolConfig::default());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: ChannelConfig = serde_json::from_str(
            r#"{"advisory_max_payload": 16384, "undersized": "surface", "pool": {"high_water_mark": 1024}}"#,
        )
        .unwrap();

        assert_eq!(config.advisory_max_payload, Some(16384));
        assert_eq!(config.undersized, UndersizedReceive::Surface);
        assert_eq!(config.pool.high_water_mark, 1024);
        assert_eq!(config.pool.max_retained, PoolConfig::default().max_retained);
    }
}

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Immutable pool sizing and timeout configuration.
///
/// Missing fields deserialize to the same defaults [`ConnectionPoolConfig::default`] uses,
/// matching the C++ original's constructor defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionPoolConfig {
    pub min_connections: u16,
    pub max_connections: u16,
    pub keep_alive: bool,
    #[serde(with = "duration_secs")]
    pub connection_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub ping_server_interval: Duration,
    #[serde(with = "duration_secs")]
    pub connection_idle_wait: Duration,
    #[serde(with = "duration_secs")]
    pub max_waiting_for_connection: Duration,
    #[serde(with = "duration_secs")]
    pub cleanup_interval: Duration,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 1,
            keep_alive: true,
            connection_timeout: Duration::from_secs(5),
            ping_server_interval: Duration::from_secs(30),
            connection_idle_wait: Duration::from_secs(120),
            max_waiting_for_connection: Duration::from_secs(5),
            cleanup_interval: Duration::from_secs(160),
        }
    }
}

impl ConnectionPoolConfig {
    pub fn builder() -> ConnectionPoolConfigBuilder {
        ConnectionPoolConfigBuilder::new()
    }
}

/// Builder for [`ConnectionPoolConfig`], following the same fluent style as `sqlx`'s
/// `PoolOptions` builder.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionPoolConfigBuilder {
    inner: ConnectionPoolConfig,
}

impl ConnectionPoolConfigBuilder {
    pub fn new() -> Self {
        Self { inner: ConnectionPoolConfig::default() }
    }

    pub fn min_connections(mut self, value: u16) -> Self {
        self.inner.min_connections = value.max(1);
        self
    }

    pub fn max_connections(mut self, value: u16) -> Self {
        self.inner.max_connections = value;
        self
    }

    pub fn keep_alive(mut self, value: bool) -> Self {
        self.inner.keep_alive = value;
        self
    }

    pub fn connection_timeout(mut self, value: Duration) -> Self {
        self.inner.connection_timeout = value;
        self
    }

    pub fn ping_server_interval(mut self, value: Duration) -> Self {
        self.inner.ping_server_interval = value;
        self
    }

    pub fn connection_idle_wait(mut self, value: Duration) -> Self {
        self.inner.connection_idle_wait = value;
        self
    }

    pub fn max_waiting_for_connection(mut self, value: Duration) -> Self {
        self.inner.max_waiting_for_connection = value;
        self
    }

    pub fn cleanup_interval(mut self, value: Duration) -> Self {
        self.inner.cleanup_interval = value;
        self
    }

    pub fn build(mut self) -> ConnectionPoolConfig {
        if self.inner.max_connections < self.inner.min_connections {
            self.inner.max_connections = self.inner.min_connections;
        }
        self.inner
    }
}

impl Default for ConnectionPoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

//! Connection configuration types.

use std::time::Duration;

/// Transport for the initial connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// Plaintext TCP (port 143). **Not recommended for production.**
    Tcp,
    /// Start with plaintext, upgrade in-band after STARTTLS (port 143).
    StartTls,
    /// TLS from the first byte (port 993). **Recommended.**
    #[default]
    Tls,
}

impl Transport {
    /// Returns the default port for this transport.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Tcp | Self::StartTls => 143,
            Self::Tls => 993,
        }
    }
}

/// IMAP connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Transport mode.
    pub transport: Transport,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// Read timeout for response frames; `None` waits indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Config {
    /// Creates a configuration with implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 993,
            transport: Transport::Tls,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Some(Duration::from_secs(60)),
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    transport: Transport,
    connect_timeout: Duration,
    read_timeout: Option<Duration>,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            transport: Transport::Tls,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Some(Duration::from_secs(60)),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the transport mode.
    #[must_use]
    pub const fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the read timeout; `None` waits indefinitely.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            port: self.port.unwrap_or_else(|| self.transport.default_port()),
            host: self.host,
            transport: self.transport,
            connect_timeout: self.connect_timeout,
            read_timeout: self.read_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_ports() {
        assert_eq!(Transport::Tcp.default_port(), 143);
        assert_eq!(Transport::StartTls.default_port(), 143);
        assert_eq!(Transport::Tls.default_port(), 993);
    }

    #[test]
    fn config_new() {
        let config = Config::new("imap.example.com");
        assert_eq!(config.host, "imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.transport, Transport::Tls);
    }

    #[test]
    fn builder_defaults_port_from_transport() {
        let config = Config::builder("imap.example.com")
            .transport(Transport::StartTls)
            .build();
        assert_eq!(config.port, 143);
    }

    #[test]
    fn builder_explicit_port_wins() {
        let config = Config::builder("imap.example.com")
            .transport(Transport::Tcp)
            .port(10_143)
            .build();
        assert_eq!(config.port, 10_143);
    }
}

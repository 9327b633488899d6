//! Resolver server configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DnsecureError;
use crate::platform::DnsSettings;

/// DNS-over-TLS server settings.
///
/// # Example
///
/// ```
/// use dnsecure::DoTConfig;
///
/// let config = DoTConfig::new(["1.1.1.1", "1.0.0.1"])
///     .with_server_name("cloudflare-dns.com");
///
/// assert_eq!(config.servers, vec!["1.1.1.1", "1.0.0.1"]);
/// assert_eq!(config.server_name.as_deref(), Some("cloudflare-dns.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoTConfig {
    /// Server IP addresses, in preference order.
    /// Syntax is validated by the platform, not here.
    #[serde(default)]
    pub servers: Vec<String>,

    /// TLS name presented by the servers (e.g., `"dns.google"`).
    #[serde(
        rename = "serverName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_name: Option<String>,
}

impl DoTConfig {
    /// Creates a config with the given servers and no TLS name.
    #[must_use]
    pub fn new<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            server_name: None,
        }
    }

    /// Sets the TLS server name.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }
}

/// DNS-over-HTTPS server settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DoHConfig {
    /// Server IP addresses, in preference order.
    #[serde(default)]
    pub servers: Vec<String>,

    /// Query URL (e.g., `"https://dns.google/dns-query"`).
    #[serde(
        rename = "serverURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_url: Option<String>,
}

impl DoHConfig {
    /// Creates a config with the given servers and no query URL.
    #[must_use]
    pub fn new<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            server_url: None,
        }
    }

    /// Sets the query URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }
}

/// Server configuration of a resolver: exactly one of DoT or DoH.
///
/// Replacing the value with the other variant drops every field of the
/// previous one; there is no shared state between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration", into = "RawConfiguration")]
pub enum ResolverConfig {
    DnsOverTls(DoTConfig),
    DnsOverHttps(DoHConfig),
}

impl ResolverConfig {
    /// Server addresses of whichever variant is active.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        match self {
            Self::DnsOverTls(c) => &c.servers,
            Self::DnsOverHttps(c) => &c.servers,
        }
    }

    /// Mutable access to the active variant's server addresses.
    pub fn servers_mut(&mut self) -> &mut Vec<String> {
        match self {
            Self::DnsOverTls(c) => &mut c.servers,
            Self::DnsOverHttps(c) => &mut c.servers,
        }
    }

    #[must_use]
    pub const fn is_dot(&self) -> bool {
        matches!(self, Self::DnsOverTls(_))
    }

    #[must_use]
    pub const fn is_doh(&self) -> bool {
        matches!(self, Self::DnsOverHttps(_))
    }

    /// Translates into the platform's DNS settings object.
    #[must_use]
    pub fn to_platform_settings(&self) -> DnsSettings {
        match self {
            Self::DnsOverTls(c) => DnsSettings::OverTls {
                servers: c.servers.clone(),
                server_name: c.server_name.clone(),
            },
            Self::DnsOverHttps(c) => DnsSettings::OverHttps {
                servers: c.servers.clone(),
                server_url: c.server_url.clone(),
            },
        }
    }
}

impl From<DoTConfig> for ResolverConfig {
    fn from(config: DoTConfig) -> Self {
        Self::DnsOverTls(config)
    }
}

impl From<DoHConfig> for ResolverConfig {
    fn from(config: DoHConfig) -> Self {
        Self::DnsOverHttps(config)
    }
}

impl fmt::Display for ResolverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DnsOverTls(_) => f.write_str("DNS-over-TLS"),
            Self::DnsOverHttps(_) => f.write_str("DNS-over-HTTPS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Stored shape
// ---------------------------------------------------------------------------

/// Discriminant stored under `"base"`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum Base {
    #[serde(rename = "dnsOverTLS")]
    DnsOverTls,
    #[serde(rename = "dnsOverHTTPS")]
    DnsOverHttps,
}

/// `{"base": ..., "dotConfiguration": {...}}` or
/// `{"base": ..., "dohConfiguration": {...}}`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfiguration {
    base: Base,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dot_configuration: Option<DoTConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    doh_configuration: Option<DoHConfig>,
}

impl TryFrom<RawConfiguration> for ResolverConfig {
    type Error = DnsecureError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        match raw.base {
            Base::DnsOverTls => raw.dot_configuration.map(Self::DnsOverTls).ok_or(
                DnsecureError::MissingConfiguration {
                    base: "dnsOverTLS",
                    key: "dotConfiguration",
                },
            ),
            Base::DnsOverHttps => raw.doh_configuration.map(Self::DnsOverHttps).ok_or(
                DnsecureError::MissingConfiguration {
                    base: "dnsOverHTTPS",
                    key: "dohConfiguration",
                },
            ),
        }
    }
}

impl From<ResolverConfig> for RawConfiguration {
    fn from(config: ResolverConfig) -> Self {
        match config {
            ResolverConfig::DnsOverTls(c) => Self {
                base: Base::DnsOverTls,
                dot_configuration: Some(c),
                doh_configuration: None,
            },
            ResolverConfig::DnsOverHttps(c) => Self {
                base: Base::DnsOverHttps,
                dot_configuration: None,
                doh_configuration: Some(c),
            },
        }
    }
}

//! Well-known public resolvers.
//!
//! Used to seed the list on first launch and offered for restoring entries
//! the user deleted. The catalog itself is never stored; copies are.

use crate::config::{DoHConfig, DoTConfig};
use crate::resolver::{Resolver, Resolvers};

const GOOGLE: [&str; 4] = ["8.8.8.8", "8.8.4.4", "2001:4860:4860::8888", "2001:4860:4860::8844"];
const CLOUDFLARE: [&str; 4] = ["1.1.1.1", "1.0.0.1", "2606:4700:4700::1111", "2606:4700:4700::1001"];
const CLOUDFLARE_SECURITY: [&str; 4] = ["1.1.1.2", "1.0.0.2", "2606:4700:4700::1112", "2606:4700:4700::1002"];
const QUAD9: [&str; 4] = ["9.9.9.9", "149.112.112.112", "2620:fe::fe", "2620:fe::9"];
const LIBREDNS: [&str; 1] = ["116.202.176.26"];

/// Builds the preset catalog. Every call returns fresh ids.
#[must_use]
pub fn catalog() -> Resolvers {
    vec![
        Resolver::new(
            "Google Public DNS",
            DoTConfig::new(GOOGLE).with_server_name("dns.google"),
        ),
        Resolver::new(
            "Google Public DNS",
            DoHConfig::new(GOOGLE).with_server_url("https://dns.google/dns-query"),
        ),
        Resolver::new(
            "1.1.1.1",
            DoTConfig::new(CLOUDFLARE).with_server_name("cloudflare-dns.com"),
        ),
        Resolver::new(
            "1.1.1.1",
            DoHConfig::new(CLOUDFLARE).with_server_url("https://cloudflare-dns.com/dns-query"),
        ),
        Resolver::new(
            "1.1.1.1 (Block Malware)",
            DoTConfig::new(CLOUDFLARE_SECURITY).with_server_name("cloudflare-dns.com"),
        ),
        Resolver::new(
            "1.1.1.1 (Block Malware)",
            DoHConfig::new(CLOUDFLARE_SECURITY)
                .with_server_url("https://security.cloudflare-dns.com/dns-query"),
        ),
        Resolver::new(
            "Quad9 (Block Malware)",
            DoTConfig::new(QUAD9).with_server_name("dns.quad9.net"),
        ),
        Resolver::new(
            "Quad9 (Block Malware)",
            DoHConfig::new(QUAD9).with_server_url("https://dns.quad9.net/dns-query"),
        ),
        Resolver::new(
            "LibreDNS",
            DoHConfig::new(LIBREDNS).with_server_url("https://doh.libredns.gr/dns-query"),
        ),
        Resolver::new(
            "LibreDNS (No Ads)",
            DoHConfig::new(LIBREDNS).with_server_url("https://doh.libredns.gr/ads"),
        ),
    ]
    .into()
}

/// Presets whose name contains `keyword`, ignoring case. An empty keyword
/// matches everything.
#[must_use]
pub fn search(keyword: &str) -> Resolvers {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return catalog();
    }
    catalog()
        .into_iter()
        .filter(|r| r.name.to_lowercase().contains(&keyword))
        .collect()
}

//! Text encoding of the resolver list for the preference store.
//!
//! The stored value has no schema version, so reading is lenient: anything
//! that fails to parse degrades to an empty list instead of an error.

use crate::error::Result;
use crate::resolver::Resolvers;

/// Stored form of an empty list, used when encoding fails.
pub const EMPTY_LIST: &str = "[]";

/// Decodes a stored resolver list, reporting why it could not be read.
///
/// # Errors
///
/// Returns [`DnsecureError::Json`](crate::DnsecureError::Json) if the text is
/// not a JSON array of resolvers.
pub fn try_decode(text: &str) -> Result<Resolvers> {
    Ok(serde_json::from_str(text)?)
}

/// Decodes a stored resolver list.
///
/// Absent, empty, or malformed text yields an empty list.
#[must_use]
pub fn decode(text: Option<&str>) -> Resolvers {
    let Some(text) = text else {
        return Resolvers::new();
    };
    if text.trim().is_empty() {
        return Resolvers::new();
    }
    match try_decode(text) {
        Ok(resolvers) => resolvers,
        Err(e) => {
            tracing::warn!(error = %e, "Stored resolver list is unreadable, starting empty");
            Resolvers::new()
        }
    }
}

/// Encodes a resolver list for storage. Never fails; falls back to
/// [`EMPTY_LIST`].
#[must_use]
pub fn encode(resolvers: &Resolvers) -> String {
    serde_json::to_string(resolvers).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to encode resolver list");
        EMPTY_LIST.to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DoHConfig, DoTConfig};
    use crate::resolver::Resolver;
    use crate::rule::{InterfaceType, OnDemandRule, RuleAction};

    fn sample() -> Resolvers {
        vec![
            Resolver::new(
                "Work",
                DoTConfig::new(["10.0.0.1", "fd00::1"]).with_server_name("dns.corp.example"),
            )
            .with_rule(
                OnDemandRule::new("Office Wi-Fi")
                    .with_action(RuleAction::EvaluateConnection)
                    .with_interface_type(InterfaceType::WiFi)
                    .with_ssid_match(["corp"])
                    .with_dns_search_domain_match(["corp.example"])
                    .with_dns_server_address_match(["10.0.0.53"])
                    .with_probe_url("https://probe.corp.example/")
                    .with_excluded_domains(["intranet.corp.example"]),
            )
            .with_rule(OnDemandRule::new("Elsewhere").with_action(RuleAction::Disconnect)),
            Resolver::new("Home", DoHConfig::new(["192.168.1.1"])),
        ]
        .into()
    }

    #[test]
    fn round_trip_preserves_everything() {
        let list = sample();
        assert_eq!(decode(Some(encode(&list).as_str())), list);
    }

    #[test]
    fn round_trip_empty() {
        assert_eq!(encode(&Resolvers::new()), EMPTY_LIST);
        assert!(decode(Some(EMPTY_LIST)).is_empty());
    }

    #[test]
    fn garbage_decodes_to_empty() {
        assert!(decode(None).is_empty());
        assert!(decode(Some("")).is_empty());
        assert!(decode(Some("   ")).is_empty());
        assert!(decode(Some("not json")).is_empty());
        assert!(decode(Some("{}")).is_empty());
        assert!(decode(Some(r#"[{"name":"missing id"}]"#)).is_empty());
    }

    #[test]
    fn try_decode_reports_error() {
        assert!(try_decode("{}").is_err());
    }

    #[test]
    fn reads_value_written_by_earlier_app_versions() {
        // No onDemandRules key, uppercase UUID.
        let text = r#"[{"id":"6F9619FF-8B86-D011-B42D-00CF4FC964FF","name":"Legacy","configuration":{"base":"dnsOverHTTPS","dohConfiguration":{"servers":["1.1.1.1"],"serverURL":"https://cloudflare-dns.com/dns-query"}}}]"#;
        let list = decode(Some(text));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Legacy");
        assert!(list[0].on_demand_rules.is_empty());
        assert_eq!(list[0].configuration.servers(), ["1.1.1.1"]);
    }
}

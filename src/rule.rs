//! On-demand activation rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DnsecureError;

/// What the platform does with the DNS settings when a rule matches.
///
/// Stored as the platform's integer raw value. Values outside this set are
/// rejected when decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum RuleAction {
    /// Apply the settings.
    #[default]
    Connect,
    /// Do not apply the settings.
    Disconnect,
    /// Apply the settings, except for the rule's excluded domains.
    EvaluateConnection,
    /// Leave the current state as it is.
    Ignore,
}

impl RuleAction {
    /// Every action, in display order.
    pub const ALL: [Self; 4] = [
        Self::Connect,
        Self::Disconnect,
        Self::EvaluateConnection,
        Self::Ignore,
    ];

    /// Platform raw value.
    #[must_use]
    pub const fn raw_value(self) -> i64 {
        match self {
            Self::Connect => 1,
            Self::Disconnect => 2,
            Self::EvaluateConnection => 3,
            Self::Ignore => 4,
        }
    }
}

impl TryFrom<i64> for RuleAction {
    type Error = DnsecureError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Self::Connect),
            2 => Ok(Self::Disconnect),
            3 => Ok(Self::EvaluateConnection),
            4 => Ok(Self::Ignore),
            other => Err(DnsecureError::UnknownAction(other)),
        }
    }
}

impl From<RuleAction> for i64 {
    fn from(action: RuleAction) -> Self {
        action.raw_value()
    }
}

impl fmt::Display for RuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "Apply settings",
            Self::Disconnect => "Do not apply settings",
            Self::EvaluateConnection => "Apply with excluded domains",
            Self::Ignore => "As is",
        })
    }
}

/// Network interface a rule matches on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum InterfaceType {
    #[default]
    Any,
    Ethernet,
    WiFi,
    Cellular,
}

impl InterfaceType {
    /// Interface types the current platform lets a rule select.
    #[must_use]
    pub const fn available() -> &'static [Self] {
        if cfg!(target_os = "macos") {
            &[Self::Any, Self::Ethernet, Self::WiFi]
        } else {
            &[Self::Any, Self::WiFi, Self::Cellular]
        }
    }

    /// Whether an SSID matcher is meaningful for this interface type.
    ///
    /// The platform rejects SSID matching on anything but Wi-Fi (or any).
    #[must_use]
    pub const fn ssid_is_used(self) -> bool {
        matches!(self, Self::Any | Self::WiFi)
    }

    /// Platform raw value.
    #[must_use]
    pub const fn raw_value(self) -> i64 {
        match self {
            Self::Any => 0,
            Self::Ethernet => 1,
            Self::WiFi => 2,
            Self::Cellular => 3,
        }
    }
}

impl TryFrom<i64> for InterfaceType {
    type Error = DnsecureError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Any),
            1 => Ok(Self::Ethernet),
            2 => Ok(Self::WiFi),
            3 => Ok(Self::Cellular),
            other => Err(DnsecureError::UnknownInterfaceType(other)),
        }
    }
}

impl From<InterfaceType> for i64 {
    fn from(interface: InterfaceType) -> Self {
        interface.raw_value()
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "Any",
            Self::Ethernet => "Ethernet",
            Self::WiFi => "Wi-Fi",
            Self::Cellular => "Cellular",
        })
    }
}

/// A condition/action pair the platform evaluates against the current
/// network to decide whether the resolver's settings apply.
///
/// # Example
///
/// ```
/// use dnsecure::{InterfaceType, OnDemandRule, RuleAction};
///
/// let rule = OnDemandRule::new("Home Wi-Fi")
///     .with_action(RuleAction::Disconnect)
///     .with_interface_type(InterfaceType::WiFi)
///     .with_ssid_match(["home"]);
///
/// assert_eq!(rule.ssid_match, vec!["home"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnDemandRule {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub action: RuleAction,
    #[serde(default)]
    pub interface_type: InterfaceType,
    /// Wi-Fi network names. Ignored unless the interface type uses SSIDs.
    #[serde(default)]
    pub ssid_match: Vec<String>,
    #[serde(default)]
    pub dns_search_domain_match: Vec<String>,
    #[serde(default)]
    pub dns_server_address_match: Vec<String>,
    /// URL whose HTTP 200 response is required for the rule to match.
    #[serde(
        rename = "probeURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub probe_url: Option<String>,
    /// Domains that bypass the settings. Only read for
    /// [`RuleAction::EvaluateConnection`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_domains: Option<Vec<String>>,
}

impl OnDemandRule {
    /// Creates a rule with a fresh id that applies the settings on any interface.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            action: RuleAction::default(),
            interface_type: InterfaceType::default(),
            ssid_match: Vec::new(),
            dns_search_domain_match: Vec::new(),
            dns_server_address_match: Vec::new(),
            probe_url: None,
            excluded_domains: None,
        }
    }

    #[must_use]
    pub const fn with_action(mut self, action: RuleAction) -> Self {
        self.action = action;
        self
    }

    #[must_use]
    pub const fn with_interface_type(mut self, interface: InterfaceType) -> Self {
        self.interface_type = interface;
        self
    }

    #[must_use]
    pub fn with_ssid_match<I, S>(mut self, ssids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ssid_match = ssids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_dns_search_domain_match<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dns_search_domain_match = domains.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_dns_server_address_match<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dns_server_address_match = addresses.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_excluded_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_defaults() {
        let r = OnDemandRule::new("New Rule");
        assert_eq!(r.name, "New Rule");
        assert_eq!(r.action, RuleAction::Connect);
        assert_eq!(r.interface_type, InterfaceType::Any);
        assert!(r.ssid_match.is_empty());
        assert!(r.probe_url.is_none());
        assert!(r.excluded_domains.is_none());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(OnDemandRule::new("a").id, OnDemandRule::new("a").id);
    }

    #[test]
    fn action_raw_values() {
        for action in RuleAction::ALL {
            assert_eq!(RuleAction::try_from(action.raw_value()).unwrap(), action);
        }
        assert!(matches!(
            RuleAction::try_from(0),
            Err(DnsecureError::UnknownAction(0))
        ));
    }

    #[test]
    fn interface_raw_values() {
        assert_eq!(InterfaceType::try_from(2).unwrap(), InterfaceType::WiFi);
        assert!(matches!(
            InterfaceType::try_from(9),
            Err(DnsecureError::UnknownInterfaceType(9))
        ));
    }

    #[test]
    fn ssid_only_for_any_and_wifi() {
        assert!(InterfaceType::Any.ssid_is_used());
        assert!(InterfaceType::WiFi.ssid_is_used());
        assert!(!InterfaceType::Cellular.ssid_is_used());
        assert!(!InterfaceType::Ethernet.ssid_is_used());
    }

    #[test]
    fn available_always_starts_with_any() {
        let available = InterfaceType::available();
        assert_eq!(available.first(), Some(&InterfaceType::Any));
        assert!(available.contains(&InterfaceType::WiFi));
        assert_eq!(available.len(), 3);
    }

    #[test]
    fn stored_shape_uses_raw_values() {
        let rule = OnDemandRule::new("Office")
            .with_action(RuleAction::EvaluateConnection)
            .with_interface_type(InterfaceType::Cellular)
            .with_probe_url("https://probe.example/ok")
            .with_excluded_domains(["corp.example"]);
        let json = serde_json::to_value(&rule).unwrap();

        assert_eq!(json["action"], 3);
        assert_eq!(json["interfaceType"], 3);
        assert_eq!(json["probeURL"], "https://probe.example/ok");
        assert_eq!(json["excludedDomains"], serde_json::json!(["corp.example"]));
        assert!(json.get("ssidMatch").is_some());
    }

    #[test]
    fn unknown_action_fails_decode() {
        let id = Uuid::new_v4();
        let text = format!(r#"{{"id":"{id}","name":"x","action":42}}"#);
        let err = serde_json::from_str::<OnDemandRule>(&text).unwrap_err();
        assert!(err.to_string().contains("unknown on-demand rule action"));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let id = Uuid::new_v4();
        let text = format!(r#"{{"id":"{id}","name":"x","action":4,"interfaceType":0}}"#);
        let rule: OnDemandRule = serde_json::from_str(&text).unwrap();
        assert_eq!(rule.action, RuleAction::Ignore);
        assert!(rule.dns_server_address_match.is_empty());
    }

    #[test]
    fn display_labels() {
        assert_eq!(RuleAction::EvaluateConnection.to_string(), "Apply with excluded domains");
        assert_eq!(InterfaceType::WiFi.to_string(), "Wi-Fi");
    }
}

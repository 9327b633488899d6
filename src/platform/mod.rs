//! Boundary to the platform DNS settings service.
//!
//! The platform owns persistence and enforcement of the system DNS
//! configuration. This module describes the shapes it accepts and the
//! asynchronous load/save/remove surface the
//! [`ActivationController`](crate::ActivationController) drives.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::resolver::Resolver;
use crate::rule::{InterfaceType, OnDemandRule, RuleAction};

pub use memory::MemoryManager;

/// DNS settings handed to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsSettings {
    OverTls {
        servers: Vec<String>,
        server_name: Option<String>,
    },
    OverHttps {
        servers: Vec<String>,
        server_url: Option<String>,
    },
}

impl DnsSettings {
    #[must_use]
    pub fn servers(&self) -> &[String] {
        match self {
            Self::OverTls { servers, .. } | Self::OverHttps { servers, .. } => servers,
        }
    }
}

/// What the platform does for connections matching an evaluation sub-rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    ConnectIfNeeded,
    NeverConnect,
}

/// Per-domain sub-rule attached to an evaluate-connection rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationRule {
    pub match_domains: Vec<String>,
    pub action: ConnectionAction,
}

/// The four platform rule subtypes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformRuleKind {
    Connect,
    Disconnect,
    EvaluateConnection { connection_rules: Vec<EvaluationRule> },
    Ignore,
}

/// On-demand rule in the platform's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRule {
    pub kind: PlatformRuleKind,
    pub interface_type_match: InterfaceType,
    /// `None` when the interface type does not permit SSID matching.
    pub ssid_match: Option<Vec<String>>,
    pub dns_search_domain_match: Vec<String>,
    pub dns_server_address_match: Vec<String>,
    pub probe_url: Option<String>,
}

impl From<&OnDemandRule> for PlatformRule {
    fn from(rule: &OnDemandRule) -> Self {
        let kind = match rule.action {
            RuleAction::Connect => PlatformRuleKind::Connect,
            RuleAction::Disconnect => PlatformRuleKind::Disconnect,
            RuleAction::EvaluateConnection => PlatformRuleKind::EvaluateConnection {
                connection_rules: match &rule.excluded_domains {
                    Some(domains) if !domains.is_empty() => vec![EvaluationRule {
                        match_domains: domains.clone(),
                        action: ConnectionAction::NeverConnect,
                    }],
                    _ => Vec::new(),
                },
            },
            RuleAction::Ignore => PlatformRuleKind::Ignore,
        };

        Self {
            kind,
            interface_type_match: rule.interface_type,
            ssid_match: rule
                .interface_type
                .ssid_is_used()
                .then(|| rule.ssid_match.clone()),
            dns_search_domain_match: rule.dns_search_domain_match.clone(),
            dns_server_address_match: rule.dns_server_address_match.clone(),
            probe_url: rule.probe_url.clone(),
        }
    }
}

/// Translates on-demand rules into the platform's rule objects, in order.
#[must_use]
pub fn to_platform_rules(rules: &[OnDemandRule]) -> Vec<PlatformRule> {
    rules.iter().map(PlatformRule::from).collect()
}

/// Snapshot of the platform's DNS settings preferences.
///
/// Obtained from [`DnsSettingsManager::load_from_preferences`], mutated
/// locally, then written back with
/// [`DnsSettingsManager::save_to_preferences`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerPreferences {
    /// Whether the user has enabled the configuration in system settings.
    /// Reported by the platform; ignored on save.
    pub is_enabled: bool,
    pub localized_description: Option<String>,
    pub dns_settings: Option<DnsSettings>,
    pub on_demand_rules: Vec<PlatformRule>,
}

impl ManagerPreferences {
    /// Replaces the settings and rules with those of `resolver`.
    pub fn apply(&mut self, resolver: &Resolver) {
        self.localized_description = Some(resolver.name.clone());
        self.dns_settings = Some(resolver.configuration.to_platform_settings());
        self.on_demand_rules = to_platform_rules(&resolver.on_demand_rules);
    }

    /// Whether a DNS configuration is currently stored.
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.dns_settings.is_some()
    }
}

/// The platform DNS settings service.
///
/// Each call is one round-trip; implementations must be safe to share
/// between tasks.
#[async_trait]
pub trait DnsSettingsManager: Send + Sync {
    /// Reads the current preferences.
    async fn load_from_preferences(&self) -> Result<ManagerPreferences, PlatformError>;

    /// Writes `preferences`. A save that changes nothing is reported as
    /// [`PlatformError::configuration_unchanged`].
    async fn save_to_preferences(&self, preferences: &ManagerPreferences) -> Result<(), PlatformError>;

    /// Deletes the stored configuration.
    async fn remove_from_preferences(&self) -> Result<(), PlatformError>;
}

#[async_trait]
impl<M: DnsSettingsManager + ?Sized> DnsSettingsManager for Arc<M> {
    async fn load_from_preferences(&self) -> Result<ManagerPreferences, PlatformError> {
        (**self).load_from_preferences().await
    }

    async fn save_to_preferences(&self, preferences: &ManagerPreferences) -> Result<(), PlatformError> {
        (**self).save_to_preferences(preferences).await
    }

    async fn remove_from_preferences(&self) -> Result<(), PlatformError> {
        (**self).remove_from_preferences().await
    }
}

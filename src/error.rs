//! Error types.

use thiserror::Error;
use uuid::Uuid;

/// Result alias for dnsecure operations.
pub type Result<T> = std::result::Result<T, DnsecureError>;

/// Error domain the platform uses for configuration failures.
pub const CONFIGURATION_ERROR_DOMAIN: &str = "NEConfigurationErrorDomain";

/// Code reported when a save did not change the stored configuration.
pub const CONFIGURATION_UNCHANGED: i64 = 9;

/// Errors returned by dnsecure operations.
#[derive(Debug, Error)]
pub enum DnsecureError {
    /// Preference file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value is not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An on-demand rule carries an action raw value outside the known set.
    #[error("unknown on-demand rule action: {0}")]
    UnknownAction(i64),

    /// An on-demand rule carries an interface type raw value outside the known set.
    #[error("unknown interface type: {0}")]
    UnknownInterfaceType(i64),

    /// A configuration names its base but the matching payload is missing.
    #[error("missing {key} for {base} configuration")]
    MissingConfiguration {
        /// The declared base (`dnsOverTLS` or `dnsOverHTTPS`).
        base: &'static str,
        /// The payload key that was expected.
        key: &'static str,
    },

    /// No resolver with this id exists in the list.
    #[error("resolver not found: {id}")]
    ResolverNotFound {
        /// The id that failed to resolve.
        id: Uuid,
    },

    /// No rule with this id exists on the resolver.
    #[error("on-demand rule {rule} not found on resolver {resolver}")]
    RuleNotFound {
        /// The owning resolver.
        resolver: Uuid,
        /// The rule id that failed to resolve.
        rule: Uuid,
    },

    /// Loading the platform preferences failed.
    #[error("failed to load DNS settings: {0}")]
    Load(#[source] PlatformError),

    /// Saving the platform preferences failed.
    #[error("failed to save DNS settings: {0}")]
    Save(#[source] PlatformError),

    /// Removing the platform preferences failed.
    #[error("failed to remove DNS settings: {0}")]
    Remove(#[source] PlatformError),
}

impl DnsecureError {
    /// Title for the alert shown to the user, if this error is user-facing.
    #[must_use]
    pub const fn alert_title(&self) -> Option<&'static str> {
        match self {
            Self::Load(_) => Some("Load Error"),
            Self::Save(_) => Some("Save Error"),
            Self::Remove(_) => Some("Remove Error"),
            _ => None,
        }
    }
}

/// Error reported by the platform DNS settings service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({domain} code {code})")]
pub struct PlatformError {
    /// Error domain.
    pub domain: String,
    /// Domain-specific code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

impl PlatformError {
    #[must_use]
    pub fn new(domain: impl Into<String>, code: i64, message: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            code,
            message: message.into(),
        }
    }

    /// The error the platform reports when a save leaves the configuration as it was.
    #[must_use]
    pub fn configuration_unchanged() -> Self {
        Self::new(
            CONFIGURATION_ERROR_DOMAIN,
            CONFIGURATION_UNCHANGED,
            "The configuration was not changed",
        )
    }

    /// Returns `true` if the save was a no-op rather than a failure.
    #[must_use]
    pub fn is_configuration_unchanged(&self) -> bool {
        self.domain == CONFIGURATION_ERROR_DOMAIN && self.code == CONFIGURATION_UNCHANGED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_requires_domain_and_code() {
        assert!(PlatformError::configuration_unchanged().is_configuration_unchanged());
        assert!(!PlatformError::new(CONFIGURATION_ERROR_DOMAIN, 1, "invalid").is_configuration_unchanged());
        assert!(!PlatformError::new("NSCocoaErrorDomain", 9, "other").is_configuration_unchanged());
    }

    #[test]
    fn alert_titles() {
        let e = PlatformError::new("d", 1, "m");
        assert_eq!(DnsecureError::Load(e.clone()).alert_title(), Some("Load Error"));
        assert_eq!(DnsecureError::Save(e.clone()).alert_title(), Some("Save Error"));
        assert_eq!(DnsecureError::Remove(e).alert_title(), Some("Remove Error"));
        assert_eq!(DnsecureError::UnknownAction(7).alert_title(), None);
    }
}

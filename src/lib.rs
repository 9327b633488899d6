//! # dnsecure
//!
//! Configure system-wide DNS-over-TLS and DNS-over-HTTPS resolvers, with
//! optional on-demand rules deciding when they apply.
//!
//! The operating system does the actual work: it resolves queries over
//! TLS/HTTPS, evaluates on-demand rules against the current network, and
//! keeps the configuration across reboots. This crate models what the user
//! configures, stores it in user preferences, and hands the chosen resolver
//! to the platform DNS settings service.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use dnsecure::{ActivationController, FileStore, Library, PreferenceKeys};
//!
//! // First launch seeds the list with well-known public resolvers.
//! let library = Library::open(FileStore::new(prefs_path), PreferenceKeys::default())?;
//! let controller = ActivationController::new(manager, library, tracing::info_span!("dns"));
//!
//! let quad9 = controller
//!     .library()
//!     .resolvers()
//!     .iter()
//!     .find(|r| r.name.starts_with("Quad9"))
//!     .map(|r| r.id)
//!     .unwrap();
//! controller.activate(quad9).await?;
//!
//! // Reflect what the user chose in system settings.
//! let enabled = controller.refresh_status().await?;
//! ```
//!
//! `manager` is any [`DnsSettingsManager`]; [`MemoryManager`] is an
//! in-process implementation for tests and headless use.
//!
//! ## Stored format
//!
//! The resolver list is kept as JSON under the `"servers"` preference key and
//! the active resolver's id under `"usedID"`. Unreadable values degrade to an
//! empty list; see [`codec`].

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod config;
pub mod controller;
pub mod error;
pub mod library;
pub mod platform;
pub mod presets;
pub mod resolver;
pub mod rule;
pub mod store;

pub use config::{DoHConfig, DoTConfig, ResolverConfig};
pub use controller::{ActivationController, Outcome};
pub use error::{DnsecureError, PlatformError, Result};
pub use library::Library;
pub use platform::{
    ConnectionAction, DnsSettings, DnsSettingsManager, EvaluationRule, ManagerPreferences,
    MemoryManager, PlatformRule, PlatformRuleKind, to_platform_rules,
};
pub use resolver::{Resolver, Resolvers};
pub use rule::{InterfaceType, OnDemandRule, RuleAction};
pub use store::{FileStore, MemoryStore, PreferenceKeys, PreferenceStore};

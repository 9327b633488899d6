//! The user's resolver list and active selection, with persistence.
//!
//! All edits address resolvers and rules by id, never by position, and every
//! mutation is written back to the [`PreferenceStore`] before returning.

use uuid::Uuid;

use crate::codec;
use crate::config::{DoHConfig, DoTConfig, ResolverConfig};
use crate::error::{DnsecureError, Result};
use crate::presets;
use crate::resolver::{Resolver, Resolvers};
use crate::rule::OnDemandRule;
use crate::store::{PreferenceKeys, PreferenceStore};

/// Name given to resolvers created from scratch.
pub const NEW_RESOLVER_NAME: &str = "New";

/// Name given to rules created from scratch.
pub const NEW_RULE_NAME: &str = "New Rule";

/// Persistent resolver list plus the id of the active resolver.
///
/// # Example
///
/// ```
/// use dnsecure::{Library, MemoryStore, PreferenceKeys};
///
/// let mut library = Library::open(MemoryStore::new(), PreferenceKeys::default())?;
/// // First launch is seeded with the presets.
/// assert!(!library.resolvers().is_empty());
///
/// let id = library.add_doh()?;
/// library.rename(id, "Router")?;
/// assert_eq!(library.resolver(id).unwrap().name, "Router");
/// # Ok::<(), dnsecure::DnsecureError>(())
/// ```
#[derive(Debug)]
pub struct Library<S> {
    store: S,
    keys: PreferenceKeys,
    resolvers: Resolvers,
    active: Option<Uuid>,
}

impl<S: PreferenceStore> Library<S> {
    /// Reads the list and selection from `store`.
    ///
    /// When the list key has never been written, the list is seeded from the
    /// preset catalog and persisted. An unreadable list degrades to empty.
    /// A stored selection that does not name a listed resolver is cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    pub fn open(store: S, keys: PreferenceKeys) -> Result<Self> {
        let stored = store.get(&keys.servers)?;
        let seeded = stored.is_none();
        let resolvers = if seeded {
            presets::catalog()
        } else {
            codec::decode(stored.as_deref())
        };

        let stored_active = store.get(&keys.active)?;
        let active = stored_active
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .filter(|id| resolvers.contains(*id));

        let library = Self {
            store,
            keys,
            resolvers,
            active,
        };

        if seeded {
            tracing::info!(count = library.resolvers.len(), "Seeded resolver list from presets");
            library.persist_resolvers()?;
        }
        if stored_active.is_some() && active.is_none() {
            tracing::warn!(stored = ?stored_active, "Active resolver no longer exists, clearing selection");
            library.persist_active()?;
        }

        Ok(library)
    }

    #[must_use]
    pub const fn resolvers(&self) -> &Resolvers {
        &self.resolvers
    }

    #[must_use]
    pub fn resolver(&self, id: Uuid) -> Option<&Resolver> {
        self.resolvers.find(id)
    }

    /// Id of the active resolver. Always names a listed resolver.
    #[must_use]
    pub const fn active_id(&self) -> Option<Uuid> {
        self.active
    }

    #[must_use]
    pub fn active(&self) -> Option<&Resolver> {
        self.active.and_then(|id| self.resolvers.find(id))
    }

    #[must_use]
    pub fn is_active(&self, id: Uuid) -> bool {
        self.active == Some(id)
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Resolvers
    // -----------------------------------------------------------------------

    /// Appends `resolver` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn insert(&mut self, resolver: Resolver) -> Result<Uuid> {
        let id = resolver.id;
        self.resolvers.push(resolver);
        self.persist_resolvers()?;
        Ok(id)
    }

    /// Appends an empty DNS-over-TLS resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn add_dot(&mut self) -> Result<Uuid> {
        self.insert(Resolver::new(NEW_RESOLVER_NAME, DoTConfig::default()))
    }

    /// Appends an empty DNS-over-HTTPS resolver.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn add_doh(&mut self) -> Result<Uuid> {
        self.insert(Resolver::new(NEW_RESOLVER_NAME, DoHConfig::default()))
    }

    /// Appends a copy of `preset` under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be persisted.
    pub fn restore_preset(&mut self, preset: &Resolver) -> Result<Uuid> {
        self.insert(preset.duplicate())
    }

    /// Applies `f` to the resolver with `id` and persists the list.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::ResolverNotFound`] for an unknown id, or an
    /// error if the list cannot be persisted.
    pub fn update<T>(&mut self, id: Uuid, f: impl FnOnce(&mut Resolver) -> T) -> Result<T> {
        let resolver = self
            .resolvers
            .find_mut(id)
            .ok_or(DnsecureError::ResolverNotFound { id })?;
        let out = f(resolver);
        self.persist_resolvers()?;
        Ok(out)
    }

    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn rename(&mut self, id: Uuid, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        self.update(id, |r| r.name = name)
    }

    /// Replaces the configuration wholesale. Switching between DoT and DoH
    /// drops the previous variant's fields.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn set_configuration(&mut self, id: Uuid, configuration: impl Into<ResolverConfig>) -> Result<()> {
        let configuration = configuration.into();
        self.update(id, |r| r.configuration = configuration)
    }

    /// Replaces the server addresses of the current variant, trimming
    /// surrounding whitespace from each.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn set_servers<I, T>(&mut self, id: Uuid, servers: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let servers: Vec<String> = servers
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .collect();
        self.update(id, |r| *r.configuration.servers_mut() = servers)
    }

    /// Moves the resolver with `id` to index `to` (clamped).
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn move_resolver(&mut self, id: Uuid, to: usize) -> Result<()> {
        if !self.resolvers.move_to(id, to) {
            return Err(DnsecureError::ResolverNotFound { id });
        }
        self.persist_resolvers()
    }

    /// Deletes the resolver with `id`, clearing the selection if it was active.
    ///
    /// Withdrawing the platform configuration is the caller's job; see
    /// [`ActivationController::remove_resolver`](crate::ActivationController::remove_resolver).
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::ResolverNotFound`] for an unknown id, or an
    /// error if the change cannot be persisted.
    pub fn remove(&mut self, id: Uuid) -> Result<Resolver> {
        let removed = self
            .resolvers
            .remove_by_id(id)
            .ok_or(DnsecureError::ResolverNotFound { id })?;
        self.persist_resolvers()?;
        if self.active == Some(id) {
            self.active = None;
            self.persist_active()?;
        }
        tracing::info!(id = %id, name = %removed.name, "Removed resolver");
        Ok(removed)
    }

    /// Sets or clears the active resolver.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::ResolverNotFound`] if `id` is not listed, or
    /// an error if the selection cannot be persisted.
    pub fn set_active(&mut self, id: Option<Uuid>) -> Result<()> {
        if let Some(id) = id {
            if !self.resolvers.contains(id) {
                return Err(DnsecureError::ResolverNotFound { id });
            }
        }
        if self.active == id {
            return Ok(());
        }
        self.active = id;
        self.persist_active()
    }

    // -----------------------------------------------------------------------
    // Rules
    // -----------------------------------------------------------------------

    /// Appends a default rule to the resolver and returns the rule's id.
    ///
    /// # Errors
    ///
    /// See [`update`](Self::update).
    pub fn add_rule(&mut self, resolver: Uuid) -> Result<Uuid> {
        let rule = OnDemandRule::new(NEW_RULE_NAME);
        let id = rule.id;
        self.update(resolver, |r| r.on_demand_rules.push(rule))?;
        Ok(id)
    }

    /// Replaces the rule with the same id as `rule`.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::RuleNotFound`] if the resolver has no such
    /// rule, otherwise see [`update`](Self::update).
    pub fn update_rule(&mut self, resolver: Uuid, rule: OnDemandRule) -> Result<()> {
        let rule_id = rule.id;
        let found = self.update(resolver, |r| {
            r.rule_mut(rule_id).map(|slot| *slot = rule).is_some()
        })?;
        if found {
            Ok(())
        } else {
            Err(DnsecureError::RuleNotFound {
                resolver,
                rule: rule_id,
            })
        }
    }

    /// # Errors
    ///
    /// Returns [`DnsecureError::RuleNotFound`] if the resolver has no such
    /// rule, otherwise see [`update`](Self::update).
    pub fn remove_rule(&mut self, resolver: Uuid, rule: Uuid) -> Result<OnDemandRule> {
        self.update(resolver, |r| {
            let index = r.on_demand_rules.iter().position(|x| x.id == rule)?;
            Some(r.on_demand_rules.remove(index))
        })?
        .ok_or(DnsecureError::RuleNotFound { resolver, rule })
    }

    /// Moves a rule to index `to` (clamped) within its resolver.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::RuleNotFound`] if the resolver has no such
    /// rule, otherwise see [`update`](Self::update).
    pub fn move_rule(&mut self, resolver: Uuid, rule: Uuid, to: usize) -> Result<()> {
        let moved = self.update(resolver, |r| {
            let Some(from) = r.on_demand_rules.iter().position(|x| x.id == rule) else {
                return false;
            };
            let item = r.on_demand_rules.remove(from);
            let to = to.min(r.on_demand_rules.len());
            r.on_demand_rules.insert(to, item);
            true
        })?;
        if moved {
            Ok(())
        } else {
            Err(DnsecureError::RuleNotFound { resolver, rule })
        }
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    fn persist_resolvers(&self) -> Result<()> {
        self.store
            .set(&self.keys.servers, &codec::encode(&self.resolvers))
    }

    fn persist_active(&self) -> Result<()> {
        match self.active {
            Some(id) => self.store.set(&self.keys.active, &id.to_string()),
            None => self.store.remove(&self.keys.active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn empty() -> Library<MemoryStore> {
        let store = MemoryStore::new();
        store.set("servers", "[]").unwrap();
        Library::open(store, PreferenceKeys::default()).unwrap()
    }

    fn stored_list(library: &Library<MemoryStore>) -> Resolvers {
        codec::decode(library.store().get("servers").unwrap().as_deref())
    }

    #[test]
    fn first_open_seeds_presets() {
        let library = Library::open(MemoryStore::new(), PreferenceKeys::default()).unwrap();
        assert_eq!(library.resolvers().len(), presets::catalog().len());
        assert_eq!(&stored_list(&library), library.resolvers());
        assert!(library.active_id().is_none());
    }

    #[test]
    fn malformed_list_opens_empty() {
        let store = MemoryStore::new();
        store.set("servers", "{}").unwrap();
        let library = Library::open(store, PreferenceKeys::default()).unwrap();
        assert!(library.resolvers().is_empty());
    }

    #[test]
    fn dangling_selection_is_cleared() {
        let store = MemoryStore::new();
        store.set("servers", "[]").unwrap();
        store.set("usedID", &Uuid::new_v4().to_string()).unwrap();
        let library = Library::open(store, PreferenceKeys::default()).unwrap();
        assert!(library.active_id().is_none());
        assert_eq!(library.store().get("usedID").unwrap(), None);
    }

    #[test]
    fn selection_survives_reopen() {
        let mut library = empty();
        let id = library.add_dot().unwrap();
        library.set_active(Some(id)).unwrap();

        let reopened = Library::open(library.store, PreferenceKeys::default()).unwrap();
        assert_eq!(reopened.active_id(), Some(id));
        assert_eq!(reopened.active().unwrap().name, NEW_RESOLVER_NAME);
    }

    #[test]
    fn every_edit_is_persisted() {
        let mut library = empty();
        let id = library.add_doh().unwrap();
        library.rename(id, "Router").unwrap();
        library.set_servers(id, [" 192.168.1.1 ", "fd00::1\n"]).unwrap();

        let stored = stored_list(&library);
        assert_eq!(stored[0].name, "Router");
        assert_eq!(stored[0].configuration.servers(), ["192.168.1.1", "fd00::1"]);
    }

    #[test]
    fn set_configuration_switches_variant() {
        let mut library = empty();
        let id = library
            .insert(Resolver::new("x", DoTConfig::new(["1.1.1.1"]).with_server_name("tls.example")))
            .unwrap();
        library.set_configuration(id, DoHConfig::new(["1.1.1.1"])).unwrap();

        let config = &library.resolver(id).unwrap().configuration;
        assert_eq!(config, &ResolverConfig::DnsOverHttps(DoHConfig::new(["1.1.1.1"])));
    }

    #[test]
    fn removing_active_clears_selection() {
        let mut library = empty();
        let a = library.add_dot().unwrap();
        let b = library.add_doh().unwrap();
        library.set_active(Some(a)).unwrap();

        library.remove(b).unwrap();
        assert_eq!(library.active_id(), Some(a));

        library.remove(a).unwrap();
        assert_eq!(library.active_id(), None);
        assert_eq!(library.store().get("usedID").unwrap(), None);
        assert!(library.resolvers().is_empty());
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut library = empty();
        let ghost = Uuid::new_v4();
        assert!(matches!(library.rename(ghost, "x"), Err(DnsecureError::ResolverNotFound { .. })));
        assert!(matches!(library.remove(ghost), Err(DnsecureError::ResolverNotFound { .. })));
        assert!(matches!(library.set_active(Some(ghost)), Err(DnsecureError::ResolverNotFound { .. })));
        assert!(matches!(library.move_resolver(ghost, 0), Err(DnsecureError::ResolverNotFound { .. })));
    }

    #[test]
    fn restore_preset_uses_fresh_id() {
        let mut library = empty();
        let catalog = presets::catalog();
        let preset = &catalog[0];
        let first = library.restore_preset(preset).unwrap();
        let second = library.restore_preset(preset).unwrap();
        assert_ne!(first, second);
        assert_ne!(first, preset.id);
        assert_eq!(library.resolvers().len(), 2);
    }

    #[test]
    fn move_resolver_by_id() {
        let mut library = empty();
        let a = library.add_dot().unwrap();
        let b = library.add_dot().unwrap();
        library.move_resolver(b, 0).unwrap();
        let order: Vec<_> = stored_list(&library).iter().map(|r| r.id).collect();
        assert_eq!(order, vec![b, a]);
    }

    #[test]
    fn rule_lifecycle() {
        let mut library = empty();
        let id = library.add_dot().unwrap();
        let first = library.add_rule(id).unwrap();
        let second = library.add_rule(id).unwrap();

        let mut rule = library.resolver(id).unwrap().rule(first).unwrap().clone();
        rule.name = "Cellular".into();
        library.update_rule(id, rule).unwrap();

        library.move_rule(id, second, 0).unwrap();
        let names: Vec<_> = library.resolver(id).unwrap().on_demand_rules.iter().map(|r| r.name.clone()).collect();
        assert_eq!(names, [NEW_RULE_NAME, "Cellular"]);

        let removed = library.remove_rule(id, first).unwrap();
        assert_eq!(removed.name, "Cellular");
        assert!(matches!(
            library.remove_rule(id, first),
            Err(DnsecureError::RuleNotFound { .. })
        ));
        assert_eq!(stored_list(&library)[0].on_demand_rules.len(), 1);
    }
}

//! Resolver entries and the user-ordered resolver list.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ResolverConfig;
use crate::rule::OnDemandRule;

/// A named server configuration with its on-demand rules.
///
/// `id` is assigned once at creation and is the key used to identify the
/// active resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolver {
    pub id: Uuid,
    pub name: String,
    pub configuration: ResolverConfig,
    /// Rules evaluated by the platform, in order.
    #[serde(default)]
    pub on_demand_rules: Vec<OnDemandRule>,
}

impl Resolver {
    /// Creates a resolver with a fresh id and no rules.
    #[must_use]
    pub fn new(name: impl Into<String>, configuration: impl Into<ResolverConfig>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            configuration: configuration.into(),
            on_demand_rules: Vec::new(),
        }
    }

    /// Appends an on-demand rule.
    #[must_use]
    pub fn with_rule(mut self, rule: OnDemandRule) -> Self {
        self.on_demand_rules.push(rule);
        self
    }

    /// Copy of this resolver under a fresh id, rules included.
    ///
    /// Rule ids are regenerated too, so the copy shares no identity with
    /// the source.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = Uuid::new_v4();
        for rule in &mut copy.on_demand_rules {
            rule.id = Uuid::new_v4();
        }
        copy
    }

    #[must_use]
    pub fn rule(&self, id: Uuid) -> Option<&OnDemandRule> {
        self.on_demand_rules.iter().find(|r| r.id == id)
    }

    pub fn rule_mut(&mut self, id: Uuid) -> Option<&mut OnDemandRule> {
        self.on_demand_rules.iter_mut().find(|r| r.id == id)
    }
}

/// Ordered list of resolvers. Order is user-chosen and survives storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resolvers(Vec<Resolver>);

impl Resolvers {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Looks up a resolver by id.
    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&Resolver> {
        self.0.iter().find(|r| r.id == id)
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Resolver> {
        self.0.iter_mut().find(|r| r.id == id)
    }

    /// Current index of the resolver with `id`.
    #[must_use]
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.0.iter().position(|r| r.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: Uuid) -> bool {
        self.position(id).is_some()
    }

    /// Removes and returns the resolver with `id`.
    pub fn remove_by_id(&mut self, id: Uuid) -> Option<Resolver> {
        let index = self.position(id)?;
        Some(self.0.remove(index))
    }

    /// Moves the resolver with `id` so it ends up at `to` (clamped to the
    /// end). Returns `false` if `id` is unknown.
    pub fn move_to(&mut self, id: Uuid, to: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let item = self.0.remove(from);
        let to = to.min(self.0.len());
        self.0.insert(to, item);
        true
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Resolver> {
        self.0
    }
}

impl Deref for Resolvers {
    type Target = Vec<Resolver>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Resolvers {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Resolver>> for Resolvers {
    fn from(resolvers: Vec<Resolver>) -> Self {
        Self(resolvers)
    }
}

impl FromIterator<Resolver> for Resolvers {
    fn from_iter<I: IntoIterator<Item = Resolver>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Resolvers {
    type Item = Resolver;
    type IntoIter = std::vec::IntoIter<Resolver>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resolvers {
    type Item = &'a Resolver;
    type IntoIter = std::slice::Iter<'a, Resolver>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

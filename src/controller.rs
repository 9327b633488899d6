//! Pushes the active resolver to the platform DNS settings service.
//!
//! Every operation is a fresh `load → mutate → save` (or `load → remove`)
//! round-trip. Operations are not cancelled when the user acts again; instead
//! each takes a generation ticket and drops its effects if a newer operation
//! started while it was waiting on the platform.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::error::{DnsecureError, Result};
use crate::library::Library;
use crate::platform::DnsSettingsManager;
use crate::resolver::Resolver;
use crate::store::PreferenceStore;

/// How an activation or deactivation ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The platform now reflects the request.
    Applied,
    /// A newer request started first; this one's result was discarded.
    Superseded,
}

/// Bridges the user's selection to the platform service.
///
/// The controller owns the [`Library`]; use [`library`](Self::library) for
/// edits. The lock is never held across a platform call.
///
/// # Example
///
/// ```rust,ignore
/// use dnsecure::{ActivationController, Library, MemoryManager, MemoryStore, PreferenceKeys};
///
/// let library = Library::open(MemoryStore::new(), PreferenceKeys::default())?;
/// let controller = ActivationController::new(
///     MemoryManager::new(),
///     library,
///     tracing::info_span!("dns"),
/// );
///
/// let id = controller.library().resolvers()[0].id;
/// controller.activate(id).await?;
/// ```
pub struct ActivationController<M, S> {
    manager: M,
    library: Mutex<Library<S>>,
    generation: AtomicU64,
    status_generation: AtomicU64,
    is_enabled: AtomicBool,
    span: Span,
}

impl<M, S> ActivationController<M, S>
where
    M: DnsSettingsManager,
    S: PreferenceStore,
{
    /// Creates a controller. Platform round-trips are recorded under `span`.
    #[must_use]
    pub fn new(manager: M, library: Library<S>, span: Span) -> Self {
        Self {
            manager,
            library: Mutex::new(library),
            generation: AtomicU64::new(0),
            status_generation: AtomicU64::new(0),
            is_enabled: AtomicBool::new(false),
            span,
        }
    }

    /// Locks the library for reading or editing.
    ///
    /// Do not hold the guard across an `.await` on this controller.
    pub fn library(&self) -> MutexGuard<'_, Library<S>> {
        self.library.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub const fn manager(&self) -> &M {
        &self.manager
    }

    /// Last status read by [`refresh_status`](Self::refresh_status).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.is_enabled.load(Ordering::SeqCst)
    }

    /// Reads whether the platform has the DNS configuration enabled.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::Load`] if the platform cannot be queried; the
    /// previously known status is kept.
    pub async fn refresh_status(&self) -> Result<bool> {
        self.refresh_status_inner()
            .instrument(self.span.clone())
            .await
    }

    /// Makes the resolver with `id` the active one and pushes its settings
    /// and rules to the platform.
    ///
    /// Saving something the platform already has is not an error.
    ///
    /// # Errors
    ///
    /// - [`DnsecureError::ResolverNotFound`] if `id` is not listed.
    /// - [`DnsecureError::Load`] if the platform preferences cannot be read;
    ///   the selection is cleared.
    /// - [`DnsecureError::Save`] if the platform rejects the settings; the
    ///   selection is cleared and any stored settings are withdrawn.
    pub async fn activate(&self, id: Uuid) -> Result<Outcome> {
        self.activate_inner(id)
            .instrument(self.span.clone())
            .await
    }

    /// Clears the selection and removes the platform settings if present.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::Load`] or [`DnsecureError::Remove`] if the
    /// platform call fails. The selection stays cleared either way.
    pub async fn deactivate(&self) -> Result<Outcome> {
        self.deactivate_inner().instrument(self.span.clone()).await
    }

    /// Deletes a resolver; if it was active, also withdraws it from the
    /// platform.
    ///
    /// # Errors
    ///
    /// Returns [`DnsecureError::ResolverNotFound`] for an unknown id. Errors
    /// from withdrawing are returned after the resolver is already deleted.
    pub async fn remove_resolver(&self, id: Uuid) -> Result<Resolver> {
        let (removed, was_active) = {
            let mut library = self.library();
            let was_active = library.is_active(id);
            (library.remove(id)?, was_active)
        };
        if was_active {
            self.deactivate().await?;
        }
        Ok(removed)
    }

    /// Pushes the active resolver again so edits made to it reach the
    /// platform. Returns `None` when nothing is active.
    ///
    /// # Errors
    ///
    /// Same as [`activate`](Self::activate).
    pub async fn resync_active(&self) -> Result<Option<Outcome>> {
        let active = self.library().active_id();
        match active {
            Some(id) => self.activate(id).await.map(Some),
            None => Ok(None),
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// Clears the selection if it still points at `id`.
    fn clear_selection_if(&self, id: Uuid) {
        let mut library = self.library();
        if library.is_active(id) {
            if let Err(e) = library.set_active(None) {
                tracing::warn!(error = %e, "Failed to persist cleared selection");
            }
        }
    }

    async fn refresh_status_inner(&self) -> Result<bool> {
        let ticket = self.status_generation.fetch_add(1, Ordering::SeqCst) + 1;
        match self.manager.load_from_preferences().await {
            Ok(prefs) => {
                if self.status_generation.load(Ordering::SeqCst) == ticket {
                    self.is_enabled.store(prefs.is_enabled, Ordering::SeqCst);
                    tracing::debug!(enabled = prefs.is_enabled, "Refreshed DNS settings status");
                } else {
                    tracing::debug!("Discarding stale status refresh");
                }
                Ok(self.is_enabled())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load DNS settings status");
                Err(DnsecureError::Load(e))
            }
        }
    }

    async fn activate_inner(&self, id: Uuid) -> Result<Outcome> {
        let ticket = self.begin();
        let resolver = {
            let mut library = self.library();
            let resolver = library
                .resolver(id)
                .cloned()
                .ok_or(DnsecureError::ResolverNotFound { id })?;
            library.set_active(Some(id))?;
            resolver
        };

        let mut prefs = match self.manager.load_from_preferences().await {
            Ok(prefs) => prefs,
            Err(e) => {
                if !self.is_current(ticket) {
                    tracing::debug!(error = %e, "Discarding load failure of superseded activation");
                    return Ok(Outcome::Superseded);
                }
                tracing::error!(error = %e, resolver = %resolver.name, "Failed to load DNS settings");
                self.clear_selection_if(id);
                return Err(DnsecureError::Load(e));
            }
        };
        if !self.is_current(ticket) {
            tracing::debug!(resolver = %resolver.name, "Activation superseded before save");
            return Ok(Outcome::Superseded);
        }

        prefs.apply(&resolver);
        match self.manager.save_to_preferences(&prefs).await {
            Ok(()) => {
                tracing::info!(
                    id = %id,
                    resolver = %resolver.name,
                    protocol = %resolver.configuration,
                    rules = resolver.on_demand_rules.len(),
                    "Saved DNS settings"
                );
            }
            Err(e) if e.is_configuration_unchanged() => {
                tracing::debug!(resolver = %resolver.name, "DNS settings unchanged");
            }
            Err(e) => {
                if !self.is_current(ticket) {
                    tracing::warn!(error = %e, "Discarding save failure of superseded activation");
                    return Ok(Outcome::Superseded);
                }
                tracing::error!(error = %e, resolver = %resolver.name, "Failed to save DNS settings");
                self.clear_selection_if(id);
                self.withdraw_best_effort(ticket).await;
                if !self.is_current(ticket) {
                    tracing::debug!(resolver = %resolver.name, "Activation superseded during rollback");
                    return Ok(Outcome::Superseded);
                }
                return Err(DnsecureError::Save(e));
            }
        }

        Ok(if self.is_current(ticket) {
            Outcome::Applied
        } else {
            Outcome::Superseded
        })
    }

    async fn deactivate_inner(&self) -> Result<Outcome> {
        let ticket = self.begin();
        self.library().set_active(None)?;

        let prefs = match self.manager.load_from_preferences().await {
            Ok(prefs) => prefs,
            Err(e) => {
                if !self.is_current(ticket) {
                    tracing::debug!(error = %e, "Discarding load failure of superseded deactivation");
                    return Ok(Outcome::Superseded);
                }
                tracing::error!(error = %e, "Failed to load DNS settings");
                return Err(DnsecureError::Load(e));
            }
        };
        if !self.is_current(ticket) {
            tracing::debug!("Deactivation superseded before remove");
            return Ok(Outcome::Superseded);
        }
        if !prefs.is_present() {
            tracing::debug!("DNS settings already removed");
            return Ok(Outcome::Applied);
        }

        match self.manager.remove_from_preferences().await {
            Ok(()) => {
                self.is_enabled.store(false, Ordering::SeqCst);
                tracing::info!("Removed DNS settings");
                Ok(Outcome::Applied)
            }
            Err(e) if !self.is_current(ticket) => {
                tracing::debug!(error = %e, "Discarding remove failure of superseded deactivation");
                Ok(Outcome::Superseded)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to remove DNS settings");
                Err(DnsecureError::Remove(e))
            }
        }
    }

    /// Removes stored settings after a failed save, logging instead of
    /// returning failures. Skipped once `ticket` is no longer current.
    async fn withdraw_best_effort(&self, ticket: u64) {
        match self.manager.load_from_preferences().await {
            Ok(prefs) if !prefs.is_present() => {}
            Ok(_) if !self.is_current(ticket) => {
                tracing::debug!("Skipping withdrawal, a newer request owns the settings");
            }
            Ok(_) => {
                if let Err(e) = self.manager.remove_from_preferences().await {
                    tracing::warn!(error = %e, "Failed to withdraw DNS settings after save error");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load DNS settings for withdrawal");
            }
        }
    }
}

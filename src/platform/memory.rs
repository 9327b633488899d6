//! In-process stand-in for the platform DNS settings service.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{DnsSettingsManager, ManagerPreferences};
use crate::error::PlatformError;

#[derive(Debug, Default)]
struct State {
    stored: Option<ManagerPreferences>,
    enabled: bool,
    fail_load: Option<PlatformError>,
    fail_save: Option<PlatformError>,
    fail_remove: Option<PlatformError>,
    saves: usize,
    removals: usize,
}

/// Keeps DNS settings preferences in memory.
///
/// Behaves like the platform service: a save identical to what is stored
/// fails with [`PlatformError::configuration_unchanged`], and the enabled
/// flag is controlled separately (on a real device the user flips it in
/// system settings). Failures can be injected for the next call of each
/// operation.
#[derive(Debug, Default)]
pub struct MemoryManager {
    state: Mutex<State>,
}

impl MemoryManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulates the user enabling or disabling the configuration.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    /// Currently stored preferences, if any.
    #[must_use]
    pub fn stored(&self) -> Option<ManagerPreferences> {
        self.lock().stored.clone()
    }

    /// Number of saves that changed the stored preferences.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    #[must_use]
    pub fn remove_count(&self) -> usize {
        self.lock().removals
    }

    pub fn fail_next_load(&self, error: PlatformError) {
        self.lock().fail_load = Some(error);
    }

    pub fn fail_next_save(&self, error: PlatformError) {
        self.lock().fail_save = Some(error);
    }

    pub fn fail_next_remove(&self, error: PlatformError) {
        self.lock().fail_remove = Some(error);
    }
}

#[async_trait]
impl DnsSettingsManager for MemoryManager {
    async fn load_from_preferences(&self) -> Result<ManagerPreferences, PlatformError> {
        let mut state = self.lock();
        if let Some(e) = state.fail_load.take() {
            return Err(e);
        }
        let mut prefs = state.stored.clone().unwrap_or_default();
        prefs.is_enabled = state.enabled && prefs.is_present();
        Ok(prefs)
    }

    async fn save_to_preferences(&self, preferences: &ManagerPreferences) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if let Some(e) = state.fail_save.take() {
            return Err(e);
        }
        let mut incoming = preferences.clone();
        incoming.is_enabled = false;
        if state.stored.as_ref() == Some(&incoming) {
            return Err(PlatformError::configuration_unchanged());
        }
        state.stored = Some(incoming);
        state.saves += 1;
        Ok(())
    }

    async fn remove_from_preferences(&self) -> Result<(), PlatformError> {
        let mut state = self.lock();
        if let Some(e) = state.fail_remove.take() {
            return Err(e);
        }
        state.stored = None;
        state.enabled = false;
        state.removals += 1;
        Ok(())
    }
}

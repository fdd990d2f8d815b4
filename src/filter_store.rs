//! The only writer of [`FilterState`].
//!
//! Every setter applies the cascade rule of its hierarchy and then writes the
//! whole state through to the persistence adapter. Write failures are logged
//! and dropped: the in-memory state stays authoritative for the session.

use log::{info, warn};

use crate::app_response::AppResponse;
use crate::filter_state::{
    normalize_id, DateRange, DepartmentLevel, FilterState, FilterTab, GeoLevel, LevelSelection,
};
use crate::local_db_model::{parse_snapshot, StoredFilters};
use crate::local_db_state::PersistenceAdapter;

pub struct FilterStateStore {
    state: FilterState,
    storage: Box<dyn PersistenceAdapter>,
}

impl FilterStateStore {
    /// Restores the state from `storage`, falling back to defaults.
    ///
    /// A payload that cannot be decoded (bytes that are not UTF-8, or text that
    /// is not a JSON object) is removed from storage so the next session does
    /// not trip over it again.
    pub fn load(storage: Box<dyn PersistenceAdapter>) -> Self {
        let state = match storage.load() {
            Ok(Some(raw)) => match parse_snapshot(&raw) {
                Ok(state) => {
                    info!("Restored dashboard filters from storage");
                    state
                }
                Err(e) => discard_snapshot(&*storage, &e),
            },
            Ok(None) => FilterState::default(),
            Err(e @ AppResponse::SerializationError(_)) => discard_snapshot(&*storage, &e),
            Err(e) => {
                warn!("Filter storage unavailable, starting from defaults: {e}");
                FilterState::default()
            }
        };

        Self { state, storage }
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn set_level(&mut self, level: GeoLevel, value: Option<String>) {
        self.state.geographic.set_cascading(level, value);
        self.persist();
    }

    pub fn set_department_level(&mut self, level: DepartmentLevel, value: Option<String>) {
        self.state.department.set_cascading(level, value);
        self.persist();
    }

    pub fn set_scheme(&mut self, scheme: Option<String>) {
        self.state.scheme = normalize_id(scheme);
        self.persist();
    }

    pub fn set_duration(&mut self, duration: Option<DateRange>) {
        self.state.duration = duration;
        self.persist();
    }

    /// Switches the filter bar. Both hierarchies keep their selections.
    pub fn set_tab(&mut self, index: i64) -> Result<FilterTab, AppResponse> {
        let tab = FilterTab::try_from(index)?;
        self.state.active_tab = tab;
        self.persist();
        Ok(tab)
    }

    /// Clears both hierarchies, the scheme and the duration. The tab is kept.
    pub fn clear_all(&mut self) {
        self.state.geographic.clear();
        self.state.department.clear();
        self.state.scheme = None;
        self.state.duration = None;
        self.persist();
    }

    fn persist(&self) {
        let payload = match StoredFilters::from(&self.state).to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not serialize filters: {e}");
                return;
            }
        };
        if let Err(e) = self.storage.save(&payload) {
            warn!("Could not persist filters: {e}");
        }
    }
}

fn discard_snapshot(storage: &dyn PersistenceAdapter, reason: &AppResponse) -> FilterState {
    warn!("Discarding stored filters: {reason}");
    if let Err(e) = storage.remove() {
        warn!("Could not remove stored filters: {e}");
    }
    FilterState::default()
}

use std::sync::Arc;

use reqwest::Client;
use shared::{
    domain::CityId,
    protocol::{City, CityDraft},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod form;
pub use form::{CityForm, FormFields, FormPhase, SubmitOutcome};

/// Client-side cache of the visited-city collection.
///
/// Lives for the session; the backend remains the source of truth. `cities`
/// keeps the server's order, `error` is the last failure message (empty means
/// none), and `current_city` is the record most recently loaded, created or
/// selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityStoreState {
    pub cities: Vec<City>,
    pub is_loading: bool,
    pub error: String,
    pub current_city: Option<City>,
}

/// The closed set of state transitions. Every mutation of [`CityStoreState`]
/// goes through [`reduce`] with one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    Loading,
    CitiesLoaded(Vec<City>),
    CityLoaded(City),
    CityCreated(City),
    CityDeleted(CityId),
    Rejected(String),
}

/// Applies an action to a state snapshot, producing the next state.
///
/// Pure and exhaustive; a failure message overwrites any previous one, and
/// every terminal action clears the loading flag.
pub fn reduce(state: &CityStoreState, action: StoreAction) -> CityStoreState {
    match action {
        StoreAction::Loading => CityStoreState {
            is_loading: true,
            ..state.clone()
        },
        StoreAction::CitiesLoaded(cities) => CityStoreState {
            cities,
            is_loading: false,
            ..state.clone()
        },
        StoreAction::CityLoaded(city) => CityStoreState {
            current_city: Some(city),
            is_loading: false,
            ..state.clone()
        },
        StoreAction::CityCreated(city) => {
            let mut next = state.clone();
            next.cities.push(city.clone());
            next.current_city = Some(city);
            next.is_loading = false;
            next
        }
        StoreAction::CityDeleted(id) => {
            let mut next = state.clone();
            next.cities.retain(|city| city.id != id);
            next.current_city = None;
            next.is_loading = false;
            next
        }
        StoreAction::Rejected(message) => CityStoreState {
            error: message,
            is_loading: false,
            ..state.clone()
        },
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("backend request failed: {0}")]
    Backend(#[from] reqwest::Error),
    #[error("a city needs a name before it can be saved")]
    EmptyCityName,
}

/// Reducer-driven store for the `/cities` collection of the backend.
///
/// Operations dispatch [`StoreAction`]s through a single lock, so consumers
/// observe atomic per-action transitions; the applied actions are also
/// published on a broadcast channel for anyone rendering the state.
pub struct CityStore {
    http: Client,
    base_url: String,
    state: Mutex<CityStoreState>,
    events: broadcast::Sender<StoreAction>,
}

impl CityStore {
    pub fn new(base_url: impl Into<String>) -> Arc<Self> {
        let base_url: String = base_url.into();
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            state: Mutex::new(CityStoreState::default()),
            events,
        })
    }

    /// Stream of applied actions, in application order.
    pub fn subscribe_events(&self) -> broadcast::Receiver<StoreAction> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> CityStoreState {
        self.state.lock().await.clone()
    }

    async fn dispatch(&self, action: StoreAction) {
        let mut state = self.state.lock().await;
        let next = reduce(&state, action.clone());
        *state = next;
        let _ = self.events.send(action);
    }

    async fn reject(&self, err: &StoreError) {
        warn!(error = %err, "store: operation rejected");
        self.dispatch(StoreAction::Rejected(err.to_string())).await;
    }

    /// Fetches the full city list and replaces the cached one. No retry.
    pub async fn load_all(&self) -> Result<Vec<City>, StoreError> {
        self.dispatch(StoreAction::Loading).await;
        match self.fetch_cities().await {
            Ok(cities) => {
                info!(count = cities.len(), "store: city list loaded");
                self.dispatch(StoreAction::CitiesLoaded(cities.clone())).await;
                Ok(cities)
            }
            Err(err) => {
                self.reject(&err).await;
                Err(err)
            }
        }
    }

    /// Loads a single record into `current_city`.
    ///
    /// When `id` is already the current city this returns it without touching
    /// the network; the cached record is never revalidated.
    pub async fn get_city(&self, id: CityId) -> Result<City, StoreError> {
        if let Some(current) = self.state.lock().await.current_city.clone() {
            if current.id == id {
                return Ok(current);
            }
        }

        self.dispatch(StoreAction::Loading).await;
        match self.fetch_city(id).await {
            Ok(city) => {
                self.dispatch(StoreAction::CityLoaded(city.clone())).await;
                Ok(city)
            }
            Err(err) => {
                self.reject(&err).await;
                Err(err)
            }
        }
    }

    /// Posts a draft; the created record, with its server-assigned id, is
    /// appended to the list and becomes `current_city`.
    pub async fn create_city(&self, draft: CityDraft) -> Result<City, StoreError> {
        if draft.city_name.is_empty() {
            let err = StoreError::EmptyCityName;
            self.reject(&err).await;
            return Err(err);
        }

        self.dispatch(StoreAction::Loading).await;
        match self.post_city(&draft).await {
            Ok(city) => {
                info!(id = city.id.0, city_name = %city.city_name, "store: city created");
                self.dispatch(StoreAction::CityCreated(city.clone())).await;
                Ok(city)
            }
            Err(err) => {
                self.reject(&err).await;
                Err(err)
            }
        }
    }

    pub async fn delete_city(&self, id: CityId) -> Result<(), StoreError> {
        self.dispatch(StoreAction::Loading).await;
        match self.send_delete(id).await {
            Ok(()) => {
                info!(id = id.0, "store: city deleted");
                self.dispatch(StoreAction::CityDeleted(id)).await;
                Ok(())
            }
            Err(err) => {
                self.reject(&err).await;
                Err(err)
            }
        }
    }

    async fn fetch_cities(&self) -> Result<Vec<City>, StoreError> {
        let cities = self
            .http
            .get(format!("{}/cities", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(cities)
    }

    async fn fetch_city(&self, id: CityId) -> Result<City, StoreError> {
        let city = self
            .http
            .get(format!("{}/cities/{}", self.base_url, id.0))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(city)
    }

    async fn post_city(&self, draft: &CityDraft) -> Result<City, StoreError> {
        let city = self
            .http
            .post(format!("{}/cities", self.base_url))
            .json(draft)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(city)
    }

    async fn send_delete(&self, id: CityId) -> Result<(), StoreError> {
        self.http
            .delete(format!("{}/cities/{}", self.base_url, id.0))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

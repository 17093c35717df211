use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use chrono::{DateTime, Utc};
use geocode::ReverseGeocoder;
use shared::{
    domain::Coordinates,
    protocol::{City, CityDraft},
};
use tokio::sync::Mutex;
use tracing::info;

use crate::{CityStore, StoreError};

/// Where the trip form is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPhase {
    /// No coordinates selected yet.
    AwaitingPosition,
    /// Reverse-geocode lookup in flight for the selected coordinates.
    GeoLoading,
    /// Lookup failed or resolved to no country; carries the failure message.
    /// Not retried automatically; selecting a new position leaves it.
    GeoError(String),
    /// Lookup succeeded; the draft fields are editable and submittable.
    Ready,
}

/// Editable draft fields backing the form.
#[derive(Debug, Clone)]
pub struct FormFields {
    pub city_name: String,
    pub country: String,
    pub emoji: String,
    pub date: Option<DateTime<Utc>>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(City),
    /// The required fields were not all present; nothing was sent.
    Skipped,
}

struct FormState {
    phase: FormPhase,
    position: Option<Coordinates>,
    fields: FormFields,
}

/// Orchestrates the trip form: position selection triggers a reverse-geocode
/// lookup that pre-fills the draft, and submission hands the draft to
/// [`CityStore::create_city`].
///
/// Each position change bumps a request generation; a lookup that finishes
/// after a newer one has started is discarded instead of overwriting it.
pub struct CityForm {
    geocoder: Arc<dyn ReverseGeocoder>,
    store: Arc<CityStore>,
    inner: Mutex<FormState>,
    generation: AtomicU64,
}

impl CityForm {
    pub fn new(geocoder: Arc<dyn ReverseGeocoder>, store: Arc<CityStore>) -> Self {
        Self {
            geocoder,
            store,
            inner: Mutex::new(FormState {
                phase: FormPhase::AwaitingPosition,
                position: None,
                fields: FormFields {
                    city_name: String::new(),
                    country: String::new(),
                    emoji: String::new(),
                    date: Some(Utc::now()),
                    notes: String::new(),
                },
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub async fn phase(&self) -> FormPhase {
        self.inner.lock().await.phase.clone()
    }

    pub async fn fields(&self) -> FormFields {
        self.inner.lock().await.fields.clone()
    }

    pub async fn set_city_name(&self, city_name: impl Into<String>) {
        self.inner.lock().await.fields.city_name = city_name.into();
    }

    pub async fn set_date(&self, date: Option<DateTime<Utc>>) {
        self.inner.lock().await.fields.date = date;
    }

    pub async fn set_notes(&self, notes: impl Into<String>) {
        self.inner.lock().await.fields.notes = notes.into();
    }

    /// Selects a coordinate pair and resolves it to a place.
    ///
    /// Re-enters `GeoLoading` immediately; on completion the form is `Ready`
    /// with the resolved fields, or `GeoError` with the lookup's message. If a
    /// newer position was selected while the lookup was in flight, its result
    /// wins and this one is dropped.
    pub async fn set_position(&self, position: Coordinates) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut inner = self.inner.lock().await;
            inner.position = Some(position);
            inner.phase = FormPhase::GeoLoading;
        }

        let outcome = self.geocoder.resolve(position).await;

        let mut inner = self.inner.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            info!(
                lat = position.lat,
                lng = position.lng,
                "form: discarding superseded geocode result"
            );
            return;
        }

        match outcome {
            Ok(place) => {
                inner.fields.city_name = place.city_name;
                inner.fields.country = place.country;
                inner.fields.emoji = place.emoji;
                inner.phase = FormPhase::Ready;
            }
            Err(err) => {
                inner.phase = FormPhase::GeoError(err.to_string());
            }
        }
    }

    /// Builds a draft from the current fields and creates it via the store.
    ///
    /// A no-op (`Skipped`) unless the form is `Ready` with a non-empty city
    /// name and a date. On success the transient fields (`city_name`, `notes`)
    /// are cleared and the form returns to `AwaitingPosition`; on failure the
    /// fields stay put and the store records the error.
    pub async fn submit(&self) -> Result<SubmitOutcome, StoreError> {
        let draft = {
            let inner = self.inner.lock().await;
            if inner.phase != FormPhase::Ready {
                return Ok(SubmitOutcome::Skipped);
            }
            let Some(position) = inner.position else {
                return Ok(SubmitOutcome::Skipped);
            };
            let Some(date) = inner.fields.date else {
                return Ok(SubmitOutcome::Skipped);
            };
            if inner.fields.city_name.is_empty() {
                return Ok(SubmitOutcome::Skipped);
            }
            CityDraft {
                city_name: inner.fields.city_name.clone(),
                country: inner.fields.country.clone(),
                emoji: inner.fields.emoji.clone(),
                date,
                notes: inner.fields.notes.clone(),
                position,
            }
        };

        let city = self.store.create_city(draft).await?;

        let mut inner = self.inner.lock().await;
        inner.fields.city_name.clear();
        inner.fields.notes.clear();
        inner.position = None;
        inner.phase = FormPhase::AwaitingPosition;
        Ok(SubmitOutcome::Created(city))
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;

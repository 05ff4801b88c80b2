use async_trait::async_trait;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use super::RosterApi;
use crate::api::errors::ErrorBody;
use crate::domain::errors::{RosterError, RosterResult};
use crate::domain::roster::{EntryId, NewRosterEntry, RosterEntry};

/// HTTP transport to a running Roster Service
#[derive(Debug, Clone)]
pub struct HttpRosterApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRosterApi {
    /// Creates a client for the service at `base_url` (e.g. `http://localhost:3001`)
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `/team/{entry_id}` with the id percent-encoded as one path segment
    fn entry_url(&self, entry_id: &EntryId) -> RosterResult<Url> {
        let mut url = Url::parse(&self.url("/team")).map_err(transport_error)?;
        url.path_segments_mut()
            .map_err(|_| transport_error(format!("{} cannot be a base URL", self.base_url)))?
            .push(&entry_id.to_string());
        Ok(url)
    }
}

fn transport_error(err: impl std::fmt::Display) -> RosterError {
    tracing::error!("Roster service request failed: {}", err);
    RosterError::Unreachable(err.to_string())
}

/// Context needed to rebuild a rejection into the error the service raised
#[derive(Default)]
struct Rejection<'a> {
    candidate: Option<&'a NewRosterEntry>,
    entry_id: Option<EntryId>,
}

impl Rejection<'_> {
    /// Maps a failed response back onto a `RosterError`
    ///
    /// The service sends a machine code next to the message; the same variant
    /// is rebuilt here so callers cannot tell a service-side rejection from a
    /// local one.
    async fn into_error(self, response: Response) -> RosterError {
        let status = response.status();
        let body = response.json::<ErrorBody>().await.ok();
        let message = body
            .as_ref()
            .map(|b| b.error.clone())
            .unwrap_or_else(|| format!("status {status}"));
        let code = body.and_then(|b| b.code);

        match (code.as_deref(), self.candidate, self.entry_id) {
            (Some("capacity_exceeded"), _, _) => RosterError::CapacityExceeded,
            (Some("duplicate_entry"), Some(candidate), _) => RosterError::DuplicateEntry {
                pokemon_id: candidate.pokemon_id,
                name: candidate.name.trim().to_string(),
            },
            (Some("invalid_entry"), _, _) => RosterError::InvalidEntry(
                message
                    .strip_prefix("Invalid team entry: ")
                    .unwrap_or(&message)
                    .to_string(),
            ),
            (Some("not_found"), _, Some(entry_id)) => RosterError::NotFound(entry_id),
            (None, _, Some(entry_id)) if status == StatusCode::NOT_FOUND => {
                RosterError::NotFound(entry_id)
            }
            (Some("upstream_unavailable"), _, _) => RosterError::UpstreamUnavailable(message),
            (Some("persistence_failure"), _, _) => RosterError::PersistenceFailure(message),
            _ => transport_error(format!("unexpected response {status}: {message}")),
        }
    }
}

async fn decode<T>(response: Response, rejection: Rejection<'_>) -> RosterResult<T>
where
    T: DeserializeOwned,
{
    if response.status().is_success() {
        response.json::<T>().await.map_err(transport_error)
    } else {
        Err(rejection.into_error(response).await)
    }
}

#[async_trait]
impl RosterApi for HttpRosterApi {
    async fn list(&self) -> RosterResult<Vec<RosterEntry>> {
        let response = self
            .http
            .get(self.url("/team"))
            .send()
            .await
            .map_err(transport_error)?;

        decode(response, Rejection::default()).await
    }

    async fn add(&self, candidate: &NewRosterEntry) -> RosterResult<RosterEntry> {
        let response = self
            .http
            .post(self.url("/team"))
            .json(candidate)
            .send()
            .await
            .map_err(transport_error)?;

        decode(
            response,
            Rejection {
                candidate: Some(candidate),
                ..Default::default()
            },
        )
        .await
    }

    async fn remove(&self, entry_id: EntryId) -> RosterResult<()> {
        let response = self
            .http
            .delete(self.entry_url(&entry_id)?)
            .send()
            .await
            .map_err(transport_error)?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(Rejection {
            entry_id: Some(entry_id),
            ..Default::default()
        }
        .into_error(response)
        .await)
    }
}

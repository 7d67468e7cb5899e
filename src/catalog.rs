//! Slot and look discovery over HTTP.
//!
//! After every successful authentication the adapter fetches the server's
//! current device slots and look library, sequentially (looks are never
//! requested before the slot fetch resolves), and replaces the cached lists
//! wholesale. The last computed auth code rides along as a query credential.
//!
//! A failure in either step aborts the sequence and leaves the previous
//! lists untouched; the next successful authentication retries the whole
//! sequence.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::adapter::AdapterInner;
use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Device slot collection endpoint.
const SLOTS_PATH: &str = "/devices/slots";

/// Look library endpoint.
const GRADES_PATH: &str = "/library/grades";

// ============================================================================
// Types
// ============================================================================

/// One device slot reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Slot {
    /// Slot index, also the id used by the change-slot command.
    pub index: i64,

    /// Server-assigned label, absent for unnamed slots.
    #[serde(default)]
    pub label: Option<String>,
}

impl Slot {
    /// Label shown to the operator, defaulting to "Slot {index}".
    #[must_use]
    pub fn display_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("Slot {}", self.index))
    }
}

/// One stored look reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Look {
    /// Library uid used by the apply-grade command.
    pub uid: String,

    /// Display name.
    pub name: String,
}

/// Cached discovery results. Lists are replaced, never merged.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Current device slots.
    pub slots: Vec<Slot>,
    /// Current look library.
    pub looks: Vec<Look>,
}

/// Collection responses wrap the list in a `result` field; an absent field
/// means an empty collection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct CollectionBody<T> {
    #[serde(default)]
    result: Vec<T>,
}

// ============================================================================
// CatalogClient
// ============================================================================

/// HTTP client for the discovery endpoints.
pub struct CatalogClient {
    http: reqwest::Client,
    base: Url,
}

impl CatalogClient {
    /// Creates a client against the server's HTTP base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL does not parse.
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(base).map_err(|e| Error::config(e.to_string()))?,
        })
    }

    /// Fetches the current slot list.
    pub async fn fetch_slots(&self, auth: &str) -> Result<Vec<Slot>> {
        self.fetch_collection(SLOTS_PATH, auth).await
    }

    /// Fetches the current look library.
    pub async fn fetch_looks(&self, auth: &str) -> Result<Vec<Look>> {
        self.fetch_collection(GRADES_PATH, auth).await
    }

    async fn fetch_collection<T: DeserializeOwned>(&self, path: &str, auth: &str) -> Result<Vec<T>> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| Error::catalog_fetch(e.to_string()))?;
        url.query_pairs_mut().append_pair("auth", auth);

        let body: CollectionBody<T> = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::catalog_fetch(e.to_string()))?
            .error_for_status()
            .map_err(|e| Error::catalog_fetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| Error::catalog_fetch(e.to_string()))?;

        Ok(body.result)
    }
}

// ============================================================================
// Refresh
// ============================================================================

/// Runs one discovery sequence and commits the result.
///
/// Spawned fire-and-forget on each successful authentication so that channel
/// close/error handling is never blocked behind an in-flight fetch. Errors
/// are logged and leave the cached catalog untouched.
pub(crate) async fn refresh(inner: Arc<AdapterInner>) {
    let base = inner.config().http_base();
    let code = inner.auth_code().unwrap_or_default();

    let client = match CatalogClient::new(&base) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "catalog client unavailable");
            return;
        }
    };

    let slots = match client.fetch_slots(&code).await {
        Ok(slots) => slots,
        Err(e) => {
            warn!(error = %e, "slot discovery failed");
            return;
        }
    };

    let looks = match client.fetch_looks(&code).await {
        Ok(looks) => looks,
        Err(e) => {
            warn!(error = %e, "look discovery failed");
            return;
        }
    };

    debug!(slots = slots.len(), looks = looks.len(), "catalog replaced");
    inner.commit_catalog(Catalog { slots, looks });
}

// ============================================================================
// Tests
// ============================================================================

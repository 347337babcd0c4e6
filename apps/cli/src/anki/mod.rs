//! AnkiConnect client.
//!
//! Every call is a `POST` of `{action, version, params}` answered with
//! `{result, error}`. A non-null `error` fails the call.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use vault_anki_core::{CardStore, NewNote, NoteFields, NoteId, StoreError};

pub const DEFAULT_URL: &str = "http://localhost:8765";

/// AnkiConnect API version the requests are written against.
pub const API_VERSION: u32 = 6;

#[derive(Debug, Serialize)]
struct Request<'a> {
    action: &'a str,
    version: u32,
    params: Value,
}

/// Blocking-per-call AnkiConnect client. No retries, default timeouts.
pub struct AnkiConnect {
    client: Client,
    url: String,
}

impl AnkiConnect {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one action and decode its result.
    pub async fn invoke<T: DeserializeOwned>(&self, action: &str, params: Value) -> Result<T, StoreError> {
        debug!(action, "AnkiConnect request");
        let request = Request {
            action,
            version: API_VERSION,
            params,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(StoreError::Protocol(format!("HTTP {} - {}", status, message)));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| StoreError::Protocol(e.to_string()))?;

        parse_envelope(body)
    }
}

/// Check the `{result, error}` envelope and decode `result`.
pub fn parse_envelope<T: DeserializeOwned>(body: Value) -> Result<T, StoreError> {
    let Value::Object(mut fields) = body else {
        return Err(StoreError::Protocol("response is not a JSON object".to_string()));
    };
    if fields.len() != 2 {
        return Err(StoreError::Protocol(
            "response has an unexpected number of fields".to_string(),
        ));
    }
    let error = fields
        .remove("error")
        .ok_or_else(|| StoreError::Protocol("response is missing required error field".to_string()))?;
    let result = fields
        .remove("result")
        .ok_or_else(|| StoreError::Protocol("response is missing required result field".to_string()))?;

    match error {
        Value::Null => {}
        Value::String(message) => return Err(StoreError::Remote(message)),
        other => return Err(StoreError::Remote(other.to_string())),
    }

    serde_json::from_value(result).map_err(|e| StoreError::Protocol(e.to_string()))
}

impl CardStore for AnkiConnect {
    async fn version(&self) -> Result<u32, StoreError> {
        self.invoke("version", json!({})).await
    }

    async fn deck_names(&self) -> Result<Vec<String>, StoreError> {
        self.invoke("deckNames", json!({})).await
    }

    async fn create_deck(&self, deck: &str) -> Result<(), StoreError> {
        let _: Value = self.invoke("createDeck", json!({ "deck": deck })).await?;
        Ok(())
    }

    async fn store_media_file(&self, filename: &str, data: &str) -> Result<String, StoreError> {
        self.invoke(
            "storeMediaFile",
            json!({ "filename": filename, "data": data }),
        )
        .await
    }

    async fn find_notes(&self, query: &str) -> Result<Vec<NoteId>, StoreError> {
        self.invoke("findNotes", json!({ "query": query })).await
    }

    async fn update_note_fields(&self, note: NoteId, fields: &NoteFields) -> Result<(), StoreError> {
        let _: Value = self
            .invoke(
                "updateNoteFields",
                json!({ "note": { "id": note, "fields": fields } }),
            )
            .await?;
        Ok(())
    }

    async fn update_note_tags(&self, note: NoteId, tags: &[String]) -> Result<(), StoreError> {
        let _: Value = self
            .invoke("updateNoteTags", json!({ "note": note, "tags": tags }))
            .await?;
        Ok(())
    }

    async fn clear_unused_tags(&self) -> Result<(), StoreError> {
        let _: Value = self.invoke("clearUnusedTags", json!({})).await?;
        Ok(())
    }

    async fn add_note(&self, note: &NewNote) -> Result<NoteId, StoreError> {
        self.invoke("addNote", json!({ "note": note })).await
    }
}

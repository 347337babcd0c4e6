//! Fake AnkiConnect server for integration tests.
//!
//! Speaks the same `{action, version, params}` / `{result, error}` protocol
//! over HTTP and keeps notes, decks and media in memory.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use tempfile::TempDir;

use vault_anki_cli::anki::AnkiConnect;
use vault_anki_core::{ExportConfig, SyncOrchestrator};

pub const DECK: &str = "Obsidian Notes";

#[derive(Debug, Clone, PartialEq)]
pub struct FakeNote {
    pub deck: String,
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub notes: BTreeMap<i64, FakeNote>,
    pub decks: Vec<String>,
    pub media: BTreeMap<String, String>,
    /// Every action received, in order.
    pub actions: Vec<String>,
    /// Action name to the error message it should answer with.
    pub failures: HashMap<String, String>,
    next_id: i64,
}

impl FakeState {
    fn handle(&mut self, action: &str, params: &Value) -> Result<Value, String> {
        self.actions.push(action.to_string());
        if let Some(message) = self.failures.get(action) {
            return Err(message.clone());
        }

        match action {
            "version" => Ok(json!(6)),
            "deckNames" => Ok(json!(self.decks)),
            "createDeck" => {
                let deck = str_param(params, "deck")?;
                if !self.decks.contains(&deck) {
                    self.decks.push(deck);
                }
                Ok(json!(1))
            }
            "storeMediaFile" => {
                let filename = str_param(params, "filename")?;
                let data = str_param(params, "data")?;
                self.media.insert(filename.clone(), data);
                Ok(json!(filename))
            }
            "findNotes" => {
                let tag = tag_from_query(&str_param(params, "query")?);
                let ids: Vec<i64> = self
                    .notes
                    .iter()
                    .filter(|(_, note)| note.tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)))
                    .map(|(id, _)| *id)
                    .collect();
                Ok(json!(ids))
            }
            "updateNoteFields" => {
                let id = params["note"]["id"].as_i64().ok_or("missing note id")?;
                let fields = &params["note"]["fields"];
                let note = self.notes.get_mut(&id).ok_or("note was not found")?;
                note.front = fields["Front"].as_str().unwrap_or_default().to_string();
                note.back = fields["Back"].as_str().unwrap_or_default().to_string();
                Ok(Value::Null)
            }
            "updateNoteTags" => {
                let id = params["note"].as_i64().ok_or("missing note id")?;
                let tags = string_list(&params["tags"]);
                let note = self.notes.get_mut(&id).ok_or("note was not found")?;
                note.tags = tags;
                Ok(Value::Null)
            }
            "clearUnusedTags" => Ok(Value::Null),
            "addNote" => {
                let note = &params["note"];
                let deck = note["deckName"].as_str().unwrap_or_default().to_string();
                if !self.decks.contains(&deck) {
                    return Err("deck was not found".to_string());
                }
                self.next_id += 1;
                let id = 1_700_000_000_000 + self.next_id;
                self.notes.insert(
                    id,
                    FakeNote {
                        deck,
                        front: note["fields"]["Front"].as_str().unwrap_or_default().to_string(),
                        back: note["fields"]["Back"].as_str().unwrap_or_default().to_string(),
                        tags: string_list(&note["tags"]),
                    },
                );
                Ok(json!(id))
            }
            other => Err(format!("unsupported action: {}", other)),
        }
    }
}

fn str_param(params: &Value, key: &str) -> Result<String, String> {
    params[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("missing parameter {}", key))
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// `"tag:obsidian-id-a\_b"` to `obsidian-id-a_b`.
fn tag_from_query(query: &str) -> String {
    let inner = query.trim_matches('"');
    let inner = inner.strip_prefix("tag:").unwrap_or(inner);
    let mut tag = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                tag.push(next);
            }
        } else {
            tag.push(c);
        }
    }
    tag
}

type SharedState = Arc<Mutex<FakeState>>;

async fn handle(State(state): State<SharedState>, Json(request): Json<Value>) -> Json<Value> {
    let action = request["action"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    match state.handle(&action, &request["params"]) {
        Ok(result) => Json(json!({ "result": result, "error": null })),
        Err(error) => Json(json!({ "result": null, "error": error })),
    }
}

/// A running fake AnkiConnect bound to a local port.
pub struct FakeAnki {
    pub addr: SocketAddr,
    state: SharedState,
}

impl FakeAnki {
    pub async fn start() -> Self {
        let state = SharedState::default();
        let app = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> AnkiConnect {
        AnkiConnect::new(self.url())
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn with_deck(self, deck: &str) -> Self {
        self.state().decks.push(deck.to_string());
        self
    }

    pub fn fail(&self, action: &str, message: &str) {
        self.state()
            .failures
            .insert(action.to_string(), message.to_string());
    }

    /// Actions that would change the collection.
    pub fn mutations(&self) -> Vec<String> {
        const READ_ONLY: [&str; 3] = ["version", "deckNames", "findNotes"];
        self.state()
            .actions
            .iter()
            .filter(|a| !READ_ONLY.contains(&a.as_str()))
            .cloned()
            .collect()
    }
}

/// A vault on disk with `anki/` and `media/` folders.
pub struct TestVault {
    pub dir: TempDir,
}

impl TestVault {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("anki")).unwrap();
        fs::create_dir_all(dir.path().join("media")).unwrap();
        Self { dir }
    }

    pub fn card(&self, name: &str, content: &str) -> &Self {
        let path = self.dir.path().join("anki").join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn media(&self, name: &str, bytes: &[u8]) -> &Self {
        fs::write(self.dir.path().join("media").join(name), bytes).unwrap();
        self
    }

    pub fn remove(&self, name: &str) {
        fs::remove_file(self.dir.path().join("anki").join(name)).unwrap();
    }

    pub fn config(&self) -> ExportConfig {
        ExportConfig::new(self.dir.path())
    }

    pub fn orchestrator(&self, anki: &FakeAnki) -> SyncOrchestrator<AnkiConnect> {
        SyncOrchestrator::new(anki.client(), self.config())
    }
}

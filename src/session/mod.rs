// SPDX-License-Identifier: MIT
//! Persisted client-side state behind a swappable key-value store.
//!
//! The dashboard keeps a handful of best-effort values between runs: the
//! selected family and kid, onboarding wizard progress, and the demo auth
//! blob. Everything is JSON with parse-failure fallback to defaults — a
//! corrupt store never crashes the app, it just forgets.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

// ─── KvStore ──────────────────────────────────────────────────────────────────

/// Minimal string key-value persistence. Last write wins; single writer by
/// construction (one dashboard process).
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(key);
        }
    }
}

/// File-backed store: one JSON document holding the whole key space.
///
/// Reads happen once at construction; every write persists the full map.
/// Write failures are warn-logged and otherwise ignored (best effort).
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    map: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`. A missing or corrupt file
    /// starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let map = Self::load(&path);
        Self { path, map: Mutex::new(map) }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!(path = %path.display(), "session store corrupt, starting empty: {e}");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    fn persist(&self, map: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(map) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), "session store write failed: {e}");
                }
            }
            Err(e) => warn!("session store serialisation failed: {e}"),
        }
    }
}

impl KvStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.insert(key.to_string(), value.to_string());
            self.persist(&map);
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(key);
            self.persist(&map);
        }
    }
}

// ─── Onboarding state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidGoalDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_amount: Option<f64>,
    #[serde(default)]
    pub weekly_contribution: Option<f64>,
}

impl Default for KidGoalDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            target_amount: None,
            weekly_contribution: Some(10.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KidProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub avatar_id: Option<String>,
    #[serde(default)]
    pub goal: KidGoalDraft,
}

impl KidProfile {
    /// Fresh profile for slot `index` (0-based), ids are 1-based.
    pub fn empty(index: usize) -> Self {
        Self {
            id: format!("kid-{}", index + 1),
            name: String::new(),
            age: Some(10),
            avatar_id: None,
            goal: KidGoalDraft::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountLinkChoice {
    Later,
    Demo,
}

/// Onboarding wizard progress, persisted between visits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingState {
    pub family_name: String,
    pub parent_name: String,
    pub kid_count: Option<u32>,
    pub kids: Vec<KidProfile>,
    pub account_link_choice: Option<AccountLinkChoice>,
    pub completed: bool,
}

impl OnboardingState {
    /// Resize the kid list to match `kid_count`, preserving entered profiles
    /// and padding with empty slots.
    pub fn normalize_kids(mut self) -> Self {
        let count = match self.kid_count {
            Some(n) if n >= 1 => n as usize,
            _ => {
                self.kids.clear();
                return self;
            }
        };
        let mut kids = Vec::with_capacity(count);
        for index in 0..count {
            match self.kids.get(index) {
                Some(kid) => kids.push(kid.clone()),
                None => kids.push(KidProfile::empty(index)),
            }
        }
        self.kids = kids;
        self
    }
}

// ─── Demo auth ────────────────────────────────────────────────────────────────

/// Demo-mode auth session blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub id: String,
    pub role: String,
    pub display_name: String,
    pub demo: bool,
    pub created_at: String,
}

// ─── Session ──────────────────────────────────────────────────────────────────

const KEY_FAMILY: &str = "selected_family_id";
const KEY_KID: &str = "selected_kid_id";
const KEY_ONBOARDING: &str = "onboarding_state";
const KEY_ONBOARDING_STEP: &str = "onboarding_step";
const KEY_AUTH: &str = "demo_session";

/// Typed accessors over a [`KvStore`]. All reads fall back to defaults.
pub struct Session {
    store: Box<dyn KvStore>,
}

impl Session {
    pub fn new(store: Box<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn selected_family_id(&self) -> Option<String> {
        self.store.get(KEY_FAMILY).filter(|s| !s.is_empty())
    }

    pub fn set_selected_family_id(&self, id: &str) {
        self.store.set(KEY_FAMILY, id);
    }

    pub fn selected_kid_id(&self) -> Option<String> {
        self.store.get(KEY_KID).filter(|s| !s.is_empty())
    }

    pub fn set_selected_kid_id(&self, id: &str) {
        self.store.set(KEY_KID, id);
    }

    /// Stored wizard progress; a corrupt blob reads as the default state.
    pub fn onboarding_state(&self) -> OnboardingState {
        self.store
            .get(KEY_ONBOARDING)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    pub fn set_onboarding_state(&self, state: &OnboardingState) {
        match serde_json::to_string(state) {
            Ok(json) => self.store.set(KEY_ONBOARDING, &json),
            Err(e) => warn!("onboarding state serialisation failed: {e}"),
        }
    }

    pub fn onboarding_step(&self) -> usize {
        self.store
            .get(KEY_ONBOARDING_STEP)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_onboarding_step(&self, step: usize) {
        self.store.set(KEY_ONBOARDING_STEP, &step.to_string());
    }

    pub fn auth_session(&self) -> Option<AuthSession> {
        self.store
            .get(KEY_AUTH)
            .and_then(|raw| serde_json::from_str(&raw).ok())
    }

    pub fn set_auth_session(&self, session: &AuthSession) {
        match serde_json::to_string(session) {
            Ok(json) => self.store.set(KEY_AUTH, &json),
            Err(e) => warn!("auth session serialisation failed: {e}"),
        }
    }

    pub fn clear_auth_session(&self) {
        self.store.remove(KEY_AUTH);
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn session_defaults_when_empty() {
        let session = Session::new(Box::new(MemoryStore::new()));
        assert_eq!(session.selected_family_id(), None);
        assert_eq!(session.onboarding_step(), 0);
        assert_eq!(session.onboarding_state(), OnboardingState::default());
        assert!(session.auth_session().is_none());
    }

    #[test]
    fn corrupt_onboarding_blob_reads_as_default() {
        let store = MemoryStore::new();
        store.set("onboarding_state", "{not json");
        let session = Session::new(Box::new(store));
        assert_eq!(session.onboarding_state(), OnboardingState::default());
    }

    #[test]
    fn normalize_kids_pads_and_truncates() {
        let mut state = OnboardingState {
            kid_count: Some(3),
            ..Default::default()
        };
        state.kids.push(KidProfile {
            name: "Maya".to_string(),
            ..KidProfile::empty(0)
        });
        let state = state.normalize_kids();
        assert_eq!(state.kids.len(), 3);
        assert_eq!(state.kids[0].name, "Maya");
        assert_eq!(state.kids[2].id, "kid-3");

        let state = OnboardingState {
            kid_count: None,
            kids: vec![KidProfile::empty(0)],
            ..Default::default()
        }
        .normalize_kids();
        assert!(state.kids.is_empty());
    }

    #[test]
    fn onboarding_roundtrip() {
        let session = Session::new(Box::new(MemoryStore::new()));
        let state = OnboardingState {
            family_name: "The Riveras".to_string(),
            parent_name: "Dana".to_string(),
            kid_count: Some(1),
            kids: vec![KidProfile::empty(0)],
            account_link_choice: Some(AccountLinkChoice::Demo),
            completed: false,
        };
        session.set_onboarding_state(&state);
        session.set_onboarding_step(3);
        assert_eq!(session.onboarding_state(), state);
        assert_eq!(session.onboarding_step(), 3);
    }
}

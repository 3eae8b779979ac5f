//! Session identity and the persisted display name.

use std::sync::Arc;

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{StateStore, USER_NAME_KEY};

/// The `(session_id, user_id)` pair scoping every backend call of one run.
///
/// The backend keeps its own conversation memory keyed by this pair, so the
/// client never replays history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: String,
}

impl SessionContext {
    /// Mint fresh identifiers from the current time plus random bits.
    pub fn generate() -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            session_id: format!("session_{}_{}", now, random_suffix()),
            user_id: format!("user_{}_{}", now, random_suffix()),
        }
    }

    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
        }
    }
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Identity for the lifetime of the process.
///
/// Identifiers are generated once; the display name is read from and written
/// to durable storage on a best-effort basis.
pub struct Session {
    context: SessionContext,
    display_name: Option<String>,
    store: Arc<dyn StateStore>,
}

impl Session {
    /// Start a session, restoring a previously confirmed display name if any.
    pub fn start(store: Arc<dyn StateStore>) -> Self {
        Self::with_context(SessionContext::generate(), store)
    }

    pub fn with_context(context: SessionContext, store: Arc<dyn StateStore>) -> Self {
        let display_name = match store.get(USER_NAME_KEY) {
            Ok(name) => name.filter(|n| !n.trim().is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read saved display name");
                None
            }
        };
        tracing::debug!(
            session_id = %context.session_id,
            user_id = %context.user_id,
            restored_name = display_name.is_some(),
            "Session started"
        );
        Self {
            context,
            display_name,
            store,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// The confirmed display name, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn name_confirmed(&self) -> bool {
        self.display_name.is_some()
    }

    /// Confirm and persist a display name. Blank names are ignored.
    pub fn set_display_name(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        self.display_name = Some(name.to_string());
        if let Err(e) = self.store.set(USER_NAME_KEY, name) {
            tracing::warn!(error = %e, "Failed to persist display name");
        }
        true
    }

    /// Un-confirm the display name and erase it from storage.
    pub fn clear_display_name(&mut self) {
        self.display_name = None;
        if let Err(e) = self.store.delete(USER_NAME_KEY) {
            tracing::warn!(error = %e, "Failed to erase display name");
        }
    }
}

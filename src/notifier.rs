//! Session-addressed realtime notifications.
//!
//! Every websocket connection owns one bounded queue keyed by its session id.
//! Emitting never waits: a full or closed queue drops the event so a slow
//! client cannot hold back an upload.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::models::ServerEvent;

#[derive(Clone)]
pub struct Notifier {
    sessions: Arc<DashMap<String, mpsc::Sender<ServerEvent>>>,
    buffer: usize,
}

impl Notifier {
    pub fn new(buffer: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            buffer: buffer.max(1),
        }
    }

    /// register a new connection under a fresh session id
    pub fn register(&self) -> (String, mpsc::Receiver<ServerEvent>) {
        let session_id = Uuid::new_v4().to_string();
        let rx = self.register_with(session_id.clone());
        (session_id, rx)
    }

    /// register a connection under a caller-chosen session id, replacing any previous one
    pub fn register_with(&self, session_id: String) -> mpsc::Receiver<ServerEvent> {
        let (tx, rx) = mpsc::channel(self.buffer);
        if self.sessions.insert(session_id.clone(), tx).is_some() {
            tracing::debug!("Replaced existing connection for session {}", session_id);
        }
        rx
    }

    /// Close `events` and forget `session_id` if that was its live connection.
    ///
    /// A newer connection registered under the same id keeps its entry.
    pub fn unregister(&self, session_id: &str, events: mpsc::Receiver<ServerEvent>) {
        drop(events);
        let removed = self
            .sessions
            .remove_if(session_id, |_, current| current.is_closed())
            .is_some();
        if !removed {
            tracing::debug!("Session {} is owned by a newer connection, keeping it", session_id);
        }
    }

    pub fn is_connected(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|tx| !tx.is_closed())
    }

    pub fn connections(&self) -> usize {
        self.sessions.len()
    }

    /// deliver `event` to the connection owning `session_id` only
    pub fn emit(&self, session_id: &str, event: ServerEvent) {
        let Some(tx) = self.sessions.get(session_id).map(|tx| tx.clone()) else {
            tracing::trace!("No connection for session {}, dropping {}", session_id, event.name());
            return;
        };

        match tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::trace!("Queue full for session {}, dropping {}", session_id, event.name());
            }
            Err(TrySendError::Closed(event)) => {
                tracing::trace!("Session {} disconnected, dropping {}", session_id, event.name());
                self.sessions
                    .remove_if(session_id, |_, current| current.same_channel(&tx));
            }
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(64)
    }
}

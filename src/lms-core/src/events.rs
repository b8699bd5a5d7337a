//! Typed import events published by the library manager, and a small
//! dispatcher that routes them to subscribed listeners.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// An album that finished importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumImport {
    /// Absolute directory holding the album's items.
    pub item_dir: PathBuf,
    /// The library manager's configured music directory.
    pub library_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportEvent {
    /// A whole import session finished.
    ImportCompleted,
    /// One album was imported.
    AlbumImported(AlbumImport),
}

impl ImportEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ImportEvent::ImportCompleted => EventKind::ImportCompleted,
            ImportEvent::AlbumImported(_) => EventKind::AlbumImported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ImportCompleted,
    AlbumImported,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ImportCompleted => "import-completed",
            EventKind::AlbumImported => "album-imported",
        }
    }
}

#[async_trait::async_trait]
pub trait ImportListener: Send + Sync {
    async fn on_event(&self, event: &ImportEvent);
}

/// Routes events to listeners subscribed to their kind, in registration order.
#[derive(Default)]
pub struct EventDispatcher {
    listeners: Vec<(EventKind, Arc<dyn ImportListener>)>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field(
                "listeners",
                &self
                    .listeners
                    .iter()
                    .map(|(kind, _)| kind.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EventKind, listener: Arc<dyn ImportListener>) {
        tracing::debug!("Registered listener for {}", kind.as_str());
        self.listeners.push((kind, listener));
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver `event` to every matching listener. Returns how many were called.
    pub async fn emit(&self, event: &ImportEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for (_, listener) in self.listeners.iter().filter(|(k, _)| *k == kind) {
            listener.on_event(event).await;
            delivered += 1;
        }
        if delivered == 0 {
            tracing::debug!("No listeners for {}", kind.as_str());
        }
        delivered
    }
}

//! Rescan policy: decides what, if anything, to ask the media server to
//! rescan after an import event.
//!
//! Failures are logged and reported through [`RescanOutcome`]; they never
//! propagate back into the library manager.

use crate::config::ListenerMethod;
use crate::events::{AlbumImport, EventDispatcher, EventKind, ImportEvent, ImportListener};
use crate::library::{relative_album_path, RelativePath};
use crate::rescan::RescanTarget;
use std::sync::Arc;

/// What happened in response to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescanOutcome {
    /// A rescan request was accepted by the server.
    Triggered { path: Option<RelativePath> },
    /// A full scan is already running.
    Skipped,
    /// The event does not apply to the configured listener method.
    Ignored,
    /// The request could not be made or was rejected.
    Failed { reason: String },
}

pub struct RescanListener {
    method: ListenerMethod,
    target: Arc<dyn RescanTarget>,
}

impl std::fmt::Debug for RescanListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RescanListener")
            .field("method", &self.method)
            .finish()
    }
}

impl RescanListener {
    pub fn new(method: ListenerMethod, target: Arc<dyn RescanTarget>) -> Self {
        Self { method, target }
    }

    pub fn method(&self) -> ListenerMethod {
        self.method
    }

    /// The single event kind this listener reacts to.
    pub fn event_kind(&self) -> EventKind {
        match self.method {
            ListenerMethod::Full => EventKind::ImportCompleted,
            ListenerMethod::Path => EventKind::AlbumImported,
        }
    }

    /// Register with `dispatcher` for the event kind matching the listener method.
    pub fn subscribe(self: &Arc<Self>, dispatcher: &mut EventDispatcher) {
        let kind = self.event_kind();
        dispatcher.register(kind, self.clone());
        tracing::info!(
            "LMS rescan listener registered (method: {}, event: {})",
            self.method,
            kind.as_str()
        );
    }

    pub async fn handle_import_event(&self, event: &ImportEvent) -> RescanOutcome {
        match (self.method, event) {
            (ListenerMethod::Full, ImportEvent::ImportCompleted) => self.rescan_library().await,
            // Path rescans go out without a status check.
            (ListenerMethod::Path, ImportEvent::AlbumImported(album)) => {
                self.rescan_album(album).await
            }
            _ => RescanOutcome::Ignored,
        }
    }

    /// Full rescan unless one is already running.
    pub async fn rescan_library(&self) -> RescanOutcome {
        if self.scan_in_progress().await {
            tracing::info!("LMS library scan already in progress. Skipping rescan.");
            return RescanOutcome::Skipped;
        }
        self.trigger(None).await
    }

    pub async fn rescan_album(&self, album: &AlbumImport) -> RescanOutcome {
        match relative_album_path(&album.item_dir, &album.library_dir) {
            Ok(path) => self.trigger(Some(path)).await,
            Err(e) => {
                tracing::error!("Skipping LMS path rescan: {}", e);
                RescanOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Scan status where any error counts as "not scanning".
    pub async fn scan_in_progress(&self) -> bool {
        match self.target.is_scanning().await {
            Ok(scanning) => scanning,
            Err(e) => {
                tracing::error!("Failed to check scan status: {}", e);
                false
            }
        }
    }

    /// Send a rescan for `path` (or the whole library) and log the result.
    pub async fn trigger(&self, path: Option<RelativePath>) -> RescanOutcome {
        match self.target.trigger_rescan(path.as_ref()).await {
            Ok(()) => {
                match &path {
                    Some(p) => tracing::info!("LMS rescan triggered for '{}'.", p),
                    None => tracing::info!("LMS library rescan triggered."),
                }
                RescanOutcome::Triggered { path }
            }
            Err(e) => {
                tracing::error!("Failed to trigger LMS rescan: {}", e);
                RescanOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ImportListener for RescanListener {
    async fn on_event(&self, event: &ImportEvent) {
        let outcome = self.handle_import_event(event).await;
        tracing::debug!("{} handled: {:?}", event.kind().as_str(), outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rescan::{ClientError, ClientResult};
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Status,
        Rescan(Option<String>),
    }

    enum Status {
        Scanning(bool),
        Malformed,
        Down,
    }

    struct FakeServer {
        status: Status,
        reject_rescan: bool,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeServer {
        fn new(status: Status) -> Arc<Self> {
            Arc::new(Self {
                status,
                reject_rescan: false,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                status: Status::Scanning(false),
                reject_rescan: true,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RescanTarget for FakeServer {
        async fn is_scanning(&self) -> ClientResult<bool> {
            self.calls.lock().unwrap().push(Call::Status);
            match self.status {
                Status::Scanning(value) => Ok(value),
                Status::Malformed => Err(ClientError::MalformedResponse {
                    message: "missing result._rescan".into(),
                }),
                Status::Down => Err(ClientError::Transport {
                    message: "connection refused".into(),
                }),
            }
        }

        async fn trigger_rescan(&self, path: Option<&RelativePath>) -> ClientResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Rescan(path.map(|p| p.as_str().to_string())));
            if self.reject_rescan {
                return Err(ClientError::HttpStatus { status: 500 });
            }
            Ok(())
        }
    }

    fn album(item_dir: &str, library_dir: &str) -> ImportEvent {
        ImportEvent::AlbumImported(AlbumImport {
            item_dir: PathBuf::from(item_dir),
            library_dir: PathBuf::from(library_dir),
        })
    }

    #[tokio::test]
    async fn full_mode_rescans_when_idle() {
        let server = FakeServer::new(Status::Scanning(false));
        let listener = RescanListener::new(ListenerMethod::Full, server.clone());

        let outcome = listener
            .handle_import_event(&ImportEvent::ImportCompleted)
            .await;

        assert_eq!(outcome, RescanOutcome::Triggered { path: None });
        assert_eq!(server.calls(), vec![Call::Status, Call::Rescan(None)]);
    }

    #[tokio::test]
    async fn full_mode_skips_while_scanning() {
        let server = FakeServer::new(Status::Scanning(true));
        let listener = RescanListener::new(ListenerMethod::Full, server.clone());

        let outcome = listener
            .handle_import_event(&ImportEvent::ImportCompleted)
            .await;

        assert_eq!(outcome, RescanOutcome::Skipped);
        assert_eq!(server.calls(), vec![Call::Status]);
    }

    #[tokio::test]
    async fn status_errors_count_as_not_scanning() {
        for status in [Status::Malformed, Status::Down] {
            let server = FakeServer::new(status);
            let listener = RescanListener::new(ListenerMethod::Full, server.clone());

            assert!(!listener.scan_in_progress().await);
            let outcome = listener
                .handle_import_event(&ImportEvent::ImportCompleted)
                .await;
            assert_eq!(outcome, RescanOutcome::Triggered { path: None });
        }
    }

    #[tokio::test]
    async fn full_mode_ignores_album_events() {
        let server = FakeServer::new(Status::Scanning(false));
        let listener = RescanListener::new(ListenerMethod::Full, server.clone());

        let outcome = listener
            .handle_import_event(&album("/data/music/A/B", "/data/music"))
            .await;

        assert_eq!(outcome, RescanOutcome::Ignored);
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn path_mode_rescans_album_without_status_check() {
        // Even a busy server gets the path rescan.
        let server = FakeServer::new(Status::Scanning(true));
        let listener = RescanListener::new(ListenerMethod::Path, server.clone());

        let outcome = listener
            .handle_import_event(&album("/data/music/Beatles/AbbeyRoad", "/data/music/"))
            .await;

        assert_eq!(
            outcome,
            RescanOutcome::Triggered {
                path: Some(RelativePath::from("Beatles/AbbeyRoad"))
            }
        );
        assert_eq!(
            server.calls(),
            vec![Call::Rescan(Some("Beatles/AbbeyRoad".into()))]
        );
    }

    #[tokio::test]
    async fn path_mode_skips_albums_outside_library() {
        let server = FakeServer::new(Status::Scanning(false));
        let listener = RescanListener::new(ListenerMethod::Path, server.clone());

        let outcome = listener
            .handle_import_event(&album("/elsewhere/A", "/data/music"))
            .await;

        assert!(matches!(outcome, RescanOutcome::Failed { .. }));
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn path_mode_ignores_import_completed() {
        let server = FakeServer::new(Status::Scanning(false));
        let listener = RescanListener::new(ListenerMethod::Path, server.clone());

        let outcome = listener
            .handle_import_event(&ImportEvent::ImportCompleted)
            .await;

        assert_eq!(outcome, RescanOutcome::Ignored);
        assert!(server.calls().is_empty());
    }

    #[tokio::test]
    async fn rejected_rescan_is_reported_not_raised() {
        let server = FakeServer::rejecting();
        let listener = RescanListener::new(ListenerMethod::Full, server.clone());

        let outcome = listener.rescan_library().await;

        assert_eq!(
            outcome,
            RescanOutcome::Failed {
                reason: "server responded with HTTP 500".into()
            }
        );
    }

    #[tokio::test]
    async fn subscribe_registers_one_handler_per_method() {
        let server = FakeServer::new(Status::Scanning(false));

        let mut dispatcher = EventDispatcher::new();
        Arc::new(RescanListener::new(ListenerMethod::Full, server.clone()))
            .subscribe(&mut dispatcher);
        assert_eq!(dispatcher.listener_count(EventKind::ImportCompleted), 1);
        assert_eq!(dispatcher.listener_count(EventKind::AlbumImported), 0);

        let mut dispatcher = EventDispatcher::new();
        Arc::new(RescanListener::new(ListenerMethod::Path, server.clone()))
            .subscribe(&mut dispatcher);
        assert_eq!(dispatcher.listener_count(EventKind::ImportCompleted), 0);
        assert_eq!(dispatcher.listener_count(EventKind::AlbumImported), 1);
    }

    #[tokio::test]
    async fn dispatched_events_reach_the_server() {
        let server = FakeServer::new(Status::Scanning(false));
        let mut dispatcher = EventDispatcher::new();
        Arc::new(RescanListener::new(ListenerMethod::Path, server.clone()))
            .subscribe(&mut dispatcher);

        dispatcher
            .emit(&album("/data/music/X/Y", "/data/music"))
            .await;
        dispatcher.emit(&ImportEvent::ImportCompleted).await;

        assert_eq!(server.calls(), vec![Call::Rescan(Some("X/Y".into()))]);
    }
}

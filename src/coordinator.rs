use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    common::ItemTag,
    config::Settings,
    content::{open_store, ContentService, ContentStore, ContentView},
    error::{AppError, StreamError},
    network::StreamClient,
    presentation::{DebugCommand, Presentation, PresentationRouter},
    sequencer::{PhaseTable, Sequencer},
};

/// What the visual layer gets: read-only snapshots plus the operator channel.
#[derive(Clone)]
pub struct KioskHandles {
    pub presentation: watch::Receiver<Presentation>,
    pub content: watch::Receiver<ContentView>,
    pub debug_tx: mpsc::Sender<DebugCommand>,
}

/// Owns the background tasks feeding the kiosk display.
pub struct Coordinator {
    handles: KioskHandles,
    stream_task: Option<JoinHandle<Result<(), StreamError>>>,
    router_task: Option<JoinHandle<()>>,
    content_task: Option<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn start(settings: Settings, table: PhaseTable, store: Arc<dyn ContentStore>) -> Self {
        let cancel_token = CancellationToken::new();
        let (patch_tx, patch_rx) = mpsc::channel(settings.stream.patch_buffer.max(1));
        let (debug_tx, debug_rx) = mpsc::channel(16);

        let client = StreamClient::new(
            settings.stream.endpoint.clone(),
            settings.stream.reconnect_delay(),
            patch_tx,
            cancel_token.child_token(),
        );
        let stream_task = tokio::spawn(client.run());

        let router = PresentationRouter::new(Sequencer::new(table), Instant::now())
            .with_debug_tag(settings.debug.tag.clone().map(ItemTag::new));
        let presentation = router.subscribe();
        let router_task = tokio::spawn(router.run(patch_rx, debug_rx, cancel_token.child_token()));

        let content_service = ContentService::new(store, presentation.clone());
        let content = content_service.subscribe();
        let content_task = tokio::spawn(content_service.run(cancel_token.child_token()));

        info!("Kiosk tasks started, backend at {}", settings.stream.endpoint);
        Self {
            handles: KioskHandles {
                presentation,
                content,
                debug_tx,
            },
            stream_task: Some(stream_task),
            router_task: Some(router_task),
            content_task: Some(content_task),
            cancel_token,
        }
    }

    pub fn handles(&self) -> KioskHandles {
        self.handles.clone()
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Cancels every task and waits until they have released the socket and
    /// dropped their pending timers.
    pub async fn shutdown(mut self) -> Result<(), AppError> {
        info!("Shutting down kiosk tasks");
        self.cancel_token.cancel();
        if let Some(task) = self.stream_task.take() {
            match task.await? {
                Ok(()) => {}
                Err(StreamError::ConsumerGone) => warn!("Stream client lost its consumer"),
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(task) = self.router_task.take() {
            task.await?;
        }
        if let Some(task) = self.content_task.take() {
            task.await?;
        }
        info!("Kiosk tasks stopped");
        Ok(())
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    table: PhaseTable,
    store: Option<Arc<dyn ContentStore>>,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            table: PhaseTable::kiosk(),
            store: None,
        }
    }

    // Overrides the backend endpoint from the settings.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.settings.stream.endpoint = endpoint.into();
        self
    }

    pub fn phase_table(mut self, table: PhaseTable) -> Self {
        self.table = table;
        self
    }

    // Replaces the store derived from `content.base`.
    pub fn content_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Spawns the tasks; must be called within a tokio runtime.
    pub fn build(self) -> Result<Coordinator, AppError> {
        if self.settings.stream.endpoint.is_empty() {
            return Err(AppError::Settings("stream.endpoint is empty".to_string()));
        }
        let store = self
            .store
            .unwrap_or_else(|| open_store(&self.settings.content.base));
        Ok(Coordinator::start(self.settings, self.table, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{InspectionState, PhaseIndex};
    use crate::content::DirectoryStore;
    use futures::SinkExt;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_tungstenite::{accept_async, tungstenite::Message};

    async fn wait_for_presentation(
        presentation: &mut watch::Receiver<Presentation>,
        condition: impl Fn(&Presentation) -> bool,
    ) {
        timeout(Duration::from_secs(5), async {
            loop {
                if condition(&presentation.borrow_and_update()) {
                    return;
                }
                presentation.changed().await.unwrap();
            }
        })
        .await
        .expect("presentation never reached the expected state");
    }

    #[tokio::test]
    async fn backend_messages_reach_the_presentation() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());
        let dir = tempfile::tempdir().unwrap();

        let coordinator = CoordinatorBuilder::new(Settings::default())
            .endpoint(endpoint)
            .content_store(Arc::new(DirectoryStore::new(dir.path())))
            .build()
            .unwrap();
        let mut handles = coordinator.handles();

        let (stream, _) = listener.accept().await.unwrap();
        let mut server = accept_async(stream).await.unwrap();
        server
            .send(Message::text(
                r#"{"tag": "cookie", "state": "state2", "boxes": []}"#,
            ))
            .await
            .unwrap();

        wait_for_presentation(&mut handles.presentation, |presentation| {
            presentation.state == InspectionState::State2
                && presentation.phase == PhaseIndex::new(1)
                && presentation.tag == Some(ItemTag::new("cookie"))
        })
        .await;

        timeout(Duration::from_secs(5), coordinator.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn debug_commands_work_without_a_backend() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}", listener.local_addr().unwrap());
        drop(listener);

        let coordinator = CoordinatorBuilder::new(Settings::default())
            .endpoint(endpoint)
            .content_store(Arc::new(DirectoryStore::new("missing")))
            .build()
            .unwrap();
        let mut handles = coordinator.handles();
        handles.debug_tx.send(DebugCommand::NextState).await.unwrap();

        wait_for_presentation(&mut handles.presentation, |presentation| {
            presentation.state == InspectionState::State1_1
                && presentation.tag == Some(ItemTag::new("tag one"))
        })
        .await;

        timeout(Duration::from_secs(5), coordinator.shutdown())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn empty_endpoint_is_rejected() {
        let result = CoordinatorBuilder::new(Settings::default()).endpoint("").build();
        assert!(matches!(result, Err(AppError::Settings(_))));
    }
}

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::common::{ItemTag, PhaseIndex};
use crate::content::description::{load_description, Description};
use crate::content::item_result::{load_item_result, ItemResult};
use crate::content::retrieved::{load_retrieval, Retrieval};
use crate::content::store::ContentStore;
use crate::presentation::Presentation;

/// Content currently backing the description, arrows and retrieval panels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentView {
    pub description: Description,
    pub item_result: Option<ItemResult>,
    pub retrieval: Retrieval,
}

type DescriptionKey = (Option<ItemTag>, PhaseIndex);

enum Loaded {
    Description(DescriptionKey, Description),
    ItemResult(Option<ItemTag>, Option<ItemResult>),
    Retrieval(Option<ItemTag>, Retrieval),
}

/// The key a panel's content was last requested for, plus the load in
/// flight for it.
struct Slot<K> {
    key: Option<K>,
    task: Option<AbortHandle>,
}

impl<K: PartialEq> Slot<K> {
    fn new() -> Self {
        Self {
            key: None,
            task: None,
        }
    }

    /// Switches to `key`, aborting the previous load. `false` if unchanged.
    fn refresh(&mut self, key: &K) -> bool
    where
        K: Clone,
    {
        if self.key.as_ref() == Some(key) {
            return false;
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.key = Some(key.clone());
        true
    }

    fn is_current(&self, key: &K) -> bool {
        self.key.as_ref() == Some(key)
    }
}

/// Follows presentation snapshots and keeps [`ContentView`] in step with
/// them. A load whose key has been superseded never reaches the view.
pub struct ContentService {
    store: Arc<dyn ContentStore>,
    snapshots: watch::Receiver<Presentation>,
    content_tx: watch::Sender<ContentView>,
    tasks: JoinSet<Loaded>,
    description: Slot<DescriptionKey>,
    item_result: Slot<Option<ItemTag>>,
    retrieval: Slot<Option<ItemTag>>,
}

impl ContentService {
    pub fn new(store: Arc<dyn ContentStore>, snapshots: watch::Receiver<Presentation>) -> Self {
        let (content_tx, _) = watch::channel(ContentView::default());
        Self {
            store,
            snapshots,
            content_tx,
            tasks: JoinSet::new(),
            description: Slot::new(),
            item_result: Slot::new(),
            retrieval: Slot::new(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ContentView> {
        self.content_tx.subscribe()
    }

    pub async fn run(mut self, cancel_token: CancellationToken) {
        info!("Content service running");
        self.on_snapshot();
        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => break,
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        debug!("Presentation router gone, content service exiting");
                        break;
                    }
                    self.on_snapshot();
                }
                Some(joined) = self.tasks.join_next(), if !self.tasks.is_empty() => match joined {
                    Ok(loaded) => self.apply(loaded),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => warn!("Content load failed: {}", e),
                },
            }
        }
        self.tasks.abort_all();
        info!("Content service stopped");
    }

    fn on_snapshot(&mut self) {
        let snapshot = self.snapshots.borrow_and_update().clone();

        let description_key = (snapshot.tag.clone(), snapshot.phase);
        if self.description.refresh(&description_key) {
            let store = self.store.clone();
            let handle = self.tasks.spawn(async move {
                let (tag, phase) = &description_key;
                let description = load_description(store.as_ref(), tag.as_ref(), *phase).await;
                Loaded::Description(description_key, description)
            });
            self.description.task = Some(handle);
        }

        let result_key = snapshot
            .tag
            .clone()
            .filter(|_| ItemResult::shown_in(snapshot.state));
        if self.item_result.refresh(&result_key) {
            match result_key {
                None => self.publish(|view| replace(&mut view.item_result, None)),
                Some(tag) => {
                    let store = self.store.clone();
                    let handle = self.tasks.spawn(async move {
                        let result = load_item_result(store.as_ref(), &tag).await;
                        Loaded::ItemResult(Some(tag), result)
                    });
                    self.item_result.task = Some(handle);
                }
            }
        }

        let retrieval_key = snapshot.tag;
        if self.retrieval.refresh(&retrieval_key) {
            match retrieval_key {
                None => self.publish(|view| replace(&mut view.retrieval, Retrieval::Idle)),
                Some(tag) => {
                    self.publish(|view| replace(&mut view.retrieval, Retrieval::Loading));
                    let store = self.store.clone();
                    let handle = self.tasks.spawn(async move {
                        let retrieval = load_retrieval(store.as_ref(), &tag).await;
                        Loaded::Retrieval(Some(tag), retrieval)
                    });
                    self.retrieval.task = Some(handle);
                }
            }
        }
    }

    fn apply(&mut self, loaded: Loaded) {
        match loaded {
            Loaded::Description(key, description) if self.description.is_current(&key) => {
                self.description.task = None;
                self.publish(|view| replace(&mut view.description, description));
            }
            Loaded::ItemResult(key, result) if self.item_result.is_current(&key) => {
                self.item_result.task = None;
                self.publish(|view| replace(&mut view.item_result, result));
            }
            Loaded::Retrieval(key, retrieval) if self.retrieval.is_current(&key) => {
                self.retrieval.task = None;
                self.publish(|view| replace(&mut view.retrieval, retrieval));
            }
            _ => debug!("Discarded stale content load"),
        }
    }

    fn publish(&self, update: impl FnOnce(&mut ContentView) -> bool) {
        self.content_tx.send_if_modified(update);
    }
}

/// Stores `value`, reporting whether anything changed.
fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::InspectionState;
    use crate::content::store::tests::MemoryStore;
    use std::time::Duration;

    fn snapshot(tag: Option<&str>, state: InspectionState, phase: u32) -> Presentation {
        Presentation {
            tag: tag.map(ItemTag::new),
            state,
            phase: PhaseIndex::new(phase),
            detections: Vec::new(),
        }
    }

    async fn wait_until(
        content: &mut watch::Receiver<ContentView>,
        condition: impl Fn(&ContentView) -> bool,
    ) {
        tokio::time::timeout(Duration::from_secs(30), async {
            loop {
                if condition(&content.borrow_and_update()) {
                    return;
                }
                content.changed().await.unwrap();
            }
        })
        .await
        .expect("content never reached the expected state");
    }

    fn start(
        store: MemoryStore,
        initial: Presentation,
    ) -> (
        watch::Sender<Presentation>,
        watch::Receiver<ContentView>,
        CancellationToken,
        tokio::task::JoinHandle<()>,
    ) {
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let service = ContentService::new(Arc::new(store), snapshot_rx);
        let content = service.subscribe();
        let cancel_token = CancellationToken::new();
        let task = tokio::spawn(service.run(cancel_token.clone()));
        (snapshot_tx, content, cancel_token, task)
    }

    #[tokio::test]
    async fn result_state_loads_every_panel() {
        let store = MemoryStore::default()
            .with_file("cookie/09_description.txt", "Verdict\nLooks fine.")
            .with_file("cookie/ItemResult.txt", "good")
            .with_file("cookie/RetrievedData.txt", "report.pdf");
        let (_snapshot_tx, mut content, cancel_token, task) =
            start(store, snapshot(Some("cookie"), InspectionState::State6, 9));

        wait_until(&mut content, |view| {
            view.description.title == "Verdict"
                && view.item_result == Some(ItemResult::Good)
                && matches!(view.retrieval, Retrieval::Ready(_))
        })
        .await;
        assert_eq!(content.borrow().retrieval.rows()[0].name, "report.pdf");

        cancel_token.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn leaving_result_states_clears_the_result() {
        let store = MemoryStore::default().with_file("cookie/ItemResult.txt", "Discarded");
        let (snapshot_tx, mut content, cancel_token, task) =
            start(store, snapshot(Some("cookie"), InspectionState::State7, 9));
        wait_until(&mut content, |view| view.item_result == Some(ItemResult::Discarded)).await;

        snapshot_tx.send_replace(snapshot(Some("cookie"), InspectionState::State1, 0));
        wait_until(&mut content, |view| view.item_result.is_none()).await;

        cancel_token.cancel();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn clearing_the_tag_returns_to_idle() {
        let store = MemoryStore::default().with_file("cookie/RetrievedData.txt", "a.csv");
        let (snapshot_tx, mut content, cancel_token, task) =
            start(store, snapshot(Some("cookie"), InspectionState::State4_1, 6));
        wait_until(&mut content, |view| matches!(view.retrieval, Retrieval::Ready(_))).await;

        snapshot_tx.send_replace(snapshot(None, InspectionState::State1, 0));
        wait_until(&mut content, |view| {
            view.retrieval == Retrieval::Idle && view.description == Description::no_tag()
        })
        .await;

        cancel_token.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_load_never_reaches_the_view() {
        let store = MemoryStore::default()
            .with_file("slow/03_description.txt", "Slow title")
            .with_delay("slow/03_description.txt", Duration::from_secs(5))
            .with_file("fast/03_description.txt", "Fast title");
        let (snapshot_tx, mut content, cancel_token, task) =
            start(store, snapshot(Some("slow"), InspectionState::State4_1, 3));
        tokio::task::yield_now().await;

        snapshot_tx.send_replace(snapshot(Some("fast"), InspectionState::State4_1, 3));
        wait_until(&mut content, |view| view.description.title == "Fast title").await;

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(content.borrow().description.title, "Fast title");

        cancel_token.cancel();
        task.await.unwrap();
    }
}

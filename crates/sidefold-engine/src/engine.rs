//! The overlay engine: ties the page tree, the provider resolver, the
//! normalizer, and the fold controller into one resync loop.

use std::sync::Arc;

use sidefold_core::error::{Result, SidefoldError};
use sidefold_core::page::PageTree;
use sidefold_core::turn::{FoldController, TurnNormalizer, TurnRecord, TurnResolver};
use sidefold_providers::resolver_for_origin;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::scheduler::ResyncScheduler;

struct Inner {
    page: Arc<Mutex<PageTree>>,
    resolver: Arc<dyn TurnResolver>,
    normalizer: TurnNormalizer,
    fold: Mutex<FoldController>,
    turns_tx: watch::Sender<Vec<TurnRecord>>,
}

impl Inner {
    /// One full recompute: normalize, re-apply fold intent, publish.
    ///
    /// The pass itself decorates the tree (control injection,
    /// placeholders), which notifies the scheduler once more; the follow-up
    /// pass finds nothing to change and the loop settles.
    async fn pass(&self) {
        let mut page = self.page.lock().await;
        let fold = self.fold.lock().await;
        let turns = self.normalizer.normalize(&mut page, fold.state());
        fold.reapply(&mut page, self.resolver.as_ref(), &turns);
        debug!(provider = self.resolver.provider(), turns = turns.len(), "resync pass");
        self.turns_tx.send_replace(turns);
    }
}

/// Live view of one chat page: a continuously reconciled turn list with
/// fold control.
///
/// The host embedding owns the page tree and mutates it to mirror the
/// real document; the engine only ever reads it and applies local
/// decoration. All published [`TurnRecord`]s are snapshots, rebuilt
/// wholesale on every pass.
pub struct OverlayEngine {
    inner: Arc<Inner>,
    scheduler: ResyncScheduler,
    loop_handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl OverlayEngine {
    /// Builds an engine with an explicit resolver.
    pub fn new(page: Arc<Mutex<PageTree>>, resolver: Arc<dyn TurnResolver>) -> Self {
        let (turns_tx, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(Inner {
                page,
                normalizer: TurnNormalizer::new(resolver.clone()),
                resolver,
                fold: Mutex::new(FoldController::new()),
                turns_tx,
            }),
            scheduler: ResyncScheduler::default(),
            loop_handle: std::sync::Mutex::new(None),
        }
    }

    /// Builds an engine for a host origin. An origin no resolver claims is
    /// the one fatal startup condition.
    pub fn for_origin(page: Arc<Mutex<PageTree>>, origin: &str) -> Result<Self> {
        let resolver =
            resolver_for_origin(origin).ok_or_else(|| SidefoldError::no_provider(origin))?;
        info!(provider = resolver.provider(), origin, "provider selected");
        Ok(Self::new(page, resolver))
    }

    pub fn with_scheduler(mut self, scheduler: ResyncScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn provider(&self) -> &'static str {
        self.inner.resolver.provider()
    }

    /// Runs the initial pass and starts the resync loop. Idempotent; a
    /// second call is a no-op.
    pub async fn start(&self) {
        // Subscribe before the initial pass so no mutation between the
        // pass and the loop start is missed. Waits for the page lock if
        // the embedding holds it.
        let mut revisions = self.inner.page.lock().await.subscribe();
        {
            let mut handle = self.loop_handle.lock().unwrap_or_else(|p| p.into_inner());
            if handle.is_some() {
                return;
            }
            let inner = self.inner.clone();
            let scheduler = self.scheduler;
            *handle = Some(tokio::spawn(async move {
                while scheduler.next_burst(&mut revisions).await {
                    inner.pass().await;
                }
            }));
        }
        self.inner.pass().await;
    }

    /// Latest published turn list.
    pub fn turns(&self) -> Vec<TurnRecord> {
        self.inner.turns_tx.borrow().clone()
    }

    /// Subscribes to turn list updates; the receiver always observes the
    /// latest snapshot.
    pub fn subscribe_turns(&self) -> watch::Receiver<Vec<TurnRecord>> {
        self.inner.turns_tx.subscribe()
    }

    /// Records fold intent for a turn and applies it. Unknown ids record
    /// intent only; it applies if the id resurfaces.
    pub async fn toggle_fold(&self, id: &str, folded: bool) {
        let mut page = self.inner.page.lock().await;
        let mut fold = self.inner.fold.lock().await;
        // Fresh pass first: published snapshots may hold dangling ids.
        let turns = self.inner.normalizer.normalize(&mut page, fold.state());
        fold.toggle_fold(&mut page, self.inner.resolver.as_ref(), &turns, id, folded);
        let turns = self.inner.normalizer.normalize(&mut page, fold.state());
        self.inner.turns_tx.send_replace(turns);
    }

    /// Requests the host to scroll the turn's prompt into view. Returns
    /// false if the id is not currently resolvable.
    pub async fn scroll_to(&self, id: &str) -> bool {
        let mut page = self.inner.page.lock().await;
        let fold = self.inner.fold.lock().await;
        let turns = self.inner.normalizer.normalize(&mut page, fold.state());
        match turns.iter().find(|turn| turn.id == id) {
            Some(turn) => page.scroll_into_view(turn.prompt),
            None => false,
        }
    }
}

impl Drop for OverlayEngine {
    fn drop(&mut self) {
        if let Ok(mut handle) = self.loop_handle.lock() {
            if let Some(handle) = handle.take() {
                handle.abort();
            }
        }
    }
}

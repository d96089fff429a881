//! A room view: cached rooms kept current by pull, push and optimistic writes.
//!
//! The view owns its cache and its push subscription. Pull replaces the cache
//! wholesale, push messages replace or merge, and mutations update the cache
//! before the backend confirms. Once the view is deactivated nothing writes to
//! its cache again, including responses that were already in flight.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::notices::{Notice, NoticeBoard};
use crate::rooms::{
    filter_and_sort, Room, RoomApi, RoomFilter, RoomId, RoomPatch, RoomScope, RoomStatus, SortKey,
};

use super::{
    ChannelEvent, ConnectionState, EntityCache, MergeOutcome, PushChannel, PushMessage,
    Subscription,
};

const IMPORT_SUCCESS_MESSAGE: &str = "Rooms imported to housekeeping dashboard successfully!";

/// Behaviour switches for a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Re-pull after the push channel reconnects, closing any missed-event gap.
    pub refresh_on_reconnect: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            refresh_on_reconnect: true,
        }
    }
}

/// What a pull did with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Replaced { count: usize },
    /// The view was torn down or a newer pull was started before the response arrived.
    Discarded,
}

/// Result of a status toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    Toggled { from: RoomStatus, to: RoomStatus },
    /// The room's status is not part of the clean/dirty cycle; nothing was sent.
    Skipped { status: RoomStatus },
}

/// State shared between the view and its push task.
struct ViewState {
    cache: RwLock<EntityCache<Room>>,
    scope: RwLock<RoomScope>,
    active: AtomicBool,
    loading: AtomicBool,
    pull_generation: AtomicU64,
    last_error: RwLock<Option<Error>>,
    notices: RwLock<NoticeBoard>,
    revision: watch::Sender<u64>,
    connection: watch::Sender<ConnectionState>,
    /// Bumped on every attach and detach. Only the push task of the current
    /// epoch may publish connection state.
    push_epoch: Mutex<u64>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ViewState {
    fn new(scope: RoomScope) -> Self {
        Self {
            cache: RwLock::new(EntityCache::new()),
            scope: RwLock::new(scope),
            active: AtomicBool::new(true),
            loading: AtomicBool::new(false),
            pull_generation: AtomicU64::new(0),
            last_error: RwLock::new(None),
            notices: RwLock::new(NoticeBoard::new()),
            revision: watch::Sender::new(0),
            connection: watch::Sender::new(ConnectionState::Disconnected),
            push_epoch: Mutex::new(0),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn scope(&self) -> RoomScope {
        *read(&self.scope)
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn replace_rooms(&self, rooms: Vec<Room>) -> usize {
        let count = {
            let mut cache = write(&self.cache);
            if !self.is_active() {
                return 0;
            }
            cache.replace(rooms);
            cache.len()
        };
        self.bump_revision();
        count
    }

    fn merge_room(&self, patch: &RoomPatch) -> MergeOutcome {
        let outcome = {
            let mut cache = write(&self.cache);
            if !self.is_active() {
                return MergeOutcome::UnknownKey;
            }
            cache.merge(patch)
        };
        match outcome {
            MergeOutcome::Applied => self.bump_revision(),
            MergeOutcome::Unchanged => {}
            MergeOutcome::UnknownKey => {
                debug!("Ignoring update for room {} which is not loaded", patch.id)
            }
        }
        outcome
    }

    /// Flips clean/dirty under one write lock so the read and the write see the same record.
    ///
    /// Returns the patch to send when the status changed.
    fn optimistic_toggle(&self, id: &RoomId) -> Result<(ToggleOutcome, Option<RoomPatch>)> {
        let (outcome, patch) = {
            let mut cache = write(&self.cache);
            if !self.is_active() {
                return Err(Error::invalid_input("View is no longer active"));
            }
            let room = cache.get(id).ok_or_else(|| Error::UnknownRoom(id.clone()))?;
            let current = room.status.clone();
            let Some(next) = current.toggled() else {
                return Ok((ToggleOutcome::Skipped { status: current }, None));
            };
            let patch = RoomPatch::for_room(room).with_status(next.clone());
            cache.merge(&patch);
            let outcome = ToggleOutcome::Toggled {
                from: current,
                to: next,
            };
            (outcome, patch)
        };
        self.bump_revision();
        Ok((outcome, Some(patch)))
    }

    fn record_failure(&self, context: &str, err: &Error) {
        warn!("{}: {}", context, err);
        *write(&self.last_error) = Some(err.clone());
        write(&self.notices).error(format!("{}: {}", context, err.user_message()));
    }

    fn clear_error(&self) {
        *write(&self.last_error) = None;
    }

    /// Starts a new push epoch and publishes `state` for it.
    fn begin_push_epoch(&self, state: ConnectionState) -> u64 {
        let mut epoch = self.push_epoch.lock().unwrap_or_else(PoisonError::into_inner);
        *epoch += 1;
        self.connection.send_replace(state);
        *epoch
    }

    fn is_current_epoch(&self, epoch: u64) -> bool {
        *self.push_epoch.lock().unwrap_or_else(PoisonError::into_inner) == epoch
    }

    /// Publishes `state` unless the push task of `epoch` has been detached.
    fn set_connection(&self, epoch: u64, state: ConnectionState) -> bool {
        let current = self.push_epoch.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != epoch {
            return false;
        }
        self.connection.send_replace(state);
        true
    }
}

/// Runs one pull for the state's current scope.
async fn pull(state: &ViewState, api: &dyn RoomApi) -> Result<RefreshOutcome> {
    let scope = state.scope();
    let generation = state.pull_generation.fetch_add(1, Ordering::SeqCst) + 1;
    state.loading.store(true, Ordering::SeqCst);
    debug!("Pulling rooms for {}", scope);

    let result = api.list_rooms(scope).await;

    let latest = state.pull_generation.load(Ordering::SeqCst) == generation;
    if latest {
        state.loading.store(false, Ordering::SeqCst);
    }
    if !state.is_active() {
        debug!("Discarding pull for {}: view is no longer active", scope);
        return Ok(RefreshOutcome::Discarded);
    }
    if !latest {
        debug!("Discarding pull for {}: superseded by a newer pull", scope);
        return Ok(RefreshOutcome::Discarded);
    }

    match result {
        Ok(rooms) => {
            let count = state.replace_rooms(rooms);
            state.clear_error();
            debug!("Loaded {} rooms for {}", count, scope);
            Ok(RefreshOutcome::Replaced { count })
        }
        Err(err) => {
            state.record_failure("Failed to load rooms", &err);
            Err(err)
        }
    }
}

/// Applies subscription events until the subscription ends or the view goes away.
async fn run_push_loop(
    mut subscription: Subscription,
    state: Weak<ViewState>,
    epoch: u64,
    api: Arc<dyn RoomApi>,
    options: ViewOptions,
) {
    let mut dropped_once = false;
    while let Some(event) = subscription.next().await {
        let Some(state) = state.upgrade() else {
            break;
        };
        if !state.is_active() || !state.is_current_epoch(epoch) {
            break;
        }
        match event {
            ChannelEvent::Message(PushMessage::Snapshot { rooms }) => {
                let count = state.replace_rooms(rooms);
                debug!("Applied pushed snapshot of {} rooms", count);
            }
            ChannelEvent::Message(PushMessage::Delta { room }) => {
                state.merge_room(&room);
            }
            ChannelEvent::Connected => {
                if !state.set_connection(epoch, ConnectionState::Connected) {
                    break;
                }
                if dropped_once && options.refresh_on_reconnect {
                    info!("Realtime channel reconnected, refreshing rooms");
                    // Failures are already recorded on the view.
                    let _ = pull(&state, api.as_ref()).await;
                }
            }
            ChannelEvent::Disconnected { reason } => {
                dropped_once = true;
                warn!("Realtime channel disconnected: {}", reason);
                if !state.set_connection(epoch, ConnectionState::Disconnected) {
                    break;
                }
            }
        }
    }
    debug!("Push loop finished");
}

/// Owned push task; aborted when dropped.
struct PushTask {
    handle: JoinHandle<()>,
}

impl Drop for PushTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A view over the rooms of one scope.
pub struct RoomView {
    state: Arc<ViewState>,
    api: Arc<dyn RoomApi>,
    channel: Arc<dyn PushChannel>,
    options: ViewOptions,
    push: Mutex<Option<PushTask>>,
}

impl RoomView {
    /// Creates a view with an empty cache. Nothing is fetched until [`RoomView::refresh`].
    pub fn new(
        api: Arc<dyn RoomApi>,
        channel: Arc<dyn PushChannel>,
        scope: RoomScope,
        options: ViewOptions,
    ) -> Self {
        Self {
            state: Arc::new(ViewState::new(scope)),
            api,
            channel,
            options,
            push: Mutex::new(None),
        }
    }

    /// Creates a view, pulls once and attaches the push subscription.
    ///
    /// Pull and subscription failures are recorded on the view rather than
    /// returned; the view is usable either way.
    pub async fn activate(
        api: Arc<dyn RoomApi>,
        channel: Arc<dyn PushChannel>,
        scope: RoomScope,
        options: ViewOptions,
    ) -> Self {
        let view = Self::new(api, channel, scope, options);
        let _ = view.refresh().await;
        if let Err(err) = view.attach_push() {
            view.state
                .record_failure("Failed to subscribe to live updates", &err);
        }
        view
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pull
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-fetches the listing and replaces the cache.
    ///
    /// On failure the previous rooms stay in place and the error is recorded.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        pull(&self.state, self.api.as_ref()).await
    }

    /// Switches scope and pulls for it.
    pub async fn set_scope(&self, scope: RoomScope) -> Result<RefreshOutcome> {
        *write(&self.state.scope) = scope;
        self.refresh().await
    }

    pub async fn previous_day(&self) -> Result<RefreshOutcome> {
        self.set_scope(self.scope().shifted(-1)).await
    }

    pub async fn next_day(&self) -> Result<RefreshOutcome> {
        self.set_scope(self.scope().shifted(1)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Push
    // ─────────────────────────────────────────────────────────────────────────

    /// Subscribes to the push channel unless a subscription already exists.
    ///
    /// Returns `true` if this call created the subscription. Must be called
    /// from within a Tokio runtime.
    pub fn attach_push(&self) -> Result<bool> {
        let mut push = self.push.lock().unwrap_or_else(PoisonError::into_inner);
        if push.is_some() || !self.state.is_active() {
            return Ok(false);
        }

        let subscription = self.channel.subscribe()?;
        let epoch = self.state.begin_push_epoch(ConnectionState::Connecting);
        let handle = tokio::spawn(run_push_loop(
            subscription,
            Arc::downgrade(&self.state),
            epoch,
            Arc::clone(&self.api),
            self.options,
        ));
        *push = Some(PushTask { handle });
        debug!("Attached push subscription for {}", self.scope());
        Ok(true)
    }

    /// Releases the push subscription, if any.
    ///
    /// The task is aborted before the state changes, and the epoch bump keeps
    /// a task that is mid-step from publishing afterwards.
    pub fn detach_push(&self) {
        let task = self
            .push
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            drop(task);
            self.state.begin_push_epoch(ConnectionState::Disconnected);
            debug!("Detached push subscription for {}", self.scope());
        }
    }

    pub fn has_push(&self) -> bool {
        self.push
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Tears the view down. Later pushes and in-flight responses are ignored.
    pub fn deactivate(&self) {
        if self.state.active.swap(false, Ordering::SeqCst) {
            debug!("Deactivating view for {}", self.scope());
        }
        self.detach_push();
        // Waits out a cache write that checked `active` before the swap.
        drop(write(&self.state.cache));
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Flips a room between clean and dirty.
    ///
    /// The cache changes before the request is sent. A failed write is
    /// reported but not rolled back; the next pull or push corrects it.
    pub async fn toggle_status(&self, id: &RoomId) -> Result<ToggleOutcome> {
        let (outcome, patch) = self.state.optimistic_toggle(id)?;
        let Some(patch) = patch else {
            debug!("Room {} has a frozen status; not toggling", id);
            return Ok(outcome);
        };

        if let Err(err) = self.api.update_room(id, &patch).await {
            self.state
                .record_failure(&format!("Failed to update room {}", id), &err);
            return Err(err);
        }
        Ok(outcome)
    }

    /// Saves dashboard edits for one room, then re-pulls.
    ///
    /// The patch is written with the field spellings of the cached room.
    pub async fn save_edits(&self, mut patch: RoomPatch) -> Result<()> {
        if !self.state.is_active() {
            return Err(Error::invalid_input("View is no longer active"));
        }
        let Some(wire) = read(&self.state.cache).get(&patch.id).map(|room| room.wire) else {
            return Err(Error::UnknownRoom(patch.id));
        };
        patch.wire = wire;
        if patch.is_empty() {
            return Ok(());
        }

        self.state.merge_room(&patch);
        if let Err(err) = self.api.update_room(&patch.id, &patch).await {
            self.state
                .record_failure(&format!("Failed to update room {}", patch.id), &err);
            return Err(err);
        }
        let _ = self.refresh().await;
        Ok(())
    }

    /// Dashboard "Import to Housekeeping" for the current date.
    pub async fn import_to_housekeeping(&self) -> Result<String> {
        let Some(date) = self.scope().date() else {
            return Err(Error::invalid_input("Import needs a dashboard date"));
        };
        match self.api.import_to_housekeeping(date).await {
            Ok(message) => {
                let message = message.unwrap_or_else(|| IMPORT_SUCCESS_MESSAGE.to_string());
                write(&self.state.notices).success(message.clone());
                info!("Imported rooms for {} to housekeeping", date);
                Ok(message)
            }
            Err(err) => {
                self.state
                    .record_failure("Failed to import to housekeeping dashboard", &err);
                Err(err)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read access
    // ─────────────────────────────────────────────────────────────────────────

    pub fn scope(&self) -> RoomScope {
        self.state.scope()
    }

    pub fn rooms(&self) -> Vec<Room> {
        read(&self.state.cache).to_vec()
    }

    pub fn room(&self, id: &RoomId) -> Option<Room> {
        read(&self.state.cache).get(id).cloned()
    }

    /// Runs `f` against the cache without cloning it.
    pub fn with_rooms<R>(&self, f: impl FnOnce(&EntityCache<Room>) -> R) -> R {
        f(&read(&self.state.cache))
    }

    pub fn filtered(&self, filter: &RoomFilter, sort: SortKey) -> Vec<Room> {
        self.with_rooms(|cache| {
            filter_and_sort(cache, filter, sort)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    pub fn is_loading(&self) -> bool {
        self.state.loading.load(Ordering::SeqCst)
    }

    pub fn last_error(&self) -> Option<Error> {
        read(&self.state.last_error).clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        read(&self.state.notices).active().to_vec()
    }

    pub fn dismiss_notice(&self, id: Uuid) -> bool {
        write(&self.state.notices).dismiss(id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.connection.borrow()
    }

    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.state.connection.subscribe()
    }

    /// Counter bumped on every cache change.
    pub fn revision(&self) -> u64 {
        *self.state.revision.borrow()
    }

    pub fn watch_revision(&self) -> watch::Receiver<u64> {
        self.state.revision.subscribe()
    }
}

impl Drop for RoomView {
    fn drop(&mut self) {
        self.deactivate();
    }
}

// Copyright 2026 Paul Adamson
// Licensed under the Apache License, Version 2.0
//
// LifecycleWatcher - decides when a navigation has completed
//
// The browser reports load progress as independent, out-of-order events for every
// frame in the tree. A watcher fuses them into exactly one outcome for one waiter.
//
// Architecture:
// - Five listeners (disconnect, lifecycle event, same-document navigation, frame
//   detached, request) only forward a message into one ordered inbox.
// - A single task owns the watcher state and runs every handler in order, so no
//   handler ever races another.
// - Every outcome (success, termination, and the caller's timeout) is written through
//   one single-resolve gate. The first write wins; later writes are no-ops.

use crate::error::{Error, Result};
use crate::protocol::frame::Frame;
use crate::protocol::lifecycle::{LifecycleEvent, expected_lifecycle};
use crate::protocol::request::Request;
use crate::protocol::response::Response;
use crate::server::events::Subscription;
use crate::server::frame_manager::FrameManager;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Why a navigation ended without success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The transport to the browser was lost
    Disconnected,
    /// The watched frame was removed from the frame tree
    FrameDetached,
}

/// The single terminal result of a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Success,
    Terminated(TerminationReason),
    /// The caller's timeout elapsed first
    TimedOut,
    /// The watcher was disposed while still pending
    Disposed,
}

impl NavigationOutcome {
    fn into_result(self, timeout: Option<Duration>) -> Result<()> {
        match self {
            NavigationOutcome::Success => Ok(()),
            NavigationOutcome::Terminated(TerminationReason::Disconnected) => {
                Err(Error::TerminatedDisconnected)
            }
            NavigationOutcome::Terminated(TerminationReason::FrameDetached) => {
                Err(Error::TerminatedFrameDetached)
            }
            NavigationOutcome::TimedOut => Err(Error::Timeout(format!(
                "Navigation timeout of {} ms exceeded",
                timeout.map_or(0, |t| t.as_millis())
            ))),
            NavigationOutcome::Disposed => Err(Error::Disposed),
        }
    }
}

/// Returns true if `frame` and every frame below it have seen all `expected` events.
///
/// Evaluated against the live tree on every call. An empty expectation is satisfied
/// by any frame.
pub fn check_lifecycle(frame: &Frame, expected: &[LifecycleEvent]) -> bool {
    if !expected.iter().all(|event| frame.has_lifecycle_event(*event)) {
        return false;
    }
    frame
        .child_frames()
        .iter()
        .all(|child| check_lifecycle(child, expected))
}

/// Single-resolve slot shared by the watcher task and the waiter.
#[derive(Clone)]
struct ResultGate {
    tx: Arc<watch::Sender<Option<NavigationOutcome>>>,
}

impl ResultGate {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Records `outcome` if nothing was recorded yet. Returns true if this call won.
    fn resolve(&self, outcome: NavigationOutcome) -> bool {
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(outcome);
            true
        })
    }

    fn outcome(&self) -> Option<NavigationOutcome> {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<Option<NavigationOutcome>> {
        self.tx.subscribe()
    }
}

/// The watcher's subscriptions, released as a unit exactly once.
struct Listeners {
    subscriptions: Mutex<Option<Vec<Subscription>>>,
}

impl Listeners {
    fn new(subscriptions: Vec<Subscription>) -> Self {
        Self {
            subscriptions: Mutex::new(Some(subscriptions)),
        }
    }

    /// Returns the number of subscriptions released by this call.
    fn release(&self) -> usize {
        let Some(subscriptions) = self.subscriptions.lock().take() else {
            return 0;
        };
        subscriptions
            .into_iter()
            .map(|mut subscription| subscription.release())
            .filter(|released| *released)
            .count()
    }

    fn is_released(&self) -> bool {
        self.subscriptions.lock().is_none()
    }
}

#[derive(Debug)]
enum WatcherMessage {
    Disconnected,
    LifecycleEvent,
    NavigatedWithinDocument(Frame),
    FrameDetached(Frame),
    Request(Request),
}

/// State owned by the watcher task. Nothing else mutates it.
struct WatcherState {
    frame_manager: Arc<FrameManager>,
    frame: Frame,
    expected: Vec<LifecycleEvent>,
    initial_loader_id: String,
    has_same_document_navigation: bool,
    navigation_request: Arc<Mutex<Option<Request>>>,
    gate: ResultGate,
    committed: watch::Sender<bool>,
}

impl WatcherState {
    fn handle(&mut self, message: WatcherMessage) {
        match message {
            WatcherMessage::Disconnected => self.terminate(TerminationReason::Disconnected),
            WatcherMessage::LifecycleEvent => self.check_lifecycle_complete(),
            WatcherMessage::NavigatedWithinDocument(frame) => {
                if frame != self.frame {
                    return;
                }
                self.has_same_document_navigation = true;
                self.check_lifecycle_complete();
            }
            WatcherMessage::FrameDetached(frame) => {
                if frame == self.frame {
                    self.terminate(TerminationReason::FrameDetached);
                    return;
                }
                self.check_lifecycle_complete();
            }
            WatcherMessage::Request(request) => {
                if request.frame_id() != Some(&*self.frame.id())
                    || !request.is_navigation_request()
                {
                    return;
                }
                tracing::debug!("Captured navigation request: {}", request.url());
                *self.navigation_request.lock() = Some(request);
            }
        }
    }

    fn check_lifecycle_complete(&mut self) {
        // We expect navigation to commit.
        if !check_lifecycle(&self.frame, &self.expected) {
            return;
        }
        self.committed.send_if_modified(|committed| {
            let changed = !*committed;
            *committed = true;
            changed
        });

        let new_document = self.frame.loader_id() != self.initial_loader_id;
        if !new_document && !self.has_same_document_navigation {
            return;
        }

        let interest = self.frame_manager.navigation_interest();
        if self.has_same_document_navigation && interest.accepts_same_document() {
            self.deliver(NavigationOutcome::Success);
        }
        if new_document && interest.accepts_new_document() {
            self.deliver(NavigationOutcome::Success);
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        self.deliver(NavigationOutcome::Terminated(reason));
    }

    fn deliver(&self, outcome: NavigationOutcome) {
        if self.gate.resolve(outcome) {
            tracing::debug!("Navigation of frame {} resolved: {:?}", self.frame.id(), outcome);
        }
    }
}

/// Waits for a frame navigation to reach the requested lifecycle milestones.
///
/// A watcher is created right before (or right after) a navigation is started, and
/// is resolved by the first of:
/// - success: the frame and all its descendants reached every expected milestone
///   *and* the frame navigated (new document, or same-document if the manager's
///   [`DocumentNavigation`](crate::DocumentNavigation) interest allows it),
/// - termination: the session disconnected or the frame was detached,
/// - the caller's timeout in [`wait`](Self::wait),
/// - an explicit [`dispose`](Self::dispose).
///
/// All listeners are released when an outcome is delivered, when the wait returns,
/// on [`dispose`](Self::dispose), and on drop.
///
/// # Example
///
/// ```ignore
/// use nav_lifecycle::LifecycleWatcher;
/// use std::time::Duration;
///
/// let frame = manager.main_frame().expect("page has a main frame");
/// let watcher = LifecycleWatcher::new(&manager, &frame, ["load"], Duration::from_secs(30))?;
/// // ... start the navigation ...
/// watcher.wait().await?;
/// let response = watcher.navigation_response();
/// ```
pub struct LifecycleWatcher {
    frame: Frame,
    timeout: Option<Duration>,
    gate: ResultGate,
    committed: watch::Receiver<bool>,
    navigation_request: Arc<Mutex<Option<Request>>>,
    listeners: Arc<Listeners>,
}

impl LifecycleWatcher {
    /// Creates a watcher for `frame`.
    ///
    /// # Arguments
    ///
    /// * `frame_manager` - Manager owning the frame tree the frame belongs to
    /// * `frame` - The frame being navigated
    /// * `wait_until` - Non-empty list of `load`, `domcontentloaded`, `networkidle0`,
    ///   `networkidle2`
    /// * `timeout` - How long [`wait`](Self::wait) blocks at most. `None` or a zero
    ///   duration waits without a ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error before any listener is registered:
    /// - [`Error::InvalidWaitCondition`] for an unknown or missing alias
    /// - [`Error::Runtime`] when called outside a Tokio runtime
    pub fn new<I, S, T>(
        frame_manager: &Arc<FrameManager>,
        frame: &Frame,
        wait_until: I,
        timeout: T,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        T: Into<Option<Duration>>,
    {
        let expected = expected_lifecycle(wait_until)?;
        let timeout = timeout.into().filter(|t| !t.is_zero());
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Runtime(e.to_string()))?;

        let gate = ResultGate::new();
        let (committed_tx, committed_rx) = watch::channel(false);
        let navigation_request = Arc::new(Mutex::new(None));
        let (inbox_tx, inbox) = mpsc::unbounded_channel();

        let mut state = WatcherState {
            frame_manager: Arc::clone(frame_manager),
            frame: frame.clone(),
            expected,
            initial_loader_id: frame.loader_id(),
            has_same_document_navigation: false,
            navigation_request: Arc::clone(&navigation_request),
            gate: gate.clone(),
            committed: committed_tx,
        };

        let listeners = Arc::new(Listeners::new(subscribe(frame_manager, inbox_tx)));

        tracing::debug!(
            "Watching frame {} for {:?} (loader {:?})",
            frame.id(),
            state.expected,
            state.initial_loader_id
        );

        // Events may have been missed before the listeners existed
        if frame_manager.session().is_disconnected() {
            state.terminate(TerminationReason::Disconnected);
        } else if frame.is_detached() {
            state.terminate(TerminationReason::FrameDetached);
        } else {
            state.check_lifecycle_complete();
        }

        runtime.spawn(run(state, inbox, Arc::clone(&listeners)));

        Ok(Self {
            frame: frame.clone(),
            timeout,
            gate,
            committed: committed_rx,
            navigation_request,
            listeners,
        })
    }

    /// Returns the frame being watched.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Returns the timeout applied by [`wait`](Self::wait), if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Blocks until the navigation succeeds, terminates, the timeout elapses, or
    /// the watcher is disposed.
    ///
    /// The watcher is disposed before this returns, whatever the outcome. Calling it
    /// again returns the same outcome.
    ///
    /// # Errors
    ///
    /// - [`Error::TerminatedDisconnected`] if the session went away
    /// - [`Error::TerminatedFrameDetached`] if the frame was detached
    /// - [`Error::Timeout`] if nothing was delivered in time
    /// - [`Error::Disposed`] if [`dispose`](Self::dispose) was called first
    pub async fn wait(&self) -> Result<()> {
        if self.gate.outcome().is_none() {
            let mut outcome = self.gate.subscribe();
            let delivered = outcome.wait_for(Option::is_some);
            let timed_out = match self.timeout {
                Some(timeout) => tokio::time::timeout(timeout, delivered).await.is_err(),
                None => {
                    // The gate sender lives in `self`, so this only ends on an outcome
                    let _ = delivered.await;
                    false
                }
            };
            if timed_out && self.gate.resolve(NavigationOutcome::TimedOut) {
                tracing::debug!(
                    "Navigation of frame {} timed out after {:?}",
                    self.frame.id(),
                    self.timeout
                );
            }
        }
        self.dispose();

        self.gate
            .outcome()
            .ok_or(Error::ChannelClosed)?
            .into_result(self.timeout)
    }

    /// Blocks until the frame tree satisfied the expected milestones at least once.
    ///
    /// Commit may precede success: it does not require the frame to have navigated.
    /// Bounded by the same timeout as [`wait`](Self::wait), but does not dispose.
    pub async fn wait_for_commit(&self) -> Result<()> {
        let mut committed = self.committed.clone();
        let mut outcome = self.gate.subscribe();

        let wait = async {
            tokio::select! {
                result = committed.wait_for(|c| *c) => result.is_ok(),
                // Any outcome before commit ends the wait too
                _ = outcome.wait_for(Option::is_some) => false,
            }
        };

        let finished = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, wait).await.ok(),
            None => Some(wait.await),
        };
        match finished {
            Some(true) => Ok(()),
            Some(false) => match self.gate.outcome() {
                Some(outcome) => outcome.into_result(self.timeout),
                None => Err(Error::ChannelClosed),
            },
            None => NavigationOutcome::TimedOut.into_result(self.timeout),
        }
    }

    /// Returns true once the expected milestones were reached.
    pub fn is_committed(&self) -> bool {
        *self.committed.borrow()
    }

    /// Returns the outcome, once one was delivered.
    pub fn outcome(&self) -> Option<NavigationOutcome> {
        self.gate.outcome()
    }

    /// Returns the request that drove the navigation, if one was observed.
    pub fn navigation_request(&self) -> Option<Request> {
        self.navigation_request.lock().clone()
    }

    /// Returns the response of the navigation request.
    ///
    /// `None` if no navigation request was observed (same-document navigations,
    /// `about:blank`, data URLs) or if the request failed.
    pub fn navigation_response(&self) -> Option<Response> {
        self.navigation_request
            .lock()
            .as_ref()
            .and_then(|request| request.response())
    }

    /// Releases every listener. Safe to call any number of times.
    ///
    /// A pending watcher resolves to [`NavigationOutcome::Disposed`], which wakes a
    /// waiter blocked in [`wait`](Self::wait) on another task.
    pub fn dispose(&self) {
        self.gate.resolve(NavigationOutcome::Disposed);
        let released = self.listeners.release();
        if released > 0 {
            tracing::debug!(
                "Disposed watcher for frame {} ({} listeners)",
                self.frame.id(),
                released
            );
        }
    }

    /// Returns true once the listeners have been released.
    pub fn is_disposed(&self) -> bool {
        self.listeners.is_released()
    }
}

impl Drop for LifecycleWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for LifecycleWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleWatcher")
            .field("frame", &self.frame.id())
            .field("timeout", &self.timeout)
            .field("outcome", &self.gate.outcome())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Registers the five listeners. Each one only forwards into the inbox.
fn subscribe(
    frame_manager: &FrameManager,
    inbox: mpsc::UnboundedSender<WatcherMessage>,
) -> Vec<Subscription> {
    let forward = |inbox: &mpsc::UnboundedSender<WatcherMessage>, message: WatcherMessage| {
        // The task is gone once an outcome was delivered; late events are dropped
        let _ = inbox.send(message);
    };

    let disconnected = {
        let inbox = inbox.clone();
        frame_manager
            .session()
            .on_disconnected(move |_| forward(&inbox, WatcherMessage::Disconnected))
    };
    let lifecycle = {
        let inbox = inbox.clone();
        frame_manager.on_lifecycle_event(move |_| forward(&inbox, WatcherMessage::LifecycleEvent))
    };
    let same_document = {
        let inbox = inbox.clone();
        frame_manager.on_frame_navigated_within_document(move |frame| {
            forward(&inbox, WatcherMessage::NavigatedWithinDocument(frame.clone()))
        })
    };
    let detached = {
        let inbox = inbox.clone();
        frame_manager.on_frame_detached(move |frame| {
            forward(&inbox, WatcherMessage::FrameDetached(frame.clone()))
        })
    };
    let request = frame_manager
        .network_manager()
        .on_request(move |request| forward(&inbox, WatcherMessage::Request(request.clone())));

    vec![disconnected, lifecycle, same_document, detached, request]
}

async fn run(
    mut state: WatcherState,
    mut inbox: mpsc::UnboundedReceiver<WatcherMessage>,
    listeners: Arc<Listeners>,
) {
    // The inbox closes once every listener is released
    while state.gate.outcome().is_none() {
        let Some(message) = inbox.recv().await else {
            break;
        };
        state.handle(message);
    }
    listeners.release();
}

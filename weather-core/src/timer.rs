//! Fire-once deferred actions for the view controller.
//!
//! Each scheduled action is a tokio task that sleeps and then posts a
//! [`TimerEvent`] to the controller's channel. Rescheduling or cancelling a
//! kind aborts the task, and the generation tag lets the controller drop an
//! event that was already queued before the cancel.

use std::{fmt, time::Duration};
use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Reveal the busy spinner once a search has been in flight long enough.
    Spinner,
    /// Swap the forecast view back to the search form.
    BackTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    generation: u64,
}

struct Deferred {
    generation: u64,
    handle: JoinHandle<()>,
}

impl Drop for Deferred {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct Timers {
    tx: UnboundedSender<TimerEvent>,
    spinner: Option<Deferred>,
    back: Option<Deferred>,
    next_generation: u64,
}

impl fmt::Debug for Timers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timers")
            .field("spinner", &self.spinner.as_ref().map(|d| d.generation))
            .field("back", &self.back.as_ref().map(|d| d.generation))
            .finish()
    }
}

impl Timers {
    pub fn new() -> (Self, UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx, spinner: None, back: None, next_generation: 0 }, rx)
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<Deferred> {
        match kind {
            TimerKind::Spinner => &mut self.spinner,
            TimerKind::BackTransition => &mut self.back,
        }
    }

    /// Schedule `kind` after `delay`, replacing any pending action of the
    /// same kind. Must be called from within a tokio runtime.
    pub fn schedule(&mut self, kind: TimerKind, delay: Duration) {
        self.next_generation += 1;
        let event = TimerEvent { kind, generation: self.next_generation };
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the controller was dropped; nothing to do.
            let _ = tx.send(event);
        });

        *self.slot(kind) = Some(Deferred { generation: event.generation, handle });
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slot(kind).take();
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        match kind {
            TimerKind::Spinner => self.spinner.is_some(),
            TimerKind::BackTransition => self.back.is_some(),
        }
    }

    pub fn any_pending(&self) -> bool {
        self.spinner.is_some() || self.back.is_some()
    }

    /// Accept `event` if it belongs to the currently scheduled action of its
    /// kind, clearing the slot. Stale events return false.
    pub fn claim(&mut self, event: TimerEvent) -> bool {
        let slot = self.slot(event.kind);
        if slot.as_ref().is_some_and(|d| d.generation == event.generation) {
            slot.take();
            true
        } else {
            false
        }
    }
}

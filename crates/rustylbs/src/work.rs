//! Deferred work
//!
//! Host and button callbacks must not call back into the host or block. They
//! post a `Work` item instead, and a single worker drains the queue in order.

use crate::conn::Connection;
use crate::error::{Error, Result};
use crate::smp::PeerSelector;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// A unit of deferred work.
#[derive(Debug, Clone)]
pub enum Work {
    /// (Re)start advertising with a freshly built accept list
    StartAdvertising,
    /// Drop the accept list and advertise openly
    PairingMode,
    ForgetBonds(PeerSelector),
    Negotiate(Arc<Connection>),
    /// Push the button value to the connected peer
    PushButton(bool),
}

/// Cloneable handle for posting work.
#[derive(Debug, Clone)]
pub struct WorkSender {
    tx: Sender<Work>,
}

impl WorkSender {
    pub fn submit(&self, work: Work) -> Result<()> {
        self.tx.send(work).map_err(|_| Error::WorkQueueClosed)
    }
}

/// FIFO work queue with a single consumer.
#[derive(Debug)]
pub struct WorkQueue {
    tx: Sender<Work>,
    rx: Receiver<Work>,
}

impl WorkQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> WorkSender {
        WorkSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes the next item without blocking.
    pub fn try_next(&self) -> Option<Work> {
        self.rx.try_recv().ok()
    }

    /// Receiver for a dedicated worker thread.
    pub fn receiver(&self) -> Receiver<Work> {
        self.rx.clone()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

//! Bounded payload queue
//!
//! A FIFO of raw payloads with a fixed capacity and an explicit close.
//! Built on a `flume` channel so the administrative drain can take items
//! from the same receiver the stage runners read.
//!
//! # Closing
//!
//! Both halves live inside the queue, so the channel itself never
//! disconnects. Closing is a [`CancelSignal`]: once closed, `send` and
//! `recv` fail with [`QueueError::Closed`] and anything still buffered is
//! left for `drain`.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use flume::{Receiver, Sender, TryRecvError};

use crate::error::{PipelineError, QueueError, TrySendError};
use crate::signal::CancelSignal;

/// Name of the queue between the input and the filter
pub const INGEST_QUEUE: &str = "ingest";

/// Name of the queue between the filter and the output
pub const EGRESS_QUEUE: &str = "egress";

/// Bounded FIFO of raw payloads shared between stages
#[derive(Clone)]
pub struct Queue {
    inner: Arc<Inner>,
}

struct Inner {
    name: &'static str,
    capacity: usize,
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
    closed: CancelSignal,
}

impl Queue {
    /// Create a queue holding at most `capacity` items
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn bounded(name: &'static str, capacity: usize) -> Self {
        assert!(capacity > 0, "queue '{name}' needs a non-zero capacity");
        let (tx, rx) = flume::bounded(capacity);
        Self {
            inner: Arc::new(Inner {
                name,
                capacity,
                tx,
                rx,
                closed: CancelSignal::new(),
            }),
        }
    }

    /// Queue name, used in logs
    #[inline]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Maximum number of buffered items
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Number of buffered items
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.rx.len()
    }

    /// Check if nothing is buffered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.rx.is_empty()
    }

    /// Check if the queue has been closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.inner.closed.is_closed()
    }

    /// Send an item, waiting for space
    ///
    /// Fails with `Closed` if the queue is closed before or while waiting.
    pub async fn send(&self, item: Bytes) -> Result<(), QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        tokio::select! {
            biased;
            _ = self.inner.closed.closed() => Err(QueueError::Closed),
            res = self.inner.tx.send_async(item) => res.map_err(|_| QueueError::Closed),
        }
    }

    /// Send an item without waiting
    ///
    /// On failure the item comes back inside the error, so the caller
    /// decides whether to drop it or retry.
    pub fn try_send(&self, item: Bytes) -> Result<(), TrySendError> {
        if self.is_closed() {
            return Err(TrySendError::Closed(item));
        }

        self.inner.tx.try_send(item).map_err(|e| match e {
            flume::TrySendError::Full(item) => TrySendError::Full(item),
            flume::TrySendError::Disconnected(item) => TrySendError::Closed(item),
        })
    }

    /// Receive the next item, waiting until one arrives
    pub async fn recv(&self) -> Result<Bytes, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        tokio::select! {
            biased;
            _ = self.inner.closed.closed() => Err(QueueError::Closed),
            item = self.inner.rx.recv_async() => item.map_err(|_| QueueError::Closed),
        }
    }

    /// Receive an item if one is buffered
    pub fn try_recv(&self) -> Result<Bytes, QueueError> {
        if self.is_closed() {
            return Err(QueueError::Closed);
        }

        match self.inner.rx.try_recv() {
            Ok(item) => Ok(item),
            Err(TryRecvError::Empty) => Err(QueueError::Empty),
            Err(TryRecvError::Disconnected) => Err(QueueError::Closed),
        }
    }

    /// Discard every buffered item, returning how many were removed
    ///
    /// Works on open and closed queues and never waits.
    pub fn drain(&self) -> usize {
        let mut removed = 0;
        while self.inner.rx.try_recv().is_ok() {
            removed += 1;
        }
        removed
    }

    /// Close the queue
    ///
    /// # Errors
    ///
    /// Returns `QueueAlreadyClosed` on the second call.
    pub fn close(&self) -> Result<(), PipelineError> {
        if self.inner.closed.close() {
            Ok(())
        } else {
            Err(PipelineError::QueueAlreadyClosed(self.inner.name))
        }
    }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.inner.name)
            .field("len", &self.len())
            .field("capacity", &self.inner.capacity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod tests;

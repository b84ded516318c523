/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Message transport between actors.
//!
//! A [`Mailbox`] pairs a sender that does not block on a slow consumer with
//! a channel-valued receiver. The default mode buffers overflow in a
//! growable queue moved by an internal pump actor; channel mode instead
//! wraps a single bounded channel of user-chosen capacity.

pub use error::SendError;
pub use receiver::MailboxReceiver;
pub use sync::{SyncMailbox, SyncRequest};

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::actor::{combine, CombinedActor, WorkerActor};
use crate::common::{Context, Stopped};
use crate::mailbox::chan::ChanMailbox;
use crate::mailbox::queue::RingQueue;
use crate::mailbox::worker::MailboxWorker;
use crate::traits::Actor;

mod chan;
mod error;
mod queue;
mod receiver;
mod sync;
mod worker;

/// Lifecycle states shared by both mailbox modes. A stopped mailbox never
/// runs again.
pub(crate) const NOT_STARTED: u8 = 0;
pub(crate) const RUNNING: u8 = 1;
pub(crate) const STOPPED: u8 = 2;

/// Buffer size of the pump's input and output channels.
const PUMP_BUFFER: usize = 64;

/// Construction options for a [`Mailbox`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MailboxConfig {
    capacity: usize,
    as_chan: bool,
    stop_after_receiving_all: bool,
}

impl MailboxConfig {
    /// Creates the default configuration: queue mode, minimum queue
    /// capacity, no drain on stop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial queue capacity in queue mode; channel buffer size in channel
    /// mode, where `0` means an unbuffered rendezvous channel.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Makes the mailbox behave like a plain bounded channel: no internal
    /// queue, senders block once the buffer is full.
    pub fn as_chan(mut self) -> Self {
        self.as_chan = true;
        self
    }

    /// On stop, deliver everything already accepted before closing the
    /// receive channel, instead of closing it immediately.
    pub fn stop_after_receiving_all(mut self) -> Self {
        self.stop_after_receiving_all = true;
        self
    }
}

/// Ordered message conduit between actors.
///
/// In the default queue mode, `send` hands the message to an internal pump
/// actor and only ever waits for a small fixed buffer, regardless of how far
/// ahead of the consumer the senders run; overflow lands in a growable
/// queue. In [channel mode](MailboxConfig::as_chan), `send` blocks once the
/// user-chosen buffer is full, exactly like a plain bounded channel.
///
/// A mailbox is itself an [`Actor`]: nothing moves until
/// [`start`](Actor::start), and [`stop`](Actor::stop) is final. Clones share
/// the same underlying mailbox.
pub struct Mailbox<T> {
    inner: Arc<MailboxInner<T>>,
}

enum MailboxInner<T> {
    Queue(QueueMailbox<T>),
    Chan(ChanMailbox<T>),
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Mailbox {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Mailbox<T> {
    /// Creates a queue-mode mailbox with default options.
    pub fn new() -> Self {
        Self::with_config(MailboxConfig::new())
    }

    /// Creates a mailbox with the given options.
    pub fn with_config(config: MailboxConfig) -> Self {
        let inner = if config.as_chan {
            MailboxInner::Chan(ChanMailbox::new(config.capacity))
        } else {
            MailboxInner::Queue(QueueMailbox::new(&config))
        };
        Mailbox {
            inner: Arc::new(inner),
        }
    }

    /// Sends `msg`, waiting for the mailbox to accept it.
    ///
    /// Fails with [`SendError::NotStarted`] before [`start`](Actor::start),
    /// with [`SendError::Stopped`] after [`stop`](Actor::stop), and with
    /// [`SendError::Canceled`] if the caller's own `ctx` ends first. A send
    /// that returned `Ok` has been accepted: the message will reach the
    /// receive channel unless the mailbox is stopped without
    /// [draining](MailboxConfig::stop_after_receiving_all).
    pub async fn send(&self, ctx: &Context, msg: T) -> Result<(), SendError> {
        match &*self.inner {
            MailboxInner::Queue(queue) => queue.send(ctx, msg).await,
            MailboxInner::Chan(chan) => chan.send(ctx, msg).await,
        }
    }

    /// The receive channel of this mailbox.
    ///
    /// The handle denotes the same underlying channel for the mailbox's
    /// whole lifetime; it is never recreated, not even across stop.
    pub fn receive_c(&self) -> MailboxReceiver<T> {
        match &*self.inner {
            MailboxInner::Queue(queue) => queue.receive_c(),
            MailboxInner::Chan(chan) => chan.receive_c(),
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Actor for Mailbox<T> {
    async fn start(&self) {
        match &*self.inner {
            MailboxInner::Queue(queue) => queue.start().await,
            MailboxInner::Chan(chan) => chan.start(),
        }
    }

    async fn stop(&self) {
        match &*self.inner {
            MailboxInner::Queue(queue) => queue.stop().await,
            MailboxInner::Chan(chan) => chan.stop(),
        }
    }
}

/// Queue-mode internals: state machine plus the pump actor that owns the
/// channels and the queue.
struct QueueMailbox<T> {
    state: AtomicU8,
    input: mpsc::Sender<T>,
    receiver: MailboxReceiver<T>,
    pump: WorkerActor,
}

impl<T: Send + 'static> QueueMailbox<T> {
    fn new(config: &MailboxConfig) -> Self {
        let (input_tx, input_rx) = mpsc::channel(PUMP_BUFFER);
        let (output_tx, output_rx) = mpsc::channel(PUMP_BUFFER);
        let worker = MailboxWorker::new(
            input_rx,
            output_tx,
            RingQueue::with_capacity(config.capacity),
            config.stop_after_receiving_all,
        );
        QueueMailbox {
            state: AtomicU8::new(NOT_STARTED),
            input: input_tx,
            receiver: MailboxReceiver::buffered(output_rx),
            pump: WorkerActor::new(worker),
        }
    }

    async fn start(&self) {
        if self
            .state
            .compare_exchange(NOT_STARTED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            trace!("mailbox starting");
            self.pump.start().await;
        }
    }

    async fn stop(&self) {
        if self
            .state
            .compare_exchange(RUNNING, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            trace!("mailbox stopping");
            self.pump.stop().await;
        } else {
            let _ = self.state.compare_exchange(
                NOT_STARTED,
                STOPPED,
                Ordering::SeqCst,
                Ordering::SeqCst,
            );
        }
    }

    async fn send(&self, ctx: &Context, msg: T) -> Result<(), SendError> {
        match self.state.load(Ordering::SeqCst) {
            NOT_STARTED => return Err(SendError::NotStarted),
            STOPPED => return Err(SendError::Stopped),
            _ => {}
        }

        tokio::select! {
            // A canceled caller always hears about its own cancellation,
            // even if the channel could accept the message in the same poll.
            biased;
            _ = ctx.done() => Err(SendError::Canceled(ctx.err().unwrap_or(Stopped))),
            permit = self.input.reserve() => match permit {
                Ok(permit) => {
                    permit.send(msg);
                    Ok(())
                }
                Err(_) => Err(SendError::Stopped),
            },
        }
    }

    fn receive_c(&self) -> MailboxReceiver<T> {
        self.receiver.clone()
    }
}

/// Combines the given mailboxes into one actor that starts and stops them
/// all.
pub fn from_mailboxes<T: Send + 'static>(mailboxes: &[Mailbox<T>]) -> CombinedActor {
    let children = mailboxes
        .iter()
        .map(|mailbox| Box::new(mailbox.clone()) as Box<dyn Actor>)
        .collect();
    combine(children).build()
}

/// Creates `count` mailboxes fed by `receiver`.
///
/// A background task forwards every message from `receiver` to each created
/// mailbox until `receiver` reports end of stream. Starting and stopping the
/// returned mailboxes is up to the caller; messages that arrive for a
/// mailbox that is not running are dropped with a warning log.
pub fn fan_out<T: Clone + Send + 'static>(
    receiver: MailboxReceiver<T>,
    count: usize,
    config: MailboxConfig,
) -> Vec<Mailbox<T>> {
    let mailboxes: Vec<Mailbox<T>> = (0..count).map(|_| Mailbox::with_config(config)).collect();

    let outputs = mailboxes.clone();
    tokio::spawn(async move {
        let ctx = Context::started();
        while let Some(msg) = receiver.recv().await {
            for mailbox in &outputs {
                if let Err(error) = mailbox.send(&ctx, msg.clone()).await {
                    warn!(%error, "fan-out delivery skipped");
                }
            }
        }
    });

    mailboxes
}

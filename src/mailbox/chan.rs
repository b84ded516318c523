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

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::common::{Context, Stopped};
use crate::mailbox::error::SendError;
use crate::mailbox::receiver::MailboxReceiver;
use crate::mailbox::{NOT_STARTED, RUNNING, STOPPED};

/// Channel-mode mailbox: a single buffered channel of user-chosen capacity,
/// with capacity zero meaning a rendezvous handoff.
///
/// The delicate part is stopping: the channel must be closed exactly once,
/// and only when no send is mid-flight, so that a send racing with `stop`
/// reports [`SendError::Stopped`] instead of tripping over a closed channel.
/// The state machine, the in-flight counter, and the one-shot close guard
/// below carry that invariant together.
pub(crate) struct ChanMailbox<T> {
    state: AtomicU8,
    stop: CancellationToken,
    in_flight: AtomicUsize,
    kind: ChanKind<T>,
    receiver: MailboxReceiver<T>,
}

enum ChanKind<T> {
    Buffered {
        // `Option::take` is the one-shot close guard: the stored sender is
        // dropped at most once, and in-flight sends hold clones, so the
        // receive side cannot observe close while a send is crossing.
        sender: Mutex<Option<mpsc::Sender<T>>>,
    },
    Rendezvous {
        slots: AsyncMutex<mpsc::UnboundedReceiver<oneshot::Sender<T>>>,
    },
}

impl<T: Send + 'static> ChanMailbox<T> {
    pub(crate) fn new(capacity: usize) -> Self {
        let stop = CancellationToken::new();
        let (kind, receiver) = if capacity == 0 {
            let (slot_tx, slot_rx) = mpsc::unbounded_channel();
            (
                ChanKind::Rendezvous {
                    slots: AsyncMutex::new(slot_rx),
                },
                MailboxReceiver::rendezvous(slot_tx, stop.clone()),
            )
        } else {
            let (tx, rx) = mpsc::channel(capacity);
            (
                ChanKind::Buffered {
                    sender: Mutex::new(Some(tx)),
                },
                MailboxReceiver::buffered(rx),
            )
        };

        ChanMailbox {
            state: AtomicU8::new(NOT_STARTED),
            stop,
            in_flight: AtomicUsize::new(0),
            kind,
            receiver,
        }
    }

    pub(crate) fn start(&self) {
        let _ = self
            .state
            .compare_exchange(NOT_STARTED, RUNNING, Ordering::SeqCst, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) {
        let was_running = self
            .state
            .compare_exchange(RUNNING, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        let was_fresh = !was_running
            && self
                .state
                .compare_exchange(NOT_STARTED, STOPPED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
        if !(was_running || was_fresh) {
            return;
        }

        trace!("channel mailbox stopping");
        self.stop.cancel();
        if self.in_flight.load(Ordering::SeqCst) == 0 {
            self.close_if_stopped();
        }
    }

    pub(crate) async fn send(&self, ctx: &Context, msg: T) -> Result<(), SendError> {
        match self.state.load(Ordering::SeqCst) {
            NOT_STARTED => return Err(SendError::NotStarted),
            STOPPED => return Err(SendError::Stopped),
            _ => {}
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let result = self.send_inner(ctx, msg).await;
        // The last sender out attempts the close that `stop` deferred to it.
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.close_if_stopped();
        }
        result
    }

    async fn send_inner(&self, ctx: &Context, msg: T) -> Result<(), SendError> {
        match &self.kind {
            ChanKind::Buffered { sender } => {
                let Some(tx) = sender.lock().clone() else {
                    return Err(SendError::Stopped);
                };
                tokio::select! {
                    biased;
                    _ = self.stop.cancelled() => Err(SendError::Stopped),
                    _ = ctx.done() => Err(SendError::Canceled(ctx.err().unwrap_or(Stopped))),
                    permit = tx.reserve() => match permit {
                        Ok(permit) => {
                            permit.send(msg);
                            Ok(())
                        }
                        Err(_) => Err(SendError::Stopped),
                    },
                }
            }
            ChanKind::Rendezvous { slots } => {
                tokio::select! {
                    biased;
                    _ = self.stop.cancelled() => Err(SendError::Stopped),
                    _ = ctx.done() => Err(SendError::Canceled(ctx.err().unwrap_or(Stopped))),
                    delivered = handoff(slots, msg) => delivered,
                }
            }
        }
    }

    pub(crate) fn receive_c(&self) -> MailboxReceiver<T> {
        self.receiver.clone()
    }

    fn close_if_stopped(&self) {
        if self.state.load(Ordering::SeqCst) != STOPPED {
            return;
        }
        if let ChanKind::Buffered { sender } = &self.kind {
            sender.lock().take();
        }
        // Rendezvous mode needs no channel teardown: the stop latch already
        // releases parked receivers and rejects new senders.
    }
}

/// Completes one rendezvous: waits for a receiver's slot and hands the value
/// over, reclaiming it and trying the next slot if the receiver gave up.
async fn handoff<T>(
    slots: &AsyncMutex<mpsc::UnboundedReceiver<oneshot::Sender<T>>>,
    msg: T,
) -> Result<(), SendError> {
    let mut slots = slots.lock().await;
    let mut msg = msg;
    loop {
        match slots.recv().await {
            Some(slot) => match slot.send(msg) {
                Ok(()) => return Ok(()),
                Err(returned) => msg = returned,
            },
            None => return Err(SendError::Stopped),
        }
    }
}

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

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

/// Receiving half of a [`Mailbox`](crate::mailbox::Mailbox).
///
/// [`Mailbox::receive_c`](crate::mailbox::Mailbox::receive_c) hands out the
/// same underlying channel for the mailbox's whole lifetime, before start and
/// after stop alike. Clones share that channel, so any number of consumers
/// may receive concurrently; each message is delivered to exactly one of
/// them, in arrival order.
pub struct MailboxReceiver<T> {
    inner: ReceiverInner<T>,
}

enum ReceiverInner<T> {
    Buffered(Arc<AsyncMutex<mpsc::Receiver<T>>>),
    Rendezvous(RendezvousSide<T>),
}

/// Consumer side of a zero-capacity channel-mode mailbox: each receiver
/// parks a one-shot slot that a sender completes directly.
struct RendezvousSide<T> {
    slots: mpsc::UnboundedSender<oneshot::Sender<T>>,
    stop: CancellationToken,
}

impl<T> Clone for MailboxReceiver<T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            ReceiverInner::Buffered(rx) => ReceiverInner::Buffered(Arc::clone(rx)),
            ReceiverInner::Rendezvous(side) => ReceiverInner::Rendezvous(RendezvousSide {
                slots: side.slots.clone(),
                stop: side.stop.clone(),
            }),
        };
        MailboxReceiver { inner }
    }
}

impl<T> MailboxReceiver<T> {
    pub(crate) fn buffered(receiver: mpsc::Receiver<T>) -> Self {
        MailboxReceiver {
            inner: ReceiverInner::Buffered(Arc::new(AsyncMutex::new(receiver))),
        }
    }

    pub(crate) fn rendezvous(
        slots: mpsc::UnboundedSender<oneshot::Sender<T>>,
        stop: CancellationToken,
    ) -> Self {
        MailboxReceiver {
            inner: ReceiverInner::Rendezvous(RendezvousSide { slots, stop }),
        }
    }

    /// Receives the next message.
    ///
    /// Returns `None` once the mailbox has been stopped and no further
    /// messages will arrive.
    pub async fn recv(&self) -> Option<T> {
        match &self.inner {
            ReceiverInner::Buffered(rx) => rx.lock().await.recv().await,
            ReceiverInner::Rendezvous(side) => {
                let (slot, mut pending) = oneshot::channel();
                if side.slots.send(slot).is_err() {
                    return None;
                }
                let raced = tokio::select! {
                    biased;
                    delivered = &mut pending => Some(delivered),
                    _ = side.stop.cancelled() => None,
                };
                match raced {
                    Some(delivered) => delivered.ok(),
                    None => {
                        // The stop latch fired. Closing the slot first makes
                        // any later completion by a sender fail (the sender
                        // then reports stopped), while a value handed over
                        // just before the close is still delivered here.
                        pending.close();
                        pending.try_recv().ok()
                    }
                }
            }
        }
    }
}

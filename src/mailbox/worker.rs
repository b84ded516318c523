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

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

use crate::common::Context;
use crate::mailbox::queue::RingQueue;
use crate::traits::{Worker, WorkerStatus};

/// Pump at the heart of a queue-backed mailbox: moves messages from the
/// input channel through the growable queue to the output channel.
///
/// While the queue is empty, arriving messages are forwarded straight to the
/// output when it has free space. The queue only buffers the overflow, which
/// is what keeps senders from ever blocking on a slow consumer.
pub(crate) struct MailboxWorker<T> {
    input: mpsc::Receiver<T>,
    output: Option<mpsc::Sender<T>>,
    queue: RingQueue<T>,
    drain_on_stop: bool,
}

impl<T> MailboxWorker<T> {
    pub(crate) fn new(
        input: mpsc::Receiver<T>,
        output: mpsc::Sender<T>,
        queue: RingQueue<T>,
        drain_on_stop: bool,
    ) -> Self {
        MailboxWorker {
            input,
            output: Some(output),
            queue,
            drain_on_stop,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Worker for MailboxWorker<T> {
    async fn do_work(&mut self, ctx: &Context) -> WorkerStatus {
        let Some(output) = self.output.as_ref() else {
            return WorkerStatus::End;
        };

        if self.queue.is_empty() {
            tokio::select! {
                _ = ctx.done() => WorkerStatus::End,
                received = self.input.recv() => match received {
                    Some(msg) => {
                        match output.try_send(msg) {
                            Ok(()) => {}
                            Err(TrySendError::Full(msg)) => self.queue.push_back(msg),
                            Err(TrySendError::Closed(_)) => return WorkerStatus::End,
                        }
                        WorkerStatus::Continue
                    }
                    None => WorkerStatus::End,
                },
            }
        } else {
            tokio::select! {
                _ = ctx.done() => WorkerStatus::End,
                permit = output.reserve() => match permit {
                    Ok(permit) => {
                        if let Some(msg) = self.queue.pop_front() {
                            permit.send(msg);
                        }
                        WorkerStatus::Continue
                    }
                    Err(_) => WorkerStatus::End,
                },
                received = self.input.recv() => match received {
                    Some(msg) => {
                        self.queue.push_back(msg);
                        WorkerStatus::Continue
                    }
                    None => WorkerStatus::End,
                },
            }
        }
    }

    async fn on_stop(&mut self) {
        self.input.close();
        let output = self.output.take();
        trace!(queued = self.queue.len(), "mailbox pump stopping");

        if !self.drain_on_stop {
            // Dropping the sender closes the receive side immediately;
            // whatever is still queued is discarded.
            return;
        }

        let Some(output) = output else { return };
        while let Some(msg) = self.queue.pop_front() {
            if output.send(msg).await.is_err() {
                return;
            }
        }
        // The input is closed, so this loop ends once the buffered
        // stragglers are through.
        while let Some(msg) = self.input.recv().await {
            if output.send(msg).await.is_err() {
                return;
            }
        }
    }
}

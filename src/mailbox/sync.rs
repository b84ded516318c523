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
use tokio::sync::oneshot;

use crate::common::Context;
use crate::mailbox::receiver::MailboxReceiver;
use crate::mailbox::{Mailbox, MailboxConfig};
use crate::traits::Actor;

/// A mailbox whose `send` waits until the consumer has processed the value.
///
/// Each message travels as a [`SyncRequest`]; the consumer calls
/// [`notify`](SyncRequest::notify) to release the sender, optionally with a
/// processing error that the sender receives as its own result.
pub struct SyncMailbox<T> {
    mailbox: Mailbox<SyncRequest<T>>,
}

impl<T> Clone for SyncMailbox<T> {
    fn clone(&self) -> Self {
        SyncMailbox {
            mailbox: self.mailbox.clone(),
        }
    }
}

impl<T: Send + 'static> Default for SyncMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> SyncMailbox<T> {
    /// Creates a synchronous mailbox with default options.
    pub fn new() -> Self {
        Self::with_config(MailboxConfig::new())
    }

    /// Creates a synchronous mailbox with the given options.
    pub fn with_config(config: MailboxConfig) -> Self {
        SyncMailbox {
            mailbox: Mailbox::with_config(config),
        }
    }

    /// Sends `value` and waits for the consumer's acknowledgement.
    ///
    /// Fails if the underlying mailbox rejects the send, or with the error
    /// the consumer passed to [`SyncRequest::notify`]. A request the
    /// consumer dropped without notifying counts as processed.
    pub async fn send(&self, ctx: &Context, value: T) -> anyhow::Result<()> {
        let (done, acknowledged) = oneshot::channel();
        self.mailbox.send(ctx, SyncRequest { value, done }).await?;
        match acknowledged.await {
            Ok(result) => result,
            Err(_) => Ok(()),
        }
    }

    /// The receive channel of the underlying mailbox.
    pub fn receive_c(&self) -> MailboxReceiver<SyncRequest<T>> {
        self.mailbox.receive_c()
    }
}

#[async_trait]
impl<T: Send + 'static> Actor for SyncMailbox<T> {
    async fn start(&self) {
        self.mailbox.start().await;
    }

    async fn stop(&self) {
        self.mailbox.stop().await;
    }
}

/// A value travelling through a [`SyncMailbox`], paired with the sender's
/// acknowledgement slot.
pub struct SyncRequest<T> {
    /// The value the sender submitted.
    pub value: T,
    done: oneshot::Sender<anyhow::Result<()>>,
}

impl<T> SyncRequest<T> {
    /// Releases the waiting sender with `result`.
    pub fn notify(self, result: anyhow::Result<()>) {
        let _ = self.done.send(result);
    }
}

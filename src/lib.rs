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

#![forbid(unsafe_code)]
#![forbid(missing_docs)]

//! # Drover
//!
//! A lightweight actor toolkit for Tokio. Drover is a toolkit, not a
//! framework: it gives you small primitives (actors, workers, mailboxes,
//! and a combinator) and you assemble them.
//!
//! ## Key Concepts
//!
//! - **Workers ([`Worker`](prelude::Worker))**: your unit of repeatable
//!   work, driven in a loop until it reports it is done.
//! - **Actors ([`Actor`](prelude::Actor))**: long-lived entities owning one
//!   worker each, with an idempotent start/stop lifecycle and cooperative
//!   cancellation through a [`Context`](prelude::Context).
//! - **Mailboxes ([`Mailbox`](prelude::Mailbox))**: ordered message
//!   conduits whose senders never block on a slow consumer in the default
//!   mode, or behave like a plain bounded channel in channel mode.
//! - **Combination ([`combine`](prelude::combine))**: merge several actors
//!   into one lifecycle, optionally fate-shared so that one finishing stops
//!   them all.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use drover::prelude::*;
//!
//! let mailbox: Mailbox<u64> = Mailbox::new();
//! let receiver = mailbox.receive_c();
//!
//! let producer = WorkerActor::new(worker_fn({
//!     let mailbox = mailbox.clone();
//!     let mut next = 0u64;
//!     move |ctx| {
//!         next += 1;
//!         let value = next;
//!         let mailbox = mailbox.clone();
//!         async move {
//!             match mailbox.send(&ctx, value).await {
//!                 Ok(()) => WorkerStatus::Continue,
//!                 Err(_) => WorkerStatus::End,
//!             }
//!         }
//!     }
//! }));
//!
//! let system = combine(vec![Box::new(mailbox), Box::new(producer)])
//!     .stop_together()
//!     .build();
//! system.start().await;
//! ```

pub(crate) mod actor;
pub(crate) mod common;
pub(crate) mod mailbox;
pub(crate) mod traits;

/// Convenient single-import surface of the crate.
pub mod prelude {
    pub use crate::actor::{
        combine, noop, start_all, stop_all, ActorConfig, CombineBuilder, CombinedActor, IdleActor,
        NoopActor, WorkerActor,
    };
    pub use crate::common::{Context, FutureBox, StartHandler, StopHandler, Stopped};
    pub use crate::mailbox::{
        fan_out, from_mailboxes, Mailbox, MailboxConfig, MailboxReceiver, SendError, SyncMailbox,
        SyncRequest,
    };
    pub use crate::traits::{worker_fn, Actor, Worker, WorkerStatus};

    pub use async_trait::async_trait;
}

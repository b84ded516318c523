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

use std::fmt;

use once_cell::sync::Lazy;
use tokio_util::sync::CancellationToken;

/// Sentinel error reported by [`Context::err`] once a context has ended.
///
/// A context carries no failure cause of its own; ending it always produces
/// this fixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stopped;

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor stopped")
    }
}

impl std::error::Error for Stopped {}

static STARTED: Lazy<Context> = Lazy::new(Context::new);

static ENDED: Lazy<Context> = Lazy::new(|| {
    let ctx = Context::new();
    ctx.end();
    ctx
});

/// Cancellation signal handed to every [`Worker`](crate::traits::Worker)
/// invocation.
///
/// A `Context` is a one-shot latch: it starts out live, ends at most once,
/// and never un-ends. It carries no values and no deadline; the only
/// observable state is whether [`end`](Context::end) has been called.
/// Clones share the same latch, so a context can be handed to any number of
/// observers.
///
/// Workers are expected to observe the context cooperatively, typically by
/// racing [`done`](Context::done) against their own work in a `select!`.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
}

impl Context {
    /// Creates a fresh, live context.
    pub fn new() -> Self {
        Context {
            token: CancellationToken::new(),
        }
    }

    /// Completes once the context has ended.
    ///
    /// Cancel-safe: the returned future can be dropped and re-created freely,
    /// which makes it suitable as a `select!` branch inside
    /// [`Worker::do_work`](crate::traits::Worker::do_work).
    pub async fn done(&self) {
        self.token.cancelled().await;
    }

    /// Returns `true` once the context has ended.
    pub fn is_done(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Terminal error of this context.
    ///
    /// `None` while the context is live, `Some(Stopped)` forever after it has
    /// ended. Any observer that has seen [`done`](Context::done) resolve is
    /// guaranteed to read `Some(Stopped)` here.
    pub fn err(&self) -> Option<Stopped> {
        self.token.is_cancelled().then_some(Stopped)
    }

    /// Ends the context.
    ///
    /// Idempotent: concurrent or repeated calls behave exactly like a single
    /// one.
    pub fn end(&self) {
        self.token.cancel();
    }

    /// Shared context that is never ended.
    ///
    /// A test fixture for driving
    /// [`Worker::do_work`](crate::traits::Worker::do_work) directly without
    /// spinning up an actor. Do not end it.
    pub fn started() -> Context {
        STARTED.clone()
    }

    /// Shared context that has already ended.
    ///
    /// The counterpart of [`Context::started`] for exercising a worker's
    /// shutdown path in tests.
    pub fn ended() -> Context {
        ENDED.clone()
    }
}

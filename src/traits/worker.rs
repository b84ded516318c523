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

use std::future::Future;

use async_trait::async_trait;

use crate::common::Context;

/// Verdict returned by [`Worker::do_work`], telling the owning actor whether
/// to keep driving the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// There may be more work; invoke `do_work` again.
    Continue,
    /// The worker is finished; wind the actor down.
    End,
}

/// A unit of repeatable work driven by a
/// [`WorkerActor`](crate::actor::WorkerActor).
///
/// The actor invokes [`do_work`](Worker::do_work) in a loop on its own task
/// until the worker returns [`WorkerStatus::End`] or the actor is stopped.
/// Invocations are strictly sequential; a worker never observes concurrent
/// entry.
///
/// The two lifecycle hooks are optional: the default implementations do
/// nothing. When a hook is implemented *and* the owning actor also carries a
/// hook through its [`ActorConfig`](crate::actor::ActorConfig), both run,
/// the worker's first.
#[async_trait]
pub trait Worker: Send + 'static {
    /// Performs one iteration of work.
    ///
    /// The supplied context ends when the actor is stopped; workers that
    /// block on messages or timers should race that work against
    /// [`Context::done`] and return [`WorkerStatus::End`] once it resolves.
    async fn do_work(&mut self, ctx: &Context) -> WorkerStatus;

    /// Runs once before the first `do_work` iteration of an actor run.
    async fn on_start(&mut self, _ctx: &Context) {}

    /// Runs once after the last `do_work` iteration of an actor run, with the
    /// context already ended.
    async fn on_stop(&mut self) {}
}

/// Wraps a closure as a [`Worker`] with no lifecycle hooks.
///
/// The closure receives a clone of the actor's context on every iteration,
/// mirroring [`Worker::do_work`].
pub fn worker_fn<F, Fut>(f: F) -> impl Worker
where
    F: FnMut(Context) -> Fut + Send + 'static,
    Fut: Future<Output = WorkerStatus> + Send + 'static,
{
    FnWorker { f }
}

struct FnWorker<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Worker for FnWorker<F>
where
    F: FnMut(Context) -> Fut + Send + 'static,
    Fut: Future<Output = WorkerStatus> + Send + 'static,
{
    async fn do_work(&mut self, ctx: &Context) -> WorkerStatus {
        (self.f)(ctx.clone()).await
    }
}

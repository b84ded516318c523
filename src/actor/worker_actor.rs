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

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::task::TaskTracker;
use tracing::{error, instrument, trace};

use crate::actor::config::chain_stop;
use crate::actor::ActorConfig;
use crate::common::{Context, StartHandler, StopHandler};
use crate::traits::{Actor, Worker, WorkerStatus};

/// An actor that drives a [`Worker`] on its own Tokio task.
///
/// Starting the actor spawns a background task that runs the worker's
/// `on_start` hook, then invokes [`Worker::do_work`] in a loop until the
/// worker returns [`WorkerStatus::End`] or [`stop`](Actor::stop) is called.
/// Stopping ends the run's [`Context`] and blocks until the worker and all
/// stop hooks have fully completed.
///
/// The actor may be restarted any number of times; each run gets a fresh
/// context. Clones share the same underlying actor, so a handle kept by the
/// caller keeps controlling an actor that was handed to
/// [`combine`](crate::actor::combine).
#[derive(Clone)]
pub struct WorkerActor {
    inner: Arc<Inner>,
}

struct Inner {
    worker: AsyncMutex<Box<dyn Worker>>,
    hooks: Mutex<Hooks>,
    lifecycle: Mutex<Lifecycle>,
}

struct Hooks {
    on_start: Option<StartHandler>,
    on_stop: Option<StopHandler>,
}

struct Lifecycle {
    running: bool,
    ctx: Context,
    tracker: TaskTracker,
}

impl WorkerActor {
    /// Creates an actor that drives `worker` with no extra lifecycle hooks.
    pub fn new<W: Worker>(worker: W) -> Self {
        Self::with_config(worker, ActorConfig::new())
    }

    /// Creates an actor that drives `worker` with the hooks in `config`.
    pub fn with_config<W: Worker>(worker: W, config: ActorConfig) -> Self {
        WorkerActor {
            inner: Arc::new(Inner {
                worker: AsyncMutex::new(Box::new(worker)),
                hooks: Mutex::new(Hooks {
                    on_start: config.on_start,
                    on_stop: config.on_stop,
                }),
                lifecycle: Mutex::new(Lifecycle {
                    running: false,
                    ctx: Context::new(),
                    tracker: TaskTracker::new(),
                }),
            }),
        }
    }
}

#[async_trait]
impl Actor for WorkerActor {
    #[instrument(skip(self))]
    async fn start(&self) {
        let (ctx, tracker) = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if lifecycle.running {
                trace!("start ignored, worker already running");
                return;
            }
            lifecycle.running = true;
            lifecycle.ctx = Context::new();
            lifecycle.tracker = TaskTracker::new();
            (lifecycle.ctx.clone(), lifecycle.tracker.clone())
        };

        let inner = Arc::clone(&self.inner);
        tracker.spawn(run(inner, ctx));
        tracker.close();
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        let tracker = {
            let lifecycle = self.inner.lifecycle.lock();
            if !lifecycle.running {
                trace!("stop ignored, worker not running");
                return;
            }
            lifecycle.ctx.end();
            lifecycle.tracker.clone()
        };

        tracker.wait().await;
    }

    fn register_stop_hook(&mut self, hook: StopHandler) -> Option<StopHandler> {
        let mut hooks = self.inner.hooks.lock();
        let prev = hooks.on_stop.take();
        hooks.on_stop = Some(chain_stop(prev, hook));
        None
    }
}

async fn run(inner: Arc<Inner>, ctx: Context) {
    let _guard = RunGuard {
        inner: Arc::clone(&inner),
        ctx: ctx.clone(),
    };

    let (on_start, on_stop) = {
        let hooks = inner.hooks.lock();
        (hooks.on_start.clone(), hooks.on_stop.clone())
    };

    let mut worker = inner.worker.lock().await;

    worker.on_start(&ctx).await;
    if let Some(hook) = on_start.as_deref() {
        hook(ctx.clone()).await;
    }

    while let WorkerStatus::Continue = worker.do_work(&ctx).await {}
    trace!("worker ended, winding down");

    // Observers of the context must see it ended before any stop hook runs.
    ctx.end();
    worker.on_stop().await;
    if let Some(hook) = on_stop.as_deref() {
        hook().await;
    }
}

/// Restores the not-running state on every exit path, including a worker
/// panic unwinding out of the run loop.
struct RunGuard {
    inner: Arc<Inner>,
    ctx: Context,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("worker panicked; actor stopped");
        }
        self.ctx.end();
        self.inner.lifecycle.lock().running = false;
    }
}

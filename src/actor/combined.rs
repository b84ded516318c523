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
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use parking_lot::Mutex;
use tracing::{instrument, trace};

use crate::actor::config::chain_stop;
use crate::actor::ActorConfig;
use crate::common::{Context, FutureBox, StartHandler, StopHandler};
use crate::traits::Actor;

/// Returns a builder that merges `children` into a single [`CombinedActor`].
///
/// Starting the combined actor starts every child in list order; stopping it
/// stops every child and waits for each to wind down. Options on the builder
/// add fate-sharing and combined lifecycle hooks.
pub fn combine(children: Vec<Box<dyn Actor>>) -> CombineBuilder {
    CombineBuilder {
        children,
        stop_together: false,
        stop_parallel: false,
        config: ActorConfig::new(),
    }
}

/// Builder returned by [`combine`].
pub struct CombineBuilder {
    children: Vec<Box<dyn Actor>>,
    stop_together: bool,
    stop_parallel: bool,
    config: ActorConfig,
}

impl CombineBuilder {
    /// When any child finishes, whether its worker ended or someone stopped
    /// it, stop all of its siblings as well.
    pub fn stop_together(mut self) -> Self {
        self.stop_together = true;
        self
    }

    /// Stop children concurrently instead of sequentially in list order.
    pub fn stop_parallel(mut self) -> Self {
        self.stop_parallel = true;
        self
    }

    /// Registers a hook to run when the combined actor starts, before any
    /// child is started, with the combined run's fresh [`Context`].
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.config = self.config.on_start(f);
        self
    }

    /// Registers a hook to run exactly once per combined run, after the last
    /// child has finished.
    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.config = self.config.on_stop(f);
        self
    }

    /// Builds the combined actor.
    ///
    /// Each child is wired to report back when it finishes: actors with an
    /// intrinsic stop path get the report chained onto their own on-stop
    /// hooks, every other actor is wrapped so the report fires after its
    /// `stop` returns.
    pub fn build(self) -> CombinedActor {
        let CombineBuilder {
            children,
            stop_together,
            stop_parallel,
            config,
        } = self;

        let core = Arc::new_cyclic(|weak: &Weak<CombinedCore>| {
            let report = child_stop_report(weak.clone());
            let children = children
                .into_iter()
                .map(|mut child| match child.register_stop_hook(report.clone()) {
                    None => child,
                    Some(rejected) => Box::new(StopProxy {
                        inner: child,
                        report: rejected,
                    }) as Box<dyn Actor>,
                })
                .collect();

            CombinedCore {
                children,
                stop_together,
                stop_parallel,
                on_start: Mutex::new(config.on_start),
                on_stop: Mutex::new(config.on_stop),
                lifecycle: Mutex::new(CombinedLifecycle {
                    running: false,
                    ctx: None,
                }),
                stopping: AtomicBool::new(false),
                running_children: AtomicUsize::new(0),
            }
        });

        CombinedActor { core }
    }
}

/// Several actors merged behind a single lifecycle.
///
/// Start order is list order. Stop order is list order too, unless
/// [`stop_parallel`](CombineBuilder::stop_parallel) was requested, in which
/// case children stop concurrently and the order is unspecified. With
/// [`stop_together`](CombineBuilder::stop_together), one child finishing
/// pulls every sibling down. Clones share the same underlying actor.
#[derive(Clone)]
pub struct CombinedActor {
    core: Arc<CombinedCore>,
}

struct CombinedCore {
    children: Vec<Box<dyn Actor>>,
    stop_together: bool,
    stop_parallel: bool,
    on_start: Mutex<Option<StartHandler>>,
    on_stop: Mutex<Option<StopHandler>>,
    lifecycle: Mutex<CombinedLifecycle>,
    stopping: AtomicBool,
    running_children: AtomicUsize,
}

struct CombinedLifecycle {
    running: bool,
    ctx: Option<Context>,
}

#[async_trait]
impl Actor for CombinedActor {
    #[instrument(skip(self))]
    async fn start(&self) {
        self.core.start().await;
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        self.core.stop().await;
    }

    fn register_stop_hook(&mut self, hook: StopHandler) -> Option<StopHandler> {
        let mut on_stop = self.core.on_stop.lock();
        let prev = on_stop.take();
        *on_stop = Some(chain_stop(prev, hook));
        None
    }
}

impl CombinedCore {
    async fn start(&self) {
        let ctx = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.running {
                return;
            }
            lifecycle.running = true;
            self.stopping.store(false, Ordering::SeqCst);
            self.running_children
                .store(self.children.len(), Ordering::SeqCst);
            let ctx = Context::new();
            lifecycle.ctx = Some(ctx.clone());
            ctx
        };

        let on_start = self.on_start.lock().clone();
        if let Some(hook) = on_start.as_deref() {
            hook(ctx).await;
        }

        for child in &self.children {
            child.start().await;
        }
    }

    async fn stop(&self) {
        {
            let lifecycle = self.lifecycle.lock();
            if !lifecycle.running {
                return;
            }
            if self
                .stopping
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                trace!("stop already in progress");
                return;
            }
            if let Some(ctx) = &lifecycle.ctx {
                ctx.end();
            }
        }

        if self.stop_parallel {
            join_all(self.children.iter().map(|child| child.stop())).await;
        } else {
            for child in &self.children {
                child.stop().await;
            }
        }

        if self.children.is_empty() {
            self.finish_run().await;
        }
    }

    /// Flips the combined actor to not-running and fires the combined
    /// on-stop hook, once per started run.
    async fn finish_run(&self) {
        let (hook, ctx) = {
            let mut lifecycle = self.lifecycle.lock();
            if !lifecycle.running {
                return;
            }
            lifecycle.running = false;
            (self.on_stop.lock().clone(), lifecycle.ctx.take())
        };
        if let Some(ctx) = ctx {
            ctx.end();
        }
        if let Some(hook) = hook.as_deref() {
            hook().await;
        }
    }
}

/// Builds the per-child report handler that keeps the running-child counter
/// and the fate-sharing cascade honest.
fn child_stop_report(core: Weak<CombinedCore>) -> StopHandler {
    Arc::new(move || {
        let core = core.clone();
        Box::pin(async move {
            if let Some(core) = core.upgrade() {
                child_stopped(core).await;
            }
        }) as FutureBox
    })
}

async fn child_stopped(core: Arc<CombinedCore>) {
    let previous = core.running_children.fetch_sub(1, Ordering::SeqCst);
    if previous == 1 {
        core.finish_run().await;
    }

    if core.stop_together && !core.stopping.load(Ordering::SeqCst) {
        // The report runs inside the child's own stop path; stopping the
        // siblings from here would recurse into that same child. Cascade on
        // a fresh task instead.
        let cascade = Arc::clone(&core);
        tokio::spawn(async move {
            cascade.stop().await;
        });
    }
}

/// Opaque wrapper for children with no intrinsic stop path to chain onto.
struct StopProxy {
    inner: Box<dyn Actor>,
    report: StopHandler,
}

#[async_trait]
impl Actor for StopProxy {
    async fn start(&self) {
        self.inner.start().await;
    }

    async fn stop(&self) {
        self.inner.stop().await;
        (*self.report)().await;
    }
}

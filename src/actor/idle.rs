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

use crate::actor::config::chain_stop;
use crate::actor::ActorConfig;
use crate::common::{Context, StartHandler, StopHandler};
use crate::traits::Actor;

/// An actor with no worker and no background task: only the configured
/// lifecycle hooks run, synchronously on the calling task.
///
/// Useful when a component needs to participate in a combined lifecycle but
/// has nothing to do between start and stop. Clones share the same
/// underlying actor.
#[derive(Clone)]
pub struct IdleActor {
    inner: Arc<IdleInner>,
}

struct IdleInner {
    hooks: Mutex<IdleHooks>,
    lifecycle: Mutex<IdleLifecycle>,
}

struct IdleHooks {
    on_start: Option<StartHandler>,
    on_stop: Option<StopHandler>,
}

struct IdleLifecycle {
    running: bool,
    ctx: Option<Context>,
}

impl IdleActor {
    /// Creates an idle actor carrying the hooks in `config`.
    pub fn new(config: ActorConfig) -> Self {
        IdleActor {
            inner: Arc::new(IdleInner {
                hooks: Mutex::new(IdleHooks {
                    on_start: config.on_start,
                    on_stop: config.on_stop,
                }),
                lifecycle: Mutex::new(IdleLifecycle {
                    running: false,
                    ctx: None,
                }),
            }),
        }
    }
}

#[async_trait]
impl Actor for IdleActor {
    async fn start(&self) {
        let ctx = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if lifecycle.running {
                return;
            }
            lifecycle.running = true;
            let ctx = Context::new();
            lifecycle.ctx = Some(ctx.clone());
            ctx
        };

        let on_start = self.inner.hooks.lock().on_start.clone();
        if let Some(hook) = on_start.as_deref() {
            hook(ctx).await;
        }
    }

    async fn stop(&self) {
        let ctx = {
            let mut lifecycle = self.inner.lifecycle.lock();
            if !lifecycle.running {
                return;
            }
            lifecycle.running = false;
            lifecycle.ctx.take()
        };
        if let Some(ctx) = ctx {
            ctx.end();
        }

        let on_stop = self.inner.hooks.lock().on_stop.clone();
        if let Some(hook) = on_stop.as_deref() {
            hook().await;
        }
    }

    fn register_stop_hook(&mut self, hook: StopHandler) -> Option<StopHandler> {
        let mut hooks = self.inner.hooks.lock();
        let prev = hooks.on_stop.take();
        hooks.on_stop = Some(chain_stop(prev, hook));
        None
    }
}

/// Actor whose start and stop do nothing.
///
/// It holds no state, so the single process-wide instance returned by
/// [`noop`] can be shared and combined freely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopActor;

#[async_trait]
impl Actor for NoopActor {
    async fn start(&self) {}

    async fn stop(&self) {}
}

/// Returns the process-wide no-op actor.
pub fn noop() -> NoopActor {
    NoopActor
}

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
use std::sync::Arc;

use crate::common::{Context, FutureBox, StartHandler, StopHandler};

/// Optional lifecycle hooks attached to an actor at construction time.
///
/// Hooks run inside the actor's own lifecycle, so they can safely touch
/// whatever the actor touches. They are *in addition to* any hooks the
/// actor's [`Worker`](crate::traits::Worker) implements; the worker's hook
/// always runs first.
#[derive(Default)]
pub struct ActorConfig {
    pub(crate) on_start: Option<StartHandler>,
    pub(crate) on_stop: Option<StopHandler>,
}

impl ActorConfig {
    /// Creates an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a hook to run before the first worker iteration of each
    /// run, with the run's fresh [`Context`].
    pub fn on_start<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_start = Some(Arc::new(move |ctx| Box::pin(f(ctx)) as FutureBox));
        self
    }

    /// Registers a hook to run after the last worker iteration of each run,
    /// once the run's context has ended.
    pub fn on_stop<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_stop = Some(Arc::new(move || Box::pin(f()) as FutureBox));
        self
    }
}

/// Appends `hook` to an existing stop handler, preserving invocation order.
pub(crate) fn chain_stop(existing: Option<StopHandler>, hook: StopHandler) -> StopHandler {
    match existing {
        Some(prev) => Arc::new(move || {
            let prev = prev.clone();
            let hook = hook.clone();
            Box::pin(async move {
                (*prev)().await;
                (*hook)().await;
            }) as FutureBox
        }),
        None => hook,
    }
}

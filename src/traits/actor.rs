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

use crate::common::StopHandler;

/// A long-lived computational entity with a start/stop lifecycle.
///
/// Every actor kind in this crate (worker-driven, idle, combined, and
/// mailboxes) implements this trait, so they compose freely through
/// [`combine`](crate::actor::combine).
///
/// Both operations are idempotent: starting a running actor and stopping a
/// stopped one are harmless no-ops.
#[async_trait]
pub trait Actor: Send + Sync + 'static {
    /// Begins executing the actor.
    async fn start(&self);

    /// Stops the actor and waits until it has fully wound down, including
    /// any lifecycle hooks.
    async fn stop(&self);

    /// Chains `hook` to run whenever this actor finishes a run, whether it
    /// stopped itself or was stopped externally.
    ///
    /// Implementations with an intrinsic stop path accept the hook and
    /// return `None`. The default returns the hook back, signalling that the
    /// caller must invoke it itself after `stop` returns.
    #[doc(hidden)]
    fn register_stop_hook(&mut self, hook: StopHandler) -> Option<StopHandler> {
        Some(hook)
    }
}

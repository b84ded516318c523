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

//! Actor kinds and their composition: the worker-driven engine, the idle and
//! no-op actors, and the combinator.

pub use combined::{combine, CombineBuilder, CombinedActor};
pub use config::ActorConfig;
pub use idle::{noop, IdleActor, NoopActor};
pub use worker_actor::WorkerActor;

use crate::traits::Actor;

mod combined;
mod config;
mod idle;
mod worker_actor;

/// Starts every actor in order.
pub async fn start_all(actors: &[&dyn Actor]) {
    for actor in actors {
        actor.start().await;
    }
}

/// Stops every actor in order, waiting for each to wind down.
pub async fn stop_all(actors: &[&dyn Actor]) {
    for actor in actors {
        actor.stop().await;
    }
}

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

//! Type aliases for boxed futures and lifecycle handlers shared across the
//! crate.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::common::Context;

/// Pinned, boxed future produced by lifecycle handlers.
pub type FutureBox = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handler invoked with an actor's fresh [`Context`] when a run begins.
pub type StartHandler = Arc<dyn Fn(Context) -> FutureBox + Send + Sync + 'static>;

/// Handler invoked after an actor's run has fully wound down.
pub type StopHandler = Arc<dyn Fn() -> FutureBox + Send + Sync + 'static>;

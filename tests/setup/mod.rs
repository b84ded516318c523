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

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use drover::prelude::*;

// Ensures tracing initialization happens only once across all tests.
static INIT: Once = Once::new();

/// Initializes the global tracing subscriber for tests.
///
/// Log levels default to `warn` and can be raised per-target through
/// `RUST_LOG` while investigating a failure.
pub fn initialize_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .compact()
            .without_time()
            .with_target(true)
            .with_env_filter(filter)
            .try_init();
    });
}

/// Shared, ordered record of lifecycle events observed during a test.
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn record(log: &EventLog, entry: impl Into<String>) {
    log.lock().push(entry.into());
}

pub fn entries(log: &EventLog) -> Vec<String> {
    log.lock().clone()
}

/// Polls `cond` until it holds or `timeout` elapses; returns whether it held.
pub async fn wait_until(cond: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while !cond() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    true
}

/// Worker that bumps a shared counter on every iteration until its context
/// ends.
pub struct CountingWorker {
    pub count: Arc<AtomicUsize>,
}

impl CountingWorker {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (
            CountingWorker {
                count: Arc::clone(&count),
            },
            count,
        )
    }
}

#[async_trait]
impl Worker for CountingWorker {
    async fn do_work(&mut self, ctx: &Context) -> WorkerStatus {
        tokio::select! {
            _ = ctx.done() => WorkerStatus::End,
            _ = tokio::time::sleep(Duration::from_millis(1)) => {
                self.count.fetch_add(1, Ordering::SeqCst);
                WorkerStatus::Continue
            }
        }
    }
}

/// Worker that records its lifecycle hooks into an [`EventLog`] and idles
/// until its context ends.
pub struct RecordingWorker {
    pub log: EventLog,
}

#[async_trait]
impl Worker for RecordingWorker {
    async fn do_work(&mut self, ctx: &Context) -> WorkerStatus {
        tokio::select! {
            _ = ctx.done() => WorkerStatus::End,
            _ = tokio::time::sleep(Duration::from_millis(1)) => WorkerStatus::Continue,
        }
    }

    async fn on_start(&mut self, _ctx: &Context) {
        record(&self.log, "worker on_start");
    }

    async fn on_stop(&mut self) {
        record(&self.log, "worker on_stop");
    }
}

/// Builds an idle actor whose hooks append `name`-tagged entries to `log`.
pub fn logging_idle(name: &'static str, log: &EventLog) -> IdleActor {
    let start_log = log.clone();
    let stop_log = log.clone();
    IdleActor::new(
        ActorConfig::new()
            .on_start(move |_ctx| {
                let log = start_log.clone();
                async move { record(&log, format!("start:{name}")) }
            })
            .on_stop(move || {
                let log = stop_log.clone();
                async move { record(&log, format!("stop:{name}")) }
            }),
    )
}

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
#![allow(dead_code, unused_doc_comments)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use drover::prelude::*;

use crate::setup::{entries, initialize_tracing, logging_idle, new_log, record, wait_until, EventLog};

mod setup;

/// Attaches logging combined hooks to a builder.
fn with_combined_hooks(builder: CombineBuilder, log: &EventLog) -> CombineBuilder {
    let start_log = log.clone();
    let stop_log = log.clone();
    builder
        .on_start(move |_ctx| {
            let log = start_log.clone();
            async move { record(&log, "combined on_start") }
        })
        .on_stop(move || {
            let log = stop_log.clone();
            async move { record(&log, "combined on_stop") }
        })
}

/// Children start and stop in list order, bracketed by the combined hooks.
///
/// **Scenario:**
/// 1. Combine three idle actors whose hooks append to a shared log, plus
///    combined on-start/on-stop hooks.
/// 2. Start, then stop.
///
/// **Verification:**
/// - Start order: combined hook first, then children in list order.
/// - Stop order: children in list order, combined hook last, all before
///   `stop()` returns.
#[tokio::test(flavor = "multi_thread")]
async fn test_start_and_stop_in_list_order() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let children: Vec<Box<dyn Actor>> = vec![
        Box::new(logging_idle("a", &log)),
        Box::new(logging_idle("b", &log)),
        Box::new(logging_idle("c", &log)),
    ];
    let combined = with_combined_hooks(combine(children), &log).build();

    combined.start().await;
    assert_eq!(
        entries(&log),
        vec!["combined on_start", "start:a", "start:b", "start:c"]
    );

    combined.stop().await;
    assert_eq!(
        entries(&log),
        vec![
            "combined on_start",
            "start:a",
            "start:b",
            "start:c",
            "stop:a",
            "stop:b",
            "stop:c",
            "combined on_stop"
        ]
    );
    Ok(())
}

/// The combined on-stop hook fires exactly once per started run.
#[tokio::test(flavor = "multi_thread")]
async fn test_on_stop_fires_once_per_run() -> anyhow::Result<()> {
    initialize_tracing();
    let stops = Arc::new(AtomicUsize::new(0));
    let children: Vec<Box<dyn Actor>> = vec![Box::new(noop()), Box::new(noop())];
    let hook_stops = Arc::clone(&stops);
    let combined = combine(children)
        .on_stop(move || {
            let stops = Arc::clone(&hook_stops);
            async move {
                stops.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();

    combined.start().await;
    combined.stop().await;
    combined.stop().await;
    assert_eq!(stops.load(Ordering::SeqCst), 1);

    combined.start().await;
    combined.stop().await;
    assert_eq!(stops.load(Ordering::SeqCst), 2);
    Ok(())
}

/// A combined actor that was never started fires no hooks on stop.
#[tokio::test]
async fn test_stop_without_start_fires_nothing() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let children: Vec<Box<dyn Actor>> = vec![Box::new(logging_idle("a", &log))];
    let combined = with_combined_hooks(combine(children), &log).build();

    combined.stop().await;
    assert!(entries(&log).is_empty());
    Ok(())
}

/// Combining zero children degrades to an idle actor carrying only the
/// combined hooks.
#[tokio::test(flavor = "multi_thread")]
async fn test_empty_combine_runs_only_combined_hooks() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let combined = with_combined_hooks(combine(Vec::new()), &log).build();

    combined.start().await;
    combined.stop().await;
    combined.stop().await;
    assert_eq!(entries(&log), vec!["combined on_start", "combined on_stop"]);
    Ok(())
}

/// With stop-together, stopping any one child pulls every sibling down.
///
/// **Scenario:**
/// 1. Combine three idle actors with logging stop hooks, stop-together
///    enabled, keeping a handle to the first child.
/// 2. Stop that one child directly.
///
/// **Verification:**
/// - All three children reach their stop hooks and the combined on-stop
///   hook fires once.
#[tokio::test(flavor = "multi_thread")]
async fn test_stop_together_cascades_from_one_child() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let first = logging_idle("a", &log);
    let children: Vec<Box<dyn Actor>> = vec![
        Box::new(first.clone()),
        Box::new(logging_idle("b", &log)),
        Box::new(logging_idle("c", &log)),
    ];
    let combined = with_combined_hooks(combine(children), &log)
        .stop_together()
        .build();

    combined.start().await;
    first.stop().await;

    let settled = {
        let log = log.clone();
        wait_until(
            move || {
                let entries = log.lock();
                entries.iter().filter(|e| e.starts_with("stop:")).count() == 3
                    && entries.iter().any(|e| e == "combined on_stop")
            },
            Duration::from_secs(2),
        )
        .await
    };
    assert!(settled, "cascade did not stop all children: {:?}", entries(&log));
    Ok(())
}

/// A worker ending on its own also triggers the stop-together cascade.
#[tokio::test(flavor = "multi_thread")]
async fn test_stop_together_cascades_from_worker_end() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();

    // Ends on its own shortly after the whole combination has started.
    let finite = WorkerActor::new(worker_fn(move |_ctx| async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        WorkerStatus::End
    }));

    let children: Vec<Box<dyn Actor>> = vec![
        Box::new(finite),
        Box::new(logging_idle("b", &log)),
        Box::new(logging_idle("c", &log)),
    ];
    let combined = with_combined_hooks(combine(children), &log)
        .stop_together()
        .build();

    combined.start().await;

    let settled = {
        let log = log.clone();
        wait_until(
            move || {
                let entries = log.lock();
                entries.iter().filter(|e| e.starts_with("stop:")).count() == 2
                    && entries.iter().any(|e| e == "combined on_stop")
            },
            Duration::from_secs(2),
        )
        .await
    };
    assert!(settled, "worker end did not cascade: {:?}", entries(&log));
    Ok(())
}

/// Parallel stop still runs every child's stop hook to completion.
#[tokio::test(flavor = "multi_thread")]
async fn test_stop_parallel_completes_every_child() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let children: Vec<Box<dyn Actor>> = vec![
        Box::new(logging_idle("a", &log)),
        Box::new(logging_idle("b", &log)),
        Box::new(logging_idle("c", &log)),
    ];
    let combined = combine(children).stop_parallel().build();

    combined.start().await;
    combined.stop().await;

    let mut stops: Vec<String> = entries(&log)
        .into_iter()
        .filter(|e| e.starts_with("stop:"))
        .collect();
    stops.sort();
    assert_eq!(stops, vec!["stop:a", "stop:b", "stop:c"]);
    Ok(())
}

/// End-to-end pipeline: producer, mailbox, and consumer fate-shared.
///
/// **Scenario:**
/// 1. A draining mailbox, a producer worker sending 1..=1000 then ending,
///    and a consumer worker recording everything it receives, combined with
///    stop-together.
/// 2. Start the combination and wait for the dust to settle.
///
/// **Verification:**
/// - The consumer records exactly 1..=1000 in order, every actor stops, and
///   a final `stop()` on the combination returns immediately.
#[tokio::test(flavor = "multi_thread")]
async fn test_producer_consumer_pipeline() -> anyhow::Result<()> {
    initialize_tracing();
    let mailbox: Mailbox<u32> =
        Mailbox::with_config(MailboxConfig::new().stop_after_receiving_all());
    let records: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
    let finished = Arc::new(AtomicUsize::new(0));

    let producer = {
        let mailbox = mailbox.clone();
        let mut next = 0u32;
        WorkerActor::new(worker_fn(move |ctx| {
            next += 1;
            let value = next;
            let mailbox = mailbox.clone();
            async move {
                if value > 1000 {
                    return WorkerStatus::End;
                }
                match mailbox.send(&ctx, value).await {
                    Ok(()) => WorkerStatus::Continue,
                    Err(_) => WorkerStatus::End,
                }
            }
        }))
    };

    let consumer = {
        let receiver = mailbox.receive_c();
        let records = Arc::clone(&records);
        WorkerActor::new(worker_fn(move |_ctx| {
            let receiver = receiver.clone();
            let records = Arc::clone(&records);
            async move {
                match receiver.recv().await {
                    Some(value) => {
                        let mut records = records.lock();
                        records.push(value);
                        if records.len() == 1000 {
                            WorkerStatus::End
                        } else {
                            WorkerStatus::Continue
                        }
                    }
                    None => WorkerStatus::End,
                }
            }
        }))
    };

    let done = Arc::clone(&finished);
    let combined = combine(vec![
        Box::new(mailbox) as Box<dyn Actor>,
        Box::new(producer) as Box<dyn Actor>,
        Box::new(consumer) as Box<dyn Actor>,
    ])
    .stop_together()
    .on_stop(move || {
        let done = Arc::clone(&done);
        async move {
            done.fetch_add(1, Ordering::SeqCst);
        }
    })
    .build();

    combined.start().await;

    let settled = {
        let finished = Arc::clone(&finished);
        wait_until(
            move || finished.load(Ordering::SeqCst) == 1,
            Duration::from_secs(5),
        )
        .await
    };
    assert!(settled, "pipeline never wound down");
    assert_eq!(*records.lock(), (1..=1000).collect::<Vec<u32>>());

    combined.stop().await;
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    Ok(())
}

/// A worker actor handed to a combination still reports through a clone the
/// caller kept: stopping the clone cascades.
#[tokio::test(flavor = "multi_thread")]
async fn test_clone_of_combined_child_still_controls_it() -> anyhow::Result<()> {
    initialize_tracing();
    let log = new_log();
    let (worker, _count) = setup::CountingWorker::new();
    let driven = WorkerActor::new(worker);

    let children: Vec<Box<dyn Actor>> = vec![
        Box::new(driven.clone()),
        Box::new(logging_idle("b", &log)),
    ];
    let combined = with_combined_hooks(combine(children), &log)
        .stop_together()
        .build();

    combined.start().await;
    driven.stop().await;

    let settled = {
        let log = log.clone();
        wait_until(
            move || {
                let entries = log.lock();
                entries.iter().any(|e| e == "stop:b")
                    && entries.iter().any(|e| e == "combined on_stop")
            },
            Duration::from_secs(2),
        )
        .await
    };
    assert!(settled, "stop via clone did not cascade: {:?}", entries(&log));
    Ok(())
}

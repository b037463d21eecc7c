// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The periodic auto-commit background task that runs `commit()` on a
//! timer when `max_time > 0`.
//!
//! Runs on its own dedicated single-threaded `tokio` runtime (a
//! `tokio::select!` race between the timer and a shutdown signal) rather
//! than assuming the caller's process already drives a runtime — this
//! crate has no opinion on whether its caller is itself async.

use std::thread;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::WtxError;
use crate::wtx::NodeWriteTrx;

/// Owns the background thread driving the auto-commit timer and the
/// channel used to ask it to stop.
pub(crate) struct SchedulerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Spawns the scheduler thread. `handle` is a cloned reference onto
    /// the same transaction (sharing its lock), used purely to call
    /// `commit(None)` once per `period`.
    pub(crate) fn spawn(handle: NodeWriteTrx, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let thread = thread::Builder::new()
            .name("nodetx-autocommit".to_string())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                    .expect("failed to build auto-commit scheduler runtime");
                runtime.block_on(run_loop(handle, period, shutdown_rx));
            })
            .expect("failed to spawn auto-commit scheduler thread");

        SchedulerHandle {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        }
    }

    /// Signals the background task to stop and joins its thread, failing
    /// with `WtxError::SchedulerShutdown` if it does not exit within
    /// `deadline`.
    pub(crate) fn shutdown(&mut self, deadline: Duration) -> Result<(), WtxError> {
        if let Some(tx) = self.shutdown.take() {
            // The receiver may already be gone if the scheduler thread
            // panicked; that is reported by the join below, not here.
            let _ = tx.send(());
        }
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        // `std::thread::JoinHandle::join` has no timeout of its own, so the
        // join itself is done on a throwaway watcher thread and raced
        // against the deadline from here.
        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let _ = thread::Builder::new()
            .name("nodetx-autocommit-join".to_string())
            .spawn(move || {
                let _ = thread.join();
                let _ = done_tx.send(());
            });

        match done_rx.recv_timeout(deadline) {
            Ok(()) => Ok(()),
            Err(_) => Err(WtxError::SchedulerShutdown {
                reason: format!("scheduler thread did not exit within {:?}", deadline),
            }),
        }
    }
}

/// Ticks every `period`, committing once per tick, until `shutdown` fires.
/// A size-triggered inline auto-commit and this timer both call the same
/// `commit()`, so they are naturally mutually exclusive by virtue of the
/// shared re-entrant lock.
async fn run_loop(handle: NodeWriteTrx, period: Duration, mut shutdown: oneshot::Receiver<()>) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately; skip it so the first auto-commit
    // happens after one full period has elapsed, not at t=0.
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(err) = handle.commit(None) {
                    handle.log(crate::diagnostics::Level::Warn, &format!("scheduled auto-commit failed: {}", err));
                }
            }
            _ = &mut shutdown => break,
        }
    }
}

// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `commit`, `rollback`, `revert_to`, `close` and the pre/post-commit hook
//! lifecycle.
//!
//! Step 5 of `commit()` ("reinstantiate: close old page transaction; open
//! a fresh write page transaction ... rebuild node factory, path-summary
//! writer and index listeners") describes a resource-manager-mediated
//! handoff this crate has no party for — `PageTx::commit` already advances
//! the single page transaction this `Inner` owns to the new revision in
//! place (see `page::mock::MockPageTx::commit`), and the node factory,
//! path-summary writer and index controller carry no revision-scoped
//! state of their own (they are stamped-key-and-name-id builders, not
//! caches pinned to a revision). So "reinstantiate" here is just
//! `clear_caches()` on the page transaction — the one piece of
//! revision-scoped state this crate's own interfaces expose — see
//! DESIGN.md.

use std::time::Duration;

use crate::diagnostics::Level;
use crate::error::{WtxError, WtxResult};
use crate::page::CommitCredentials;
use crate::wtx::{current_unix_time, Inner, NodeWriteTrx};

/// Deadline for joining the auto-commit scheduler thread on `close()`.
const SCHEDULER_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(2);

impl Inner {
    fn credentials(&self) -> CommitCredentials {
        let page = self.page_tx.get_uber_page();
        CommitCredentials {
            revision: page.revision,
            timestamp: current_unix_time(),
        }
    }
}

impl NodeWriteTrx {
    /// Commits the current revision.
    ///
    /// Runs pre-commit hooks in registration order (aborting the commit,
    /// with no page-level effects, if any hook returns an error), resets
    /// the modification counter, delegates to the page transaction,
    /// clears caches, then runs post-commit hooks. Returns the
    /// credentials of the commit that just happened.
    pub fn commit(&self, message: Option<String>) -> WtxResult<CommitCredentials> {
        let pending_credentials = self.run_raw(|state| Ok(state.credentials()))?;
        self.run_hooks(HookPhase::Pre, &pending_credentials)?;

        let credentials = self.run_raw(|state| {
            state.modification_count = 0;
            state.page_tx.commit(message)?;
            state.page_tx.clear_caches();
            Ok(state.credentials())
        })?;

        self.run_hooks(HookPhase::Post, &credentials)?;
        self.log(Level::Info, &format!("committed revision {}", credentials.revision));
        Ok(credentials)
    }

    /// Discards the current revision's uncommitted writes and returns to
    /// the last durable revision.
    pub fn rollback(&self) -> WtxResult<CommitCredentials> {
        let credentials = self.run_raw(|state| {
            state.modification_count = 0;
            state.page_tx.rollback()?;
            state.page_tx.clear_caches();
            Ok(state.credentials())
        })?;
        self.log(Level::Info, &format!("rolled back to revision {}", credentials.revision));
        Ok(credentials)
    }

    /// Discards the writer's current view and reopens it against an older
    /// committed revision as the new head, with the next commit producing
    /// `revision + 1` regardless of how many revisions existed beyond the
    /// one reverted to. Moves the cursor to the
    /// document root.
    pub fn revert_to(&self, revision: u32) -> WtxResult<CommitCredentials> {
        let credentials = self.run_raw(|state| {
            let current = state.page_tx.get_revision_number();
            state.page_tx.revert_to(revision, current + 1)?;
            state.page_tx.clear_caches();
            state.modification_count = 0;
            state.cursor = state.document_root;
            Ok(state.credentials())
        })?;
        self.log(Level::Info, &format!("reverted to revision {}", revision));
        Ok(credentials)
    }

    /// Stub for a declared-but-unimplemented `truncate_to`: its semantics
    /// were never pinned down, so it unconditionally returns a
    /// not-implemented error until that is resolved.
    pub fn truncate_to(&self, _revision: u32) -> WtxResult<()> {
        Err(WtxError::NotImplemented)
    }

    /// Closes the write transaction. Refuses if modifications remain
    /// uncommitted; otherwise releases the page
    /// transaction's caches and joins the auto-commit scheduler, if one
    /// is running, within a 2-second deadline.
    pub fn close(&self) -> WtxResult<()> {
        let pending = self.modification_count();
        if pending > 0 {
            return Err(WtxError::UncommittedOnClose { pending });
        }
        self.run_raw(|state| {
            state.page_tx.close_caches();
            Ok(())
        })?;
        if let Some(mut scheduler) = self.scheduler.lock().take() {
            scheduler.shutdown(SCHEDULER_SHUTDOWN_DEADLINE)?;
        }
        self.log(Level::Info, "write transaction closed");
        Ok(())
    }

    fn run_hooks(&self, phase: HookPhase, credentials: &CommitCredentials) -> WtxResult<()> {
        self.run_raw(|state| {
            let hooks = match phase {
                HookPhase::Pre => &mut state.pre_commit_hooks,
                HookPhase::Post => &mut state.post_commit_hooks,
            };
            for hook in hooks.iter_mut() {
                hook(credentials).map_err(|err| WtxError::HookFailed {
                    phase: phase.as_str(),
                    reason: err.to_string(),
                })?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookPhase {
    Pre,
    Post,
}

impl HookPhase {
    fn as_str(self) -> &'static str {
        match self {
            HookPhase::Pre => "pre-commit",
            HookPhase::Post => "post-commit",
        }
    }
}

//! Background propagation of the archive flag across a subtree.
//!
//! The root patch of an archive/restore is synchronous and authoritative;
//! descendants are updated by a spawned task the caller does not wait for.
//! There is no multi-record transaction, so readers may briefly observe a
//! subtree with a flipped root and untouched descendants. Overlapping
//! cascades are not serialized against each other; each record ends up with
//! the last writer's flag.

use std::collections::HashSet;
use std::sync::Arc;

use crate::db::models::{DocumentId, DocumentPatch};
use crate::db::store::DocumentStore;

/// Upper bound on nodes one cascade will touch. A per-owner document forest
/// never legitimately reaches this; hitting it means corrupted data, and the
/// cascade stops instead of spinning.
const MAX_CASCADE_NODES: usize = 10_000;

/// Summary of one finished cascade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    /// Descendants successfully patched.
    pub updated: usize,
    /// Scan or patch failures, logged and skipped.
    pub failed: usize,
    /// True if the traversal hit the node cap and stopped early.
    pub truncated: bool,
}

/// Completion signal for a background cascade.
///
/// Default callers drop this; tests and callers needing read-your-writes
/// across a whole subtree can await it.
pub struct CascadeHandle {
    task: tokio::task::JoinHandle<CascadeReport>,
}

impl CascadeHandle {
    /// Wait for the cascade to finish and return its summary.
    pub async fn join(self) -> CascadeReport {
        self.task.await.unwrap_or_else(|err| {
            tracing::warn!("cascade task aborted: {err}");
            CascadeReport {
                truncated: true,
                ..Default::default()
            }
        })
    }
}

/// Spawn a cascade setting `is_archived = archived` below `root`.
///
/// The returned handle is the only way to observe completion; the cascade
/// itself cannot be cancelled once dispatched.
pub fn dispatch(
    store: Arc<dyn DocumentStore>,
    owner_id: String,
    root: DocumentId,
    archived: bool,
) -> CascadeHandle {
    let task = tokio::spawn(async move {
        let report = propagate(store.as_ref(), &owner_id, &root, archived).await;
        if report.failed > 0 || report.truncated {
            tracing::warn!(
                root = %root,
                updated = report.updated,
                failed = report.failed,
                truncated = report.truncated,
                "cascade finished with gaps"
            );
        } else {
            tracing::debug!(root = %root, updated = report.updated, "cascade finished");
        }
        report
    });

    CascadeHandle { task }
}

/// Depth-first worklist traversal below `root`.
///
/// Children are discovered through `(owner, parent)` scans, patched, then
/// descended into. The relation is a forest under normal operation; the
/// visited set and node cap guard against a cycle introduced by corrupted
/// data, stopping the walk instead of looping. Individual failures are
/// logged and skipped — the root state is already committed, and nothing
/// listens for a retry.
pub(crate) async fn propagate(
    store: &dyn DocumentStore,
    owner_id: &str,
    root: &DocumentId,
    archived: bool,
) -> CascadeReport {
    let mut report = CascadeReport::default();
    let mut stack = vec![root.clone()];
    let mut visited: HashSet<DocumentId> = HashSet::new();
    visited.insert(root.clone());

    while let Some(node) = stack.pop() {
        let children = match store.list_children(owner_id, Some(&node), None).await {
            Ok(children) => children,
            Err(err) => {
                tracing::warn!(node = %node, "cascade child scan failed: {err}");
                report.failed += 1;
                continue;
            }
        };

        for child in children {
            if !visited.insert(child.id.clone()) {
                tracing::warn!(node = %child.id, "cycle in document tree, skipping");
                continue;
            }
            if visited.len() > MAX_CASCADE_NODES {
                tracing::warn!(
                    root = %root,
                    "cascade exceeded {MAX_CASCADE_NODES} nodes, stopping"
                );
                report.truncated = true;
                return report;
            }

            match store
                .patch(&child.id, DocumentPatch::archived(archived))
                .await
            {
                Ok(_) => report.updated += 1,
                Err(err) => {
                    tracing::warn!(node = %child.id, "cascade patch failed: {err}");
                    report.failed += 1;
                }
            }

            stack.push(child.id);
        }
    }

    report
}

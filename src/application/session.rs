//! Copy-on-write mutation boundary and the versioned form handle.
//!
//! ```text
//! canonical ──clone──> working copy ──f(&mut)──> Ok  ──> publish (Arc swap)
//!                                         └────> Err ──> drop copy, keep canonical
//! ```
//!
//! Readers hold an `Arc<FormTree>` snapshot and never observe a half-applied
//! edit: the only write is replacing the `Arc` once a mutation succeeded.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{DomainError, DomainResult, FormTree, QuestionId, QuestionRecord};

/// Run `f` against a private deep copy of `canonical`.
///
/// On success the copy is returned as the next canonical tree, with every
/// intact chain's array order brought in line with the chain. On failure
/// the very same `Arc` that was passed in is returned, so callers can rely
/// on pointer identity to see that nothing changed.
pub fn with_mutation<T, F>(canonical: &Arc<FormTree>, f: F) -> (Arc<FormTree>, DomainResult<T>)
where
    F: FnOnce(&mut FormTree) -> DomainResult<T>,
{
    let mut working = FormTree::clone(canonical);
    match f(&mut working) {
        Ok(value) => {
            let settled = working.settle_chain_order();
            if !settled.is_empty() {
                debug!(parents = ?settled, "Re-sorted children to match their chain");
            }
            (Arc::new(working), Ok(value))
        }
        Err(err) => {
            log_rejection(&err);
            (Arc::clone(canonical), Err(err))
        }
    }
}

/// Rejected drops are routine; a broken chain is a data-integrity problem.
fn log_rejection(err: &DomainError) {
    match err {
        DomainError::IllegalRelocation { .. } => debug!(error = %err, "Mutation rejected"),
        DomainError::BrokenOrderChain { .. } => error!(error = %err, "Mutation hit a broken order chain"),
        _ => warn!(error = %err, "Mutation failed"),
    }
}

/// Versioned handle on the canonical form structure.
///
/// Owned by whoever drives the editor and passed explicitly; every
/// successful [`FormStructure::mutate`] publishes a new snapshot and bumps
/// the version.
#[derive(Debug, Clone)]
pub struct FormStructure {
    current: Arc<FormTree>,
    version: u64,
    blocked: BTreeSet<QuestionId>,
}

impl FormStructure {
    /// Wrap a tree. Parents whose order chain is already broken start out
    /// blocked.
    pub fn new(tree: FormTree) -> Self {
        let blocked = tree
            .broken_chains()
            .into_iter()
            .map(|(parent, err)| {
                error!(%parent, error = %err, "Blocking edits under broken order chain");
                parent
            })
            .collect();
        Self {
            current: Arc::new(tree),
            version: 0,
            blocked,
        }
    }

    pub fn from_record(record: QuestionRecord) -> ApplicationResult<Self> {
        Ok(Self::new(FormTree::from_record(record)?))
    }

    pub fn from_json(json: &str) -> ApplicationResult<Self> {
        Self::from_record(QuestionRecord::from_json(json)?)
    }

    /// The current canonical tree, cheap to clone and safe to keep.
    pub fn snapshot(&self) -> Arc<FormTree> {
        Arc::clone(&self.current)
    }

    pub fn tree(&self) -> &FormTree {
        &self.current
    }

    /// Number of published mutations since construction.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Parents whose subtrees refuse edits until their chain is repaired.
    pub fn blocked(&self) -> impl Iterator<Item = &QuestionId> {
        self.blocked.iter()
    }

    pub fn is_blocked(&self, parent: &QuestionId) -> bool {
        self.blocked.contains(parent)
    }

    /// Apply `f` as one atomic edit.
    ///
    /// Publication is refused when the result would change a blocked
    /// subtree without leaving its chain valid, or would break a chain that
    /// is intact in the canonical tree. Either way the canonical tree and
    /// version stay as they were.
    #[instrument(level = "debug", skip(self, f), fields(version = self.version))]
    pub fn mutate<T, F>(&mut self, f: F) -> ApplicationResult<T>
    where
        F: FnOnce(&mut FormTree) -> DomainResult<T>,
    {
        let (next, result) = with_mutation(&self.current, f);
        let value = match result {
            Ok(value) => value,
            Err(err) => {
                if let DomainError::BrokenOrderChain { parent, .. } = &err {
                    if self.current.chain_status(parent).is_err() && self.blocked.insert(parent.clone()) {
                        error!(%parent, "Blocking edits under broken order chain");
                    }
                }
                return Err(err.into());
            }
        };

        let repaired = self.check_blocked(&next)?;
        self.check_new_breakage(&next)?;

        for parent in repaired {
            debug!(%parent, "Order chain repaired, unblocking");
            self.blocked.remove(&parent);
        }
        self.current = next;
        self.version += 1;
        debug!(version = self.version, "Published form structure");
        Ok(value)
    }

    /// Blocked parents the candidate leaves valid (or removed). Fails on
    /// the first blocked subtree that changed but is still broken.
    fn check_blocked(&self, next: &FormTree) -> ApplicationResult<Vec<QuestionId>> {
        let mut repaired = Vec::new();
        for parent in &self.blocked {
            if self.current.subtree_eq(next, parent) {
                continue;
            }
            if !next.contains(parent) || next.chain_status(parent).is_ok() {
                repaired.push(parent.clone());
                continue;
            }
            warn!(%parent, "Rejected edit inside blocked subtree");
            return Err(ApplicationError::SubtreeBlocked {
                parent: parent.clone(),
            });
        }
        Ok(repaired)
    }

    /// Refuse to publish chains that were intact before the edit.
    fn check_new_breakage(&self, next: &FormTree) -> ApplicationResult<()> {
        let introduced = next
            .broken_chains()
            .into_iter()
            .find(|(parent, _)| !matches!(self.current.chain_status(parent), Err(DomainError::BrokenOrderChain { .. })));
        match introduced {
            Some((parent, source)) => {
                let err = DomainError::BrokenOrderChain { parent, source };
                error!(error = %err, "Refusing to publish broken order chain");
                Err(err.into())
            }
            None => Ok(()),
        }
    }
}

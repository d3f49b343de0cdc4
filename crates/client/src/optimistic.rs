//! Optimistic cart mutations.
//!
//! Every remote cart mutation runs the same protocol:
//!
//! 1. capture the local cart and the cached remote snapshot
//! 2. apply the change to both, synchronously, before any I/O
//! 3. submit the remote request
//! 4. on success fold the server's answer into the local line and
//!    invalidate the cached snapshot; on failure put both captures back
//!    and raise a single error notification
//!
//! Nothing is retried. A line may see several requests in flight; whichever
//! answer lands last decides its quantity.

use std::future::Future;

use foody_core::RemoteCartSnapshot;
use tracing::warn;

use crate::api::ApiError;
use crate::cache::QueryCache;
use crate::error;
use crate::notify::{Notification, Notifier};
use crate::store::CartStore;

type SnapshotEdit = Box<dyn FnOnce(&RemoteCartSnapshot) -> RemoteCartSnapshot + Send>;

/// One optimistic cart mutation.
pub struct OptimisticCommand<A> {
    name: &'static str,
    apply: A,
    cache_edit: Option<SnapshotEdit>,
    failure_message: &'static str,
}

impl<A> std::fmt::Debug for OptimisticCommand<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptimisticCommand")
            .field("name", &self.name)
            .field("edits_cache", &self.cache_edit.is_some())
            .field("failure_message", &self.failure_message)
            .finish_non_exhaustive()
    }
}

impl<A: FnOnce(&mut CartStore)> OptimisticCommand<A> {
    /// A command that applies `apply` to the local cart and shows
    /// `failure_message` if the server rejects it.
    pub const fn new(name: &'static str, apply: A, failure_message: &'static str) -> Self {
        Self {
            name,
            apply,
            cache_edit: None,
            failure_message,
        }
    }

    /// Also edit the cached remote snapshot while the request is in flight.
    #[must_use]
    pub fn with_cache_edit(
        mut self,
        edit: impl FnOnce(&RemoteCartSnapshot) -> RemoteCartSnapshot + Send + 'static,
    ) -> Self {
        self.cache_edit = Some(Box::new(edit));
        self
    }

    /// Run the protocol.
    ///
    /// `submit` is polled only after the local change was applied. `commit`
    /// receives the server's answer on success.
    ///
    /// # Errors
    ///
    /// Returns the submit error after the rollback.
    pub async fn run<T, S, C>(
        self,
        store: &mut CartStore,
        cache: &QueryCache,
        notifier: &impl Notifier,
        submit: S,
        commit: C,
    ) -> Result<T, ApiError>
    where
        S: Future<Output = Result<T, ApiError>>,
        C: FnOnce(&mut CartStore, &T),
    {
        let snapshot = store.state().clone();
        (self.apply)(store);

        let cached = match self.cache_edit {
            Some(edit) => cache.update_cart(edit).await,
            None => None,
        };

        match submit.await {
            Ok(answer) => {
                commit(store, &answer);
                cache.invalidate_cart().await;
                Ok(answer)
            }
            Err(e) => {
                warn!(command = self.name, error = %e, "Rolling back cart mutation");
                store.restore(snapshot);
                cache.restore_cart(cached).await;
                error::report(self.name, &e);
                notifier.notify(Notification::error(self.failure_message));
                Err(e)
            }
        }
    }
}

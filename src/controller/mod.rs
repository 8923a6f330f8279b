//! Reconcilers and their leaf utilities
//!
//! Two reconcilers converge one shared table: `endpoints` owns membership
//! convergence per service partition, `service` owns the final prune once a
//! Service is deleted. Both are fed keys by a watch stream through the shared
//! work queue.

use futures::StreamExt;
use kube::api::Api;
use kube::runtime::{watcher, watcher::Event, WatchStreamExt};
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc::UnboundedSender;
use tracing::warn;

use crate::queue::ObjectKey;

pub mod endpoints;
pub mod selector;
pub mod service;
pub mod sql_ident;

#[cfg(test)]
mod selector_test;
#[cfg(test)]
mod sql_ident_test;

pub use endpoints::{EndpointSliceReconciler, SERVICE_NAME_LABEL};
pub use selector::matches_selector;
pub use service::ServiceReconciler;
pub use sql_ident::{sanitize_table_ident, TableIdent, DEFAULT_TABLE};

/// Converts watch events for `api` into key deliveries on `tx`.
///
/// Create, update, and delete all map to the same delivery; the reconciler
/// refetches by key and decides what the event means. Watch failures are
/// retried by the stream's own backoff and only logged here.
pub(crate) async fn feed_watch_events<K>(api: Api<K>, tx: UnboundedSender<ObjectKey>)
where
    K: Resource + Clone + std::fmt::Debug + DeserializeOwned + Send + 'static,
    K::DynamicType: Default + Eq + std::hash::Hash + Clone,
{
    let mut stream = watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed();
    while let Some(event) = stream.next().await {
        match event {
            Ok(Event::Apply(obj)) | Ok(Event::InitApply(obj)) | Ok(Event::Delete(obj)) => {
                let Some(namespace) = obj.namespace() else {
                    continue;
                };
                if tx.send(ObjectKey::new(namespace, obj.name_any())).is_err() {
                    return;
                }
            }
            Ok(Event::Init) | Ok(Event::InitDone) => {}
            Err(err) => warn!(error = %err, "watch error"),
        }
    }
}

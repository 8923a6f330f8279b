//! EndpointSlice reconciler
//!
//! Mirrors the ready endpoints behind a Service into the destination table.
//! Every delivery is a full recompute: the desired row set is rebuilt from
//! all slices belonging to the owning Service, then the table partition is
//! converged in one transaction (upserts plus a prune of everything no longer
//! desired). Deliveries are at-least-once and unordered, so nothing here
//! diffs against a previous run.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::discovery::v1::{Endpoint, EndpointSlice};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use sqlx::PgPool;
use tracing::{debug, info};

use super::selector::matches_selector;
use crate::config::MirrorConfig;
use crate::error::Result;
use crate::queue::{Next, ObjectKey, Reconcile, WorkQueue};

/// Well-known label tying an EndpointSlice to its owning Service.
pub const SERVICE_NAME_LABEL: &str = "kubernetes.io/service-name";

const RETRY_AFTER: Duration = Duration::from_secs(15);

pub struct EndpointSliceReconciler {
    pub client: Client,
    pub db: PgPool,
    pub config: Arc<MirrorConfig>,
}

/// One desired endpoint for the current convergence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EndpointRow {
    pub uid: String,
    pub name: String,
    pub ip: String,
}

#[async_trait]
impl Reconcile for EndpointSliceReconciler {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Next> {
        let resync = Next::RequeueAfter(self.config.resync);
        let api: Api<EndpointSlice> = Api::namespaced(self.client.clone(), &key.namespace);

        // If the slice is gone we cannot know the service from the name
        // alone; the Service reconciler handles the full prune on service
        // deletion.
        let Some(slice) = api.get_opt(&key.name).await? else {
            return Ok(resync);
        };

        if !self.config.selector.is_empty()
            && !matches_selector(slice.metadata.labels.as_ref(), &self.config.selector)
        {
            return Ok(resync);
        }

        let Some(service) = slice
            .metadata
            .labels
            .as_ref()
            .and_then(|labels| labels.get(SERVICE_NAME_LABEL))
            .filter(|name| !name.is_empty())
            .cloned()
        else {
            return Ok(resync);
        };

        // Union across *all* slices for this service in this namespace; a
        // service's ready set is sharded over several slices and any one of
        // them may have changed.
        let params = ListParams::default().labels(&format!("{SERVICE_NAME_LABEL}={service}"));
        let slices = api.list(&params).await?;

        let desired =
            build_desired_rows(&slices.items, &self.config.selector, &key.namespace, &service);

        self.sync_partition(&key.namespace, &service, &desired).await?;

        debug!(
            cluster = %self.config.cluster,
            namespace = %key.namespace,
            service = %service,
            count = desired.len(),
            "synced endpoints"
        );
        Ok(resync)
    }
}

impl EndpointSliceReconciler {
    /// Converges the `(cluster, namespace, service)` partition to `desired`
    /// in one transaction. The transaction rolls back on drop, so any error
    /// leaves the partition untouched.
    async fn sync_partition(
        &self,
        namespace: &str,
        service: &str,
        desired: &BTreeMap<String, EndpointRow>,
    ) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let upsert = format!(
            "INSERT INTO {table} \
             (cluster, namespace, service, pod_uid, pod_name, pod_ip, ready, last_seen) \
             VALUES ($1, $2, $3, $4, $5, $6::inet, true, now()) \
             ON CONFLICT (cluster, namespace, service, pod_uid) \
             DO UPDATE SET pod_ip = EXCLUDED.pod_ip, ready = true, last_seen = now()",
            table = self.config.table
        );
        for row in desired.values() {
            sqlx::query(&upsert)
                .bind(&self.config.cluster)
                .bind(namespace)
                .bind(service)
                .bind(&row.uid)
                .bind(&row.name)
                .bind(&row.ip)
                .execute(&mut *tx)
                .await?;
        }

        let uids: Vec<String> = desired.keys().cloned().collect();
        let prune = format!(
            "DELETE FROM {table} \
             WHERE cluster = $1 AND namespace = $2 AND service = $3 \
             AND pod_uid <> ALL($4)",
            table = self.config.table
        );
        sqlx::query(&prune)
            .bind(&self.config.cluster)
            .bind(namespace)
            .bind(service)
            .bind(&uids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Builds the desired row set from all slices of one service.
///
/// Slices are merged in name order, so when two slices carry an entry for the
/// same identity the one from the lexicographically last slice wins. Slices
/// failing the selector contribute nothing.
pub(crate) fn build_desired_rows(
    slices: &[EndpointSlice],
    selector: &str,
    namespace: &str,
    service: &str,
) -> BTreeMap<String, EndpointRow> {
    let mut sorted: Vec<&EndpointSlice> = slices.iter().collect();
    sorted.sort_by_key(|slice| slice.name_any());

    let mut desired = BTreeMap::new();
    for slice in sorted {
        if !selector.is_empty() && !matches_selector(slice.metadata.labels.as_ref(), selector) {
            continue;
        }
        for endpoint in &slice.endpoints {
            if let Some(row) = endpoint_row(endpoint, namespace, service) {
                desired.insert(row.uid.clone(), row);
            }
        }
    }
    desired
}

/// Maps one endpoint entry to a desired row, or `None` when it is excluded.
///
/// An entry qualifies iff it has at least one address and its ready condition
/// is not explicitly false (absent counts as ready). Identity is the backing
/// Pod UID when present, otherwise `namespace/service/ip` so endpoints
/// without a Pod still converge to a stable key.
pub(crate) fn endpoint_row(
    endpoint: &Endpoint,
    namespace: &str,
    service: &str,
) -> Option<EndpointRow> {
    if endpoint.conditions.as_ref().and_then(|c| c.ready) == Some(false) {
        return None;
    }
    let ip = endpoint.addresses.first()?.clone();

    let mut uid = String::new();
    let mut name = String::new();
    if let Some(target) = endpoint
        .target_ref
        .as_ref()
        .filter(|target| target.kind.as_deref() == Some("Pod"))
    {
        uid = target.uid.clone().unwrap_or_default();
        name = target.name.clone().unwrap_or_default();
    }
    if uid.is_empty() {
        uid = format!("{namespace}/{service}/{ip}");
    }

    Some(EndpointRow { uid, name, ip })
}

/// Runs the EndpointSlice reconciler until shutdown.
pub async fn run(client: Client, db: PgPool, config: Arc<MirrorConfig>) -> Result<()> {
    let api: Api<EndpointSlice> = match config.namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    let reconciler = EndpointSliceReconciler { client, db, config };
    let (queue, tx) = WorkQueue::new(reconciler, RETRY_AFTER);

    info!("starting EndpointSlice controller");
    tokio::join!(super::feed_watch_events(api, tx), queue.run());
    Ok(())
}

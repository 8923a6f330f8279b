//! Service reconciler
//!
//! Final cleanup for deleted Services. While a Service exists its endpoint
//! rows are owned entirely by the EndpointSlice reconciler; once it is gone
//! no slice carries the service name any more, so this reconciler wipes the
//! whole `(cluster, namespace, service)` partition.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::api::Api;
use kube::Client;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::config::MirrorConfig;
use crate::error::Result;
use crate::queue::{Next, ObjectKey, Reconcile, WorkQueue};

const RETRY_AFTER: Duration = Duration::from_secs(15);

pub struct ServiceReconciler {
    pub client: Client,
    pub db: PgPool,
    pub config: Arc<MirrorConfig>,
}

#[async_trait]
impl Reconcile for ServiceReconciler {
    async fn reconcile(&self, key: &ObjectKey) -> Result<Next> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), &key.namespace);

        if api.get_opt(&key.name).await?.is_some() {
            // Live service: adds and updates are the EndpointSlice
            // reconciler's business.
            return Ok(Next::Done);
        }

        // A single statement keeps the bulk delete atomic; there is no
        // partial state to protect beyond that.
        let sql = format!(
            "DELETE FROM {table} WHERE cluster = $1 AND namespace = $2 AND service = $3",
            table = self.config.table
        );
        let result = sqlx::query(&sql)
            .bind(&self.config.cluster)
            .bind(&key.namespace)
            .bind(&key.name)
            .execute(&self.db)
            .await?;

        debug!(
            namespace = %key.namespace,
            service = %key.name,
            rows = result.rows_affected(),
            "pruned rows for deleted service"
        );
        Ok(Next::Done)
    }
}

/// Runs the Service reconciler until shutdown.
pub async fn run(client: Client, db: PgPool, config: Arc<MirrorConfig>) -> Result<()> {
    let api: Api<Service> = match config.namespace.as_deref() {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    };

    let reconciler = ServiceReconciler { client, db, config };
    let (queue, tx) = WorkQueue::new(reconciler, RETRY_AFTER);

    info!("starting Service controller");
    tokio::join!(super::feed_watch_events(api, tx), queue.run());
    Ok(())
}

//! Resolved runtime configuration for both reconcilers
//!
//! Raw flag/env values are resolved exactly once, before any controller
//! starts; in particular the destination table is quoted here and nowhere
//! else.

use std::time::Duration;

use crate::controller::sql_ident::TableIdent;
use crate::error::{Error, Result};

#[derive(Clone, Debug)]
pub struct MirrorConfig {
    /// Static cluster label written with every row.
    pub cluster: String,
    /// Fully resolved destination table identifier.
    pub table: TableIdent,
    /// Optional `key=value[,key=value]` filter; empty means match everything.
    pub selector: String,
    /// Periodic redelivery interval for membership keys.
    pub resync: Duration,
    /// Restrict watches to one namespace; `None` watches all.
    pub namespace: Option<String>,
}

impl MirrorConfig {
    pub fn resolve(
        cluster: String,
        table_name: &str,
        selector: String,
        resync_secs: u64,
        namespace: String,
    ) -> Result<Self> {
        if cluster.is_empty() {
            return Err(Error::ConfigError("cluster name must not be empty".into()));
        }
        if resync_secs == 0 {
            return Err(Error::ConfigError(
                "resync interval must be at least one second".into(),
            ));
        }
        Ok(MirrorConfig {
            cluster,
            table: TableIdent::resolve(table_name),
            selector: selector.trim().to_string(),
            resync: Duration::from_secs(resync_secs),
            namespace: (!namespace.is_empty()).then_some(namespace),
        })
    }
}

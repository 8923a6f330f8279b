use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use endpoint_mirror::config::MirrorConfig;
use endpoint_mirror::{controller, db};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the mirror operator
    Run(RunArgs),
    /// Show version information
    Version,
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Cluster name label written with every row
    #[arg(long, env = "CLUSTER_NAME", default_value = "default")]
    cluster: String,

    /// Destination Postgres table (optionally schema-qualified, e.g. 'public.server')
    #[arg(long, env = "TABLE_NAME", default_value = "")]
    table: String,

    /// EndpointSlice label selector (e.g. 'app=my-svc')
    #[arg(long, env = "ENDPOINT_SELECTOR", default_value = "")]
    selector: String,

    /// Namespace to watch (empty = all)
    #[arg(long, env = "WATCH_NAMESPACE", default_value = "")]
    namespace: String,

    /// Periodic reconcile interval in seconds
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = 60)]
    resync_interval: u64,

    /// Create the destination table at startup if it does not exist
    #[arg(long, env = "INIT_SCHEMA")]
    init_schema: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.command {
        Commands::Version => {
            println!("endpoint-mirror v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Run(run_args) => run_operator(run_args).await,
    }
}

async fn run_operator(args: RunArgs) -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    let fmt_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    // Resolve configuration once; the reconcilers only ever see the resolved
    // values (in particular the already-quoted table identifier).
    let config = Arc::new(MirrorConfig::resolve(
        args.cluster,
        &args.table,
        args.selector,
        args.resync_interval,
        args.namespace,
    )?);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        cluster = %config.cluster,
        table = %config.table,
        selector = %config.selector,
        namespace = config.namespace.as_deref().unwrap_or("<all>"),
        resync_secs = config.resync.as_secs(),
        "starting endpoint-mirror"
    );

    let client = kube::Client::try_default().await?;
    info!("connected to Kubernetes cluster");

    let pool = db::connect().await?;
    if args.init_schema {
        db::ensure_table(&pool, &config.table).await?;
    }

    let endpoints = controller::endpoints::run(client.clone(), pool.clone(), config.clone());
    let services = controller::service::run(client, pool, config);

    tokio::select! {
        res = endpoints => res?,
        res = services => res?,
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
    }
    Ok(())
}

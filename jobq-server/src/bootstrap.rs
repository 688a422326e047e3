use jobq_store::{JobStore, SqlJobStore};

/// Outcome of the connectivity check made before serving traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreProbe {
    Reachable,
    Unreachable,
}

/// Ping the store once at boot.
///
/// An unreachable store is logged and tolerated unless `require` is set, in
/// which case startup is aborted. Submissions made while the store is down
/// fail individually with a 500.
pub async fn probe_store(store: &dyn JobStore, require: bool) -> anyhow::Result<StoreProbe> {
    match store.ping().await {
        Ok(()) => {
            tracing::info!("job store reachable");
            Ok(StoreProbe::Reachable)
        }
        Err(error) if require => Err(anyhow::anyhow!("job store unreachable at startup: {error}")),
        Err(error) => {
            tracing::error!(%error, "job store unreachable at startup; continuing");
            Ok(StoreProbe::Unreachable)
        }
    }
}

/// Probe the store, then apply migrations when it answered.
///
/// When the store is down, migrations are left to the store itself: built
/// with `with_auto_migrate`, it applies them on its first successful contact.
pub async fn prepare_store(
    store: &SqlJobStore,
    db: &jobq_config::DatabaseConfig,
) -> anyhow::Result<StoreProbe> {
    let probe = probe_store(store, db.require_on_startup).await?;

    match (probe, db.run_migrations) {
        (StoreProbe::Reachable, true) => {
            store.migrate().await.map_err(|e| {
                tracing::error!(%e, "failed to apply database migrations");
                anyhow::anyhow!("failed to apply database migrations: {e}")
            })?;
        }
        (StoreProbe::Unreachable, true) => {
            tracing::warn!("job store unreachable; migrations deferred until it answers");
        }
        (_, false) => tracing::debug!("database migrations disabled"),
    }

    Ok(probe)
}

//! Samadhan Console - read-mostly operator dashboard in the terminal
//!
//! Signs in with an identity token from the environment, prints the
//! complaint table and reprints it whenever auto-refresh replaces the set
//! or fails. Exits once the session is refused.

mod logger;
mod render;

use std::sync::Arc;

use anyhow::Context;
use samadhan_client::store::ComplaintFilter;
use samadhan_client::{
    ClientConfig, ComplaintStore, Dashboard, Intent, LifecycleController, StaticIdentity,
};

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn initial_filter() -> anyhow::Result<ComplaintFilter> {
    let mut filter = ComplaintFilter::new();
    if let Ok(search) = std::env::var("SAMADHAN_SEARCH") {
        filter.search = search;
    }
    if let Ok(label) = std::env::var("SAMADHAN_CATEGORY") {
        filter
            .set_category_label(&label)
            .context("SAMADHAN_CATEGORY")?;
    }
    if let Ok(label) = std::env::var("SAMADHAN_STATUS") {
        filter.set_status_label(&label).context("SAMADHAN_STATUS")?;
    }
    Ok(filter)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let log_dir = std::env::var("LOG_DIR").ok();
    logger::init_logger(&level, env_flag("LOG_JSON"), log_dir.as_deref())?;

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Samadhan console starting");

    let token = std::env::var("SAMADHAN_ID_TOKEN").context("SAMADHAN_ID_TOKEN is not set")?;
    let identity = Arc::new(StaticIdentity::from_id_token(token).context("Invalid identity token")?);
    let api = Arc::new(config.build_http_client()?);

    let store = ComplaintStore::new(api, identity);
    let controller = Arc::new(LifecycleController::new(store.clone()));
    let dashboard = Dashboard::new(controller).with_filter(initial_filter()?);

    if let Err(e) = dashboard.dispatch(Intent::Refresh).await {
        if e.requires_reauth() {
            return Err(e).context("Sign-in required");
        }
        tracing::warn!(error = %e, "Initial load failed; waiting for auto-refresh");
    }
    println!("{}", render::render(&dashboard.state()));

    let mut changes = store.subscribe();
    let poller = store.start_auto_refresh(config.refresh_interval);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, shutting down");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let synced = dashboard.sync().await;
                println!("{}", render::render(&dashboard.state()));

                let refused = synced
                    .err()
                    .or_else(|| store.last_error())
                    .filter(|e| e.requires_reauth());
                if let Some(e) = refused {
                    poller.shutdown().await;
                    store.shutdown();
                    return Err(e).context("Sign-in required");
                }
            }
        }
    }

    poller.shutdown().await;
    store.shutdown();
    Ok(())
}

mod catalog_api;
mod catalog_client;
mod config;
mod domain;
mod search;
#[cfg(test)]
mod test_support;

use std::{path::Path, sync::Arc};

use anyhow::Context;
use catalog_client::BookCatalogClient;
use config::Config;
use poem::{
    EndpointExt, Route, Server,
    listener::TcpListener,
    middleware::{Cors, Tracing as PoemTracing},
};
use poem_openapi::OpenApiService;
use search::SearchHandle;
use tokio_util::sync::CancellationToken;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt::SubscriberBuilder, prelude::*};

type CatalogResult<T> = anyhow::Result<T>;

#[tokio::main]
async fn main() -> CatalogResult<()> {
    // Respect RUST_LOG if set, default to info for our crate and warn for deps.
    let default_filter = format!(
        "{}=info,poem=info,reqwest=warn,h2=warn",
        env!("CARGO_PKG_NAME")
    );
    let env_filter = std::env::var("RUST_LOG").unwrap_or(default_filter);
    SubscriberBuilder::default()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .with_level(true)
        .pretty()
        .finish()
        .with(ErrorLayer::default())
        .init();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting library catalog search"
    );
    if Path::new(".env.local").exists() {
        dotenvy::from_filename(".env.local")?;
    } else if Path::new(".env").exists() {
        dotenvy::from_filename(".env")?;
    };
    let config = Config::load().context("Failed to load configuration")?;
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let client = BookCatalogClient::new(&config.catalog_base_url)
        .with_context(|| "Failed to build catalog HTTP client")?
        .with_api_key(&config.catalog_api_key);
    let has_api_key = !config.catalog_api_key.is_empty();
    tracing::info!(catalog_base = %config.catalog_base_url, has_api_key, "configured catalog client");

    let cancel = CancellationToken::new();
    let (search, search_task) =
        search::service::spawn(Arc::new(client), config.search.clone(), cancel.clone());

    let served = run_poem(search, &config.bind_addr, cancel.clone()).await;
    cancel.cancel();
    search_task
        .await
        .with_context(|| "search service task failed")?;
    served
}

pub async fn run_poem(
    search: SearchHandle,
    bind_addr: &str,
    cancel: CancellationToken,
) -> CatalogResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let api = catalog_api::CatalogApi { search };
    let api_service = OpenApiService::new(api, "Library Catalog Search API", version)
        .server(format!("http://{}", bind_addr));
    let ui = api_service.rapidoc();
    let spec = api_service.spec();
    let route = Route::new()
        .nest("/", api_service)
        .nest("/ui", ui)
        .nest("/spec", poem::endpoint::make_sync(move |_| spec.clone()))
        .with(Cors::new())
        .with(PoemTracing);

    tracing::info!(%bind_addr, "starting HTTP server");
    Server::new(TcpListener::bind(bind_addr.to_string()))
        .run_with_graceful_shutdown(
            route,
            async move {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => tracing::info!("received ctrl-c, shutting down"),
                    _ = cancel.cancelled() => {}
                }
            },
            None,
        )
        .await?;
    Ok(())
}

use crate::api_state::ApiContext;
use crate::create_router;
use app_state::{AppSettings, SourceKind};
use axum::Router;
use axum::routing::get_service;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::database::{PgPhotoStore, get_db_pool, run_migrations};
use common_services::ingest::{
    IngestionPipeline, PhotoStore, RemoteFileFetcher, RemoteFileLister, clean_orphans,
};
use common_services::metadata::ExifExtractor;
use common_services::sources::{DriveClient, LocalFolderSource};
use generate_thumbnails::ThumbnailGenerator;
use http::{HeaderValue, header};
use reqwest::Client;
use std::iter::once;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors;
use tower_http::cors::CorsLayer;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

type Source = (Arc<dyn RemoteFileLister>, Arc<dyn RemoteFileFetcher>);

fn build_source(settings: &AppSettings) -> Result<Source> {
    match settings.ingest.source {
        SourceKind::Drive => {
            let client = Arc::new(DriveClient::new(
                Client::new(),
                &settings.drive,
                settings.secrets.drive_access_token.clone(),
            )?);
            let lister: Arc<dyn RemoteFileLister> = client.clone();
            let fetcher: Arc<dyn RemoteFileFetcher> = client;
            Ok((lister, fetcher))
        }
        SourceKind::Local => {
            let root = settings
                .ingest
                .local_root()
                .map(PathBuf::from)
                .unwrap_or_default();
            let source = Arc::new(LocalFolderSource::new(root));
            let lister: Arc<dyn RemoteFileLister> = source.clone();
            let fetcher: Arc<dyn RemoteFileFetcher> = source;
            Ok((lister, fetcher))
        }
    }
}

/// Connects to the database, wires the ingestion pipeline and starts the job scheduler.
pub async fn build_context(settings: AppSettings) -> Result<ApiContext> {
    let pool = get_db_pool(&settings).await?;
    run_migrations(&pool).await?;
    let store: Arc<dyn PhotoStore> = Arc::new(PgPhotoStore::new(pool));

    if settings.ingest.root_folder.is_none() {
        warn!("No ingest root folder configured, ingestion requests will be rejected.");
    }
    if settings.ingest.clean_on_startup {
        let report = clean_orphans(
            store.as_ref(),
            &settings.ingest.media_folder,
            &settings.ingest.thumbnail_folder,
        )
        .await?;
        info!(
            "🧹 Removed {} orphaned originals and {} thumbnail folders.",
            report.originals_removed, report.thumbnail_dirs_removed
        );
    }

    let (lister, fetcher) = build_source(&settings)?;
    let pipeline = IngestionPipeline::from_settings(
        &settings.ingest,
        lister,
        fetcher,
        Arc::new(ThumbnailGenerator::new(settings.ingest.clone())),
        Arc::new(ExifExtractor::new()),
        store.clone(),
    );

    Ok(ApiContext::new(settings, pipeline, store))
}

/// Adds static file serving and the HTTP middleware stack to the API router.
pub fn create_app(api_state: ApiContext) -> Router {
    let settings = api_state.settings.clone();

    // --- CORS Configuration ---
    let allowed_origins: Vec<HeaderValue> = settings
        .api
        .allowed_origins
        .iter()
        .filter_map(|s| match s.parse() {
            Ok(hv) => Some(hv),
            Err(e) => {
                error!("Invalid CORS origin configured: {} - Error: {}", s, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(allowed_origins)
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            header::USER_AGENT,
            header::CACHE_CONTROL,
            header::PRAGMA,
        ]);

    // Originals and thumbnails never change once written.
    let cache_layer = SetResponseHeaderLayer::if_not_present(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );
    let images =
        get_service(ServeDir::new(&settings.ingest.media_folder)).layer(cache_layer.clone());
    let thumbnails =
        get_service(ServeDir::new(&settings.ingest.thumbnail_folder)).layer(cache_layer);

    create_router(api_state)
        .nest_service("/images", images)
        .nest_service("/thumbnails", thumbnails)
        .layer(TraceLayer::new_for_http().on_request(()))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(SetSensitiveRequestHeadersLayer::new(once(
            header::AUTHORIZATION,
        )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("🛑 Shutdown signal received.");
}

pub async fn serve(settings: AppSettings) -> Result<()> {
    // --- Server Startup ---
    info!("🚀 Initializing server...");
    let api_state = build_context(settings.clone()).await?;
    let scheduler = api_state.scheduler.clone();
    let app = create_app(api_state);

    let addr: SocketAddr = format!("{}:{}", settings.api.host, settings.api.port)
        .parse()
        .map_err(|e| eyre!("Invalid address: {}", e))?;
    let listener = TcpListener::bind(addr).await?;

    info!("🐸 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Waiting for the ingestion worker to finish...");
    scheduler.shutdown().await;
    Ok(())
}

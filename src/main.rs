// Harare Traffic Watch server with embedded frontend
// Live traffic map plus real-time commute times for fixed routes out of the CBD

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;

mod board;
mod cli;
mod config;
mod distance_matrix;
mod error;
mod fetcher;
mod logging;
mod map_surface;
mod traffic_models;

use board::{RouteBoard, Session};
use cli::{Cli, Command};
use config::Config;
use distance_matrix::{DistanceMatrixProvider, GoogleDistanceMatrix};
use error::{Error, Result};
use fetcher::{FetchOutcome, QueryOptions};
use map_surface::MapSurface;
use traffic_models::RouteStatus;

// Embed static files at compile time
const TRAFFIC_JS: &str = include_str!("../static/traffic-watch.js");

#[derive(Clone)]
struct AppState {
    board: Arc<RouteBoard>,
    map: Arc<MapSurface>,
    provider: Option<Arc<dyn DistanceMatrixProvider>>,
    options: QueryOptions,
}

impl AppState {
    fn from_config(config: &Config) -> Result<Self> {
        let provider: Option<Arc<dyn DistanceMatrixProvider>> = match &config.map.api_key {
            Some(key) if config.has_api_key() => Some(Arc::new(GoogleDistanceMatrix::new(
                key.clone(),
                config.request_timeout(),
            )?)),
            _ => None,
        };

        Ok(AppState {
            board: Arc::new(RouteBoard::new(
                config.route_descriptors(),
                config.commute.placeholder.clone(),
            )),
            map: Arc::new(config.map_surface()),
            provider,
            options: config.query_options(),
        })
    }

    /// Fire-and-forget ETA fetches for `session`.
    fn start_fetches(&self, session: &Arc<Session>) {
        match &self.provider {
            Some(provider) => {
                fetcher::spawn_fetches(
                    session,
                    self.board.descriptors(),
                    Arc::clone(provider),
                    self.options,
                );
            }
            None => tracing::warn!(
                generation = session.generation(),
                "no map credential configured, commute times stay on Checking"
            ),
        }
    }
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            timestamp: traffic_models::get_current_timestamp(),
        }
    }

    fn error(message: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: traffic_models::get_current_timestamp(),
        }
    }
}

// ============================================================================
// Frontend Routes
// ============================================================================

async fn serve_index(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(state.map.render_page())
}

async fn serve_js() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/javascript; charset=utf-8")
        .body(TRAFFIC_JS)
}

// ============================================================================
// API Endpoints
// ============================================================================

async fn get_commutes(state: web::Data<AppState>) -> HttpResponse {
    let view = state.board.session().to_view();
    tracing::debug!(
        generation = view.generation,
        pending = view.pending,
        "commutes requested"
    );
    HttpResponse::Ok().json(ApiResponse::success(view))
}

async fn get_commute_by_id(state: web::Data<AppState>, path: web::Path<u32>) -> HttpResponse {
    let id = path.into_inner();

    match state.board.session().row(id) {
        Some(row) => HttpResponse::Ok().json(ApiResponse::success(RouteStatus::clone(&row))),
        None => {
            tracing::debug!(id, "commute route not found");
            HttpResponse::NotFound().json(ApiResponse::<RouteStatus>::error(format!(
                "Route '{}' not found",
                id
            )))
        }
    }
}

async fn get_map(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(state.map.view()))
}

async fn reload_commutes(state: web::Data<AppState>) -> HttpResponse {
    let session = state.board.reload();
    tracing::info!(generation = session.generation(), "commute board reloaded");
    state.start_fetches(&session);
    HttpResponse::Ok().json(ApiResponse::success(session.to_view()))
}

async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let session = state.board.session();
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Harare Traffic Watch",
        "version": env!("CARGO_PKG_VERSION"),
        "map": state.map.load_state(),
        "routes": state.board.descriptors().len(),
        "pending": session.pending(),
        "generation": session.generation(),
        "timestamp": traffic_models::get_current_timestamp(),
    }))
}

fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Frontend routes
        .route("/", web::get().to(serve_index))
        .route("/traffic-watch.js", web::get().to(serve_js))
        // Health check
        .route("/health", web::get().to(health_check))
        // API routes
        .service(
            web::scope("/api")
                .route("/map", web::get().to(get_map))
                .route("/commutes", web::get().to(get_commutes))
                .route("/commutes/reload", web::post().to(reload_commutes))
                .route("/commutes/{id}", web::get().to(get_commute_by_id)),
        );
}

// ============================================================================
// Server Setup
// ============================================================================

async fn run_server(config: Config) -> Result<()> {
    let app_state = AppState::from_config(&config)?;

    // Initial fetch for the first session
    app_state.start_fetches(&app_state.board.session());

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        routes = app_state.board.descriptors().len(),
        map = ?app_state.map.load_state(),
        "starting Harare Traffic Watch"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(Cors::permissive())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(configure_routes)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}

/// One round of ETA fetches, printed as a table.
async fn run_check(config: Config) -> Result<()> {
    let state = AppState::from_config(&config)?;
    let Some(provider) = state.provider.clone() else {
        return Err(Error::invalid_config(
            "map.api_key is required to fetch commute times",
        ));
    };

    let session = state.board.session();
    let handles = fetcher::spawn_fetches(
        &session,
        state.board.descriptors(),
        provider,
        state.options,
    );

    let mut updated = 0;
    for handle in handles {
        match handle.await {
            Ok(FetchOutcome::Updated) => updated += 1,
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "ETA task failed"),
        }
    }

    for row in session.snapshot().iter() {
        println!("{:<40} {:<10} {}", row.route, row.status, row.time);
    }
    println!(
        "\n{}/{} routes real-time at {}",
        updated,
        session.snapshot().len(),
        traffic_models::format_timestamp_full(traffic_models::get_current_timestamp())
    );

    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone())?;

    match cli.command() {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;
            actix_web::rt::System::new().block_on(run_server(config))?;
        }
        Command::Check => {
            actix_web::rt::System::new().block_on(run_check(config))?;
        }
    }

    Ok(())
}

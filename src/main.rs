// Live transit map server
// Mounts the live map engine behind a small JSON API: pick a mode, pick a
// route, read back the layers the map surface is showing.

use actix_cors::Cors;
use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use livemap::surface::{MapView, SceneSurface};
use livemap::{
    LiveMapConfig, LiveMapError, LiveMapHandle, SelectionController, SelectionError,
    TransitApiClient, TransitMode,
};

#[derive(Clone)]
struct AppState {
    map: LiveMapHandle,
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
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    fn error(message: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn controller_error(e: LiveMapError) -> HttpResponse {
    match e {
        LiveMapError::Selection(e @ SelectionError::ModeNotSelected) => {
            HttpResponse::Conflict().json(ApiResponse::<String>::error(e.to_string()))
        }
        LiveMapError::ControllerGone => {
            tracing::error!("live map controller is gone");
            HttpResponse::ServiceUnavailable().json(ApiResponse::<String>::error(e.to_string()))
        }
    }
}

// ============================================================================
// Selection Inputs
// ============================================================================

#[derive(Serialize)]
struct ModeOption {
    mode: TransitMode,
    label: &'static str,
}

#[derive(Deserialize)]
struct ModeRequest {
    mode: Option<TransitMode>,
}

#[derive(Deserialize)]
struct RouteRequest {
    route_id: Option<String>,
}

#[derive(Serialize)]
struct RouteOption {
    id: String,
    label: String,
}

#[derive(Serialize)]
struct RouteSelector {
    enabled: bool,
    routes: Vec<RouteOption>,
}

async fn get_modes() -> HttpResponse {
    let modes: Vec<_> = TransitMode::ALL
        .into_iter()
        .map(|mode| ModeOption {
            mode,
            label: mode.label(),
        })
        .collect();
    HttpResponse::Ok().json(ApiResponse::success(modes))
}

async fn get_selection(state: web::Data<AppState>) -> HttpResponse {
    match state.map.snapshot().await {
        Ok(snapshot) => HttpResponse::Ok().json(ApiResponse::success(snapshot.selection)),
        Err(e) => controller_error(e),
    }
}

async fn set_mode(state: web::Data<AppState>, body: web::Json<ModeRequest>) -> HttpResponse {
    let mode = body.into_inner().mode;
    match state.map.set_mode(mode).await {
        Ok(()) => {
            tracing::info!(?mode, "mode changed");
            HttpResponse::Ok().json(ApiResponse::success(mode))
        }
        Err(e) => controller_error(e),
    }
}

async fn get_routes(state: web::Data<AppState>) -> HttpResponse {
    match state.map.snapshot().await {
        Ok(snapshot) => {
            let selector = RouteSelector {
                enabled: snapshot.route_selector_enabled,
                routes: snapshot
                    .routes
                    .into_iter()
                    .map(|route| RouteOption {
                        id: route.id,
                        label: route.display_name,
                    })
                    .collect(),
            };
            HttpResponse::Ok().json(ApiResponse::success(selector))
        }
        Err(e) => controller_error(e),
    }
}

async fn set_route(state: web::Data<AppState>, body: web::Json<RouteRequest>) -> HttpResponse {
    let route_id = body.into_inner().route_id.filter(|id| !id.is_empty());
    match state.map.set_route(route_id.clone()).await {
        Ok(()) => {
            tracing::info!(?route_id, "route changed");
            HttpResponse::Ok().json(ApiResponse::success(route_id))
        }
        Err(e) => controller_error(e),
    }
}

async fn get_layers(state: web::Data<AppState>) -> HttpResponse {
    match state.map.snapshot().await {
        Ok(snapshot) => HttpResponse::Ok().json(ApiResponse::success(snapshot)),
        Err(e) => controller_error(e),
    }
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "Live Transit Map",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

// ============================================================================
// Server Setup
// ============================================================================

async fn run_server(config: LiveMapConfig) -> std::io::Result<()> {
    let provider = TransitApiClient::new(config.base_url.clone(), config.request_timeout)
        .map_err(std::io::Error::other)?;

    let controller = SelectionController::new(
        provider,
        SceneSurface::new(MapView::default()),
        config.poll_interval,
    );
    let app_state = AppState {
        map: controller.spawn(),
    };

    tracing::info!("🚀 live map server on http://{}", config.bind);
    tracing::info!("📡 transit provider: {}", config.base_url);
    tracing::info!("🔄 vehicle refresh every {:?}", config.poll_interval);

    let shutdown_handle = app_state.map.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .route("/health", web::get().to(health_check))
            .service(
                web::scope("/api/livemap")
                    .route("/modes", web::get().to(get_modes))
                    .route("/selection", web::get().to(get_selection))
                    .route("/mode", web::put().to(set_mode))
                    .route("/routes", web::get().to(get_routes))
                    .route("/route", web::put().to(set_route))
                    .route("/layers", web::get().to(get_layers)),
            )
    })
    .bind(config.bind.as_str())?
    .run()
    .await;

    // Releases the poll timer before the runtime goes away.
    if shutdown_handle.shutdown().await.is_err() {
        tracing::warn!("live map controller already stopped");
    }
    server
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match LiveMapConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    actix_web::rt::System::new().block_on(run_server(config))
}

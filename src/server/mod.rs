pub mod error;
pub mod pages;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_files::Files;
use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use tracing::{info, warn};

use crate::system::store::SnapshotStore;

/// Register the stats routes. Both paths return the same payload.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/stats", web::get().to(pages::stats))
        .route("/api.json", web::get().to(pages::stats));
}

/// API routes, then the dashboard files when there are any. Static files
/// go last so the API routes match first.
pub fn configure_routes(cfg: &mut web::ServiceConfig, assets_dir: Option<&Path>) {
    configure_api_routes(cfg);
    if let Some(dir) = assets_dir {
        cfg.service(Files::new("/", dir).index_file("index.html"));
    }
}

pub fn resolve_assets_dir(assets_dir: &Path) -> Option<PathBuf> {
    if assets_dir.is_dir() {
        Some(assets_dir.to_path_buf())
    } else {
        warn!(
            "Assets directory {} not found, serving API only",
            assets_dir.display()
        );
        None
    }
}

/// Bind the stats API and dashboard. Binding failure is returned to the
/// caller; the returned server runs when awaited.
pub fn bind(address: &str, store: Arc<SnapshotStore>, assets_dir: &Path) -> std::io::Result<Server> {
    let store = web::Data::from(store);
    let assets_dir = resolve_assets_dir(assets_dir);

    let server = HttpServer::new(move || {
        let assets_dir = assets_dir.clone();
        App::new()
            .app_data(store.clone())
            .configure(move |cfg| configure_routes(cfg, assets_dir.as_deref()))
    })
    .bind(address)?;

    info!("Starting server on http://{address}");
    Ok(server.run())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};

    use super::*;

    fn shipped_assets() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")
    }

    #[actix_web::test]
    async fn root_serves_dashboard_when_assets_exist() {
        let store = web::Data::from(Arc::new(SnapshotStore::new()));
        let dir = shipped_assets();
        let app = test::init_service(
            App::new()
                .app_data(store)
                .configure(|cfg| configure_routes(cfg, Some(dir.as_path()))),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("<title>vmpulse</title>"));
        assert!(html.contains("script.js"));

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/script.js").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        let script = String::from_utf8_lossy(&body);
        assert!(script.contains("cpu_usage_percent"));
        assert!(script.contains("network_in_rate_bytes_per_sec"));
        assert!(script.contains("disk_filesystem_type"));
    }

    #[actix_web::test]
    async fn api_routes_take_precedence_over_assets() {
        let store = web::Data::from(Arc::new(SnapshotStore::new()));
        let dir = shipped_assets();
        let app = test::init_service(
            App::new()
                .app_data(store)
                .configure(|cfg| configure_routes(cfg, Some(dir.as_path()))),
        )
        .await;

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/api/stats").to_request())
                .await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_web::test]
    async fn root_is_not_found_without_assets() {
        let store = web::Data::from(Arc::new(SnapshotStore::new()));
        let app = test::init_service(
            App::new()
                .app_data(store)
                .configure(|cfg| configure_routes(cfg, None)),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[::core::prelude::v1::test]
    fn missing_assets_dir_resolves_to_none() {
        assert!(resolve_assets_dir(Path::new("/nonexistent/vmpulse/assets")).is_none());
        assert_eq!(resolve_assets_dir(&shipped_assets()), Some(shipped_assets()));
    }
}

use anyhow::Result;
use ibovscraper::{
    config::{ScrapeConfig, SinkTarget},
    error::RunError,
    response::{InvocationResponse, DEFAULT_SAMPLE_ROWS},
    scrape,
    store::open_sink,
};
use std::{convert::Infallible, env, sync::Arc};
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};
use warp::{http::StatusCode, reply::Reply, Filter};

struct Service {
    config: ScrapeConfig,
    target: SinkTarget,
    sample_rows: usize,
}

async fn health_check() -> Result<impl Reply, Infallible> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "ibov-composition-scraper"
    })))
}

async fn handle_scrape(service: Arc<Service>) -> Result<impl Reply, Infallible> {
    info!(url = %service.config.url, target = ?service.target, "scrape requested");

    let outcome = match open_sink(&service.target).await {
        Ok(sink) => scrape::run(&service.config, sink.as_ref()).await,
        Err(e) => Err(RunError::Persist(e)),
    };
    if let Err(e) = &outcome {
        warn!("run failed: {}", e);
    }

    let response = InvocationResponse::from_outcome(&outcome, service.sample_rows);
    let status = StatusCode::from_u16(response.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok(warp::reply::with_status(
        warp::reply::json(&response),
        status,
    ))
}

fn with_service(
    service: Arc<Service>,
) -> impl Filter<Extract = (Arc<Service>,), Error = Infallible> + Clone {
    warp::any().map(move || Arc::clone(&service))
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    info!("Starting IBOV composition scraper service");

    let sample_rows = env::var("SAMPLE_ROWS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_ROWS);
    let service = Arc::new(Service {
        config: ScrapeConfig::from_env()?,
        target: SinkTarget::from_env(),
        sample_rows,
    });

    let health = warp::path("health").and(warp::get()).and_then(health_check);
    let scrape = warp::path("scrape")
        .and(warp::post())
        .and(with_service(service))
        .and_then(handle_scrape);
    let routes = health.or(scrape);

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    info!("Server starting on port {}", port);
    info!("Health check: http://localhost:{}/health", port);
    info!("Scrape endpoint: POST http://localhost:{}/scrape", port);

    warp::serve(routes).run(([0, 0, 0, 0], port)).await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let result = health_check().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_health_route() {
        let health = warp::path("health").and(warp::get()).and_then(health_check);
        let res = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&health)
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(String::from_utf8_lossy(res.body()).contains("healthy"));
    }
}

// actix-web server for the rankings API

use crate::api::{middleware, routes, AppState};
use crate::util::env::{env_opt, env_parse};
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub allowed_origins: String,
    /// 0 keeps actix's default (one per core).
    pub workers: usize,
}

impl ApiServer {
    /// `API_HOST`, `API_PORT` (or `PORT`), `ALLOWED_ORIGINS`, `API_WORKERS`
    pub fn from_env() -> Result<Self> {
        let host = env_opt("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match env_opt("API_PORT").or_else(|| env_opt("PORT")) {
            Some(raw) => raw.trim().parse().context("Invalid API_PORT")?,
            None => 3001,
        };
        let allowed_origins = env_opt("ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());
        let workers: usize = env_parse("API_WORKERS", 0);

        Ok(Self {
            host,
            port,
            allowed_origins,
            workers,
        })
    }

    /// Bind and serve until shutdown.
    pub async fn run(self, state: AppState) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(
            host = %self.host,
            port = %self.port,
            api = "/api/rankings/{region}/{serviceType}/{year}/{month}",
            "Starting rankings API server"
        );

        let state = web::Data::new(state);
        let allowed_origins = self.allowed_origins.clone();

        let mut server = HttpServer::new(move || {
            let (logger, compress) = middleware::setup_middleware();
            let cors = middleware::setup_cors(&allowed_origins);

            App::new()
                .app_data(state.clone())
                .wrap(logger)
                .wrap(compress)
                .wrap(cors)
                .configure(routes::configure_routes)
        });
        if self.workers > 0 {
            server = server.workers(self.workers);
        }

        server
            .bind(&bind_addr)
            .with_context(|| format!("Failed to bind to {}", bind_addr))?
            .run()
            .await
            .context("HTTP server error")?;

        Ok(())
    }
}

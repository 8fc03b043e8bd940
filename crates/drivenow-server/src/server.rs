use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use drivenow_auth::{
    AccountStorage, AuditRecorder, AuditSink, AuditStorage, AuthConfig, Authenticator,
    CodeDelivery, LogDelivery, OtpStore, Registrar,
};
use drivenow_core::BookingStorage;
use drivenow_db_memory::InMemoryBackend;
use drivenow_db_postgres::PostgresBackend;

use crate::config::{AppConfig, StorageBackend, StorageConfig};
use crate::{admin, bootstrap, handlers, middleware as app_middleware};

// =============================================================================
// Storage
// =============================================================================

/// The storage handles every service is built from.
#[derive(Clone)]
pub struct Storage {
    pub accounts: Arc<dyn AccountStorage>,
    pub audit: Arc<dyn AuditStorage>,
    pub bookings: Arc<dyn BookingStorage>,
}

impl Storage {
    pub fn in_memory() -> Self {
        let backend = InMemoryBackend::new();
        Self {
            accounts: backend.accounts,
            audit: backend.audit,
            bookings: backend.bookings,
        }
    }

    /// Opens the configured backend. Postgres tables are created if missing.
    pub async fn from_config(cfg: &StorageConfig) -> anyhow::Result<Self> {
        match cfg.backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage, data will not survive a restart");
                Ok(Self::in_memory())
            }
            StorageBackend::Postgres => {
                let url = cfg.postgres.connection_url();
                let backend = PostgresBackend::connect(&url, cfg.postgres.pool_size).await?;
                backend.ensure_schema().await?;
                Ok(Self {
                    accounts: Arc::new(backend.accounts()),
                    audit: Arc::new(backend.audit()),
                    bookings: Arc::new(backend.bookings()),
                })
            }
        }
    }
}

// =============================================================================
// Application State
// =============================================================================

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub registrar: Arc<Registrar>,
    pub audit: AuditSink,
    pub codes: Arc<OtpStore>,
    pub accounts: Arc<dyn AccountStorage>,
    pub bookings: Arc<dyn BookingStorage>,
    pub auth_config: Arc<AuthConfig>,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wires the services over `storage` and starts the audit writer task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(storage: Storage, cfg: &AppConfig) -> Self {
        Self::with_delivery(storage, cfg, Arc::new(LogDelivery))
    }

    pub fn with_delivery(
        storage: Storage,
        cfg: &AppConfig,
        delivery: Arc<dyn CodeDelivery>,
    ) -> Self {
        let audit = AuditSink::spawn(storage.audit, cfg.auth.audit_queue_capacity);
        let recorder: Arc<dyn AuditRecorder> = Arc::new(audit.clone());
        let codes = Arc::new(OtpStore::new(cfg.auth.otp_ttl));

        let authenticator = Authenticator::new(storage.accounts.clone(), recorder.clone());
        let registrar = Registrar::new(
            storage.accounts.clone(),
            recorder,
            codes.clone(),
            delivery,
            &cfg.auth,
        );

        Self {
            authenticator: Arc::new(authenticator),
            registrar: Arc::new(registrar),
            audit,
            codes,
            accounts: storage.accounts,
            bookings: storage.bookings,
            auth_config: Arc::new(cfg.auth.clone()),
            admin_token: cfg.admin.token.as_deref().map(Arc::from),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

pub fn build_app(state: AppState, cfg: &AppConfig) -> Router {
    let body_limit = cfg.server.body_limit_bytes;
    Router::new()
        .route("/healthz", get(handlers::healthz))
        // Accounts
        .route("/send-otp", post(handlers::auth::send_otp))
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/reset-password", post(handlers::auth::reset_password))
        // Bookings
        .route("/booking", post(handlers::booking::create_booking))
        .route(
            "/booking-details/{id}",
            get(handlers::booking::booking_details),
        )
        .route(
            "/bookings/{id}/status",
            put(handlers::booking::update_booking_status),
        )
        .nest("/admin", admin::router(state.clone()))
        // Middleware stack (order: request id -> compression/cors/trace -> body limit)
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

// =============================================================================
// Server
// =============================================================================

pub struct DriveNowServer {
    addr: SocketAddr,
    app: Router,
    audit: AuditSink,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Opens storage, seeds the bootstrap admin and assembles the router.
    pub async fn build(self) -> anyhow::Result<DriveNowServer> {
        let storage = Storage::from_config(&self.config.storage).await?;
        tracing::info!(backend = %self.config.storage.backend, "Storage ready");

        if let Some(admin) = &self.config.bootstrap.admin_user {
            bootstrap::ensure_admin_user(storage.accounts.as_ref(), admin).await?;
        }

        if self.config.admin.token.is_none() {
            tracing::warn!("admin.token is not set, the /admin API is disabled");
        }

        let state = AppState::new(storage, &self.config);
        let audit = state.audit.clone();
        let app = build_app(state, &self.config);

        Ok(DriveNowServer {
            addr: self.addr,
            app,
            audit,
        })
    }
}

impl DriveNowServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        // Drain audit events queued by the last requests
        self.audit.flush().await;
        tracing::info!("audit queue drained");
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

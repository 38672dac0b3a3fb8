pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod stripe;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;

use application::order_service::OrderService;
use domain::token::TokenSigner;
use infrastructure::order_repo::DieselOrderRepository;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

/// Concrete service type wired into the HTTP handlers.
pub type Service = OrderService<DieselOrderRepository>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) {
    let mut conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.run_pending_migrations(MIGRATIONS)
        .expect("Failed to run database migrations");
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::orders::create_order,
        handlers::orders::get_order,
        handlers::staff::list_orders,
        handlers::staff::update_status,
        handlers::staff::scan_pickup,
    ),
    components(schemas(
        handlers::orders::CreateOrderRequest,
        handlers::orders::CreateOrderLineRequest,
        handlers::orders::CreateOrderResponse,
        handlers::orders::OrderResponse,
        handlers::orders::OrderLineResponse,
        handlers::staff::ListOrdersResponse,
        handlers::staff::UpdateStatusRequest,
        handlers::staff::PickupScanRequest,
        handlers::staff::PickupScanResponse,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> web::Json<utoipa::openapi::OpenApi> {
    web::Json(ApiDoc::openapi())
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: AppConfig,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let signer = TokenSigner::new(&config.pickup_signing_key);
    let service = web::Data::new(OrderService::new(
        DieselOrderRepository::new(pool),
        signer,
    ));
    let config = web::Data::new(config);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(config.clone())
            .wrap(Logger::default())
            .route("/api-docs/openapi.json", web::get().to(openapi_json))
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("/{id}", web::get().to(handlers::orders::get_order)),
            )
            .service(
                web::resource("/webhooks/stripe")
                    .route(web::post().to(handlers::webhook::stripe_webhook)),
            )
            .service(
                web::scope("/staff")
                    .route("/orders", web::get().to(handlers::staff::list_orders))
                    .route(
                        "/orders/{id}/status",
                        web::post().to(handlers::staff::update_status),
                    )
                    .route("/pickup", web::post().to(handlers::staff::scan_pickup)),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}

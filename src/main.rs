//! Photo Platform Server
//!
//! HTTP server entrypoint: loads configuration, connects to the database,
//! runs migrations, wires the services, and serves the API.

use std::sync::Arc;

use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use photo_platform::{
    api::{create_routes, AppState},
    config::AppConfig,
    database::create_pool,
    service::{
        CartService, FaceService, JwtService, PaymentGateway, PhotoService, StorageService,
        TransactionService, UserService,
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    // Initialize structured logging
    env_logger::init();

    log::info!("🚀 Starting Photo Platform v{}", photo_platform::VERSION);

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!("✅ Configuration loaded and validated");

    let database_pool = create_pool(&config.database).await?;

    // Run database migrations
    log::info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&database_pool).await?;
    log::info!("✅ Database migrations completed");

    // Initialize services
    let storage = Arc::new(StorageService::from_config(&config.storage).await);
    let gateway = PaymentGateway::new(&config.payment);

    let jwt_service = Arc::new(JwtService::new(database_pool.clone(), &config.jwt));

    // Drop refresh sessions that expired while the service was down
    let removed_sessions = jwt_service.cleanup_expired_sessions().await?;
    if removed_sessions > 0 {
        log::info!("🧹 Removed {} expired auth sessions", removed_sessions);
    }

    let user_service = Arc::new(UserService::new(database_pool.clone(), storage.clone()));
    let photo_service = Arc::new(PhotoService::new(database_pool.clone(), storage.clone()));
    let face_service = Arc::new(FaceService::new(database_pool.clone()));
    let cart_service = Arc::new(CartService::new(database_pool.clone(), storage.clone()));
    let transaction_service = Arc::new(TransactionService::new(database_pool.clone(), gateway));

    log::info!("✅ Services initialized");
    log::info!("   - User service (accounts, withdrawals, follows)");
    log::info!("   - Photo service (listings, object storage)");
    log::info!("   - Face service (descriptor matching)");
    log::info!("   - Cart service");
    log::info!("   - Transaction service (QRIS checkout)");

    let app_state = AppState {
        app_title: config.title.clone(),
        app_summary: config.summary.clone(),
        user_service,
        photo_service,
        face_service,
        cart_service,
        transaction_service,
        jwt_service,
    };

    let app = create_routes(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .into_inner(),
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    log::info!("🌐 Starting server on {}", bind_addr);

    log::info!("📋 API Endpoints:");
    log::info!("   GET  /health - Health check");
    log::info!("   /api/user - Registration, auth, profiles, accounts, withdrawals, follows");
    log::info!("   /api/photo - Sell-photo listings");
    log::info!("   /api/face - Face descriptors and matching");
    log::info!("   /api/cart - Shopping cart");
    log::info!("   /api/transaction - Checkout and payment notifications");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("✅ Server listening and ready for requests");
    axum::serve(listener, app).await?;

    Ok(())
}

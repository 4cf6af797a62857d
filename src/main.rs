use actix_web::{middleware, web, App, HttpServer};
use bookshop::api::{self, proxy::ProxyClient};
use bookshop::auth::TokenSigner;
use bookshop::config::Config;
use bookshop::db::Database;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let dotenv = dotenvy::dotenv();
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    // Load configuration
    let config = Config::load();
    info!("Starting with {config:?}");

    // Initialize the store
    let db = Database::new(&config.data_dir, config.bcrypt_cost);
    db.init().await.map_err(std::io::Error::other)?;
    info!("Data directory ready at {}", db.dir().display());

    let db = web::Data::new(db);
    let signer = web::Data::new(TokenSigner::new(config.token_secret.clone(), config.token_ttl));
    let proxy = web::Data::new(
        ProxyClient::new(&config.base_url, config.proxy_timeout).map_err(std::io::Error::other)?,
    );

    let addr = config.bind_address();
    info!("listening on http://{addr}");

    // Start the Actix Web server
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(middleware::NormalizePath::trim())
            .app_data(db.clone())
            .app_data(signer.clone())
            .app_data(proxy.clone())
            .configure(api::configure)
    })
    .bind(&addr)?
    .run()
    .await
}

use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info, warn};
use sqlx::postgres::PgPoolOptions;

use taskshare::{
    auth::SessionMiddleware,
    config::Config,
    routes,
    store::{PgStore, Store},
    AppState,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            let pg = PgStore::new(pool.clone());
            if let Err(e) = pg.migrate().await {
                error!("{}", e);
                std::process::exit(1);
            }
            Store::postgres(pool)
        }
        None => {
            warn!("DATABASE_URL not set; using the in-memory store, data will not persist");
            Store::memory()
        }
    };

    let state = web::Data::new(AppState::from_config(store, &config));
    info!(
        "Starting taskshare at {} (mutation policy: {})",
        config.server_url(),
        config.mutation_policy
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(SessionMiddleware)
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

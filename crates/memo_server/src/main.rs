use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;
use memo_server::{AppState, Config};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    memo_core::init_logging(&config.log_level, config.log_dir.as_deref())?;

    let state = web::Data::new(AppState::open(&config)?);
    info!(
        "event=server_start module=server status=ok host={} port={} db_path={} pool_size={}",
        config.host,
        config.port,
        config.db_path.display(),
        config.pool_size
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(state.clone())
            .configure(memo_server::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

use std::{error::Error, net::SocketAddr};

use axum_server::tls_rustls::RustlsConfig;
use clap::{Parser, Subcommand};
use reservation::{infrastructure::SqliteStore, ReservationConfig};
use reservation_web::{router, AppState};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "reservation", version, about = "Reservation booking service")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Serve the HTTP API
    Serve,
    /// Create the person and reservation tables
    InitDb,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match ReservationConfig::load() {
        Ok(config) => {
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::from(&config.log_level()))
                .init();
            if let Err(error) = run(cli.command.unwrap_or(Command::Serve), &config).await {
                error!("アプリケーションエラー: {}", error);
                std::process::exit(1);
            }
        }
        Err(error) => {
            tracing_subscriber::fmt::init();
            error!("設定の読み込みに失敗しました: {}", error);
            std::process::exit(1);
        }
    }
}

async fn run(command: Command, config: &ReservationConfig) -> Result<(), Box<dyn Error>> {
    let store =
        SqliteStore::connect(config.database_url(), config.database.max_connections).await?;
    match command {
        Command::InitDb => {
            store.init_schema().await?;
            println!("Database created!");
        }
        Command::Serve => serve(config, &store).await?,
    }
    store.close().await;
    Ok(())
}

async fn serve(config: &ReservationConfig, store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    let addr: SocketAddr = config.server.addr.parse()?;
    let app = router(AppState::new(store));
    match &config.server.tls {
        Some(tls) => {
            let rustls = RustlsConfig::from_pem_file(&tls.cert, &tls.key).await?;
            info!("HTTPS で待ち受けます: {}", addr);
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await?;
        }
        None => {
            info!("HTTP で待ち受けます: {}", addr);
            axum_server::bind(addr)
                .serve(app.into_make_service())
                .await?;
        }
    }
    Ok(())
}

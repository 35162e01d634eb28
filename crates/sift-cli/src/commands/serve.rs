//! Server command implementation

use anyhow::Result;
use sift_core::Config;

use super::open_db;

pub async fn cmd_serve(config: Config, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Sift web server...");
    println!("   Database: {}", config.database_path);
    println!("   Models:   {}", config.model_dir.display());
    println!("   Listening: http://{}:{}", host, port);

    // Comma-separated list of allowed CORS origins
    let allowed_origins: Vec<String> = std::env::var("SIFT_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if !allowed_origins.is_empty() {
        println!("   🌐 CORS origins: {}", allowed_origins.join(", "));
    }

    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(&config)?;
    let server = sift_server::ServerConfig { allowed_origins };
    let state = sift_server::AppState::new(db, config, server);
    sift_server::serve(state, host, port).await?;

    Ok(())
}

use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Instant;

mod ai;
mod channels;
mod commands;
mod config;
mod controllers;
mod db;
mod models;
mod tools;

#[cfg(test)]
mod test_support;

use ai::factory::AgentOptions;
use ai::graph::InMemoryCheckpointer;
use channels::{DiscordStatus, MessageDispatcher};
use config::Config;
use db::Database;
use tools::Tool;

pub struct AppState {
    pub discord: Arc<DiscordStatus>,
    pub started_at: Instant,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e));
        }
    };
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize database: {}", e)))?;
    let db = Arc::new(db);

    log::info!(
        "Initializing LLM client ({} at {})",
        config.llm.model,
        config.llm.endpoint
    );
    let llm = ai::create_llm(&config.llm)
        .map_err(|e| std::io::Error::other(format!("Failed to create LLM client: {}", e)))?;

    let mut extra_tools: Vec<Arc<dyn Tool>> = Vec::new();
    match config.search.clone() {
        Some(search) => extra_tools.push(Arc::new(tools::builtin::GoogleSearchTool::new(search))),
        None => log::warn!("Google search credentials not set; google_search is disabled"),
    }

    let options = AgentOptions {
        checkpointer: Arc::new(InMemoryCheckpointer::new()),
        output_mode: config.output_mode,
        max_steps: config.max_steps,
    };
    log::info!(
        "Agent output mode {}, step budget {}",
        config.output_mode,
        config.max_steps
    );

    let dispatcher = Arc::new(
        MessageDispatcher::new(db.clone(), llm, options)
            .with_extra_tools(extra_tools)
            .with_prefix(config.command_prefix.clone()),
    );

    let discord_status = Arc::new(DiscordStatus::new());
    let (discord_shutdown_tx, discord_shutdown_rx) = tokio::sync::oneshot::channel();
    let listener_status = discord_status.clone();
    let token = config.discord_token.clone();
    tokio::spawn(async move {
        if let Err(e) = channels::discord::start_discord_listener(
            token,
            dispatcher,
            listener_status,
            discord_shutdown_rx,
        )
        .await
        {
            log::error!("Discord listener error: {}", e);
        }
    });

    log::info!("Starting Parley server on port {}", port);

    let started_at = Instant::now();
    let status = discord_status.clone();
    let result = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(AppState {
                discord: Arc::clone(&status),
                started_at,
            }))
            .wrap(Logger::default())
            .configure(controllers::health::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await;

    log::info!("Shutting down Discord listener");
    let _ = discord_shutdown_tx.send(());
    result
}

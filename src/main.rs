use anyhow::Result;
use clap::Parser;

mod app;
mod backend;
mod config;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use backend::RagClient;
use config::Config;

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version)]
#[command(about = "Chat with your ingested documents through a RAG backend")]
struct Cli {
    /// Backend base URL (overrides RAG_API_URL and the config file)
    #[arg(short, long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init()?;

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("could not read config, using defaults: {err:#}");
        Config::new()
    });

    let base_url = cli
        .backend
        .or_else(|| std::env::var("RAG_API_URL").ok())
        .or_else(|| config.backend_url.clone())
        .unwrap_or_else(|| backend::DEFAULT_BASE_URL.to_string());

    tracing::info!("starting ragchat against {base_url}");

    let client = RagClient::new(&base_url);
    let mut app = App::new(client);
    app.start_document_fetch();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = tui::EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }

        app.poll_tasks().await;
    }

    Ok(())
}

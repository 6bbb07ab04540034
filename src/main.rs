// privesc-sentinel — real-time privilege-escalation and lateral-movement detection over
// authentication telemetry.
//
// Three operational modes:
//   listen  — run the TCP ingest listener
//   replay  — replay a JSONL fixture file through the dispatcher, printing fired alerts
//   demo    — run the bundled crowdstrike/unix_auth adapters through the dispatcher once

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use privesc_sentinel::config::{self, AppConfig};
use privesc_sentinel::dispatcher::Dispatcher;
use privesc_sentinel::enrichment::EnrichmentManager;
use privesc_sentinel::events::{self, AuthEvent};
use privesc_sentinel::graph::build_graph;
use privesc_sentinel::ingest;
use privesc_sentinel::server;
use privesc_sentinel::store::{MemoryStore, Store};

#[derive(Parser)]
#[command(
    name = "privesc-sentinel",
    about = "Real-time privilege-escalation and lateral-movement detector",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[arg(long, value_enum, default_value = "demo")]
    mode: Mode,

    #[arg(long, default_value = "config/thresholds.yaml")]
    config: PathBuf,

    #[arg(long, default_value = "127.0.0.1:7800", help = "Listen mode bind address")]
    addr: SocketAddr,

    #[arg(long, help = "JSONL fixture path (replay mode)")]
    path: Option<PathBuf>,

    #[arg(long, default_value_t = 1.0, help = "Replay speed multiplier (replay mode)")]
    speed: f64,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    Listen,
    Replay,
    Demo,
}

struct App {
    store: Arc<MemoryStore>,
    dispatcher: Arc<Dispatcher<MemoryStore>>,
    enrichment: Arc<EnrichmentManager>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let enrichment = Arc::new(EnrichmentManager::new(config.enrichment.clone()));
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            Arc::clone(&enrichment),
            config,
        ));
        Self {
            store,
            dispatcher,
            enrichment,
        }
    }

    async fn ingest(&self, event: AuthEvent) -> Result<Vec<events::Alert>> {
        event.validate().context("event failed validation")?;
        self.store.insert_event(event.clone()).await?;
        let all_events = self.store.all_events().await?;
        let graph = build_graph(&all_events);
        let fired = self.dispatcher.on_event_inserted(&event, &graph).await?;
        Ok(fired)
    }
}

fn print_alert(alert: &events::Alert) {
    println!(
        "[{}] {} — {}",
        alert.severity, alert.detection_type, alert.description
    );
}

/// Replays a JSONL fixture at `speed`x the gaps between its own event timestamps, so a
/// recording taken over minutes can be driven through the dispatcher in seconds.
async fn replay_jsonl(app: &App, path: &PathBuf, speed: f64) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading replay fixture {}", path.display()))?;

    let mut events: Vec<AuthEvent> = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        events.push(
            serde_json::from_str(line).with_context(|| format!("parsing replay line: {line}"))?,
        );
    }
    events.sort_by_key(|e| e.timestamp());

    let Some(base_ts) = events.first().map(|e| e.timestamp()) else {
        return Ok(());
    };
    let base_wall = tokio::time::Instant::now();

    for event in events {
        let offset_secs = (event.timestamp() - base_ts).num_milliseconds() as f64 / 1000.0 / speed;
        let target = base_wall + std::time::Duration::from_secs_f64(offset_secs.max(0.0));
        tokio::time::sleep_until(target).await;

        for alert in app.ingest(event).await? {
            print_alert(&alert);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("privesc_sentinel=info".parse()?))
        .compact()
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.exists().then_some(cli.config.as_path());
    let config = config::load_config(config_path);

    let app = Arc::new(App::new(config));
    app.store.ensure_indexes().await?;
    app.enrichment.load_sync();
    app.enrichment.start_refresh_loop();

    match cli.mode {
        Mode::Listen => {
            let srv = Arc::new(server::Server::new(
                Arc::clone(&app.store),
                Arc::clone(&app.dispatcher),
                Arc::clone(&app.enrichment),
                cli.addr,
            ));
            info!(addr = %cli.addr, "starting ingest listener");
            let result = srv.serve().await;
            app.enrichment.stop().await;
            result?;
        }
        Mode::Replay => {
            let path = cli.path.context("replay mode requires --path")?;
            replay_jsonl(&app, &path, cli.speed).await?;
            app.enrichment.stop().await;
        }
        Mode::Demo => {
            info!("running bundled ingest adapters through the dispatcher");
            let mut fired_total = 0usize;
            for event in ingest::crowdstrike::fetch_events()
                .into_iter()
                .chain(ingest::unix_auth::fetch_events())
            {
                for alert in app.ingest(event).await? {
                    fired_total += 1;
                    print_alert(&alert);
                }
            }
            println!("\n{fired_total} alert(s) fired across the demo fixture set.");
            app.enrichment.stop().await;
        }
    }

    Ok(())
}

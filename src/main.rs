use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dot_practice::playback::{SegmentResolverFactory, PRELOAD_LIMIT};
use dot_practice::speech::http_client;
use dot_practice::{
    create_router, AppState, Catalog, ClipRenderer, Config, DecodedOutput, PlaybackOrchestrator,
    PlaybackSettings, Role, SegmentResolver, SourceKind, SpeechProviderFactory, StaticClipResolver,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dot-practice", version, about = "Roadside conversation audio for driver English practice")]
struct Cli {
    /// Config file path, without extension
    #[arg(short, long, default_value = "config/dot-practice")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the clip library and the prompt API
    Serve,
    /// Play a conversation, or a single line of it
    Play {
        question_id: u32,
        /// Play only this role's line
        #[arg(long)]
        role: Option<Role>,
        /// Override the configured audio source
        #[arg(long, value_enum)]
        source: Option<SourceArg>,
        /// Fetch upcoming static clips into memory first
        #[arg(long)]
        preload: bool,
    },
    /// Check which pre-rendered clips the clip server has
    Check {
        question_ids: Vec<u32>,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Render the clip library with the configured speech provider
    Render {
        /// Output directory (defaults to audio.clips_path)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Only these conversations
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u32>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Synthesis,
    Static,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Synthesis => SourceKind::Synthesis,
            SourceArg::Static => SourceKind::Static,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("DOT Practice v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    match cli.command {
        Command::Serve => serve(&cfg).await,
        Command::Play {
            question_id,
            role,
            source,
            preload,
        } => play(cfg, question_id, role, source, preload).await,
        Command::Check { question_ids, role } => check(&cfg, question_ids, role).await,
        Command::Render { out, ids } => render(&cfg, out, ids).await,
    }
}

fn load_catalog(cfg: &Config) -> Result<Catalog> {
    match &cfg.audio.catalog_path {
        Some(path) => Catalog::from_json_file(path),
        None => Ok(Catalog::builtin()),
    }
}

fn request_timeout(cfg: &Config) -> Duration {
    Duration::from_secs(cfg.synthesis.request_timeout_secs)
}

async fn serve(cfg: &Config) -> Result<()> {
    let catalog = Arc::new(load_catalog(cfg)?);
    let state = AppState::new(cfg.service.name.clone(), catalog, &cfg.audio.clips_path);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Serving clips from {} on http://{}", cfg.audio.clips_path, addr);
    axum::serve(listener, router).await.context("HTTP server failed")?;

    Ok(())
}

async fn play(
    mut cfg: Config,
    question_id: u32,
    role: Option<Role>,
    source: Option<SourceArg>,
    preload: bool,
) -> Result<()> {
    if let Some(source) = source {
        cfg.playback.source = source.into();
    }

    let catalog = Arc::new(load_catalog(&cfg)?);
    let client = http_client(request_timeout(&cfg))?;

    let resolver: Arc<dyn SegmentResolver> = match cfg.playback.source {
        SourceKind::Static if preload => {
            let resolver = StaticClipResolver::new(client.clone(), &cfg.audio.base_url)
                .with_deadline(Duration::from_secs(cfg.playback.static_timeout_secs));
            let upcoming: Vec<u32> = catalog
                .ids()
                .into_iter()
                .filter(|id| *id >= question_id)
                .take(PRELOAD_LIMIT)
                .collect();
            resolver.preload(&upcoming).await;
            Arc::new(resolver)
        }
        kind => SegmentResolverFactory::create(kind, &cfg)?,
    };

    let orchestrator = PlaybackOrchestrator::new(
        Box::new(DecodedOutput::new(client)),
        resolver,
        catalog,
        PlaybackSettings::from(&cfg.playback),
    );

    let mut status = orchestrator.subscribe();
    tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let current = status.borrow_and_update().clone();
            debug!(
                "Session {:?} ({:?} {:?}): {:?}",
                current.session_id, current.role, current.question_id, current.state
            );
        }
    });

    match role {
        Some(role) => {
            let segment = orchestrator.segment(question_id, role)?;
            orchestrator.play_segment(&segment).await?;
        }
        None => orchestrator.play_conversation(question_id).await?,
    }

    Ok(())
}

async fn check(cfg: &Config, question_ids: Vec<u32>, role: Option<Role>) -> Result<()> {
    let client = http_client(request_timeout(cfg))?;
    let resolver = StaticClipResolver::new(client, &cfg.audio.base_url);

    let question_ids = if question_ids.is_empty() {
        load_catalog(cfg)?.ids()
    } else {
        question_ids
    };
    let roles = match role {
        Some(role) => vec![role],
        None => vec![Role::Officer, Role::Driver],
    };

    let mut missing = 0;
    for id in question_ids {
        for &role in &roles {
            if resolver.check_exists(id, role).await {
                info!("{} clip {}: available", role, id);
            } else {
                warn!("{} clip {}: missing ({})", role, id, resolver.clip_url(id, role));
                missing += 1;
            }
        }
    }

    info!("{} clips missing", missing);
    Ok(())
}

async fn render(cfg: &Config, out: Option<PathBuf>, ids: Vec<u32>) -> Result<()> {
    let catalog = load_catalog(cfg)?;
    let provider = SpeechProviderFactory::create(&cfg.synthesis)?;
    let out = out.unwrap_or_else(|| PathBuf::from(&cfg.audio.clips_path));

    let renderer = ClipRenderer::new(provider, out);
    let report = renderer
        .render(catalog.iter().filter(|c| ids.is_empty() || ids.contains(&c.id)))
        .await?;

    for (id, reason) in &report.failed {
        warn!("Conversation {} not rendered: {}", id, reason);
    }

    Ok(())
}

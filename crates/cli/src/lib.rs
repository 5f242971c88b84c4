use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use futures::StreamExt;
use huename_color::{generate_palette, ColorSpace, NamedColor, PaletteParams};
use huename_colorapi::NamingClassifier;
use huename_engine::{CancellationToken, Engine, RunState};
use std::path::PathBuf;

use cache::{load_labels, save_labels, StoredLabels};
use config::{FileConfig, Overrides, Settings};

mod cache;
mod config;
mod output;

pub const DEFAULT_SHARE_ORIGIN: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "huename")]
#[command(about = "Name every distinct color around the hue wheel", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream the named colors of one hue wheel
    Palette(PaletteArgs),

    /// Print a link that reopens a palette
    Share(ShareArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SpaceArg {
    Hsl,
    Oklch,
}

impl From<SpaceArg> for ColorSpace {
    fn from(value: SpaceArg) -> Self {
        match value {
            SpaceArg::Hsl => Self::Hsl,
            SpaceArg::Oklch => Self::Oklch,
        }
    }
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Color space of the wheel
    #[arg(long, value_enum)]
    space: Option<SpaceArg>,

    /// HSL saturation (0-100) or OKLCH chroma (0-0.37)
    #[arg(long, allow_negative_numbers = true)]
    saturation: Option<f64>,

    /// HSL lightness (0-100) or OKLCH lightness (0-1)
    #[arg(long, allow_negative_numbers = true)]
    lightness: Option<f64>,

    /// Start from a share link; explicit flags still win
    #[arg(long)]
    from_url: Option<String>,
}

impl SelectionArgs {
    fn params(&self) -> Result<PaletteParams> {
        let space = self.space.map(ColorSpace::from);
        let Some(url) = &self.from_url else {
            return PaletteParams::resolve(space, self.saturation, self.lightness)
                .context("Invalid palette selection");
        };

        let mut params = PaletteParams::from_query(share_query(url))
            .with_context(|| format!("Invalid share link {url}"))?;
        if let Some(space) = space {
            if space != params.space {
                params = PaletteParams::defaults_for(Some(space));
            }
        }
        if let Some(saturation) = self.saturation {
            params.saturation = saturation;
        }
        if let Some(lightness) = self.lightness {
            params.lightness = lightness;
        }
        params.validate().context("Invalid palette selection")?;
        Ok(params)
    }
}

/// Query part of a share link, without any fragment.
fn share_query(url: &str) -> &str {
    let url = url.split('#').next().unwrap_or(url);
    url.split_once('?').map_or("", |(_, query)| query)
}

#[derive(Args, Debug)]
struct PaletteArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Distance between sampled hues
    #[arg(long)]
    stride: Option<usize>,

    /// Maximum concurrent naming requests
    #[arg(long)]
    max_in_flight: Option<usize>,

    /// Base URL of the color naming API
    #[arg(long)]
    api_base: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Where to persist resolved names
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Neither read nor write the label cache
    #[arg(long)]
    no_cache: bool,

    /// Emit JSON lines instead of text
    #[arg(long)]
    json: bool,

    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl PaletteArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            stride: self.stride,
            max_in_flight: self.max_in_flight,
            api_base: self.api_base.clone(),
            timeout_secs: self.timeout_secs,
            cache_file: self.cache_file.clone(),
            no_cache: self.no_cache,
        }
    }
}

#[derive(Args, Debug)]
struct ShareArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Origin the link points at
    #[arg(long, default_value = DEFAULT_SHARE_ORIGIN)]
    origin: String,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stderr quiet when stdout carries JSON for another program.
    if matches!(&cli.command, Commands::Palette(args) if args.json) {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Palette(args) => run_palette(args).await?,
        Commands::Share(args) => run_share(&args)?,
    }

    Ok(())
}

fn run_share(args: &ShareArgs) -> Result<()> {
    let params = args.selection.params()?;
    output::print_stdout(&params.share_url(&args.origin))?;
    Ok(())
}

async fn run_palette(args: PaletteArgs) -> Result<()> {
    let params = args.selection.params()?;
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file, |name| std::env::var(name).ok(), &args.overrides())?;

    let palette = generate_palette(&params);
    log::info!(
        "Naming {} {} colors at saturation {} and lightness {}",
        palette.len(),
        params.space,
        params.saturation,
        params.lightness
    );

    let classifier = NamingClassifier::for_mode(settings.mode, settings.api.clone())
        .context("Failed to set up color naming")?;
    log::debug!(
        "Using {} naming ({})",
        settings.mode.as_str(),
        settings.label_source()
    );
    let engine = Engine::new(classifier, settings.engine).context("Invalid engine settings")?;

    let stored = match &settings.cache {
        Some(cfg) => load_labels(cfg, settings.label_source()).await,
        None => StoredLabels::default(),
    };
    let created_ms = stored.created_ms;
    let preloaded = engine.cache().preload(stored.entries);
    if preloaded > 0 {
        log::debug!("Loaded {preloaded} cached color names");
    }

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping");
                cancel.cancel();
            }
        })
    };

    let mut stream = engine.discover_all(palette, &cancel);
    let mut shown = 0usize;
    let mut failure = None;
    while let Some(next) = stream.next().await {
        match next {
            Ok(segment) => {
                let color = NamedColor::new(segment.label, segment.item);
                if !output::print_stdout(&output::format_line(&color, args.json)?)? {
                    stream.cancel();
                    continue;
                }
                shown += 1;
            }
            Err(err) => failure = Some(err),
        }
    }
    let state = stream.state();
    drop(stream);
    interrupt.abort();

    if let Some(err) = failure {
        return Err(err).context("Color naming failed");
    }

    let stats = engine.cache().stats();
    log::debug!(
        "{} lookups, {} naming requests, {} names cached",
        stats.lookups,
        stats.classifier_calls,
        stats.resolved
    );

    if let Some(cfg) = &settings.cache {
        if matches!(state, RunState::Done | RunState::Cancelled) {
            let snapshot = engine.cache().snapshot();
            if let Err(err) = save_labels(cfg, settings.label_source(), created_ms, snapshot).await
            {
                log::warn!("Failed to save label cache: {err:#}");
            }
        }
    }

    if state == RunState::Done && shown == 0 {
        eprintln!("{}", output::EMPTY_MESSAGE);
    }
    Ok(())
}

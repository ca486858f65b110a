mod project;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sticker_core::config::FontConfig;
use sticker_encode::still::decode_data_url;
use sticker_render::{TextRenderer, VideoDecoder};
use sticker_studio::{FixedChoice, PromptChoice, Studio, TickQueue};

use crate::project::Project;

#[derive(Parser)]
#[command(
    name = "sticker",
    version,
    about = "Sticker Studio: animated text stickers over images and video",
    long_about = "Sticker Studio renders animated text layers over a rotating set of images and\nvideos, and exports the result as a size-optimized GIF or a PNG snapshot."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a project as an animated GIF
    Export {
        /// Path to the project .toml file
        #[arg()]
        project: PathBuf,

        /// Output file path (default: dynamic-emoji-<timestamp>.gif)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip the size search and encode once at the requested settings
        #[arg(long)]
        no_optimize: bool,

        /// Export the first frame only
        #[arg(long = "static")]
        static_frame: bool,

        /// Size ceiling in bytes (overrides the project's configuration)
        #[arg(long)]
        max_bytes: Option<u64>,
    },

    /// Export a PNG snapshot of a project
    Png {
        /// Path to the project .toml file
        #[arg()]
        project: PathBuf,

        /// Output file path (default: dynamic-emoji-<timestamp>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Playback ticks to run before the snapshot
        #[arg(long, default_value_t = 0)]
        ticks: u32,
    },

    /// Write a starter project file
    Init {
        /// Where to write the project
        #[arg(default_value = "sticker.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display version and environment info
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Export {
            project,
            output,
            no_optimize,
            static_frame,
            max_bytes,
        } => run_async(cmd_export(project, output, no_optimize, static_frame, max_bytes)),
        Commands::Png {
            project,
            output,
            ticks,
        } => run_async(cmd_png(project, output, ticks)),
        Commands::Init { path, force } => cmd_init(&path, force),
        Commands::Info => cmd_info(),
    }
}

fn run_async<F>(future: F) -> Result<()>
where
    F: std::future::Future<Output = Result<()>>,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to initialize async runtime")?;
    runtime.block_on(future)
}

/// Load a project into a fresh studio with layers and media ready.
async fn open_project(path: &Path, max_bytes: Option<u64>) -> Result<(Project, Studio, usize)> {
    let mut project = Project::load(path)?;
    if let Some(ceiling) = max_bytes {
        project.studio.export.ceiling_bytes = ceiling;
    }
    let mut studio = Studio::new(project.studio.clone());
    project.build_layers(&mut studio);
    let decoded = project.load_media(&mut studio).await?;
    tracing::info!(
        "loaded {} ({} layer(s), {} of {} media decoded)",
        path.display(),
        studio.layers().len(),
        decoded,
        project.media.len()
    );
    Ok((project, studio, decoded))
}

async fn cmd_export(
    path: PathBuf,
    output: Option<PathBuf>,
    no_optimize: bool,
    static_frame: bool,
    max_bytes: Option<u64>,
) -> Result<()> {
    let (project, mut studio, decoded) = open_project(&path, max_bytes).await?;
    let mut request = studio.apply_source(&project);
    if no_optimize {
        request.optimize = false;
    }

    let choice = if static_frame {
        PromptChoice::StaticFrame
    } else if decoded == 0 {
        tracing::warn!("no decoded media; exporting a static frame");
        PromptChoice::StaticFrame
    } else {
        PromptChoice::StartPlayback
    };

    let mut host = TickQueue::new();
    let export = studio
        .export_gif(request, &mut FixedChoice(choice), &mut host)
        .await?
        .context("export cancelled")?;
    studio.pause(&mut host);

    let outcome = &export.outcome;
    let blob = match &outcome.blob {
        Some(blob) => blob,
        None => anyhow::bail!(
            "export failed: {}",
            outcome.error.as_deref().unwrap_or("no output produced")
        ),
    };
    let target = output.unwrap_or_else(|| PathBuf::from(&export.filename));
    std::fs::write(&target, &blob.bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;

    let status = if outcome.success { "✓" } else { "⚠" };
    println!("{} {} → {}", status, outcome.summary(), target.display());
    if !outcome.success {
        println!("   Could not reach the size limit; wrote the smallest result found.");
    }
    Ok(())
}

async fn cmd_png(path: PathBuf, output: Option<PathBuf>, ticks: u32) -> Result<()> {
    let (project, mut studio, _) = open_project(&path, None).await?;
    studio.apply_source(&project);

    if ticks > 0 {
        let mut host = TickQueue::new();
        if studio.play(&mut host) {
            for _ in 0..ticks {
                let Some(handle) = host.pop() else { break };
                studio.tick(handle, &mut host);
            }
            studio.pause(&mut host);
        } else {
            tracing::warn!("nothing to play; snapshot shows the initial frame");
        }
    }

    let png = studio.export_png()?;
    let bytes = decode_data_url(&png.still.data_url)?;
    let target = output.unwrap_or_else(|| PathBuf::from(&png.filename));
    std::fs::write(&target, &bytes)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!(
        "✓ {} bytes (t={:.2}s) → {}",
        png.still.estimated_size,
        studio.elapsed(),
        target.display()
    );
    Ok(())
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("'{}' already exists (use --force to overwrite)", path.display());
    }
    let contents = Project::sample().to_toml()?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("✓ Created {}", path.display());
    println!("   Add image or video paths to `media`, then run:");
    println!("   sticker export {}", path.display());
    Ok(())
}

fn cmd_info() -> Result<()> {
    let fonts = TextRenderer::from_config(&FontConfig::default());
    println!("Sticker Studio");
    println!("   Version:  {}", env!("CARGO_PKG_VERSION"));
    println!("   Encoder:  GIF (native), PNG");
    println!(
        "   FFmpeg:   {}",
        if VideoDecoder::is_available() {
            "available ✓ (video input enabled)"
        } else {
            "NOT FOUND ✗ (video input disabled)"
        }
    );
    println!(
        "   Fonts:    {}",
        if fonts.has_fonts() {
            "system font found ✓"
        } else {
            "none found ✗ (text layers will not render)"
        }
    );
    Ok(())
}

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use sprite_renderer::{AssetSource, Configurable as _, PipelineConfig, RenderProps, SpriteRenderer};

#[derive(Parser, Debug)]
#[command(name = "sprite-render", version, about = "Render a layered character sprite to PNG")]
struct Cli {
    /// Props JSON (`imagesToRender`, `borderColor`).
    #[arg(long, conflicts_with = "parts")]
    props: Option<PathBuf>,

    /// Part reference, bottom layer first. Repeat for each layer.
    #[arg(long = "part", value_name = "REF")]
    parts: Vec<String>,

    /// Outline color (any CSS color).
    #[arg(long, default_value = "#000000")]
    border_color: String,

    /// Pipeline config JSON. Defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory part references are resolved against.
    #[arg(long, default_value = ".")]
    assets: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print the rendered sprite as a PNG data URL.
    #[arg(long)]
    data_url: bool,
}

fn read_props(path: &Path) -> anyhow::Result<RenderProps> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read props '{}'", path.display()))?;
    RenderProps::from_json(&json).with_context(|| "parse props JSON")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.out.is_none() && !cli.data_url {
        anyhow::bail!("nothing to do: pass --out and/or --data-url");
    }

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("load config '{}'", path.display()))?,
        None => PipelineConfig::default(),
    };

    let props = match &cli.props {
        Some(path) => read_props(path)?,
        None => RenderProps::new()
            .with_parts(cli.parts.iter().cloned())
            .with_border_color(cli.border_color.clone()),
    };

    let mut renderer = SpriteRenderer::new(AssetSource::new(&cli.assets), config)?;
    renderer.apply_props(&props);
    let outcome = renderer.rerun().await;
    if !outcome.is_published() {
        anyhow::bail!("render did not produce an output ({outcome:?})");
    }

    if let Some(out) = &cli.out {
        renderer
            .output()
            .data
            .save(out)
            .with_context(|| format!("write '{}'", out.display()))?;
        tracing::info!(path = %out.display(), "sprite written");
    }

    if cli.data_url {
        println!("{}", renderer.download_url()?);
    }

    Ok(())
}

//! `rfsnip`: render a markup file, replay one selection gesture over it and
//! write the captured region as PNG (or print it as a data URI).

use anyhow::{bail, Context};
use clap::Parser;
use rfsnip::platform::HeadlessPlatform;
use rfsnip::{ActivationTarget, InputEvent, PointerPoint, SnipConfig, Snipper, Viewport};
use std::path::PathBuf;

fn parse_point(s: &str) -> Result<PointerPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("bad x in '{}': {}", s, e))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("bad y in '{}': {}", s, e))?;
    Ok(PointerPoint::new(x, y))
}

fn parse_viewport(s: &str) -> Result<Viewport, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT but got '{}'", s))?;
    Ok(Viewport {
        width: w.trim().parse().map_err(|e| format!("bad width in '{}': {}", s, e))?,
        height: h.trim().parse().map_err(|e| format!("bad height in '{}': {}", s, e))?,
    })
}

#[derive(Parser, Debug)]
#[command(name = "rfsnip", version, about = "Capture a dragged region of rendered markup")]
struct Cli {
    /// Markup file to render
    #[arg(long)]
    input: PathBuf,

    /// Optional JSON config; command-line flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Drag start in viewport coordinates
    #[arg(long, value_parser = parse_point)]
    from: PointerPoint,

    /// Drag end in viewport coordinates
    #[arg(long, value_parser = parse_point)]
    to: PointerPoint,

    /// Page scroll offset applied before the gesture
    #[arg(long, value_parser = parse_point, default_value = "0,0")]
    scroll: PointerPoint,

    #[arg(long)]
    scale: Option<f32>,

    /// Device pixel ratio of the output image
    #[arg(long)]
    dpr: Option<f32>,

    #[arg(long, value_parser = parse_viewport)]
    viewport: Option<Viewport>,

    /// Element id to paint highlighted (repeatable)
    #[arg(long = "highlight")]
    highlights: Vec<String>,

    /// Where to write the PNG; prints a data URI when absent
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Cli {
    fn snip_config(&self) -> anyhow::Result<SnipConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                SnipConfig::from_json(&json)?
            }
            None => SnipConfig::default(),
        };
        cfg.content = std::fs::read_to_string(&self.input)
            .with_context(|| format!("reading markup {}", self.input.display()))?;
        if let Some(scale) = self.scale {
            cfg.scale = scale;
        }
        if let Some(dpr) = self.dpr {
            cfg.device_pixel_ratio = dpr;
        }
        if let Some(v) = self.viewport {
            cfg.viewport = v;
        }
        cfg.highlight_ids.extend(self.highlights.iter().cloned());
        // One scripted gesture: nothing to coalesce.
        cfg.coalesce_moves = false;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let config = cli.snip_config()?;

    let platform = HeadlessPlatform::default();
    let mut snipper = Snipper::with_paint_rasterizer(config, &platform)?;
    // Scroll is clamped to the rendered document.
    platform.viewport.scroll_to(cli.scroll.x, cli.scroll.y);

    let target = snipper.target_at(cli.from);
    if snipper.classify(target) != ActivationTarget::SelectionSurface {
        bail!(
            "({}, {}) is not over an activation region (ids starting with '{}')",
            cli.from.x,
            cli.from.y,
            snipper.config().activation_prefix
        );
    }

    let pending = {
        let mut events = snipper.attach();
        events.dispatch(InputEvent::PointerOver { target });
        events.dispatch(InputEvent::PointerDown { point: cli.from, target });
        events.dispatch(InputEvent::PointerMove { point: cli.to });
        events.dispatch(InputEvent::PointerUp { point: cli.to })
    };
    let Some(pending) = pending else {
        bail!("selection from {:?} to {:?} is empty", cli.from, cli.to);
    };

    let capture = pending.await?;
    log::info!("captured {}", capture.request);
    match &cli.out {
        Some(path) => {
            std::fs::write(path, &capture.image.bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            println!(
                "{} ({}x{}, sha256 {})",
                path.display(),
                capture.image.width,
                capture.image.height,
                capture.digest
            );
        }
        None => println!("{}", capture.image.to_data_uri()),
    }

    snipper.close().await?;
    Ok(())
}

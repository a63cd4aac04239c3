// ============================================================================
// HySkin CLI — headless skin editing via recorded input events
// ============================================================================
//
// Usage examples:
//   hyskin --events stroke.json --output skin.png
//   hyskin --base base.png --events edits.json --output-dir exports/
//   hyskin --base base.png --gpu --verbose
//
// The events file is a JSON array of editor events replayed in order
// against a fresh session, exactly as pointer and keyboard input would be.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use egui::{Modifiers, Pos2};
use serde::{Deserialize, Serialize};

use crate::canvas::SurfaceId;
use crate::components::tools::{BrushShape, Tool, parse_hex_color};
use crate::gpu::{GpuContext, RigMeshBuffers, SkinTexture};
use crate::io::{self, AssetError};
use crate::logger;
use crate::rig::{Rig, RigError};
use crate::session::EditorSession;
use crate::settings::EditorSettings;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// HySkin headless skin editor.
#[derive(Parser, Debug)]
#[command(
    name = "hyskin",
    about = "HySkin headless skin editor",
    long_about = "Replay recorded editor input against a 256x256 skin and export the\n\
                  flattened result as PNG.\n\n\
                  Example:\n  \
                  hyskin --base base.png --events edits.json --output skin.png"
)]
pub struct CliArgs {
    /// Image loaded into the bottom layer before replay.
    #[arg(short, long, value_name = "IMAGE")]
    pub base: Option<PathBuf>,

    /// JSON array of editor events to replay.
    #[arg(short, long, value_name = "EVENTS.json")]
    pub events: Option<PathBuf>,

    /// Output PNG path.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Directory for a timestamped `HytaleSkin_<millis>.png` export.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Settings file (key=value lines); defaults to the per-user location.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Rig JSON used for 3D painting; defaults to the bundled rig.
    #[arg(long, value_name = "RIG.json")]
    pub rig: Option<PathBuf>,

    /// Override the number of history snapshots kept.
    #[arg(long, value_name = "N")]
    pub history_limit: Option<usize>,

    /// Seed for the spray brush, for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Upload the final skin to a GPU texture and build the rig buffers.
    #[arg(long)]
    pub gpu: bool,

    /// Print the effective settings as key=value lines before replay.
    #[arg(long)]
    pub print_config: bool,

    /// Echo log lines and print a summary of the session.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Events
// ============================================================================

/// One recorded input event.  Pointer coordinates are screen pixels for the
/// 2D canvas and normalized device coordinates for the 3D preview.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorEvent {
    PointerDown {
        x: f32,
        y: f32,
        #[serde(default)]
        alt: bool,
    },
    PointerMove {
        x: f32,
        y: f32,
    },
    PointerUp,
    PointerDown3d {
        x: f32,
        y: f32,
    },
    PointerMove3d {
        x: f32,
        y: f32,
    },
    PointerUp3d,
    Scroll {
        delta: f32,
    },
    KeyDown {
        key: String,
        #[serde(default)]
        ctrl: bool,
    },
    KeyUp {
        key: String,
    },
    SetTool {
        tool: Tool,
    },
    SetColor {
        color: String,
    },
    /// Brush color from a settings palette slot.
    SelectSwatch {
        index: usize,
    },
    SetSize {
        size: u32,
    },
    SetOpacity {
        opacity: f32,
    },
    SetShape {
        shape: BrushShape,
    },
    SetMirror {
        enabled: bool,
    },
    SetPaintOn3d {
        enabled: bool,
    },
    AddLayer {
        name: String,
    },
    SetActiveLayer {
        id: SurfaceId,
    },
    ToggleLayer {
        id: SurfaceId,
    },
    Undo,
    Redo,
}

#[derive(Debug)]
pub enum ReplayError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    /// Event index and the offending color text.
    InvalidColor(usize, String),
    /// Event index and the palette slot that does not exist.
    InvalidSwatch(usize, usize),
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(e) => write!(f, "could not read events: {}", e),
            ReplayError::Parse(e) => write!(f, "malformed events file: {}", e),
            ReplayError::InvalidColor(idx, text) => {
                write!(f, "event {}: '{}' is not a #rrggbb color", idx, text)
            }
            ReplayError::InvalidSwatch(idx, slot) => {
                write!(f, "event {}: palette has no slot {}", idx, slot)
            }
        }
    }
}

impl std::error::Error for ReplayError {}

impl From<std::io::Error> for ReplayError {
    fn from(e: std::io::Error) -> Self {
        ReplayError::Io(e)
    }
}

impl From<serde_json::Error> for ReplayError {
    fn from(e: serde_json::Error) -> Self {
        ReplayError::Parse(e)
    }
}

pub fn parse_events(text: &str) -> Result<Vec<EditorEvent>, ReplayError> {
    Ok(serde_json::from_str(text)?)
}

pub fn load_events(path: &Path) -> Result<Vec<EditorEvent>, ReplayError> {
    parse_events(&std::fs::read_to_string(path)?)
}

/// Feed events to the session in order.  Stops at the first invalid event.
pub fn replay(session: &mut EditorSession, events: &[EditorEvent]) -> Result<(), ReplayError> {
    for (idx, event) in events.iter().enumerate() {
        apply_event(session, idx, event)?;
    }
    Ok(())
}

fn apply_event(session: &mut EditorSession, idx: usize, event: &EditorEvent) -> Result<(), ReplayError> {
    match event {
        EditorEvent::PointerDown { x, y, alt } => {
            let modifiers = if *alt { Modifiers::ALT } else { Modifiers::NONE };
            session.pointer_down(Pos2::new(*x, *y), modifiers);
        }
        EditorEvent::PointerMove { x, y } => session.pointer_move(Pos2::new(*x, *y)),
        EditorEvent::PointerUp => session.pointer_up(),
        EditorEvent::PointerDown3d { x, y } => session.pointer_down_3d(glam::Vec2::new(*x, *y)),
        EditorEvent::PointerMove3d { x, y } => session.pointer_move_3d(glam::Vec2::new(*x, *y)),
        EditorEvent::PointerUp3d => session.pointer_up_3d(),
        EditorEvent::Scroll { delta } => session.scroll(*delta),
        EditorEvent::KeyDown { key, ctrl } => {
            let modifiers = if *ctrl { Modifiers::CTRL } else { Modifiers::NONE };
            session.key_down(key, modifiers);
        }
        EditorEvent::KeyUp { key } => {
            session.key_up(key);
        }
        EditorEvent::SetTool { tool } => session.set_tool(*tool),
        EditorEvent::SetColor { color } => {
            let parsed = parse_hex_color(color).ok_or_else(|| ReplayError::InvalidColor(idx, color.clone()))?;
            session.set_color(parsed);
        }
        EditorEvent::SelectSwatch { index } => {
            if !session.select_swatch(*index) {
                return Err(ReplayError::InvalidSwatch(idx, *index));
            }
        }
        EditorEvent::SetSize { size } => session.set_size(*size),
        EditorEvent::SetOpacity { opacity } => session.set_opacity(*opacity),
        EditorEvent::SetShape { shape } => session.set_shape(*shape),
        EditorEvent::SetMirror { enabled } => session.set_mirror(*enabled),
        EditorEvent::SetPaintOn3d { enabled } => session.set_paint_on_3d(*enabled),
        EditorEvent::AddLayer { name } => {
            session.add_layer(name);
        }
        EditorEvent::SetActiveLayer { id } => session.set_active_layer(*id),
        EditorEvent::ToggleLayer { id } => session.toggle_layer_visibility(*id),
        EditorEvent::Undo => {
            session.undo();
        }
        EditorEvent::Redo => {
            session.redo();
        }
    }
    Ok(())
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run the headless pipeline and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    let start = Instant::now();

    let mut settings = match &args.config {
        Some(path) => EditorSettings::load_from(path),
        None => EditorSettings::load(),
    };
    if let Some(limit) = args.history_limit {
        settings.history_limit = limit.max(1);
    }
    if args.print_config {
        print!("{}", settings.to_config_string());
    }

    let rig = match load_rig(args.rig.as_deref()) {
        Ok(rig) => rig,
        Err(e) => {
            eprintln!("error: {}", e);
            log_err!("Rig load failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut session = match args.seed {
        Some(seed) => EditorSession::with_seed(settings, &rig, seed),
        None => EditorSession::new(settings, &rig),
    };

    if let Some(base) = &args.base {
        match session.load_base_image_file(base) {
            Ok(Some(warning)) => eprintln!("warning: {}", warning),
            Ok(None) => {}
            Err(e) => {
                eprintln!("error: could not load '{}': {}", base.display(), e);
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(path) = &args.events {
        let result = load_events(path).and_then(|events| {
            if args.verbose {
                println!("Replaying {} events from {}", events.len(), path.display());
            }
            replay(&mut session, &events)
        });
        if let Err(e) = result {
            eprintln!("error: {}", e);
            log_err!("Replay of {} failed: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    }

    if args.gpu {
        present_on_gpu(&mut session, args.verbose);
    }

    if let Err(e) = write_outputs(&session, args.output.as_deref(), args.output_dir.as_deref(), args.verbose) {
        eprintln!("error: {}", e);
        log_err!("Export failed: {}", e);
        return ExitCode::FAILURE;
    }

    if args.verbose {
        let history = session.history();
        println!(
            "{} layers, {} history entries ({:.1} KiB), done in {:.0}ms",
            session.layers().len(),
            history.len(),
            history.memory_usage() as f64 / 1024.0,
            start.elapsed().as_secs_f64() * 1000.0
        );
        if let Some(path) = logger::log_path() {
            println!("Log: {}", path.display());
        }
    }

    ExitCode::SUCCESS
}

fn load_rig(path: Option<&Path>) -> Result<Rig, RigError> {
    match path {
        Some(p) => Rig::load(p),
        None => Rig::default_rig(),
    }
}

fn write_outputs(
    session: &EditorSession,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    verbose: bool,
) -> Result<(), AssetError> {
    if let Some(path) = output {
        session.export_png(path)?;
        if verbose {
            println!("  -> {}", path.display());
        }
    }
    if let Some(dir) = output_dir {
        let path = io::export_png_to_dir(session.composite(), dir)?;
        if verbose {
            println!("  -> {}", path.display());
        }
    }
    if output.is_none() && output_dir.is_none() {
        log_warn!("No --output or --output-dir given, nothing exported");
    }
    Ok(())
}

/// Best effort: a missing adapter is reported, never fatal.
fn present_on_gpu(session: &mut EditorSession, verbose: bool) {
    let preferred = session.settings().preferred_gpu.clone();
    let Some(ctx) = GpuContext::new(&preferred) else {
        eprintln!("warning: no GPU adapter available, skipping preview upload");
        return;
    };

    let (w, h) = (session.layers().width(), session.layers().height());
    if !ctx.supports_size(w, h) {
        log_warn!("[GPU] {}x{} exceeds the device limit of {}", w, h, ctx.max_texture_dim);
        return;
    }

    let mut texture = SkinTexture::new(&ctx, w, h);
    let buffers = RigMeshBuffers::new(&ctx, session.uv_bridge().mesh());
    session.present_texture(&mut texture);
    ctx.flush();

    if verbose {
        println!(
            "GPU: {} ({} texture uploads, {} rig indices)",
            ctx.adapter_name, texture.uploads, buffers.index_count
        );
    }
}

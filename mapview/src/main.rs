use clap::Parser;
use mapdata::{GridResolver, MapGrid, MapPayload};
use mapview::args::{Cli, Commands};
use mapview::details::TileDetails;
use mapview::scene::{TileInstance, instance_bytes};
use mapview::script::{parse_script, pose_line, run_script};
use mapview::{GestureHub, SceneBuffer, ViewerConfig, ViewportOrchestrator};
use std::io::Write;
use std::path::Path;

fn load_config(args: &Cli) -> Result<ViewerConfig, String> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path).map_err(|e| e.to_string())?,
        None => ViewerConfig::default(),
    };
    if let Some(dir) = &args.textures {
        config.textures = Some(dir.clone());
    }
    Ok(config)
}

fn inspect(config: &ViewerConfig, payload: &Path, tiles: bool) -> Result<(), String> {
    let payload = MapPayload::load(payload).map_err(|e| e.to_string())?;
    let registry = config.texture_registry().map_err(|e| e.to_string())?;
    let grid = MapGrid::validate(&payload);
    let map = GridResolver::with_settings(&registry, config.grid).resolve(&grid);

    let mut out = std::io::stdout().lock();
    let mut report = || -> std::io::Result<()> {
        writeln!(out, "Grid: {}x{}", map.width(), map.height())?;
        writeln!(out, "Tiles: {}", map.tiles().len())?;
        writeln!(out, "Buildings: {}", map.buildings().len())?;
        let placed = map.markers().len();
        writeln!(
            out,
            "Entities: {} ({} placed)",
            grid.entities().len(),
            placed
        )?;
        writeln!(out, "Textures: {}", registry.len())?;
        let instances: Vec<TileInstance> = map.tiles().iter().map(TileInstance::from_tile).collect();
        writeln!(out, "Instance buffer: {} bytes", instance_bytes(&instances).len())?;
        writeln!(out, "Diagnostics: {}", map.diagnostics().len())?;
        for d in map.diagnostics() {
            writeln!(out, "  - {}", d)?;
        }
        if tiles {
            for tile in map.tiles() {
                let texture = registry
                    .entry(tile.texture)
                    .map(|e| e.key.file_stem())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "tile {} height={:.2} texture={}",
                    tile.pos(),
                    tile.height,
                    texture
                )?;
                writeln!(out, "{}", TileDetails(&tile.metadata))?;
            }
        }
        Ok(())
    };
    report().map_err(|e| e.to_string())
}

fn session(config: &ViewerConfig, payload: &Path, script: &Path) -> Result<(), String> {
    let script = std::fs::read_to_string(script)
        .map_err(|e| format!("Failed to read script {}: {}", script.display(), e))?;
    let commands = parse_script(&script).map_err(|e| e.to_string())?;
    let registry = config.texture_registry().map_err(|e| e.to_string())?;

    let hub = GestureHub::new();
    let mut viewport = ViewportOrchestrator::new(SceneBuffer::new(), &hub, config);
    match MapPayload::load(payload) {
        Ok(payload) => viewport.load(&payload, &registry),
        Err(e) => {
            viewport.load_failed(&e);
            return Err(e.to_string());
        }
    }
    for d in &viewport.surface().diagnostics {
        println!("diagnostic: {}", d);
    }

    let mut out = std::io::stdout().lock();
    run_script(&mut viewport, &hub, &commands, &mut out).map_err(|e| e.to_string())?;
    writeln!(out, "final {}", pose_line(&viewport)).map_err(|e| e.to_string())?;
    Ok(())
}

fn run(args: Cli) -> Result<(), String> {
    let mut config = load_config(&args)?;
    match &args.command {
        Commands::Inspect { payload, tiles } => inspect(&config, payload, *tiles),
        Commands::Session {
            payload,
            script,
            reset_policy,
        } => {
            if let Some(policy) = reset_policy {
                config.camera.reset_policy = *policy;
            }
            session(&config, payload, script)
        }
    }
}

fn main() -> Result<(), String> {
    let args = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();
    run(args)
}

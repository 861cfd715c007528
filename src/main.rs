use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;

use arcade_launcher::config::load_settings;
use arcade_launcher::launch::ShellRunner;
use arcade_launcher::scan::scan_roms;
use arcade_launcher::sdl::{SdlEvents, SdlRenderer};
use arcade_launcher::store::SqliteStore;
use arcade_launcher::timer::Scheduler;
use arcade_launcher::{LauncherError, Navigator, Result};

/// Fullscreen arcade game launcher.
#[derive(Parser, Debug)]
#[command(name = "arcade-launcher", version, about)]
struct Args {
    /// Config file to use instead of the user config location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// List hidden and missing games too
    #[arg(long)]
    show_hidden: bool,

    /// Refresh the catalog's missing flags from the roms directory before starting
    #[arg(long)]
    scan: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_filter = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("arcade-launcher: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn presentation(e: impl ToString) -> LauncherError {
    LauncherError::Presentation(e.to_string())
}

fn run(args: &Args) -> Result<()> {
    let settings = load_settings(args.config.as_deref());

    if let Some(dir) = settings.paths.database.parent() {
        std::fs::create_dir_all(dir)?;
    }
    log::info!("Opening catalog {}", settings.paths.database.display());
    let mut store = SqliteStore::open(&settings.paths.database)?;

    if args.scan {
        match settings.paths.roms.as_deref() {
            Some(roms) => {
                let report = store.sync_present(&scan_roms(roms))?;
                log::info!(
                    "scan: {} present, {} missing, {} added",
                    report.present,
                    report.missing,
                    report.added
                );
            }
            None => log::warn!("scan: paths.roms is not set, skipping"),
        }
    }

    let sdl_ctx = sdl2::init().map_err(presentation)?;
    let video = sdl_ctx.video().map_err(presentation)?;
    let joystick = sdl_ctx.joystick().map_err(presentation)?;
    let ttf_ctx = sdl2::ttf::init().map_err(presentation)?;
    sdl_ctx.mouse().show_cursor(false);

    let renderer = SdlRenderer::new(video, &ttf_ctx, &settings).map_err(presentation)?;

    let (tx, rx) = mpsc::channel();
    let timers = Scheduler::spawn(tx);
    let pump = sdl_ctx.event_pump().map_err(presentation)?;
    let mut events = SdlEvents::new(pump, &joystick, rx);

    let mut navigator = Navigator::new(
        settings,
        store,
        renderer,
        ShellRunner,
        timers,
        args.show_hidden,
    )?;
    navigator.run(&mut events)
}

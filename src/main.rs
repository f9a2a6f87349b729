//! Neon Dash entry point
//!
//! Native builds run a headless autopilot session and print a run summary.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use neon_dash::consts::SIM_DT;
    use neon_dash::persistence::{JsonFileStore, MemoryStore, SaveStore};
    use neon_dash::sim::GameEvent;
    use neon_dash::{Session, SimConfig};

    const USAGE: &str = "usage: neon-dash [--seed N] [--ticks N] [--config PATH] [--save PATH | --no-save]";

    /// Log progress every this many ticks
    const PROGRESS_INTERVAL: u64 = 500;

    #[derive(Debug)]
    struct Args {
        seed: u64,
        ticks: u64,
        config: Option<PathBuf>,
        save: Option<PathBuf>,
    }

    impl Args {
        fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
            let mut parsed = Args {
                seed: 1,
                ticks: 50 * 60 * 5,
                config: None,
                save: Some(PathBuf::from("neon-dash-save.json")),
            };
            while let Some(arg) = args.next() {
                let mut value = |name: &str| {
                    args.next()
                        .ok_or_else(|| format!("{name} needs a value"))
                };
                match arg.as_str() {
                    "--seed" => {
                        parsed.seed = value("--seed")?
                            .parse()
                            .map_err(|e| format!("bad --seed: {e}"))?
                    }
                    "--ticks" => {
                        parsed.ticks = value("--ticks")?
                            .parse()
                            .map_err(|e| format!("bad --ticks: {e}"))?
                    }
                    "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
                    "--save" => parsed.save = Some(PathBuf::from(value("--save")?)),
                    "--no-save" => parsed.save = None,
                    "-h" | "--help" => return Err(String::new()),
                    other => return Err(format!("unknown argument '{other}'")),
                }
            }
            Ok(parsed)
        }
    }

    pub fn run() -> ExitCode {
        let args = match Args::parse(std::env::args().skip(1)) {
            Ok(args) => args,
            Err(msg) => {
                if !msg.is_empty() {
                    eprintln!("{msg}");
                }
                eprintln!("{USAGE}");
                return ExitCode::from(2);
            }
        };

        let config = match &args.config {
            Some(path) => match SimConfig::load(path) {
                Ok(config) => config,
                Err(e) => {
                    log::error!("Invalid config {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            },
            None => SimConfig::default(),
        };

        match &args.save {
            Some(path) => play(config, &args, JsonFileStore::new(path)),
            None => play(config, &args, MemoryStore::new()),
        }
    }

    fn play<S: SaveStore>(config: SimConfig, args: &Args, store: S) -> ExitCode {
        let mut session = match Session::new(config, args.seed, store) {
            Ok(session) => session,
            Err(e) => {
                log::error!("Cannot start run: {}", e);
                return ExitCode::FAILURE;
            }
        };
        session.autopilot = true;

        let (mut jumps, mut switches, mut dashes) = (0u32, 0u32, 0u32);
        for t in 1..=args.ticks {
            session.step();
            for event in session.drain_events() {
                match event {
                    GameEvent::Jumped { .. } => jumps += 1,
                    GameEvent::PolaritySwitched(_) => switches += 1,
                    GameEvent::DashStarted => dashes += 1,
                    _ => {}
                }
            }
            let hud = session.hud();
            if hud.is_dead {
                break;
            }
            if t % PROGRESS_INTERVAL == 0 {
                log::info!(
                    "t={:.0}s distance {} coins {} polarity {}",
                    t as f32 * SIM_DT,
                    hud.distance,
                    hud.session_coins,
                    hud.polarity.as_str()
                );
            }
        }

        let hud = session.hud();
        if !hud.is_dead
            && let Err(e) = session.checkpoint()
        {
            log::error!("Failed to save: {}", e);
        }

        println!("seed:        {}", args.seed);
        println!("ticks:       {}", session.state().time_ticks);
        println!("outcome:     {}", if hud.is_dead { "died" } else { "survived" });
        println!("distance:    {}", hud.distance);
        println!("score:       {}", hud.score);
        println!("coins:       {} (total {})", hud.session_coins, hud.total_coins);
        println!("high score:  {}", hud.high_score);
        println!("jumps {jumps}, polarity switches {switches}, dashes {dashes}");
        ExitCode::SUCCESS
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    log::info!("Neon Dash (native, headless) starting...");
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser host drives `neon_dash::Session` directly
}

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};

use hoverslide_server::config::VehicleConfig;
use hoverslide_server::net::{start_websocket_server, Shared};
use hoverslide_server::physics::PhysicsWorld;
use hoverslide_server::spawn::SpawnManager;
use hoverslide_server::state::SharedGameState;

#[derive(Parser, Debug)]
#[command(name = "hoverslide-server", about = "Authoritative hover/ground vehicle server")]
struct ServerConfig {
    /// WebSocket bind address
    #[arg(long, env = "HOVERSLIDE_BIND", default_value = "0.0.0.0:9001")]
    bind: String,

    /// Fixed simulation rate (Hz)
    #[arg(long, env = "HOVERSLIDE_TICK_HZ", default_value_t = 60)]
    tick_hz: u32,

    /// TOML vehicle tuning; the built-in skiff preset when omitted
    #[arg(long, env = "HOVERSLIDE_VEHICLE")]
    vehicle_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let args = ServerConfig::parse();

    println!("🚀 Starting hoverslide server...");

    let raw = match &args.vehicle_config {
        Some(path) => match VehicleConfig::load_from_file(path) {
            Ok(cfg) => {
                println!("🔧 Loaded vehicle config from {}", path.display());
                cfg
            }
            Err(e) => {
                eprintln!("❌ {}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("🔧 Using built-in skiff tuning");
            VehicleConfig::default()
        }
    };

    let vehicle_config = match raw.validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Invalid vehicle config: {}", e);
            std::process::exit(1);
        }
    };

    if args.tick_hz == 0 {
        eprintln!("❌ --tick-hz must be positive");
        std::process::exit(1);
    }

    let shared = Shared {
        state: Arc::new(Mutex::new(SharedGameState::new())),
        physics: Arc::new(Mutex::new(PhysicsWorld::new(vehicle_config))),
        spawns: Arc::new(Mutex::new(SpawnManager::new(6.0, 2.0))),
    };

    // Start WebSocket server
    let server = shared.clone();
    let bind = args.bind.clone();
    tokio::spawn(async move {
        if let Err(e) = start_websocket_server(bind, server).await {
            eprintln!("❌ WebSocket server stopped: {}", e);
            std::process::exit(1);
        }
    });

    let dt = 1.0 / args.tick_hz as f32;
    let mut ticker = interval(Duration::from_secs_f32(dt));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // Lock order: physics, then state.
        let mut phys = shared.physics.lock().await;
        let mut game = shared.state.lock().await;

        for (id, controls) in &game.inputs {
            phys.set_controls(id, *controls);
        }

        // Step physics
        phys.step(dt);

        // Advance tick + broadcast snapshot
        game.tick += 1;
        game.broadcast_snapshot(&phys);
    }
}

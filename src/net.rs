use std::sync::Arc;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use uuid::Uuid;

use crate::physics::PhysicsWorld;
use crate::slide_core::ControlInputs;
use crate::spawn::SpawnManager;
use crate::state::SharedGameState;

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Input {
        #[serde(default)]
        accelerate: f32,
        #[serde(default)]
        steer: f32,
        #[serde(default)]
        hover: f32,
    },
    Ping,
}

impl ClientMessage {
    pub fn from_json(txt: &str) -> Option<Self> {
        serde_json::from_str(txt).ok()
    }
}

pub struct Shared {
    pub state: Arc<Mutex<SharedGameState>>,
    pub physics: Arc<Mutex<PhysicsWorld>>,
    pub spawns: Arc<Mutex<SpawnManager>>,
}

impl Clone for Shared {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            physics: Arc::clone(&self.physics),
            spawns: Arc::clone(&self.spawns),
        }
    }
}

pub async fn start_websocket_server(bind: String, shared: Shared) -> std::io::Result<()> {
    let listener = TcpListener::bind(&bind).await?;

    println!("🌐 WebSocket listening on ws://{}", bind);

    loop {
        let (raw, addr) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                eprintln!("❌ Accept failed: {}", e);
                continue;
            }
        };

        let shared = shared.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(raw, shared).await {
                eprintln!("❌ Connection {} closed with error: {}", addr, e);
            }
        });
    }
}

async fn handle_client(raw: TcpStream, shared: Shared) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = accept_async(raw).await?;
    let (mut write, mut read) = ws.split();

    // -------------------------------
    // 1) Create outgoing message channel
    // -------------------------------
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let player_id = Uuid::new_v4().to_string();

    // -------------------------------
    // 2) Spawn send-loop task
    // -------------------------------
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if write.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    // -------------------------------
    // 3) Spawn vehicle + register client
    // Lock order everywhere: physics, then state.
    // -------------------------------
    let spawn = shared.spawns.lock().await.allocate_spawn(&player_id);
    {
        let mut phys = shared.physics.lock().await;
        phys.spawn_vehicle(player_id.clone(), spawn.position);

        let mut game = shared.state.lock().await;
        game.register_client(&player_id, tx.clone());
    }

    println!("🟢 Player connected: {} (pad {})", player_id, spawn.slot);

    let welcome = serde_json::json!({
        "type": "welcome",
        "player_id": player_id,
        "spawn": spawn.position,
    });
    let _ = tx.send(welcome.to_string());

    // -------------------------------
    // 4) Main receive loop
    // -------------------------------
    while let Some(msg) = read.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(_) => break,
        };

        if msg.is_close() {
            break;
        }
        let Ok(text) = msg.to_text() else { continue };

        match ClientMessage::from_json(text) {
            Some(ClientMessage::Ping) => {
                let _ = tx.send(r#"{"type":"pong"}"#.into());
            }
            Some(ClientMessage::Input { accelerate, steer, hover }) => {
                let controls = ControlInputs::normalized(accelerate, steer, hover);
                shared.state.lock().await.update_input(&player_id, controls);
            }
            None => continue,
        }
    }

    println!("🔴 Player disconnected: {}", player_id);
    {
        let mut phys = shared.physics.lock().await;
        phys.despawn_vehicle(&player_id);

        let mut game = shared.state.lock().await;
        game.remove_client(&player_id);
    }
    shared.spawns.lock().await.release(&player_id);

    Ok(())
}

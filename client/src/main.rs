use clap::Parser;
use client::game::{Arena, DEFAULT_BOT_COUNT};
use client::input::{normalize_username, UsernamePrompt};
use client::network::{NetworkConfig, NetworkEvent, NetworkHandle, DEFAULT_RECONNECT_DELAY};
use client::presence::{PresenceState, PresenceUpdate};
use client::rendering::{HudInfo, Renderer};
use log::{error, info};
use macroquad::prelude::*;
use std::time::Duration;

/// How long a notice stays on screen
const NOTICE_SECS: f64 = 3.0;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Join with this username instead of asking for one
    #[arg(short = 'u', long)]
    username: Option<String>,

    /// Delay between reconnection attempts in milliseconds
    #[arg(long, default_value_t = DEFAULT_RECONNECT_DELAY.as_millis() as u64)]
    reconnect_delay_ms: u64,

    /// Give up after the first lost connection
    #[arg(long)]
    no_reconnect: bool,

    /// Number of AI bots in the arena
    #[arg(short = 'b', long, default_value_t = DEFAULT_BOT_COUNT)]
    bots: usize,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: u32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: u32,
}

impl Args {
    fn network_config(&self) -> NetworkConfig {
        let reconnect_delay =
            (!self.no_reconnect).then(|| Duration::from_millis(self.reconnect_delay_ms));
        NetworkConfig::for_server(&self.server, reconnect_delay)
    }
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Arena".to_string(),
        window_width: args.width as i32,
        window_height: args.height as i32,
        window_resizable: false,
        ..Default::default()
    }
}

struct Notice {
    text: String,
    shown_at: f64,
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let (width, height) = (args.width as f32, args.height as f32);

    let mut presence = PresenceState::new();
    let mut prompt = UsernamePrompt::new();
    let mut prompt_error: Option<String> = None;

    let initial_username = match args.username.as_deref().map(normalize_username) {
        Some(Ok(name)) => {
            presence.request_join(name.clone());
            Some(name)
        }
        Some(Err(e)) => {
            prompt_error = Some(e.to_string());
            None
        }
        None => None,
    };

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut network = match NetworkHandle::spawn(args.network_config(), initial_username) {
        Ok(network) => network,
        Err(e) => {
            error!("Failed to start network task: {}", e);
            return;
        }
    };

    let mut arena = Arena::new(args.bots, width, height);
    let mut renderer = Renderer::new(width, height);
    let mut notice: Option<Notice> = None;

    loop {
        if is_key_pressed(KeyCode::Escape) {
            break;
        }

        for event in network.poll() {
            let update = match event {
                NetworkEvent::Connected => {
                    presence.connection_opened();
                    PresenceUpdate::default()
                }
                NetworkEvent::Message(message) => presence.apply(&message),
                NetworkEvent::ConnectionLost => presence.connection_lost(),
            };

            if let Some(signal) = update.signal {
                signal.apply_to(&mut arena);
            }
            if let Some(text) = update.notice {
                notice = Some(Notice {
                    text,
                    shown_at: get_time(),
                });
            }
        }

        if presence.can_request_join() {
            match prompt.poll_keys() {
                Some(Ok(name)) => {
                    prompt_error = None;
                    presence.request_join(name.clone());
                    network.join(name);
                }
                Some(Err(e)) => prompt_error = Some(e.to_string()),
                None => {}
            }
        }

        if notice
            .as_ref()
            .is_some_and(|n| get_time() - n.shown_at > NOTICE_SECS)
        {
            notice = None;
        }

        arena.update(get_frame_time());

        renderer.render(
            &arena,
            &presence,
            HudInfo {
                prompt_text: prompt.text(),
                prompt_error: prompt_error.as_deref(),
                notice: notice.as_ref().map(|n| n.text.as_str()),
            },
        );

        next_frame().await;
    }

    info!("Shutting down client");
    network.shutdown();
}

//! Arena with wandering bots
//!
//! This is the local game collaborator the presence state drives. Bots roam
//! the arena while the player is alone and are disabled as soon as another
//! human shows up.

use crate::presence::BotVisibility;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const ARENA_WIDTH: f32 = 800.0;
pub const ARENA_HEIGHT: f32 = 600.0;
pub const BOT_SIZE: f32 = 24.0;
pub const BOT_SPEED: f32 = 80.0;
pub const BOT_MAX_HEALTH: u32 = 100;
pub const DEFAULT_BOT_COUNT: usize = 5;

/// Chance per second that a bot picks a new heading
const TURN_RATE: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct Bot {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub health: u32,
    pub visible: bool,
}

impl Bot {
    pub fn center(&self) -> (f32, f32) {
        (self.x + BOT_SIZE / 2.0, self.y + BOT_SIZE / 2.0)
    }

    pub fn is_active(&self) -> bool {
        self.visible && self.health > 0
    }
}

pub struct Arena {
    pub bots: Vec<Bot>,
    width: f32,
    height: f32,
    rng: StdRng,
}

impl Arena {
    pub fn new(bot_count: usize, width: f32, height: f32) -> Self {
        Self::with_rng(bot_count, width, height, StdRng::from_entropy())
    }

    /// Deterministic arena for tests and replays
    pub fn with_seed(bot_count: usize, width: f32, height: f32, seed: u64) -> Self {
        Self::with_rng(bot_count, width, height, StdRng::seed_from_u64(seed))
    }

    fn with_rng(bot_count: usize, width: f32, height: f32, mut rng: StdRng) -> Self {
        let max_x = (width - BOT_SIZE).max(0.0);
        let max_y = (height - BOT_SIZE).max(0.0);

        let bots = (0..bot_count)
            .map(|id| {
                let (vel_x, vel_y) = random_heading(&mut rng);
                Bot {
                    id,
                    x: rng.gen_range(0.0..=max_x),
                    y: rng.gen_range(0.0..=max_y),
                    vel_x,
                    vel_y,
                    health: BOT_MAX_HEALTH,
                    visible: true,
                }
            })
            .collect();

        Self {
            bots,
            width,
            height,
            rng,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn active_bot_count(&self) -> usize {
        self.bots.iter().filter(|bot| bot.is_active()).count()
    }

    /// Moves every active bot and keeps it inside the arena
    pub fn update(&mut self, dt: f32) {
        let max_x = (self.width - BOT_SIZE).max(0.0);
        let max_y = (self.height - BOT_SIZE).max(0.0);

        for bot in self.bots.iter_mut().filter(|bot| bot.is_active()) {
            if self.rng.gen::<f32>() < TURN_RATE * dt {
                let (vel_x, vel_y) = random_heading(&mut self.rng);
                bot.vel_x = vel_x;
                bot.vel_y = vel_y;
            }

            bot.x += bot.vel_x * dt;
            bot.y += bot.vel_y * dt;

            if bot.x < 0.0 || bot.x > max_x {
                bot.vel_x = -bot.vel_x;
                bot.x = bot.x.clamp(0.0, max_x);
            }
            if bot.y < 0.0 || bot.y > max_y {
                bot.vel_y = -bot.vel_y;
                bot.y = bot.y.clamp(0.0, max_y);
            }
        }
    }
}

impl BotVisibility for Arena {
    fn hide_bots(&mut self) {
        debug!("Hiding {} bots", self.bots.len());
        for bot in &mut self.bots {
            bot.visible = false;
            bot.health = 0;
        }
    }

    fn show_bots(&mut self) {
        debug!("Showing {} bots", self.bots.len());
        for bot in &mut self.bots {
            bot.visible = true;
            bot.health = BOT_MAX_HEALTH;
        }
    }
}

fn random_heading(rng: &mut StdRng) -> (f32, f32) {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    (angle.cos() * BOT_SPEED, angle.sin() * BOT_SPEED)
}

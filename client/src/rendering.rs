use crate::game::{Arena, Bot, BOT_MAX_HEALTH, BOT_SIZE};
use crate::presence::{Phase, PresenceState};
use macroquad::prelude::*;

const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const FLOOR: Color = Color::new(0.16, 0.16, 0.16, 1.0);
const BOT_COLOR: Color = Color::new(1.0, 0.27, 0.27, 1.0);
const PANEL: Color = Color::new(0.0, 0.0, 0.0, 0.7);

/// Everything the HUD shows besides the presence state
#[derive(Debug, Clone, Default)]
pub struct HudInfo<'a> {
    pub prompt_text: &'a str,
    pub prompt_error: Option<&'a str>,
    pub notice: Option<&'a str>,
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: f32, height: f32) -> Self {
        Renderer { width, height }
    }

    pub fn render(&mut self, arena: &Arena, presence: &PresenceState, hud: HudInfo<'_>) {
        clear_background(BACKGROUND);

        draw_rectangle(0.0, 0.0, arena.width(), arena.height(), FLOOR);

        for bot in arena.bots.iter().filter(|bot| bot.visible) {
            self.draw_bot(bot);
        }

        self.draw_status(presence);

        if let Some(notice) = hud.notice {
            self.draw_notice(notice);
        }

        if presence.phase() == Phase::Entering {
            self.draw_prompt(presence, &hud);
        }
    }

    fn draw_bot(&mut self, bot: &Bot) {
        draw_rectangle(bot.x, bot.y, BOT_SIZE, BOT_SIZE, BOT_COLOR);
        draw_rectangle_lines(bot.x, bot.y, BOT_SIZE, BOT_SIZE, 2.0, WHITE);

        let fraction = bot.health as f32 / BOT_MAX_HEALTH as f32;
        draw_rectangle(bot.x, bot.y - 6.0, BOT_SIZE * fraction, 3.0, GREEN);

        let (cx, _) = bot.center();
        draw_text(&format!("AI {}", bot.id), cx - 10.0, bot.y - 9.0, 12.0, WHITE);
    }

    fn draw_status(&mut self, presence: &PresenceState) {
        let y_start = 10.0;

        let connection_color = if presence.is_connected() { GREEN } else { RED };
        draw_rectangle(10.0, y_start, 8.0, 8.0, connection_color);
        draw_text("CON", 20.0, y_start + 8.0, 12.0, WHITE);

        let player_y = y_start + 15.0;
        for i in 0..(presence.player_count().min(8)) {
            draw_rectangle(
                10.0 + (i as f32) * 4.0,
                player_y,
                3.0,
                3.0,
                Color::from_rgba(0, 170, 255, 255),
            );
        }
        let player_text = format!("{} players", presence.player_count());
        draw_text(&player_text, 45.0, player_y + 3.0, 12.0, WHITE);

        let name = presence.username().unwrap_or("-");
        let phase = match presence.phase() {
            Phase::Entering => "entering",
            Phase::Lobby => "in lobby",
        };
        draw_text(
            &format!("You: {} ({})", name, phase),
            10.0,
            player_y + 18.0,
            14.0,
            WHITE,
        );

        let bots = if presence.bots_visible() {
            "AIs active"
        } else {
            "AIs standing down"
        };
        draw_text(bots, 10.0, player_y + 34.0, 14.0, LIGHTGRAY);
    }

    fn draw_notice(&mut self, notice: &str) {
        let size = 24.0;
        let dims = measure_text(notice, None, size as u16, 1.0);
        let x = (self.width - dims.width) / 2.0;
        let y = 60.0;

        draw_rectangle(
            x - 10.0,
            y - dims.height - 8.0,
            dims.width + 20.0,
            dims.height + 16.0,
            PANEL,
        );
        draw_text(notice, x, y, size, YELLOW);
    }

    fn draw_prompt(&mut self, presence: &PresenceState, hud: &HudInfo<'_>) {
        let panel_w = 360.0;
        let panel_h = 130.0;
        let x = (self.width - panel_w) / 2.0;
        let y = (self.height - panel_h) / 2.0;

        draw_rectangle(x, y, panel_w, panel_h, PANEL);
        draw_rectangle_lines(x, y, panel_w, panel_h, 2.0, WHITE);

        draw_text("Enter a username", x + 16.0, y + 28.0, 20.0, WHITE);

        let field_y = y + 44.0;
        draw_rectangle_lines(x + 16.0, field_y, panel_w - 32.0, 28.0, 1.0, LIGHTGRAY);

        let caret = if presence.can_request_join() && (get_time() * 2.0) as i64 % 2 == 0 {
            "_"
        } else {
            ""
        };
        draw_text(
            &format!("{}{}", hud.prompt_text, caret),
            x + 22.0,
            field_y + 20.0,
            20.0,
            WHITE,
        );

        let status = if let Some(error) = hud.prompt_error {
            Some((error.to_string(), RED))
        } else if let Some(pending) = presence.pending_username() {
            Some((format!("Joining as {}...", pending), LIGHTGRAY))
        } else if !presence.is_connected() {
            Some(("Waiting for server...".to_string(), LIGHTGRAY))
        } else {
            presence
                .rejected_username()
                .map(|name| (format!("'{}' is taken, try another", name), RED))
        };

        if let Some((text, color)) = status {
            draw_text(&text, x + 16.0, y + panel_h - 18.0, 16.0, color);
        }
    }
}

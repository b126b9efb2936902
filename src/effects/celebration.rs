use super::Effect;
use crate::celebration::scene::{Scene, Shape, Sprite};
use crate::celebration::timer::Callback;
use crate::celebration::CelebrationEffect;
use crate::config::{get_bg_color, CelebrationConfig, Rgb};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use log::{debug, info};
use std::cell::Cell;
use std::io::{BufWriter, Stdout, Write};
use std::rc::Rc;
use std::time::Duration;

const STRING_COLOR: Rgb = (0x9c, 0xa3, 0xaf);
const HIGHLIGHT_COLOR: Rgb = (255, 255, 255);
const SPARKLE_COLOR: Rgb = (255, 244, 180);
const TEXT_COLOR: Rgb = (255, 255, 255);
const HINT_COLOR: Rgb = (110, 110, 130);

// Banner background, left to right
const BANNER_GRADIENT: [Rgb; 3] = [
    (250, 204, 21), // Yellow
    (239, 68, 68),  // Red
    (236, 72, 153), // Pink
];

const IDLE_HINT: &str = "space: celebrate   q: quit";

/// What the host does once a celebration has finished.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AfterCompletion {
    /// Go idle until space is pressed again
    #[default]
    Wait,
    /// Start another celebration straight away
    Repeat,
    /// End the program
    Exit,
}

/// A minimal host screen for the celebration overlay. It owns the `active`
/// flag and clears it when the completion callback fires, the way a parent
/// view would.
pub struct CelebrationHost {
    width: usize,
    height: usize,
    effect: CelebrationEffect,
    active: bool,
    arm_pending: bool,
    skip_advance: bool,
    exit: bool,
    completed: Rc<Cell<bool>>,
    on_complete: Callback,
    after_completion: AfterCompletion,
    completions: u32,
    glow_buffer: Vec<(f32, Rgb)>,
    cell_bg: Vec<Rgb>,
    output_buf: Vec<u8>,
}

impl CelebrationHost {
    pub fn new(width: usize, height: usize, config: CelebrationConfig, after_completion: AfterCompletion) -> Self {
        Self::with_effect(width, height, CelebrationEffect::new(config), after_completion)
    }

    pub fn with_effect(
        width: usize,
        height: usize,
        effect: CelebrationEffect,
        after_completion: AfterCompletion,
    ) -> Self {
        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        let on_complete: Callback = Rc::new(move || flag.set(true));

        let mut host = Self {
            width,
            height,
            effect,
            active: true,
            arm_pending: false,
            skip_advance: false,
            exit: false,
            completed,
            on_complete,
            after_completion,
            completions: 0,
            glow_buffer: vec![(0.0, (0, 0, 0)); width * height],
            cell_bg: vec![(0, 0, 0); width * height.div_ceil(2)],
            output_buf: Vec::with_capacity(width * height * 25),
        };
        host.sync_props();
        host
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.arm_pending = false;
        self.sync_props();
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn completions(&self) -> u32 {
        self.completions
    }

    pub fn effect(&self) -> &CelebrationEffect {
        &self.effect
    }

    fn sync_props(&mut self) {
        self.effect.set_props(self.active, &self.on_complete);
    }

    /// Starts a requested celebration at a frame boundary. The run loop only
    /// renders once the accumulator holds less than one step, so skipping
    /// the next advance keeps that leftover, pre-activation time out of the
    /// new cycle.
    fn arm_pending_cycle(&mut self) {
        if self.arm_pending {
            self.arm_pending = false;
            self.active = true;
            self.sync_props();
            self.skip_advance = true;
        }
    }

    /// Builds the next frame into `output_buf`.
    fn compose(&mut self) -> std::io::Result<()> {
        self.arm_pending_cycle();

        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let bg_color = get_bg_color();
        let scene = self.effect.render(self.active, &self.on_complete);

        self.glow_buffer.fill((0.0, bg_color));
        if let Some(scene) = &scene {
            for layer in &scene.layers {
                for sprite in &layer.sprites {
                    self.stamp(sprite);
                }
            }
        }

        self.emit_half_blocks(bg_color)?;

        match &scene {
            Some(scene) => {
                self.emit_sparkles(scene)?;
                self.emit_banner(scene)?;
            }
            None => self.emit_hint()?,
        }

        self.output_buf.extend_from_slice(b"\x1b[0m");
        Ok(())
    }

    fn to_pixel(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x / 100.0 * self.width as f32).floor() as i32,
            (y / 100.0 * self.height as f32).floor() as i32,
        )
    }

    /// Later sprites paint over earlier ones.
    fn put(&mut self, x: i32, y: i32, intensity: f32, color: Rgb) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 && intensity > 0.05 {
            self.glow_buffer[y as usize * self.width + x as usize] = (intensity, color);
        }
    }

    /// Soft halo: only brightens what is already there.
    fn glow(&mut self, x: i32, y: i32, intensity: f32, color: Rgb) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            let idx = y as usize * self.width + x as usize;
            if intensity > self.glow_buffer[idx].0 {
                self.glow_buffer[idx] = (intensity, color);
            }
        }
    }

    fn stamp(&mut self, sprite: &Sprite) {
        let (px, py) = self.to_pixel(sprite.pose.x, sprite.pose.y);
        let alpha = sprite.pose.opacity.clamp(0.0, 1.0);

        match sprite.shape {
            Shape::Balloon => {
                // 3x4 body with clipped corners, string hanging below
                for dy in -2..=1 {
                    for dx in -1..=1 {
                        let corner = dx != 0 && (dy == -2 || dy == 1);
                        if !corner {
                            self.put(px + dx, py + dy, alpha, sprite.color);
                        }
                    }
                }
                self.put(px - 1, py - 1, alpha * 0.6, blend(sprite.color, HIGHLIGHT_COLOR, 0.6));
                let sway = (sprite.pose.rotation / 8.0).round() as i32;
                for i in 2..6 {
                    let drift = if i > 3 { sway } else { 0 };
                    self.put(px + drift, py + i, alpha * 0.6, STRING_COLOR);
                }
            }
            Shape::Confetti => {
                self.put(px, py, alpha, sprite.color);
                if sprite.pose.rotation % 180.0 < 90.0 {
                    self.put(px + 1, py, alpha, sprite.color);
                } else {
                    self.put(px, py + 1, alpha, sprite.color);
                }
            }
            Shape::Star(size) => {
                let arm = (sprite.pose.scale * 2.5).round() as i32;
                let halo = if size > 25.0 { 2 } else { 1 };
                for dy in -halo..=halo {
                    for dx in -halo..=halo {
                        self.glow(px + dx, py + dy, alpha * 0.35, sprite.color);
                    }
                }
                for i in 1..=arm {
                    let fade = alpha * (1.0 - i as f32 / (arm as f32 + 1.0));
                    self.put(px + i, py, fade, sprite.color);
                    self.put(px - i, py, fade, sprite.color);
                    self.put(px, py + i, fade, sprite.color);
                    self.put(px, py - i, fade, sprite.color);
                }
                self.put(px, py, alpha, blend(sprite.color, HIGHLIGHT_COLOR, 0.5));
            }
            Shape::Fleck => self.put(px, py, alpha, sprite.color),
        }
    }

    fn emit_half_blocks(&mut self, bg_color: Rgb) -> std::io::Result<()> {
        let mut prev_top: Rgb = (255, 255, 255);
        let mut prev_bot: Rgb = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_idx = y * self.width + x;
                let bot_idx = if y + 1 < self.height { (y + 1) * self.width + x } else { top_idx };

                let (top_intensity, top_base) = self.glow_buffer[top_idx];
                let (bot_intensity, bot_base) = self.glow_buffer[bot_idx];
                let top = blend(bg_color, top_base, top_intensity.min(1.0));
                let bot = blend(bg_color, bot_base, bot_intensity.min(1.0));
                self.cell_bg[(y / 2) * self.width + x] = top;

                // Only emit color codes if changed
                if top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = (255, 255, 255);
            prev_bot = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }
        Ok(())
    }

    fn rows(&self) -> usize {
        self.height.div_ceil(2)
    }

    fn emit_sparkles(&mut self, scene: &Scene) -> std::io::Result<()> {
        let (cols, rows) = (self.width, self.rows());
        if cols == 0 || rows == 0 {
            return Ok(());
        }

        for (sparkle, pose) in &scene.sparkles {
            let Some(pose) = pose else { continue };
            if pose.opacity < 0.35 {
                continue;
            }
            let col = ((sparkle.x / 100.0 * cols as f32) as usize).min(cols - 1);
            let row = ((sparkle.y / 100.0 * rows as f32) as usize).min(rows - 1);
            let bg = self.cell_bg[row * cols + col];
            let fg = blend(bg, SPARKLE_COLOR, pose.opacity);
            write!(
                self.output_buf,
                "\x1b[{};{}H\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m✦",
                row + 1,
                col + 1,
                bg.0,
                bg.1,
                bg.2,
                fg.0,
                fg.1,
                fg.2
            )?;
        }
        Ok(())
    }

    fn emit_banner(&mut self, scene: &Scene) -> std::io::Result<()> {
        let text = format!("  {}  ", scene.message.text);
        let width = display_width(&text);
        let rows = self.rows();
        if width > self.width || rows == 0 {
            return Ok(());
        }

        let col = (self.width - width) / 2 + 1;
        let row = (rows / 2).saturating_sub(scene.message.lift.round() as usize) + 1;
        let count = text.chars().count().max(2);

        write!(self.output_buf, "\x1b[{};{}H\x1b[1m", row, col)?;
        write!(self.output_buf, "\x1b[38;2;{};{};{}m", TEXT_COLOR.0, TEXT_COLOR.1, TEXT_COLOR.2)?;
        for (i, ch) in text.chars().enumerate() {
            let bg = gradient(&BANNER_GRADIENT, i as f32 / (count - 1) as f32);
            write!(self.output_buf, "\x1b[48;2;{};{};{}m{}", bg.0, bg.1, bg.2, ch)?;
        }
        self.output_buf.extend_from_slice(b"\x1b[0m");
        Ok(())
    }

    fn emit_hint(&mut self) -> std::io::Result<()> {
        let rows = self.rows();
        let width = display_width(IDLE_HINT);
        if width > self.width || rows == 0 {
            return Ok(());
        }
        let bg = get_bg_color();
        write!(
            self.output_buf,
            "\x1b[{};{}H\x1b[48;2;{};{};{}m\x1b[38;2;{};{};{}m{}",
            rows / 2 + 1,
            (self.width - width) / 2 + 1,
            bg.0,
            bg.1,
            bg.2,
            HINT_COLOR.0,
            HINT_COLOR.1,
            HINT_COLOR.2,
            IDLE_HINT
        )
    }
}

impl Effect for CelebrationHost {
    fn update(&mut self, dt: f32) {
        if self.skip_advance {
            self.skip_advance = false;
        } else {
            self.effect.advance(Duration::from_secs_f32(dt));
        }

        if self.completed.replace(false) {
            self.completions += 1;
            info!("host saw completion #{}", self.completions);
            self.active = false;
            match self.after_completion {
                AfterCompletion::Wait => {}
                AfterCompletion::Repeat => self.arm_pending = true,
                AfterCompletion::Exit => self.exit = true,
            }
            self.sync_props();
        }
    }

    fn render(&mut self, stdout: &mut BufWriter<Stdout>) -> std::io::Result<()> {
        self.compose()?;
        stdout.write_all(&self.output_buf)?;
        stdout.flush()?;
        Ok(())
    }

    fn resize(&mut self, width: usize, height: usize) {
        debug!("resize to {}x{} pixels", width, height);
        self.width = width;
        self.height = height;
        self.glow_buffer = vec![(0.0, (0, 0, 0)); width * height];
        self.cell_bg = vec![(0, 0, 0); width * height.div_ceil(2)];
        self.output_buf = Vec::with_capacity(width * height * 25);
    }

    fn handle_event(&mut self, event: &Event) {
        if let Event::Key(key) = event {
            if key.kind == KeyEventKind::Press && key.code == KeyCode::Char(' ') {
                if self.active || self.arm_pending {
                    debug!("space pressed, cancelling");
                    self.set_active(false);
                } else {
                    debug!("space pressed, celebration starts next frame");
                    self.arm_pending = true;
                }
            }
        }
    }

    fn finished(&self) -> bool {
        self.exit
    }
}

fn blend(from: Rgb, to: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    (
        (from.0 as f32 * (1.0 - t) + to.0 as f32 * t) as u8,
        (from.1 as f32 * (1.0 - t) + to.1 as f32 * t) as u8,
        (from.2 as f32 * (1.0 - t) + to.2 as f32 * t) as u8,
    )
}

fn gradient(stops: &[Rgb], t: f32) -> Rgb {
    let span = (stops.len() - 1) as f32;
    let pos = t.clamp(0.0, 1.0) * span;
    let i = (pos.floor() as usize).min(stops.len() - 2);
    blend(stops[i], stops[i + 1], pos - i as f32)
}

/// Terminal columns taken by `text`; emoji pictographs are double width.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| if ('\u{1F300}'..='\u{1FAFF}').contains(&ch) { 2 } else { 1 })
        .sum()
}

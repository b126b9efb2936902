use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::fs::File;
use std::io::{self, stdout, BufWriter, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use celebrate::config::{self, parse_hex_color, CelebrationConfig, Rgb, Variant};
use celebrate::effects::celebration::{AfterCompletion, CelebrationHost};
use celebrate::effects::Effect;

#[derive(Parser, Debug)]
#[command(name = "celebrate")]
#[command(about = "Terminal celebration overlay: balloons, confetti, stars and party poppers")]
#[command(after_help = "Press space to start or cancel a celebration, 'q', ESC, or Ctrl+C to exit")]
struct Args {
    /// Which celebration to play
    #[arg(value_enum, default_value_t = Variant::Milestone)]
    variant: Variant,

    /// Replace the congratulations message
    #[arg(long)]
    message: Option<String>,

    /// Leave out the golden stars
    #[arg(long)]
    no_stars: bool,

    /// Leave out the party poppers
    #[arg(long)]
    no_poppers: bool,

    /// Background color as hex (e.g. --bg-color 1a1b26)
    #[arg(long, value_name = "RRGGBB", value_parser = parse_hex_color)]
    bg_color: Option<Rgb>,

    /// Start a new celebration as soon as one finishes
    #[arg(long, conflicts_with = "once")]
    repeat: bool,

    /// Exit after the first celebration finishes
    #[arg(long)]
    once: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn celebration_config(&self) -> CelebrationConfig {
        let mut config = CelebrationConfig::from_variant(self.variant);
        if let Some(message) = &self.message {
            config = config.with_message(message.clone());
        }
        if self.no_stars {
            config = config.with_stars(false);
        }
        if self.no_poppers {
            config = config.with_poppers(false);
        }
        config
    }

    fn after_completion(&self) -> AfterCompletion {
        if self.once {
            AfterCompletion::Exit
        } else if self.repeat {
            AfterCompletion::Repeat
        } else {
            AfterCompletion::Wait
        }
    }
}

/// Logging is off unless RUST_LOG asks for it, since stderr shares the
/// alternate screen.
fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"));
    if let Some(path) = log_file {
        let file = File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(file)))
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env();
    }
    builder.init();
    Ok(())
}

/// Runs `enter` after raw mode is on. If it fails, raw mode is turned back
/// off with `restore` before the error is returned.
fn enter_or_restore(
    enter: impl FnOnce() -> io::Result<()>,
    restore: impl FnOnce() -> io::Result<()>,
) -> Result<()> {
    if let Err(err) = enter() {
        if let Err(restore_err) = restore() {
            log::warn!("failed to disable raw mode: {}", restore_err);
        }
        return Err(err).context("Failed to enter alternate screen");
    }
    Ok(())
}

fn run_effect<E: Effect>(effect: &mut E, stdout: &mut BufWriter<Stdout>) -> Result<()> {
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    const FIXED_DT: f32 = 1.0 / 60.0;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    effect.handle_event(&event);
                }
                Event::Resize(cols, rows) => {
                    effect.resize(*cols as usize, *rows as usize * 2);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => effect.handle_event(&event),
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        // Clamped so simulated time never runs ahead of the wall clock
        accumulator += frame_time;
        if accumulator > FIXED_DT * 3.0 {
            accumulator = FIXED_DT * 3.0;
        }

        while accumulator >= FIXED_DT {
            effect.update(FIXED_DT);
            accumulator -= FIXED_DT;
        }

        if effect.finished() {
            break;
        }

        effect.render(stdout)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    if let Some(color) = args.bg_color {
        config::set_bg_color(color);
    }

    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout());

    terminal::enable_raw_mode().context("Failed to enable raw mode")?;
    enter_or_restore(
        || execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All)),
        terminal::disable_raw_mode,
    )?;

    let result = terminal::size()
        .context("Failed to read terminal size")
        .and_then(|(cols, rows)| {
            let mut host = CelebrationHost::new(
                cols as usize,
                rows as usize * 2,
                args.celebration_config(),
                args.after_completion(),
            );
            log::info!(
                "celebrating {:?} on a {}x{} terminal",
                host.effect().config().message,
                cols,
                rows
            );
            run_effect(&mut host, &mut stdout)
        });

    // Restore the terminal even if the loop failed
    execute!(stdout, Show, LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;

    result
}

use std::sync::OnceLock;
use thiserror::Error;

pub type Rgb = (u8, u8, u8);

static BG_COLOR: OnceLock<Rgb> = OnceLock::new();

/// Sets the process-wide background color. Only the first call wins.
pub fn set_bg_color(color: Rgb) {
    let _ = BG_COLOR.set(color);
}

pub fn get_bg_color() -> Rgb {
    *BG_COLOR.get().unwrap_or(&(0, 0, 0))
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid hex color `{0}`, expected RRGGBB (e.g. 1a1b26)")]
    InvalidHexColor(String),
}

/// Preset celebrations. `Revenue` is the plain balloons-and-confetti
/// version, `Milestone` adds the golden stars and both party poppers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Variant {
    Revenue,
    Milestone,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CelebrationConfig {
    pub message: String,
    pub include_stars: bool,
    pub include_poppers: bool,
}

impl CelebrationConfig {
    pub fn from_variant(variant: Variant) -> Self {
        match variant {
            Variant::Revenue => Self {
                message: "🎉 Congratulations! Revenue Goal Achieved! 🎉".to_string(),
                include_stars: false,
                include_poppers: false,
            },
            Variant::Milestone => Self {
                message: "🎉 Congratulations! Goal Achieved! 🎉".to_string(),
                include_stars: true,
                include_poppers: true,
            },
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_stars(mut self, include: bool) -> Self {
        self.include_stars = include;
        self
    }

    pub fn with_poppers(mut self, include: bool) -> Self {
        self.include_poppers = include;
        self
    }
}

impl Default for CelebrationConfig {
    fn default() -> Self {
        Self::from_variant(Variant::Milestone)
    }
}

pub fn parse_hex_color(hex: &str) -> Result<Rgb, ConfigError> {
    let invalid = || ConfigError::InvalidHexColor(hex.to_string());

    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).map_err(|_| invalid());

    Ok((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

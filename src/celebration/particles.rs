use crate::config::{CelebrationConfig, Rgb};
use fastrand::Rng;

pub const BALLOON_COUNT: usize = 15;
pub const CONFETTI_COUNT: usize = 50;
pub const STAR_COUNT: usize = 30;
pub const POPPER_COUNT: usize = 40;
pub const SPARKLE_COUNT: usize = 20;

const BALLOON_COLORS: [Rgb; 7] = [
    (0xff, 0x6b, 0x6b), // Coral
    (0x4e, 0xcd, 0xc4), // Teal
    (0x45, 0xb7, 0xd1), // Sky
    (0x96, 0xce, 0xb4), // Sage
    (0xfe, 0xca, 0x57), // Mustard
    (0xff, 0x9f, 0xf3), // Pink
    (0x54, 0xa0, 0xff), // Blue
];

const CONFETTI_COLORS: [Rgb; 8] = [
    (0xff, 0x6b, 0x6b),
    (0x4e, 0xcd, 0xc4),
    (0x45, 0xb7, 0xd1),
    (0x96, 0xce, 0xb4),
    (0xfe, 0xca, 0x57),
    (0xff, 0x9f, 0xf3),
    (0x54, 0xa0, 0xff),
    (0x5f, 0x27, 0xcd), // Violet
];

pub const STAR_COLOR: Rgb = (255, 215, 0);

#[derive(Clone, Debug, PartialEq)]
pub struct Balloon {
    pub x: f32,
    pub delay: f32,
    pub color: Rgb,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfettiPiece {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub color: Rgb,
    pub delay: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GoldenStar {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub delay: f32,
    pub duration: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Party-popper confetti. Positions are percentages of the viewport and the
/// velocity is the total displacement over one burst, so `vy` is negative
/// (upward) for both sides and `vx` points away from the launching corner.
#[derive(Clone, Debug, PartialEq)]
pub struct PopperPiece {
    pub side: Side,
    pub origin_x: f32,
    pub origin_y: f32,
    pub vx: f32,
    pub vy: f32,
    pub rotation: f32,
    pub color: Rgb,
    pub delay: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sparkle {
    pub x: f32,
    pub y: f32,
    pub delay: f32,
}

/// Everything that stays fixed for one activation cycle. Sparkles are not
/// part of it; they are scattered again on every render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Particles {
    pub balloons: Vec<Balloon>,
    pub confetti: Vec<ConfettiPiece>,
    pub stars: Vec<GoldenStar>,
    pub left_poppers: Vec<PopperPiece>,
    pub right_poppers: Vec<PopperPiece>,
}

/// Draws from `[low, high)`. Rounding in `low + f * span` can land on
/// `high`, so the result is pulled back below it.
fn uniform(rng: &mut Rng, low: f32, high: f32) -> f32 {
    (low + rng.f32() * (high - low)).min(below(high))
}

// Neighbouring floats; bounds are never zero
fn below(value: f32) -> f32 {
    if value > 0.0 {
        f32::from_bits(value.to_bits() - 1)
    } else {
        f32::from_bits(value.to_bits() + 1)
    }
}

fn above(value: f32) -> f32 {
    if value > 0.0 {
        f32::from_bits(value.to_bits() + 1)
    } else {
        f32::from_bits(value.to_bits() - 1)
    }
}

fn pick(rng: &mut Rng, palette: &[Rgb]) -> Rgb {
    palette[rng.usize(0..palette.len())]
}

impl Balloon {
    fn random(rng: &mut Rng) -> Self {
        Self {
            x: uniform(rng, 0.0, 100.0),
            delay: uniform(rng, 0.0, 2.0),
            color: pick(rng, &BALLOON_COLORS),
        }
    }
}

impl ConfettiPiece {
    fn random(rng: &mut Rng) -> Self {
        Self {
            x: uniform(rng, 0.0, 100.0),
            y: uniform(rng, 0.0, 100.0),
            rotation: uniform(rng, 0.0, 360.0),
            color: pick(rng, &CONFETTI_COLORS),
            delay: uniform(rng, 0.0, 3.0),
        }
    }
}

impl GoldenStar {
    fn random(rng: &mut Rng) -> Self {
        Self {
            x: uniform(rng, 0.0, 100.0),
            y: uniform(rng, 0.0, 100.0),
            size: uniform(rng, 15.0, 35.0),
            delay: uniform(rng, 0.0, 2.0),
            duration: uniform(rng, 2.0, 4.0),
        }
    }
}

impl PopperPiece {
    fn random(rng: &mut Rng, side: Side) -> Self {
        // Drawn for the left corner, then mirrored for the right one
        let offset = uniform(rng, 0.0, 5.0);
        let speed = uniform(rng, 20.0, 60.0);
        let (origin_x, vx) = match side {
            Side::Left => (offset, speed),
            Side::Right => ((100.0 - offset).max(above(95.0)), -speed),
        };

        Self {
            side,
            origin_x,
            origin_y: uniform(rng, 95.0, 100.0),
            vx,
            vy: uniform(rng, -90.0, -40.0),
            rotation: uniform(rng, 0.0, 360.0),
            color: pick(rng, &CONFETTI_COLORS),
            delay: uniform(rng, 0.0, 0.5),
        }
    }
}

impl Sparkle {
    pub fn scatter(rng: &mut Rng) -> Vec<Sparkle> {
        (0..SPARKLE_COUNT)
            .map(|_| Sparkle {
                x: uniform(rng, 0.0, 100.0),
                y: uniform(rng, 0.0, 100.0),
                delay: uniform(rng, 0.0, 2.0),
            })
            .collect()
    }
}

impl Particles {
    pub fn generate(rng: &mut Rng, config: &CelebrationConfig) -> Self {
        let balloons = (0..BALLOON_COUNT).map(|_| Balloon::random(rng)).collect();
        let confetti = (0..CONFETTI_COUNT).map(|_| ConfettiPiece::random(rng)).collect();

        let stars = if config.include_stars {
            (0..STAR_COUNT).map(|_| GoldenStar::random(rng)).collect()
        } else {
            Vec::new()
        };

        let (left_poppers, right_poppers) = if config.include_poppers {
            (
                (0..POPPER_COUNT).map(|_| PopperPiece::random(rng, Side::Left)).collect(),
                (0..POPPER_COUNT).map(|_| PopperPiece::random(rng, Side::Right)).collect(),
            )
        } else {
            (Vec::new(), Vec::new())
        };

        Self {
            balloons,
            confetti,
            stars,
            left_poppers,
            right_poppers,
        }
    }

    pub fn total(&self) -> usize {
        self.balloons.len()
            + self.confetti.len()
            + self.stars.len()
            + self.left_poppers.len()
            + self.right_poppers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // [low, high)
    fn within(value: f32, low: f32, high: f32) -> bool {
        value >= low && value < high
    }

    // (low, high]
    fn within_upper(value: f32, low: f32, high: f32) -> bool {
        value > low && value <= high
    }

    #[test]
    fn test_uniform_never_reaches_high() {
        let mut rng = Rng::with_seed(9);
        let high = above(1.0);
        for _ in 0..1000 {
            assert_eq!(uniform(&mut rng, 1.0, high), 1.0);
        }

        let high = above(-2.0);
        for _ in 0..1000 {
            assert_eq!(uniform(&mut rng, -2.0, high), -2.0);
        }
        assert!(below(-40.0) < -40.0);
        assert!(above(95.0) > 95.0);
    }

    #[test]
    fn test_collection_sizes() {
        let mut rng = Rng::with_seed(7);
        let particles = Particles::generate(&mut rng, &CelebrationConfig::default());

        assert_eq!(particles.balloons.len(), 15);
        assert_eq!(particles.confetti.len(), 50);
        assert_eq!(particles.stars.len(), 30);
        assert_eq!(particles.left_poppers.len(), 40);
        assert_eq!(particles.right_poppers.len(), 40);
        assert_eq!(particles.total(), 175);
    }

    #[test]
    fn test_disabled_layers_are_empty() {
        let mut rng = Rng::with_seed(7);
        let config = CelebrationConfig::default().with_stars(false).with_poppers(false);
        let particles = Particles::generate(&mut rng, &config);

        assert_eq!(particles.balloons.len(), BALLOON_COUNT);
        assert_eq!(particles.confetti.len(), CONFETTI_COUNT);
        assert!(particles.stars.is_empty());
        assert!(particles.left_poppers.is_empty());
        assert!(particles.right_poppers.is_empty());
    }

    #[test]
    fn test_ranges_hold_across_trials() {
        let mut rng = Rng::with_seed(0xC0FFEE);
        let config = CelebrationConfig::default();

        for _ in 0..200 {
            let p = Particles::generate(&mut rng, &config);

            for b in &p.balloons {
                assert!(within(b.x, 0.0, 100.0));
                assert!(within(b.delay, 0.0, 2.0));
                assert!(BALLOON_COLORS.contains(&b.color));
            }
            for c in &p.confetti {
                assert!(within(c.x, 0.0, 100.0));
                assert!(within(c.y, 0.0, 100.0));
                assert!(within(c.rotation, 0.0, 360.0));
                assert!(within(c.delay, 0.0, 3.0));
                assert!(CONFETTI_COLORS.contains(&c.color));
            }
            for s in &p.stars {
                assert!(within(s.x, 0.0, 100.0));
                assert!(within(s.y, 0.0, 100.0));
                assert!(within(s.size, 15.0, 35.0));
                assert!(within(s.delay, 0.0, 2.0));
                assert!(within(s.duration, 2.0, 4.0));
            }
            for piece in &p.left_poppers {
                assert_eq!(piece.side, Side::Left);
                assert!(within(piece.origin_x, 0.0, 5.0));
                assert!(within(piece.vx, 20.0, 60.0), "left popper vx {}", piece.vx);
            }
            for piece in &p.right_poppers {
                assert_eq!(piece.side, Side::Right);
                assert!(within_upper(piece.origin_x, 95.0, 100.0));
                assert!(within_upper(piece.vx, -60.0, -20.0), "right popper vx {}", piece.vx);
            }
            for piece in p.left_poppers.iter().chain(&p.right_poppers) {
                assert!(within(piece.origin_y, 95.0, 100.0));
                assert!(within(piece.vy, -90.0, -40.0), "popper vy {}", piece.vy);
                assert!(within(piece.rotation, 0.0, 360.0));
                assert!(within(piece.delay, 0.0, 0.5));
                assert!(CONFETTI_COLORS.contains(&piece.color));
            }
        }
    }

    #[test]
    fn test_sparkle_scatter() {
        let mut rng = Rng::with_seed(3);
        let sparkles = Sparkle::scatter(&mut rng);
        assert_eq!(sparkles.len(), SPARKLE_COUNT);
        for s in &sparkles {
            assert!(within(s.x, 0.0, 100.0));
            assert!(within(s.y, 0.0, 100.0));
            assert!(within(s.delay, 0.0, 2.0));
        }
        assert_ne!(sparkles, Sparkle::scatter(&mut rng));
    }

    #[test]
    fn test_generations_differ() {
        let mut rng = Rng::new();
        let config = CelebrationConfig::default();
        let first = Particles::generate(&mut rng, &config);
        let second = Particles::generate(&mut rng, &config);
        assert_ne!(first, second);
    }
}

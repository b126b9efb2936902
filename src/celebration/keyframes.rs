//! Keyframe curves for each particle layer.
//!
//! Every curve is a pure function of the time since activation: nothing is
//! integrated frame to frame, so a pose can be computed for any instant. A
//! curve returns `None` while the particle is still waiting out its delay or
//! once its animation has run to the end.

use super::particles::{Balloon, ConfettiPiece, GoldenStar, PopperPiece, Sparkle};
use noise::{NoiseFn, Perlin};
use std::f32::consts::{PI, TAU};

pub const FLOAT_UP_SECS: f32 = 4.0;
pub const CONFETTI_FALL_SECS: f32 = 3.0;
pub const BURST_SECS: f32 = 1.5;
pub const SPARKLE_SECS: f32 = 2.0;
pub const BOUNCE_SECS: f32 = 1.0;

/// Position in viewport percent plus the visual modifiers a layer needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub opacity: f32,
    pub scale: f32,
    pub rotation: f32,
}

impl Pose {
    fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            opacity: 1.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

pub fn ease_out(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

/// Progress through a one-shot animation, or `None` outside of it.
fn progress(elapsed: f32, delay: f32, duration: f32) -> Option<f32> {
    let t = (elapsed - delay) / duration;
    (0.0..=1.0).contains(&t).then_some(t)
}

/// Phase through a looping animation, or `None` before it starts.
fn looping(elapsed: f32, delay: f32, duration: f32) -> Option<f32> {
    let local = elapsed - delay;
    (local >= 0.0).then(|| (local % duration) / duration)
}

/// Fade over the final `tail` fraction of an animation.
fn fade_tail(t: f32, tail: f32) -> f32 {
    if t < 1.0 - tail { 1.0 } else { ((1.0 - t) / tail).clamp(0.0, 1.0) }
}

/// Balloon rising from below the bottom edge to past the top, drifting
/// sideways on a per-balloon noise track.
pub fn float_up(balloon: &Balloon, index: usize, elapsed: f32, perlin: &Perlin) -> Option<Pose> {
    let t = progress(elapsed, balloon.delay, FLOAT_UP_SECS)?;

    let sway = perlin.get([index as f64 * 0.73, elapsed as f64 * 0.6]) as f32 * 4.0;
    let mut pose = Pose::at(balloon.x + sway, 110.0 - ease_in_out(t) * 130.0);
    pose.rotation = sway * 2.0;
    pose.opacity = fade_tail(t, 0.1);
    Some(pose)
}

/// Confetti dropping from its resting spot while spinning twice around.
pub fn confetti_fall(piece: &ConfettiPiece, elapsed: f32) -> Option<Pose> {
    let t = progress(elapsed, piece.delay, CONFETTI_FALL_SECS)?;

    let mut pose = Pose::at(piece.x, piece.y + t * t * 100.0);
    pose.rotation = (piece.rotation + t * 720.0) % 360.0;
    pose.opacity = fade_tail(t, 0.2);
    Some(pose)
}

/// Star pulsing in place, looping for as long as the overlay is up.
pub fn shine(star: &GoldenStar, elapsed: f32) -> Option<Pose> {
    let phase = looping(elapsed, star.delay, star.duration)?;

    let pulse = 0.5 - 0.5 * (phase * TAU).cos();
    let mut pose = Pose::at(star.x, star.y);
    pose.scale = (star.size / 35.0) * (0.6 + 0.4 * pulse);
    pose.opacity = 0.3 + 0.7 * pulse;
    pose.rotation = phase * 360.0;
    Some(pose)
}

/// Popper confetti flung out of its corner, decelerating and then sagging
/// back down as it fades.
pub fn burst(piece: &PopperPiece, elapsed: f32) -> Option<Pose> {
    let t = progress(elapsed, piece.delay, BURST_SECS)?;

    let travel = ease_out(t);
    let sag = 35.0 * t * t;
    let mut pose = Pose::at(piece.origin_x + piece.vx * travel, piece.origin_y + piece.vy * travel + sag);
    pose.rotation = (piece.rotation + t * 540.0) % 360.0;
    pose.opacity = 1.0 - t * t;
    Some(pose)
}

pub fn sparkle(sparkle: &Sparkle, elapsed: f32) -> Option<Pose> {
    let phase = looping(elapsed, sparkle.delay, SPARKLE_SECS)?;

    let mut pose = Pose::at(sparkle.x, sparkle.y);
    pose.opacity = (phase * PI).sin();
    pose.scale = pose.opacity;
    Some(pose)
}

/// Vertical lift of the message, in rows.
pub fn bounce(elapsed: f32) -> f32 {
    let phase = (elapsed.max(0.0) % BOUNCE_SECS) / BOUNCE_SECS;
    let height = 1.0 - (2.0 * phase - 1.0).abs();
    ease_out(height) * 1.5
}

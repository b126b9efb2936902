//! The celebration overlay component.
//!
//! [`CelebrationEffect`] is driven like a UI component: the host calls
//! [`CelebrationEffect::render`] with its current `active` flag and
//! completion callback every frame, and [`CelebrationEffect::advance`] with
//! the frame time. A false-to-true edge starts a cycle, which generates a
//! fresh set of particles and arms a 4 second completion timer.

pub mod keyframes;
pub mod particles;
pub mod scene;
pub mod timer;

use crate::config::CelebrationConfig;
use fastrand::Rng;
use log::{debug, info, trace};
use noise::Perlin;
use particles::{Particles, Sparkle, STAR_COLOR};
use scene::{Banner, Layer, LayerKind, Scene, Shape, Sprite};
use std::time::Duration;
use timer::{same_callback, Callback, CompletionTimer};

pub const COMPLETION_DELAY: Duration = Duration::from_millis(4000);

/// State of one activation, from the activation edge until the host
/// deactivates. The timer is `None` once it has fired.
struct Cycle {
    id: u64,
    particles: Particles,
    callback: Callback,
    timer: Option<CompletionTimer>,
    elapsed: Duration,
}

pub struct CelebrationEffect {
    config: CelebrationConfig,
    rng: Rng,
    perlin: Perlin,
    cycle: Option<Cycle>,
    cycles_started: u64,
}

impl CelebrationEffect {
    pub fn new(config: CelebrationConfig) -> Self {
        Self::from_rng(config, Rng::new())
    }

    pub fn with_seed(config: CelebrationConfig, seed: u64) -> Self {
        Self::from_rng(config, Rng::with_seed(seed))
    }

    fn from_rng(config: CelebrationConfig, mut rng: Rng) -> Self {
        let perlin = Perlin::new(rng.u32(..));
        Self {
            config,
            rng,
            perlin,
            cycle: None,
            cycles_started: 0,
        }
    }

    /// Applies the host's props and produces this frame's overlay, or `None`
    /// while inactive.
    pub fn render(&mut self, active: bool, on_complete: &Callback) -> Option<Scene> {
        self.set_props(active, on_complete);
        self.scene()
    }

    /// Reconciles the current cycle with the host's props. Only an
    /// activation edge or a different callback starts a new cycle.
    pub fn set_props(&mut self, active: bool, on_complete: &Callback) {
        let unchanged = self
            .cycle
            .as_ref()
            .map(|cycle| same_callback(&cycle.callback, on_complete));

        match (unchanged, active) {
            (None, false) => {}
            (Some(_), false) => self.cancel("deactivated"),
            (None, true) => self.start(on_complete.clone()),
            (Some(true), true) => {}
            (Some(false), true) => {
                self.cancel("completion callback replaced");
                self.start(on_complete.clone());
            }
        }
    }

    /// Moves the cycle clock forward, invoking the completion callback on
    /// the step that crosses the deadline.
    pub fn advance(&mut self, dt: Duration) {
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };

        cycle.elapsed = cycle.elapsed.saturating_add(dt);

        let fired = cycle.timer.as_mut().and_then(|timer| timer.advance(dt));
        if let Some(callback) = fired {
            cycle.timer = None;
            info!("celebration cycle {} complete after {:?}", cycle.id, cycle.elapsed);
            callback();
        }
    }

    /// Builds the overlay for the current instant. Sparkles are scattered
    /// anew on every call; all other layers come from the cycle's particles.
    pub fn scene(&mut self) -> Option<Scene> {
        let cycle = self.cycle.as_ref()?;
        let elapsed = cycle.elapsed.as_secs_f32();
        let particles = &cycle.particles;

        let mut layers = Vec::with_capacity(5);

        if self.config.include_stars {
            let sprites = particles
                .stars
                .iter()
                .filter_map(|star| {
                    keyframes::shine(star, elapsed).map(|pose| Sprite {
                        pose,
                        color: STAR_COLOR,
                        shape: Shape::Star(star.size),
                    })
                })
                .collect();
            layers.push(Layer {
                kind: LayerKind::Stars,
                sprites,
            });
        }

        if self.config.include_poppers {
            for (kind, pieces) in [
                (LayerKind::LeftPopper, &particles.left_poppers),
                (LayerKind::RightPopper, &particles.right_poppers),
            ] {
                let sprites = pieces
                    .iter()
                    .filter_map(|piece| {
                        keyframes::burst(piece, elapsed).map(|pose| Sprite {
                            pose,
                            color: piece.color,
                            shape: Shape::Fleck,
                        })
                    })
                    .collect();
                layers.push(Layer { kind, sprites });
            }
        }

        let balloons = particles
            .balloons
            .iter()
            .enumerate()
            .filter_map(|(i, balloon)| {
                keyframes::float_up(balloon, i, elapsed, &self.perlin).map(|pose| Sprite {
                    pose,
                    color: balloon.color,
                    shape: Shape::Balloon,
                })
            })
            .collect();
        layers.push(Layer {
            kind: LayerKind::Balloons,
            sprites: balloons,
        });

        let confetti = particles
            .confetti
            .iter()
            .filter_map(|piece| {
                keyframes::confetti_fall(piece, elapsed).map(|pose| Sprite {
                    pose,
                    color: piece.color,
                    shape: Shape::Confetti,
                })
            })
            .collect();
        layers.push(Layer {
            kind: LayerKind::Confetti,
            sprites: confetti,
        });

        let sparkles = Sparkle::scatter(&mut self.rng)
            .into_iter()
            .map(|sparkle| {
                let pose = keyframes::sparkle(&sparkle, elapsed);
                (sparkle, pose)
            })
            .collect();

        let scene = Scene {
            layers,
            sparkles,
            message: Banner {
                text: self.config.message.clone(),
                lift: keyframes::bounce(elapsed),
            },
        };
        trace!("celebration frame at {:.3}s: {} sprites", elapsed, scene.sprite_count());
        Some(scene)
    }

    pub fn is_active(&self) -> bool {
        self.cycle.is_some()
    }

    /// Whether a completion callback is still scheduled.
    pub fn is_pending(&self) -> bool {
        self.cycle.as_ref().is_some_and(|cycle| cycle.timer.is_some())
    }

    pub fn particles(&self) -> Option<&Particles> {
        self.cycle.as_ref().map(|cycle| &cycle.particles)
    }

    /// Number of cycles started so far.
    pub fn cycle(&self) -> u64 {
        self.cycles_started
    }

    pub fn config(&self) -> &CelebrationConfig {
        &self.config
    }

    fn start(&mut self, callback: Callback) {
        self.cycles_started += 1;
        let particles = Particles::generate(&mut self.rng, &self.config);
        debug!(
            "celebration cycle {} started with {} particles: {} balloons, {} confetti, {} stars, {}+{} popper pieces",
            self.cycles_started,
            particles.total(),
            particles.balloons.len(),
            particles.confetti.len(),
            particles.stars.len(),
            particles.left_poppers.len(),
            particles.right_poppers.len(),
        );

        let timer = CompletionTimer::new(COMPLETION_DELAY, callback.clone());
        self.cycle = Some(Cycle {
            id: self.cycles_started,
            particles,
            callback,
            timer: Some(timer),
            elapsed: Duration::ZERO,
        });
    }

    fn cancel(&mut self, reason: &str) {
        if let Some(cycle) = self.cycle.take() {
            if let Some(timer) = &cycle.timer {
                debug!(
                    "celebration cycle {} cancelled ({}) after {:?}, {:?} before completion",
                    cycle.id,
                    reason,
                    timer.elapsed(),
                    timer.remaining()
                );
            }
        }
    }
}

impl Drop for CelebrationEffect {
    fn drop(&mut self) {
        self.cancel("torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Variant;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counter() -> (Rc<Cell<u32>>, Callback) {
        let calls = Rc::new(Cell::new(0));
        let hits = calls.clone();
        let callback: Callback = Rc::new(move || hits.set(hits.get() + 1));
        (calls, callback)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn effect() -> CelebrationEffect {
        CelebrationEffect::with_seed(CelebrationConfig::default(), 42)
    }

    #[test]
    fn test_inactive_renders_nothing() {
        let (calls, callback) = counter();
        let mut effect = effect();

        assert!(effect.render(false, &callback).is_none());
        assert!(!effect.is_active());
        assert!(!effect.is_pending());
        assert!(effect.particles().is_none());

        effect.advance(ms(10_000));
        assert_eq!(calls.get(), 0);
        assert_eq!(effect.cycle(), 0);
    }

    #[test]
    fn test_activation_generates_all_layers() {
        let (_calls, callback) = counter();
        let mut effect = effect();

        assert!(effect.render(true, &callback).is_some());
        assert!(effect.is_pending());

        let particles = effect.particles().unwrap();
        assert_eq!(particles.balloons.len(), 15);
        assert_eq!(particles.confetti.len(), 50);
        assert_eq!(particles.stars.len(), 30);
        assert_eq!(particles.left_poppers.len(), 40);
        assert_eq!(particles.right_poppers.len(), 40);
    }

    #[test]
    fn test_completes_after_four_seconds() {
        let (calls, callback) = counter();
        let mut effect = effect();

        effect.render(true, &callback);
        effect.advance(ms(3999));
        assert_eq!(calls.get(), 0);
        assert!(effect.is_pending());

        effect.advance(ms(1));
        assert_eq!(calls.get(), 1);
        assert!(!effect.is_pending());

        // Still on screen until the host lets go, but no second callback
        effect.advance(ms(10_000));
        assert!(effect.render(true, &callback).is_some());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_fixed_step_completion() {
        let (calls, callback) = counter();
        let mut effect = effect();
        effect.render(true, &callback);

        let step = Duration::from_secs_f32(1.0 / 60.0);
        let mut steps = 0;
        while calls.get() == 0 {
            effect.advance(step);
            steps += 1;
            assert!(steps < 1000);
        }
        assert!(step * steps >= COMPLETION_DELAY);
    }

    #[test]
    fn test_deactivation_cancels() {
        let (calls, callback) = counter();
        let mut effect = effect();

        effect.render(true, &callback);
        effect.advance(ms(1000));
        assert!(effect.render(false, &callback).is_none());
        assert!(!effect.is_pending());

        effect.advance(ms(10_000));
        assert_eq!(calls.get(), 0);
        assert_eq!(Rc::strong_count(&callback), 1);
    }

    #[test]
    fn test_reactivation_starts_fresh_cycle() {
        let (calls, callback) = counter();
        let mut effect = effect();

        effect.render(true, &callback);
        let first = effect.particles().cloned().unwrap();
        effect.advance(ms(4000));
        assert_eq!(calls.get(), 1);

        effect.render(false, &callback);
        effect.render(true, &callback);
        let second = effect.particles().cloned().unwrap();
        assert_ne!(first, second);
        assert_eq!(effect.cycle(), 2);

        effect.advance(ms(4000));
        assert_eq!(calls.get(), 2);
        effect.advance(ms(4000));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_rerender_is_idempotent() {
        let (calls, callback) = counter();
        let mut effect = effect();

        effect.render(true, &callback);
        let particles = effect.particles().cloned().unwrap();

        effect.advance(ms(2000));
        for _ in 0..10 {
            effect.render(true, &callback);
            effect.render(true, &callback.clone());
        }
        assert_eq!(effect.particles(), Some(&particles));
        assert_eq!(effect.cycle(), 1);

        // Not rescheduled: the original deadline still holds
        effect.advance(ms(2000));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_replaced_callback_restarts_cycle() {
        let (first_calls, first) = counter();
        let (second_calls, second) = counter();
        let mut effect = effect();

        effect.render(true, &first);
        effect.advance(ms(3000));
        effect.render(true, &second);
        assert_eq!(effect.cycle(), 2);

        effect.advance(ms(1000));
        assert_eq!(first_calls.get(), 0);
        assert_eq!(second_calls.get(), 0);

        effect.advance(ms(3000));
        assert_eq!(first_calls.get(), 0);
        assert_eq!(second_calls.get(), 1);
    }

    #[test]
    fn test_drop_releases_pending_callback() {
        let (calls, callback) = counter();
        let mut effect = effect();
        effect.render(true, &callback);
        assert_eq!(Rc::strong_count(&callback), 3);

        drop(effect);
        assert_eq!(Rc::strong_count(&callback), 1);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_sparkles_rescatter_every_render() {
        let (_calls, callback) = counter();
        let mut effect = effect();

        let first = effect.render(true, &callback).unwrap();
        let second = effect.render(true, &callback).unwrap();
        assert_eq!(first.sparkles.len(), 20);
        assert_ne!(first.sparkles, second.sparkles);
        assert_eq!(first.layers, second.layers);
    }

    #[test]
    fn test_scene_layers_mid_cycle() {
        let (_calls, callback) = counter();
        let mut effect = effect();
        effect.render(true, &callback);

        effect.advance(ms(2500));
        let scene = effect.scene().unwrap();
        assert_eq!(scene.layer(LayerKind::Balloons).unwrap().sprites.len(), 15);
        assert_eq!(scene.layer(LayerKind::Stars).unwrap().sprites.len(), 30);
        assert!(scene.layer(LayerKind::LeftPopper).is_some());
        assert!(scene.layer(LayerKind::RightPopper).is_some());
        assert!(scene.message.text.contains("Congratulations"));

        effect.advance(ms(500));
        let scene = effect.scene().unwrap();
        assert_eq!(scene.layer(LayerKind::Confetti).unwrap().sprites.len(), 50);
    }

    #[test]
    fn test_revenue_variant_has_no_extra_layers() {
        let (_calls, callback) = counter();
        let config = CelebrationConfig::from_variant(Variant::Revenue);
        let mut effect = CelebrationEffect::with_seed(config, 9);

        let scene = effect.render(true, &callback).unwrap();
        assert!(scene.layer(LayerKind::Stars).is_none());
        assert!(scene.layer(LayerKind::LeftPopper).is_none());
        assert!(scene.layer(LayerKind::RightPopper).is_none());
        assert!(scene.message.text.contains("Revenue Goal Achieved"));
    }

    #[test]
    fn test_config_reflects_variant() {
        let config = CelebrationConfig::default().with_message("Shipped!").with_poppers(false);
        let effect = CelebrationEffect::with_seed(config.clone(), 2);
        assert_eq!(effect.config(), &config);
        assert!(effect.config().include_stars);
    }
}

use super::keyframes::Pose;
use super::particles::Sparkle;
use crate::config::Rgb;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Stars,
    LeftPopper,
    RightPopper,
    Balloons,
    Confetti,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    Balloon,
    Confetti,
    /// Star with its generated size (15-35)
    Star(f32),
    Fleck,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    pub pose: Pose,
    pub color: Rgb,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub sprites: Vec<Sprite>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Banner {
    pub text: String,
    pub lift: f32,
}

/// One render pass of the celebration overlay, back to front.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub layers: Vec<Layer>,
    pub sparkles: Vec<(Sparkle, Option<Pose>)>,
    pub message: Banner,
}

impl Scene {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.kind == kind)
    }

    pub fn sprite_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.sprites.len()).sum()
    }
}

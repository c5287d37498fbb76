//! Keeps capsule bodies standing on the terrain.

use engine_core::HeightSampler;
use glam::Vec3;

use crate::collision::{Collider, ColliderShape};

/// An entity the grounding pass can move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub collider: Collider,
}

impl Body {
    pub fn new(position: Vec3, collider: Collider) -> Self {
        Self { position, collider }
    }
}

/// Snaps every capsule to the ground each step.
///
/// A capsule whose bounds carry a height is centred half that height above
/// the ground; otherwise its origin sits on the ground. Other shapes are left
/// alone, as is everything while no terrain is set.
#[derive(Debug)]
pub struct GroundingSystem<S> {
    terrain: Option<S>,
}

impl<S> Default for GroundingSystem<S> {
    fn default() -> Self {
        Self { terrain: None }
    }
}

impl<S: HeightSampler> GroundingSystem<S> {
    pub fn new() -> Self {
        Self { terrain: None }
    }

    pub fn with_terrain(terrain: S) -> Self {
        Self { terrain: Some(terrain) }
    }

    pub fn set_terrain(&mut self, terrain: S) {
        self.terrain = Some(terrain);
    }

    pub fn terrain(&self) -> Option<&S> {
        self.terrain.as_ref()
    }

    /// Ground one body. Returns whether it was moved onto the terrain.
    pub fn ground(&self, position: &mut Vec3, collider: &Collider) -> bool {
        let Some(terrain) = &self.terrain else {
            return false;
        };
        if collider.shape != ColliderShape::Capsule {
            return false;
        }
        let ground = terrain.height_at(position.x, position.z);
        position.y = match collider.height() {
            Some(h) if h != 0.0 => ground + h / 2.0,
            _ => ground,
        };
        true
    }

    /// Ground every body; returns how many were snapped.
    pub fn step(&self, bodies: &mut [Body]) -> usize {
        bodies
            .iter_mut()
            .map(|b| self.ground(&mut b.position, &b.collider))
            .filter(|&moved| moved)
            .count()
    }
}

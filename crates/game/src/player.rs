//! Player controller and state.

use std::path::{Path, PathBuf};

use engine_core::{HeightSampler, Vec3};
use physics::Collider;
use serde::{Deserialize, Serialize};

/// Capsule height, head to feet.
pub const PLAYER_HEIGHT: f32 = 1.8;
pub const PLAYER_RADIUS: f32 = 0.4;

const EYE_HEIGHT_FACTOR: f32 = 0.4;
const LOOK_DISTANCE: f32 = 10.0;
const THIRD_PERSON_DISTANCE: f32 = 5.0;
const THIRD_PERSON_RISE: f32 = 3.0;
const PITCH_LIMIT: f32 = std::f32::consts::PI * 0.4;

/// Head bob.
const BOB_SPEED: f32 = 8.0;
const BOB_AMOUNT: f32 = 0.08;
const BOB_AMOUNT_SIDE: f32 = 0.04;
const BOB_DECAY: f32 = 0.9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    FirstPerson,
    ThirdPerson,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::FirstPerson => Self::ThirdPerson,
            Self::ThirdPerson => Self::FirstPerson,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    #[default]
    Forward,
    Backward,
    Left,
    Right,
}

/// What survives a restart. Saved to `player.ron`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default = "default_position")]
    pub position: [f32; 3],
}

fn default_position() -> [f32; 3] {
    [0.0, -PLAYER_HEIGHT / 2.0, 5.0]
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::default(),
            position: default_position(),
        }
    }
}

impl PlayerState {
    /// Load from `player.ron`. If the file is missing or invalid, returns the default spawn.
    pub fn load() -> Self {
        Self::load_from(&state_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match ron::from_str(&data) {
                Ok(s) => return s,
                Err(e) => log::warn!("Invalid player state at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    /// Save to `player.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&state_path());
    }

    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write player state to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialise player state: {}", e),
        }
    }
}

fn state_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("player.ron")
}

/// Capsule walker. `position` is the base of the capsule.
#[derive(Debug, Clone)]
pub struct Player {
    pub position: Vec3,
    pub view_mode: ViewMode,
    /// Zero looks down −Z.
    pub yaw: f32,
    pub pitch: f32,
    pub move_speed: f32,
    pub collider: Collider,
    bob_time: f32,
    is_moving: bool,
}

impl Player {
    pub fn new(state: PlayerState) -> Self {
        Self {
            position: Vec3::from_array(state.position),
            view_mode: state.view_mode,
            yaw: 0.0,
            pitch: 0.0,
            move_speed: 3.0,
            collider: Collider::capsule(PLAYER_HEIGHT, PLAYER_RADIUS),
            bob_time: 0.0,
            is_moving: false,
        }
    }

    pub fn height(&self) -> f32 {
        self.collider.height().unwrap_or(PLAYER_HEIGHT)
    }

    pub fn state(&self) -> PlayerState {
        PlayerState {
            view_mode: self.view_mode,
            position: self.position.to_array(),
        }
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = self.view_mode.toggled();
        log::info!("View: {:?}", self.view_mode);
    }

    /// Horizontal unit vector the player faces.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Turn by `(d_yaw, d_pitch)` radians. Pitch is clamped.
    pub fn look(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw += d_yaw;
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Step `distance` meters relative to the facing direction.
    pub fn move_by(&mut self, direction: MoveDirection, distance: f32) {
        let delta = match direction {
            MoveDirection::Forward => self.forward(),
            MoveDirection::Backward => -self.forward(),
            MoveDirection::Left => -self.right(),
            MoveDirection::Right => self.right(),
        } * distance;
        self.position += delta;
        self.is_moving = true;
    }

    /// Advance head bob.
    pub fn update(&mut self, dt: f32) {
        if self.is_moving {
            self.bob_time += dt * BOB_SPEED;
        } else {
            self.bob_time *= BOB_DECAY;
        }
        self.is_moving = false;
    }

    /// Stand on the ground under the player.
    pub fn apply_terrain_collision<S: HeightSampler + ?Sized>(&mut self, terrain: &S) {
        self.position.y = terrain.height_at(self.position.x, self.position.z);
    }

    fn eye_height(&self) -> f32 {
        self.height() * EYE_HEIGHT_FACTOR
    }

    pub fn camera_position(&self) -> Vec3 {
        match self.view_mode {
            ViewMode::FirstPerson => {
                let bob_y = self.bob_time.sin() * BOB_AMOUNT;
                let bob_side = (self.bob_time * 0.5).sin() * BOB_AMOUNT_SIDE;
                self.position + Vec3::Y * (self.eye_height() + bob_y) + self.right() * bob_side
            }
            ViewMode::ThirdPerson => {
                let back = -self.forward() * self.pitch.cos() * THIRD_PERSON_DISTANCE;
                self.position + back + Vec3::Y * (self.height() + self.pitch.sin() * THIRD_PERSON_RISE)
            }
        }
    }

    pub fn camera_target(&self) -> Vec3 {
        match self.view_mode {
            ViewMode::FirstPerson => {
                let look = self.forward() * self.pitch.cos() + Vec3::Y * self.pitch.sin();
                self.position + Vec3::Y * self.eye_height() + look * LOOK_DISTANCE
            }
            ViewMode::ThirdPerson => self.position,
        }
    }
}

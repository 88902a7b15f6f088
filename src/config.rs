//! Game tuning configuration from game.toml files.
//!
//! Every value defaults to the shipped tuning, so a partial file (or no file
//! at all) is valid. Loading validates the physically-sensitive ranges and
//! is the only place jump speed, airborne gravity and the ground-slope
//! cosine are derived; the simulation core assumes they are ready before
//! the first step.

use serde::Deserialize;
use std::path::Path;

use crate::game::locomotion::LocomotionTuning;

/// Player tuning section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Max speed the player can reach.
    pub max_speed: f32,
    /// The rate at which velocity changes while grounded.
    pub acceleration: f32,
    /// The rate at which velocity changes while airborne.
    pub air_acceleration: f32,
    /// Peak height of a jump relative to its starting position.
    pub jump_height: f32,
    /// Time taken to reach the jump height.
    pub time_to_apex: f32,
    /// How long a jump request stays valid before touching ground, seconds.
    pub jump_buffer: f32,
    /// Model rotation speed in degrees per second.
    pub rotation_speed: f32,
    /// Max slope angle in degrees still considered ground and not wall.
    pub max_ground_angle: f32,
    /// Max speed at which the player still snaps to the ground when
    /// launching off a slope.
    pub max_snap_speed: f32,
    /// Length of the downward probe checking whether snapping is needed.
    pub probe_distance: f32,
    pub bullet_speed: f32,
    pub attack_delay: f32,
    /// Full angle in degrees within which the attack homes on an enemy.
    pub field_of_shooting: f32,
    pub shoot_radius: f32,
    /// Knockback speed applied when an enemy touches the player.
    pub shock_speed: f32,
    /// How long input stays locked after taking a hit, seconds.
    pub shock_time: f32,
    pub max_health: f32,
    pub dash_speed: f32,
    pub dash_cooldown: f32,
    pub dash_duration: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_speed: 15.0,
            acceleration: 100.0,
            air_acceleration: 25.0,
            jump_height: 4.0,
            time_to_apex: 0.3,
            jump_buffer: 0.2,
            rotation_speed: 90.0,
            max_ground_angle: 40.0,
            max_snap_speed: 100.0,
            probe_distance: 3.0,
            bullet_speed: 50.0,
            attack_delay: 0.2,
            field_of_shooting: 120.0,
            shoot_radius: 10.0,
            shock_speed: 15.0,
            shock_time: 0.5,
            max_health: 100.0,
            dash_speed: 30.0,
            dash_cooldown: 1.0,
            dash_duration: 0.2,
        }
    }
}

impl PlayerConfig {
    /// Derive the locomotion constants for this tuning.
    pub fn locomotion(&self) -> LocomotionTuning {
        let jump_speed = 2.0 * self.jump_height / self.time_to_apex;
        LocomotionTuning {
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            air_acceleration: self.air_acceleration,
            jump_buffer: self.jump_buffer,
            max_snap_speed: self.max_snap_speed,
            probe_distance: self.probe_distance,
            jump_speed,
            jump_gravity: jump_speed / self.time_to_apex,
            min_ground_dot: self.max_ground_angle.to_radians().cos(),
        }
    }
}

/// Enemy tuning section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub max_speed: f32,
    pub acceleration: f32,
    /// Pursuit radius; outside it the enemy idles.
    pub follow_radius: f32,
    pub max_health: f32,
    /// Rest time after landing a hit on the player, seconds.
    pub delay_after_attack: f32,
    /// Damage dealt per touch.
    pub damage: f32,
    /// Slope and fall tuning shared with the player controller. The enemy
    /// never jumps, but it still falls and walks slopes the same way.
    pub max_ground_angle: f32,
    pub max_snap_speed: f32,
    pub probe_distance: f32,
    pub jump_height: f32,
    pub time_to_apex: f32,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            max_speed: 10.0,
            acceleration: 50.0,
            follow_radius: 5.0,
            max_health: 100.0,
            delay_after_attack: 1.0,
            damage: 20.0,
            max_ground_angle: 40.0,
            max_snap_speed: 100.0,
            probe_distance: 3.0,
            jump_height: 4.0,
            time_to_apex: 0.3,
        }
    }
}

impl EnemyConfig {
    /// Derive the locomotion constants for this tuning. Air acceleration
    /// matches ground acceleration: the enemy has no deliberate air control
    /// to limit, and a zero jump buffer means no jump ever fires.
    pub fn locomotion(&self) -> LocomotionTuning {
        let jump_speed = 2.0 * self.jump_height / self.time_to_apex;
        LocomotionTuning {
            max_speed: self.max_speed,
            acceleration: self.acceleration,
            air_acceleration: self.acceleration,
            jump_buffer: 0.0,
            max_snap_speed: self.max_snap_speed,
            probe_distance: self.probe_distance,
            jump_speed,
            jump_gravity: jump_speed / self.time_to_apex,
            min_ground_dot: self.max_ground_angle.to_radians().cos(),
        }
    }
}

/// Bullet tuning section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BulletConfig {
    pub damage: f32,
    /// Seconds before an airborne bullet despawns on its own.
    pub life_span: f32,
}

impl Default for BulletConfig {
    fn default() -> Self {
        Self {
            damage: 20.0,
            life_span: 2.0,
        }
    }
}

/// Orbit camera tuning section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Fixed distance the camera keeps from the focus.
    pub distance: f32,
    /// Radius in which the camera ignores the focus object's movement.
    pub focus_radius: f32,
    /// Rate at which the camera re-centers its focus, 0..1.
    pub focus_centering: f32,
    /// Orbit rotation speed in degrees per second.
    pub rotation_speed: f32,
    pub min_vertical_angle: f32,
    pub max_vertical_angle: f32,
    /// Seconds after the last manual rotation before auto-alignment resumes.
    pub align_delay: f32,
    /// Heading delta in degrees under which auto-alignment slows down.
    pub align_smooth_range: f32,
    /// Near-plane box used for the obstruction sweep.
    pub near_plane: f32,
    pub field_of_view: f32,
    pub aspect: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            distance: 5.0,
            focus_radius: 1.0,
            focus_centering: 0.5,
            rotation_speed: 90.0,
            min_vertical_angle: 10.0,
            max_vertical_angle: 60.0,
            align_delay: 5.0,
            align_smooth_range: 45.0,
            near_plane: 0.3,
            field_of_view: 60.0,
            aspect: 16.0 / 9.0,
        }
    }
}

/// Root game configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub player: PlayerConfig,
    pub enemy: EnemyConfig,
    pub bullet: BulletConfig,
    pub camera: CameraConfig,
}

impl GameConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let mut config: GameConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate();
        Ok(config)
    }

    /// Clamp values into physically sane ranges. The simulation core trusts
    /// whatever comes out of here.
    pub fn validate(&mut self) {
        self.player.jump_height = self.player.jump_height.max(0.0);
        self.player.time_to_apex = self.player.time_to_apex.max(0.01);
        self.player.max_ground_angle = self.player.max_ground_angle.clamp(0.0, 89.0);
        self.player.max_snap_speed = self.player.max_snap_speed.clamp(0.0, 100.0);
        self.player.probe_distance = self.player.probe_distance.max(0.0);
        self.player.dash_duration = self.player.dash_duration.clamp(0.0, 0.4);

        self.enemy.jump_height = self.enemy.jump_height.max(0.0);
        self.enemy.time_to_apex = self.enemy.time_to_apex.max(0.01);
        self.enemy.max_ground_angle = self.enemy.max_ground_angle.clamp(0.0, 89.0);

        self.camera.focus_centering = self.camera.focus_centering.clamp(0.0, 1.0);
        self.camera.min_vertical_angle = self.camera.min_vertical_angle.clamp(-89.0, 89.0);
        if self.camera.max_vertical_angle < self.camera.min_vertical_angle {
            self.camera.max_vertical_angle = self.camera.min_vertical_angle;
        }
        self.camera.max_vertical_angle = self.camera.max_vertical_angle.clamp(-89.0, 89.0);
    }
}

/// Errors that can occur when loading game configuration
#[derive(Debug)]
pub enum ConfigError {
    Io(std::path::PathBuf, std::io::Error),
    Parse(std::path::PathBuf, toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => {
                write!(f, "Failed to read {}: {}", path.display(), e)
            }
            ConfigError::Parse(path, e) => {
                write!(f, "Failed to parse {}: {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_file() {
        let config = GameConfig::default();
        assert_eq!(config.player.max_speed, 15.0);
        assert_eq!(config.enemy.follow_radius, 5.0);
        assert_eq!(config.bullet.life_span, 2.0);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
            [player]
            max_speed = 20.0

            [enemy]
            damage = 35.0
        "#;
        let config: GameConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.player.max_speed, 20.0);
        assert_eq!(config.player.jump_height, 4.0);
        assert_eq!(config.enemy.damage, 35.0);
        assert_eq!(config.camera.distance, 5.0);
    }

    #[test]
    fn test_derived_jump_constants() {
        let tuning = PlayerConfig::default().locomotion();
        assert!((tuning.jump_speed - 26.667).abs() < 1.0e-3);
        assert!((tuning.jump_gravity - 88.889).abs() < 1.0e-3);
        assert!((tuning.min_ground_dot - 40.0_f32.to_radians().cos()).abs() < 1.0e-6);
    }

    #[test]
    fn test_validate_clamps_camera_angles() {
        let mut config = GameConfig::default();
        config.camera.min_vertical_angle = 50.0;
        config.camera.max_vertical_angle = 20.0;
        config.validate();
        assert_eq!(config.camera.max_vertical_angle, 50.0);
    }

    #[test]
    fn test_validate_rejects_negative_jump_height() {
        let mut config = GameConfig::default();
        config.player.jump_height = -3.0;
        config.validate();
        assert_eq!(config.player.jump_height, 0.0);
        assert_eq!(config.player.locomotion().jump_speed, 0.0);
    }
}

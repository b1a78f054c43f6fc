//! All mutable gameplay state, owned by the main loop and advanced one fixed
//! step at a time.

use glam::Vec2;
use sorcery_core::animation::FrameRegion;
use sorcery_ui::PanelStatus;

use crate::animation::{AnimState, AnimationSet, Animator};
use crate::collision::CollisionWorld;
use crate::level::{Level, LevelError};
use crate::player::{MovementConfig, Player, PlayerInput};

const STARTING_ENERGY: u8 = 99;

pub struct GameState {
    pub level: Level,
    pub collision: CollisionWorld,
    pub player: Player,
    pub animator: Animator,
    pub animations: AnimationSet,
    pub status: PanelStatus,
    pub step_count: u64,
}

impl GameState {
    /// Place the player at the level's spawn point. Fails if the hitbox
    /// would start inside a platform or off screen.
    pub fn new(
        level: Level,
        animations: AnimationSet,
        hitbox: Vec2,
        movement: MovementConfig,
    ) -> Result<Self, LevelError> {
        let player = Player::new(level.spawn, hitbox, movement);
        level.validate_spawn(&player.aabb.to_rect())?;

        let status = PanelStatus {
            location: level.location.clone(),
            carrying: "nothing".to_string(),
            energy: STARTING_ENERGY,
        };

        Ok(Self {
            collision: CollisionWorld::from_level(&level),
            level,
            player,
            animator: Animator::new(AnimState::Idle),
            animations,
            status,
            step_count: 0,
        })
    }

    /// One fixed step: velocity update, collision, then animation.
    pub fn step(&mut self, input: PlayerInput) {
        self.player.step(input, &self.collision);
        self.animator.update(self.player.velocity.x, &self.animations);
        self.step_count += 1;
    }

    pub fn current_frame(&self) -> Option<&FrameRegion> {
        self.animator.current_frame(&self.animations)
    }

    pub fn anim_state(&self) -> AnimState {
        self.animator.state()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use sorcery_core::animation::AnimationClip;

    pub(crate) fn strip(x: u32) -> AnimationClip {
        AnimationClip {
            frames: (0..4)
                .map(|i| FrameRegion {
                    x: x + i * 25,
                    y: 75,
                    w: 24,
                    h: 24,
                })
                .collect(),
            ticks_per_frame: 7,
        }
    }

    pub(crate) fn test_game() -> GameState {
        GameState::new(
            Level::builtin().expect("built-in level"),
            AnimationSet::new(strip(100), strip(0), strip(200)),
            Vec2::new(16.0, 24.0),
            MovementConfig::default(),
        )
        .expect("spawn is clear")
    }

    const RIGHT: PlayerInput = PlayerInput {
        left: false,
        right: true,
        up: false,
        down: false,
    };

    #[test]
    fn new_game_starts_idle_at_spawn() {
        let game = test_game();
        assert_eq!(game.player.position(), game.level.spawn);
        assert_eq!(game.anim_state(), AnimState::Idle);
        assert_eq!(game.status.location, "in the woods");
        assert_eq!(game.status.energy, 99);
        assert_eq!(game.current_frame().map(|f| f.x), Some(100));
    }

    #[test]
    fn player_falls_to_the_ground_and_settles() {
        let mut game = test_game();
        for _ in 0..240 {
            game.step(PlayerInput::default());
        }
        assert!(game.player.grounded);
        assert_eq!(game.player.velocity.y, 0.0);
        assert_eq!(game.player.position().y, 136.0);
        assert_eq!(game.anim_state(), AnimState::Idle);
        assert_eq!(game.step_count, 240);
    }

    #[test]
    fn walking_switches_animation_and_releasing_returns_to_idle() {
        let mut game = test_game();
        game.step(RIGHT);
        assert_eq!(game.anim_state(), AnimState::WalkRight);
        assert_eq!(game.current_frame().map(|f| f.x), Some(200));

        game.step(PlayerInput {
            left: true,
            ..RIGHT
        });
        assert_eq!(game.anim_state(), AnimState::Idle);
        assert_eq!(game.player.velocity.x, 0.0);
    }

    #[test]
    fn blocked_spawn_is_rejected() {
        let mut level = Level::builtin().expect("built-in level");
        level.spawn = Vec2::new(150.0, 120.0);
        let result = GameState::new(
            level,
            AnimationSet::new(strip(100), strip(0), strip(200)),
            Vec2::new(16.0, 24.0),
            MovementConfig::default(),
        );
        assert!(matches!(result, Err(LevelError::SpawnBlocked { .. })));
    }

    #[test]
    fn player_never_ends_a_step_inside_a_platform() {
        let mut game = test_game();
        let script = [
            PlayerInput { up: true, ..RIGHT },
            RIGHT,
            PlayerInput {
                right: false,
                left: true,
                up: true,
                down: false,
            },
            PlayerInput {
                down: true,
                ..RIGHT
            },
        ];
        for i in 0..1200 {
            game.step(script[(i / 37) % script.len()]);
            let rect = game.player.aabb.to_rect();
            assert!(!game.collision.overlaps_any(&rect), "overlap at step {i}");
            assert!(game.level.bounds().contains_rect(&rect));
        }
    }
}

use glam::Vec2;
use sorcery_core::input::{InputState, Key};

use crate::collision::{Aabb, CollisionMoveResult, CollisionWorld};

/// Directional keys held during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl PlayerInput {
    pub fn from_input_state(input: &InputState) -> Self {
        Self {
            left: input.is_held(Key::Left),
            right: input.is_held(Key::Right),
            up: input.is_held(Key::Up),
            down: input.is_held(Key::Down),
        }
    }

    /// -1, 0 or 1. Opposite keys held together cancel.
    pub fn horizontal(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    pub fn vertical(&self) -> VerticalIntent {
        match (self.up, self.down) {
            (true, false) => VerticalIntent::Fly,
            (false, true) => VerticalIntent::Dive,
            _ => VerticalIntent::Drift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalIntent {
    /// Climb at flight speed.
    Fly,
    /// Descend at flight speed.
    Dive,
    /// No vertical input: gravity takes over.
    Drift,
}

/// Speeds are base pixels per fixed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub flight_speed: f32,
    pub gravity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 2.5,
            flight_speed: 2.5,
            gravity: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

/// The single player entity. `velocity.y > 0` means falling.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub grounded: bool,
    pub contacts: ContactState,
    pub config: MovementConfig,
}

impl Player {
    /// `feet` is the bottom-centre of the hitbox.
    pub fn new(feet: Vec2, hitbox: Vec2, config: MovementConfig) -> Self {
        Self {
            aabb: Aabb::from_feet(feet.x, feet.y, hitbox.x, hitbox.y),
            velocity: Vec2::ZERO,
            grounded: false,
            contacts: ContactState::default(),
            config,
        }
    }

    pub fn position(&self) -> Vec2 {
        let (x, y) = self.aabb.feet();
        Vec2::new(x, y)
    }

    /// Velocity update for one step. Horizontal speed follows the keys with
    /// no inertia; vertical speed is set by flight keys or accelerated by
    /// gravity up to the flight speed.
    pub fn apply_input(&mut self, input: PlayerInput) {
        self.velocity.x = input.horizontal() * self.config.walk_speed;

        match input.vertical() {
            VerticalIntent::Fly => self.velocity.y = -self.config.flight_speed,
            VerticalIntent::Dive => self.velocity.y = self.config.flight_speed,
            VerticalIntent::Drift => {
                // Faster-than-cap speeds are left alone rather than snapped.
                let cap = self.config.flight_speed;
                if self.velocity.y < cap {
                    self.velocity.y = (self.velocity.y + self.config.gravity).min(cap);
                }
            }
        }
    }

    /// Apply input, then move through the world.
    pub fn step(&mut self, input: PlayerInput, world: &CollisionWorld) -> CollisionMoveResult {
        self.apply_input(input);
        self.integrate(world)
    }

    /// Move by the current velocity and react to whatever stopped us.
    pub fn integrate(&mut self, world: &CollisionWorld) -> CollisionMoveResult {
        let result = world.move_and_collide_detailed(self.aabb, self.velocity.x, self.velocity.y);
        self.apply_collision_result(result);
        result
    }

    fn apply_collision_result(&mut self, result: CollisionMoveResult) {
        self.aabb = result.aabb;
        self.contacts = ContactState {
            left: result.blocked_left,
            right: result.blocked_right,
            down: result.blocked_down,
            up: result.blocked_up,
        };

        // Horizontal velocity is intent and is reset from input every step,
        // so a wall block leaves it alone.
        if result.blocked_up && self.velocity.y < 0.0 {
            self.velocity.y = 0.0;
        }
        // Grounded is driven from collision contact, not from y-position heuristics.
        if result.blocked_down && self.velocity.y > 0.0 {
            self.velocity.y = 0.0;
            self.grounded = true;
        } else {
            self.grounded = false;
        }
    }
}

//! Collision resolver: clamps a moving box against the level's static
//! platform rectangles and the edges of the game area.
//!
//! The algorithm is **axis-separable move-and-slide**: resolve X movement
//! first, then resolve Y using the already-corrected X position. A blocked
//! axis stops at the surface instead of rejecting the whole move, so the
//! player slides along walls and floors.
//!
//! Every platform is tested on every move. Only platforms lying ahead of the
//! box's leading edge can stop it, which also keeps fast movers from
//! tunnelling through thin platforms.

use crate::level::{Level, Rect};

/// Coordinates are base pixels with y pointing down, so `dy > 0` is a fall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    /// Box whose bottom-centre ("feet") sits at `(x, y)`.
    pub fn from_feet(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            center_x: x,
            center_y: y - height * 0.5,
            half_w: width * 0.5,
            half_h: height * 0.5,
        }
    }

    pub fn feet(&self) -> (f32, f32) {
        (self.center_x, self.center_y + self.half_h)
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn top(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn bottom(&self) -> f32 {
        self.center_y + self.half_h
    }

    pub fn to_rect(&self) -> Rect {
        Rect {
            left: self.left(),
            top: self.top(),
            right: self.right(),
            bottom: self.bottom(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CollisionMoveResult {
    pub aabb: Aabb,
    pub blocked_left: bool,
    pub blocked_right: bool,
    /// Stopped while falling: the box rests on a surface.
    pub blocked_down: bool,
    pub blocked_up: bool,
}

#[derive(Debug, Clone)]
pub struct CollisionWorld {
    bounds: Rect,
    platforms: Vec<Rect>,
}

impl CollisionWorld {
    pub fn new(bounds: Rect, platforms: Vec<Rect>) -> Self {
        Self { bounds, platforms }
    }

    pub fn from_level(level: &Level) -> Self {
        Self::new(
            level.bounds(),
            level.platforms.iter().map(|p| p.rect).collect(),
        )
    }

    #[allow(dead_code)]
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    #[allow(dead_code)]
    pub fn overlaps_any(&self, rect: &Rect) -> bool {
        self.platforms.iter().any(|p| p.overlaps(rect))
    }

    #[allow(dead_code)]
    pub fn move_and_collide(&self, aabb: Aabb, dx: f32, dy: f32) -> Aabb {
        self.move_and_collide_detailed(aabb, dx, dy).aabb
    }

    pub fn move_and_collide_detailed(&self, aabb: Aabb, dx: f32, dy: f32) -> CollisionMoveResult {
        const EPS: f32 = 0.0001;

        let resolved_x = self.resolve_axis_x(aabb, dx);
        let x_expected = aabb.center_x + dx;
        let collided_x = (resolved_x - x_expected).abs() > EPS;

        let mut moved = aabb;
        moved.center_x = resolved_x;
        let resolved_y = self.resolve_axis_y(moved, dy);
        let y_expected = aabb.center_y + dy;
        let collided_y = (resolved_y - y_expected).abs() > EPS;
        moved.center_y = resolved_y;

        CollisionMoveResult {
            aabb: moved,
            blocked_left: collided_x && dx < 0.0,
            blocked_right: collided_x && dx > 0.0,
            blocked_down: collided_y && dy > 0.0,
            blocked_up: collided_y && dy < 0.0,
        }
    }

    fn resolve_axis_x(&self, aabb: Aabb, dx: f32) -> f32 {
        if dx == 0.0 {
            return aabb.center_x;
        }

        const EPS: f32 = 0.001;
        let mut candidate_x = aabb.center_x + dx;
        let top = aabb.top() + EPS;
        let bottom = aabb.bottom() - EPS;
        let shares_rows = |p: &Rect| p.top < bottom && p.bottom > top;

        if dx > 0.0 {
            let leading = aabb.right() - EPS;
            for p in self.platforms.iter().filter(|&p| shares_rows(p)) {
                if p.left >= leading {
                    candidate_x = candidate_x.min(p.left - aabb.half_w);
                }
            }
            candidate_x = candidate_x.min(self.bounds.right - aabb.half_w);
            // Guardrail: never push opposite direction during resolution.
            candidate_x = candidate_x.max(aabb.center_x);
        } else {
            let leading = aabb.left() + EPS;
            for p in self.platforms.iter().filter(|&p| shares_rows(p)) {
                if p.right <= leading {
                    candidate_x = candidate_x.max(p.right + aabb.half_w);
                }
            }
            candidate_x = candidate_x.max(self.bounds.left + aabb.half_w);
            candidate_x = candidate_x.min(aabb.center_x);
        }

        candidate_x
    }

    fn resolve_axis_y(&self, aabb: Aabb, dy: f32) -> f32 {
        if dy == 0.0 {
            return aabb.center_y;
        }

        const EPS: f32 = 0.001;
        let mut candidate_y = aabb.center_y + dy;
        let left = aabb.left() + EPS;
        let right = aabb.right() - EPS;
        let shares_columns = |p: &Rect| p.left < right && p.right > left;

        if dy > 0.0 {
            let leading = aabb.bottom() - EPS;
            for p in self.platforms.iter().filter(|&p| shares_columns(p)) {
                if p.top >= leading {
                    candidate_y = candidate_y.min(p.top - aabb.half_h);
                }
            }
            candidate_y = candidate_y.min(self.bounds.bottom - aabb.half_h);
            // Guardrail: never push opposite direction during resolution.
            candidate_y = candidate_y.max(aabb.center_y);
        } else {
            let leading = aabb.top() + EPS;
            for p in self.platforms.iter().filter(|&p| shares_columns(p)) {
                if p.bottom <= leading {
                    candidate_y = candidate_y.max(p.bottom + aabb.half_h);
                }
            }
            candidate_y = candidate_y.max(self.bounds.top + aabb.half_h);
            candidate_y = candidate_y.min(aabb.center_y);
        }

        candidate_y
    }
}

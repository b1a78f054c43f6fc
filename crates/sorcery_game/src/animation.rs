//! Player animation state machine.
//!
//! The state is a tagged enum and the transition table is a pure function of
//! horizontal velocity. Each state owns one looping clip; entering a new
//! state rewinds playback to its first frame.

use std::cmp::Ordering;
use std::collections::HashMap;

use sorcery_core::animation::{AnimationClip, AnimationCursor, FrameRegion};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimState {
    Idle,
    WalkLeft,
    WalkRight,
}

impl AnimState {
    pub const ALL: [AnimState; 3] = [AnimState::Idle, AnimState::WalkLeft, AnimState::WalkRight];

    /// Transition table. Vertical motion never changes the state.
    pub fn for_velocity_x(vx: f32) -> Self {
        match vx.partial_cmp(&0.0) {
            Some(Ordering::Greater) => AnimState::WalkRight,
            Some(Ordering::Less) => AnimState::WalkLeft,
            _ => AnimState::Idle,
        }
    }

    /// Clip name in the spritesheet file.
    pub fn clip_name(self) -> &'static str {
        match self {
            AnimState::Idle => "idle",
            AnimState::WalkLeft => "walk_left",
            AnimState::WalkRight => "walk_right",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnimState::Idle => "Idle",
            AnimState::WalkLeft => "WalkLeft",
            AnimState::WalkRight => "WalkRight",
        }
    }

    fn index(self) -> usize {
        match self {
            AnimState::Idle => 0,
            AnimState::WalkLeft => 1,
            AnimState::WalkRight => 2,
        }
    }
}

/// One clip per state, guaranteed complete and non-empty.
#[derive(Debug, Clone)]
pub struct AnimationSet {
    clips: [AnimationClip; 3],
}

impl AnimationSet {
    pub fn new(idle: AnimationClip, walk_left: AnimationClip, walk_right: AnimationClip) -> Self {
        Self {
            clips: [idle, walk_left, walk_right],
        }
    }

    /// Pick each state's clip out of a sheet's named clips.
    pub fn from_named(clips: &HashMap<String, AnimationClip>) -> Result<Self, String> {
        let lookup = |state: AnimState| -> Result<AnimationClip, String> {
            let clip = clips.get(state.clip_name()).ok_or_else(|| {
                format!(
                    "Animation validation failed: missing clip '{}'",
                    state.clip_name()
                )
            })?;
            if clip.frames.is_empty() {
                return Err(format!(
                    "Animation validation failed: clip '{}' has no frames",
                    state.clip_name()
                ));
            }
            Ok(clip.clone())
        };
        Ok(Self::new(
            lookup(AnimState::Idle)?,
            lookup(AnimState::WalkLeft)?,
            lookup(AnimState::WalkRight)?,
        ))
    }

    pub fn clip(&self, state: AnimState) -> &AnimationClip {
        &self.clips[state.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnimState, &AnimationClip)> {
        AnimState::ALL.into_iter().map(move |s| (s, self.clip(s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animator {
    state: AnimState,
    cursor: AnimationCursor,
}

impl Animator {
    pub fn new(state: AnimState) -> Self {
        Self {
            state,
            cursor: AnimationCursor::default(),
        }
    }

    pub fn state(&self) -> AnimState {
        self.state
    }

    pub fn frame_index(&self) -> usize {
        self.cursor.frame_index
    }

    /// Switch state without advancing. A change rewinds to frame 0.
    pub fn set_state(&mut self, state: AnimState) {
        if state != self.state {
            self.state = state;
            self.cursor.reset();
        }
    }

    /// Apply the transition for `vx`, then advance one tick.
    pub fn update<'a>(&mut self, vx: f32, set: &'a AnimationSet) -> Option<&'a FrameRegion> {
        self.set_state(AnimState::for_velocity_x(vx));
        self.cursor.tick(1, set.clip(self.state))
    }

    pub fn current_frame<'a>(&self, set: &'a AnimationSet) -> Option<&'a FrameRegion> {
        self.cursor.current(set.clip(self.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(x: u32, ticks_per_frame: u32) -> AnimationClip {
        AnimationClip {
            frames: (0..4)
                .map(|i| FrameRegion {
                    x: x + i * 25,
                    y: 75,
                    w: 24,
                    h: 24,
                })
                .collect(),
            ticks_per_frame,
        }
    }

    fn set() -> AnimationSet {
        AnimationSet::new(strip(100, 7), strip(0, 7), strip(200, 7))
    }

    #[test]
    fn transition_table_follows_horizontal_velocity() {
        assert_eq!(AnimState::for_velocity_x(2.5), AnimState::WalkRight);
        assert_eq!(AnimState::for_velocity_x(-2.5), AnimState::WalkLeft);
        assert_eq!(AnimState::for_velocity_x(0.0), AnimState::Idle);
        assert_eq!(AnimState::for_velocity_x(-0.0), AnimState::Idle);
        assert_eq!(AnimState::for_velocity_x(f32::NAN), AnimState::Idle);
    }

    #[test]
    fn clips_loop_on_a_fixed_timer() {
        let set = set();
        let mut animator = Animator::new(AnimState::WalkRight);
        let mut seen = Vec::new();
        for _ in 0..(7 * 4 + 1) {
            let frame = animator.update(2.5, &set).expect("frame");
            seen.push(frame.x);
        }
        // Frame 0 shows for the first 6 updates, then each frame for 7.
        assert_eq!(seen[0], 200);
        assert_eq!(seen[6], 225);
        assert_eq!(seen[13], 250);
        assert_eq!(seen[20], 275);
        assert_eq!(seen[27], 200);
    }

    #[test]
    fn switching_state_rewinds_to_first_frame() {
        let set = set();
        let mut animator = Animator::new(AnimState::WalkRight);
        for _ in 0..10 {
            animator.update(2.5, &set);
        }
        assert_eq!(animator.frame_index(), 1);

        let frame = animator.update(-2.5, &set).expect("frame");
        assert_eq!(animator.state(), AnimState::WalkLeft);
        assert_eq!(animator.frame_index(), 0);
        assert_eq!(frame.x, 0);
    }

    #[test]
    fn staying_in_state_keeps_playback_position() {
        let set = set();
        let mut animator = Animator::new(AnimState::Idle);
        for _ in 0..8 {
            animator.update(0.0, &set);
        }
        animator.set_state(AnimState::Idle);
        assert_eq!(animator.frame_index(), 1);
    }

    #[test]
    fn from_named_requires_every_state() {
        let mut clips = HashMap::new();
        clips.insert("idle".to_string(), strip(100, 7));
        clips.insert("walk_left".to_string(), strip(0, 7));
        let err = AnimationSet::from_named(&clips).expect_err("walk_right missing");
        assert!(err.contains("missing clip 'walk_right'"));

        clips.insert("walk_right".to_string(), strip(200, 7));
        let set = AnimationSet::from_named(&clips).expect("complete set");
        assert_eq!(set.clip(AnimState::WalkRight).frames[0].x, 200);
        assert_eq!(set.iter().count(), 3);
    }

    #[test]
    fn from_named_rejects_empty_clip() {
        let mut clips = HashMap::new();
        for state in AnimState::ALL {
            clips.insert(state.clip_name().to_string(), strip(0, 7));
        }
        clips.insert(
            "idle".to_string(),
            AnimationClip {
                frames: Vec::new(),
                ticks_per_frame: 7,
            },
        );
        let err = AnimationSet::from_named(&clips).expect_err("empty idle");
        assert!(err.contains("'idle' has no frames"));
    }
}

//! Scripted input playback for headless simulation checks.

use crate::player::PlayerInput;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ReplayFrame {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<PlayerInput> {
        let mut out = Vec::new();
        for frame in &self.frames {
            let input = PlayerInput {
                left: frame.left,
                right: frame.right,
                up: frame.up,
                down: frame.down,
            };
            out.extend(std::iter::repeat(input).take(frame.repeat.max(1) as usize));
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_replay(&raw).map_err(|e| format!("{e} ({})", path.display()))
}

pub fn parse_replay(raw: &str) -> Result<ReplaySequence, String> {
    let replay: ReplaySequence =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse replay JSON: {e}"))?;
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(replay)
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimState;
    use crate::game::tests::test_game;
    use crate::game::GameState;
    use glam::Vec2;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "sorcery_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    const TOUR: &str = r#"{
      "frames": [
        { "repeat": 40 },
        { "right": true, "repeat": 30 },
        { "right": true, "up": true, "repeat": 25 },
        { "left": true, "repeat": 60 },
        { "down": true, "repeat": 20 },
        { "left": true, "right": true, "repeat": 10 }
      ]
    }"#;

    fn run(game: &mut GameState, inputs: &[PlayerInput]) -> Vec<(Vec2, Vec2, AnimState, usize)> {
        inputs
            .iter()
            .map(|input| {
                game.step(*input);
                (
                    game.player.position(),
                    game.player.velocity,
                    game.anim_state(),
                    game.animator.frame_index(),
                )
            })
            .collect()
    }

    #[test]
    fn replay_file_parses_and_expands() {
        let path = temp_file_path("parse");
        fs::write(&path, TOUR).expect("write replay file");

        let replay = load_replay_from_path(&path).expect("replay should load");
        let expanded = replay.expanded_inputs();
        assert_eq!(expanded.len(), 40 + 30 + 25 + 60 + 20 + 10);
        assert!(expanded[40].right && !expanded[40].up);
        assert!(expanded[70].up);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn empty_replay_is_rejected() {
        let err = parse_replay(r#"{ "frames": [] }"#).expect_err("empty replay");
        assert!(err.contains("frames list is empty"));
    }

    #[test]
    fn replay_is_deterministic() {
        let inputs = parse_replay(TOUR).expect("tour parses").expanded_inputs();
        let first = run(&mut test_game(), &inputs);
        let second = run(&mut test_game(), &inputs);
        assert_eq!(first, second);
    }

    #[test]
    fn tour_ends_idle_after_cancelling_keys() {
        let inputs = parse_replay(TOUR).expect("tour parses").expanded_inputs();
        let mut game = test_game();
        let trace = run(&mut game, &inputs);

        let (_, velocity, state, _) = trace[trace.len() - 1];
        assert_eq!(velocity.x, 0.0);
        assert_eq!(state, AnimState::Idle);

        // After the opening fall the player stands on the ground.
        let (position, velocity, _, _) = trace[39];
        assert_eq!(position.y, 136.0);
        assert_eq!(velocity.y, 0.0);
    }
}

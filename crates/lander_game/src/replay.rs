use crate::controller::MovementIntent;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Scripted per-step movement, replayed against a `GameSession` without a
/// window or a wall clock.
#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySequence {
    #[serde(default = "default_dt")]
    pub fixed_dt: f32,
    pub frames: Vec<ReplayFrame>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplayFrame {
    #[serde(default)]
    pub move_x: f32,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

impl ReplaySequence {
    pub fn expanded_inputs(&self) -> Vec<MovementIntent> {
        let mut out = Vec::new();
        for frame in &self.frames {
            for _ in 0..frame.repeat.max(1) {
                out.push(MovementIntent {
                    move_x: frame.move_x.clamp(-1.0, 1.0),
                });
            }
        }
        out
    }
}

pub fn load_replay_from_path(path: &Path) -> Result<ReplaySequence, String> {
    let raw =
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    let replay: ReplaySequence = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse replay JSON {}: {e}", path.display()))?;
    validate_replay(&replay)?;
    Ok(replay)
}

fn validate_replay(replay: &ReplaySequence) -> Result<(), String> {
    if replay.fixed_dt <= 0.0 {
        return Err("Replay validation failed: fixed_dt must be > 0".to_string());
    }
    if replay.frames.is_empty() {
        return Err("Replay validation failed: frames list is empty".to_string());
    }
    Ok(())
}

const fn default_dt() -> f32 {
    1.0 / 60.0
}

const fn default_repeat() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::CollisionResult;
    use crate::config::GameConfig;
    use crate::session::{GameSession, Outcome, SessionTextures};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "lander_replay_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    fn write_replay(name_hint: &str, json: &str) -> ReplaySequence {
        let path = temp_file_path(name_hint);
        fs::write(&path, json).expect("write temp replay");
        let replay = load_replay_from_path(&path).expect("replay should load");
        let _ = fs::remove_file(path);
        replay
    }

    fn run(replay: &ReplaySequence) -> (GameSession, Vec<CollisionResult>) {
        let mut session = GameSession::new(&GameConfig::default(), &SessionTextures::default());
        let mut results = Vec::new();
        for intent in replay.expanded_inputs() {
            session.apply_intent(intent);
            results.push(session.step(replay.fixed_dt));
        }
        (session, results)
    }

    #[test]
    fn expansion_honours_repeat_and_clamps() {
        let replay = write_replay(
            "expand",
            r#"{ "frames": [ { "move_x": -3.0, "repeat": 2 }, { "repeat": 0 }, { "move_x": 0.5 } ] }"#,
        );
        let inputs = replay.expanded_inputs();
        assert_eq!(inputs.len(), 4);
        assert_eq!(inputs[0].move_x, -1.0);
        assert_eq!(inputs[1].move_x, -1.0);
        assert_eq!(inputs[2].move_x, 0.0);
        assert_eq!(inputs[3].move_x, 0.5);
        assert!((replay.fixed_dt - 1.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn same_replay_gives_identical_sessions() {
        let replay = write_replay(
            "determinism",
            r#"{
              "fixed_dt": 0.016666668,
              "frames": [
                { "move_x": 1.0, "repeat": 90 },
                { "move_x": -1.0, "repeat": 200 },
                { "repeat": 500 }
              ]
            }"#,
        );

        let (a, results_a) = run(&replay);
        let (b, results_b) = run(&replay);

        assert_eq!(results_a, results_b);
        assert_eq!(a.player.position, b.player.position);
        assert_eq!(a.player.velocity, b.player.velocity);
        assert_eq!(a.outcome(), b.outcome());
        let frame_a = a.player.animation.as_ref().map(|anim| anim.sprite_index());
        let frame_b = b.player.animation.as_ref().map(|anim| anim.sprite_index());
        assert_eq!(frame_a, frame_b);
    }

    #[test]
    fn steering_onto_grass_wins() {
        let replay = write_replay(
            "win",
            r#"{ "frames": [ { "move_x": -1.0, "repeat": 240 }, { "repeat": 700 } ] }"#,
        );
        let (session, results) = run(&replay);

        assert_eq!(session.outcome(), Outcome::Won);
        let first_hit = results
            .iter()
            .find(|r| **r != CollisionResult::NoCollision)
            .copied();
        assert_eq!(first_hit, Some(CollisionResult::HitBlock(11)));
    }

    #[test]
    fn idle_replay_lands_on_lava() {
        let replay = write_replay("idle", r#"{ "frames": [ { "repeat": 900 } ] }"#);
        let (session, _) = run(&replay);
        assert_eq!(session.outcome(), Outcome::Lost);
        assert_eq!(session.player.position.x, 0.0);
    }

    #[test]
    fn rejects_empty_or_zero_dt_replays() {
        let path = temp_file_path("empty");
        fs::write(&path, r#"{ "frames": [] }"#).expect("write temp replay");
        let err = load_replay_from_path(&path).expect_err("empty replay should fail");
        assert!(err.contains("frames list is empty"));
        let _ = fs::remove_file(path);

        let path = temp_file_path("zero_dt");
        fs::write(&path, r#"{ "fixed_dt": 0.0, "frames": [ { "repeat": 1 } ] }"#)
            .expect("write temp replay");
        let err = load_replay_from_path(&path).expect_err("zero dt should fail");
        assert!(err.contains("fixed_dt must be > 0"));
        let _ = fs::remove_file(path);
    }
}

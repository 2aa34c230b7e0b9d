//! Game tuning and level layout.
//!
//! Every value has a built-in default, so the game runs with no config file
//! at all. If `assets/config/game.json` exists it is parsed on top of the
//! defaults: any field it omits keeps its default value.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use lander_core::animation::{SpriteSheet, WalkCycle, DEFAULT_FRAME_DURATION_US};
use lander_core::time::DEFAULT_FIXED_DT;

use crate::entity::PLAYABLE_FLOOR_Y;

pub const CONFIG_VERSION: &str = "0.1";
/// Longest walk-cycle frame a config may ask for.
pub const MAX_FRAME_DURATION_MS: u64 = 60_000;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub version: String,
    pub fixed_dt: f64,
    /// Per-frame cap on simulated time; `null` disables the cap.
    pub max_frame_dt: Option<f64>,
    pub gravity: f32,
    /// Fraction of `gravity` the player feels.
    pub player_gravity_scale: f32,
    pub player_start: [f32; 2],
    pub player_speed: f32,
    pub player_sheet: SpriteSheet,
    pub walk_cycle: WalkCycle,
    pub frame_duration_ms: u64,
    pub camera_half_width: f32,
    pub clear_color: [f64; 3],
    /// Size of the win/lose banner, in world units.
    pub banner_size: [f32; 2],
    pub assets: AssetPaths,
    pub blocks: Vec<BlockSpec>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AssetPaths {
    pub player_sheet: String,
    pub lose_block: String,
    pub win_block: String,
    pub win_screen: String,
    pub lose_screen: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct BlockSpec {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub kind: BlockKind,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    #[default]
    Lose,
    Win,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            player_sheet: "assets/george_0.png".to_string(),
            lose_block: "assets/lava.png".to_string(),
            win_block: "assets/grass.png".to_string(),
            win_screen: "assets/ACCOMPLISHED.png".to_string(),
            lose_screen: "assets/FAILED.png".to_string(),
            vertex_shader: "shaders/vertex_textured.wgsl".to_string(),
            fragment_shader: "shaders/fragment_textured.wgsl".to_string(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            fixed_dt: DEFAULT_FIXED_DT,
            max_frame_dt: Some(0.25),
            gravity: -1.0,
            player_gravity_scale: 0.1,
            player_start: [0.0, 3.5],
            player_speed: 1.0,
            player_sheet: SpriteSheet { cols: 4, rows: 4 },
            walk_cycle: WalkCycle::default(),
            frame_duration_ms: DEFAULT_FRAME_DURATION_US / 1000,
            camera_half_width: 5.0,
            clear_color: [0.1922, 0.549, 0.9059],
            banner_size: [8.0, 2.0],
            assets: AssetPaths::default(),
            blocks: default_blocks(),
        }
    }
}

impl GameConfig {
    pub fn player_gravity(&self) -> f32 {
        self.gravity * self.player_gravity_scale
    }
}

/// A floor of eleven lava blocks with a grass block raised above each end.
pub fn default_blocks() -> Vec<BlockSpec> {
    let mut blocks: Vec<BlockSpec> = (0..11)
        .map(|i| BlockSpec {
            x: i as f32 - 5.0,
            y: -4.0,
            kind: BlockKind::Lose,
        })
        .collect();
    blocks.push(BlockSpec {
        x: -4.0,
        y: -3.0,
        kind: BlockKind::Win,
    });
    blocks.push(BlockSpec {
        x: 4.0,
        y: -3.0,
        kind: BlockKind::Win,
    });
    blocks
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config JSON {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to the built-in defaults.
/// A file that exists but fails to parse or validate is still an error.
pub fn load_config_or_default(path: &Path) -> Result<GameConfig, String> {
    if !path.exists() {
        log::info!(
            "No config at '{}', using built-in defaults",
            path.display()
        );
        return Ok(GameConfig::default());
    }
    let config = load_config_from_path(path)?;
    log::info!(
        "Config loaded from '{}' ({} blocks)",
        path.display(),
        config.blocks.len()
    );
    Ok(config)
}

pub fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.version != CONFIG_VERSION {
        return Err(format!(
            "Config validation failed: unsupported version '{}'",
            config.version
        ));
    }
    if config.fixed_dt <= 0.0 {
        return Err("Config validation failed: fixed_dt must be > 0".to_string());
    }
    if let Some(max_frame_dt) = config.max_frame_dt {
        if max_frame_dt < config.fixed_dt {
            return Err(
                "Config validation failed: max_frame_dt must be at least fixed_dt".to_string(),
            );
        }
    }
    if config.player_speed < 0.0 {
        return Err("Config validation failed: player_speed must be >= 0".to_string());
    }
    if config.player_sheet.cols == 0 || config.player_sheet.rows == 0 {
        return Err("Config validation failed: player_sheet needs at least one cell".to_string());
    }
    if config.walk_cycle.max_cell() >= config.player_sheet.cell_count() {
        return Err(format!(
            "Config validation failed: walk_cycle references cell {} but the sheet has {} cells",
            config.walk_cycle.max_cell(),
            config.player_sheet.cell_count()
        ));
    }
    if config.frame_duration_ms == 0 {
        return Err("Config validation failed: frame_duration_ms must be > 0".to_string());
    }
    if config.frame_duration_ms > MAX_FRAME_DURATION_MS {
        return Err(format!(
            "Config validation failed: frame_duration_ms must be <= {MAX_FRAME_DURATION_MS}"
        ));
    }
    if config.camera_half_width <= 0.0 {
        return Err("Config validation failed: camera_half_width must be > 0".to_string());
    }
    if config.banner_size.iter().any(|&s| s <= 0.0) {
        return Err("Config validation failed: banner_size must be positive".to_string());
    }
    if config.blocks.is_empty() {
        return Err("Config validation failed: blocks array is empty".to_string());
    }
    if config.player_start[1] < PLAYABLE_FLOOR_Y {
        return Err("Config validation failed: player starts below the playable floor".to_string());
    }
    for (i, block) in config.blocks.iter().enumerate() {
        if block.y < PLAYABLE_FLOOR_Y {
            return Err(format!(
                "Config validation failed: block {} at ({}, {}) is below the playable floor",
                i, block.x, block.y
            ));
        }
    }
    if !config.blocks.iter().any(|b| b.kind == BlockKind::Win) {
        log::warn!("Config has no win blocks; the session can only be lost");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "lander_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn default_layout_has_eleven_lava_and_two_grass_blocks() {
        let config = GameConfig::default();
        assert_eq!(config.blocks.len(), 13);
        let lose = config
            .blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Lose)
            .count();
        assert_eq!(lose, 11);
        assert_eq!(config.blocks[11].kind, BlockKind::Win);
        assert_eq!((config.blocks[11].x, config.blocks[11].y), (-4.0, -3.0));
        assert_eq!((config.blocks[12].x, config.blocks[12].y), (4.0, -3.0));
        validate_config(&config).expect("defaults must validate");
    }

    #[test]
    fn default_player_gravity_is_a_tenth_of_gravity() {
        let config = GameConfig::default();
        assert!((config.player_gravity() + 0.1).abs() < 1e-6);
        assert!((config.fixed_dt - 1.0 / 60.0).abs() < 1e-12);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let path = temp_file_path("partial");
        fs::write(
            &path,
            r#"{
              "player_speed": 2.5,
              "assets": { "player_sheet": "assets/other.png" },
              "blocks": [ { "x": 0.0, "y": -4.0 }, { "x": 2.0, "y": -3.0, "kind": "win" } ]
            }"#,
        )
        .expect("write temp file");

        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.player_speed, 2.5);
        assert_eq!(config.assets.player_sheet, "assets/other.png");
        assert_eq!(config.assets.lose_block, "assets/lava.png");
        assert_eq!(config.blocks.len(), 2);
        assert_eq!(config.blocks[0].kind, BlockKind::Lose);
        assert_eq!(config.blocks[1].kind, BlockKind::Win);
        assert_eq!(config.player_start, [0.0, 3.5]);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn null_frame_cap_disables_cap() {
        let path = temp_file_path("uncapped");
        fs::write(&path, r#"{ "max_frame_dt": null }"#).expect("write temp file");
        let config = load_config_from_path(&path).expect("config should load");
        assert_eq!(config.max_frame_dt, None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_non_positive_timestep() {
        let path = temp_file_path("bad_dt");
        fs::write(&path, r#"{ "fixed_dt": 0.0 }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("zero dt should fail");
        assert!(err.contains("fixed_dt must be > 0"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_huge_frame_duration() {
        let config = GameConfig {
            frame_duration_ms: u64::MAX / 10,
            ..GameConfig::default()
        };
        let err = validate_config(&config).expect_err("huge frame duration should fail");
        assert!(err.contains("frame_duration_ms must be <="));

        let longest = GameConfig {
            frame_duration_ms: MAX_FRAME_DURATION_MS,
            ..GameConfig::default()
        };
        validate_config(&longest).expect("upper bound is allowed");
    }

    #[test]
    fn rejects_bad_version() {
        let path = temp_file_path("bad_version");
        fs::write(&path, r#"{ "version": "9.9" }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("bad version should fail");
        assert!(err.contains("unsupported version"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_walk_cycle_outside_sheet() {
        let config = GameConfig {
            player_sheet: SpriteSheet { cols: 2, rows: 2 },
            ..GameConfig::default()
        };
        let err = validate_config(&config).expect_err("cell 15 is outside a 2x2 sheet");
        assert!(err.contains("walk_cycle references cell 15"));
    }

    #[test]
    fn rejects_block_below_floor() {
        let config = GameConfig {
            blocks: vec![BlockSpec {
                x: 0.0,
                y: PLAYABLE_FLOOR_Y - 1.0,
                kind: BlockKind::Lose,
            }],
            ..GameConfig::default()
        };
        let err = validate_config(&config).expect_err("block below floor should fail");
        assert!(err.contains("below the playable floor"));
    }

    #[test]
    fn rejects_empty_layout_and_malformed_json() {
        let config = GameConfig {
            blocks: Vec::new(),
            ..GameConfig::default()
        };
        assert!(validate_config(&config)
            .expect_err("empty layout should fail")
            .contains("blocks array is empty"));

        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write temp file");
        let err = load_config_from_path(&path).expect_err("malformed json should fail");
        assert!(err.contains("Failed to parse config JSON"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("absent");
        let config = load_config_or_default(&path).expect("absent file is not an error");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn bundled_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/config/game.json");
        let config = load_config_from_path(&path).expect("bundled config should load");
        assert_eq!(config, GameConfig::default());
    }
}

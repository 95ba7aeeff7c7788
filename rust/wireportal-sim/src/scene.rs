//! Scene files: the world, players and a timeline of host events to replay.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use wireportal_core::memory::MemoryWorld;
use wireportal_core::orchestrator::InteractAction;
use wireportal_core::{BlockPos, Location, Material, PlayerId, PlayerState, PortalConfig, WorldId};

#[derive(Debug, Clone, Deserialize)]
pub struct BlockSpec {
    #[serde(default)]
    pub world: Option<WorldId>,
    pub at: [i32; 3],
    pub material: Material,
    #[serde(default)]
    pub data: u8,
}

/// Straight, axis-aligned run of identical blocks, both ends inclusive.
#[derive(Debug, Clone, Deserialize)]
pub struct LineSpec {
    #[serde(default)]
    pub world: Option<WorldId>,
    pub from: [i32; 3],
    pub to: [i32; 3],
    pub material: Material,
    #[serde(default)]
    pub data: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SceneEvent {
    Interact { tick: u64, player: PlayerId, action: InteractAction, block: [i32; 3] },
    Move { tick: u64, player: PlayerId, to: Location },
    SetBlock { tick: u64, block: BlockSpec },
    Leave { tick: u64, player: PlayerId },
}

impl SceneEvent {
    pub fn tick(&self) -> u64 {
        match self {
            SceneEvent::Interact { tick, .. }
            | SceneEvent::Move { tick, .. }
            | SceneEvent::SetBlock { tick, .. }
            | SceneEvent::Leave { tick, .. } => *tick,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    /// Missing: taken from WIREPORTAL_* environment variables.
    #[serde(default)]
    pub config: Option<PortalConfig>,
    #[serde(default)]
    pub world: WorldId,
    #[serde(default)]
    pub liquids: Vec<Material>,
    #[serde(default)]
    pub passable: Vec<Material>,
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
    #[serde(default)]
    pub lines: Vec<LineSpec>,
    #[serde(default)]
    pub players: Vec<PlayerState>,
    #[serde(default)]
    pub events: Vec<SceneEvent>,
}

impl Scene {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(s).context("parsing scene json")?;
        Ok(scene)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("reading scene {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("loading scene {}", path.display()))
    }

    /// Effective portal config: the scene's own, else the environment overlay.
    pub fn portal_config(&self) -> Result<PortalConfig> {
        match &self.config {
            Some(cfg) => {
                cfg.validate().context("scene config")?;
                Ok(cfg.clone())
            }
            None => PortalConfig::from_env().context("environment config"),
        }
    }

    pub fn build_world(&self) -> Result<MemoryWorld> {
        let mut world = MemoryWorld::new();
        for m in &self.liquids {
            world.mark_liquid(*m);
        }
        for m in &self.passable {
            world.mark_passable(*m);
        }
        for line in &self.lines {
            let w = line.world.unwrap_or(self.world);
            for pos in line_positions(line.from, line.to)? {
                world.set(w, pos, line.material, line.data);
            }
        }
        for b in &self.blocks {
            world.set(b.world.unwrap_or(self.world), to_pos(b.at), b.material, b.data);
        }
        for p in &self.players {
            world.add_player(p.clone());
        }
        Ok(world)
    }

    /// Events sorted by tick; same-tick events keep file order.
    pub fn timeline(&self) -> Vec<SceneEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| e.tick());
        events
    }
}

pub fn to_pos(at: [i32; 3]) -> BlockPos {
    BlockPos::new(at[0], at[1], at[2])
}

fn line_positions(from: [i32; 3], to: [i32; 3]) -> Result<Vec<BlockPos>> {
    let diff = [to[0] - from[0], to[1] - from[1], to[2] - from[2]];
    let moving = diff.iter().filter(|d| **d != 0).count();
    if moving > 1 {
        bail!("line {:?} -> {:?} is not axis-aligned", from, to);
    }
    let len = diff.iter().map(|d| d.abs()).max().unwrap_or(0);
    let step = [diff[0].signum(), diff[1].signum(), diff[2].signum()];
    Ok((0..=len)
        .map(|i| BlockPos::new(from[0] + step[0] * i, from[1] + step[1] * i, from[2] + step[2] * i))
        .collect())
}

use serde::{Deserialize, Serialize};

use crate::direction::Direction;

/// Numeric block type id, as handed out by the host's material registry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Material(pub u16);

impl Material {
    pub const AIR: Material = Material(0);
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub u32);

/// Stable player identity used as the activation log key.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// None when the step leaves the `i32` coordinate range.
    #[inline]
    pub fn step(self, dir: Direction, distance: i32) -> Option<BlockPos> {
        let (dx, dy, dz) = dir.offset();
        Some(BlockPos {
            x: self.x.checked_add(dx.checked_mul(distance)?)?,
            y: self.y.checked_add(dy.checked_mul(distance)?)?,
            z: self.z.checked_add(dz.checked_mul(distance)?)?,
        })
    }

    /// Corner location of the block (no centering), as used for proximity checks.
    pub fn corner(self, world: WorldId) -> Location {
        Location::new(world, self.x as f64, self.y as f64, self.z as f64)
    }
}

/// A block as observed at one instant. Owned by the caller, never a live handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub world: WorldId,
    pub pos: BlockPos,
    pub material: Material,
    /// Sub-type discriminator ("data"); keeps differently colored wires apart.
    pub data: u8,
}

impl Block {
    pub fn is(&self, material: Material) -> bool {
        self.material == material
    }

    pub fn location(&self) -> Location {
        self.pos.corner(self.world)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z, yaw: 0.0, pitch: 0.0 }
    }

    pub fn add(self, dx: f64, dy: f64, dz: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, z: self.z + dz, ..self }
    }

    /// Block containing this location; None for non-finite coordinates or ones outside the
    /// `i32` block range.
    pub fn block_pos(&self) -> Option<BlockPos> {
        Some(BlockPos::new(floor_coord(self.x)?, floor_coord(self.y)?, floor_coord(self.z)?))
    }

    /// Euclidean distance; None when the locations are in different worlds.
    pub fn distance(&self, other: &Location) -> Option<f64> {
        if self.world != other.world {
            return None;
        }
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        Some((dx * dx + dy * dy + dz * dz).sqrt())
    }
}

fn floor_coord(v: f64) -> Option<i32> {
    let f = v.floor();
    if f.is_finite() && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX) {
        Some(f as i32)
    } else {
        None
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "world{}({:.2}, {:.2}, {:.2} yaw={:.1})", self.world.0, self.x, self.y, self.z, self.yaw)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Survival,
    Adventure,
    Creative,
    Spectator,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    pub name: String,
    pub location: Location,
    pub game_mode: GameMode,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sound {
    /// Played to the traveller when a teleport is scheduled.
    PortalTravel,
    /// Played at the destination when the teleport lands.
    Portal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    EnderSignal,
}

/// Read access to blocks.
pub trait BlockView {
    fn block_at(&self, world: WorldId, pos: BlockPos) -> Block;

    /// None when the neighbour would lie outside the coordinate range.
    fn relative(&self, block: &Block, dir: Direction, distance: i32) -> Option<Block> {
        block.pos.step(dir, distance).map(|pos| self.block_at(block.world, pos))
    }

    /// Empty, liquid or otherwise non-solid.
    fn is_passable(&self, block: &Block) -> bool;
}

pub trait PlayerView {
    /// None once the player has left.
    fn player(&self, id: PlayerId) -> Option<PlayerState>;
}

/// Full capability handed to the orchestrator: reads plus the few mutations it requests.
pub trait Host: BlockView + PlayerView {
    /// Returns false when the host refused the move.
    fn teleport(&mut self, id: PlayerId, to: Location) -> bool;
    fn play_sound(&mut self, at: Location, sound: Sound);
    fn play_effect(&mut self, at: Location, effect: Effect);
    fn apply_confusion(&mut self, id: PlayerId, ticks: u32);
    fn send_message(&mut self, id: PlayerId, text: &str);
}

//! In-memory world used by the simulator and tests.
//! Blocks not explicitly set are air; every side effect requested by the core is recorded.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::world::{
    Block, BlockPos, BlockView, Effect, GameMode, Host, Location, Material, PlayerId, PlayerState,
    PlayerView, Sound, WorldId,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    Teleported { player: PlayerId, from: Location, to: Location },
    TeleportRefused { player: PlayerId, to: Location },
    Sound { at: Location, sound: Sound },
    Effect { at: Location, effect: Effect },
    Confusion { player: PlayerId, ticks: u32 },
    Message { player: PlayerId, text: String },
}

#[derive(Debug, Default)]
pub struct MemoryWorld {
    blocks: FxHashMap<(WorldId, BlockPos), (Material, u8)>,
    // Materials that are solid but still passable (glass panes, signs, ...).
    passable: FxHashSet<Material>,
    liquids: FxHashSet<Material>,
    players: FxHashMap<PlayerId, PlayerState>,
    events: Vec<HostEvent>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, world: WorldId, pos: BlockPos, material: Material, data: u8) {
        if material == Material::AIR {
            self.blocks.remove(&(world, pos));
        } else {
            self.blocks.insert((world, pos), (material, data));
        }
    }

    pub fn clear(&mut self, world: WorldId, pos: BlockPos) {
        self.blocks.remove(&(world, pos));
    }

    pub fn mark_passable(&mut self, material: Material) {
        self.passable.insert(material);
    }

    pub fn mark_liquid(&mut self, material: Material) {
        self.liquids.insert(material);
    }

    pub fn add_player(&mut self, player: PlayerState) {
        self.players.insert(player.id, player);
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<PlayerState> {
        self.players.remove(&id)
    }

    /// Move a player without going through the portal (walking away, etc).
    pub fn move_player(&mut self, id: PlayerId, to: Location) -> bool {
        match self.players.get_mut(&id) {
            Some(p) => {
                p.location = to;
                true
            }
            None => false,
        }
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}

impl BlockView for MemoryWorld {
    fn block_at(&self, world: WorldId, pos: BlockPos) -> Block {
        let (material, data) = self.blocks.get(&(world, pos)).copied().unwrap_or((Material::AIR, 0));
        Block { world, pos, material, data }
    }

    fn is_passable(&self, block: &Block) -> bool {
        block.material == Material::AIR
            || self.liquids.contains(&block.material)
            || self.passable.contains(&block.material)
    }
}

impl PlayerView for MemoryWorld {
    fn player(&self, id: PlayerId) -> Option<PlayerState> {
        self.players.get(&id).cloned()
    }
}

impl Host for MemoryWorld {
    fn teleport(&mut self, id: PlayerId, to: Location) -> bool {
        let Some(p) = self.players.get_mut(&id) else {
            self.events.push(HostEvent::TeleportRefused { player: id, to });
            return false;
        };
        let from = p.location;
        p.location = to;
        self.events.push(HostEvent::Teleported { player: id, from, to });
        true
    }

    fn play_sound(&mut self, at: Location, sound: Sound) {
        self.events.push(HostEvent::Sound { at, sound });
    }

    fn play_effect(&mut self, at: Location, effect: Effect) {
        self.events.push(HostEvent::Effect { at, effect });
    }

    fn apply_confusion(&mut self, id: PlayerId, ticks: u32) {
        self.events.push(HostEvent::Confusion { player: id, ticks });
    }

    fn send_message(&mut self, id: PlayerId, text: &str) {
        self.events.push(HostEvent::Message { player: id, text: text.to_string() });
    }
}

/// Convenience constructor for a survival-mode player.
pub fn survival_player(id: u64, name: &str, location: Location) -> PlayerState {
    PlayerState { id: PlayerId(id), name: name.to_string(), location, game_mode: GameMode::Survival }
}

use std::time::{Duration, Instant};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use wireportal_core::memory::{HostEvent, MemoryWorld};
use wireportal_core::{ActivationOutcome, BlockView, CommitOutcome, PlayerId, PlayerState, PlayerView, Portal, TickScheduler};

use crate::scene::{to_pos, Scene, SceneEvent};

pub const TICK: Duration = Duration::from_millis(50); // 20 ticks/s
const SWEEP_EVERY_TICKS: u64 = 20;

#[derive(Debug, Serialize)]
pub struct ActivationEntry {
    pub tick: u64,
    pub player: PlayerId,
    pub outcome: ActivationOutcome,
}

#[derive(Debug, Serialize)]
pub struct CommitEntry {
    pub tick: u64,
    pub outcome: CommitOutcome,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub ticks: u64,
    pub activations: Vec<ActivationEntry>,
    pub commits: Vec<CommitEntry>,
    pub host_events: Vec<HostEvent>,
    pub players: Vec<PlayerState>,
}

impl Report {
    pub fn committed(&self) -> usize {
        self.commits.iter().filter(|c| matches!(c.outcome, CommitOutcome::Committed { .. })).count()
    }
}

/// Replay `scene` on a fresh world. Runs at least until every scheduled commit has fired,
/// or for exactly `ticks` ticks when given.
pub fn replay(scene: &Scene, ticks: Option<u64>) -> Result<Report> {
    let config = scene.portal_config()?;
    let mut world = scene.build_world()?;
    let mut portal = Portal::new(config)?;
    let mut scheduler = TickScheduler::new();
    let timeline = scene.timeline();

    let t0 = Instant::now();
    let mut activations = Vec::new();
    let mut commits = Vec::new();
    let mut next = 0usize;
    let mut tick = 0u64;

    loop {
        let now = t0 + TICK * u32::try_from(tick).unwrap_or(u32::MAX);

        // Due commits fire first so new schedules count from this tick.
        for outcome in portal.run_due(&mut world, &mut scheduler, tick) {
            commits.push(CommitEntry { tick, outcome });
        }

        while next < timeline.len() && timeline[next].tick() <= tick {
            let event = &timeline[next];
            next += 1;
            if let Some(outcome) = apply(&mut world, &mut portal, &mut scheduler, scene, event, now) {
                if let SceneEvent::Interact { player, .. } = event {
                    activations.push(ActivationEntry { tick, player: *player, outcome });
                }
            }
        }

        if tick % SWEEP_EVERY_TICKS == 0 {
            let dropped = portal.sweep(now);
            if dropped > 0 {
                debug!(dropped, tick, "swept activation records");
            }
        }

        let done = match ticks {
            Some(limit) => tick >= limit,
            None => next >= timeline.len() && scheduler.pending() == 0,
        };
        if done {
            break;
        }
        tick += 1;
    }

    portal.shutdown();

    let mut players: Vec<PlayerState> = scene.players.iter().filter_map(|p| world.player(p.id)).collect();
    players.sort_by_key(|p| p.id.0);

    info!(ticks = tick, activations = activations.len(), commits = commits.len(), "scene replay finished");

    Ok(Report { ticks: tick, activations, commits, host_events: world.take_events(), players })
}

fn apply(
    world: &mut MemoryWorld,
    portal: &mut Portal,
    scheduler: &mut TickScheduler,
    scene: &Scene,
    event: &SceneEvent,
    now: Instant,
) -> Option<ActivationOutcome> {
    match event {
        SceneEvent::Interact { player, action, block, .. } => {
            let Some(state) = world.player(*player) else {
                debug!(player = player.0, "interaction from unknown player ignored");
                return None;
            };
            let clicked = world.block_at(state.location.world, to_pos(*block));
            Some(portal.on_interact(world, scheduler, *player, *action, clicked, now))
        }
        SceneEvent::Move { player, to, .. } => {
            world.move_player(*player, *to);
            None
        }
        SceneEvent::SetBlock { block, .. } => {
            world.set(block.world.unwrap_or(scene.world), to_pos(block.at), block.material, block.data);
            None
        }
        SceneEvent::Leave { player, .. } => {
            world.remove_player(*player);
            None
        }
    }
}

use std::time::{Duration, Instant};

use wireportal_core::memory::{survival_player, HostEvent, MemoryWorld};
use wireportal_core::orchestrator::BLOCKED_MESSAGE;
use wireportal_core::world::{Effect, Sound};
use wireportal_core::{
    AbortReason, Block, BlockPos, BlockView, CommitOutcome, Host, InteractAction, Location, Material, PlayerId,
    PlayerState, PlayerView, Portal, PortalConfig, Rejection, TickScheduler, WorldId,
};

const W: WorldId = WorldId(0);
const ALEX: PlayerId = PlayerId(1);
const A: BlockPos = BlockPos::new(0, 64, 0);
const B: BlockPos = BlockPos::new(6, 64, 0);
const STONE: Material = Material(1);

/// Cap A, five wires heading east, cap B. Alex stands on A facing yaw 90.
fn scenario() -> (MemoryWorld, Portal, TickScheduler) {
    let cfg = PortalConfig::default();
    let mut world = MemoryWorld::new();
    world.set(W, A, cfg.cap_material, 0);
    for x in 1..=5 {
        world.set(W, BlockPos::new(x, 64, 0), cfg.wire_material, 4);
    }
    world.set(W, B, cfg.cap_material, 0);
    let mut at = Location::new(W, 0.5, 65.0, 0.5);
    at.yaw = 90.0;
    world.add_player(survival_player(ALEX.0, "alex", at));
    let portal = Portal::new(cfg).expect("valid config");
    (world, portal, TickScheduler::new())
}

fn cap_a(world: &MemoryWorld) -> Block {
    world.block_at(W, A)
}

fn location_of(world: &MemoryWorld, id: PlayerId) -> Location {
    world.player(id).expect("player present").location
}

#[test]
fn example_scenario_commits_after_delay_with_yaw_preserved() {
    let (mut world, mut portal, mut sched) = scenario();
    let t0 = Instant::now();
    let origin = location_of(&world, ALEX);

    let cap_block = cap_a(&world);
    let out = portal.on_interact(&mut world, &mut sched, ALEX, InteractAction::LeftClickBlock, cap_block, t0);
    assert!(out.is_scheduled(), "{out:?}");
    assert_eq!(sched.pending(), 1);
    assert_eq!(portal.activations().len(), 1);
    assert_eq!(
        world.take_events(),
        vec![
            HostEvent::Sound { at: origin, sound: Sound::PortalTravel },
            HostEvent::Confusion { player: ALEX, ticks: 150 },
        ]
    );

    assert!(portal.run_due(&mut world, &mut sched, 74).is_empty());
    assert_eq!(location_of(&world, ALEX), origin);

    let done = portal.run_due(&mut world, &mut sched, 75);
    let mut expected = Location::new(W, 7.5, 64.0, 0.5);
    expected.yaw = 90.0;
    assert_eq!(done, vec![CommitOutcome::Committed { player: ALEX, from: origin, to: expected }]);
    assert_eq!(location_of(&world, ALEX), expected);
    assert_eq!(
        world.take_events(),
        vec![
            HostEvent::Teleported { player: ALEX, from: origin, to: expected },
            HostEvent::Effect { at: origin, effect: Effect::EnderSignal },
            HostEvent::Sound { at: expected, sound: Sound::Portal },
            HostEvent::Effect { at: expected, effect: Effect::EnderSignal },
        ]
    );
    assert!(portal.activations().is_empty(), "successful commit clears the record");
}

#[test]
fn second_activation_inside_interval_is_silently_throttled() {
    let (mut world, mut portal, mut sched) = scenario();
    let t0 = Instant::now();
    let cap_block = cap_a(&world);
    let first = portal.activate(&mut world, &mut sched, ALEX, cap_block, t0);
    assert!(first.is_scheduled());
    world.take_events();

    let cap_block = cap_a(&world);
    let second = portal.activate(&mut world, &mut sched, ALEX, cap_block, t0 + Duration::from_millis(500));
    assert_eq!(second.rejection(), Some(Rejection::RateLimited));
    assert_eq!(sched.pending(), 1, "exactly one commit scheduled");
    assert!(world.events().is_empty(), "throttle sends nothing to the player");
}

#[test]
fn reactivation_allowed_right_after_successful_commit() {
    let (mut world, mut portal, mut sched) = scenario();
    let t0 = Instant::now();
    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, t0).is_scheduled());
    portal.run_due(&mut world, &mut sched, 75);

    // Walk back to A and go again well inside the 6s window.
    world.move_player(ALEX, Location::new(W, 0.5, 65.0, 0.5));
    let cap_block = cap_a(&world);
    let again = portal.activate(&mut world, &mut sched, ALEX, cap_block, t0 + Duration::from_secs(4));
    assert!(again.is_scheduled(), "{again:?}");
}

#[test]
fn cap_changed_before_commit_aborts_and_keeps_cooldown() {
    let (mut world, mut portal, mut sched) = scenario();
    let t0 = Instant::now();
    let origin = location_of(&world, ALEX);
    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, t0).is_scheduled());

    world.set(W, A, STONE, 0);
    let done = portal.run_due(&mut world, &mut sched, 75);
    assert_eq!(done, vec![CommitOutcome::Aborted { player: ALEX, reason: AbortReason::CapChanged }]);
    assert_eq!(location_of(&world, ALEX), origin);
    assert!(!world.events().iter().any(|e| matches!(e, HostEvent::Teleported { .. })));

    // The record written at schedule time still throttles.
    let cfg = portal.config().clone();
    world.set(W, A, cfg.cap_material, 0);
    let cap_block = cap_a(&world);
    let retry = portal.activate(&mut world, &mut sched, ALEX, cap_block, t0 + Duration::from_secs(4));
    assert_eq!(retry.rejection(), Some(Rejection::RateLimited));
    let cap_block = cap_a(&world);
    let later = portal.activate(&mut world, &mut sched, ALEX, cap_block, t0 + Duration::from_secs(6));
    assert!(later.is_scheduled());
}

#[test]
fn walking_away_before_commit_aborts() {
    let (mut world, mut portal, mut sched) = scenario();
    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now()).is_scheduled());
    world.move_player(ALEX, Location::new(W, -10.0, 64.0, 0.0));
    let done = portal.run_due(&mut world, &mut sched, 75);
    assert_eq!(done, vec![CommitOutcome::Aborted { player: ALEX, reason: AbortReason::OutOfRange }]);
    assert_eq!(location_of(&world, ALEX), Location::new(W, -10.0, 64.0, 0.0));
}

#[test]
fn disconnect_before_commit_aborts() {
    let (mut world, mut portal, mut sched) = scenario();
    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now()).is_scheduled());
    world.remove_player(ALEX);
    let done = portal.run_due(&mut world, &mut sched, 75);
    assert_eq!(done, vec![CommitOutcome::Aborted { player: ALEX, reason: AbortReason::PlayerGone }]);
}

#[test]
fn far_or_other_world_players_are_not_traced() {
    let (mut world, mut portal, mut sched) = scenario();
    world.move_player(ALEX, Location::new(W, 0.0, 64.0, 3.5));
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now());
    assert_eq!(out.rejection(), Some(Rejection::OutOfRange));

    world.move_player(ALEX, Location::new(WorldId(1), 0.5, 65.0, 0.5));
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now());
    assert_eq!(out.rejection(), Some(Rejection::OutOfRange));

    assert_eq!(sched.pending(), 0);
    assert!(portal.activations().is_empty());
    assert!(world.events().is_empty());
}

#[test]
fn failed_traces_have_no_side_effects() {
    let (mut world, mut portal, mut sched) = scenario();
    let now = Instant::now();

    world.set(W, BlockPos::new(3, 64, 1), portal.config().wire_material, 4);
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, now);
    assert_eq!(out.rejection(), Some(Rejection::Ambiguous));

    world.clear(W, BlockPos::new(3, 64, 1));
    world.clear(W, B);
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, now);
    assert_eq!(out.rejection(), Some(Rejection::Unreached));

    assert_eq!(sched.pending(), 0);
    assert!(portal.activations().is_empty());
    assert!(world.events().is_empty());
}

#[test]
fn blocked_destination_is_reported_once_and_not_recorded() {
    let (mut world, mut portal, mut sched) = scenario();
    world.set(W, BlockPos::new(7, 64, 0), STONE, 0);
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now());
    assert_eq!(out.rejection(), Some(Rejection::Blocked));
    assert_eq!(world.take_events(), vec![HostEvent::Message { player: ALEX, text: BLOCKED_MESSAGE.to_string() }]);
    assert!(portal.activations().is_empty());

    // Water at the exit is fine.
    world.mark_liquid(Material(9));
    world.set(W, BlockPos::new(7, 64, 0), Material(9), 0);
    let cap_block = cap_a(&world);
    let out = portal.activate(&mut world, &mut sched, ALEX, cap_block, Instant::now());
    assert!(out.is_scheduled());
}

/// Host that never lets anyone move.
struct Frozen(MemoryWorld);

impl BlockView for Frozen {
    fn block_at(&self, world: WorldId, pos: BlockPos) -> Block {
        self.0.block_at(world, pos)
    }
    fn is_passable(&self, block: &Block) -> bool {
        self.0.is_passable(block)
    }
}

impl PlayerView for Frozen {
    fn player(&self, id: PlayerId) -> Option<PlayerState> {
        self.0.player(id)
    }
}

impl Host for Frozen {
    fn teleport(&mut self, _id: PlayerId, _to: Location) -> bool {
        false
    }
    fn play_sound(&mut self, at: Location, sound: Sound) {
        self.0.play_sound(at, sound)
    }
    fn play_effect(&mut self, at: Location, effect: Effect) {
        self.0.play_effect(at, effect)
    }
    fn apply_confusion(&mut self, id: PlayerId, ticks: u32) {
        self.0.apply_confusion(id, ticks)
    }
    fn send_message(&mut self, id: PlayerId, text: &str) {
        self.0.send_message(id, text)
    }
}

#[test]
fn refused_teleport_is_an_abort() {
    let (world, mut portal, mut sched) = scenario();
    let mut host = Frozen(world);
    let cap = host.block_at(W, A);
    assert!(portal.activate(&mut host, &mut sched, ALEX, cap, Instant::now()).is_scheduled());
    let done = portal.run_due(&mut host, &mut sched, 75);
    assert_eq!(done, vec![CommitOutcome::Aborted { player: ALEX, reason: AbortReason::Refused }]);
    assert_eq!(portal.activations().len(), 1);
    // Nothing departs, so no portal effects play.
    assert!(!host.0.events().iter().any(|e| matches!(e, HostEvent::Effect { .. })));
}

#[test]
fn sweep_and_shutdown_clear_records() {
    let (mut world, mut portal, mut sched) = scenario();
    let t0 = Instant::now();
    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, t0).is_scheduled());
    assert_eq!(portal.sweep(t0 + Duration::from_secs(1)), 0);
    assert_eq!(portal.sweep(t0 + Duration::from_secs(61)), 1);
    assert!(portal.activations().is_empty());

    let cap_block = cap_a(&world);
    assert!(portal.activate(&mut world, &mut sched, ALEX, cap_block, t0 + Duration::from_secs(62)).is_scheduled());
    portal.shutdown();
    assert!(portal.activations().is_empty());
}

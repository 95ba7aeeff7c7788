//! Activation handling and deferred teleport commits.
//!
//! An activation is throttled per player, range-checked, traced and safety-checked. If
//! everything passes, the traveller gets immediate feedback, the activation is recorded,
//! and a `PendingCommit` is handed to the scheduler. When it fires, `commit` re-reads the
//! player and the starting cap before moving anyone: the world may have changed freely
//! in between.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::activation::ActivationLog;
use crate::config::PortalConfig;
use crate::destination::{is_safe, resolve_destination};
use crate::error::ConfigError;
use crate::scheduler::{PendingCommit, Scheduler, TickScheduler};
use crate::trace::{TraceOutcome, TraceResult, Tracer};
use crate::world::{Block, Effect, GameMode, Host, Location, PlayerId, Sound};

pub const BLOCKED_MESSAGE: &str = "The portal destination is blocked.";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractAction {
    LeftClickBlock,
    RightClickBlock,
    LeftClickAir,
    RightClickAir,
    Physical,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Not a left click on a cap.
    Ignored,
    /// Creative players never activate portals.
    Exempt,
    UnknownPlayer,
    RateLimited,
    OutOfRange,
    Ambiguous,
    Unreached,
    Blocked,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ActivationOutcome {
    Rejected { reason: Rejection },
    Scheduled { destination: Location, trace: TraceResult },
}

impl ActivationOutcome {
    fn rejected(reason: Rejection) -> Self {
        ActivationOutcome::Rejected { reason }
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, ActivationOutcome::Scheduled { .. })
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            ActivationOutcome::Rejected { reason } => Some(*reason),
            ActivationOutcome::Scheduled { .. } => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    PlayerGone,
    OutOfRange,
    CapChanged,
    /// The host declined to move the player.
    Refused,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed { player: PlayerId, from: Location, to: Location },
    Aborted { player: PlayerId, reason: AbortReason },
}

pub struct Portal {
    config: PortalConfig,
    tracer: Tracer,
    log: ActivationLog,
}

impl Portal {
    pub fn new(config: PortalConfig) -> Result<Self, ConfigError> {
        let tracer = Tracer::new(&config)?;
        let log = ActivationLog::from_config(&config);
        Ok(Self { config, tracer, log })
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn activations(&self) -> &ActivationLog {
        &self.log
    }

    /// Entry point for the host's interaction events.
    pub fn on_interact<H, S>(
        &mut self,
        host: &mut H,
        scheduler: &mut S,
        player: PlayerId,
        action: InteractAction,
        clicked: Block,
        now: Instant,
    ) -> ActivationOutcome
    where
        H: Host + ?Sized,
        S: Scheduler + ?Sized,
    {
        if action != InteractAction::LeftClickBlock {
            return ActivationOutcome::rejected(Rejection::Ignored);
        }
        self.activate(host, scheduler, player, clicked, now)
    }

    /// Activate the portal at `start` for `player`. Creative players and non-cap blocks are
    /// rejected here too, so hosts without click events can call this directly.
    pub fn activate<H, S>(
        &mut self,
        host: &mut H,
        scheduler: &mut S,
        player: PlayerId,
        start: Block,
        now: Instant,
    ) -> ActivationOutcome
    where
        H: Host + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(state) = host.player(player) else {
            return ActivationOutcome::rejected(Rejection::UnknownPlayer);
        };
        if state.game_mode == GameMode::Creative {
            return ActivationOutcome::rejected(Rejection::Exempt);
        }
        if !start.is(self.config.cap_material) {
            return ActivationOutcome::rejected(Rejection::Ignored);
        }

        if self.log.is_throttled(player, now, self.config.min_reactivation()) {
            debug!(player = %state.name, "portal activation throttled");
            return ActivationOutcome::rejected(Rejection::RateLimited);
        }

        if !self.within_range(&state.location, &start) {
            debug!(player = %state.name, "portal activation out of range");
            return ActivationOutcome::rejected(Rejection::OutOfRange);
        }

        info!(player = %state.name, "player initiated potential portal travel");

        let trace = self.tracer.trace(&*host, start);
        let (end, arrival) = match trace.outcome {
            TraceOutcome::Resolved { end, arrival } => (end, arrival),
            TraceOutcome::Ambiguous => return ActivationOutcome::rejected(Rejection::Ambiguous),
            TraceOutcome::Unreached => return ActivationOutcome::rejected(Rejection::Unreached),
        };

        info!(
            steps = trace.steps,
            distance = trace.distance().unwrap_or_default(),
            elapsed_us = trace.elapsed.as_micros() as u64,
            "completed portal trace"
        );

        let origin = state.location;
        let mut destination = resolve_destination(&end, arrival);
        if !is_safe(&*host, &destination) {
            host.send_message(player, BLOCKED_MESSAGE);
            return ActivationOutcome::rejected(Rejection::Blocked);
        }

        // Facing is preserved across the jump.
        destination.yaw = origin.yaw;

        host.play_sound(origin, Sound::PortalTravel);
        host.apply_confusion(player, self.config.confusion_ticks);

        self.log.record(player, now);

        scheduler.schedule(
            self.config.commit_delay_ticks,
            PendingCommit { player, player_name: state.name, start, origin, destination },
        );

        ActivationOutcome::Scheduled { destination, trace }
    }

    /// Apply a pending teleport. Player and cap are re-read; nothing from schedule time is trusted.
    pub fn commit<H>(&mut self, host: &mut H, pending: PendingCommit) -> CommitOutcome
    where
        H: Host + ?Sized,
    {
        let player = pending.player;
        // An aborted commit leaves the activation record in place, so the cooldown still applies.
        let Some(state) = host.player(player) else {
            debug!(player = %pending.player_name, "portal commit aborted: player gone");
            return CommitOutcome::Aborted { player, reason: AbortReason::PlayerGone };
        };
        if !self.within_range(&state.location, &pending.start) {
            debug!(player = %state.name, "portal commit aborted: player moved away");
            return CommitOutcome::Aborted { player, reason: AbortReason::OutOfRange };
        }
        let cap = host.block_at(pending.start.world, pending.start.pos);
        if !cap.is(self.config.cap_material) {
            debug!(player = %state.name, "portal commit aborted: cap changed");
            return CommitOutcome::Aborted { player, reason: AbortReason::CapChanged };
        }

        info!(
            player = %state.name,
            from = %pending.origin,
            to = %pending.destination,
            "player teleported through a portal"
        );

        if !host.teleport(player, pending.destination) {
            warn!(player = %state.name, "host refused portal teleport");
            return CommitOutcome::Aborted { player, reason: AbortReason::Refused };
        }
        host.play_effect(pending.origin, Effect::EnderSignal);
        host.play_sound(pending.destination, Sound::Portal);
        host.play_effect(pending.destination, Effect::EnderSignal);

        self.log.remove(player);

        CommitOutcome::Committed { player, from: pending.origin, to: pending.destination }
    }

    /// Advance `scheduler` to `tick` and commit everything that came due.
    pub fn run_due<H>(&mut self, host: &mut H, scheduler: &mut TickScheduler, tick: u64) -> Vec<CommitOutcome>
    where
        H: Host + ?Sized,
    {
        scheduler
            .advance(tick)
            .into_iter()
            .map(|pending| self.commit(host, pending))
            .collect()
    }

    /// Drop activation records past their TTL.
    pub fn sweep(&mut self, now: Instant) -> usize {
        self.log.sweep(now)
    }

    pub fn shutdown(&mut self) {
        self.log.clear();
    }

    fn within_range(&self, player: &Location, block: &Block) -> bool {
        player
            .distance(&block.location())
            .is_some_and(|d| d <= self.config.max_activation_distance)
    }
}

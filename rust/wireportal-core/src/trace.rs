//! Directed walk along a wire circuit from an activated cap to its terminating cap.
//!
//! The walk advances one block per step. At each step every face of the current block
//! except the one leading back is inspected; a wire of the latched sub-type or (after the
//! first step) a cap counts as a relative. More than one relative in a single step means
//! the circuit branches or loops and the trace is ambiguous. The walk stops when a step
//! produces no wire to move onto or when the step budget runs out.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::debug;

use crate::config::PortalConfig;
use crate::direction::{Direction, DIRECTION_ORDER};
use crate::error::ConfigError;
use crate::world::{Block, BlockView, Material};

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraceOutcome {
    /// More than one candidate neighbor at some step.
    Ambiguous,
    /// Dead end or step budget exhausted.
    Unreached,
    /// `arrival` points from `end` back toward the wire it was entered from.
    Resolved { end: Block, arrival: Direction },
}

#[derive(Clone, Debug, Serialize)]
pub struct TraceResult {
    pub outcome: TraceOutcome,
    pub start: Block,
    /// Blocks walked, counting the terminating cap.
    pub steps: u32,
    #[serde(serialize_with = "serialize_micros")]
    pub elapsed: Duration,
}

fn serialize_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_micros()).unwrap_or(u64::MAX))
}

impl TraceResult {
    pub fn is_resolved(&self) -> bool {
        matches!(self.outcome, TraceOutcome::Resolved { .. })
    }

    pub fn end(&self) -> Option<Block> {
        match self.outcome {
            TraceOutcome::Resolved { end, .. } => Some(end),
            _ => None,
        }
    }

    pub fn arrival(&self) -> Option<Direction> {
        match self.outcome {
            TraceOutcome::Resolved { arrival, .. } => Some(arrival),
            _ => None,
        }
    }

    /// Straight-line distance between the two caps of a resolved trace.
    pub fn distance(&self) -> Option<f64> {
        let end = self.end()?;
        self.start.location().distance(&end.location())
    }
}

#[derive(Clone, Debug)]
pub struct Tracer {
    cap: Material,
    wire: Material,
    max_steps: u32,
}

impl Tracer {
    pub fn new(config: &PortalConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { cap: config.cap_material, wire: config.wire_material, max_steps: config.max_trace_steps })
    }

    pub fn trace<W: BlockView + ?Sized>(&self, world: &W, start: Block) -> TraceResult {
        let started = Instant::now();

        let mut steps: u32 = 0;
        let mut current = start;
        // Face of `current` leading back to the previous block.
        let mut back: Option<Direction> = None;
        let mut last_found: Option<(Block, Direction)> = None;
        let mut circuit: Option<u8> = None;
        let mut moved = true;

        while moved && steps < self.max_steps {
            moved = false;
            let mut relatives = 0u32;
            let mut found: Option<(Block, Direction)> = None;

            for dir in DIRECTION_ORDER {
                if back == Some(dir) {
                    continue;
                }
                let Some(neighbor) = world.relative(&current, dir, 1) else {
                    continue;
                };
                if neighbor.is(self.wire) {
                    let tag = *circuit.get_or_insert(neighbor.data);
                    if neighbor.data != tag {
                        continue;
                    }
                    if !moved {
                        found = Some((neighbor, dir.opposite()));
                        moved = true;
                    }
                    relatives += 1;
                } else if neighbor.is(self.cap) && circuit.is_some() && steps > 0 {
                    // A cap ends the walk along this branch.
                    found = Some((neighbor, dir.opposite()));
                    moved = false;
                    relatives += 1;
                }
            }

            if relatives > 1 {
                debug!(x = current.pos.x, y = current.pos.y, z = current.pos.z, steps, relatives, "ambiguous portal circuit");
                return TraceResult { outcome: TraceOutcome::Ambiguous, start, steps, elapsed: started.elapsed() };
            }

            if let Some((block, arrival)) = found {
                current = block;
                back = Some(arrival);
                last_found = Some((block, arrival));
            }
            steps += 1;
        }

        let outcome = match last_found {
            Some((end, arrival)) if end.is(self.cap) => TraceOutcome::Resolved { end, arrival },
            _ => TraceOutcome::Unreached,
        };
        TraceResult { outcome, start, steps, elapsed: started.elapsed() }
    }
}

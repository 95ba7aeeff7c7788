use crate::direction::Direction;
use crate::world::{Block, BlockView, Location};

/// Offset from the horizontal center of the end cap at which the traveller appears.
///
/// `travel` is the direction the wire was moving in when it entered the cap, so the
/// traveller lands on the far side. Leaving downward drops two blocks so the whole body
/// clears the cap.
pub fn exit_offset(travel: Direction) -> (f64, f64, f64) {
    match travel {
        Direction::North => (0.0, 0.0, -1.0),
        Direction::East => (1.0, 0.0, 0.0),
        Direction::South => (0.0, 0.0, 1.0),
        Direction::West => (-1.0, 0.0, 0.0),
        Direction::Up => (0.0, 1.0, 0.0),
        Direction::Down => (0.0, -2.0, 0.0),
    }
}

/// Where a traveller should land for a resolved trace ending at `end`, entered from `arrival`.
/// Yaw and pitch are zero; the orchestrator copies the traveller's own orientation in.
pub fn resolve_destination(end: &Block, arrival: Direction) -> Location {
    let (dx, dy, dz) = exit_offset(arrival.opposite());
    end.location().add(0.5, 0.0, 0.5).add(dx, dy, dz)
}

/// A destination is safe when both the foot and head voxels are passable. Locations outside
/// the block coordinate range are never safe.
pub fn is_safe<W: BlockView + ?Sized>(world: &W, destination: &Location) -> bool {
    let Some(feet) = destination.block_pos() else {
        return false;
    };
    let Some(head) = feet.step(Direction::Up, 1) else {
        return false;
    };
    world.is_passable(&world.block_at(destination.world, feet))
        && world.is_passable(&world.block_at(destination.world, head))
}

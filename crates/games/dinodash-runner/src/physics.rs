use dinodash_core::time::Millis;

use crate::config::PhysicsConfig;
use crate::state::{CellIndex, EventKind, GameEvent, GameState, Item, Items, Runner};

/// Track cell under a horizontal position.
pub fn cell_index(x: f32, cell_size: f32) -> CellIndex {
    (x / cell_size).floor() as CellIndex
}

/// Move a runner by its velocity and apply gravity for one tick.
///
/// `frozen` stops horizontal progress once the round is over. Living
/// runners that sink below the ground plane (`y > 0`) are snapped back onto
/// it; dead runners keep falling.
pub fn integrate(runner: &mut Runner, frozen: bool, physics: &PhysicsConfig) {
    if !frozen {
        runner.x += runner.vx / 2.0;
    }
    runner.y += runner.vy;
    if runner.vy != 0.0 {
        runner.vy += physics.gravity;
    }
    if runner.y > 0.0 && !runner.dead {
        runner.vy = 0.0;
        runner.y = 0.0;
    }
}

/// The gap that would swallow a grounded runner standing in `cell`, if any.
/// Single gaps are checked before double gaps.
pub fn gap_under(items: &Items, cell: CellIndex) -> Option<Item> {
    [Item::Gap, Item::Gap2].into_iter().find(|&gap| {
        (0..gap.gap_reach()).any(|offset| items.get(&(cell + offset)) == Some(&gap))
    })
}

fn knock_back(runner: &mut Runner, now: Millis, physics: &PhysicsConfig) {
    runner.vx = physics.knockback_vx;
    runner.vy = physics.knockback_vy;
    runner.x -= runner.vx;
    runner.last_bounce_at = now;
}

/// Resolve at most one collision for a living runner.
///
/// Priority: gap fall, then flying bounce, then ground-obstacle bounce.
/// Bounces consume the obstacle. Heights strictly between
/// `flying_hit_below` and `ground_hit_above` clear both kinds of obstacle.
pub fn resolve_collision(
    runner: &mut Runner,
    items: &mut Items,
    now: Millis,
    physics: &PhysicsConfig,
) -> Option<GameEvent> {
    if runner.dead {
        return None;
    }
    let cell = cell_index(runner.x, physics.cell_size);

    if runner.on_ground()
        && let Some(gap) = gap_under(items, cell)
    {
        runner.vx = 0.0;
        runner.vy = physics.fall_vy;
        runner.dead = true;
        tracing::debug!(player_id = runner.id, cell_index = cell, ?gap, "Runner fell");
        return Some(GameEvent {
            cell_index: cell,
            item: gap,
            player_id: runner.id,
            kind: EventKind::Died,
        });
    }

    let item = *items.get(&cell)?;
    let hit = match item {
        Item::Flying => runner.y < physics.flying_hit_below,
        other if other.is_ground_obstacle() => runner.y > physics.ground_hit_above,
        _ => false,
    };
    if !hit {
        return None;
    }

    knock_back(runner, now, physics);
    items.remove(&cell);
    tracing::debug!(player_id = runner.id, cell_index = cell, ?item, "Runner bounced");
    Some(GameEvent {
        cell_index: cell,
        item,
        player_id: runner.id,
        kind: EventKind::Hit,
    })
}

/// Run per-runner physics and collisions for one tick and return the
/// events it produced. Runners are visited in id order.
pub fn step_runners(state: &mut GameState, now: Millis, physics: &PhysicsConfig) -> Vec<GameEvent> {
    let frozen = state.game_over;
    let mut events = Vec::new();
    for runner in state.players.values_mut() {
        integrate(runner, frozen, physics);
        if let Some(event) = resolve_collision(runner, &mut state.items, now, physics) {
            events.push(event);
        }
    }
    events
}

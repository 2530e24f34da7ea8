use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::world::{Direction, EntityId, WorldPosition};

/// How long an entity keeps reporting movement after its last position step.
///
/// Sized against a ~100 ms server step interval.
pub const MOVE_ANIM_WINDOW: Duration = Duration::from_millis(250);
pub const MOVEMENT_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
struct MovementSample {
    position: WorldPosition,
    facing: Direction,
    last_move_at: Duration,
    moving: bool,
}

/// Turns discrete position updates into a continuous "is moving" signal.
#[derive(Debug)]
pub struct MovementDebouncer {
    window: Duration,
    epsilon: f32,
    samples: HashMap<EntityId, MovementSample>,
}

impl Default for MovementDebouncer {
    fn default() -> Self {
        Self::new(MOVE_ANIM_WINDOW, MOVEMENT_EPSILON)
    }
}

impl MovementDebouncer {
    pub fn new(window: Duration, epsilon: f32) -> Self {
        Self {
            window,
            epsilon: if epsilon.is_finite() {
                epsilon.abs()
            } else {
                MOVEMENT_EPSILON
            },
            samples: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records the latest observation at time `now` and reports whether the entity counts as moving.
    pub fn observe(
        &mut self,
        id: EntityId,
        position: WorldPosition,
        facing: Direction,
        now: Duration,
    ) -> bool {
        let Some(sample) = self.samples.get_mut(&id) else {
            self.samples.insert(
                id,
                MovementSample {
                    position,
                    facing,
                    last_move_at: now,
                    moving: false,
                },
            );
            return false;
        };

        let moved = (position.x - sample.position.x).abs() > self.epsilon
            || (position.y - sample.position.y).abs() > self.epsilon
            || (position.z - sample.position.z).abs() > self.epsilon;
        if moved {
            sample.position = position;
            sample.facing = facing;
            sample.last_move_at = now;
            sample.moving = true;
            return true;
        }

        if facing != sample.facing {
            sample.facing = facing;
            sample.last_move_at = now;
            return sample.moving;
        }

        if sample.moving && now.saturating_sub(sample.last_move_at) < self.window {
            return true;
        }
        sample.moving = false;
        false
    }

    pub fn retain(&mut self, active: &HashSet<EntityId>) {
        self.samples.retain(|id, _| active.contains(id));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: EntityId = EntityId(1);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn first_observation_is_not_movement() {
        let mut debouncer = MovementDebouncer::default();
        assert!(!debouncer.observe(ID, WorldPosition::new(5.0, 5.0, 0.0), Direction::South, ms(0)));
    }

    #[test]
    fn small_step_keeps_moving_until_window_expires() {
        let mut debouncer = MovementDebouncer::default();
        let start = WorldPosition::new(0.0, 0.0, 0.0);
        let stepped = WorldPosition::new(0.02, 0.0, 0.0);
        debouncer.observe(ID, start, Direction::South, ms(0));

        assert!(debouncer.observe(ID, stepped, Direction::South, ms(0)));
        for t in [16, 100, 200, 249] {
            assert!(debouncer.observe(ID, stepped, Direction::South, ms(t)), "t={t}");
        }
        assert!(!debouncer.observe(ID, stepped, Direction::South, ms(250)));
        assert!(!debouncer.observe(ID, stepped, Direction::South, ms(260)));
    }

    #[test]
    fn jitter_below_epsilon_is_ignored() {
        let mut debouncer = MovementDebouncer::default();
        debouncer.observe(ID, WorldPosition::new(1.0, 1.0, 0.0), Direction::South, ms(0));
        assert!(!debouncer.observe(
            ID,
            WorldPosition::new(1.005, 0.996, 0.0),
            Direction::South,
            ms(10)
        ));
    }

    #[test]
    fn turning_in_place_does_not_start_movement() {
        let mut debouncer = MovementDebouncer::default();
        let position = WorldPosition::new(3.0, 3.0, 0.0);
        debouncer.observe(ID, position, Direction::South, ms(0));
        assert!(!debouncer.observe(ID, position, Direction::East, ms(50)));
        assert!(!debouncer.observe(ID, position, Direction::East, ms(60)));
    }

    #[test]
    fn turning_while_moving_extends_the_window() {
        let mut debouncer = MovementDebouncer::default();
        debouncer.observe(ID, WorldPosition::new(0.0, 0.0, 0.0), Direction::South, ms(0));
        let stepped = WorldPosition::new(1.0, 0.0, 0.0);
        assert!(debouncer.observe(ID, stepped, Direction::South, ms(100)));
        assert!(debouncer.observe(ID, stepped, Direction::East, ms(300)));
        assert!(debouncer.observe(ID, stepped, Direction::East, ms(500)));
        assert!(!debouncer.observe(ID, stepped, Direction::East, ms(550)));
    }

    #[test]
    fn retain_drops_inactive_entities() {
        let mut debouncer = MovementDebouncer::default();
        for id in 0..4 {
            debouncer.observe(EntityId(id), WorldPosition::default(), Direction::South, ms(0));
        }
        let active: HashSet<EntityId> = [EntityId(1), EntityId(3)].into_iter().collect();
        debouncer.retain(&active);
        assert_eq!(debouncer.len(), 2);
    }
}

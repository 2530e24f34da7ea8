use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tracing::debug;

use super::direction::{animation_direction, AnimationDirection};
use super::movement::MovementDebouncer;
use super::{resolve_body_id, AnimationState, BodyClass};
use crate::assets::AnimationFrame;
use crate::world::{AnimationProvider, Direction, EntityId, EntitySnapshot};

/// Actions that temporarily replace an entity's derived state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    Attack,
    Cast,
    Hit,
    Death,
}

impl OneShot {
    pub const fn state(self) -> AnimationState {
        match self {
            OneShot::Attack => AnimationState::Attacking,
            OneShot::Cast => AnimationState::CastingSpell,
            OneShot::Hit => AnimationState::GettingHit,
            OneShot::Death => AnimationState::Dying,
        }
    }

    const fn as_token(self) -> &'static str {
        match self {
            OneShot::Attack => "attack",
            OneShot::Cast => "cast",
            OneShot::Hit => "hit",
            OneShot::Death => "death",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActiveOneShot {
    kind: OneShot,
    remaining: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct EntityAnimationState {
    body_id: u16,
    state: AnimationState,
    /// Body and group of the sequence being played.
    current: Option<(u16, u8)>,
    direction: AnimationDirection,
    frame_index: usize,
    frame_count: usize,
    frame_timer: Duration,
    looping: bool,
    one_shot: Option<ActiveOneShot>,
    restart_pending: bool,
    /// Body, requested group and direction of the last successful lookup.
    resolved_for: Option<(u16, u8, u8)>,
}

impl EntityAnimationState {
    pub fn body_id(&self) -> u16 {
        self.body_id
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn current_group(&self) -> Option<u8> {
        self.current.map(|(_, group)| group)
    }

    pub fn direction(&self) -> u8 {
        self.direction.index
    }

    pub fn mirror(&self) -> bool {
        self.direction.mirror
    }

    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn frame_timer(&self) -> Duration {
        self.frame_timer
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn has_animation(&self) -> bool {
        self.frame_count > 0
    }

    pub fn current_frame<'a>(
        &self,
        animations: &'a dyn AnimationProvider,
    ) -> Option<&'a AnimationFrame> {
        let (body_id, group) = self.current?;
        animations
            .animation(body_id, group, self.direction.index)?
            .frame(self.frame_index)
    }

    fn start_one_shot(&mut self, kind: OneShot, duration: Duration) {
        self.one_shot = Some(ActiveOneShot {
            kind,
            remaining: duration,
        });
        self.restart_pending = true;
    }

    fn update(
        &mut self,
        entity: &EntitySnapshot,
        body_id: u16,
        moving_now: bool,
        dt: Duration,
        animations: &dyn AnimationProvider,
    ) {
        if body_id != self.body_id {
            self.body_id = body_id;
            self.resolved_for = None;
        }

        let overridden = self.tick_one_shot(dt, entity.health <= 0);
        let previous_state = self.state;
        self.state = overridden.unwrap_or_else(|| derived_state(entity, moving_now));
        self.looping = overridden.is_none() && self.state.loops();

        let restarted = self.resolve(previous_state, entity.facing, animations);
        if !restarted {
            self.advance_frames(dt);
        }
    }

    fn tick_one_shot(&mut self, dt: Duration, dead: bool) -> Option<AnimationState> {
        let shot = self.one_shot.as_mut()?;
        shot.remaining = shot.remaining.saturating_sub(dt);
        if shot.remaining.is_zero() || (dead && shot.kind != OneShot::Death) {
            self.one_shot = None;
            return None;
        }
        Some(shot.kind.state())
    }

    /// Looks up the sequence for the current state and facing. Returns `true` when playback restarted.
    fn resolve(
        &mut self,
        previous_state: AnimationState,
        facing: Direction,
        animations: &dyn AnimationProvider,
    ) -> bool {
        let class = BodyClass::of(self.body_id);
        let group = class.group_for(self.state);
        let direction = animation_direction(facing);
        let key = (self.body_id, group, direction.index);
        let restart = std::mem::take(&mut self.restart_pending);
        self.direction = direction;

        if !restart && self.resolved_for == Some(key) && self.frame_count > 0 {
            return false;
        }

        let mut resolved = frame_count_of(animations, self.body_id, group, direction.index)
            .map(|count| (group, count));
        if resolved.is_none() && self.state.is_locomotion() {
            let standing = class.group_for(AnimationState::Standing);
            resolved = frame_count_of(animations, self.body_id, standing, direction.index)
                .map(|count| (standing, count));
        }

        let Some((group, count)) = resolved else {
            self.resolved_for = None;
            self.current = None;
            self.frame_count = 0;
            self.frame_index = 0;
            self.frame_timer = Duration::ZERO;
            return true;
        };
        self.resolved_for = Some(key);
        self.frame_count = count;

        if !restart && self.current == Some((self.body_id, group)) {
            // Same sequence, new direction.
            self.frame_index %= count;
            return false;
        }

        self.current = Some((self.body_id, group));
        self.frame_timer = Duration::ZERO;
        self.frame_index =
            if self.state == AnimationState::Dead && previous_state != AnimationState::Dying {
                count - 1
            } else {
                0
            };
        true
    }

    fn advance_frames(&mut self, dt: Duration) {
        if self.frame_count == 0 {
            return;
        }
        self.frame_timer = self.frame_timer.saturating_add(dt);
        let delay = self.state.frame_delay();
        if self.frame_timer < delay {
            return;
        }

        let delay_ns = delay.as_nanos();
        let elapsed_ns = self.frame_timer.as_nanos();
        let steps = elapsed_ns / delay_ns;
        self.frame_timer = Duration::from_nanos((elapsed_ns % delay_ns) as u64);

        let count = self.frame_count as u128;
        let index = self.frame_index as u128;
        let next = if self.looping {
            (index + steps % count) % count
        } else {
            index.saturating_add(steps).min(count - 1)
        };
        self.frame_index = next as usize;
    }
}

fn derived_state(entity: &EntitySnapshot, moving_now: bool) -> AnimationState {
    if entity.health <= 0 {
        AnimationState::Dead
    } else if entity.is_running {
        AnimationState::Running
    } else if moving_now || entity.is_moving {
        AnimationState::Walking
    } else {
        AnimationState::Standing
    }
}

fn frame_count_of(
    animations: &dyn AnimationProvider,
    body_id: u16,
    group: u8,
    direction: u8,
) -> Option<usize> {
    animations
        .animation(body_id, group, direction)
        .map(|animation| animation.frame_count())
        .filter(|count| *count > 0)
}

/// Per-entity animation state keyed by entity id.
#[derive(Debug, Default)]
pub struct EntityAnimator {
    states: HashMap<EntityId, EntityAnimationState>,
    movement: MovementDebouncer,
    clock: Duration,
}

impl EntityAnimator {
    pub fn new(move_window: Duration, movement_epsilon: f32) -> Self {
        Self {
            states: HashMap::new(),
            movement: MovementDebouncer::new(move_window, movement_epsilon),
            clock: Duration::ZERO,
        }
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    /// Advances every listed entity by `dt` and forgets entities that are no longer listed.
    pub fn update(
        &mut self,
        entities: &[EntitySnapshot],
        dt: Duration,
        animations: &dyn AnimationProvider,
    ) {
        self.clock = self.clock.saturating_add(dt);
        let mut active = HashSet::with_capacity(entities.len());
        for entity in entities {
            active.insert(entity.id);
            let body_id = resolve_body_id(entity.kind, animations);
            let moving_now = self
                .movement
                .observe(entity.id, entity.position, entity.facing, self.clock);
            self.states
                .entry(entity.id)
                .or_default()
                .update(entity, body_id, moving_now, dt, animations);
        }
        self.cleanup(&active);
    }

    pub fn play_attack_animation(&mut self, id: EntityId, duration: Duration) {
        self.play_one_shot(id, OneShot::Attack, duration);
    }

    pub fn play_cast_animation(&mut self, id: EntityId, duration: Duration) {
        self.play_one_shot(id, OneShot::Cast, duration);
    }

    pub fn play_hit_animation(&mut self, id: EntityId, duration: Duration) {
        self.play_one_shot(id, OneShot::Hit, duration);
    }

    pub fn play_death_animation(&mut self, id: EntityId, duration: Duration) {
        self.play_one_shot(id, OneShot::Death, duration);
    }

    pub fn play_one_shot(&mut self, id: EntityId, kind: OneShot, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        debug!(
            entity_id = id.0,
            one_shot = kind.as_token(),
            duration_ms = duration.as_millis() as u64,
            "animation_one_shot_started"
        );
        self.states
            .entry(id)
            .or_default()
            .start_one_shot(kind, duration);
    }

    pub fn state(&self, id: EntityId) -> Option<&EntityAnimationState> {
        self.states.get(&id)
    }

    /// Drops state for entities not in `active`. Returns how many were removed.
    pub fn cleanup(&mut self, active: &HashSet<EntityId>) -> usize {
        let before = self.states.len();
        self.states.retain(|id, _| active.contains(id));
        self.movement.retain(active);
        let removed = before - self.states.len();
        if removed > 0 {
            debug!(removed, remaining = self.states.len(), "animation_states_pruned");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn clear(&mut self) {
        self.states.clear();
        self.movement.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::MALE_BODY_ID;
    use crate::assets::{Animation, Texture};
    use crate::world::{EntityKind, WorldPosition};

    const ID: EntityId = EntityId(1);
    const SOUTH: u8 = 1;
    const SOUTH_WEST: u8 = 2;

    #[derive(Default)]
    struct FakeAnimations {
        sequences: HashMap<(u16, u8, u8), Animation>,
    }

    impl FakeAnimations {
        fn with(mut self, body_id: u16, group: u8, direction: u8, frames: usize) -> Self {
            let frames = (0..frames)
                .map(|i| AnimationFrame {
                    texture: Texture::solid(2, 2, [i as u8, 0, 0, 255]),
                    center_x: 0,
                    center_y: 0,
                })
                .collect();
            self.sequences
                .insert((body_id, group, direction), Animation { frames });
            self
        }
    }

    impl AnimationProvider for FakeAnimations {
        fn animation(&self, body_id: u16, group: u8, direction: u8) -> Option<&Animation> {
            self.sequences.get(&(body_id, group, direction))
        }

        fn body_for_type(&self, _type_id: u16) -> Option<u16> {
            None
        }
    }

    fn player_at(x: f32, y: f32) -> EntitySnapshot {
        EntitySnapshot::new(
            ID,
            EntityKind::Player { female: false },
            WorldPosition::new(x, y, 0.0),
        )
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn walking_loop_wraps_after_last_frame() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 0, SOUTH, 4);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.is_moving = true;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        let mut seen = Vec::new();
        for _ in 0..4 {
            animator.update(std::slice::from_ref(&entity), ms(100), &animations);
            seen.push(animator.state(ID).expect("state").frame_index());
        }
        assert_eq!(seen, vec![1, 2, 3, 0]);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.state(), AnimationState::Walking);
        assert!(state.looping());
    }

    #[test]
    fn huge_delta_keeps_frame_in_range() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 0, SOUTH, 4);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.is_moving = true;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        animator.update(
            std::slice::from_ref(&entity),
            Duration::from_secs(1_000_000),
            &animations,
        );
        let state = animator.state(ID).expect("state");
        assert!(state.frame_index() < state.frame_count());
        assert!(state.frame_timer() < AnimationState::Walking.frame_delay());
    }

    #[test]
    fn discrete_steps_walk_for_the_debounce_window() {
        let animations = FakeAnimations::default();
        let mut animator = EntityAnimator::default();

        animator.update(&[player_at(0.0, 0.0)], ms(0), &animations);
        animator.update(&[player_at(0.02, 0.0)], ms(0), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Walking
        );
        for _ in 0..4 {
            animator.update(&[player_at(0.02, 0.0)], ms(50), &animations);
            assert_eq!(
                animator.state(ID).expect("state").state(),
                AnimationState::Walking
            );
        }
        animator.update(&[player_at(0.02, 0.0)], ms(50), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Standing
        );
    }

    #[test]
    fn missing_walk_falls_back_to_standing_group() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 4, SOUTH, 2);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.is_moving = true;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.state(), AnimationState::Walking);
        assert_eq!(state.current_group(), Some(4));
        assert_eq!(state.frame_count(), 2);
        assert!(state.current_frame(&animations).is_some());
    }

    #[test]
    fn no_animation_leaves_nothing_to_draw() {
        let animations = FakeAnimations::default();
        let mut animator = EntityAnimator::default();
        animator.update(&[player_at(1.0, 1.0)], ms(16), &animations);
        let state = animator.state(ID).expect("state");
        assert!(!state.has_animation());
        assert_eq!(state.frame_index(), 0);
        assert!(state.current_frame(&animations).is_none());
    }

    #[test]
    fn entering_dead_directly_shows_last_frame() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 21, SOUTH, 6);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.health = 0;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        assert_eq!(animator.state(ID).expect("state").frame_index(), 5);
        animator.update(std::slice::from_ref(&entity), ms(1000), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.state(), AnimationState::Dead);
        assert_eq!(state.frame_index(), 5);
        assert!(!state.looping());
    }

    #[test]
    fn dying_continues_into_dead_without_jumping() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 21, SOUTH, 6);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);

        animator.play_death_animation(ID, ms(200));
        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Dying
        );
        animator.update(std::slice::from_ref(&entity), ms(150), &animations);
        assert_eq!(animator.state(ID).expect("state").frame_index(), 1);

        entity.health = 0;
        animator.update(std::slice::from_ref(&entity), ms(150), &animations);
        assert_eq!(animator.state(ID).expect("state").frame_index(), 2);
        animator.update(std::slice::from_ref(&entity), ms(150), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.state(), AnimationState::Dead);
        assert_eq!(state.frame_index(), 3);
    }

    #[test]
    fn turning_keeps_frame_modulo_new_count() {
        let animations = FakeAnimations::default()
            .with(MALE_BODY_ID, 0, SOUTH, 4)
            .with(MALE_BODY_ID, 0, SOUTH_WEST, 2);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.is_moving = true;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        animator.update(std::slice::from_ref(&entity), ms(300), &animations);
        assert_eq!(animator.state(ID).expect("state").frame_index(), 3);

        entity.facing = Direction::SouthWest;
        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.direction(), SOUTH_WEST);
        assert_eq!(state.frame_count(), 2);
        assert_eq!(state.frame_index(), 1);
    }

    #[test]
    fn mirrored_facing_uses_authored_direction() {
        let animations = FakeAnimations::default().with(MALE_BODY_ID, 4, 3, 1);
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.facing = Direction::North;

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.direction(), 3);
        assert!(state.mirror());
        assert!(state.has_animation());
    }

    #[test]
    fn one_shot_overrides_for_its_duration() {
        let animations = FakeAnimations::default()
            .with(MALE_BODY_ID, 4, SOUTH, 2)
            .with(MALE_BODY_ID, 9, SOUTH, 3);
        let mut animator = EntityAnimator::default();
        let entity = player_at(1.0, 1.0);

        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        animator.play_attack_animation(ID, ms(300));
        animator.update(std::slice::from_ref(&entity), ms(0), &animations);
        for _ in 0..2 {
            let state = animator.state(ID).expect("state");
            assert_eq!(state.state(), AnimationState::Attacking);
            assert!(!state.looping());
            animator.update(std::slice::from_ref(&entity), ms(100), &animations);
        }
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Attacking
        );
        animator.update(std::slice::from_ref(&entity), ms(100), &animations);
        let state = animator.state(ID).expect("state");
        assert_eq!(state.state(), AnimationState::Standing);
        assert_eq!(state.current_group(), Some(4));
    }

    #[test]
    fn one_shot_ends_on_the_update_that_exhausts_it() {
        let animations = FakeAnimations::default()
            .with(MALE_BODY_ID, 4, SOUTH, 2)
            .with(MALE_BODY_ID, 9, SOUTH, 3);
        let mut animator = EntityAnimator::default();
        let entity = player_at(1.0, 1.0);

        animator.play_attack_animation(ID, ms(100));
        let mut elapsed = 0;
        while elapsed + 16 < 100 {
            animator.update(std::slice::from_ref(&entity), ms(16), &animations);
            elapsed += 16;
            assert_eq!(
                animator.state(ID).expect("state").state(),
                AnimationState::Attacking,
                "t={elapsed}ms"
            );
        }
        animator.update(std::slice::from_ref(&entity), ms(16), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Standing
        );

        animator.play_cast_animation(ID, ms(100));
        animator.update(std::slice::from_ref(&entity), ms(500), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Standing
        );
    }

    #[test]
    fn one_shot_on_dead_entity_is_dropped() {
        let animations = FakeAnimations::default();
        let mut animator = EntityAnimator::default();
        let mut entity = player_at(1.0, 1.0);
        entity.health = 0;

        animator.play_hit_animation(ID, ms(500));
        animator.update(std::slice::from_ref(&entity), ms(16), &animations);
        assert_eq!(
            animator.state(ID).expect("state").state(),
            AnimationState::Dead
        );
    }

    #[test]
    fn update_forgets_entities_that_left() {
        let animations = FakeAnimations::default();
        let mut animator = EntityAnimator::default();
        let mut other = player_at(2.0, 2.0);
        other.id = EntityId(2);

        animator.update(&[player_at(1.0, 1.0), other.clone()], ms(16), &animations);
        assert_eq!(animator.len(), 2);
        animator.update(&[other], ms(16), &animations);
        assert_eq!(animator.len(), 1);
        assert!(animator.state(ID).is_none());
    }
}

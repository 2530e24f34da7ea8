mod direction;
mod movement;
mod state_machine;

use std::time::Duration;

pub use direction::{animation_direction, AnimationDirection};
pub use movement::{MovementDebouncer, MOVEMENT_EPSILON, MOVE_ANIM_WINDOW};
pub use state_machine::{EntityAnimationState, EntityAnimator, OneShot};

use crate::world::{AnimationProvider, EntityKind};

pub const MALE_BODY_ID: u16 = 400;
pub const FEMALE_BODY_ID: u16 = 401;
pub const DEFAULT_BODY_ID: u16 = 1;

pub const WALK_FRAME_DELAY: Duration = Duration::from_millis(100);
pub const RUN_FRAME_DELAY: Duration = Duration::from_millis(60);
pub const ATTACK_FRAME_DELAY: Duration = Duration::from_millis(80);
pub const CAST_FRAME_DELAY: Duration = Duration::from_millis(120);
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    #[default]
    Standing,
    Walking,
    Running,
    Attacking,
    CastingSpell,
    GettingHit,
    Dying,
    Dead,
}

impl AnimationState {
    pub const fn frame_delay(self) -> Duration {
        match self {
            AnimationState::Walking => WALK_FRAME_DELAY,
            AnimationState::Running => RUN_FRAME_DELAY,
            AnimationState::Attacking => ATTACK_FRAME_DELAY,
            AnimationState::CastingSpell => CAST_FRAME_DELAY,
            AnimationState::Standing
            | AnimationState::GettingHit
            | AnimationState::Dying
            | AnimationState::Dead => DEFAULT_FRAME_DELAY,
        }
    }

    pub const fn loops(self) -> bool {
        !matches!(self, AnimationState::Dying | AnimationState::Dead)
    }

    pub const fn is_locomotion(self) -> bool {
        matches!(self, AnimationState::Walking | AnimationState::Running)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyClass {
    Monster,
    Animal,
    People,
}

impl BodyClass {
    pub const fn of(body_id: u16) -> BodyClass {
        match body_id {
            0..=199 => BodyClass::Monster,
            200..=399 => BodyClass::Animal,
            _ => BodyClass::People,
        }
    }

    /// Animation group for a state. Classes without run or cast groups reuse walk/attack.
    pub const fn group_for(self, state: AnimationState) -> u8 {
        match self {
            BodyClass::People => match state {
                AnimationState::Standing => 4,
                AnimationState::Walking => 0,
                AnimationState::Running => 2,
                AnimationState::Attacking => 9,
                AnimationState::CastingSpell => 16,
                AnimationState::GettingHit => 20,
                AnimationState::Dying | AnimationState::Dead => 21,
            },
            BodyClass::Monster => match state {
                AnimationState::Standing => 1,
                AnimationState::Walking | AnimationState::Running => 0,
                AnimationState::Attacking => 4,
                AnimationState::CastingSpell => 12,
                AnimationState::GettingHit => 10,
                AnimationState::Dying | AnimationState::Dead => 2,
            },
            BodyClass::Animal => match state {
                AnimationState::Standing => 2,
                AnimationState::Walking => 0,
                AnimationState::Running => 1,
                AnimationState::Attacking | AnimationState::CastingSpell => 5,
                AnimationState::GettingHit => 7,
                AnimationState::Dying | AnimationState::Dead => 8,
            },
        }
    }
}

pub fn resolve_body_id(kind: EntityKind, animations: &dyn AnimationProvider) -> u16 {
    match kind {
        EntityKind::Player { female: false } => MALE_BODY_ID,
        EntityKind::Player { female: true } => FEMALE_BODY_ID,
        EntityKind::Npc { type_id } | EntityKind::Creature { type_id } => animations
            .body_for_type(type_id)
            .unwrap_or(DEFAULT_BODY_ID),
    }
}

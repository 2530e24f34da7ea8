use crate::world::Direction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnimationDirection {
    pub index: u8,
    pub mirror: bool,
}

// Frames exist for five authored directions; the other three mirror them.
const DIRECTION_TABLE: [AnimationDirection; 8] = [
    AnimationDirection {
        index: 3,
        mirror: true,
    },
    AnimationDirection {
        index: 2,
        mirror: true,
    },
    AnimationDirection {
        index: 1,
        mirror: true,
    },
    AnimationDirection {
        index: 0,
        mirror: false,
    },
    AnimationDirection {
        index: 1,
        mirror: false,
    },
    AnimationDirection {
        index: 2,
        mirror: false,
    },
    AnimationDirection {
        index: 3,
        mirror: false,
    },
    AnimationDirection {
        index: 4,
        mirror: false,
    },
];

pub fn animation_direction(facing: Direction) -> AnimationDirection {
    DIRECTION_TABLE[facing.index()]
}

use crate::grid::Coord;
use crate::upgrade::UpgradeKind;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by operations on the core model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// The coordinate lies outside the grid.
    #[error("sector {0} is outside the grid")]
    OutOfBounds(Coord),

    /// A grid must have at least one sector in each dimension and at most
    /// [`MAX_SECTORS`](crate::grid::MAX_SECTORS) in total.
    #[error("invalid grid size {width}x{height}")]
    InvalidGridSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },

    /// A stored grid lists the wrong number of sectors for its size.
    #[error("grid of {width}x{height} lists {found} sectors")]
    SectorCount {
        /// Stored width.
        width: i32,
        /// Stored height.
        height: i32,
        /// Number of sectors present.
        found: usize,
    },

    /// A stored sector sits in the wrong row-major slot.
    #[error("sector {found} stored where {expected} belongs")]
    SectorMisplaced {
        /// Coordinate of the slot.
        expected: Coord,
        /// Coordinate recorded on the sector.
        found: Coord,
    },

    /// The system is already at its maximum level.
    #[error("{0} is already at max level")]
    UpgradeMaxed(UpgradeKind),

    /// The ship cannot afford the upgrade.
    #[error("{kind} costs {cost} resources, only {available} available")]
    InsufficientResources {
        /// System being upgraded.
        kind: UpgradeKind,
        /// Cost of the next level.
        cost: u64,
        /// Resources on hand.
        available: u64,
    },

    /// An unrecognised name was supplied for an enumerated value.
    #[error("unknown {what}: {name}")]
    UnknownName {
        /// What kind of value was being parsed.
        what: &'static str,
        /// The rejected input.
        name: String,
    },
}

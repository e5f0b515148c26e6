//! Fixed-size voxel buffer that scripts draw into.

use glam::IVec3;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A group identifier stored in a voxel. `0` means the cell is empty.
pub type GroupId = u8;

/// Group assigned to voxels before any `group` command runs.
pub const DEFAULT_GROUP: GroupId = 1;

/// Default grid extent along every axis.
pub const DEFAULT_EXTENT: i32 = 256;

/// Largest number of cells a grid may allocate (1 GiB of group ids).
pub const MAX_VOLUME: usize = 1 << 30;

/// Selects which voxels an operation reacts to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupFilter {
    /// Any nonzero cell.
    #[default]
    Any,
    /// Only cells tagged with exactly this group.
    Exactly(GroupId),
}

/// A populated cell, as handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub position: IVec3,
    pub group: GroupId,
}

/// A dense `W x H x D` grid of group ids.
///
/// Every accessor is bounds-checked: reads outside the grid report an empty
/// cell and writes outside the grid are dropped. Generative commands rely on
/// this to walk past the edges without failing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    extent: IVec3,
    cells: Vec<GroupId>,
}

impl VoxelGrid {
    /// Creates an empty grid. Negative extents are treated as zero.
    ///
    /// An extent whose volume exceeds [`MAX_VOLUME`] yields a zero-sized grid
    /// that absorbs every write.
    pub fn new(extent: IVec3) -> Self {
        let requested = extent.max(IVec3::ZERO);
        let volume = (requested.x as usize)
            .checked_mul(requested.y as usize)
            .and_then(|v| v.checked_mul(requested.z as usize))
            .filter(|v| *v <= MAX_VOLUME);
        let (extent, volume) = match volume {
            Some(volume) => (requested, volume),
            None => {
                warn!(%requested, max = MAX_VOLUME, "grid too large; using an empty grid");
                (IVec3::ZERO, 0)
            }
        };
        Self {
            extent,
            cells: vec![0; volume],
        }
    }

    /// Size of the grid along X, Y and Z.
    pub fn extent(&self) -> IVec3 {
        self.extent
    }

    /// The grid center, rounding half-cells up.
    pub fn center(&self) -> IVec3 {
        self.extent / 2 + self.extent % 2
    }

    /// True if `pos` lies inside the grid.
    pub fn contains(&self, pos: IVec3) -> bool {
        pos.cmpge(IVec3::ZERO).all() && pos.cmplt(self.extent).all()
    }

    #[inline]
    fn index(&self, pos: IVec3) -> Option<usize> {
        if !self.contains(pos) {
            return None;
        }
        let (h, d) = (self.extent.y as usize, self.extent.z as usize);
        Some(pos.x as usize * h * d + pos.y as usize * d + pos.z as usize)
    }

    /// Returns the group stored at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: IVec3) -> Option<GroupId> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Tags the cell at `pos` with `group`. No-op outside the grid.
    pub fn set(&mut self, pos: IVec3, group: GroupId) {
        if let Some(i) = self.index(pos) {
            self.cells[i] = group;
        }
    }

    /// Empties the cell at `pos`. No-op outside the grid.
    pub fn unset(&mut self, pos: IVec3) {
        self.set(pos, 0);
    }

    /// True if the cell at `pos` holds any group. False outside the grid.
    pub fn is_full(&self, pos: IVec3) -> bool {
        self.get(pos).is_some_and(|g| g != 0)
    }

    /// True if the cell at `pos` passes `filter`. False outside the grid.
    pub fn is_in_group(&self, pos: IVec3, filter: GroupFilter) -> bool {
        match filter {
            GroupFilter::Any => self.is_full(pos),
            GroupFilter::Exactly(group) => self.get(pos).is_some_and(|g| g != 0 && g == group),
        }
    }

    /// Empties every cell.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// Iterates every populated cell in x, then y, then z order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let (h, d) = (self.extent.y as usize, self.extent.z as usize);
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, g)| **g != 0)
            .map(move |(i, &group)| Cell {
                position: IVec3::new((i / (h * d)) as i32, ((i / d) % h) as i32, (i % d) as i32),
                group,
            })
    }

    /// Number of populated cells.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|g| **g != 0).count()
    }
}

impl Default for VoxelGrid {
    fn default() -> Self {
        Self::new(IVec3::splat(DEFAULT_EXTENT))
    }
}

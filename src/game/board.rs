//! Board representation and generation.
//!
//! A board is a square grid of [`Cell`]s. Generation places one home corner
//! per [`Team`] and scatters inactive spawns so that the extra spawns are
//! invariant under horizontal, vertical and point reflection.

use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize, Serializer};

/// Default side length of a board.
pub const DEFAULT_BOARD_SIZE: usize = 16;

/// Default share of a quadrant interior turned into extra spawns.
pub const DEFAULT_SPAWN_RATIO: f64 = 0.15;

/// Default probability of adding the centered spawn block.
pub const DEFAULT_CENTER_BLOCK_PROBABILITY: f64 = 0.5;

/// Default probability of adding the edge-midpoint spawns.
pub const DEFAULT_EDGE_MIDPOINT_PROBABILITY: f64 = 0.3;

// ============================================================================
// Teams and coordinates
// ============================================================================

/// One of the four teams. Each team is bound to one board corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Home corner `(0, 0)`.
    Red,
    /// Home corner `(0, N-1)`.
    Blue,
    /// Home corner `(N-1, 0)`.
    Green,
    /// Home corner `(N-1, N-1)`.
    Yellow,
}

impl Team {
    /// All teams in corner order.
    pub const ALL: [Self; 4] = [Self::Red, Self::Blue, Self::Green, Self::Yellow];

    /// Returns this team's home corner on a board of side `size`.
    #[must_use]
    pub const fn home_corner(self, size: usize) -> Coord {
        let far = size - 1;
        match self {
            Self::Red => Coord::new(0, 0),
            Self::Blue => Coord::new(0, far),
            Self::Green => Coord::new(far, 0),
            Self::Yellow => Coord::new(far, far),
        }
    }

    /// Lowercase name as used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column.
    pub col: usize,
}

impl Coord {
    /// Creates a coordinate.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Euclidean distance to `other` in cells.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn distance_to(self, other: Self) -> f64 {
        let dr = self.row.abs_diff(other.row) as f64;
        let dc = self.col.abs_diff(other.col) as f64;
        dr.hypot(dc)
    }

    /// This coordinate and its horizontal, vertical and point reflections
    /// on a board of side `size`. Entries repeat on the mirror axes.
    #[must_use]
    pub const fn reflections(self, size: usize) -> [Self; 4] {
        let far = size - 1;
        [
            self,
            Self::new(self.row, far - self.col),
            Self::new(far - self.row, self.col),
            Self::new(far - self.row, far - self.col),
        ]
    }
}

// ============================================================================
// Cells
// ============================================================================

/// One grid position with ownership, troops and spawn metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    /// Row of this cell.
    pub row: usize,
    /// Column of this cell.
    pub col: usize,
    /// Owning team, `None` when unclaimed.
    pub owner: Option<Team>,
    /// Troops stationed here.
    pub troops: u32,
    /// Whether the cell generates troops once active.
    pub is_spawn: bool,
    /// Whether the spawn is generating. Non-corner spawns start inactive and
    /// stay active once captured.
    pub spawn_active: bool,
    /// Whether this is a team's home corner.
    pub is_corner: bool,
    /// Founding team of a home corner. Never changes after generation.
    pub original_team: Option<Team>,
}

impl Cell {
    const fn blank(row: usize, col: usize) -> Self {
        Self {
            row,
            col,
            owner: None,
            troops: 0,
            is_spawn: false,
            spawn_active: false,
            is_corner: false,
            original_team: None,
        }
    }

    /// Grid position of this cell.
    #[must_use]
    pub const fn coord(&self) -> Coord {
        Coord::new(self.row, self.col)
    }

    /// Unclaimed territory that is not a spawn. Moves may not touch it.
    #[must_use]
    pub const fn is_inert(&self) -> bool {
        self.owner.is_none() && !self.is_spawn
    }

    /// Activates an inactive spawn. No-op for other cells.
    pub const fn activate_spawn(&mut self) {
        if self.is_spawn {
            self.spawn_active = true;
        }
    }

    /// Whether the ticker credits this cell.
    #[must_use]
    pub const fn generates_troops(&self) -> bool {
        self.is_spawn && self.spawn_active && self.owner.is_some()
    }
}

// ============================================================================
// Generation parameters
// ============================================================================

/// Tunables for [`Board::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationParams {
    /// Side length of the square board.
    pub size: usize,
    /// Share of one quadrant's interior turned into extra spawns.
    pub spawn_ratio: f64,
    /// Probability of adding the centered spawn block.
    pub center_block_probability: f64,
    /// Probability of adding the edge-midpoint spawns.
    pub edge_midpoint_probability: f64,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            spawn_ratio: DEFAULT_SPAWN_RATIO,
            center_block_probability: DEFAULT_CENTER_BLOCK_PROBABILITY,
            edge_midpoint_probability: DEFAULT_EDGE_MIDPOINT_PROBABILITY,
        }
    }
}

// ============================================================================
// Board
// ============================================================================

/// A square grid of cells, fixed in shape once created.
///
/// Serialized as a list of rows so clients can index `board[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a board of unclaimed, non-spawn cells with no corners.
    ///
    /// Used as the starting point for generation and for hand-built
    /// positions in tests.
    #[must_use]
    pub fn blank(size: usize) -> Self {
        let cells = (0..size)
            .flat_map(|row| (0..size).map(move |col| Cell::blank(row, col)))
            .collect();
        Self { size, cells }
    }

    /// Generates a fresh board.
    ///
    /// Corners are assigned to their teams, then `floor(spawn_ratio ×
    /// interior)` cells are drawn without replacement from the interior of the
    /// top-left quadrant (its corner row and column excluded) and mirrored
    /// into all four quadrants as inactive spawns. The optional centered block
    /// and edge midpoints are symmetric by placement.
    ///
    /// # Panics
    ///
    /// Panics if `params.size < 2` or a probability is outside `[0, 1]`;
    /// validated configuration never produces either.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(params: &GenerationParams, rng: &mut R) -> Self {
        let size = params.size;
        let mut board = Self::blank(size);

        for team in Team::ALL {
            let cell = board.cell_mut(team.home_corner(size));
            cell.owner = Some(team);
            cell.is_spawn = true;
            cell.spawn_active = true;
            cell.is_corner = true;
            cell.original_team = Some(team);
        }

        let interior = quadrant_interior(size);
        let count = extra_spawn_count(interior.len(), params.spawn_ratio);
        for index in rand::seq::index::sample(rng, interior.len(), count) {
            for coord in interior[index].reflections(size) {
                board.mark_inactive_spawn(coord);
            }
        }

        if rng.random_bool(params.center_block_probability) {
            for coord in center_block(size) {
                board.mark_inactive_spawn(coord);
            }
        }
        if rng.random_bool(params.edge_midpoint_probability) {
            for coord in edge_midpoints(size) {
                board.mark_inactive_spawn(coord);
            }
        }

        board
    }

    /// Side length.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether `coord` lies on the board.
    #[must_use]
    pub const fn contains(&self, coord: Coord) -> bool {
        coord.row < self.size && coord.col < self.size
    }

    /// Returns the cell at `coord`, if on the board.
    #[must_use]
    pub fn get(&self, coord: Coord) -> Option<&Cell> {
        self.index(coord).map(|i| &self.cells[i])
    }

    /// Returns the cell at `coord` mutably, if on the board.
    pub fn get_mut(&mut self, coord: Coord) -> Option<&mut Cell> {
        self.index(coord).map(move |i| &mut self.cells[i])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    /// All cells in row-major order, mutably.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Coordinates of every spawn that is not a home corner.
    #[must_use]
    pub fn extra_spawns(&self) -> BTreeSet<Coord> {
        self.cells
            .iter()
            .filter(|c| c.is_spawn && !c.is_corner)
            .map(Cell::coord)
            .collect()
    }

    const fn index(&self, coord: Coord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.row * self.size + coord.col)
        } else {
            None
        }
    }

    fn cell_mut(&mut self, coord: Coord) -> &mut Cell {
        let i = coord.row * self.size + coord.col;
        &mut self.cells[i]
    }

    fn mark_inactive_spawn(&mut self, coord: Coord) {
        if let Some(cell) = self.get_mut(coord) {
            if !cell.is_corner && !cell.is_spawn {
                cell.is_spawn = true;
                cell.spawn_active = false;
            }
        }
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.cells.chunks(self.size.max(1)))
    }
}

/// Interior of the top-left quadrant: rows and columns `1..size/2`.
fn quadrant_interior(size: usize) -> Vec<Coord> {
    let half = size / 2;
    (1..half)
        .flat_map(|row| (1..half).map(move |col| Coord::new(row, col)))
        .collect()
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn extra_spawn_count(interior: usize, ratio: f64) -> usize {
    let count = (interior as f64 * ratio).floor() as usize;
    count.min(interior)
}

/// The 2×2 block at the center of an even board, or the center cell of an
/// odd one.
fn center_block(size: usize) -> BTreeSet<Coord> {
    let mid = (size - 1) / 2;
    Coord::new(mid, mid).reflections(size).into_iter().collect()
}

/// Middle cells of each edge, closed under reflection. Even boards have two
/// middle cells per edge.
fn edge_midpoints(size: usize) -> BTreeSet<Coord> {
    let mid = size / 2;
    [Coord::new(0, mid), Coord::new(mid, 0)]
        .into_iter()
        .flat_map(|c| c.reflections(size))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(size: usize) -> GenerationParams {
        GenerationParams {
            size,
            ..GenerationParams::default()
        }
    }

    fn is_symmetric(board: &Board) -> bool {
        let spawns = board.extra_spawns();
        spawns.iter().all(|c| {
            c.reflections(board.size())
                .iter()
                .all(|m| spawns.contains(m))
        })
    }

    #[test]
    fn corners_belong_to_four_distinct_teams() {
        for size in [4, 5, 9, 16, 17, 32] {
            let mut rng = StdRng::seed_from_u64(size as u64);
            let board = Board::generate(&params(size), &mut rng);
            let mut owners = BTreeSet::new();
            for team in Team::ALL {
                let cell = board.get(team.home_corner(size)).unwrap();
                assert_eq!(cell.owner, Some(team));
                assert_eq!(cell.original_team, Some(team));
                assert!(cell.is_corner && cell.is_spawn && cell.spawn_active);
                assert_eq!(cell.troops, 0);
                owners.insert(team);
            }
            assert_eq!(owners.len(), 4);
        }
    }

    #[test]
    fn extra_spawns_are_mirror_symmetric() {
        for seed in 0..50 {
            for size in [4, 7, 16, 21] {
                let mut rng = StdRng::seed_from_u64(seed);
                let board = Board::generate(&params(size), &mut rng);
                assert!(is_symmetric(&board), "asymmetric board: size {size} seed {seed}");
            }
        }
    }

    #[test]
    fn extra_spawns_start_inactive_and_unowned() {
        let mut rng = StdRng::seed_from_u64(7);
        let board = Board::generate(&GenerationParams::default(), &mut rng);
        for coord in board.extra_spawns() {
            let cell = board.get(coord).unwrap();
            assert!(!cell.spawn_active);
            assert!(cell.owner.is_none());
            assert!(cell.original_team.is_none());
        }
    }

    #[test]
    fn quadrant_sample_size_matches_ratio() {
        // 16x16: interior is 7x7 = 49 cells, floor(0.15 * 49) = 7 picks,
        // mirrored into four quadrants.
        let p = GenerationParams {
            center_block_probability: 0.0,
            edge_midpoint_probability: 0.0,
            ..GenerationParams::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let board = Board::generate(&p, &mut rng);
        assert_eq!(board.extra_spawns().len(), 28);
    }

    #[test]
    fn center_and_edges_always_added_at_probability_one() {
        let p = GenerationParams {
            spawn_ratio: 0.0,
            center_block_probability: 1.0,
            edge_midpoint_probability: 1.0,
            ..GenerationParams::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let board = Board::generate(&p, &mut rng);
        let spawns = board.extra_spawns();
        for c in [(7, 7), (7, 8), (8, 7), (8, 8)] {
            assert!(spawns.contains(&Coord::new(c.0, c.1)));
        }
        assert!(spawns.contains(&Coord::new(0, 8)));
        assert!(spawns.contains(&Coord::new(15, 7)));
        assert_eq!(spawns.len(), 4 + 8);
        assert!(is_symmetric(&board));
    }

    #[test]
    fn odd_board_center_is_single_cell() {
        let block = center_block(5);
        assert_eq!(block.len(), 1);
        assert!(block.contains(&Coord::new(2, 2)));
        assert_eq!(edge_midpoints(5).len(), 4);
    }

    #[test]
    fn distance_is_euclidean() {
        let origin = Coord::new(0, 0);
        assert!((origin.distance_to(Coord::new(0, 3)) - 3.0).abs() < f64::EPSILON);
        assert!((origin.distance_to(Coord::new(3, 4)) - 5.0).abs() < f64::EPSILON);
        assert!((Coord::new(3, 4).distance_to(origin) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_bounds_lookup_is_none() {
        let board = Board::blank(4);
        assert!(board.get(Coord::new(4, 0)).is_none());
        assert!(board.get(Coord::new(0, 4)).is_none());
        assert!(board.get(Coord::new(3, 3)).is_some());
    }

    #[test]
    fn serializes_as_rows_with_camel_case_fields() {
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::generate(&params(4), &mut rng);
        let json = serde_json::to_value(&board).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].as_array().unwrap().len(), 4);
        let corner = &rows[0][3];
        assert_eq!(corner["owner"], "blue");
        assert_eq!(corner["isCorner"], true);
        assert_eq!(corner["spawnActive"], true);
        assert_eq!(corner["originalTeam"], "blue");
    }
}

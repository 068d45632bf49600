//! # Population Scheduler
//!
//! Walks a filled [`WorldGrid`] and emits one [`PlacementEvent`] per
//! non-empty cell, in ascending `(x, y, z)` order.
//!
//! ## Emission Modes
//!
//! - **Immediate**: a single [`PopulationScheduler::step`] emits everything.
//! - **Paced**: emission stops after every `rate` completed `(x, y)` rows
//!   and resumes on the next step, where
//!   `rate = cells / (reveal_seconds * frames_per_second)`.
//!
//! The scheduler only borrows the grid. Abandoning a paced reveal is just
//! dropping the scheduler.

use crate::error::{GenerationError, GenerationResult};
use crate::grid::{Classification, Dimensions, GridCoord, WorldGrid};

/// Frame rate assumed for the presentation host.
pub const DEFAULT_FRAMES_PER_SECOND: f64 = 60.0;

/// How a scheduler releases events.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum EmissionMode {
    /// Everything in one step.
    #[default]
    Immediate,
    /// Spread across steps so the reveal takes about `reveal_seconds`.
    Paced {
        /// Target reveal duration.
        reveal_seconds: f64,
        /// Steps per second of the driving host.
        frames_per_second: f64,
    },
}

impl EmissionMode {
    /// Paced mode at [`DEFAULT_FRAMES_PER_SECOND`].
    #[must_use]
    pub const fn paced(reveal_seconds: f64) -> Self {
        Self::Paced {
            reveal_seconds,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

/// Rows per batch for a paced reveal of `dims`.
///
/// # Errors
///
/// Returns [`GenerationError::InvalidPacingRate`] if `reveal_seconds` or
/// `frames_per_second` is not positive, or the resulting rate is not a
/// positive finite number.
pub fn pacing_rate(
    dims: Dimensions,
    reveal_seconds: f64,
    frames_per_second: f64,
) -> GenerationResult<f64> {
    let rate = dims.cell_count() as f64 / (reveal_seconds * frames_per_second);
    let positive = |v: f64| v.is_finite() && v > 0.0;

    if positive(reveal_seconds) && positive(frames_per_second) && positive(rate) {
        Ok(rate)
    } else {
        Err(GenerationError::InvalidPacingRate {
            reveal_seconds,
            rate,
        })
    }
}

/// Opaque descriptor handed to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileDescriptor {
    /// Tile catalog entry.
    Catalog(usize),
    /// The dedicated snow tile.
    Snow,
    /// Prefab catalog entry, with its footprint.
    Prefab {
        /// Index into the prefab catalog.
        index: usize,
        /// Prefab extents.
        footprint: Dimensions,
    },
    /// Any other negative sentinel, passed through unchanged.
    Marker(i32),
}

impl TileDescriptor {
    /// Maps a cell classification to its descriptor; `None` for empty cells.
    #[must_use]
    pub fn for_classification(class: Classification) -> Option<Self> {
        if class.is_empty() {
            return None;
        }
        if class == Classification::SNOW {
            return Some(Self::Snow);
        }
        Some(match class.tile_index() {
            Some(index) => Self::Catalog(index),
            None => Self::Marker(class.code()),
        })
    }
}

/// One materialization request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PlacementEvent {
    /// Target cell.
    pub coord: GridCoord,
    /// What to place there.
    pub descriptor: TileDescriptor,
}

impl PlacementEvent {
    /// Creates a new event.
    #[must_use]
    pub const fn new(coord: GridCoord, descriptor: TileDescriptor) -> Self {
        Self { coord, descriptor }
    }
}

/// Receiver of placement events.
pub trait PlacementSink {
    /// Accepts one event.
    fn place(&mut self, event: PlacementEvent);
}

impl PlacementSink for Vec<PlacementEvent> {
    fn place(&mut self, event: PlacementEvent) {
        self.push(event);
    }
}

/// Outcome of one scheduler step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// The batch budget ran out; call `step` again next tick.
    Yielded {
        /// Events emitted during this step.
        emitted: usize,
    },
    /// Every row has been visited.
    Finished {
        /// Events emitted during this step.
        emitted: usize,
    },
}

impl Step {
    /// Events emitted during this step.
    #[must_use]
    pub const fn emitted(self) -> usize {
        match self {
            Self::Yielded { emitted } | Self::Finished { emitted } => emitted,
        }
    }

    /// Returns true once the scheduler is done.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Resumable emitter over a borrowed grid.
#[derive(Debug)]
pub struct PopulationScheduler<'a> {
    grid: &'a WorldGrid,
    /// Rows per batch; `None` in immediate mode.
    rate: Option<f64>,
    /// Linear `(x, y)` row index to emit next.
    next_row: usize,
    rows_in_batch: usize,
    ticks: u64,
    emitted: usize,
    finished: bool,
}

impl<'a> PopulationScheduler<'a> {
    /// Creates a scheduler over `grid`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidPacingRate`] for a paced mode with
    /// a non-positive rate.
    pub fn new(grid: &'a WorldGrid, mode: EmissionMode) -> GenerationResult<Self> {
        let rate = match mode {
            EmissionMode::Immediate => None,
            EmissionMode::Paced {
                reveal_seconds,
                frames_per_second,
            } => Some(pacing_rate(
                grid.dimensions(),
                reveal_seconds,
                frames_per_second,
            )?),
        };

        Ok(Self { rate, ..Self::immediate(grid) })
    }

    /// Creates an immediate-mode scheduler over `grid`.
    #[must_use]
    pub const fn immediate(grid: &'a WorldGrid) -> Self {
        Self {
            grid,
            rate: None,
            next_row: 0,
            rows_in_batch: 0,
            ticks: 0,
            emitted: 0,
            finished: false,
        }
    }

    /// Rows per batch, or `None` in immediate mode.
    #[must_use]
    pub const fn rate(&self) -> Option<f64> {
        self.rate
    }

    /// Steps taken so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Events emitted so far.
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    /// Returns true once every row has been emitted.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Emits the next batch into `sink`.
    ///
    /// Stepping a finished scheduler is a no-op returning
    /// `Finished { emitted: 0 }`.
    pub fn step(&mut self, sink: &mut dyn PlacementSink) -> Step {
        if self.finished {
            return Step::Finished { emitted: 0 };
        }
        self.ticks += 1;

        let dims = self.grid.dimensions();
        let total_rows = dims.row_count();
        let mut emitted = 0;

        while self.next_row < total_rows {
            let (x, y) = (self.next_row / dims.height, self.next_row % dims.height);
            if let Some(row) = self.grid.row(x, y) {
                for (z, &class) in row.iter().enumerate() {
                    if let Some(descriptor) = TileDescriptor::for_classification(class) {
                        sink.place(PlacementEvent::new(GridCoord::new(x, y, z), descriptor));
                        emitted += 1;
                    }
                }
            }
            self.next_row += 1;

            let Some(rate) = self.rate else { continue };
            self.rows_in_batch += 1;
            if self.rows_in_batch as f64 >= rate && self.next_row < total_rows {
                self.rows_in_batch = 0;
                self.emitted += emitted;
                tracing::debug!(
                    tick = self.ticks,
                    emitted,
                    rows = self.next_row,
                    total_rows,
                    "scheduler yielded"
                );
                return Step::Yielded { emitted };
            }
        }

        self.emitted += emitted;
        self.finished = true;
        tracing::debug!(
            tick = self.ticks,
            emitted,
            total = self.emitted,
            "scheduler finished"
        );
        Step::Finished { emitted }
    }

    /// Steps until finished. Returns the number of steps taken.
    pub fn run(&mut self, sink: &mut dyn PlacementSink) -> u64 {
        let start = self.ticks;
        while !self.step(sink).is_finished() {}
        self.ticks - start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(dims: Dimensions) -> WorldGrid {
        WorldGrid::from_fn(dims, |c| {
            if (c.x + c.y + c.z) % 2 == 0 {
                Classification::tile(c.z % 3)
            } else {
                Classification::EMPTY
            }
        })
    }

    #[test]
    fn test_immediate_emits_in_ascending_order() {
        let dims = Dimensions::new(3, 4, 5);
        let grid = checkerboard(dims);
        let mut scheduler =
            PopulationScheduler::new(&grid, EmissionMode::Immediate).expect("immediate");
        let mut events: Vec<PlacementEvent> = Vec::new();

        let step = scheduler.step(&mut events);

        assert!(step.is_finished());
        assert_eq!(step.emitted(), events.len());
        assert_eq!(events.len(), dims.cell_count() - grid.count(Classification::EMPTY));
        assert!(events.windows(2).all(|w| w[0].coord < w[1].coord));
        assert_eq!(scheduler.ticks(), 1);
    }

    #[test]
    fn test_empty_cells_skipped_and_snow_mapped() {
        let grid = WorldGrid::from_fn(Dimensions::new(1, 1, 4), |c| match c.z {
            0 => Classification::EMPTY,
            1 => Classification::SNOW,
            2 => Classification::tile(2),
            _ => Classification::from_code(-5),
        });
        let mut events: Vec<PlacementEvent> = Vec::new();
        PopulationScheduler::new(&grid, EmissionMode::Immediate)
            .expect("immediate")
            .run(&mut events);

        let descriptors: Vec<TileDescriptor> = events.iter().map(|e| e.descriptor).collect();
        assert_eq!(
            descriptors,
            vec![
                TileDescriptor::Snow,
                TileDescriptor::Catalog(2),
                TileDescriptor::Marker(-5)
            ]
        );
    }

    #[test]
    fn test_paced_reveal_matches_immediate() {
        let dims = Dimensions::new(10, 1, 10);
        let grid = WorldGrid::from_fn(dims, |_| Classification::DEFAULT_TILE);

        let mut immediate: Vec<PlacementEvent> = Vec::new();
        PopulationScheduler::new(&grid, EmissionMode::Immediate)
            .expect("immediate")
            .run(&mut immediate);

        let mut scheduler =
            PopulationScheduler::new(&grid, EmissionMode::paced(1.0)).expect("valid rate");
        let rate = scheduler.rate().expect("paced");
        assert!((rate - 100.0 / 60.0).abs() < 1e-12);

        let mut paced: Vec<PlacementEvent> = Vec::new();
        let mut yields = 0;
        loop {
            match scheduler.step(&mut paced) {
                Step::Yielded { emitted } => {
                    yields += 1;
                    assert_eq!(emitted, 20, "two rows of ten per batch");
                }
                Step::Finished { .. } => break,
            }
        }

        assert_eq!(yields, 4);
        assert!(yields >= 1 && yields as f64 <= (100.0 / rate).ceil());
        assert_eq!(paced, immediate);
        assert_eq!(scheduler.emitted(), 100);
    }

    #[test]
    fn test_finished_scheduler_is_idle() {
        let grid = WorldGrid::from_fn(Dimensions::new(2, 2, 2), |_| Classification::SNOW);
        let mut scheduler =
            PopulationScheduler::new(&grid, EmissionMode::Immediate).expect("immediate");
        let mut events: Vec<PlacementEvent> = Vec::new();

        assert_eq!(scheduler.step(&mut events), Step::Finished { emitted: 8 });
        assert_eq!(scheduler.step(&mut events), Step::Finished { emitted: 0 });
        assert_eq!(events.len(), 8);
        assert!(scheduler.is_finished());
    }

    #[test]
    fn test_invalid_pacing_rejected() {
        let dims = Dimensions::new(10, 1, 10);
        for (reveal, fps) in [(0.0, 60.0), (-1.0, 60.0), (1.0, 0.0), (f64::NAN, 60.0)] {
            assert!(matches!(
                pacing_rate(dims, reveal, fps),
                Err(GenerationError::InvalidPacingRate { .. })
            ));
        }

        let grid = WorldGrid::from_fn(dims, |_| Classification::DEFAULT_TILE);
        assert!(PopulationScheduler::new(&grid, EmissionMode::paced(0.0)).is_err());
    }

    #[test]
    fn test_slow_reveal_yields_every_row() {
        // Rate below one row still emits a full row per step.
        let dims = Dimensions::new(2, 3, 2);
        let grid = WorldGrid::from_fn(dims, |_| Classification::DEFAULT_TILE);
        let mut scheduler =
            PopulationScheduler::new(&grid, EmissionMode::paced(10.0)).expect("valid rate");
        let mut events: Vec<PlacementEvent> = Vec::new();

        let steps = scheduler.run(&mut events);

        assert_eq!(steps, dims.row_count() as u64);
        assert_eq!(events.len(), dims.cell_count());
    }
}

//! # Headless Presentation
//!
//! Stands in for a renderer: resolves descriptors to catalog names, counts
//! placements and writes preview buffers as binary PGM images.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use terragrid_procedural::{
    Dimensions, GridCoord, PlacementEvent, PlacementSink, PreviewBuffers, SampleBuffer,
    TileDescriptor, WorldConfig,
};

/// Catalog names for every descriptor a world can emit.
#[derive(Clone, Debug)]
pub struct DescriptorNames {
    tiles: Vec<String>,
    prefabs: Vec<String>,
    snow: String,
}

impl DescriptorNames {
    /// Captures the catalogs of `config`.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        Self {
            tiles: config.tiles.iter().map(|t| t.name.clone()).collect(),
            prefabs: config.prefabs.iter().map(|p| p.name.clone()).collect(),
            snow: config.snow_tile.clone(),
        }
    }

    /// Display name for `descriptor`.
    #[must_use]
    pub fn name(&self, descriptor: TileDescriptor) -> String {
        let lookup = |names: &[String], index: usize| {
            names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("#{index}"))
        };
        match descriptor {
            TileDescriptor::Catalog(index) => lookup(&self.tiles, index),
            TileDescriptor::Prefab { index, .. } => lookup(&self.prefabs, index),
            TileDescriptor::Snow => self.snow.clone(),
            TileDescriptor::Marker(code) => format!("marker({code})"),
        }
    }
}

/// Counting sink for placement events.
#[derive(Debug, Default)]
pub struct PlacementTally {
    counts: HashMap<TileDescriptor, usize>,
    total: usize,
    /// Smallest and largest coordinate seen.
    bounds: Option<(GridCoord, GridCoord)>,
}

impl PlacementTally {
    /// Creates an empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total events received.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Events received for `descriptor`.
    #[must_use]
    pub fn count(&self, descriptor: TileDescriptor) -> usize {
        self.counts.get(&descriptor).copied().unwrap_or(0)
    }

    /// First and last coordinate received.
    #[must_use]
    pub const fn bounds(&self) -> Option<(GridCoord, GridCoord)> {
        self.bounds
    }

    /// Per-name counts, largest first, ties by name.
    #[must_use]
    pub fn summary(&self, names: &DescriptorNames) -> Vec<(String, usize)> {
        let mut by_name: HashMap<String, usize> = HashMap::new();
        for (&descriptor, &count) in &self.counts {
            *by_name.entry(names.name(descriptor)).or_default() += count;
        }

        let mut rows: Vec<(String, usize)> = by_name.into_iter().collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows
    }
}

impl PlacementSink for PlacementTally {
    fn place(&mut self, event: PlacementEvent) {
        *self.counts.entry(event.descriptor).or_default() += 1;
        self.total += 1;
        self.bounds = Some(match self.bounds {
            Some((low, high)) => (low.min(event.coord), high.max(event.coord)),
            None => (event.coord, event.coord),
        });
    }
}

/// Writes `buffer` as a binary (P5) PGM image, rows ordered by z.
///
/// # Errors
///
/// Returns any I/O error from creating or writing the file.
pub fn write_pgm(path: &Path, buffer: &SampleBuffer) -> io::Result<()> {
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    write!(file, "P5\n{} {}\n255\n", buffer.width(), buffer.depth())?;
    file.write_all(&buffer.to_gray8())?;
    file.flush()
}

/// Writes every allocated preview of one pass into `dir`.
///
/// Files are named `<pass>_<kind>.pgm`. Returns the written paths.
///
/// # Errors
///
/// Returns any I/O error from creating the directory or the files.
pub fn write_previews(
    dir: &Path,
    pass: u64,
    dims: Dimensions,
    previews: &PreviewBuffers,
) -> io::Result<Vec<PathBuf>> {
    if previews.is_empty() {
        return Ok(Vec::new());
    }
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for (kind, buffer) in previews.iter() {
        let path = dir.join(format!("{pass:03}_{}.pgm", kind.name()));
        write_pgm(&path, buffer)?;

        let quad = kind.quad(dims);
        tracing::debug!(
            path = %path.display(),
            scale = ?quad.scale,
            center = ?quad.center,
            "preview written"
        );
        written.push(path);
    }
    Ok(written)
}

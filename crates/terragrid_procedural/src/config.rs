//! # World Configuration
//!
//! Everything a caller supplies before a generation pass, loadable from TOML.
//!
//! ```toml
//! seed = 42
//! strategy = "noise_terrain"
//!
//! [dimensions]
//! width = 60
//! height = 20
//! depth = 60
//!
//! [[tiles]]
//! name = "grass"
//! weight = 3.0
//!
//! [terrain]
//! spikiness = 2.5
//! snow_layer = true
//! snow_line = 12.0
//!
//! [reveal]
//! paced = true
//! reveal_seconds = 4.0
//! ```
//!
//! Every section is optional; missing values fall back to the defaults below.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{GenerationError, GenerationResult};
use crate::grid::Dimensions;
use crate::noise::NoiseOrigin;
use crate::scheduler::{pacing_rate, EmissionMode, DEFAULT_FRAMES_PER_SECOND};
use crate::weights::WeightTable;

/// Which generation strategy fills the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Independent weighted draw per cell.
    #[default]
    RandomFill,
    /// Weighted prefab per coarse lattice point.
    ClusteredPrefab,
    /// Layered noise terrain.
    NoiseTerrain,
}

impl StrategyKind {
    /// Config-file name of this strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RandomFill => "random_fill",
            Self::ClusteredPrefab => "clustered_prefab",
            Self::NoiseTerrain => "noise_terrain",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_fill" | "random" => Ok(Self::RandomFill),
            "clustered_prefab" | "prefabs" => Ok(Self::ClusteredPrefab),
            "noise_terrain" | "noise" | "perlin" => Ok(Self::NoiseTerrain),
            other => Err(GenerationError::InvalidConfig(format!(
                "unknown strategy `{other}`"
            ))),
        }
    }
}

/// One tile catalog entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TileEntry {
    /// Descriptor name handed to the presentation layer.
    pub name: String,
    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl TileEntry {
    /// Creates a new catalog entry.
    #[must_use]
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

fn default_weight() -> f64 {
    1.0
}

/// One prefab catalog entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PrefabEntry {
    /// Descriptor name handed to the presentation layer.
    pub name: String,
    /// Relative selection weight.
    #[serde(default = "default_weight")]
    pub probability: f64,
    /// Footprint along X.
    #[serde(default = "default_footprint")]
    pub width: usize,
    /// Footprint along Y.
    #[serde(default = "default_footprint")]
    pub height: usize,
    /// Footprint along Z.
    #[serde(default = "default_footprint")]
    pub depth: usize,
}

impl PrefabEntry {
    /// Creates an entry with a unit footprint.
    #[must_use]
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            width: 1,
            height: 1,
            depth: 1,
        }
    }

    /// The prefab's footprint.
    #[must_use]
    pub const fn footprint(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, self.depth)
    }
}

fn default_footprint() -> usize {
    1
}

/// Noise terrain layer toggles and parameters.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Redraw the noise origin on every pass.
    pub randomize_origin: bool,
    /// Starting origin, used until a pass randomizes it.
    pub origin: [f64; 3],
    /// Carve everything above a noise height map.
    pub height_layer: bool,
    /// Height map sharpness; lower values give broader mountains.
    pub spikiness: f64,
    /// Cover cells above `snow_line` with snow.
    pub snow_layer: bool,
    /// Y above which cells become snow.
    pub snow_line: f64,
    /// Pick tiles through coherent biome noise.
    pub biome_layer: bool,
    /// Biome size; bigger values give bigger biomes.
    pub biome_scale: f64,
    /// Blend a vertical noise channel into the biome pick.
    pub vertical_biomes: bool,
}

impl TerrainConfig {
    /// Largest spikiness the source ranges recommend.
    pub const RECOMMENDED_MAX_SPIKINESS: f64 = 10.0;
    /// Largest biome scale the source ranges recommend.
    pub const RECOMMENDED_MAX_BIOME_SCALE: f64 = 15.0;
    /// Highest snow line the source ranges recommend.
    pub const RECOMMENDED_MAX_SNOW_LINE: f64 = 25.0;

    /// The configured starting origin.
    #[must_use]
    pub const fn origin(&self) -> NoiseOrigin {
        NoiseOrigin::new(self.origin[0], self.origin[1], self.origin[2])
    }

    /// Checks parameters of enabled layers.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] for a non-positive or
    /// non-finite parameter of an enabled layer.
    pub fn validate(&self) -> GenerationResult<()> {
        if self.height_layer && !(self.spikiness.is_finite() && self.spikiness > 0.0) {
            return Err(GenerationError::InvalidConfig(format!(
                "spikiness must be positive, got {}",
                self.spikiness
            )));
        }
        if self.biome_layer && !(self.biome_scale.is_finite() && self.biome_scale > 0.0) {
            return Err(GenerationError::InvalidConfig(format!(
                "biome scale must be positive, got {}",
                self.biome_scale
            )));
        }
        if self.snow_layer && !self.snow_line.is_finite() {
            return Err(GenerationError::InvalidConfig(format!(
                "snow line must be finite, got {}",
                self.snow_line
            )));
        }
        if self.origin.iter().any(|axis| !axis.is_finite()) {
            return Err(GenerationError::InvalidConfig(format!(
                "noise origin must be finite, got {:?}",
                self.origin
            )));
        }

        if self.height_layer && self.spikiness > Self::RECOMMENDED_MAX_SPIKINESS {
            tracing::warn!(spikiness = self.spikiness, "spikiness above recommended range");
        }
        if self.biome_layer && self.biome_scale > Self::RECOMMENDED_MAX_BIOME_SCALE {
            tracing::warn!(biome_scale = self.biome_scale, "biome scale above recommended range");
        }
        if self.snow_layer && self.snow_line > Self::RECOMMENDED_MAX_SNOW_LINE {
            tracing::warn!(snow_line = self.snow_line, "snow line above recommended range");
        }
        Ok(())
    }
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            randomize_origin: true,
            origin: [0.0; 3],
            height_layer: true,
            spikiness: 1.0,
            snow_layer: false,
            snow_line: 8.0,
            biome_layer: true,
            biome_scale: 1.0,
            vertical_biomes: false,
        }
    }
}

/// Which preview sample buffers to record during noise terrain passes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Column heights.
    pub height: bool,
    /// Surface biome channel.
    pub biome: bool,
    /// Vertical biome channel.
    pub vertical_biome: bool,
}

impl PreviewConfig {
    /// Returns true if any buffer is requested.
    #[must_use]
    pub const fn any(self) -> bool {
        self.height || self.biome || self.vertical_biome
    }
}

/// How placement events are released.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Spread emission over `reveal_seconds` instead of emitting at once.
    pub paced: bool,
    /// Target duration of a paced reveal.
    pub reveal_seconds: f64,
    /// Tick rate of the presentation host.
    pub frames_per_second: f64,
}

impl RevealConfig {
    /// The scheduler mode this section selects.
    #[must_use]
    pub const fn emission_mode(&self) -> EmissionMode {
        if self.paced {
            EmissionMode::Paced {
                reveal_seconds: self.reveal_seconds,
                frames_per_second: self.frames_per_second,
            }
        } else {
            EmissionMode::Immediate
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            paced: false,
            reveal_seconds: 1.0,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
        }
    }
}

/// Complete description of a world to generate.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seed for the random source and noise table; `None` lets the host pick.
    pub seed: Option<u64>,
    /// Active strategy.
    pub strategy: StrategyKind,
    /// Grid extents.
    pub dimensions: Dimensions,
    /// Tile catalog.
    pub tiles: Vec<TileEntry>,
    /// Prefab catalog for the clustered strategy.
    pub prefabs: Vec<PrefabEntry>,
    /// Descriptor name placed for snow cells.
    pub snow_tile: String,
    /// Noise terrain layers.
    pub terrain: TerrainConfig,
    /// Preview sample buffers.
    pub preview: PreviewConfig,
    /// Emission pacing.
    pub reveal: RevealConfig,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            strategy: StrategyKind::default(),
            dimensions: Dimensions::default(),
            tiles: vec![
                TileEntry::new("grass", 4.0),
                TileEntry::new("dirt", 2.0),
                TileEntry::new("stone", 2.0),
                TileEntry::new("sand", 1.0),
            ],
            prefabs: vec![
                PrefabEntry::new("hut", 3.0),
                PrefabEntry::new("tower", 1.0),
            ],
            snow_tile: "snow".to_string(),
            terrain: TerrainConfig::default(),
            preview: PreviewConfig::default(),
            reveal: RevealConfig::default(),
        }
    }
}

impl WorldConfig {
    /// Parses a TOML world description.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the text is not valid TOML
    /// or does not match the schema.
    pub fn from_toml_str(text: &str) -> GenerationResult<Self> {
        toml::from_str(text).map_err(|e| GenerationError::InvalidConfig(e.to_string()))
    }

    /// Reads and parses a TOML world description from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidConfig`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> GenerationResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::InvalidConfig(format!("{}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Tile weights in catalog order.
    pub fn tile_weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.tiles.iter().map(|t| t.weight)
    }

    /// Prefab probabilities in catalog order.
    pub fn prefab_weights(&self) -> impl Iterator<Item = f64> + '_ {
        self.prefabs.iter().map(|p| p.probability)
    }

    /// Runs every check that does not need a random draw.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::InvalidDimensions`] for a zero extent
    /// - [`GenerationError::EmptyCatalog`] if the active strategy has no entries
    /// - [`GenerationError::InvalidConfig`] for a negative or non-finite tile or prefab weight
    /// - [`GenerationError::InvalidWeights`] if the active table's total is not positive
    /// - [`GenerationError::InvalidPacingRate`] for a paced reveal with a non-positive rate
    /// - [`GenerationError::InvalidConfig`] for out-of-domain terrain parameters
    pub fn validate(&self) -> GenerationResult<()> {
        self.dimensions.validate()?;
        if self.dimensions.exceeds_recommended() {
            tracing::warn!(
                width = self.dimensions.width,
                height = self.dimensions.height,
                depth = self.dimensions.depth,
                "dimensions above recommended range"
            );
        }

        match self.strategy {
            StrategyKind::RandomFill => {
                require_catalog(self.tiles.len(), self.strategy)?;
                require_weights("tile", self.tiles.iter().map(|t| (t.name.as_str(), t.weight)))?;
                WeightTable::new(self.tile_weights())?.ensure_drawable()?;
            }
            StrategyKind::ClusteredPrefab => {
                require_catalog(self.prefabs.len(), self.strategy)?;
                require_weights(
                    "prefab",
                    self.prefabs.iter().map(|p| (p.name.as_str(), p.probability)),
                )?;
                WeightTable::new(self.prefab_weights())?.ensure_drawable()?;
            }
            StrategyKind::NoiseTerrain => {
                require_catalog(self.tiles.len(), self.strategy)?;
                require_weights("tile", self.tiles.iter().map(|t| (t.name.as_str(), t.weight)))?;
                let table = WeightTable::new(self.tile_weights())?;
                if self.terrain.biome_layer {
                    table.ensure_drawable()?;
                }
                self.terrain.validate()?;
            }
        }

        if let EmissionMode::Paced {
            reveal_seconds,
            frames_per_second,
        } = self.reveal.emission_mode()
        {
            pacing_rate(self.dimensions, reveal_seconds, frames_per_second)?;
        }
        Ok(())
    }
}

fn require_catalog(len: usize, strategy: StrategyKind) -> GenerationResult<()> {
    if len == 0 {
        return Err(GenerationError::EmptyCatalog {
            strategy: strategy.name(),
        });
    }
    Ok(())
}

fn require_weights<'a>(
    kind: &str,
    entries: impl IntoIterator<Item = (&'a str, f64)>,
) -> GenerationResult<()> {
    for (name, weight) in entries {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GenerationError::InvalidConfig(format!(
                "{kind} {name:?} has weight {weight}; weights must be finite and non-negative"
            )));
        }
    }
    Ok(())
}

//! # Terrain Classification
//!
//! Turns a grid coordinate into a tile classification through a fixed
//! pipeline of optional layers:
//!
//! 1. **Height**: cells above the noise height map become empty
//! 2. **Snow**: cells above the snow line become snow
//! 3. **Biome**: coherent noise picks a catalog entry through the weight table
//!
//! Each enabled layer may short-circuit the ones after it, so carving
//! overrides snow and snow overrides biome. When nothing fires the cell
//! gets catalog entry 0.
//!
//! ## Sample Coordinates
//!
//! Grid coordinates are normalized by the grid extent, shifted by the
//! [`NoiseOrigin`], divided by the layer scale and stretched so that 25
//! cells of extent span one noise unit at scale 1.

use crate::config::TerrainConfig;
use crate::error::GenerationResult;
use crate::grid::{Classification, Dimensions, GridCoord};
use crate::noise::{NoiseOrigin, NoiseSource};
use crate::preview::PreviewBuffers;
use crate::weights::WeightTable;

/// Grid extent that maps to one noise unit at scale 1.
const CELLS_PER_NOISE_UNIT: f64 = 25.0;

/// Height map parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightLayer {
    /// Higher values sample the noise faster, giving steeper terrain.
    pub spikiness: f64,
}

/// Snow cover parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowLayer {
    /// Cells with `y > snow_line` become snow.
    pub snow_line: f64,
}

/// Biome selection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeLayer {
    /// Higher values give bigger biomes.
    pub scale: f64,
    /// Blend the vertical channel 50/50 with the surface channel.
    pub vertical: bool,
}

/// Which layers run, with their parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainLayers {
    /// Height carving.
    pub height: Option<HeightLayer>,
    /// Snow override.
    pub snow: Option<SnowLayer>,
    /// Biome selection.
    pub biome: Option<BiomeLayer>,
}

impl From<&TerrainConfig> for TerrainLayers {
    fn from(config: &TerrainConfig) -> Self {
        Self {
            height: config.height_layer.then_some(HeightLayer {
                spikiness: config.spikiness,
            }),
            snow: config.snow_layer.then_some(SnowLayer {
                snow_line: config.snow_line,
            }),
            biome: config.biome_layer.then_some(BiomeLayer {
                scale: config.biome_scale,
                vertical: config.vertical_biomes,
            }),
        }
    }
}

/// Raw biome channel samples for one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeSample {
    /// Surface channel, sampled at `(x, z)`.
    pub surface: f64,
    /// Vertical channel, sampled at `(x, y)`; present in vertical mode.
    pub vertical: Option<f64>,
}

impl BiomeSample {
    /// The value fed into selection: the surface channel, or the 50/50
    /// blend with the vertical channel.
    #[inline]
    #[must_use]
    pub fn combined(self) -> f64 {
        match self.vertical {
            Some(vertical) => (self.surface + vertical) * 0.5,
            None => self.surface,
        }
    }
}

/// Per-cell classifier for one generation pass.
pub struct TerrainClassifier<N> {
    noise: N,
    dims: Dimensions,
    origin: NoiseOrigin,
    layers: TerrainLayers,
    biome_table: WeightTable,
}

impl<N: NoiseSource> TerrainClassifier<N> {
    /// Creates a classifier.
    ///
    /// # Errors
    ///
    /// - [`InvalidDimensions`](crate::GenerationError::InvalidDimensions) for a zero extent
    /// - [`InvalidWeights`](crate::GenerationError::InvalidWeights) if the biome
    ///   layer is enabled and `biome_table` cannot be drawn from
    pub fn new(
        noise: N,
        dims: Dimensions,
        origin: NoiseOrigin,
        layers: TerrainLayers,
        biome_table: WeightTable,
    ) -> GenerationResult<Self> {
        dims.validate()?;
        if layers.biome.is_some() {
            biome_table.ensure_drawable()?;
        }

        Ok(Self {
            noise,
            dims,
            origin,
            layers,
            biome_table,
        })
    }

    /// Active layers.
    #[must_use]
    pub const fn layers(&self) -> &TerrainLayers {
        &self.layers
    }

    /// Noise origin in use.
    #[must_use]
    pub const fn origin(&self) -> NoiseOrigin {
        self.origin
    }

    /// Column height at `(x, z)`, in cells, or `None` without a height layer.
    #[must_use]
    pub fn column_height(&self, x: usize, z: usize) -> Option<f64> {
        let layer = self.layers.height?;
        let (dims, scale) = (self.dims, 1.0 / layer.spikiness);
        let hx = self.stretch(self.origin.x, x, dims.width, scale, dims.width);
        let hz = self.stretch(self.origin.z, z, dims.depth, scale, dims.depth);
        Some(self.noise.sample(hx, hz) * dims.height as f64)
    }

    /// Biome channel samples at `coord`, or `None` without a biome layer.
    #[must_use]
    pub fn biome_sample(&self, coord: GridCoord) -> Option<BiomeSample> {
        let layer = self.layers.biome?;
        let dims = self.dims;
        let bx = self.stretch(self.origin.x, coord.x, dims.width, layer.scale, dims.width);
        let bz = self.stretch(self.origin.z, coord.z, dims.depth, layer.scale, dims.depth);

        let vertical = layer.vertical.then(|| {
            // The vertical axis is stretched by width so biome bands keep
            // the same aspect as the surface channel.
            let by = self.stretch(self.origin.y, coord.y, dims.height, layer.scale, dims.width);
            self.noise.sample(bx, by)
        });

        Some(BiomeSample {
            surface: self.noise.sample(bx, bz),
            vertical,
        })
    }

    /// Classifies `coord`.
    #[must_use]
    pub fn classify(&self, coord: GridCoord) -> Classification {
        self.classify_inner(coord, None)
    }

    /// Classifies `coord`, recording preview samples as layers are evaluated.
    pub fn classify_recording(
        &self,
        coord: GridCoord,
        previews: &mut PreviewBuffers,
    ) -> Classification {
        self.classify_inner(coord, Some(previews))
    }

    fn classify_inner(
        &self,
        coord: GridCoord,
        mut previews: Option<&mut PreviewBuffers>,
    ) -> Classification {
        if let Some(height) = self.column_height(coord.x, coord.z) {
            if let Some(buffer) = previews.as_mut().and_then(|p| p.height.as_mut()) {
                buffer.set(coord.x, coord.z, height / self.dims.height as f64);
            }
            if height < coord.y as f64 {
                return Classification::EMPTY;
            }
        }

        if let Some(snow) = self.layers.snow {
            if coord.y as f64 > snow.snow_line {
                return Classification::SNOW;
            }
        }

        if let Some(sample) = self.biome_sample(coord) {
            if let Some(previews) = previews {
                let entries = self.biome_table.len() as f64;
                if let Some(buffer) = previews.biome.as_mut() {
                    buffer.set(coord.x, coord.z, sample.surface / entries);
                }
                if let (Some(buffer), Some(vertical)) =
                    (previews.vertical_biome.as_mut(), sample.vertical)
                {
                    buffer.set(coord.x, coord.z, vertical / entries);
                }
            }

            let r = sample.combined() * self.biome_table.total();
            // combined() stays in [0, 1], so r never passes the last cumulative value.
            return self
                .biome_table
                .index_for(r)
                .map_or(Classification::DEFAULT_TILE, Classification::tile);
        }

        Classification::DEFAULT_TILE
    }

    /// Normalized, shifted and scaled sample coordinate along one axis.
    #[inline]
    fn stretch(&self, offset: f64, cell: usize, extent: usize, scale: f64, span: usize) -> f64 {
        (offset + cell as f64 / extent as f64) / scale * span as f64 / CELLS_PER_NOISE_UNIT
    }
}

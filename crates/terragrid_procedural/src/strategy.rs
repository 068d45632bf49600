//! # Generation Strategies
//!
//! Three interchangeable ways to fill a world:
//!
//! | Strategy | Output | Cells visited |
//! |----------|--------|---------------|
//! | [`RandomFill`] | dense [`WorldGrid`] | every cell |
//! | [`ClusteredPrefab`] | prefab placement events | stride lattice only |
//! | [`NoiseTerrain`] | dense [`WorldGrid`] + previews | every cell |
//!
//! Constructors validate everything up front. Once a strategy exists, a
//! pass over valid dimensions cannot fail halfway.

use crate::config::{PrefabEntry, PreviewConfig, StrategyKind, TerrainConfig};
use crate::error::{GenerationError, GenerationResult};
use crate::grid::{Classification, Dimensions, GridCoord, WorldGrid};
use crate::noise::{NoiseOrigin, NoiseSource};
use crate::preview::PreviewBuffers;
use crate::random::RandomSource;
use crate::scheduler::{PlacementEvent, PlacementSink, TileDescriptor};
use crate::terrain::{TerrainClassifier, TerrainLayers};
use crate::weights::{WeightEntry, WeightTable, WeightedSelector};

/// Prefab lattice stride along X.
pub const PREFAB_STRIDE_X: usize = 10;
/// Prefab lattice stride along Y.
pub const PREFAB_STRIDE_Y: usize = 5;
/// Prefab lattice stride along Z.
pub const PREFAB_STRIDE_Z: usize = 10;

fn catalog_table<I>(weights: I, strategy: StrategyKind) -> GenerationResult<WeightTable>
where
    I: IntoIterator<Item = f64>,
{
    let table = WeightTable::new(weights)?;
    if table.is_empty() {
        return Err(GenerationError::EmptyCatalog {
            strategy: strategy.name(),
        });
    }
    Ok(table)
}

/// Independent weighted draw for every cell.
#[derive(Clone, Debug)]
pub struct RandomFill {
    table: WeightTable,
}

impl RandomFill {
    /// Builds the strategy from per-tile weights in catalog order.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyCatalog`] if `weights` is empty
    /// - [`GenerationError::InvalidWeights`] if no draw is possible
    pub fn new<I>(weights: I) -> GenerationResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let table = catalog_table(weights, StrategyKind::RandomFill)?;
        table.ensure_drawable()?;
        Ok(Self { table })
    }

    /// The tile weight table.
    #[must_use]
    pub const fn table(&self) -> &WeightTable {
        &self.table
    }

    /// Fills a grid of `dims`, one draw per cell in placement order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDimensions`] for a zero extent.
    pub fn fill(
        &self,
        dims: Dimensions,
        rng: &mut dyn RandomSource,
    ) -> GenerationResult<WorldGrid> {
        dims.validate()?;
        WorldGrid::try_from_fn(dims, |_| self.table.draw(&mut *rng).map(Classification::tile))
    }
}

/// One weighted prefab per coarse lattice point.
#[derive(Clone, Debug)]
pub struct ClusteredPrefab {
    selector: WeightedSelector<Dimensions>,
}

impl ClusteredPrefab {
    /// Builds the strategy from the prefab catalog.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyCatalog`] if `prefabs` is empty
    /// - [`GenerationError::InvalidWeights`] if no draw is possible
    pub fn new(prefabs: &[PrefabEntry]) -> GenerationResult<Self> {
        if prefabs.is_empty() {
            return Err(GenerationError::EmptyCatalog {
                strategy: StrategyKind::ClusteredPrefab.name(),
            });
        }
        let selector = WeightedSelector::new(
            prefabs
                .iter()
                .map(|p| WeightEntry::new(p.footprint(), p.probability)),
        )?;
        selector.table().ensure_drawable()?;

        Ok(Self { selector })
    }

    /// Lattice points inside `dims`, in placement order.
    pub fn lattice(dims: Dimensions) -> impl Iterator<Item = GridCoord> {
        (0..dims.width).step_by(PREFAB_STRIDE_X).flat_map(move |x| {
            (0..dims.height).step_by(PREFAB_STRIDE_Y).flat_map(move |y| {
                (0..dims.depth)
                    .step_by(PREFAB_STRIDE_Z)
                    .map(move |z| GridCoord::new(x, y, z))
            })
        })
    }

    /// Draws a prefab for every lattice point and hands each placement to `sink`.
    ///
    /// Returns the number of placements.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDimensions`] for a zero extent.
    pub fn place(
        &self,
        dims: Dimensions,
        rng: &mut dyn RandomSource,
        sink: &mut dyn PlacementSink,
    ) -> GenerationResult<usize> {
        dims.validate()?;

        let mut placed = 0;
        for coord in Self::lattice(dims) {
            let (index, &footprint) = self.selector.choose(&mut *rng)?;
            sink.place(PlacementEvent::new(
                coord,
                TileDescriptor::Prefab { index, footprint },
            ));
            placed += 1;
        }
        Ok(placed)
    }
}

/// Result of one noise terrain pass.
#[derive(Clone, Debug)]
pub struct TerrainOutcome {
    /// The classified grid.
    pub grid: WorldGrid,
    /// Preview samples recorded during classification.
    pub previews: PreviewBuffers,
    /// Origin the pass sampled with.
    pub origin: NoiseOrigin,
}

/// Layered noise classification of every cell.
#[derive(Clone, Debug)]
pub struct NoiseTerrain {
    layers: TerrainLayers,
    biome_table: WeightTable,
    preview: PreviewConfig,
    randomize_origin: bool,
}

impl NoiseTerrain {
    /// Builds the strategy.
    ///
    /// `biome_weights` are the tile weights in catalog order.
    ///
    /// # Errors
    ///
    /// - [`GenerationError::EmptyCatalog`] if `biome_weights` is empty
    /// - [`GenerationError::InvalidWeights`] if the biome layer is on and no draw is possible
    /// - [`GenerationError::InvalidConfig`] for out-of-domain layer parameters
    pub fn new<I>(
        terrain: &TerrainConfig,
        biome_weights: I,
        preview: PreviewConfig,
    ) -> GenerationResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        terrain.validate()?;
        let biome_table = catalog_table(biome_weights, StrategyKind::NoiseTerrain)?;
        let layers = TerrainLayers::from(terrain);
        if layers.biome.is_some() {
            biome_table.ensure_drawable()?;
        }

        Ok(Self {
            layers,
            biome_table,
            preview,
            randomize_origin: terrain.randomize_origin,
        })
    }

    /// Active layers.
    #[must_use]
    pub const fn layers(&self) -> &TerrainLayers {
        &self.layers
    }

    /// Classifies every cell of `dims`.
    ///
    /// With origin randomization on, a fresh origin is drawn from `rng`;
    /// otherwise `origin` is reused as is.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidDimensions`] for a zero extent.
    pub fn generate<N: NoiseSource>(
        &self,
        noise: &N,
        dims: Dimensions,
        origin: NoiseOrigin,
        rng: &mut dyn RandomSource,
    ) -> GenerationResult<TerrainOutcome> {
        dims.validate()?;

        let origin = if self.randomize_origin {
            NoiseOrigin::randomized(rng)
        } else {
            origin
        };
        let classifier =
            TerrainClassifier::new(noise, dims, origin, self.layers, self.biome_table.clone())?;

        let mut previews = PreviewBuffers::new(dims, self.preview);
        let grid = if previews.is_empty() {
            WorldGrid::from_fn(dims, |coord| classifier.classify(coord))
        } else {
            WorldGrid::from_fn(dims, |coord| classifier.classify_recording(coord, &mut previews))
        };

        tracing::debug!(
            empty = grid.count(Classification::EMPTY),
            snow = grid.count(Classification::SNOW),
            origin_x = origin.x,
            origin_y = origin.y,
            origin_z = origin.z,
            "terrain classified"
        );

        Ok(TerrainOutcome {
            grid,
            previews,
            origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::{NoiseSeed, PerlinNoise};
    use crate::random::ChaChaSource;

    struct Flat(f64);

    impl NoiseSource for Flat {
        fn sample(&self, _x: f64, _y: f64) -> f64 {
            self.0
        }
    }

    /// Returns the same draw every time.
    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn range(&mut self, low: f64, high: f64) -> f64 {
            low + (high - low) * self.0
        }
    }

    #[test]
    fn test_random_fill_never_picks_zero_weight() {
        let strategy = RandomFill::new([1.0, 0.0]).expect("valid weights");
        let dims = Dimensions::new(2, 2, 1);

        for seed in 0..50 {
            let grid = strategy
                .fill(dims, &mut ChaChaSource::from_seed(seed))
                .expect("valid dims");
            assert_eq!(grid.count(Classification::tile(0)), dims.cell_count());
        }
    }

    #[test]
    fn test_random_fill_is_seed_deterministic() {
        let strategy = RandomFill::new([3.0, 1.0, 2.0]).expect("valid weights");
        let dims = Dimensions::new(6, 4, 6);

        let a = strategy.fill(dims, &mut ChaChaSource::from_seed(9)).expect("valid");
        let b = strategy.fill(dims, &mut ChaChaSource::from_seed(9)).expect("valid");
        let c = strategy.fill(dims, &mut ChaChaSource::from_seed(10)).expect("valid");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_fill_refusals() {
        assert_eq!(
            RandomFill::new(Vec::new()).unwrap_err(),
            GenerationError::EmptyCatalog {
                strategy: "random_fill"
            }
        );
        assert!(matches!(
            RandomFill::new([0.0, 0.0]),
            Err(GenerationError::InvalidWeights { .. })
        ));

        let strategy = RandomFill::new([1.0]).expect("valid weights");
        assert!(matches!(
            strategy.fill(Dimensions::new(0, 1, 1), &mut Fixed(0.5)),
            Err(GenerationError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_prefab_lattice_strides() {
        let lattice: Vec<GridCoord> =
            ClusteredPrefab::lattice(Dimensions::new(25, 10, 21)).collect();

        assert_eq!(lattice.len(), 3 * 2 * 3);
        assert_eq!(lattice[0], GridCoord::new(0, 0, 0));
        assert_eq!(lattice[1], GridCoord::new(0, 0, 10));
        assert_eq!(lattice[3], GridCoord::new(0, 5, 0));
        assert_eq!(lattice[17], GridCoord::new(20, 5, 20));

        // Anything smaller than a stride still gets the origin point.
        assert_eq!(ClusteredPrefab::lattice(Dimensions::new(1, 1, 1)).count(), 1);
    }

    #[test]
    fn test_prefab_placements_carry_footprint() {
        let mut tower = PrefabEntry::new("tower", 1.0);
        tower.height = 4;
        let strategy =
            ClusteredPrefab::new(&[PrefabEntry::new("hut", 0.0), tower]).expect("valid catalog");

        let mut events: Vec<PlacementEvent> = Vec::new();
        let placed = strategy
            .place(Dimensions::new(20, 5, 20), &mut ChaChaSource::from_seed(1), &mut events)
            .expect("valid dims");

        assert_eq!(placed, 4);
        assert_eq!(events.len(), 4);
        for event in &events {
            assert_eq!(
                event.descriptor,
                TileDescriptor::Prefab {
                    index: 1,
                    footprint: Dimensions::new(1, 4, 1)
                }
            );
        }
        assert!(events.windows(2).all(|w| w[0].coord < w[1].coord));
    }

    #[test]
    fn test_prefab_empty_catalog() {
        assert!(matches!(
            ClusteredPrefab::new(&[]),
            Err(GenerationError::EmptyCatalog { .. })
        ));
    }

    #[test]
    fn test_noise_terrain_flat_biome() {
        let terrain = TerrainConfig {
            randomize_origin: false,
            height_layer: false,
            ..TerrainConfig::default()
        };
        let strategy =
            NoiseTerrain::new(&terrain, [1.0, 1.0], PreviewConfig::default()).expect("valid");
        let dims = Dimensions::new(5, 3, 5);

        let outcome = strategy
            .generate(&Flat(0.5), dims, NoiseOrigin::default(), &mut Fixed(0.0))
            .expect("valid dims");

        assert_eq!(outcome.grid.count(Classification::tile(0)), dims.cell_count());
        assert!(outcome.previews.is_empty());
    }

    #[test]
    fn test_noise_terrain_origin_handling() {
        let noise = PerlinNoise::new(NoiseSeed::new(5));
        let dims = Dimensions::new(8, 6, 8);
        let kept = NoiseOrigin::new(0.25, 0.5, 0.75);

        let fixed = NoiseTerrain::new(
            &TerrainConfig {
                randomize_origin: false,
                ..TerrainConfig::default()
            },
            [1.0, 1.0],
            PreviewConfig::default(),
        )
        .expect("valid");
        let outcome = fixed
            .generate(&noise, dims, kept, &mut Fixed(0.9))
            .expect("valid dims");
        assert_eq!(outcome.origin, kept);

        let randomized =
            NoiseTerrain::new(&TerrainConfig::default(), [1.0, 1.0], PreviewConfig::default())
                .expect("valid");
        let outcome = randomized
            .generate(&noise, dims, kept, &mut Fixed(0.5))
            .expect("valid dims");
        assert_eq!(outcome.origin, NoiseOrigin::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_noise_terrain_records_previews() {
        let preview = PreviewConfig {
            height: true,
            biome: true,
            vertical_biome: false,
        };
        let strategy =
            NoiseTerrain::new(&TerrainConfig::default(), [1.0, 2.0, 1.0], preview).expect("valid");
        let dims = Dimensions::new(6, 4, 7);

        let outcome = strategy
            .generate(&PerlinNoise::default(), dims, NoiseOrigin::default(), &mut Fixed(0.3))
            .expect("valid dims");

        let kinds: Vec<_> = outcome.previews.iter().map(|(kind, _)| kind).collect();
        assert_eq!(kinds.len(), 2);
        let height = outcome.previews.height.as_ref().expect("allocated");
        assert_eq!((height.width(), height.depth()), (6, 7));
        assert!(height.samples().iter().all(|s| (0.0..=1.0).contains(s)));
    }

    #[test]
    fn test_noise_terrain_refusals() {
        assert!(matches!(
            NoiseTerrain::new(&TerrainConfig::default(), Vec::new(), PreviewConfig::default()),
            Err(GenerationError::EmptyCatalog { .. })
        ));
        assert!(matches!(
            NoiseTerrain::new(&TerrainConfig::default(), [0.0], PreviewConfig::default()),
            Err(GenerationError::InvalidWeights { .. })
        ));

        let carve_only = TerrainConfig {
            biome_layer: false,
            ..TerrainConfig::default()
        };
        assert!(NoiseTerrain::new(&carve_only, [0.0], PreviewConfig::default()).is_ok());
    }
}

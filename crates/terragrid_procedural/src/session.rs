//! # Generation Sessions
//!
//! [`Generator`] is the caller-owned entry point. Each successful
//! [`Generator::regenerate`] builds a complete [`GenerationSession`] and only
//! then swaps it in, so a refused request leaves the previous world intact.
//!
//! A [`PopulationScheduler`] borrows the session it reveals. Starting a new
//! pass therefore requires dropping any in-flight scheduler first, which is
//! exactly the abandonment semantics a paced reveal needs.

use crate::config::{StrategyKind, WorldConfig};
use crate::error::GenerationResult;
use crate::grid::{Dimensions, WorldGrid};
use crate::noise::{NoiseOrigin, NoiseSeed, NoiseSource, PerlinNoise};
use crate::preview::PreviewBuffers;
use crate::random::RandomSource;
use crate::scheduler::{EmissionMode, PlacementEvent, PlacementSink, PopulationScheduler};
use crate::strategy::{ClusteredPrefab, NoiseTerrain, RandomFill};

/// Sub-seed purpose for the terrain noise table.
const NOISE_SEED_PURPOSE: u64 = 0x7E44_A1D0;

/// What a pass produced.
#[derive(Clone, Debug)]
pub enum SessionOutput {
    /// Dense grid from [`RandomFill`] or [`NoiseTerrain`].
    Grid {
        /// Every cell classified.
        grid: WorldGrid,
        /// Preview samples; empty unless noise terrain recorded some.
        previews: PreviewBuffers,
    },
    /// Lattice placements from [`ClusteredPrefab`].
    Placements(Vec<PlacementEvent>),
}

/// Everything one generation pass produced.
#[derive(Clone, Debug)]
pub struct GenerationSession {
    generation: u64,
    strategy: StrategyKind,
    dims: Dimensions,
    mode: EmissionMode,
    origin: NoiseOrigin,
    output: SessionOutput,
}

impl GenerationSession {
    /// 1-based pass counter of the owning generator.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Strategy that filled this session.
    #[must_use]
    pub const fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    /// Grid extents.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Emission mode for the reveal.
    #[must_use]
    pub const fn mode(&self) -> EmissionMode {
        self.mode
    }

    /// Noise origin in effect for this pass.
    #[must_use]
    pub const fn origin(&self) -> NoiseOrigin {
        self.origin
    }

    /// Raw output.
    #[must_use]
    pub const fn output(&self) -> &SessionOutput {
        &self.output
    }

    /// The dense grid, if the strategy produced one.
    #[must_use]
    pub const fn grid(&self) -> Option<&WorldGrid> {
        match &self.output {
            SessionOutput::Grid { grid, .. } => Some(grid),
            SessionOutput::Placements(_) => None,
        }
    }

    /// Preview samples, if the strategy produced a grid.
    #[must_use]
    pub const fn previews(&self) -> Option<&PreviewBuffers> {
        match &self.output {
            SessionOutput::Grid { previews, .. } => Some(previews),
            SessionOutput::Placements(_) => None,
        }
    }

    /// Direct placements; empty for dense strategies.
    #[must_use]
    pub fn placements(&self) -> &[PlacementEvent] {
        match &self.output {
            SessionOutput::Placements(events) => events,
            SessionOutput::Grid { .. } => &[],
        }
    }

    /// A scheduler revealing the dense grid, or `None` for prefab sessions.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::InvalidPacingRate`](crate::GenerationError::InvalidPacingRate)
    /// for a paced mode with a non-positive rate.
    pub fn scheduler(&self) -> GenerationResult<Option<PopulationScheduler<'_>>> {
        self.grid()
            .map(|grid| PopulationScheduler::new(grid, self.mode))
            .transpose()
    }

    /// Emits every placement into `sink` without pacing.
    pub fn emit_all(&self, sink: &mut dyn PlacementSink) -> usize {
        match &self.output {
            SessionOutput::Grid { grid, .. } => {
                let mut scheduler = PopulationScheduler::immediate(grid);
                scheduler.run(sink);
                scheduler.emitted()
            }
            SessionOutput::Placements(events) => {
                for &event in events {
                    sink.place(event);
                }
                events.len()
            }
        }
    }
}

/// Owns the configuration and the current session.
pub struct Generator<N = PerlinNoise> {
    config: WorldConfig,
    noise: N,
    origin: NoiseOrigin,
    generation: u64,
    session: Option<GenerationSession>,
}

impl Generator<PerlinNoise> {
    /// Creates a generator with Perlin noise seeded from `config.seed`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `config`.
    pub fn new(config: WorldConfig) -> GenerationResult<Self> {
        let seed = config.seed.map_or_else(NoiseSeed::default, |seed| {
            NoiseSeed::new(seed).derive(NOISE_SEED_PURPOSE)
        });
        Self::with_noise(config, PerlinNoise::new(seed))
    }
}

impl<N: NoiseSource> Generator<N> {
    /// Creates a generator sampling `noise`.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `config`.
    pub fn with_noise(config: WorldConfig, noise: N) -> GenerationResult<Self> {
        config.validate()?;
        let origin = config.terrain.origin();

        Ok(Self {
            config,
            noise,
            origin,
            generation: 0,
            session: None,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Replaces the configuration for later passes.
    ///
    /// The current session and the persisted noise origin are kept.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure of `config`; the previous
    /// configuration stays active.
    pub fn set_config(&mut self, config: WorldConfig) -> GenerationResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Origin the next non-randomized pass will sample with.
    #[must_use]
    pub const fn origin(&self) -> NoiseOrigin {
        self.origin
    }

    /// Number of successful passes.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The current session.
    #[must_use]
    pub const fn session(&self) -> Option<&GenerationSession> {
        self.session.as_ref()
    }

    /// Drops the current session, returning it.
    pub fn clear(&mut self) -> Option<GenerationSession> {
        self.session.take()
    }

    /// Runs a full generation pass and makes it the current session.
    ///
    /// # Errors
    ///
    /// Returns the strategy's refusal. The previous session, origin and
    /// generation counter are untouched on error.
    pub fn regenerate(
        &mut self,
        rng: &mut dyn RandomSource,
    ) -> GenerationResult<&GenerationSession> {
        let config = &self.config;
        let dims = config.dimensions;

        let (output, origin) = match config.strategy {
            StrategyKind::RandomFill => {
                let grid = RandomFill::new(config.tile_weights())?.fill(dims, rng)?;
                let output = SessionOutput::Grid {
                    grid,
                    previews: PreviewBuffers::default(),
                };
                (output, self.origin)
            }
            StrategyKind::ClusteredPrefab => {
                let mut events: Vec<PlacementEvent> = Vec::new();
                ClusteredPrefab::new(&config.prefabs)?.place(dims, rng, &mut events)?;
                (SessionOutput::Placements(events), self.origin)
            }
            StrategyKind::NoiseTerrain => {
                let strategy =
                    NoiseTerrain::new(&config.terrain, config.tile_weights(), config.preview)?;
                let outcome = strategy.generate(&self.noise, dims, self.origin, rng)?;
                let output = SessionOutput::Grid {
                    grid: outcome.grid,
                    previews: outcome.previews,
                };
                (output, outcome.origin)
            }
        };

        let session = GenerationSession {
            generation: self.generation + 1,
            strategy: config.strategy,
            dims,
            mode: config.reveal.emission_mode(),
            origin,
            output,
        };
        tracing::info!(
            generation = session.generation,
            strategy = %session.strategy,
            width = dims.width,
            height = dims.height,
            depth = dims.depth,
            seed = ?config.seed,
            "world generated"
        );

        self.origin = origin;
        self.generation = session.generation;
        Ok(self.session.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrefabEntry, TileEntry};
    use crate::grid::Classification;
    use crate::random::ChaChaSource;
    use crate::scheduler::TileDescriptor;
    use crate::GenerationError;

    fn small(strategy: StrategyKind) -> WorldConfig {
        WorldConfig {
            seed: Some(7),
            strategy,
            dimensions: Dimensions::new(12, 6, 12),
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_regenerate_replaces_session() {
        let mut generator = Generator::new(small(StrategyKind::RandomFill)).expect("valid");
        let mut rng = ChaChaSource::from_seed(1);
        assert!(generator.session().is_none());

        let first = generator.regenerate(&mut rng).expect("generated").clone();
        let second = generator.regenerate(&mut rng).expect("generated");

        assert_eq!(first.generation(), 1);
        assert_eq!(second.generation(), 2);
        assert_ne!(first.grid(), second.grid(), "rng advanced between passes");
        assert_eq!(generator.generation(), 2);
    }

    #[test]
    fn test_refused_request_keeps_previous_world() {
        let mut generator = Generator::new(small(StrategyKind::NoiseTerrain)).expect("valid");
        let mut rng = ChaChaSource::from_seed(2);
        let before = generator.regenerate(&mut rng).expect("generated").clone();
        let origin = generator.origin();

        let broken = WorldConfig {
            tiles: vec![TileEntry::new("void", 0.0)],
            ..small(StrategyKind::NoiseTerrain)
        };
        assert!(matches!(
            generator.set_config(broken),
            Err(GenerationError::InvalidWeights { .. })
        ));

        let session = generator.session().expect("still present");
        assert_eq!(session.generation(), before.generation());
        assert_eq!(session.grid(), before.grid());
        assert_eq!(generator.origin(), origin);
        assert_eq!(generator.config().tiles.len(), 4);
    }

    /// Draws past the top of whatever range is asked for.
    struct Overshoot;

    impl RandomSource for Overshoot {
        fn range(&mut self, _low: f64, high: f64) -> f64 {
            high + 1.0
        }
    }

    #[test]
    fn test_failed_pass_keeps_previous_world() {
        let mut generator = Generator::new(small(StrategyKind::RandomFill)).expect("valid");
        let before = generator
            .regenerate(&mut ChaChaSource::from_seed(5))
            .expect("generated")
            .clone();
        let origin = generator.origin();

        assert!(matches!(
            generator.regenerate(&mut Overshoot),
            Err(GenerationError::DrawOutOfRange { .. })
        ));

        let session = generator.session().expect("still present");
        assert_eq!(session.generation(), 1);
        assert_eq!(session.grid(), before.grid());
        assert_eq!(generator.origin(), origin);
        assert_eq!(generator.generation(), 1);
    }

    #[test]
    fn test_origin_persists_when_not_randomized() {
        let mut config = small(StrategyKind::NoiseTerrain);
        let mut generator = Generator::new(config.clone()).expect("valid");
        let mut rng = ChaChaSource::from_seed(3);

        let drawn = generator.regenerate(&mut rng).expect("generated").origin();
        assert_ne!(drawn, NoiseOrigin::default());

        config.terrain.randomize_origin = false;
        generator.set_config(config).expect("valid");
        let first = generator.regenerate(&mut rng).expect("generated").clone();
        let second = generator.regenerate(&mut rng).expect("generated");

        assert_eq!(first.origin(), drawn);
        assert_eq!(second.origin(), drawn);
        assert_eq!(first.grid(), second.grid(), "same origin, same world");
    }

    #[test]
    fn test_prefab_session_has_no_scheduler() {
        let config = WorldConfig {
            prefabs: vec![PrefabEntry::new("hut", 1.0)],
            ..small(StrategyKind::ClusteredPrefab)
        };
        let mut generator = Generator::new(config).expect("valid");
        let session = generator
            .regenerate(&mut ChaChaSource::from_seed(4))
            .expect("generated");

        assert!(session.grid().is_none());
        assert!(session.scheduler().expect("no pacing error").is_none());
        // 12x6x12 with strides 10/5/10 -> 2 * 2 * 2 lattice points.
        assert_eq!(session.placements().len(), 8);

        let mut events: Vec<PlacementEvent> = Vec::new();
        assert_eq!(session.emit_all(&mut events), 8);
        assert!(events
            .iter()
            .all(|e| matches!(e.descriptor, TileDescriptor::Prefab { index: 0, .. })));
    }

    #[test]
    fn test_paced_scheduler_covers_grid() {
        let mut config = small(StrategyKind::RandomFill);
        config.reveal.paced = true;
        config.reveal.reveal_seconds = 0.5;
        let mut generator = Generator::new(config).expect("valid");
        let session = generator
            .regenerate(&mut ChaChaSource::from_seed(5))
            .expect("generated");

        let mut scheduler = session
            .scheduler()
            .expect("valid rate")
            .expect("dense strategy");
        let mut paced: Vec<PlacementEvent> = Vec::new();
        let steps = scheduler.run(&mut paced);
        assert!(steps > 1);

        let mut immediate: Vec<PlacementEvent> = Vec::new();
        session.emit_all(&mut immediate);
        assert_eq!(paced, immediate);
        assert_eq!(immediate.len(), session.dimensions().cell_count());
    }

    #[test]
    fn test_clear_drops_session() {
        let mut generator = Generator::new(small(StrategyKind::RandomFill)).expect("valid");
        let _ = generator
            .regenerate(&mut ChaChaSource::from_seed(6))
            .expect("generated");

        let dropped = generator.clear().expect("had a session");
        assert_eq!(dropped.grid().map(|g| g.count(Classification::EMPTY)), Some(0));
        assert!(generator.session().is_none());
    }

    #[test]
    fn test_invalid_config_refused_up_front() {
        let config = WorldConfig {
            dimensions: Dimensions::new(0, 4, 4),
            ..WorldConfig::default()
        };
        assert!(matches!(
            Generator::new(config),
            Err(GenerationError::InvalidDimensions { .. })
        ));
    }
}

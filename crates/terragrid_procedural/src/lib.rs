//! # TERRAGRID Procedural Generation
//!
//! Seeded synthesis of a discrete 3D tile world, plus the scheduler that
//! hands the result to a presentation layer.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and config always produce the same world
//! 2. **Validated up front**: A refused request never touches the previous world
//! 3. **Presentation-free**: Output is opaque descriptors, never engine objects
//! 4. **Resumable**: Paced reveals are plain values the caller steps per tick
//!
//! ## Core Components
//!
//! - `PerlinNoise`: 2D coherent noise in `[0, 1]`
//! - `WeightTable` / `WeightedSelector`: inclusive cumulative selection
//! - `TerrainClassifier`: height → snow → biome layer pipeline
//! - `WorldGrid`: dense x-major classification array
//! - `RandomFill`, `ClusteredPrefab`, `NoiseTerrain`: generation strategies
//! - `PopulationScheduler`: immediate or paced placement events
//! - `Generator`: caller-owned session lifecycle
//!
//! ## Example
//!
//! ```rust
//! use terragrid_procedural::{ChaChaSource, Generator, WorldConfig};
//!
//! let config = WorldConfig::default();
//! let mut generator = Generator::new(config).expect("default config is valid");
//! let mut rng = ChaChaSource::from_seed(12345);
//!
//! let session = generator.regenerate(&mut rng).expect("generation succeeds");
//! let mut events: Vec<terragrid_procedural::PlacementEvent> = Vec::new();
//! let placed = session.emit_all(&mut events);
//! assert_eq!(placed, events.len());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod grid;
pub mod noise;
pub mod preview;
pub mod random;
pub mod scheduler;
pub mod session;
pub mod strategy;
pub mod terrain;
pub mod weights;

pub use config::{
    PrefabEntry, PreviewConfig, RevealConfig, StrategyKind, TerrainConfig, TileEntry, WorldConfig,
};
pub use error::{GenerationError, GenerationResult};
pub use grid::{Classification, Dimensions, GridCoord, WorldGrid};
pub use noise::{NoiseOrigin, NoiseSeed, NoiseSource, PerlinNoise};
pub use preview::{PreviewBuffers, PreviewKind, PreviewQuad, SampleBuffer};
pub use random::{ChaChaSource, RandomSource};
pub use scheduler::{
    pacing_rate, EmissionMode, PlacementEvent, PlacementSink, PopulationScheduler, Step,
    TileDescriptor, DEFAULT_FRAMES_PER_SECOND,
};
pub use session::{GenerationSession, Generator, SessionOutput};
pub use strategy::{ClusteredPrefab, NoiseTerrain, RandomFill, TerrainOutcome};
pub use terrain::{
    BiomeLayer, BiomeSample, HeightLayer, SnowLayer, TerrainClassifier, TerrainLayers,
};
pub use weights::{WeightEntry, WeightTable, WeightedSelector};

//! # World Description Tests
//!
//! TOML world descriptions flowing through validation into a generator.

use std::path::Path;

use terragrid_procedural::{
    ChaChaSource, Dimensions, EmissionMode, GenerationError, Generator, StrategyKind,
    TileDescriptor, WorldConfig,
};

const PREFAB_WORLD: &str = r#"
seed = 99
strategy = "clustered_prefab"

[dimensions]
width = 30
height = 10
depth = 20

[[prefabs]]
name = "hut"
probability = 0.0

[[prefabs]]
name = "tower"
probability = 2.0
width = 2
height = 6
depth = 2

[reveal]
paced = true
reveal_seconds = 3.0
"#;

/// Test: a full prefab description loads and places only weighted prefabs.
#[test]
fn test_prefab_world_from_toml() {
    let config = WorldConfig::from_toml_str(PREFAB_WORLD).expect("valid toml");
    assert_eq!(config.strategy, StrategyKind::ClusteredPrefab);
    assert_eq!(config.dimensions, Dimensions::new(30, 10, 20));
    assert_eq!(config.reveal.emission_mode(), EmissionMode::paced(3.0));

    let mut generator = Generator::new(config).expect("valid config");
    let session = generator
        .regenerate(&mut ChaChaSource::from_seed(99))
        .expect("generation succeeds");

    // x in {0, 10, 20}, y in {0, 5}, z in {0, 10}
    assert_eq!(session.placements().len(), 12);
    for event in session.placements() {
        assert_eq!(
            event.descriptor,
            TileDescriptor::Prefab {
                index: 1,
                footprint: Dimensions::new(2, 6, 2)
            }
        );
    }
}

/// Test: validation failures surface with the right variant.
#[test]
fn test_invalid_descriptions_refused() {
    let cases = [
        ("[dimensions]\nwidth = 0", "zero width"),
        ("tiles = []", "empty tile catalog"),
        ("[reveal]\npaced = true\nreveal_seconds = -2.0", "negative reveal"),
        (
            "strategy = \"noise_terrain\"\n[terrain]\nbiome_scale = 0.0",
            "zero biome scale",
        ),
    ];

    for (text, label) in cases {
        let config = WorldConfig::from_toml_str(text).expect(label);
        let err = Generator::new(config).err().expect(label);
        let expected = match label {
            "zero width" => matches!(err, GenerationError::InvalidDimensions { .. }),
            "empty tile catalog" => matches!(err, GenerationError::EmptyCatalog { .. }),
            "negative reveal" => matches!(err, GenerationError::InvalidPacingRate { .. }),
            _ => matches!(err, GenerationError::InvalidConfig(_)),
        };
        assert!(expected, "{label}: got {err}");
    }
}

/// Test: schema mismatches are reported as configuration errors.
#[test]
fn test_schema_mismatch_is_invalid_config() {
    for text in ["seed = \"abc\"", "[dimensions]\nwidth = -3", "tiles = 5"] {
        assert!(matches!(
            WorldConfig::from_toml_str(text),
            Err(GenerationError::InvalidConfig(_))
        ));
    }
}

/// Test: a missing file is reported, not panicked on.
#[test]
fn test_missing_file() {
    let err = WorldConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, GenerationError::InvalidConfig(ref msg) if msg.contains("here.toml")));
}

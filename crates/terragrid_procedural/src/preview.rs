//! # Preview Sample Buffers
//!
//! Grayscale samples recorded alongside noise terrain classification, for a
//! texture-preview collaborator. Pure derived data: nothing in the
//! generation pipeline reads them back.

use crate::config::PreviewConfig;
use crate::grid::Dimensions;

/// Which noise channel a buffer records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    /// Column height divided by grid height.
    Height,
    /// Surface biome noise divided by catalog length.
    Biome,
    /// Vertical biome noise divided by catalog length.
    VerticalBiome,
}

impl PreviewKind {
    /// Short name, used for file stems and log fields.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Biome => "biome",
            Self::VerticalBiome => "vertical_biome",
        }
    }

    /// Where a presentation layer should lay out this preview.
    ///
    /// Height and biome previews lie flat under the world; the vertical
    /// preview stands upright behind it.
    #[must_use]
    pub fn quad(self, dims: Dimensions) -> PreviewQuad {
        let w = dims.width as f64;
        let h = dims.height as f64;
        let d = dims.depth as f64;
        match self {
            Self::Height | Self::Biome => PreviewQuad {
                scale: [w, d, 1.0],
                center: [(w - 1.0) / 2.0, -1.0, (d - 1.0) / 2.0],
            },
            Self::VerticalBiome => PreviewQuad {
                scale: [w, h, 1.0],
                center: [(w - 1.0) / 2.0, (h - 2.0) / 2.0, -1.0],
            },
        }
    }
}

/// Placement hint for a preview plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewQuad {
    /// Plane extents.
    pub scale: [f64; 3],
    /// Plane centre in grid space.
    pub center: [f64; 3],
}

/// A `width × depth` grid of grayscale samples, indexed by `(x, z)`.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    width: usize,
    depth: usize,
    samples: Vec<f32>,
}

impl SampleBuffer {
    /// Creates a buffer filled with black.
    #[must_use]
    pub fn new(width: usize, depth: usize) -> Self {
        Self {
            width,
            depth,
            samples: vec![0.0; width * depth],
        }
    }

    /// Buffer width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Buffer depth.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Writes the sample at `(x, z)`. Out-of-range writes are ignored.
    #[inline]
    pub fn set(&mut self, x: usize, z: usize, value: f64) {
        if x < self.width && z < self.depth {
            self.samples[z * self.width + x] = value as f32;
        }
    }

    /// Reads the sample at `(x, z)`.
    #[inline]
    #[must_use]
    pub fn get(&self, x: usize, z: usize) -> Option<f32> {
        (x < self.width && z < self.depth).then(|| self.samples[z * self.width + x])
    }

    /// Raw samples, row-major by z.
    #[must_use]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Quantizes to 8-bit gray, clamping to `[0, 1]` first.
    #[must_use]
    pub fn to_gray8(&self) -> Vec<u8> {
        self.samples
            .iter()
            .map(|&s| (s.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect()
    }
}

/// The preview buffers requested for one pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PreviewBuffers {
    /// Height channel.
    pub height: Option<SampleBuffer>,
    /// Surface biome channel.
    pub biome: Option<SampleBuffer>,
    /// Vertical biome channel.
    pub vertical_biome: Option<SampleBuffer>,
}

impl PreviewBuffers {
    /// Allocates the buffers `config` asks for, sized `width × depth`.
    #[must_use]
    pub fn new(dims: Dimensions, config: PreviewConfig) -> Self {
        let make = |wanted: bool| wanted.then(|| SampleBuffer::new(dims.width, dims.depth));
        Self {
            height: make(config.height),
            biome: make(config.biome),
            vertical_biome: make(config.vertical_biome),
        }
    }

    /// Returns true if no buffer is allocated.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.height.is_none() && self.biome.is_none() && self.vertical_biome.is_none()
    }

    /// Iterates allocated buffers.
    pub fn iter(&self) -> impl Iterator<Item = (PreviewKind, &SampleBuffer)> + '_ {
        [
            (PreviewKind::Height, self.height.as_ref()),
            (PreviewKind::Biome, self.biome.as_ref()),
            (PreviewKind::VerticalBiome, self.vertical_biome.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, buffer)| buffer.map(|b| (kind, b)))
    }
}

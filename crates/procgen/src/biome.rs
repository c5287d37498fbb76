//! Height-banded biome table used to colour terrain.

use serde::{Deserialize, Serialize};

/// The eight elevation bands, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiomeKind {
    /// Open water far below sea level.
    DeepOcean,
    /// Shallow water.
    Ocean,
    /// Shoreline sand around sea level.
    Beach,
    /// Low grassland.
    Plains,
    /// Wooded lowland.
    Forest,
    /// Rolling bare hills.
    Hills,
    /// Rocky high ground.
    Mountains,
    /// Snow-capped summits.
    SnowPeaks,
}

/// All biome kinds in table order.
pub const ALL_BIOMES: [BiomeKind; 8] = [
    BiomeKind::DeepOcean,
    BiomeKind::Ocean,
    BiomeKind::Beach,
    BiomeKind::Plains,
    BiomeKind::Forest,
    BiomeKind::Hills,
    BiomeKind::Mountains,
    BiomeKind::SnowPeaks,
];

impl BiomeKind {
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DeepOcean => "Deep Ocean",
            Self::Ocean => "Ocean",
            Self::Beach => "Beach",
            Self::Plains => "Plains",
            Self::Forest => "Forest",
            Self::Hills => "Hills",
            Self::Mountains => "Mountains",
            Self::SnowPeaks => "Snow Peaks",
        }
    }

    /// Display colour (linear RGB, 0-1).
    pub fn color(self) -> [f32; 3] {
        match self {
            Self::DeepOcean => [0.10, 0.30, 0.48], // #1a4d7a
            Self::Ocean => [0.16, 0.50, 0.72],     // #2980b9
            Self::Beach => [0.96, 0.82, 0.25],     // #f4d03f
            Self::Plains => [0.32, 0.76, 0.20],    // #52c234
            Self::Forest => [0.15, 0.68, 0.38],    // #27ae60
            Self::Hills => [0.50, 0.55, 0.55],     // #7f8c8d
            Self::Mountains => [0.58, 0.65, 0.65], // #95a5a6
            Self::SnowPeaks => [0.93, 0.94, 0.95], // #ecf0f1
        }
    }
}

/// One band of the table: heights in `[min_height, max_height)` get `color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub kind: BiomeKind,
    pub name: String,
    pub color: [f32; 3],
    pub min_height: f64,
    pub max_height: f64,
}

impl Biome {
    pub fn new(kind: BiomeKind, min_height: f64, max_height: f64) -> Self {
        Self {
            kind,
            name: kind.display_name().to_string(),
            color: kind.color(),
            min_height,
            max_height,
        }
    }

    #[inline]
    pub fn contains(&self, height: f64) -> bool {
        height >= self.min_height && height < self.max_height
    }
}

/// Breakpoints of the normalised biome signal used by [`BiomeTable::classify_value`].
/// Values at or above the last breakpoint are snow peaks; mountains are only
/// reachable by height.
const VALUE_BANDS: [(f64, BiomeKind); 6] = [
    (0.35, BiomeKind::DeepOcean),
    (0.42, BiomeKind::Ocean),
    (0.52, BiomeKind::Beach),
    (0.62, BiomeKind::Plains),
    (0.72, BiomeKind::Forest),
    (0.85, BiomeKind::Hills),
];

/// Ordered list of biome bands. Classification is first match in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeTable {
    bands: Vec<Biome>,
}

impl Default for BiomeTable {
    fn default() -> Self {
        Self::large_scale()
    }
}

impl BiomeTable {
    /// Build a table from explicit bands. Returns `None` for an empty list.
    pub fn from_bands(bands: Vec<Biome>) -> Option<Self> {
        if bands.is_empty() {
            None
        } else {
            Some(Self { bands })
        }
    }

    /// Bands for the multi-kilometre procedural map (-50 m to 650 m).
    pub fn large_scale() -> Self {
        Self::with_bounds([-50.0, -15.0, -1.0, 5.0, 50.0, 120.0, 220.0, 350.0, 650.0])
    }

    /// Bands for small hand-authored and chunked terrains (-50 m to 150 m).
    pub fn small_scale() -> Self {
        Self::with_bounds([-50.0, -20.0, -5.0, 2.0, 15.0, 35.0, 60.0, 100.0, 150.0])
    }

    fn with_bounds(bounds: [f64; 9]) -> Self {
        let bands = ALL_BIOMES
            .iter()
            .zip(bounds.windows(2))
            .map(|(&kind, w)| Biome::new(kind, w[0], w[1]))
            .collect();
        Self { bands }
    }

    pub fn bands(&self) -> &[Biome] {
        &self.bands
    }

    pub fn lowest(&self) -> &Biome {
        &self.bands[0]
    }

    pub fn highest(&self) -> &Biome {
        &self.bands[self.bands.len() - 1]
    }

    /// First band whose range contains `height`.
    ///
    /// Heights below every band's minimum map to the lowest band; anything
    /// else unmatched (above the top, gaps, NaN) maps to the highest band.
    pub fn classify(&self, height: f64) -> &Biome {
        if let Some(b) = self.bands.iter().find(|b| b.contains(height)) {
            return b;
        }
        let floor = self
            .bands
            .iter()
            .map(|b| b.min_height)
            .fold(f64::INFINITY, f64::min);
        if height < floor {
            self.lowest()
        } else {
            self.highest()
        }
    }

    /// Band for a normalised biome signal `t` in `[0, 1]` rather than a height.
    pub fn classify_value(&self, t: f64) -> &Biome {
        let kind = VALUE_BANDS
            .iter()
            .find(|(end, _)| t < *end)
            .map(|&(_, kind)| kind)
            .unwrap_or(BiomeKind::SnowPeaks);
        self.get(kind).unwrap_or_else(|| self.highest())
    }

    /// Band for a specific kind, if the table has one.
    pub fn get(&self, kind: BiomeKind) -> Option<&Biome> {
        self.bands.iter().find(|b| b.kind == kind)
    }
}

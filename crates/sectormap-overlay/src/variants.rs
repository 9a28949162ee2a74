//! Visual variants of sector markers.
//!
//! A sector's look depends only on its technology, whether it is selected
//! and its block mode. The 18 combinations are laid out in fixed tables
//! indexed by [`VariantKey::index`]; every table has exactly one entry per
//! key so a lookup can never miss.

use sectormap_core::{BlockMode, Sector, Technology};
use std::fmt;

/// Number of sector wedge variants.
pub const VARIANT_COUNT: usize = 18;

/// Rotation subtracted from the azimuth so the drawn arc points along the
/// sector bearing.
pub const AZIMUTH_OFFSET_DEG: f64 = 125.0;

/// Draw tier of base-station markers.
pub const BASE_STATION_Z: i32 = 10;

/// Draw tier of search pins.
pub const SEARCH_PIN_Z: i32 = 11;

/// Outline width of a wedge, in texture pixels.
pub const OUTLINE_WIDTH: f32 = 6.0;

/// Radius of the base-station dot, in texture pixels.
pub const BASE_STATION_RADIUS: f32 = 12.0;

/// Fill of the base-station dot.
pub const BASE_STATION_COLOR: u32 = 0x271FE0;

/// First and last angle of the wedge arc, in degrees.
pub const WEDGE_ARC_DEG: (f64, f64) = (1.0, 60.0);

const SELECTED_FILL: u32 = 0x7B79FF;
const SELECTED_OUTLINE: u32 = 0xD9D8FF;
const UC_FILL: u32 = 0xF03D22;
const UC_OUTLINE: u32 = 0xF29485;
const CN_FILL: u32 = 0x606060;
const CN_OUTLINE: u32 = 0xA0A0A0;

/// Wedge radius per technology, in texture pixels.
const RADIUS: [f32; 3] = [120.0, 100.0, 80.0];

// Order: technology, then selected, then block mode (none, CN, UC).
#[rustfmt::skip]
const FILL: [u32; VARIANT_COUNT] = [
    // GSM
    0x3FA34D, CN_FILL, UC_FILL,
    SELECTED_FILL, SELECTED_FILL, SELECTED_FILL,
    // UMTS
    0xF5A623, CN_FILL, UC_FILL,
    SELECTED_FILL, SELECTED_FILL, SELECTED_FILL,
    // LTE
    0x1E88E5, CN_FILL, UC_FILL,
    SELECTED_FILL, SELECTED_FILL, SELECTED_FILL,
];

#[rustfmt::skip]
const OUTLINE: [u32; VARIANT_COUNT] = [
    // GSM
    0x9FD8A6, CN_OUTLINE, UC_OUTLINE,
    SELECTED_OUTLINE, SELECTED_OUTLINE, SELECTED_OUTLINE,
    // UMTS
    0xF9D38E, CN_OUTLINE, UC_OUTLINE,
    SELECTED_OUTLINE, SELECTED_OUTLINE, SELECTED_OUTLINE,
    // LTE
    0x90C4F2, CN_OUTLINE, UC_OUTLINE,
    SELECTED_OUTLINE, SELECTED_OUTLINE, SELECTED_OUTLINE,
];

/// Identity of one cached wedge texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantKey {
    /// Radio technology
    pub technology: Technology,
    /// Whether the sector is in the selection
    pub selected: bool,
    /// Block mode
    pub block_mode: BlockMode,
}

impl VariantKey {
    /// Creates a key.
    pub const fn new(technology: Technology, selected: bool, block_mode: BlockMode) -> Self {
        Self {
            technology,
            selected,
            block_mode,
        }
    }

    /// Key for a sector: selection first, then UC over CN over none.
    pub fn for_sector(sector: &Sector, selected: bool) -> Self {
        Self::new(sector.technology, selected, sector.block_mode())
    }

    /// Every key, in table order.
    pub fn all() -> impl Iterator<Item = VariantKey> {
        Technology::ALL.into_iter().flat_map(|technology| {
            [false, true].into_iter().flat_map(move |selected| {
                BlockMode::ALL
                    .into_iter()
                    .map(move |block_mode| VariantKey::new(technology, selected, block_mode))
            })
        })
    }

    /// Table index in `0..VARIANT_COUNT`.
    pub const fn index(&self) -> usize {
        self.technology.index() * 6 + (self.selected as usize) * 3 + self.block_mode.index()
    }

    /// Look of this variant.
    pub fn style(&self) -> VariantStyle {
        let index = self.index();
        VariantStyle {
            fill: FILL[index],
            outline: OUTLINE[index],
            radius: RADIUS[self.technology.index()],
        }
    }

    /// Draw tier: 1/3/5 for unselected GSM/UMTS/LTE, one higher when selected.
    pub const fn z_index(&self) -> i32 {
        1 + 2 * self.technology.index() as i32 + self.selected as i32
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let block = match self.block_mode {
            BlockMode::NoBlock => "none",
            BlockMode::Conditional => "CN",
            BlockMode::Unconditional => "UC",
        };
        let selected = if self.selected { "selected" } else { "plain" };
        write!(f, "{}/{}/{}", self.technology, selected, block)
    }
}

/// Colors and size of a wedge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantStyle {
    /// Fill color as `0xRRGGBB`
    pub fill: u32,
    /// Outline color as `0xRRGGBB`
    pub outline: u32,
    /// Wedge radius in texture pixels
    pub radius: f32,
}

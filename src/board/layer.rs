//! Host board layers and layer sets.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Maximum number of copper layers on a board.
pub const MAX_COPPER_LAYERS: u32 = 32;

/// A host board layer.
///
/// Serialised by its canonical name, e.g. `"F.Cu"`, `"In2.Cu"`, `"Edge.Cuts"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PcbLayer {
    /// Front copper.
    FrontCopper,
    /// Inner copper layer `1..=30`.
    InnerCopper(u8),
    /// Back copper.
    BackCopper,
    /// Front adhesive.
    FrontAdhesive,
    /// Back adhesive.
    BackAdhesive,
    /// Front solder paste.
    FrontPaste,
    /// Back solder paste.
    BackPaste,
    /// Front silkscreen.
    FrontSilkscreen,
    /// Back silkscreen.
    BackSilkscreen,
    /// Front solder mask.
    FrontMask,
    /// Back solder mask.
    BackMask,
    /// Drawings.
    Drawings,
    /// Comments.
    Comments,
    /// Eco 1.
    Eco1,
    /// Eco 2.
    Eco2,
    /// Board outline.
    EdgeCuts,
    /// Board margin.
    Margin,
    /// Front courtyard.
    FrontCourtyard,
    /// Back courtyard.
    BackCourtyard,
    /// Front fabrication.
    FrontFab,
    /// Back fabrication.
    BackFab,
    /// Generic user layer `1..=9`.
    User(u8),
}

/// Every non-copper technical layer, front/back pairs.
const TECHNICAL: [PcbLayer; 12] = [
    PcbLayer::FrontAdhesive,
    PcbLayer::BackAdhesive,
    PcbLayer::FrontPaste,
    PcbLayer::BackPaste,
    PcbLayer::FrontSilkscreen,
    PcbLayer::BackSilkscreen,
    PcbLayer::FrontMask,
    PcbLayer::BackMask,
    PcbLayer::FrontCourtyard,
    PcbLayer::BackCourtyard,
    PcbLayer::FrontFab,
    PcbLayer::BackFab,
];

/// Drawing layers that belong to no side.
const USER: [PcbLayer; 6] = [
    PcbLayer::Drawings,
    PcbLayer::Comments,
    PcbLayer::Eco1,
    PcbLayer::Eco2,
    PcbLayer::EdgeCuts,
    PcbLayer::Margin,
];

impl PcbLayer {
    /// Copper layer at `index` (0 = front) on a board with `count` copper layers.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn copper(index: u32, count: u32) -> Self {
        if index == 0 {
            Self::FrontCopper
        } else if index + 1 >= count || index >= MAX_COPPER_LAYERS - 1 {
            Self::BackCopper
        } else {
            Self::InnerCopper(index as u8)
        }
    }

    /// Returns `true` for copper layers.
    #[must_use]
    pub const fn is_copper(self) -> bool {
        matches!(
            self,
            Self::FrontCopper | Self::InnerCopper(_) | Self::BackCopper
        )
    }

    /// Returns `true` for front/back technical layers (mask, paste, silk, …).
    #[must_use]
    pub fn is_technical(self) -> bool {
        TECHNICAL.contains(&self)
    }

    /// Returns `true` for side-independent drawing layers.
    #[must_use]
    pub fn is_user(self) -> bool {
        USER.contains(&self) || matches!(self, Self::User(_))
    }

    /// The corresponding layer on the other side of the board.
    #[must_use]
    pub const fn flipped(self, copper_count: u32) -> Self {
        match self {
            Self::FrontCopper => Self::BackCopper,
            Self::BackCopper => Self::FrontCopper,
            Self::InnerCopper(n) => Self::copper(copper_count.saturating_sub(1 + n as u32), copper_count),
            Self::FrontAdhesive => Self::BackAdhesive,
            Self::BackAdhesive => Self::FrontAdhesive,
            Self::FrontPaste => Self::BackPaste,
            Self::BackPaste => Self::FrontPaste,
            Self::FrontSilkscreen => Self::BackSilkscreen,
            Self::BackSilkscreen => Self::FrontSilkscreen,
            Self::FrontMask => Self::BackMask,
            Self::BackMask => Self::FrontMask,
            Self::FrontCourtyard => Self::BackCourtyard,
            Self::BackCourtyard => Self::FrontCourtyard,
            Self::FrontFab => Self::BackFab,
            Self::BackFab => Self::FrontFab,
            other => other,
        }
    }

    /// Bit position of the layer in a [`LayerSet`].
    #[must_use]
    pub const fn bit(self) -> u32 {
        match self {
            Self::FrontCopper => 0,
            Self::InnerCopper(n) => n as u32,
            Self::BackCopper => 31,
            Self::FrontAdhesive => 32,
            Self::BackAdhesive => 33,
            Self::FrontPaste => 34,
            Self::BackPaste => 35,
            Self::FrontSilkscreen => 36,
            Self::BackSilkscreen => 37,
            Self::FrontMask => 38,
            Self::BackMask => 39,
            Self::Drawings => 40,
            Self::Comments => 41,
            Self::Eco1 => 42,
            Self::Eco2 => 43,
            Self::EdgeCuts => 44,
            Self::Margin => 45,
            Self::FrontCourtyard => 46,
            Self::BackCourtyard => 47,
            Self::FrontFab => 48,
            Self::BackFab => 49,
            Self::User(n) => 49 + n as u32,
        }
    }

    /// Inverse of [`PcbLayer::bit`].
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_bit(bit: u32) -> Option<Self> {
        Some(match bit {
            0 => Self::FrontCopper,
            1..=30 => Self::InnerCopper(bit as u8),
            31 => Self::BackCopper,
            32 => Self::FrontAdhesive,
            33 => Self::BackAdhesive,
            34 => Self::FrontPaste,
            35 => Self::BackPaste,
            36 => Self::FrontSilkscreen,
            37 => Self::BackSilkscreen,
            38 => Self::FrontMask,
            39 => Self::BackMask,
            40 => Self::Drawings,
            41 => Self::Comments,
            42 => Self::Eco1,
            43 => Self::Eco2,
            44 => Self::EdgeCuts,
            45 => Self::Margin,
            46 => Self::FrontCourtyard,
            47 => Self::BackCourtyard,
            48 => Self::FrontFab,
            49 => Self::BackFab,
            50..=58 => Self::User((bit - 49) as u8),
            _ => return None,
        })
    }

    /// Canonical layer name.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::FrontCopper => "F.Cu".to_string(),
            Self::InnerCopper(n) => format!("In{n}.Cu"),
            Self::BackCopper => "B.Cu".to_string(),
            Self::FrontAdhesive => "F.Adhes".to_string(),
            Self::BackAdhesive => "B.Adhes".to_string(),
            Self::FrontPaste => "F.Paste".to_string(),
            Self::BackPaste => "B.Paste".to_string(),
            Self::FrontSilkscreen => "F.SilkS".to_string(),
            Self::BackSilkscreen => "B.SilkS".to_string(),
            Self::FrontMask => "F.Mask".to_string(),
            Self::BackMask => "B.Mask".to_string(),
            Self::Drawings => "Dwgs.User".to_string(),
            Self::Comments => "Cmts.User".to_string(),
            Self::Eco1 => "Eco1.User".to_string(),
            Self::Eco2 => "Eco2.User".to_string(),
            Self::EdgeCuts => "Edge.Cuts".to_string(),
            Self::Margin => "Margin".to_string(),
            Self::FrontCourtyard => "F.CrtYd".to_string(),
            Self::BackCourtyard => "B.CrtYd".to_string(),
            Self::FrontFab => "F.Fab".to_string(),
            Self::BackFab => "B.Fab".to_string(),
            Self::User(n) => format!("User.{n}"),
        }
    }

    /// Parses a canonical layer name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(n) = s.strip_prefix("In").and_then(|r| r.strip_suffix(".Cu")) {
            return n
                .parse::<u8>()
                .ok()
                .filter(|n| (1..=30).contains(n))
                .map(Self::InnerCopper);
        }
        if let Some(n) = s.strip_prefix("User.") {
            return n
                .parse::<u8>()
                .ok()
                .filter(|n| (1..=9).contains(n))
                .map(Self::User);
        }
        (0..=49)
            .filter_map(Self::from_bit)
            .filter(|l| !matches!(l, Self::InnerCopper(_)))
            .find(|l| l.name() == s)
    }
}

impl fmt::Display for PcbLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl TryFrom<String> for PcbLayer {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown layer '{value}'"))
    }
}

impl From<PcbLayer> for String {
    fn from(layer: PcbLayer) -> Self {
        layer.name()
    }
}

/// A set of host layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PcbLayer>", into = "Vec<PcbLayer>")]
pub struct LayerSet(u64);

impl LayerSet {
    /// The empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Builds a set from layers.
    #[must_use]
    pub fn of(layers: &[PcbLayer]) -> Self {
        layers.iter().copied().collect()
    }

    /// Every copper layer of a board with `count` copper layers.
    #[must_use]
    pub fn all_copper(count: u32) -> Self {
        (0..count.min(MAX_COPPER_LAYERS))
            .map(|i| PcbLayer::copper(i, count))
            .collect()
    }

    /// Every technical layer (adhesive, paste, silk, mask, courtyard, fab).
    #[must_use]
    pub fn all_technical() -> Self {
        Self::of(&TECHNICAL)
    }

    /// Every side-independent drawing layer, including user layers.
    #[must_use]
    pub fn all_user() -> Self {
        let mut set = Self::of(&USER);
        for n in 1..=9 {
            set.insert(PcbLayer::User(n));
        }
        set
    }

    /// Adds a layer.
    pub fn insert(&mut self, layer: PcbLayer) {
        self.0 |= 1 << layer.bit();
    }

    /// Removes a layer.
    pub fn remove(&mut self, layer: PcbLayer) {
        self.0 &= !(1 << layer.bit());
    }

    /// Returns a copy with `layer` added.
    #[must_use]
    pub fn with(mut self, layer: PcbLayer) -> Self {
        self.insert(layer);
        self
    }

    /// Returns `true` if the set holds `layer`.
    #[must_use]
    pub const fn contains(&self, layer: PcbLayer) -> bool {
        self.0 & (1 << layer.bit()) != 0
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Number of layers in the set.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.0.count_ones()
    }

    /// Layers in the set, in stack order.
    pub fn iter(&self) -> impl Iterator<Item = PcbLayer> + '_ {
        (0..64)
            .filter(|bit| self.0 & (1 << bit) != 0)
            .filter_map(PcbLayer::from_bit)
    }

    /// Returns the set with every layer swapped to the other side.
    #[must_use]
    pub fn flipped(&self, copper_count: u32) -> Self {
        self.iter().map(|l| l.flipped(copper_count)).collect()
    }
}

impl FromIterator<PcbLayer> for LayerSet {
    fn from_iter<I: IntoIterator<Item = PcbLayer>>(iter: I) -> Self {
        let mut set = Self::new();
        for layer in iter {
            set.insert(layer);
        }
        set
    }
}

impl BitOr for LayerSet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for LayerSet {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl From<Vec<PcbLayer>> for LayerSet {
    fn from(layers: Vec<PcbLayer>) -> Self {
        layers.into_iter().collect()
    }
}

impl From<LayerSet> for Vec<PcbLayer> {
    fn from(set: LayerSet) -> Self {
        set.iter().collect()
    }
}

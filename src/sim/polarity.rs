//! Polarity and collision layers
//!
//! Every platform and obstacle lives on exactly one polarity's layer. The
//! player only collides with the layers of its current polarity, so the
//! other half of the track is pass-through until the player switches.

use serde::{Deserialize, Serialize};

/// One of the two mutually exclusive collision states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Neon (cyan)
    #[default]
    A,
    /// Dark (magenta)
    B,
}

impl Polarity {
    /// The other polarity
    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Polarity::A => Polarity::B,
            Polarity::B => Polarity::A,
        }
    }

    /// Layer that platforms of this polarity are placed on
    #[inline]
    pub fn platform_layer(self) -> Layers {
        match self {
            Polarity::A => Layers::PLATFORM_A,
            Polarity::B => Layers::PLATFORM_B,
        }
    }

    /// Layer that obstacles of this polarity are placed on
    #[inline]
    pub fn obstacle_layer(self) -> Layers {
        match self {
            Polarity::A => Layers::OBSTACLE_A,
            Polarity::B => Layers::OBSTACLE_B,
        }
    }

    /// Everything solid or lethal for a player of this polarity
    #[inline]
    pub fn mask(self) -> Layers {
        self.platform_layer() | self.obstacle_layer()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Polarity::A => "Neon",
            Polarity::B => "Dark",
        }
    }
}

/// Collision layer bit set.
///
/// A collider sits on one layer; queries pass a mask of the layers they
/// want to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Layers(pub u32);

impl Layers {
    /// Coins and other polarity-independent triggers
    pub const COLLECTIBLE: Self = Self(1 << 0);

    /// The ceiling slab, solid regardless of polarity
    pub const CEILING: Self = Self(1 << 6);

    pub const PLATFORM_A: Self = Self(1 << 8);
    pub const PLATFORM_B: Self = Self(1 << 9);
    pub const OBSTACLE_A: Self = Self(1 << 10);
    pub const OBSTACLE_B: Self = Self(1 << 11);

    /// Both platform layers (used by the startup ground probe)
    pub const ALL_PLATFORMS: Self = Self(Self::PLATFORM_A.0 | Self::PLATFORM_B.0);

    /// Check if any of the given layers are set
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Check if these layers contain all of `other`
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl std::ops::BitOr for Layers {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

use core::{convert::Infallible, fmt};

use strum::IntoEnumIterator;
use strum_macros::{EnumCount, EnumIter};

/// One of the 16 switchable power outputs.
///
/// Channel `n` is bit `n - 1` of the data register.
#[derive(Debug, EnumIter, EnumCount, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Channel {
    Power1 = 1,
    Power2 = 2,
    Power3 = 3,
    Power4 = 4,
    Power5 = 5,
    Power6 = 6,
    Power7 = 7,
    Power8 = 8,
    Power9 = 9,
    Power10 = 10,
    Power11 = 11,
    Power12 = 12,
    Power13 = 13,
    Power14 = 14,
    Power15 = 15,
    Power16 = 16,
}

impl Channel {
    pub const MIN_ID: u8 = Self::Power1 as u8;
    pub const MAX_ID: u8 = Self::Power16 as u8;

    /// Channel number, 1 to 16.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Bit position of this channel in the data register.
    pub const fn bit_index(self) -> u8 {
        self as u8 - 1
    }

    /// Mask with only this channel set.
    pub const fn bit(self) -> PowerMask {
        PowerMask(1u16 << self.bit_index())
    }
}

/// Rejected channel ID, carrying the value that was out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelOutOfRange(pub u8);

impl fmt::Display for ChannelOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Power ID out of range: {} (valid: {}..={})",
            self.0,
            Channel::MIN_ID,
            Channel::MAX_ID
        )
    }
}

impl std::error::Error for ChannelOutOfRange {}

// Lets `Channel` itself be passed wherever a `TryInto<Channel>` is accepted.
impl From<Infallible> for ChannelOutOfRange {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl TryFrom<u8> for Channel {
    type Error = ChannelOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Channel::iter()
            .find(|channel| channel.id() == value)
            .ok_or(ChannelOutOfRange(value))
    }
}

impl From<Channel> for u8 {
    fn from(value: Channel) -> Self {
        value.id()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Content of the data register. Bit `i` set means channel `i + 1` is energized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PowerMask(u16);

impl PowerMask {
    /// Every channel off.
    pub const EMPTY: Self = Self(0x0000);
    /// Every channel on.
    pub const ALL: Self = Self(0xFFFF);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, channel: Channel) -> bool {
        self.0 & channel.bit().0 != 0
    }

    /// Channels set in either mask.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Channels set in `self` but not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Energized channels, lowest first.
    pub fn channels(self) -> impl Iterator<Item = Channel> {
        Channel::iter().filter(move |channel| self.contains(*channel))
    }

    /// Build a mask from a sequence of per-channel flags. Element `i` maps to bit `i`.
    ///
    /// Only the first 16 elements are considered.
    pub fn from_flags(flags: &[bool]) -> Self {
        flags
            .iter()
            .take(usize::from(Channel::MAX_ID))
            .enumerate()
            .filter(|(_, on)| **on)
            .fold(Self::EMPTY, |mask, (i, _)| Self(mask.0 | (1u16 << i)))
    }

    /// Per-channel flags, element `i` is bit `i`.
    pub fn to_flags(self) -> [bool; 16] {
        core::array::from_fn(|i| self.0 & (1u16 << i) != 0)
    }
}

impl From<u16> for PowerMask {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<PowerMask> for u16 {
    fn from(value: PowerMask) -> Self {
        value.0
    }
}

impl From<Channel> for PowerMask {
    fn from(value: Channel) -> Self {
        value.bit()
    }
}

impl FromIterator<Channel> for PowerMask {
    fn from_iter<T: IntoIterator<Item = Channel>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::EMPTY, |mask, channel| mask.union(channel.bit()))
    }
}

impl fmt::Display for PowerMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}", self.0)
    }
}

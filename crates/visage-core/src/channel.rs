//! Blendshape channels
//!
//! The canonical channel set is ARKit-52. Other naming conventions (VRM) are
//! output adapters layered on top, never a second channel space.

use serde::{Deserialize, Serialize};

use crate::{VisageError, VisageResult};

macro_rules! channels {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// A single ARKit blendshape channel
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum Channel {
            $($variant),+
        }

        impl Channel {
            /// Every channel, in index order
            pub const ALL: [Channel; Channel::COUNT] = [$(Channel::$variant),+];

            /// ARKit camelCase name
            pub fn name(self) -> &'static str {
                match self {
                    $(Channel::$variant => $name),+
                }
            }

            /// Look up a channel by its ARKit name.
            /// Unknown names return `None` so upstream tables stay forward-compatible.
            pub fn from_name(name: &str) -> Option<Channel> {
                match name {
                    $($name => Some(Channel::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

channels! {
    EyeBlinkLeft => "eyeBlinkLeft",
    EyeLookDownLeft => "eyeLookDownLeft",
    EyeLookInLeft => "eyeLookInLeft",
    EyeLookOutLeft => "eyeLookOutLeft",
    EyeLookUpLeft => "eyeLookUpLeft",
    EyeSquintLeft => "eyeSquintLeft",
    EyeWideLeft => "eyeWideLeft",
    EyeBlinkRight => "eyeBlinkRight",
    EyeLookDownRight => "eyeLookDownRight",
    EyeLookInRight => "eyeLookInRight",
    EyeLookOutRight => "eyeLookOutRight",
    EyeLookUpRight => "eyeLookUpRight",
    EyeSquintRight => "eyeSquintRight",
    EyeWideRight => "eyeWideRight",
    JawForward => "jawForward",
    JawLeft => "jawLeft",
    JawRight => "jawRight",
    JawOpen => "jawOpen",
    MouthClose => "mouthClose",
    MouthFunnel => "mouthFunnel",
    MouthPucker => "mouthPucker",
    MouthLeft => "mouthLeft",
    MouthRight => "mouthRight",
    MouthSmileLeft => "mouthSmileLeft",
    MouthSmileRight => "mouthSmileRight",
    MouthFrownLeft => "mouthFrownLeft",
    MouthFrownRight => "mouthFrownRight",
    MouthDimpleLeft => "mouthDimpleLeft",
    MouthDimpleRight => "mouthDimpleRight",
    MouthStretchLeft => "mouthStretchLeft",
    MouthStretchRight => "mouthStretchRight",
    MouthRollLower => "mouthRollLower",
    MouthRollUpper => "mouthRollUpper",
    MouthShrugLower => "mouthShrugLower",
    MouthShrugUpper => "mouthShrugUpper",
    MouthPressLeft => "mouthPressLeft",
    MouthPressRight => "mouthPressRight",
    MouthLowerDownLeft => "mouthLowerDownLeft",
    MouthLowerDownRight => "mouthLowerDownRight",
    MouthUpperUpLeft => "mouthUpperUpLeft",
    MouthUpperUpRight => "mouthUpperUpRight",
    BrowDownLeft => "browDownLeft",
    BrowDownRight => "browDownRight",
    BrowInnerUp => "browInnerUp",
    BrowOuterUpLeft => "browOuterUpLeft",
    BrowOuterUpRight => "browOuterUpRight",
    CheekPuff => "cheekPuff",
    CheekSquintLeft => "cheekSquintLeft",
    CheekSquintRight => "cheekSquintRight",
    NoseSneerLeft => "noseSneerLeft",
    NoseSneerRight => "noseSneerRight",
    TongueOut => "tongueOut",
}

/// Facial region a channel belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacialRegion {
    Eyes,
    Brows,
    Jaw,
    Mouth,
    Cheeks,
    Nose,
    Tongue,
}

impl Channel {
    /// Number of channels
    pub const COUNT: usize = 52;

    /// Stable array index
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel at an index
    #[inline]
    pub fn from_index(index: usize) -> Option<Channel> {
        Self::ALL.get(index).copied()
    }

    /// Strict lookup for callers that want to surface typos
    pub fn parse(name: &str) -> VisageResult<Channel> {
        Channel::from_name(name).ok_or_else(|| VisageError::UnknownChannel(name.to_string()))
    }

    pub fn region(self) -> FacialRegion {
        use Channel::*;
        match self {
            EyeBlinkLeft | EyeLookDownLeft | EyeLookInLeft | EyeLookOutLeft | EyeLookUpLeft
            | EyeSquintLeft | EyeWideLeft | EyeBlinkRight | EyeLookDownRight | EyeLookInRight
            | EyeLookOutRight | EyeLookUpRight | EyeSquintRight | EyeWideRight => {
                FacialRegion::Eyes
            }
            BrowDownLeft | BrowDownRight | BrowInnerUp | BrowOuterUpLeft | BrowOuterUpRight => {
                FacialRegion::Brows
            }
            JawForward | JawLeft | JawRight | JawOpen => FacialRegion::Jaw,
            CheekPuff | CheekSquintLeft | CheekSquintRight => FacialRegion::Cheeks,
            NoseSneerLeft | NoseSneerRight => FacialRegion::Nose,
            TongueOut => FacialRegion::Tongue,
            _ => FacialRegion::Mouth,
        }
    }

    /// Channels that lip sync may own while speaking
    pub fn is_articulator(self) -> bool {
        use Channel::*;
        matches!(
            self,
            JawOpen
                | JawForward
                | MouthClose
                | MouthFunnel
                | MouthPucker
                | MouthStretchLeft
                | MouthStretchRight
                | MouthRollLower
                | MouthRollUpper
                | MouthShrugLower
                | MouthShrugUpper
                | MouthPressLeft
                | MouthPressRight
                | MouthLowerDownLeft
                | MouthLowerDownRight
                | MouthUpperUpLeft
                | MouthUpperUpRight
                | TongueOut
        )
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Set of channels, one bit per channel index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChannelMask(u64);

impl ChannelMask {
    pub const EMPTY: ChannelMask = ChannelMask(0);
    pub const ALL: ChannelMask = ChannelMask((1u64 << Channel::COUNT) - 1);

    pub fn from_channels(channels: &[Channel]) -> Self {
        let mut mask = Self::EMPTY;
        for &channel in channels {
            mask.insert(channel);
        }
        mask
    }

    /// Every channel that lip sync may own
    pub fn articulators() -> Self {
        let mut mask = Self::EMPTY;
        for channel in Channel::ALL {
            if channel.is_articulator() {
                mask.insert(channel);
            }
        }
        mask
    }

    #[inline]
    pub fn insert(&mut self, channel: Channel) {
        self.0 |= 1 << channel.index();
    }

    #[inline]
    pub fn remove(&mut self, channel: Channel) {
        self.0 &= !(1 << channel.index());
    }

    #[inline]
    pub fn contains(self, channel: Channel) -> bool {
        self.0 & (1 << channel.index()) != 0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn union(self, other: ChannelMask) -> ChannelMask {
        ChannelMask(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Channel> {
        Channel::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_match_all_order() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(Channel::from_index(i), Some(*channel));
        }
        assert_eq!(Channel::from_index(Channel::COUNT), None);
    }

    #[test]
    fn test_name_roundtrip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_name(channel.name()), Some(channel));
        }
        assert_eq!(Channel::from_name("eyeBlink_L"), None);
        assert!(Channel::parse("mouthSmileLeft").is_ok());
        assert!(Channel::parse("notAChannel").is_err());
    }

    #[test]
    fn test_regions() {
        assert_eq!(Channel::EyeLookUpLeft.region(), FacialRegion::Eyes);
        assert_eq!(Channel::BrowInnerUp.region(), FacialRegion::Brows);
        assert_eq!(Channel::JawOpen.region(), FacialRegion::Jaw);
        assert_eq!(Channel::MouthSmileLeft.region(), FacialRegion::Mouth);
        assert_eq!(Channel::TongueOut.region(), FacialRegion::Tongue);
    }

    #[test]
    fn test_mask_ops() {
        let mut mask = ChannelMask::from_channels(&[Channel::JawOpen, Channel::BrowInnerUp]);
        assert!(mask.contains(Channel::JawOpen));
        assert!(!mask.contains(Channel::TongueOut));
        assert_eq!(mask.len(), 2);

        mask.remove(Channel::JawOpen);
        assert_eq!(mask.iter().collect::<Vec<_>>(), vec![Channel::BrowInnerUp]);
        assert_eq!(ChannelMask::ALL.len(), Channel::COUNT);
    }

    #[test]
    fn test_articulators_exclude_smile() {
        let mask = ChannelMask::articulators();
        assert!(mask.contains(Channel::JawOpen));
        assert!(mask.contains(Channel::MouthClose));
        assert!(!mask.contains(Channel::MouthSmileLeft));
        assert!(!mask.contains(Channel::EyeBlinkLeft));
    }
}

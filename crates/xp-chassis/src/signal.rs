//! Signal plane bitmask
//!
//! A route request names one or more planes at once; each set bit is
//! dispatched independently by the matrix engine.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bitmask of independently routable signal planes
///
/// Planes can be combined freely: `SignalMask::VIDEO | SignalMask::AUDIO`
/// routes both in a single switch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalMask(u8);

impl SignalMask {
    /// No planes set
    pub const NONE: SignalMask = SignalMask(0);
    /// Video plane
    pub const VIDEO: SignalMask = SignalMask(1 << 0);
    /// Audio plane
    pub const AUDIO: SignalMask = SignalMask(1 << 1);
    /// USB plane routed from an input card's perspective
    pub const USB_INPUT: SignalMask = SignalMask(1 << 2);
    /// USB plane routed from an output card's perspective
    pub const USB_OUTPUT: SignalMask = SignalMask(1 << 3);
    /// Combined video and audio, the common case for digital transports
    pub const AUDIO_VIDEO: SignalMask = SignalMask(1 << 0 | 1 << 1);

    const ALL_BITS: u8 = 0x0f;

    /// Build a mask from raw bits, discarding bits outside the known planes
    pub fn from_bits(bits: u8) -> SignalMask {
        SignalMask(bits & Self::ALL_BITS)
    }

    /// Raw bit representation
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True when every plane in `other` is also set in `self`
    pub fn contains(self, other: SignalMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when at least one plane is set in both masks
    pub fn intersects(self, other: SignalMask) -> bool {
        self.0 & other.0 != 0
    }

    /// True when no plane is set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for SignalMask {
    type Output = SignalMask;

    fn bitor(self, rhs: SignalMask) -> SignalMask {
        SignalMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for SignalMask {
    fn bitor_assign(&mut self, rhs: SignalMask) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for SignalMask {
    type Output = SignalMask;

    fn bitand(self, rhs: SignalMask) -> SignalMask {
        SignalMask(self.0 & rhs.0)
    }
}

impl fmt::Display for SignalMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for (bit, label) in [
            (SignalMask::VIDEO, "video"),
            (SignalMask::AUDIO, "audio"),
            (SignalMask::USB_INPUT, "usb-in"),
            (SignalMask::USB_OUTPUT, "usb-out"),
        ] {
            if self.contains(bit) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{}", label)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_and_contains() {
        let mask = SignalMask::VIDEO | SignalMask::AUDIO;
        assert_eq!(mask, SignalMask::AUDIO_VIDEO);
        assert!(mask.contains(SignalMask::VIDEO));
        assert!(mask.contains(SignalMask::AUDIO));
        assert!(!mask.contains(SignalMask::USB_INPUT));
        assert!(mask.contains(SignalMask::NONE));
    }

    #[test]
    fn test_intersects() {
        let mask = SignalMask::AUDIO | SignalMask::USB_OUTPUT;
        assert!(mask.intersects(SignalMask::AUDIO_VIDEO));
        assert!(!mask.intersects(SignalMask::VIDEO | SignalMask::USB_INPUT));
        assert!(!SignalMask::NONE.intersects(mask));
    }

    #[test]
    fn test_or_assign() {
        let mut mask = SignalMask::VIDEO;
        mask |= SignalMask::USB_INPUT;
        assert!(mask.contains(SignalMask::VIDEO));
        assert!(mask.contains(SignalMask::USB_INPUT));
    }

    #[test]
    fn test_from_bits_discards_unknown() {
        let mask = SignalMask::from_bits(0xff);
        assert_eq!(
            mask,
            SignalMask::AUDIO_VIDEO | SignalMask::USB_INPUT | SignalMask::USB_OUTPUT
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(SignalMask::NONE.to_string(), "none");
        assert_eq!(SignalMask::VIDEO.to_string(), "video");
        assert_eq!(SignalMask::AUDIO_VIDEO.to_string(), "video+audio");
        assert_eq!(
            (SignalMask::AUDIO | SignalMask::USB_OUTPUT).to_string(),
            "audio+usb-out"
        );
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn bits_round_trip(bits in 0u8..=15u8) {
                prop_assert_eq!(SignalMask::from_bits(bits).bits(), bits);
            }

            #[test]
            fn mask_algebra_is_consistent(a in 0u8..=15u8, b in 0u8..=15u8) {
                let a = SignalMask::from_bits(a);
                let b = SignalMask::from_bits(b);
                let union = a | b;

                prop_assert!(union.contains(a));
                prop_assert!(union.contains(b));
                if a.contains(b) && !b.is_empty() {
                    prop_assert!(a.intersects(b));
                }
                prop_assert_eq!((a & b).is_empty(), !a.intersects(b));
            }
        }
    }
}

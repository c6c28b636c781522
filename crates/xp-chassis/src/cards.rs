//! Card handles and capability traits
//!
//! The matrix engine never talks to vendor hardware directly. Discovery and
//! protocol decoding happen in a driver layer that hands over typed card
//! handles implementing the traits below, plus two change-notification
//! feeds. Cards are addressed by a 1-based slot number; number 0 is
//! reserved to mean "no route".

use std::sync::Arc;

use tokio::sync::broadcast;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::CardError;
use crate::events::{InputChange, OutputChange};

/// Kinds of input card a chassis can carry
///
/// The set is closed: the matrix engine matches exhaustively over it, so a
/// new kind cannot be added without deciding its routing rule. Hardware
/// kinds with no routing rule are reported as `Expansion`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InputCardKind {
    /// Digital input, embedded audio only
    Hdmi,
    /// Digital input with a separate analog line-audio form
    HdmiAnalogAudio,
    /// Composite card exposing digital and VGA forms, routed on the backplane
    HdmiVgaCombo,
    /// Composite card exposing digital, VGA, and BNC forms
    HdmiVgaBncCombo,
    /// Twisted-pair digital transport receiver
    HdBaseT,
    /// Network streaming receiver
    MediaStream,
    /// Present in the chassis but carries no signal this engine can route
    Expansion,
}

/// Kinds of output card a chassis can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OutputCardKind {
    /// Digital output with embedded audio
    Hdmi,
    /// Twisted-pair digital transport transmitter
    HdBaseT,
    /// Program (main room) audio output
    ProgramAudio,
    /// Auxiliary audio output 1
    AuxAudio1,
    /// Auxiliary audio output 2
    AuxAudio2,
    /// Audio feed to codec channel 1
    CodecAudio1,
    /// Audio feed to codec channel 2
    CodecAudio2,
    /// Audio feed to the dialer
    DialerAudio,
    /// Digital mix bus 1
    MixAudio1,
    /// Digital mix bus 2
    MixAudio2,
    /// Acoustic echo cancellation reference output
    AecAudio,
    /// Present in the chassis but carries no signal this engine can route
    Expansion,
}

impl OutputCardKind {
    /// True for line-level audio outputs with no video plane
    pub fn is_audio_only(self) -> bool {
        matches!(
            self,
            OutputCardKind::ProgramAudio
                | OutputCardKind::AuxAudio1
                | OutputCardKind::AuxAudio2
                | OutputCardKind::CodecAudio1
                | OutputCardKind::CodecAudio2
                | OutputCardKind::DialerAudio
                | OutputCardKind::MixAudio1
                | OutputCardKind::MixAudio2
                | OutputCardKind::AecAudio
        )
    }
}

/// How an output card expresses its audio route
///
/// Two hardware generations exist: one routes audio as a reference to an
/// input card, the other as a source-selector number that also covers
/// audio-only virtual sources beyond the video-capable input set. The
/// variant is fixed per card and probed once at recognition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AudioRouteMode {
    /// Audio route is a routed-input reference
    #[default]
    RoutedInput,
    /// Audio route is a source-selector number
    SourceSelect,
}

/// Side-channel control capability attached to some ports
///
/// Carries display-control style traffic (power, input select) to the sink
/// or source device behind a port. Attached to the port as a capability
/// reference, never as a port of its own.
pub trait ControlChannel: Send + Sync {
    /// Send a raw control payload to the attached device
    fn transmit(&self, payload: &[u8]) -> Result<(), CardError>;
}

/// Read/write handle for one input card
pub trait InputCard: Send + Sync {
    /// 1-based slot number
    fn number(&self) -> u32;

    /// Card kind, fixed for the card's lifetime
    fn kind(&self) -> InputCardKind;

    /// Current name string
    fn name(&self) -> String;

    /// Write the name string
    fn set_name(&self, name: &str) -> Result<(), CardError>;

    /// Endpoint online state
    fn online(&self) -> bool;

    /// Video sync detected on this input
    fn video_sync(&self) -> bool;

    /// Output this input's USB plane is routed to, if any
    fn usb_route(&self) -> Result<Option<u32>, CardError> {
        Err(CardError::Unsupported("usb route"))
    }

    /// Route this input's USB plane to an output (None clears)
    fn set_usb_route(&self, output: Option<u32>) -> Result<(), CardError> {
        let _ = output;
        Err(CardError::Unsupported("usb route"))
    }

    /// Active signal form for composite cards
    fn active_source(&self) -> Result<u32, CardError> {
        Err(CardError::Unsupported("composite source"))
    }

    /// Select the active signal form for composite cards
    fn set_active_source(&self, source: u32) -> Result<(), CardError> {
        let _ = source;
        Err(CardError::Unsupported("composite source"))
    }

    /// Side-channel control capability, if the transport carries one
    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        None
    }
}

/// Read/write handle for one output card
pub trait OutputCard: Send + Sync {
    /// 1-based slot number
    fn number(&self) -> u32;

    /// Card kind, fixed for the card's lifetime
    fn kind(&self) -> OutputCardKind;

    /// Current name string
    fn name(&self) -> String;

    /// Write the name string
    fn set_name(&self, name: &str) -> Result<(), CardError>;

    /// Endpoint online state
    fn online(&self) -> bool;

    /// How this card expresses its audio route
    fn audio_route_mode(&self) -> AudioRouteMode {
        AudioRouteMode::RoutedInput
    }

    /// Input currently routed to this output's video plane
    fn video_route(&self) -> Option<u32>;

    /// Route an input to this output's video plane (None clears)
    fn set_video_route(&self, input: Option<u32>) -> Result<(), CardError>;

    /// Input currently routed to the audio plane (routed-input hardware)
    fn audio_route(&self) -> Result<Option<u32>, CardError> {
        Err(CardError::Unsupported("audio routed-input reference"))
    }

    /// Route an input to the audio plane (routed-input hardware)
    fn set_audio_route(&self, input: Option<u32>) -> Result<(), CardError> {
        let _ = input;
        Err(CardError::Unsupported("audio routed-input reference"))
    }

    /// Current audio source number (source-selector hardware)
    fn audio_source(&self) -> Result<u32, CardError> {
        Err(CardError::Unsupported("audio source selector"))
    }

    /// Select the audio source number (source-selector hardware)
    fn set_audio_source(&self, source: u32) -> Result<(), CardError> {
        let _ = source;
        Err(CardError::Unsupported("audio source selector"))
    }

    /// Input this output's USB plane is routed to, if any
    fn usb_route(&self) -> Result<Option<u32>, CardError> {
        Err(CardError::Unsupported("usb route"))
    }

    /// Route an input to this output's USB plane (None clears)
    fn set_usb_route(&self, input: Option<u32>) -> Result<(), CardError> {
        let _ = input;
        Err(CardError::Unsupported("usb route"))
    }

    /// Volume level for audio outputs
    fn volume(&self) -> Result<u32, CardError> {
        Err(CardError::Unsupported("volume"))
    }

    /// Set the volume level for audio outputs
    fn set_volume(&self, level: u32) -> Result<(), CardError> {
        let _ = level;
        Err(CardError::Unsupported("volume"))
    }

    /// Side-channel control capability, if the transport carries one
    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        None
    }
}

/// One switching chassis: enumerable cards plus change-notification feeds
pub trait Chassis: Send + Sync {
    /// Number of addressable input slots
    fn input_count(&self) -> u32;

    /// Number of addressable output slots
    fn output_count(&self) -> u32;

    /// Handle for one input card, if a card is installed at that slot
    fn input_card(&self, number: u32) -> Option<Arc<dyn InputCard>>;

    /// Handle for one output card, if a card is installed at that slot
    fn output_card(&self, number: u32) -> Option<Arc<dyn OutputCard>>;

    /// All installed input cards in slot order
    fn input_cards(&self) -> Vec<Arc<dyn InputCard>>;

    /// All installed output cards in slot order
    fn output_cards(&self) -> Vec<Arc<dyn OutputCard>>;

    /// Register for input-card change notifications
    ///
    /// Each call returns an independent receiver; dropping it deregisters.
    fn subscribe_input_changes(&self) -> broadcast::Receiver<InputChange>;

    /// Register for output-card change notifications
    fn subscribe_output_changes(&self) -> broadcast::Receiver<OutputChange>;
}

//! Chassis abstraction for AV switching hardware
//!
//! This crate defines the vocabulary between a vendor driver layer and the
//! routing matrix engine:
//!
//! - [`SignalMask`]: bitmask over the independently routable signal planes
//!   (video, audio, USB in either direction)
//! - [`InputCard`] / [`OutputCard`] / [`Chassis`]: typed handles over the
//!   hardware's read/write properties
//! - [`InputChange`] / [`OutputChange`]: the change-notification feed the
//!   hardware pushes after property writes and external events
//!
//! The engine in `xp-matrix` consumes these traits; `xp-sim` implements
//! them without hardware for tests and development.

pub mod cards;
pub mod error;
pub mod events;
pub mod signal;

pub use cards::{
    AudioRouteMode, Chassis, ControlChannel, InputCard, InputCardKind, OutputCard, OutputCardKind,
};
pub use error::CardError;
pub use events::{InputChange, InputEventKind, OutputChange, OutputEventKind};
pub use signal::SignalMask;

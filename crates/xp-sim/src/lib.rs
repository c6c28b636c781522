//! Chassis Simulation Library
//!
//! This crate provides a simulation layer for testing matrix routing
//! without physical switching hardware. It includes:
//!
//! - **VirtualChassis**: a chassis with installable virtual cards and live
//!   change-notification feeds
//! - **VirtualInputCard / VirtualOutputCard**: cards whose write properties
//!   echo change events exactly like hardware feedback
//!
//! # Example
//!
//! ```rust
//! use xp_chassis::{InputCardKind, OutputCard, OutputCardKind};
//! use xp_sim::VirtualChassis;
//!
//! let mut chassis = VirtualChassis::new();
//! chassis.add_input(1, InputCardKind::Hdmi, "Laptop");
//! let output = chassis.add_output(1, OutputCardKind::Hdmi, "Display");
//!
//! // Writes behave like the real hardware: state plus a change event
//! output.set_video_route(Some(1)).unwrap();
//! assert_eq!(output.video_route(), Some(1));
//! ```

pub mod cards;
pub mod chassis;

pub use cards::{VirtualControlChannel, VirtualInputCard, VirtualOutputCard};
pub use chassis::{
    VirtualChassis, VirtualChassisConfig, VirtualInputCardConfig, VirtualOutputCardConfig,
};

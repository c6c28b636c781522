//! Routing Matrix Engine
//!
//! This crate provides the core routing logic for an AV switching chassis:
//! it turns hardware cards into routable ports, executes multi-plane switch
//! requests against the hardware, and re-exposes hardware-reported state as
//! push-distributed feedback.
//!
//! # Architecture
//!
//! The controller never caches routes itself. Current routing state lives
//! in the hardware; feedback entries read it on demand and push to linked
//! sinks when the event dispatcher fires them. That keeps one source of
//! truth even with three concurrent writers: external switch calls, the
//! hardware change feed, and expiring route-off timers.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use xp_chassis::{InputCardKind, OutputCardKind, SignalMask};
//! use xp_matrix::{MatrixConfig, MatrixController};
//! use xp_sim::VirtualChassis;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut chassis = VirtualChassis::new();
//! chassis.add_input(1, InputCardKind::Hdmi, "Laptop");
//! chassis.add_output(1, OutputCardKind::Hdmi, "Display");
//!
//! let controller = MatrixController::new(
//!     "matrix",
//!     "Matrix Switcher",
//!     Arc::new(chassis),
//!     MatrixConfig::default(),
//! )
//! .unwrap();
//!
//! let _dispatcher = controller.activate();
//! controller
//!     .execute_switch(1u32, 1u32, SignalMask::AUDIO_VIDEO)
//!     .unwrap();
//! # }
//! ```

pub mod builder;
pub mod composite;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod events;
pub mod feedback;
pub mod ports;
pub mod volume;

pub use builder::{build_input_ports, build_output_ports};
pub use composite::CompositeInputController;
pub use config::MatrixConfig;
pub use dispatcher::DispatcherHandle;
pub use engine::{MatrixController, RouteOffKey, Selector, AUDIO_SOURCE_EXTRA};
pub use error::MatrixError;
pub use events::MatrixEvent;
pub use feedback::{BoolFeedback, Feedback, FeedbackTables, IntFeedback, StringFeedback};
pub use ports::{ConnectionKind, InputPort, OutputPort, PortCollection, RoutingPort};
pub use volume::AudioOutputController;

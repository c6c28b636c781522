//! Unified event stream for the matrix controller
//!
//! Route changes confirmed by the hardware are re-broadcast here for
//! consumers that want a single ordered stream instead of linking
//! individual feedback sinks.

use xp_chassis::SignalMask;

/// Events emitted by the matrix controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixEvent {
    /// Hardware confirmed a route on one or more planes of an output
    RouteChanged {
        /// Output card number
        output: u32,
        /// Input card or source number now routed
        input: u32,
        /// Plane the change was reported on
        signal: SignalMask,
    },

    /// Hardware confirmed an output plane was cleared
    RouteCleared {
        /// Output card number
        output: u32,
        /// Plane the change was reported on
        signal: SignalMask,
    },
}

impl MatrixEvent {
    /// Output card number the event refers to
    pub fn output(&self) -> u32 {
        match self {
            MatrixEvent::RouteChanged { output, .. } | MatrixEvent::RouteCleared { output, .. } => {
                *output
            }
        }
    }
}

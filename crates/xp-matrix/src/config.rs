//! Matrix controller configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Configuration handed to the controller at construction
///
/// Loading and validation of the surrounding device file is the caller's
/// concern; this struct only carries what the routing core consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Names written to input cards at activation, keyed by card number
    pub input_names: HashMap<u32, String>,
    /// Names written to output cards at activation, keyed by card number
    pub output_names: HashMap<u32, String>,
    /// Text reported by route-name feedbacks when an output has no source
    pub no_route_text: String,
    /// Delay before a queued route-off actually clears, in milliseconds
    pub route_off_delay_ms: u64,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            input_names: HashMap::new(),
            output_names: HashMap::new(),
            no_route_text: String::new(),
            route_off_delay_ms: 500,
        }
    }
}

//! Volume sub-controller for audio outputs
//!
//! Line-level outputs carry a volume stage the routing core does not own.
//! The builder attaches one of these per qualifying output; the event
//! dispatcher delegates volume change notifications to it.

use std::sync::Arc;

use tracing::debug;
use xp_chassis::OutputCard;

use crate::error::MatrixError;
use crate::feedback::IntFeedback;

/// Level control and feedback for one audio output
pub struct AudioOutputController {
    key: String,
    card: Arc<dyn OutputCard>,
    level: Arc<IntFeedback>,
}

impl AudioOutputController {
    pub(crate) fn new(key: String, card: Arc<dyn OutputCard>) -> Self {
        let reader = card.clone();
        let level = Arc::new(IntFeedback::new(move || reader.volume().unwrap_or(0)));
        Self { key, card, level }
    }

    /// Unique key of this controller
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Output card number this controller drives
    pub fn output_number(&self) -> u32 {
        self.card.number()
    }

    /// Current level feedback; fired when the hardware reports a change
    pub fn level_feedback(&self) -> &Arc<IntFeedback> {
        &self.level
    }

    /// Write a new level to the hardware
    ///
    /// The feedback fires when the hardware confirms the change, not here.
    pub fn set_level(&self, level: u32) -> Result<(), MatrixError> {
        debug!("{}: set level {}", self.key, level);
        self.card.set_volume(level)?;
        Ok(())
    }

    /// Called by the dispatcher when the chassis reports a volume change
    pub fn volume_event_from_chassis(&self) {
        self.level.fire_update();
    }
}

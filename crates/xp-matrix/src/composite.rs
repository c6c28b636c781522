//! Sub-controller for composite input cards
//!
//! Combo cards expose more than one logical signal form behind a single
//! backplane port. Which form feeds the backplane is selected here, not by
//! the routing matrix.

use std::sync::Arc;

use tracing::debug;
use xp_chassis::InputCard;

use crate::error::MatrixError;
use crate::feedback::IntFeedback;

/// Source-form selection for one composite input card
pub struct CompositeInputController {
    key: String,
    card: Arc<dyn InputCard>,
    source: Arc<IntFeedback>,
}

impl CompositeInputController {
    pub(crate) fn new(key: String, card: Arc<dyn InputCard>) -> Self {
        let reader = card.clone();
        let source = Arc::new(IntFeedback::new(move || {
            reader.active_source().unwrap_or(0)
        }));
        Self { key, card, source }
    }

    /// Unique key of this controller
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Input card number this controller drives
    pub fn input_number(&self) -> u32 {
        self.card.number()
    }

    /// Active-source feedback
    pub fn source_feedback(&self) -> &Arc<IntFeedback> {
        &self.source
    }

    /// Select which signal form feeds the backplane
    pub fn select_source(&self, source: u32) -> Result<(), MatrixError> {
        debug!("{}: select source {}", self.key, source);
        self.card.set_active_source(source)?;
        self.source.fire_update();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xp_chassis::{CardError, Chassis, InputCardKind};
    use xp_sim::VirtualChassis;

    #[test]
    fn test_select_source_updates_feedback() {
        let mut chassis = VirtualChassis::new();
        chassis.add_input(2, InputCardKind::HdmiVgaCombo, "Combo");
        let card = chassis.input_card(2).unwrap();

        let controller = CompositeInputController::new("matrix-input2-composite".to_string(), card);
        assert_eq!(controller.source_feedback().value(), 0);

        controller.select_source(1).unwrap();
        assert_eq!(controller.source_feedback().value(), 1);
    }

    #[test]
    fn test_select_source_propagates_unsupported() {
        let mut chassis = VirtualChassis::new();
        chassis.add_input(1, InputCardKind::Hdmi, "Plain");
        let card = chassis.input_card(1).unwrap();

        let controller = CompositeInputController::new("matrix-input1-composite".to_string(), card);
        let result = controller.select_source(1);
        assert!(matches!(
            result,
            Err(MatrixError::Card(CardError::Unsupported(_)))
        ));
    }
}

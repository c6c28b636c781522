//! Simulated switching chassis

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use xp_chassis::{
    AudioRouteMode, Chassis, InputCard, InputCardKind, InputChange, OutputCard, OutputCardKind,
    OutputChange,
};

use crate::cards::{VirtualInputCard, VirtualOutputCard};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Configuration for one simulated input card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualInputCardConfig {
    /// 1-based slot number
    pub number: u32,
    /// Card kind
    pub kind: InputCardKind,
    /// Initial name string
    pub name: String,
}

/// Configuration for one simulated output card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualOutputCardConfig {
    /// 1-based slot number
    pub number: u32,
    /// Card kind
    pub kind: OutputCardKind,
    /// Initial name string
    pub name: String,
    /// Audio route capability variant
    #[serde(default)]
    pub audio_route_mode: AudioRouteMode,
}

/// Configuration for a full simulated chassis
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VirtualChassisConfig {
    /// Input cards to install
    pub inputs: Vec<VirtualInputCardConfig>,
    /// Output cards to install
    pub outputs: Vec<VirtualOutputCardConfig>,
}

/// A simulated chassis with virtual cards and live change feeds
pub struct VirtualChassis {
    inputs: BTreeMap<u32, Arc<VirtualInputCard>>,
    outputs: BTreeMap<u32, Arc<VirtualOutputCard>>,
    input_count: u32,
    output_count: u32,
    input_events: broadcast::Sender<InputChange>,
    output_events: broadcast::Sender<OutputChange>,
}

impl VirtualChassis {
    /// Create an empty chassis
    pub fn new() -> Self {
        let (input_events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (output_events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            input_count: 0,
            output_count: 0,
            input_events,
            output_events,
        }
    }

    /// Build a chassis from configuration
    pub fn from_config(config: VirtualChassisConfig) -> Self {
        let mut chassis = Self::new();
        for input in config.inputs {
            chassis.add_input(input.number, input.kind, &input.name);
        }
        for output in config.outputs {
            chassis.add_output_with_mode(
                output.number,
                output.kind,
                &output.name,
                output.audio_route_mode,
            );
        }
        chassis
    }

    /// Install an input card; the addressable input range grows to cover it
    pub fn add_input(
        &mut self,
        number: u32,
        kind: InputCardKind,
        name: &str,
    ) -> Arc<VirtualInputCard> {
        let card = Arc::new(VirtualInputCard::new(
            number,
            kind,
            name.to_string(),
            self.input_events.clone(),
        ));
        debug!("installing virtual input {} ({:?})", number, kind);
        self.inputs.insert(number, card.clone());
        self.input_count = self.input_count.max(number);
        card
    }

    /// Install an output card with the default routed-input audio mode
    pub fn add_output(
        &mut self,
        number: u32,
        kind: OutputCardKind,
        name: &str,
    ) -> Arc<VirtualOutputCard> {
        self.add_output_with_mode(number, kind, name, AudioRouteMode::RoutedInput)
    }

    /// Install an output card with an explicit audio route capability
    pub fn add_output_with_mode(
        &mut self,
        number: u32,
        kind: OutputCardKind,
        name: &str,
        mode: AudioRouteMode,
    ) -> Arc<VirtualOutputCard> {
        let card = Arc::new(VirtualOutputCard::new(
            number,
            kind,
            name.to_string(),
            mode,
            self.output_events.clone(),
        ));
        debug!("installing virtual output {} ({:?}, {:?})", number, kind, mode);
        self.outputs.insert(number, card.clone());
        self.output_count = self.output_count.max(number);
        card
    }

    /// Concrete handle for a virtual input card (test control surface)
    pub fn virtual_input(&self, number: u32) -> Option<Arc<VirtualInputCard>> {
        self.inputs.get(&number).cloned()
    }

    /// Concrete handle for a virtual output card (test control surface)
    pub fn virtual_output(&self, number: u32) -> Option<Arc<VirtualOutputCard>> {
        self.outputs.get(&number).cloned()
    }

    /// Inject a raw input change event, bypassing any card
    pub fn emit_input_change(&self, change: InputChange) {
        let _ = self.input_events.send(change);
    }

    /// Inject a raw output change event, bypassing any card
    pub fn emit_output_change(&self, change: OutputChange) {
        let _ = self.output_events.send(change);
    }
}

impl Default for VirtualChassis {
    fn default() -> Self {
        Self::new()
    }
}

impl Chassis for VirtualChassis {
    fn input_count(&self) -> u32 {
        self.input_count
    }

    fn output_count(&self) -> u32 {
        self.output_count
    }

    fn input_card(&self, number: u32) -> Option<Arc<dyn InputCard>> {
        self.inputs
            .get(&number)
            .map(|card| card.clone() as Arc<dyn InputCard>)
    }

    fn output_card(&self, number: u32) -> Option<Arc<dyn OutputCard>> {
        self.outputs
            .get(&number)
            .map(|card| card.clone() as Arc<dyn OutputCard>)
    }

    fn input_cards(&self) -> Vec<Arc<dyn InputCard>> {
        self.inputs
            .values()
            .map(|card| card.clone() as Arc<dyn InputCard>)
            .collect()
    }

    fn output_cards(&self) -> Vec<Arc<dyn OutputCard>> {
        self.outputs
            .values()
            .map(|card| card.clone() as Arc<dyn OutputCard>)
            .collect()
    }

    fn subscribe_input_changes(&self) -> broadcast::Receiver<InputChange> {
        self.input_events.subscribe()
    }

    fn subscribe_output_changes(&self) -> broadcast::Receiver<OutputChange> {
        self.output_events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xp_chassis::{InputEventKind, OutputEventKind};

    #[test]
    fn test_counts_track_highest_slot() {
        let mut chassis = VirtualChassis::new();
        chassis.add_input(1, InputCardKind::Hdmi, "In 1");
        chassis.add_input(4, InputCardKind::HdBaseT, "In 4");
        chassis.add_output(2, OutputCardKind::Hdmi, "Out 2");

        assert_eq!(chassis.input_count(), 4);
        assert_eq!(chassis.output_count(), 2);
        assert!(chassis.input_card(1).is_some());
        assert!(chassis.input_card(3).is_none());
    }

    #[test]
    fn test_card_writes_reach_subscribers() {
        let mut chassis = VirtualChassis::new();
        let input = chassis.add_input(2, InputCardKind::Hdmi, "In 2");
        let mut rx = chassis.subscribe_input_changes();

        input.set_video_sync(true);

        let change = rx.try_recv().unwrap();
        assert_eq!(change.input, 2);
        assert_eq!(change.kind, InputEventKind::VideoSync);
    }

    #[test]
    fn test_event_injection() {
        let chassis = VirtualChassis::new();
        let mut rx = chassis.subscribe_output_changes();

        chassis.emit_output_change(OutputChange {
            output: 9,
            kind: OutputEventKind::Resolution,
        });

        let change = rx.try_recv().unwrap();
        assert_eq!(change.output, 9);
        assert_eq!(change.kind, OutputEventKind::Resolution);
    }

    #[test]
    fn test_from_config_round_trip() {
        let config = VirtualChassisConfig {
            inputs: vec![VirtualInputCardConfig {
                number: 1,
                kind: InputCardKind::Hdmi,
                name: "Laptop".to_string(),
            }],
            outputs: vec![VirtualOutputCardConfig {
                number: 1,
                kind: OutputCardKind::Hdmi,
                name: "Display".to_string(),
                audio_route_mode: AudioRouteMode::SourceSelect,
            }],
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: VirtualChassisConfig = serde_json::from_str(&json).unwrap();
        let chassis = VirtualChassis::from_config(parsed);

        assert_eq!(chassis.input_count(), 1);
        let out = chassis.output_card(1).unwrap();
        assert_eq!(out.audio_route_mode(), AudioRouteMode::SourceSelect);
        assert_eq!(out.name(), "Display");
    }
}

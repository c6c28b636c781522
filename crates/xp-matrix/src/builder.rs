//! Card-to-port builder
//!
//! Translates installed hardware cards into routable ports, feedback
//! entries, and auxiliary sub-controllers. Dispatch is an exhaustive match
//! over the card kind: a new kind cannot compile without a routing rule,
//! and kinds that deliberately have none fall through to a logged skip.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};
use xp_chassis::{
    AudioRouteMode, Chassis, InputCard, InputCardKind, OutputCard, OutputCardKind, SignalMask,
};

use crate::composite::CompositeInputController;
use crate::config::MatrixConfig;
use crate::error::MatrixError;
use crate::feedback::{BoolFeedback, FeedbackTables, IntFeedback, StringFeedback};
use crate::ports::{ConnectionKind, InputPort, OutputPort, PortCollection};
use crate::volume::AudioOutputController;

/// Everything derived from one pass over the chassis' card collections
pub(crate) struct ChassisBindings {
    pub input_ports: PortCollection<InputPort>,
    pub output_ports: PortCollection<OutputPort>,
    pub feedbacks: FeedbackTables,
    pub volume_controls: HashMap<u32, Arc<AudioOutputController>>,
    pub composite_inputs: HashMap<u32, Arc<CompositeInputController>>,
}

/// Build the ports for one input card
///
/// Unrecognized kinds produce zero ports and a diagnostic; the device keeps
/// operating with whatever ports are recognized.
pub fn build_input_ports(device_key: &str, card: &Arc<dyn InputCard>) -> Vec<InputPort> {
    let number = card.number();
    match card.kind() {
        InputCardKind::Hdmi => vec![input_port(
            device_key,
            card,
            "hdmi",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::Hdmi,
        )
        .with_control(card.control_channel())],
        InputCardKind::HdmiAnalogAudio => vec![
            input_port(
                device_key,
                card,
                "hdmi",
                SignalMask::AUDIO_VIDEO,
                ConnectionKind::Hdmi,
            )
            .with_control(card.control_channel()),
            input_port(
                device_key,
                card,
                "analog-audio",
                SignalMask::AUDIO,
                ConnectionKind::LineAudio,
            ),
        ],
        InputCardKind::HdmiVgaCombo => vec![input_port(
            device_key,
            card,
            "combo",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::BackplaneOnly,
        )],
        InputCardKind::HdmiVgaBncCombo => vec![input_port(
            device_key,
            card,
            "combo",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::BackplaneOnly,
        )],
        InputCardKind::HdBaseT => vec![input_port(
            device_key,
            card,
            "hdbaset",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::HdBaseT,
        )
        .with_control(card.control_channel())],
        InputCardKind::MediaStream => vec![input_port(
            device_key,
            card,
            "stream",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::Streaming,
        )],
        InputCardKind::Expansion => {
            warn!(
                "input card {} has no routing rule (kind {:?}), skipping",
                number,
                card.kind()
            );
            Vec::new()
        }
    }
}

/// Build the ports for one output card
pub fn build_output_ports(device_key: &str, card: &Arc<dyn OutputCard>) -> Vec<OutputPort> {
    let number = card.number();
    match card.kind() {
        OutputCardKind::Hdmi => vec![output_port(
            device_key,
            card,
            "hdmi",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::Hdmi,
        )
        .with_control(card.control_channel())],
        OutputCardKind::HdBaseT => vec![output_port(
            device_key,
            card,
            "hdbaset",
            SignalMask::AUDIO_VIDEO,
            ConnectionKind::HdBaseT,
        )],
        OutputCardKind::ProgramAudio => vec![audio_port(device_key, card, "program")],
        OutputCardKind::AuxAudio1 => vec![audio_port(device_key, card, "aux1")],
        OutputCardKind::AuxAudio2 => vec![audio_port(device_key, card, "aux2")],
        OutputCardKind::CodecAudio1 => vec![audio_port(device_key, card, "codec1")],
        OutputCardKind::CodecAudio2 => vec![audio_port(device_key, card, "codec2")],
        OutputCardKind::DialerAudio => vec![audio_port(device_key, card, "dialer")],
        OutputCardKind::MixAudio1 => vec![audio_port(device_key, card, "mix1")],
        OutputCardKind::MixAudio2 => vec![audio_port(device_key, card, "mix2")],
        OutputCardKind::AecAudio => vec![audio_port(device_key, card, "aec")],
        OutputCardKind::Expansion => {
            warn!(
                "output card {} has no routing rule (kind {:?}), skipping",
                number,
                card.kind()
            );
            Vec::new()
        }
    }
}

fn input_port(
    device_key: &str,
    card: &Arc<dyn InputCard>,
    suffix: &str,
    signal: SignalMask,
    connection: ConnectionKind,
) -> InputPort {
    let key = format!("input-{}-{}", card.number(), suffix);
    debug!("adding input port '{}'", key);
    InputPort::new(key, signal, connection, device_key, card.clone())
}

fn output_port(
    device_key: &str,
    card: &Arc<dyn OutputCard>,
    suffix: &str,
    signal: SignalMask,
    connection: ConnectionKind,
) -> OutputPort {
    let key = format!("output-{}-{}", card.number(), suffix);
    debug!("adding output port '{}'", key);
    OutputPort::new(key, signal, connection, device_key, card.clone())
}

fn audio_port(device_key: &str, card: &Arc<dyn OutputCard>, suffix: &str) -> OutputPort {
    output_port(
        device_key,
        card,
        suffix,
        SignalMask::AUDIO,
        ConnectionKind::LineAudio,
    )
}

fn source_name(chassis: &Arc<dyn Chassis>, no_route: &str, number: u32) -> String {
    if number == 0 {
        return no_route.to_string();
    }
    chassis
        .input_card(number)
        .map(|card| card.name())
        .unwrap_or_else(|| no_route.to_string())
}

/// Walk the chassis once: ports, feedback entries, and sub-controllers
pub(crate) fn bind_chassis(
    device_key: &str,
    chassis: &Arc<dyn Chassis>,
    config: &MatrixConfig,
) -> Result<ChassisBindings, MatrixError> {
    let mut bindings = ChassisBindings {
        input_ports: PortCollection::new(),
        output_ports: PortCollection::new(),
        feedbacks: FeedbackTables::default(),
        volume_controls: HashMap::new(),
        composite_inputs: HashMap::new(),
    };

    for card in chassis.input_cards() {
        let number = card.number();
        debug!("binding input card {} ({:?})", number, card.kind());

        let reader = card.clone();
        bindings
            .feedbacks
            .input_online
            .insert(number, Arc::new(BoolFeedback::new(move || reader.online())));

        let reader = card.clone();
        bindings.feedbacks.video_sync.insert(
            number,
            Arc::new(BoolFeedback::new(move || reader.video_sync())),
        );

        let reader = card.clone();
        bindings
            .feedbacks
            .input_names
            .insert(number, Arc::new(StringFeedback::new(move || reader.name())));

        if matches!(
            card.kind(),
            InputCardKind::HdmiVgaCombo | InputCardKind::HdmiVgaBncCombo
        ) {
            let key = format!("{}-input{}-composite", device_key, number);
            bindings.composite_inputs.insert(
                number,
                Arc::new(CompositeInputController::new(key, card.clone())),
            );
        }

        for port in build_input_ports(device_key, &card) {
            bindings.input_ports.add(port)?;
        }
    }

    for card in chassis.output_cards() {
        let number = card.number();
        debug!("binding output card {} ({:?})", number, card.kind());

        let reader = card.clone();
        bindings.feedbacks.video_routes.insert(
            number,
            Arc::new(IntFeedback::new(move || {
                reader.video_route().unwrap_or(0)
            })),
        );

        let audio_feedback: Arc<IntFeedback> = match card.audio_route_mode() {
            AudioRouteMode::RoutedInput => {
                let reader = card.clone();
                Arc::new(IntFeedback::new(move || {
                    reader.audio_route().ok().flatten().unwrap_or(0)
                }))
            }
            AudioRouteMode::SourceSelect => {
                let reader = card.clone();
                Arc::new(IntFeedback::new(move || reader.audio_source().unwrap_or(0)))
            }
        };
        bindings.feedbacks.audio_routes.insert(number, audio_feedback);

        let reader = card.clone();
        bindings
            .feedbacks
            .output_online
            .insert(number, Arc::new(BoolFeedback::new(move || reader.online())));

        let reader = card.clone();
        bindings
            .feedbacks
            .output_names
            .insert(number, Arc::new(StringFeedback::new(move || reader.name())));

        let reader = card.clone();
        let lookup = Arc::clone(chassis);
        let no_route = config.no_route_text.clone();
        bindings.feedbacks.output_video_route_names.insert(
            number,
            Arc::new(StringFeedback::new(move || {
                source_name(&lookup, &no_route, reader.video_route().unwrap_or(0))
            })),
        );

        let mode = card.audio_route_mode();
        let reader = card.clone();
        let lookup = Arc::clone(chassis);
        let no_route = config.no_route_text.clone();
        bindings.feedbacks.output_audio_route_names.insert(
            number,
            Arc::new(StringFeedback::new(move || {
                let routed = match mode {
                    AudioRouteMode::RoutedInput => reader.audio_route().ok().flatten().unwrap_or(0),
                    AudioRouteMode::SourceSelect => reader.audio_source().unwrap_or(0),
                };
                source_name(&lookup, &no_route, routed)
            })),
        );

        if matches!(
            card.kind(),
            OutputCardKind::ProgramAudio | OutputCardKind::AuxAudio1 | OutputCardKind::AuxAudio2
        ) {
            let key = format!("{}-output{}-volume", device_key, number);
            bindings.volume_controls.insert(
                number,
                Arc::new(AudioOutputController::new(key, card.clone())),
            );
        }

        for port in build_output_ports(device_key, &card) {
            bindings.output_ports.add(port)?;
        }
    }

    Ok(bindings)
}

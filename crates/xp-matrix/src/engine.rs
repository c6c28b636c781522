//! Matrix controller and switch executor
//!
//! The controller owns no route state of its own: current routes live in
//! the hardware and are observed through feedback entries. The only owned
//! mutable state is the pending route-off table, which defers disconnects
//! so that a rapid follow-up route wins over a queued clear.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use xp_chassis::{AudioRouteMode, CardError, Chassis, SignalMask};

use crate::builder::bind_chassis;
use crate::composite::CompositeInputController;
use crate::config::MatrixConfig;
use crate::dispatcher::{self, DispatcherHandle};
use crate::error::MatrixError;
use crate::events::MatrixEvent;
use crate::feedback::FeedbackTables;
use crate::ports::{InputPort, OutputPort, PortCollection};
use crate::volume::AudioOutputController;

/// Extra audio-only source numbers addressable beyond the video-capable
/// input range (virtual mix and return sources on the audio plane)
pub const AUDIO_SOURCE_EXTRA: u32 = 5;

const EVENT_CHANNEL_CAPACITY: usize = 256;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// A route endpoint selector as received from the calling convention
///
/// Bridges hand selectors over as text or numbers; both coerce to a card
/// number before any validation happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Already-numeric selector
    Number(u32),
    /// Textual selector, parsed on use
    Text(String),
}

impl Selector {
    fn coerce(&self) -> Result<u32, MatrixError> {
        match self {
            Selector::Number(n) => Ok(*n),
            Selector::Text(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| MatrixError::BadSelector(s.clone())),
        }
    }
}

impl From<u32> for Selector {
    fn from(n: u32) -> Self {
        Selector::Number(n)
    }
}

impl From<u16> for Selector {
    fn from(n: u16) -> Self {
        Selector::Number(u32::from(n))
    }
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        Selector::Text(s.to_string())
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::Text(s)
    }
}

/// Key of one deferred disconnect: the output and the exact plane set the
/// disconnect was requested with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteOffKey {
    /// Output card number
    pub output: u32,
    /// Planes the clear applies to
    pub signal: SignalMask,
}

struct PendingRouteOff {
    seq: u64,
    task: JoinHandle<()>,
}

pub(crate) struct ControllerInner {
    pub(crate) key: String,
    name: String,
    pub(crate) chassis: Arc<dyn Chassis>,
    config: MatrixConfig,
    route_off_delay: Duration,
    input_ports: PortCollection<InputPort>,
    output_ports: PortCollection<OutputPort>,
    pub(crate) feedbacks: FeedbackTables,
    pub(crate) volume_controls: HashMap<u32, Arc<AudioOutputController>>,
    composite_inputs: HashMap<u32, Arc<CompositeInputController>>,
    pending_off: Mutex<HashMap<RouteOffKey, PendingRouteOff>>,
    off_seq: AtomicU64,
    pub(crate) events: broadcast::Sender<MatrixEvent>,
}

/// Routing matrix controller for one switching chassis
///
/// Cheap to clone into tasks; all clones share the same device state.
#[derive(Clone)]
pub struct MatrixController {
    inner: Arc<ControllerInner>,
}

impl MatrixController {
    /// Build a controller over a chassis, enumerating cards into ports,
    /// feedback entries, and sub-controllers
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        chassis: Arc<dyn Chassis>,
        config: MatrixConfig,
    ) -> Result<Self, MatrixError> {
        let key = key.into();
        let name = name.into();

        info!(
            "{}: {} inputs, {} outputs addressable",
            key,
            chassis.input_count(),
            chassis.output_count()
        );

        let bindings = bind_chassis(&key, &chassis, &config)?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let route_off_delay = Duration::from_millis(config.route_off_delay_ms);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                key,
                name,
                chassis,
                config,
                route_off_delay,
                input_ports: bindings.input_ports,
                output_ports: bindings.output_ports,
                feedbacks: bindings.feedbacks,
                volume_controls: bindings.volume_controls,
                composite_inputs: bindings.composite_inputs,
                pending_off: Mutex::new(HashMap::new()),
                off_seq: AtomicU64::new(0),
                events,
            }),
        })
    }

    /// Device key
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Device display name
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Routable source endpoints
    pub fn input_ports(&self) -> &PortCollection<InputPort> {
        &self.inner.input_ports
    }

    /// Routable destination endpoints
    pub fn output_ports(&self) -> &PortCollection<OutputPort> {
        &self.inner.output_ports
    }

    /// Feedback entries keyed by card number
    pub fn feedbacks(&self) -> &FeedbackTables {
        &self.inner.feedbacks
    }

    /// Volume sub-controller for an output, if one was attached
    pub fn volume_control(&self, output: u32) -> Option<Arc<AudioOutputController>> {
        self.inner.volume_controls.get(&output).cloned()
    }

    /// Composite-source sub-controller for an input, if one was attached
    pub fn composite_input(&self, input: u32) -> Option<Arc<CompositeInputController>> {
        self.inner.composite_inputs.get(&input).cloned()
    }

    /// Register for the unified route-change event stream
    pub fn subscribe_events(&self) -> broadcast::Receiver<MatrixEvent> {
        self.inner.events.subscribe()
    }

    /// Activation phase: write configured names to the hardware, subscribe
    /// to both change feeds, and start the event dispatcher
    ///
    /// Call once per device. The returned handle deregisters the
    /// subscriptions when shut down or dropped.
    pub fn activate(&self) -> DispatcherHandle {
        self.inner.set_input_names();
        self.inner.set_output_names();
        dispatcher::spawn(self.inner.clone())
    }

    /// Route `input` to `output` on every plane named in `signal`
    ///
    /// Input 0 means disconnect; the clear is deferred by the route-off
    /// delay and cancelled wholesale by a later non-zero request for the
    /// same (output, signal) key. Failures are reported once and never
    /// panic; planes are physically independent, so a failed plane does
    /// not roll back the others.
    pub fn execute_switch(
        &self,
        input: impl Into<Selector>,
        output: impl Into<Selector>,
        signal: SignalMask,
    ) -> Result<(), MatrixError> {
        ControllerInner::execute_switch(&self.inner, input.into(), output.into(), signal)
    }

    /// Fixed-width numeric entry point; forwards to [`execute_switch`]
    ///
    /// [`execute_switch`]: MatrixController::execute_switch
    pub fn execute_numeric_switch(
        &self,
        input: u16,
        output: u16,
        signal: SignalMask,
    ) -> Result<(), MatrixError> {
        self.execute_switch(input, output, signal)
    }

    /// Number of disconnects currently queued
    pub fn pending_route_off_count(&self) -> usize {
        lock(&self.inner.pending_off).len()
    }

    /// True when a disconnect is queued for this exact (output, signal) key
    pub fn has_pending_route_off(&self, output: u32, signal: SignalMask) -> bool {
        lock(&self.inner.pending_off).contains_key(&RouteOffKey { output, signal })
    }
}

impl ControllerInner {
    fn set_input_names(&self) {
        for (number, name) in &self.config.input_names {
            match self.chassis.input_card(*number) {
                Some(card) => {
                    if let Err(e) = card.set_name(name) {
                        warn!("{}: cannot name input {}: {}", self.key, number, e);
                    }
                }
                None => warn!("{}: no input card {} to name", self.key, number),
            }
        }
    }

    fn set_output_names(&self) {
        for (number, name) in &self.config.output_names {
            match self.chassis.output_card(*number) {
                Some(card) => {
                    if let Err(e) = card.set_name(name) {
                        warn!("{}: cannot name output {}: {}", self.key, number, e);
                    }
                }
                None => warn!("{}: no output card {} to name", self.key, number),
            }
        }
    }

    fn execute_switch(
        inner: &Arc<Self>,
        input: Selector,
        output: Selector,
        signal: SignalMask,
    ) -> Result<(), MatrixError> {
        debug!(
            "{}: switch request {:?} -> {:?} ({})",
            inner.key, input, output, signal
        );

        let input = match input.coerce() {
            Ok(n) => n,
            Err(e) => {
                warn!("{}: {}", inner.key, e);
                return Err(e);
            }
        };
        let output = match output.coerce() {
            Ok(n) => n,
            Err(e) => {
                warn!("{}: {}", inner.key, e);
                return Err(e);
            }
        };

        let input_count = inner.chassis.input_count();
        let output_count = inner.chassis.output_count();
        let usb_or_video = signal
            .intersects(SignalMask::VIDEO | SignalMask::USB_INPUT | SignalMask::USB_OUTPUT);
        let audio = signal.contains(SignalMask::AUDIO);

        // The audio plane alone addresses virtual sources beyond the
        // video-capable input set.
        let input_ok = (usb_or_video && input <= input_count)
            || (audio && input <= input_count + AUDIO_SOURCE_EXTRA);

        if output > output_count || !input_ok {
            let err = MatrixError::OutOfRange {
                input,
                output,
                signal,
            };
            warn!("{}: unable to execute route: {}", inner.key, err);
            return Err(err);
        }

        if output > 0 {
            let key = RouteOffKey { output, signal };
            if input == 0 {
                Self::start_off_timer(inner, key);
                return Ok(());
            }
            // A late-arriving real route always wins over a queued disconnect
            inner.cancel_off_timer(key);
        }

        inner.apply_route(input, output, signal)
    }

    /// Queue a deferred disconnect; at most one per key
    fn start_off_timer(inner: &Arc<Self>, key: RouteOffKey) {
        let mut pending = lock(&inner.pending_off);
        if pending.contains_key(&key) {
            return;
        }

        let seq = inner.off_seq.fetch_add(1, Ordering::Relaxed);
        let delay = inner.route_off_delay;
        let timer_inner = Arc::clone(inner);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Only proceed if this timer is still the registered one; a
            // cancel or replacement makes expiry a no-op.
            let still_pending = {
                let mut pending = lock(&timer_inner.pending_off);
                match pending.get(&key) {
                    Some(entry) if entry.seq == seq => {
                        pending.remove(&key);
                        true
                    }
                    _ => false,
                }
            };

            if still_pending {
                debug!(
                    "{}: route off expired for output {} ({})",
                    timer_inner.key, key.output, key.signal
                );
                if let Err(e) = timer_inner.apply_route(0, key.output, key.signal) {
                    warn!(
                        "{}: deferred route off failed for output {}: {}",
                        timer_inner.key, key.output, e
                    );
                }
            }
        });

        debug!(
            "{}: queued route off for output {} ({})",
            inner.key, key.output, key.signal
        );
        pending.insert(key, PendingRouteOff { seq, task });
    }

    /// Cancel a queued disconnect; cancelling an expired or absent timer is
    /// a no-op
    fn cancel_off_timer(&self, key: RouteOffKey) {
        if let Some(entry) = lock(&self.pending_off).remove(&key) {
            entry.task.abort();
            debug!(
                "{}: output {} cancelling route off, new source incoming",
                self.key, key.output
            );
        }
    }

    /// Per-plane dispatch against the hardware
    ///
    /// Each set bit is attempted independently; the first failure is
    /// reported after all planes were tried.
    fn apply_route(&self, input: u32, output: u32, signal: SignalMask) -> Result<(), MatrixError> {
        let output_card = if output == 0 {
            None
        } else {
            self.chassis.output_card(output)
        };
        let input_count = self.chassis.input_count();

        let mut first_err: Option<MatrixError> = None;
        let mut note = |plane: &str, result: Result<(), CardError>| {
            if let Err(e) = result {
                warn!(
                    "{}: {} route to output {} failed: {}",
                    self.key, plane, output, e
                );
                if first_err.is_none() {
                    first_err = Some(e.into());
                }
            }
        };

        if signal.contains(SignalMask::VIDEO) {
            if let Some(out) = &output_card {
                if input > input_count {
                    note("video", Err(CardError::NoSuchCard(input)));
                } else {
                    let route = if input == 0 { None } else { Some(input) };
                    note("video", out.set_video_route(route));
                }
            }
        }

        if signal.contains(SignalMask::AUDIO) {
            if let Some(out) = &output_card {
                let result = match out.audio_route_mode() {
                    AudioRouteMode::RoutedInput => {
                        // Virtual audio-only sources have no card reference
                        // on routed-input hardware
                        let route = if input == 0 || input > input_count {
                            None
                        } else {
                            Some(input)
                        };
                        out.set_audio_route(route)
                    }
                    AudioRouteMode::SourceSelect => out.set_audio_source(input),
                };
                note("audio", result);
            }
        }

        if signal.contains(SignalMask::USB_OUTPUT) {
            if let Some(out) = &output_card {
                if input > input_count {
                    note("usb output", Err(CardError::NoSuchCard(input)));
                } else {
                    let route = if input == 0 { None } else { Some(input) };
                    note("usb output", out.set_usb_route(route));
                }
            }
        }

        if signal.contains(SignalMask::USB_INPUT) && input > 0 {
            if input > input_count {
                note("usb input", Err(CardError::NoSuchCard(input)));
            } else if let Some(in_card) = self.chassis.input_card(input) {
                let route = if output == 0 { None } else { Some(output) };
                note("usb input", in_card.set_usb_route(route));
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                debug!(
                    "{}: routed input {} to output {} ({})",
                    self.key, input, output, signal
                );
                Ok(())
            }
        }
    }
}

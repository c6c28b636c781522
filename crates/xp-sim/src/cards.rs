//! Virtual card implementations
//!
//! Each write property stores the new value and echoes the matching change
//! event on the chassis feed, the same way real hardware confirms a write.
//! Feedback synchronization in the engine is driven entirely by that echo.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::broadcast;
use xp_chassis::{
    AudioRouteMode, CardError, ControlChannel, InputCard, InputCardKind, InputChange,
    InputEventKind, OutputCard, OutputCardKind, OutputChange, OutputEventKind,
};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Side-channel stub that records transmitted payloads
#[derive(Debug, Default)]
pub struct VirtualControlChannel {
    sent: Mutex<Vec<Vec<u8>>>,
}

impl VirtualControlChannel {
    /// Create an empty recording channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Payloads transmitted so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.sent).clone()
    }
}

impl ControlChannel for VirtualControlChannel {
    fn transmit(&self, payload: &[u8]) -> Result<(), CardError> {
        lock(&self.sent).push(payload.to_vec());
        Ok(())
    }
}

struct InputState {
    name: String,
    online: bool,
    video_sync: bool,
    usb_route: Option<u32>,
    active_source: u32,
    control: Option<Arc<dyn ControlChannel>>,
}

/// A simulated input card
pub struct VirtualInputCard {
    number: u32,
    kind: InputCardKind,
    state: Mutex<InputState>,
    events: broadcast::Sender<InputChange>,
}

impl VirtualInputCard {
    pub(crate) fn new(
        number: u32,
        kind: InputCardKind,
        name: String,
        events: broadcast::Sender<InputChange>,
    ) -> Self {
        Self {
            number,
            kind,
            state: Mutex::new(InputState {
                name,
                online: true,
                video_sync: false,
                usb_route: None,
                active_source: 0,
                control: None,
            }),
            events,
        }
    }

    fn emit(&self, kind: InputEventKind) {
        let _ = self.events.send(InputChange {
            input: self.number,
            kind,
        });
    }

    /// Attach a side-channel control capability (test control)
    pub fn set_control_channel(&self, control: Arc<dyn ControlChannel>) {
        lock(&self.state).control = Some(control);
    }

    /// Drive the endpoint online or offline (test control)
    pub fn set_online(&self, online: bool) {
        lock(&self.state).online = online;
        self.emit(InputEventKind::Online);
    }

    /// Drive video sync detection (test control)
    pub fn set_video_sync(&self, sync: bool) {
        lock(&self.state).video_sync = sync;
        self.emit(InputEventKind::VideoSync);
    }
}

impl InputCard for VirtualInputCard {
    fn number(&self) -> u32 {
        self.number
    }

    fn kind(&self) -> InputCardKind {
        self.kind
    }

    fn name(&self) -> String {
        lock(&self.state).name.clone()
    }

    fn set_name(&self, name: &str) -> Result<(), CardError> {
        lock(&self.state).name = name.to_string();
        self.emit(InputEventKind::Name);
        Ok(())
    }

    fn online(&self) -> bool {
        lock(&self.state).online
    }

    fn video_sync(&self) -> bool {
        lock(&self.state).video_sync
    }

    fn usb_route(&self) -> Result<Option<u32>, CardError> {
        Ok(lock(&self.state).usb_route)
    }

    fn set_usb_route(&self, output: Option<u32>) -> Result<(), CardError> {
        lock(&self.state).usb_route = output;
        self.emit(InputEventKind::UsbRoute);
        Ok(())
    }

    fn active_source(&self) -> Result<u32, CardError> {
        match self.kind {
            InputCardKind::HdmiVgaCombo | InputCardKind::HdmiVgaBncCombo => {
                Ok(lock(&self.state).active_source)
            }
            _ => Err(CardError::Unsupported("composite source")),
        }
    }

    fn set_active_source(&self, source: u32) -> Result<(), CardError> {
        match self.kind {
            InputCardKind::HdmiVgaCombo | InputCardKind::HdmiVgaBncCombo => {
                lock(&self.state).active_source = source;
                Ok(())
            }
            _ => Err(CardError::Unsupported("composite source")),
        }
    }

    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        lock(&self.state).control.clone()
    }
}

struct OutputState {
    name: String,
    online: bool,
    video_route: Option<u32>,
    audio_route: Option<u32>,
    audio_source: u32,
    usb_route: Option<u32>,
    volume: u32,
    fail_audio_route: bool,
    control: Option<Arc<dyn ControlChannel>>,
}

/// A simulated output card
pub struct VirtualOutputCard {
    number: u32,
    kind: OutputCardKind,
    audio_mode: AudioRouteMode,
    state: Mutex<OutputState>,
    events: broadcast::Sender<OutputChange>,
}

impl VirtualOutputCard {
    pub(crate) fn new(
        number: u32,
        kind: OutputCardKind,
        name: String,
        audio_mode: AudioRouteMode,
        events: broadcast::Sender<OutputChange>,
    ) -> Self {
        Self {
            number,
            kind,
            audio_mode,
            state: Mutex::new(OutputState {
                name,
                online: true,
                video_route: None,
                audio_route: None,
                audio_source: 0,
                usb_route: None,
                volume: 0,
                fail_audio_route: false,
                control: None,
            }),
            events,
        }
    }

    fn emit(&self, kind: OutputEventKind) {
        let _ = self.events.send(OutputChange {
            output: self.number,
            kind,
        });
    }

    /// Attach a side-channel control capability (test control)
    pub fn set_control_channel(&self, control: Arc<dyn ControlChannel>) {
        lock(&self.state).control = Some(control);
    }

    /// Drive the endpoint online or offline (test control)
    pub fn set_online(&self, online: bool) {
        lock(&self.state).online = online;
        self.emit(OutputEventKind::Online);
    }

    /// Make audio route writes fail with `CardError::Unsupported` (fault injection)
    pub fn set_fail_audio_route(&self, fail: bool) {
        lock(&self.state).fail_audio_route = fail;
    }
}

impl OutputCard for VirtualOutputCard {
    fn number(&self) -> u32 {
        self.number
    }

    fn kind(&self) -> OutputCardKind {
        self.kind
    }

    fn name(&self) -> String {
        lock(&self.state).name.clone()
    }

    fn set_name(&self, name: &str) -> Result<(), CardError> {
        lock(&self.state).name = name.to_string();
        self.emit(OutputEventKind::Name);
        Ok(())
    }

    fn online(&self) -> bool {
        lock(&self.state).online
    }

    fn audio_route_mode(&self) -> AudioRouteMode {
        self.audio_mode
    }

    fn video_route(&self) -> Option<u32> {
        lock(&self.state).video_route
    }

    fn set_video_route(&self, input: Option<u32>) -> Result<(), CardError> {
        lock(&self.state).video_route = input;
        self.emit(OutputEventKind::VideoRoute);
        Ok(())
    }

    fn audio_route(&self) -> Result<Option<u32>, CardError> {
        match self.audio_mode {
            AudioRouteMode::RoutedInput => Ok(lock(&self.state).audio_route),
            AudioRouteMode::SourceSelect => {
                Err(CardError::Unsupported("audio routed-input reference"))
            }
        }
    }

    fn set_audio_route(&self, input: Option<u32>) -> Result<(), CardError> {
        if self.audio_mode != AudioRouteMode::RoutedInput {
            return Err(CardError::Unsupported("audio routed-input reference"));
        }
        {
            let mut state = lock(&self.state);
            if state.fail_audio_route {
                return Err(CardError::Unsupported("audio routed-input reference"));
            }
            state.audio_route = input;
        }
        self.emit(OutputEventKind::AudioRoute);
        Ok(())
    }

    fn audio_source(&self) -> Result<u32, CardError> {
        match self.audio_mode {
            AudioRouteMode::SourceSelect => Ok(lock(&self.state).audio_source),
            AudioRouteMode::RoutedInput => Err(CardError::Unsupported("audio source selector")),
        }
    }

    fn set_audio_source(&self, source: u32) -> Result<(), CardError> {
        if self.audio_mode != AudioRouteMode::SourceSelect {
            return Err(CardError::Unsupported("audio source selector"));
        }
        lock(&self.state).audio_source = source;
        self.emit(OutputEventKind::AudioRoute);
        Ok(())
    }

    fn usb_route(&self) -> Result<Option<u32>, CardError> {
        Ok(lock(&self.state).usb_route)
    }

    fn set_usb_route(&self, input: Option<u32>) -> Result<(), CardError> {
        lock(&self.state).usb_route = input;
        self.emit(OutputEventKind::UsbRoute);
        Ok(())
    }

    fn volume(&self) -> Result<u32, CardError> {
        if !self.kind.is_audio_only() {
            return Err(CardError::Unsupported("volume"));
        }
        Ok(lock(&self.state).volume)
    }

    fn set_volume(&self, level: u32) -> Result<(), CardError> {
        if !self.kind.is_audio_only() {
            return Err(CardError::Unsupported("volume"));
        }
        lock(&self.state).volume = level;
        self.emit(OutputEventKind::Volume);
        Ok(())
    }

    fn control_channel(&self) -> Option<Arc<dyn ControlChannel>> {
        lock(&self.state).control.clone()
    }
}

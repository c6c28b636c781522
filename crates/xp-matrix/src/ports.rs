//! Port model
//!
//! Ports are the routable endpoints the bridge layer sees. They are built
//! once during card enumeration and never change afterwards: the key, the
//! signal mask, and the connection tag are fixed for the device's lifetime.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use xp_chassis::{ControlChannel, InputCard, OutputCard, SignalMask};

use crate::error::MatrixError;

/// Physical transport behind a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Direct digital connector
    Hdmi,
    /// Analog line-level audio
    LineAudio,
    /// Twisted-pair digital transport
    HdBaseT,
    /// Network streaming transport
    Streaming,
    /// Only reachable through the chassis backplane
    BackplaneOnly,
}

/// Common surface over input and output ports
pub trait RoutingPort {
    /// Unique key within the owning device's port collection
    fn key(&self) -> &str;

    /// Declared signal planes, fixed at creation
    fn signal(&self) -> SignalMask;

    /// Transport tag
    fn connection(&self) -> ConnectionKind;

    /// Card number the port lives on
    fn card_number(&self) -> u32;
}

/// One routable source endpoint
pub struct InputPort {
    key: String,
    signal: SignalMask,
    connection: ConnectionKind,
    device_key: String,
    control: Option<Arc<dyn ControlChannel>>,
    feedback_match: Arc<dyn InputCard>,
}

impl InputPort {
    /// Create a port backed by an input card
    pub fn new(
        key: impl Into<String>,
        signal: SignalMask,
        connection: ConnectionKind,
        device_key: impl Into<String>,
        card: Arc<dyn InputCard>,
    ) -> Self {
        Self {
            key: key.into(),
            signal,
            connection,
            device_key: device_key.into(),
            control: None,
            feedback_match: card,
        }
    }

    /// Attach an optional side-channel control capability
    pub fn with_control(mut self, control: Option<Arc<dyn ControlChannel>>) -> Self {
        self.control = control;
        self
    }

    /// Key of the owning device
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Side-channel control capability, if the transport carries one
    pub fn control_channel(&self) -> Option<&Arc<dyn ControlChannel>> {
        self.control.as_ref()
    }

    /// Card handle used by the reconciliation layer to identify the
    /// physical source currently active on an output
    pub fn feedback_match(&self) -> &Arc<dyn InputCard> {
        &self.feedback_match
    }
}

impl RoutingPort for InputPort {
    fn key(&self) -> &str {
        &self.key
    }

    fn signal(&self) -> SignalMask {
        self.signal
    }

    fn connection(&self) -> ConnectionKind {
        self.connection
    }

    fn card_number(&self) -> u32 {
        self.feedback_match.number()
    }
}

impl fmt::Debug for InputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputPort")
            .field("key", &self.key)
            .field("signal", &self.signal)
            .field("connection", &self.connection)
            .field("card_number", &self.card_number())
            .finish()
    }
}

/// One routable destination endpoint
pub struct OutputPort {
    key: String,
    signal: SignalMask,
    connection: ConnectionKind,
    device_key: String,
    control: Option<Arc<dyn ControlChannel>>,
    feedback_match: Arc<dyn OutputCard>,
}

impl OutputPort {
    /// Create a port backed by an output card
    pub fn new(
        key: impl Into<String>,
        signal: SignalMask,
        connection: ConnectionKind,
        device_key: impl Into<String>,
        card: Arc<dyn OutputCard>,
    ) -> Self {
        Self {
            key: key.into(),
            signal,
            connection,
            device_key: device_key.into(),
            control: None,
            feedback_match: card,
        }
    }

    /// Attach an optional side-channel control capability
    pub fn with_control(mut self, control: Option<Arc<dyn ControlChannel>>) -> Self {
        self.control = control;
        self
    }

    /// Key of the owning device
    pub fn device_key(&self) -> &str {
        &self.device_key
    }

    /// Side-channel control capability, if the transport carries one
    pub fn control_channel(&self) -> Option<&Arc<dyn ControlChannel>> {
        self.control.as_ref()
    }

    /// Card handle used by the reconciliation layer
    pub fn feedback_match(&self) -> &Arc<dyn OutputCard> {
        &self.feedback_match
    }
}

impl RoutingPort for OutputPort {
    fn key(&self) -> &str {
        &self.key
    }

    fn signal(&self) -> SignalMask {
        self.signal
    }

    fn connection(&self) -> ConnectionKind {
        self.connection
    }

    fn card_number(&self) -> u32 {
        self.feedback_match.number()
    }
}

impl fmt::Debug for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputPort")
            .field("key", &self.key)
            .field("signal", &self.signal)
            .field("connection", &self.connection)
            .field("card_number", &self.card_number())
            .finish()
    }
}

/// Ordered port collection with unique keys
#[derive(Debug)]
pub struct PortCollection<P> {
    ports: Vec<P>,
    index: HashMap<String, usize>,
}

impl<P: RoutingPort> PortCollection<P> {
    /// Create an empty collection
    pub fn new() -> Self {
        Self {
            ports: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a port, rejecting duplicate keys
    pub fn add(&mut self, port: P) -> Result<(), MatrixError> {
        let key = port.key().to_string();
        if self.index.contains_key(&key) {
            return Err(MatrixError::DuplicatePortKey(key));
        }
        self.index.insert(key, self.ports.len());
        self.ports.push(port);
        Ok(())
    }

    /// Look up a port by key
    pub fn get(&self, key: &str) -> Option<&P> {
        self.index.get(key).map(|&i| &self.ports[i])
    }

    /// Iterate ports in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &P> {
        self.ports.iter()
    }

    /// Number of ports
    pub fn len(&self) -> usize {
        self.ports.len()
    }

    /// True when no ports are registered
    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

impl<P: RoutingPort> Default for PortCollection<P> {
    fn default() -> Self {
        Self::new()
    }
}

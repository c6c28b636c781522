//! Change-notification events emitted by the chassis
//!
//! The hardware reports property changes per card on two feeds, one for
//! inputs and one for outputs. Event kinds are non-exhaustive on purpose:
//! newer hardware revisions report kinds this crate does not know about,
//! and consumers are expected to skip anything they do not recognize.

/// Kind of change reported for an input card
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventKind {
    /// Endpoint online/offline transition
    Online,
    /// Video sync detected or lost
    VideoSync,
    /// Name string changed
    Name,
    /// USB routing changed
    UsbRoute,
    /// HDCP negotiation state changed
    Hdcp,
}

/// Kind of change reported for an output card
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEventKind {
    /// Endpoint online/offline transition
    Online,
    /// Name string changed
    Name,
    /// Video route changed
    VideoRoute,
    /// Audio route changed (routed-input or source-selector hardware alike)
    AudioRoute,
    /// Volume level changed
    Volume,
    /// USB routing changed
    UsbRoute,
    /// Output resolution changed
    Resolution,
}

/// A change notification for one input card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputChange {
    /// Card number the event refers to
    pub input: u32,
    /// What changed
    pub kind: InputEventKind,
}

/// A change notification for one output card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputChange {
    /// Card number the event refers to
    pub output: u32,
    /// What changed
    pub kind: OutputEventKind,
}

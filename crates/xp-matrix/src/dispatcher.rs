//! Hardware event dispatcher
//!
//! Subscribes once to the chassis change feeds during activation and fires
//! only the feedback entries matching each event's card. Event kinds the
//! engine does not monitor are skipped silently; the hardware is free to
//! report kinds newer than this code.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{trace, warn};
use xp_chassis::{InputChange, InputEventKind, OutputChange, OutputEventKind, SignalMask};

use crate::engine::ControllerInner;
use crate::events::MatrixEvent;
use crate::feedback::Feedback;

/// Deregistration handle for the dispatcher tasks
///
/// Shutting down (or dropping) the handle unsubscribes the device from the
/// chassis feeds; feedback entries stop firing afterwards.
#[derive(Debug)]
pub struct DispatcherHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl DispatcherHandle {
    /// Stop both dispatcher tasks
    pub fn shutdown(self) {
        // Drop aborts the tasks
    }
}

impl Drop for DispatcherHandle {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

pub(crate) fn spawn(inner: Arc<ControllerInner>) -> DispatcherHandle {
    let mut input_rx = inner.chassis.subscribe_input_changes();
    let mut output_rx = inner.chassis.subscribe_output_changes();

    let input_task = tokio::spawn({
        let inner = inner.clone();
        async move {
            loop {
                match input_rx.recv().await {
                    Ok(change) => handle_input_change(&inner, change),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("{}: input change feed lagged by {} events", inner.key, missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });

    let output_task = tokio::spawn(async move {
        loop {
            match output_rx.recv().await {
                Ok(change) => handle_output_change(&inner, change),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        "{}: output change feed lagged by {} events",
                        inner.key, missed
                    );
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    DispatcherHandle {
        tasks: vec![input_task, output_task],
    }
}

fn fire<V: Clone + Default + Send>(table: &HashMap<u32, Arc<Feedback<V>>>, number: u32) {
    if let Some(feedback) = table.get(&number) {
        feedback.fire_update();
    } else {
        trace!("no feedback entry for card {}", number);
    }
}

fn handle_input_change(inner: &ControllerInner, change: InputChange) {
    trace!(
        "{}: input {} change {:?}",
        inner.key,
        change.input,
        change.kind
    );
    match change.kind {
        InputEventKind::Online => fire(&inner.feedbacks.input_online, change.input),
        InputEventKind::VideoSync => fire(&inner.feedbacks.video_sync, change.input),
        InputEventKind::Name => fire(&inner.feedbacks.input_names, change.input),
        other => trace!(
            "{}: ignoring input event {:?} for input {}",
            inner.key,
            other,
            change.input
        ),
    }
}

fn handle_output_change(inner: &ControllerInner, change: OutputChange) {
    trace!(
        "{}: output {} change {:?}",
        inner.key,
        change.output,
        change.kind
    );
    match change.kind {
        OutputEventKind::Online => fire(&inner.feedbacks.output_online, change.output),
        OutputEventKind::Name => fire(&inner.feedbacks.output_names, change.output),
        OutputEventKind::VideoRoute => {
            fire_route_change(inner, change.output, SignalMask::VIDEO);
        }
        OutputEventKind::AudioRoute => {
            fire_route_change(inner, change.output, SignalMask::AUDIO);
        }
        OutputEventKind::Volume => match inner.volume_controls.get(&change.output) {
            Some(control) => control.volume_event_from_chassis(),
            None => trace!(
                "{}: volume event for output {} with no volume control",
                inner.key,
                change.output
            ),
        },
        other => trace!(
            "{}: ignoring output event {:?} for output {}",
            inner.key,
            other,
            change.output
        ),
    }
}

/// Fire the route feedbacks for one plane of one output and re-broadcast
/// the hardware-confirmed state on the unified stream
fn fire_route_change(inner: &ControllerInner, output: u32, signal: SignalMask) {
    let (routes, names) = if signal == SignalMask::VIDEO {
        (
            &inner.feedbacks.video_routes,
            &inner.feedbacks.output_video_route_names,
        )
    } else {
        (
            &inner.feedbacks.audio_routes,
            &inner.feedbacks.output_audio_route_names,
        )
    };

    if let Some(feedback) = routes.get(&output) {
        feedback.fire_update();
        let input = feedback.value();
        let event = if input == 0 {
            MatrixEvent::RouteCleared { output, signal }
        } else {
            MatrixEvent::RouteChanged {
                output,
                input,
                signal,
            }
        };
        let _ = inner.events.send(event);
    } else {
        trace!("no route feedback for output {}", output);
    }

    fire(names, output);
}

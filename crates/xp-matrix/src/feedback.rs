//! Feedback cache
//!
//! A `Feedback` bridges pull-style hardware reads to push-style observers.
//! The value function reads live state; nothing is pushed until someone
//! fires the entry, and the cached value stays as last pushed until the
//! next fire. Deduplication is deliberately left to the sinks: a fire
//! always pushes, even when the value did not change.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

struct FeedbackState<V> {
    cached: V,
    sinks: Vec<Box<dyn Fn(&V) + Send + Sync>>,
}

/// A named observable value computed on demand and pushed to linked sinks
///
/// Each entry carries its own lock; firing one entry never contends with
/// unrelated entries. The value function runs outside the lock because it
/// may perform blocking hardware reads.
pub struct Feedback<V> {
    compute: Box<dyn Fn() -> V + Send + Sync>,
    state: Mutex<FeedbackState<V>>,
}

/// Numeric feedback (route numbers, volume levels)
pub type IntFeedback = Feedback<u32>;
/// Boolean feedback (online, sync detected)
pub type BoolFeedback = Feedback<bool>;
/// String feedback (names)
pub type StringFeedback = Feedback<String>;

impl<V: Clone + Default + Send> Feedback<V> {
    /// Create a feedback over a value function
    ///
    /// The function is expected to be side-effect free; it may block on
    /// hardware reads. The cache starts at the type's default value until
    /// the first fire.
    pub fn new(compute: impl Fn() -> V + Send + Sync + 'static) -> Self {
        Self {
            compute: Box::new(compute),
            state: Mutex::new(FeedbackState {
                cached: V::default(),
                sinks: Vec::new(),
            }),
        }
    }

    /// Recompute the value and push it to every linked sink
    ///
    /// Pushes even when the value is unchanged. Sinks run under this
    /// entry's lock and must not re-enter the same entry.
    pub fn fire_update(&self) {
        let value = (self.compute)();
        let mut state = lock(&self.state);
        state.cached = value.clone();
        for sink in &state.sinks {
            sink(&value);
        }
    }

    /// Last pushed value; stale until the next fire
    pub fn value(&self) -> V {
        lock(&self.state).cached.clone()
    }

    /// Link a sink that receives pushes from this point forward
    ///
    /// Past values are not replayed.
    pub fn link_sink(&self, sink: impl Fn(&V) + Send + Sync + 'static) {
        lock(&self.state).sinks.push(Box::new(sink));
    }
}

impl Feedback<bool> {
    /// Link a sink that receives the logical negation of each push
    ///
    /// Used for mutually-exclusive state indicators.
    pub fn link_complement_sink(&self, sink: impl Fn(bool) + Send + Sync + 'static) {
        self.link_sink(move |value| sink(!value));
    }
}

impl<V: fmt::Debug> fmt::Debug for Feedback<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Feedback")
            .field("cached", &state.cached)
            .field("sinks", &state.sinks.len())
            .finish()
    }
}

/// Feedback entries registered per card number at device construction
///
/// The maps themselves are immutable after construction; mutation happens
/// inside the individual entries.
#[derive(Debug, Default)]
pub struct FeedbackTables {
    /// Per-output video route number (0 when unrouted)
    pub video_routes: HashMap<u32, Arc<IntFeedback>>,
    /// Per-output audio route number (0 when unrouted)
    pub audio_routes: HashMap<u32, Arc<IntFeedback>>,
    /// Per-input video sync detected
    pub video_sync: HashMap<u32, Arc<BoolFeedback>>,
    /// Per-input endpoint online
    pub input_online: HashMap<u32, Arc<BoolFeedback>>,
    /// Per-output endpoint online
    pub output_online: HashMap<u32, Arc<BoolFeedback>>,
    /// Per-input name string
    pub input_names: HashMap<u32, Arc<StringFeedback>>,
    /// Per-output name string
    pub output_names: HashMap<u32, Arc<StringFeedback>>,
    /// Per-output name of the currently routed video source
    pub output_video_route_names: HashMap<u32, Arc<StringFeedback>>,
    /// Per-output name of the currently routed audio source
    pub output_audio_route_names: HashMap<u32, Arc<StringFeedback>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_fire_pushes_even_when_unchanged() {
        let feedback = IntFeedback::new(|| 7);
        let pushes = Arc::new(AtomicU32::new(0));

        let counter = pushes.clone();
        feedback.link_sink(move |value| {
            assert_eq!(*value, 7);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        feedback.fire_update();
        feedback.fire_update();

        assert_eq!(pushes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_value_is_stale_until_fired() {
        let source = Arc::new(AtomicU32::new(5));
        let reader = source.clone();
        let feedback = IntFeedback::new(move || reader.load(Ordering::SeqCst));

        assert_eq!(feedback.value(), 0);

        feedback.fire_update();
        assert_eq!(feedback.value(), 5);

        source.store(9, Ordering::SeqCst);
        assert_eq!(feedback.value(), 5);

        feedback.fire_update();
        assert_eq!(feedback.value(), 9);
    }

    #[test]
    fn test_no_replay_on_link() {
        let feedback = IntFeedback::new(|| 3);
        feedback.fire_update();

        let pushes = Arc::new(AtomicU32::new(0));
        let counter = pushes.clone();
        feedback.link_sink(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(pushes.load(Ordering::SeqCst), 0);

        feedback.fire_update();
        assert_eq!(pushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_complement_sink_negates() {
        let feedback = BoolFeedback::new(|| true);
        let direct = Arc::new(Mutex::new(None));
        let complement = Arc::new(Mutex::new(None));

        let d = direct.clone();
        feedback.link_sink(move |value| {
            *lock(&d) = Some(*value);
        });
        let c = complement.clone();
        feedback.link_complement_sink(move |value| {
            *lock(&c) = Some(value);
        });

        feedback.fire_update();

        assert_eq!(*lock(&direct), Some(true));
        assert_eq!(*lock(&complement), Some(false));
    }

    #[test]
    fn test_compute_called_exactly_once_per_fire() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let feedback = IntFeedback::new(move || counter.fetch_add(1, Ordering::SeqCst));

        feedback.link_sink(|_| {});
        feedback.link_sink(|_| {});
        feedback.fire_update();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

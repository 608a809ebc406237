//! Scroll-trigger sensor.
//!
//! Watches a sentinel placed after the last loaded item and asks for the next
//! page when it comes within a margin of the viewport. Geometry arrives as
//! events from whatever hosts the list; the sensor only decides whether an
//! event should fire.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use super::FeedController;

/// Scroll container that sensors register with.
///
/// Tracks the number of live registrations so hosts (and tests) can check
/// that torn-down sensors stop observing.
#[derive(Debug, Clone, Default)]
pub struct ViewportHost {
    observers: Arc<AtomicUsize>,
}

impl ViewportHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_observers(&self) -> usize {
        self.observers.load(Ordering::SeqCst)
    }

    fn register(&self) -> Registration {
        self.observers.fetch_add(1, Ordering::SeqCst);
        Registration {
            observers: Arc::clone(&self.observers),
        }
    }
}

struct Registration {
    observers: Arc<AtomicUsize>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.observers.fetch_sub(1, Ordering::SeqCst);
        debug!("sentinel observer released");
    }
}

/// Position of the sentinel relative to the viewport, in pixels along the
/// scroll axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelGeometry {
    /// Top edge of the sentinel
    pub sentinel_top: f64,
    /// Bottom edge of the visible area
    pub viewport_bottom: f64,
}

impl SentinelGeometry {
    /// Distance still to scroll before the sentinel becomes visible; zero or
    /// negative once it is on screen.
    pub fn distance(&self) -> f64 {
        self.sentinel_top - self.viewport_bottom
    }

    pub fn within(&self, margin: f64) -> bool {
        self.distance() <= margin
    }
}

/// Load state the sensor consults before firing.
pub trait LoadGate: Send + Sync {
    fn is_fetching(&self) -> bool;
    fn has_more(&self) -> bool;
}

/// Fires a callback when the sentinel nears the viewport, unless a load is
/// already running or there is nothing left to load.
///
/// Registered with its [`ViewportHost`] for as long as it lives; dropping
/// the sensor unregisters it.
pub struct ScrollSensor {
    margin: f64,
    gate: Arc<dyn LoadGate>,
    on_trigger: Box<dyn Fn() + Send + Sync>,
    fired: AtomicU64,
    _registration: Registration,
}

impl ScrollSensor {
    pub fn observe<F>(host: &ViewportHost, margin: f64, gate: Arc<dyn LoadGate>, on_trigger: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        debug!(margin, "sentinel observer registered");
        Self {
            margin,
            gate,
            on_trigger: Box::new(on_trigger),
            fired: AtomicU64::new(0),
            _registration: host.register(),
        }
    }

    /// Sensor that loads the next page of `feed` in the background.
    pub fn for_feed(host: &ViewportHost, feed: Arc<FeedController>, margin: f64) -> Self {
        let gate: Arc<dyn LoadGate> = feed.clone();
        Self::observe(host, margin, gate, move || {
            // A None here means the feed got busy between the check and the spawn.
            let _ = feed.spawn_load_more();
        })
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Number of times the callback has run.
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::SeqCst)
    }

    /// Handle one intersection event. Returns whether the callback ran.
    pub fn on_intersection(&self, geometry: SentinelGeometry) -> bool {
        if !geometry.within(self.margin) {
            trace!(distance = geometry.distance(), "sentinel out of range");
            return false;
        }
        if self.gate.is_fetching() || !self.gate.has_more() {
            trace!("sentinel in range but feed is busy or exhausted");
            return false;
        }
        debug!(distance = geometry.distance(), "sentinel triggered load");
        self.fired.fetch_add(1, Ordering::SeqCst);
        (self.on_trigger)();
        true
    }

    /// Consume geometry events until the sender side closes, then unregister.
    /// Returns how many events fired.
    pub async fn run(self, mut events: mpsc::Receiver<SentinelGeometry>) -> u64 {
        while let Some(geometry) = events.recv().await {
            self.on_intersection(geometry);
        }
        self.fired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FilterSpec, LoadOutcome};
    use crate::test_support::{items, ScriptedSource};
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    #[derive(Default)]
    struct Flags {
        fetching: AtomicBool,
        exhausted: AtomicBool,
    }

    impl LoadGate for Flags {
        fn is_fetching(&self) -> bool {
            self.fetching.load(Ordering::SeqCst)
        }
        fn has_more(&self) -> bool {
            !self.exhausted.load(Ordering::SeqCst)
        }
    }

    fn near() -> SentinelGeometry {
        SentinelGeometry {
            sentinel_top: 1200.0,
            viewport_bottom: 900.0,
        }
    }

    fn far() -> SentinelGeometry {
        SentinelGeometry {
            sentinel_top: 5000.0,
            viewport_bottom: 900.0,
        }
    }

    fn counting_sensor(host: &ViewportHost, flags: Arc<Flags>) -> (ScrollSensor, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let sensor = ScrollSensor::observe(host, 400.0, flags, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (sensor, calls)
    }

    #[test]
    fn test_geometry_margin() {
        assert!(near().within(400.0));
        assert!(!far().within(400.0));
        let on_screen = SentinelGeometry {
            sentinel_top: 500.0,
            viewport_bottom: 900.0,
        };
        assert!(on_screen.within(0.0));
        let edge = SentinelGeometry {
            sentinel_top: 1300.0,
            viewport_bottom: 900.0,
        };
        assert!(edge.within(400.0));
    }

    #[test]
    fn test_fires_once_per_event_when_open() {
        let host = ViewportHost::new();
        let flags = Arc::new(Flags::default());
        let (sensor, calls) = counting_sensor(&host, flags);

        assert!(sensor.on_intersection(near()));
        assert!(!sensor.on_intersection(far()));
        assert!(sensor.on_intersection(near()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(sensor.fired(), 2);
    }

    #[test]
    fn test_suppressed_while_fetching_or_exhausted() {
        let host = ViewportHost::new();
        let flags = Arc::new(Flags::default());
        let (sensor, calls) = counting_sensor(&host, flags.clone());

        flags.fetching.store(true, Ordering::SeqCst);
        assert!(!sensor.on_intersection(near()));

        flags.fetching.store(false, Ordering::SeqCst);
        flags.exhausted.store(true, Ordering::SeqCst);
        assert!(!sensor.on_intersection(near()));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_unregisters() {
        let host = ViewportHost::new();
        let flags = Arc::new(Flags::default());
        let (first, _) = counting_sensor(&host, flags.clone());
        let (second, _) = counting_sensor(&host, flags);
        assert_eq!(host.active_observers(), 2);

        drop(first);
        assert_eq!(host.active_observers(), 1);
        drop(second);
        assert_eq!(host.active_observers(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_when_events_close() {
        let host = ViewportHost::new();
        let flags = Arc::new(Flags::default());
        let (sensor, calls) = counting_sensor(&host, flags);
        let (tx, rx) = mpsc::channel(8);

        let task = tokio::spawn(sensor.run(rx));
        tx.send(far()).await.unwrap();
        tx.send(near()).await.unwrap();
        drop(tx);

        assert_eq!(task.await.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(host.active_observers(), 0);
    }

    #[tokio::test]
    async fn test_feed_sensor_loads_next_page() {
        let source = Arc::new(ScriptedSource::default());
        source.respond(&FilterSpec::All, 0, Ok(items(1, 50)));
        source.respond(&FilterSpec::All, 50, Ok(items(51, 10)));
        let feed = Arc::new(FeedController::new(
            source.clone(),
            FilterSpec::All,
            50,
            Duration::from_secs(30),
        ));
        assert!(matches!(
            feed.load_more().await.unwrap(),
            LoadOutcome::Appended { .. }
        ));

        let host = ViewportHost::new();
        let sensor = ScrollSensor::for_feed(&host, feed.clone(), 400.0);
        assert!(sensor.on_intersection(near()));
        source.wait_for_calls(2).await;
        while feed.is_fetching() {
            tokio::task::yield_now().await;
        }

        assert_eq!(feed.len(), 60);
        assert!(!feed.has_more());
        assert!(!sensor.on_intersection(near()));
        assert_eq!(source.call_count(), 2);
    }
}

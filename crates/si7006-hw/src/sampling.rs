//! Sampling cache engine.
//!
//! Each quantity keeps its last sample and running extrema. A read only goes
//! to the bus when the cached sample is older than the refresh interval, and a
//! failed bus transaction falls back to the last known good value.
//!
//! One lock covers both quantities and the transport. It is held from the
//! staleness check until the cache is updated, so the chip never sees
//! overlapping commands and two readers cannot both decide to resample.

use crate::protocol::{decode_code, MEASUREMENT_LEN};
use crate::{Clock, Error, Quantity, Result, Transport};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default staleness window.
pub const DEFAULT_REFRESH: Duration = Duration::from_secs(1);

/// Cached state of one quantity, in milli-units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Measurement {
    value: i32,
    min: i32,
    max: i32,
    last_updated: Option<Instant>,
}

impl Measurement {
    /// Returns true once at least one sample has been taken.
    pub fn is_valid(&self) -> bool {
        self.last_updated.is_some()
    }

    /// Last sampled value.
    pub fn value(&self) -> Option<i32> {
        self.is_valid().then_some(self.value)
    }

    /// Lowest value since the first sample.
    pub fn min(&self) -> Option<i32> {
        self.is_valid().then_some(self.min)
    }

    /// Highest value since the first sample.
    pub fn max(&self) -> Option<i32> {
        self.is_valid().then_some(self.max)
    }

    /// Instant of the last successful sample.
    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    /// Returns true if the cached value must be refreshed at `now`.
    pub fn is_stale(&self, now: Instant, refresh: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => now.saturating_duration_since(at) >= refresh,
        }
    }

    /// Stores a fresh sample and folds it into the extrema.
    pub fn record(&mut self, value: i32, now: Instant) {
        if self.is_valid() {
            self.max = self.max.max(value);
            self.min = self.min.min(value);
        } else {
            self.min = value;
            self.max = value;
        }
        self.value = value;
        self.last_updated = Some(now);
    }
}

/// Cached state of the whole chip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorState {
    pub temperature: Measurement,
    pub humidity: Measurement,
}

impl SensorState {
    /// Returns the record for `quantity`.
    pub fn measurement(&self, quantity: Quantity) -> &Measurement {
        match quantity {
            Quantity::Temperature => &self.temperature,
            Quantity::Humidity => &self.humidity,
        }
    }

    fn measurement_mut(&mut self, quantity: Quantity) -> &mut Measurement {
        match quantity {
            Quantity::Temperature => &mut self.temperature,
            Quantity::Humidity => &mut self.humidity,
        }
    }
}

struct Shared<T> {
    transport: T,
    state: SensorState,
}

/// Pull-driven sampler with a per-quantity cache.
pub struct Sampler<T, C> {
    shared: Mutex<Shared<T>>,
    clock: C,
    refresh: Duration,
}

impl<T: Transport, C: Clock> Sampler<T, C> {
    /// Creates a sampler with both quantities invalid.
    pub fn new(transport: T, clock: C, refresh: Duration) -> Self {
        Self {
            shared: Mutex::new(Shared {
                transport,
                state: SensorState::default(),
            }),
            clock,
            refresh,
        }
    }

    /// Returns the staleness window.
    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    fn lock(&self) -> MutexGuard<'_, Shared<T>> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current value, sampling the chip if the cache is stale.
    ///
    /// A bus failure returns the last known good value and leaves the cache
    /// stale so the next call retries. If no sample was ever taken the
    /// failure is returned as [`Error::NoData`].
    pub fn current(&self, quantity: Quantity) -> Result<i32> {
        let mut shared = self.lock();
        let now = self.clock.now();
        let cached = *shared.state.measurement(quantity);

        if !cached.is_stale(now, self.refresh) {
            return Ok(cached.value);
        }

        match sample(&mut shared.transport, quantity) {
            Ok(value) => {
                shared.state.measurement_mut(quantity).record(value, now);
                Ok(value)
            }
            Err(e) => match cached.value() {
                Some(value) => {
                    warn!("{} sample failed, keeping {}: {}", quantity, value, e);
                    Ok(value)
                }
                None => Err(Error::NoData {
                    quantity,
                    source: Some(Box::new(e)),
                }),
            },
        }
    }

    /// Returns the lowest value seen without sampling.
    pub fn min(&self, quantity: Quantity) -> Result<i32> {
        self.lock()
            .state
            .measurement(quantity)
            .min()
            .ok_or(Error::NoData {
                quantity,
                source: None,
            })
    }

    /// Returns the highest value seen without sampling.
    pub fn max(&self, quantity: Quantity) -> Result<i32> {
        self.lock()
            .state
            .measurement(quantity)
            .max()
            .ok_or(Error::NoData {
                quantity,
                source: None,
            })
    }

    /// Returns a consistent copy of the cached state.
    pub fn snapshot(&self) -> SensorState {
        self.lock().state
    }
}

/// Runs one measurement transaction and converts the result.
fn sample<T: Transport>(transport: &mut T, quantity: Quantity) -> Result<i32> {
    let mut response = [0u8; MEASUREMENT_LEN];
    transport.query(&[quantity.command() as u8], &mut response)?;
    let code = decode_code(response);
    let value = quantity.convert(code);
    debug!("{} code {:#06x} -> {}", quantity, code, value);
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::ManualClock;
    use std::sync::Arc;
    use std::thread;

    const TEMP_CMD: u8 = 0xE3;
    const HUMIDITY_CMD: u8 = 0xE5;

    fn sampler() -> (
        Sampler<ScriptedTransport, ManualClock>,
        ScriptedTransport,
        ManualClock,
    ) {
        let transport = ScriptedTransport::new();
        let clock = ManualClock::new();
        let sampler = Sampler::new(transport.clone(), clock.clone(), DEFAULT_REFRESH);
        (sampler, transport, clock)
    }

    #[test]
    fn test_first_sample_sets_extrema() {
        let (sampler, transport, _clock) = sampler();
        transport.push_code(0x6680);

        assert_eq!(sampler.refresh_interval(), DEFAULT_REFRESH);
        assert!(!sampler.snapshot().temperature.is_valid());
        assert_eq!(sampler.current(Quantity::Temperature).unwrap(), 23_506);

        let temp = sampler.snapshot().temperature;
        assert!(temp.is_valid());
        assert_eq!(temp.min(), Some(23_506));
        assert_eq!(temp.max(), Some(23_506));
        assert_eq!(transport.sent(), vec![vec![TEMP_CMD]]);
    }

    #[test]
    fn test_cached_within_window() {
        let (sampler, transport, clock) = sampler();
        transport.push_code(0x6680).push_code(0x8000);

        let first = sampler.current(Quantity::Temperature).unwrap();
        clock.advance(Duration::from_millis(999));
        let second = sampler.current(Quantity::Temperature).unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.transactions(), 1);
    }

    #[test]
    fn test_resample_at_window_edge() {
        let (sampler, transport, clock) = sampler();
        transport.push_code(0x6680).push_code(0x8000);

        sampler.current(Quantity::Temperature).unwrap();
        clock.advance(DEFAULT_REFRESH);
        assert_eq!(sampler.current(Quantity::Temperature).unwrap(), 41_010);
        assert_eq!(transport.transactions(), 2);
    }

    #[test]
    fn test_extrema_follow_samples() {
        let (sampler, transport, clock) = sampler();
        for code in [0x6000, 0x8000, 0x4000, 0x7000] {
            transport.push_code(code);
        }

        for _ in 0..4 {
            let value = sampler.current(Quantity::Humidity).unwrap();
            let min = sampler.min(Quantity::Humidity).unwrap();
            let max = sampler.max(Quantity::Humidity).unwrap();
            assert!(min <= value && value <= max);
            clock.advance(Duration::from_secs(2));
        }

        assert_eq!(sampler.min(Quantity::Humidity).unwrap(), 25_250);
        assert_eq!(sampler.max(Quantity::Humidity).unwrap(), 56_500);
        assert_eq!(sampler.snapshot().humidity.value(), Some(48_687));
    }

    #[test]
    fn test_failure_keeps_last_good_value() {
        let (sampler, transport, clock) = sampler();
        transport.push_code(0x6680).push_receive_error().push_code(0x8000);

        let good = sampler.current(Quantity::Temperature).unwrap();
        let before = sampler.snapshot().temperature;

        clock.advance(Duration::from_secs(5));
        assert_eq!(sampler.current(Quantity::Temperature).unwrap(), good);
        assert_eq!(sampler.snapshot().temperature, before);

        // Still stale, so the next read goes back to the bus.
        assert_eq!(sampler.current(Quantity::Temperature).unwrap(), 41_010);
        assert_eq!(transport.transactions(), 3);
    }

    #[test]
    fn test_send_failure_keeps_last_good_value() {
        let (sampler, transport, clock) = sampler();
        transport.push_code(0x5000).push_send_error();

        let good = sampler.current(Quantity::Humidity).unwrap();
        let sampled_at = sampler.snapshot().humidity.last_updated();
        assert_eq!(sampled_at, Some(clock.now()));

        clock.advance(Duration::from_secs(5));
        assert_eq!(sampler.current(Quantity::Humidity).unwrap(), good);
        assert_eq!(sampler.snapshot().humidity.last_updated(), sampled_at);
    }

    #[test]
    fn test_first_sample_failure_is_no_data() {
        let (sampler, transport, _clock) = sampler();
        transport.push_receive_error().push_code(0x6680);

        let err = sampler.current(Quantity::Temperature).unwrap_err();
        assert!(matches!(
            err,
            Error::NoData {
                quantity: Quantity::Temperature,
                source: Some(_)
            }
        ));
        assert!(!sampler.snapshot().temperature.is_valid());

        // No clock movement needed: an invalid cache is always stale.
        assert_eq!(sampler.current(Quantity::Temperature).unwrap(), 23_506);
    }

    #[test]
    fn test_min_max_never_sample() {
        let (sampler, transport, _clock) = sampler();
        assert!(matches!(
            sampler.max(Quantity::Humidity),
            Err(Error::NoData { source: None, .. })
        ));
        assert!(sampler.min(Quantity::Humidity).is_err());
        assert_eq!(transport.transactions(), 0);
    }

    #[test]
    fn test_quantities_cached_independently() {
        let (sampler, transport, _clock) = sampler();
        transport.push_code(0x6680).push_code(0x5000);

        sampler.current(Quantity::Temperature).unwrap();
        assert_eq!(sampler.current(Quantity::Humidity).unwrap(), 33_062);
        assert_eq!(transport.sent(), vec![vec![TEMP_CMD], vec![HUMIDITY_CMD]]);
        assert!(sampler.snapshot().temperature.is_valid());
    }

    #[test]
    fn test_concurrent_readers_share_one_sample() {
        let transport = ScriptedTransport::new();
        transport.push_code(0x6680);
        let sampler = Arc::new(Sampler::new(
            transport.clone(),
            ManualClock::new(),
            DEFAULT_REFRESH,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sampler = sampler.clone();
                thread::spawn(move || sampler.current(Quantity::Temperature).unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 23_506);
        }
        assert_eq!(transport.transactions(), 1);
    }

    #[test]
    fn test_record_stale() {
        let now = Instant::now();
        let mut m = Measurement::default();
        assert!(m.is_stale(now, DEFAULT_REFRESH));

        m.record(100, now);
        assert!(!m.is_stale(now, DEFAULT_REFRESH));
        assert!(m.is_stale(now + DEFAULT_REFRESH, DEFAULT_REFRESH));
    }
}

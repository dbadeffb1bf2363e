//! Random-walk telemetry for demos without a live robot.
//!
//! Each tick yields the same [`TopicUpdate`]s the topic decoder produces, so
//! simulated samples take the normal apply path through the store.

#[cfg(test)]
#[path = "simulate_test.rs"]
mod simulate_test;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::Sensors;
use crate::topic::{Metric, TopicUpdate};

pub const BATTERY_RANGE: (f64, f64) = (20.0, 100.0);
pub const TEMPERATURE_RANGE: (f64, f64) = (25.0, 55.0);

const START_BATTERY: f64 = 85.0;
const START_TEMPERATURE: f64 = 35.0;

pub struct Simulator<R: Rng> {
    rng: R,
    robot: Option<String>,
    battery: f64,
    temperature: f64,
}

impl Simulator<StdRng> {
    /// Simulator seeded from the OS, addressing the default robot.
    #[must_use]
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng(), None)
    }

    /// Deterministic simulator for tests.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed), None)
    }
}

impl<R: Rng> Simulator<R> {
    pub fn new(rng: R, robot: Option<String>) -> Self {
        Self { rng, robot, battery: START_BATTERY, temperature: START_TEMPERATURE }
    }

    /// Advance one step and return the resulting updates.
    ///
    /// Battery drifts slightly downward, temperature wanders symmetrically;
    /// both stay inside their ranges. Speed and sensor readings are drawn
    /// fresh each tick.
    pub fn tick(&mut self) -> Vec<TopicUpdate> {
        self.battery = (self.battery + (self.rng.random::<f64>() - 0.52) * 2.0).clamp(BATTERY_RANGE.0, BATTERY_RANGE.1);
        self.temperature =
            (self.temperature + (self.rng.random::<f64>() - 0.5) * 3.0).clamp(TEMPERATURE_RANGE.0, TEMPERATURE_RANGE.1);
        let speed = self.rng.random::<f64>();
        let sensors = Sensors {
            lidar: self.rng.random_range(0.0..100.0),
            camera: self.rng.random_range(0.0..100.0),
            ultrasonic: self.rng.random_range(0.0..100.0),
        };

        [
            Metric::Speed(speed),
            Metric::Battery(self.battery),
            Metric::Temperature(self.temperature),
            Metric::Sensors(sensors),
        ]
        .into_iter()
        .map(|metric| TopicUpdate { robot: self.robot.clone(), metric })
        .collect()
    }
}

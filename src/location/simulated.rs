use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{LocationOptions, SensorError};
use crate::{models::RawFix, session::SessionEvent};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// A straight course run at constant speed, observed through a noisy receiver.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatedCourse {
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub bearing_degrees: f64,
    pub speed_mps: f64,
    /// Typical position error (meters) with high accuracy enabled
    pub noise_meters: f64,
    pub interval_ms: u64,
    /// Chance that a scheduled fix never arrives
    pub dropout_probability: f64,
    pub seed: u64,
}

impl Default for SimulatedCourse {
    fn default() -> Self {
        Self {
            start_latitude: 55.9533,
            start_longitude: -3.1883,
            bearing_degrees: 45.0,
            speed_mps: 2.8,
            noise_meters: 6.0,
            interval_ms: 1_000,
            dropout_probability: 0.05,
            seed: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceOutput {
    Fix(RawFix),
    Failed(SensorError),
    Nothing,
}

/// Deterministic fix generator behind the simulated watch.
pub struct SimulatedSource {
    course: SimulatedCourse,
    options: LocationOptions,
    rng: StdRng,
    latitude: f64,
    longitude: f64,
    clock_ms: i64,
    last_fix: Option<RawFix>,
    silent_ms: u64,
    timed_out: bool,
}

impl SimulatedSource {
    pub fn new(course: SimulatedCourse, options: LocationOptions, start_ms: i64) -> Self {
        Self {
            course,
            options,
            rng: StdRng::seed_from_u64(course.seed),
            latitude: course.start_latitude,
            longitude: course.start_longitude,
            clock_ms: start_ms,
            last_fix: None,
            silent_ms: 0,
            timed_out: false,
        }
    }

    /// Advance the simulation by one sampling interval.
    pub fn step(&mut self) -> SourceOutput {
        let dt_ms = self.course.interval_ms;
        self.clock_ms += dt_ms as i64;
        self.advance(dt_ms);

        if self.rng.gen_bool(self.course.dropout_probability.clamp(0.0, 1.0)) {
            return self.missed_fix(dt_ms);
        }

        self.silent_ms = 0;
        self.timed_out = false;

        let noise = if self.options.high_accuracy {
            self.course.noise_meters
        } else {
            self.course.noise_meters * 3.0
        };
        let north = noise * self.rng.gen_range(-1.0_f64..=1.0);
        let east = noise * self.rng.gen_range(-1.0_f64..=1.0);
        let speed = self.course.speed_mps * (1.0 + self.rng.gen_range(-0.2_f64..=0.2));

        let fix = RawFix {
            latitude: self.latitude + north / METERS_PER_DEGREE_LAT,
            longitude: self.longitude + east / meters_per_degree_lng(self.latitude),
            accuracy_meters: noise * self.rng.gen_range(0.5_f64..=1.5),
            speed_meters_per_second: Some(speed.max(0.0)),
            timestamp_ms: self.clock_ms,
        };
        self.last_fix = Some(fix);
        SourceOutput::Fix(fix)
    }

    fn missed_fix(&mut self, dt_ms: u64) -> SourceOutput {
        self.silent_ms += dt_ms;

        if let Some(cached) = self.last_fix {
            let age = (self.clock_ms - cached.timestamp_ms).max(0) as u64;
            if self.options.max_fix_age_ms > 0 && age <= self.options.max_fix_age_ms {
                return SourceOutput::Fix(cached);
            }
        }

        if self.silent_ms >= self.options.timeout_ms && !self.timed_out {
            self.timed_out = true;
            return SourceOutput::Failed(SensorError::Timeout);
        }

        SourceOutput::Nothing
    }

    fn advance(&mut self, dt_ms: u64) {
        let meters = self.course.speed_mps * dt_ms as f64 / 1000.0;
        let bearing = self.course.bearing_degrees.to_radians();
        self.latitude += meters * bearing.cos() / METERS_PER_DEGREE_LAT;
        self.longitude += meters * bearing.sin() / meters_per_degree_lng(self.latitude);
    }
}

fn meters_per_degree_lng(latitude: f64) -> f64 {
    (METERS_PER_DEGREE_LAT * latitude.to_radians().cos()).max(1.0)
}

/// Runs the simulated watch until cancelled, feeding the session queue.
pub fn spawn_simulated_source(
    course: SimulatedCourse,
    options: LocationOptions,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    let start_ms = chrono::Utc::now().timestamp_millis();
    let mut source = SimulatedSource::new(course, options, start_ms);

    tokio::spawn(async move {
        let mut ticker = time::interval(Duration::from_millis(course.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; skip it so fixes are spaced evenly.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let event = match source.step() {
                        SourceOutput::Fix(fix) => SessionEvent::FixReceived(fix),
                        SourceOutput::Failed(error) => SessionEvent::LocationFailed(error),
                        SourceOutput::Nothing => {
                            log_debug!("simulated fix dropped");
                            continue;
                        }
                    };
                    if events.send(event).is_err() {
                        log_info!("session queue closed; stopping simulated location source");
                        break;
                    }
                }
                _ = cancel_token.cancelled() => {
                    log_info!("simulated location source shutting down");
                    break;
                }
            }
        }
    })
}

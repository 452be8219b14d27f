use rand::Rng;

use crate::SensorSample;

// Below this humidity the controller switches the pump on
const PUMP_HUMIDITY_THRESHOLD: f64 = 40.0;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Generate `count` serial lines shaped like the ones printed by the
/// field controller, in the presence format
pub fn simulate_lines<R: Rng>(count: usize, rng: &mut R) -> Vec<String> {
    (0..count)
        .map(|_| {
            let humidity = round_one_decimal(rng.gen_range(20.0..=90.0));
            let sample = SensorSample {
                humidity,
                ph: round_one_decimal(rng.gen_range(4.0..=8.5)),
                phosphorus_present: rng.gen_bool(0.5),
                potassium_present: rng.gen_bool(0.5),
                pump_status: humidity < PUMP_HUMIDITY_THRESHOLD,
                notes: String::new(),
            };
            log::trace!("Simulated sample {sample:?}");
            sample.to_line()
        })
        .collect()
}

use chrono::{Duration, Utc};
use common_lib::api::{CheckInRequest, RideInput};
use rand::prelude::SliceRandom;
use rand::Rng;

pub const PASSWORD: &str = "pedal2024";

pub fn get_user_ids() -> Vec<String> {
    (1..=100).map(|v| format!("u{:03}", v)).collect()
}

pub fn rand_user_id() -> String {
    pick(&get_user_ids())
}

pub fn contact(user_id: &str) -> String {
    format!("{user_id}@bench.example.com")
}

pub fn rand_post_body() -> String {
    pick(&[
        "Morning loop along the river, 25 km before work.",
        "Battery still at 60% after the hill climb!",
        "Found a new bike lane downtown.",
        "Group ride this Saturday, who is in?",
    ])
}

pub fn rand_comment_body() -> String {
    pick(&["Great ride!", "Which route?", "See you Saturday.", "Nice views!"])
}

pub fn rand_landmark_id() -> String {
    let n = rand::thread_rng().gen_range(1..=20);
    format!("landmark-{n:02}")
}

pub fn rand_check_in() -> CheckInRequest {
    CheckInRequest {
        landmark_id: rand_landmark_id(),
        note: None,
    }
}

/// A plausible commute: 2-40 km at 12-28 km/h.
pub fn rand_ride() -> RideInput {
    let mut rng = rand::thread_rng();
    let distance_km: f64 = rng.gen_range(2.0..40.0);
    let speed_kmh: f64 = rng.gen_range(12.0..28.0);
    let duration_secs = (distance_km / speed_kmh * 3600.0).round() as u64;

    RideInput {
        distance_km: (distance_km * 10.0).round() / 10.0,
        duration_secs,
        started_at: Utc::now() - Duration::seconds(duration_secs as i64),
    }
}

fn pick<T: ToString>(values: &[T]) -> String {
    values
        .choose(&mut rand::thread_rng())
        .map(ToString::to_string)
        .unwrap_or_default()
}

use crate::validation::ValidationError;

/// Grid electricity vs. car emissions, per kilometre ridden.
pub const CO2_KG_PER_KM: f64 = 0.12;
pub const POINTS_PER_KM: f64 = 10.0;
pub const CHECK_IN_POINTS: u32 = 5;
pub const MAX_RIDE_DISTANCE_KM: f64 = 500.0;
pub const MAX_AVERAGE_SPEED_KMH: f64 = 60.0;

pub fn validate_ride(distance_km: f64, duration_secs: u64) -> Result<(), ValidationError> {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        Err(ValidationError::InvalidValue {
            field: "distance",
            reason: "must be a positive number".to_string(),
        })
    } else if distance_km > MAX_RIDE_DISTANCE_KM {
        Err(ValidationError::InvalidValue {
            field: "distance",
            reason: format!("must not exceed {MAX_RIDE_DISTANCE_KM} km"),
        })
    } else if duration_secs == 0 {
        Err(ValidationError::InvalidValue {
            field: "duration",
            reason: "must be positive".to_string(),
        })
    } else if average_speed_kmh(distance_km, duration_secs) > MAX_AVERAGE_SPEED_KMH {
        Err(ValidationError::InvalidValue {
            field: "duration",
            reason: format!("average speed above {MAX_AVERAGE_SPEED_KMH} km/h"),
        })
    } else {
        Ok(())
    }
}

pub fn average_speed_kmh(distance_km: f64, duration_secs: u64) -> f64 {
    if duration_secs == 0 {
        0.0
    } else {
        distance_km / (duration_secs as f64 / 3600.0)
    }
}

pub fn co2_saved_kg(distance_km: f64) -> f64 {
    distance_km * CO2_KG_PER_KM
}

pub fn ride_points(distance_km: f64) -> u32 {
    (distance_km * POINTS_PER_KM).floor() as u32
}

/// Battery level reported by a paired bike, in percent.
pub fn validate_battery_level(level: u8) -> Result<(), ValidationError> {
    if level > 100 {
        Err(ValidationError::InvalidValue {
            field: "battery-level",
            reason: "must be between 0 and 100".to_string(),
        })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ride_rewards() {
        assert_eq!(ride_points(12.37), 123);
        assert!((co2_saved_kg(10.0) - 1.2).abs() < 1e-9);
        assert!((average_speed_kmh(15.0, 1800) - 30.0).abs() < 1e-9);
    }

    #[test]
    fn implausible_rides_are_rejected() {
        assert!(validate_ride(15.0, 1800).is_ok());
        assert!(validate_ride(0.0, 1800).is_err());
        assert!(validate_ride(f64::NAN, 1800).is_err());
        assert!(validate_ride(15.0, 0).is_err());
        // 100 km in one hour
        assert!(validate_ride(100.0, 3600).is_err());
        assert!(validate_ride(MAX_RIDE_DISTANCE_KM + 1.0, 100_000).is_err());
    }

    #[test]
    fn battery_level_is_a_percentage() {
        assert!(validate_battery_level(100).is_ok());
        assert!(validate_battery_level(101).is_err());
    }
}

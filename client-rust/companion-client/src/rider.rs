use crate::error::ClientError;
use crate::remote::RemoteStore;
use crate::session::{Session, SessionContext};
use common_lib::api::{
    CheckIn, CheckInRequest, Device, Profile, ProfileUpdate, Ride, RideInput, RideStats,
};
use common_lib::rides;
use common_lib::validation::{self, ValidationError};
use std::future::Future;
use std::sync::Arc;

/// Profile, device and ride data of the signed-in rider.
pub struct RiderService {
    remote: Arc<dyn RemoteStore>,
    session: Arc<SessionContext>,
}

impl RiderService {
    pub fn new(remote: Arc<dyn RemoteStore>, session: Arc<SessionContext>) -> Self {
        RiderService { remote, session }
    }

    async fn authorized<T, F, Fut>(&self, f: F) -> Result<T, ClientError>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        let session = self.session.require()?;
        let token = session.access_token.clone();
        let result = f(session).await;

        if let Err(e) = &result {
            if e.is_auth() {
                self.session.invalidate(&token);
            }
        }
        result
    }

    pub async fn get_profile(&self) -> Result<Profile, ClientError> {
        self.authorized(|s| async move {
            self.remote.get_profile(&s.access_token, &s.user.id).await
        })
        .await
    }

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<Profile, ClientError> {
        let update = normalize_update(update)?;

        self.authorized(|s| async move {
            let profile = self
                .remote
                .update_profile(&s.access_token, &s.user.id, &update)
                .await?;
            log::info!("update profile - user id: {}", s.user.id);
            Ok(profile)
        })
        .await
    }

    pub async fn update_stats(&self, stats: RideStats) -> Result<RideStats, ClientError> {
        if !(stats.total_distance_km >= 0.0 && stats.co2_saved_kg >= 0.0) {
            return Err(ValidationError::InvalidValue {
                field: "stats",
                reason: "totals must not be negative".to_string(),
            }
            .into());
        }

        self.authorized(|s| async move {
            self.remote
                .update_stats(&s.access_token, &s.user.id, &stats)
                .await
        })
        .await
    }

    pub async fn pair_device(&self, device: Device) -> Result<(), ClientError> {
        if device.serial_number.trim().is_empty() {
            return Err(ValidationError::MissingField("serial-number").into());
        }
        rides::validate_battery_level(device.battery_level)?;

        self.authorized(|s| async move {
            self.remote
                .set_device(&s.access_token, &s.user.id, &device)
                .await?;
            log::info!(
                "pair device - user id: {}, serial: {}",
                s.user.id,
                device.serial_number
            );
            Ok(())
        })
        .await
    }

    pub async fn unpair_device(&self) -> Result<(), ClientError> {
        self.authorized(|s| async move {
            self.remote.remove_device(&s.access_token, &s.user.id).await
        })
        .await
    }

    pub async fn check_in(
        &self,
        landmark_id: &str,
        note: Option<String>,
    ) -> Result<CheckIn, ClientError> {
        if landmark_id.trim().is_empty() {
            return Err(ValidationError::MissingField("landmark-id").into());
        }
        let request = CheckInRequest {
            landmark_id: landmark_id.to_string(),
            note: note.filter(|n| !n.trim().is_empty()),
        };

        self.authorized(|s| async move {
            self.remote
                .check_in(&s.access_token, &s.user.id, &request)
                .await
        })
        .await
    }

    pub async fn record_ride(&self, ride: RideInput) -> Result<Ride, ClientError> {
        rides::validate_ride(ride.distance_km, ride.duration_secs)?;

        self.authorized(|s| async move {
            let recorded = self
                .remote
                .record_ride(&s.access_token, &s.user.id, &ride)
                .await?;
            log::info!(
                "record ride - user id: {}, ride id: {}, distance: {} km",
                s.user.id,
                recorded.ride_id,
                recorded.distance_km
            );
            Ok(recorded)
        })
        .await
    }

    pub async fn follow(&self, other_id: &str) -> Result<(), ClientError> {
        self.authorized(|s| async move {
            if s.user.id == other_id {
                return Err(ClientError::Validation(
                    "You cannot follow yourself".to_string(),
                ));
            }
            self.remote
                .follow(&s.access_token, &s.user.id, other_id)
                .await
        })
        .await
    }

    pub async fn unfollow(&self, other_id: &str) -> Result<(), ClientError> {
        self.authorized(|s| async move {
            self.remote
                .unfollow(&s.access_token, &s.user.id, other_id)
                .await
        })
        .await
    }
}

/// Trims the update and checks the contact fields; blank fields are dropped.
fn normalize_update(update: ProfileUpdate) -> Result<ProfileUpdate, ClientError> {
    fn present(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    let name = present(update.name);
    if let Some(name) = &name {
        validation::validate_display_name(name)?;
    }

    let email = present(update.email).map(|e| e.to_lowercase());
    if let Some(email) = &email {
        validation::validate_email(email)?;
    }

    let phone = present(update.phone)
        .map(|p| validation::normalize_phone(&p))
        .transpose()?;

    Ok(ProfileUpdate {
        name,
        email,
        phone,
        avatar: present(update.avatar),
        bio: present(update.bio),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn profile_update_is_normalized() {
        let update = ProfileUpdate {
            name: Some(" Ada ".to_string()),
            email: Some("Ada@Example.com".to_string()),
            phone: Some("+44 (20) 7946-0958".to_string()),
            avatar: Some("  ".to_string()),
            bio: None,
        };

        assert_eq!(
            normalize_update(update).unwrap(),
            ProfileUpdate {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                phone: Some("+442079460958".to_string()),
                avatar: None,
                bio: None,
            }
        );
    }

    #[test]
    fn profile_update_rejects_bad_contact() {
        let update = ProfileUpdate {
            email: Some("ada.example.com".to_string()),
            ..ProfileUpdate::default()
        };

        assert_matches!(normalize_update(update), Err(ClientError::Validation(_)));
    }
}

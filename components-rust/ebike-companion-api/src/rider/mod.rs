use crate::common::{default_avatar, Author};
use crate::post::PostAgentClient;
use crate::timeline::{PostRef, TimelineAgentClient};
use common_lib::api::{
    CheckIn, CommentView, Device, PostView, Profile, ProfileUpdate, Ride, RideInput, RideStats,
};
use common_lib::{rides, validation};
use golem_rust::{agent_definition, agent_implementation, Schema};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const MAX_RIDES: usize = 5000;
const MAX_CHECK_INS: usize = 5000;
// Posts handed to a new follower's timeline.
const FOLLOW_BACKFILL_POSTS: usize = 20;

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub user_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Connection {
    fn new(user_id: String) -> Self {
        Connection {
            user_id,
            created_at: chrono::Utc::now(),
        }
    }
}

#[derive(Schema, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub stats: RideStats,
    pub device: Option<Device>,
    pub check_ins: Vec<CheckIn>,
    pub rides: Vec<Ride>,
    pub following: HashMap<String, Connection>,
    pub followers: HashMap<String, Connection>,
    pub posts: Vec<PostRef>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Rider {
    fn new(user_id: String) -> Self {
        let now = chrono::Utc::now();
        Rider {
            user_id,
            name: None,
            email: None,
            phone: None,
            avatar: None,
            bio: None,
            stats: RideStats::default(),
            device: None,
            check_ins: Vec::new(),
            rides: Vec::new(),
            following: HashMap::new(),
            followers: HashMap::new(),
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(&self) -> Profile {
        Profile {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            avatar: self.avatar_url(),
            bio: self.bio.clone(),
            followers_count: self.followers.len() as u32,
            following_count: self.following.len() as u32,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn avatar_url(&self) -> Option<String> {
        self.avatar
            .clone()
            .or_else(|| self.email.as_deref().map(default_avatar))
    }

    fn author(&self) -> Author {
        Author {
            user_id: self.user_id.clone(),
            name: self.name.clone().unwrap_or_else(|| self.user_id.clone()),
            avatar: self.avatar_url(),
        }
    }

    fn apply_profile_update(&mut self, update: ProfileUpdate) -> Result<(), String> {
        if let Some(name) = &update.name {
            validation::validate_display_name(name).map_err(|e| e.to_string())?;
        }
        if let Some(email) = &update.email {
            validation::validate_email(email).map_err(|e| e.to_string())?;
        }
        let phone = update
            .phone
            .as_deref()
            .map(validation::normalize_phone)
            .transpose()
            .map_err(|e| e.to_string())?;

        if let Some(name) = update.name {
            self.name = Some(name.trim().to_string());
        }
        if let Some(email) = update.email {
            self.email = Some(email.trim().to_lowercase());
        }
        if phone.is_some() {
            self.phone = phone;
        }
        if update.avatar.is_some() {
            self.avatar = update.avatar;
        }
        if update.bio.is_some() {
            self.bio = update.bio;
        }
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    fn add_ride(&mut self, input: RideInput) -> Result<Ride, String> {
        rides::validate_ride(input.distance_km, input.duration_secs).map_err(|e| e.to_string())?;

        if self.rides.len() >= MAX_RIDES {
            return Err("Max rides reached".to_string());
        }

        let now = chrono::Utc::now();
        let ride = Ride {
            ride_id: uuid::Uuid::new_v4().to_string(),
            distance_km: input.distance_km,
            duration_secs: input.duration_secs,
            average_speed_kmh: rides::average_speed_kmh(input.distance_km, input.duration_secs),
            started_at: input.started_at,
            recorded_at: now,
        };

        self.stats.total_distance_km += ride.distance_km;
        self.stats.total_duration_secs += ride.duration_secs;
        self.stats.total_rides += 1;
        self.stats.co2_saved_kg += rides::co2_saved_kg(ride.distance_km);
        self.stats.points += rides::ride_points(ride.distance_km);

        self.rides.push(ride.clone());
        self.updated_at = now;

        Ok(ride)
    }

    fn add_check_in(&mut self, landmark_id: String, note: Option<String>) -> Result<CheckIn, String> {
        let now = chrono::Utc::now();
        let today = now.date_naive();

        if landmark_id.trim().is_empty() {
            Err("Missing required field: landmark-id".to_string())
        } else if self
            .check_ins
            .iter()
            .any(|c| c.landmark_id == landmark_id && c.created_at.date_naive() == today)
        {
            Err("Already checked in today".to_string())
        } else if self.check_ins.len() >= MAX_CHECK_INS {
            Err("Max check-ins reached".to_string())
        } else {
            let check_in = CheckIn {
                landmark_id,
                note,
                created_at: now,
            };
            self.check_ins.push(check_in.clone());
            self.stats.points += rides::CHECK_IN_POINTS;
            self.updated_at = now;
            Ok(check_in)
        }
    }
}

#[agent_definition]
trait RiderAgent {
    fn new(id: String) -> Self;

    fn get_rider(&self) -> Option<Rider>;

    fn get_profile(&self) -> Option<Profile>;

    fn update_profile(&mut self, update: ProfileUpdate) -> Result<Profile, String>;

    fn update_stats(&mut self, stats: RideStats) -> Result<RideStats, String>;

    fn set_device(&mut self, device: Device) -> Result<(), String>;

    fn remove_device(&mut self) -> Result<(), String>;

    fn check_in(&mut self, landmark_id: String, note: Option<String>) -> Result<CheckIn, String>;

    fn record_ride(&mut self, ride: RideInput) -> Result<Ride, String>;

    fn follow(&mut self, user_id: String) -> Result<(), String>;

    fn unfollow(&mut self, user_id: String) -> Result<(), String>;

    fn add_follower(&mut self, user_id: String) -> Result<(), String>;

    fn remove_follower(&mut self, user_id: String) -> Result<(), String>;

    async fn create_post(&mut self, body: String, media: Option<String>)
        -> Result<PostView, String>;

    async fn add_comment(&mut self, post_id: String, body: String) -> Result<CommentView, String>;

    fn post_deleted(&mut self, post_id: String) -> Result<(), String>;
}

struct RiderAgentImpl {
    _id: String,
    state: Option<Rider>,
}

impl RiderAgentImpl {
    fn get_state(&mut self) -> &mut Rider {
        self.state.get_or_insert(Rider::new(self._id.clone()))
    }

    fn with_state<T>(&mut self, f: impl FnOnce(&mut Rider) -> T) -> T {
        f(self.get_state())
    }
}

#[agent_implementation]
impl RiderAgent for RiderAgentImpl {
    fn new(id: String) -> Self {
        RiderAgentImpl {
            _id: id,
            state: None,
        }
    }

    fn get_rider(&self) -> Option<Rider> {
        self.state.clone()
    }

    fn get_profile(&self) -> Option<Profile> {
        self.state.as_ref().map(|state| state.profile())
    }

    fn update_profile(&mut self, update: ProfileUpdate) -> Result<Profile, String> {
        self.with_state(|state| {
            log::info!("update profile - user id: {}", state.user_id);
            state.apply_profile_update(update)?;
            Ok(state.profile())
        })
    }

    fn update_stats(&mut self, stats: RideStats) -> Result<RideStats, String> {
        self.with_state(|state| {
            if !stats.total_distance_km.is_finite()
                || stats.total_distance_km < 0.0
                || !stats.co2_saved_kg.is_finite()
                || stats.co2_saved_kg < 0.0
            {
                Err("Invalid value for stats: must be non-negative".to_string())
            } else {
                log::info!(
                    "update stats - user id: {}, rides: {}, distance: {}",
                    state.user_id,
                    stats.total_rides,
                    stats.total_distance_km
                );
                state.stats = stats;
                state.updated_at = chrono::Utc::now();
                Ok(state.stats.clone())
            }
        })
    }

    fn set_device(&mut self, device: Device) -> Result<(), String> {
        self.with_state(|state| {
            rides::validate_battery_level(device.battery_level).map_err(|e| e.to_string())?;
            if device.serial_number.trim().is_empty() {
                Err("Missing required field: serial-number".to_string())
            } else {
                log::info!(
                    "set device - user id: {}, serial number: {}",
                    state.user_id,
                    device.serial_number
                );
                state.device = Some(device);
                state.updated_at = chrono::Utc::now();
                Ok(())
            }
        })
    }

    fn remove_device(&mut self) -> Result<(), String> {
        self.with_state(|state| match state.device.take() {
            Some(device) => {
                log::info!(
                    "remove device - user id: {}, serial number: {}",
                    state.user_id,
                    device.serial_number
                );
                state.updated_at = chrono::Utc::now();
                Ok(())
            }
            None => Err("Device not found".to_string()),
        })
    }

    fn check_in(&mut self, landmark_id: String, note: Option<String>) -> Result<CheckIn, String> {
        self.with_state(|state| {
            log::info!(
                "check in - user id: {}, landmark id: {landmark_id}",
                state.user_id
            );
            state.add_check_in(landmark_id, note)
        })
    }

    fn record_ride(&mut self, ride: RideInput) -> Result<Ride, String> {
        self.with_state(|state| {
            log::info!(
                "record ride - user id: {}, distance: {}, duration: {}",
                state.user_id,
                ride.distance_km,
                ride.duration_secs
            );
            state.add_ride(ride)
        })
    }

    fn follow(&mut self, user_id: String) -> Result<(), String> {
        let state = self.get_state();

        if user_id == state.user_id {
            Err("Cannot follow yourself".to_string())
        } else {
            if !state.following.contains_key(&user_id) {
                log::info!("follow - user id: {}, followed id: {user_id}", state.user_id);
                state
                    .following
                    .insert(user_id.clone(), Connection::new(user_id.clone()));
                state.updated_at = chrono::Utc::now();

                RiderAgentClient::get(user_id).trigger_add_follower(state.user_id.clone());
            }
            Ok(())
        }
    }

    fn unfollow(&mut self, user_id: String) -> Result<(), String> {
        let state = self.get_state();

        if state.following.remove(&user_id).is_some() {
            log::info!("unfollow - user id: {}, followed id: {user_id}", state.user_id);
            state.updated_at = chrono::Utc::now();

            RiderAgentClient::get(user_id).trigger_remove_follower(state.user_id.clone());
        }
        Ok(())
    }

    fn add_follower(&mut self, user_id: String) -> Result<(), String> {
        let state = self.get_state();

        if user_id != state.user_id && !state.followers.contains_key(&user_id) {
            log::info!("add follower - user id: {}, follower id: {user_id}", state.user_id);
            state
                .followers
                .insert(user_id.clone(), Connection::new(user_id.clone()));
            state.updated_at = chrono::Utc::now();

            let mut timeline = TimelineAgentClient::get(user_id);
            for post in state.posts.iter().rev().take(FOLLOW_BACKFILL_POSTS) {
                timeline.trigger_add_post(post.clone());
            }
        }
        Ok(())
    }

    fn remove_follower(&mut self, user_id: String) -> Result<(), String> {
        let state = self.get_state();

        if state.followers.remove(&user_id).is_some() {
            log::info!(
                "remove follower - user id: {}, follower id: {user_id}",
                state.user_id
            );
            state.updated_at = chrono::Utc::now();

            TimelineAgentClient::get(user_id).trigger_remove_posts_by(state.user_id.clone());
        }
        Ok(())
    }

    async fn create_post(
        &mut self,
        body: String,
        media: Option<String>,
    ) -> Result<PostView, String> {
        validation::validate_post(&body, media.as_deref()).map_err(|e| e.to_string())?;

        let author = self.get_state().author();
        let post_id = uuid::Uuid::new_v4().to_string();

        log::info!(
            "create post - user id: {}, post id: {post_id}",
            author.user_id
        );

        let post = PostAgentClient::get(post_id.clone())
            .init_post(author, body, media)
            .await?;

        let state = self.get_state();
        let post_ref = PostRef::new(post.post_id.clone(), state.user_id.clone(), post.created_at);

        state.posts.push(post_ref.clone());
        state.updated_at = post.created_at;

        TimelineAgentClient::get(state.user_id.clone()).trigger_add_post(post_ref.clone());
        for follower_id in state.followers.keys() {
            TimelineAgentClient::get(follower_id.clone()).trigger_add_post(post_ref.clone());
        }

        Ok(post)
    }

    async fn add_comment(&mut self, post_id: String, body: String) -> Result<CommentView, String> {
        validation::validate_comment(&body).map_err(|e| e.to_string())?;

        let author = self.get_state().author();

        log::info!(
            "add comment - user id: {}, post id: {post_id}",
            author.user_id
        );

        PostAgentClient::get(post_id).add_comment(author, body).await
    }

    fn post_deleted(&mut self, post_id: String) -> Result<(), String> {
        self.with_state(|state| {
            if state.posts.iter().any(|p| p.post_id == post_id) {
                log::info!("post deleted - user id: {}, post id: {post_id}", state.user_id);
                state.posts.retain(|p| p.post_id != post_id);
                state.updated_at = chrono::Utc::now();

                TimelineAgentClient::get(state.user_id.clone()).trigger_remove_post(post_id.clone());
                for follower_id in state.followers.keys() {
                    TimelineAgentClient::get(follower_id.clone())
                        .trigger_remove_post(post_id.clone());
                }
                Ok(())
            } else {
                Err("Post not found".to_string())
            }
        })
    }

    async fn load_snapshot(&mut self, bytes: Vec<u8>) -> Result<(), String> {
        let data: Option<Rider> = crate::common::snapshot::deserialize(&bytes)?;
        self.state = data;
        Ok(())
    }

    async fn save_snapshot(&self) -> Result<Vec<u8>, String> {
        crate::common::snapshot::serialize(&self.state)
    }
}

use crate::error::ClientError;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:9006/v1/ebike";
pub const DEFAULT_STORAGE_DIR: &str = "./.companion";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DUPLICATE_WINDOW: usize = 5;

/// What to do with the server's like status once a toggle succeeds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Keep the optimistic status; the server response only confirms it.
    #[default]
    TrustOptimistic,
    /// Overwrite with the server's count when no other toggle is in flight,
    /// picking up likes made from other devices.
    AdoptServer,
}

impl FromStr for ReconcilePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trust-optimistic" => Ok(ReconcilePolicy::TrustOptimistic),
            "adopt-server" => Ok(ReconcilePolicy::AdoptServer),
            other => Err(format!("unknown reconcile policy: {other}")),
        }
    }
}

impl Display for ReconcilePolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcilePolicy::TrustOptimistic => write!(f, "trust-optimistic"),
            ReconcilePolicy::AdoptServer => write!(f, "adopt-server"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub storage_dir: PathBuf,
    pub request_timeout: Duration,
    pub duplicate_window: usize,
    pub reconcile_policy: ReconcilePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_base_url: DEFAULT_API_URL.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            duplicate_window: DEFAULT_DUPLICATE_WINDOW,
            reconcile_policy: ReconcilePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        Ok(ClientConfig {
            api_base_url: try_load(&lookup, "COMPANION_API_URL", DEFAULT_API_URL.to_string())?,
            storage_dir: PathBuf::from(try_load(
                &lookup,
                "COMPANION_STORAGE_DIR",
                DEFAULT_STORAGE_DIR.to_string(),
            )?),
            request_timeout: Duration::from_secs(try_load(
                &lookup,
                "COMPANION_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            duplicate_window: try_load(
                &lookup,
                "COMPANION_DUPLICATE_WINDOW",
                DEFAULT_DUPLICATE_WINDOW,
            )?,
            reconcile_policy: try_load(
                &lookup,
                "COMPANION_RECONCILE",
                ReconcilePolicy::default(),
            )?,
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ClientError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|e| {
            log::warn!("Invalid {key} value: {e}");
            ClientError::Config(format!("{key}: {e}"))
        }),
        None => {
            log::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

//! Client core of the e-bike companion app.
//!
//! The UI layer talks to three things built here:
//! - [`FeedController`], which keeps the community feed responsive by
//!   applying likes optimistically and reconciling them with the API,
//! - [`ToggleStores`], local-only membership flags (joined landmarks, sent
//!   friend requests, joined groups and events),
//! - [`SessionContext`] / [`AuthFlow`] / [`RiderService`] for the signed-in
//!   rider's session, profile and ride data.

pub mod auth;
pub mod config;
pub mod error;
pub mod feed;
pub mod remote;
pub mod rider;
pub mod session;
pub mod storage;
pub mod toggle;

pub use auth::{AuthFlow, RegistrationStep, RegistrationWizard};
pub use config::{ClientConfig, ReconcilePolicy};
pub use error::ClientError;
pub use feed::{
    ConfirmDuplicate, CreateOutcome, DeleteOutcome, FeedController, FeedSettings, FeedState,
    LikeResolution, LikeTarget, PendingLike, PostDetail, PostDraft,
};
pub use remote::{http::HttpRemoteStore, RemoteStore};
pub use rider::RiderService;
pub use session::{Session, SessionContext};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use toggle::{ToggleDomain, ToggleStore, ToggleStores};

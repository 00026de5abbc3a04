pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::BotdeskConfig;
pub use error::{BotdeskError, BotdeskResult};
pub use traits::{AccountStore, IdentityProvider, OnboardingStore, SubscriberStore};
pub use types::{
    BAN_ACTION, Identity, ImpersonationToken, KnownStepData, ModerationAction,
    NewModerationAction, NewUser, OnboardingProgressEntry, Role, Session, SignInCodeRecord,
    StepData, Subscriber, TrialGrant, User,
};

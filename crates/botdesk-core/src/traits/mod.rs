pub mod account_store;
pub mod identity;
pub mod onboarding_store;
pub mod subscriber_store;

pub use account_store::AccountStore;
pub use identity::IdentityProvider;
pub use onboarding_store::OnboardingStore;
pub use subscriber_store::SubscriberStore;

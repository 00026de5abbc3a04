use std::sync::Arc;

use botdesk_core::config::BotdeskConfig;
use botdesk_core::traits::*;

use crate::chat::ChatRelay;
use crate::email::EmailSender;

pub struct AppState<A, S, O>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    pub account_store: Arc<A>,
    pub subscriber_store: Arc<S>,
    pub onboarding_store: Arc<O>,
    /// Bearer resolution and sign-in; injected so handlers never reach for a
    /// global client.
    pub identity: Arc<dyn IdentityProvider>,
    pub config: Arc<BotdeskConfig>,
    pub chat_relay: ChatRelay,
    /// SMTP sender for sign-in codes (None if SMTP is not configured).
    pub email_sender: Option<Arc<EmailSender>>,
}

// Manual impl: the stores sit behind `Arc`, so cloning the state must not
// require the store types themselves to be `Clone`.
impl<A, S, O> Clone for AppState<A, S, O>
where
    A: AccountStore,
    S: SubscriberStore,
    O: OnboardingStore,
{
    fn clone(&self) -> Self {
        Self {
            account_store: Arc::clone(&self.account_store),
            subscriber_store: Arc::clone(&self.subscriber_store),
            onboarding_store: Arc::clone(&self.onboarding_store),
            identity: Arc::clone(&self.identity),
            config: Arc::clone(&self.config),
            chat_relay: self.chat_relay.clone(),
            email_sender: self.email_sender.clone(),
        }
    }
}

use async_trait::async_trait;

use crate::error::BotdeskResult;
use crate::types::{Subscriber, TrialGrant};

#[async_trait]
pub trait SubscriberStore: Send + Sync + 'static {
    async fn get_subscriber(&self, email: &str) -> BotdeskResult<Option<Subscriber>>;

    /// Grant a trial unless the row already records a trial or subscription.
    /// Returns `false` when the grant was refused.
    async fn start_trial(&self, grant: &TrialGrant) -> BotdeskResult<bool>;
}

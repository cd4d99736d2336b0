//! Rate-limit-aware retry for every remote call.
//!
//! The code host resets a budget at a fixed instant and reports that instant,
//! so there is nothing to gain from exponential backoff: the guard sleeps
//! until the reset (plus a small margin) and tries the same call again, as
//! many times as it takes.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::harvest::{HarvestProgress, ProgressCallback, emit};
use crate::platform::{
    BudgetCategory, PlatformClient, PlatformError, RateLimitState, Result, short_error_message,
};

/// Added to every computed wait so the retry lands after the reset.
pub const SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// How long to wait before retrying a call that hit the rate limit.
///
/// `max(0, reset_at - now) + margin`. A reset in the past (clock skew, budget
/// already refilled) yields exactly `margin`.
pub fn sleep_duration(reset_at: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> Duration {
    let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
    until_reset + margin
}

/// Wraps remote calls and waits out rate-limit windows.
///
/// Each [`BudgetCategory`] is tracked on its own clock, so a search call
/// never waits on the core budget and vice versa.
pub struct RateLimitGuard {
    client: Arc<dyn PlatformClient>,
    margin: Duration,
    states: Mutex<HashMap<BudgetCategory, RateLimitState>>,
    on_progress: Option<ProgressCallback>,
}

impl RateLimitGuard {
    pub fn new(client: Arc<dyn PlatformClient>) -> Self {
        Self {
            client,
            margin: SAFETY_MARGIN,
            states: Mutex::new(HashMap::new()),
            on_progress: None,
        }
    }

    #[must_use]
    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    /// Report every wait through `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// The wrapped client, for calls that should not be guarded.
    pub fn client(&self) -> &dyn PlatformClient {
        self.client.as_ref()
    }

    /// Last known budget of `category`, if one was ever fetched.
    pub fn last_known(&self, category: BudgetCategory) -> Option<RateLimitState> {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&category)
            .copied()
    }

    /// Run `operation` against the client, retrying on rate-limit errors.
    ///
    /// Never returns [`PlatformError::RateLimited`]. Every other error is
    /// returned unchanged after the first attempt.
    ///
    /// ```ignore
    /// let details = guard
    ///     .invoke(BudgetCategory::Core, |api| api.get_repo(&repo))
    ///     .await?;
    /// ```
    pub async fn invoke<'c, T, F, Fut>(
        &'c self,
        category: BudgetCategory,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(&'c dyn PlatformClient) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match operation(self.client.as_ref()).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let PlatformError::RateLimited { reset_at } = err else {
                return Err(err);
            };

            let reset_at = self.reset_for(category, reset_at).await;
            let wait = sleep_duration(reset_at, Utc::now(), self.margin);

            tracing::warn!(
                category = %category,
                attempt,
                wait_secs = wait.as_secs(),
                reset_at = %reset_at,
                "Rate limit exceeded, waiting for budget reset"
            );
            emit(
                self.on_progress.as_ref(),
                HarvestProgress::RateLimited {
                    category,
                    reset_at,
                    wait,
                    attempt,
                },
            );

            tokio::time::sleep(wait).await;
        }
    }

    /// Reset instant of `category`.
    ///
    /// Prefers the reset reported with the failing response. Otherwise asks
    /// the host (the rate-limit endpoint is free). Falls back to "now", which
    /// turns the wait into the bare margin.
    async fn reset_for(
        &self,
        category: BudgetCategory,
        reported: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        if let Some(reset_at) = reported {
            return reset_at;
        }

        match self.client.rate_limits().await {
            Ok(limits) => {
                let state = limits.get(category);
                let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
                states.insert(BudgetCategory::Core, limits.core);
                states.insert(BudgetCategory::Search, limits.search);
                state.reset_at
            }
            Err(e) => {
                tracing::debug!(
                    category = %category,
                    error = %short_error_message(&e),
                    "Could not refresh rate limits, waiting the safety margin only"
                );
                Utc::now()
            }
        }
    }
}

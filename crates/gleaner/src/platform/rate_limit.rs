use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An independently rate-limited class of remote operations.
///
/// The code host meters search calls separately from every other REST call,
/// each with its own reset clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetCategory {
    Core,
    Search,
}

impl BudgetCategory {
    pub const ALL: [BudgetCategory; 2] = [BudgetCategory::Core, BudgetCategory::Search];

    /// Resource name used by the host in `/rate_limit` and the
    /// `x-ratelimit-resource` header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Search => "search",
        }
    }

    pub fn from_resource(resource: &str) -> Option<Self> {
        match resource {
            "core" => Some(Self::Core),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remaining budget and reset time of one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitState {
    /// Maximum requests allowed per period.
    pub limit: u64,
    /// Requests used in current period.
    pub used: u64,
    /// Remaining requests in current period.
    pub remaining: u64,
    /// When the budget refills.
    pub reset_at: DateTime<Utc>,
}

impl RateLimitState {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Share of the budget already spent, in percent.
    pub fn usage_percent(&self) -> f64 {
        if self.limit == 0 {
            return 0.0;
        }
        self.used as f64 / self.limit as f64 * 100.0
    }
}

/// Budgets of every category, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    pub core: RateLimitState,
    pub search: RateLimitState,
}

impl RateLimits {
    pub fn get(&self, category: BudgetCategory) -> RateLimitState {
        match category {
            BudgetCategory::Core => self.core,
            BudgetCategory::Search => self.search,
        }
    }
}

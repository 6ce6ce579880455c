use serde::Serialize;
use uuid::Uuid;

use super::billing_month::BillingMonth;

/// One billed period of one service for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub service_name: String,
    pub price: i64,
    pub user_id: Uuid,
    pub start_date: BillingMonth,
    pub end_date: Option<BillingMonth>,
}

impl Subscription {
    /// Whether the active months `[start_date, end_date)` intersect `[start, end)`.
    /// `None` as an end means open-ended.
    pub fn overlaps(&self, start: BillingMonth, end: Option<BillingMonth>) -> bool {
        let starts_before_other_ends = end.is_none_or(|end| self.start_date < end);
        let ends_after_other_starts = self.end_date.is_none_or(|own_end| own_end > start);
        starts_before_other_ends && ends_after_other_starts
    }

    /// Whole months this subscription is billed for inside the window `[from, to)`.
    pub fn billed_months(&self, from: BillingMonth, to: BillingMonth) -> i64 {
        let first = self.start_date.max(from);
        let stop = self.end_date.map_or(to, |end| end.min(to));
        first.months_until(stop).max(0)
    }

    /// `price * billed_months` for the window, `None` on overflow.
    pub fn cost_within(&self, from: BillingMonth, to: BillingMonth) -> Option<i64> {
        self.price.checked_mul(self.billed_months(from, to))
    }
}

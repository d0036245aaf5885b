use time::{error::ComponentRange, Date, Month, OffsetDateTime, UtcOffset};

/// Calendar month a reading is billed against, as the half-open range
/// `[start, end)`.
///
/// Month boundaries are midnight on the 1st in the billing offset, so the
/// same instant can land in different months for different offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingPeriod {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl BillingPeriod {
    /// Billing month containing `ts`, with boundaries computed in `offset`.
    pub fn containing(ts: OffsetDateTime, offset: UtcOffset) -> Result<Self, ComponentRange> {
        let local = ts.to_offset(offset);

        let (next_year, next_month) = match local.month() {
            Month::December => (local.year() + 1, Month::January),
            m => (local.year(), m.next()),
        };

        let start = Date::from_calendar_date(local.year(), local.month(), 1)?
            .midnight()
            .assume_offset(offset);
        let end = Date::from_calendar_date(next_year, next_month, 1)?
            .midnight()
            .assume_offset(offset);

        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: OffsetDateTime) -> bool {
        ts >= self.start && ts < self.end
    }
}

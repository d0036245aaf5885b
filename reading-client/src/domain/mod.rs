pub mod billing_period;
pub mod customer;
pub mod measurement;

pub use billing_period::BillingPeriod;
pub use customer::Customer;
pub use measurement::{MeasureType, Measurement, NewMeasurement, UnknownMeasureType};

pub mod contact;

pub use contact::{ContactRecord, DailyContactMetric, NewContact, format_timestamp, parse_timestamp};

//! Shared data structures for fleet alert evaluation
//!
//! - Input records: FuelEvent, StockSnapshot, HourMeterRecord, PersistedHourMeterRow
//! - FleetSnapshot: everything one evaluation reads
//! - Output: Alert, AlertCategory, AlertSeverity, AlertSummary

mod alert;
mod records;

pub use alert::*;
pub use records::*;

pub mod exchange_day;
pub mod formatting;

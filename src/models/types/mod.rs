mod sqlx_types;
mod utc_datetime;

pub use sqlx_types::{Sqlx, SqlxConvertible};
pub use utc_datetime::UtcDateTime;

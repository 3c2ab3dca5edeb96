use std::str::FromStr;

use poise::serenity_prelude::{ChannelId, UserId};
use sqlx::{encode::IsNull, error::BoxDynError, Database, Decode, Encode, Sqlite, Type};

use crate::models::GameStatus;

/// A trait that converts the types into corresponding sqlx database types.
pub trait SqlxConvertible: Sized {
    type DBType: Type<Sqlite> + for<'q> Encode<'q, Sqlite> + for<'r> Decode<'r, Sqlite>;

    fn to_sqlx(&self) -> Self::DBType;
    fn from_sqlx(value: Self::DBType) -> Result<Self, BoxDynError>;
}

/// A wrapper around a type to make it bindable and decodable by sqlx.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Sqlx<T>(pub T);

impl<T> From<T> for Sqlx<T> {
    fn from(value: T) -> Self {
        Sqlx(value)
    }
}

impl<T: SqlxConvertible> Type<Sqlite> for Sqlx<T> {
    fn type_info() -> <Sqlite as Database>::TypeInfo {
        T::DBType::type_info()
    }

    fn compatible(ty: &<Sqlite as Database>::TypeInfo) -> bool {
        T::DBType::compatible(ty)
    }
}

impl<'q, T: SqlxConvertible> Encode<'q, Sqlite> for Sqlx<T> {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        self.0.to_sqlx().encode(buf)
    }
}

impl<'r, T: SqlxConvertible> Decode<'r, Sqlite> for Sqlx<T> {
    fn decode(value: <Sqlite as Database>::ValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <T::DBType as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Sqlx(T::from_sqlx(raw)?))
    }
}

// Discord snowflakes are u64 but never use the sign bit, so they fit SQLite's i64.

fn snowflake(value: i64) -> Result<u64, BoxDynError> {
    if value > 0 {
        Ok(value as u64)
    } else {
        Err(format!("Invalid snowflake: {value}").into())
    }
}

impl SqlxConvertible for UserId {
    type DBType = i64;

    fn to_sqlx(&self) -> Self::DBType {
        self.get() as _
    }

    fn from_sqlx(value: Self::DBType) -> Result<Self, BoxDynError> {
        Ok(UserId::new(snowflake(value)?))
    }
}

impl SqlxConvertible for ChannelId {
    type DBType = i64;

    fn to_sqlx(&self) -> Self::DBType {
        self.get() as _
    }

    fn from_sqlx(value: Self::DBType) -> Result<Self, BoxDynError> {
        Ok(ChannelId::new(snowflake(value)?))
    }
}

impl SqlxConvertible for GameStatus {
    type DBType = String;

    fn to_sqlx(&self) -> Self::DBType {
        self.as_ref().to_string()
    }

    fn from_sqlx(value: Self::DBType) -> Result<Self, BoxDynError> {
        GameStatus::from_str(&value)
            .map_err(|_| format!("Unexpected game status value: {value}").into())
    }
}

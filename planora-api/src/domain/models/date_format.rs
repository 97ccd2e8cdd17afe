//! Serde support for ISO `YYYY-MM-DD` calendar dates.

use serde::{de, ser, Deserialize, Deserializer, Serializer};
use time::{format_description::BorrowedFormatItem, macros::format_description, Date};

pub const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(ISO_DATE).map_err(ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Date::parse(&raw, ISO_DATE).map_err(de::Error::custom)
}

pub mod option {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::ISO_DATE;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => {
                let formatted = date.format(ISO_DATE).map_err(ser::Error::custom)?;
                serializer.serialize_some(&formatted)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|s| Date::parse(&s, ISO_DATE).map_err(de::Error::custom))
            .transpose()
    }
}

use lazy_regex::regex_captures;
use time::{Date, Month};

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

// Far enough to reach the next February 29.
const YEARS_AHEAD: i32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DaysLeft {
    Today,
    Days(i64),
    Passed,
}

/// Reads a gifting day typed by a human, e.g. `Dec 24th`, `24 December` or `2025-12-24`.
///
/// Without a year the next such day on or after `today` is used.
pub fn parse_exchange_day(text: &str, today: Date) -> Option<Date> {
    let text = text.trim();

    if let Some((_, year, month, day)) = regex_captures!(r"^(\d{4})-(\d{1,2})-(\d{1,2})$", text) {
        let month = Month::try_from(month.parse::<u8>().ok()?).ok()?;
        return Date::from_calendar_date(year.parse().ok()?, month, day.parse().ok()?).ok();
    }

    let (month, day, year) = if let Some((_, month, day, year)) = regex_captures!(
        r"(?i)^([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s+(\d{4}))?$",
        text
    ) {
        (month, day, year)
    } else if let Some((_, day, month, year)) = regex_captures!(
        r"(?i)^(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)\.?(?:,?\s+(\d{4}))?$",
        text
    ) {
        (month, day, year)
    } else {
        return None;
    };

    let month = parse_month(month)?;
    let day: u8 = day.parse().ok()?;

    if !year.is_empty() {
        return Date::from_calendar_date(year.parse().ok()?, month, day).ok();
    }

    (today.year()..=today.year() + YEARS_AHEAD)
        .filter_map(|year| Date::from_calendar_date(year, month, day).ok())
        .find(|date| *date >= today)
}

pub fn days_left(text: &str, today: Date) -> Option<DaysLeft> {
    let date = parse_exchange_day(text, today)?;

    Some(match (date - today).whole_days() {
        0 => DaysLeft::Today,
        days if days < 0 => DaysLeft::Passed,
        days => DaysLeft::Days(days),
    })
}

fn parse_month(name: &str) -> Option<Month> {
    let name = name.to_lowercase();
    if name.len() < 3 {
        return None;
    }

    let index = MONTHS.iter().position(|month| month.starts_with(&name))?;
    Month::try_from(index as u8 + 1).ok()
}

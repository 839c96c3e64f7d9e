use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;
use tracing::warn;

pub const TIMEZONE_ENV_VAR: &str =
  "TASKLIST_TIMEZONE";
pub const DEFAULT_TIMEZONE: Tz =
  chrono_tz::UTC;

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses an ISO-8601 calendar date
/// (`YYYY-MM-DD`).
pub fn parse_due_date(
  raw: &str
) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    DUE_DATE_FORMAT
  )
  .ok()
}

#[must_use]
pub fn format_due_date(
  date: NaiveDate
) -> String {
  date
    .format(DUE_DATE_FORMAT)
    .to_string()
}

/// The calendar date at `now` in `tz`.
#[must_use]
pub fn today_in(
  tz: Tz,
  now: DateTime<Utc>
) -> NaiveDate {
  now.with_timezone(&tz).date_naive()
}

/// Resolves the zone used for "today".
/// `TASKLIST_TIMEZONE` wins over the
/// configured name; unknown names fall
/// back to UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  let from_env =
    std::env::var(TIMEZONE_ENV_VAR)
      .ok()
      .filter(|v| !v.trim().is_empty());

  let Some(name) = from_env
    .as_deref()
    .or(configured)
  else {
    return DEFAULT_TIMEZONE;
  };

  match name.trim().parse::<Tz>() {
    | Ok(tz) => tz,
    | Err(error) => {
      warn!(
        timezone = name,
        %error,
        "unknown timezone; using UTC"
      );
      DEFAULT_TIMEZONE
    }
  }
}

/// Stored form of `dueDate`: an ISO date
/// string, `""` when the task has none.
pub mod due_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  pub fn serialize<S>(
    date: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match date {
      | Some(value) => serializer
        .serialize_str(
          &super::format_due_date(
            *value
          )
        ),
      | None => {
        serializer.serialize_str("")
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    match raw.as_deref().map(str::trim) {
      | None | Some("") => Ok(None),
      | Some(text) => {
        super::parse_due_date(text)
          .map(Some)
          .ok_or_else(|| {
            serde::de::Error::custom(
              format!(
                "invalid dueDate: \
                 {text}"
              )
            )
          })
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    TimeZone,
    Utc
  };

  use super::{
    parse_due_date,
    today_in
  };

  #[test]
  fn parses_iso_dates_only() {
    assert_eq!(
      parse_due_date("2024-06-15"),
      NaiveDate::from_ymd_opt(
        2024, 6, 15
      )
    );
    assert_eq!(
      parse_due_date("15/06/2024"),
      None
    );
    assert_eq!(
      parse_due_date("2024-02-30"),
      None
    );
  }

  #[test]
  fn today_follows_the_zone() {
    let now = Utc
      .with_ymd_and_hms(
        2024, 6, 15, 23, 30, 0
      )
      .single()
      .expect("valid now");
    assert_eq!(
      today_in(chrono_tz::UTC, now),
      NaiveDate::from_ymd_opt(
        2024, 6, 15
      )
      .expect("date")
    );
    assert_eq!(
      today_in(
        chrono_tz::Asia::Tokyo,
        now
      ),
      NaiveDate::from_ymd_opt(
        2024, 6, 16
      )
      .expect("date")
    );
  }
}

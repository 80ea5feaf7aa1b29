use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tera::Tera;

use crate::config::{SECONDS_PER_DAY, SECONDS_PER_HOUR, SECONDS_PER_MINUTE};
use crate::error::AppError;

/// Initialize the Tera template engine from a glob such as `templates/**/*`
pub fn init_templates(glob: &str) -> Result<Tera, AppError> {
    let mut tera = Tera::new(glob)?;

    tera.register_filter("timeago", timeago_filter);
    tera.register_filter("datetime", datetime_filter);

    Ok(tera)
}

fn parse_timestamp(value: &tera::Value, filter: &str) -> tera::Result<Option<DateTime<Utc>>> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} filter expects a string", filter)))?;
    Ok(DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc)))
}

/// Convert an RFC 3339 timestamp to a relative time (e.g., "5 minutes ago")
fn timeago_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    match parse_timestamp(value, "timeago")? {
        Some(date) => Ok(tera::Value::String(relative_time(Utc::now(), date))),
        // If parsing fails, return the original string
        None => Ok(value.clone()),
    }
}

/// Render an RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS UTC`
fn datetime_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    match parse_timestamp(value, "datetime")? {
        Some(date) => Ok(tera::Value::String(
            date.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        )),
        None => Ok(value.clone()),
    }
}

fn relative_time(now: DateTime<Utc>, date: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(date).num_seconds();

    let (count, unit) = if seconds < 0 {
        return "in the future".to_string();
    } else if seconds < SECONDS_PER_MINUTE {
        return "just now".to_string();
    } else if seconds < SECONDS_PER_HOUR {
        (seconds / SECONDS_PER_MINUTE, "minute")
    } else if seconds < SECONDS_PER_DAY {
        (seconds / SECONDS_PER_HOUR, "hour")
    } else {
        (seconds / SECONDS_PER_DAY, "day")
    };

    if count == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time_units() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now - Duration::seconds(10)), "just now");
        assert_eq!(relative_time(now, now - Duration::seconds(60)), "1 minute ago");
        assert_eq!(relative_time(now, now - Duration::minutes(5)), "5 minutes ago");
        assert_eq!(relative_time(now, now - Duration::hours(3)), "3 hours ago");
        assert_eq!(relative_time(now, now - Duration::days(1)), "1 day ago");
        assert_eq!(relative_time(now, now + Duration::minutes(1)), "in the future");
    }

    #[test]
    fn test_datetime_filter() {
        let value = tera::Value::String("2026-03-04T05:06:07.123Z".to_string());
        let out = datetime_filter(&value, &HashMap::new()).unwrap();
        assert_eq!(out, tera::Value::String("2026-03-04 05:06:07 UTC".to_string()));
    }

    #[test]
    fn test_filters_pass_through_unparsable() {
        let value = tera::Value::String("yesterday".to_string());
        assert_eq!(timeago_filter(&value, &HashMap::new()).unwrap(), value);
        assert!(datetime_filter(&tera::Value::Bool(true), &HashMap::new()).is_err());
    }

    #[test]
    fn test_bundled_templates_load() {
        let glob = concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*");
        let tera = init_templates(glob).unwrap();
        assert!(tera.get_template_names().any(|name| name == "index.html"));
    }
}

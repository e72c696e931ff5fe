use chrono::{DateTime, NaiveTime, TimeZone, Utc};

/// `now` から見た `target` の相対時間表現（"in 3 days", "2 hours ago" など）
pub fn from_now(target: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let millis = target.signed_duration_since(now).num_milliseconds();
    let phrase = humanize(millis.unsigned_abs() as f64 / 1000.0);
    if millis < 0 {
        format!("{} ago", phrase)
    } else {
        format!("in {}", phrase)
    }
}

/// 当日の 00:00 (UTC)
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

fn humanize(seconds: f64) -> String {
    let days = seconds / 86_400.0;
    let months = days * 4800.0 / 146_097.0;

    let seconds = seconds.round() as i64;
    let minutes = (days * 1440.0).round() as i64;
    let hours = (days * 24.0).round() as i64;
    let years = (months / 12.0).round() as i64;
    let days = days.round() as i64;
    let months = months.round() as i64;

    if seconds < 45 {
        "a few seconds".to_owned()
    } else if minutes <= 1 {
        "a minute".to_owned()
    } else if minutes < 45 {
        format!("{} minutes", minutes)
    } else if hours <= 1 {
        "an hour".to_owned()
    } else if hours < 22 {
        format!("{} hours", hours)
    } else if days <= 1 {
        "a day".to_owned()
    } else if days < 26 {
        format!("{} days", days)
    } else if months <= 1 {
        "a month".to_owned()
    } else if months < 11 {
        format!("{} months", months)
    } else if years <= 1 {
        "a year".to_owned()
    } else {
        format!("{} years", years)
    }
}

use time::OffsetDateTime;

pub fn date_ago(then: OffsetDateTime) -> String {
    date_ago_from(OffsetDateTime::now_utc(), then)
}

fn date_ago_from(now: OffsetDateTime, then: OffsetDateTime) -> String {
    let seconds = (now - then).whole_seconds().max(0);
    let minutes: f32 = seconds as f32 / 60.0;
    let hours: f32 = minutes / 60.0;
    let days: f32 = hours / 24.0;
    let years: f32 = days / 365.0;

    if seconds < 45 {
        format!("{}s ago", seconds)
    } else if seconds < 90 {
        "1m ago".to_string()
    } else if minutes < 45.0 {
        format!("{}m ago", minutes as i64)
    } else if minutes < 90.0 {
        "1h ago".to_string()
    } else if hours < 24.0 {
        format!("{}h ago", hours as i64)
    } else if hours < 42.0 {
        "1d ago".to_string()
    } else if days < 30.0 {
        format!("{}d ago", days as i64)
    } else if days < 45.0 {
        "1mo ago".to_string()
    } else if days < 365.0 {
        format!("{}mo ago", (days / 30.0) as i64)
    } else if years < 1.5 {
        "1y ago".to_string()
    } else {
        format!("{}y ago", years as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    #[test]
    fn test_date_ago() {
        let now = datetime!(2024-03-01 12:00 UTC);
        assert_eq!(date_ago_from(now, now - Duration::seconds(10)), "10s ago");
        assert_eq!(date_ago_from(now, now - Duration::minutes(5)), "5m ago");
        assert_eq!(date_ago_from(now, now - Duration::minutes(95)), "1h ago");
        assert_eq!(date_ago_from(now, now - Duration::hours(30)), "1d ago");
        assert_eq!(date_ago_from(now, now - Duration::days(90)), "3mo ago");
        assert_eq!(date_ago_from(now, now - Duration::days(800)), "2y ago");

        // clock skew
        assert_eq!(date_ago_from(now, now + Duration::minutes(3)), "0s ago");
    }
}

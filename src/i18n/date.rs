// 📅 Relative Dates - "yesterday at 3:15 PM"

use chrono::{DateTime, Datelike, Utc};

use super::loader::DateLocale;

/// Format `date` relative to `base` using calendar days (UTC)
///
/// | days from base | pattern |
/// |----------------|---------|
/// | < -6 | plain date |
/// | -6..=-2 | last week |
/// | -1 | yesterday |
/// | 0 | today |
/// | 1 | tomorrow |
/// | 2..=6 | next week |
/// | > 6 | plain date |
pub fn format_relative(date: DateTime<Utc>, base: DateTime<Utc>, locale: &DateLocale) -> String {
    let days = (date.date_naive() - base.date_naive()).num_days();

    let pattern = match days {
        d if d < -6 => return date.format(&locale.date).to_string(),
        d if d < -1 => &locale.last_week,
        -1 => &locale.yesterday,
        0 => &locale.today,
        1 => &locale.tomorrow,
        d if d < 7 => &locale.next_week,
        _ => return date.format(&locale.date).to_string(),
    };

    let weekday = locale
        .weekdays
        .get(date.weekday().num_days_from_monday() as usize)
        .map(String::as_str)
        .unwrap_or_default();
    let time = date.format(&locale.time).to_string();

    pattern.replace("{weekday}", weekday).replace("{time}", &time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn english() -> DateLocale {
        DateLocale {
            code: "en-US".to_string(),
            weekdays: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            time: "%-I:%M %p".to_string(),
            date: "%m/%d/%Y".to_string(),
            last_week: "last {weekday} at {time}".to_string(),
            yesterday: "yesterday at {time}".to_string(),
            today: "today at {time}".to_string(),
            tomorrow: "tomorrow at {time}".to_string(),
            next_week: "{weekday} at {time}".to_string(),
        }
    }

    fn base() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2021, 3, 17, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_same_and_adjacent_days() {
        let locale = english();
        let at = |days: i64| Utc.with_ymd_and_hms(2021, 3, 17, 15, 5, 0).unwrap() + Duration::days(days);

        assert_eq!(format_relative(at(0), base(), &locale), "today at 3:05 PM");
        assert_eq!(format_relative(at(-1), base(), &locale), "yesterday at 3:05 PM");
        assert_eq!(format_relative(at(1), base(), &locale), "tomorrow at 3:05 PM");
    }

    #[test]
    fn test_within_a_week() {
        let locale = english();
        let friday_last = Utc.with_ymd_and_hms(2021, 3, 12, 8, 30, 0).unwrap();
        let monday_next = Utc.with_ymd_and_hms(2021, 3, 22, 23, 0, 0).unwrap();

        assert_eq!(format_relative(friday_last, base(), &locale), "last Friday at 8:30 AM");
        assert_eq!(format_relative(monday_next, base(), &locale), "Monday at 11:00 PM");
    }

    #[test]
    fn test_far_dates_use_plain_format() {
        let locale = english();
        let old = Utc.with_ymd_and_hms(2021, 3, 10, 8, 30, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2021, 3, 24, 8, 30, 0).unwrap();

        assert_eq!(format_relative(old, base(), &locale), "03/10/2021");
        assert_eq!(format_relative(later, base(), &locale), "03/24/2021");
    }
}

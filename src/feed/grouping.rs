//! Month grouping of loaded feed items.
//!
//! Every item is filed under a year-month derived from, in order: its
//! acquisition time, a date embedded in its file name, or the current time.
//! The last rule keeps undatable items visible in the newest group instead
//! of dropping them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::MediaItem;

/// File-name years must lie strictly between these bounds.
const MIN_NAME_YEAR: i32 = 1990;
const MAX_NAME_YEAR: i32 = 2100;

/// `YYYY-MM-DD`, `YYYYMMDD`, `YYYY_MM_DD`, tried in this order.
static NAME_DATE_PATTERNS: Lazy<[Regex; 3]> = Lazy::new(|| {
    [
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("dash date pattern"),
        Regex::new(r"(\d{4})(\d{2})(\d{2})").expect("compact date pattern"),
        Regex::new(r"(\d{4})_(\d{2})_(\d{2})").expect("underscore date pattern"),
    ]
});

/// Calendar month used as a grouping key. Orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: &impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Long form label, e.g. "November 2023".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Where an item's grouping date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    Taken,
    FileName,
    Fallback,
}

/// Items sharing a year-month, in feed order.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub key: YearMonth,
    pub label: String,
    pub items: Vec<MediaItem>,
}

/// Scan a file name for an embedded date.
///
/// Patterns are tried in order; within a pattern, matches are tried left to
/// right. The first match with an in-range year that is also a real
/// calendar date wins.
pub fn date_from_name(name: &str) -> Option<NaiveDate> {
    for pattern in NAME_DATE_PATTERNS.iter() {
        for caps in pattern.captures_iter(name) {
            let (Ok(year), Ok(month), Ok(day)) = (
                caps[1].parse::<i32>(),
                caps[2].parse::<u32>(),
                caps[3].parse::<u32>(),
            ) else {
                continue;
            };
            if year <= MIN_NAME_YEAR || year >= MAX_NAME_YEAR {
                continue;
            }
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(date);
            }
        }
    }
    None
}

/// Grouping key for one item, with the rule that produced it.
pub fn month_key(item: &MediaItem, now: NaiveDateTime) -> (YearMonth, DateSource) {
    if let Some(taken) = &item.date_taken {
        return (YearMonth::of(taken), DateSource::Taken);
    }
    if let Some(date) = date_from_name(item.display_name()) {
        return (YearMonth::of(&date), DateSource::FileName);
    }
    (YearMonth::of(&now), DateSource::Fallback)
}

/// Group items by month, newest month first.
///
/// Pure and deterministic for a given `items` and `now`; items keep their
/// input order inside each group. Callers recompute on every feed change:
/// one pass over n items into an ordered map of g months, O(n log g), plus a
/// clone of every item. For feeds of tens of thousands of items that is a
/// few milliseconds per appended page.
pub fn group_by_month(items: &[MediaItem], now: NaiveDateTime) -> Vec<MonthGroup> {
    let mut buckets: BTreeMap<YearMonth, Vec<MediaItem>> = BTreeMap::new();
    for item in items {
        let (key, _) = month_key(item, now);
        buckets.entry(key).or_default().push(item.clone());
    }

    buckets
        .into_iter()
        .rev()
        .map(|(key, items)| MonthGroup {
            key,
            label: key.label(),
            items,
        })
        .collect()
}

/// [`group_by_month`] against the local clock.
pub fn group_by_month_now(items: &[MediaItem]) -> Vec<MonthGroup> {
    group_by_month(items, Local::now().naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dated_item, item};

    fn now() -> NaiveDateTime {
        crate::models::timestamp::parse("2026-03-14T09:00:00").unwrap()
    }

    #[test]
    fn test_name_patterns() {
        assert_eq!(
            date_from_name("IMG_20231118_beach.jpg"),
            NaiveDate::from_ymd_opt(2023, 11, 18)
        );
        assert_eq!(
            date_from_name("Screenshot 2021-04-02 at 10.00.png"),
            NaiveDate::from_ymd_opt(2021, 4, 2)
        );
        assert_eq!(
            date_from_name("PXL_2019_12_31_party.jpg"),
            NaiveDate::from_ymd_opt(2019, 12, 31)
        );
        assert_eq!(date_from_name("random.jpg"), None);
    }

    #[test]
    fn test_name_year_bounds_are_exclusive() {
        assert_eq!(date_from_name("scan_19900101.jpg"), None);
        assert_eq!(date_from_name("scan_21000101.jpg"), None);
        assert_eq!(
            date_from_name("scan_19910101.jpg"),
            NaiveDate::from_ymd_opt(1991, 1, 1)
        );
    }

    #[test]
    fn test_name_rejects_impossible_dates() {
        assert_eq!(date_from_name("IMG_20231345.jpg"), None);
        // A later match of the same pattern still counts.
        assert_eq!(
            date_from_name("12345678_20200229.jpg"),
            NaiveDate::from_ymd_opt(2020, 2, 29)
        );
    }

    #[test]
    fn test_dash_pattern_wins_over_compact() {
        assert_eq!(
            date_from_name("20200101 copy of 2018-06-07.jpg"),
            NaiveDate::from_ymd_opt(2018, 6, 7)
        );
    }

    #[test]
    fn test_key_priority() {
        let taken = dated_item(1, "IMG_20231118_beach.jpg", "2022-01-05T10:00:00");
        assert_eq!(
            month_key(&taken, now()),
            (YearMonth { year: 2022, month: 1 }, DateSource::Taken)
        );

        let named = item(2, "IMG_20231118_beach.jpg");
        assert_eq!(
            month_key(&named, now()),
            (YearMonth { year: 2023, month: 11 }, DateSource::FileName)
        );

        let undated = item(3, "random.jpg");
        assert_eq!(
            month_key(&undated, now()),
            (YearMonth { year: 2026, month: 3 }, DateSource::Fallback)
        );
    }

    #[test]
    fn test_boundary_labels() {
        let groups = group_by_month(
            &[item(1, "IMG_20231118_beach.jpg"), item(2, "random.jpg")],
            now(),
        );
        let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["March 2026", "November 2023"]);
    }

    #[test]
    fn test_groups_sorted_newest_first_and_keep_feed_order() {
        let items = vec![
            dated_item(1, "a.jpg", "2023-05-01T00:00:00"),
            dated_item(2, "b.jpg", "2024-01-10T00:00:00"),
            dated_item(3, "c.jpg", "2023-05-30T00:00:00"),
            dated_item(4, "d.jpg", "2023-05-02T00:00:00"),
            dated_item(5, "e.jpg", "2022-12-31T23:59:59"),
        ];
        let groups = group_by_month(&items, now());

        let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
        assert_eq!(keys, vec!["2024-01", "2023-05", "2022-12"]);

        let may: Vec<i64> = groups[1].items.iter().map(|i| i.id).collect();
        assert_eq!(may, vec![1, 3, 4]);
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let items = vec![
            item(1, "IMG_20230101.jpg"),
            dated_item(2, "x.jpg", "2021-07-07T07:07:07"),
            item(3, "nothing.png"),
            item(4, "VID_2023_01_15.mp4"),
        ];
        let first = group_by_month(&items, now());
        let second = group_by_month(&items, now());
        assert_eq!(first, second);
        assert_eq!(first.iter().map(|g| g.items.len()).sum::<usize>(), 4);
    }

    #[test]
    fn test_empty_input() {
        assert!(group_by_month(&[], now()).is_empty());
    }

    #[test]
    fn test_label_format() {
        assert_eq!(YearMonth { year: 2023, month: 11 }.label(), "November 2023");
        assert_eq!(YearMonth { year: 2001, month: 1 }.label(), "January 2001");
    }
}

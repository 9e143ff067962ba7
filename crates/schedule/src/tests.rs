//! Tests for cron normalization and rule evaluation.

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use cronhpa_core::Cron;

    use crate::cron::{normalize_cron, parse_interval};
    use crate::{evaluate, next_occurrence, parse_schedule, CronSchedule, ScheduleError};

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    // -- normalize_cron ----------------------------------------------------

    #[test]
    fn normalize_cron_5_to_6_fields() {
        assert_eq!(normalize_cron("*/15 * * * *"), "0 */15 * * * *");
        assert_eq!(normalize_cron("30 2 1 * *"), "0 30 2 1 * *");
    }

    #[test]
    fn normalize_cron_shifts_numeric_weekdays() {
        assert_eq!(normalize_cron("0 6 * * 1-5"), "0 0 6 * * 2-6");
        assert_eq!(normalize_cron("0 0 * * 0,6"), "0 0 0 * * 1,7");
        assert_eq!(normalize_cron("0 0 * * 1-5/2"), "0 0 0 * * 2-6/2");
        assert_eq!(normalize_cron("0 0 * * */2"), "0 0 0 * * */2");
        assert_eq!(normalize_cron("0 0 * * MON-FRI"), "0 0 0 * * MON-FRI");
    }

    #[test]
    fn normalize_cron_passes_other_forms_through() {
        assert_eq!(normalize_cron("0 */15 * * * *"), "0 */15 * * * *");
        assert_eq!(normalize_cron("  @daily "), "@daily");
    }

    // -- parse_schedule ----------------------------------------------------

    #[test]
    fn parse_schedule_accepts_standard_and_descriptors() {
        assert!(parse_schedule("*/5 * * * *").is_ok());
        assert!(parse_schedule("0 0 * * 0").is_ok());
        assert!(parse_schedule("@hourly").is_ok());
    }

    #[test]
    fn parse_schedule_rejects_garbage() {
        let err = parse_schedule("every tuesday").unwrap_err();
        assert_eq!(err.schedule(), "every tuesday");
        assert!(err.to_string().contains("every tuesday"));
    }

    #[test]
    fn sunday_is_weekday_zero() {
        // 2026-01-04 is a Sunday.
        let schedule = parse_schedule("0 9 * * 0").unwrap();
        let next = next_occurrence(&schedule, at(2026, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(next, at(2026, 1, 4, 9, 0, 0));
    }

    #[test]
    fn next_occurrence_is_strictly_after() {
        let schedule = parse_schedule("*/5 * * * *").unwrap();
        let t0 = at(2026, 1, 15, 10, 0, 0);
        assert_eq!(next_occurrence(&schedule, t0), Some(at(2026, 1, 15, 10, 5, 0)));
    }

    #[test]
    fn restricted_day_fields_match_either_day() {
        // The 1st of the month and every Monday; 2026-01-05 is a Monday.
        let schedule = parse_schedule("0 0 1 * 1").unwrap();
        assert!(matches!(schedule, CronSchedule::EitherDay { .. }));
        assert_eq!(
            next_occurrence(&schedule, at(2026, 1, 2, 0, 0, 0)),
            Some(at(2026, 1, 5, 0, 0, 0))
        );
        // 2026-02-01 is a Sunday, before the next Monday.
        assert_eq!(
            next_occurrence(&schedule, at(2026, 1, 26, 0, 0, 0)),
            Some(at(2026, 2, 1, 0, 0, 0))
        );
    }

    #[test]
    fn wildcard_day_field_keeps_single_calendar() {
        assert!(matches!(parse_schedule("0 9 * * 1").unwrap(), CronSchedule::Calendar(_)));
        assert!(matches!(parse_schedule("0 9 15 * *").unwrap(), CronSchedule::Calendar(_)));
        assert!(matches!(parse_schedule("0 9 15 * */1").unwrap(), CronSchedule::Calendar(_)));
        // A stepped wildcard is a restriction.
        assert!(matches!(
            parse_schedule("0 9 15 * */2").unwrap(),
            CronSchedule::EitherDay { .. }
        ));
    }

    #[test]
    fn extra_descriptors_are_accepted() {
        let midnight = parse_schedule("@midnight").unwrap();
        assert_eq!(
            next_occurrence(&midnight, at(2026, 3, 3, 12, 0, 0)),
            Some(at(2026, 3, 4, 0, 0, 0))
        );
        assert!(parse_schedule("@annually").is_ok());
    }

    // -- @every ------------------------------------------------------------

    #[test]
    fn parse_interval_go_style() {
        use std::time::Duration as Std;
        assert_eq!(parse_interval("90s"), Some(Std::from_secs(90)));
        assert_eq!(parse_interval("1h30m"), Some(Std::from_secs(5_400)));
        assert_eq!(parse_interval("1.5h"), Some(Std::from_secs(5_400)));
        assert_eq!(parse_interval("250ms"), Some(Std::from_millis(250)));
        assert_eq!(parse_interval("0"), Some(Std::ZERO));
        assert_eq!(parse_interval("10"), None);
        assert_eq!(parse_interval("soon"), None);
        assert_eq!(parse_interval(""), None);
    }

    #[test]
    fn every_is_fixed_delay_in_whole_seconds() {
        let schedule = parse_schedule("@every 1h30m").unwrap();
        let reference = at(2026, 1, 15, 10, 0, 0) + Duration::milliseconds(750);
        assert_eq!(
            next_occurrence(&schedule, reference),
            Some(at(2026, 1, 15, 11, 30, 0))
        );

        let sub_second = parse_schedule("@every 1500ms").unwrap();
        assert!(matches!(sub_second, CronSchedule::Every(d) if d.as_secs() == 1));
        let tiny = parse_schedule("@every 10ms").unwrap();
        assert!(matches!(tiny, CronSchedule::Every(d) if d.as_secs() == 1));
    }

    #[test]
    fn every_rejects_bad_interval() {
        let err = parse_schedule("@every soon").unwrap_err();
        assert!(matches!(err, ScheduleError::Interval { .. }));
        assert_eq!(err.schedule(), "@every soon");
    }

    #[test]
    fn evaluate_fires_every_rule() {
        let rules = vec![Cron::new("@every 1h", 6)];
        let reference = at(2026, 2, 1, 7, 0, 0);

        assert!(evaluate(&rules, reference, at(2026, 2, 1, 7, 59, 59)).is_none());
        let due = evaluate(&rules, reference, at(2026, 2, 1, 8, 0, 0)).unwrap();
        assert_eq!(due.occurrence, at(2026, 2, 1, 8, 0, 0));
        assert_eq!(due.target_replicas, 6);
    }

    // -- evaluate ----------------------------------------------------------

    #[test]
    fn evaluate_boundary_on_five_minute_rule() {
        let rules = vec![Cron::new("*/5 * * * *", 3)];
        let t0 = at(2026, 1, 15, 10, 0, 0);

        let due = evaluate(&rules, t0, t0 + Duration::minutes(5)).unwrap();
        assert_eq!(due.index, 0);
        assert_eq!(due.target_replicas, 3);
        assert_eq!(due.occurrence, at(2026, 1, 15, 10, 5, 0));

        let not_yet = t0 + Duration::minutes(4) + Duration::seconds(59);
        assert!(evaluate(&rules, t0, not_yet).is_none());
    }

    #[test]
    fn evaluate_first_due_rule_wins_by_position() {
        // Both rules are due; the later one is closer to now but loses.
        let rules = vec![
            Cron::new("0 8 * * *", 10),
            Cron::new("0 9 * * *", 4),
        ];
        let reference = at(2026, 2, 1, 7, 0, 0);
        let now = at(2026, 2, 1, 9, 30, 0);

        let due = evaluate(&rules, reference, now).unwrap();
        assert_eq!(due.index, 0);
        assert_eq!(due.schedule, "0 8 * * *");
        assert_eq!(due.target_replicas, 10);
    }

    #[test]
    fn evaluate_skips_rules_that_are_not_yet_due() {
        let rules = vec![
            Cron::new("0 22 * * *", 1),
            Cron::new("0 9 * * *", 4),
        ];
        let reference = at(2026, 2, 1, 7, 0, 0);
        let now = at(2026, 2, 1, 9, 30, 0);

        let due = evaluate(&rules, reference, now).unwrap();
        assert_eq!(due.index, 1);
        assert_eq!(due.target_replicas, 4);
    }

    #[test]
    fn evaluate_returns_none_when_nothing_due() {
        let rules = vec![Cron::new("0 0 1 1 *", 1), Cron::new("0 12 * * *", 2)];
        let reference = at(2026, 2, 1, 7, 0, 0);
        assert!(evaluate(&rules, reference, at(2026, 2, 1, 11, 59, 59)).is_none());
    }

    #[test]
    fn evaluate_skips_unparseable_rule_and_continues() {
        let rules = vec![Cron::new("not a cron", 9), Cron::new("*/1 * * * *", 2)];
        let reference = at(2026, 2, 1, 7, 0, 0);

        let due = evaluate(&rules, reference, at(2026, 2, 1, 7, 1, 0)).unwrap();
        assert_eq!(due.index, 1);
        assert_eq!(due.target_replicas, 2);
    }

    #[test]
    fn evaluate_skips_negative_replicas() {
        let rules = vec![Cron::new("*/1 * * * *", -1), Cron::new("*/1 * * * *", 0)];
        let reference = at(2026, 2, 1, 7, 0, 0);

        let due = evaluate(&rules, reference, at(2026, 2, 1, 7, 1, 0)).unwrap();
        assert_eq!(due.index, 1);
        assert_eq!(due.target_replicas, 0);
    }

    #[test]
    fn evaluate_empty_rules() {
        let now = at(2026, 2, 1, 7, 0, 0);
        assert!(evaluate(&[], now - Duration::days(1), now).is_none());
    }

    #[test]
    fn evaluate_is_deterministic() {
        let rules = vec![Cron::new("*/10 * * * *", 2), Cron::new("*/3 * * * *", 5)];
        let reference = at(2026, 2, 1, 7, 0, 0);
        let now = at(2026, 2, 1, 7, 4, 0);

        let first = evaluate(&rules, reference, now);
        let second = evaluate(&rules, reference, now);
        assert_eq!(first, second);
        assert_eq!(first.unwrap().index, 1);
    }
}

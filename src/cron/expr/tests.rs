use super::*;

#[test]
fn parses_five_field_expression() {
    let expr = parse_cron_expr("0 9 * * *").unwrap();
    assert_eq!(expr.minute, Field::Exact(0));
    assert_eq!(expr.hour, Field::Exact(9));
    assert_eq!(expr.dom, Field::Any);
    assert_eq!(expr.month, Field::Any);
    assert_eq!(expr.dow, Field::Any);
}

#[test]
fn parses_every_n_field() {
    let expr = parse_cron_expr("*/15 * * * *").unwrap();
    assert_eq!(expr.minute, Field::Every(15));
}

#[test]
fn expands_known_aliases() {
    assert_eq!(parse_cron_expr("@hourly").unwrap(), parse_cron_expr("0 * * * *").unwrap());
    assert_eq!(parse_cron_expr("@daily").unwrap(), parse_cron_expr("0 0 * * *").unwrap());
    assert_eq!(parse_cron_expr("@weekly").unwrap(), parse_cron_expr("0 0 * * 0").unwrap());
    assert_eq!(parse_cron_expr("@monthly").unwrap(), parse_cron_expr("0 0 1 * *").unwrap());
}

#[test]
fn rejects_wrong_field_count() {
    assert!(parse_cron_expr("0 9 * *").is_err());
    assert!(parse_cron_expr("0 9 * * * *").is_err());
}

#[test]
fn rejects_unknown_alias_and_garbage_fields() {
    assert!(parse_cron_expr("@never").is_err());
    assert!(parse_cron_expr("0 9 * * monday").is_err());
    assert!(parse_cron_expr("*/0 * * * *").is_err());
}

// Property 6.
#[test]
fn parse_is_idempotent_under_format() {
    for s in ["0 9 * * *", "*/15 * * * *", "0 0 1 * *", "5 4 3 2 1"] {
        let expr = parse_cron_expr(s).unwrap();
        let formatted = format_cron_expr(&expr);
        let reparsed = parse_cron_expr(&formatted).unwrap();
        assert_eq!(expr, reparsed);
    }
}

// Property 7.
#[test]
fn next_run_after_is_always_strictly_later() {
    let expr = parse_cron_expr("0 9 * * *").unwrap();
    for t in [0i64, 1705307400, -3600, 1_900_000_000] {
        assert!(next_run_after(&expr, t) > t);
    }
}

// Property 8.
#[test]
fn every_minute_fires_within_one_to_two_minutes() {
    let expr = parse_cron_expr("* * * * *").unwrap();
    let t = 1705307400; // minute-aligned
    let next = next_run_after(&expr, t);
    assert!(next >= t + 60 && next <= t + 120);
}

// S5.
#[test]
fn s5_daily_nine_am_from_830() {
    let expr = parse_cron_expr("0 9 * * *").unwrap();
    let from_ts = 1705307400; // 2024-01-15T08:30:00Z
    assert_eq!(next_run_after(&expr, from_ts), 1705309200); // 2024-01-15T09:00:00Z
}

#[test]
fn falls_back_a_week_when_schedule_is_unsatisfiable() {
    // Feb 30th never occurs.
    let expr = parse_cron_expr("0 0 30 2 *").unwrap();
    let from_ts = 1705307400;
    assert_eq!(next_run_after(&expr, from_ts), from_ts + 7 * 86400);
}

#[test]
fn dom_and_dow_are_anded_not_ored() {
    // The 1st of the month that is also a Monday: both restrictions apply.
    let expr = parse_cron_expr("0 0 1 * 1").unwrap();
    let from_ts = 1705307400; // 2024-01-15
    let next = next_run_after(&expr, from_ts);
    let bt = crate::cron::calendar::timestamp_to_broken(next);
    assert_eq!(bt.day, 1);
    assert_eq!(bt.dow, 1);
}

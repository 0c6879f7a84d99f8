//! Cron expression grammar (spec §4.G): five space-separated fields or one
//! of four aliases. Each field is `*`, `*/N`, or an exact decimal integer —
//! no ranges, lists, or step-from-a-range, by design.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Any,
    Every(u32),
    Exact(u32),
}

impl Field {
    fn parse(s: &str) -> Option<Self> {
        if s == "*" {
            return Some(Field::Any);
        }
        if let Some(n) = s.strip_prefix("*/") {
            let n: u32 = n.parse().ok()?;
            if n == 0 {
                return None;
            }
            return Some(Field::Every(n));
        }
        let v: u32 = s.parse().ok()?;
        Some(Field::Exact(v))
    }

    fn matches(self, value: u32) -> bool {
        match self {
            Field::Any => true,
            Field::Every(n) => value % n == 0,
            Field::Exact(v) => value == v,
        }
    }

    fn format(self) -> String {
        match self {
            Field::Any => "*".to_string(),
            Field::Every(n) => format!("*/{n}"),
            Field::Exact(v) => v.to_string(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// A parsed five-field cron expression: minute, hour, day-of-month, month,
/// day-of-week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronExpr {
    pub minute: Field,
    pub hour: Field,
    pub dom: Field,
    pub month: Field,
    pub dow: Field,
}

/// Expand a whole-schedule alias into its canonical five-field form.
fn expand_alias(s: &str) -> Option<&'static str> {
    match s {
        "@hourly" => Some("0 * * * *"),
        "@daily" => Some("0 0 * * *"),
        "@weekly" => Some("0 0 * * 0"),
        "@monthly" => Some("0 0 1 * *"),
        _ => None,
    }
}

/// Parse a cron schedule string: an alias, or exactly five space-separated
/// fields, no more and no fewer.
pub fn parse_cron_expr(input: &str) -> Result<CronExpr, String> {
    let trimmed = input.trim();
    let canonical = expand_alias(trimmed).unwrap_or(trimmed);

    let fields: Vec<&str> = canonical.split_whitespace().collect();
    if fields.len() != 5 {
        return Err(format!("expected 5 fields, got {}: '{input}'", fields.len()));
    }

    let minute = Field::parse(fields[0]).ok_or_else(|| format!("invalid minute field: '{}'", fields[0]))?;
    let hour = Field::parse(fields[1]).ok_or_else(|| format!("invalid hour field: '{}'", fields[1]))?;
    let dom = Field::parse(fields[2]).ok_or_else(|| format!("invalid day-of-month field: '{}'", fields[2]))?;
    let month = Field::parse(fields[3]).ok_or_else(|| format!("invalid month field: '{}'", fields[3]))?;
    let dow = Field::parse(fields[4]).ok_or_else(|| format!("invalid day-of-week field: '{}'", fields[4]))?;

    Ok(CronExpr { minute, hour, dom, month, dow })
}

/// Render a `CronExpr` back into its canonical five-field textual form.
pub fn format_cron_expr(expr: &CronExpr) -> String {
    format!("{} {} {} {} {}", expr.minute, expr.hour, expr.dom, expr.month, expr.dow)
}

impl CronExpr {
    /// All five fields match; day-of-month and day-of-week are ANDed, not
    /// ORed as POSIX cron traditionally does (see DESIGN.md's open-question
    /// note).
    fn matches(&self, bt: &crate::cron::calendar::BrokenTime) -> bool {
        self.minute.matches(bt.minute)
            && self.hour.matches(bt.hour)
            && self.dom.matches(bt.day)
            && self.month.matches(bt.month)
            && self.dow.matches(bt.dow)
    }
}

const SECONDS_PER_MINUTE: i64 = 60;
const MAX_SCAN_DAYS: i64 = 366;
const FALLBACK_SECONDS: i64 = 7 * 86400;

/// Smallest minute-aligned `t > from_ts` such that every field matches.
/// Scans minute by minute up to 366 days ahead; on overflow (e.g. an
/// unsatisfiable day-of-month/month combination), falls back to
/// `from_ts + 7 days` so callers never stall forever.
pub fn next_run_after(expr: &CronExpr, from_ts: i64) -> i64 {
    use crate::cron::calendar::timestamp_to_broken;

    let mut t = ((from_ts + SECONDS_PER_MINUTE) / SECONDS_PER_MINUTE) * SECONDS_PER_MINUTE;
    let limit = from_ts + MAX_SCAN_DAYS * 86400;

    while t <= limit {
        if expr.matches(&timestamp_to_broken(t)) {
            return t;
        }
        t += SECONDS_PER_MINUTE;
    }

    from_ts + FALLBACK_SECONDS
}

#[cfg(test)]
mod tests;

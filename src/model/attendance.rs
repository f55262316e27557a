use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One presence interval. A row with no `check_out` is an open interval:
/// the user is currently on shift. Presence is derived from `check_out`
/// rather than stored alongside it, so the two can never disagree.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id: i64,
    pub user_id: i64,
    pub check_in: NaiveDateTime,
    pub check_out: Option<NaiveDateTime>,
}

impl Attendance {
    pub fn is_present(&self) -> bool {
        self.check_out.is_none()
    }

    pub fn duration_hours(&self) -> Option<f64> {
        duration_hours(self.check_in, self.check_out)
    }
}

/// Worked hours of an interval, rounded to 2 decimal places. Open intervals
/// have no duration yet.
pub fn duration_hours(check_in: NaiveDateTime, check_out: Option<NaiveDateTime>) -> Option<f64> {
    let check_out = check_out?;
    let hours = (check_out - check_in).num_milliseconds() as f64 / 3_600_000.0;
    Some(round_hours(hours))
}

pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

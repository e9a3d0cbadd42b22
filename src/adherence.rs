use chrono::NaiveDate;
use serde::Serialize;

use crate::entities::medication;
use crate::entities::medication_history::{self, AdherenceStatus};

/// Aggregations over history rows already fetched from the store. Both the
/// summary endpoint and the dashboard stats go through `adherence_percent`,
/// so the two surfaces always agree on the same rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total: usize,
    pub taken: usize,
    pub missed: usize,
    pub pending: usize,
    pub delayed: usize,
    pub adherence_rate: u32,
}

/// Rounded percentage of taken doses. Zero when nothing was scheduled,
/// so an empty window never divides by zero.
pub fn adherence_percent(taken: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (taken as f64 / total as f64 * 100.0).round() as u32
}

pub fn summarize(rows: &[medication_history::Model]) -> HistorySummary {
    let mut summary = HistorySummary {
        total: rows.len(),
        taken: 0,
        missed: 0,
        pending: 0,
        delayed: 0,
        adherence_rate: 0,
    };
    for row in rows {
        match row.status {
            AdherenceStatus::Taken => summary.taken += 1,
            AdherenceStatus::Missed => summary.missed += 1,
            AdherenceStatus::Pending => summary.pending += 1,
            AdherenceStatus::Delayed => summary.delayed += 1,
        }
    }
    summary.adherence_rate = adherence_percent(summary.taken, summary.total);
    summary
}

/// Doses still unresolved or already missed today. Delayed doses do not
/// count here; they were eventually taken.
pub fn pending_alerts_today(rows: &[medication_history::Model], today: NaiveDate) -> usize {
    rows.iter()
        .filter(|row| {
            row.date == today
                && matches!(
                    row.status,
                    AdherenceStatus::Missed | AdherenceStatus::Pending
                )
        })
        .count()
}

pub fn is_alert(status: AdherenceStatus) -> bool {
    matches!(
        status,
        AdherenceStatus::Missed | AdherenceStatus::Pending | AdherenceStatus::Delayed
    )
}

/// Keeps only alert-bearing rows, in their incoming order. Callers pass
/// rows sorted date-descending and get them back still sorted.
pub fn alert_rows(rows: Vec<medication_history::Model>) -> Vec<medication_history::Model> {
    rows.into_iter()
        .filter(|row| is_alert(row.status))
        .collect()
}

/// Doses scheduled per day across the given medications, one per clock
/// time entry.
pub fn doses_per_day(medications: &[medication::Model]) -> usize {
    medications.iter().map(|m| m.times.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    fn dose(date: NaiveDate, status: AdherenceStatus) -> medication_history::Model {
        medication_history::Model {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            organization_id: None,
            medication_id: None,
            scheduled_time: "08:00".to_string(),
            scheduled_minutes: 480,
            status,
            date,
            created_at: date.and_hms_opt(8, 0, 0).unwrap(),
        }
    }

    fn pill(times: &[&str]) -> medication::Model {
        medication::Model {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            name: "Losartana".to_string(),
            dosage: "50mg".to_string(),
            frequency: "daily".to_string(),
            times: times.iter().map(|t| t.to_string()).collect(),
            active: true,
            created_at: day(1).and_hms_opt(9, 0, 0).unwrap(),
            updated_at: day(1).and_hms_opt(9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn rate_is_zero_without_history() {
        assert_eq!(adherence_percent(0, 0), 0);
        let summary = summarize(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.adherence_rate, 0);
    }

    #[test]
    fn rate_rounds_to_nearest_integer() {
        assert_eq!(adherence_percent(1, 3), 33);
        assert_eq!(adherence_percent(2, 3), 67);
        assert_eq!(adherence_percent(1, 2), 50);
        assert_eq!(adherence_percent(10, 10), 100);
    }

    #[test]
    fn rate_never_decreases_as_taken_grows() {
        let mut previous = 0;
        for taken in 0..=10 {
            let rate = adherence_percent(taken, 10);
            assert!(rate >= previous);
            previous = rate;
        }
        assert_eq!(previous, 100);
    }

    #[test]
    fn two_taken_of_four_summarizes_at_fifty_percent() {
        let today = day(10);
        let rows = vec![
            dose(today, AdherenceStatus::Taken),
            dose(today, AdherenceStatus::Taken),
            dose(today, AdherenceStatus::Missed),
            dose(today, AdherenceStatus::Pending),
        ];

        let summary = summarize(&rows);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.taken, 2);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.delayed, 0);
        assert_eq!(summary.adherence_rate, 50);

        assert_eq!(pending_alerts_today(&rows, today), 2);
    }

    #[test]
    fn same_day_alerts_skip_other_days_and_delayed_doses() {
        let today = day(10);
        let rows = vec![
            dose(today, AdherenceStatus::Missed),
            dose(today, AdherenceStatus::Delayed),
            dose(day(9), AdherenceStatus::Missed),
            dose(day(9), AdherenceStatus::Pending),
            dose(today, AdherenceStatus::Taken),
        ];
        assert_eq!(pending_alerts_today(&rows, today), 1);
    }

    #[test]
    fn alert_rows_drop_taken_and_keep_order() {
        let rows = vec![
            dose(day(12), AdherenceStatus::Missed),
            dose(day(11), AdherenceStatus::Taken),
            dose(day(10), AdherenceStatus::Delayed),
            dose(day(9), AdherenceStatus::Pending),
        ];
        let expected: Vec<NaiveDate> = vec![day(12), day(10), day(9)];

        let alerts = alert_rows(rows);
        let dates: Vec<NaiveDate> = alerts.iter().map(|r| r.date).collect();
        assert_eq!(dates, expected);
        assert!(alerts.iter().all(|r| is_alert(r.status)));
    }

    #[test]
    fn doses_per_day_sums_every_schedule_entry() {
        let meds = vec![
            pill(&["08:00", "20:00"]),
            pill(&["12:00"]),
            pill(&[]),
        ];
        assert_eq!(doses_per_day(&meds), 3);
    }
}

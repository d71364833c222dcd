//! Running (cumulative) win rate.

use crate::models::{MatchRecord, Outcome, WinRatePoint};

use super::StatsError;

/// Cumulative win fraction after each outcome.
///
/// Element `i` is the number of wins in `outcomes[..=i]` divided by `i + 1`.
/// Outcomes must already be in chronological order.
pub fn running_win_rate(outcomes: &[Outcome]) -> Result<Vec<f64>, StatsError> {
    if outcomes.is_empty() {
        return Err(StatsError::EmptyInput("no match outcomes".to_string()));
    }

    let mut wins = 0u32;
    Ok(outcomes
        .iter()
        .enumerate()
        .map(|(i, outcome)| {
            if outcome.is_win() {
                wins += 1;
            }
            wins as f64 / (i + 1) as f64
        })
        .collect())
}

/// Win rate series over matches, ordered by date.
///
/// Equal dates keep their input order. Matches without a decided outcome are
/// skipped.
pub fn win_rate_series(matches: &[MatchRecord]) -> Result<Vec<WinRatePoint>, StatsError> {
    let mut decided: Vec<(&MatchRecord, Outcome)> = matches
        .iter()
        .filter_map(|m| m.outcome.map(|o| (m, o)))
        .collect();
    decided.sort_by_key(|(m, _)| m.date);

    let outcomes: Vec<Outcome> = decided.iter().map(|(_, o)| *o).collect();
    let rates = running_win_rate(&outcomes)?;

    Ok(decided
        .into_iter()
        .zip(rates)
        .map(|((m, outcome), win_rate)| WinRatePoint {
            date: m.date,
            match_id: m.id.clone(),
            outcome,
            win_rate,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::round_to;
    use chrono::{TimeZone, Utc};
    use crate::models::Outcome::{Loss, Win};

    #[test]
    fn test_single_win() {
        assert_eq!(running_win_rate(&[Win]).unwrap(), vec![1.0]);
    }

    #[test]
    fn test_single_loss_starts_at_zero() {
        assert_eq!(running_win_rate(&[Loss, Win]).unwrap(), vec![0.0, 0.5]);
    }

    #[test]
    fn test_win_loss_win() {
        let rates: Vec<f64> = running_win_rate(&[Win, Loss, Win])
            .unwrap()
            .into_iter()
            .map(|r| round_to(r, 3))
            .collect();
        assert_eq!(rates, vec![1.0, 0.5, 0.667]);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            running_win_rate(&[]),
            Err(StatsError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_properties_hold() {
        let outcomes = [Loss, Loss, Win, Win, Loss, Win, Win];
        let rates = running_win_rate(&outcomes).unwrap();
        assert_eq!(rates.len(), outcomes.len());
        assert!(rates.iter().all(|r| (0.0..=1.0).contains(r)));
        let wins = outcomes.iter().filter(|o| o.is_win()).count() as f64;
        assert_eq!(*rates.last().unwrap(), wins / outcomes.len() as f64);
    }

    #[test]
    fn test_idempotent() {
        let outcomes = [Win, Loss, Loss, Win];
        assert_eq!(
            running_win_rate(&outcomes).unwrap(),
            running_win_rate(&outcomes).unwrap()
        );
    }

    #[test]
    fn test_series_sorts_by_date_stably() {
        let day = |d| Utc.with_ymd_and_hms(2024, 3, d, 20, 0, 0).unwrap();
        let matches = vec![
            MatchRecord::new("late", day(5), "Bind").with_outcome(Win),
            MatchRecord::new("tie-a", day(2), "Ascent").with_outcome(Loss),
            MatchRecord::new("undecided", day(3), "Haven"),
            MatchRecord::new("tie-b", day(2), "Split").with_outcome(Win),
        ];

        let series = win_rate_series(&matches).unwrap();
        let ids: Vec<_> = series.iter().map(|p| p.match_id.as_str()).collect();
        assert_eq!(ids, vec!["tie-a", "tie-b", "late"]);
        let rates: Vec<_> = series.iter().map(|p| round_to(p.win_rate, 3)).collect();
        assert_eq!(rates, vec![0.0, 0.5, 0.667]);
    }

    #[test]
    fn test_series_without_decided_matches() {
        let matches = vec![MatchRecord::new("m", Utc::now(), "Bind")];
        assert!(win_rate_series(&matches).is_err());
    }
}

// SPDX-License-Identifier: MIT

//! Leaderboard aggregation over in-memory submission data.
//!
//! Everything in this module is a pure function of its inputs:
//! - Ranking engine: derives per-participant stats and assigns ranks
//! - Streak calculator: trailing consecutive goal-met days
//! - Attendance grid: fixed 30-cell per-day status for a participant
//!
//! Stats are recomputed on every request from the submission rows the
//! caller already fetched. There is no cached copy anywhere.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Steps per day needed for a day to count toward goals and streaks.
pub const DAILY_STEP_GOAL: u32 = 10_000;

/// Every challenge runs exactly 30 calendar days.
pub const CHALLENGE_DAYS: u32 = 30;

/// One submission row as the aggregator sees it: a calendar day and a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub step_count: u32,
}

/// One enrolled participant with their submissions for the target challenge.
///
/// The submission list may be empty; such participants still receive a rank.
#[derive(Debug, Clone)]
pub struct Participant {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_initial: String,
    pub submissions: Vec<DailyEntry>,
}

/// Field the leaderboard is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    TotalSteps,
    AvgDailySteps,
    GoalDays,
    CurrentStreak,
    CompletionPercentage,
}

impl SortKey {
    /// Parse a query-string value. Unrecognized values fall back to
    /// `total_steps` rather than erroring.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "total_steps" => Self::TotalSteps,
            "avg_daily_steps" => Self::AvgDailySteps,
            "goal_days" => Self::GoalDays,
            "current_streak" => Self::CurrentStreak,
            "completion_percentage" => Self::CompletionPercentage,
            _ => Self::TotalSteps,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TotalSteps => "total_steps",
            Self::AvgDailySteps => "avg_daily_steps",
            Self::GoalDays => "goal_days",
            Self::CurrentStreak => "current_streak",
            Self::CompletionPercentage => "completion_percentage",
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self::TotalSteps
    }
}

/// Derived per-participant statistics with an assigned rank.
///
/// Never persisted; recomputed for every leaderboard request.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ParticipantStanding {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_initial: String,
    /// 1-based position in the final order (contiguous, no shared ranks)
    pub rank: u32,
    pub total_steps: u64,
    pub days_submitted: u32,
    pub avg_daily_steps: f64,
    /// Days with `step_count >= DAILY_STEP_GOAL`
    pub goal_days: u32,
    pub current_streak: u32,
    /// `days_submitted / 30 * 100`, rounded to one decimal
    pub completion_percentage: f64,
    /// Full submission history, date ascending (for grid rendering)
    pub daily_submissions: Vec<DailyEntry>,
}

/// Rank all participants of a challenge.
///
/// `today` is passed explicitly so the computation stays a pure function
/// of its inputs (streaks are anchored on it). Ties on the sort key are
/// broken by descending total steps, then ascending first name, so the
/// output order is a strict total order and ranks are deterministic.
pub fn rank_participants(
    participants: Vec<Participant>,
    sort_key: SortKey,
    today: NaiveDate,
) -> Vec<ParticipantStanding> {
    let mut standings: Vec<ParticipantStanding> = participants
        .into_iter()
        .map(|p| compute_standing(p, today))
        .collect();

    standings.sort_by(|a, b| {
        let primary = match sort_key {
            SortKey::TotalSteps => b.total_steps.cmp(&a.total_steps),
            SortKey::AvgDailySteps => b.avg_daily_steps.total_cmp(&a.avg_daily_steps),
            SortKey::GoalDays => b.goal_days.cmp(&a.goal_days),
            SortKey::CurrentStreak => b.current_streak.cmp(&a.current_streak),
            SortKey::CompletionPercentage => {
                b.completion_percentage.total_cmp(&a.completion_percentage)
            }
        };
        primary
            .then_with(|| b.total_steps.cmp(&a.total_steps))
            .then_with(|| a.first_name.cmp(&b.first_name))
    });

    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = (i + 1) as u32;
    }

    standings
}

/// Derive the stats for one participant. Rank is assigned later.
fn compute_standing(participant: Participant, today: NaiveDate) -> ParticipantStanding {
    let mut submissions = participant.submissions;
    submissions.sort_by_key(|s| s.date);

    let total_steps: u64 = submissions.iter().map(|s| u64::from(s.step_count)).sum();
    let days_submitted = submissions.len() as u32;
    let goal_days = submissions
        .iter()
        .filter(|s| s.step_count >= DAILY_STEP_GOAL)
        .count() as u32;

    let avg_daily_steps = if days_submitted > 0 {
        total_steps as f64 / f64::from(days_submitted)
    } else {
        0.0
    };

    let completion_percentage =
        round_one_decimal(f64::from(days_submitted) / f64::from(CHALLENGE_DAYS) * 100.0);

    let current_streak = current_streak(&submissions, today);

    ParticipantStanding {
        user_id: participant.user_id,
        first_name: participant.first_name,
        last_initial: participant.last_initial,
        rank: 0,
        total_steps,
        days_submitted,
        avg_daily_steps,
        goal_days,
        current_streak,
        completion_percentage,
        daily_submissions: submissions,
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Length of the current consecutive-day streak of goal-met days.
///
/// Anchored on today if today has a qualifying submission, otherwise on
/// yesterday (so a streak isn't "broken" before the day's steps are in).
/// Walks backward one day at a time until a gap.
pub fn current_streak(submissions: &[DailyEntry], today: NaiveDate) -> u32 {
    let goal_dates: HashSet<NaiveDate> = submissions
        .iter()
        .filter(|s| s.step_count >= DAILY_STEP_GOAL)
        .map(|s| s.date)
        .collect();

    let yesterday = match today.checked_sub_days(Days::new(1)) {
        Some(d) => d,
        None => return 0,
    };

    let anchor = if goal_dates.contains(&today) {
        today
    } else if goal_dates.contains(&yesterday) {
        yesterday
    } else {
        return 0;
    };

    let mut streak = 0u32;
    let mut day = anchor;
    while goal_dates.contains(&day) {
        streak += 1;
        day = match day.checked_sub_days(Days::new(1)) {
            Some(d) => d,
            None => break,
        };
    }

    streak
}

/// Status of one calendar day in the attendance grid.
///
/// Strict priority order: leader > completed > partial > missed > upcoming.
/// Exactly one category applies to every cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum DayCategory {
    /// Daily top submitter (externally supplied signal)
    Leader,
    /// Goal met (>= 10k steps)
    Completed,
    /// Submitted but below goal
    Partial,
    /// Elapsed day with no submission
    Missed,
    /// Day not yet elapsed
    Upcoming,
}

/// One cell of the 30-day attendance grid.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DayCell {
    /// 1-based offset from the challenge start date
    pub day_number: u32,
    pub date: NaiveDate,
    pub step_count: Option<u32>,
    pub category: DayCategory,
}

/// Build the 30-cell attendance grid for one participant.
///
/// Always returns exactly 30 cells regardless of how many days have
/// elapsed or how many submissions exist. `leader_dates` holds the dates
/// on which this participant was the daily top submitter (may be empty).
pub fn attendance_grid(
    start_date: NaiveDate,
    submissions: &[DailyEntry],
    leader_dates: &HashSet<NaiveDate>,
    today: NaiveDate,
) -> Vec<DayCell> {
    let by_date: HashMap<NaiveDate, u32> =
        submissions.iter().map(|s| (s.date, s.step_count)).collect();

    (0..CHALLENGE_DAYS)
        .map(|offset| {
            let date = start_date + Days::new(u64::from(offset));
            let step_count = by_date.get(&date).copied();

            let category = match step_count {
                Some(_) if leader_dates.contains(&date) => DayCategory::Leader,
                Some(steps) if steps >= DAILY_STEP_GOAL => DayCategory::Completed,
                Some(_) => DayCategory::Partial,
                None if date < today => DayCategory::Missed,
                None => DayCategory::Upcoming,
            };

            DayCell {
                day_number: offset + 1,
                date,
                step_count,
                category,
            }
        })
        .collect()
}

/// Determine the daily top submitter for each date of a challenge.
///
/// Input is every (participant, submission) pair for the challenge.
/// Ties on step count are broken by the smaller user id so the result is
/// deterministic regardless of input order.
pub fn daily_leaders(entries: &[(Uuid, DailyEntry)]) -> HashMap<NaiveDate, Uuid> {
    let mut best: HashMap<NaiveDate, (u32, Uuid)> = HashMap::new();

    for (user_id, entry) in entries {
        best.entry(entry.date)
            .and_modify(|(steps, winner)| {
                if entry.step_count > *steps
                    || (entry.step_count == *steps && *user_id < *winner)
                {
                    *steps = entry.step_count;
                    *winner = *user_id;
                }
            })
            .or_insert((entry.step_count, *user_id));
    }

    best.into_iter()
        .map(|(date, (_, user_id))| (date, user_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(y: i32, m: u32, d: u32, steps: u32) -> DailyEntry {
        DailyEntry {
            date: date(y, m, d),
            step_count: steps,
        }
    }

    fn participant(name: &str, submissions: Vec<DailyEntry>) -> Participant {
        Participant {
            user_id: Uuid::new_v4(),
            first_name: name.to_string(),
            last_initial: "T".to_string(),
            submissions,
        }
    }

    fn today() -> NaiveDate {
        date(2026, 8, 29)
    }

    #[test]
    fn test_standing_count_matches_participant_count() {
        let participants = vec![
            participant("Alice", vec![entry(2026, 8, 20, 12000)]),
            participant("Bob", vec![]),
            participant("Carol", vec![entry(2026, 8, 21, 8000)]),
        ];

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        assert_eq!(standings.len(), 3);
    }

    #[test]
    fn test_ranks_are_contiguous_from_one() {
        let participants: Vec<Participant> = (0..5)
            .map(|i| participant(&format!("User{}", i), vec![entry(2026, 8, 20, 1000 * i)]))
            .collect();

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        let ranks: Vec<u32> = standings.iter().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_total_steps_sort_is_non_increasing() {
        let participants = vec![
            participant("Alice", vec![entry(2026, 8, 20, 5000)]),
            participant(
                "Bob",
                vec![entry(2026, 8, 20, 15000), entry(2026, 8, 21, 9000)],
            ),
            participant("Carol", vec![entry(2026, 8, 20, 11000)]),
        ];

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        for pair in standings.windows(2) {
            assert!(pair[0].total_steps >= pair[1].total_steps);
        }
        assert_eq!(standings[0].first_name, "Bob");
    }

    #[test]
    fn test_zero_submission_participant_gets_zero_stats_and_a_rank() {
        let participants = vec![
            participant("Alice", vec![entry(2026, 8, 20, 12000)]),
            participant("Bob", vec![]),
        ];

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        let bob = standings.iter().find(|s| s.first_name == "Bob").unwrap();

        assert_eq!(bob.total_steps, 0);
        assert_eq!(bob.days_submitted, 0);
        assert_eq!(bob.avg_daily_steps, 0.0);
        assert_eq!(bob.goal_days, 0);
        assert_eq!(bob.completion_percentage, 0.0);
        assert_eq!(bob.rank, 2);
    }

    #[test]
    fn test_tie_break_by_total_steps_then_first_name() {
        // Equal goal_days; Bob has more total steps, so he wins the tie.
        // Alice and Carol tie on both goal_days and total steps; Alice
        // sorts first lexicographically.
        let participants = vec![
            participant("Carol", vec![entry(2026, 8, 20, 11000)]),
            participant("Alice", vec![entry(2026, 8, 20, 11000)]),
            participant("Bob", vec![entry(2026, 8, 20, 13000)]),
        ];

        let standings = rank_participants(participants, SortKey::GoalDays, today());
        let names: Vec<&str> = standings.iter().map(|s| s.first_name.as_str()).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Carol"]);
    }

    #[test]
    fn test_unrecognized_sort_key_falls_back_to_total_steps() {
        assert_eq!(SortKey::parse("bogus"), SortKey::TotalSteps);
        assert_eq!(SortKey::parse(""), SortKey::TotalSteps);
        assert_eq!(SortKey::parse("current_streak"), SortKey::CurrentStreak);
    }

    #[test]
    fn test_completion_percentage_one_decimal() {
        let submissions: Vec<DailyEntry> = (1..=9).map(|d| entry(2026, 8, d, 5000)).collect();
        let participants = vec![participant("Alice", submissions)];

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        assert_eq!(standings[0].completion_percentage, 30.0);

        // 7/30 = 23.333... rounds to 23.3
        let submissions: Vec<DailyEntry> = (1..=7).map(|d| entry(2026, 8, d, 5000)).collect();
        let standings = rank_participants(
            vec![participant("Bob", submissions)],
            SortKey::TotalSteps,
            today(),
        );
        assert_eq!(standings[0].completion_percentage, 23.3);
    }

    #[test]
    fn test_daily_submissions_are_date_ascending() {
        let participants = vec![participant(
            "Alice",
            vec![
                entry(2026, 8, 25, 9000),
                entry(2026, 8, 20, 12000),
                entry(2026, 8, 22, 7000),
            ],
        )];

        let standings = rank_participants(participants, SortKey::TotalSteps, today());
        let dates: Vec<NaiveDate> = standings[0]
            .daily_submissions
            .iter()
            .map(|s| s.date)
            .collect();
        assert_eq!(
            dates,
            vec![date(2026, 8, 20), date(2026, 8, 22), date(2026, 8, 25)]
        );
    }

    #[test]
    fn test_streak_wired_into_current_streak_sort() {
        let streaker = participant(
            "Alice",
            vec![
                entry(2026, 8, 27, 11000),
                entry(2026, 8, 28, 12000),
                entry(2026, 8, 29, 10000),
            ],
        );
        // More total steps but no active streak
        let sprinter = participant("Bob", vec![entry(2026, 8, 10, 90000)]);

        let standings =
            rank_participants(vec![sprinter, streaker], SortKey::CurrentStreak, today());
        assert_eq!(standings[0].first_name, "Alice");
        assert_eq!(standings[0].current_streak, 3);
        assert_eq!(standings[1].current_streak, 0);
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let participants = vec![
            participant(
                "Alice",
                vec![entry(2026, 8, 20, 12000), entry(2026, 8, 21, 4000)],
            ),
            participant("Bob", vec![entry(2026, 8, 20, 12000)]),
        ];

        let first = rank_participants(participants.clone(), SortKey::AvgDailySteps, today());
        let second = rank_participants(participants, SortKey::AvgDailySteps, today());

        let a = serde_json::to_string(&first).unwrap();
        let b = serde_json::to_string(&second).unwrap();
        assert_eq!(a, b);
    }

    // ─── Streak Calculator ───────────────────────────────────────

    #[test]
    fn test_streak_three_consecutive_days_ending_today() {
        let submissions = vec![
            entry(2026, 8, 27, 10000),
            entry(2026, 8, 28, 11000),
            entry(2026, 8, 29, 12000),
        ];
        assert_eq!(current_streak(&submissions, today()), 3);
    }

    #[test]
    fn test_streak_broken_chain_counts_from_anchor() {
        // Gap on the 27th: only today and yesterday count.
        let submissions = vec![
            entry(2026, 8, 25, 10000),
            entry(2026, 8, 26, 11000),
            entry(2026, 8, 28, 11000),
            entry(2026, 8, 29, 12000),
        ];
        assert_eq!(current_streak(&submissions, today()), 2);
    }

    #[test]
    fn test_streak_anchors_on_yesterday_when_today_missing() {
        let submissions = vec![entry(2026, 8, 27, 10000), entry(2026, 8, 28, 11000)];
        assert_eq!(current_streak(&submissions, today()), 2);
    }

    #[test]
    fn test_streak_today_only_with_gap_yesterday() {
        let submissions = vec![entry(2026, 8, 26, 10000), entry(2026, 8, 29, 12000)];
        assert_eq!(current_streak(&submissions, today()), 1);
    }

    #[test]
    fn test_streak_sub_goal_days_do_not_count() {
        let submissions = vec![entry(2026, 8, 28, 9999), entry(2026, 8, 29, 9999)];
        assert_eq!(current_streak(&submissions, today()), 0);
    }

    #[test]
    fn test_streak_no_submissions() {
        assert_eq!(current_streak(&[], today()), 0);
    }

    // ─── Attendance Grid ─────────────────────────────────────────

    #[test]
    fn test_grid_always_thirty_cells() {
        let start = date(2026, 8, 19); // 10 days elapsed as of today()
        let grid = attendance_grid(start, &[], &HashSet::new(), today());
        assert_eq!(grid.len(), 30);

        let day_numbers: Vec<u32> = grid.iter().map(|c| c.day_number).collect();
        assert_eq!(day_numbers, (1..=30).collect::<Vec<u32>>());
    }

    #[test]
    fn test_grid_categories_for_partially_elapsed_challenge() {
        // Challenge started 10 days ago; 3 goal days, 2 sub-goal days.
        let start = date(2026, 8, 19);
        let submissions = vec![
            entry(2026, 8, 19, 12000),
            entry(2026, 8, 20, 10000),
            entry(2026, 8, 21, 4000),
            entry(2026, 8, 23, 11000),
            entry(2026, 8, 24, 9999),
        ];

        let grid = attendance_grid(start, &submissions, &HashSet::new(), today());

        assert_eq!(grid[0].category, DayCategory::Completed); // day 1
        assert_eq!(grid[1].category, DayCategory::Completed); // day 2
        assert_eq!(grid[2].category, DayCategory::Partial); // day 3
        assert_eq!(grid[3].category, DayCategory::Missed); // day 4, elapsed gap
        assert_eq!(grid[4].category, DayCategory::Completed); // day 5
        assert_eq!(grid[5].category, DayCategory::Partial); // day 6
        for cell in &grid[6..10] {
            assert_eq!(cell.category, DayCategory::Missed);
        }
        // Day 11 is today with no submission: not yet missed.
        assert_eq!(grid[10].category, DayCategory::Upcoming);
        for cell in &grid[11..] {
            assert_eq!(cell.category, DayCategory::Upcoming);
        }
    }

    #[test]
    fn test_grid_leader_flag_takes_priority() {
        let start = date(2026, 8, 19);
        let submissions = vec![entry(2026, 8, 19, 12000)];
        let leader_dates: HashSet<NaiveDate> = [date(2026, 8, 19)].into_iter().collect();

        let grid = attendance_grid(start, &submissions, &leader_dates, today());
        assert_eq!(grid[0].category, DayCategory::Leader);
        assert_eq!(grid[0].step_count, Some(12000));
    }

    #[test]
    fn test_grid_future_challenge_is_all_upcoming() {
        let start = date(2026, 9, 10);
        let grid = attendance_grid(start, &[], &HashSet::new(), today());
        assert!(grid.iter().all(|c| c.category == DayCategory::Upcoming));
    }

    // ─── Daily Leaders ───────────────────────────────────────────

    #[test]
    fn test_daily_leaders_picks_max_per_date() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let entries = vec![
            (a, entry(2026, 8, 20, 12000)),
            (b, entry(2026, 8, 20, 15000)),
            (a, entry(2026, 8, 21, 8000)),
        ];

        let leaders = daily_leaders(&entries);
        assert_eq!(leaders.get(&date(2026, 8, 20)), Some(&b));
        assert_eq!(leaders.get(&date(2026, 8, 21)), Some(&a));
    }

    #[test]
    fn test_daily_leaders_tie_is_deterministic() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let smaller = a.min(b);

        let forward = vec![(a, entry(2026, 8, 20, 9000)), (b, entry(2026, 8, 20, 9000))];
        let reverse = vec![(b, entry(2026, 8, 20, 9000)), (a, entry(2026, 8, 20, 9000))];

        assert_eq!(
            daily_leaders(&forward).get(&date(2026, 8, 20)),
            Some(&smaller)
        );
        assert_eq!(
            daily_leaders(&reverse).get(&date(2026, 8, 20)),
            Some(&smaller)
        );
    }
}

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use step_challenge::services::leaderboard::{
    daily_leaders, rank_participants, DailyEntry, Participant, SortKey,
};
use uuid::Uuid;

/// Build a field of participants with deterministic pseudo-random step
/// counts spread over a full 30-day challenge.
fn build_participants(count: usize, start: NaiveDate) -> Vec<Participant> {
    (0..count)
        .map(|i| {
            let submissions = (0..30u64)
                .filter(|day| (i as u64 + day) % 7 != 0) // some missed days
                .map(|day| DailyEntry {
                    date: start + chrono::Days::new(day),
                    step_count: 4_000 + ((i as u32 * 37 + day as u32 * 911) % 12_000),
                })
                .collect();

            Participant {
                user_id: Uuid::new_v4(),
                first_name: format!("User{}", i),
                last_initial: "B".to_string(),
                submissions,
            }
        })
        .collect()
}

fn benchmark_leaderboard(c: &mut Criterion) {
    let start = NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date");
    let today = NaiveDate::from_ymd_opt(2026, 8, 29).expect("valid date");

    let participants = build_participants(500, start);

    let entries: Vec<(Uuid, DailyEntry)> = participants
        .iter()
        .flat_map(|p| p.submissions.iter().map(|s| (p.user_id, *s)))
        .collect();

    let mut group = c.benchmark_group("leaderboard");

    group.bench_function("rank_500_participants_total_steps", |b| {
        b.iter(|| {
            rank_participants(
                black_box(participants.clone()),
                SortKey::TotalSteps,
                today,
            )
        })
    });

    group.bench_function("rank_500_participants_current_streak", |b| {
        b.iter(|| {
            rank_participants(
                black_box(participants.clone()),
                SortKey::CurrentStreak,
                today,
            )
        })
    });

    group.bench_function("daily_leaders_500_participants", |b| {
        b.iter(|| daily_leaders(black_box(&entries)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_leaderboard);
criterion_main!(benches);

//! Performance benchmarks for match scoring

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use duo_ladder::rank::{fairness_multiplier, Division, RankInfo, Tier};
use duo_ladder::scheduler::PollIntervalPolicy;
use duo_ladder::scoring::ScoringPipeline;
use duo_ladder::types::{MatchRecord, PlayerGameStats};

fn stats(player_id: &str, kills: u32, deaths: u32, rank: RankInfo) -> PlayerGameStats {
    PlayerGameStats {
        player_id: player_id.to_string(),
        champion_name: "Ahri".to_string(),
        kills,
        deaths,
        assists: 11,
        team_id: 100,
        off_role: true,
        off_champion: false,
        double_kills: Some(2),
        triple_kills: Some(1),
        quadra_kills: Some(0),
        penta_kills: Some(0),
        first_blood: Some(true),
        rank_before: rank,
        rank_after: rank,
    }
}

fn bench_record() -> MatchRecord {
    MatchRecord {
        match_id: "EUW1_1000".to_string(),
        duo_id: "bench".to_string(),
        win: true,
        remake: false,
        surrender: false,
        duration_secs: 1620,
        game_creation: Utc::now(),
        noob: stats("noob", 6, 4, RankInfo::divided(Tier::Silver, Division::II)),
        carry: stats("carry", 12, 0, RankInfo::divided(Tier::Diamond, Division::I)),
        scored: false,
        points_awarded: 0,
        discovered_at: Utc::now(),
    }
}

fn bench_score_match(c: &mut Criterion) {
    let pipeline = ScoringPipeline::default();
    let record = bench_record();

    c.bench_function("score_single_match", |b| {
        b.iter(|| black_box(pipeline.score(black_box(&record), 4, -2)))
    });
}

fn bench_score_season(c: &mut Criterion) {
    let pipeline = ScoringPipeline::default();
    let records: Vec<MatchRecord> = (0..500)
        .map(|i| {
            let mut record = bench_record();
            record.match_id = format!("EUW1_{}", 1000 + i);
            record.win = i % 3 != 0;
            record.duration_secs = 900 + (i as u32 * 7) % 1500;
            record
        })
        .collect();

    c.bench_function("score_500_matches_with_streaks", |b| {
        b.iter(|| {
            let mut noob_streak = 0;
            let mut carry_streak = 0;
            let mut total = 0i64;
            for record in &records {
                let result = pipeline.score(record, noob_streak, carry_streak);
                noob_streak = result.noob.new_streak;
                carry_streak = result.carry.new_streak;
                total += i64::from(result.total);
            }
            black_box(total)
        })
    });
}

fn bench_fairness_multiplier(c: &mut Criterion) {
    let ranks: Vec<RankInfo> = [
        Tier::Iron,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Emerald,
        Tier::Diamond,
    ]
    .iter()
    .flat_map(|tier| {
        [Division::IV, Division::III, Division::II, Division::I]
            .into_iter()
            .map(move |division| RankInfo::divided(*tier, division))
    })
    .chain([
        RankInfo::apex(Tier::Master),
        RankInfo::apex(Tier::Grandmaster),
        RankInfo::apex(Tier::Challenger),
    ])
    .collect();

    c.bench_function("fairness_all_rank_pairs", |b| {
        b.iter(|| {
            let mut sum = 0.0;
            for a in &ranks {
                for p in &ranks {
                    sum += fairness_multiplier(black_box(a), black_box(p));
                }
            }
            black_box(sum)
        })
    });
}

fn bench_poll_interval(c: &mut Criterion) {
    let policy = PollIntervalPolicy::default();

    c.bench_function("ideal_interval_0_to_100_pairs", |b| {
        b.iter(|| {
            for pairs in 0..=100 {
                black_box(policy.ideal_interval(black_box(pairs)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_score_match,
    bench_score_season,
    bench_fairness_multiplier,
    bench_poll_interval
);
criterion_main!(benches);

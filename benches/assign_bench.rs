//! Criterion benchmarks for u-assign engines.
//!
//! Uses seeded synthetic rosters to measure ranking, rule evaluation,
//! and rebalancing overhead at several team sizes.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use u_assign::config::{AssignmentConfig, BusinessHours};
use u_assign::model::{AgentMetrics, Availability, Ticket, TicketPriority};
use u_assign::rebalance::{RebalanceTrigger, Rebalancer};
use u_assign::rules::{AssignmentRule, RuleEngine};
use u_assign::scoring::ScoringEngine;

const CATEGORIES: [&str; 5] = ["billing", "technical", "account", "shipping", "general"];

// ===========================================================================
// Synthetic data
// ===========================================================================

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap()
}

fn config() -> AssignmentConfig {
    AssignmentConfig::default().with_business_hours(BusinessHours::always())
}

fn roster(n: usize, rng: &mut StdRng) -> Vec<AgentMetrics> {
    (0..n)
        .map(|i| {
            let availability = match rng.random_range(0..10) {
                0 => Availability::Away,
                1..=2 => Availability::Busy,
                _ => Availability::Available,
            };
            AgentMetrics::new(format!("A{i}"))
                .with_availability(availability)
                .with_workload(rng.random_range(0..=10), 10)
                .with_resolution(rng.random_range(0.5..1.0), rng.random_range(1.0..48.0))
                .with_satisfaction(rng.random_range(2.5..5.0))
                .with_category_expertise(CATEGORIES[i % CATEGORIES.len()], rng.random_range(0.0..1.0))
        })
        .collect()
}

/// Open tickets matching each agent's current workload.
fn backlog(agents: &[AgentMetrics], rng: &mut StdRng) -> Vec<Ticket> {
    agents
        .iter()
        .flat_map(|a| (0..a.current_workload).map(move |j| (a.id.clone(), j)))
        .map(|(agent, j)| {
            Ticket::new(
                format!("{agent}-{j}"),
                TicketPriority::Medium,
                CATEGORIES[rng.random_range(0..CATEGORIES.len())],
                now() - Duration::minutes(rng.random_range(0..600)),
            )
            .with_assignee(agent)
        })
        .collect()
}

fn rules(n: usize) -> Vec<AssignmentRule> {
    (0..n)
        .map(|i| {
            AssignmentRule::new(format!("r{i}"), format!("rule {i}"), i as i32, now())
                .with_categories([CATEGORIES[i % CATEGORIES.len()]])
                .with_priorities([TicketPriority::Urgent])
                .with_keywords([format!("kw{i}")])
                .assign_to_team("tier2")
        })
        .collect()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    group.sample_size(20);

    for &n in &[10usize, 100, 1000] {
        let mut rng = StdRng::seed_from_u64(42);
        let agents = roster(n, &mut rng);
        let engine = ScoringEngine::standard(&config());
        let ticket = Ticket::new("T1", TicketPriority::High, "billing", now());
        group.bench_with_input(BenchmarkId::from_parameter(n), &agents, |b, agents| {
            b.iter(|| black_box(engine.rank(black_box(&ticket), black_box(agents), now())))
        });
    }
    group.finish();
}

fn bench_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("rules");

    for &n in &[10usize, 100] {
        let rules = rules(n);
        // Matches nothing, so every rule is examined
        let ticket = Ticket::new("T1", TicketPriority::Low, "billing", now()).with_text("invoice", "");
        let at = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &rules, |b, rules| {
            b.iter(|| black_box(RuleEngine::evaluate(black_box(&ticket), black_box(rules), at)))
        });
    }
    group.finish();
}

fn bench_rebalance(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebalance");
    group.sample_size(10);

    for &n in &[10usize, 50, 200] {
        let mut rng = StdRng::seed_from_u64(7);
        let agents = roster(n, &mut rng);
        let tickets = backlog(&agents, &mut rng);
        let config = config().with_max_rebalance_moves(n * 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(agents, tickets),
            |b, (agents, tickets)| {
                b.iter(|| {
                    let result = Rebalancer::run(
                        black_box(agents),
                        black_box(tickets),
                        &config,
                        RebalanceTrigger::Manual,
                        now(),
                    );
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_rank, bench_rules, bench_rebalance);
criterion_main!(benches);

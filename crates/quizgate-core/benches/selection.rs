use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use quizgate_core::codec::IncorrectSet;
use quizgate_core::model::{AssessmentConfig, QuestionBank, QuestionSpec};
use quizgate_core::pool::{select_questions, PriorAttempt};

fn bank(n: usize) -> QuestionBank {
    (0..n)
        .map(|i| QuestionSpec {
            id: format!("q{i}"),
            name: format!("Question {i}"),
            stem: String::new(),
            kind: Default::default(),
            correct_response: None,
            feedback: Default::default(),
        })
        .collect()
}

fn bench_pooled_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("pooled_selection");
    let mut rng = StdRng::seed_from_u64(11);

    for (n, pool_total) in [(20usize, 10usize), (200, 25), (1000, 100)] {
        let mut bank = bank(n);
        let config = AssessmentConfig {
            pool: true,
            pool_total,
            ..Default::default()
        };
        group.bench_function(BenchmarkId::from_parameter(format!("{pool_total}_of_{n}")), |b| {
            b.iter(|| {
                select_questions(
                    &mut bank,
                    black_box(&config),
                    &PriorAttempt::fresh(),
                    &[],
                    &mut rng,
                )
            })
        });
    }

    group.finish();
}

fn bench_incorrect_set(c: &mut Criterion) {
    let mut group = c.benchmark_group("incorrect_set");
    let bank = bank(200);
    let encoded = (0..200)
        .step_by(4)
        .enumerate()
        .map(|(i, org)| format!("{i}|{org}"))
        .collect::<Vec<_>>()
        .join("-");

    group.bench_function("decode", |b| {
        b.iter(|| IncorrectSet::decode(black_box(&encoded)))
    });

    group.bench_function("decode_and_resolve", |b| {
        b.iter(|| {
            IncorrectSet::decode(black_box(&encoded)).and_then(|set| set.resolve(&bank, 200))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_pooled_selection, bench_incorrect_set);
criterion_main!(benches);

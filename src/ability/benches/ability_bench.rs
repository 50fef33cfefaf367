//! Rule engine benchmarks
//!
//! Indexed checks should stay flat as unrelated rules accumulate; any-of
//! checks scan every rule and grow with the rule count.

use cretoai_ability::{Ability, AbilityConfig, Conditions, Subject, SubjectClass};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn create_ability(count: usize, config: AbilityConfig) -> (Ability, SubjectClass) {
    let mut ability = Ability::with_config(config);
    for i in 0..count {
        let class = SubjectClass::new(format!("Model{}", i));
        if i % 2 == 0 {
            ability.grant(["read"], [&class]);
        } else {
            ability.deny(["update"], [&class]);
        }
    }

    let article = SubjectClass::new("Article");
    ability
        .grant(["read"], ["all"])
        .grant_where(["update"], [&article], Conditions::new().eq("owner_id", 1));
    (ability, article)
}

fn bench_indexed_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("indexed_check");

    for rule_count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("rules", rule_count), rule_count, |b, &count| {
            let (ability, article) = create_ability(count, AbilityConfig::default());
            let subject = Subject::from(article.instance().with_attribute("owner_id", 1));

            b.iter(|| {
                let allowed = ability.allowed(black_box("edit"), black_box(&subject)).unwrap();
                black_box(allowed);
            });
        });
    }

    group.finish();
}

fn bench_without_expansion_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("check_without_expansion_cache");

    for rule_count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("rules", rule_count), rule_count, |b, &count| {
            let config = AbilityConfig {
                cache_expansions: false,
                ..Default::default()
            };
            let (ability, article) = create_ability(count, config);
            let subject = Subject::from(&article);

            b.iter(|| {
                let allowed = ability.allowed(black_box("show"), black_box(&subject)).unwrap();
                black_box(allowed);
            });
        });
    }

    group.finish();
}

fn bench_any_of_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("any_of_check");

    for rule_count in [10, 100, 1000].iter() {
        group.bench_with_input(BenchmarkId::new("rules", rule_count), rule_count, |b, &count| {
            let (ability, article) = create_ability(count, AbilityConfig::default());
            let subject = Subject::any_of([Subject::tag("dashboard"), Subject::from(&article)]);

            b.iter(|| {
                let allowed = ability.allowed(black_box("update"), black_box(&subject)).unwrap();
                black_box(allowed);
            });
        });
    }

    group.finish();
}

fn bench_permissions_export(c: &mut Criterion) {
    let (ability, _) = create_ability(100, AbilityConfig::default());

    c.bench_function("permissions_export", |b| {
        b.iter(|| black_box(ability.permissions()));
    });
}

criterion_group!(
    benches,
    bench_indexed_check,
    bench_without_expansion_cache,
    bench_any_of_check,
    bench_permissions_export
);
criterion_main!(benches);

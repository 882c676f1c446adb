use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tally::{Account, CurrentAccount, InMemoryStorage, InvestmentAccount};

fn bench_sqlite_apply_delta(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.db");
    let mut cash: CurrentAccount = Account::open(path.to_str().unwrap(), "cash", 1_000_000.0).unwrap();

    c.bench_function("sqlite_current_apply_delta", |b| {
        b.iter(|| cash.apply_delta(black_box(-1.25), Some("bench")).unwrap())
    });
}

fn bench_sqlite_investment_apply_delta(c: &mut Criterion) {
    let mut stock: InvestmentAccount = Account::open(":memory:", "stock_X", 0).unwrap();

    c.bench_function("sqlite_investment_apply_delta", |b| {
        b.iter(|| stock.apply_delta(black_box(100)).unwrap())
    });
}

fn bench_memory_apply_delta(c: &mut Criterion) {
    let mut cash: CurrentAccount<InMemoryStorage> =
        Account::with_backend(InMemoryStorage::new(), "cash", 1_000_000.0).unwrap();

    c.bench_function("memory_current_apply_delta", |b| {
        b.iter(|| cash.apply_delta(black_box(-1.25), None).unwrap())
    });
}

fn bench_balance_lookup(c: &mut Criterion) {
    let mut cash: CurrentAccount = Account::open(":memory:", "cash", 0.0).unwrap();
    for i in 0..1000 {
        cash.apply_delta(i as f64, None).unwrap();
    }

    c.bench_function("sqlite_current_balance", |b| {
        b.iter(|| black_box(cash.balance().unwrap()))
    });
}

criterion_group!(
    benches,
    bench_sqlite_apply_delta,
    bench_sqlite_investment_apply_delta,
    bench_memory_apply_delta,
    bench_balance_lookup
);
criterion_main!(benches);

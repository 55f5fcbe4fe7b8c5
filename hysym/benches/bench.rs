use criterion::{Criterion, black_box, criterion_group, criterion_main};

use hysym::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn build_simple_expr() -> Add<Multiply<Real, Variable>, Divide<Variable, Real>> {
    // (2 * x) + (y / 4)
    add(
        mul(Real::new(2.0), Variable::new("x")),
        div(Variable::new("y"), Real::new(4.0)),
    )
}

fn build_complex_expr(budget: usize) -> Expression {
    // Seeded so every run measures the same tree.
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);

    fn next_create(budget: usize, rng: &mut impl Rng) -> Expression {
        if budget == 0 || rng.random_bool(0.1) {
            return match rng.random_range(0..=1) {
                0 => Expression::real(rng.random_range(1..=9) as f64),
                _ => Expression::variable(["x", "y", "z", "w"][rng.random_range(0..4)]),
            };
        }

        let lhs = next_create(budget - 1, rng);
        let rhs = next_create(budget - 1, rng);
        match rng.random_range(0..=4) {
            0 => lhs + rhs,
            1 => lhs - rhs,
            2 => lhs * rhs,
            3 => lhs / rhs,
            _ => lhs ^ rhs,
        }
    }

    next_create(budget, &mut rng)
}

fn executor() -> Executor {
    Executor::new(&SchedulerConfig::default().with_thread_name_prefix("hysym-bench"))
        .expect("thread pool")
}

fn bench_generalize(c: &mut Criterion) {
    let simple_expr = build_simple_expr();
    let complex_expr = build_complex_expr(14);
    let executor = executor();

    c.bench_function("generalize_simple", |b| {
        b.iter(|| black_box(simple_expr.generalize()))
    });

    c.bench_function("generalize_complex_seq", |b| {
        b.iter(|| black_box(complex_expr.generalize()))
    });

    c.bench_function("generalize_complex_par", |b| {
        b.iter(|| black_box(executor.generalize(&complex_expr)))
    });
}

fn bench_specialize(c: &mut Criterion) {
    let canonical = build_simple_expr().generalize();
    let complex_expr = build_complex_expr(14);
    let executor = executor();

    c.bench_function("specialize_simple", |b| {
        b.iter(|| {
            black_box(Add::<Multiply<Real, Variable>, Divide<Variable, Real>>::specialize(
                &canonical,
            ))
        })
    });

    c.bench_function("specialize_complex_seq", |b| {
        b.iter(|| black_box(Expression::specialize(&complex_expr)))
    });

    c.bench_function("specialize_complex_par", |b| {
        b.iter(|| black_box(executor.specialize::<Expression, _>(&complex_expr)))
    });
}

fn bench_copy_and_simplify(c: &mut Criterion) {
    let complex_expr = build_complex_expr(14);
    let executor = executor();

    c.bench_function("copy_complex_seq", |b| {
        b.iter(|| black_box(complex_expr.clone()))
    });

    c.bench_function("copy_complex_par", |b| {
        b.iter(|| black_box(executor.copy(&complex_expr)))
    });

    c.bench_function("simplify_complex_seq", |b| {
        b.iter(|| black_box(complex_expr.simplify()))
    });

    c.bench_function("simplify_complex_par", |b| {
        b.iter(|| black_box(executor.simplify(&complex_expr)))
    });
}

criterion_group!(
    benches,
    bench_generalize,
    bench_specialize,
    bench_copy_and_simplify,
);
criterion_main!(benches);

use hysym::{conf::DEFAULT_MAX_FORK_DEPTH, prelude::*};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn executor(threads: usize) -> Executor {
    Executor::new(
        &SchedulerConfig::default()
            .with_num_threads(threads)
            .with_thread_name_prefix("hysym-test"),
    )
    .expect("thread pool")
}

// Random canonical tree; `budget` bounds the depth.
fn random_tree(budget: usize, rng: &mut impl Rng) -> Expression {
    if budget == 0 || rng.random_bool(0.25) {
        return match rng.random_range(0..2) {
            0 => Expression::real(rng.random_range(-9..=9) as f64),
            _ => Expression::variable(["x", "y", "z"][rng.random_range(0..3)]),
        };
    }

    let lhs = random_tree(budget - 1, rng);
    let rhs = random_tree(budget - 1, rng);
    match rng.random_range(0..5) {
        0 => lhs + rhs,
        1 => lhs - rhs,
        2 => lhs * rhs,
        3 => lhs / rhs,
        _ => lhs ^ rhs,
    }
}

#[test]
fn parallel_and_sequential_forms_agree() {
    let executor = executor(4);
    let mut rng = ChaCha20Rng::seed_from_u64(0x5eed);

    for _ in 0..64 {
        let tree = random_tree(8, &mut rng);

        let generalized = executor.generalize(&tree);
        assert_eq!(generalized, tree.generalize());
        assert!(generalized.structurally_equivalent(&tree));

        let copied = executor.copy(&tree);
        assert_eq!(copied, tree.clone());

        assert_eq!(executor.simplify(&tree), tree.simplify());

        let specialized: Option<Expression> = executor.specialize(&tree);
        assert_eq!(specialized.as_ref(), Some(&tree));
    }
}

#[test]
fn parallel_specialize_matches_sequential_outcome() {
    let executor = executor(4);
    let mut rng = ChaCha20Rng::seed_from_u64(0xadd);

    for _ in 0..128 {
        let tree = random_tree(3, &mut rng);

        let sequential = Add::<Expression, Expression>::specialize(&tree);
        let parallel: Option<Add> = executor.specialize(&tree);
        assert_eq!(parallel, sequential);

        let sequential = Add::<Real, Real>::specialize(&tree);
        let parallel: Option<Add<Real, Real>> = executor.specialize(&tree);
        assert_eq!(parallel, sequential);

        let sequential = Multiply::<Add<Real, Variable>, Expression>::specialize(&tree);
        let parallel: Option<Multiply<Add<Real, Variable>, Expression>> =
            executor.specialize(&tree);
        assert_eq!(parallel, sequential);
    }
}

#[test]
fn parallel_round_trip_of_constrained_tree() {
    let executor = executor(2);
    let tree: Add<Multiply<Real, Variable>, Divide<Variable, Real>> = add(
        mul(Real::new(2.0), Variable::new("x")),
        div(Variable::new("y"), Real::new(4.0)),
    );

    let canonical = executor.generalize(&tree);
    assert_eq!(canonical.to_string(), "((2 * x) + (y / 4))");

    let back: Add<Multiply<Real, Variable>, Divide<Variable, Real>> = executor
        .specialize(&canonical)
        .expect("conforming tree");
    assert_eq!(back, tree);

    // Normalization of a constrained candidate happens inside the task graph too.
    let relaxed: Option<Add<Expression, Divide<Variable, Real>>> = executor.specialize(&tree);
    assert!(relaxed.is_some());

    let rejected: Option<Add<Multiply<Real, Real>, Expression>> = executor.specialize(&tree);
    assert!(rejected.is_none());

    let other_kind: Option<Subtract> = executor.specialize(&canonical);
    assert!(other_kind.is_none());
}

#[test]
fn forks_one_task_per_present_slot() {
    let executor = executor(2);
    let sum: Add<Real, Real> = add(Real::new(2.0), Real::new(3.0));

    executor.stats().reset();
    let _ = executor.generalize(&sum);
    assert_eq!(executor.stats().forks(), 2);
    // Root barrier plus the node's own join.
    assert_eq!(executor.stats().joins(), 2);

    let mut half: Add<Real, Real> = Add::default();
    half.set_most_sig_op(Real::new(1.0));
    executor.stats().reset();
    let copied = executor.copy(&half);
    assert_eq!(copied, half);
    assert_eq!(executor.stats().forks(), 1);

    // Leaves never fork.
    executor.stats().reset();
    let _ = executor.generalize(&Real::new(1.0));
    assert_eq!(executor.stats().forks(), 0);
}

#[test]
fn mismatched_kind_is_rejected_before_forking() {
    let executor = executor(2);
    let product = mul(Real::new(2.0), Real::new(3.0)).generalize();

    executor.stats().reset();
    let specialized: Option<Add<Real, Real>> = executor.specialize(&product);
    assert!(specialized.is_none());
    assert_eq!(executor.stats().forks(), 0);
}

#[test]
fn outputs_are_never_partially_built_under_contention() {
    // Many more tasks than workers, repeated: every result must be complete and identical.
    let executor = executor(8);
    let mut rng = ChaCha20Rng::seed_from_u64(0x10ad);
    let trees: Vec<Expression> = (0..16).map(|_| random_tree(10, &mut rng)).collect();

    for _ in 0..8 {
        for tree in &trees {
            let generalized = executor.generalize(tree);
            assert_eq!(generalized.node_count(), tree.node_count());
            assert!(generalized.render().is_ok());
            assert_eq!(&generalized, tree);

            let simplified = executor.simplify(tree);
            assert!(simplified.render().is_ok());
            assert_eq!(simplified, tree.simplify());
        }
    }
}

#[test]
fn executors_can_be_shared_across_caller_threads() {
    let executor = executor(4);
    let mut rng = ChaCha20Rng::seed_from_u64(0xcafe);
    let trees: Vec<Expression> = (0..4).map(|_| random_tree(7, &mut rng)).collect();

    std::thread::scope(|scope| {
        for tree in &trees {
            let executor = &executor;
            scope.spawn(move || {
                assert_eq!(executor.copy(tree), tree.clone());
            });
        }
    });
}

#[test]
fn custom_subflow_precedence() {
    let executor = executor(2);
    let tree = add(Real::new(1.0), Real::new(2.0));

    // The successor only ever observes the predecessor's finished output.
    let mut observed = None;
    let (tree, slot) = (&tree, &mut observed);
    executor.run(move |flow| {
        flow.emplace_then(
            move |s| tree.generalize_in(s),
            move |_, generalized| *slot = Some(generalized.to_string()),
        );
    });

    assert_eq!(observed.as_deref(), Some("(1 + 2)"));
}

// `((x + 1) + 1) + ...`, built iteratively.
fn chain(depth: usize) -> Expression {
    (0..depth).fold(Expression::variable("x"), |acc, _| acc + Expression::real(1.0))
}

// Comparing and dropping a deep chain recurses on the calling thread too.
fn on_large_stack(body: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(body)
        .expect("spawn test thread")
        .join()
        .expect("test thread");
}

#[test]
fn deep_chains_run_through_every_operation() {
    on_large_stack(|| {
        let executor = Executor::new(&SchedulerConfig::default().with_num_threads(2))
            .expect("thread pool");
        let tree = chain(5000);

        assert_eq!(executor.generalize(&tree), tree);
        assert_eq!(executor.copy(&tree), tree);
        assert_eq!(executor.simplify(&tree), tree.simplify());

        let canonical: Option<Expression> = executor.specialize(&tree);
        assert_eq!(canonical.as_ref(), Some(&tree));
        let spine: Option<Add> = executor.specialize(&tree);
        assert!(spine.is_some());
        let literal: Option<Add<Expression, Variable>> = executor.specialize(&tree);
        assert!(literal.is_none());
    });
}

#[test]
fn forking_stops_at_the_configured_depth() {
    let tree = chain(64);

    let executor = executor(2);
    executor.stats().reset();
    assert_eq!(executor.generalize(&tree), tree);
    assert_eq!(executor.stats().forks(), 2 * DEFAULT_MAX_FORK_DEPTH);

    let shallow = Executor::new(&SchedulerConfig::default().with_max_fork_depth(3))
        .expect("thread pool");
    assert_eq!(shallow.simplify(&tree), tree.simplify());
    assert_eq!(shallow.stats().forks(), 6);

    let sequential = Executor::new(&SchedulerConfig::default().with_max_fork_depth(0))
        .expect("thread pool");
    assert_eq!(sequential.copy(&tree), tree);
    assert_eq!(sequential.stats().forks(), 0);
}

#[test]
fn worker_threads_follow_the_configuration() {
    let executor = Executor::new(
        &SchedulerConfig::default()
            .with_num_threads(3)
            .with_thread_name_prefix("hysym-named")
            .with_stack_size(4 * 1024 * 1024),
    )
    .expect("thread pool");
    assert_eq!(executor.num_threads(), 3);

    let name = executor.run(|_| std::thread::current().name().map(str::to_owned));
    assert!(name.is_some_and(|name| name.starts_with("hysym-named-")));
}

#[test]
fn unbuildable_pool_is_reported() {
    // No address space can hold a worker stack this large.
    let result = Executor::new(
        &SchedulerConfig::default()
            .with_num_threads(1)
            .with_stack_size(usize::MAX / 4),
    );
    match result {
        Err(err) => assert!(err.is_thread_pool()),
        Ok(_) => panic!("a pool with an impossible stack size was built"),
    }
}

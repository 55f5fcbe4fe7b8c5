//! Fork-join scheduling of tree operations over a `rayon` thread pool.
//!
//! Role
//! - [`Subflow`] is the handle a task body receives: it forks independent subtasks
//!   ([`Subflow::emplace`]), declares precedence between two tasks
//!   ([`Subflow::emplace_then`]) and opens join barriers ([`Subflow::join`]).
//! - [`Executor`] owns the worker pool and is the entry point for running the parallel form
//!   of an operation.
//!
//! Semantics
//! - A join returns only once every task forked inside it, transitively, has completed. The
//!   caller blocks at the join but its worker keeps executing queued tasks meanwhile.
//! - Sibling tasks are unordered. A precedence edge makes the predecessor's writes visible to
//!   its successor.
//! - There is no cancellation: a forked task always runs to completion.
//! - Every join barrier nests one level deeper. Past
//!   [`SchedulerConfig::max_fork_depth`] levels, tree operations stop forking and finish the
//!   subtree with their sequential form.
//!
//! Example
//! ```
//! use hysym::prelude::*;
//!
//! let executor = Executor::new(&SchedulerConfig::default().with_num_threads(2)).unwrap();
//! let tree = add(Real::new(2.0), mul(Variable::new("x"), Real::new(3.0)));
//!
//! let parallel = executor.generalize(&tree);
//! assert_eq!(parallel, tree.generalize());
//! ```
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};
use rayon::{Scope, ThreadPool, ThreadPoolBuilder};

use crate::{
    conf::SchedulerConfig,
    error::ExprResult,
    expr::{Expr, Expression},
};

/// Diagnostic counters shared by every task of an [`Executor`].
#[derive(Debug, Default)]
pub struct FlowStats {
    forks: AtomicUsize,
    joins: AtomicUsize,
}

impl FlowStats {
    /// Number of tasks forked since creation or the last [`FlowStats::reset`].
    pub fn forks(&self) -> usize {
        self.forks.load(Ordering::Relaxed)
    }

    /// Number of join barriers opened since creation or the last [`FlowStats::reset`].
    pub fn joins(&self) -> usize {
        self.joins.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.forks.store(0, Ordering::Relaxed);
        self.joins.store(0, Ordering::Relaxed);
    }

    fn record_fork(&self) {
        self.forks.fetch_add(1, Ordering::Relaxed);
    }

    fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }
}

/// Handle for forking subtasks from within a task body.
///
/// `'scope` bounds everything a forked task may borrow; `'r` is the lifetime of the handle
/// itself.
pub struct Subflow<'scope, 'r> {
    scope: &'r Scope<'scope>,
    stats: &'scope FlowStats,
    depth: usize,
    max_depth: usize,
}

impl<'scope, 'r> Subflow<'scope, 'r> {
    /// Number of join barriers enclosing this handle.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether tree operations should still fork at this depth.
    #[inline]
    pub fn should_fork(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Fork an independent task. It may run on any worker, concurrently with its siblings.
    pub fn emplace<F>(&self, task: F)
    where
        F: for<'x> FnOnce(&Subflow<'scope, 'x>) + Send + 'scope,
    {
        let (stats, depth, max_depth) = (self.stats, self.depth, self.max_depth);
        stats.record_fork();
        self.scope.spawn(move |scope| {
            task(&Subflow {
                scope,
                stats,
                depth,
                max_depth,
            })
        });
    }

    /// Fork `predecessor`, then `successor` with its output once it has completed.
    ///
    /// The predecessor is complete when its body returns, so any work it forks must be joined
    /// inside its body.
    pub fn emplace_then<T, P, S>(&self, predecessor: P, successor: S)
    where
        T: Send + 'scope,
        P: for<'x> FnOnce(&Subflow<'scope, 'x>) -> T + Send + 'scope,
        S: for<'x> FnOnce(&Subflow<'scope, 'x>, T) + Send + 'scope,
    {
        self.emplace(move |flow| {
            let output = predecessor(flow);
            flow.emplace(move |flow| successor(flow, output));
        });
    }

    /// Open a nested join barrier: run `op`, then wait for every task it forked.
    pub fn join<'s, OP, R>(&self, op: OP) -> R
    where
        'scope: 's,
        OP: for<'x> FnOnce(&Subflow<'s, 'x>) -> R + Send,
        R: Send,
    {
        let stats: &'s FlowStats = self.stats;
        let (depth, max_depth) = (self.depth + 1, self.max_depth);
        stats.record_join();
        rayon::scope(move |scope| {
            op(&Subflow {
                scope,
                stats,
                depth,
                max_depth,
            })
        })
    }
}

/// Entry point for the parallel form of tree operations.
pub struct Executor {
    pool: ThreadPool,
    stats: FlowStats,
    max_fork_depth: usize,
}

impl Executor {
    pub fn new(config: &SchedulerConfig) -> ExprResult<Self> {
        let prefix = config.thread_name_prefix.clone();
        let mut builder = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(move |index| format!("{prefix}-{index}"));

        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = builder.build()?;
        debug!(
            "Fork-join executor ready with {} worker threads, forking up to depth {}",
            pool.current_num_threads(),
            config.max_fork_depth
        );

        Ok(Self {
            pool,
            stats: FlowStats::default(),
            max_fork_depth: config.max_fork_depth,
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn stats(&self) -> &FlowStats {
        &self.stats
    }

    /// Run `op` on the pool inside a root join barrier and return its result once every task
    /// it forked has completed.
    pub fn run<'s, OP, R>(&'s self, op: OP) -> R
    where
        OP: for<'x> FnOnce(&Subflow<'s, 'x>) -> R + Send,
        R: Send,
    {
        let (stats, max_depth) = (&self.stats, self.max_fork_depth);
        stats.record_join();
        self.pool.install(move || {
            rayon::scope(move |scope| {
                op(&Subflow {
                    scope,
                    stats,
                    depth: 0,
                    max_depth,
                })
            })
        })
    }

    /// Parallel [`Expr::generalize`].
    pub fn generalize<E: Expr>(&self, expr: &E) -> Expression {
        trace!("Parallel generalize of a `{}` tree", expr.expr_type());
        self.run(|flow| expr.generalize_in(flow))
    }

    /// Parallel [`Expr::specialize`].
    pub fn specialize<T: Expr, E: Expr>(&self, expr: &E) -> Option<T> {
        trace!("Parallel specialize of a `{}` tree", expr.expr_type());
        self.run(|flow| T::specialize_in(expr, flow))
    }

    /// Parallel deep copy.
    pub fn copy<E: Expr>(&self, expr: &E) -> E {
        trace!("Parallel copy of a `{}` tree", expr.expr_type());
        self.run(|flow| expr.copy_in(flow))
    }

    /// Parallel [`Expr::simplify`].
    pub fn simplify<E: Expr>(&self, expr: &E) -> Expression {
        trace!("Parallel simplify of a `{}` tree", expr.expr_type());
        self.run(|flow| expr.simplify_in(flow))
    }
}

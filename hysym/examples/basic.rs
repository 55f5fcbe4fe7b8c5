use hysym::prelude::*;

fn main() {
    let expr: Add<Multiply<Real, Variable>, Exponent<Real, Real>> = add(
        mul(Real::new(3.0), Variable::new("x")),
        pow(Real::new(2.0), Real::new(8.0)),
    );
    println!("constrained: {expr}");

    let canonical = expr.generalize();
    println!("canonical:   {canonical}");
    println!("simplified:  {}", canonical.simplify());

    match Add::<Multiply<Real, Variable>, Expression>::try_from(&canonical) {
        Ok(view) => println!("specialized: {view}"),
        Err(err) => println!("error: {err}"),
    }

    if let Err(err) = Subtract::<Expression, Expression>::try_from(&canonical) {
        println!("error: {err}");
    }

    let executor = Executor::new(&SchedulerConfig::default()).expect("thread pool");
    let parallel = executor.simplify(&canonical);
    println!(
        "parallel:    {parallel} ({} forks, {} joins)",
        executor.stats().forks(),
        executor.stats().joins()
    );
}

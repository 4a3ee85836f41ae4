use bounded_pool::{Config, WorkerPool};
use std::time::Instant;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let pool = WorkerPool::with_config(Config::cpu_bound());
    let now = Instant::now();

    let handles: Vec<_> = (0..1_000u64)
        .map(|i| {
            pool.submit_with_result(move || i * i)
                .expect("pool is running")
        })
        .collect();

    let sum: u64 = handles
        .into_iter()
        .map(|mut h| h.get().expect("task completed"))
        .sum();

    pool.shutdown(true);
    println!("sum of squares: {sum}, elapsed: {:?}", now.elapsed());
}

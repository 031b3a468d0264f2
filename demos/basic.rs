//! Basic adaptive breaker usage example

use adaptive_breaker::{CallOptions, Config, Failure, Registry};
use std::time::Duration;

fn main() {
    println!("=== Adaptive Breaker Basic Example ===\n");

    let registry = Registry::with_config(Config {
        success_ratio: 0.5,
        min_requests: 5,
        window: Duration::from_secs(3),
        ..Config::default()
    })
    .expect("valid config");

    // Successful calls keep the breaker healthy.
    println!("--- Successful calls ---");
    for i in 1..=3 {
        match registry.call("payment_api", move || {
            Ok::<_, Failure<String>>(format!("payment {i}"))
        }) {
            Ok(result) => println!("ok: {result}"),
            Err(e) => println!("err: {e}"),
        }
    }

    // Failures accumulate in the rolling window; once the volume floor is
    // crossed the breaker starts shedding probabilistically.
    println!("\n--- Triggering failures ---");
    for i in 1..=20 {
        let result = registry.call("payment_api", move || {
            Err::<String, _>(Failure::Error(format!("payment failed {i}")))
        });
        if let Err(e) = result {
            if e.is_rejected() {
                println!("shed before execution: {e}");
            }
        }
    }

    // A fallback recovers a failing call.
    println!("\n--- Fallback recovery ---");
    let result = registry.call(
        "payment_api",
        (
            || Err::<String, _>(Failure::Error("still failing".to_string())),
            CallOptions::new().with_fallback(|_err| Ok("cached response".to_string())),
        ),
    );
    println!("recovered: {}", result.unwrap());

    // Ignore surfaces the error without counting it as a failure.
    println!("\n--- Health-neutral failure ---");
    let result = registry.call("payment_api", || {
        Err::<String, _>(Failure::Ignore("card declined".to_string()))
    });
    println!("surfaced unchanged: {}", result.unwrap_err());
}

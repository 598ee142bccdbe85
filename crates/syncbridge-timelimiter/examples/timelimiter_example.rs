//! Run with: cargo run --example timelimiter_example -p syncbridge-timelimiter

use std::time::Duration;
use syncbridge_timelimiter::TimeLimiterConfig;
use tokio::time::sleep;
use tower::{Layer, Service, ServiceExt};

#[tokio::main]
async fn main() {
    let fast_service = tower::service_fn(|req: &'static str| async move {
        println!("Processing request: {req}");
        sleep(Duration::from_millis(50)).await;
        Ok::<_, std::io::Error>(format!("Completed: {req}"))
    });

    let slow_service = tower::service_fn(|req: &'static str| async move {
        println!("Processing slow request: {req}");
        sleep(Duration::from_secs(2)).await;
        Ok::<_, std::io::Error>(format!("Completed: {req}"))
    });

    let timelimiter_layer = TimeLimiterConfig::builder()
        .timeout_duration(Duration::from_millis(100))
        .host("erp.example.com")
        .on_success(|duration| {
            println!("request succeeded in {duration:?}");
        })
        .on_timeout(|| {
            println!("request timed out!");
        })
        .on_error(|duration| {
            println!("request failed after {duration:?}");
        })
        .build();

    println!("=== fast service (should succeed) ===");
    let mut service = timelimiter_layer.layer(fast_service);
    match service.ready().await.unwrap().call("fast").await {
        Ok(response) => println!("Response: {response}"),
        Err(e) => println!("Error: {e}"),
    }

    println!("\n=== slow service (should time out) ===");
    let mut service = timelimiter_layer.layer(slow_service);
    match service.ready().await.unwrap().call("slow").await {
        Ok(response) => println!("Response: {response}"),
        Err(e) => println!("Error: {e}"),
    }
}

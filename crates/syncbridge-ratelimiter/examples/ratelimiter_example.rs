//! Per-host token bucket demo.
//!
//! Run with: cargo run --example ratelimiter_example -p syncbridge-ratelimiter

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use syncbridge_ratelimiter::{RateLimiterError, RateLimiterLayer};
use tower::{Service, ServiceBuilder, ServiceExt};

#[tokio::main]
async fn main() {
    println!("=== syncbridge token bucket demo ===\n");

    let permit_count = Arc::new(AtomicUsize::new(0));
    let reject_count = Arc::new(AtomicUsize::new(0));
    let p = Arc::clone(&permit_count);
    let r = Arc::clone(&reject_count);

    let layer = RateLimiterLayer::builder()
        .rps(5.0)
        .burst(5)
        .queue_timeout(Duration::from_millis(50))
        .host("erp.example.com")
        .on_permit_acquired(move |_| {
            p.fetch_add(1, Ordering::SeqCst);
        })
        .on_permit_rejected(move |_| {
            r.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let service = tower::service_fn(|_req: ()| async { Ok::<_, std::convert::Infallible>("ok") });
    let mut svc = ServiceBuilder::new().layer(layer).service(service);

    println!("Sending 8 requests against a bucket of 5 tokens refilling at 5/s...");
    for i in 1..=8 {
        match svc.ready().await.unwrap().call(()).await {
            Ok(_) => println!("  request {i}: permitted"),
            Err(RateLimiterError::RateLimitExceeded { host, .. }) => {
                println!("  request {i}: rejected (host={host})")
            }
        }
    }

    println!(
        "\nresult: {} permitted, {} rejected",
        permit_count.load(Ordering::SeqCst),
        reject_count.load(Ordering::SeqCst)
    );
}

//! Run with: cargo run --example retry_example -p syncbridge-retry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use syncbridge_retry::{ExponentialBackoff, RetryLayer};
use tower::{Layer, Service, ServiceExt};

#[derive(Debug, Clone)]
struct TransportError;

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transport error")
    }
}

impl std::error::Error for TransportError {}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("syncbridge retry example\n");

    let call_count = Arc::new(AtomicUsize::new(0));

    println!("Example 1: fixed backoff retry");
    let cc = Arc::clone(&call_count);
    call_count.store(0, Ordering::SeqCst);

    let service = tower::service_fn(move |req: String| {
        let cc = Arc::clone(&cc);
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            println!("  service called (attempt {})", count + 1);
            if count < 2 {
                Err(TransportError)
            } else {
                Ok(format!("synced: {}", req))
            }
        }
    });

    let retry_layer = RetryLayer::<String, TransportError>::builder()
        .max_attempts(5)
        .fixed_backoff(Duration::from_millis(100))
        .host("erp.example.com")
        .on_retry(|attempt, delay| {
            println!("  [retry] attempt {} after {:?}", attempt, delay);
        })
        .on_success(|attempts| {
            println!("  [success] after {} total attempts", attempts);
        })
        .build();

    let mut service = retry_layer.layer(service);
    let result = service.ready().await?.call("employee:42".to_string()).await?;
    println!("  result: {}\n", result);

    println!("Example 2: exponential backoff with full jitter");
    call_count.store(0, Ordering::SeqCst);
    let cc = Arc::clone(&call_count);

    let service = tower::service_fn(move |req: String| {
        let cc = Arc::clone(&cc);
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            println!("  service called (attempt {})", count + 1);
            if count < 3 {
                Err(TransportError)
            } else {
                Ok(format!("synced: {}", req))
            }
        }
    });

    let retry_layer = RetryLayer::<String, TransportError>::builder()
        .max_attempts(5)
        .backoff(
            ExponentialBackoff::new(Duration::from_millis(50))
                .multiplier(2.0)
                .max_interval(Duration::from_secs(1)),
        )
        .host("fleet.example.com")
        .on_retry(|attempt, delay| {
            println!("  [retry] attempt {} after {:?}", attempt, delay);
        })
        .build();

    let mut service = retry_layer.layer(service);
    let result = service.ready().await?.call("vehicle:7".to_string()).await?;
    println!("  result: {}\n", result);

    println!("Example 3: non-retryable error surfaces immediately");
    #[derive(Debug, Clone)]
    struct ValidationError;

    impl std::fmt::Display for ValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "validation failed")
        }
    }

    impl std::error::Error for ValidationError {}

    let service = tower::service_fn(|_req: String| async move {
        println!("  service called");
        Err::<String, _>(ValidationError)
    });

    let retry_layer = RetryLayer::<String, ValidationError>::builder()
        .max_attempts(5)
        .fixed_backoff(Duration::from_millis(50))
        .retry_on(|_: &ValidationError| false)
        .on_ignored_error(|| {
            println!("  [ignored] error not retryable");
        })
        .build();

    let mut service = retry_layer.layer(service);
    let result = service.ready().await?.call("employee:99".to_string()).await;
    println!("  result: {:?}\n", result);

    println!("Example 4: retries exhausted");
    call_count.store(0, Ordering::SeqCst);
    let cc = Arc::clone(&call_count);

    let service = tower::service_fn(move |_req: String| {
        let cc = Arc::clone(&cc);
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            println!("  service called (attempt {})", count + 1);
            Err::<String, _>(TransportError)
        }
    });

    let retry_layer = RetryLayer::<String, TransportError>::builder()
        .max_attempts(3)
        .fixed_backoff(Duration::from_millis(50))
        .host("directory.example.com")
        .on_retry(|attempt, _| {
            println!("  [retry] attempt {}", attempt);
        })
        .on_error(|attempts| {
            println!("  [error] exhausted retries after {} attempts", attempts);
        })
        .build();

    let mut service = retry_layer.layer(service);
    let result = service.ready().await?.call("department:3".to_string()).await;
    println!("  result: {:?}\n", result);

    Ok(())
}

use std::time::Duration;
use syncbridge_bulkhead::BulkheadConfig;
use syncbridge_core::SyncError;
use tower::{Service, ServiceBuilder, ServiceExt};

#[tokio::main]
async fn main() {
    println!("Simple bulkhead example\n");

    let config = BulkheadConfig::builder()
        .max_concurrent_calls(5)
        .host("erp.example.com")
        .build();

    let service = tower::service_fn(|req: String| async move {
        println!("Processing: {req}");
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, SyncError>(format!("Response to: {req}"))
    });

    let mut bulkhead_service = ServiceBuilder::new().layer(config).service(service);

    for i in 1..=3 {
        match bulkhead_service.ready().await {
            Ok(svc) => {
                let response = svc.call(format!("Request {i}")).await.unwrap();
                println!("{response}");
            }
            Err(e) => println!("Error: {e}"),
        }
    }

    println!("\nAll requests completed!");
}

use cloudwatch_loki_shipper::receivers::cloudwatch::{run_invocation, CloudWatchLogsEvent};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        // CloudWatch adds the ingestion time
        .without_time()
        .init();

    let http_client = Client::builder().build()?;

    info!("Starting CloudWatch to Loki shipper");

    run(service_fn(|event: LambdaEvent<CloudWatchLogsEvent>| {
        let http_client = &http_client;
        async move {
            let summary = run_invocation(http_client, event.payload).await?;
            info!(
                request_id = %event.context.request_id,
                delivered = summary.delivered,
                "Invocation complete"
            );
            Ok::<(), Error>(())
        }
    }))
    .await
}

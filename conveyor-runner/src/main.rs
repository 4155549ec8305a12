use crate::core::start_runner;

mod core;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    conveyor_telemetry::tracing::init_tracing();

    start_runner().await
}

use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use relay::config::relay_config::{load_config, RelayConfig, TracingConfig};
use relay::net::broker::in_memory_broker::InMemoryBroker;
use relay::net::rpc::rpc_client::RpcClient;
use relay::net::rpc::rpc_worker::RpcWorker;
use relay::observability::logging::init_logging;
use relay::observability::tracer_provider::init_tracer_provider;
use relay::trace::tracer::Tracer;
use relay_examples::employees::employee::default_employees;
use relay_examples::employees::employee_directory::EmployeeDirectory;
use relay_examples::employees::employees_page::EmployeesPage;

#[tokio::main]
async fn main() {
    let config = match std::env::args().nth(1) {
        None => RelayConfig::default(),
        Some(path) => match load_config(Path::new(&path)) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("could not load configuration from {}: {}", path, err);
                process::exit(1);
            }
        },
    };
    init_logging(&config.tracing.log_filter);

    let broker_url = match config.broker_url() {
        Ok(broker_url) => broker_url,
        Err(err) => {
            error!(error = %err, "invalid broker url");
            process::exit(1);
        }
    };
    let broker = match InMemoryBroker::connect(&broker_url) {
        Ok(broker) => Arc::new(broker),
        Err(err) => {
            error!(broker = %broker_url, error = %err, "failed to connect to the broker");
            process::exit(1);
        }
    };
    info!(broker = %broker_url, "connected");

    let worker_tracing = TracingConfig { service_name: "service-2".to_string(), ..config.tracing.clone() };
    let (page_provider, worker_provider) = match (init_tracer_provider(&config.tracing), init_tracer_provider(&worker_tracing)) {
        (Ok(page_provider), Ok(worker_provider)) => (page_provider, worker_provider),
        (Err(err), _) | (_, Err(err)) => {
            error!(error = %err, "failed to set up span export");
            process::exit(1);
        }
    };

    let directory = EmployeeDirectory::new(default_employees(), Duration::from_millis(300));
    let worker = RpcWorker::new(
        broker.clone(),
        config.rpc.request_queue.clone(),
        Arc::new(directory),
        Tracer::new(&worker_provider),
    ).with_fault_policy(config.rpc.fault_policy);
    let worker_handle = match worker.start().await {
        Ok(handle) => handle,
        Err(err) => {
            error!(queue = %config.rpc.request_queue, error = %err, "failed to start the worker");
            process::exit(1);
        }
    };

    let tracer = Tracer::new(&page_provider);
    let client = Arc::new(RpcClient::new(broker, tracer.clone(), config.registry_config()));
    let page = EmployeesPage::new(client, tracer, config.rpc.request_queue.clone(), config.call_timeout());

    let response = page.render().await;
    println!("{} {}", response.status, response.body);

    if let Err(err) = worker_handle.shutdown().await {
        error!(error = %err, "worker did not shut down cleanly");
    }
    for provider in [page_provider, worker_provider] {
        if let Err(err) = provider.shutdown() {
            error!(error = %err, "failed to flush spans to the collector");
        }
    }
}

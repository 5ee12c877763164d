use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{SpanKind, Status};
use tracing::{error, info, Instrument};

use relay::net::rpc::rpc_client::RpcClient;
use relay::net::rpc::rpc_error::RpcError;
use relay::trace::span::SpanScope;
use relay::trace::tracer::Tracer;

use crate::employees::employee::{Employee, EmployeesRequest};
use crate::employees::page_response::PageResponse;

pub const EMPLOYEES_PAGE_SPAN: &str = "employees-page";
pub const PROCESS_EMPLOYEE_DATA_SPAN: &str = "process-employee-data";

/// Caller-facing endpoint: fetches the employee list from the directory worker
/// and renders it as JSON. Every failure ends the page span with an error
/// status and a matching failure response.
pub struct EmployeesPage {
    client: Arc<RpcClient>,
    tracer: Tracer,
    request_queue: String,
    call_timeout: Duration,
}

impl EmployeesPage {
    pub fn new(client: Arc<RpcClient>, tracer: Tracer, request_queue: impl Into<String>, call_timeout: Duration) -> Self {
        return EmployeesPage { client, tracer, request_queue: request_queue.into(), call_timeout };
    }

    pub async fn render(&self) -> PageResponse {
        let page_span = self.tracer.start_root_span(EMPLOYEES_PAGE_SPAN, SpanKind::Server);
        page_span.set_attribute("http.method", "GET");
        page_span.set_attribute("http.url", "/employees");
        page_span.add_event("Start processing employee request", Vec::new());

        let log_span = page_span.log_span();
        let response = self.fetch_employees(&page_span).instrument(log_span).await;
        page_span.end();
        return response;
    }

    async fn fetch_employees(&self, page_span: &SpanScope) -> PageResponse {
        let request = EmployeesRequest { message: "Hello world!".to_string() };
        let payload = match serde_json::to_vec(&request) {
            Ok(payload) => payload,
            Err(err) => {
                page_span.record_fault(&err);
                return PageResponse::failure(500, "Something went wrong");
            }
        };

        let reply = self.client.call_with_parent(page_span.context(), &self.request_queue, payload, self.call_timeout).await;
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                error!(error = %err, "employees request failed");
                page_span.record_fault(&err);
                return Self::failure_for(&err);
            }
        };

        let process_span = self.tracer.start_span(PROCESS_EMPLOYEE_DATA_SPAN, SpanKind::Internal, Some(page_span.context()));
        process_span.set_attribute("processing.data_type", "employee-list");
        let employees: Vec<Employee> = match serde_json::from_slice(&reply) {
            Ok(employees) => employees,
            Err(err) => {
                process_span.record_fault(&err);
                page_span.record_fault(&err);
                return PageResponse::failure(500, "Something went wrong");
            }
        };
        process_span.set_attribute("processing.data_size", employees.len() as i64);
        process_span.set_status(Status::Ok);
        process_span.end();

        info!(employees = employees.len(), "rendered employees page");
        page_span.set_status(Status::Ok);
        return PageResponse::ok(String::from_utf8_lossy(&reply).into_owned());
    }

    fn failure_for(err: &RpcError) -> PageResponse {
        return match err {
            RpcError::Timeout { .. } => PageResponse::failure(504, "Employee directory did not answer in time"),
            RpcError::Transport(_) => PageResponse::failure(502, "Employee directory is unreachable"),
            RpcError::Cancelled { .. } => PageResponse::failure(503, "Request was cancelled"),
            RpcError::HandlerFault { .. } | RpcError::DuplicateToken(_) => PageResponse::failure(500, "Something went wrong"),
        };
    }
}

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use relay::net::rpc::request_handler::{HandlerFault, RequestHandler};

use crate::employees::employee::{default_employees, Employee, EmployeesRequest};

/// Worker-side handler answering every well-formed request with the full
/// employee list.
pub struct EmployeeDirectory {
    employees: Vec<Employee>,
    processing_delay: Duration,
}

impl EmployeeDirectory {
    pub fn new(employees: Vec<Employee>, processing_delay: Duration) -> Self {
        return EmployeeDirectory { employees, processing_delay };
    }

    pub fn get_employees(&self) -> &[Employee] {
        return &self.employees;
    }
}

impl Default for EmployeeDirectory {
    fn default() -> Self {
        return Self::new(default_employees(), Duration::ZERO);
    }
}

#[async_trait]
impl RequestHandler for EmployeeDirectory {
    async fn handle(&self, payload: Bytes) -> Result<Bytes, HandlerFault> {
        let request: EmployeesRequest = serde_json::from_slice(&payload)
            .map_err(|err| HandlerFault::new(format!("request is not an employees request: {}", err)))?;
        info!(message = %request.message, "received employees request");

        if !self.processing_delay.is_zero() {
            tokio::time::sleep(self.processing_delay).await;
        }
        let response = serde_json::to_vec(&self.employees)
            .map_err(|err| HandlerFault::new(format!("could not serialize employees: {}", err)))?;
        debug!(employees = self.employees.len(), "answering employees request");
        return Ok(Bytes::from(response));
    }
}

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct Employee {
    pub id: u64,
    pub name: String,
}

/// The body a caller sends to the employee directory.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct EmployeesRequest {
    pub message: String,
}

impl Employee {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        return Employee { id, name: name.into() };
    }
}

pub fn default_employees() -> Vec<Employee> {
    return vec![Employee::new(1, "Alice"), Employee::new(2, "Bob")];
}

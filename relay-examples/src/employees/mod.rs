pub mod employee;
pub mod employee_directory;
pub mod employees_page;
pub mod page_response;

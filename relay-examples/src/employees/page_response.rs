#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        return PageResponse { status: 200, body: body.into() };
    }

    pub fn failure(status: u16, body: impl Into<String>) -> Self {
        return PageResponse { status, body: body.into() };
    }

    pub fn is_success(&self) -> bool {
        return self.status == 200;
    }
}

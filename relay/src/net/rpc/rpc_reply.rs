use bytes::Bytes;

use crate::net::broker::message::{Message, MessageProperties};
use crate::net::correlation::correlation_token::CorrelationToken;
use crate::net::rpc::rpc_error::RpcError;

pub const RPC_STATUS_HEADER: &str = "x-rpc-status";
const RPC_STATUS_ERROR: &str = "error";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReplyStatus {
    Success,
    Fault,
}

/// A response as it travels from worker to caller. A fault carries the
/// handler's message as its payload and is marked with an error status header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RpcReply {
    payload: Bytes,
    status: ReplyStatus,
}

impl RpcReply {
    pub fn success(payload: impl Into<Bytes>) -> Self {
        return RpcReply { payload: payload.into(), status: ReplyStatus::Success };
    }

    pub fn fault(message: impl Into<String>) -> Self {
        return RpcReply { payload: Bytes::from(message.into()), status: ReplyStatus::Fault };
    }

    pub fn from_message(message: Message) -> Self {
        let status = match message.properties.get_header(RPC_STATUS_HEADER) {
            Some(RPC_STATUS_ERROR) => ReplyStatus::Fault,
            _ => ReplyStatus::Success,
        };
        return RpcReply { payload: message.payload, status };
    }

    pub fn into_message(self, correlation_id: impl Into<String>) -> Message {
        let mut properties = MessageProperties::default().with_correlation_id(correlation_id);
        if self.status == ReplyStatus::Fault {
            properties = properties.with_header(RPC_STATUS_HEADER, RPC_STATUS_ERROR);
        }
        return Message::with_properties(self.payload, properties);
    }

    pub fn get_payload(&self) -> &Bytes {
        return &self.payload;
    }

    pub fn get_status(&self) -> ReplyStatus {
        return self.status;
    }

    pub(crate) fn into_result(self, token: CorrelationToken) -> Result<Bytes, RpcError> {
        return match self.status {
            ReplyStatus::Success => Ok(self.payload),
            ReplyStatus::Fault => Err(RpcError::HandlerFault {
                token,
                message: String::from_utf8_lossy(&self.payload).into_owned(),
            }),
        };
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::net::correlation::correlation_token::CorrelationToken;
    use crate::net::rpc::rpc_error::RpcError;
    use crate::net::rpc::rpc_reply::{ReplyStatus, RPC_STATUS_HEADER, RpcReply};

    #[test]
    fn success_reply_message() {
        let message = RpcReply::success("[]").into_message("token-1");

        assert_eq!(Some("token-1".to_string()), message.properties.correlation_id);
        assert_eq!(None, message.properties.get_header(RPC_STATUS_HEADER));
        assert_eq!(ReplyStatus::Success, RpcReply::from_message(message).get_status());
    }

    #[test]
    fn fault_reply_message() {
        let message = RpcReply::fault("employee store unavailable").into_message("token-1");

        assert_eq!(Some("error"), message.properties.get_header(RPC_STATUS_HEADER));

        let reply = RpcReply::from_message(message);
        assert_eq!(ReplyStatus::Fault, reply.get_status());
        assert_eq!(&Bytes::from("employee store unavailable"), reply.get_payload());
    }

    #[test]
    fn fault_reply_becomes_handler_fault() {
        let result = RpcReply::fault("boom").into_result(CorrelationToken::from("token-1"));

        assert_eq!(
            Err(RpcError::HandlerFault { token: CorrelationToken::from("token-1"), message: "boom".to_string() }),
            result
        );
    }
}

//! Request/response sequencing over a framed stream.
//!
//! Requests are sent as `[[id, method, args, kwargs]]`. The daemon answers
//! with `[1, id, value]` on success or `[2, id, exception, args, ...]` on
//! failure, and may interleave `[3, event, data]` notifications, which are
//! skipped.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::error::{DelugeError, DelugeResult};
use crate::rencode::Value;
use crate::transport::{read_message, write_message};

const RPC_RESPONSE: i64 = 1;
const RPC_ERROR: i64 = 2;
const RPC_EVENT: i64 = 3;

/// An RPC conversation with one daemon over one stream.
#[derive(Debug)]
pub struct RpcSession<S> {
    stream: S,
    next_id: i64,
}

impl<S> RpcSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Start a session over an established stream.
    pub const fn new(stream: S) -> Self {
        Self { stream, next_id: 1 }
    }

    /// Invoke `method` and wait for its result.
    ///
    /// # Errors
    ///
    /// Returns [`DelugeError::Remote`] when the daemon raises, or a transport
    /// error when the exchange itself fails.
    pub async fn call(
        &mut self,
        method: &str,
        args: Vec<Value>,
        kwargs: Vec<(Value, Value)>,
    ) -> DelugeResult<Value> {
        let request_id = self.next_id;
        self.next_id += 1;

        let request = Value::List(vec![Value::List(vec![
            Value::Int(request_id),
            Value::from(method),
            Value::List(args),
            Value::Dict(kwargs),
        ])]);
        debug!(method, request_id, "sending rpc request");
        write_message(&mut self.stream, &request).await?;

        loop {
            let message = read_message(&mut self.stream).await?;
            let items = message.as_list().ok_or(DelugeError::UnexpectedMessage {
                reason: "message is not a list",
            })?;
            let kind = items
                .first()
                .and_then(Value::as_i64)
                .ok_or(DelugeError::UnexpectedMessage {
                    reason: "message type is missing",
                })?;

            match kind {
                RPC_EVENT => {
                    let event = items.get(1).and_then(Value::as_str).unwrap_or("?");
                    debug!(event, "skipping daemon event");
                }
                RPC_RESPONSE => {
                    check_request_id(items, request_id)?;
                    return Ok(items.get(2).cloned().unwrap_or(Value::None));
                }
                RPC_ERROR => {
                    check_request_id(items, request_id)?;
                    return Err(remote_error(method, items));
                }
                _ => {
                    return Err(DelugeError::UnexpectedMessage {
                        reason: "unknown message type",
                    });
                }
            }
        }
    }
}

fn check_request_id(items: &[Value], expected: i64) -> DelugeResult<()> {
    let actual = items
        .get(1)
        .and_then(Value::as_i64)
        .ok_or(DelugeError::UnexpectedMessage {
            reason: "response has no request id",
        })?;
    if actual == expected {
        Ok(())
    } else {
        Err(DelugeError::RequestIdMismatch { expected, actual })
    }
}

fn remote_error(method: &str, items: &[Value]) -> DelugeError {
    let exception = items
        .get(2)
        .and_then(Value::as_str)
        .unwrap_or("UnknownError")
        .to_string();
    let message = match items.get(3) {
        Some(Value::List(parts)) => parts
            .iter()
            .map(describe)
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => describe(other),
        None => String::new(),
    };
    DelugeError::Remote {
        method: method.to_string(),
        exception,
        message,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::Int(number) => number.to_string(),
        Value::Float(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::None => "None".to_string(),
        other => format!("{other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::DuplexStream;

    use super::*;

    async fn next_request(server: &mut DuplexStream) -> Vec<Value> {
        let message = read_message(server).await.expect("request");
        let outer = message.as_list().expect("outer list").to_vec();
        outer[0].as_list().expect("request list").to_vec()
    }

    #[tokio::test]
    async fn returns_matching_response_and_skips_events() {
        let (client, mut server) = tokio::io::duplex(4096);
        let daemon = tokio::spawn(async move {
            let request = next_request(&mut server).await;
            assert_eq!(request[0], Value::Int(1));
            assert_eq!(request[1].as_str(), Some("daemon.info"));
            let event = Value::List(vec![
                Value::Int(RPC_EVENT),
                Value::from("TorrentAddedEvent"),
                Value::List(Vec::new()),
            ]);
            write_message(&mut server, &event).await.expect("event");
            let reply = Value::List(vec![Value::Int(RPC_RESPONSE), Value::Int(1), Value::from("2.1.1")]);
            write_message(&mut server, &reply).await.expect("reply");
        });

        let mut session = RpcSession::new(client);
        let value = session
            .call("daemon.info", Vec::new(), Vec::new())
            .await
            .expect("call");
        assert_eq!(value.as_str(), Some("2.1.1"));
        daemon.await.expect("daemon task");
    }

    #[tokio::test]
    async fn remote_exceptions_join_their_arguments() {
        let (client, mut server) = tokio::io::duplex(4096);
        let daemon = tokio::spawn(async move {
            next_request(&mut server).await;
            let reply = Value::List(vec![
                Value::Int(RPC_ERROR),
                Value::Int(1),
                Value::from("BadLoginError"),
                Value::List(vec![Value::from("Password does not match"), Value::from("admin")]),
                Value::Dict(Vec::new()),
                Value::from("Traceback..."),
            ]);
            write_message(&mut server, &reply).await.expect("reply");
        });

        let mut session = RpcSession::new(client);
        let err = session
            .call("daemon.login", Vec::new(), Vec::new())
            .await
            .expect_err("remote error");
        match err {
            DelugeError::Remote {
                method,
                exception,
                message,
            } => {
                assert_eq!(method, "daemon.login");
                assert_eq!(exception, "BadLoginError");
                assert_eq!(message, "Password does not match, admin");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        daemon.await.expect("daemon task");
    }

    #[tokio::test]
    async fn request_ids_increase() {
        let (client, mut server) = tokio::io::duplex(4096);
        let daemon = tokio::spawn(async move {
            for expected in 1..3 {
                let request = next_request(&mut server).await;
                assert_eq!(request[0], Value::Int(expected));
                let reply = Value::List(vec![Value::Int(RPC_RESPONSE), Value::Int(expected), Value::None]);
                write_message(&mut server, &reply).await.expect("reply");
            }
        });

        let mut session = RpcSession::new(client);
        for _ in 0..2 {
            let value = session.call("daemon.info", Vec::new(), Vec::new()).await.expect("call");
            assert_eq!(value, Value::None);
        }
        daemon.await.expect("daemon task");
    }

    #[tokio::test]
    async fn mismatched_response_id_is_rejected() {
        let (client, mut server) = tokio::io::duplex(4096);
        let daemon = tokio::spawn(async move {
            next_request(&mut server).await;
            let reply = Value::List(vec![Value::Int(RPC_RESPONSE), Value::Int(7), Value::None]);
            write_message(&mut server, &reply).await.expect("reply");
        });

        let mut session = RpcSession::new(client);
        let err = session
            .call("daemon.info", Vec::new(), Vec::new())
            .await
            .expect_err("wrong id");
        assert!(matches!(
            err,
            DelugeError::RequestIdMismatch {
                expected: 1,
                actual: 7
            }
        ));
        daemon.await.expect("daemon task");
    }
}

mod unix_sock;

use std::thread::JoinHandle;

pub use unix_sock::UnixSocket;

use bitcode::{Decode, Encode};
use crossbeam_channel::Sender;
use thiserror::Error;

use crate::context::{DeviceSummary, InputContext, PlayerSummary};

/// Error type for api operations.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("malformed frame: {0}")]
    Decode(#[from] bitcode::Error),
    #[error("frame of {0} bytes is too large")]
    FrameTooLarge(usize),
    #[error("daemon error: {0}")]
    Remote(String),
}

/// Convenient result alias for api operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Query or command sent by a HUD or the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Request {
    Players,
    Devices,
    Battery { guid: String, level: i8 },
    Rebuild,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum Response {
    Players(Vec<Option<PlayerSummary>>),
    Devices(Vec<DeviceSummary>),
    /// The command was queued for the input loop.
    Accepted,
    Error(String),
}

/// Mutation forwarded to the input loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Battery { guid: String, level: i8 },
    Rebuild,
}

/// Answers a request from the published snapshot, forwarding mutations.
pub fn answer(request: Request, context: &InputContext, tx: &Sender<Command>) -> Response {
    let command = match request {
        Request::Players => return Response::Players(context.players()),
        Request::Devices => return Response::Devices(context.devices()),
        Request::Battery { guid, level } => Command::Battery { guid, level },
        Request::Rebuild => Command::Rebuild,
    };
    match tx.send(command) {
        Ok(()) => Response::Accepted,
        Err(_) => Response::Error("input loop is not running".into()),
    }
}

/// padseatd api transport.
/// A listener answers requests from the outer world against the shared
/// context; a client sends one request and waits for the response.
pub trait ApiTransport {
    fn listen(&self, context: InputContext, tx: Sender<Command>) -> ApiResult<JoinHandle<()>>;
    fn request(&self, request: &Request) -> ApiResult<Response>;
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;

    use super::*;
    use crate::context::Snapshot;

    #[test]
    fn queries_are_answered_from_context() {
        let context = InputContext::new();
        context.publish(Snapshot {
            devices: Vec::new(),
            configured: 0,
            players: vec![None, None],
        });
        let (tx, rx) = unbounded();
        assert_eq!(answer(Request::Players, &context, &tx), Response::Players(vec![None, None]));
        assert_eq!(answer(Request::Devices, &context, &tx), Response::Devices(Vec::new()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn mutations_are_forwarded() {
        let context = InputContext::new();
        let (tx, rx) = unbounded();
        let request = Request::Battery {
            guid: "0300".into(),
            level: 30,
        };
        assert_eq!(answer(request, &context, &tx), Response::Accepted);
        assert_eq!(
            rx.try_recv().unwrap(),
            Command::Battery {
                guid: "0300".into(),
                level: 30
            }
        );
        drop(rx);
        assert!(matches!(answer(Request::Rebuild, &context, &tx), Response::Error(_)));
    }
}

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bitcode::{Decode, Encode};
use crossbeam_channel::Sender;

use super::{answer, ApiError, ApiResult, ApiTransport, Command, Request, Response};
use crate::context::InputContext;
use crate::{print_debug, print_error, print_info};

const MAX_FRAME: usize = 1 << 20;
/// A client that stalls longer than this gets an error and is dropped.
const IO_TIMEOUT: Duration = Duration::from_secs(2);

pub struct UnixSocket {
    socket_path: PathBuf,
}

impl UnixSocket {
    pub fn new<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }
}

fn write_frame<T: Encode>(stream: impl Write, value: &T) -> ApiResult<()> {
    let encoded = bitcode::encode(value);
    let length = u32::try_from(encoded.len()).map_err(|_| ApiError::FrameTooLarge(encoded.len()))?;
    let mut writer = BufWriter::new(stream);
    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

fn read_frame<T: for<'a> Decode<'a>>(mut stream: impl Read) -> ApiResult<T> {
    let mut length_buffer = [0u8; 4];
    stream.read_exact(&mut length_buffer)?;
    let length = u32::from_be_bytes(length_buffer) as usize;
    if length > MAX_FRAME {
        return Err(ApiError::FrameTooLarge(length));
    }
    let mut data_buffer = vec![0u8; length];
    stream.read_exact(&mut data_buffer)?;
    Ok(bitcode::decode(&data_buffer)?)
}

impl UnixSocket {
    fn handle_connection(stream: &UnixStream, context: &InputContext, tx: &Sender<Command>) {
        if let Err(err) = stream
            .set_read_timeout(Some(IO_TIMEOUT))
            .and_then(|()| stream.set_write_timeout(Some(IO_TIMEOUT)))
        {
            print_error!("failed to set socket timeouts: {err}");
            return;
        }
        let response = match read_frame::<Request>(stream) {
            Ok(request) => {
                print_debug!("api request: {request:?}");
                answer(request, context, tx)
            }
            Err(err) => {
                print_error!("failed to read request: {err}");
                Response::Error(err.to_string())
            }
        };
        if let Err(err) = write_frame(stream, &response) {
            print_error!("failed to write response: {err}");
        }
    }
}

impl ApiTransport for UnixSocket {
    fn listen(&self, context: InputContext, tx: Sender<Command>) -> ApiResult<JoinHandle<()>> {
        let socket_path = self.socket_path.clone();
        if socket_path.exists() {
            fs::remove_file(&socket_path)?;
        }
        let listener = UnixListener::bind(&socket_path)?;
        print_info!("unix socket api listening at {}", socket_path.display());

        let handle = thread::Builder::new()
            .name("padseatd-socket-api".into())
            .spawn(move || {
                for stream in listener.incoming() {
                    match stream {
                        Ok(stream) => {
                            let context = context.clone();
                            let tx = tx.clone();
                            let worker = thread::Builder::new()
                                .name("padseatd-socket-client".into())
                                .spawn(move || Self::handle_connection(&stream, &context, &tx));
                            if let Err(e) = worker {
                                print_error!("failed to spawn client thread: {e}");
                            }
                        }
                        Err(e) => {
                            print_error!("control socket accept error: {}", e);
                            break;
                        }
                    }
                }
            })?;
        Ok(handle)
    }

    fn request(&self, request: &Request) -> ApiResult<Response> {
        let stream = UnixStream::connect(&self.socket_path)?;
        write_frame(&stream, request)?;
        match read_frame(&stream)? {
            Response::Error(message) => Err(ApiError::Remote(message)),
            response => Ok(response),
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use tempfile::TempDir;

    use super::*;
    use crate::context::{PlayerSummary, Snapshot};

    #[test]
    fn request_round_trips_over_socket() {
        let dir = TempDir::new().unwrap();
        let socket = UnixSocket::new(dir.path().join("padseatd.sock"));
        let context = InputContext::new();
        let player = PlayerSummary {
            slot: 0,
            device_id: 3,
            index: 0,
            name: "PadOne".into(),
            guid: "030000005e04".into(),
            num_buttons: 12,
            num_hats: 1,
            num_axes: 4,
            battery_level: 80,
        };
        context.publish(Snapshot {
            devices: Vec::new(),
            configured: 1,
            players: vec![Some(player.clone()), None],
        });
        let (tx, rx) = unbounded();
        socket.listen(context, tx).unwrap();

        let response = socket.request(&Request::Players).unwrap();
        assert_eq!(response, Response::Players(vec![Some(player), None]));

        let response = socket.request(&Request::Rebuild).unwrap();
        assert_eq!(response, Response::Accepted);
        assert_eq!(rx.recv().unwrap(), Command::Rebuild);
    }

    #[test]
    fn silent_client_does_not_block_others() {
        let dir = TempDir::new().unwrap();
        let socket = UnixSocket::new(dir.path().join("padseatd.sock"));
        let (tx, _rx) = unbounded();
        socket.listen(InputContext::new(), tx).unwrap();

        let silent = UnixStream::connect(dir.path().join("padseatd.sock")).unwrap();
        let response = socket.request(&Request::Devices).unwrap();
        assert_eq!(response, Response::Devices(Vec::new()));

        // The stalled client is answered with an error once the timeout hits.
        let answer: Response = read_frame(&silent).unwrap();
        assert!(matches!(answer, Response::Error(_)));
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&u32::MAX.to_be_bytes());
        let result: ApiResult<Request> = read_frame(frame.as_slice());
        assert!(matches!(result, Err(ApiError::FrameTooLarge(_))));
    }
}

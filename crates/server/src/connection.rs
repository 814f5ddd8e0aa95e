//! Per-connection message loop.
//!
//! One task per accepted WebSocket runs a single serialized loop, so
//! control and binary frames are processed strictly in arrival order
//! and chunk writes can never race the close handling of the same
//! session. The session is shut down on every exit path, including
//! server cancellation and abrupt disconnects.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::session::{Session, SessionError};

/// Drives a session over a WebSocket stream until the client
/// disconnects, a fatal error occurs, or the server shuts down.
pub(crate) async fn serve_socket<S>(ws_stream: S, mut session: Session, cancel: CancellationToken)
where
    S: futures_util::Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>>
        + futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error>
        + Send
        + Unpin,
{
    let (mut sink, mut stream) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("server shutting down, closing session");
                break;
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        match session.on_control(&text).await {
                            Ok(Some(notice)) => {
                                if sink.send(WsMessage::Text(notice.to_string().into())).await.is_err() {
                                    break;
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                report_fatal(&mut sink, &e).await;
                                break;
                            }
                        }
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        // No per-chunk acknowledgment; backpressure is
                        // transport-level only.
                        if let Err(e) = session.on_chunk(&data).await {
                            report_fatal(&mut sink, &e).await;
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Ping(data))) => {
                        let _ = sink.send(WsMessage::Pong(data)).await;
                    }
                    Some(Ok(WsMessage::Pong(_))) | Some(Ok(WsMessage::Frame(_))) => {}
                    Some(Ok(WsMessage::Close(_))) => {
                        tracing::info!("received close frame");
                        break;
                    }
                    Some(Err(e)) => {
                        // Abrupt disconnects land here; cleanup, not an error.
                        tracing::info!("transport closed: {e}");
                        break;
                    }
                    None => {
                        tracing::info!("client disconnected");
                        break;
                    }
                }
            }
        }
    }

    session.shutdown().await;
    let _ = sink.close().await;
}

/// Sends the single descriptive error notice before teardown, when the
/// socket still accepts writes.
async fn report_fatal<S>(sink: &mut S, err: &SessionError)
where
    S: futures_util::Sink<WsMessage, Error = tokio_tungstenite::tungstenite::Error> + Unpin,
{
    tracing::error!("session terminated: {err}");
    let _ = sink.send(WsMessage::Text(err.notice().to_string().into())).await;
}

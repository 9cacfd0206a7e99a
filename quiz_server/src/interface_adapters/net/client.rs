use crate::interface_adapters::protocol::{ClientMessage, JoinAckDto, ServerMessage};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids::next_conn_id;
use crate::use_cases::{Binding, Connection, Gateway, RoomEvent};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{Instrument, Span, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const UNBOUND: &str = "-";

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    // Separate connection id for correlating logs before a session binding exists.
    let conn_id = next_conn_id();
    let span = info_span!(
        "conn",
        conn_id,
        session_id = tracing::field::Empty,
        identity = tracing::field::Empty
    );

    let gateway = state.gateway.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, gateway).instrument(span))
}

struct ConnCtx {
    connection: Connection,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,
    last_invalid_json_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn handle_socket(mut socket: WebSocket, gateway: Arc<Gateway>) {
    info!("client connected");

    // Every connection starts unbound; join_room attaches it to a session.
    let mut ctx = ConnCtx {
        connection: gateway.connect(),
        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,
        invalid_json: 0,
        last_invalid_json_log: Instant::now() - LOG_THROTTLE,
        close_frame: None,
    };

    // Main client loop.
    run_client_loop(&mut socket, &mut ctx).await;

    let ConnCtx {
        connection,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        ..
    } = ctx;
    // Releases the binding and notifies the remaining members.
    connection.disconnect();

    debug!(
        msgs_in,
        msgs_out, bytes_in, bytes_out, invalid_json, "connection stats"
    );
    info!("client disconnected");
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) {
    loop {
        let control = tokio::select! {
            // Incoming message from the client.
            incoming = socket.recv() => handle_incoming_ws(socket, incoming, ctx).await,

            // Outgoing event for the bound session; pending while unbound.
            event = ctx.connection.next_event() => forward_room_event(socket, event, ctx).await,
        };

        if let LoopControl::Disconnect = control {
            // Send the policy close frame first, if one was chosen.
            if let Some(frame) = ctx.close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }
}

async fn handle_incoming_ws(
    socket: &mut WebSocket,
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> LoopControl {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                // Count every text frame, parsed or not.
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => handle_client_message(socket, message, ctx).await,
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_json_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        // Persistent garbage closes the socket with a policy code.
                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return LoopControl::Disconnect;
                        }

                        LoopControl::Continue
                    }
                }
            }
            Message::Binary(_) => {
                // The protocol is JSON text only.
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                LoopControl::Disconnect
            }
            Message::Ping(_) | Message::Pong(_) => LoopControl::Continue,
            Message::Close(_) => LoopControl::Disconnect,
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            LoopControl::Disconnect
        }
        None => {
            debug!("websocket closed");
            LoopControl::Disconnect
        }
    }
}

async fn handle_client_message(
    socket: &mut WebSocket,
    message: ClientMessage,
    ctx: &mut ConnCtx,
) -> LoopControl {
    // Joins echo the client's request id in their ack.
    let request_id = match &message {
        ClientMessage::JoinRoom(payload) => payload.request_id,
        _ => None,
    };

    let outcome = ctx.connection.handle(message.into());
    // Keep the span in step with the binding after every message.
    record_binding(&Span::current(), ctx.connection.binding());

    // Only joins are acknowledged; leave and start are fire-and-forget.
    let Some(outcome) = outcome else {
        return LoopControl::Continue;
    };
    if let Err(err) = &outcome {
        debug!(error = ?err, "join_room rejected");
    }

    let ack = ServerMessage::JoinAck(JoinAckDto::from_outcome(request_id, &outcome));
    send_tracked(socket, &ack, ctx).await
}

// Tracing cannot un-record a field, so an unbound connection is marked with `-`.
fn record_binding(span: &Span, binding: Option<&Binding>) {
    match binding {
        Some(binding) => {
            span.record("session_id", binding.session_id.as_str());
            span.record("identity", binding.identity.as_str());
        }
        None => {
            span.record("session_id", UNBOUND);
            span.record("identity", UNBOUND);
        }
    }
}

async fn forward_room_event(
    socket: &mut WebSocket,
    event: RoomEvent,
    ctx: &mut ConnCtx,
) -> LoopControl {
    let msg = ServerMessage::from(event);
    send_tracked(socket, &msg, ctx).await
}

async fn send_tracked(socket: &mut WebSocket, msg: &ServerMessage, ctx: &mut ConnCtx) -> LoopControl {
    match send_message(socket, msg).await {
        Ok(bytes) => {
            ctx.msgs_out += 1;
            ctx.bytes_out += bytes as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Disconnect follows immediately; the binding is released on the way out.
            warn!(error = ?err, "failed to send message");
            LoopControl::Disconnect
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    // Serialize safely; report JSON errors instead of panicking.
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

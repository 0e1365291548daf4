//! Per-connection handler: command decoding, routing, and cleanup.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Register an outbound queue with the hub; spawn its writer
//!   2. Loop: receive a command → call the coordinator → apply the outcome
//!   3. On close, error or idle timeout: leave the room, drop the queue
//!
//! Any command counts as activity. A client with nothing to say sends
//! `Heartbeat` to stay connected.
//!
//! A connection is in at most one room at a time. Joining another room
//! leaves the current one first.

use std::sync::Arc;

use sketchwire_protocol::{
    ClientCommand, Codec, ConnectionHandle, GameEvent, JsonCodec, RoomCode,
};
use sketchwire_session::{SessionError, validate_name};
use sketchwire_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::SketchwireError;
use crate::server::ServerState;

/// Drop guard that takes the player out of their room when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the async leave runs in a spawned task.
struct Membership {
    handle: ConnectionHandle,
    room: Option<RoomCode>,
    state: Arc<ServerState>,
}

impl Drop for Membership {
    fn drop(&mut self) {
        let handle = self.handle;
        let room = self.room.take();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            if let Some(code) = room {
                leave_room(&state, &code, handle).await;
            }
            state.hub.unregister(handle);
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), SketchwireError> {
    let handle = conn.handle();
    tracing::debug!(conn = %handle, peer = %conn.peer_addr(), "handling new connection");

    let conn = Arc::new(conn);
    let outbox = state.hub.register(handle);
    let writer = tokio::spawn(write_loop(Arc::clone(&conn), outbox, state.codec));

    let mut membership = Membership {
        handle,
        room: None,
        state: Arc::clone(&state),
    };

    loop {
        let data = match tokio::time::timeout(state.config.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::debug!(conn = %handle, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(conn = %handle, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(conn = %handle, "connection idle, dropping");
                break;
            }
        };

        let command: ClientCommand = match state.codec.decode(&data) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(conn = %handle, error = %e, "failed to decode command");
                notify(&state, handle, "unrecognized message");
                continue;
            }
        };

        handle_command(&state, &mut membership, command).await;
    }

    drop(membership);
    // The writer ends once the guard's task unregisters the queue.
    let _ = writer.await;
    let _ = conn.close().await;
    Ok(())
}

/// Drains the connection's queue onto the socket, in order.
async fn write_loop(
    conn: Arc<WebSocketConnection>,
    mut outbox: mpsc::UnboundedReceiver<GameEvent>,
    codec: JsonCodec,
) -> Result<(), SketchwireError> {
    while let Some(event) = outbox.recv().await {
        let bytes = codec.encode(&event)?;
        conn.send(&bytes).await?;
    }
    Ok(())
}

/// Routes one decoded command.
async fn handle_command(state: &ServerState, membership: &mut Membership, command: ClientCommand) {
    let handle = membership.handle;
    let coordinator = &state.coordinator;

    match command {
        ClientCommand::CreateRoom { name } => {
            if let Err(rejection) = validate_name(&name) {
                report(state, handle, &SessionError::from(rejection));
                return;
            }
            if let Some(current) = membership.room.take() {
                leave_room(state, &current, handle).await;
            }
            let code = coordinator.create_room();
            state.hub.send_to(handle, GameEvent::RoomCreated { code: code.clone() });
            if join_room(state, membership, &code, &name).await.is_err() {
                coordinator.discard_if_empty(&code).await;
            }
        }

        ClientCommand::JoinRoom { code, name } => {
            if let Some(current) = membership.room.take_if(|current| *current != code) {
                leave_room(state, &current, handle).await;
            }
            let _ = join_room(state, membership, &code, &name).await;
        }

        ClientCommand::ListRooms => {
            let rooms = coordinator.list_rooms().await;
            state.hub.send_to(handle, GameEvent::RoomList { rooms });
        }

        ClientCommand::LeaveRoom => match membership.room.take() {
            Some(code) => leave_room(state, &code, handle).await,
            None => tracing::debug!(conn = %handle, "leave without a room"),
        },

        ClientCommand::Heartbeat { client_time } => {
            state.hub.send_to(handle, GameEvent::HeartbeatAck { client_time });
        }

        in_room => {
            let Some(code) = membership.room.clone() else {
                notify(state, handle, "join a room first");
                return;
            };
            let outcome = match in_room {
                ClientCommand::StartRound => match coordinator.request_start(&code, handle).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        report(state, handle, &e);
                        return;
                    }
                },
                ClientCommand::Say { text } => coordinator.submit_text(&code, handle, &text).await,
                ClientCommand::Draw { payload } => {
                    coordinator.submit_drawing(&code, handle, payload).await
                }
                ClientCommand::ClearCanvas => coordinator.clear_canvas(&code, handle).await,
                ClientCommand::EndRound => coordinator.request_end(&code, handle).await,
                ClientCommand::CreateRoom { .. }
                | ClientCommand::JoinRoom { .. }
                | ClientCommand::ListRooms
                | ClientCommand::LeaveRoom
                | ClientCommand::Heartbeat { .. } => return,
            };
            state.apply(outcome);
        }
    }
}

/// Joins `code` as `name` and wires up delivery. Errors are reported to
/// the client before being returned.
///
/// Delivery is wired while the room is still locked: the `Welcome` goes
/// out first, then the connection joins the room's group, so no later
/// broadcast can overtake or miss it.
async fn join_room(
    state: &ServerState,
    membership: &mut Membership,
    code: &RoomCode,
    name: &str,
) -> Result<(), SessionError> {
    let handle = membership.handle;
    let hub = &state.hub;
    let result = state
        .coordinator
        .join_with(code, handle, name, |joined| {
            if let Some(old) = joined.replaced {
                // Same player on a new connection: the old socket stops
                // receiving this room's events.
                hub.exit(code, old);
                hub.send_to(
                    old,
                    GameEvent::Notice {
                        message: "signed in from another connection".into(),
                    },
                );
            }
            hub.deliver(std::mem::take(&mut joined.outcome.dispatches));
            hub.enter(code, handle);
        })
        .await;

    let joined = match result {
        Ok(joined) => joined,
        Err(e) => {
            report(state, handle, &e);
            return Err(e);
        }
    };
    membership.room = Some(code.clone());

    tracing::debug!(
        room = %code,
        conn = %handle,
        player = %joined.player.display_name(),
        reconnected = joined.reconnected,
        "membership updated"
    );
    state.apply(joined.outcome);
    Ok(())
}

async fn leave_room(state: &ServerState, code: &RoomCode, handle: ConnectionHandle) {
    let outcome = state.coordinator.leave(code, handle).await;
    state.hub.exit(code, handle);
    state.apply(outcome);
}

/// Sends a refusal to the client unless it is one we drop silently.
fn report(state: &ServerState, handle: ConnectionHandle, error: &SessionError) {
    if error.is_silent() {
        tracing::debug!(conn = %handle, error = %error, "request dropped");
        return;
    }
    notify(state, handle, &error.to_string());
}

fn notify(state: &ServerState, handle: ConnectionHandle, message: &str) {
    state.hub.send_to(
        handle,
        GameEvent::Notice {
            message: message.to_string(),
        },
    );
}

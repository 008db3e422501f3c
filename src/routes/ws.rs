//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::logic;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "integra_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "integra_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target = "integra_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "integra_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "integra_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListObjectives => {
      ServerWsMessage::Objectives { objectives: logic::list_objectives(state) }
    }

    ClientWsMessage::GetProblem { problem_id } => {
      match logic::get_problem(state, &problem_id).await {
        Ok(problem) => ServerWsMessage::Problem { problem },
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::SubmitAnswer { problem_id, answer } => {
      match logic::evaluate_answer(state, &problem_id, &answer).await {
        Ok(out) => {
          tracing::info!(target: "practice", id = %problem_id, correct = out.correct, "WS submit_answer evaluated");
          ServerWsMessage::AnswerResult(out)
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Hint { problem_id, level } => {
      match logic::consume_hint(state, &problem_id, level).await {
        Ok(hint) => {
          tracing::info!(target: "practice", id = %problem_id, level, "WS hint served");
          ServerWsMessage::Hint(hint)
        }
        Err(message) => ServerWsMessage::Error { message },
      }
    }

    ClientWsMessage::Progress => ServerWsMessage::Progress(logic::progress_overview(state).await),

    ClientWsMessage::Achievements => {
      ServerWsMessage::Achievements(logic::achievements_overview(state).await)
    }

    ClientWsMessage::SetStudent { name, id, local_center } => {
      let student =
        logic::set_student(state, crate::protocol::StudentIn { name, id, local_center }).await;
      ServerWsMessage::Student { student }
    }

    ClientWsMessage::ResetProgress => {
      logic::reset_progress(state).await;
      ServerWsMessage::ProgressReset { ok: true }
    }

    ClientWsMessage::ExportProgress => ServerWsMessage::Export(logic::export_progress(state).await),

    ClientWsMessage::Plot { expression, from, to, samples } => {
      match logic::sample_plot(&expression, from, to, samples) {
        Ok(plot) => ServerWsMessage::Plot(plot),
        Err(message) => ServerWsMessage::Error { message },
      }
    }
  }
}

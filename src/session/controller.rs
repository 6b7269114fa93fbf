//! The conversation-session controller.
//!
//! Owns the timeline, the in-flight flag, the draft, and the session
//! configuration, and exposes the transitions that mutate them. It performs
//! no I/O: `submit` hands back a [`ChatDispatch`] snapshot for the caller to
//! put on the wire, and the settlement of that request comes back in through
//! [`settle_chat`]. That split keeps the state machine testable without a
//! network.

use crate::api::{ChatReply, TransportError, UploadSummary};
use crate::session::{ModelId, Role, SessionConfig, Turn};

pub const CHAT_FALLBACK: &str = "No se pudo procesar la solicitud";

/// Snapshot of everything a chat request needs, taken at submit time.
#[derive(Debug, Clone)]
pub struct ChatDispatch {
    pub history: Vec<Turn>,
    pub model: ModelId,
    pub temperature: f32,
}

pub struct SessionController {
    timeline: Vec<Turn>,
    draft: String,
    pending: bool,
    config: SessionConfig,
}

impl SessionController {
    pub fn new() -> Self {
        Self {
            timeline: Vec::new(),
            draft: String::new(),
            pending: false,
            config: SessionConfig::default(),
        }
    }

    pub fn timeline(&self) -> &[Turn] {
        &self.timeline
    }

    pub fn pending(&self) -> bool {
        self.pending
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// The uncommitted composer text. Edited in place by the text widget.
    pub fn draft_mut(&mut self) -> &mut String {
        &mut self.draft
    }

    /// Commit the draft as a user turn and enter the awaiting-response
    /// state. Returns `None` without any effect when the draft is empty
    /// after trimming or when a request is already outstanding; rejecting
    /// concurrent submits here is the sole concurrency guard for chat.
    pub fn submit(&mut self) -> Option<ChatDispatch> {
        if self.pending {
            return None;
        }
        let text = self.draft.trim();
        if text.is_empty() {
            return None;
        }

        self.timeline.push(Turn::user(text));
        self.draft.clear();
        self.pending = true;

        Some(ChatDispatch {
            history: self.timeline.clone(),
            model: self.config.model,
            temperature: self.config.temperature,
        })
    }

    /// Apply the outcome of the outstanding chat request. Success appends
    /// the assistant's reply; failure appends an assistant turn carrying the
    /// derived error text, so the failure stays visible in the history.
    /// Releases `pending` on every path.
    pub fn settle_chat(&mut self, result: Result<ChatReply, TransportError>) {
        let turn = match result {
            Ok(reply) => Turn {
                role: Role::Assistant,
                content: reply.content,
                tool_calls: reply.tool_calls,
            },
            Err(error) => {
                Turn::assistant(format!("Error: {}", error.user_message(CHAT_FALLBACK)))
            }
        };
        self.timeline.push(turn);
        self.pending = false;
    }

    /// Merge an upload confirmation into the timeline as a synthetic
    /// assistant turn. Independent of `pending`; uploads are coordinated by
    /// the upload side and may settle while a chat request is in flight.
    pub fn record_upload(&mut self, summary: &UploadSummary) {
        let content = format!(
            "✅ {}\n\nColumnas: {}\nFilas: {}\n\n¿Qué análisis te gustaría realizar?",
            summary.message,
            summary.data_summary.columns.join(", "),
            summary.data_summary.row_count,
        );
        self.timeline.push(Turn::assistant(content));
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.config.model = model;
    }

    /// Out-of-range input is clamped rather than trusted; the slider already
    /// bounds it, but the configuration must never hold an invalid value.
    pub fn set_temperature(&mut self, value: f32) {
        if value.is_finite() {
            self.config.temperature = value.clamp(0.0, 1.0);
        }
    }

    /// Wipe the conversation and the draft. Configuration is kept.
    pub fn clear(&mut self) {
        self.timeline.clear();
        self.draft.clear();
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DataSummary;
    use serde_json::json;

    fn submitted(text: &str) -> (SessionController, ChatDispatch) {
        let mut controller = SessionController::new();
        *controller.draft_mut() = text.to_string();
        let dispatch = controller.submit().expect("submit should dispatch");
        (controller, dispatch)
    }

    #[test]
    fn submit_appends_user_turn_and_snapshots_config() {
        let (controller, dispatch) = submitted("¿Cuál es el ratio de liquidez?");

        assert_eq!(dispatch.history.len(), 1);
        assert_eq!(dispatch.history[0].content, "¿Cuál es el ratio de liquidez?");
        assert_eq!(dispatch.model, ModelId::Gemini15Pro);
        assert_eq!(dispatch.temperature, 0.7);
        assert!(controller.pending());
        assert_eq!(controller.timeline().len(), 1);
        assert_eq!(controller.timeline()[0].role, Role::User);
    }

    #[test]
    fn submit_trims_and_rejects_empty_drafts() {
        let mut controller = SessionController::new();
        *controller.draft_mut() = "   \n  ".to_string();

        assert!(controller.submit().is_none());
        assert!(controller.timeline().is_empty());
        assert!(!controller.pending());
    }

    #[test]
    fn submit_while_pending_is_a_no_op() {
        let (mut controller, _) = submitted("primera pregunta");

        *controller.draft_mut() = "segunda pregunta".to_string();
        assert!(controller.submit().is_none());
        assert_eq!(controller.timeline().len(), 1);
        assert_eq!(controller.draft_mut().as_str(), "segunda pregunta");
    }

    #[test]
    fn successful_settlement_appends_assistant_turn_and_releases_pending() {
        let (mut controller, _) = submitted("hola");

        controller.settle_chat(Ok(ChatReply {
            content: "¡Bienvenido!".to_string(),
            tool_calls: Vec::new(),
        }));

        assert!(!controller.pending());
        assert_eq!(controller.timeline().len(), 2);
        let reply = &controller.timeline()[1];
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "¡Bienvenido!");
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn failed_settlement_appends_error_turn_and_releases_pending() {
        let (mut controller, _) = submitted("hola");

        controller.settle_chat(Err(TransportError::Rejected(
            "Error generating response: quota exceeded".to_string(),
        )));

        assert!(!controller.pending());
        assert_eq!(controller.timeline().len(), 2);
        assert_eq!(
            controller.timeline()[1].content,
            "Error: Error generating response: quota exceeded"
        );
    }

    #[test]
    fn unreachable_settlement_uses_the_generic_fallback() {
        let (mut controller, _) = submitted("hola");

        controller.settle_chat(Err(TransportError::Unreachable(String::new())));

        assert_eq!(
            controller.timeline()[1].content,
            format!("Error: {CHAT_FALLBACK}")
        );
        assert!(!controller.pending());
    }

    #[test]
    fn submit_works_again_after_settlement() {
        let (mut controller, _) = submitted("primera");
        controller.settle_chat(Err(TransportError::Unreachable("timeout".to_string())));

        *controller.draft_mut() = "segunda".to_string();
        let dispatch = controller.submit().expect("controller should accept a retry");
        assert_eq!(dispatch.history.len(), 3);
    }

    #[test]
    fn record_upload_formats_columns_and_row_count() {
        let mut controller = SessionController::new();
        controller.record_upload(&UploadSummary {
            message: "OK".to_string(),
            data_summary: DataSummary {
                columns: vec!["date".to_string(), "amount".to_string()],
                row_count: 120,
            },
        });

        assert_eq!(controller.timeline().len(), 1);
        let turn = &controller.timeline()[0];
        assert_eq!(turn.role, Role::Assistant);
        assert!(turn.content.contains("date, amount"));
        assert!(turn.content.contains("120"));
        assert!(!controller.pending());
    }

    #[test]
    fn upload_may_merge_while_a_chat_request_is_outstanding() {
        let (mut controller, _) = submitted("analiza el flujo de caja");

        controller.record_upload(&UploadSummary {
            message: "Successfully uploaded 12 rows of financial data".to_string(),
            data_summary: DataSummary {
                columns: vec!["mes".to_string(), "ingresos".to_string()],
                row_count: 12,
            },
        });

        // Upload confirmations do not touch the chat in-flight flag.
        assert!(controller.pending());
        assert_eq!(controller.timeline().len(), 2);
    }

    #[test]
    fn clear_empties_timeline_and_draft_but_keeps_config() {
        let (mut controller, _) = submitted("hola");
        controller.settle_chat(Ok(ChatReply {
            content: "respuesta".to_string(),
            tool_calls: Vec::new(),
        }));
        controller.set_model(ModelId::GeminiPro);
        controller.set_temperature(0.3);
        *controller.draft_mut() = "borrador".to_string();

        controller.clear();

        assert!(controller.timeline().is_empty());
        assert!(controller.draft_mut().is_empty());
        assert_eq!(controller.config().model, ModelId::GeminiPro);
        assert_eq!(controller.config().temperature, 0.3);
    }

    #[test]
    fn temperature_is_clamped_to_the_unit_interval() {
        let mut controller = SessionController::new();

        controller.set_temperature(1.7);
        assert_eq!(controller.config().temperature, 1.0);

        controller.set_temperature(-0.4);
        assert_eq!(controller.config().temperature, 0.0);

        controller.set_temperature(f32::NAN);
        assert_eq!(controller.config().temperature, 0.0);

        controller.set_temperature(0.5);
        assert_eq!(controller.config().temperature, 0.5);
    }

    #[test]
    fn default_config_round_trip_with_tool_calls() {
        let (mut controller, dispatch) = submitted("¿Cuál es el ratio de liquidez?");

        assert_eq!(dispatch.history.len(), 1);
        assert_eq!(dispatch.model.as_str(), "gemini-1.5-pro");
        assert_eq!(dispatch.temperature, 0.7);

        controller.settle_chat(Ok(ChatReply {
            content: "El ratio de liquidez corriente es 1.8".to_string(),
            tool_calls: vec![crate::session::ToolCall {
                name: "calculate_ratios".to_string(),
                arguments: Some(json!({"dataset": "uploaded"})),
            }],
        }));

        assert_eq!(controller.timeline().len(), 2);
        assert_eq!(controller.timeline()[1].tool_calls.len(), 1);
        assert!(!controller.pending());
    }
}

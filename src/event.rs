use crate::api::{ChatReply, TransportError, UploadSummary};

/// Settlement events crossing from the tokio runtime back to the UI thread.
/// Turns are appended in the order these arrive; an upload confirmation and
/// a concurrently settling chat reply land in settlement order.
#[derive(Debug, Clone)]
pub enum AppEvent {
    ChatSettled(Result<ChatReply, TransportError>),
    UploadSettled(Result<UploadSummary, TransportError>),
}

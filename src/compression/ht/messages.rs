
//! Diagnostics of the codestream engine.
//! Each call carries its own handler, there is no process-wide message state.

/// How severe a diagnostic message is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {

    /// Informational, nothing went wrong.
    Info,

    /// The engine recovered, but the data may not be what the writer intended.
    Warning,

    /// The engine is about to fail with an error.
    Error,
}

/// Receives the diagnostics that the codestream engine
/// reports while compressing or decompressing one chunk.
pub trait MessageHandler {

    /// Called for every message of the engine.
    fn message(&self, level: MessageLevel, text: &str);
}

impl<F> MessageHandler for F where F: Fn(MessageLevel, &str) {
    fn message(&self, level: MessageLevel, text: &str) {
        self(level, text)
    }
}

/// Forwards all engine diagnostics to `tracing`.
/// This is the default handler of every request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TracingMessages;

impl MessageHandler for TracingMessages {
    fn message(&self, level: MessageLevel, text: &str) {
        match level {
            MessageLevel::Info => tracing::info!(target: "exr_ht::codestream", "{}", text),
            MessageLevel::Warning => tracing::warn!(target: "exr_ht::codestream", "{}", text),
            MessageLevel::Error => tracing::error!(target: "exr_ht::codestream", "{}", text),
        }
    }
}

/// Discards all engine diagnostics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreMessages;

impl MessageHandler for IgnoreMessages {
    fn message(&self, _: MessageLevel, _: &str) {}
}


#[cfg(test)]
mod test {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn closures_receive_messages(){
        let received = RefCell::new(Vec::new());
        let handler = |level: MessageLevel, text: &str| received.borrow_mut().push((level, text.to_string()));

        let handler: &dyn MessageHandler = &handler;
        handler.message(MessageLevel::Warning, "skipped marker");
        TracingMessages.message(MessageLevel::Info, "not captured");

        assert_eq!(received.into_inner(), vec![ (MessageLevel::Warning, "skipped marker".to_string()) ]);
    }
}

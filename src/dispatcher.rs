// 🚨 Error Dispatcher - Log first, then tell the user
//
// Inputs:
// - application errors (`KError`)
// - framework warnings (`WarningEvent`)
// - unclassified runtime errors (`ScriptErrorEvent`, panics included)
//
// Output, always in this order: one diagnostic log line, then one
// notification with the localized message for the error code. If the
// notification step fails, the failure is logged and dropped: no second
// notification, no re-wrapping.

use serde::Serialize;
use serde_json::json;
use std::panic::{self, PanicHookInfo};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::error::{ErrorCode, KError};
use crate::i18n::{LocaleError, Translate};

/// Harmless browser error that loops through the notification widget
/// if it is ever shown.
pub const RESIZE_OBSERVER_LOOP: &str = "ResizeObserver loop limit exceeded";

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyColor {
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyPosition {
    Top,
}

/// Transient message shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub color: NotifyColor,
    pub position: NotifyPosition,
    pub message: String,
    /// Auto-dismiss delay
    pub timeout: Duration,
}

impl Notification {
    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            color: NotifyColor::Negative,
            position: NotifyPosition::Top,
            message: message.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    Closed,
}

/// Where notifications are shown
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Emits notifications as structured events on the `notify` target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        warn!(
            target: "notify",
            color = ?notification.color,
            position = ?notification.position,
            timeout_ms = notification.timeout.as_millis() as u64,
            "{}",
            notification.message
        );
        Ok(())
    }
}

// ============================================================================
// RUNTIME EVENTS
// ============================================================================

/// Warning reported by the UI framework
#[derive(Debug, Clone, PartialEq)]
pub struct WarningEvent {
    pub message: String,
    pub trace: String,
}

/// Unhandled runtime error with its source location
#[derive(Debug, Clone, Default)]
pub struct ScriptErrorEvent {
    pub message: String,
    pub filename: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    /// Set when the thrown value already was a `KError`
    pub error: Option<KError>,
}

impl ScriptErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        ScriptErrorEvent {
            message: message.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn at(mut self, filename: impl Into<String>, line: u32, column: u32) -> Self {
        self.filename = Some(filename.into());
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: KError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn from_panic(info: &PanicHookInfo<'_>) -> Self {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());

        let event = ScriptErrorEvent::new(message);
        match info.location() {
            Some(location) => event.at(location.file(), location.line(), location.column()),
            None => event,
        }
    }

    fn is_spurious(&self) -> bool {
        self.message.contains(RESIZE_OBSERVER_LOOP)
    }

    fn into_kerror(self) -> KError {
        if let Some(error) = self.error {
            return error;
        }
        let context = json!({
            "url": self.filename,
            "line": self.line,
            "column": self.column,
        });
        KError::new(ErrorCode::UnknownScript, self.message).with_context(context)
    }
}

#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Error(KError),
    Warning(WarningEvent),
    Script(ScriptErrorEvent),
}

/// What happened to a dispatched error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Logged and shown to the user
    Notified,
    /// Dropped before dispatch (spurious error)
    Filtered,
    /// Logged; surfacing it failed
    LoggedOnly,
}

#[derive(Debug, Error)]
enum SurfaceError {
    #[error("localization failed: {0}")]
    Translate(#[from] LocaleError),

    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),
}

// ============================================================================
// DISPATCHER
// ============================================================================

pub struct ErrorDispatcher {
    translator: Arc<dyn Translate>,
    notifier: Arc<dyn Notifier>,
    /// Development mode: report filtered errors as warnings
    dev: bool,
}

impl ErrorDispatcher {
    pub fn new(translator: Arc<dyn Translate>, notifier: Arc<dyn Notifier>, dev: bool) -> Self {
        ErrorDispatcher { translator, notifier, dev }
    }

    /// Main entry point: log the error, then notify the user
    pub fn handle(&self, error: &KError) -> Dispatch {
        error!(code = %error.code, context = %error.context, "[{}] {}", error.code, error);

        match self.surface(error) {
            Ok(()) => Dispatch::Notified,
            Err(failure) => {
                error!(
                    "[{}] Error while handling another error: {}",
                    ErrorCode::ErrorHandling,
                    failure
                );
                Dispatch::LoggedOnly
            }
        }
    }

    fn surface(&self, error: &KError) -> Result<(), SurfaceError> {
        let message = self.translator.translate(&error.translation_key())?;
        self.notifier.notify(Notification::error(message))?;
        Ok(())
    }

    pub fn handle_warning(&self, event: WarningEvent) -> Dispatch {
        let error = KError::new(
            ErrorCode::FrameworkWarning,
            format!("{}{}", event.message, event.trace),
        )
        .with_context(json!({ "message": event.message, "trace": event.trace }));
        self.handle(&error)
    }

    pub fn handle_script_error(&self, event: ScriptErrorEvent) -> Dispatch {
        if event.is_spurious() {
            if self.dev {
                warn!("{}", event.message);
            }
            return Dispatch::Filtered;
        }
        self.handle(&event.into_kerror())
    }

    pub fn dispatch(&self, event: RuntimeEvent) -> Dispatch {
        match event {
            RuntimeEvent::Error(error) => self.handle(&error),
            RuntimeEvent::Warning(warning) => self.handle_warning(warning),
            RuntimeEvent::Script(script) => self.handle_script_error(script),
        }
    }

    /// Start listening for runtime events
    ///
    /// Must be called inside a Tokio runtime. Events reported through the
    /// returned sink are dispatched in order until the subscription ends.
    pub fn subscribe(self: &Arc<Self>) -> (ErrorSink, Subscription) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Arc::clone(self);
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                dispatcher.dispatch(event);
            }
        });
        (ErrorSink { tx }, Subscription { task: Some(task) })
    }
}

// ============================================================================
// SUBSCRIPTION HANDLES
// ============================================================================

/// Cloneable reporter feeding a [`Subscription`]
#[derive(Debug, Clone)]
pub struct ErrorSink {
    tx: mpsc::UnboundedSender<RuntimeEvent>,
}

impl ErrorSink {
    /// Returns false when the subscription is gone
    pub fn report(&self, error: KError) -> bool {
        self.tx.send(RuntimeEvent::Error(error)).is_ok()
    }

    pub fn report_warning(&self, message: impl Into<String>, trace: impl Into<String>) -> bool {
        let warning = WarningEvent {
            message: message.into(),
            trace: trace.into(),
        };
        self.tx.send(RuntimeEvent::Warning(warning)).is_ok()
    }

    pub fn report_script_error(&self, event: ScriptErrorEvent) -> bool {
        self.tx.send(RuntimeEvent::Script(event)).is_ok()
    }
}

/// Listening task; stops when dropped or unsubscribed
#[derive(Debug)]
pub struct Subscription {
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop listening now; queued events are discarded
    pub async fn unsubscribe(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
        }
    }

    /// Wait until every sink is dropped and queued events are handled
    pub async fn finish(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ============================================================================
// PANIC REPORTER
// ============================================================================

type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// Forwards panics to an [`ErrorSink`] as script errors
///
/// The previous hook still runs after reporting, and is restored when the
/// reporter is dropped.
pub struct PanicReporter {
    previous: Option<Arc<PanicHook>>,
}

impl PanicReporter {
    pub fn install(sink: ErrorSink) -> Self {
        let previous: Arc<PanicHook> = Arc::from(panic::take_hook());
        let chained = Arc::clone(&previous);
        panic::set_hook(Box::new(move |info| {
            sink.report_script_error(ScriptErrorEvent::from_panic(info));
            chained(info);
        }));
        PanicReporter { previous: Some(previous) }
    }
}

impl Drop for PanicReporter {
    fn drop(&mut self) {
        // set_hook panics when called from a panicking thread
        if std::thread::panicking() {
            return;
        }
        if let Some(previous) = self.previous.take() {
            let _ = panic::take_hook();
            panic::set_hook(Box::new(move |info| previous(info)));
        }
    }
}

// ============================================================================
// TEST DOUBLES
// ============================================================================


// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::testing::{KeyTranslator, RecordingNotifier};
    use super::*;
    use crate::i18n::{embedded_locales, EmbeddedLoader, LocaleContext};
    use crate::prefs::MemoryPreferences;

    struct ClosedNotifier;

    impl Notifier for ClosedNotifier {
        fn notify(&self, _: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Closed)
        }
    }

    fn dispatcher(translator: KeyTranslator) -> (ErrorDispatcher, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = ErrorDispatcher::new(Arc::new(translator), notifier.clone(), true);
        (dispatcher, notifier)
    }

    #[test]
    fn test_handle_notifies_localized_message() {
        let (dispatcher, notifier) = dispatcher(KeyTranslator::default());
        let result = dispatcher.handle(&KError::not_found("account", "GRP00001"));

        assert_eq!(result, Dispatch::Notified);
        assert_eq!(notifier.messages(), vec!["T(error-not-found)"]);
        let received = notifier.received.lock().unwrap();
        assert_eq!(received[0].color, NotifyColor::Negative);
        assert_eq!(received[0].position, NotifyPosition::Top);
    }

    #[test]
    fn test_resize_observer_error_is_filtered() {
        let (dispatcher, notifier) = dispatcher(KeyTranslator::default());
        let event = ScriptErrorEvent::new("ResizeObserver loop limit exceeded").at("app.js", 1, 1);

        assert_eq!(dispatcher.handle_script_error(event), Dispatch::Filtered);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_other_script_error_notifies() {
        let (dispatcher, notifier) = dispatcher(KeyTranslator::default());
        let event = ScriptErrorEvent::new("undefined is not a function").at("app.js", 10, 4);

        assert_eq!(dispatcher.handle_script_error(event), Dispatch::Notified);
        assert_eq!(notifier.messages(), vec!["T(error-unknown-script)"]);
    }

    #[test]
    fn test_script_error_wrapping_keeps_location() {
        let error = ScriptErrorEvent::new("boom").at("src/lib.rs", 7, 3).into_kerror();
        assert_eq!(error.code, ErrorCode::UnknownScript);
        assert_eq!(error.context["url"], "src/lib.rs");
        assert_eq!(error.context["line"], 7);
        assert_eq!(error.context["column"], 3);
    }

    #[test]
    fn test_script_error_carrying_kerror_is_not_rewrapped() {
        let (dispatcher, notifier) = dispatcher(KeyTranslator::default());
        let inner = KError::new(ErrorCode::InvalidQuery, "bad sort");
        let event = ScriptErrorEvent::new("Uncaught bad sort").with_error(inner);

        dispatcher.handle_script_error(event);
        assert_eq!(notifier.messages(), vec!["T(error-invalid-query)"]);
    }

    #[test]
    fn test_warning_becomes_framework_warning() {
        let (dispatcher, notifier) = dispatcher(KeyTranslator::default());
        let result = dispatcher.handle_warning(WarningEvent {
            message: "Unknown prop".to_string(),
            trace: "\n at <Card>".to_string(),
        });

        assert_eq!(result, Dispatch::Notified);
        assert_eq!(notifier.messages(), vec!["T(error-framework-warning)"]);
    }

    #[test]
    fn test_translation_failure_only_logs() {
        let translator = KeyTranslator { broken: vec!["error-internal".to_string()] };
        let (dispatcher, notifier) = dispatcher(translator);

        let result = dispatcher.handle(&KError::new(ErrorCode::Internal, "db down"));
        assert_eq!(result, Dispatch::LoggedOnly);
        assert!(notifier.messages().is_empty());
    }

    #[test]
    fn test_notifier_failure_only_logs() {
        let dispatcher = ErrorDispatcher::new(Arc::new(KeyTranslator::default()), Arc::new(ClosedNotifier), false);
        assert_eq!(dispatcher.handle(&KError::new(ErrorCode::Unknown, "x")), Dispatch::LoggedOnly);
    }

    #[tokio::test]
    async fn test_subscription_dispatches_in_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Arc::new(ErrorDispatcher::new(
            Arc::new(KeyTranslator::default()),
            notifier.clone(),
            false,
        ));
        let (sink, subscription) = dispatcher.subscribe();
        assert!(subscription.is_active());

        assert!(sink.report(KError::new(ErrorCode::Unknown, "first")));
        assert!(sink.report_script_error(ScriptErrorEvent::new(RESIZE_OBSERVER_LOOP)));
        assert!(sink.report_warning("careful", ""));
        drop(sink);
        subscription.finish().await;

        assert_eq!(
            notifier.messages(),
            vec!["T(error-unknown)", "T(error-framework-warning)"]
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_closes_sink() {
        let dispatcher = Arc::new(ErrorDispatcher::new(
            Arc::new(KeyTranslator::default()),
            Arc::new(RecordingNotifier::default()),
            false,
        ));
        let (sink, subscription) = dispatcher.subscribe();
        subscription.unsubscribe().await;

        assert!(!sink.report(KError::new(ErrorCode::Unknown, "late")));
    }

    #[tokio::test]
    async fn test_panic_reporter_forwards_task_panics() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Arc::new(ErrorDispatcher::new(
            Arc::new(KeyTranslator::default()),
            notifier.clone(),
            false,
        ));
        let (sink, subscription) = dispatcher.subscribe();

        // Installed first, so it runs as the chained hook
        let (tx, mut rx) = mpsc::unbounded_channel();
        let recorder = PanicReporter::install(ErrorSink { tx });
        let reporter = PanicReporter::install(sink);

        let joined = tokio::spawn(async { panic!("boom") }).await;
        assert!(joined.unwrap_err().is_panic());

        drop(reporter);
        drop(recorder);
        subscription.finish().await;

        assert_eq!(notifier.messages(), vec!["T(error-unknown-script)"]);

        let Some(RuntimeEvent::Script(event)) = rx.recv().await else {
            panic!("expected a script error event");
        };
        assert_eq!(event.message, "boom");
        assert!(event.filename.as_deref().is_some_and(|f| f.ends_with("dispatcher.rs")));

        let error = event.into_kerror();
        assert_eq!(error.code, ErrorCode::UnknownScript);
        assert!(error.context["url"].as_str().is_some_and(|f| f.ends_with("dispatcher.rs")));
        assert!(error.context["line"].as_u64().is_some());
        assert!(error.context["column"].as_u64().is_some());

        // Dropping the reporters released their sinks
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_every_code_is_translated_in_every_locale() {
        let prefs = Arc::new(MemoryPreferences::new());
        let context = LocaleContext::new(Arc::new(EmbeddedLoader), prefs, embedded_locales())
            .await
            .unwrap();
        let codes = [
            ErrorCode::Unknown,
            ErrorCode::UnknownScript,
            ErrorCode::FrameworkWarning,
            ErrorCode::ErrorHandling,
            ErrorCode::NotFound,
            ErrorCode::UnexpectedRequest,
            ErrorCode::InvalidQuery,
            ErrorCode::LocaleLoad,
            ErrorCode::Internal,
        ];
        for lang in embedded_locales() {
            context.set_locale(&lang).await.unwrap();
            for code in codes {
                assert!(context.translate(&code.translation_key()).is_ok(), "{} {}", lang, code);
            }
        }
    }

    #[tokio::test]
    async fn test_notification_uses_active_locale() {
        let prefs = Arc::new(MemoryPreferences::new());
        let context = Arc::new(
            LocaleContext::new(Arc::new(EmbeddedLoader), prefs, embedded_locales())
                .await
                .unwrap(),
        );
        context.set_locale("es").await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = ErrorDispatcher::new(context, notifier.clone(), false);

        dispatcher.handle(&KError::not_found("transfer", "t-1"));
        assert_eq!(notifier.messages(), vec!["No se ha encontrado el recurso solicitado."]);
    }
}

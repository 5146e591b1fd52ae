use super::ServiceContext;
use super::notifier::{AlertDispatcher, AlertEvent};
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Forwards events at or above `min_level` to the alert dispatcher,
/// carrying the event fields (redacted) and the enclosing span chain.
#[derive(Clone)]
pub(crate) struct ErrorAlertLayer {
    dispatcher: AlertDispatcher,
    service_context: ServiceContext,
    min_level: Level,
}

impl ErrorAlertLayer {
    pub(crate) fn new(
        dispatcher: AlertDispatcher,
        service_context: ServiceContext,
        min_level: Level,
    ) -> Self {
        Self {
            dispatcher,
            service_context,
            min_level,
        }
    }
}

#[derive(Default)]
struct FieldMapVisitor {
    values: BTreeMap<String, String>,
}

impl FieldMapVisitor {
    fn record(&mut self, field: &Field, value: String) {
        let value = if is_sensitive_key(field.name()) {
            "[REDACTED]".to_string()
        } else {
            value
        };
        self.values.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldMapVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, value.to_string());
    }
}

impl<S> Layer<S> for ErrorAlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        if *event.metadata().level() < self.min_level {
            return;
        }

        let mut visitor = FieldMapVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .values
            .remove("message")
            .map(|raw| unquote_debug_string(&raw));

        let span_chain = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| s.metadata().name().to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        self.dispatcher.try_dispatch(AlertEvent {
            level: *event.metadata().level(),
            timestamp: Utc::now(),
            service_name: self.service_context.service_name.clone(),
            environment: self.service_context.environment.clone(),
            component: self.service_context.component.clone(),
            target: event.metadata().target().to_string(),
            file: event.metadata().file().map(str::to_string),
            line: event.metadata().line(),
            message,
            fields: visitor.values,
            span_chain,
        });
    }
}

fn unquote_debug_string(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}

fn is_sensitive_key(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    field.contains("webhook")
        || field.contains("secret")
        || field.contains("password")
        || field.contains("token")
        || field.contains("api_key")
        || field.contains("authorization")
}

//! Tracing layer that writes one JSON object per event.
//!
//! Correlation fields (`run_id`, `stage`, `dimension`) are lifted to the top
//! level whether they come from the event itself or an enclosing span; all
//! other fields land under `fields`.

use std::io::{self, Write};
use std::sync::Mutex;

use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use super::events::Level;

const CORRELATION_KEYS: [&str; 3] = ["run_id", "stage", "dimension"];

/// Correlation values captured from span attributes.
#[derive(Debug, Clone, Default)]
struct SpanContext {
    values: Map<String, Value>,
}

/// Collects event or span fields into a JSON map.
#[derive(Default)]
struct JsonFieldVisitor {
    correlation: Map<String, Value>,
    fields: Map<String, Value>,
    message: Option<String>,
}

impl JsonFieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else if CORRELATION_KEYS.contains(&name) {
            self.correlation.insert(name.to_string(), value);
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl Visit for JsonFieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.insert(field, Value::String(format!("{:?}", value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::Number(value.into()));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // Non-finite floats have no JSON form.
        let v = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, v);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }
}

/// JSONL tracing layer, stderr by default.
pub struct JsonlLayer<W = io::Stderr> {
    writer: Mutex<W>,
}

impl JsonlLayer<io::Stderr> {
    pub fn stderr() -> Self {
        JsonlLayer {
            writer: Mutex::new(io::stderr()),
        }
    }
}

impl<W: Write> JsonlLayer<W> {
    /// Create a layer writing to an arbitrary sink.
    pub fn new(writer: W) -> Self {
        JsonlLayer {
            writer: Mutex::new(writer),
        }
    }
}

impl<S, W> Layer<S> for JsonlLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: Write + 'static,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut visitor = JsonFieldVisitor::default();
        attrs.record(&mut visitor);

        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanContext {
                values: visitor.correlation,
            });
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = JsonFieldVisitor::default();
        event.record(&mut visitor);

        // Event fields win; spans fill in what the event left out, innermost first.
        let mut correlation = visitor.correlation;
        if let Some(scope) = ctx.event_scope(event) {
            for span in scope {
                if let Some(span_ctx) = span.extensions().get::<SpanContext>() {
                    for (k, v) in &span_ctx.values {
                        correlation.entry(k.clone()).or_insert_with(|| v.clone());
                    }
                }
            }
        }

        let level: Level = (*event.metadata().level()).into();
        let mut obj = Map::new();
        obj.insert("ts".to_string(), json!(Utc::now().to_rfc3339()));
        obj.insert("level".to_string(), json!(level));
        obj.insert("event".to_string(), json!(event.metadata().target()));
        for key in CORRELATION_KEYS {
            if let Some(v) = correlation.remove(key) {
                obj.insert(key.to_string(), v);
            }
        }
        if let Some(msg) = visitor.message {
            obj.insert("message".to_string(), json!(msg));
        }
        if !visitor.fields.is_empty() {
            obj.insert("fields".to_string(), Value::Object(visitor.fields));
        }

        let line = serde_json::to_string(&Value::Object(obj)).unwrap_or_default();
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    struct BufWriter(Arc<Mutex<Vec<u8>>>);

    impl Write for BufWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> Vec<Value> {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let layer = JsonlLayer::new(BufWriter(buffer.clone()));
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
        let output = buffer.lock().unwrap();
        String::from_utf8_lossy(&output)
            .lines()
            .map(|l| serde_json::from_str(l).expect("valid JSON line"))
            .collect()
    }

    #[test]
    fn event_fields_and_message() {
        let lines = capture(|| {
            tracing::info!(target: "em.converged", iterations = 3u64, converged = true, message = "done");
        });
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], "info");
        assert_eq!(line["event"], "em.converged");
        assert_eq!(line["message"], "done");
        assert_eq!(line["fields"]["iterations"], 3);
        assert_eq!(line["fields"]["converged"], true);
        assert!(line["ts"].is_string());
    }

    #[test]
    fn correlation_fields_promoted() {
        let lines = capture(|| {
            tracing::warn!(target: "seed.ready", run_id = "run-1", stage = "seed", dimension = "E/I", message = "x");
        });
        let line = &lines[0];
        assert_eq!(line["run_id"], "run-1");
        assert_eq!(line["stage"], "seed");
        assert_eq!(line["dimension"], "E/I");
        assert!(line.get("fields").is_none());
    }

    #[test]
    fn span_context_fills_missing_fields() {
        let lines = capture(|| {
            let span = tracing::info_span!("fit", run_id = "run-span", dimension = "S/N");
            let _enter = span.enter();
            tracing::debug!(target: "em.iteration", stage = "iterate", max_diff = 0.25, message = "step");
        });
        let line = &lines[0];
        assert_eq!(line["run_id"], "run-span");
        assert_eq!(line["dimension"], "S/N");
        assert_eq!(line["stage"], "iterate");
        assert_eq!(line["fields"]["max_diff"], 0.25);
    }

    #[test]
    fn non_finite_float_is_stringified() {
        let lines = capture(|| {
            tracing::info!(target: "t", value = f64::NAN, message = "nan");
        });
        assert_eq!(lines[0]["fields"]["value"], "NaN");
    }
}

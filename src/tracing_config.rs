/// Span settings for actions built with `with_tracing()`.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Name recorded on the action span.
    pub span_name: &'static str,
}

impl TracingConfig {
    pub fn new(span_name: &'static str) -> Self {
        Self { span_name }
    }

    pub fn default_span() -> Self {
        Self { span_name: "team_action" }
    }
}

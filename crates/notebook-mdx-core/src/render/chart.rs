//! Interactive chart outputs (`application/vnd.plotly.v1+json`).
//!
//! Charts are rendered in two phases. The synchronous pass emits a loading
//! placeholder inside a slot and records a deferred job; hydration hands the
//! spec to a [`ChartEngine`] and swaps the result into the slot. When the
//! engine fails, or interactivity is off, the slot holds a static fallback:
//! a short message plus the pretty-printed spec.

use super::RenderContext;
use crate::error::{ChartError, Degradation};
use crate::hydrate::DeferredJob;
use crate::node::{Element, Node};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Default Plotly bundle loaded by [`PlotlyEmbedEngine`]
pub const PLOTLY_CDN_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// A chart spec split into its Plotly parts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// Trace list
    pub data: Vec<Value>,
    /// Layout object (`null` when absent)
    pub layout: Value,
    /// Config object (`null` when absent)
    pub config: Value,
    /// The payload as received
    #[serde(skip)]
    pub source: Value,
}

impl ChartSpec {
    /// Split a chart payload into its parts.
    ///
    /// # Errors
    ///
    /// Returns [`ChartError::InvalidSpec`] if the payload is not an object or
    /// `data` is present but not an array.
    pub fn from_value(value: &Value) -> Result<Self, ChartError> {
        let object = value
            .as_object()
            .ok_or_else(|| ChartError::InvalidSpec("expected an object".to_string()))?;
        let data = match object.get("data") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(traces)) => traces.clone(),
            Some(_) => {
                return Err(ChartError::InvalidSpec(
                    "`data` must be an array of traces".to_string(),
                ))
            }
        };
        Ok(Self {
            data,
            layout: object.get("layout").cloned().unwrap_or(Value::Null),
            config: object.get("config").cloned().unwrap_or(Value::Null),
            source: value.clone(),
        })
    }
}

/// An asynchronous chart renderer
#[async_trait::async_trait]
pub trait ChartEngine: Send + Sync {
    /// Engine name for logs
    fn name(&self) -> &str;

    /// Render `spec` into content for the element `element_id`
    ///
    /// # Errors
    ///
    /// Returns [`ChartError`] if the engine is unavailable or rejects the spec.
    async fn render(&self, spec: &ChartSpec, element_id: &str) -> Result<Node, ChartError>;
}

/// Emits a Plotly mount point and the `Plotly.newPlot` call for it
#[derive(Debug, Clone)]
pub struct PlotlyEmbedEngine {
    script_url: Option<String>,
}

impl PlotlyEmbedEngine {
    /// Engine that loads Plotly from `script_url`, or expects the page to
    /// provide it when `None`
    #[inline]
    #[must_use]
    pub const fn new(script_url: Option<String>) -> Self {
        Self { script_url }
    }
}

impl Default for PlotlyEmbedEngine {
    fn default() -> Self {
        Self::new(Some(PLOTLY_CDN_URL.to_string()))
    }
}

/// JSON for an inline `<script>`; `</` must not close the element early
fn script_json(value: &impl Serialize) -> Result<String, ChartError> {
    serde_json::to_string(value)
        .map(|json| json.replace("</", "<\\/"))
        .map_err(|e| ChartError::InvalidSpec(e.to_string()))
}

#[async_trait::async_trait]
impl ChartEngine for PlotlyEmbedEngine {
    fn name(&self) -> &str {
        "plotly-embed"
    }

    async fn render(&self, spec: &ChartSpec, element_id: &str) -> Result<Node, ChartError> {
        let call = format!(
            "Plotly.newPlot({}, {}, {}, {});",
            script_json(&element_id)?,
            script_json(&spec.data)?,
            script_json(&spec.layout)?,
            script_json(&spec.config)?,
        );
        let mut children = Vec::with_capacity(3);
        if let Some(url) = &self.script_url {
            children.push(Element::new("script").attr("src", url.as_str()).into());
        }
        children.push(
            Element::new("div")
                .class("jp-plotly-chart")
                .attr("id", element_id)
                .into(),
        );
        children.push(Element::new("script").child(Node::raw(call)).into());
        Ok(Node::fragment(children))
    }
}

/// Static rendering of a chart: a message and the pretty-printed spec
#[must_use]
pub fn static_fallback(spec: &Value, message: &str) -> Node {
    let pretty = serde_json::to_string_pretty(spec).unwrap_or_else(|_| spec.to_string());
    Element::new("div")
        .class("jp-chart-static")
        .child(
            Element::new("div")
                .class("jp-chart-message")
                .child(Node::text(message)),
        )
        .child(Element::new("pre").child(Node::text(pretty)))
        .into()
}

/// Loading placeholder shown until hydration
#[must_use]
pub fn loading_placeholder() -> Node {
    Element::new("div")
        .class("jp-chart-loading")
        .child(Node::text("Loading chart..."))
        .into()
}

/// Render a chart payload
pub fn render_chart(ctx: &mut RenderContext<'_>, payload: &Value) -> Node {
    let wrap = |content: Node| -> Node {
        Element::new("div")
            .class("notebook-output-chart")
            .child(content)
            .into()
    };

    let spec = match ChartSpec::from_value(payload) {
        Ok(spec) => spec,
        Err(e) => {
            let message = format!("Chart could not be rendered: {e}");
            ctx.degrade(e.into());
            return wrap(static_fallback(payload, &message));
        }
    };

    if !ctx.options().interactive {
        return wrap(static_fallback(
            payload,
            "Interactive chart (static view)",
        ));
    }

    let Some(engine) = ctx.chart_engine().map(Arc::clone) else {
        let err = ChartError::Unavailable("no chart engine installed".to_string());
        let message = format!("Chart could not be rendered: {err}");
        ctx.degrade(Degradation::from(err));
        return wrap(static_fallback(payload, &message));
    };

    log::debug!("Deferring chart to {}", engine.name());
    let id_prefix = ctx.id_prefix().to_string();
    wrap(ctx.defer(
        false,
        loading_placeholder(),
        DeferredJob::Chart {
            spec,
            engine,
            id_prefix,
        },
    ))
}

//! Second rendering phase: resolving deferred slots.
//!
//! The synchronous render leaves a complete fallback in every slot whose
//! capability was not available yet (plain code while the highlighter
//! loads, a placeholder for each chart). A [`RenderedView`] owns the rendered
//! tree and runs one Tokio task per deferred job. Each task replaces exactly
//! its own slot. Tasks hold only a weak reference to the view: dropping the
//! view aborts them, and a task that completes afterwards finds nothing to
//! update.

use crate::error::{Degradation, HighlightError, HydrateError};
use crate::highlight::{HighlightEngine, SyntectHighlighter};
use crate::node::{Node, SlotId};
use crate::render::chart::{static_fallback, ChartEngine, ChartSpec};
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::task::JoinHandle;

/// Work needed to fill one slot
pub enum DeferredJob {
    /// Highlight `code` (the slot currently holds it as plain text)
    Highlight {
        code: String,
        language: Option<String>,
    },
    /// Render a chart (the slot currently holds a loading placeholder)
    Chart {
        spec: ChartSpec,
        engine: Arc<dyn ChartEngine>,
        /// Prefix of the chart's element id, `{id_prefix}chart-{slot}`
        id_prefix: String,
    },
}

impl DeferredJob {
    /// Short name for logs
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Highlight { .. } => "highlight",
            Self::Chart { .. } => "chart",
        }
    }

    async fn run(
        self,
        slot: SlotId,
        highlighter: Option<Arc<dyn HighlightEngine>>,
    ) -> (Node, Option<Degradation>) {
        match self {
            Self::Highlight { code, language } => {
                let engine = match highlighter {
                    Some(engine) => Ok(engine),
                    None => SyntectHighlighter::load()
                        .await
                        .map(|engine| engine as Arc<dyn HighlightEngine>),
                };
                let label = language.clone().unwrap_or_else(|| "auto".to_string());
                let result = match engine {
                    Ok(engine) => {
                        let code = code.clone();
                        tokio::task::spawn_blocking(move || {
                            engine.highlight(&code, language.as_deref())
                        })
                        .await
                        .unwrap_or(Err(HighlightError::NotReady))
                    }
                    Err(e) => Err(e),
                };
                match result {
                    Ok(Some(html)) => (Node::raw(html), None),
                    Ok(None) => (Node::text(code), None),
                    Err(e) => (
                        Node::text(code),
                        Some(Degradation::Highlight {
                            language: label,
                            reason: e.to_string(),
                        }),
                    ),
                }
            }
            Self::Chart {
                spec,
                engine,
                id_prefix,
            } => {
                let element_id = format!("{id_prefix}chart-{slot}");
                match engine.render(&spec, &element_id).await {
                    Ok(node) => (node, None),
                    Err(e) => {
                        let message = format!("Chart could not be rendered: {e}");
                        (static_fallback(&spec.source, &message), Some(e.into()))
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for DeferredJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Highlight { language, .. } => f
                .debug_struct("Highlight")
                .field("language", language)
                .finish_non_exhaustive(),
            Self::Chart {
                engine, id_prefix, ..
            } => f
                .debug_struct("Chart")
                .field("engine", &engine.name())
                .field("id_prefix", id_prefix)
                .finish_non_exhaustive(),
        }
    }
}

/// A slot waiting for its job
#[derive(Debug)]
pub struct DeferredRender {
    pub slot: SlotId,
    pub job: DeferredJob,
}

/// Result of the synchronous render pass
#[derive(Debug, Serialize)]
pub struct RenderedNotebook {
    /// Content tree; deferred slots hold their fallbacks
    pub root: Node,
    /// Jobs that can fill slots during hydration
    #[serde(skip)]
    pub deferred: Vec<DeferredRender>,
    /// Non-fatal failures recorded while rendering
    pub degradations: Vec<Degradation>,
}

impl RenderedNotebook {
    /// HTML fragment of the current tree
    #[inline]
    #[must_use]
    pub fn to_html(&self) -> String {
        self.root.to_html()
    }

    /// Whether no slot is waiting for hydration
    #[inline]
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.deferred.is_empty()
    }

    /// Wrap in a view that can be hydrated
    #[must_use]
    pub fn into_view(self) -> RenderedView {
        RenderedView::new(self)
    }

    /// Hydrate every slot and return the final tree.
    ///
    /// # Errors
    ///
    /// Returns [`HydrateError::NoRuntime`] when called outside a Tokio
    /// runtime.
    pub async fn hydrated(self) -> Result<Self, HydrateError> {
        let mut view = self.into_view();
        view.hydrate()?;
        view.settle().await;
        Ok(view.snapshot())
    }
}

struct ViewState {
    root: Node,
    degradations: Vec<Degradation>,
}

fn lock(state: &Mutex<ViewState>) -> MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of a rendered tree whose slots are being hydrated
pub struct RenderedView {
    state: Arc<Mutex<ViewState>>,
    pending: Vec<DeferredRender>,
    tasks: Vec<JoinHandle<()>>,
    highlighter: Option<Arc<dyn HighlightEngine>>,
}

impl RenderedView {
    /// Take ownership of a render result
    #[must_use]
    pub fn new(rendered: RenderedNotebook) -> Self {
        Self {
            state: Arc::new(Mutex::new(ViewState {
                root: rendered.root,
                degradations: rendered.degradations,
            })),
            pending: rendered.deferred,
            tasks: Vec::new(),
            highlighter: None,
        }
    }

    /// Use `engine` for deferred highlighting instead of the shared syntect
    /// instance
    #[must_use]
    pub fn with_highlighter(mut self, engine: Arc<dyn HighlightEngine>) -> Self {
        self.highlighter = Some(engine);
        self
    }

    /// Start one task per deferred job. Returns the number of tasks started.
    ///
    /// # Errors
    ///
    /// Returns [`HydrateError::NoRuntime`] when called outside a Tokio
    /// runtime; pending jobs are kept.
    pub fn hydrate(&mut self) -> Result<usize, HydrateError> {
        let handle =
            tokio::runtime::Handle::try_current().map_err(|_| HydrateError::NoRuntime)?;
        let started = self.pending.len();
        for DeferredRender { slot, job } in self.pending.drain(..) {
            let weak: Weak<Mutex<ViewState>> = Arc::downgrade(&self.state);
            let highlighter = self.highlighter.clone();
            self.tasks.push(handle.spawn(async move {
                let (node, degradation) = job.run(slot, highlighter).await;
                let Some(state) = weak.upgrade() else {
                    log::trace!("View dropped before slot {slot} resolved");
                    return;
                };
                let mut state = lock(&state);
                if !state.root.replace_slot(slot, node) {
                    log::warn!("Slot {slot} not found during hydration");
                }
                if let Some(degradation) = degradation {
                    log::warn!("{degradation}");
                    state.degradations.push(degradation);
                }
            }));
        }
        log::debug!("Hydrating {started} slot(s)");
        Ok(started)
    }

    /// Wait for every started task to finish
    pub async fn settle(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                log::warn!("Hydration task failed: {e}");
            }
        }
    }

    /// Whether all jobs have been started and have finished
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Copy of the current tree and degradations
    #[must_use]
    pub fn snapshot(&self) -> RenderedNotebook {
        let state = lock(&self.state);
        RenderedNotebook {
            root: state.root.clone(),
            deferred: Vec::new(),
            degradations: state.degradations.clone(),
        }
    }

    /// HTML fragment of the current tree
    #[must_use]
    pub fn to_html(&self) -> String {
        lock(&self.state).root.to_html()
    }
}

impl Drop for RenderedView {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;

    struct Upper;

    impl HighlightEngine for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn highlight(
            &self,
            code: &str,
            _language: Option<&str>,
        ) -> Result<Option<String>, HighlightError> {
            Ok(Some(format!("<b>{code}</b>")))
        }
    }

    fn rendered_with_slot() -> RenderedNotebook {
        RenderedNotebook {
            root: Element::new("pre")
                .child(Node::slot(SlotId(0), true, Node::text("x = 1")))
                .into(),
            deferred: vec![DeferredRender {
                slot: SlotId(0),
                job: DeferredJob::Highlight {
                    code: "x = 1".to_string(),
                    language: Some("python".to_string()),
                },
            }],
            degradations: Vec::new(),
        }
    }

    #[test]
    fn test_hydrate_outside_runtime_fails() {
        let mut view = rendered_with_slot().into_view();
        assert_eq!(view.hydrate(), Err(HydrateError::NoRuntime));
        assert!(!view.is_settled(), "jobs stay pending");
    }

    #[tokio::test]
    async fn test_hydrate_replaces_slot() {
        let mut view = rendered_with_slot()
            .into_view()
            .with_highlighter(Arc::new(Upper));
        assert_eq!(view.hydrate(), Ok(1));
        view.settle().await;
        assert!(view.is_settled());
        assert_eq!(
            view.to_html(),
            "<pre><span data-nb-slot=\"0\"><b>x = 1</b></span></pre>"
        );
    }

    struct Failing;

    impl HighlightEngine for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn highlight(
            &self,
            _code: &str,
            _language: Option<&str>,
        ) -> Result<Option<String>, HighlightError> {
            Err(HighlightError::Failed("tokenizer crashed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_deferred_highlight_keeps_plain_source() {
        let mut view = rendered_with_slot()
            .into_view()
            .with_highlighter(Arc::new(Failing));
        assert_eq!(view.hydrate(), Ok(1));
        view.settle().await;
        assert!(view.is_settled());
        assert_eq!(
            view.to_html(),
            "<pre><span data-nb-slot=\"0\">x = 1</span></pre>"
        );

        let snapshot = view.snapshot();
        assert_eq!(snapshot.degradations.len(), 1);
        assert_eq!(snapshot.degradations[0].kind(), "highlight");
        assert_eq!(
            snapshot.degradations[0].to_string(),
            "Highlighting failed for python: Highlighting failed: tokenizer crashed"
        );
    }
}

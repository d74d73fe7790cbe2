//! Identifier resolution from route context.
//!
//! A screen learns its edit target from up to three places: the route
//! snapshot available at mount, and two parameter streams (the parameter
//! map and the plain parameters) that may emit at any later time. Neither
//! stream is ordered relative to the other.

use std::collections::BTreeMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Route parameters by name.
pub type ParamMap = BTreeMap<String, String>;

const ID_KEY: &str = "id";
const NEW_SENTINEL: &str = "new";

/// What the route says about the edit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierSignal {
    /// Edit this record.
    Id(i64),
    /// Explicit create screen.
    New,
    /// No route information.
    Absent,
}

impl IdentifierSignal {
    /// Interpret a raw `id` parameter.
    ///
    /// Missing or blank values are [`Absent`](Self::Absent); anything that is
    /// neither `new` nor an integer selects create mode.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            return IdentifierSignal::Absent;
        };
        if raw == NEW_SENTINEL {
            return IdentifierSignal::New;
        }
        match raw.parse::<i64>() {
            Ok(id) => IdentifierSignal::Id(id),
            Err(_) => {
                tracing::debug!(raw, "non-numeric route id, treating as create");
                IdentifierSignal::New
            }
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, IdentifierSignal::Absent)
    }
}

/// Synchronous view of the route at mount time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteSnapshot {
    /// Map-style accessor; preferred when it carries an id.
    pub param_map: Option<ParamMap>,
    /// Plain parameter fields.
    pub params: Option<ParamMap>,
}

impl RouteSnapshot {
    /// Snapshot whose parameter map carries `id`.
    pub fn with_id(id: impl Into<String>) -> Self {
        let mut map = ParamMap::new();
        map.insert(ID_KEY.to_string(), id.into());
        Self {
            param_map: Some(map),
            params: None,
        }
    }

    /// Raw id, map accessor first, then plain fields.
    pub fn id(&self) -> Option<&str> {
        self.param_map
            .as_ref()
            .and_then(|m| m.get(ID_KEY))
            .or_else(|| self.params.as_ref().and_then(|p| p.get(ID_KEY)))
            .map(String::as_str)
    }
}

/// Everything a screen can learn from its route.
#[derive(Debug, Default)]
pub struct RouteSource {
    snapshot: Option<RouteSnapshot>,
    param_map_stream: Option<mpsc::UnboundedReceiver<ParamMap>>,
    params_stream: Option<mpsc::UnboundedReceiver<ParamMap>>,
}

impl RouteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(mut self, snapshot: RouteSnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_param_map_stream(mut self, stream: mpsc::UnboundedReceiver<ParamMap>) -> Self {
        self.param_map_stream = Some(stream);
        self
    }

    pub fn with_params_stream(mut self, stream: mpsc::UnboundedReceiver<ParamMap>) -> Self {
        self.params_stream = Some(stream);
        self
    }

    pub fn snapshot(&self) -> Option<&RouteSnapshot> {
        self.snapshot.as_ref()
    }

    /// Resolve the id available right now.
    pub fn resolve_sync(&self) -> IdentifierSignal {
        IdentifierSignal::parse(self.snapshot.as_ref().and_then(RouteSnapshot::id))
    }

    /// Forward every later `id` emission of both streams to `on_signal`.
    ///
    /// Emissions without an id are skipped. The streams are consumed; the
    /// returned handle keeps them live until released or dropped. Must be
    /// called inside a tokio runtime.
    pub fn subscribe_async<F>(&mut self, on_signal: F) -> RouteSubscriptions
    where
        F: Fn(IdentifierSignal) + Clone + Send + Sync + 'static,
    {
        let mut subscriptions = RouteSubscriptions::default();
        for (name, stream) in [
            ("param_map", self.param_map_stream.take()),
            ("params", self.params_stream.take()),
        ] {
            let Some(mut stream) = stream else { continue };
            let on_signal = on_signal.clone();
            subscriptions.handles.push(tokio::spawn(async move {
                while let Some(params) = stream.recv().await {
                    let signal = IdentifierSignal::parse(params.get(ID_KEY).map(String::as_str));
                    if signal.is_absent() {
                        continue;
                    }
                    tracing::debug!(stream = name, ?signal, "route emitted identifier");
                    on_signal(signal);
                }
            }));
        }
        subscriptions
    }
}

/// Resolve from an optional route; no route at all is simply [`IdentifierSignal::Absent`].
pub fn resolve_sync(source: Option<&RouteSource>) -> IdentifierSignal {
    source.map_or(IdentifierSignal::Absent, RouteSource::resolve_sync)
}

/// Live route subscriptions of one screen. Aborted on release or drop.
#[derive(Debug, Default)]
pub struct RouteSubscriptions {
    handles: Vec<JoinHandle<()>>,
}

impl RouteSubscriptions {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Whether any forwarder can still deliver a signal.
    pub fn is_active(&self) -> bool {
        self.handles.iter().any(|h| !h.is_finished())
    }

    /// Resolves once every forwarded stream has ended.
    pub async fn closed(&mut self) {
        while let Some(handle) = self.handles.last_mut() {
            let _ = handle.await;
            self.handles.pop();
        }
    }

    pub fn release(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), "releasing route subscriptions");
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for RouteSubscriptions {
    fn drop(&mut self) {
        self.release();
    }
}

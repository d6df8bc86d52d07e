use crate::cache::{DecisionCache, InMemoryCache};
use crate::sink::{EventSink, NoopSink};
use crate::store::{DataStore, ValueStore};
use time::OffsetDateTime;
use uuid::Uuid;
use verdict_types::{EntityKind, EvalEvent, PolicyResult};

/// Per-request bundle threaded explicitly through the whole call tree.
///
/// Holds the audit path stack, the decision cache, the event sink, the
/// mutable data store, and the read-only request/subject/environment
/// stores. Created fresh per top-level call.
pub struct EvaluationContext {
    id: String,
    path: Vec<String>,
    cache: Box<dyn DecisionCache>,
    sink: Box<dyn EventSink>,
    data: DataStore,
    request: ValueStore,
    subject: ValueStore,
    environment: ValueStore,
}

impl EvaluationContext {
    /// Fresh context with a generated id, in-memory cache, and no-op sink.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current depth of the path stack. Zero means the next node evaluated
    /// is the root of this request.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn path_string(&self) -> String {
        self.path.join("/")
    }

    /// Run `f` with `segment` pushed onto the path stack. The segment is
    /// popped on every exit path, so it can never leak across siblings.
    pub fn scoped<T>(
        &mut self,
        segment: impl Into<String>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.path.push(segment.into());
        let out = f(self);
        self.path.pop();
        out
    }

    pub fn cache_get(&self, kind: EntityKind, key: &str) -> Option<PolicyResult> {
        self.cache.get(kind, key)
    }

    pub fn cache_put(&mut self, kind: EntityKind, key: &str, value: PolicyResult) {
        self.cache.put(kind, key, value);
    }

    pub fn data(&self) -> &DataStore {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut DataStore {
        &mut self.data
    }

    pub fn request(&self) -> &ValueStore {
        &self.request
    }

    pub fn subject(&self) -> &ValueStore {
        &self.subject
    }

    pub fn environment(&self) -> &ValueStore {
        &self.environment
    }

    /// Record a completed evaluation at the current path.
    pub fn record_result(&mut self, kind: EntityKind, result: PolicyResult) {
        self.record(kind, true, Some(result), false, None);
    }

    /// Record a cache hit at the current path.
    pub fn record_cached(&mut self, kind: EntityKind, result: PolicyResult) {
        self.record(kind, true, Some(result), true, None);
    }

    /// Record a failure at the current path.
    pub fn record_failure(
        &mut self,
        kind: EntityKind,
        result: Option<PolicyResult>,
        reason: impl Into<String>,
    ) {
        self.record(kind, false, result, false, Some(reason.into()));
    }

    fn record(
        &mut self,
        kind: EntityKind,
        success: bool,
        result: Option<PolicyResult>,
        from_cache: bool,
        reason: Option<String>,
    ) {
        let event = EvalEvent {
            context_id: self.id.clone(),
            kind,
            path: self.path_string(),
            success,
            result,
            from_cache,
            reason,
            at: OffsetDateTime::now_utc(),
        };
        self.sink.add(event);
    }
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContextBuilder {
    id: Option<String>,
    cache: Box<dyn DecisionCache>,
    sink: Box<dyn EventSink>,
    data: DataStore,
    request: ValueStore,
    subject: ValueStore,
    environment: ValueStore,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            id: None,
            cache: Box::new(InMemoryCache::new()),
            sink: Box::new(NoopSink),
            data: DataStore::new(),
            request: ValueStore::new(),
            subject: ValueStore::new(),
            environment: ValueStore::new(),
        }
    }
}

impl ContextBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn cache(mut self, cache: impl DecisionCache + 'static) -> Self {
        self.cache = Box::new(cache);
        self
    }

    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn data(mut self, data: DataStore) -> Self {
        self.data = data;
        self
    }

    pub fn request(mut self, request: ValueStore) -> Self {
        self.request = request;
        self
    }

    pub fn subject(mut self, subject: ValueStore) -> Self {
        self.subject = subject;
        self
    }

    pub fn environment(mut self, environment: ValueStore) -> Self {
        self.environment = environment;
        self
    }

    pub fn build(self) -> EvaluationContext {
        EvaluationContext {
            id: self.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            path: Vec::new(),
            cache: self.cache,
            sink: self.sink,
            data: self.data,
            request: self.request,
            subject: self.subject,
            environment: self.environment,
        }
    }
}

//! Generation-ordered cache for AI insights.
//!
//! One entry per (subject, kind). Concurrent fetches for the same key are
//! coalesced onto the in-flight request; explicit regeneration starts a
//! new generation instead. Out-of-order completions are resolved by
//! generation number, never wall-clock arrival: readers never observe a
//! result for generation N once N+1 has committed.
//!
//! A failed fetch never propagates to the caller. The entry degrades and
//! serves a synthesized fallback so the panel always has something to
//! render.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use opsdesk_core::error::Result;
use opsdesk_core::gateway::InsightGateway;
use opsdesk_core::insight::{Insight, InsightBody, InsightKey, InsightKind, RefundExplanation,
    TicketSummary};

/// State of a cache entry as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No fetch has ever been issued for this key.
    Absent,
    /// A fetch is in flight and nothing newer has committed yet.
    Loading,
    /// The latest generation committed successfully.
    Ready,
    /// The latest generation failed; a synthesized fallback is being
    /// served in its place.
    Degraded,
}

/// A fetchable insight, carrying everything needed to call the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum InsightRequest {
    Summary { ticket_id: String },
    RefundExplanation { refund_id: String },
    KnowledgeBase { query: String, category: Option<String> },
}

impl InsightRequest {
    pub fn summary(ticket_id: impl Into<String>) -> Self {
        Self::Summary {
            ticket_id: ticket_id.into(),
        }
    }

    pub fn refund_explanation(refund_id: impl Into<String>) -> Self {
        Self::RefundExplanation {
            refund_id: refund_id.into(),
        }
    }

    pub fn knowledge_base(query: impl Into<String>, category: Option<String>) -> Self {
        Self::KnowledgeBase {
            query: query.into(),
            category,
        }
    }

    /// The cache key this request resolves under.
    pub fn key(&self) -> InsightKey {
        match self {
            Self::Summary { ticket_id } => InsightKey::new(ticket_id.clone(), InsightKind::Summary),
            Self::RefundExplanation { refund_id } => {
                InsightKey::new(refund_id.clone(), InsightKind::RefundExplanation)
            }
            Self::KnowledgeBase { query, .. } => {
                InsightKey::new(query.clone(), InsightKind::KnowledgeBase)
            }
        }
    }

    /// The locally synthesized body served when a fetch fails.
    fn fallback_body(&self) -> InsightBody {
        match self {
            Self::Summary { .. } => InsightBody::Summary(TicketSummary::fallback()),
            Self::RefundExplanation { .. } => {
                InsightBody::RefundExplanation(RefundExplanation::fallback())
            }
            Self::KnowledgeBase { .. } => InsightBody::KnowledgeBase(Vec::new()),
        }
    }
}

/// What a reader sees for a key: the entry state plus the committed
/// insight, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightSnapshot {
    pub state: CacheState,
    pub insight: Option<Insight>,
}

impl InsightSnapshot {
    fn absent() -> Self {
        Self {
            state: CacheState::Absent,
            insight: None,
        }
    }
}

struct Entry {
    state: CacheState,
    value: Option<Insight>,
    /// Newest generation handed out for this key
    newest_generation: u64,
    /// Generation of the committed value
    committed_generation: u64,
    /// Set by `invalidate`; the next fetch bypasses coalescing and the
    /// ready-value fast path.
    invalidated: bool,
    /// Wakes coalesced waiters when a generation commits
    notify: watch::Sender<u64>,
}

impl Entry {
    fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            state: CacheState::Loading,
            value: None,
            newest_generation: 0,
            committed_generation: 0,
            invalidated: false,
            notify,
        }
    }

    fn begin_generation(&mut self) -> u64 {
        self.newest_generation += 1;
        self.state = CacheState::Loading;
        self.newest_generation
    }

    fn snapshot(&self) -> InsightSnapshot {
        InsightSnapshot {
            state: self.state,
            insight: self.value.clone(),
        }
    }
}

enum Plan {
    /// Serve the committed value without touching the network.
    Serve(InsightSnapshot),
    /// Coalesce onto the in-flight generation and wait for it.
    Wait(watch::Receiver<u64>, u64),
    /// Run the gateway call for a freshly started generation.
    Fetch(u64),
}

/// Deduplicating, generation-ordered insight cache.
pub struct InsightCache {
    gateway: Arc<dyn InsightGateway>,
    entries: RwLock<HashMap<InsightKey, Entry>>,
}

impl InsightCache {
    pub fn new(gateway: Arc<dyn InsightGateway>) -> Self {
        Self {
            gateway,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches the insight for `request`.
    ///
    /// With `regenerate == false`: a ready value is served from cache, an
    /// in-flight fetch is awaited without issuing a duplicate call, and a
    /// degraded entry is retried. With `regenerate == true` a new
    /// generation always starts, regardless of in-flight state.
    ///
    /// Failures never surface here; the returned snapshot is `Degraded`
    /// with a fallback body instead.
    pub async fn fetch(&self, request: &InsightRequest, regenerate: bool) -> InsightSnapshot {
        let key = request.key();

        let plan = {
            let mut entries = self.entries.write().await;
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            if regenerate || entry.invalidated {
                entry.invalidated = false;
                Plan::Fetch(entry.begin_generation())
            } else {
                match entry.state {
                    CacheState::Loading if entry.newest_generation > 0 => {
                        Plan::Wait(entry.notify.subscribe(), entry.newest_generation)
                    }
                    CacheState::Ready => Plan::Serve(entry.snapshot()),
                    // Degraded entries retry; a fresh entry starts its
                    // first generation.
                    _ => Plan::Fetch(entry.begin_generation()),
                }
            }
        };

        match plan {
            Plan::Serve(snapshot) => snapshot,
            Plan::Wait(mut committed, target) => {
                loop {
                    if *committed.borrow() >= target {
                        break;
                    }
                    if committed.changed().await.is_err() {
                        break;
                    }
                }
                self.peek(&key).await
            }
            Plan::Fetch(generation) => {
                tracing::debug!(
                    subject = %key.subject,
                    kind = %key.kind,
                    generation,
                    "fetching insight"
                );
                let outcome = self.call_gateway(request, regenerate).await;
                self.commit(request, &key, generation, outcome).await
            }
        }
    }

    /// Returns the current snapshot for a key without fetching.
    pub async fn peek(&self, key: &InsightKey) -> InsightSnapshot {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(Entry::snapshot)
            .unwrap_or_else(InsightSnapshot::absent)
    }

    /// Forces the next `fetch` for this key to bypass coalescing and the
    /// cached value and hit the network.
    pub async fn invalidate(&self, key: &InsightKey) {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    async fn call_gateway(
        &self,
        request: &InsightRequest,
        regenerate: bool,
    ) -> Result<InsightBody> {
        match request {
            InsightRequest::Summary { ticket_id } => self
                .gateway
                .summary(ticket_id, regenerate)
                .await
                .map(InsightBody::Summary),
            InsightRequest::RefundExplanation { refund_id } => self
                .gateway
                .refund_explanation(refund_id)
                .await
                .map(InsightBody::RefundExplanation),
            InsightRequest::KnowledgeBase { query, category } => self
                .gateway
                .search_knowledge_base(query, category.as_deref())
                .await
                .map(InsightBody::KnowledgeBase),
        }
    }

    /// Commits a resolved generation. The value is replaced only when the
    /// resolved generation is newer than the committed one; stale
    /// resolutions are discarded. Mutation is a single assignment under
    /// the lock, so readers never observe a half-updated insight.
    async fn commit(
        &self,
        request: &InsightRequest,
        key: &InsightKey,
        generation: u64,
        outcome: Result<InsightBody>,
    ) -> InsightSnapshot {
        let mut entries = self.entries.write().await;
        let entry = entries.entry(key.clone()).or_insert_with(Entry::new);

        if generation <= entry.committed_generation {
            tracing::debug!(
                subject = %key.subject,
                generation,
                committed = entry.committed_generation,
                "discarding stale insight generation"
            );
            return entry.snapshot();
        }

        entry.committed_generation = generation;
        let body = match outcome {
            Ok(body) => {
                if generation == entry.newest_generation {
                    entry.state = CacheState::Ready;
                }
                body
            }
            Err(err) => {
                tracing::warn!(
                    subject = %key.subject,
                    kind = %key.kind,
                    error = %err,
                    "insight fetch failed, serving fallback"
                );
                if generation == entry.newest_generation {
                    entry.state = CacheState::Degraded;
                }
                request.fallback_body()
            }
        };
        entry.value = Some(Insight {
            key: key.clone(),
            generation,
            body,
        });
        entry.notify.send_replace(generation);
        entry.snapshot()
    }
}

//! Debounced knowledge-base search.
//!
//! Keystrokes call [`KnowledgeSearch::update_query`]; only a value that
//! stays stable for the debounce window triggers a gateway call. The
//! debounce timer is real-cancelled on every input change. In-flight
//! gateway calls are not transport-cancelled; their results are discarded
//! by generation comparison when a newer request has already landed, the
//! same ordering rule the insight cache uses.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use opsdesk_core::gateway::InsightGateway;
use opsdesk_core::insight::KnowledgeArticle;

/// Quiet period after the last input change before the search fires.
pub const DEBOUNCE: Duration = Duration::from_millis(500);

/// Queries shorter than this are suppressed entirely.
pub const MIN_QUERY_LEN: usize = 2;

/// What the result pane should render.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// No search active; nothing to show.
    Idle,
    /// Waiting on the gateway.
    Searching,
    /// Results landed. May be empty, which is distinct from `Failed`.
    Results(Vec<KnowledgeArticle>),
    /// The search failed; the message replaces the result list.
    Failed(String),
}

struct SearchState {
    query: String,
    category: Option<String>,
    /// Cancels the pending debounce timer, if one is armed
    timer: Option<CancellationToken>,
    /// Newest request generation handed out
    newest_generation: u64,
    /// Generation of the committed outcome
    committed_generation: u64,
    outcome: SearchOutcome,
}

impl SearchState {
    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}

struct SearchInner {
    gateway: Arc<dyn InsightGateway>,
    debounce: Duration,
    state: Mutex<SearchState>,
}

/// Debounced, cancellable knowledge-base query runner.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct KnowledgeSearch {
    inner: Arc<SearchInner>,
}

impl KnowledgeSearch {
    pub fn new(gateway: Arc<dyn InsightGateway>) -> Self {
        Self::with_debounce(gateway, DEBOUNCE)
    }

    /// Overrides the debounce window. The 500ms default is what the
    /// console ships with.
    pub fn with_debounce(gateway: Arc<dyn InsightGateway>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(SearchInner {
                gateway,
                debounce,
                state: Mutex::new(SearchState {
                    query: String::new(),
                    category: None,
                    timer: None,
                    newest_generation: 0,
                    committed_generation: 0,
                    outcome: SearchOutcome::Idle,
                }),
            }),
        }
    }

    /// Feeds a new query value. Call on every keystroke.
    ///
    /// An empty query clears results immediately with no gateway call;
    /// queries shorter than [`MIN_QUERY_LEN`] are suppressed without even
    /// arming the timer.
    pub fn update_query(&self, query: &str) {
        let mut state = self.inner.state.lock().expect("search state lock poisoned");
        state.cancel_timer();
        state.query = query.to_string();

        if query.is_empty() {
            // Outstanding results must not overwrite the cleared pane:
            // everything in flight becomes stale.
            state.newest_generation += 1;
            state.committed_generation = state.newest_generation;
            state.outcome = SearchOutcome::Idle;
            return;
        }

        if query.chars().count() < MIN_QUERY_LEN {
            return;
        }

        self.arm_timer(&mut state);
    }

    /// Changes the category filter. Behaves like a query change: the
    /// debounce window restarts.
    pub fn set_category(&self, category: Option<String>) {
        let mut state = self.inner.state.lock().expect("search state lock poisoned");
        state.cancel_timer();
        state.category = category;

        if state.query.is_empty() || state.query.chars().count() < MIN_QUERY_LEN {
            return;
        }

        self.arm_timer(&mut state);
    }

    /// Current outcome for rendering.
    pub fn outcome(&self) -> SearchOutcome {
        self.inner
            .state
            .lock()
            .expect("search state lock poisoned")
            .outcome
            .clone()
    }

    /// The query as last fed in.
    pub fn query(&self) -> String {
        self.inner
            .state
            .lock()
            .expect("search state lock poisoned")
            .query
            .clone()
    }

    pub fn category(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .expect("search state lock poisoned")
            .category
            .clone()
    }

    fn arm_timer(&self, state: &mut SearchState) {
        state.newest_generation += 1;
        let generation = state.newest_generation;
        let query = state.query.clone();
        let category = state.category.clone();

        let token = CancellationToken::new();
        state.timer = Some(token.clone());

        let inner = self.inner.clone();
        let debounce = self.inner.debounce;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(debounce) => {
                    run_search(inner, generation, query, category).await;
                }
            }
        });
    }
}

async fn run_search(
    inner: Arc<SearchInner>,
    generation: u64,
    query: String,
    category: Option<String>,
) {
    {
        let mut state = inner.state.lock().expect("search state lock poisoned");
        if generation <= state.committed_generation {
            return;
        }
        state.outcome = SearchOutcome::Searching;
    }

    tracing::debug!(%query, ?category, generation, "running knowledge-base search");
    let result = inner
        .gateway
        .search_knowledge_base(&query, category.as_deref())
        .await;

    let mut state = inner.state.lock().expect("search state lock poisoned");
    if generation <= state.committed_generation {
        tracing::debug!(
            generation,
            committed = state.committed_generation,
            "discarding stale search results"
        );
        return;
    }
    state.committed_generation = generation;
    state.outcome = match result {
        Ok(articles) => SearchOutcome::Results(articles),
        Err(err) => {
            tracing::warn!(%query, error = %err, "knowledge-base search failed");
            SearchOutcome::Failed(err.to_string())
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opsdesk_core::OpsdeskError;
    use opsdesk_core::error::Result;
    use opsdesk_core::insight::{
        RefundExplanation, ResponseSuggestion, SuggestionFeedback, TicketSummary,
    };
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockSearchGateway {
        calls: Mutex<Vec<(String, Option<String>)>>,
        fail: AtomicBool,
        delay_ms: u64,
    }

    impl MockSearchGateway {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                delay_ms: 0,
            }
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl InsightGateway for MockSearchGateway {
        async fn summary(&self, _: &str, _: bool) -> Result<TicketSummary> {
            Err(OpsdeskError::internal("not scripted"))
        }

        async fn refund_explanation(&self, _: &str) -> Result<RefundExplanation> {
            Err(OpsdeskError::internal("not scripted"))
        }

        async fn search_knowledge_base(
            &self,
            query: &str,
            category: Option<&str>,
        ) -> Result<Vec<KnowledgeArticle>> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), category.map(String::from)));
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(OpsdeskError::network_unavailable("search backend down"));
            }
            Ok(vec![KnowledgeArticle {
                id: "kb-1".to_string(),
                title: format!("Article for {query}"),
                excerpt: "...".to_string(),
                category: category.map(String::from),
                score: 0.8,
            }])
        }

        async fn knowledge_categories(&self) -> Result<Vec<String>> {
            Ok(vec!["billing".to_string(), "shipping".to_string()])
        }

        async fn response_suggestions(&self, _: &str) -> Result<Vec<ResponseSuggestion>> {
            Err(OpsdeskError::internal("not scripted"))
        }

        async fn submit_suggestion_feedback(
            &self,
            _: &str,
            _: &SuggestionFeedback,
        ) -> Result<()> {
            Err(OpsdeskError::internal("not scripted"))
        }
    }

    async fn wait(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_updates_fire_once_with_final_query() {
        let gateway = Arc::new(MockSearchGateway::new());
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("a");
        wait(100).await;
        search.update_query("ab");
        wait(100).await;
        search.update_query("abc");
        wait(600).await;

        assert_eq!(gateway.calls(), vec![("abc".to_string(), None)]);
        assert!(matches!(search.outcome(), SearchOutcome::Results(ref r) if r.len() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_updates_fire_once_each() {
        let gateway = Arc::new(MockSearchGateway::new());
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("ab");
        wait(600).await;
        search.update_query("abc");
        wait(600).await;

        assert_eq!(
            gateway.calls(),
            vec![("ab".to_string(), None), ("abc".to_string(), None)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_query_clears_immediately_without_call() {
        let gateway = Arc::new(MockSearchGateway::new());
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("refund policy");
        wait(600).await;
        assert!(matches!(search.outcome(), SearchOutcome::Results(_)));

        search.update_query("");
        assert_eq!(search.outcome(), SearchOutcome::Idle);

        wait(600).await;
        assert_eq!(gateway.calls().len(), 1);
        assert_eq!(search.outcome(), SearchOutcome::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_query_is_suppressed() {
        let gateway = Arc::new(MockSearchGateway::new());
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("a");
        wait(600).await;

        assert!(gateway.calls().is_empty());
        assert_eq!(search.outcome(), SearchOutcome::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_change_restarts_the_window() {
        let gateway = Arc::new(MockSearchGateway::new());
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("return policy");
        wait(300).await;
        search.set_category(Some("billing".to_string()));
        wait(300).await;
        // The original window would have fired by now; the restart means
        // nothing has.
        assert!(gateway.calls().is_empty());

        wait(300).await;
        assert_eq!(
            gateway.calls(),
            vec![("return policy".to_string(), Some("billing".to_string()))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_replaces_results_and_is_not_empty() {
        let gateway = Arc::new(MockSearchGateway::new());
        gateway.fail.store(true, Ordering::SeqCst);
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("refund policy");
        wait(600).await;

        match search.outcome() {
            SearchOutcome::Failed(message) => assert!(message.contains("network unavailable")),
            other => panic!("expected failure outcome, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_while_in_flight_discards_late_results() {
        let gateway = Arc::new(MockSearchGateway {
            delay_ms: 100,
            ..MockSearchGateway::new()
        });
        let search = KnowledgeSearch::new(gateway.clone());

        search.update_query("refund policy");
        // Let the timer fire; the gateway call is now sleeping.
        wait(550).await;
        assert_eq!(gateway.calls().len(), 1);

        search.update_query("");
        assert_eq!(search.outcome(), SearchOutcome::Idle);

        // The in-flight call completes, but its generation is stale.
        wait(200).await;
        assert_eq!(search.outcome(), SearchOutcome::Idle);
    }
}

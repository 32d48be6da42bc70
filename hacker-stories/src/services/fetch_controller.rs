use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::{build_search_url, parse_endpoint, ApiError, StoriesSource, Story};
use crate::state::{DispatchRecord, StoriesAction, StoriesDispatcher, StoriesState};

/// Result of one spawned fetch, tagged with the request that started it
#[derive(Debug)]
pub struct FetchOutcome {
    pub request_id: u64,
    pub url: Url,
    pub result: Result<Vec<Story>, ApiError>,
    pub elapsed: Duration,
}

/// What happened to an outcome once it reached the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Outcome of the latest request, reduced into state
    Applied,
    /// Outcome of a request that has since been superseded, dropped
    Stale,
}

/// Issues story searches and feeds their outcomes into the stories state.
///
/// Every submission fires exactly one request on the runtime and is given a
/// new request id. Superseded requests keep running, but only the outcome of
/// the most recent one is applied.
pub struct FetchController {
    source: Arc<dyn StoriesSource>,
    runtime: Handle,
    endpoint: Url,
    dispatcher: StoriesDispatcher,

    next_request_id: u64,
    latest_request: Option<u64>,
    latest_url: Option<Url>,

    outcome_tx: UnboundedSender<FetchOutcome>,
    outcome_rx: UnboundedReceiver<FetchOutcome>,
}

impl FetchController {
    pub fn new(
        source: Arc<dyn StoriesSource>,
        endpoint: &str,
        runtime: Handle,
    ) -> Result<Self, ApiError> {
        Self::with_dispatcher(source, endpoint, runtime, StoriesDispatcher::new())
    }

    pub fn with_dispatcher(
        source: Arc<dyn StoriesSource>,
        endpoint: &str,
        runtime: Handle,
        dispatcher: StoriesDispatcher,
    ) -> Result<Self, ApiError> {
        let endpoint = parse_endpoint(endpoint)?;
        let (outcome_tx, outcome_rx) = unbounded_channel();

        info!(
            target: "fetch",
            "FetchController using {} against {}",
            source.name(),
            endpoint
        );

        Ok(Self {
            source,
            runtime,
            endpoint,
            dispatcher,
            next_request_id: 0,
            latest_request: None,
            latest_url: None,
            outcome_tx,
            outcome_rx,
        })
    }

    /// Start a search for `term`. Returns the request id, or `None` when the
    /// term is blank and nothing was sent.
    pub fn submit(&mut self, term: &str) -> Option<u64> {
        if term.trim().is_empty() {
            warn!(target: "fetch", "Ignoring submit with empty search term");
            return None;
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let url = build_search_url(&self.endpoint, term);

        if let Some(previous) = self.latest_request {
            if self.dispatcher.state().is_loading() {
                debug!(
                    target: "fetch",
                    "Request #{} superseded by #{} before completing",
                    previous,
                    request_id
                );
            }
        }

        info!(target: "fetch", "Request #{}: {}", request_id, url);
        self.latest_request = Some(request_id);
        self.latest_url = Some(url.clone());
        self.dispatcher.dispatch(StoriesAction::FetchInit);

        let source = Arc::clone(&self.source);
        let outcome_tx = self.outcome_tx.clone();
        self.runtime.spawn(async move {
            let started = Instant::now();
            let result = source.fetch_stories(&url).await;
            let outcome = FetchOutcome {
                request_id,
                url,
                result,
                elapsed: started.elapsed(),
            };
            // The receiver only goes away when the controller is dropped
            let _ = outcome_tx.send(outcome);
        });

        Some(request_id)
    }

    /// Apply every outcome that has already arrived, without waiting.
    /// Returns how many were applied.
    pub fn poll_outcomes(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            if self.apply_outcome(outcome) == OutcomeStatus::Applied {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next outcome from any request and apply it
    pub async fn next_outcome(&mut self) -> Option<OutcomeStatus> {
        let outcome = self.outcome_rx.recv().await?;
        Some(self.apply_outcome(outcome))
    }

    /// Wait until the latest request has settled
    pub async fn wait_until_settled(&mut self) {
        while self.dispatcher.state().is_loading() {
            if self.next_outcome().await.is_none() {
                break;
            }
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) -> OutcomeStatus {
        if self.latest_request != Some(outcome.request_id) {
            info!(
                target: "fetch",
                "Dropping stale response for request #{} ({:?}), latest is #{:?}",
                outcome.request_id,
                outcome.elapsed,
                self.latest_request
            );
            return OutcomeStatus::Stale;
        }

        match outcome.result {
            Ok(stories) => {
                info!(
                    target: "fetch",
                    "Request #{} returned {} stories in {:?}",
                    outcome.request_id,
                    stories.len(),
                    outcome.elapsed
                );
                self.dispatcher.dispatch(StoriesAction::FetchSuccess(stories));
            }
            Err(e) => {
                warn!(
                    target: "fetch",
                    "Request #{} to {} failed after {:?}: {}",
                    outcome.request_id,
                    outcome.url,
                    outcome.elapsed,
                    e
                );
                self.dispatcher.dispatch(StoriesAction::FetchFailure);
            }
        }
        OutcomeStatus::Applied
    }

    /// Dismiss a story from the current results
    pub fn remove_story(&mut self, object_id: &str) {
        self.dispatcher
            .dispatch(StoriesAction::RemoveStory(object_id.to_string()));
    }

    pub fn state(&self) -> &StoriesState {
        self.dispatcher.state()
    }

    pub fn history(&self) -> impl Iterator<Item = &DispatchRecord> {
        self.dispatcher.history()
    }

    pub fn latest_request(&self) -> Option<u64> {
        self.latest_request
    }

    /// URL of the most recent request
    pub fn latest_url(&self) -> Option<&Url> {
        self.latest_url.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::DEFAULT_ENDPOINT;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every request with the same stories and records the URLs
    struct RecordingSource {
        stories: Vec<Story>,
        urls: Mutex<Vec<String>>,
    }

    impl RecordingSource {
        fn new(stories: Vec<Story>) -> Self {
            Self {
                stories,
                urls: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoriesSource for RecordingSource {
        async fn fetch_stories(&self, url: &Url) -> Result<Vec<Story>, ApiError> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(self.stories.clone())
        }

        fn name(&self) -> &str {
            "RecordingSource"
        }
    }

    struct FailingSource;

    #[async_trait]
    impl StoriesSource for FailingSource {
        async fn fetch_stories(&self, _url: &Url) -> Result<Vec<Story>, ApiError> {
            Err(ApiError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR))
        }

        fn name(&self) -> &str {
            "FailingSource"
        }
    }

    fn controller(source: Arc<dyn StoriesSource>) -> FetchController {
        FetchController::new(source, DEFAULT_ENDPOINT, Handle::current()).unwrap()
    }

    #[tokio::test]
    async fn test_submit_loads_stories() {
        let source = Arc::new(RecordingSource::new(vec![Story::new("1", "Redux")]));
        let mut controller = controller(source.clone());

        let id = controller.submit("Redux").unwrap();
        assert!(controller.state().is_loading());

        controller.wait_until_settled().await;
        assert_eq!(controller.latest_request(), Some(id));
        assert!(!controller.state().is_loading());
        assert!(!controller.state().is_error());
        assert_eq!(controller.state().data.len(), 1);
        assert_eq!(
            source.urls(),
            vec!["https://hn.algolia.com/api/v1/search?query=Redux".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        let source = Arc::new(RecordingSource::new(vec![Story::new("1", "Redux")]));
        let mut ok = controller(source);
        ok.submit("Redux");
        ok.wait_until_settled().await;

        // Same dispatcher state, now against a failing source
        let mut failing = FetchController::with_dispatcher(
            Arc::new(FailingSource),
            DEFAULT_ENDPOINT,
            Handle::current(),
            ok.dispatcher,
        )
        .unwrap();
        failing.submit("Redux");
        failing.wait_until_settled().await;

        assert!(!failing.state().is_loading());
        assert!(failing.state().is_error());
        assert_eq!(failing.state().data.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_submit_is_ignored() {
        let source = Arc::new(RecordingSource::new(vec![]));
        let mut controller = controller(source.clone());

        assert_eq!(controller.submit("  "), None);
        assert!(!controller.state().is_loading());
        assert_eq!(controller.history().count(), 0);
        assert!(source.urls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_story_goes_through_reducer() {
        let source = Arc::new(RecordingSource::new(vec![
            Story::new("0", "React"),
            Story::new("1", "Redux"),
        ]));
        let mut controller = controller(source);
        controller.submit("React");
        controller.wait_until_settled().await;

        controller.remove_story("0");
        controller.remove_story("0");
        assert_eq!(controller.state().data.len(), 1);
        assert_eq!(controller.state().data[0].object_id, "1");
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_rejected() {
        let source = Arc::new(RecordingSource::new(vec![]));
        let result = FetchController::new(source, "::nope::", Handle::current());
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }
}

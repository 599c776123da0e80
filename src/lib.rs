pub mod analysis;
pub mod annotation;
pub mod backend;
pub mod cefr;
pub mod config;
pub mod detail;
pub mod error;
pub mod filter;
pub mod job;
pub mod preferences;
pub mod reading;
pub mod scoring;
pub mod sse;
pub mod surface;
pub mod views;

use analysis::{AnalysisResult, Statistics};
use annotation::{Annotation, AnnotationIndex};
use backend::{Backend, ExportFormat};
use cefr::LevelFilter;
use config::ClientConfig;
use detail::{DetailPresenter, WordDetail};
use error::{ClientError, Result};
use filter::{FilterEngine, FilterState};
use job::{JobMonitor, JobState, SessionId, StreamEvent, Transition};
use preferences::{PreferenceStore, Preferences};
use reading::RenderedDocument;
use scoring::DifficultyScore;
use std::sync::Arc;
use surface::Surface;
use tokio::time::Instant;
use views::{ActiveList, ListMarkup, StatsSummary, ViewCache};

/// A loaded analysis result and everything derived from it.
struct LoadedResult {
    session_id: SessionId,
    index: Arc<AnnotationIndex>,
    document: Arc<str>,
    statistics: Statistics,
    score: DifficultyScore,
}

/// One user's view of one analysis at a time.
///
/// All client state lives here; nothing is global, so independent contexts
/// can coexist (tests build one each).
pub struct SessionContext<B: Backend, S: Surface> {
    config: ClientConfig,
    backend: B,
    surface: S,
    monitor: JobMonitor,
    filter: FilterEngine,
    loaded: Option<LoadedResult>,
    list_view: ViewCache<ListMarkup>,
    reading_view: ViewCache<RenderedDocument>,
    detail: DetailPresenter,
    preferences: PreferenceStore,
    active_list: ActiveList,
}

impl<B: Backend, S: Surface> SessionContext<B, S> {
    pub fn new(config: ClientConfig, backend: B, surface: S, preferences: PreferenceStore) -> Self {
        let active_list = preferences.load().active_list;
        Self {
            monitor: JobMonitor::new(config.completion_delay()),
            filter: FilterEngine::new(config.search_debounce()),
            config,
            backend,
            surface,
            loaded: None,
            list_view: ViewCache::default(),
            reading_view: ViewCache::default(),
            detail: DetailPresenter::default(),
            preferences,
            active_list,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn job_state(&self) -> Option<&JobState> {
        self.monitor.state()
    }

    pub fn filter_state(&self) -> &FilterState {
        self.filter.state()
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.loaded
            .as_ref()
            .map(|l| &l.session_id)
            .or_else(|| self.monitor.state().map(|s| &s.session_id))
    }

    pub fn index(&self) -> Option<&AnnotationIndex> {
        self.loaded.as_ref().map(|l| l.index.as_ref())
    }

    pub fn score(&self) -> Option<&DifficultyScore> {
        self.loaded.as_ref().map(|l| &l.score)
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.loaded.as_ref().map(|l| &l.statistics)
    }

    pub fn lists(&self) -> Option<&ListMarkup> {
        self.list_view.get()
    }

    pub fn reading(&self) -> Option<&RenderedDocument> {
        self.reading_view.get()
    }

    pub fn active_list(&self) -> ActiveList {
        self.active_list
    }

    /// Follows the job announced by an upload acknowledgement until its
    /// result is loaded or it fails. Failures are shown on the surface and
    /// returned.
    pub async fn run_job(&mut self, session: SessionId) -> Result<()> {
        self.discard_result();
        self.monitor.reset();

        // Opening the stream blocks until the server answers.
        let backend = self.backend.clone();
        let id = session.clone();
        let opened = tokio::task::spawn_blocking(move || {
            let mut backend = backend;
            backend.connect(&id)
        })
        .await
        .map_err(|e| ClientError::Stream(e.to_string()))
        .and_then(|opened| opened);

        let mut events = match self.monitor.attach(session, opened) {
            Ok(events) => events,
            Err(e) => {
                self.surface.show_failure(&e.to_string());
                return Err(e);
            }
        };

        loop {
            // A sender vanishing without a terminal event is a dropped connection.
            let event = events.recv().await.unwrap_or(StreamEvent::Disconnected { reason: None });
            match self.monitor.handle(event) {
                Transition::Progress { progress, stage_text } => {
                    self.surface.show_progress(progress, &stage_text);
                }
                Transition::Unchanged => {}
                Transition::Failed(err) => {
                    self.surface.show_failure(&err.to_string());
                    return Err(err);
                }
                Transition::Completed { session_id, fetch_after } => {
                    if let Some(state) = self.monitor.state() {
                        self.surface.show_progress(state.progress, &state.stage_text);
                    }
                    drop(events);
                    tokio::time::sleep(fetch_after).await;
                    return self.fetch_and_load(session_id).await;
                }
            }
        }
    }

    async fn fetch_and_load(&mut self, session_id: SessionId) -> Result<()> {
        let backend = self.backend.clone();
        let id = session_id.clone();
        let fetched = tokio::task::spawn_blocking(move || backend.fetch_result(&id))
            .await
            .map_err(|e| ClientError::ResultFetch(e.to_string()))
            .and_then(|result| result);

        match fetched {
            Ok(result) => self.load_result(session_id, result).await,
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "result retrieval failed");
                self.surface.show_failure(&e.to_string());
                Err(e)
            }
        }
    }

    /// Replaces whatever was loaded with `result`: new index, new score,
    /// both views redrawn.
    pub async fn load_result(&mut self, session_id: SessionId, result: AnalysisResult) -> Result<()> {
        self.discard_result();
        let statistics = match result.require_statistics() {
            Ok(stats) => stats.clone(),
            Err(e) => {
                self.surface.show_failure(&e.to_string());
                return Err(e);
            }
        };

        let index = AnnotationIndex::build(&result.words, &result.phrases);
        let score = scoring::score(&statistics);
        tracing::info!(
            session = %session_id,
            words = index.words().len(),
            phrases = index.phrases().len(),
            score = score.value,
            "analysis result loaded"
        );

        self.surface.show_results(&StatsSummary::from(&statistics), &score);
        self.loaded = Some(LoadedResult {
            session_id,
            index: Arc::new(index),
            document: Arc::from(result.processed_text),
            statistics,
            score,
        });
        self.refresh_views().await
    }

    /// Redraws whichever views are behind the current filter revision.
    async fn refresh_views(&mut self) -> Result<()> {
        let Some(loaded) = self.loaded.as_ref() else {
            return Ok(());
        };
        let revision = self.filter.revision();

        if self.list_view.is_stale(revision) {
            let lists = views::render_lists(
                &self.filter,
                &loaded.index,
                self.config.word_list_limit,
                self.config.phrase_list_limit,
            );
            let lists = self.list_view.store(revision, lists);
            self.surface.show_lists(lists);
        }

        if self.reading_view.is_stale(revision) {
            let document = Arc::clone(&loaded.document);
            let index = Arc::clone(&loaded.index);
            let filter = self.filter.state().clone();
            let min_len = self.config.min_paragraph_len;
            let rendered = reading::show_within_budget(&mut self.surface, self.config.render_budget(), move || {
                reading::render(&document, &index, &filter, min_len)
            })
            .await?;
            self.reading_view.store(revision, rendered);
        }
        Ok(())
    }

    /// Level selector; applies at once.
    pub async fn select_level(&mut self, level: LevelFilter) -> Result<()> {
        if self.filter.set_level(level) {
            self.refresh_views().await?;
        }
        Ok(())
    }

    /// One keystroke in the search box. Nothing is recomputed until
    /// [`settle_search`](Self::settle_search) runs after the input goes quiet.
    pub fn search_input(&mut self, term: &str) {
        self.filter.input_search(term, Instant::now());
    }

    /// Deadline of the pending search, for callers multiplexing timers.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.filter.search_deadline()
    }

    /// Waits out the quiet window and applies the last search input.
    /// Returns whether the views changed.
    pub async fn settle_search(&mut self) -> Result<bool> {
        let Some(deadline) = self.filter.search_deadline() else {
            return Ok(false);
        };
        tokio::time::sleep_until(deadline).await;
        if self.filter.settle_search(Instant::now()) {
            self.refresh_views().await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Download link for the loaded result in one of the export formats.
    pub fn export_url(&self, format: ExportFormat) -> Result<String> {
        let loaded = self.loaded.as_ref().ok_or(ClientError::NoSession)?;
        Ok(self.backend.export_url(&loaded.session_id, format))
    }

    /// Resolves a clicked word, inflected form or phrase to its annotation.
    pub fn lookup(&self, token: &str) -> Option<&Annotation> {
        self.index()?.get(token)
    }

    pub fn open_detail(&mut self, token: &str, focused_control: Option<&str>) -> Option<WordDetail> {
        let index = &self.loaded.as_ref()?.index;
        let detail = self.detail.show(index, token, focused_control)?.clone();
        self.surface.show_detail(&detail);
        Some(detail)
    }

    pub fn close_detail(&mut self) {
        if let Some(control) = self.detail.close() {
            self.surface.restore_focus(&control);
        }
    }

    /// Switches list tabs and remembers the choice for next time.
    pub fn set_active_list(&mut self, list: ActiveList) -> Result<()> {
        self.active_list = list;
        self.preferences
            .save(&Preferences { active_list: list })
            .inspect_err(|e| tracing::warn!(error = %e, "could not save preferences"))
    }

    /// Back to a blank session: stream closed, result and views dropped,
    /// filter cleared.
    pub fn reset(&mut self) {
        self.monitor.reset();
        self.discard_result();
        self.filter.reset();
        self.detail.close();
        self.surface.show_upload();
        tracing::debug!("session reset");
    }

    fn discard_result(&mut self) {
        self.loaded = None;
        self.list_view.invalidate();
        self.reading_view.invalidate();
    }
}

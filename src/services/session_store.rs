use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    Analysis, ChartSpec, IndicatorGroup, Period, StatsSummary, StatusEntry, StatusLevel, StatusLog,
    ThemeName,
};

/// Widget state as last submitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Controls {
    pub ticker: String,
    pub period: Period,
    pub indicators: Vec<IndicatorGroup>,
    pub theme: ThemeName,
}

impl Controls {
    fn with_theme(theme: ThemeName) -> Self {
        Self {
            ticker: String::new(),
            period: Period::default(),
            indicators: vec![IndicatorGroup::MovingAverages],
            theme,
        }
    }
}

/// Everything one dashboard user sees. The cached analysis lets the chart be
/// rebuilt on a theme change without fetching again.
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub controls: Controls,
    pub status: StatusLog,
    pub analysis: Option<Arc<Analysis>>,
    pub chart: Option<ChartSpec>,
    pub stats: Option<StatsSummary>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn new(theme: ThemeName, status_capacity: usize) -> Self {
        let mut status = StatusLog::new(status_capacity);
        status.push(StatusLevel::Info, "Enter a ticker and click Run Analysis");
        Self {
            id: Uuid::new_v4(),
            controls: Controls::with_theme(theme),
            status,
            analysis: None,
            chart: None,
            stats: None,
            last_seen: Utc::now(),
        }
    }

    /// Marks the session as in use so the idle sweep keeps it.
    pub fn touch(&mut self) {
        self.last_seen = Utc::now();
    }

    /// Drops the displayed chart together with the analysis it came from.
    pub fn clear_results(&mut self) {
        self.analysis = None;
        self.chart = None;
        self.stats = None;
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            controls: self.controls.clone(),
            status: self.status.entries().cloned().collect(),
            stats: self.stats.clone(),
            chart: self.chart.clone(),
            has_analysis: self.analysis.is_some(),
        }
    }
}

/// Serializable snapshot of a session for the presentation host.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub controls: Controls,
    pub status: Vec<StatusEntry>,
    pub stats: Option<StatsSummary>,
    pub chart: Option<ChartSpec>,
    pub has_analysis: bool,
}

/// Per-session state keyed by session id.
///
/// Each session sits behind its own async mutex, so actions on one session
/// run one at a time while different sessions proceed independently.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<Uuid, Arc<Mutex<Session>>>>,
    ttl: Duration,
    status_capacity: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, status_capacity: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl,
            status_capacity,
        }
    }

    pub fn create(&self, theme: ThemeName) -> SessionView {
        let session = Session::new(theme, self.status_capacity);
        let view = session.view();
        self.sessions.insert(session.id, Arc::new(Mutex::new(session)));
        view
    }

    /// Handle to a session; callers lock it for the length of one action.
    pub fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, AppError> {
        self.sessions
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(AppError::SessionNotFound)
    }

    pub fn remove(&self, id: Uuid) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Drops sessions idle for longer than the TTL; returns how many went.
    /// Sessions busy with an action are kept.
    pub fn cleanup_expired(&self) -> usize {
        let cutoff = Utc::now() - self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| match session.try_lock() {
            Ok(guard) => guard.last_seen >= cutoff,
            Err(_) => true,
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

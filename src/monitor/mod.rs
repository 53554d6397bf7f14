pub mod stats;

use crate::accounting::{FileStateStore, StateStore};
use crate::api::{DucoClient, FetchFailure, UserData};
use crate::tracking::Session;
use crate::util::timestamp::now_ms;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::monitor::stats::DashboardStats;

/// Session-scoped context: the tracking session plus what was last shown for
/// it. Built at login, dropped at logout.
pub struct SessionContext<S: StateStore> {
    pub session: Session<S>,
    pub view: DashboardStats,
}

impl<S: StateStore> SessionContext<S> {
    /// Start tracking `account`. Persisted earnings are visible right away,
    /// before the first fetch completes.
    pub fn login(account: &str, store: S, now: u64) -> Self {
        let session = Session::start(account, store);
        let mut view = DashboardStats::new(account);
        view.set_earnings(session.earnings(now).as_ref());
        Self { session, view }
    }

    /// Fold a freshly fetched document into the session and the view.
    pub fn refresh(&mut self, data: &UserData, now: u64) {
        let snapshot = data.snapshot();
        match self.session.reconcile(&snapshot, now) {
            Ok(outcome) => debug!(
                ?outcome,
                known = self.session.state().map_or(0, |s| s.known_transactions.len()),
                "poll cycle reconciled"
            ),
            // keep what we had, try again next tick
            Err(e) => warn!(account = %self.session.account(), "skipping reconciliation: {e}"),
        }
        self.view.set_account_data(data, &snapshot, now);
        self.view.set_earnings(self.session.earnings(now).as_ref());
    }

    pub fn fetch_failed(&mut self, err: &anyhow::Error) {
        let failure = FetchFailure::classify(err);
        warn!(account = %self.session.account(), "fetch failed: {err:#}");
        self.view.error = Some(failure.to_string());
    }

    pub fn logout(self) {
        self.session.end();
    }
}

pub struct Monitor {
    client: DucoClient,
    store: FileStateStore,
    interval: Duration,
    stats: Option<watch::Sender<DashboardStats>>, // dashboard channel
}

impl Monitor {
    pub fn new(client: DucoClient, store: FileStateStore, interval: Duration) -> Self {
        Self {
            client,
            store,
            interval,
            stats: None,
        }
    }

    /// Attach the dashboard broadcaster
    pub fn with_stats(mut self, tx_stats: watch::Sender<DashboardStats>) -> Self {
        self.stats = Some(tx_stats);
        self
    }

    fn publish(&self, view: &DashboardStats) {
        if let Some(tx) = &self.stats {
            let _ = tx.send(view.clone());
        }
    }

    /// Poll `account` every interval until Ctrl-C.
    pub async fn run_loop(&self, account: &str) -> Result<()> {
        if let Err(e) = self.store.remember_user(account) {
            warn!("could not remember user {account}: {e:#}");
        }

        let mut ctx = SessionContext::login(account, self.store.clone(), now_ms());
        self.publish(&ctx.view);
        info!(account, interval_secs = self.interval.as_secs(), "tracking started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // a pending request must not hold off Ctrl-C
                    let fetched = tokio::select! {
                        res = self.client.get_user(account) => Some(res),
                        _ = &mut shutdown => None,
                    };
                    match fetched {
                        Some(Ok(data)) => ctx.refresh(&data, now_ms()),
                        Some(Err(e)) => ctx.fetch_failed(&e),
                        None => {
                            info!("interrupted during fetch, stopping");
                            break;
                        }
                    }
                    self.publish(&ctx.view);
                }
                _ = &mut shutdown => {
                    info!("interrupted, stopping");
                    break;
                }
            }
        }

        ctx.logout();
        Ok(())
    }
}

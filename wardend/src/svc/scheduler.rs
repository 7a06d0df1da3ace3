use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rst_common::with_logging::log::{debug, error, info, warn};
use rst_common::with_tokio::tokio;
use rst_common::with_tokio::tokio::task::JoinHandle;
use rst_common::with_tokio::tokio::time::MissedTickBehavior;

use prople_warden_core::bpdm::BpdmBuilder;
use prople_warden_core::identity::callback::types::CallbackAPI;
use prople_warden_core::identity::revocation::types::RevocationAPI;
use prople_warden_core::identity::types::IdentityError;
use prople_warden_core::locks::KeyedLock;

use prople_warden_rpc::config::Scheduler as SchedulerConfig;

pub const JOB_STATUS_LIST: &str = "status_list_reissue";
pub const JOB_BPDM_PULL: &str = "bpdm_pull";
pub const JOB_CALLBACK_PURGE: &str = "callback_purge";

/// `run_exclusive` runs a job unless a previous run of the same job still holds its lock.
/// Returns false when the run was skipped
pub async fn run_exclusive<Fut>(locks: KeyedLock, name: &str, job: Fut) -> bool
where
    Fut: Future<Output = Result<(), IdentityError>>,
{
    let Some(_guard) = locks.try_lock(name) else {
        warn!("[scheduler:{name}] previous run still active, skipped");
        return false;
    };

    match job.await {
        Ok(_) => debug!("[scheduler:{name}] finished"),
        Err(err) => error!("[scheduler:{name}] failed: {err}"),
    }

    true
}

/// `Scheduler` owns the periodic jobs of the daemon
#[derive(Clone)]
pub struct Scheduler {
    revocation: Arc<dyn RevocationAPI>,
    bpdm: Arc<dyn BpdmBuilder + Send + Sync>,
    callbacks: Arc<dyn CallbackAPI>,
    config: SchedulerConfig,
    locks: KeyedLock,
}

impl Scheduler {
    pub fn new(
        revocation: Arc<dyn RevocationAPI>,
        bpdm: Arc<dyn BpdmBuilder + Send + Sync>,
        callbacks: Arc<dyn CallbackAPI>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            revocation,
            bpdm,
            callbacks,
            config,
            locks: KeyedLock::new(),
        }
    }

    pub async fn reissue_status_lists(&self) -> Result<(), IdentityError> {
        let lists = self
            .revocation
            .issue_status_list_credentials(None, false)
            .await?;

        info!("[scheduler:{JOB_STATUS_LIST}] reissued: {}", lists.len());
        Ok(())
    }

    pub async fn pull_bpdm(&self) -> Result<(), IdentityError> {
        self.bpdm.pull_and_update_credentials(None).await
    }

    pub async fn purge_callbacks(&self) -> Result<(), IdentityError> {
        let removed = self
            .callbacks
            .purge(self.config.callback_retention_secs())
            .await?;

        info!("[scheduler:{JOB_CALLBACK_PURGE}] removed: {removed}");
        Ok(())
    }

    pub fn start(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.every(JOB_STATUS_LIST, self.config.status_list_interval()),
            self.every(JOB_BPDM_PULL, self.config.bpdm_pull_interval()),
            self.every(JOB_CALLBACK_PURGE, self.config.callback_purge_interval()),
        ]
    }

    async fn run(&self, name: &'static str) -> Result<(), IdentityError> {
        match name {
            JOB_STATUS_LIST => self.reissue_status_lists().await,
            JOB_BPDM_PULL => self.pull_bpdm().await,
            JOB_CALLBACK_PURGE => self.purge_callbacks().await,
            _ => Err(IdentityError::ValidationError(format!(
                "unknown job: {name}"
            ))),
        }
    }

    /// each tick spawns its own run so a slow run never delays the ticker, an overlapping
    /// tick is skipped by the job lock
    fn every(&self, name: &'static str, period: Duration) -> JoinHandle<()> {
        let scheduler = self.clone();
        info!("[scheduler:{name}] every {}s", period.as_secs());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                let job = scheduler.clone();
                tokio::spawn(async move {
                    let locks = job.locks.clone();
                    run_exclusive(locks, name, job.run(name)).await;
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use mockall::mock;
    use mockall::predicate::eq;

    use rst_common::standard::async_trait::async_trait;

    use prople_warden_core::identity::callback::types::CallbackTopic;
    use prople_warden_core::identity::callback::PendingCallback;
    use prople_warden_core::identity::revocation::types::StatusEntry;
    use prople_warden_core::identity::verifiable::VerifiableCredential;

    mock!(
        FakeRevocation{}

        #[async_trait]
        impl RevocationAPI for FakeRevocation {
            async fn register_list(&self, profile: String) -> Result<String, IdentityError>;

            async fn add_status_entry(&self, profile: String) -> Result<StatusEntry, IdentityError>;

            async fn revoke(&self, profile: String, index: usize) -> Result<(), IdentityError>;

            async fn issue_status_list_credentials(
                &self,
                profile: Option<String>,
                force: bool,
            ) -> Result<Vec<String>, IdentityError>;

            async fn get_status_list_credential_of_managed_wallet(
                &self,
                list_name: String,
            ) -> Result<VerifiableCredential, IdentityError>;

            async fn get_status_list_credential_of_url(
                &self,
                url: String,
            ) -> Result<VerifiableCredential, IdentityError>;
        }
    );

    mock!(
        FakeBpdm{}

        #[async_trait]
        impl BpdmBuilder for FakeBpdm {
            async fn pull_and_update_credentials(&self, bpn: Option<String>) -> Result<(), IdentityError>;

            async fn issue_and_send_credentials(
                &self,
                wallet_did: String,
                connection_id: String,
            ) -> Result<(), IdentityError>;
        }
    );

    mock!(
        FakeCallback{}

        #[async_trait]
        impl CallbackAPI for FakeCallback {
            async fn open(
                &self,
                thread_id: String,
                topic: CallbackTopic,
                callback_url: Option<String>,
                state: String,
            ) -> Result<PendingCallback, IdentityError>;

            async fn get(&self, thread_id: String) -> Result<Option<PendingCallback>, IdentityError>;

            async fn update_state(
                &self,
                thread_id: String,
                topic: CallbackTopic,
                state: String,
                terminal: bool,
            ) -> Result<PendingCallback, IdentityError>;

            async fn purge(&self, retention_secs: i64) -> Result<usize, IdentityError>;
        }
    );

    fn build_scheduler(
        revocation: MockFakeRevocation,
        bpdm: MockFakeBpdm,
        callbacks: MockFakeCallback,
    ) -> Scheduler {
        Scheduler::new(
            Arc::new(revocation),
            Arc::new(bpdm),
            Arc::new(callbacks),
            SchedulerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_run_exclusive_skips_overlap() {
        let locks = KeyedLock::new();
        let executed = Arc::new(AtomicBool::new(false));

        let guard = locks.try_lock(JOB_BPDM_PULL);
        assert!(guard.is_some());

        let flag = executed.clone();
        let ran = run_exclusive(locks.clone(), JOB_BPDM_PULL, async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(!ran);
        assert!(!executed.load(Ordering::SeqCst));

        drop(guard);
        let flag = executed.clone();
        let ran = run_exclusive(locks, JOB_BPDM_PULL, async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await;

        assert!(ran);
        assert!(executed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_exclusive_failed_job_releases_lock() {
        let locks = KeyedLock::new();
        let ran = run_exclusive(locks.clone(), JOB_STATUS_LIST, async {
            Err(IdentityError::Upstream("agent down".to_string()))
        })
        .await;

        assert!(ran);
        assert!(locks.try_lock(JOB_STATUS_LIST).is_some());
    }

    #[tokio::test]
    async fn test_reissue_is_not_forced() {
        let mut revocation = MockFakeRevocation::new();
        revocation
            .expect_issue_status_list_credentials()
            .with(eq(None), eq(false))
            .times(1)
            .returning(|_, _| Ok(vec!["BPNL000000000001".to_string()]));

        let scheduler = build_scheduler(revocation, MockFakeBpdm::new(), MockFakeCallback::new());
        let result = scheduler.run(JOB_STATUS_LIST).await;
        assert!(!result.is_err());
    }

    #[tokio::test]
    async fn test_pull_bpdm_for_all_wallets() {
        let mut bpdm = MockFakeBpdm::new();
        bpdm.expect_pull_and_update_credentials()
            .with(eq(None))
            .times(1)
            .returning(|_| Err(IdentityError::Upstream("bpdm".to_string())));

        let scheduler = build_scheduler(MockFakeRevocation::new(), bpdm, MockFakeCallback::new());
        let result = scheduler.run(JOB_BPDM_PULL).await;
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err(),
            IdentityError::Upstream("bpdm".to_string())
        );
    }

    #[tokio::test]
    async fn test_purge_uses_retention() {
        let retention = SchedulerConfig::default().callback_retention_secs();

        let mut callbacks = MockFakeCallback::new();
        callbacks
            .expect_purge()
            .with(eq(retention))
            .times(1)
            .returning(|_| Ok(3));

        let scheduler = build_scheduler(MockFakeRevocation::new(), MockFakeBpdm::new(), callbacks);
        let result = scheduler.run(JOB_CALLBACK_PURGE).await;
        assert!(!result.is_err());
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let scheduler = build_scheduler(
            MockFakeRevocation::new(),
            MockFakeBpdm::new(),
            MockFakeCallback::new(),
        );

        let result = scheduler.run("unknown").await;
        assert!(result.is_err());
    }
}

use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::chrono::{Duration, Utc};
use rst_common::with_logging::log::debug;

use crate::identity::types::IdentityError;
use crate::locks::KeyedLock;
use crate::tasks::TaskPool;

use super::types::{CallbackAPI, CallbackTopic, NotifierBuilder, RepoBuilder};
use super::PendingCallback;

pub struct Usecase<TRepo, TNotifier>
where
    TRepo: RepoBuilder + Send + Sync,
    TNotifier: NotifierBuilder + Send + Sync + 'static,
{
    repo: Arc<TRepo>,
    notifier: Arc<TNotifier>,
    tasks: TaskPool,
    locks: KeyedLock,
}

impl<TRepo, TNotifier> Clone for Usecase<TRepo, TNotifier>
where
    TRepo: RepoBuilder + Send + Sync,
    TNotifier: NotifierBuilder + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            notifier: self.notifier.clone(),
            tasks: self.tasks.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<TRepo, TNotifier> Usecase<TRepo, TNotifier>
where
    TRepo: RepoBuilder + Send + Sync,
    TNotifier: NotifierBuilder + Send + Sync + 'static,
{
    pub fn new(repo: Arc<TRepo>, notifier: Arc<TNotifier>, tasks: TaskPool) -> Self {
        Self {
            repo,
            notifier,
            tasks,
            locks: KeyedLock::new(),
        }
    }

    fn notify(&self, callback: &PendingCallback) {
        let url = match callback.callback_url() {
            Some(url) => url,
            None => return,
        };

        let notifier = self.notifier.clone();
        let payload = callback.to_payload();
        let label = format!("callback:notify:{}", callback.thread_id());

        self.tasks.spawn(label, async move {
            let thread_id = payload.thread_id.clone();
            let state = payload.state.clone();
            notifier.notify(url.clone(), payload).await?;

            debug!("[callback:notify] thread: {thread_id} | url: {url} | state: {state}");
            Ok(())
        });
    }
}

#[async_trait]
impl<TRepo, TNotifier> CallbackAPI for Usecase<TRepo, TNotifier>
where
    TRepo: RepoBuilder + Send + Sync,
    TNotifier: NotifierBuilder + Send + Sync + 'static,
{
    async fn open(
        &self,
        thread_id: String,
        topic: CallbackTopic,
        callback_url: Option<String>,
        state: String,
    ) -> Result<PendingCallback, IdentityError> {
        if thread_id.is_empty() {
            return Err(IdentityError::ValidationError(
                "thread_id was missing".to_string(),
            ));
        }

        let _guard = self.locks.lock(&thread_id).await;

        // a fast webhook may have created the record before the outbound call returned
        let (callback, notify) = match self.repo.get_callback(thread_id.clone()).await? {
            Some(mut existing) => {
                let known_url = existing.callback_url().is_some();
                existing.set_callback_url(callback_url);

                let notify = existing.is_terminal() && !known_url;
                (existing, notify)
            }
            None => {
                let terminal = topic.is_terminal_state(&state);
                let mut created = PendingCallback::new(thread_id, topic, callback_url, state.clone());
                if terminal {
                    created.update_state(state, true);
                }

                (created, terminal)
            }
        };

        self.repo.save_callback(&callback).await?;
        if notify {
            self.notify(&callback);
        }

        Ok(callback)
    }

    async fn get(&self, thread_id: String) -> Result<Option<PendingCallback>, IdentityError> {
        self.repo.get_callback(thread_id).await
    }

    async fn update_state(
        &self,
        thread_id: String,
        topic: CallbackTopic,
        state: String,
        terminal: bool,
    ) -> Result<PendingCallback, IdentityError> {
        let _guard = self.locks.lock(&thread_id).await;

        let mut callback = match self.repo.get_callback(thread_id.clone()).await? {
            Some(existing) if existing.is_terminal() => {
                debug!("[callback:update_state] thread: {thread_id} | already terminal");
                return Ok(existing);
            }
            Some(existing) => existing,
            None => PendingCallback::new(thread_id, topic, None, state.clone()),
        };

        callback.update_state(state, terminal);
        self.repo.save_callback(&callback).await?;

        if terminal {
            self.notify(&callback);
        }

        Ok(callback)
    }

    async fn purge(&self, retention_secs: i64) -> Result<usize, IdentityError> {
        let threshold = Utc::now() - Duration::seconds(retention_secs.max(0));
        let expired: Vec<String> = self
            .repo
            .list_callbacks()
            .await?
            .into_iter()
            .filter(|callback| callback.is_terminal() && callback.updated_at() < threshold)
            .map(|callback| callback.thread_id())
            .collect();

        for thread_id in expired.iter() {
            let _guard = self.locks.lock(thread_id).await;
            self.repo.remove_callback(thread_id.to_owned()).await?;
        }

        Ok(expired.len())
    }
}

use rst_common::standard::async_trait::async_trait;
use rst_common::with_logging::log::debug;

use prople_warden_core::identity::callback::types::{CallbackPayload, NotifierBuilder};
use prople_warden_core::identity::types::IdentityError;

use crate::rpc::shared::{call_empty, HttpClient};

/// `RpcClient` posts callback payloads to caller supplied urls
#[derive(Clone)]
pub struct RpcClient {
    http: HttpClient,
}

impl RpcClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl NotifierBuilder for RpcClient {
    async fn notify(&self, url: String, payload: CallbackPayload) -> Result<(), IdentityError> {
        debug!(
            "[notifier:notify] url: {} | thread: {} | state: {}",
            url, payload.thread_id, payload.state
        );

        call_empty(self.http.post_absolute(&url).json(&payload))
            .await
            .map_err(IdentityError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mockito::{Matcher, Server};
    use rst_common::standard::serde_json::json;
    use rst_common::with_tokio::tokio;

    use prople_warden_core::identity::callback::types::CallbackTopic;

    fn generate_payload() -> CallbackPayload {
        CallbackPayload {
            thread_id: "thread-1".to_string(),
            topic: CallbackTopic::Credential,
            state: "done".to_string(),
        }
    }

    #[tokio::test]
    async fn test_notify_posts_payload() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/hooks/warden")
            .match_body(Matcher::PartialJson(json!({
                "thread_id": "thread-1",
                "state": "done",
            })))
            .with_status(200)
            .create_async()
            .await;

        let http = HttpClient::new("http://unused".to_string(), Duration::from_secs(5)).unwrap();
        let notifier = RpcClient::new(http);
        let result = notifier
            .notify(format!("{}/hooks/warden", server.url()), generate_payload())
            .await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_notify_failure_is_upstream() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/hooks/warden")
            .with_status(503)
            .create_async()
            .await;

        let http = HttpClient::new("http://unused".to_string(), Duration::from_secs(5)).unwrap();
        let notifier = RpcClient::new(http);
        let result = notifier
            .notify(format!("{}/hooks/warden", server.url()), generate_payload())
            .await;

        assert!(matches!(result, Err(IdentityError::Upstream(_))));
    }
}

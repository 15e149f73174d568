//! Experience-point awards. Calls are fire-and-forget: a failing reward
//! service is logged and never affects the chat turn.

use log::{ info, warn };
use reqwest::Client;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const CHAT_XP_POINTS: i64 = 8;
pub const CHAT_XP_REASON: &str = "Chat interaction";

pub trait XpNotifier: Send + Sync {
    fn award_xp(&self, user_id: &str, points: i64, reason: &str);
}

#[derive(Serialize)]
struct XpAward<'a> {
    user_id: &'a str,
    points: i64,
    reason: &'a str,
}

pub struct HttpXpNotifier {
    client: Client,
    endpoint: Url,
}

impl HttpXpNotifier {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, Box<dyn Error + Send + Sync>> {
        let endpoint = Url::parse(endpoint).map_err(|e|
            format!("Invalid gamification URL '{}': {}", endpoint, e)
        )?;
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint,
        })
    }
}

impl XpNotifier for HttpXpNotifier {
    fn award_xp(&self, user_id: &str, points: i64, reason: &str) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let user_id = user_id.to_string();
        let reason = reason.to_string();

        tokio::spawn(async move {
            let award = XpAward { user_id: &user_id, points, reason: &reason };
            let result = client
                .post(endpoint)
                .json(&award)
                .send().await
                .and_then(|resp| resp.error_for_status());
            if let Err(e) = result {
                warn!("XP award for {} failed: {}", user_id, e);
            }
        });
    }
}

/// Used when no reward service is configured.
pub struct LogXpNotifier;

impl XpNotifier for LogXpNotifier {
    fn award_xp(&self, user_id: &str, points: i64, reason: &str) {
        info!("Awarding {} XP to {} ({})", points, user_id, reason);
    }
}

pub fn create_notifier(
    gamification_url: Option<&str>
) -> Result<Arc<dyn XpNotifier>, Box<dyn Error + Send + Sync>> {
    match gamification_url.filter(|u| !u.trim().is_empty()) {
        Some(url) => {
            info!("XP awards will be posted to {}", url);
            Ok(Arc::new(HttpXpNotifier::new(url, Duration::from_secs(10))?))
        }
        None => {
            info!("No gamification URL configured; XP awards are logged only");
            Ok(Arc::new(LogXpNotifier))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{ body_json, method, path };
    use wiremock::{ Mock, MockServer, ResponseTemplate };

    #[test]
    fn rejects_malformed_url() {
        assert!(HttpXpNotifier::new("not a url", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn blank_url_falls_back_to_logging() {
        assert!(create_notifier(Some("  ")).is_ok());
        assert!(create_notifier(None).is_ok());
    }

    #[tokio::test]
    async fn unreachable_service_does_not_panic_the_caller() {
        let notifier = HttpXpNotifier::new("http://127.0.0.1:9/xp", Duration::from_millis(200)).unwrap();
        notifier.award_xp("u1", CHAT_XP_POINTS, CHAT_XP_REASON);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn award_is_posted_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/xp"))
            .and(body_json(json!({"user_id": "u1", "points": 8, "reason": "Chat interaction"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server).await;

        let notifier = HttpXpNotifier::new(
            &format!("{}/xp", server.uri()),
            Duration::from_secs(5)
        ).unwrap();
        notifier.award_xp("u1", CHAT_XP_POINTS, CHAT_XP_REASON);

        for _ in 0..50 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.verify().await;
    }

    #[tokio::test]
    async fn failing_service_is_only_logged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server).await;

        let notifier = HttpXpNotifier::new(&server.uri(), Duration::from_secs(5)).unwrap();
        notifier.award_xp("u1", CHAT_XP_POINTS, CHAT_XP_REASON);

        for _ in 0..50 {
            if !server.received_requests().await.unwrap_or_default().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        server.verify().await;
    }
}

use crate::error::DeliveryError;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use serde::Serialize;
use tracing::{debug, info, warn};

// Anything from here up is reported as a failed delivery.
const FIRST_FAILURE_STATUS: u16 = 299;

/// The envelope posted to an incoming webhook.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub unfurl_links: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    pub fallback: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretext: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub title: String,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub short: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Button,
}

/// Posts `message` once and returns the response status if it counts as a success.
pub fn send_message(webhook_url: &Url, message: &Message) -> Result<StatusCode, DeliveryError> {
    let body = serde_json::to_vec(message)?;

    debug!(
        host = webhook_url.host_str().unwrap_or_default(),
        bytes = body.len(),
        "Posting message"
    );

    let client = reqwest::blocking::Client::builder()
        .build()
        .map_err(|e| DeliveryError::Transport(e.without_url()))?;

    let response = client
        .post(webhook_url.clone())
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .map_err(|e| {
            let e = e.without_url();
            warn!(error = %e, "Webhook request failed");
            DeliveryError::Transport(e)
        })?;

    let status = response.status();

    if status.as_u16() >= FIRST_FAILURE_STATUS {
        warn!(%status, "Webhook rejected message");
        return Err(DeliveryError::Status(status));
    }

    info!(%status, "Message delivered");

    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bare_message() -> Message {
        Message {
            text: None,
            username: None,
            icon_url: None,
            icon_emoji: None,
            channel: None,
            unfurl_links: false,
            attachments: vec![Attachment {
                fallback: "Build finished".to_string(),
                pretext: None,
                color: None,
                title: None,
                author_name: None,
                author_link: None,
                author_icon: None,
                footer: None,
                fields: vec![],
                actions: vec![],
            }],
        }
    }

    async fn send_to(server: &MockServer) -> Result<StatusCode, DeliveryError> {
        let url = Url::parse(&server.uri()).unwrap();
        tokio::task::spawn_blocking(move || send_message(&url, &bare_message()))
            .await
            .unwrap()
    }

    #[test]
    fn test_absent_values_are_omitted() {
        let value = serde_json::to_value(bare_message()).unwrap();

        assert_eq!(
            value,
            json!({
                "unfurl_links": false,
                "attachments": [{ "fallback": "Build finished" }]
            })
        );
    }

    #[test]
    fn test_field_and_action_encoding() {
        let mut message = bare_message();
        message.channel = Some("#releases".to_string());
        message.attachments[0].fields = vec![
            Field {
                title: "Version".to_string(),
                value: "v1.0".to_string(),
                short: true,
            },
            Field {
                title: "Notes".to_string(),
                value: "none".to_string(),
                short: false,
            },
        ];
        message.attachments[0].actions = vec![Action {
            kind: ActionKind::Button,
            text: "Changelog".to_string(),
            url: "https://example.com/changelog".to_string(),
        }];

        let value = serde_json::to_value(message).unwrap();

        assert_eq!(
            value,
            json!({
                "channel": "#releases",
                "unfurl_links": false,
                "attachments": [{
                    "fallback": "Build finished",
                    "fields": [
                        { "title": "Version", "value": "v1.0", "short": true },
                        { "title": "Notes", "value": "none" }
                    ],
                    "actions": [
                        { "type": "button", "text": "Changelog", "url": "https://example.com/changelog" }
                    ]
                }]
            })
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_success_returns_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let status = send_to(&server).await.unwrap();
        assert_eq!(status.to_string(), "200 OK");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = requests[0].body_json().unwrap();
        assert_eq!(body["attachments"][0]["fallback"], "Build finished");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_just_below_threshold_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert_eq!(send_to(&server).await.unwrap(), StatusCode::NO_CONTENT);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_found_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = send_to(&server).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Status(StatusCode::NOT_FOUND)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_status_299_is_a_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(299))
            .mount(&server)
            .await;

        let err = send_to(&server).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Status(s) if s.as_u16() == 299));
    }

    #[test]
    fn test_connection_refused_is_a_transport_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = Url::parse(&format!("http://127.0.0.1:{}/services/secret", port)).unwrap();

        let err = send_message(&url, &bare_message()).unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
        assert!(!err.to_string().contains("secret"));
    }
}

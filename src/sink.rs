//! HTTP collector for donation records.

use crate::capability::RecordSink;
use crate::constants::default_headers;
use crate::error::{Error, Result};
use crate::models::DonationRecord;
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

pub struct HttpRecordSink {
    client: Client,
    url: String,
}

impl HttpRecordSink {
    pub fn new(url: impl Into<String>, timeout: Duration, proxy_url: Option<&str>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(timeout)
            .default_headers(default_headers());
        if let Some(proxy) = proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(Error::Http)?);
        }
        let client = builder.build().map_err(Error::Http)?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RecordSink for HttpRecordSink {
    async fn submit(&mut self, record: &DonationRecord) -> Result<()> {
        let resp = self.client.post(&self.url).json(record).send().await?;
        let status = resp.status();
        if status.as_u16() != 200 {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sink_for(server: &MockServer) -> HttpRecordSink {
        HttpRecordSink::new(
            format!("{}/donations/", server.uri()),
            Duration::from_secs(5),
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_message_record() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/donations/"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "donor_name": "Carol",
                "amount": 1.0,
                "message": "skip"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = sink_for(&server);
        sink.submit(&DonationRecord::with_message("Carol", 1.0, "skip"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn omits_absent_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(serde_json::json!({"donor_name": "Alice", "amount": 3.0})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut sink = sink_for(&server);
        sink.submit(&DonationRecord::bare("Alice", 3.0)).await.unwrap();
    }

    #[tokio::test]
    async fn non_ok_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad amount"))
            .mount(&server)
            .await;

        let mut sink = sink_for(&server);
        let err = sink
            .submit(&DonationRecord::bare("Alice", 3.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Status { body, .. } if body == "bad amount"));
    }
}

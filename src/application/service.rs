use super::event_store::{AppendOutcome, EventStore};
use crate::domain::amount::AmountExtractor;
use crate::domain::event::{Event, EventSummary, event_id};
use crate::domain::money::{AmountInput, MonetaryAmount};
use crate::domain::payload;
use crate::domain::qr_image;
use crate::domain::request::{IpAllowList, WebhookRequest, decode_body};
use crate::error::{QrisError, Result};
use serde::Serialize;

/// Headers that carry credentials and are never persisted.
const REDACTED_HEADERS: [&str; 3] = ["authorization", "cookie", "x-webhook-token"];

/// A generated dynamic QRIS string and the amount it encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DynamicPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_amount: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_code: Option<u32>,
    pub total: u64,
    pub payload: String,
    /// PNG rendering of `payload`, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_png_data_url: Option<String>,
}

impl DynamicPayload {
    /// Attaches a PNG `data:` URL of the payload's QR symbol.
    pub fn with_qr_png(mut self) -> Result<Self> {
        self.qr_png_data_url = Some(qr_image::png_data_url(&self.payload)?);
        Ok(self)
    }
}

/// Entry point for the operations the outer shell exposes.
pub struct QrisService {
    store: EventStore,
    extractor: AmountExtractor,
    allow_list: IpAllowList,
    default_static: Option<String>,
}

impl QrisService {
    pub fn new(store: EventStore) -> Self {
        Self {
            store,
            extractor: AmountExtractor::default(),
            allow_list: IpAllowList::default(),
            default_static: None,
        }
    }

    pub fn with_extractor(mut self, extractor: AmountExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_allow_list(mut self, allow_list: IpAllowList) -> Self {
        self.allow_list = allow_list;
        self
    }

    /// Static payload used when a request does not carry its own.
    pub fn with_default_static(mut self, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        self.default_static = (!payload.trim().is_empty()).then_some(payload);
        self
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Turns a static QRIS string into a dynamic one carrying the total amount.
    pub fn generate_dynamic(
        &self,
        payload_static: Option<&str>,
        input: AmountInput,
    ) -> Result<DynamicPayload> {
        let payload_static = payload_static
            .filter(|p| !p.trim().is_empty())
            .or(self.default_static.as_deref())
            .ok_or_else(|| {
                QrisError::InvalidPayload("static payload is missing".to_string())
            })?;

        let total = input.total()?;
        let amount = MonetaryAmount::from_units(total)?;
        let payload = payload::make_dynamic(payload_static, amount)?;

        tracing::debug!(total, "Generated dynamic payload");
        Ok(DynamicPayload {
            base_amount: input.base_amount(),
            unique_code: input.unique_code(),
            total,
            payload,
            qr_png_data_url: None,
        })
    }

    /// Records an inbound webhook call and returns the stored event.
    ///
    /// Store failures do not fail ingestion; see [`EventStore::append`].
    pub async fn ingest_webhook(&self, request: WebhookRequest) -> Result<Event> {
        if request.token.trim().is_empty() {
            return Err(QrisError::ValidationError("token is required".to_string()));
        }

        let raw = request.raw_text()?;
        let source_ip = request.source_ip();
        if !self.allow_list.allows(source_ip.as_deref()) {
            tracing::warn!(
                source_ip = source_ip.as_deref().unwrap_or("unknown"),
                "Rejected webhook from address outside the allow list"
            );
            return Err(QrisError::Forbidden(
                source_ip.unwrap_or_else(|| "unknown".to_string()),
            ));
        }

        let body = decode_body(&request.method, request.content_type(), &raw);
        let amount = self.extractor.extract(&body, &raw);
        let received_at = self.store.now();

        let headers = request
            .headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .filter(|(name, _)| !REDACTED_HEADERS.contains(&name.as_str()))
            .collect();

        let event = Event {
            event_id: event_id(&raw, received_at),
            token: request.token,
            received_at,
            method: request.method.to_ascii_uppercase(),
            source_ip,
            amount,
            body,
            query: request.query,
            headers,
        };

        let outcome = self.store.append(&event).await;
        tracing::info!(
            event_id = %event.event_id,
            amount = ?event.amount,
            stored = outcome == AppendOutcome::Stored,
            "Webhook received"
        );
        Ok(event)
    }

    pub async fn query_events(&self, token: &str, limit: usize) -> Vec<Event> {
        self.store.recent(token, limit).await
    }

    pub async fn query_summary(&self, token: &str, limit: usize) -> Vec<EventSummary> {
        self.store.summary(token, limit).await
    }
}

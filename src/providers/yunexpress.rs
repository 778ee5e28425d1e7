// =============================================================================
// providers/yunexpress.rs — YUNEXPRESS, THE AGGREGATOR
// =============================================================================
//
// YunExpress ships cross-border parcels and then hands them to a local
// courier for the final leg. Its tracking API tells us both halves:
//
//   POST https://services.yuntrack.com/Track/Query
//   {"NumberList":["YT..."],"CaptchaVerification":"","Year":0}
//
// The answer carries the YunExpress waybill, the local courier's tracking
// number, weight, origin/destination country codes, the full YunExpress
// event history and a ProviderSite URL naming the local courier.
//
// If that courier is registered too, we ask it about its own tracking
// number and fold its events into ours. One hop only: the delegated fetch
// runs with a context that cannot delegate any further. A ProviderSite
// pointing back at yuntrack.com means YunExpress delivers the last mile
// itself, and nothing is fetched twice.
// =============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dates::{days_between, parse_timestamp};
use crate::error::FetchError;
use crate::models::{ParcelEvent, ParcelInfo};
use crate::provider::{normalize_tracking_number, FetchContext, Provider, TrackingPattern};

use super::http::ensure_success;

pub const NAME: &str = "YunExpress";
pub const DOMAIN: &str = "yuntrack.com";
pub const PATTERN: &str = "[A-Z]{2}[0-9]{16}";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct QueryRequest<'a> {
    number_list: [&'a str; 1],
    captcha_verification: &'a str,
    year: u32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct QueryResponse {
    result_list: Vec<QueryResult>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct QueryResult {
    track_info: Option<TrackInfo>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct TrackInfo {
    waybill_number: Option<String>,
    tracking_number: Option<String>,
    channel_code_out: Option<String>,
    provider_name: Option<String>,
    #[serde(deserialize_with = "lenient_weight")]
    weight: f64,
    origin_country_code: Option<String>,
    destination_country_code: Option<String>,
    created_on: Option<String>,
    provider_site: Option<String>,
    track_event_details: Vec<TrackEventDetail>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "PascalCase")]
struct TrackEventDetail {
    created_on: Option<String>,
    process_location: Option<String>,
    process_content: Option<String>,
}

/// Weight shows up as a number, a numeric string, or null depending on the
/// day. Anything unreadable becomes 0.0 (unknown).
fn lenient_weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

/// Where the API says the parcel continues its journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    /// Full URL of the last-mile courier's site.
    pub provider_site: String,
    /// The number that courier knows the parcel by.
    pub tracking_number: String,
}

pub struct YunExpressProvider {
    client: reqwest::Client,
    query_url: String,
    origin: String,
    pattern: TrackingPattern,
}

impl YunExpressProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            query_url: config.yunexpress_query_url.clone(),
            origin: config.yunexpress_origin.clone(),
            pattern: TrackingPattern::new(PATTERN)?,
        })
    }

    async fn query(&self, tracking_number: &str) -> Result<String, FetchError> {
        let referer = format!("{}/", self.origin);

        // The public site always preflights; mimic it, but a failed
        // preflight is not worth aborting over.
        if let Err(e) = self
            .client
            .request(reqwest::Method::OPTIONS, &self.query_url)
            .header("Origin", self.origin.as_str())
            .header("Referer", referer.as_str())
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "authorization,content-type")
            .send()
            .await
        {
            debug!(error = %e, "YunExpress: preflight failed, posting anyway");
        }

        let body = QueryRequest {
            number_list: [tracking_number],
            captcha_verification: "",
            year: 0,
        };

        let response = self
            .client
            .post(&self.query_url)
            .header("Origin", self.origin.as_str())
            .header("Referer", referer.as_str())
            .json(&body)
            .send()
            .await?;

        Ok(ensure_success(NAME, response)?.text().await?)
    }
}

#[async_trait]
impl Provider for YunExpressProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn origin_domain(&self) -> &str {
        DOMAIN
    }

    fn pattern(&self) -> &TrackingPattern {
        &self.pattern
    }

    async fn fetch(
        &self,
        tracking_number: &str,
        ctx: &FetchContext,
    ) -> Result<ParcelInfo, FetchError> {
        let tracking_number = normalize_tracking_number(tracking_number);
        if !self.accepts(&tracking_number) {
            debug!(
                tracking_number = %tracking_number,
                "YunExpress: not a YunExpress number, returning an empty record"
            );
            return Ok(ParcelInfo::default());
        }

        let body = self.query(&tracking_number).await?;
        let (mut parcel, handoff) = parse_query_response(&tracking_number, &body, Utc::now())?;

        info!(
            tracking_number = %tracking_number,
            events = parcel.events().len(),
            destination = %parcel.destination,
            "YunExpress: track info received"
        );

        if let Some(handoff) = handoff {
            delegate(&mut parcel, &handoff, ctx).await;
        }

        Ok(parcel)
    }
}

/// Ask the last-mile courier (if we know it) and fold its events in.
/// Its failures are logged and otherwise ignored.
async fn delegate(parcel: &mut ParcelInfo, handoff: &Handoff, ctx: &FetchContext) {
    let Some((target, nested)) = ctx.delegate_for_url(DOMAIN, &handoff.provider_site) else {
        debug!(
            provider_site = %handoff.provider_site,
            depth = ctx.depth(),
            "YunExpress: no delegation target for provider site"
        );
        return;
    };

    info!(
        target = %target.name(),
        tracking_number = %handoff.tracking_number,
        "YunExpress: handing off to last-mile courier"
    );

    match target.fetch(&handoff.tracking_number, &nested).await {
        Ok(mut delegated) => parcel.extend_events(delegated.take_events()),
        Err(e) => warn!(
            target = %target.name(),
            error = %e,
            "YunExpress: delegated lookup failed, keeping our own events"
        ),
    }
}

/// Decode a Track/Query response body.
///
/// Missing scalar fields stay at their zero values. Events with an
/// unreadable date are dropped. An empty result list is
/// [`FetchError::NoData`].
pub fn parse_query_response(
    tracking_number: &str,
    body: &str,
    now: DateTime<Utc>,
) -> Result<(ParcelInfo, Option<Handoff>), FetchError> {
    let response: QueryResponse = serde_json::from_str(body).map_err(|e| FetchError::Decode {
        provider: NAME.to_string(),
        reason: e.to_string(),
    })?;

    let info = response
        .result_list
        .into_iter()
        .next()
        .and_then(|r| r.track_info)
        .ok_or_else(|| FetchError::NoData {
            provider: NAME.to_string(),
            tracking_number: tracking_number.to_string(),
        })?;

    let mut parcel = ParcelInfo::default();
    let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let local_number = non_empty(info.tracking_number);
    parcel.tracking_numbers.extend(non_empty(info.waybill_number));
    parcel.tracking_numbers.extend(local_number.clone());

    parcel.channel = non_empty(info.channel_code_out).unwrap_or_default();
    parcel.provider_label = non_empty(info.provider_name).unwrap_or_default();
    parcel.weight_kg = info.weight;
    parcel.origin = non_empty(info.origin_country_code).unwrap_or_default();
    parcel.destination = non_empty(info.destination_country_code).unwrap_or_default();

    if let Some(created) = info.created_on.as_deref().and_then(parse_timestamp) {
        parcel.days_in_transit = days_between(created, now);
    }

    let events: Vec<ParcelEvent> = info
        .track_event_details
        .into_iter()
        .filter_map(|detail| {
            let raw_date = detail.created_on.unwrap_or_default();
            let Some(timestamp) = parse_timestamp(&raw_date) else {
                debug!(date = %raw_date, "YunExpress: dropping event with unreadable date");
                return None;
            };
            Some(ParcelEvent::new(
                NAME,
                timestamp,
                detail.process_location,
                detail.process_content.unwrap_or_default(),
            ))
        })
        .collect();
    parcel.extend_events(events);

    let handoff = match (non_empty(info.provider_site), local_number) {
        (Some(provider_site), Some(tracking_number)) => Some(Handoff {
            provider_site,
            tracking_number,
        }),
        _ => None,
    };

    Ok((parcel, handoff))
}

// =============================================================================
// providers/speedy.rs — SPEEDY, BULGARIA
// =============================================================================
//
// Speedy publishes shipment history as an HTML table on its public tracking
// page:
//
//   https://www.speedy.bg/en/track-shipment?shipmentNumber={11 digits}
//
// Columns we care about: "Date", "City/village", "Operation". The page has
// no destination or weight worth scraping, so a Speedy record is mostly its
// event history. That is exactly what makes it useful as a delegation target
// for aggregators that hand parcels over to Speedy for the last mile.
// =============================================================================

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::Config;
use crate::dates::parse_timestamp;
use crate::error::FetchError;
use crate::models::{ParcelEvent, ParcelInfo};
use crate::provider::{normalize_tracking_number, FetchContext, Provider, TrackingPattern};

use super::html;
use super::http::ensure_success;

pub const NAME: &str = "Speedy";
pub const DOMAIN: &str = "speedy.bg";
pub const PATTERN: &str = "[0-9]{11}";

const DATE_COLUMN: &str = "Date";
const LOCATION_COLUMN: &str = "City/village";
const OPERATION_COLUMN: &str = "Operation";

pub struct SpeedyProvider {
    client: reqwest::Client,
    base_url: String,
    pattern: TrackingPattern,
}

impl SpeedyProvider {
    pub fn new(client: reqwest::Client, config: &Config) -> Result<Self, regex::Error> {
        Ok(Self {
            client,
            base_url: config.speedy_base_url.clone(),
            pattern: TrackingPattern::new(PATTERN)?,
        })
    }
}

#[async_trait]
impl Provider for SpeedyProvider {
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
        _ctx: &FetchContext,
    ) -> Result<ParcelInfo, FetchError> {
        let tracking_number = normalize_tracking_number(tracking_number);
        if !self.accepts(&tracking_number) {
            debug!(
                tracking_number = %tracking_number,
                "Speedy: not a Speedy shipment number, returning an empty record"
            );
            return Ok(ParcelInfo::default());
        }

        let url = format!(
            "{}/en/track-shipment?shipmentNumber={}",
            self.base_url,
            urlencoding::encode(&tracking_number)
        );
        debug!(url = %url, "Speedy: fetching tracking page");

        let response = self.client.get(&url).send().await?;
        let body = ensure_success(NAME, response)?.text().await?;

        let parcel = parse_tracking_page(&tracking_number, &body);
        info!(
            tracking_number = %tracking_number,
            events = parcel.events().len(),
            "Speedy: tracking page parsed"
        );
        Ok(parcel)
    }
}

/// Build a record from a Speedy tracking page.
///
/// The record always carries the tracking number. Rows with an unreadable
/// date are skipped. A page without a history table yields a record with
/// no events.
pub fn parse_tracking_page(tracking_number: &str, page: &str) -> ParcelInfo {
    let mut parcel = ParcelInfo::default();
    parcel.tracking_numbers.push(tracking_number.to_string());

    let Some(table) = html::extract_table(page) else {
        debug!("Speedy: no history table on the page");
        return parcel;
    };

    let (Some(date_col), Some(operation_col)) =
        (table.column(DATE_COLUMN), table.column(OPERATION_COLUMN))
    else {
        debug!(headers = ?table.headers, "Speedy: history table is missing expected columns");
        return parcel;
    };
    let location_col = table.column(LOCATION_COLUMN);

    let events = table.rows.iter().filter_map(|row| {
        let raw_date = row.get(date_col)?;
        let Some(timestamp) = parse_timestamp(raw_date) else {
            debug!(date = %raw_date, "Speedy: dropping row with unreadable date");
            return None;
        };
        let location = location_col.and_then(|i| row.get(i)).cloned();
        let message = row.get(operation_col).cloned().unwrap_or_default();
        Some(ParcelEvent::new(NAME, timestamp, location, message))
    });
    parcel.extend_events(events.collect::<Vec<_>>());

    parcel
}

use crate::constants::{ALERTS_EXPORT_PATH, CASES_EXPORT_PATH, SARS_EXPORT_PATH, TIMESTAMP_FORMAT};
use crate::models::{DateRange, ExportRequest, RecordType};
use serde_json::{json, Map, Value};

/// Request shape of one record type's bulk-export endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordTypeAdapter {
    pub endpoint: &'static str,
    pub start_field: &'static str,
    pub end_field: &'static str,
    /// Whether the endpoint takes the `is_summary` switch
    pub supports_summary: bool,
}

const ALERT_ADAPTER: RecordTypeAdapter = RecordTypeAdapter {
    endpoint: ALERTS_EXPORT_PATH,
    start_field: "start_date",
    end_field: "end_date",
    supports_summary: true,
};

// No agent id/email filter: case exports are accepted without one.
const CASE_ADAPTER: RecordTypeAdapter = RecordTypeAdapter {
    endpoint: CASES_EXPORT_PATH,
    start_field: "start_date",
    end_field: "end_date",
    supports_summary: false,
};

const SAR_ADAPTER: RecordTypeAdapter = RecordTypeAdapter {
    endpoint: SARS_EXPORT_PATH,
    start_field: "created_at_start",
    end_field: "created_at_end",
    supports_summary: false,
};

impl RecordTypeAdapter {
    pub fn for_record_type(record_type: RecordType) -> &'static RecordTypeAdapter {
        match record_type {
            RecordType::Alert => &ALERT_ADAPTER,
            RecordType::Case => &CASE_ADAPTER,
            RecordType::Sar => &SAR_ADAPTER,
        }
    }

    /// Builds the JSON body for `request`.
    ///
    /// Keys are kept in sorted order, so equal requests serialize to identical bytes.
    pub fn build_body(&self, request: &ExportRequest) -> Value {
        let (start, end) = day_bounds(&request.date_range);

        let mut filters = Map::new();
        filters.insert(self.start_field.to_string(), Value::String(start));
        filters.insert(self.end_field.to_string(), Value::String(end));

        let mut body = Map::new();
        body.insert("filters".to_string(), Value::Object(filters));
        body.insert("use_csv".to_string(), json!(true));
        if self.supports_summary {
            body.insert("is_summary".to_string(), json!(request.flags.is_summary));
        }
        Value::Object(body)
    }
}

/// Expands a day range to `YYYY-MM-DD 00:00:00` / `YYYY-MM-DD 23:59:59`.
pub fn day_bounds(range: &DateRange) -> (String, String) {
    let start = range
        .start()
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    let end = range
        .end()
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default();
    (start, end)
}

//! Structured protocol entities.
//!
//! All of these are immutable value records produced by the codec's pure
//! decode functions. Decoding the same record twice yields equal values,
//! so duplicates across fetches merge cleanly.

use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use dvmdesk_core::kinds::is_request_kind;
use dvmdesk_core::{EventId, Pubkey, RawRecord};

/// What a job input's `data` field points at.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Url,
    Event,
    Job,
    #[default]
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputKind::Url => "url",
            InputKind::Event => "event",
            InputKind::Job => "job",
            InputKind::Text => "text",
        }
    }

    /// Parse a wire spelling, defaulting to `Text` for blank or unknown
    /// values (the field is advisory; an unknown spelling must not drop
    /// the input).
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "url" => InputKind::Url,
            "event" => InputKind::Event,
            "job" => InputKind::Job,
            _ => InputKind::Text,
        }
    }
}

/// One unit of data fed to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInput {
    pub data: String,
    pub kind: InputKind,
    pub relay: Option<String>,
    pub marker: Option<String>,
}

impl JobInput {
    pub fn text(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: InputKind::Text,
            relay: None,
            marker: None,
        }
    }

    pub fn url(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            kind: InputKind::Url,
            relay: None,
            marker: None,
        }
    }
}

/// One named job option. Keys need not be unique; order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParam {
    pub key: String,
    pub value: String,
}

impl JobParam {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A published unit of work (request-range kind).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRequest {
    pub kind: u16,
    pub content: String,
    pub inputs: Vec<JobInput>,
    pub params: Vec<JobParam>,
    /// Requested output MIME type / format.
    pub output: Option<String>,
    /// Maximum the requester is willing to pay, in millisats.
    pub bid_msat: Option<u64>,
    /// Relays the requester suggests responses be published to.
    pub relay_hints: Vec<String>,
    /// Providers explicitly invited to answer. Empty means open market.
    pub providers: Vec<Pubkey>,
    pub encrypted: bool,
}

impl JobRequest {
    /// A minimal request of the given kind; builder methods fill the rest.
    pub fn new(kind: u16) -> Self {
        Self {
            kind,
            content: String::new(),
            inputs: Vec::new(),
            params: Vec::new(),
            output: None,
            bid_msat: None,
            relay_hints: Vec::new(),
            providers: Vec::new(),
            encrypted: false,
        }
    }

    pub fn with_input(mut self, input: JobInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(JobParam::new(key, value));
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_bid_msat(mut self, bid: u64) -> Self {
        self.bid_msat = Some(bid);
        self
    }

    pub fn with_relay_hint(mut self, relay: impl Into<String>) -> Self {
        self.relay_hints.push(relay.into());
        self
    }

    pub fn with_provider(mut self, provider: Pubkey) -> Self {
        self.providers.push(provider);
        self
    }
}

/// A provider's completed output for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResult {
    /// The result record itself.
    pub record: RawRecord,
    /// The originating request, as embedded by the provider.
    pub request: RawRecord,
    pub payload: String,
    /// Payment requested by the provider, in millisats.
    pub amount_msat: Option<u64>,
    /// Opaque payment handle (a lightning invoice in practice).
    pub invoice: Option<String>,
    pub encrypted: bool,
}

impl JobResult {
    /// Identifier of the request this result answers.
    pub fn request_id(&self) -> &EventId {
        &self.request.id
    }
}

/// A provider's interim status for one request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedbackStatus {
    PaymentRequired,
    Processing,
    Error,
    Success,
    Partial,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::PaymentRequired => "payment-required",
            FeedbackStatus::Processing => "processing",
            FeedbackStatus::Error => "error",
            FeedbackStatus::Success => "success",
            FeedbackStatus::Partial => "partial",
        }
    }
}

/// A `status` tag value that is not one of the five wire spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized feedback status `{0}`")]
pub struct UnknownFeedbackStatus(pub String);

impl FromStr for FeedbackStatus {
    type Err = UnknownFeedbackStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment-required" => Ok(FeedbackStatus::PaymentRequired),
            "processing" => Ok(FeedbackStatus::Processing),
            "error" => Ok(FeedbackStatus::Error),
            "success" => Ok(FeedbackStatus::Success),
            "partial" => Ok(FeedbackStatus::Partial),
            other => Err(UnknownFeedbackStatus(other.to_owned())),
        }
    }
}

impl core::fmt::Display for FeedbackStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider's interim status update (kind 7000).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFeedback {
    pub record: RawRecord,
    pub status: FeedbackStatus,
    pub extra_info: Option<String>,
    pub amount_msat: Option<u64>,
    pub invoice: Option<String>,
    /// Partial output carried in the record body, if any.
    pub partial_payload: Option<String>,
}

/// A service provider's self-announcement (kind 31990).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub pubkey: Pubkey,
    pub record: RawRecord,
    pub name: Option<String>,
    pub about: Option<String>,
    pub picture: Option<String>,
    /// Verified handle (NIP-05 identifier).
    pub nip05: Option<String>,
    /// Lightning payment address.
    pub lud16: Option<String>,
    pub supported_kinds: Vec<u16>,
    /// Specialization tags (`t` tags) advertised by the provider.
    pub tags: Vec<String>,
}

impl Provider {
    /// When the announcement was published.
    pub fn announced_at(&self) -> DateTime<Utc> {
        self.record.created_at_utc()
    }

    /// Whether this announcement advertises any kind in the job-request
    /// range. Announcements for unrelated applications share kind 31990
    /// and must be excluded from the directory.
    pub fn handles_job_kinds(&self) -> bool {
        self.supported_kinds.iter().copied().any(is_request_kind)
    }
}

/// Derived lifecycle status of one job.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    /// No response seen yet.
    Pending,
    Processing,
    PaymentRequired,
    Partial,
    Error,
    /// Output delivered and the latest feedback confirms success.
    Success,
    /// Output delivered; payment state unconfirmed.
    Completed,
}

impl JobStatus {
    /// Whether the job is still worth polling for.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            JobStatus::Pending
                | JobStatus::Processing
                | JobStatus::PaymentRequired
                | JobStatus::Partial
        )
    }

    /// Terminal for polling purposes only; a late record still triggers
    /// recomputation.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::PaymentRequired => "payment-required",
            JobStatus::Partial => "partial",
            JobStatus::Error => "error",
            JobStatus::Success => "success",
            JobStatus::Completed => "completed",
        }
    }
}

impl From<FeedbackStatus> for JobStatus {
    fn from(status: FeedbackStatus) -> Self {
        match status {
            FeedbackStatus::PaymentRequired => JobStatus::PaymentRequired,
            FeedbackStatus::Processing => JobStatus::Processing,
            FeedbackStatus::Error => JobStatus::Error,
            FeedbackStatus::Success => JobStatus::Success,
            FeedbackStatus::Partial => JobStatus::Partial,
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a millisat amount as whole sats with thousands separators.
pub fn format_amount(millisats: u64) -> String {
    let sats = (millisats / 1000).to_string();
    let mut out = String::with_capacity(sats.len() + sats.len() / 3);
    for (i, c) in sats.chars().enumerate() {
        if i > 0 && (sats.len() - i).is_multiple_of(3) {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_kind_defaults_to_text() {
        assert_eq!(InputKind::parse_or_default(""), InputKind::Text);
        assert_eq!(InputKind::parse_or_default("bogus"), InputKind::Text);
        assert_eq!(InputKind::parse_or_default("url"), InputKind::Url);
    }

    #[test]
    fn feedback_status_round_trips_wire_spellings() {
        for status in [
            FeedbackStatus::PaymentRequired,
            FeedbackStatus::Processing,
            FeedbackStatus::Error,
            FeedbackStatus::Success,
            FeedbackStatus::Partial,
        ] {
            assert_eq!(status.as_str().parse::<FeedbackStatus>(), Ok(status));
        }
        let err = "done".parse::<FeedbackStatus>().unwrap_err();
        assert_eq!(err, UnknownFeedbackStatus("done".into()));
        assert_eq!(err.to_string(), "unrecognized feedback status `done`");
    }

    #[test]
    fn active_and_terminal_partition_the_status_space() {
        let all = [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::PaymentRequired,
            JobStatus::Partial,
            JobStatus::Error,
            JobStatus::Success,
            JobStatus::Completed,
        ];
        for status in all {
            assert_ne!(status.is_active(), status.is_terminal());
        }
        assert!(JobStatus::Partial.is_active());
        assert!(JobStatus::Completed.is_terminal());
    }

    #[test]
    fn format_amount_floors_to_sats() {
        assert_eq!(format_amount(999), "0");
        assert_eq!(format_amount(21_000), "21");
        assert_eq!(format_amount(1_234_567_000), "1,234,567");
    }
}

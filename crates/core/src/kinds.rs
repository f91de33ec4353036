//! The numeric kind space of the job protocol.
//!
//! These ranges are fixed protocol constants; changing them breaks
//! interoperability with every other participant on the network.

/// First kind of the job-request range (inclusive).
pub const REQUEST_KIND_MIN: u16 = 5000;
/// End of the job-request range (exclusive).
pub const REQUEST_KIND_MAX: u16 = 6000;
/// First kind of the job-result range (inclusive).
pub const RESULT_KIND_MIN: u16 = 6000;
/// End of the job-result range (exclusive).
pub const RESULT_KIND_MAX: u16 = 7000;
/// Kind of job feedback records.
pub const FEEDBACK_KIND: u16 = 7000;
/// Kind of service-provider self-announcements.
pub const PROVIDER_ANNOUNCEMENT_KIND: u16 = 31990;

/// Classification of a record kind within the job protocol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum KindClass {
    Request,
    Result,
    Feedback,
    ProviderAnnouncement,
    Other,
}

/// Whether `kind` is a job request.
pub fn is_request_kind(kind: u16) -> bool {
    (REQUEST_KIND_MIN..REQUEST_KIND_MAX).contains(&kind)
}

/// Whether `kind` is a job result.
pub fn is_result_kind(kind: u16) -> bool {
    (RESULT_KIND_MIN..RESULT_KIND_MAX).contains(&kind)
}

/// Whether `kind` is job feedback.
pub fn is_feedback_kind(kind: u16) -> bool {
    kind == FEEDBACK_KIND
}

/// Partition a kind into its protocol class.
pub fn classify(kind: u16) -> KindClass {
    if is_request_kind(kind) {
        KindClass::Request
    } else if is_result_kind(kind) {
        KindClass::Result
    } else if is_feedback_kind(kind) {
        KindClass::Feedback
    } else if kind == PROVIDER_ANNOUNCEMENT_KIND {
        KindClass::ProviderAnnouncement
    } else {
        KindClass::Other
    }
}

/// Conventional result kind for a request kind.
///
/// A hint only: correlation is by explicit reference tag, never by kind
/// arithmetic, and providers are not required to honor this mapping.
pub fn result_kind_for(request_kind: u16) -> u16 {
    request_kind + 1000
}

/// Human-facing description of a well-known job kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobKindInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Well-known job kinds in circulation on the network.
///
/// Non-exhaustive by nature; anything else in the request range is a
/// custom job.
pub const KNOWN_JOB_KINDS: &[(u16, JobKindInfo)] = &[
    (5000, JobKindInfo { name: "Text Extraction", description: "Extract text from various inputs" }),
    (5001, JobKindInfo { name: "Summarization", description: "Summarize text content" }),
    (5002, JobKindInfo { name: "Translation", description: "Translate text to different languages" }),
    (5050, JobKindInfo { name: "Text to Speech", description: "Convert text to audio" }),
    (5100, JobKindInfo { name: "Text Generation", description: "Generate text using AI" }),
    (5200, JobKindInfo { name: "Image Generation", description: "Generate images using AI" }),
    (5201, JobKindInfo { name: "Image Upscaling", description: "Upscale image resolution" }),
    (5202, JobKindInfo { name: "Image Manipulation", description: "Modify or edit images" }),
    (5250, JobKindInfo { name: "Video Generation", description: "Generate video content" }),
    (5300, JobKindInfo { name: "Discovery", description: "Discover content based on criteria" }),
    (5301, JobKindInfo { name: "Search", description: "Search for content" }),
    (5302, JobKindInfo { name: "People Discovery", description: "Find people/profiles" }),
    (5303, JobKindInfo { name: "Content Discovery", description: "Discover interesting content" }),
    (5400, JobKindInfo { name: "Timestamping", description: "Timestamp verification" }),
    (5500, JobKindInfo { name: "NIP-05", description: "NIP-05 verification service" }),
    (5900, JobKindInfo { name: "Generic", description: "Generic computation task" }),
    (5901, JobKindInfo { name: "Web Scraping", description: "Scrape web content" }),
    (5905, JobKindInfo { name: "Nostr Event Fetch", description: "Fetch Nostr events" }),
    (5970, JobKindInfo { name: "Lightning Invoice", description: "Generate Lightning invoices" }),
];

/// Name and description for a job kind, with a generic fallback for
/// custom kinds.
pub fn job_kind_info(kind: u16) -> (String, String) {
    KNOWN_JOB_KINDS
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, info)| (info.name.to_owned(), info.description.to_owned()))
        .unwrap_or_else(|| (format!("Kind {kind}"), "Custom job".to_owned()))
}

/// The well-known request kinds, for relay-side query filters.
pub fn known_request_kinds() -> Vec<u16> {
    KNOWN_JOB_KINDS.iter().map(|(k, _)| *k).collect()
}

/// The response kinds worth querying for: conventional results for every
/// well-known request kind, plus feedback.
pub fn known_response_kinds() -> Vec<u16> {
    let mut kinds: Vec<u16> = KNOWN_JOB_KINDS
        .iter()
        .map(|(k, _)| result_kind_for(*k))
        .collect();
    kinds.push(FEEDBACK_KIND);
    kinds
}

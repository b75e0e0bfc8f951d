/// Accept header content negotiation
use crate::types::{ContentType, Profile};

/// Outcome of negotiating an `Accept` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiated {
    pub content_type: ContentType,
    pub profile: Option<Profile>,
}

impl Negotiated {
    pub fn new(content_type: ContentType, profile: Option<Profile>) -> Self {
        Self { content_type, profile }
    }

    pub fn is_supported(&self) -> bool {
        self.content_type.is_supported()
    }

    /// JSON-LD with the given profile
    pub fn is_json_ld_with(&self, profile: Profile) -> bool {
        self.content_type == ContentType::LdJson && self.profile == Some(profile)
    }

    /// Value of the `Content-Type` response header for a JSON body
    pub fn header_value(&self, result_content_type: &str) -> String {
        match self.profile {
            Some(profile) if result_content_type == ContentType::LdJson.as_str() => {
                format!("{};profile={}", result_content_type, profile.as_str())
            }
            _ => result_content_type.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct MediaRange {
    media_type: String,
    profile: Option<String>,
    q: f32,
}

fn parse_media_range(raw: &str) -> Option<MediaRange> {
    let mut parts = raw.split(';');
    let media_type = parts.next()?.trim().to_ascii_lowercase();
    if media_type.is_empty() {
        return None;
    }

    let mut range = MediaRange {
        media_type,
        profile: None,
        q: 1.0,
    };

    for param in parts {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "q" => range.q = value.trim().parse().unwrap_or(1.0),
            "profile" => range.profile = Some(value.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }

    Some(range)
}

/// Media ranges ordered by preference. Equal weights keep header order and
/// ranges with `q=0` are dropped.
fn parse_accept(accept: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = accept
        .split(',')
        .filter_map(parse_media_range)
        .filter(|r| r.q > 0.0)
        .collect();
    ranges.sort_by(|a, b| b.q.partial_cmp(&a.q).unwrap_or(std::cmp::Ordering::Equal));
    ranges
}

/// Pick the representation for a request.
///
/// `resource_dereferencing` requests default to a bare JSON-LD body for `*/*`,
/// everything else defaults to the full resolution profile.
pub fn negotiate(accept: Option<&str>, resource_dereferencing: bool) -> Negotiated {
    let accept = accept.map(str::trim).unwrap_or_default();
    if accept.is_empty() {
        return Negotiated::new(ContentType::LdJson, None);
    }

    let ranges = parse_accept(accept);
    for range in &ranges {
        let content_type = ContentType::parse(&range.media_type);
        if content_type.is_supported() {
            let profile = range.profile.as_deref().and_then(Profile::parse);
            return Negotiated::new(content_type, profile);
        }

        if range.media_type == "*/*" {
            let profile = if resource_dereferencing {
                None
            } else {
                Some(Profile::DidResolution)
            };
            return Negotiated::new(ContentType::LdJson, profile);
        }
    }

    let rejected = ranges
        .first()
        .map(|r| r.media_type.clone())
        .unwrap_or_else(|| accept.to_string());
    Negotiated::new(ContentType::Unsupported(rejected), None)
}

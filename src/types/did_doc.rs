/// DID Document model as rendered by the resolver
use super::{TransformKeyType, DID_SCHEMA_JSONLD, LINKED_DOMAINS_JSONLD, LINKED_DOMAINS_SERVICE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDoc {
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub controller: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authentication: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub assertion_method: Vec<AssertionMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_invocation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub capability_delegation: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_agreement: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub method_type: String,
    pub controller: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(rename = "@context", default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: ServiceEndpoint,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipient_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routing_keys: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accept: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
}

/// Service endpoint rendered as a bare string when there is exactly one URL
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceEndpoint(pub Vec<String>);

impl ServiceEndpoint {
    pub fn first(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }
}

impl Serialize for ServiceEndpoint {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self.0.as_slice() {
            [single] => s.serialize_str(single),
            many => many.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for ServiceEndpoint {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            One(String),
            Many(Vec<String>),
        }

        Ok(match OneOrMany::deserialize(d)? {
            OneOrMany::One(url) => ServiceEndpoint(vec![url]),
            OneOrMany::Many(urls) => ServiceEndpoint(urls),
        })
    }
}

/// `assertionMethod` entries are either references or embedded methods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AssertionMethod {
    Reference(String),
    Embedded(Box<VerificationMethod>),
}

impl AssertionMethod {
    /// Ledger entries store embedded methods as JSON text
    pub fn from_ledger(value: &str) -> Option<Self> {
        if value.starts_with("did:") {
            return Some(AssertionMethod::Reference(value.to_string()));
        }

        // Either a JSON object, or a JSON string holding the escaped object
        let embedded = serde_json::from_str::<VerificationMethod>(value).ok().or_else(|| {
            serde_json::from_str::<String>(value)
                .ok()
                .and_then(|inner| serde_json::from_str::<VerificationMethod>(&inner).ok())
        })?;

        Some(AssertionMethod::Embedded(Box::new(embedded)))
    }
}

impl DidDoc {
    /// Add the DID context plus one suite context per key type and the
    /// well-known configuration context for linked-domain services
    pub fn add_json_ld_contexts(&mut self) {
        let mut contexts = vec![DID_SCHEMA_JSONLD.to_string()];

        for method in &self.verification_method {
            if let Some(key_type) = TransformKeyType::parse(&method.method_type) {
                push_unique(&mut contexts, key_type.json_ld_context());
            }
        }

        if self.service.iter().any(|s| s.service_type == LINKED_DOMAINS_SERVICE) {
            push_unique(&mut contexts, LINKED_DOMAINS_JSONLD);
        }

        for existing in std::mem::take(&mut self.context) {
            push_unique(&mut contexts, &existing);
        }

        self.context = contexts;
    }

    pub fn remove_context(&mut self) {
        self.context.clear();
    }

    /// Verification method or service whose id fragment equals `fragment`
    pub fn find_fragment(&self, fragment: &str) -> Option<Fragment> {
        if let Some(method) = self.verification_method.iter().find(|m| has_fragment(&m.id, fragment)) {
            return Some(Fragment::VerificationMethod(method.clone()));
        }

        self.service_by_name(fragment).map(|s| Fragment::Service(s.clone()))
    }

    /// Service whose id fragment equals `name`
    pub fn service_by_name(&self, name: &str) -> Option<&Service> {
        self.service.iter().find(|s| has_fragment(&s.id, name))
    }
}

fn has_fragment(id: &str, fragment: &str) -> bool {
    id.rsplit_once('#').map(|(_, f)| f == fragment).unwrap_or(false)
}

/// A dereferenced part of a DID document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Fragment {
    VerificationMethod(VerificationMethod),
    Service(Service),
}

impl Fragment {
    pub fn add_context(&mut self, context: &str) {
        let list = match self {
            Fragment::VerificationMethod(m) => &mut m.context,
            Fragment::Service(s) => &mut s.context,
        };
        push_unique(list, context);
    }

    pub fn remove_context(&mut self) {
        match self {
            Fragment::VerificationMethod(m) => m.context.clear(),
            Fragment::Service(s) => s.context.clear(),
        }
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ED25519_2020_JSONLD, JSON_WEB_KEY_2020_JSONLD};

    fn sample_doc() -> DidDoc {
        let did = "did:cheqd:testnet:c1685ca0-1f5b-439c-8eb8-5c0e85ab7cd0";
        DidDoc {
            id: did.to_string(),
            controller: vec![did.to_string()],
            verification_method: vec![
                VerificationMethod {
                    id: format!("{}#key-1", did),
                    method_type: "Ed25519VerificationKey2020".to_string(),
                    controller: did.to_string(),
                    public_key_multibase: Some("z6Mkk7ooKAEpGSZvPtBBkxHSrgfNnmnFZUYvishGXwPydmFh".to_string()),
                    ..Default::default()
                },
                VerificationMethod {
                    id: format!("{}#key-2", did),
                    method_type: "JsonWebKey2020".to_string(),
                    controller: did.to_string(),
                    public_key_jwk: Some(serde_json::json!({"crv": "Ed25519", "kty": "OKP", "x": "abc"})),
                    ..Default::default()
                },
            ],
            service: vec![Service {
                id: format!("{}#website", did),
                service_type: "LinkedDomains".to_string(),
                service_endpoint: ServiceEndpoint(vec!["https://www.cheqd.io".to_string()]),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_json_ld_contexts() {
        let mut doc = sample_doc();
        doc.add_json_ld_contexts();
        assert_eq!(
            doc.context,
            vec![
                DID_SCHEMA_JSONLD.to_string(),
                ED25519_2020_JSONLD.to_string(),
                JSON_WEB_KEY_2020_JSONLD.to_string(),
                LINKED_DOMAINS_JSONLD.to_string(),
            ]
        );

        // Idempotent
        doc.add_json_ld_contexts();
        assert_eq!(doc.context.len(), 4);

        doc.remove_context();
        assert!(serde_json::to_value(&doc).unwrap().get("@context").is_none());
    }

    #[test]
    fn test_service_endpoint_serialization() {
        let single = ServiceEndpoint(vec!["https://a.example".to_string()]);
        assert_eq!(serde_json::to_value(&single).unwrap(), serde_json::json!("https://a.example"));

        let many: ServiceEndpoint =
            serde_json::from_value(serde_json::json!(["https://a.example", "https://b.example"])).unwrap();
        assert_eq!(many.0.len(), 2);
        assert_eq!(
            serde_json::to_value(&many).unwrap(),
            serde_json::json!(["https://a.example", "https://b.example"])
        );
    }

    #[test]
    fn test_find_fragment_prefers_verification_method() {
        let doc = sample_doc();
        match doc.find_fragment("key-2") {
            Some(Fragment::VerificationMethod(m)) => assert!(m.id.ends_with("#key-2")),
            other => panic!("unexpected fragment: {:?}", other),
        }
        assert!(matches!(doc.find_fragment("website"), Some(Fragment::Service(_))));
        assert!(doc.find_fragment("missing").is_none());
    }

    #[test]
    fn test_find_fragment_does_not_match_prefix() {
        let mut doc = sample_doc();
        doc.verification_method[1].id = format!("{}#key-10", doc.id);

        match doc.find_fragment("key-1") {
            Some(Fragment::VerificationMethod(m)) => assert!(m.id.ends_with("#key-1")),
            other => panic!("unexpected fragment: {:?}", other),
        }
        doc.verification_method.remove(0);
        assert!(doc.find_fragment("key-1").is_none());
        assert!(doc.find_fragment("key").is_none());
    }

    #[test]
    fn test_service_by_name_matches_fragment_exactly() {
        let doc = sample_doc();
        assert!(doc.service_by_name("website").is_some());
        assert!(doc.service_by_name("web").is_none());
    }

    #[test]
    fn test_assertion_method_from_ledger() {
        let reference = AssertionMethod::from_ledger("did:cheqd:testnet:abc#key-1").unwrap();
        assert_eq!(reference, AssertionMethod::Reference("did:cheqd:testnet:abc#key-1".to_string()));

        let embedded = serde_json::json!({
            "id": "did:cheqd:testnet:abc#key-3",
            "type": "Ed25519VerificationKey2018",
            "controller": "did:cheqd:testnet:abc",
            "publicKeyBase58": "6fYkiuzNvu5THPLV5PKc1b7NyCWQ9bJa2rnLhfRxiYUK"
        })
        .to_string();
        let escaped = serde_json::to_string(&embedded).unwrap();

        assert!(matches!(AssertionMethod::from_ledger(&embedded), Some(AssertionMethod::Embedded(_))));
        assert!(matches!(AssertionMethod::from_ledger(&escaped), Some(AssertionMethod::Embedded(_))));
        assert!(AssertionMethod::from_ledger("garbage").is_none());
    }
}

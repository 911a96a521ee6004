//! Structured field extraction from OCR text of identity and lease documents.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static CPF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}\.?\d{3}\.?\d{3}-?\d{2}\b").unwrap());

static RG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,2}\.\d{3}\.\d{3}-?[0-9X]\b").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\d{2}\)\s*\d{4,5}-?\d{4}").unwrap());

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{5}-\d{3}\b").unwrap());

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:NOME|Nome|NAME|Name):[ \t]*([A-ZÁÉÍÓÚÂÊÔÃÕÇ][\p{L}]+(?:[ \t]+[\p{L}]+)*)",
    )
    .unwrap()
});

/// Fields recognised in a document. Empty lists are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Brazilian individual taxpayer ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cpf: Vec<String>,
    /// Identity card numbers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rg: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub postal_code: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<String>,
}

impl DocumentInfo {
    pub fn is_empty(&self) -> bool {
        self.cpf.is_empty()
            && self.rg.is_empty()
            && self.phone.is_empty()
            && self.email.is_empty()
            && self.postal_code.is_empty()
            && self.name.is_empty()
    }
}

fn find_all(re: &Regex, text: &str) -> Vec<String> {
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

pub fn extract_document_info(text: &str) -> DocumentInfo {
    DocumentInfo {
        cpf: find_all(&CPF_RE, text),
        rg: find_all(&RG_RE, text),
        phone: find_all(&PHONE_RE, text),
        email: find_all(&EMAIL_RE, text),
        postal_code: find_all(&POSTAL_CODE_RE, text),
        name: NAME_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .collect(),
    }
}

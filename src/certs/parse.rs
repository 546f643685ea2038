//! Tolerant parsing of OS trust bundles and serial-number selection.
//!
//! Real trust bundles carry comments, blank filler and the occasional legacy
//! certificate that a strict X.509 parser refuses (duplicate extensions,
//! extensions on a v1 certificate). Such entries are skipped one at a time;
//! the rest of the bundle still parses.

use std::collections::{BTreeMap, BTreeSet};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use x509_parser::parse_x509_certificate;
use x509_parser::x509::X509Version;

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";
const PEM_LINE_WIDTH: usize = 64;

/// A certificate that survived parsing, with its serial as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCertificate {
    pub serial: String,
    pub der: Vec<u8>,
}

impl ParsedCertificate {
    pub fn to_pem(&self) -> String {
        encode_pem(&self.der)
    }
}

/// A certificate ready to import under `alias`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub alias: String,
    /// PEM text.
    pub content: String,
}

/// Result of matching parsed certificates against requested serials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CertificateSelection {
    pub found: Vec<Certificate>,
    /// Requested aliases with no matching serial, sorted.
    pub missing: BTreeSet<String>,
}

/// Parse a PEM bundle or a concatenation of DER certificates.
///
/// Malformed entries are logged at debug level and skipped. Order of the
/// surviving certificates matches the input.
pub fn parse_certificates(bytes: &[u8]) -> Vec<ParsedCertificate> {
    let text = String::from_utf8_lossy(bytes);
    if text.contains(PEM_BEGIN) {
        parse_pem_bundle(&text)
    } else {
        parse_der_sequence(bytes)
    }
}

fn parse_pem_bundle(text: &str) -> Vec<ParsedCertificate> {
    let mut out = Vec::new();
    let mut body: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();
        match body.as_mut() {
            None if line == PEM_BEGIN => body = Some(String::new()),
            None => {}
            Some(_) if line == PEM_END => {
                let encoded = body.take().unwrap_or_default();
                match STANDARD.decode(encoded.as_bytes()) {
                    Ok(der) => push_if_valid(&mut out, der),
                    Err(e) => tracing::debug!("skipping certificate with invalid base64: {e}"),
                }
            }
            Some(b) => b.push_str(line),
        }
    }

    if body.is_some() {
        tracing::debug!("ignoring unterminated certificate block at end of bundle");
    }
    out
}

fn parse_der_sequence(bytes: &[u8]) -> Vec<ParsedCertificate> {
    let mut out = Vec::new();
    let mut rest = bytes;
    loop {
        rest = trim_ascii_start(rest);
        if rest.is_empty() {
            break;
        }
        let Some(len) = der_element_len(rest) else {
            tracing::debug!("stopping DER scan at unreadable element header");
            break;
        };
        if len > rest.len() {
            tracing::debug!("stopping DER scan at truncated element");
            break;
        }
        let (entry, tail) = rest.split_at(len);
        push_if_valid(&mut out, entry.to_vec());
        rest = tail;
    }
    out
}

fn push_if_valid(out: &mut Vec<ParsedCertificate>, der: Vec<u8>) {
    match certificate_serial(&der) {
        Ok(serial) => out.push(ParsedCertificate { serial, der }),
        Err(reason) => tracing::debug!("skipping malformed certificate: {reason}"),
    }
}

/// Decimal serial of a DER certificate, or why it was rejected.
fn certificate_serial(der: &[u8]) -> Result<String, String> {
    let (_, cert) = parse_x509_certificate(der).map_err(|e| e.to_string())?;
    cert.tbs_certificate
        .extensions_map()
        .map_err(|e| e.to_string())?;
    if cert.version() != X509Version::V3 && !cert.extensions().is_empty() {
        return Err(format!(
            "extensions present on a version {} certificate",
            cert.version().0 + 1
        ));
    }
    Ok(cert.tbs_certificate.serial.to_string())
}

/// Total encoded length (header + content) of the DER element at the start of `bytes`.
fn der_element_len(bytes: &[u8]) -> Option<usize> {
    let first_len = *bytes.get(1)?;
    if first_len & 0x80 == 0 {
        return Some(2 + first_len as usize);
    }
    let count = (first_len & 0x7f) as usize;
    // Zero means indefinite length, which DER forbids.
    if count == 0 || count > 4 {
        return None;
    }
    let len_bytes = bytes.get(2..2 + count)?;
    let content_len = len_bytes
        .iter()
        .fold(0usize, |acc, b| (acc << 8) | *b as usize);
    Some(2 + count + content_len)
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// PEM text for a DER certificate: 64-column base64 between the standard markers.
pub fn encode_pem(der: &[u8]) -> String {
    let encoded = STANDARD.encode(der);
    let mut pem = String::with_capacity(encoded.len() + encoded.len() / PEM_LINE_WIDTH + 64);
    pem.push_str(PEM_BEGIN);
    pem.push('\n');
    for chunk in encoded.as_bytes().chunks(PEM_LINE_WIDTH) {
        // base64 output is ASCII.
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(PEM_END);
    pem.push('\n');
    pem
}

/// Pick the certificates whose serial appears in `alias_by_serial`.
///
/// Each requested alias is emitted at most once, for its first match.
pub fn select_certificates(
    parsed: &[ParsedCertificate],
    alias_by_serial: &BTreeMap<String, String>,
) -> CertificateSelection {
    let mut found = Vec::new();
    let mut seen = BTreeSet::new();
    for cert in parsed {
        let Some(alias) = alias_by_serial.get(&cert.serial) else {
            continue;
        };
        if seen.insert(alias.clone()) {
            found.push(Certificate {
                alias: alias.clone(),
                content: cert.to_pem(),
            });
        }
    }
    let missing = alias_by_serial
        .values()
        .filter(|alias| !seen.contains(*alias))
        .cloned()
        .collect();
    CertificateSelection { found, missing }
}

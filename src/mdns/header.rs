//! DNS message header decoding.
//!
//! Only the fixed 12-byte header is read: the reflector needs the
//! query/response bit and uses the section counts for log summaries.
//! Record bodies are forwarded untouched.

use crate::mdns::consts::{
    DNS_FLAG_AUTHORITATIVE, DNS_FLAG_RESPONSE, DNS_FLAG_TRUNCATED, DNS_HEADER_LEN,
};

/// Whether an mDNS message asks or answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Query,
    Response,
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageKind::Query => write!(f, "query"),
            MessageKind::Response => write!(f, "response"),
        }
    }
}

/// Fixed header of a DNS/mDNS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    /// Transaction ID (zero for most mDNS traffic).
    pub transaction_id: u16,
    /// Raw flags field.
    pub flags: u16,
    /// Question count.
    pub qdcount: u16,
    /// Answer count.
    pub ancount: u16,
    /// Authority count.
    pub nscount: u16,
    /// Additional count.
    pub arcount: u16,
}

impl DnsHeader {
    /// Decode the header at the start of a UDP payload.
    ///
    /// Returns `None` when the payload is too short to hold a header.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DNS_HEADER_LEN {
            return None;
        }

        let word = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);

        Some(Self {
            transaction_id: word(0),
            flags: word(2),
            qdcount: word(4),
            ancount: word(6),
            nscount: word(8),
            arcount: word(10),
        })
    }

    /// Query or response, from the QR bit.
    pub fn kind(&self) -> MessageKind {
        if self.flags & DNS_FLAG_RESPONSE != 0 {
            MessageKind::Response
        } else {
            MessageKind::Query
        }
    }

    pub fn is_authoritative(&self) -> bool {
        self.flags & DNS_FLAG_AUTHORITATIVE != 0
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & DNS_FLAG_TRUNCATED != 0
    }

    /// Format the header as a short summary (similar to tcpdump).
    pub fn format_summary(&self) -> String {
        let mut parts = vec![self.kind().to_string()];

        if self.kind() == MessageKind::Response {
            let mut flags = Vec::new();
            if self.is_authoritative() {
                flags.push("authoritative");
            }
            if self.is_truncated() {
                flags.push("truncated");
            }
            if !flags.is_empty() {
                parts.push(format!("({})", flags.join(", ")));
            }
        }

        let mut counts = Vec::new();
        if self.qdcount > 0 {
            counts.push(format!("{}q", self.qdcount));
        }
        if self.ancount > 0 {
            counts.push(format!("{}an", self.ancount));
        }
        if self.nscount > 0 {
            counts.push(format!("{}ns", self.nscount));
        }
        if self.arcount > 0 {
            counts.push(format!("{}ar", self.arcount));
        }
        if !counts.is_empty() {
            parts.push(format!("[{}]", counts.join("/")));
        }

        parts.join(" ")
    }
}

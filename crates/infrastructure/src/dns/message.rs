//! DNS wire messages.
//!
//! Queries are built and responses parsed with `hickory-proto`; only the
//! parts a stub resolver needs are kept from a response.

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use hostres_domain::{DnsQueryType, StageError, StageErrorKind};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub fn to_record_type(query_type: DnsQueryType) -> RecordType {
    match query_type {
        DnsQueryType::Unspecified | DnsQueryType::A => RecordType::A,
        DnsQueryType::AAAA => RecordType::AAAA,
        DnsQueryType::TXT => RecordType::TXT,
        DnsQueryType::PTR => RecordType::PTR,
        DnsQueryType::SRV => RecordType::SRV,
        DnsQueryType::HTTPS => RecordType::HTTPS,
    }
}

/// Builds a recursive query for `name` and returns its id with the wire bytes.
pub fn build_query(name: &str, query_type: DnsQueryType) -> Result<(u16, Vec<u8>), StageError> {
    let fqdn = if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    };
    let name = Name::from_str(&fqdn).map_err(|e| {
        StageError::new(
            StageErrorKind::MalformedResponse,
            format!("invalid query name '{fqdn}': {e}"),
        )
    })?;

    let mut query = Query::new();
    query.set_name(name);
    query.set_query_type(to_record_type(query_type));
    query.set_query_class(DNSClass::IN);

    let id = fastrand::u16(..);
    let mut message = Message::new(id, MessageType::Query, OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(query);

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message.emit(&mut encoder).map_err(|e| {
        StageError::new(
            StageErrorKind::MalformedResponse,
            format!("failed to serialize query: {e}"),
        )
    })?;

    Ok((id, buf))
}

/// Reads the message id without parsing the rest of the packet.
pub fn response_id(bytes: &[u8]) -> Option<u16> {
    if bytes.len() < 12 {
        return None;
    }
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

#[derive(Debug, Clone)]
pub struct DnsAnswer {
    pub rcode: ResponseCode,
    pub addresses: Vec<IpAddr>,
    /// CNAME targets in answer order.
    pub aliases: Vec<Arc<str>>,
    pub min_ttl: Option<Duration>,
}

impl DnsAnswer {
    pub fn is_nxdomain(&self) -> bool {
        self.rcode == ResponseCode::NXDomain
    }

    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

pub fn parse_response(bytes: &[u8]) -> Result<DnsAnswer, StageError> {
    let message = Message::from_vec(bytes).map_err(|e| {
        StageError::new(
            StageErrorKind::MalformedResponse,
            format!("failed to parse DNS response: {e}"),
        )
    })?;

    let mut addresses = Vec::with_capacity(message.answers().len().min(8));
    let mut aliases: Vec<Arc<str>> = Vec::new();
    let mut min_ttl: Option<u32> = None;

    for record in message.answers() {
        let ttl = record.ttl();
        match record.data() {
            RData::A(a) => addresses.push(IpAddr::V4(a.0)),
            RData::AAAA(aaaa) => addresses.push(IpAddr::V6(aaaa.0)),
            RData::CNAME(canonical) => {
                let target = canonical.to_utf8();
                aliases.push(Arc::from(target.trim_end_matches('.')));
            }
            _ => continue,
        }
        min_ttl = Some(min_ttl.map_or(ttl, |current| current.min(ttl)));
    }

    let rcode = message.response_code();
    debug!(
        rcode = ?rcode,
        addresses = addresses.len(),
        aliases = aliases.len(),
        "DNS response parsed"
    );

    Ok(DnsAnswer {
        rcode,
        addresses,
        aliases,
        min_ttl: min_ttl.map(|secs| Duration::from_secs(u64::from(secs))),
    })
}

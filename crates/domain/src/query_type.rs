use std::fmt;
use std::str::FromStr;

/// Query type requested by a caller. `Unspecified` means "addresses of any
/// family" and lets the resolver narrow the set (e.g. when IPv6 is
/// unreachable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DnsQueryType {
    #[default]
    Unspecified,
    A,
    AAAA,
    TXT,
    PTR,
    SRV,
    HTTPS,
}

impl DnsQueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "UNSPECIFIED",
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::TXT => "TXT",
            Self::PTR => "PTR",
            Self::SRV => "SRV",
            Self::HTTPS => "HTTPS",
        }
    }

    /// The concrete query types this request type expands to.
    pub fn to_set(self) -> QueryTypeSet {
        match self {
            Self::Unspecified => QueryTypeSet::ADDRESS,
            other => QueryTypeSet::single(other),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Unspecified => 0,
            Self::A => 1 << 0,
            Self::AAAA => 1 << 1,
            Self::TXT => 1 << 2,
            Self::PTR => 1 << 3,
            Self::SRV => 1 << 4,
            Self::HTTPS => 1 << 5,
        }
    }
}

impl fmt::Display for DnsQueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DnsQueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UNSPECIFIED" | "ANY" => Ok(Self::Unspecified),
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::AAAA),
            "TXT" => Ok(Self::TXT),
            "PTR" => Ok(Self::PTR),
            "SRV" => Ok(Self::SRV),
            "HTTPS" => Ok(Self::HTTPS),
            other => Err(format!("Unknown query type: {other}")),
        }
    }
}

const CONCRETE_TYPES: [DnsQueryType; 6] = [
    DnsQueryType::A,
    DnsQueryType::AAAA,
    DnsQueryType::TXT,
    DnsQueryType::PTR,
    DnsQueryType::SRV,
    DnsQueryType::HTTPS,
];

/// Set of concrete query types (1 byte).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryTypeSet(u8);

impl QueryTypeSet {
    pub const EMPTY: Self = Self(0);
    pub const ADDRESS: Self = Self(0b11);

    pub fn single(query_type: DnsQueryType) -> Self {
        Self(query_type.bit())
    }

    pub fn contains(&self, query_type: DnsQueryType) -> bool {
        let bit = query_type.bit();
        bit != 0 && self.0 & bit == bit
    }

    pub fn insert(&mut self, query_type: DnsQueryType) {
        self.0 |= query_type.bit();
    }

    pub fn remove(&mut self, query_type: DnsQueryType) {
        self.0 &= !query_type.bit();
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn has_address_type(&self) -> bool {
        self.0 & Self::ADDRESS.0 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = DnsQueryType> {
        let set = *self;
        CONCRETE_TYPES.into_iter().filter(move |t| set.contains(*t))
    }
}

impl fmt::Debug for QueryTypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<DnsQueryType> for QueryTypeSet {
    fn from_iter<I: IntoIterator<Item = DnsQueryType>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for t in iter {
            set.insert(t);
        }
        set
    }
}

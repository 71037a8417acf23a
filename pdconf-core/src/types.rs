//! Section kinds, their schemas, and the typed records built from them.
//!
//! A [`Section`] keeps both the coerced [`Options`] (for listing and
//! diagnostics) and a typed [`SectionBody`] that the compiler reads.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::error::ValidationError;
use crate::schema::{instantiate, OptionSpec, Options};

// ---------------------------------------------------------------------------
// Schemas
// ---------------------------------------------------------------------------

const INTERFACE_SCHEMA: &[OptionSpec] = &[
    OptionSpec::string("ifname").required(),
    OptionSpec::string("proto"),
    OptionSpec::string("ipaddr"),
    OptionSpec::string("netmask"),
];

const DHCP_POOL_SCHEMA: &[OptionSpec] = &[
    OptionSpec::string("interface").required(),
    OptionSpec::string("leasetime"),
    OptionSpec::int("limit"),
    OptionSpec::int("start"),
    OptionSpec::list("dhcp_option").default_empty(),
    // "<local address>,<server address>[,<interface>]", see --dhcp-relay.
    OptionSpec::list("relay").default_empty(),
];

const DOMAIN_SCHEMA: &[OptionSpec] = &[OptionSpec::string("name"), OptionSpec::string("ip")];

const HOST_SCHEMA: &[OptionSpec] = &[
    OptionSpec::string("ip"),
    OptionSpec::string("mac"),
    OptionSpec::string("hostid"),
    OptionSpec::string("duid"),
    OptionSpec::string("name"),
    OptionSpec::string("tag"),
    OptionSpec::list("match_tag").default_empty(),
    OptionSpec::flag("dns", false),
    OptionSpec::flag("broadcast", false),
    OptionSpec::string("leasetime"),
    OptionSpec::string("instance"),
];

const DNSMASQ_SCHEMA: &[OptionSpec] = &[
    OptionSpec::flag("authoritative", true),
    OptionSpec::int("cachesize").default_int(150),
    OptionSpec::string("dhcp_boot"),
    OptionSpec::int("dhcpleasemax").default_int(1000),
    OptionSpec::string("domain"),
    OptionSpec::flag("enable_tftp", false),
    OptionSpec::flag("expandhosts", true),
    OptionSpec::list("interface"),
    OptionSpec::string("leasefile"),
    OptionSpec::flag("noresolv", false),
    OptionSpec::list("server"),
    OptionSpec::string("tftp_root"),
];

// ---------------------------------------------------------------------------
// SectionKind
// ---------------------------------------------------------------------------

/// Every section kind the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Interface,
    DhcpPool,
    DomainOverride,
    StaticHost,
    Dnsmasq,
}

impl SectionKind {
    pub fn all() -> &'static [SectionKind] {
        &[
            SectionKind::Interface,
            SectionKind::DhcpPool,
            SectionKind::DomainOverride,
            SectionKind::StaticHost,
            SectionKind::Dnsmasq,
        ]
    }

    /// Configuration file the section belongs to (`network`, `dhcp`).
    pub fn kind(&self) -> &'static str {
        match self {
            SectionKind::Interface => "network",
            _ => "dhcp",
        }
    }

    pub fn typename(&self) -> &'static str {
        match self {
            SectionKind::Interface => "interface",
            SectionKind::DhcpPool => "dhcp",
            SectionKind::DomainOverride => "domain",
            SectionKind::StaticHost => "host",
            SectionKind::Dnsmasq => "dnsmasq",
        }
    }

    pub fn from_pair(kind: &str, typename: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|k| k.kind() == kind && k.typename() == typename)
    }

    pub fn schema(&self) -> &'static [OptionSpec] {
        match self {
            SectionKind::Interface => INTERFACE_SCHEMA,
            SectionKind::DhcpPool => DHCP_POOL_SCHEMA,
            SectionKind::DomainOverride => DOMAIN_SCHEMA,
            SectionKind::StaticHost => HOST_SCHEMA,
            SectionKind::Dnsmasq => DNSMASQ_SCHEMA,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind(), self.typename())
    }
}

// ---------------------------------------------------------------------------
// SectionId
// ---------------------------------------------------------------------------

/// Identity of a section: its kind plus its declared name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId {
    pub kind: SectionKind,
    pub name: String,
}

impl SectionId {
    pub fn new(kind: SectionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    /// Filesystem-safe key, e.g. `dnsmasq-lan`.
    pub fn file_key(&self) -> String {
        format!("{}-{}", self.kind.typename(), self.name)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// `network.interface`: only the fields the DHCP compiler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    /// Physical device name, e.g. `eth0`.
    pub ifname: String,
    pub proto: Option<String>,
    pub ipaddr: Option<String>,
    pub netmask: Option<String>,
}

/// `dhcp.dhcp`: one interface's address pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpPool {
    pub interface: String,
    pub leasetime: Option<String>,
    pub limit: Option<i64>,
    pub start: Option<i64>,
    pub dhcp_option: Vec<String>,
    pub relay: Vec<String>,
}

impl DhcpPool {
    /// `(start, limit, leasetime)` when all three are configured.
    pub fn range(&self) -> Option<(i64, i64, &str)> {
        match (self.start, self.limit, self.leasetime.as_deref()) {
            (Some(start), Some(limit), Some(leasetime)) => Some((start, limit, leasetime)),
            _ => None,
        }
    }
}

/// `dhcp.domain`: a DNS override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOverride {
    pub name: Option<String>,
    pub ip: Option<String>,
}

/// `dhcp.host`: a static lease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticHost {
    pub ip: Option<String>,
    pub mac: Option<String>,
    pub hostid: Option<String>,
    pub duid: Option<String>,
    pub name: Option<String>,
    pub tag: Option<String>,
    pub match_tag: Vec<String>,
    pub dns: bool,
    pub broadcast: bool,
    pub leasetime: Option<String>,
    pub instance: Option<String>,
}

impl StaticHost {
    /// Value of the `dhcp-host=` directive: mac, name, ip, leasetime, each
    /// included only when set and non-empty.
    pub fn dnsmasq_value(&self) -> String {
        [&self.mac, &self.name, &self.ip, &self.leasetime]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// `dhcp.dnsmasq`: one daemon instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsmasqInstance {
    pub authoritative: bool,
    pub cachesize: i64,
    pub dhcp_boot: Option<String>,
    pub dhcpleasemax: i64,
    pub domain: Option<String>,
    pub enable_tftp: bool,
    pub expandhosts: bool,
    /// Explicit interface list; `None` means "every declared pool".
    pub interface: Option<Vec<String>>,
    pub leasefile: Option<String>,
    pub noresolv: bool,
    pub server: Option<Vec<String>>,
    pub tftp_root: Option<String>,
}

/// Typed payload of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Interface(NetworkInterface),
    DhcpPool(DhcpPool),
    DomainOverride(DomainOverride),
    StaticHost(StaticHost),
    Dnsmasq(DnsmasqInstance),
}

impl SectionBody {
    fn build(kind: SectionKind, o: &Options) -> Self {
        match kind {
            SectionKind::Interface => SectionBody::Interface(NetworkInterface {
                ifname: o.string("ifname").unwrap_or_default(),
                proto: o.string("proto"),
                ipaddr: o.string("ipaddr"),
                netmask: o.string("netmask"),
            }),
            SectionKind::DhcpPool => SectionBody::DhcpPool(DhcpPool {
                interface: o.string("interface").unwrap_or_default(),
                leasetime: o.string("leasetime"),
                limit: o.int("limit"),
                start: o.int("start"),
                dhcp_option: o.list("dhcp_option").unwrap_or_default(),
                relay: o.list("relay").unwrap_or_default(),
            }),
            SectionKind::DomainOverride => SectionBody::DomainOverride(DomainOverride {
                name: o.string("name"),
                ip: o.string("ip"),
            }),
            SectionKind::StaticHost => SectionBody::StaticHost(StaticHost {
                ip: o.string("ip"),
                mac: o.string("mac"),
                hostid: o.string("hostid"),
                duid: o.string("duid"),
                name: o.string("name"),
                tag: o.string("tag"),
                match_tag: o.list("match_tag").unwrap_or_default(),
                dns: o.flag("dns"),
                broadcast: o.flag("broadcast"),
                leasetime: o.string("leasetime"),
                instance: o.string("instance"),
            }),
            SectionKind::Dnsmasq => SectionBody::Dnsmasq(DnsmasqInstance {
                authoritative: o.flag("authoritative"),
                cachesize: o.int("cachesize").unwrap_or(150),
                dhcp_boot: o.string("dhcp_boot"),
                dhcpleasemax: o.int("dhcpleasemax").unwrap_or(1000),
                domain: o.string("domain"),
                enable_tftp: o.flag("enable_tftp"),
                expandhosts: o.flag("expandhosts"),
                interface: o.list("interface"),
                leasefile: o.string("leasefile"),
                noresolv: o.flag("noresolv"),
                server: o.list("server"),
                tftp_root: o.string("tftp_root"),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Section
// ---------------------------------------------------------------------------

/// A validated, typed configuration section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: SectionId,
    /// Where the section was declared (file path or other provenance).
    pub source: String,
    pub options: Options,
    pub body: SectionBody,
}

impl Section {
    /// Validate `raw` against the schema for `(kind, typename)`.
    pub fn new(
        kind: &str,
        typename: &str,
        name: impl Into<String>,
        source: impl Into<String>,
        raw: &Mapping,
    ) -> Result<Self, ValidationError> {
        let section_kind =
            SectionKind::from_pair(kind, typename).ok_or_else(|| ValidationError::UnknownSection {
                kind: kind.to_string(),
                typename: typename.to_string(),
            })?;
        let id = SectionId::new(section_kind, name);
        let options = instantiate(&id.to_string(), section_kind.schema(), raw)?;
        let body = SectionBody::build(section_kind, &options);
        Ok(Self {
            id,
            source: source.into(),
            options,
            body,
        })
    }

    pub fn kind(&self) -> SectionKind {
        self.id.kind
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn as_interface(&self) -> Option<&NetworkInterface> {
        match &self.body {
            SectionBody::Interface(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dhcp_pool(&self) -> Option<&DhcpPool> {
        match &self.body {
            SectionBody::DhcpPool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_domain(&self) -> Option<&DomainOverride> {
        match &self.body {
            SectionBody::DomainOverride(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_host(&self) -> Option<&StaticHost> {
        match &self.body {
            SectionBody::StaticHost(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_dnsmasq(&self) -> Option<&DnsmasqInstance> {
        match &self.body {
            SectionBody::Dnsmasq(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Recorded state
// ---------------------------------------------------------------------------

/// Paths produced by a dnsmasq apply and consumed by its revert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedPaths {
    pub config_file: PathBuf,
    pub lease_file: PathBuf,
    pub pid_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

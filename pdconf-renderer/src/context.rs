//! Serializable rendering payload for one dnsmasq instance.
//!
//! Scalar directives come straight from the [`DnsmasqInstance`]. Interface
//! blocks, domain overrides and static hosts are pushed by the compiler after
//! it has resolved them against the section index.

use std::path::Path;

use serde::{Deserialize, Serialize};

use pdconf_core::types::{DnsmasqInstance, DomainOverride, Section, StaticHost};

use crate::error::RenderError;

/// Flat rendering payload for `dnsmasq.conf.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsmasqContext {
    /// Provenance of the owning section.
    pub source: String,
    /// Display identity of the owning section.
    pub section: String,
    pub lease_file: String,
    pub authoritative: bool,
    pub cache_size: i64,
    pub dhcp_boot: Option<String>,
    pub lease_max: i64,
    pub domain: Option<String>,
    pub enable_tftp: bool,
    pub expand_hosts: bool,
    pub no_resolv: bool,
    pub tftp_root: Option<String>,
    /// Upstream DNS servers.
    pub servers: Vec<String>,
    pub interfaces: Vec<InterfaceCtx>,
    pub domains: Vec<DomainCtx>,
    /// Pre-joined `dhcp-host=` values.
    pub hosts: Vec<String>,
}

/// One served interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceCtx {
    /// Section identifier, e.g. `lan`.
    pub name: String,
    /// Physical device, e.g. `eth1`.
    pub ifname: String,
    pub range: Option<RangeCtx>,
    pub options: Vec<String>,
    pub relays: Vec<String>,
}

/// Fields of a `dhcp-range=` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeCtx {
    pub first: String,
    pub last: String,
    pub netmask: String,
    pub leasetime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainCtx {
    pub name: String,
    pub ip: String,
}

impl From<&DomainOverride> for DomainCtx {
    fn from(d: &DomainOverride) -> Self {
        Self {
            name: d.name.clone().unwrap_or_default(),
            ip: d.ip.clone().unwrap_or_default(),
        }
    }
}

impl DnsmasqContext {
    /// Build the scalar part of the context; interface, domain and host
    /// lists start empty.
    pub fn new(section: &Section, instance: &DnsmasqInstance, lease_file: &Path) -> Self {
        Self {
            source: section.source.clone(),
            section: section.to_string(),
            lease_file: lease_file.display().to_string(),
            authoritative: instance.authoritative,
            cache_size: instance.cachesize,
            dhcp_boot: instance.dhcp_boot.clone(),
            lease_max: instance.dhcpleasemax,
            domain: instance.domain.clone(),
            enable_tftp: instance.enable_tftp,
            expand_hosts: instance.expandhosts,
            no_resolv: instance.noresolv,
            tftp_root: instance.tftp_root.clone(),
            servers: instance.server.clone().unwrap_or_default(),
            interfaces: Vec::new(),
            domains: Vec::new(),
            hosts: Vec::new(),
        }
    }

    pub fn push_host(&mut self, host: &StaticHost) {
        self.hosts.push(host.dnsmasq_value());
    }

    pub fn push_domain(&mut self, domain: &DomainOverride) {
        self.domains.push(DomainCtx::from(domain));
    }

    /// Convert into a [`tera::Context`].
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}

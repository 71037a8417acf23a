//! dnsmasq compiler: the apply/revert pair for `dhcp.dnsmasq` sections.
//!
//! ## apply
//!
//! 1. Pick the served interfaces: the instance's explicit `interface` list,
//!    else the `interface` option of every declared pool.
//! 2. Resolve each interface and its pool, compute dhcp-ranges, and collect
//!    every domain override and static host (globally, not per interface).
//! 3. Render and write `dnsmasq-<name>.conf` under the write dir.
//! 4. Record config/lease/pid paths in memory and in the state store.
//! 5. Return one start action at [`PRIO_START_DAEMON`].
//!
//! Resolution happens before anything touches the filesystem: a
//! [`ReferenceError`](pdconf_core::ReferenceError) leaves no files behind and
//! yields no actions.
//!
//! ## revert
//!
//! Kill by pid file, then remove the lease and pid files, all at
//! `-PRIO_START_DAEMON`. The rendered config is left in place. Planning a
//! revert does not touch the apply record; [`DnsmasqCompiler::forget`]
//! drops it once the teardown has run.

use std::collections::HashMap;
use std::path::PathBuf;

use pdconf_core::{
    types::{DhcpPool, DnsmasqInstance, NetworkInterface, RecordedPaths, Section, SectionId, SectionKind},
    ReferenceError, SectionIndex,
};
use pdconf_renderer::{DnsmasqContext, InterfaceCtx, RangeCtx, Renderer};

use crate::action::{Action, PlannedAction, PRIO_START_DAEMON};
use crate::addr::{self, AddressError};
use crate::error::CompileError;
use crate::settings::CompilerSettings;
use crate::state::StateStore;
use crate::writer::{ensure_parent_dir, write_config};

pub struct DnsmasqCompiler {
    settings: CompilerSettings,
    renderer: Renderer,
    store: StateStore,
    recorded: HashMap<SectionId, RecordedPaths>,
}

impl DnsmasqCompiler {
    pub fn new(settings: CompilerSettings) -> Result<Self, CompileError> {
        let renderer = match &settings.template_dir {
            Some(dir) => Renderer::with_template_dir(dir)?,
            None => Renderer::new()?,
        };
        let store = StateStore::new(settings.state_dir());
        Ok(Self {
            settings,
            renderer,
            store,
            recorded: HashMap::new(),
        })
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Paths recorded by the last apply of `id` in this process.
    pub fn recorded(&self, id: &SectionId) -> Option<&RecordedPaths> {
        self.recorded.get(id)
    }

    /// True if `id` has an apply record in memory or in the state store.
    pub fn is_applied(&self, id: &SectionId) -> Result<bool, CompileError> {
        if self.recorded.contains_key(id) {
            return Ok(true);
        }
        Ok(self.store.load(id)?.is_some())
    }

    /// Output paths for `section`, before any are created.
    pub fn output_paths(&self, section: &Section, instance: &DnsmasqInstance) -> RecordedPaths {
        let name = section.name();
        let lease_file = match &instance.leasefile {
            Some(path) => PathBuf::from(path),
            None => self.settings.path(&format!("dnsmasq-{name}.leases")),
        };
        RecordedPaths {
            config_file: self.settings.path(&format!("dnsmasq-{name}.conf")),
            lease_file,
            pid_file: self.settings.path(&format!("dnsmasq-{name}.pid")),
        }
    }

    /// Render the configuration text without writing anything.
    pub fn render(&self, section: &Section, index: &SectionIndex) -> Result<String, CompileError> {
        let instance = dnsmasq_body(section)?;
        let paths = self.output_paths(section, instance);
        self.render_with(section, instance, index, &paths)
    }

    fn render_with(
        &self,
        section: &Section,
        instance: &DnsmasqInstance,
        index: &SectionIndex,
        paths: &RecordedPaths,
    ) -> Result<String, CompileError> {
        let ctx = build_context(section, instance, index, paths)?;
        Ok(self.renderer.render(&ctx)?)
    }

    pub fn apply(
        &mut self,
        section: &Section,
        index: &SectionIndex,
    ) -> Result<Vec<PlannedAction>, CompileError> {
        let instance = dnsmasq_body(section)?;
        let paths = self.output_paths(section, instance);
        let content = self.render_with(section, instance, index, &paths)?;

        ensure_parent_dir(&paths.lease_file)?;
        ensure_parent_dir(&paths.pid_file)?;
        write_config(&paths.config_file, &content)?;

        let argv = vec![
            self.settings.dnsmasq_bin.clone(),
            format!("--conf-file={}", paths.config_file.display()),
            format!("--pid-file={}", paths.pid_file.display()),
        ];
        let start = PlannedAction::new(PRIO_START_DAEMON, section.id.clone(), Action::Start { argv });

        self.store.save(&section.id, &paths)?;
        self.recorded.insert(section.id.clone(), paths);
        tracing::info!("applied {section}");
        Ok(vec![start])
    }

    /// Plan teardown of `section`. The apply record is kept until
    /// [`forget`](Self::forget) is called, so a failed or skipped teardown
    /// can be planned again.
    pub fn revert(
        &self,
        section: &Section,
        _index: &SectionIndex,
    ) -> Result<Vec<PlannedAction>, CompileError> {
        dnsmasq_body(section)?;
        let paths = match self.recorded.get(&section.id) {
            Some(paths) => paths.clone(),
            None => match self.store.load(&section.id)? {
                Some(record) => record.paths,
                None => {
                    return Err(CompileError::NotApplied {
                        section: section.to_string(),
                    })
                }
            },
        };

        let owner = &section.id;
        let prio = -PRIO_START_DAEMON;
        tracing::info!("planned revert of {section}");
        Ok(vec![
            PlannedAction::new(prio, owner.clone(), Action::KillPidFile { pid_file: paths.pid_file.clone() }),
            PlannedAction::new(prio, owner.clone(), Action::RemoveFile { path: paths.lease_file }),
            PlannedAction::new(prio, owner.clone(), Action::RemoveFile { path: paths.pid_file }),
        ])
    }

    /// Drop the apply record of `id` from memory and from the state store.
    /// Call once its teardown has run.
    pub fn forget(&mut self, id: &SectionId) -> Result<(), CompileError> {
        self.recorded.remove(id);
        self.store.remove(id)?;
        tracing::debug!("forgot apply record of {id}");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Context building
// ---------------------------------------------------------------------------

fn dnsmasq_body(section: &Section) -> Result<&DnsmasqInstance, CompileError> {
    section.as_dnsmasq().ok_or_else(|| CompileError::NotDnsmasq {
        section: section.to_string(),
    })
}

/// Interfaces this instance serves, in order.
pub fn effective_interfaces(instance: &DnsmasqInstance, index: &SectionIndex) -> Vec<String> {
    match &instance.interface {
        Some(list) => list.clone(),
        None => index
            .of_kind(SectionKind::DhcpPool)
            .into_iter()
            .filter_map(Section::as_dhcp_pool)
            .map(|pool| pool.interface.clone())
            .collect(),
    }
}

fn resolve<'a, T>(
    index: &'a SectionIndex,
    kind: SectionKind,
    name: &str,
    body: fn(&'a Section) -> Option<&'a T>,
) -> Result<&'a T, CompileError> {
    let section = index.expect_one(kind, name)?;
    body(section).ok_or_else(|| {
        CompileError::Reference(ReferenceError::NotFound {
            kind: kind.kind().to_string(),
            typename: kind.typename().to_string(),
            name: name.to_string(),
        })
    })
}

fn build_context(
    section: &Section,
    instance: &DnsmasqInstance,
    index: &SectionIndex,
    paths: &RecordedPaths,
) -> Result<DnsmasqContext, CompileError> {
    let mut ctx = DnsmasqContext::new(section, instance, &paths.lease_file);

    for name in effective_interfaces(instance, index) {
        let iface = resolve(index, SectionKind::Interface, &name, Section::as_interface)?;
        let pool = resolve(index, SectionKind::DhcpPool, &name, Section::as_dhcp_pool)?;
        let range = dhcp_range(iface, pool).map_err(|source| CompileError::Address {
            interface: name.clone(),
            source,
        })?;
        tracing::debug!("{section}: serving {name} on {}", iface.ifname);
        ctx.interfaces.push(InterfaceCtx {
            ifname: iface.ifname.clone(),
            name,
            range,
            options: pool.dhcp_option.clone(),
            relays: pool.relay.clone(),
        });
    }

    for domain in index.of_kind(SectionKind::DomainOverride) {
        if let Some(d) = domain.as_domain() {
            ctx.push_domain(d);
        }
    }
    for host in index.of_kind(SectionKind::StaticHost) {
        if let Some(h) = host.as_host() {
            ctx.push_host(h);
        }
    }
    Ok(ctx)
}

/// The `dhcp-range` for a pool, or `None` unless start, limit and leasetime
/// are all set.
pub fn dhcp_range(
    iface: &NetworkInterface,
    pool: &DhcpPool,
) -> Result<Option<RangeCtx>, AddressError> {
    let Some((start, limit, leasetime)) = pool.range() else {
        return Ok(None);
    };
    let ipaddr = iface.ipaddr.as_deref().ok_or(AddressError::Missing("ipaddr"))?;
    let netmask = iface.netmask.as_deref().ok_or(AddressError::Missing("netmask"))?;

    let network = addr::network_address(ipaddr, netmask)?;
    let first = addr::offset(network, start)?;
    let last = addr::offset(first, limit)?;
    Ok(Some(RangeCtx {
        first: first.to_string(),
        last: last.to_string(),
        netmask: netmask.to_string(),
        leasetime: leasetime.to_string(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Tera rendering engine for daemon configuration files.
//!
//! The dnsmasq template is embedded at compile time. A template directory may
//! supply a `dnsmasq.conf.tera` that replaces the embedded one.

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::DnsmasqContext;
use crate::error::RenderError;

/// Name under which the dnsmasq template is registered.
pub const DNSMASQ_TEMPLATE: &str = "dnsmasq.conf.tera";

const EMBEDDED: &str = include_str!("templates/dnsmasq.conf.tera");

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn build_tera(template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut content = EMBEDDED.to_string();
    if let Some(dir) = template_dir {
        let path = dir.join(DNSMASQ_TEMPLATE);
        if path.is_file() {
            content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_template(DNSMASQ_TEMPLATE, &content)?;
    Ok(tera)
}

/// Renders dnsmasq configuration text from a [`DnsmasqContext`].
///
/// Create once and reuse across sections.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Renderer backed by the embedded template.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera(None)? })
    }

    /// Renderer that prefers `<template_dir>/dnsmasq.conf.tera` when present.
    pub fn with_template_dir(template_dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { tera: build_tera(Some(template_dir))? })
    }

    pub fn render(&self, ctx: &DnsmasqContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        Ok(self.tera.render(DNSMASQ_TEMPLATE, &tera_ctx)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{InterfaceCtx, RangeCtx};
    use pdconf_core::Section;
    use serde_yaml::Mapping;
    use tempfile::TempDir;

    fn context(yaml: &str) -> DnsmasqContext {
        let raw: Mapping = serde_yaml::from_str(yaml).expect("mapping");
        let section = Section::new("dhcp", "dnsmasq", "main", "dhcp.yaml", &raw).expect("section");
        let instance = section.as_dnsmasq().expect("dnsmasq").clone();
        DnsmasqContext::new(&section, &instance, Path::new("/var/run/dnsmasq-main.leases"))
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn banner_and_fixed_block() {
        let out = Renderer::new().unwrap().render(&context("{}")).unwrap();
        let l = lines(&out);
        assert_eq!(l[0], "#".repeat(80));
        assert_eq!(l[1], "# dnsmasq configuration file generated by pdconf");
        assert_eq!(l[2], "# Source: dhcp.yaml");
        assert_eq!(l[3], "# Section: dhcp.dnsmasq:main");
        assert_eq!(l[4], "#".repeat(80));
        assert_eq!(l[5], "");
        assert_eq!(l[6], "dhcp-leasefile=/var/run/dnsmasq-main.leases");
        assert_eq!(
            &l[7..13],
            [
                "dhcp-authoritative",
                "cache-size=150",
                "dhcp-lease-max=1000",
                "expand-hosts",
                "",
                "except-interface=lo",
            ]
        );
        assert_eq!(l[13], "bind-interfaces");
    }

    #[test]
    fn every_scalar_directive_when_set() {
        let out = Renderer::new()
            .unwrap()
            .render(&context(
                "authoritative: false\ncachesize: 0\ndhcp_boot: pxelinux.0\ndhcpleasemax: 20\n\
                 domain: lan\nenable_tftp: true\nexpandhosts: false\nnoresolv: true\n\
                 tftp_root: /srv/tftp\nserver: [8.8.8.8, 1.1.1.1]",
            ))
            .unwrap();
        let l = lines(&out);
        assert_eq!(
            &l[7..17],
            [
                "cache-size=0",
                "dhcp-boot=pxelinux.0",
                "dhcp-lease-max=20",
                "domain=lan",
                "enable-tftp",
                "no-resolv",
                "tftp-root=/srv/tftp",
                "server=8.8.8.8",
                "server=1.1.1.1",
                "",
            ]
        );
        assert!(!out.contains("dhcp-authoritative"));
        assert!(!out.contains("expand-hosts"));
    }

    #[test]
    fn interface_block_with_range_options_and_relays() {
        let mut ctx = context("{}");
        ctx.interfaces.push(InterfaceCtx {
            name: "lan".into(),
            ifname: "eth1".into(),
            range: Some(RangeCtx {
                first: "192.168.1.10".into(),
                last: "192.168.1.15".into(),
                netmask: "255.255.255.0".into(),
                leasetime: "12h".into(),
            }),
            options: vec!["3,192.168.1.1".into()],
            relays: vec!["10.0.0.1,10.0.0.2".into(), "10.0.0.1,10.0.0.3".into()],
        });
        let out = Renderer::new().unwrap().render(&ctx).unwrap();
        let expected = "bind-interfaces\n\
             \n\
             # Options for section interface lan\n\
             interface=eth1\n\
             \n\
             # Options for section dhcp lan\n\
             dhcp-range=192.168.1.10,192.168.1.15,255.255.255.0,12h\n\
             dhcp-option=3,192.168.1.1\n\
             dhcp-relay=10.0.0.1,10.0.0.2\n\
             dhcp-relay=10.0.0.1,10.0.0.3\n\
             dhcp-proxy\n";
        assert!(out.contains(expected), "got:\n{out}");
        assert_eq!(out.matches("dhcp-proxy").count(), 1);
    }

    #[test]
    fn interface_without_range_or_relays() {
        let mut ctx = context("{}");
        ctx.interfaces.push(InterfaceCtx {
            name: "lan".into(),
            ifname: "eth1".into(),
            range: None,
            options: vec!["6,1.1.1.1".into()],
            relays: vec![],
        });
        let out = Renderer::new().unwrap().render(&ctx).unwrap();
        assert!(out.contains("# Options for section dhcp lan\ndhcp-option=6,1.1.1.1\n"));
        assert!(!out.contains("dhcp-range="));
        assert!(!out.contains("dhcp-proxy"));
    }

    #[test]
    fn whole_file_matches_golden_output() {
        let mut ctx = context("{}");
        ctx.interfaces.push(InterfaceCtx {
            name: "lan".into(),
            ifname: "eth1".into(),
            range: Some(RangeCtx {
                first: "192.168.1.10".into(),
                last: "192.168.1.15".into(),
                netmask: "255.255.255.0".into(),
                leasetime: "12h".into(),
            }),
            options: vec![],
            relays: vec![],
        });
        let out = Renderer::new().unwrap().render(&ctx).unwrap();

        let banner = "#".repeat(80);
        let expected = format!(
            "{banner}\n\
             # dnsmasq configuration file generated by pdconf\n\
             # Source: dhcp.yaml\n\
             # Section: dhcp.dnsmasq:main\n\
             {banner}\n\
             \n\
             dhcp-leasefile=/var/run/dnsmasq-main.leases\n\
             dhcp-authoritative\n\
             cache-size=150\n\
             dhcp-lease-max=1000\n\
             expand-hosts\n\
             \n\
             except-interface=lo\n\
             bind-interfaces\n\
             \n\
             # Options for section interface lan\n\
             interface=eth1\n\
             \n\
             # Options for section dhcp lan\n\
             dhcp-range=192.168.1.10,192.168.1.15,255.255.255.0,12h\n\
             \n\
             \n"
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn domains_then_hosts_after_interfaces() {
        let mut ctx = context("{}");
        ctx.domains.push(crate::context::DomainCtx {
            name: "router.lan".into(),
            ip: "192.168.1.1".into(),
        });
        ctx.hosts.push("AA:BB,10.0.0.5".into());
        ctx.hosts.push(String::new());
        let out = Renderer::new().unwrap().render(&ctx).unwrap();
        assert!(
            out.contains(
                "bind-interfaces\n\naddress=/router.lan/192.168.1.1\n\ndhcp-host=AA:BB,10.0.0.5\ndhcp-host="
            ),
            "got:\n{out}"
        );
    }

    #[test]
    fn template_dir_override_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(DNSMASQ_TEMPLATE), "leases {{ lease_file }}\n").unwrap();
        let out = Renderer::with_template_dir(dir.path())
            .unwrap()
            .render(&context("{}"))
            .unwrap();
        assert_eq!(out.trim_end(), "leases /var/run/dnsmasq-main.leases");
    }

    #[test]
    fn template_dir_without_override_uses_embedded() {
        let dir = TempDir::new().unwrap();
        let out = Renderer::with_template_dir(dir.path())
            .unwrap()
            .render(&context("{}"))
            .unwrap();
        assert!(out.starts_with(&"#".repeat(80)));
    }
}

//! End-to-end apply/revert tests for the dnsmasq compiler.

use std::path::Path;

use pdconf_compiler::{
    apply_all, commit_revert, revert_all, run_plan, Action, ActionError, CompileError,
    CompilerSettings, DnsmasqCompiler, Executor, StateStore, SystemExecutor, PRIO_START_DAEMON,
};
use pdconf_core::{loader, ReferenceError, SectionIndex, SectionKind};
use rstest::rstest;
use tempfile::TempDir;

const LAN: &str = r#"
- kind: network
  type: interface
  name: lan
  options:
    ifname: eth1
    ipaddr: 192.168.1.1
    netmask: 255.255.255.0
"#;

fn index(yaml: &str) -> SectionIndex {
    let sections = loader::parse_sections(yaml, Path::new("router.yaml")).expect("sections");
    SectionIndex::new(sections)
}

fn compiler(dir: &TempDir) -> DnsmasqCompiler {
    DnsmasqCompiler::new(CompilerSettings::new(dir.path())).expect("compiler")
}

fn render(yaml: &str) -> String {
    let dir = TempDir::new().unwrap();
    let index = index(yaml);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    compiler(&dir).render(section, &index).expect("render")
}

/// Runs removals for real but never signals a process.
struct NoSignal;

impl Executor for NoSignal {
    fn execute(&mut self, action: &Action) -> Result<(), ActionError> {
        match action {
            Action::KillPidFile { .. } | Action::Start { .. } => Ok(()),
            other => SystemExecutor.execute(other),
        }
    }
}

/// Like [`NoSignal`], but the kill step always fails.
struct KillFails;

impl Executor for KillFails {
    fn execute(&mut self, action: &Action) -> Result<(), ActionError> {
        match action {
            Action::KillPidFile { pid_file } => Err(ActionError::InvalidPid {
                path: pid_file.clone(),
                contents: String::new(),
            }),
            other => NoSignal.execute(other),
        }
    }
}

// ---------------------------------------------------------------------------
// 1. Scalar directives
// ---------------------------------------------------------------------------

#[rstest]
#[case("authoritative: true", "dhcp-authoritative", true)]
#[case("authoritative: false", "dhcp-authoritative", false)]
#[case("dhcp_boot: pxelinux.0", "dhcp-boot=pxelinux.0", true)]
#[case("", "dhcp-boot=", false)]
#[case("domain: home.lan", "domain=home.lan", true)]
#[case("", "domain=", false)]
#[case("enable_tftp: true", "enable-tftp", true)]
#[case("", "enable-tftp", false)]
#[case("expandhosts: false", "expand-hosts", false)]
#[case("", "expand-hosts", true)]
#[case("noresolv: '1'", "no-resolv", true)]
#[case("", "no-resolv", false)]
#[case("tftp_root: /srv/tftp", "tftp-root=/srv/tftp", true)]
#[case("", "tftp-root=", false)]
#[case("cachesize: 500", "cache-size=500", true)]
#[case("dhcpleasemax: 64", "dhcp-lease-max=64", true)]
fn scalar_directive_presence(#[case] options: &str, #[case] directive: &str, #[case] present: bool) {
    let yaml = format!("- kind: dhcp\n  type: dnsmasq\n  name: main\n  options: {{{options}}}\n");
    let out = render(&yaml);
    let count = out.lines().filter(|l| l.starts_with(directive)).count();
    assert_eq!(count, usize::from(present), "{directive} in:\n{out}");
}

// ---------------------------------------------------------------------------
// 2. Interface blocks
// ---------------------------------------------------------------------------

#[test]
fn range_directive_from_pool_offsets() {
    let out = render(&format!(
        "{LAN}
- kind: dhcp
  type: dhcp
  name: lan
  options: {{interface: lan, start: 10, limit: 5, leasetime: 12h}}
- kind: dhcp
  type: dnsmasq
  name: main
"
    ));
    assert!(out.contains("\ninterface=eth1\n"), "got:\n{out}");
    assert!(out.contains("\ndhcp-range=192.168.1.10,192.168.1.15,255.255.255.0,12h\n"));
}

#[rstest]
#[case("start: 10, limit: 5")]
#[case("start: 10, leasetime: 12h")]
#[case("limit: 5, leasetime: 12h")]
fn incomplete_pool_renders_options_without_range(#[case] partial: &str) {
    let out = render(&format!(
        "{LAN}
- kind: dhcp
  type: dhcp
  name: lan
  options: {{interface: lan, {partial}, dhcp_option: ['3,192.168.1.1'], relay: ['192.168.1.1,10.0.0.1']}}
- kind: dhcp
  type: dnsmasq
  name: main
"
    ));
    assert!(!out.contains("dhcp-range="), "got:\n{out}");
    assert!(out.contains("\ndhcp-option=3,192.168.1.1\n"));
    assert!(out.contains("\ndhcp-relay=192.168.1.1,10.0.0.1\ndhcp-proxy\n"));
}

#[test]
fn domains_and_hosts_are_global() {
    let out = render(&format!(
        "{LAN}
- kind: dhcp
  type: dhcp
  name: lan
  options: {{interface: lan}}
- kind: dhcp
  type: domain
  name: router
  options: {{name: router.lan, ip: 192.168.1.1}}
- kind: dhcp
  type: host
  name: nas
  options: {{mac: 'AA:BB', ip: 10.0.0.5}}
- kind: dhcp
  type: host
  name: empty
- kind: dhcp
  type: dnsmasq
  name: main
  options: {{interface: []}}
"
    ));
    assert!(!out.contains("interface=eth1"));
    assert!(out.contains("\naddress=/router.lan/192.168.1.1\n"));
    assert!(out.contains("\ndhcp-host=AA:BB,10.0.0.5\ndhcp-host="));
}

// ---------------------------------------------------------------------------
// 3. Reference errors
// ---------------------------------------------------------------------------

#[rstest]
#[case::no_pool("", "dhcp", None)]
#[case::two_pools(
    "- {kind: dhcp, type: dhcp, name: lan, options: {interface: lan}}\n- {kind: dhcp, type: dhcp, name: lan, options: {interface: lan}}\n",
    "dhcp",
    Some(2)
)]
#[case::two_interfaces(
    "- {kind: network, type: interface, name: lan, options: {ifname: eth2}}\n- {kind: dhcp, type: dhcp, name: lan, options: {interface: lan}}\n",
    "network",
    Some(2)
)]
fn references_must_resolve_exactly_once(
    #[case] extra: &str,
    #[case] expected_kind: &str,
    #[case] ambiguous: Option<usize>,
) {
    let dir = TempDir::new().unwrap();
    let index = index(&format!(
        "{LAN}{extra}- kind: dhcp\n  type: dnsmasq\n  name: main\n  options: {{interface: [lan]}}\n"
    ));
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = compiler(&dir);

    let err = compiler.apply(section, &index).unwrap_err();
    match err {
        CompileError::Reference(ReferenceError::Ambiguous { kind, count, .. }) => {
            assert_eq!(kind, expected_kind);
            assert_eq!(Some(count), ambiguous);
        }
        CompileError::Reference(ReferenceError::NotFound { kind, .. }) => {
            assert_eq!(kind, expected_kind);
            assert_eq!(ambiguous, None);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(compiler.recorded(&section.id).is_none());
    assert!(!dir.path().join("dnsmasq-main.conf").exists());

    let plan = apply_all(&mut compiler, &index);
    assert!(plan.actions.is_empty());
    assert_eq!(plan.failures.len(), 1);
}

#[test]
fn missing_interface_section_is_a_reference_error() {
    let dir = TempDir::new().unwrap();
    let index = index(
        "- {kind: dhcp, type: dhcp, name: guest, options: {interface: guest}}\n- {kind: dhcp, type: dnsmasq, name: main}\n",
    );
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let err = compiler(&dir).apply(section, &index).unwrap_err();
    assert!(matches!(err, CompileError::Reference(ReferenceError::NotFound { ref kind, .. }) if kind == "network"));
}

// ---------------------------------------------------------------------------
// 4. Lifecycle
// ---------------------------------------------------------------------------

const FULL: &str = r#"
- kind: network
  type: interface
  name: lan
  options: {ifname: eth1, ipaddr: 192.168.1.1, netmask: 255.255.255.0}
- kind: dhcp
  type: dhcp
  name: lan
  options: {interface: lan, start: 100, limit: 150, leasetime: 12h}
- kind: dhcp
  type: dnsmasq
  name: main
"#;

#[test]
fn apply_emits_single_start_action() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = DnsmasqCompiler::new(
        CompilerSettings::new(dir.path()).with_dnsmasq_bin("/usr/sbin/dnsmasq"),
    )
    .unwrap();

    let actions = compiler.apply(section, &index).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].priority, PRIO_START_DAEMON);
    assert_eq!(
        actions[0].action,
        Action::Start {
            argv: vec![
                "/usr/sbin/dnsmasq".to_string(),
                format!("--conf-file={}", dir.path().join("dnsmasq-main.conf").display()),
                format!("--pid-file={}", dir.path().join("dnsmasq-main.pid").display()),
            ]
        }
    );

    let recorded = compiler.recorded(&section.id).expect("recorded");
    assert_eq!(recorded.lease_file, dir.path().join("dnsmasq-main.leases"));
    let conf = std::fs::read_to_string(&recorded.config_file).unwrap();
    assert!(conf.contains(&format!("dhcp-leasefile={}", recorded.lease_file.display())));
    assert!(conf.contains("dhcp-range=192.168.1.100,192.168.1.250,255.255.255.0,12h"));
}

#[test]
fn revert_priorities_negate_apply() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = compiler(&dir);

    let applied = compiler.apply(section, &index).unwrap();
    let reverted = compiler.revert(section, &index).unwrap();
    assert_eq!(reverted.len(), 3);
    for action in &reverted {
        assert_eq!(action.priority, -applied[0].priority);
        assert_eq!(action.owner, section.id);
    }
    assert!(matches!(reverted[0].action, Action::KillPidFile { .. }));
}

#[test]
fn revert_removes_lease_and_pid_but_keeps_config() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = compiler(&dir);

    compiler.apply(section, &index).unwrap();
    let paths = compiler.recorded(&section.id).cloned().expect("recorded");
    std::fs::write(&paths.lease_file, "1700000000 aa:bb 192.168.1.100 nas *\n").unwrap();
    std::fs::write(&paths.pid_file, "4242\n").unwrap();

    let plan = compiler.revert(section, &index).unwrap();
    let report = run_plan(&plan, &mut NoSignal);
    assert!(report.is_success());

    assert!(!paths.lease_file.exists());
    assert!(!paths.pid_file.exists());
    assert!(paths.config_file.exists());

    // Idempotent: a second teardown of already-absent files still succeeds.
    assert!(run_plan(&plan, &mut NoSignal).is_success());
}

#[test]
fn revert_before_apply_is_rejected() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let err = compiler(&dir).revert(section, &index).unwrap_err();
    assert!(matches!(err, CompileError::NotApplied { .. }));
}

#[test]
fn revert_survives_restart_via_state_store() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];

    compiler(&dir).apply(section, &index).unwrap();

    let mut fresh = compiler(&dir);
    assert!(fresh.is_applied(&section.id).unwrap());
    let plan = fresh.revert(section, &index).unwrap();
    assert_eq!(plan.len(), 3);
    assert!(fresh.is_applied(&section.id).unwrap());

    fresh.forget(&section.id).unwrap();
    assert!(!fresh.is_applied(&section.id).unwrap());
    assert!(matches!(
        fresh.revert(section, &index),
        Err(CompileError::NotApplied { .. })
    ));
}

#[test]
fn planning_a_revert_keeps_the_apply_record() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = compiler(&dir);
    compiler.apply(section, &index).unwrap();

    let store = StateStore::new(compiler.settings().state_dir());
    let first = compiler.revert(section, &index).unwrap();
    assert!(store.load(&section.id).unwrap().is_some());
    assert!(compiler.recorded(&section.id).is_some());

    // A second plan, e.g. a dry run followed by the real teardown, is identical.
    let second = compiler.revert(section, &index).unwrap();
    assert_eq!(first, second);

    let plan = revert_all(&mut compiler, &index);
    let report = run_plan(&plan.actions, &mut NoSignal);
    let forgotten = commit_revert(&mut compiler, &plan, &report).unwrap();
    assert_eq!(forgotten, [section.id.clone()]);
    assert!(store.load(&section.id).unwrap().is_none());
    assert!(compiler.recorded(&section.id).is_none());
}

#[test]
fn failed_teardown_can_be_retried() {
    let dir = TempDir::new().unwrap();
    let index = index(FULL);
    let section = index.of_kind(SectionKind::Dnsmasq)[0];
    let mut compiler = compiler(&dir);
    compiler.apply(section, &index).unwrap();
    let lease_file = compiler.recorded(&section.id).unwrap().lease_file.clone();
    std::fs::write(&lease_file, "").unwrap();

    let plan = revert_all(&mut compiler, &index);
    let report = run_plan(&plan.actions, &mut KillFails);
    assert_eq!(report.failures.len(), 1);
    assert!(commit_revert(&mut compiler, &plan, &report).unwrap().is_empty());
    assert!(compiler.is_applied(&section.id).unwrap());

    // The section is still revertible, also from a fresh process.
    let mut restarted = DnsmasqCompiler::new(CompilerSettings::new(dir.path())).unwrap();
    let retry = revert_all(&mut restarted, &index);
    assert_eq!(retry.actions, plan.actions);

    let report = run_plan(&retry.actions, &mut NoSignal);
    assert!(report.is_success());
    commit_revert(&mut restarted, &retry, &report).unwrap();
    assert!(!restarted.is_applied(&section.id).unwrap());
    assert!(revert_all(&mut restarted, &index).actions.is_empty());
    assert!(!lease_file.exists());
}

#[test]
fn pipeline_isolates_broken_sections() {
    let dir = TempDir::new().unwrap();
    let index = index(&format!(
        "{FULL}- {{kind: dhcp, type: dnsmasq, name: broken, options: {{interface: [wan]}}}}\n"
    ));
    let mut compiler = compiler(&dir);

    let plan = apply_all(&mut compiler, &index);
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.failures.len(), 1);
    assert_eq!(plan.failures[0].0.name, "broken");

    let teardown = revert_all(&mut compiler, &index);
    assert!(teardown.is_success());
    assert_eq!(teardown.actions.len(), 3);
    assert!(teardown.actions.iter().all(|a| a.owner.name == "main"));
}

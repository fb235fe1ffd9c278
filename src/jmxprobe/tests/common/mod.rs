//! Hand-written capability fakes shared by the integration tests.
#![allow(dead_code)]

use anyhow::{anyhow, bail, Result};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use jmxprobe::config::Config;
use jmxprobe::mbeans::{AttributeValue, ManagementConnection, ManagementConnector, ObjectName};
use jmxprobe::output::Pacer;
use jmxprobe::process::{AttachedProcess, MonitoredProcess, ProcessSource, Properties, SelfMarker};

pub const AGENT_ADDRESS: &str = "http://127.0.0.1:8778/jolokia";

#[derive(Clone, Debug, Default)]
pub struct FakeJvm {
    pub pid: u32,
    pub command_line: Option<String>,
    pub address: Option<String>,
    /// Published when the agent gets loaded.
    pub address_after_load: Option<String>,
    pub java_home: Option<String>,
}

impl FakeJvm {
    pub fn new(pid: u32, command_line: &str) -> Self {
        Self {
            pid,
            command_line: Some(command_line.to_string()),
            ..Default::default()
        }
    }

    pub fn listening(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    pub fn activatable(mut self, java_home: &Path, address: &str) -> Self {
        self.java_home = Some(java_home.to_string_lossy().to_string());
        self.address_after_load = Some(address.to_string());
        self
    }
}

/// Counts attach sessions, so tests can check every one was closed.
#[derive(Default)]
pub struct Sessions {
    pub opened: Cell<usize>,
    pub closed: Cell<usize>,
    pub loaded: RefCell<Vec<(u32, PathBuf, String)>>,
}

#[derive(Default)]
pub struct FakeSource {
    pub jvms: Vec<FakeJvm>,
    /// Pid that behaves like this very process.
    pub self_pid: Option<u32>,
    pub sessions: Rc<Sessions>,
    marker: Rc<RefCell<Option<SelfMarker>>>,
    agents_loaded: Rc<RefCell<BTreeMap<u32, String>>>,
}

impl FakeSource {
    pub fn new(jvms: Vec<FakeJvm>) -> Self {
        Self {
            jvms,
            ..Default::default()
        }
    }

    fn jvm(&self, pid: u32) -> Result<&FakeJvm> {
        self.jvms
            .iter()
            .find(|jvm| jvm.pid == pid)
            .ok_or_else(|| anyhow!("No such process: {}", pid))
    }
}

impl ProcessSource for FakeSource {
    fn monitored_pids(&self) -> Result<Vec<u32>> {
        Ok(self
            .jvms
            .iter()
            .filter(|jvm| jvm.command_line.is_some())
            .map(|jvm| jvm.pid)
            .collect())
    }

    fn probe(&self, pid: u32) -> Result<MonitoredProcess> {
        let jvm = self.jvm(pid)?;
        Ok(MonitoredProcess {
            pid,
            command_line: jvm.command_line.clone(),
            address: jvm.address.clone(),
        })
    }

    fn attachable_pids(&self) -> Result<Vec<u32>> {
        Ok(self.jvms.iter().map(|jvm| jvm.pid).collect())
    }

    fn attach(&self, pid: u32) -> Result<Box<dyn AttachedProcess>> {
        let jvm = self.jvm(pid)?.clone();
        self.sessions.opened.set(self.sessions.opened.get() + 1);
        Ok(Box::new(FakeAttached {
            jvm,
            is_self: self.self_pid == Some(pid),
            marker: self.marker.clone(),
            agents_loaded: self.agents_loaded.clone(),
            sessions: self.sessions.clone(),
        }))
    }

    fn plant_marker(&self, marker: &SelfMarker) {
        *self.marker.borrow_mut() = Some(marker.clone());
    }

    fn clear_marker(&self) {
        self.marker.borrow_mut().take();
    }
}

struct FakeAttached {
    jvm: FakeJvm,
    is_self: bool,
    marker: Rc<RefCell<Option<SelfMarker>>>,
    agents_loaded: Rc<RefCell<BTreeMap<u32, String>>>,
    sessions: Rc<Sessions>,
}

impl AttachedProcess for FakeAttached {
    fn pid(&self) -> u32 {
        self.jvm.pid
    }

    fn system_properties(&self) -> Result<Properties> {
        let mut properties = Properties::new();
        properties.insert("java.vm.name".into(), "OpenJDK 64-Bit Server VM".into());
        if let Some(home) = &self.jvm.java_home {
            properties.insert("java.home".into(), home.clone());
        }
        if self.is_self {
            if let Some(marker) = self.marker.borrow().as_ref() {
                properties.insert(marker.property.clone(), marker.token.clone());
            }
        }
        Ok(properties)
    }

    fn agent_properties(&self) -> Result<Properties> {
        let mut properties = Properties::new();
        if let Some(address) = self.agents_loaded.borrow().get(&self.jvm.pid) {
            properties.insert(
                "com.sun.management.jmxremote.localConnectorAddress".into(),
                address.clone(),
            );
        }
        Ok(properties)
    }

    fn load_agent(&self, bundle: &Path, options: &str) -> Result<()> {
        let Some(address) = &self.jvm.address_after_load else {
            bail!("agent load failed: 102");
        };
        self.sessions
            .loaded
            .borrow_mut()
            .push((self.jvm.pid, bundle.to_path_buf(), options.to_string()));
        self.agents_loaded
            .borrow_mut()
            .insert(self.jvm.pid, address.clone());
        Ok(())
    }
}

impl Drop for FakeAttached {
    fn drop(&mut self) {
        self.sessions.closed.set(self.sessions.closed.get() + 1);
    }
}

pub type FakeBeans = BTreeMap<ObjectName, BTreeMap<String, Option<AttributeValue>>>;

/// Builds bean contents; a `None` value is an attribute whose read fails.
pub fn beans(entries: &[(&str, &[(&str, Option<AttributeValue>)])]) -> FakeBeans {
    entries
        .iter()
        .map(|(name, attributes)| {
            (
                name.parse().unwrap(),
                attributes
                    .iter()
                    .map(|(attribute, value)| (attribute.to_string(), value.clone()))
                    .collect(),
            )
        })
        .collect()
}

#[derive(Default)]
pub struct Connections {
    pub addresses: RefCell<Vec<String>>,
    pub closed: Cell<usize>,
    pub reads: Cell<usize>,
}

#[derive(Default)]
pub struct FakeConnector {
    pub beans: FakeBeans,
    pub connections: Rc<Connections>,
}

impl FakeConnector {
    pub fn new(beans: FakeBeans) -> Self {
        Self {
            beans,
            ..Default::default()
        }
    }
}

impl ManagementConnector for FakeConnector {
    fn connect(&self, address: &str) -> Result<Box<dyn ManagementConnection>> {
        if !self.supports(address) {
            bail!("unsupported connector address {}", address);
        }
        self.connections.addresses.borrow_mut().push(address.to_string());
        Ok(Box::new(FakeConnection {
            beans: self.beans.clone(),
            connections: self.connections.clone(),
        }))
    }

    fn supports(&self, address: &str) -> bool {
        address.starts_with("http")
    }
}

struct FakeConnection {
    beans: FakeBeans,
    connections: Rc<Connections>,
}

impl ManagementConnection for FakeConnection {
    fn query_names(&self) -> Result<Vec<ObjectName>> {
        // reversed, the catalog has to sort them
        Ok(self.beans.keys().rev().cloned().collect())
    }

    fn attribute_names(&self, bean: &ObjectName) -> Result<Vec<String>> {
        self.beans
            .get(bean)
            .map(|attributes| attributes.keys().cloned().collect())
            .ok_or_else(|| anyhow!("InstanceNotFoundException: {}", bean))
    }

    fn read_attribute(&self, bean: &ObjectName, attribute: &str) -> Result<AttributeValue> {
        self.connections.reads.set(self.connections.reads.get() + 1);
        self.beans
            .get(bean)
            .and_then(|attributes| attributes.get(attribute))
            .cloned()
            .flatten()
            .ok_or_else(|| anyhow!("RuntimeMBeanException reading {}", attribute))
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        self.connections.closed.set(self.connections.closed.get() + 1);
    }
}

/// Fixed clock; lets `passes` passes run, then asks the loop to stop.
pub struct FakePacer {
    pub now: i64,
    pub passes: usize,
    pub pauses: Cell<usize>,
}

impl FakePacer {
    pub fn new(now: i64, passes: usize) -> Self {
        Self {
            now,
            passes,
            pauses: Cell::new(0),
        }
    }
}

impl Pacer for FakePacer {
    fn now(&self) -> i64 {
        self.now
    }

    fn pause(&self, _interval: Duration) -> bool {
        self.pauses.set(self.pauses.get() + 1);
        self.pauses.get() < self.passes
    }
}

pub fn config() -> Config {
    Config::default()
}

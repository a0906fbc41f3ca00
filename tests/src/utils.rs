//! A scripted lab: every device answers show commands with canned IOS text.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use topomap_common::command::ShowCommand;
use topomap_common::config::{Credentials, SeedDevice};
use topomap_common::error::ExecError;
use topomap_common::ports::{CommandExecutor, DeviceSession, DeviceTarget};

/// One adjacency as the reporting device sees it.
#[derive(Debug, Clone)]
pub struct Neighbor {
    pub name: String,
    pub address: Option<String>,
    pub platform: String,
    pub local: String,
    pub remote: String,
}

pub fn neighbor(name: &str, address: &str, local: &str, remote: &str) -> Neighbor {
    Neighbor {
        name: name.to_string(),
        address: Some(address.to_string()),
        platform: "cisco WS-C2960X-48FPD-L".to_string(),
        local: local.to_string(),
        remote: remote.to_string(),
    }
}

impl Neighbor {
    pub fn without_address(mut self) -> Self {
        self.address = None;
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct DeviceScript {
    hostname: String,
    model: String,
    address: String,
    cdp: Vec<Neighbor>,
    lldp: Vec<Neighbor>,
    overrides: HashMap<ShowCommand, Result<String, ExecError>>,
}

impl DeviceScript {
    pub fn new(hostname: &str, model: &str, address: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            model: model.to_string(),
            address: address.to_string(),
            cdp: Vec::new(),
            lldp: Vec::new(),
            overrides: HashMap::new(),
        }
    }

    pub fn cdp(mut self, neighbor: Neighbor) -> Self {
        self.cdp.push(neighbor);
        self
    }

    pub fn lldp(mut self, neighbor: Neighbor) -> Self {
        self.lldp.push(neighbor);
        self
    }

    /// Replaces the canned answer for one command.
    pub fn answer(mut self, command: ShowCommand, result: Result<String, ExecError>) -> Self {
        self.overrides.insert(command, result);
        self
    }

    fn output(&self, command: ShowCommand) -> Result<String, ExecError> {
        if let Some(result) = self.overrides.get(&command) {
            return result.clone();
        }
        Ok(match command {
            ShowCommand::Version => self.version(),
            ShowCommand::CdpNeighbors => self.cdp.iter().map(cdp_block).collect(),
            ShowCommand::LldpNeighbors => self.lldp.iter().map(lldp_block).collect(),
            ShowCommand::Interfaces => self.interfaces(),
            ShowCommand::IpInterfaceBrief => self.brief(),
        })
    }

    fn version(&self) -> String {
        format!(
            "Cisco IOS Software, C2960X Software (C2960X-UNIVERSALK9-M), Version 15.2(7)E3, RELEASE SOFTWARE (fc3)\n\
             Technical Support: http://www.cisco.com/techsupport\n\
             \n\
             {} uptime is 2 weeks, 3 days, 4 hours, 12 minutes\n\
             \n\
             cisco {} (APM86XXX) processor (revision A0) with 524288K bytes of memory.\n\
             Processor board ID FOC1932X0AB\n",
            self.hostname, self.model
        )
    }

    fn interfaces(&self) -> String {
        let mut text = String::from("Vlan1 is up, line protocol is up\n  Hardware is EtherSVI\n");
        for port in self.cdp.iter().chain(&self.lldp) {
            text.push_str(&format!(
                "{} is up, line protocol is up\n  Description: to {}\n",
                port.local, port.name
            ));
        }
        text
    }

    fn brief(&self) -> String {
        format!(
            "Interface              IP-Address      OK? Method Status                Protocol\n\
             Vlan1                  {}        YES NVRAM  up                    up\n",
            self.address
        )
    }
}

fn cdp_block(neighbor: &Neighbor) -> String {
    let address = neighbor
        .address
        .as_deref()
        .map(|ip| format!("Entry address(es): \n  IP address: {ip}\n"))
        .unwrap_or_default();
    format!(
        "-------------------------\n\
         Device ID: {}\n\
         {address}\
         Platform: {},  Capabilities: Switch IGMP \n\
         Interface: {},  Port ID (outgoing port): {}\n\
         Holdtime : 141 sec\n",
        neighbor.name, neighbor.platform, neighbor.local, neighbor.remote
    )
}

fn lldp_block(neighbor: &Neighbor) -> String {
    let address = neighbor
        .address
        .as_deref()
        .map(|ip| format!("Management Addresses:\n    IP: {ip}\n"))
        .unwrap_or_default();
    format!(
        "------------------------------------------------\n\
         Local Intf: {}\n\
         Chassis id: 0011.2233.4455\n\
         Port id: {}\n\
         System Name: {}\n\
         \n\
         System Capabilities: B,R\n\
         Enabled Capabilities: B\n\
         {address}\n",
        neighbor.local, neighbor.remote, neighbor.name
    )
}

/// [`CommandExecutor`] answering from [`DeviceScript`]s keyed by dial address.
/// Addresses without a script refuse the connection.
#[derive(Clone, Default)]
pub struct ScriptedLab {
    devices: HashMap<String, DeviceScript>,
    open_errors: HashMap<String, ExecError>,
    opened: Arc<Mutex<Vec<String>>>,
    logins: Arc<Mutex<Vec<String>>>,
    stop_after: Option<(usize, Arc<AtomicBool>)>,
    open_count: Arc<AtomicUsize>,
}

impl ScriptedLab {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device(mut self, address: &str, script: DeviceScript) -> Self {
        self.devices.insert(address.to_string(), script);
        self
    }

    pub fn failing(mut self, address: &str, error: ExecError) -> Self {
        self.open_errors.insert(address.to_string(), error);
        self
    }

    /// Raises `stop` once `sessions` sessions have been opened.
    pub fn stop_after(mut self, sessions: usize, stop: Arc<AtomicBool>) -> Self {
        self.stop_after = Some((sessions, stop));
        self
    }

    /// Every address the engine tried to open, in order.
    pub fn opened(&self) -> Arc<Mutex<Vec<String>>> {
        self.opened.clone()
    }

    /// The username of every session attempt, in order.
    pub fn logins(&self) -> Arc<Mutex<Vec<String>>> {
        self.logins.clone()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedLab {
    async fn open(&self, target: &DeviceTarget) -> Result<Box<dyn DeviceSession>, ExecError> {
        self.opened
            .lock()
            .expect("opened log poisoned")
            .push(target.address.clone());
        self.logins
            .lock()
            .expect("login log poisoned")
            .push(target.credentials.username.clone());

        let count = self.open_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, stop)) = &self.stop_after {
            if count >= *limit {
                stop.store(true, Ordering::SeqCst);
            }
        }

        if let Some(err) = self.open_errors.get(&target.address) {
            return Err(err.clone());
        }
        match self.devices.get(&target.address) {
            Some(script) => Ok(Box::new(ScriptedSession {
                script: script.clone(),
            })),
            None => Err(ExecError::Connection {
                address: target.address.clone(),
                reason: "connection refused".into(),
            }),
        }
    }
}

struct ScriptedSession {
    script: DeviceScript,
}

#[async_trait]
impl DeviceSession for ScriptedSession {
    async fn execute(&mut self, command: ShowCommand) -> Result<String, ExecError> {
        self.script.output(command)
    }
}

pub fn seed(address: &str) -> SeedDevice {
    SeedDevice::new(address, Credentials::new("admin").with_password("lab"))
}

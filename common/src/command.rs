use std::fmt;

/// A show-command family issued against every visited device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShowCommand {
    Version,
    CdpNeighbors,
    LldpNeighbors,
    Interfaces,
    IpInterfaceBrief,
}

impl ShowCommand {
    /// Commands run during a visit, in execution order.
    pub const DISCOVERY_SET: [ShowCommand; 5] = [
        ShowCommand::Version,
        ShowCommand::CdpNeighbors,
        ShowCommand::LldpNeighbors,
        ShowCommand::Interfaces,
        ShowCommand::IpInterfaceBrief,
    ];

    /// The literal command line sent to the device.
    pub fn as_cli(&self) -> &'static str {
        match self {
            ShowCommand::Version => "show version",
            ShowCommand::CdpNeighbors => "show cdp neighbors detail",
            ShowCommand::LldpNeighbors => "show lldp neighbors detail",
            ShowCommand::Interfaces => "show interfaces",
            ShowCommand::IpInterfaceBrief => "show ip interface brief",
        }
    }
}

impl fmt::Display for ShowCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cli())
    }
}

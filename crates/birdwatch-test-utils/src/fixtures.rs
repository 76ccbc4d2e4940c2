//! Canned `birdc` output.
//!
//! The protocol listing has two BGP sessions: `ID_1` with no filtered routes
//! and `ID_2` with two, matching [`ROUTES_FILTERED_ID_2`].

/// `show status` output of a daemon reporting `version`.
pub fn status(version: &str) -> String {
    format!(
        "BIRD {version} ready.
BIRD {version}
Router ID is 192.0.2.1
Current server time is 2024-03-01 10:00:00.000
Last reboot on 2024-02-01 08:00:00.000
Last reconfiguration on 2024-02-20 12:30:00.000
Daemon is up and running
"
    )
}

/// `show protocols all`.
pub const PROTOCOLS: &str = r"BIRD 2.0.9 ready.
Name       Proto      Table      State  Since         Info
device1    Device     ---        up     2024-02-01 08:00:00
kernel1    Kernel     master4    up     2024-02-01 08:00:00

ID_1       BGP        ---        up     2024-02-01 08:00:01  Established
  BGP state:          Established
    Neighbor address: 192.0.2.10
    Neighbor AS:      65001
  Channel ipv4
    State:          UP
    Table:          master4
    Routes:         2 imported, 0 filtered, 5 exported, 2 preferred

ID_2       BGP        ---        up     2024-02-01 08:00:02  Established
  BGP state:          Established
    Neighbor address: 192.0.2.20
    Neighbor AS:      65002
  Channel ipv4
    State:          UP
    Table:          master4
    Routes:         1 imported, 2 filtered, 5 exported, 1 preferred
";

/// `show route all`: three imported routes.
pub const ROUTES_IMPORTED: &str = "BIRD 2.0.9 ready.
Table master4:
10.0.0.0/24          unicast [ID_1 2024-02-01] * (100) [AS65001i]
\tvia 192.0.2.10 on eth0
\tType: BGP univ
\tBGP.origin: IGP
\tBGP.as_path: 65001
10.0.1.0/24          unicast [ID_1 2024-02-01] * (100) [AS65001i]
\tvia 192.0.2.10 on eth0
\tType: BGP univ
\tBGP.as_path: 65001
10.2.0.0/24          unicast [ID_2 2024-02-01] * (100) [AS65002i]
\tvia 192.0.2.20 on eth0
\tType: BGP univ
\tBGP.as_path: 65002
";

/// `show route all filtered` on a single shared table.
pub const ROUTES_FILTERED: &str = "BIRD 2.0.9 ready.
Table master4:
192.168.0.0/16       unicast [ID_2 2024-02-01] * (100) [AS65002i]
\tvia 192.0.2.20 on eth0
\tType: BGP univ
\tBGP.as_path: 65002
";

/// `show route all filtered protocol ID_2`: two routes.
pub const ROUTES_FILTERED_ID_2: &str = "BIRD 2.0.9 ready.
Table master4:
192.168.0.0/16       unicast [ID_2 2024-02-01] * (100) [AS65002i]
\tvia 192.0.2.20 on eth0
\tBGP.as_path: 65002
172.16.0.0/12        unicast [ID_2 2024-02-01] * (100) [AS65002i]
\tvia 192.0.2.20 on eth0
\tBGP.as_path: 65002
";

/// `show route ... count`.
pub const ROUTES_COUNT: &str = "BIRD 2.0.9 ready.
3 of 3 routes for 3 networks in table master4
";

/// `show symbols`.
pub const SYMBOLS: &str = "BIRD 2.0.9 ready.
master4   routing table
master6   routing table
ID_1      protocol
ID_2      protocol
";

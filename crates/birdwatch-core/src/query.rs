//! Command construction that depends on the daemon version and topology.

use birdwatch_config::ParserConfig;

use crate::parsed::{Parsed, Value};

/// Oldest major version that gets the channel filter clause.
///
/// The bound is inclusive on purpose: a 2.x daemon keeps IPv4 and IPv6
/// routes in shared tables and is filtered, not only 3.x and later.
pub const CHANNEL_FILTER_MIN_MAJOR: u32 = 2;

/// Major version of the daemon from a status payload.
///
/// Only the first character of `status.version` is considered; anything
/// that is not a digit yields `None`.
pub fn daemon_major_version(status: &Parsed) -> Option<u32> {
    status
        .get("status")
        .and_then(|status| status.get("version"))
        .and_then(Value::as_str)
        .and_then(|v| v.chars().next())
        .and_then(|c| c.to_digit(10))
}

/// Append the channel filter clause when the daemon version calls for it.
pub fn with_channel_filter(cmd: &str, major: Option<u32>, ip_version: &str) -> String {
    match major {
        Some(v) if v >= CHANNEL_FILTER_MIN_MAJOR => {
            format!("{cmd} where net.type = NET_IP{ip_version}")
        }
        _ => cmd.to_string(),
    }
}

/// Redirect a peer protocol to its pipe protocol in per-peer-table setups,
/// where the pipe holds the routes that were not exported.
pub fn noexport_protocol(protocol: &str, topology: &ParserConfig) -> String {
    if !topology.per_peer_tables {
        return protocol.to_string();
    }
    match protocol.strip_prefix(topology.peer_protocol_prefix.as_str()) {
        Some(rest) => format!("{}{rest}", topology.pipe_protocol_prefix),
        None => protocol.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsed::object;
    use serde_json::json;

    fn status(version: impl Into<Value>) -> Parsed {
        let version: Value = version.into();
        object(json!({"status": {"version": version}}))
    }

    #[test]
    fn test_major_version() {
        assert_eq!(daemon_major_version(&status("2.0.9")), Some(2));
        assert_eq!(daemon_major_version(&status("1.6.8")), Some(1));
        assert_eq!(daemon_major_version(&status("v2.0")), None);
        assert_eq!(daemon_major_version(&status("")), None);
        assert_eq!(daemon_major_version(&status(2)), None);
        assert_eq!(daemon_major_version(&Parsed::new()), None);
        assert_eq!(
            daemon_major_version(&object(json!({"status": "up"}))),
            None
        );
    }

    #[test]
    fn test_channel_filter_on_new_daemons_only() {
        assert_eq!(
            with_channel_filter("route all", Some(2), "4"),
            "route all where net.type = NET_IP4"
        );
        assert_eq!(
            with_channel_filter("route all filtered", Some(3), "6"),
            "route all filtered where net.type = NET_IP6"
        );
        assert_eq!(with_channel_filter("route all", Some(1), "4"), "route all");
        assert_eq!(with_channel_filter("route all", None, "4"), "route all");
    }

    #[test]
    fn test_noexport_protocol_rewrite() {
        let mut topology = ParserConfig::default();
        assert_eq!(noexport_protocol("ID_42", &topology), "ID_42");

        topology.per_peer_tables = true;
        assert_eq!(noexport_protocol("ID_42", &topology), "P_42");
        assert_eq!(noexport_protocol("R_42", &topology), "R_42");
        assert_eq!(noexport_protocol("ID_", &topology), "P_");
    }
}

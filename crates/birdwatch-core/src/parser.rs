//! Turning raw client output into [`Parsed`] values.
//!
//! [`OutputParser`] is the seam between the query pipeline and the text
//! format of the client. [`BirdOutputParser`] is a best-effort
//! implementation for BIRD 1.x and 2.x output: it is total over any input,
//! ignores lines it does not recognise, and never fails.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::parsed::{Parsed, Value, object};

/// One parser per command family.
pub trait OutputParser: Send + Sync {
    /// `show status` → `{"status": {...}}`
    fn status(&self, raw: &str) -> Parsed;
    /// `show protocols all` → `{"protocols": {name: {...}}}`
    fn protocols(&self, raw: &str) -> Parsed;
    /// `show route ...` → `{"routes": [...]}`
    fn routes(&self, raw: &str) -> Parsed;
    /// `show route ... count` → `{"routes": n, ...}`
    fn routes_count(&self, raw: &str) -> Parsed;
    /// `show symbols` → `{"symbols": {kind: [names]}}`
    fn symbols(&self, raw: &str) -> Parsed;
}

/// Default parser for `birdc` output.
#[derive(Debug, Default, Clone, Copy)]
pub struct BirdOutputParser;

impl OutputParser for BirdOutputParser {
    fn status(&self, raw: &str) -> Parsed {
        parse_status(raw)
    }

    fn protocols(&self, raw: &str) -> Parsed {
        parse_protocols(raw)
    }

    fn routes(&self, raw: &str) -> Parsed {
        parse_routes(raw)
    }

    fn routes_count(&self, raw: &str) -> Parsed {
        parse_routes_count(raw)
    }

    fn symbols(&self, raw: &str) -> Parsed {
        parse_symbols(raw)
    }
}

static ROUTE_COUNTERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) (imported|filtered|exported|preferred)").expect("valid counter regex")
});

static ROUTE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\S+?)(?:\s+([^\]]*))?\]").expect("valid source regex"));

static ROUTE_METRIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)(?:/\d+)?\)").expect("valid metric regex"));

static ROUTE_VIA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"via (\S+) on (\S+)").expect("valid via regex"));

static ROUTE_ALTERNATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s+(?:unicast|blackhole|unreachable|prohibit|via\s)[^\[]*\[")
        .expect("valid alternative route regex")
});

static ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+([A-Za-z][\w.\- ]*?):\s*(.*)$").expect("valid attribute regex"));

static COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+) of (\d+) routes(?: for (\d+) networks)?").expect("valid count regex")
});

static COUNT_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+) routes").expect("valid total regex"));

fn field_key(label: &str) -> String {
    label.trim().to_lowercase().replace([' ', '-'], "_")
}

fn is_banner(line: &str) -> bool {
    line.starts_with("BIRD ") && line.trim_end().ends_with("ready.")
}

fn number(digits: &str) -> Value {
    digits
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(digits))
}

/// Parse `show status` output.
pub fn parse_status(raw: &str) -> Parsed {
    let mut status = Parsed::new();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("BIRD ") {
            if let Some(version) = rest.split_whitespace().next() {
                status.insert("version".into(), version.into());
            }
        } else if let Some(id) = line.strip_prefix("Router ID is ") {
            status.insert("router_id".into(), id.into());
        } else if let Some(time) = line.strip_prefix("Current server time is ") {
            status.insert("current_server".into(), time.into());
        } else if let Some(time) = line.strip_prefix("Last reboot on ") {
            status.insert("last_reboot".into(), time.into());
        } else if let Some(time) = line.strip_prefix("Last reconfiguration on ") {
            status.insert("last_reconfig".into(), time.into());
        } else {
            status.insert("message".into(), line.into());
        }
    }

    object(json!({"status": status}))
}

fn parse_protocol_header(line: &str) -> Option<(String, Parsed)> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let [name, proto, table, state, since, rest @ ..] = tokens.as_slice() else {
        return None;
    };

    let mut since = since.to_string();
    let mut info = rest;
    if let Some((time, tail)) = rest.split_first() {
        if time.contains(':') && time.starts_with(|c: char| c.is_ascii_digit()) {
            since = format!("{since} {time}");
            info = tail;
        }
    }

    let protocol = object(json!({
        "protocol": name,
        "bird_protocol": proto,
        "table": table,
        "state": state,
        "state_changed": since,
        "info": info.join(" "),
    }));
    Some((name.to_string(), protocol))
}

/// Parse `show protocols all` output.
pub fn parse_protocols(raw: &str) -> Parsed {
    let mut protocols = Parsed::new();
    let mut current: Option<(String, Parsed)> = None;

    for line in raw.lines() {
        if line.trim().is_empty() || is_banner(line) || line.starts_with("Name ") {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            if let Some((name, protocol)) = current.take() {
                protocols.insert(name, Value::Object(protocol));
            }
            current = parse_protocol_header(line);
            continue;
        }

        let Some((_, protocol)) = current.as_mut() else {
            continue;
        };
        let Some(caps) = ATTRIBUTE.captures(line) else {
            continue;
        };
        let key = field_key(&caps[1]);
        let value = caps[2].trim();

        // Per-channel lines repeat keys such as `state`; the first one wins.
        if protocol.contains_key(&key) {
            continue;
        }
        if key == "routes" {
            let counters: Parsed = ROUTE_COUNTERS
                .captures_iter(value)
                .map(|c| (c[2].to_string(), number(&c[1])))
                .collect();
            protocol.insert(key, Value::Object(counters));
        } else {
            protocol.insert(key, value.into());
        }
    }

    if let Some((name, protocol)) = current {
        protocols.insert(name, Value::Object(protocol));
    }

    object(json!({"protocols": protocols}))
}

fn parse_route_line(network: &str, line: &str) -> Parsed {
    let mut route = object(json!({
        "network": network,
        "primary": line.contains(" * "),
    }));

    if let Some(caps) = ROUTE_SOURCE.captures(line) {
        route.insert("from_protocol".into(), Value::from(&caps[1]));
        if let Some(age) = caps.get(2) {
            route.insert("age".into(), age.as_str().trim().into());
        }
    }
    if let Some(caps) = ROUTE_METRIC.captures(line) {
        route.insert("metric".into(), number(&caps[1]));
    }
    if let Some(caps) = ROUTE_VIA.captures(line) {
        route.insert("gateway".into(), Value::from(&caps[1]));
        route.insert("interface".into(), Value::from(&caps[2]));
    }
    route
}

fn apply_route_attribute(route: &mut Parsed, line: &str) {
    if let Some(caps) = ROUTE_VIA.captures(line) {
        route.insert("gateway".into(), Value::from(&caps[1]));
        route.insert("interface".into(), Value::from(&caps[2]));
        return;
    }
    let Some(caps) = ATTRIBUTE.captures(line) else {
        return;
    };
    let label = caps[1].trim();
    let value = caps[2].trim();

    if let Some(attr) = label.strip_prefix("BGP.") {
        let bgp = route
            .entry("bgp")
            .or_insert_with(|| Value::Object(Parsed::new()));
        if let Some(bgp) = bgp.as_object_mut() {
            bgp.insert(field_key(attr), value.into());
        }
    } else if label == "Type" {
        let kinds: Vec<Value> = value.split_whitespace().map(Value::from).collect();
        route.insert("type".into(), Value::Array(kinds));
    } else {
        route.insert(field_key(label), value.into());
    }
}

/// Parse `show route ...` output.
pub fn parse_routes(raw: &str) -> Parsed {
    let mut routes: Vec<Parsed> = Vec::new();
    let mut network = String::new();

    for line in raw.lines() {
        if line.trim().is_empty() || is_banner(line) || line.starts_with("Table ") {
            continue;
        }

        if !line.starts_with(char::is_whitespace) {
            let Some(first) = line.split_whitespace().next().filter(|t| t.contains('/')) else {
                continue;
            };
            network = first.to_string();
            routes.push(parse_route_line(&network, line));
        } else if !network.is_empty() && ROUTE_ALTERNATIVE.is_match(line) {
            routes.push(parse_route_line(&network, line));
        } else if let Some(route) = routes.last_mut() {
            apply_route_attribute(route, line);
        }
    }

    object(json!({"routes": routes}))
}

/// Parse `show route ... count` output.
pub fn parse_routes_count(raw: &str) -> Parsed {
    let mut count = Parsed::new();

    for line in raw.lines().map(str::trim) {
        if let Some(caps) = COUNT.captures(line) {
            count.insert("routes".into(), number(&caps[1]));
            count.insert("total".into(), number(&caps[2]));
            if let Some(networks) = caps.get(3) {
                count.insert("networks".into(), number(networks.as_str()));
            }
            break;
        }
        if let Some(caps) = COUNT_TOTAL.captures(line) {
            count.insert("routes".into(), number(&caps[1]));
            break;
        }
    }

    count
}

/// Parse `show symbols` output.
pub fn parse_symbols(raw: &str) -> Parsed {
    let mut symbols = Parsed::new();

    for line in raw.lines() {
        if is_banner(line) {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (Some(name), Some(first_kind)) = (tokens.next(), tokens.next()) else {
            continue;
        };
        let kind = std::iter::once(first_kind).chain(tokens).collect::<Vec<_>>().join(" ");

        if let Some(Value::Array(names)) = symbols.get_mut(&kind) {
            names.push(Value::from(name));
            continue;
        }
        symbols.insert(kind, Value::Array(vec![Value::from(name)]));
    }

    object(json!({"symbols": symbols}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STATUS: &str = "BIRD 2.0.9 ready.\n\
BIRD 2.0.9\n\
Router ID is 192.0.2.1\n\
Current server time is 2024-03-01 10:00:00.000\n\
Last reboot on 2024-02-01 08:00:00.000\n\
Last reconfiguration on 2024-02-20 12:30:00.000\n\
Daemon is up and running\n";

    const PROTOCOLS: &str = r"BIRD 2.0.9 ready.
Name       Proto      Table      State  Since         Info
device1    Device     ---        up     2024-02-01 08:00:00

ID_1       BGP        ---        up     2024-02-01 08:00:01  Established
  BGP state:          Established
    Neighbor address: 192.0.2.10
  Channel ipv4
    State:          UP
    Routes:         12 imported, 3 filtered, 7 exported, 11 preferred

ID_2       BGP        ---        start  2024-02-01    Active
    Routes:         0 imported, 0 filtered, 0 exported, 0 preferred
";

    const ROUTES: &str = "BIRD 2.0.9 ready.
Table master4:
10.0.0.0/24          unicast [ID_1 2024-02-01] * (100) [AS65001i]
\tvia 192.0.2.10 on eth0
\tType: BGP univ
\tBGP.origin: IGP
\tBGP.as_path: 65001
                     unicast [ID_2 2024-02-02] (100) [AS65002i]
\tvia 192.0.2.20 on eth0
10.1.0.0/16        via 192.0.2.30 on eth1 [ID_3 2024-02-03] * (100/0) [AS65003i]
\tBGP.local_pref: 100
";

    #[test]
    fn test_parse_status() {
        let parsed = parse_status(STATUS);
        let status = &parsed["status"];
        assert_eq!(status["version"], "2.0.9");
        assert_eq!(status["router_id"], "192.0.2.1");
        assert_eq!(status["last_reboot"], "2024-02-01 08:00:00.000");
        assert_eq!(status["last_reconfig"], "2024-02-20 12:30:00.000");
        assert_eq!(status["message"], "Daemon is up and running");
    }

    #[test]
    fn test_parse_protocols() {
        let parsed = parse_protocols(PROTOCOLS);
        let protocols = parsed["protocols"].as_object().unwrap();
        assert_eq!(protocols.len(), 3);

        let id1 = &protocols["ID_1"];
        assert_eq!(id1["bird_protocol"], "BGP");
        assert_eq!(id1["state_changed"], "2024-02-01 08:00:01");
        assert_eq!(id1["info"], "Established");
        assert_eq!(id1["neighbor_address"], "192.0.2.10");
        assert_eq!(id1["routes"]["imported"], 12);
        assert_eq!(id1["routes"]["filtered"], 3);

        let id2 = &protocols["ID_2"];
        assert_eq!(id2["state_changed"], "2024-02-01");
        assert_eq!(id2["info"], "Active");

        let device = &protocols["device1"];
        assert_eq!(device["bird_protocol"], "Device");
        assert!(device.get("routes").is_none());
    }

    #[test]
    fn test_parse_routes() {
        let parsed = parse_routes(ROUTES);
        let routes = parsed["routes"].as_array().unwrap();
        assert_eq!(routes.len(), 3);

        let first = &routes[0];
        assert_eq!(first["network"], "10.0.0.0/24");
        assert_eq!(first["from_protocol"], "ID_1");
        assert_eq!(first["primary"], true);
        assert_eq!(first["metric"], 100);
        assert_eq!(first["gateway"], "192.0.2.10");
        assert_eq!(first.pointer("/bgp/as_path"), Some(&json!("65001")));

        let alternative = &routes[1];
        assert_eq!(alternative["network"], "10.0.0.0/24");
        assert_eq!(alternative["from_protocol"], "ID_2");
        assert_eq!(alternative["primary"], false);
        assert_eq!(alternative["gateway"], "192.0.2.20");

        let legacy = &routes[2];
        assert_eq!(legacy["network"], "10.1.0.0/16");
        assert_eq!(legacy["interface"], "eth1");
        assert_eq!(legacy["from_protocol"], "ID_3");
        assert_eq!(legacy.pointer("/bgp/local_pref"), Some(&json!("100")));
    }

    #[test]
    fn test_parse_routes_count() {
        let parsed = parse_routes_count("BIRD 2.0.9 ready.\n42 of 120 routes for 40 networks in table master4\n");
        assert_eq!(parsed["routes"], 42);
        assert_eq!(parsed["total"], 120);
        assert_eq!(parsed["networks"], 40);

        let legacy = parse_routes_count("17 routes\n");
        assert_eq!(legacy["routes"], 17);
    }

    #[test]
    fn test_parse_symbols() {
        let parsed = parse_symbols("master4   routing table\nID_1      protocol\nID_2      protocol\n");
        assert_eq!(parsed["symbols"]["protocol"], json!(["ID_1", "ID_2"]));
        assert_eq!(parsed["symbols"]["routing table"], json!(["master4"]));
    }

    #[test]
    fn test_parsers_tolerate_garbage() {
        let garbage = "\u{0}\u{1}]]][[[ (((\n\t\t: :\nBGP.\n   via\n*\n";
        let parser = BirdOutputParser;
        let _ = parser.status(garbage);
        let _ = parser.protocols(garbage);
        let _ = parser.routes(garbage);
        let _ = parser.routes_count(garbage);
        let _ = parser.symbols(garbage);

        assert_eq!(parser.routes(""), object(json!({"routes": []})));
        assert!(parser.routes_count("").is_empty());
    }
}

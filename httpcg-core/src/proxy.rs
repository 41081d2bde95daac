// Proxy resolution for outgoing requests
// Environment driven: HTTP_PROXY / HTTPS_PROXY / NO_PROXY (and lowercase forms)

use std::fmt;
use std::net::IpAddr;

use tracing::warn;
use url::{Host, Url};

/// Maps an outgoing request URL to the proxy it should go through, if any.
pub trait ProxyResolver: Send + Sync {
    fn resolve(&self, url: &Url) -> Option<Url>;
}

impl<F> ProxyResolver for F
where
    F: Fn(&Url) -> Option<Url> + Send + Sync,
{
    fn resolve(&self, url: &Url) -> Option<Url> {
        self(url)
    }
}

/// Resolver that never proxies.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectProxyResolver;

impl ProxyResolver for DirectProxyResolver {
    fn resolve(&self, _url: &Url) -> Option<Url> {
        None
    }
}

/// Proxy resolver backed by a snapshot of the proxy environment variables.
///
/// - `HTTPS_PROXY` is used for `https` URLs, `HTTP_PROXY` for `http` URLs.
///   There is no fallback from one to the other.
/// - `HTTP_PROXY` is ignored when `REQUEST_METHOD` is set, since in a CGI
///   environment it can be controlled by the incoming request. Plain `http`
///   requests then go direct rather than failing; `HTTPS_PROXY` still applies.
/// - `localhost` and loopback addresses are never proxied.
/// - `NO_PROXY` is a comma separated list of `*`, IPs, CIDR blocks,
///   `host`, `.host` or `host:port` entries.
#[derive(Debug, Clone, Default)]
pub struct EnvProxyResolver {
    http_proxy: Option<Url>,
    https_proxy: Option<Url>,
    no_proxy: NoProxy,
    cgi: bool,
}

impl EnvProxyResolver {
    /// Snapshot the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a resolver from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let any = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(*key))
                .find(|value| !value.is_empty())
        };

        Self {
            http_proxy: any(&["HTTP_PROXY", "http_proxy"]).and_then(|v| parse_proxy("HTTP_PROXY", &v)),
            https_proxy: any(&["HTTPS_PROXY", "https_proxy"]).and_then(|v| parse_proxy("HTTPS_PROXY", &v)),
            no_proxy: any(&["NO_PROXY", "no_proxy"])
                .map(|v| NoProxy::parse(&v))
                .unwrap_or_default(),
            cgi: lookup("REQUEST_METHOD").map_or(false, |v| !v.is_empty()),
        }
    }

    pub fn http_proxy(&self) -> Option<&Url> {
        self.http_proxy.as_ref()
    }

    pub fn https_proxy(&self) -> Option<&Url> {
        self.https_proxy.as_ref()
    }
}

impl ProxyResolver for EnvProxyResolver {
    fn resolve(&self, url: &Url) -> Option<Url> {
        let proxy = match url.scheme() {
            "https" => self.https_proxy.as_ref()?,
            "http" if !self.cgi => self.http_proxy.as_ref()?,
            _ => return None,
        };

        let host = RequestHost::from_url(url)?;
        if host.is_local() || !self.no_proxy.allows(&host) {
            return None;
        }

        Some(proxy.clone())
    }
}

fn parse_proxy(var: &str, value: &str) -> Option<Url> {
    let value = value.trim();
    let parsed = Url::parse(value)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https" | "socks5" | "socks5h"))
        .or_else(|| Url::parse(&format!("http://{}", value)).ok());

    if parsed.is_none() {
        warn!(variable = var, value = value, "Ignoring unparseable proxy address");
    }
    parsed
}

/// Canonical host and port of a request URL.
#[derive(Debug)]
struct RequestHost {
    host: Host<String>,
    port: Option<u16>,
}

impl RequestHost {
    fn from_url(url: &Url) -> Option<Self> {
        let host = match url.host()? {
            Host::Domain(d) => Host::Domain(d.trim_end_matches('.').to_ascii_lowercase()),
            Host::Ipv4(ip) => Host::Ipv4(ip),
            Host::Ipv6(ip) => Host::Ipv6(ip),
        };
        Some(Self {
            host,
            port: url.port_or_known_default(),
        })
    }

    fn ip(&self) -> Option<IpAddr> {
        match self.host {
            Host::Ipv4(ip) => Some(IpAddr::V4(ip)),
            Host::Ipv6(ip) => Some(IpAddr::V6(ip)),
            Host::Domain(_) => None,
        }
    }

    fn is_local(&self) -> bool {
        match &self.host {
            Host::Domain(d) => d == "localhost",
            _ => self.ip().map_or(false, |ip| ip.is_loopback()),
        }
    }
}

/// Parsed `NO_PROXY` list.
#[derive(Debug, Clone, Default)]
pub struct NoProxy {
    all: bool,
    ips: Vec<(IpAddr, Option<u16>)>,
    cidrs: Vec<Cidr>,
    domains: Vec<DomainMatch>,
}

impl NoProxy {
    pub fn parse(value: &str) -> Self {
        let mut no_proxy = NoProxy::default();

        for entry in value.split(',') {
            let entry = entry.trim().to_ascii_lowercase();
            if entry.is_empty() {
                continue;
            }
            if entry == "*" {
                no_proxy.all = true;
                return no_proxy;
            }
            if let Some(cidr) = Cidr::parse(&entry) {
                no_proxy.cidrs.push(cidr);
                continue;
            }
            if let Ok(ip) = entry.parse::<IpAddr>() {
                no_proxy.ips.push((ip, None));
                continue;
            }

            let (host, port) = split_host_port(&entry);
            if let Ok(ip) = host.trim_matches(|c| c == '[' || c == ']').parse::<IpAddr>() {
                no_proxy.ips.push((ip, port));
                continue;
            }

            let host = host.strip_prefix('*').unwrap_or(host);
            if host.is_empty() {
                continue;
            }
            // A leading dot restricts the entry to subdomains only.
            let (suffix, match_host) = match host.strip_prefix('.') {
                Some(_) => (host.to_string(), false),
                None => (format!(".{}", host), true),
            };
            no_proxy.domains.push(DomainMatch { suffix, port, match_host });
        }

        no_proxy
    }

    /// Whether requests to `host` may go through a proxy.
    fn allows(&self, host: &RequestHost) -> bool {
        if self.all {
            return false;
        }

        if let Some(ip) = host.ip() {
            if self.cidrs.iter().any(|cidr| cidr.contains(ip)) {
                return false;
            }
            if self
                .ips
                .iter()
                .any(|(candidate, port)| *candidate == ip && port_matches(*port, host.port))
            {
                return false;
            }
            return true;
        }

        let Host::Domain(name) = &host.host else {
            return true;
        };
        !self.domains.iter().any(|m| m.matches(name, host.port))
    }
}

#[derive(Debug, Clone)]
struct DomainMatch {
    suffix: String,
    port: Option<u16>,
    match_host: bool,
}

impl DomainMatch {
    fn matches(&self, host: &str, port: Option<u16>) -> bool {
        let hit = host.ends_with(&self.suffix) || (self.match_host && host == &self.suffix[1..]);
        hit && port_matches(self.port, port)
    }
}

fn port_matches(wanted: Option<u16>, actual: Option<u16>) -> bool {
    wanted.is_none() || wanted == actual
}

/// Split `host:port`; entries without a numeric port are all host.
fn split_host_port(entry: &str) -> (&str, Option<u16>) {
    match entry.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && (!host.contains(':') || host.ends_with(']')) => {
            match port.parse::<u16>() {
                Ok(port) => (host, Some(port)),
                Err(_) => (entry, None),
            }
        }
        _ => (entry, None),
    }
}

#[derive(Clone, Copy)]
struct Cidr {
    network: IpAddr,
    prefix: u8,
}

impl Cidr {
    fn parse(entry: &str) -> Option<Self> {
        let (addr, prefix) = entry.split_once('/')?;
        let network: IpAddr = addr.parse().ok()?;
        let prefix: u8 = prefix.parse().ok()?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        (prefix <= max).then_some(Self { network, prefix })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

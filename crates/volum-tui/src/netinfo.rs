//! Network probe for the footer: default-route interface, its IPv4 address,
//! and Wi-Fi signal strength when the link is wireless.
//!
//! Everything is read from `/proc` or the socket layer; nothing shells out.
//! A probe never fails as a whole, it just leaves unknown parts empty.
//!
//! Probing runs in its own task on a slow interval so the display loop never
//! waits on filesystem or socket I/O; it only receives changed results.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use crate::shutdown::Shutdown;

const ROUTE_TABLE: &str = "/proc/net/route";
const WIRELESS_TABLE: &str = "/proc/net/wireless";
/// Any routable address works; no packet is sent.
const PROBE_TARGET: &str = "8.8.8.8:80";

pub const SIGNAL_GLYPH: char = '▮';

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInfo {
    pub iface: Option<String>,
    pub address: Option<IpAddr>,
    /// Absolute signal level in dBm; lower is stronger.
    pub signal: Option<u32>,
}

impl NetworkInfo {
    /// Footer text: `192.168.1.20 (wlan0) ▮▮▮`.
    pub fn summary(&self) -> String {
        let mut out = match self.address {
            Some(addr) => addr.to_string(),
            None => "no address".to_string(),
        };
        if let Some(iface) = &self.iface {
            out.push_str(&format!(" ({})", iface));
        }
        if let Some(strength) = self.signal {
            out.push(' ');
            out.push_str(&signal_glyphs(strength));
        }
        out
    }
}

#[async_trait]
pub trait NetworkProbe: Send {
    async fn probe(&mut self) -> NetworkInfo;
}

/// Reads the live system tables.
pub struct SystemProbe;

#[async_trait]
impl NetworkProbe for SystemProbe {
    async fn probe(&mut self) -> NetworkInfo {
        probe_system().await
    }
}

/// Probe every `period` and send each result that differs from the previous
/// one. The receiver ends on shutdown.
pub fn spawn_monitor(
    mut probe: Box<dyn NetworkProbe>,
    period: Duration,
    shutdown: &Shutdown,
) -> mpsc::Receiver<NetworkInfo> {
    let (tx, rx) = mpsc::channel(4);
    let cancel = shutdown.child_token();
    shutdown.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut last: Option<NetworkInfo> = None;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                _ = ticker.tick() => {
                    let info = probe.probe().await;
                    if last.as_ref() == Some(&info) {
                        continue;
                    }
                    debug!("netinfo: {}", info.summary());
                    last = Some(info.clone());
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        sent = tx.send(info) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        }
        debug!("netinfo: monitor stopped");
    });
    rx
}

async fn probe_system() -> NetworkInfo {
    let iface = match tokio::fs::read_to_string(ROUTE_TABLE).await {
        Ok(table) => default_route_iface(&table),
        Err(e) => {
            debug!("netinfo: cannot read {}: {}", ROUTE_TABLE, e);
            None
        }
    };

    let address = match local_address().await {
        Ok(addr) => Some(addr),
        Err(e) => {
            debug!("netinfo: no local address: {}", e);
            None
        }
    };

    let signal = match &iface {
        Some(name) => match tokio::fs::read_to_string(WIRELESS_TABLE).await {
            Ok(table) => wireless_level(&table, name),
            Err(e) => {
                debug!("netinfo: cannot read {}: {}", WIRELESS_TABLE, e);
                None
            }
        },
        None => None,
    };

    NetworkInfo {
        iface,
        address,
        signal,
    }
}

async fn local_address() -> std::io::Result<IpAddr> {
    let socket = tokio::net::UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(PROBE_TARGET).await?;
    Ok(socket.local_addr()?.ip())
}

/// Interface of the default route (destination `00000000`) with the lowest
/// metric.
fn default_route_iface(table: &str) -> Option<String> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 7 || cols[1] != "00000000" {
                return None;
            }
            let metric = cols[6].parse::<u32>().unwrap_or(u32::MAX);
            Some((metric, cols[0]))
        })
        .min_by_key(|(metric, _)| *metric)
        .map(|(_, iface)| iface.to_string())
}

/// Signal level column for `iface`, as a positive number.
fn wireless_level(table: &str, iface: &str) -> Option<u32> {
    table.lines().skip(2).find_map(|line| {
        let (name, rest) = line.split_once(':')?;
        if name.trim() != iface {
            return None;
        }
        // status, link quality, level, noise, ...
        let level = rest.split_whitespace().nth(2)?;
        let level: f64 = level.trim_end_matches('.').parse().ok()?;
        Some(level.abs() as u32)
    })
}

/// Bars for a signal strength in |dBm|.
pub fn signal_level(strength: u32) -> usize {
    match strength {
        s if s < 50 => 4,
        s if s < 60 => 3,
        s if s < 70 => 2,
        _ => 1,
    }
}

pub fn signal_glyphs(strength: u32) -> String {
    std::iter::repeat(SIGNAL_GLYPH)
        .take(signal_level(strength))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownReason;
    use std::collections::VecDeque;

    const ROUTE: &str = "\
Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t00000000\t0101A8C0\t0003\t0\t0\t700\t00000000\t0\t0\t0
wlan0\t00000000\t0101A8C0\t0003\t0\t0\t600\t00000000\t0\t0\t0
wlan0\t0001A8C0\t00000000\t0001\t0\t0\t600\t00FFFFFF\t0\t0\t0
";

    const WIRELESS: &str = "\
Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE
 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22
 wlan0: 0000   54.  -56.  -256        0      0      0      0      0        0
";

    #[test]
    fn test_signal_bucketing() {
        assert_eq!(signal_level(45), 4);
        assert_eq!(signal_level(55), 3);
        assert_eq!(signal_level(65), 2);
        assert_eq!(signal_level(75), 1);
        assert_eq!(signal_level(50), 3);
        assert_eq!(signal_glyphs(45), "▮▮▮▮");
        assert_eq!(signal_glyphs(90), "▮");
    }

    #[test]
    fn test_default_route_prefers_lowest_metric() {
        assert_eq!(default_route_iface(ROUTE).as_deref(), Some("wlan0"));
        assert_eq!(default_route_iface("Iface\tDestination\n"), None);
    }

    #[test]
    fn test_wireless_level_is_absolute() {
        assert_eq!(wireless_level(WIRELESS, "wlan0"), Some(56));
        assert_eq!(wireless_level(WIRELESS, "eth0"), None);
    }

    #[test]
    fn test_summary_with_partial_info() {
        let info = NetworkInfo {
            iface: Some("wlan0".into()),
            address: Some("192.168.1.20".parse().unwrap()),
            signal: Some(65),
        };
        assert_eq!(info.summary(), "192.168.1.20 (wlan0) ▮▮");
        assert_eq!(NetworkInfo::default().summary(), "no address");
    }

    /// Replays a list of results, then repeats the last one.
    struct ScriptedProbe {
        script: VecDeque<NetworkInfo>,
        last: NetworkInfo,
    }

    #[async_trait]
    impl NetworkProbe for ScriptedProbe {
        async fn probe(&mut self) -> NetworkInfo {
            if let Some(next) = self.script.pop_front() {
                self.last = next;
            }
            self.last.clone()
        }
    }

    fn wired(addr: &str) -> NetworkInfo {
        NetworkInfo {
            iface: Some("eth0".into()),
            address: Some(addr.parse().unwrap()),
            signal: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_sends_only_changes() {
        let probe = ScriptedProbe {
            script: vec![
                wired("10.0.0.5"),
                wired("10.0.0.5"),
                wired("10.0.0.5"),
                wired("10.0.0.9"),
            ]
            .into(),
            last: NetworkInfo::default(),
        };
        let shutdown = Shutdown::new();
        let mut rx = spawn_monitor(Box::new(probe), Duration::from_secs(5), &shutdown);

        assert_eq!(rx.recv().await, Some(wired("10.0.0.5")));
        let begun = tokio::time::Instant::now();
        assert_eq!(rx.recv().await, Some(wired("10.0.0.9")));
        assert!(begun.elapsed() >= Duration::from_secs(15));

        // Steady state: nothing more is sent.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());

        shutdown.request(ShutdownReason::QuitKey);
        shutdown.await_drain().await;
        assert_eq!(rx.recv().await, None);
    }
}

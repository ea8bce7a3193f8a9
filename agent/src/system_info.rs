//! Host facts reported by `status` and the startup banner.

use std::net::UdpSocket;

/// Local IPv4 address of the default route, or `"Unknown"`.
///
/// Connecting a UDP socket only selects a route; no packet is sent.
pub fn local_ip() -> String {
    let probe = || -> std::io::Result<String> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect("8.8.8.8:80")?;
        Ok(socket.local_addr()?.ip().to_string())
    };
    probe().unwrap_or_else(|e| {
        tracing::debug!("Local IP lookup failed: {e}");
        "Unknown".to_string()
    })
}

/// Human-readable platform name.
pub fn os_name() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "macOS",
        "linux" => "Linux",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

/// Current local time as `HH:MM:SS`.
pub fn clock_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// Name of this machine, used when no device name is configured.
pub fn host_name() -> String {
    match whoami::fallible::hostname() {
        Ok(name) if !name.trim().is_empty() => name.trim().to_string(),
        Ok(_) => "desk".to_string(),
        Err(e) => {
            tracing::debug!("Host name lookup failed: {e}");
            "desk".to_string()
        }
    }
}

use std::sync::OnceLock;

use regex::Regex;

use crate::kernel::services::ports::ServerReady;

const MAX_PENDING_LINE: usize = 4096;

fn server_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"https?://(?:localhost|127\.0\.0\.1|0\.0\.0\.0|\[::1\]):(\d{1,5})(?:/[\w\-./~%?&=#]*)?",
        )
        .expect("server url pattern compiles")
    })
}

/// Watches process output for a local listening URL, one line at a time so a
/// URL split across chunks is still found.
#[derive(Debug, Default)]
pub struct ServerUrlScanner {
    pending: String,
}

impl ServerUrlScanner {
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<ServerReady> {
        self.pending.push_str(&String::from_utf8_lossy(chunk));

        let mut found = Vec::new();
        while let Some(pos) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=pos).collect();
            found.extend(scan_line(&line));
        }

        if self.pending.len() > MAX_PENDING_LINE {
            self.pending.clear();
        }
        found
    }
}

pub fn scan_line(line: &str) -> Vec<ServerReady> {
    server_url_regex()
        .captures_iter(line)
        .filter_map(|caps| {
            let url = caps.get(0)?.as_str().to_string();
            let port = caps.get(1)?.as_str().parse::<u16>().ok()?;
            Some(ServerReady { port, url })
        })
        .collect()
}

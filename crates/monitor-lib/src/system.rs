//! Host resource statistics
//!
//! Reads the Linux proc filesystem directly on every sample:
//! - /proc/stat for aggregate CPU utilization
//! - /proc/meminfo for memory utilization
//! - /proc/net/dev for cumulative network byte counts
//! - /proc/self/status for own-process RSS and thread count
//!
//! Disk utilization comes from statvfs on a configured mount point.
//! CPU percentage is a delta between consecutive samples, so the first
//! sample of a run reports 0.

use anyhow::{bail, Context, Result};
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// One snapshot of host resource usage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Cumulative bytes sent across all interfaces since boot.
    pub net_sent_bytes: u64,
    /// Cumulative bytes received across all interfaces since boot.
    pub net_recv_bytes: u64,
    /// Resident set size of this process.
    pub process_rss_bytes: u64,
    /// Active thread count of this process. Informational only.
    pub process_threads: u64,
}

/// Aggregate CPU time split from the `cpu` line of /proc/stat.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CpuTimes {
    busy: u64,
    total: u64,
}

impl CpuTimes {
    fn percent_since(self, prev: CpuTimes) -> f64 {
        let total_delta = self.total.saturating_sub(prev.total);
        if total_delta == 0 {
            return 0.0;
        }
        let busy_delta = self.busy.saturating_sub(prev.busy);
        busy_delta as f64 / total_delta as f64 * 100.0
    }
}

/// Samples host statistics fresh from the OS on every call.
#[derive(Debug)]
pub struct HostSampler {
    proc_root: PathBuf,
    disk_path: PathBuf,
    prev_cpu: Option<CpuTimes>,
}

impl HostSampler {
    /// Create a sampler reading from /proc, reporting disk utilization for
    /// the filesystem holding `disk_path`.
    pub fn new(disk_path: impl Into<PathBuf>) -> Self {
        Self::with_proc_root("/proc", disk_path)
    }

    /// Create a sampler with a custom proc root (for testing).
    pub fn with_proc_root(proc_root: impl Into<PathBuf>, disk_path: impl Into<PathBuf>) -> Self {
        Self {
            proc_root: proc_root.into(),
            disk_path: disk_path.into(),
            prev_cpu: None,
        }
    }

    /// Take one snapshot. Every value is read fresh; nothing is cached
    /// except the previous CPU time split needed for the percentage delta.
    pub fn sample(&mut self) -> Result<HostSample> {
        let stat = self.read_proc("stat")?;
        let cpu = parse_cpu_times(&stat)?;
        let cpu_percent = match self.prev_cpu.replace(cpu) {
            Some(prev) => cpu.percent_since(prev),
            None => 0.0,
        };

        let meminfo = self.read_proc("meminfo")?;
        let memory_percent = parse_memory_percent(&meminfo)?;

        let net_dev = self.read_proc("net/dev")?;
        let (net_recv_bytes, net_sent_bytes) = parse_net_dev(&net_dev);

        let status = self.read_proc("self/status")?;
        let (process_rss_bytes, process_threads) = parse_self_status(&status);

        let disk_percent = disk_usage_percent(&self.disk_path)?;

        Ok(HostSample {
            cpu_percent,
            memory_percent,
            disk_percent,
            net_sent_bytes,
            net_recv_bytes,
            process_rss_bytes,
            process_threads,
        })
    }

    fn read_proc(&self, name: &str) -> Result<String> {
        let path = self.proc_root.join(name);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }
}

/// Parse the aggregate `cpu` line of /proc/stat into busy/total jiffies.
/// Idle time includes iowait; total covers through the steal column.
fn parse_cpu_times(content: &str) -> Result<CpuTimes> {
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .context("No aggregate cpu line in /proc/stat")?;

    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().unwrap_or(0))
        .collect();

    if fields.len() < 4 {
        bail!("Malformed cpu line in /proc/stat");
    }

    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    let total: u64 = fields.iter().take(8).sum();

    Ok(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

/// Memory utilization percentage from MemTotal and MemAvailable.
fn parse_memory_percent(content: &str) -> Result<f64> {
    let mut total_kb = None;
    let mut available_kb = None;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total_kb = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available_kb = parse_kb(rest);
        }
    }

    let total = total_kb.context("No MemTotal in /proc/meminfo")?;
    let available = available_kb.context("No MemAvailable in /proc/meminfo")?;
    if total == 0 {
        bail!("MemTotal is zero");
    }

    Ok(total.saturating_sub(available) as f64 / total as f64 * 100.0)
}

fn parse_kb(rest: &str) -> Option<u64> {
    rest.trim().trim_end_matches("kB").trim().parse().ok()
}

/// Sum cumulative (received, sent) bytes across all interfaces.
fn parse_net_dev(content: &str) -> (u64, u64) {
    let mut recv = 0u64;
    let mut sent = 0u64;

    // First two lines are headers.
    for line in content.lines().skip(2) {
        let Some((_, counters)) = line.split_once(':') else {
            continue;
        };
        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() >= 9 {
            recv += fields[0].parse::<u64>().unwrap_or(0);
            sent += fields[8].parse::<u64>().unwrap_or(0);
        }
    }

    (recv, sent)
}

/// Extract (RSS bytes, thread count) from /proc/self/status.
fn parse_self_status(content: &str) -> (u64, u64) {
    let mut rss_bytes = 0u64;
    let mut threads = 0u64;

    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            rss_bytes = parse_kb(rest).unwrap_or(0) * 1024;
        } else if let Some(rest) = line.strip_prefix("Threads:") {
            threads = rest.trim().parse().unwrap_or(0);
        }
    }

    (rss_bytes, threads)
}

/// Utilization percentage of the filesystem holding `path`, computed the
/// way df does: used over used-plus-available-to-unprivileged.
fn disk_usage_percent(path: &Path) -> Result<f64> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .with_context(|| format!("Invalid disk path {:?}", path))?;

    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error())
            .with_context(|| format!("statvfs failed for {:?}", path));
    }

    let used = (stat.f_blocks as u64).saturating_sub(stat.f_bfree as u64);
    let usable = used + stat.f_bavail as u64;
    if usable == 0 {
        return Ok(0.0);
    }

    Ok(used as f64 / usable as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_FIRST: &str = "cpu  100 0 100 700 100 0 0 0 0 0\ncpu0 50 0 50 350 50 0 0 0 0 0\n";
    const STAT_SECOND: &str = "cpu  160 0 140 760 140 0 0 0 0 0\ncpu0 80 0 70 380 70 0 0 0 0 0\n";

    const MEMINFO: &str = "MemTotal:       8000000 kB\nMemFree:        1000000 kB\nMemAvailable:   2000000 kB\nBuffers:         300000 kB\n";

    const NET_DEV: &str = "\
Inter-|   Receive                                                |  Transmit
 face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed
    lo:    1000      10    0    0    0     0          0         0     1000      10    0    0    0     0       0          0
  eth0:    5000      50    0    0    0     0          0         0     3000      30    0    0    0     0       0          0
";

    const SELF_STATUS: &str =
        "Name:\ttest\nVmPeak:\t  20000 kB\nVmRSS:\t  10240 kB\nThreads:\t7\n";

    #[test]
    fn test_parse_cpu_times() {
        let times = parse_cpu_times(STAT_FIRST).unwrap();
        // total = 100+0+100+700+100 = 1000, idle = 700+100 = 800
        assert_eq!(times.total, 1000);
        assert_eq!(times.busy, 200);
    }

    #[test]
    fn test_cpu_percent_from_delta() {
        let first = parse_cpu_times(STAT_FIRST).unwrap();
        let second = parse_cpu_times(STAT_SECOND).unwrap();
        // busy 200 -> 300, total 1000 -> 1200
        let percent = second.percent_since(first);
        assert!((percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_percent_zero_total_delta() {
        let times = parse_cpu_times(STAT_FIRST).unwrap();
        assert_eq!(times.percent_since(times), 0.0);
    }

    #[test]
    fn test_parse_cpu_times_missing_line() {
        assert!(parse_cpu_times("intr 12345\n").is_err());
    }

    #[test]
    fn test_parse_memory_percent() {
        let percent = parse_memory_percent(MEMINFO).unwrap();
        assert!((percent - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_memory_percent_missing_fields() {
        assert!(parse_memory_percent("MemTotal: 100 kB\n").is_err());
    }

    #[test]
    fn test_parse_net_dev_sums_interfaces() {
        let (recv, sent) = parse_net_dev(NET_DEV);
        assert_eq!(recv, 6000);
        assert_eq!(sent, 4000);
    }

    #[test]
    fn test_parse_self_status() {
        let (rss, threads) = parse_self_status(SELF_STATUS);
        assert_eq!(rss, 10240 * 1024);
        assert_eq!(threads, 7);
    }

    #[test]
    fn test_sampler_reads_fixture_proc_root() {
        let dir = tempfile::tempdir().unwrap();
        let proc_root = dir.path().join("proc");
        std::fs::create_dir_all(proc_root.join("net")).unwrap();
        std::fs::create_dir_all(proc_root.join("self")).unwrap();
        std::fs::write(proc_root.join("stat"), STAT_FIRST).unwrap();
        std::fs::write(proc_root.join("meminfo"), MEMINFO).unwrap();
        std::fs::write(proc_root.join("net/dev"), NET_DEV).unwrap();
        std::fs::write(proc_root.join("self/status"), SELF_STATUS).unwrap();

        let mut sampler = HostSampler::with_proc_root(&proc_root, dir.path());

        let first = sampler.sample().unwrap();
        assert_eq!(first.cpu_percent, 0.0); // no prior sample to delta against
        assert_eq!(first.net_recv_bytes, 6000);
        assert_eq!(first.net_sent_bytes, 4000);
        assert_eq!(first.process_rss_bytes, 10240 * 1024);
        assert_eq!(first.process_threads, 7);
        assert!(first.disk_percent >= 0.0 && first.disk_percent <= 100.0);

        std::fs::write(proc_root.join("stat"), STAT_SECOND).unwrap();
        let second = sampler.sample().unwrap();
        assert!((second.cpu_percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_sampler_missing_proc_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = HostSampler::with_proc_root(dir.path().join("nope"), dir.path());
        assert!(sampler.sample().is_err());
    }
}

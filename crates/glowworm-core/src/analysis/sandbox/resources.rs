//! Resource-usage scraping from `free`, `df` and `top` output.

use crate::types::ResourceUsage;
use regex::Regex;

/// Shell command whose combined output [`parse_resource_usage`] reads.
pub const RESOURCE_COMMAND: &str = "free -m && df -h && top -bn1 | head -5";

/// Parse memory, CPU and storage summaries. Each field independently
/// degrades to "unknown".
pub fn parse_resource_usage(output: &str) -> ResourceUsage {
    ResourceUsage {
        memory: memory_usage(output).unwrap_or_else(|| ResourceUsage::UNKNOWN.to_string()),
        cpu: cpu_usage(output).unwrap_or_else(|| ResourceUsage::UNKNOWN.to_string()),
        storage: storage_usage(output).unwrap_or_else(|| ResourceUsage::UNKNOWN.to_string()),
    }
}

/// `used/total MB` from the `Mem:` line of `free -m`.
fn memory_usage(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.trim_start().starts_with("Mem:"))?;
    let mut fields = line.split_whitespace().skip(1);
    let total = fields.next()?;
    let used = fields.next()?;
    if total.parse::<u64>().is_err() || used.parse::<u64>().is_err() {
        return None;
    }
    Some(format!("{used}/{total} MB"))
}

/// `NN.N%` user CPU from the `%Cpu(s)` line of `top`.
fn cpu_usage(output: &str) -> Option<String> {
    let line = output.lines().find(|l| l.contains("%Cpu"))?;
    let user = Regex::new(r"(\d+\.\d+)\s*%?\s*us").ok()?;
    let any = Regex::new(r"(\d+\.\d+)").ok()?;
    let caps = user.captures(line).or_else(|| any.captures(line))?;
    Some(format!("{}%", &caps[1]))
}

/// `used/avail` for the root filesystem from `df -h`.
fn storage_usage(output: &str) -> Option<String> {
    let mounts: Vec<&str> = output
        .lines()
        .filter(|l| l.starts_with('/') || l.starts_with("overlay") || l.ends_with(" /"))
        .collect();
    let line = mounts
        .iter()
        .find(|l| l.split_whitespace().last() == Some("/"))
        .or_else(|| mounts.first())?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    // Filesystem Size Used Avail Use% Mounted
    if fields.len() < 6 {
        return None;
    }
    Some(format!("{}/{}", fields[2], fields[3]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
              total        used        free      shared  buff/cache   available
Mem:           7951        1234        4000          12        2716        6400
Swap:             0           0           0
Filesystem      Size  Used Avail Use% Mounted on
overlay          59G   12G   45G  21% /
tmpfs            64M     0   64M   0% /dev
top - 10:00:00 up 1 day,  1 user,  load average: 0.00, 0.01, 0.05
Tasks:   5 total,   1 running,   4 sleeping,   0 stopped,   0 zombie
%Cpu(s): 12.5 us,  3.1 sy,  0.0 ni, 84.4 id,  0.0 wa,  0.0 hi,  0.0 si,  0.0 st
MiB Mem :   7951.0 total,   4000.0 free,   1234.0 used,   2716.0 buff/cache
";

    #[test]
    fn test_parse_full_output() {
        let usage = parse_resource_usage(SAMPLE);
        assert_eq!(usage.memory, "1234/7951 MB");
        assert_eq!(usage.cpu, "12.5%");
        assert_eq!(usage.storage, "12G/45G");
    }

    #[test]
    fn test_unparsable_output_is_unknown() {
        assert_eq!(parse_resource_usage("bash: free: command not found"), ResourceUsage::unknown());
    }

    #[test]
    fn test_fields_degrade_independently() {
        let usage = parse_resource_usage("Mem: 100 40 60\n");
        assert_eq!(usage.memory, "40/100 MB");
        assert_eq!(usage.cpu, "unknown");
        assert_eq!(usage.storage, "unknown");
    }
}

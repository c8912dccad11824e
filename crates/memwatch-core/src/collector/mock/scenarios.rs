//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` states for the host and
//! per-process readers.

use super::filesystem::MockFs;

/// `/proc/[pid]/status` of a node server, trimmed to the usual leading fields
/// plus the memory block.
const NODE_STATUS: &str = "\
Name:\tnode
Umask:\t0022
State:\tS (sleeping)
Tgid:\t1000
Ngid:\t0
Pid:\t1000
PPid:\t1
TracerPid:\t0
Uid:\t1000\t1000\t1000\t1000
Gid:\t1000\t1000\t1000\t1000
FDSize:\t64
VmPeak:\t 1200000 kB
VmSize:\t 1100000 kB
VmLck:\t       0 kB
VmPin:\t       0 kB
VmHWM:\t  300000 kB
VmRSS:\t  250000 kB
RssAnon:\t  200000 kB
RssFile:\t   50000 kB
RssShmem:\t       0 kB
VmData:\t  400000 kB
VmStk:\t     132 kB
VmExe:\t   80000 kB
VmLib:\t    5000 kB
VmPTE:\t    1200 kB
VmSwap:\t       0 kB
Threads:\t11
voluntary_ctxt_switches:\t1500
nonvoluntary_ctxt_switches:\t30
";

/// Kernel threads have no memory block in their status file.
const KTHREAD_STATUS: &str = "\
Name:\tkthreadd
State:\tS (sleeping)
Tgid:\t2
Pid:\t2
PPid:\t0
Threads:\t1
voluntary_ctxt_switches:\t100
nonvoluntary_ctxt_switches:\t0
";

impl MockFs {
    /// Creates a typical host with a full `/proc/meminfo` and two processes:
    /// a node server (PID 1000) and a kernel thread (PID 2).
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:       16384000 kB
MemFree:         8192000 kB
MemAvailable:   12000000 kB
Buffers:          512000 kB
Cached:          2048000 kB
SwapCached:            0 kB
Active:          4096000 kB
Inactive:        2048000 kB
SwapTotal:       4096000 kB
SwapFree:        4096000 kB
Dirty:              1024 kB
Writeback:             0 kB
Slab:             512000 kB
SReclaimable:     256000 kB
HugePages_Total:       0
",
        );

        fs.add_process(1000, NODE_STATUS);
        fs.add_process(2, KTHREAD_STATUS);

        fs
    }

    /// Creates a host whose `/proc/meminfo` holds only the five counters the
    /// host reader consumes, with easy numbers for arithmetic checks.
    pub fn minimal_host() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:           1000 kB
MemFree:             200 kB
MemAvailable:        700 kB
Buffers:              50 kB
Cached:               50 kB
",
        );
        fs
    }

    /// Creates a host on an old kernel (pre 3.14) without `MemAvailable`.
    ///
    /// `Buffers` and `Cached` move up one line and `SwapCached` lands
    /// inside the scanned window.
    pub fn legacy_kernel() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:        2048000 kB
MemFree:          512000 kB
Buffers:          128000 kB
Cached:           256000 kB
SwapCached:            0 kB
Active:           900000 kB
",
        );
        fs
    }

    /// Creates a host whose `/proc/meminfo` has a corrupted line among the
    /// scanned ones.
    pub fn corrupted_meminfo() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/meminfo",
            "\
MemTotal:           1000 kB
MemFree:          garbage kB
MemAvailable:        700 kB
Buffers:              50 kB
Cached:               50 kB
",
        );
        fs
    }
}

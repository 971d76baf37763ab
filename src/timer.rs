//! Monotonic time sources.
//!
//! Two acquisition paths read the same `CLOCK_MONOTONIC` domain:
//!
//! - [`LibraryClock`] calls libc `clock_gettime`, which the C library may satisfy from the
//!   vDSO without entering the kernel.
//! - [`SyscallClock`] issues `syscall(SYS_clock_gettime, ...)` directly, always trapping.
//!
//! Values from both are directly comparable in nanoseconds.

use std::io;

pub const NS_PER_SEC: i64 = 1_000_000_000;

/// An instant on the monotonic clock, split as the kernel reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimePoint {
    secs: i64,
    nanos: u32,
}

impl TimePoint {
    /// Build a time point. `nanos` must be below one second.
    pub fn new(secs: i64, nanos: u32) -> io::Result<Self> {
        if i64::from(nanos) >= NS_PER_SEC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("sub-second component out of range: {nanos} ns"),
            ));
        }
        Ok(Self { secs, nanos })
    }

    /// Time point `ns` nanoseconds after the clock's origin.
    pub fn from_nanos(ns: i64) -> Self {
        Self {
            secs: ns.div_euclid(NS_PER_SEC),
            nanos: ns.rem_euclid(NS_PER_SEC) as u32,
        }
    }

    fn from_timespec(ts: &libc::timespec) -> io::Result<Self> {
        let nanos = u32::try_from(ts.tv_nsec)
            .map_err(|_| io::Error::other(format!("negative tv_nsec: {}", ts.tv_nsec)))?;
        Self::new(ts.tv_sec as i64, nanos)
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn subsec_nanos(&self) -> u32 {
        self.nanos
    }

    /// Flatten to a single nanosecond count: `secs * 10^9 + nanos`.
    pub fn as_nanos(&self) -> i64 {
        self.secs * NS_PER_SEC + i64::from(self.nanos)
    }
}

/// Something that can be sampled for the current monotonic time.
///
/// Takes `&mut self` so scripted and simulated clocks can advance internal state.
pub trait TimeSource {
    fn now(&mut self) -> io::Result<TimePoint>;
}

/// `clock_gettime(CLOCK_MONOTONIC)` through libc; eligible for the vDSO fast path.
#[derive(Clone, Copy, Debug, Default)]
pub struct LibraryClock;

impl TimeSource for LibraryClock {
    #[inline]
    fn now(&mut self) -> io::Result<TimePoint> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `ts` is a valid, writable timespec for the duration of the call.
        let rc = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        TimePoint::from_timespec(&ts)
    }
}

/// `CLOCK_MONOTONIC` read via a raw `SYS_clock_gettime` trap, bypassing the vDSO.
#[derive(Clone, Copy, Debug, Default)]
pub struct SyscallClock;

impl TimeSource for SyscallClock {
    #[inline]
    fn now(&mut self) -> io::Result<TimePoint> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: SYS_clock_gettime takes (clockid_t, *mut timespec); `ts` outlives the call.
        let rc = unsafe {
            libc::syscall(
                libc::SYS_clock_gettime,
                libc::CLOCK_MONOTONIC,
                &mut ts as *mut libc::timespec,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        TimePoint::from_timespec(&ts)
    }
}

/// Check that a clock answers and does not run backwards across two reads.
///
/// Called once before benchmarking so an unusable clock fails up front.
pub fn probe<C: TimeSource + ?Sized>(clock: &mut C) -> io::Result<()> {
    let first = clock.now()?;
    let second = clock.now()?;
    if second < first {
        return Err(io::Error::other(format!(
            "monotonic clock went backwards during probe ({} ns -> {} ns)",
            first.as_nanos(),
            second.as_nanos()
        )));
    }
    Ok(())
}

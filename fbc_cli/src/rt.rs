//! Real-time scheduling helpers (Linux SCHED_FIFO + mlockall).

use crate::cli::RtLock;

#[cfg(target_os = "linux")]
pub fn setup_rt_once(prio: Option<i32>, lock: RtLock) {
    use libc::{
        MCL_CURRENT, MCL_FUTURE, SCHED_FIFO, mlockall, sched_get_priority_max,
        sched_get_priority_min, sched_param, sched_setscheduler,
    };
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    #[inline]
    fn is_retryable_memlock_error(err: &std::io::Error) -> bool {
        matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM)
    }

    fn mlock(flags: libc::c_int) -> std::io::Result<()> {
        let rc = unsafe { mlockall(flags) };
        if rc != 0 {
            Err(std::io::Error::last_os_error())
        } else {
            Ok(())
        }
    }

    fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
        let result = match lock {
            RtLock::None => return Ok(()),
            RtLock::Current => mlock(MCL_CURRENT),
            RtLock::All => mlock(MCL_CURRENT | MCL_FUTURE),
        };
        let Err(err) = result else {
            return Ok(());
        };

        // current|future is refused more often than current alone
        if lock == RtLock::All && is_retryable_memlock_error(&err) && mlock(MCL_CURRENT).is_ok() {
            tracing::warn!(error = %err, "mlockall(current|future) failed; locked current pages only");
            return Ok(());
        }

        let mut msg = format!("mlockall failed: {err}");
        if is_retryable_memlock_error(&err) {
            msg.push_str("; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
        }
        Err(eyre::eyre!(msg))
    }

    // Apply SCHED_FIFO priority, clamped to the system range.
    fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<i32> {
        let (min, max) = unsafe {
            let min = sched_get_priority_min(SCHED_FIFO);
            let max = sched_get_priority_max(SCHED_FIFO);
            if min < 0 || max < 0 {
                (1, 99)
            } else {
                (min, max)
            }
        };
        let prio_val = prio.unwrap_or(max).clamp(min, max);
        let param = sched_param {
            sched_priority: prio_val,
        };
        let rc = unsafe { sched_setscheduler(0, SCHED_FIFO, &param) };
        if rc != 0 {
            let err = std::io::Error::last_os_error();
            Err(eyre::eyre!(
                "sched_setscheduler(SCHED_FIFO, {prio_val}) failed: {err}; needs CAP_SYS_NICE or root"
            ))
        } else {
            Ok(prio_val)
        }
    }

    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "RT: memory lock not applied"),
        }
        match try_apply_fifo_priority(prio) {
            Ok(p) => tracing::info!(priority = p, "RT: SCHED_FIFO enabled"),
            Err(err) => tracing::warn!(error = %err, "RT: SCHED_FIFO not applied"),
        }
    });
}

#[cfg(not(target_os = "linux"))]
pub fn setup_rt_once(prio: Option<i32>, lock: RtLock) {
    tracing::warn!(?prio, ?lock, "real-time mode is only supported on Linux; ignoring --rt");
}

//! Real-time scheduling helpers (Linux SCHED_FIFO / mlockall).

use crate::cli::RtLock;

/// Apply memory locking and SCHED_FIFO once per process. Failures are reported as
/// warnings; the run continues without real-time guarantees.
pub fn setup_rt_once(rt: bool, prio: Option<i32>, lock: RtLock) {
    use std::sync::OnceLock;
    static RT_ONCE: OnceLock<()> = OnceLock::new();

    if !rt {
        return;
    }

    RT_ONCE.get_or_init(|| {
        match try_apply_mem_lock(lock) {
            Ok(()) => tracing::info!(?lock, "RT: memory lock applied"),
            Err(err) => tracing::warn!(error = %err, "mlockall failed"),
        }
        if let Err(err) = try_apply_fifo_priority(prio) {
            let prio_dbg = prio
                .map(|p| p.to_string())
                .unwrap_or_else(|| "(max)".into());
            tracing::warn!(error = %err, prio = %prio_dbg, "sched_setscheduler(SCHED_FIFO) failed");
        }
    });
}

fn try_apply_mem_lock(lock: RtLock) -> eyre::Result<()> {
    use libc::{MCL_CURRENT, MCL_FUTURE, mlockall};

    let flags = match lock {
        RtLock::None => return Ok(()),
        RtLock::Current => MCL_CURRENT,
        RtLock::All => MCL_CURRENT | MCL_FUTURE,
    };
    // SAFETY: mlockall takes only flags and touches no Rust-managed memory.
    let rc = unsafe { mlockall(flags) };
    if rc == 0 {
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    if matches!(err.raw_os_error(), Some(code) if code == libc::EPERM || code == libc::ENOMEM) {
        eyre::bail!("{err}; hint: needs CAP_IPC_LOCK (or root) and sufficient 'ulimit -l'");
    }
    Err(eyre::eyre!(err))
}

/// Apply SCHED_FIFO priority, clamped to the system range.
fn try_apply_fifo_priority(prio: Option<i32>) -> eyre::Result<()> {
    use libc::{SCHED_FIFO, sched_get_priority_max, sched_get_priority_min, sched_param};

    // SAFETY: plain syscalls without pointers.
    let (min, max) = unsafe {
        let min = sched_get_priority_min(SCHED_FIFO);
        let max = sched_get_priority_max(SCHED_FIFO);
        if min < 0 || max < 0 { (1, 99) } else { (min, max) }
    };
    let param = sched_param {
        sched_priority: prio.unwrap_or(max).clamp(min, max),
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling process.
    let rc = unsafe { libc::sched_setscheduler(0, SCHED_FIFO, &param) };
    if rc != 0 {
        let is_root = unsafe { libc::geteuid() == 0 };
        let err = std::io::Error::last_os_error();
        if !is_root {
            eyre::bail!("{err}; hint: needs CAP_SYS_NICE or root ('sudo setcap cap_sys_nice=ep /path/to/rotor')");
        }
        return Err(eyre::eyre!(err));
    }
    Ok(())
}

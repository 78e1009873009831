use std::{env, path::PathBuf, process::Stdio};

use anyhow::Result;
use sysinfo::{get_current_pid, Signal, System};

/// Resolves the reminder daemon binary, which is installed next to the cli.
pub fn daemon_path() -> Result<PathBuf> {
    let mut path = env::current_exe()?;
    path.set_file_name("daydose-daemon");
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    Ok(path)
}

/// Terminates every running reminder daemon. Matching is done on the executable path so other
/// users' daemons with a different install location are left alone.
pub fn kill_reminder_daemons(daemon: &std::path::Path) {
    let system = System::new_all();
    let current_id = get_current_pid().unwrap();
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| daemon == *v)
            .is_some()
        {
            // This will forcefully terminate the process on Windows. Anything better will require
            // a lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
}

/// Replaces any running reminder daemon with a fresh one firing at `hour:minute`. The daemon
/// detaches itself from the spawning console, so this returns as soon as the handoff is done.
pub fn restart_reminder_daemon(
    hour: u32,
    minute: u32,
    dir: Option<&std::path::Path>,
) -> Result<()> {
    let daemon = daemon_path()?;
    kill_reminder_daemons(&daemon);

    let mut command = std::process::Command::new(daemon);
    command.args(["--hour", &hour.to_string(), "--minute", &minute.to_string()]);
    if let Some(dir) = dir {
        command.arg("--dir");
        command.arg(dir);
    }

    #[cfg(feature = "win")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS.0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
    }

    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    Ok(())
}

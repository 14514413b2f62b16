//! Detached launching of the cached sidecar executable.
//!
//! The launcher starts the sidecar and returns as soon as the operating
//! system confirms process creation. It never waits on the child's main
//! thread and never captures output. Callers that want the outcome can
//! opt in through [`LaunchedProcess::on_exit`] or
//! [`LaunchedProcess::wait_timeout`]; otherwise a reaper thread records the
//! exit status at `debug` level when the child finishes.

use log::{debug, warn};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use crate::error::{LauncherError, Result};

/// Windows creation flag suppressing the console window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Windows creation flag detaching the child from the caller's Ctrl+C group.
#[cfg(windows)]
const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

/// What to start and with which target.
///
/// # Examples
///
/// ```
/// use tagsheet_launcher::spawn::LaunchRequest;
///
/// let request = LaunchRequest::new("/opt/tagsheet-export").with_target("TagsA");
/// assert_eq!(request.arguments(), vec!["TagsA"]);
/// assert_eq!(request.command_line(), r#""/opt/tagsheet-export" "TagsA""#);
///
/// let request = LaunchRequest::new("/opt/tagsheet-export");
/// assert!(request.arguments().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    executable: PathBuf,
    target: Option<String>,
}

impl LaunchRequest {
    /// Request a launch of `executable` with no target.
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            target: None,
        }
    }

    /// Restrict the launched operation to `target`.
    ///
    /// A blank target is the same as no target.
    #[must_use]
    pub fn with_target(self, target: impl Into<String>) -> Self {
        self.with_optional_target(Some(target.into()))
    }

    /// Set or clear the target.
    #[must_use]
    pub fn with_optional_target(mut self, target: Option<String>) -> Self {
        self.target = target.filter(|name| !name.trim().is_empty());
        self
    }

    /// The executable to start.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// The target name, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Argument list handed to the child: the target as a single token, or
    /// nothing.
    #[must_use]
    pub fn arguments(&self) -> Vec<&str> {
        self.target.as_deref().into_iter().collect()
    }

    /// Human-readable command line with every token double-quoted.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(quote(&self.executable.to_string_lossy()))
            .chain(self.target.as_deref().map(quote))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn quote(token: &str) -> String {
    format!("\"{}\"", token.replace('"', "\\\""))
}

/// Creates operating system processes, abstracted for testing.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessSpawner {
    /// Start the process described by `request` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns the operating system's error when the process cannot be
    /// created.
    fn spawn(&self, request: &LaunchRequest) -> io::Result<LaunchedProcess>;
}

/// Spawns real processes with no console window and no inherited stdio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSpawner;

impl ProcessSpawner for SystemSpawner {
    fn spawn(&self, request: &LaunchRequest) -> io::Result<LaunchedProcess> {
        let mut command = Command::new(request.executable());
        command
            .args(request.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = request
            .executable()
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            command.current_dir(dir);
        }
        detach_from_console(&mut command);
        command.spawn().map(LaunchedProcess::from_child)
    }
}

#[cfg(windows)]
fn detach_from_console(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    command.creation_flags(CREATE_NO_WINDOW | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(unix)]
fn detach_from_console(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(not(any(unix, windows)))]
fn detach_from_console(_command: &mut Command) {}

/// Start the sidecar described by `request`.
///
/// # Errors
///
/// Returns [`LauncherError::Spawn`] when the operating system refuses to
/// create the process.
pub fn launch(spawner: &dyn ProcessSpawner, request: &LaunchRequest) -> Result<LaunchedProcess> {
    debug!("launching {}", request.command_line());
    let process = spawner
        .spawn(request)
        .map_err(|source| LauncherError::Spawn {
            path: request.executable().to_path_buf(),
            source,
        })?;
    debug!("started process {}", process.id());
    Ok(process)
}

/// Handle to a started sidecar.
///
/// Dropping the handle never kills the child. If the child is still being
/// tracked at that point, a reaper thread waits for it and logs the exit
/// status.
#[derive(Debug)]
pub struct LaunchedProcess {
    pid: u32,
    child: Option<Child>,
}

impl LaunchedProcess {
    /// Track a child created by [`std::process::Command`].
    #[must_use]
    pub fn from_child(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
        }
    }

    /// Describe a process that cannot be monitored, such as one recorded by a
    /// test spawner.
    #[must_use]
    pub const fn from_pid(pid: u32) -> Self {
        Self { pid, child: None }
    }

    /// Operating system process identifier.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.pid
    }

    /// Stop tracking the child; its exit status is logged when it ends.
    pub fn detach(self) {
        drop(self);
    }

    /// Invoke `callback` with the exit status once the child ends.
    ///
    /// The callback runs on a dedicated thread. For an unmonitored process it
    /// receives an [`io::ErrorKind::Unsupported`] error immediately.
    pub fn on_exit<F>(mut self, callback: F)
    where
        F: FnOnce(io::Result<ExitStatus>) + Send + 'static,
    {
        match self.child.take() {
            Some(child) => watch(self.pid, child, callback),
            None => callback(Err(unmonitored(self.pid))),
        }
    }

    /// Wait up to `timeout` for the child to exit.
    ///
    /// Returns `Ok(None)` if the child is still running; it keeps running and
    /// remains tracked.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when waiting fails or when the process is not
    /// monitored.
    pub fn wait_timeout(&mut self, timeout: Duration) -> io::Result<Option<ExitStatus>> {
        let child = self
            .child
            .as_mut()
            .ok_or_else(|| unmonitored(self.pid))?;
        let status = child.wait_timeout(timeout)?;
        if status.is_some() {
            self.child = None;
        }
        Ok(status)
    }
}

impl Drop for LaunchedProcess {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            let pid = self.pid;
            watch(pid, child, move |status| match status {
                Ok(status) => debug!("sidecar process {pid} exited with {status}"),
                Err(err) => debug!("lost track of sidecar process {pid}: {err}"),
            });
        }
    }
}

fn unmonitored(pid: u32) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("process {pid} is not monitored"),
    )
}

fn watch<F>(pid: u32, mut child: Child, callback: F)
where
    F: FnOnce(io::Result<ExitStatus>) + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name(format!("sidecar-{pid}"))
        .spawn(move || callback(child.wait()));
    if let Err(err) = spawned {
        warn!("could not start a monitor thread for process {pid}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case::table(Some("TagsA"), vec!["TagsA"])]
    #[case::spaces(Some("Tags with spaces"), vec!["Tags with spaces"])]
    #[case::none(None, vec![])]
    #[case::blank(Some("  "), vec![])]
    fn arguments_hold_at_most_one_token(
        #[case] target: Option<&str>,
        #[case] expected: Vec<&str>,
    ) {
        let request =
            LaunchRequest::new("/opt/sidecar").with_optional_target(target.map(str::to_owned));
        assert_eq!(request.arguments(), expected);
    }

    #[test]
    fn command_line_quotes_each_token() {
        let request = LaunchRequest::new("/opt/side car").with_target(r#"Tags "A""#);
        assert_eq!(request.command_line(), r#""/opt/side car" "Tags \"A\"""#);
    }

    #[test]
    fn launch_passes_request_to_spawner() {
        let mut spawner = MockProcessSpawner::new();
        spawner
            .expect_spawn()
            .withf(|request| request.arguments() == vec!["TagsA"])
            .times(1)
            .returning(|_| Ok(LaunchedProcess::from_pid(42)));

        let request = LaunchRequest::new("/opt/sidecar").with_target("TagsA");
        let process = launch(&spawner, &request).expect("launch");
        assert_eq!(process.id(), 42);
    }

    #[test]
    fn spawn_failure_names_the_executable() {
        let mut spawner = MockProcessSpawner::new();
        spawner
            .expect_spawn()
            .returning(|_| Err(io::Error::from(io::ErrorKind::PermissionDenied)));

        let err = launch(&spawner, &LaunchRequest::new("/opt/sidecar")).expect_err("refused");
        assert_eq!(err.kind(), ErrorKind::Spawn);
        assert!(err.to_string().contains("/opt/sidecar"));
    }

    #[test]
    fn missing_executable_fails_synchronously() {
        let dir = tempfile::tempdir().expect("temp dir");
        let request = LaunchRequest::new(dir.path().join("absent"));
        let err = launch(&SystemSpawner, &request).expect_err("missing executable");
        assert_eq!(err.kind(), ErrorKind::Spawn);
    }

    #[test]
    fn unmonitored_process_reports_unsupported() {
        let mut process = LaunchedProcess::from_pid(7);
        let err = process
            .wait_timeout(Duration::from_millis(1))
            .expect_err("not monitored");
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let (tx, rx) = std::sync::mpsc::channel();
        process.on_exit(move |status| {
            tx.send(status.is_err()).expect("send");
        });
        assert!(rx.recv().expect("callback ran"));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        const TIMEOUT: Duration = Duration::from_secs(10);

        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("sidecar.sh");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        #[rstest]
        #[case::with_target(Some("TagsA"), "1|TagsA")]
        #[case::without_target(None, "0|")]
        fn child_receives_the_target_token(#[case] target: Option<&str>, #[case] expected: &str) {
            let dir = tempfile::tempdir().expect("temp dir");
            let path = script(dir.path(), r#"printf '%s|%s' "$#" "$1" > args.txt"#);
            let request = LaunchRequest::new(&path).with_optional_target(target.map(str::to_owned));

            let mut process = launch(&SystemSpawner, &request).expect("launch");
            let status = process.wait_timeout(TIMEOUT).expect("wait").expect("exited");

            assert!(status.success());
            let recorded = fs::read_to_string(dir.path().join("args.txt")).expect("args file");
            assert_eq!(recorded, expected);
        }

        #[test]
        fn on_exit_reports_the_exit_status() {
            let dir = tempfile::tempdir().expect("temp dir");
            let path = script(dir.path(), "exit 3");
            let process = launch(&SystemSpawner, &LaunchRequest::new(&path)).expect("launch");

            let (tx, rx) = std::sync::mpsc::channel();
            process.on_exit(move |status| {
                tx.send(status.expect("status").code()).expect("send");
            });
            assert_eq!(rx.recv_timeout(TIMEOUT).expect("exit reported"), Some(3));
        }

        #[test]
        fn launch_returns_before_the_child_exits() {
            let dir = tempfile::tempdir().expect("temp dir");
            let path = script(dir.path(), "sleep 5");
            let mut process = launch(&SystemSpawner, &LaunchRequest::new(&path)).expect("launch");

            assert!(
                process
                    .wait_timeout(Duration::from_millis(50))
                    .expect("wait")
                    .is_none(),
                "child should still be running"
            );
            // SAFETY: the pid belongs to a child this test just started and
            // still tracks, so it cannot have been reused.
            let rc = unsafe { libc::kill(process.id() as libc::pid_t, libc::SIGKILL) };
            assert_eq!(rc, 0);
            process.detach();
        }
    }
}

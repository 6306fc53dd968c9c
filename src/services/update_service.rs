use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::error::AppError;
use crate::models::version::{RemoteVersionDocument, Version, VersionDescriptor};
use crate::shell::safety::{self, ScriptStyle};

const DOWNLOAD_READ_TIMEOUT: Duration = Duration::from_secs(120);
const STAGED_SUFFIX: &str = "_new";
const HELPER_DELAY_SECS: u32 = 2;

fn agent(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .build()
}

pub fn parse_descriptor(body: &str) -> Result<VersionDescriptor, AppError> {
    let doc: RemoteVersionDocument = serde_json::from_str(body)?;
    let raw_version = doc
        .version
        .ok_or_else(|| AppError::Update("version document has no `version`".to_string()))?;
    let url = doc
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AppError::Update("version document has no `url`".to_string()))?;
    let version = raw_version.parse::<Version>().map_err(AppError::Update)?;
    Ok(VersionDescriptor {
        version,
        url: url.trim().to_string(),
    })
}

fn fetch_descriptor(endpoint: &str, timeout: Duration) -> Result<VersionDescriptor, AppError> {
    let body = agent(timeout, timeout)
        .get(endpoint)
        .timeout(timeout)
        .call()?
        .into_string()?;
    parse_descriptor(&body)
}

/// Asks `endpoint` for the latest version and returns it only when it is
/// strictly newer than `current`. Never fails: every problem is logged and
/// treated as "no update".
pub fn check(endpoint: &str, current: &str, timeout: Duration) -> Option<VersionDescriptor> {
    if endpoint.trim().is_empty() {
        tracing::debug!("no update endpoint configured, skipping update check");
        return None;
    }

    let current = match current.parse::<Version>() {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "current version is not a semantic version");
            return None;
        }
    };

    match fetch_descriptor(endpoint, timeout) {
        Ok(descriptor) if descriptor.version > current => {
            tracing::info!(
                current = %current,
                available = %descriptor.version,
                "update available"
            );
            Some(descriptor)
        }
        Ok(descriptor) => {
            tracing::debug!(current = %current, remote = %descriptor.version, "up to date");
            None
        }
        Err(e) => {
            tracing::warn!(endpoint, error = %e, "update check failed");
            None
        }
    }
}

/// Replaces the running executable with a downloaded one.
///
/// The running file is never touched by this process. The new binary is
/// staged next to it, and a detached helper script performs the delete,
/// rename and relaunch after this process has exited.
pub struct UpdateInstaller {
    current_exe: PathBuf,
    script_dir: PathBuf,
    style: ScriptStyle,
    connect_timeout: Duration,
}

impl UpdateInstaller {
    pub fn new(current_exe: PathBuf, script_dir: PathBuf, connect_timeout: Duration) -> Self {
        Self {
            current_exe,
            script_dir,
            style: ScriptStyle::native(),
            connect_timeout,
        }
    }

    pub fn for_current_process(connect_timeout: Duration) -> Result<Self, AppError> {
        let current_exe = std::env::current_exe()?;
        Ok(Self::new(current_exe, std::env::temp_dir(), connect_timeout))
    }

    /// `<dir>/<stem>_new<.ext>` next to the current executable.
    pub fn staged_path(&self) -> PathBuf {
        let stem = self
            .current_exe
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let name = match self.current_exe.extension() {
            Some(ext) => format!("{stem}{STAGED_SUFFIX}.{}", ext.to_string_lossy()),
            None => format!("{stem}{STAGED_SUFFIX}"),
        };
        self.current_exe.with_file_name(name)
    }

    /// Streams `url` into the staged path. On any failure the partial file is
    /// removed.
    pub fn download(&self, url: &str) -> Result<PathBuf, AppError> {
        let staged = self.staged_path();
        match self.download_to(url, &staged) {
            Ok(bytes) => {
                tracing::info!(path = %staged.display(), bytes, "update downloaded");
                Ok(staged)
            }
            Err(e) => {
                let _ = fs::remove_file(&staged);
                Err(e)
            }
        }
    }

    fn download_to(&self, url: &str, staged: &Path) -> Result<u64, AppError> {
        let resp = agent(self.connect_timeout, DOWNLOAD_READ_TIMEOUT)
            .get(url)
            .call()?;
        let expected = resp
            .header("Content-Length")
            .and_then(|h| h.trim().parse::<u64>().ok());

        let mut reader = resp.into_reader();
        let mut file = fs::File::create(staged)?;
        let written = std::io::copy(&mut reader, &mut file)
            .map_err(|e| AppError::Update(format!("download interrupted: {e}")))?;
        file.flush()?;
        file.sync_all()?;

        match expected {
            Some(expected) if expected != written => {
                return Err(AppError::Update(format!(
                    "download truncated: received {written} of {expected} bytes"
                )));
            }
            None => tracing::warn!(url, "download had no Content-Length, size not verified"),
            _ => {}
        }
        if written == 0 {
            return Err(AppError::Update("downloaded file is empty".to_string()));
        }

        copy_permissions(&self.current_exe, staged)?;
        Ok(written)
    }

    pub fn helper_script(&self, staged: &Path) -> Result<String, AppError> {
        let old = self.current_exe.to_string_lossy();
        let new = staged.to_string_lossy();
        safety::validate_script_path(&old, self.style)?;
        safety::validate_script_path(&new, self.style)?;
        let old = safety::quote(&old, self.style);
        let new = safety::quote(&new, self.style);

        let script = match self.style {
            ScriptStyle::Batch => format!(
                "@echo off\r\n\
                 timeout /t {HELPER_DELAY_SECS} /nobreak >nul\r\n\
                 del /f /q {old}\r\n\
                 move /y {new} {old} >nul\r\n\
                 start \"\" {old}\r\n\
                 del \"%~f0\"\r\n"
            ),
            ScriptStyle::Posix => format!(
                "#!/bin/sh\n\
                 sleep {HELPER_DELAY_SECS}\n\
                 rm -f {old}\n\
                 mv -f {new} {old}\n\
                 chmod +x {old}\n\
                 nohup {old} >/dev/null 2>&1 &\n\
                 rm -f \"$0\"\n"
            ),
        };
        Ok(script)
    }

    pub fn schedule_replace(&self, staged: &Path) -> Result<PathBuf, AppError> {
        let script = self.helper_script(staged)?;
        fs::create_dir_all(&self.script_dir)?;
        let path = self.script_dir.join(format!(
            "pdfhub_updater_{}.{}",
            uuid::Uuid::new_v4(),
            self.style.extension()
        ));
        fs::write(&path, script)?;
        set_executable(&path)?;
        tracing::info!(path = %path.display(), "update helper written");
        Ok(path)
    }

    /// Starts the helper detached from this process. The caller must exit
    /// right after this returns so the helper can replace the executable.
    pub fn handoff(&self, script: &Path) -> Result<(), AppError> {
        let mut command = match self.style {
            ScriptStyle::Batch => {
                let mut c = Command::new("cmd");
                c.arg("/C").arg(script);
                c
            }
            ScriptStyle::Posix => {
                let mut c = Command::new("sh");
                c.arg(script);
                c
            }
        };
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut command);
        command
            .spawn()
            .map_err(|e| AppError::Update(format!("failed to launch update helper: {e}")))?;
        tracing::info!(script = %script.display(), "update helper launched");
        Ok(())
    }

    pub fn install(&self, descriptor: &VersionDescriptor) -> Result<(), AppError> {
        tracing::info!(version = %descriptor.version, url = %descriptor.url, "installing update");
        let staged = self.download(&descriptor.url)?;
        let script = match self.schedule_replace(&staged) {
            Ok(script) => script,
            Err(e) => {
                let _ = fs::remove_file(&staged);
                return Err(e);
            }
        };
        if let Err(e) = self.handoff(&script) {
            let _ = fs::remove_file(&script);
            let _ = fs::remove_file(&staged);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(unix)]
fn copy_permissions(from: &Path, to: &Path) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    let mode = fs::metadata(from)
        .map(|m| m.permissions().mode())
        .unwrap_or(0o755);
    fs::set_permissions(to, fs::Permissions::from_mode(mode | 0o100))?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_permissions(_from: &Path, _to: &Path) -> Result<(), AppError> {
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), AppError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), AppError> {
    Ok(())
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    command.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}

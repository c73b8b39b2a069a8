//! Native compiler discovery and invocation (`spec.md` §4.9).

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

pub struct NativeCompiler {
    binary: String,
}

/// Consults `CC`, then tries `cc`, `clang`, `gcc` in order; `None` if none of
/// them is callable.
pub fn locate() -> Option<NativeCompiler> {
    let mut candidates = Vec::new();
    if let Ok(cc) = env::var("CC") {
        candidates.push(cc);
    }
    candidates.extend(["cc", "clang", "gcc"].iter().map(|s| s.to_string()));

    candidates.into_iter().find(|bin| is_callable(bin)).map(|binary| NativeCompiler { binary })
}

fn is_callable(binary: &str) -> bool {
    Command::new(binary).arg("--version").output().map(|o| o.status.success()).unwrap_or(false)
}

/// Owns the temporary directory holding the compiled kernel; removed on drop.
pub struct NativeHandle {
    _dir: tempfile::TempDir,
    exe_path: PathBuf,
}

impl NativeCompiler {
    pub fn compile(&self, c_source: &str) -> Result<NativeHandle, String> {
        let dir = tempfile::tempdir().map_err(|e| format!("failed to create temp directory: {e}"))?;
        let src_path = dir.path().join("kernel.c");
        fs::write(&src_path, c_source).map_err(|e| format!("failed to write kernel source: {e}"))?;
        let exe_path = dir.path().join("kernel");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("-O3").arg("-std=c11");
        if cfg!(any(target_arch = "x86_64", target_arch = "aarch64")) {
            cmd.arg("-march=native").arg("-mtune=native");
        }
        cmd.arg(&src_path).arg("-o").arg(&exe_path).arg("-lm");

        let output = cmd.output().map_err(|e| format!("failed to invoke compiler: {e}"))?;
        if !output.status.success() {
            return Err(format!("native compile failed: {}", String::from_utf8_lossy(&output.stderr)));
        }
        Ok(NativeHandle { _dir: dir, exe_path })
    }
}

/// Native-integer arithmetic traps (div-by-zero, overflow on some targets)
/// kill the kernel with a signal rather than a clean exit, which is the
/// documented price of emitting plain `int64_t` arithmetic instead of a
/// checked runtime (`native/transpiler.rs`). Name the signal when we can so
/// the error reads better than a bare nonzero exit code.
#[cfg(unix)]
fn describe_failure(status: &std::process::ExitStatus, stderr: &[u8]) -> String {
    use std::os::unix::process::ExitStatusExt;
    match status.signal() {
        Some(sig) => {
            let name = unsafe { libc::strsignal(sig) };
            let name = if name.is_null() {
                "unknown signal".to_string()
            } else {
                unsafe { std::ffi::CStr::from_ptr(name) }.to_string_lossy().into_owned()
            };
            format!("killed by signal {sig} ({name})")
        }
        None => String::from_utf8_lossy(stderr).into_owned(),
    }
}

#[cfg(not(unix))]
fn describe_failure(_status: &std::process::ExitStatus, stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeIterationResult {
    pub iterations: u64,
    pub total_ms: f64,
    pub mean_ms: f64,
    pub checksum: u64,
}

impl NativeHandle {
    pub fn execute_once(&self) -> Result<i64, String> {
        let output = Command::new(&self.exe_path).arg("--raw").output().map_err(|e| format!("failed to spawn kernel: {e}"))?;
        if !output.status.success() {
            return Err(format!("kernel exited with failure: {}", describe_failure(&output.status, &output.stderr)));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        text.trim().parse::<i64>().map_err(|e| format!("unparseable kernel output {text:?}: {e}"))
    }

    pub fn execute_iterations(&self, n: u64) -> Result<NativeIterationResult, String> {
        let output = Command::new(&self.exe_path).arg(n.to_string()).output().map_err(|e| format!("failed to spawn kernel: {e}"))?;
        if !output.status.success() {
            return Err(format!("kernel exited with failure: {}", describe_failure(&output.status, &output.stderr)));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let line = text.trim();
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 4 {
            return Err(format!("unparseable kernel output {line:?}"));
        }
        Ok(NativeIterationResult {
            iterations: fields[0].parse().map_err(|e| format!("{e}"))?,
            total_ms: fields[1].parse().map_err(|e| format!("{e}"))?,
            mean_ms: fields[2].parse().map_err(|e| format!("{e}"))?,
            checksum: fields[3].parse().map_err(|e| format!("{e}"))?,
        })
    }
}

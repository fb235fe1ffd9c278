//! Client side of the HotSpot dynamic attach protocol.
//!
//! The JVM listens on `<tmp>/.java_pid<pid>` once its attach listener is
//! started. The listener is started lazily: the client creates
//! `.attach_pid<pid>` in the process's working directory (or tmp) and sends
//! `SIGQUIT`. Each command is one connection:
//!
//! ```text
//! request   "1" NUL <command> NUL <arg0> NUL <arg1> NUL <arg2> NUL
//! response  <return code> LF <output>
//! ```

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::AttachConfig;
use crate::process::hotspot::properties::parse_properties;
use crate::process::source::{AttachedProcess, Properties};

const PROTOCOL_VERSION: &str = "1";
const MAX_ARGUMENTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum AttachError {
    #[error("the attach listener of {pid} did not start within {timeout:?}")]
    NoListener { pid: u32, timeout: Duration },

    #[error("could not signal {pid}")]
    Signal {
        pid: u32,
        #[source]
        source: nix::Error,
    },

    #[error("`{command}` failed in {pid} with code {code}: {message}")]
    CommandFailed {
        pid: u32,
        command: String,
        code: i32,
        message: String,
    },

    #[error("malformed attach response from {pid}: {response:?}")]
    MalformedResponse { pid: u32, response: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An open attach session. Dropping it removes the trigger file this
/// session may have created.
#[derive(Debug)]
pub struct AttachSession {
    pid: u32,
    socket: PathBuf,
    timeout: Duration,
    trigger: Option<PathBuf>,
}

/// Where the attach listener of `pid` accepts connections once started.
pub fn listener_socket(tmp_dir: &str, pid: u32) -> PathBuf {
    Path::new(tmp_dir).join(format!(".java_pid{}", pid))
}

impl AttachSession {
    pub fn attach(pid: u32, config: &AttachConfig) -> Result<Self, AttachError> {
        let socket = listener_socket(&config.tmp_dir, pid);
        let mut session = Self {
            pid,
            socket,
            timeout: config.timeout(),
            trigger: None,
        };

        if !session.socket.exists() {
            session.start_listener(config)?;
        }
        debug!("Attached to {} through {}", pid, session.socket.display());
        Ok(session)
    }

    fn start_listener(&mut self, config: &AttachConfig) -> Result<(), AttachError> {
        let file_name = format!(".attach_pid{}", self.pid);
        let candidates = [
            PathBuf::from(format!("/proc/{}/cwd", self.pid)).join(&file_name),
            Path::new(&config.tmp_dir).join(&file_name),
        ];
        let trigger = candidates
            .into_iter()
            .find(|path| File::create(path).is_ok());
        if trigger.is_none() {
            debug!("Could not create an attach trigger file for {}", self.pid);
        }
        self.trigger = trigger;

        kill(Pid::from_raw(self.pid as i32), Signal::SIGQUIT).map_err(|source| {
            AttachError::Signal {
                pid: self.pid,
                source,
            }
        })?;

        let deadline = Instant::now() + config.timeout();
        while !self.socket.exists() {
            if Instant::now() >= deadline {
                return Err(AttachError::NoListener {
                    pid: self.pid,
                    timeout: config.timeout(),
                });
            }
            thread::sleep(config.poll_interval());
        }
        Ok(())
    }

    /// Runs one attach command and returns its output, without the return
    /// code line.
    pub fn execute(&self, command: &str, args: &[&str]) -> Result<String, AttachError> {
        let mut stream = UnixStream::connect(&self.socket)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        stream.write_all(&encode_request(command, args))?;
        stream.flush()?;

        let mut response = Vec::new();
        stream.read_to_end(&mut response)?;
        decode_response(self.pid, command, &String::from_utf8_lossy(&response))
    }
}

impl Drop for AttachSession {
    fn drop(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            let _ = fs::remove_file(trigger);
        }
        debug!("Detached from {}", self.pid);
    }
}

impl AttachedProcess for AttachSession {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn system_properties(&self) -> anyhow::Result<Properties> {
        Ok(parse_properties(&self.execute("properties", &[])?))
    }

    fn agent_properties(&self) -> anyhow::Result<Properties> {
        Ok(parse_properties(&self.execute("agentProperties", &[])?))
    }

    fn load_agent(&self, bundle: &Path, options: &str) -> anyhow::Result<()> {
        let mut agent = bundle.to_string_lossy().into_owned();
        if !options.is_empty() {
            agent.push('=');
            agent.push_str(options);
        }

        let output = self.execute("load", &["instrument", "false", agent.as_str()])?;
        // the agent's own initialisation result follows the command status
        match agent_result(&output) {
            None | Some(0) => Ok(()),
            Some(code) => Err(AttachError::CommandFailed {
                pid: self.pid,
                command: "load".to_string(),
                code,
                message: format!("agent initialisation failed for {}", agent),
            }
            .into()),
        }
    }
}

pub(crate) fn encode_request(command: &str, args: &[&str]) -> Vec<u8> {
    let mut request = Vec::new();
    let padding = MAX_ARGUMENTS.saturating_sub(args.len());
    let parts = [PROTOCOL_VERSION, command]
        .into_iter()
        .chain(args.iter().copied().take(MAX_ARGUMENTS))
        .chain(std::iter::repeat("").take(padding));
    for part in parts {
        request.extend_from_slice(part.as_bytes());
        request.push(0);
    }
    request
}

pub(crate) fn decode_response(pid: u32, command: &str, response: &str) -> Result<String, AttachError> {
    let (status, output) = response.split_once('\n').unwrap_or((response, ""));
    let code: i32 = status
        .trim()
        .parse()
        .map_err(|_| AttachError::MalformedResponse {
            pid,
            response: response.chars().take(80).collect(),
        })?;

    if code != 0 {
        return Err(AttachError::CommandFailed {
            pid,
            command: command.to_string(),
            code,
            message: output.trim().to_string(),
        });
    }
    Ok(output.to_string())
}

/// Older JVMs answer `load` with a bare number, newer ones with
/// `return code: <n>`.
fn agent_result(output: &str) -> Option<i32> {
    let line = output.lines().map(str::trim).find(|line| !line.is_empty())?;
    line.strip_prefix("return code:")
        .unwrap_or(line)
        .trim()
        .parse()
        .ok()
}

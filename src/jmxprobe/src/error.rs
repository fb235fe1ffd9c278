use regex::Regex;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit codes reported by the binary.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const UNEXPECTED_FAILURE: i32 = 1;
    pub const NO_PROCESS_MATCHED: i32 = 2;
    pub const NO_BEAN_MATCHED: i32 = 3;
    pub const NO_ATTRIBUTE_MATCHED: i32 = 4;
}

/// Every fatal outcome of a probe run. Recoverable failures (a process that
/// cannot be probed during discovery, an attribute the endpoint refuses to
/// read) never surface as a `ProbeError`.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("{0}")]
    Usage(String),

    #[error("Invalid regexp: {pattern}, {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid PID: {0}")]
    InvalidPid(i64),

    #[error("Couldn't find a JVM with PID {0}")]
    PidNotFound(i64),

    #[error("No JVM matched your regexp {0}")]
    NoMatch(String),

    #[error("{count} JVMs matched your regexp {selector}, it's too ambiguous, please refine it.")]
    Ambiguous { selector: String, count: usize },

    #[error("No MBean matched your query in {process}")]
    NoBeanMatch { process: String },

    #[error("No attribute of [{beans}] matched your query in {process}")]
    NoAttributeMatch { beans: String, process: String },

    #[error("Failed to start the management agent of {process}")]
    ActivationFailed {
        process: String,
        #[source]
        source: BoxError,
    },

    #[error("Failed to connect to {address}")]
    Connection {
        address: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ProbeError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::PidNotFound(_) | ProbeError::NoMatch(_) | ProbeError::Ambiguous { .. } => {
                exit_codes::NO_PROCESS_MATCHED
            }
            ProbeError::NoBeanMatch { .. } => exit_codes::NO_BEAN_MATCHED,
            ProbeError::NoAttributeMatch { .. } => exit_codes::NO_ATTRIBUTE_MATCHED,
            ProbeError::Usage(_)
            | ProbeError::InvalidPattern { .. }
            | ProbeError::InvalidPid(_)
            | ProbeError::ActivationFailed { .. }
            | ProbeError::Connection { .. }
            | ProbeError::Io(_)
            | ProbeError::Unexpected(_) => exit_codes::UNEXPECTED_FAILURE,
        }
    }

    /// The error followed by each of its causes, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let message = cause.to_string();
            // transparent variants repeat their own message as the first source
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            source = cause.source();
        }
        messages
    }
}

/// Compiles a user supplied regular expression.
pub fn compile_pattern(pattern: &str) -> Result<Regex, ProbeError> {
    Regex::new(pattern).map_err(|source| ProbeError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

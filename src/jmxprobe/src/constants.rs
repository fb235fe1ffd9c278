pub const PROGRAM_IDENTIFIER: &str = "jmxprobe";
pub const WATCH_FLAG: &str = "--watch";

// Management agent shipped with the JDK, see `EndpointActivator`
pub const AGENT_BUNDLE_NAME: &str = "management-agent.jar";
pub const AGENT_BUNDLE_SUBPATHS: [&str; 2] = ["jre/lib", "lib"];
pub const AGENT_OPTIONS: &str = "com.sun.management.jmxremote";
pub const LOCAL_CONNECTOR_ADDRESS: &str = "com.sun.management.jmxremote.localConnectorAddress";
pub const JAVA_HOME_PROPERTY: &str = "java.home";

// jvmstat counters published in hsperfdata files
pub const PERFDATA_COMMAND_LINE_COUNTER: &str = "sun.rt.javaCommand";
pub const PERFDATA_CONNECTOR_ADDRESS_COUNTER: &str = "sun.management.JMXConnectorServer.address";
pub const PERFDATA_DIR_PREFIX: &str = "hsperfdata_";

pub const ATTACH_TIMEOUT_MS: u64 = 5000;
pub const ATTACH_POLL_INTERVAL_MS: u64 = 200;
pub const ATTACH_TMP_DIR: &str = "/tmp";
pub const ATTACHABLE_EXECUTABLE: &str = "java";

pub const HTTP_TIMEOUT_MS: u64 = 10_000;

pub const SELF_MARKER_PROPERTY: &str = "jmxprobe.self.marker";

// granularity of the interruptible sleep between watch passes
pub const SHUTDOWN_POLL_INTERVAL_MS: u64 = 100;

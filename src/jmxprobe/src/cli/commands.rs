use clap::Parser;
use std::time::Duration;

use crate::config::ConfigOverrides;
use crate::error::ProbeError;
use crate::mbeans::PatternPair;
use crate::output::OutputOptions;
use crate::pipeline::{ProbeRequest, Request};

fn footer_message() -> String {
    "Examples:\n  \
     jmxprobe -l\n  \
     jmxprobe kafka.Kafka\n  \
     jmxprobe --watch 10 --long 4242 GarbageCollector Collection Threading Count\n\n\
     Exit codes: 0 ok, 1 usage or unexpected failure, 2 no JVM matched,\n\
     3 no MBean matched, 4 no attribute matched."
        .to_string()
}

#[derive(Parser, Debug, Clone)]
#[clap(
    name = "jmxprobe",
    version,
    about = "Reads numeric MBean attributes from local JVMs",
    override_usage = "jmxprobe -l\n       \
                      jmxprobe [OPTIONS] <SELECTOR>\n       \
                      jmxprobe [OPTIONS] <SELECTOR> <BEAN_REGEX> [ATTR_REGEX] [<BEAN_REGEX> [ATTR_REGEX]]...",
    after_help = footer_message()
)]
pub struct Cli {
    /// List the JVMs visible on this host
    #[clap(short = 'l', long = "list", conflicts_with = "args")]
    pub list: bool,

    /// Report again every N seconds
    #[clap(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub watch: Option<u64>,

    /// Append the MBean name to every line
    #[clap(long)]
    pub long: bool,

    /// Prefix every line with the current epoch seconds
    #[clap(long)]
    pub timestamp: bool,

    /// Log debug diagnostics to stderr
    #[clap(short, long)]
    pub verbose: bool,

    /// Agent bundle to load into a JVM without endpoint
    #[clap(long, value_name = "PATH")]
    pub agent: Option<String>,

    /// Options passed to the agent bundle
    #[clap(long, value_name = "OPTIONS")]
    pub agent_options: Option<String>,

    /// Property under which the agent publishes its endpoint address
    #[clap(long, value_name = "PROPERTY")]
    pub address_property: Option<String>,

    /// A pid or a regexp matched against the JVM command lines, followed
    /// by bean/attribute regexp pairs
    #[clap(value_name = "SELECTOR", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn request(&self) -> Result<Request, ProbeError> {
        if self.list {
            return Ok(Request::List);
        }

        let (selector, patterns) = self
            .args
            .split_first()
            .ok_or_else(|| ProbeError::Usage("Missing the JVM selector (pid or regexp)".to_string()))?;

        Ok(Request::Probe(ProbeRequest {
            selector: selector.clone(),
            pairs: PatternPair::from_args(patterns),
            options: OutputOptions {
                long: self.long,
                timestamp: self.timestamp,
            },
            watch: self.watch.map(Duration::from_secs),
        }))
    }

    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            agent_path: self.agent.clone(),
            agent_options: self.agent_options.clone(),
            address_property: self.address_property.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("jmxprobe").chain(args.iter().copied()))
    }

    #[test]
    fn test_list() {
        let cli = parse(&["-l"]).unwrap();
        assert_eq!(cli.request().unwrap(), Request::List);
    }

    #[test]
    fn test_list_conflicts_with_a_selector() {
        assert!(parse(&["-l", "kafka"]).is_err());
    }

    #[test]
    fn test_flags_then_selector_and_pairs() {
        let cli = parse(&[
            "--watch", "10", "--long", "--timestamp", "4242", "GarbageCollector", "Collection", "Threading",
        ])
        .unwrap();

        let Request::Probe(probe) = cli.request().unwrap() else {
            panic!("expected a probe request");
        };
        assert_eq!(probe.selector, "4242");
        assert_eq!(
            probe.pairs,
            vec![
                PatternPair::new("GarbageCollector", Some("Collection")),
                PatternPair::new("Threading", None),
            ]
        );
        assert_eq!(probe.watch, Some(Duration::from_secs(10)));
        assert_eq!(
            probe.options,
            OutputOptions {
                long: true,
                timestamp: true
            }
        );
    }

    #[test]
    fn test_selector_alone_lists_beans() {
        let Request::Probe(probe) = parse(&["kafka"]).unwrap().request().unwrap() else {
            panic!("expected a probe request");
        };
        assert!(probe.pairs.is_empty());
        assert_eq!(probe.watch, None);
    }

    #[test]
    fn test_patterns_may_start_with_a_hyphen() {
        let Request::Probe(probe) = parse(&["kafka", "-Dfoo", "--long"]).unwrap().request().unwrap() else {
            panic!("expected a probe request");
        };
        assert_eq!(probe.pairs, vec![PatternPair::new("-Dfoo", Some("--long"))]);
        assert!(!probe.options.long);
    }

    #[rstest]
    #[case::zero(&["--watch", "0", "kafka"])]
    #[case::negative(&["--watch", "-1", "kafka"])]
    #[case::not_a_number(&["--watch", "soon", "kafka"])]
    fn test_invalid_watch_interval(#[case] args: &[&str]) {
        assert!(parse(args).is_err());
    }

    #[test]
    fn test_missing_selector_is_a_usage_error() {
        let error = parse(&["--long"]).unwrap().request().unwrap_err();
        assert!(matches!(error, ProbeError::Usage(_)));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_agent_overrides() {
        let cli = parse(&[
            "--agent",
            "/opt/jolokia/jolokia-jvm-agent.jar",
            "--agent-options",
            "port=0",
            "--address-property",
            "jolokia.agent",
            "kafka",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.agent_path.as_deref(), Some("/opt/jolokia/jolokia-jvm-agent.jar"));
        assert_eq!(overrides.agent_options.as_deref(), Some("port=0"));
        assert_eq!(overrides.address_property.as_deref(), Some("jolokia.agent"));
    }
}

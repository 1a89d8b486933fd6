//! Shell-command implementation of [`RouterControl`].
//!
//! Every per-router operation renders a command template and runs it through
//! `sh -c`, optionally behind a wrapper such as `mnexec -a <pid>` that puts
//! the command inside the router's network namespace.
//!
//! Names come from the prefix pool, which is not trusted: a name is only
//! placed into a command line if it holds none of the characters that `sh`
//! would still interpret inside double quotes.

use super::{CommandError, RouterControl};
use crate::config::NetworkConfig;
use crate::experiment::ExperimentContext;
use crate::utils::{render, with_prefix};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

pub struct ShellNetwork {
    hosts: Vec<String>,
    config: NetworkConfig,
    context: ExperimentContext,
}

impl ShellNetwork {
    pub fn new(hosts: Vec<String>, config: NetworkConfig, context: ExperimentContext) -> Self {
        Self {
            hosts,
            config,
            context,
        }
    }

    /// Full command line for `template` on `router`
    fn command_for(&self, router: &str, template: &str, name: &str) -> String {
        let vars = self.context.template_vars(router, name);
        let prefix = self.config.exec_prefix.as_deref().map(|p| render(p, &vars));
        with_prefix(prefix.as_deref(), &render(template, &vars))
    }

    fn ensure_host(&self, router: &str) -> Result<(), CommandError> {
        if self.has_host(router) {
            Ok(())
        } else {
            Err(CommandError::RouterNotFound(router.to_string()))
        }
    }
}

/// Characters `sh` acts on inside a double-quoted word, plus line breaks
const SHELL_ACTIVE: &[char] = &['"', '$', '`', '\\', '\n', '\r'];

fn check_name(name: &str) -> Result<(), CommandError> {
    if name.contains(SHELL_ACTIVE) {
        return Err(CommandError::UnsafeName(name.to_string()));
    }
    Ok(())
}

fn run_shell(command: &str, capture: bool) -> Result<Output, CommandError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).stdin(Stdio::null());
    if !capture {
        // Background producers inherit these; keep them detached from our pipes
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let output = cmd.output().map_err(|e| CommandError::Spawn {
        command: command.to_string(),
        source: e,
    })?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            command: command.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

impl RouterControl for ShellNetwork {
    fn hosts(&self) -> &[String] {
        &self.hosts
    }

    fn publish(&self, router: &str, name: &str) -> Result<(), CommandError> {
        self.ensure_host(router)?;
        check_name(name)?;
        let command = self.command_for(router, &self.config.publish, name);
        log::info!("{} {}", router, command);
        run_shell(&command, false)?;
        Ok(())
    }

    fn route_table(&self, router: &str) -> Result<String, CommandError> {
        self.ensure_host(router)?;
        let command = self.command_for(router, &self.config.route_list, "");
        let output = run_shell(&command, true)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn advert_log(&self, router: &str) -> Result<String, CommandError> {
        let vars = self.context.template_vars(router, "");
        let path = PathBuf::from(render(&self.config.advert_log, &vars));
        std::fs::read_to_string(&path).map_err(|_| CommandError::LogUnavailable {
            router: router.to_string(),
            path,
        })
    }

    fn teardown(&self) {
        for command in &self.config.teardown {
            log::debug!("Teardown: {}", command);
            if let Err(e) = run_shell(command, false) {
                // pkill exits non-zero when nothing matched
                log::debug!("Teardown command '{}' reported: {}", command, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Namespace;
    use tempfile::tempdir;

    fn network(config: NetworkConfig) -> ShellNetwork {
        let ctx = ExperimentContext::new(Namespace::new("/minindn"), "/tmp/test.bin", None);
        ShellNetwork::new(vec!["a".to_string(), "b".to_string()], config, ctx)
    }

    #[test]
    fn test_command_rendering_with_prefix() {
        let config = NetworkConfig {
            exec_prefix: Some("mnexec -a $(pgrep -f 'mininet:{router}$')".to_string()),
            ..NetworkConfig::default()
        };
        let net = network(config);
        let cmd = net.command_for("a", &net.config.publish.clone(), "/minindn/a/p0");
        assert_eq!(
            cmd,
            "mnexec -a $(pgrep -f 'mininet:a$') ndnd put --expose \"/minindn/a/p0\" < /tmp/test.bin &"
        );
    }

    #[test]
    fn test_unknown_router_is_rejected_before_dispatch() {
        let net = network(NetworkConfig::default());
        let err = net.publish("zz", "/minindn/zz/p0").unwrap_err();
        assert!(matches!(err, CommandError::RouterNotFound(ref r) if r == "zz"));
        assert!(matches!(net.route_table("zz"), Err(CommandError::RouterNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_rejects_shell_metacharacters() {
        let dir = tempdir().unwrap();
        let marker = dir.path().join("ran");
        let config = NetworkConfig {
            publish: "echo \"{name}\" > /dev/null".to_string(),
            ..NetworkConfig::default()
        };
        let net = network(config);

        for name in [
            format!("/minindn/a/$(touch {})", marker.display()),
            format!("/minindn/a/`touch {}`", marker.display()),
            "/minindn/a/x\"; touch y; \"".to_string(),
            "/minindn/a/line\nbreak".to_string(),
        ] {
            assert!(matches!(net.publish("a", &name), Err(CommandError::UnsafeName(ref n)) if *n == name));
        }
        assert!(!marker.exists());

        assert!(net.publish("a", "/minindn/a/videoA/chunk-1_v2").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_route_table_captures_stdout() {
        let config = NetworkConfig {
            route_list: "echo prefix={namespace}/{router}/p0".to_string(),
            ..NetworkConfig::default()
        };
        let net = network(config);
        assert_eq!(net.route_table("b").unwrap().trim(), "prefix=/minindn/b/p0");
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_command() {
        let config = NetworkConfig {
            route_list: "exit 3".to_string(),
            ..NetworkConfig::default()
        };
        let net = network(config);
        assert!(matches!(net.route_table("a"), Err(CommandError::Failed { .. })));
    }

    #[test]
    fn test_advert_log() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("a/advert_log.txt"), "seq=1\n").unwrap();

        let config = NetworkConfig {
            advert_log: format!("{}/{{router}}/advert_log.txt", dir.path().display()),
            ..NetworkConfig::default()
        };
        let net = network(config);
        assert_eq!(net.advert_log("a").unwrap(), "seq=1\n");
        assert!(matches!(net.advert_log("b"), Err(CommandError::LogUnavailable { .. })));
    }
}

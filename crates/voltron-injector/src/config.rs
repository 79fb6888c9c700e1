use anyhow::{Result, anyhow};
use clap::ArgMatches;
use injector_admission::patch_builder::InjectionConfig;
use lazy_static::lazy_static;
use std::net::SocketAddr;
use std::path::PathBuf;

pub static SERVICE_NAME: &str = "voltron-injector";

lazy_static! {
    pub(crate) static ref HOSTNAME: String =
        std::env::var("HOSTNAME").unwrap_or_else(|_| String::from("unknown"));
}

pub struct Config {
    pub addr: SocketAddr,
    pub tls_config: Option<TlsConfig>,
    pub injection: InjectionConfig,
    pub log_level: String,
    pub log_fmt: String,
    pub log_no_color: bool,
}

pub struct TlsConfig {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

impl Config {
    pub fn from_args(matches: &ArgMatches) -> Result<Self> {
        let addr = api_bind_address(matches)?;
        let tls_config = tls_config(matches)?;
        let injection = injection_config(matches)?;

        let log_level = required_string(matches, "log-level")?;
        let log_fmt = required_string(matches, "log-fmt")?;
        let log_no_color = matches.get_flag("log-no-color");

        Ok(Self {
            addr,
            tls_config,
            injection,
            log_level,
            log_fmt,
            log_no_color,
        })
    }
}

fn required_string(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| anyhow!("error parsing arguments: missing value for {id}"))
}

fn api_bind_address(matches: &ArgMatches) -> Result<SocketAddr> {
    format!(
        "{}:{}",
        required_string(matches, "address")?,
        required_string(matches, "port")?
    )
    .parse()
    .map_err(|e| anyhow!("error parsing arguments: {}", e))
}

fn tls_config(matches: &ArgMatches) -> Result<Option<TlsConfig>> {
    let cert_file = required_string(matches, "cert-file")?;
    let key_file = required_string(matches, "key-file")?;
    match (cert_file.is_empty(), key_file.is_empty()) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some(TlsConfig {
            cert_file: PathBuf::from(cert_file),
            key_file: PathBuf::from(key_file),
        })),
        _ => Err(anyhow!(
            "error parsing arguments: either both --cert-file and --key-file must be provided, or neither"
        )),
    }
}

fn injection_config(matches: &ArgMatches) -> Result<InjectionConfig> {
    Ok(InjectionConfig {
        volume_name: required_string(matches, "volume-name")?,
        init_container_name: required_string(matches, "init-container-name")?,
        init_container_image: required_string(matches, "init-container-image")?,
        mount_path: required_string(matches, "mount-path")?,
        binary_name: required_string(matches, "binary-name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli;

    fn config_from(args: &[&str]) -> Result<Config> {
        let matches = cli::build_cli()
            .try_get_matches_from(std::iter::once("voltron-injector").chain(args.iter().copied()))
            .expect("arguments should be accepted by clap");
        Config::from_args(&matches)
    }

    #[test]
    fn default_values() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.addr, "0.0.0.0:8080".parse().unwrap());
        assert!(config.tls_config.is_none());
        assert_eq!(config.injection, InjectionConfig::default());
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_fmt, "text");
    }

    #[test]
    fn custom_values() {
        let config = config_from(&[
            "--addr",
            "127.0.0.1",
            "--port",
            "8443",
            "--cert-file",
            "/etc/webhook/certs/cert.pem",
            "--key-file",
            "/etc/webhook/certs/key.pem",
            "--init-container-image",
            "registry.local/voltron:1.0",
            "--mount-path",
            "/opt/voltron",
            "--log-fmt",
            "json",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:8443".parse().unwrap());
        let tls_config = config.tls_config.expect("TLS should be configured");
        assert_eq!(
            tls_config.cert_file,
            PathBuf::from("/etc/webhook/certs/cert.pem")
        );
        assert_eq!(tls_config.key_file, PathBuf::from("/etc/webhook/certs/key.pem"));
        assert_eq!(
            config.injection.init_container_image,
            "registry.local/voltron:1.0"
        );
        assert_eq!(
            config.injection.injected_binary_path(),
            "/opt/voltron/injector"
        );
        assert_eq!(config.log_fmt, "json");
    }

    #[test]
    fn reject_half_tls_config() {
        let result = config_from(&["--cert-file", "/etc/webhook/certs/cert.pem"]);
        assert!(result.is_err());
    }

    #[test]
    fn reject_invalid_bind_address() {
        let result = config_from(&["--addr", "not-an-address"]);
        assert!(result.is_err());
    }

    #[test]
    fn reject_unknown_log_format() {
        let result = cli::build_cli().try_get_matches_from(["voltron-injector", "--log-fmt", "otlp"]);
        assert!(result.is_err());
    }
}

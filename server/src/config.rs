use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves saved route maps and the drawing client")]
pub struct Args {
    #[arg(long, env = "ROUTESKETCH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
    #[arg(long, env = "ROUTESKETCH_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub flush_interval_secs: u64,
    #[arg(long, requires = "tls_key")]
    pub tls_cert: Option<PathBuf>,
    #[arg(long, requires = "tls_cert")]
    pub tls_key: Option<PathBuf>,
}

impl Args {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data"))
    }

    pub fn public_dir(&self) -> PathBuf {
        self.public_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"))
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    pub fn tls(&self) -> Option<(PathBuf, PathBuf)> {
        Some((self.tls_cert.clone()?, self.tls_key.clone()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_flags() {
        let args = Args::try_parse_from(["routesketch_server"]).unwrap();
        assert_eq!(args.flush_interval(), Duration::from_secs(60));
        assert!(args.tls().is_none());
        assert!(args.data_dir().ends_with("data"));
    }

    #[test]
    fn tls_needs_both_files() {
        assert!(Args::try_parse_from(["routesketch_server", "--tls-cert", "cert.pem"]).is_err());
        let args = Args::try_parse_from([
            "routesketch_server",
            "--tls-cert",
            "cert.pem",
            "--tls-key",
            "key.pem",
        ])
        .unwrap();
        assert_eq!(
            args.tls(),
            Some((PathBuf::from("cert.pem"), PathBuf::from("key.pem")))
        );
    }

    #[test]
    fn zero_flush_interval_is_rejected() {
        assert!(Args::try_parse_from(["routesketch_server", "--flush-interval-secs", "0"]).is_err());
    }
}

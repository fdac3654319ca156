use std::path::{Path, PathBuf};

use secrecy::SecretString;
use thiserror::Error;

// Mounted credential files
pub(super) const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const TOKEN_FILE: &str = "token";
const CERT_FILE: &str = "ca.crt";

/// Errors from loading in-cluster config
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read the service account token
    #[error("failed to read the service account token '{1}': {0}")]
    ReadToken(#[source] std::io::Error, PathBuf),

    /// Failed to read a certificate bundle
    #[error("failed to read a certificate bundle '{1}': {0}")]
    ReadCertificateBundle(#[source] std::io::Error, PathBuf),

    /// Failed to parse PEM-encoded certificates
    #[error("failed to parse PEM-encoded certificates: {0}")]
    ParseCertificates(#[source] pem::PemError),
}

pub(super) fn kube_dns() -> http::Uri {
    http::Uri::from_static("https://kubernetes.default.svc/")
}

/// Returns the DER encoded root certificates mounted into `dir`.
pub(super) fn load_cert(dir: &Path) -> Result<Vec<Vec<u8>>, Error> {
    let path = dir.join(CERT_FILE);
    let certs = std::fs::read(&path).map_err(|e| Error::ReadCertificateBundle(e, path))?;
    super::certs(&certs).map_err(Error::ParseCertificates)
}

/// Returns the service account token mounted into `dir`.
pub(super) fn load_token(dir: &Path) -> Result<SecretString, Error> {
    let path = dir.join(TOKEN_FILE);
    let token = std::fs::read_to_string(&path).map_err(|e| Error::ReadToken(e, path))?;
    Ok(SecretString::from(token.trim().to_owned()))
}

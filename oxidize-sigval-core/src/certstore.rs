//! Certificate accumulators keyed by issuer and serial number
//!
//! Validation collects certificates from several places (the CMS blob, the
//! document security store, OCSP responses) and needs to deduplicate and
//! look them up by identity. The identity of a certificate, for our
//! purposes, is its issuer distinguished name plus serial number.
//!
//! Three store variants cover the access patterns:
//! - [`SimpleCertificateStore`]: a plain local mapping;
//! - [`WriteThroughCertificateStore`]: writes propagate to a backend as well,
//!   reads stay local - one store accumulates everything while callers keep
//!   their certs grouped meaningfully;
//! - [`ForkedCertificateStore`]: writes stay local, reads fall back to the
//!   backend - scratch registration on top of a shared store.

use crate::error::Result;
use der::Encode;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::Certificate;

/// Certificate identity: issuer distinguished name plus serial number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssuerSerial {
    issuer: Vec<u8>,
    serial: Vec<u8>,
}

impl IssuerSerial {
    /// Builds the key from an issuer name and serial number
    pub fn new(issuer: &Name, serial: &SerialNumber) -> Result<Self> {
        Ok(Self {
            issuer: issuer.to_der()?,
            serial: serial.as_bytes().to_vec(),
        })
    }

    /// The issuer-serial key of a certificate
    pub fn from_cert(cert: &Certificate) -> Result<Self> {
        Self::new(
            &cert.tbs_certificate.issuer,
            &cert.tbs_certificate.serial_number,
        )
    }
}

/// Narrow capability interface shared by all store variants
pub trait CertificateStore {
    /// Registers a certificate. Re-registering the same issuer-serial
    /// silently overwrites (later registration wins).
    fn register(&mut self, cert: Certificate) -> Result<()>;

    /// Looks up a certificate by issuer-serial
    fn lookup(&self, key: &IssuerSerial) -> Option<&Certificate>;

    /// All certificates in the store, in registration order
    fn certificates(&self) -> Vec<&Certificate>;

    /// Registers a batch of certificates
    fn register_multiple(&mut self, certs: Vec<Certificate>) -> Result<()> {
        for cert in certs {
            self.register(cert)?;
        }
        Ok(())
    }
}

/// Local issuer-serial keyed certificate store
#[derive(Debug, Clone, Default)]
pub struct SimpleCertificateStore {
    certs: std::collections::HashMap<IssuerSerial, Certificate>,
    order: Vec<IssuerSerial>,
}

impl SimpleCertificateStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct certificates held
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Returns true if the store is empty
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl CertificateStore for SimpleCertificateStore {
    fn register(&mut self, cert: Certificate) -> Result<()> {
        let key = IssuerSerial::from_cert(&cert)?;
        if self.certs.insert(key.clone(), cert).is_none() {
            self.order.push(key);
        }
        Ok(())
    }

    fn lookup(&self, key: &IssuerSerial) -> Option<&Certificate> {
        self.certs.get(key)
    }

    fn certificates(&self) -> Vec<&Certificate> {
        self.order
            .iter()
            .filter_map(|key| self.certs.get(key))
            .collect()
    }
}

/// Store that writes to both itself and a backend, but never reads from the
/// backend
pub struct WriteThroughCertificateStore {
    backend: Box<dyn CertificateStore>,
    local: SimpleCertificateStore,
}

impl WriteThroughCertificateStore {
    /// Wraps a backend store
    pub fn new(backend: Box<dyn CertificateStore>) -> Self {
        Self {
            backend,
            local: SimpleCertificateStore::new(),
        }
    }

    /// Gives the backend store back
    pub fn into_backend(self) -> Box<dyn CertificateStore> {
        self.backend
    }
}

impl CertificateStore for WriteThroughCertificateStore {
    fn register(&mut self, cert: Certificate) -> Result<()> {
        self.backend.register(cert.clone())?;
        self.local.register(cert)
    }

    fn lookup(&self, key: &IssuerSerial) -> Option<&Certificate> {
        self.local.lookup(key)
    }

    fn certificates(&self) -> Vec<&Certificate> {
        self.local.certificates()
    }
}

/// Store that reads from both itself and a backend, but never writes to the
/// backend. Iteration yields backend entries first, then local ones.
pub struct ForkedCertificateStore {
    backend: Box<dyn CertificateStore>,
    local: SimpleCertificateStore,
}

impl ForkedCertificateStore {
    /// Wraps a backend store
    pub fn new(backend: Box<dyn CertificateStore>) -> Self {
        Self {
            backend,
            local: SimpleCertificateStore::new(),
        }
    }
}

impl CertificateStore for ForkedCertificateStore {
    fn register(&mut self, cert: Certificate) -> Result<()> {
        self.local.register(cert)
    }

    fn lookup(&self, key: &IssuerSerial) -> Option<&Certificate> {
        self.local.lookup(key).or_else(|| self.backend.lookup(key))
    }

    fn certificates(&self) -> Vec<&Certificate> {
        let mut certs = self.backend.certificates();
        certs.extend(self.local.certificates());
        certs
    }
}

//! Shared helpers for unit tests

use der::asn1::BitString;
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use std::str::FromStr;
use std::time::Duration;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

const OID_RSA_ENCRYPTION: const_oid::ObjectIdentifier =
    const_oid::ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const OID_SHA256_RSA: const_oid::ObjectIdentifier =
    const_oid::ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");

fn serial_bytes(serial: u32) -> Vec<u8> {
    let bytes = serial.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(3);
    bytes[start..].to_vec()
}

/// A syntactically complete certificate with a placeholder key and
/// signature. Good enough for everything that works off names and serial
/// numbers; cryptographic tests build their own certificates with real
/// keys.
pub(crate) fn make_cert(subject: &str, issuer: &str, serial: u32) -> Certificate {
    let spki = SubjectPublicKeyInfoOwned {
        algorithm: AlgorithmIdentifierOwned {
            oid: OID_RSA_ENCRYPTION,
            parameters: None,
        },
        subject_public_key: BitString::from_bytes(&[0u8]).expect("tiny bit string"),
    };
    make_cert_with_spki(subject, issuer, serial, spki)
}

pub(crate) fn make_cert_with_spki(
    subject: &str,
    issuer: &str,
    serial: u32,
    spki: SubjectPublicKeyInfoOwned,
) -> Certificate {
    let signature_algorithm = AlgorithmIdentifierOwned {
        oid: OID_SHA256_RSA,
        parameters: None,
    };
    let validity = Validity {
        not_before: Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_500_000_000))
                .expect("validity start"),
        ),
        not_after: Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(2_500_000_000))
                .expect("validity end"),
        ),
    };
    let tbs_certificate = TbsCertificate {
        version: Version::V3,
        serial_number: SerialNumber::new(&serial_bytes(serial)).expect("serial"),
        signature: signature_algorithm.clone(),
        issuer: Name::from_str(issuer).expect("issuer DN"),
        validity,
        subject: Name::from_str(subject).expect("subject DN"),
        subject_public_key_info: spki,
        issuer_unique_id: None,
        subject_unique_id: None,
        extensions: None,
    };
    Certificate {
        tbs_certificate,
        signature_algorithm,
        signature: BitString::from_bytes(&[0u8]).expect("placeholder signature"),
    }
}

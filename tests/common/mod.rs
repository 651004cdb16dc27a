//! Shared test fixtures: a deterministic in-memory signing engine with its
//! own framing, a canned timestamp authority, and a real self-signed
//! certificate for identity derivation.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;

use pkgsign::{
    CertificateInfo, CertificateQuery, CertificateStore, MessageSigner, SignedMessage,
    SigningEngine, SigningError, SigningResult, TimestampAuthorityClient,
};

/// Self-signed ECDSA P-256 certificate, subject `O=Example, CN=Test Signer`.
const TEST_CERT_HEX: &str = "\
308201a63082014ba0030201020214724c25446db4bdc5c8e7b793e98ffb0bf5ab7c2d300a06082a8648ce3d04030230\
283110300e060355040a0c074578616d706c653114301206035504030c0b54657374205369676e6572301e170d323630\
3832373039303835365a170d3336303832343039303835365a30283110300e060355040a0c074578616d706c65311430\
1206035504030c0b54657374205369676e65723059301306072a8648ce3d020106082a8648ce3d030107034200041e7a\
60c63c284fbb5cfadc3f641599c4e3030062620a74b03a0874693e1b4109de173a6e6384a50f546be76cde3e2c080e4c\
bfac73a4f8110db2a4dcc6c4ba3ca3533051301d0603551d0e04160414cfccb70f8167efe9520c3405fd3bf0073f521d\
7f301f0603551d23041830168014cfccb70f8167efe9520c3405fd3bf0073f521d7f300f0603551d130101ff04053003\
0101ff300a06082a8648ce3d040302034900304602210085beacd6c6a7f3a9fc8bd491920aae14155c25e3b315e61e12\
326bd6dc0efa4f022100de6deaf06004c5ce037071c311d7b1bf1329913f20c5a683ca2c9b2ca85dd036";

pub fn test_certificate_der() -> Vec<u8> {
    hex::decode(TEST_CERT_HEX).unwrap()
}

pub fn fixed_signing_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
}

const MAGIC: &[u8; 4] = b"FSM1";

/// Signing engine with a private length-prefixed framing; good enough to
/// round-trip messages through the file format without real cryptography.
#[derive(Default)]
pub struct FakeSigningEngine {
    pub timestamps_attached: AtomicUsize,
}

impl FakeSigningEngine {
    fn encode_message(
        content_type: &str,
        content: &[u8],
        signers: &[MessageSigner],
    ) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        put_field(&mut out, content_type.as_bytes());
        put_field(&mut out, content);
        out.extend_from_slice(&(signers.len() as u32).to_be_bytes());
        for signer in signers {
            put_field(&mut out, signer.certificate_der());
            match signer.signing_time() {
                Some(time) => {
                    out.push(1);
                    out.extend_from_slice(&time.timestamp().to_be_bytes());
                }
                None => out.push(0),
            }
        }
        out
    }
}

/// Build raw engine framing directly; used to craft malformed messages.
pub fn encode_raw_message(
    content_type: &str,
    content: &[u8],
    signers: &[MessageSigner],
) -> Vec<u8> {
    FakeSigningEngine::encode_message(content_type, content, signers)
}

fn put_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

struct FrameReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> FrameReader<'a> {
    fn take(&mut self, count: usize) -> SigningResult<&'a [u8]> {
        let end = self.offset.checked_add(count).filter(|e| *e <= self.bytes.len());
        let end = end.ok_or_else(truncated)?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_u32(&mut self) -> SigningResult<usize> {
        let bytes: [u8; 4] = self.take(4)?.try_into().map_err(|_| truncated())?;
        Ok(u32::from_be_bytes(bytes) as usize)
    }

    fn take_field(&mut self) -> SigningResult<&'a [u8]> {
        let len = self.take_u32()?;
        self.take(len)
    }
}

fn truncated() -> SigningError {
    SigningError::SignatureError("truncated signed message".to_string())
}

#[async_trait]
impl SigningEngine for FakeSigningEngine {
    async fn sign(
        &self,
        payload: &[u8],
        certificate_der: &[u8],
        cancellation: &CancellationToken,
    ) -> SigningResult<SignedMessage> {
        if cancellation.is_cancelled() {
            return Err(SigningError::OperationCancelled);
        }
        let signers = vec![MessageSigner::new(
            certificate_der.to_vec(),
            Some(fixed_signing_time()),
        )];
        let encoded = Self::encode_message("1.2.840.113549.1.7.1", payload, &signers);
        Ok(SignedMessage::new(
            encoded,
            "1.2.840.113549.1.7.1",
            payload.to_vec(),
            signers,
        ))
    }

    fn decode(&self, encoded: &[u8]) -> SigningResult<SignedMessage> {
        let mut reader = FrameReader {
            bytes: encoded,
            offset: 0,
        };
        if reader.take(4)? != MAGIC {
            return Err(truncated());
        }
        let content_type = String::from_utf8(reader.take_field()?.to_vec())
            .map_err(|_| truncated())?;
        let content = reader.take_field()?.to_vec();
        let signer_count = reader.take_u32()?;
        let mut signers = Vec::with_capacity(signer_count);
        for _ in 0..signer_count {
            let cert = reader.take_field()?.to_vec();
            let signing_time = match reader.take(1)? {
                [1] => {
                    let secs = i64::from_be_bytes(
                        reader.take(8)?.try_into().map_err(|_| truncated())?,
                    );
                    Utc.timestamp_opt(secs, 0).single()
                }
                _ => None,
            };
            signers.push(MessageSigner::new(cert, signing_time));
        }
        Ok(SignedMessage::new(
            encoded.to_vec(),
            content_type,
            content,
            signers,
        ))
    }

    fn attach_timestamp(
        &self,
        message: SignedMessage,
        _token_der: &[u8],
    ) -> SigningResult<SignedMessage> {
        self.timestamps_attached.fetch_add(1, Ordering::SeqCst);
        Ok(message)
    }
}

/// In-memory certificate store over a fixed candidate list.
pub struct FakeCertificateStore {
    pub certificates: Vec<CertificateInfo>,
}

#[async_trait]
impl CertificateStore for FakeCertificateStore {
    async fn find_certificates(
        &self,
        query: &CertificateQuery,
    ) -> SigningResult<Vec<CertificateInfo>> {
        let now = Utc::now();
        Ok(self
            .certificates
            .iter()
            .filter(|info| match &query.subject_contains {
                Some(needle) => info.subject.contains(needle),
                None => true,
            })
            .filter(|info| query.include_expired || info.not_after > now)
            .cloned()
            .collect())
    }
}

/// Returns the same canned token for every request.
pub struct FakeTimestampAuthority {
    pub token: Vec<u8>,
}

#[async_trait]
impl TimestampAuthorityClient for FakeTimestampAuthority {
    async fn request_timestamp(
        &self,
        _url: &str,
        _signature_digest: &[u8],
        cancellation: &CancellationToken,
    ) -> SigningResult<Vec<u8>> {
        if cancellation.is_cancelled() {
            return Err(SigningError::OperationCancelled);
        }
        Ok(self.token.clone())
    }
}

//! Known-vector tests over the public codec surface: the exact bytes the
//! signature-targets schema puts on the wire.

use pkgsign::{
    Asn1Integer, ByteReader, ContentDigest, EncodingForm, PackageIdentity, SignatureTarget,
    SignatureTargets, TlvValue,
};

const SHA512: &str = "2.16.840.1.101.3.4.2.3";

#[test]
fn signature_targets_known_encoding() {
    let identity = PackageIdentity::parse("A", "1.2.3").unwrap();
    let digest = ContentDigest::new(SHA512, vec![0xAA]).unwrap();
    let targets = SignatureTargets::new(SignatureTarget::new(identity, digest));

    let expected: Vec<u8> = vec![
        0x30, 0x22, // SignatureTargets SEQUENCE
        0x02, 0x01, 0x01, // version 1
        0x30, 0x1D, // SignatureTarget SEQUENCE
        0x02, 0x01, 0x01, // version 1
        0x0C, 0x01, 0x41, // packageId "A"
        0x0C, 0x05, 0x31, 0x2E, 0x32, 0x2E, 0x33, // packageVersion "1.2.3"
        0x30, 0x0E, // ContentDigest SEQUENCE
        0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03, // SHA-512 OID
        0x04, 0x01, 0xAA, // digest
    ];

    assert_eq!(targets.encode().unwrap(), expected);
    assert_eq!(SignatureTargets::decode(&expected).unwrap(), targets);
}

#[test]
fn long_form_length_round_trip() {
    // A digest over 127 bytes forces the long length form.
    let identity = PackageIdentity::parse("pkg", "1.0.0").unwrap();
    let digest = ContentDigest::new(SHA512, vec![0x5C; 200]).unwrap();
    let targets = SignatureTargets::new(SignatureTarget::new(identity, digest));

    let encoded = targets.encode().unwrap();
    // Outer content fits in one byte but exceeds 127: long form, one digit.
    assert_eq!(encoded[1], 0x81);
    assert_eq!(usize::from(encoded[2]), encoded.len() - 3);
    assert_eq!(SignatureTargets::decode(&encoded).unwrap(), targets);
}

#[test]
fn two_digit_long_form_length_round_trip() {
    let identity = PackageIdentity::parse("pkg", "1.0.0").unwrap();
    let digest = ContentDigest::new(SHA512, vec![0x5C; 300]).unwrap();
    let targets = SignatureTargets::new(SignatureTarget::new(identity, digest));

    let encoded = targets.encode().unwrap();
    // Outer content exceeds 255 bytes: two base-256 digits.
    assert_eq!(encoded[1], 0x82);
    assert_eq!(SignatureTargets::decode(&encoded).unwrap(), targets);
}

#[test]
fn integer_boundary_values_round_trip_through_tlv() {
    for value in [0i64, 127, 128, -128, 255, 65_536, i64::MAX, i64::MIN] {
        let encoded = TlvValue::integer(&Asn1Integer::from_i64(value)).encode();
        let mut reader = ByteReader::new(&encoded);
        let (decoded, form) = reader.read_integer().unwrap();
        assert_eq!(decoded.to_i64(), Some(value));
        assert_eq!(form, EncodingForm::PrimitiveDefinite);
        assert!(reader.is_empty());
    }
}

#[test]
fn oid_encoding_matches_known_vector() {
    let encoded = TlvValue::object_identifier("1.2.840.113549.1.9.5")
        .unwrap()
        .encode();
    assert_eq!(
        encoded,
        vec![0x06, 0x09, 0x2A, 0x86, 0x48, 0x86, 0xF7, 0x0D, 0x01, 0x09, 0x05]
    );

    let mut reader = ByteReader::new(&encoded);
    let (oid, _) = reader.read_object_identifier().unwrap();
    assert_eq!(oid, "1.2.840.113549.1.9.5");
}

#[test]
fn ber_indefinite_scalar_decodes_at_tlv_layer_but_not_in_schema() {
    // The TLV reader accepts the BER form.
    let value = TlvValue::octet_string(&[0xAB, 0xCD], EncodingForm::ConstructedIndefinite);
    let encoded = value.encode();
    let mut reader = ByteReader::new(&encoded);
    let (content, form) = reader.read_octet_string().unwrap();
    assert_eq!(content, vec![0xAB, 0xCD]);
    assert_eq!(form, EncodingForm::ConstructedIndefinite);

    // The schema rejects the same form for its digest field.
    let digest_seq = TlvValue::sequence(&[
        TlvValue::object_identifier(SHA512).unwrap(),
        value,
    ]);
    let tlv = TlvValue::sequence(&[
        TlvValue::integer(&Asn1Integer::from_i64(1)),
        TlvValue::sequence(&[
            TlvValue::integer(&Asn1Integer::from_i64(1)),
            TlvValue::utf8_string("pkg", EncodingForm::PrimitiveDefinite),
            TlvValue::utf8_string("1.0.0", EncodingForm::PrimitiveDefinite),
            digest_seq,
        ]),
    ]);
    assert!(SignatureTargets::decode(&tlv.encode()).is_err());
}

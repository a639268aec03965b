use json_dns_domain::{BackendAnswer, BackendRecord, RecordType};

#[test]
fn test_decode_full_payload() {
    let body = br#"{"RCODE":0,"AD":true,"Answer":[{"name":"example.com.","type":1,"TTL":300,"data":"93.184.216.34"}],"Question":[{"name":"example.com.","type":1}]}"#;

    let answer = BackendAnswer::from_json(body).unwrap();
    assert_eq!(answer.rcode, 0);
    assert!(answer.authenticated_data);
    assert_eq!(
        answer.answers,
        vec![BackendRecord::new("example.com.", 1, 300, "93.184.216.34")]
    );
    assert_eq!(answer.questions.len(), 1);
    assert_eq!(answer.questions[0].record_type, 1);
}

#[test]
fn test_missing_optional_fields_default() {
    // The reference mock backend answers misses with only an RCODE.
    let answer = BackendAnswer::from_json(br#"{"RCODE":3}"#).unwrap();
    assert_eq!(answer.rcode, 3);
    assert!(!answer.authenticated_data);
    assert!(answer.answers.is_empty());
    assert!(answer.questions.is_empty());
}

#[test]
fn test_missing_rcode_is_error() {
    assert!(BackendAnswer::from_json(br#"{"AD":false}"#).is_err());
}

#[test]
fn test_negative_rcode_is_error() {
    assert!(BackendAnswer::from_json(br#"{"RCODE":-1}"#).is_err());
}

#[test]
fn test_garbage_is_error() {
    assert!(BackendAnswer::from_json(b"<html>oops</html>").is_err());
}

#[test]
fn test_presentation_uses_mnemonic() {
    let record = BackendRecord::new("example.com.", 15, 300, "10 mail.example.com");
    assert_eq!(record.presentation(), "example.com. 300 MX 10 mail.example.com");
}

#[test]
fn test_presentation_unknown_type_uses_generic_form() {
    let record = BackendRecord::new("example.com.", 65280, 60, "\\# 0");
    assert_eq!(record.presentation(), "example.com. 60 TYPE65280 \\# 0");
}

#[test]
fn test_record_type_dnssec_signaling_set() {
    let blocked = [
        RecordType::DNSKEY,
        RecordType::RRSIG,
        RecordType::NSEC,
        RecordType::NSEC3,
        RecordType::NSEC3PARAM,
        RecordType::CDS,
        RecordType::CDNSKEY,
    ];
    for rt in blocked {
        assert!(rt.is_dnssec_signaling(), "{} should be DNSSEC signaling", rt);
    }
    for rt in [RecordType::DS, RecordType::A, RecordType::SOA, RecordType::TXT] {
        assert!(!rt.is_dnssec_signaling(), "{} should not be DNSSEC signaling", rt);
    }
}

#[test]
fn test_record_type_roundtrip_codes() {
    for code in [1u16, 2, 5, 6, 12, 15, 16, 28, 33, 46, 47, 48, 50, 51, 59, 60, 257] {
        let rt = RecordType::from_u16(code).expect("known code");
        assert_eq!(rt.to_u16(), code);
        assert_eq!(rt.as_str().parse::<RecordType>().unwrap(), rt);
    }
    assert_eq!("type6".parse::<RecordType>().unwrap(), RecordType::SOA);
    assert!("BOGUS".parse::<RecordType>().is_err());
}

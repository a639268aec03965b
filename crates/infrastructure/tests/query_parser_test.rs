use json_dns_domain::DomainError;
use json_dns_infrastructure::dns::wire::{find_opt, is_query_packet, parse_query};

mod helpers;
use helpers::QueryBuilder;

#[test]
fn test_parse_plain_query() {
    let buf = QueryBuilder::new("Example.COM", 1).id(0xBEEF).build();
    let parsed = parse_query(&buf).unwrap();

    assert_eq!(parsed.query.id, 0xBEEF);
    assert_eq!(&*parsed.query.name, "Example.COM.");
    assert_eq!(parsed.query.record_type, 1);
    assert_eq!(parsed.query.class, 1);
    assert!(parsed.query.recursion_desired);
    assert!(!parsed.query.checking_disabled);
    assert!(parsed.query.edns.is_none());
    assert_eq!(parsed.question_end, buf.len());
}

#[test]
fn test_parse_flags_echo_source() {
    let buf = QueryBuilder::new("example.com", 28)
        .recursion_desired(false)
        .checking_disabled(true)
        .build();
    let parsed = parse_query(&buf).unwrap();
    assert!(!parsed.query.recursion_desired);
    assert!(parsed.query.checking_disabled);
}

#[test]
fn test_parse_opt_keeps_raw_fields() {
    let buf = QueryBuilder::new("example.com", 1)
        .edns(4096, 0x0000_8000 | 0x0123)
        .option(10, &[1, 2, 3, 4, 5, 6, 7, 8])
        .option(8, &[0, 1, 24, 0, 192, 0, 2])
        .build();
    let parsed = parse_query(&buf).unwrap();

    let edns = parsed.query.edns.as_ref().unwrap();
    assert_eq!(edns.udp_payload_size, 4096);
    assert_eq!(edns.ttl, 0x0000_8123);
    assert!(edns.dnssec_ok());
    assert_eq!(edns.options.len(), 2);
    assert!(edns.options[0].is_cookie());
    assert_eq!(edns.options[1].data, vec![0, 1, 24, 0, 192, 0, 2]);
    assert_eq!(parsed.query.max_udp_payload(), 4096);
}

#[test]
fn test_small_edns_payload_floors_at_512() {
    let buf = QueryBuilder::new("example.com", 1).edns(100, 0).build();
    let parsed = parse_query(&buf).unwrap();
    assert_eq!(parsed.query.max_udp_payload(), 512);
}

#[test]
fn test_question_end_excludes_additional() {
    let bare = QueryBuilder::new("example.com", 1).build();
    let with_opt = QueryBuilder::new("example.com", 1).edns(1232, 0).build();
    assert_eq!(
        parse_query(&with_opt).unwrap().question_end,
        bare.len()
    );
}

#[test]
fn test_root_query_name() {
    let buf = QueryBuilder::new(".", 2).build();
    let parsed = parse_query(&buf).unwrap();
    assert_eq!(&*parsed.query.name, ".");
}

#[test]
fn test_non_query_opcode_rejected() {
    let buf = QueryBuilder::new("example.com", 1).opcode(2).build();
    assert_eq!(
        parse_query(&buf).unwrap_err(),
        DomainError::UnsupportedOpcode(2)
    );
}

#[test]
fn test_two_questions_rejected() {
    let mut buf = QueryBuilder::new("example.com", 1).build();
    buf[5] = 2;
    assert!(matches!(
        parse_query(&buf),
        Err(DomainError::MalformedQuery(_))
    ));
}

#[test]
fn test_truncated_question_rejected() {
    let buf = QueryBuilder::new("example.com", 1).build();
    assert!(matches!(
        parse_query(&buf[..buf.len() - 3]),
        Err(DomainError::MalformedQuery(_))
    ));
}

#[test]
fn test_duplicate_opt_rejected() {
    let mut buf = QueryBuilder::new("example.com", 1).edns(1232, 0).build();
    let opt = buf[buf.len() - 11..].to_vec();
    buf.extend_from_slice(&opt);
    buf[11] = 2;
    assert!(matches!(
        parse_query(&buf),
        Err(DomainError::MalformedQuery(_))
    ));
}

#[test]
fn test_option_overrunning_rdata_rejected() {
    let mut buf = QueryBuilder::new("example.com", 1)
        .option(8, &[0, 1, 0, 0])
        .build();
    let len = buf.len();
    // Claim a longer option than the RDATA holds.
    buf[len - 5] = 0x20;
    assert!(matches!(
        parse_query(&buf),
        Err(DomainError::MalformedQuery(_))
    ));
}

#[test]
fn test_is_query_packet() {
    let query = QueryBuilder::new("example.com", 1).build();
    assert!(is_query_packet(&query));

    let mut response = query.clone();
    response[2] |= 0x80;
    assert!(!is_query_packet(&response));
    assert!(!is_query_packet(&query[..11]));
}

#[test]
fn test_find_opt_in_query() {
    let buf = QueryBuilder::new("example.com", 1).edns(1400, 0).build();
    let opt = find_opt(&buf).unwrap().unwrap();
    assert_eq!(opt.udp_payload_size, 1400);

    let bare = QueryBuilder::new("example.com", 1).build();
    assert!(find_opt(&bare).unwrap().is_none());
}

#![cfg(test)]

use std::collections::HashSet;
use std::sync::Arc;

use rstest::rstest;

use crate::base::iana::{Class, ExtendedErrorCode, Rcode, Rtype};
use crate::base::{Message, Name, Question, Record, Rrset, Section, Ttl};
use crate::net::client::request::{RequestMessage, SendRequest};
use crate::net::client::validator;
use crate::rdata::dnssec::Timestamp;
use crate::rdata::{AllRecordData, Cname, Rrsig};
use crate::validator::anchor::TrustAnchors;
use crate::validator::context::{Config, ValidationContext};
use crate::validator::response::ResponseShape;
use crate::validator::test_util::{
    corrupt_signatures, init_logging, name, standard, Algorithm, Denial,
    MockUpstream, SigningKey, Zone,
};
use crate::validator::types::ValidationState;

type Validator = validator::Connection<MockUpstream>;

fn nsec3() -> Denial {
    Denial::Nsec3 {
        iterations: 0,
        opt_out: false,
    }
}

fn context(
    upstream: &MockUpstream,
    config: Config,
) -> Arc<ValidationContext<MockUpstream>> {
    Arc::new(ValidationContext::with_config(
        upstream.anchors(),
        upstream.clone(),
        config,
    ))
}

fn connection(upstream: &MockUpstream) -> Validator {
    validator::Connection::new(
        upstream.clone(),
        context(upstream, Config::default()),
    )
}

async fn query(
    conn: &Validator,
    qname: &str,
    qtype: Rtype,
    dnssec_ok: bool,
    cd: bool,
) -> Message {
    let mut msg =
        Message::query(Question::new_in(name(qname), qtype), dnssec_ok);
    msg.header_mut().set_cd(cd);
    let mut request = conn.send_request(RequestMessage::new(msg));
    request.get_response().await.unwrap()
}

fn ede_code(msg: &Message) -> Option<ExtendedErrorCode> {
    msg.extended_errors().first().map(|ede| ede.code())
}

fn has_dnssec_records(msg: &Message) -> bool {
    msg.all_records().any(|rr| rr.rtype().is_dnssec())
}

//------------ Positive answers ----------------------------------------------

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn secure_answer(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn.resolve(name("www.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("www.example."), Rtype::A));
    assert!(!has_dnssec_records(&msg));
    assert!(msg.additional().is_empty());
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn secure_answer_ecdsa_child(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("www.sub.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("www.sub.example."), Rtype::A));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn dnssec_ok_keeps_signatures(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = query(&conn, "www.example.", Rtype::A, true, false).await;
    assert!(msg.header().ad());
    assert!(msg.dnssec_ok());
    assert!(msg.has_answer(&name("www.example."), Rtype::RRSIG));

    let msg = query(&conn, "nope.example.", Rtype::A, true, false).await;
    assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
    assert!(msg.header().ad());
    assert!(msg
        .authority()
        .iter()
        .any(|rr| matches!(rr.rtype(), Rtype::NSEC | Rtype::NSEC3)));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn dname_cname_chain(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.alias.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Secure);
    assert_eq!(res.shape(), ResponseShape::Dname);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn
        .resolve(name("www.alias.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("alias.example."), Rtype::DNAME));
    assert!(msg.has_answer(&name("www.alias.example."), Rtype::CNAME));
    assert!(msg.has_answer(&name("host.example."), Rtype::A));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn dname_to_other_zone(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.ext.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Secure);
    assert_eq!(res.shape(), ResponseShape::Dname);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn
        .resolve(name("www.ext.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("ext.example."), Rtype::DNAME));
    assert!(msg.has_answer(&name("www.ext.example."), Rtype::CNAME));
    assert!(msg.has_answer(&name("www.other."), Rtype::A));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn dname_to_nodata(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("www.alias.example."), Rtype::MX)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("alias.example."), Rtype::DNAME));
    assert!(!msg.answer().iter().any(|rr| rr.rtype() == Rtype::MX));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn dname_to_nxdomain(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("x.alias.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("alias.example."), Rtype::DNAME));
    assert!(msg.has_answer(&name("x.alias.example."), Rtype::CNAME));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn cname_answer(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("cname.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Secure);
    assert_eq!(res.shape(), ResponseShape::Cname);
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn wildcard_answer(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("foo.wild.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.has_answer(&name("foo.wild.example."), Rtype::A));
}

//------------ Negative answers ----------------------------------------------

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn secure_nxdomain(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("nope.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.shape(), ResponseShape::NxDomain);
    assert_eq!(res.state(), ValidationState::Secure);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn.resolve(name("nope.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
    assert!(msg.header().ad());
    assert!(msg.answer().is_empty());
    assert!(msg.authority().iter().any(|rr| rr.rtype() == Rtype::SOA));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn secure_nodata(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.example.", Rtype::TXT);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.shape(), ResponseShape::NoData);
    assert_eq!(res.state(), ValidationState::Secure);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn.resolve(name("www.example."), Rtype::TXT).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());
    assert!(msg.answer().is_empty());
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn wildcard_nodata(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("foo.wild.example.", Rtype::TXT);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.shape(), ResponseShape::NoData);
    assert_eq!(res.state(), ValidationState::Secure);
}

#[rstest]
#[case::nsec(Denial::Nsec, "zzz.example.", Rtype::A)]
#[case::nsec_nodata(Denial::Nsec, "www.example.", Rtype::TXT)]
#[case::nsec3(nsec3(), "www.example.", Rtype::TXT)]
#[tokio::test]
async fn nxdomain_with_unrelated_proof_is_bogus(
    #[case] denial: Denial,
    #[case] donor: &str,
    #[case] donor_type: Rtype,
) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    // Swap in the proof for some other name. It doesn't cover the query
    // name.
    let mut forged = upstream.response("nope.example.", Rtype::A);
    let other = upstream.response(donor, donor_type);
    *forged.section_mut(Section::Authority) = other.authority().to_vec();
    upstream.set_override(&name("nope.example."), Rtype::A, forged);

    let msg = conn.resolve(name("nope.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(!msg.header().ad());
    assert!(msg.answer().is_empty());
    assert!(msg.authority().is_empty());
    assert!(ede_code(&msg).is_some());
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn nxdomain_with_delegation_proof_is_bogus(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    // The proof that insecure.example. has no DS. It belongs to the
    // delegation point, not to the query name.
    let mut forged = upstream.response("nope.example.", Rtype::A);
    let cut = upstream.response("insecure.example.", Rtype::DS);
    *forged.section_mut(Section::Authority) = cut.authority().to_vec();
    upstream.set_override(&name("nope.example."), Rtype::A, forged);

    let msg = conn.resolve(name("nope.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(!msg.header().ad());
    assert!(ede_code(&msg).is_some());
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn nxdomain_below_dname_is_bogus(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    // Names below a DNAME owner are redirected, not absent. The NSEC or
    // NSEC3 at the owner can't prove them away (RFC 6672, 5.3.4.1).
    let mut forged = upstream.response("www.alias.example.", Rtype::A);
    let owner = upstream.response("alias.example.", Rtype::TXT);
    forged.header_mut().set_rcode(Rcode::NXDOMAIN);
    forged.section_mut(Section::Answer).clear();
    *forged.section_mut(Section::Authority) = owner.authority().to_vec();
    upstream.set_override(&name("www.alias.example."), Rtype::A, forged);

    let msg = conn
        .resolve(name("www.alias.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(!msg.header().ad());
    assert!(msg.answer().is_empty());
    assert!(ede_code(&msg).is_some());
}

#[tokio::test]
async fn nsec3_iterations_above_limit_are_insecure() {
    init_logging();
    let upstream = standard(Denial::Nsec3 {
        iterations: 150,
        opt_out: false,
    });
    let vc = context(&upstream, Config::default());

    let response = upstream.response("nope.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Insecure);
    assert_eq!(
        res.ede().map(|ede| ede.code()),
        Some(ExtendedErrorCode::UNSUPPORTED_NSEC3_ITERATIONS_VALUE)
    );

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn.resolve(name("nope.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NXDOMAIN);
    assert!(!msg.header().ad());
}

//------------ Insecure ------------------------------------------------------

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[case::nsec3_opt_out(Denial::Nsec3 { iterations: 0, opt_out: true })]
#[tokio::test]
async fn insecure_delegation(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.insecure.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Insecure);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn
        .resolve(name("www.insecure.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(!msg.header().ad());
    assert!(msg.has_answer(&name("www.insecure.example."), Rtype::A));
}

#[tokio::test]
async fn unsupported_ds_algorithm_is_insecure() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.oddalg.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Insecure);
    assert_eq!(
        res.ede().map(|ede| ede.code()),
        Some(ExtendedErrorCode::UNSUPPORTED_DS_DIGEST_TYPE)
    );
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn referral_to_unsigned_child(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.ref.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.shape(), ResponseShape::Referral);
    assert_eq!(res.state(), ValidationState::Insecure);
}

//------------ Bogus ---------------------------------------------------------

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn ds_mismatch_is_bogus(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("www.bad.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(!msg.header().ad());
    assert!(msg.answer().is_empty());
    assert_eq!(
        msg.sole_question().map(|q| q.qname().clone()),
        Some(name("www.bad.example."))
    );
    assert!(ede_code(&msg).is_some());
}

#[tokio::test]
async fn corrupted_signature_is_bogus() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let mut forged = upstream.response("www.example.", Rtype::A);
    corrupt_signatures(&mut forged, Rtype::A);
    upstream.set_override(&name("www.example."), Rtype::A, forged);

    let msg = conn.resolve(name("www.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(msg.answer().is_empty());
    assert_eq!(ede_code(&msg), Some(ExtendedErrorCode::DNSSEC_BOGUS));
}

#[rstest]
#[case::nsec(Denial::Nsec)]
#[case::nsec3(nsec3())]
#[tokio::test]
async fn rewritten_cname_target_is_bogus(#[case] denial: Denial) {
    init_logging();
    let upstream = standard(denial);
    let conn = connection(&upstream);

    let mut forged = upstream.response("www.alias.example.", Rtype::A);
    for rr in forged.section_mut(Section::Answer) {
        if rr.rtype() == Rtype::CNAME
            && *rr.owner() == name("www.alias.example.")
        {
            *rr = rr.with_data(AllRecordData::from(Cname::new(name(
                "evil.example.",
            ))));
        }
    }
    upstream.set_override(&name("www.alias.example."), Rtype::A, forged);

    let msg = conn
        .resolve(name("www.alias.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert!(!msg.header().ad());
    assert!(msg.answer().is_empty());
}

#[tokio::test]
async fn cname_loop_is_bogus() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let msg = conn.resolve(name("loop1.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
}

#[rstest]
#[case::expired(60 * 86400, ExtendedErrorCode::SIGNATURE_EXPIRED)]
#[case::not_yet_valid(
    -2 * 86400,
    ExtendedErrorCode::SIGNATURE_NOT_YET_VALID
)]
#[tokio::test]
async fn signatures_outside_validity_are_bogus(
    #[case] offset: i64,
    #[case] code: ExtendedErrorCode,
) {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let now = i64::from(Timestamp::now().into_int());
    let mut config = Config::new();
    config.set_val_override_date(Some(Timestamp::from((now + offset) as u32)));
    let conn =
        validator::Connection::new(upstream.clone(), context(&upstream, config));

    let msg = conn.resolve(name("www.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert_eq!(ede_code(&msg), Some(code));
}

//------------ Facade behaviour ----------------------------------------------

#[tokio::test]
async fn checking_disabled_skips_validation() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let msg = query(&conn, "www.bad.example.", Rtype::A, false, true).await;
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(!msg.header().ad());
    assert!(msg.has_answer(&name("www.bad.example."), Rtype::A));

    // Only the request itself went upstream.
    assert_eq!(upstream.query_count(), 1);
}

#[tokio::test]
async fn upstream_always_gets_dnssec_ok() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let msg = query(&conn, "www.example.", Rtype::A, false, false).await;
    assert!(!has_dnssec_records(&msg));
    assert!(!msg.dnssec_ok());
    assert!(upstream.requests().iter().all(|req| req.dnssec_ok()));
}

#[rstest]
#[case::plain(false)]
#[case::dnssec_ok(true)]
#[tokio::test]
async fn ad_follows_secure_state(#[case] dnssec_ok: bool) {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let msg = query(&conn, "www.example.", Rtype::A, dnssec_ok, false).await;
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());

    let msg = query(&conn, "www.example.", Rtype::TXT, dnssec_ok, false).await;
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(msg.header().ad());

    let msg =
        query(&conn, "www.insecure.example.", Rtype::A, dnssec_ok, false)
            .await;
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(!msg.header().ad());
}

#[tokio::test]
async fn transport_failure_is_servfail() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);
    upstream.fail(&name("www.example."), Rtype::A);

    let msg = conn.resolve(name("www.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::SERVFAIL);
    assert_eq!(ede_code(&msg), Some(ExtendedErrorCode::NETWORK_ERROR));
}

#[tokio::test]
async fn failed_key_lookup_is_indeterminate() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);
    upstream.fail(&name("example."), Rtype::DS);

    let msg = conn.resolve(name("www.example."), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(!msg.header().ad());
    assert!(msg.has_answer(&name("www.example."), Rtype::A));
    assert_eq!(ede_code(&msg), Some(ExtendedErrorCode::NETWORK_ERROR));
}

#[tokio::test]
async fn lookups_are_not_repeated() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let conn = connection(&upstream);

    let msg = conn
        .resolve(name("www.sub.example."), Rtype::A)
        .await
        .unwrap();
    assert!(msg.header().ad());

    let requests = upstream.requests();
    let asked: HashSet<_> = requests
        .iter()
        .filter_map(|req| req.sole_question().cloned())
        .collect();
    assert_eq!(asked.len(), requests.len());

    // The query, then DNSKEY for three zones and DS for two.
    assert!(requests.len() <= 6);
}

#[tokio::test]
async fn validation_is_idempotent() {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let vc = context(&upstream, Config::default());

    let response = upstream.response("www.alias.example.", Rtype::A);
    let copy = response.clone();
    let first = vc.validate_msg(&response).await;
    let second = vc.validate_msg(&response).await;
    assert_eq!(first.result(), second.result());
    assert_eq!(first.shape(), second.shape());
    assert_eq!(first.secure_message(), second.secure_message());
    assert_eq!(response, copy);
}

//------------ Chain of trust ------------------------------------------------

#[rstest]
#[case::too_short(1, Rcode::SERVFAIL)]
#[case::just_enough(2, Rcode::NOERROR)]
#[tokio::test]
async fn chain_depth_limits_ds_lookups(
    #[case] depth: u8,
    #[case] rcode: Rcode,
) {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let mut config = Config::new();
    config.set_max_chain_depth(depth);
    let conn =
        validator::Connection::new(upstream.clone(), context(&upstream, config));

    // DS lookups for example. and sub.example.
    let msg = conn
        .resolve(name("www.sub.example."), Rtype::A)
        .await
        .unwrap();
    assert_eq!(msg.rcode(), rcode);
    assert_eq!(msg.header().ad(), rcode == Rcode::NOERROR);
}

#[tokio::test]
async fn deep_name_below_insecure_cut() {
    init_logging();
    let deep = "a.b.c.d.e.f.g.h.insecure.example.";
    let root = Zone::signed(".", Algorithm::Ed25519, Denial::Nsec);
    let example = Zone::signed("example.", Algorithm::Ed25519, Denial::Nsec);
    let insecure = Zone::unsigned("insecure.example.")
        .with_records(&format!("{deep} 3600 IN A 192.0.2.21\n"));
    let upstream = MockUpstream::new(vec![root, example, insecure]);
    let mut config = Config::new();
    config.set_max_chain_depth(3);
    let vc = context(&upstream, config);

    // Ten labels below the anchor, but the walk stops being secure at
    // insecure.example. after two DS lookups.
    let response = upstream.response(deep, Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), ValidationState::Insecure);

    let conn = validator::Connection::new(upstream.clone(), vc);
    let msg = conn.resolve(name(deep), Rtype::A).await.unwrap();
    assert_eq!(msg.rcode(), Rcode::NOERROR);
    assert!(!msg.header().ad());
    assert!(msg.has_answer(&name(deep), Rtype::A));
}

#[rstest]
#[case::zone_key(true, ValidationState::Secure)]
#[case::other_key(false, ValidationState::Bogus)]
#[tokio::test]
async fn dnskey_trust_anchor(
    #[case] zone_key: bool,
    #[case] expected: ValidationState,
) {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let mut anchors = TrustAnchors::empty();
    if zone_key {
        let keys = upstream.response(".", Rtype::DNSKEY);
        for rr in keys.answer().iter().filter(|rr| rr.rtype() == Rtype::DNSKEY)
        {
            anchors.add(rr.clone()).unwrap();
        }
    } else {
        let key = SigningKey::generate(Algorithm::Ed25519);
        anchors
            .add(Record::new(
                Name::root(),
                Class::IN,
                Ttl::from_secs(3600),
                AllRecordData::from(key.dnskey().clone()),
            ))
            .unwrap();
    }
    let vc = Arc::new(ValidationContext::with_config(
        anchors,
        upstream.clone(),
        Config::default(),
    ));

    let response = upstream.response("www.example.", Rtype::A);
    let res = vc.validate_msg(&response).await;
    assert_eq!(res.state(), expected);
}

//------------ validate_key_set ----------------------------------------------

#[rstest]
#[case::secure("sub.example.", ValidationState::Secure)]
#[case::mismatch("bad.example.", ValidationState::Bogus)]
#[tokio::test]
async fn key_set(#[case] zone: &str, #[case] expected: ValidationState) {
    init_logging();
    let upstream = standard(Denial::Nsec);
    let vc = context(&upstream, Config::default());

    let response = upstream.response(zone, Rtype::DNSKEY);
    let records: Vec<Record> = response
        .answer()
        .iter()
        .filter(|rr| rr.rtype() == Rtype::DNSKEY)
        .cloned()
        .collect();
    let sigs: Vec<Record<Rrsig>> = response
        .answer()
        .iter()
        .filter_map(|rr| rr.to_record())
        .collect();
    let dnskeys = Rrset::new(records, sigs).unwrap();

    let res = vc.validate_key_set(&name(zone), &dnskeys).await;
    assert_eq!(res.state(), expected);
}

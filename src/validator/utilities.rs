// Helper functions shared by the orchestrator and the chain walk.

use std::cmp::min;

use tracing::{debug, trace};

use crate::base::iana::{Class, ExtendedErrorCode, Rtype};
use crate::base::name::NameError;
use crate::base::opt::ExtendedError;
use crate::base::{Name, Record, Ttl};
use crate::rdata::dnssec::Timestamp;
use crate::rdata::{AllRecordData, Dname, Rrsig};

use super::context::Config;
use super::group::ValidatedGroup;
use super::nsec::{
    nsec3_for_not_exists_no_ce, nsec_for_not_exists, Nsec3Cache,
    Nsec3NXStateNoCE, NsecNXState,
};
use super::types::ValidationState;

/// Creates an extended error from a code and a static reason.
pub fn make_ede(
    code: ExtendedErrorCode,
    reason: &str,
) -> Option<ExtendedError> {
    Some(ExtendedError::new(code, Some(reason.into())))
}

/// Follows CNAME and DNAME records in the answer section.
///
/// Returns the final name, the weakest state of the groups used along
/// the way, and the reason if that state isn’t secure.
pub async fn do_cname_dname(
    qname: Name,
    qclass: Class,
    qtype: Rtype,
    answers: &[ValidatedGroup],
    authorities: &[ValidatedGroup],
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Name, ValidationState, Option<ExtendedError>) {
    let mut name = qname;
    let mut count = 0;
    let mut maybe_secure = ValidationState::Secure;
    let mut maybe_ede = None;
    'name_loop: loop {
        for g in answers.iter() {
            if g.class() != qclass {
                continue;
            }
            let rtype = g.rtype();
            if rtype != Rtype::CNAME && rtype != Rtype::DNAME {
                continue;
            }
            if rtype == qtype && g.owner() == &name {
                // The alias itself was asked for.
                continue;
            }

            let rr_set = g.rr_set();
            if rr_set.len() != 1 {
                // An alias set with more than one record is invalid.
                if g.owner() == &name || name.is_below(g.owner()) {
                    return (
                        name,
                        ValidationState::Bogus,
                        make_ede(
                            ExtendedErrorCode::DNSSEC_BOGUS,
                            "alias RRset with more than one record",
                        ),
                    );
                }
                continue;
            }

            match rr_set[0].data() {
                AllRecordData::Cname(cname) => {
                    if g.owner() != &name {
                        continue;
                    }
                    if let Some(ce) = g.closest_encloser() {
                        let (check, state, ede) =
                            check_not_exists_for_wildcard(
                                &name,
                                authorities,
                                g.signer_name(),
                                ce,
                                nsec3_cache,
                                config,
                            )
                            .await;
                        if !check {
                            return (name, ValidationState::Bogus, ede);
                        }
                        maybe_secure = map_maybe_secure(state, maybe_secure);
                    }
                    trace!("following CNAME {} -> {}", name, cname.cname());
                    name = cname.cname().clone();
                }
                AllRecordData::Dname(dname) => {
                    let owner = g.owner();
                    if !name.is_below(owner) {
                        // Only names strictly below the owner are
                        // substituted.
                        continue;
                    }
                    if g.closest_encloser().is_some() {
                        // Wildcard DNAMEs are undefined.
                        return (
                            name,
                            ValidationState::Bogus,
                            make_ede(
                                ExtendedErrorCode::DNSSEC_BOGUS,
                                "DNAME expanded from wildcard",
                            ),
                        );
                    }
                    if let Some(forged) = unmatched_cname(answers, &name) {
                        debug!(
                            "CNAME at {} does not match the DNAME at {}",
                            name, owner
                        );
                        return (
                            name,
                            ValidationState::Bogus,
                            make_ede(
                                ExtendedErrorCode::DNSSEC_BOGUS,
                                forged,
                            ),
                        );
                    }
                    let new_name = match map_dname(owner, dname, &name) {
                        Ok(new_name) => new_name,
                        Err(_) => {
                            return (
                                name,
                                ValidationState::Bogus,
                                make_ede(
                                    ExtendedErrorCode::DNSSEC_BOGUS,
                                    "DNAME substitution too long",
                                ),
                            );
                        }
                    };
                    trace!("following DNAME {} -> {}", name, new_name);
                    name = new_name;
                }
                _ => continue,
            }

            if g.state() != ValidationState::Secure && maybe_ede.is_none() {
                maybe_ede = g.ede().cloned();
            }
            maybe_secure = map_maybe_secure(g.state(), maybe_secure);
            if maybe_secure == ValidationState::Bogus {
                return (name, maybe_secure, maybe_ede);
            }
            count += 1;
            if count > config.max_cname_dname() {
                return (
                    name,
                    ValidationState::Bogus,
                    make_ede(
                        ExtendedErrorCode::DNSSEC_BOGUS,
                        "too many CNAME or DNAME records",
                    ),
                );
            }
            continue 'name_loop;
        }

        // No match CNAME or DNAME found.
        break;
    }

    (name, maybe_secure, maybe_ede)
}

/// Returns a reason if an unvalidated CNAME sits at a name that is
/// being substituted through a DNAME.
///
/// Synthesized CNAMEs that match the substitution have been moved out of
/// the answer before validation. Anything that is left was not
/// synthesized from the DNAME we are following.
fn unmatched_cname(
    answers: &[ValidatedGroup],
    name: &Name,
) -> Option<&'static str> {
    answers
        .iter()
        .filter(|g| g.rtype() == Rtype::CNAME && g.owner() == name)
        .find(|g| g.state() != ValidationState::Secure)
        .map(|_| "synthesized CNAME does not match DNAME")
}

/// Applies the DNAME substitution of RFC 6672 to `name`.
pub fn map_dname(
    owner: &Name,
    dname: &Dname,
    name: &Name,
) -> Result<Name, NameError> {
    name.replace_suffix(owner, dname.target())
}

/// Returns the TTL a record covered by `sig` may be given to a client.
///
/// This is the smallest of the record TTL, the original TTL and the time
/// left until the signature expires.
pub fn ttl_for_sig(sig: &Record<Rrsig>, now: Timestamp) -> Ttl {
    let ttl = min(sig.ttl(), sig.data().original_ttl());
    let until_expired =
        now.secs_until(sig.data().expiration()).unwrap_or(0);
    min(ttl, Ttl::from_secs(until_expired))
}

/// Returns the state of the group answering the question, if any.
pub fn get_answer_state<'a>(
    qname: &Name,
    qclass: Class,
    qtype: Rtype,
    groups: &'a [ValidatedGroup],
) -> Option<&'a ValidatedGroup> {
    groups.iter().find(|g| {
        g.class() == qclass && g.rtype() == qtype && g.owner() == qname
    })
}

/// Returns the state and signer of the SOA record for a negative answer.
///
/// The SOA must be at or above `qname`.
pub fn get_soa_state(
    qname: &Name,
    qclass: Class,
    groups: &[ValidatedGroup],
) -> (Option<(ValidationState, Name)>, Option<ExtendedError>) {
    let mut ede = None;
    for g in groups.iter() {
        if g.rtype() != Rtype::SOA {
            continue;
        }
        if g.class() != qclass {
            ede = make_ede(ExtendedErrorCode::DNSSEC_BOGUS, "SOA in wrong class");
            continue;
        }
        if !qname.ends_with(g.owner()) {
            ede = make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "SOA is not for the zone of the name",
            );
            continue;
        }
        let signer = if g.state() == ValidationState::Secure {
            g.signer_name().clone()
        } else {
            g.owner().clone()
        };
        return (Some((g.state(), signer)), g.ede().cloned());
    }
    (None, ede)
}

/// Combines the state of one more group with the state so far.
pub fn map_maybe_secure(
    result: ValidationState,
    maybe_secure: ValidationState,
) -> ValidationState {
    result.combine(maybe_secure)
}

/// Returns the name one label below the closest encloser on the way to
/// `target`, the so-called next closer name.
fn get_child_of_ce(target: &Name, ce: &Name) -> Option<Name> {
    target.suffix_with_labels(ce.label_count() + 1)
}

/// Checks that the name a wildcard was expanded for does not exist.
///
/// RFC 4035, Section 5.3.4: a positive answer synthesized from a wildcard
/// needs proof that the query name itself does not exist.
pub async fn check_not_exists_for_wildcard(
    name: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
    closest_encloser: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (bool, ValidationState, Option<ExtendedError>) {
    let (state, ede) = nsec_for_not_exists(name, groups, signer_name);
    match state {
        NsecNXState::Exists => {
            // The name actually exists.
            return (false, ValidationState::Bogus, ede);
        }
        NsecNXState::DoesNotExist(ce) => {
            // Make sure that the wildcard that was used for the
            // answer matches the closest encloser we got from the NSEC.
            if *closest_encloser == ce {
                return (true, ValidationState::Secure, None);
            }
            return (
                false,
                ValidationState::Bogus,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "wildcard does not match closest encloser",
                ),
            );
        }
        NsecNXState::Nothing => (), // Continue with NSEC3
    }

    let Some(child_of_ce) = get_child_of_ce(name, closest_encloser) else {
        return (
            false,
            ValidationState::Bogus,
            make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "wildcard not above the name",
            ),
        );
    };

    let (state, nsec3_ede) = nsec3_for_not_exists_no_ce(
        &child_of_ce,
        groups,
        signer_name,
        nsec3_cache,
        config,
    )
    .await;
    match state {
        Nsec3NXStateNoCE::DoesNotExist => (true, ValidationState::Secure, None),
        Nsec3NXStateNoCE::DoesNotExistInsecure => {
            (true, ValidationState::Insecure, nsec3_ede)
        }
        Nsec3NXStateNoCE::Bogus => (false, ValidationState::Bogus, nsec3_ede),
        Nsec3NXStateNoCE::Nothing => (
            false,
            ValidationState::Bogus,
            ede.or(nsec3_ede).or_else(|| {
                make_ede(
                    ExtendedErrorCode::NSEC_MISSING,
                    "no proof that the wildcard was needed",
                )
            }),
        ),
    }
}

/// Returns the wildcard name at the closest encloser.
pub fn star_closest_encloser(ce: &Name) -> Result<Name, NameError> {
    ce.wildcard()
}

//============ Tests =========================================================

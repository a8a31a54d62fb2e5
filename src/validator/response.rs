//! Validation of complete responses.
//!
//! A response is broken up into groups, every group is validated against
//! the keys of the zone that signed it, and then the shape of the response
//! decides which groups and proofs have to be secure for the response as a
//! whole to be secure.

use std::fmt;

use tracing::{debug, trace};

use crate::base::iana::{Class, ExtendedErrorCode, Rcode, Rtype};
use crate::base::opt::{ExtendedError, Opt};
use crate::base::{Message, Name, Section};
use crate::net::client::request::{RequestMessage, SendRequest};

use super::context::{Pass, ValidationContext};
use super::group::{GroupSet, ValidatedGroup};
use super::nsec::{
    nsec3_for_nodata, nsec3_for_nodata_wildcard, nsec3_for_nxdomain,
    nsec_for_nodata, nsec_for_nodata_wildcard, nsec_for_nxdomain,
    Nsec3NXState, Nsec3State, NsecNXState, NsecState,
};
use super::types::{ValidationResult, ValidationState};
use super::utilities::{
    check_not_exists_for_wildcard, do_cname_dname, get_answer_state,
    get_soa_state, make_ede,
};

//------------ ResponseShape -------------------------------------------------

/// What kind of response a message is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResponseShape {
    /// The answer section has the requested data for the query name.
    Answer,

    /// The answer was reached through one or more CNAME records.
    Cname,

    /// The answer was reached through a DNAME substitution.
    Dname,

    /// The name exists but has no data of the requested type.
    NoData,

    /// The name does not exist.
    NxDomain,

    /// The response delegates to a child zone.
    Referral,

    /// The response is malformed or reports an error.
    Error,
}

impl fmt::Display for ResponseShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseShape::Answer => "answer",
            ResponseShape::Cname => "CNAME",
            ResponseShape::Dname => "DNAME",
            ResponseShape::NoData => "NODATA",
            ResponseShape::NxDomain => "NXDOMAIN",
            ResponseShape::Referral => "referral",
            ResponseShape::Error => "error",
        })
    }
}

//------------ ValidatedResponse ---------------------------------------------

/// The outcome of validating a response.
#[derive(Clone, Debug)]
pub struct ValidatedResponse {
    shape: ResponseShape,
    result: ValidationResult,

    /// The response rebuilt from secure data only.
    secure: Option<Message>,
}

impl ValidatedResponse {
    fn new(shape: ResponseShape, result: ValidationResult) -> Self {
        Self {
            shape,
            result,
            secure: None,
        }
    }

    pub fn shape(&self) -> ResponseShape {
        self.shape
    }

    pub fn state(&self) -> ValidationState {
        self.result.state()
    }

    pub fn result(&self) -> &ValidationResult {
        &self.result
    }

    pub fn ede(&self) -> Option<&ExtendedError> {
        self.result.ede()
    }

    /// Returns the response built from the records that validated.
    ///
    /// Only available for secure responses. TTLs are capped by the
    /// signatures, authority records that didn't validate are left out and
    /// the additional section is empty.
    pub fn secure_message(&self) -> Option<&Message> {
        self.secure.as_ref()
    }

    pub fn into_secure_message(self) -> Option<Message> {
        self.secure
    }
}

//------------ Proof ---------------------------------------------------------

/// The outcome of checking a negative response.
enum Proof {
    Done(ValidationResult),
    Missing(Option<ExtendedError>),
}

//------------ validate_msg --------------------------------------------------

impl<Upstream> ValidationContext<Upstream>
where
    Upstream: SendRequest<RequestMessage> + Send + Sync,
{
    /// Validates a response message.
    ///
    /// The message itself is left alone. Validating the same message again
    /// gives the same result as long as the upstream data doesn't change.
    pub async fn validate_msg(&self, msg: &Message) -> ValidatedResponse {
        let Some(question) = msg.sole_question() else {
            debug!("response without a single question");
            return ValidatedResponse::new(
                ResponseShape::Error,
                ValidationResult::bogus(make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "response does not have a single question",
                )),
            );
        };
        let rcode = msg.rcode();
        if rcode != Rcode::NOERROR && rcode != Rcode::NXDOMAIN {
            debug!("response with rcode {}", rcode);
            return ValidatedResponse::new(
                ResponseShape::Error,
                ValidationResult::bogus(make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "response with error rcode",
                )),
            );
        }
        let qname = question.qname();
        let qclass = question.qclass();
        let qtype = question.qtype();

        let mut pass = Pass::new(self);

        let mut answers = GroupSet::from_records(msg.answer());
        answers.move_redundant_cnames();
        let authorities = GroupSet::from_records(msg.authority());

        let answers = answers.validated(&mut pass).await;
        let authorities = authorities.validated(&mut pass).await;

        // Follow the alias chain first. Everything after that is about
        // the final name.
        let (name, chain_state, chain_ede) = do_cname_dname(
            qname.clone(),
            qclass,
            qtype,
            &answers,
            &authorities,
            self.nsec3_cache(),
            self.config(),
        )
        .await;
        let alias_shape = if name == *qname {
            None
        } else if answers
            .iter()
            .any(|g| g.rtype() == Rtype::DNAME && qname.is_below(g.owner()))
        {
            Some(ResponseShape::Dname)
        } else {
            Some(ResponseShape::Cname)
        };
        let chain_result = ValidationResult::new(chain_state, chain_ede);
        if chain_state == ValidationState::Bogus {
            debug!("alias chain for {} is bogus", qname);
            return ValidatedResponse::new(
                alias_shape.unwrap_or(ResponseShape::Answer),
                chain_result,
            );
        }

        let (shape, result) = if rcode == Rcode::NOERROR {
            match get_answer_state(&name, qclass, qtype, &answers) {
                Some(group) => {
                    let result = self
                        .positive_result(&name, group, &authorities)
                        .await;
                    (alias_shape.unwrap_or(ResponseShape::Answer), result)
                }
                None if answers.is_empty() && is_referral(&authorities) => {
                    let result =
                        self.referral_result(&mut pass, qname, &authorities).await;
                    (ResponseShape::Referral, result)
                }
                None => {
                    let result = self
                        .negative_result(
                            &mut pass,
                            &name,
                            qclass,
                            qtype,
                            false,
                            &authorities,
                        )
                        .await;
                    (alias_shape.unwrap_or(ResponseShape::NoData), result)
                }
            }
        } else {
            let result = self
                .negative_result(
                    &mut pass,
                    &name,
                    qclass,
                    qtype,
                    true,
                    &authorities,
                )
                .await;
            (alias_shape.unwrap_or(ResponseShape::NxDomain), result)
        };

        let result = chain_result.combine(result);
        debug!("{} {} is {}: {}", qname, qtype, shape, result);

        let mut res = ValidatedResponse::new(shape, result);
        if res.state() == ValidationState::Secure {
            res.secure =
                Some(secure_message(msg, shape, &answers, &authorities));
        }
        res
    }

    /// Returns the result of a positive answer.
    async fn positive_result(
        &self,
        name: &Name,
        group: &ValidatedGroup,
        authorities: &[ValidatedGroup],
    ) -> ValidationResult {
        let result = group.result();
        if result.state() != ValidationState::Secure {
            return result;
        }
        let Some(ce) = group.closest_encloser() else {
            return result;
        };

        // The answer was expanded from a wildcard. The name itself must
        // not exist.
        trace!("{} expanded from wildcard at {}", name, ce);
        let (check, state, ede) = check_not_exists_for_wildcard(
            name,
            authorities,
            group.signer_name(),
            ce,
            self.nsec3_cache(),
            self.config(),
        )
        .await;
        if !check {
            return ValidationResult::bogus(ede);
        }
        ValidationResult::new(state, ede)
    }

    /// Returns the result of a NODATA or NXDOMAIN response.
    ///
    /// If the response lacks the proof, the name is looked up again once
    /// and the authority section of that response is used.
    async fn negative_result(
        &self,
        pass: &mut Pass<'_, Upstream>,
        name: &Name,
        qclass: Class,
        qtype: Rtype,
        nxdomain: bool,
        authorities: &[ValidatedGroup],
    ) -> ValidationResult {
        let first_ede = match self
            .prove_negative(pass, name, qclass, qtype, nxdomain, authorities)
            .await
        {
            Proof::Done(result) => return result,
            Proof::Missing(ede) => ede,
        };

        debug!("no proof for {} {} in response, asking again", name, qtype);
        let reply = match self.lookup(name, qtype).await {
            Ok(reply) => reply,
            Err(err) => return ValidationResult::from_error(err),
        };
        let expected = if nxdomain { Rcode::NXDOMAIN } else { Rcode::NOERROR };
        if reply.rcode() != expected || reply.has_answer(name, qtype) {
            return ValidationResult::bogus(make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "inconsistent responses for negative answer",
            ));
        }
        let refetched = GroupSet::from_records(reply.authority())
            .validated(pass)
            .await;
        match self
            .prove_negative(pass, name, qclass, qtype, nxdomain, &refetched)
            .await
        {
            Proof::Done(result) => result,
            Proof::Missing(ede) => {
                ValidationResult::bogus(ede.or(first_ede).or_else(|| {
                    make_ede(
                        ExtendedErrorCode::NSEC_MISSING,
                        "no proof of non-existence",
                    )
                }))
            }
        }
    }

    /// Checks the denial of existence for a name or a type at a name.
    async fn prove_negative(
        &self,
        pass: &mut Pass<'_, Upstream>,
        name: &Name,
        qclass: Class,
        qtype: Rtype,
        nxdomain: bool,
        groups: &[ValidatedGroup],
    ) -> Proof {
        // The SOA tells us which zone has to provide the proof. Without a
        // SOA we use the zone the name lives in.
        let (soa, soa_ede) = get_soa_state(name, qclass, groups);
        let signer = match soa {
            Some((ValidationState::Secure, signer)) => signer,
            Some((state, _)) => {
                return Proof::Done(ValidationResult::new(state, soa_ede))
            }
            None => {
                let node = pass.get_node(name).await;
                if node.state() != ValidationState::Secure {
                    return Proof::Done(node.result());
                }
                node.apex().clone()
            }
        };

        let nsec3_cache = self.nsec3_cache();
        let config = self.config();

        if nxdomain {
            let (state, ede) = nsec_for_nxdomain(name, groups, &signer);
            if let NsecNXState::DoesNotExist(_) = state {
                trace!("NSEC proves {} does not exist", name);
                return Proof::Done(ValidationResult::secure());
            }
            let (state, ede3) =
                nsec3_for_nxdomain(name, groups, &signer, nsec3_cache, config)
                    .await;
            let ede = ede.or(ede3);
            return match state {
                Nsec3NXState::DoesNotExist(_) => {
                    trace!("NSEC3 proves {} does not exist", name);
                    Proof::Done(ValidationResult::secure())
                }
                Nsec3NXState::DoesNotExistInsecure(_)
                | Nsec3NXState::Insecure => {
                    Proof::Done(ValidationResult::insecure(ede))
                }
                Nsec3NXState::Bogus => {
                    Proof::Done(ValidationResult::bogus(ede))
                }
                Nsec3NXState::Nothing => Proof::Missing(ede),
            };
        }

        let (state, ede) = nsec_for_nodata(name, groups, qtype, &signer);
        if let NsecState::NoData(_) = state {
            trace!("NSEC proves no {} at {}", qtype, name);
            return Proof::Done(ValidationResult::secure());
        }
        let (state, ede_wild) =
            nsec_for_nodata_wildcard(name, groups, qtype, &signer);
        if let NsecState::NoData(_) = state {
            trace!("NSEC proves no {} at wildcard for {}", qtype, name);
            return Proof::Done(ValidationResult::secure());
        }
        let ede = ede.or(ede_wild);

        let (state, ede3) = nsec3_for_nodata(
            name,
            groups,
            qtype,
            &signer,
            nsec3_cache,
            config,
        )
        .await;
        match state {
            Nsec3State::NoData(_) => {
                return Proof::Done(ValidationResult::secure())
            }
            Nsec3State::NoDataInsecure => {
                return Proof::Done(ValidationResult::insecure(ede3))
            }
            Nsec3State::Bogus => {
                return Proof::Done(ValidationResult::bogus(ede3))
            }
            Nsec3State::Nothing => (),
        }
        let (state, ede3_wild) = nsec3_for_nodata_wildcard(
            name,
            groups,
            qtype,
            &signer,
            nsec3_cache,
            config,
        )
        .await;
        match state {
            Nsec3State::NoData(_) => Proof::Done(ValidationResult::secure()),
            Nsec3State::NoDataInsecure => {
                Proof::Done(ValidationResult::insecure(ede3_wild))
            }
            Nsec3State::Bogus => Proof::Done(ValidationResult::bogus(ede3_wild)),
            Nsec3State::Nothing => {
                Proof::Missing(ede.or(ede3).or(ede3_wild))
            }
        }
    }

    /// Returns the result of a referral.
    ///
    /// The NS records of a delegation are not signed. A referral is
    /// secure if the DS set of the child is secure and insecure if the DS
    /// set is proven not to exist.
    async fn referral_result(
        &self,
        pass: &mut Pass<'_, Upstream>,
        qname: &Name,
        authorities: &[ValidatedGroup],
    ) -> ValidationResult {
        let Some(ns) = authorities.iter().find(|g| g.rtype() == Rtype::NS)
        else {
            return ValidationResult::bogus(None);
        };
        let cut = ns.owner();
        if !qname.ends_with(cut) {
            return ValidationResult::bogus(make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "referral is not for the query name",
            ));
        }

        if let Some(ds) = authorities
            .iter()
            .find(|g| g.rtype() == Rtype::DS && g.owner() == cut)
        {
            trace!("referral to {} with DS: {}", cut, ds.state());
            return ds.result();
        }

        let node = pass.get_node(cut).await;
        match node.state() {
            ValidationState::Secure if node.apex() == cut => {
                ValidationResult::secure()
            }
            ValidationState::Secure => ValidationResult::bogus(make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "referral to a name that is not a zone cut",
            )),
            _ => node.result(),
        }
    }
}

/// Returns whether the authority section delegates.
fn is_referral(authorities: &[ValidatedGroup]) -> bool {
    authorities.iter().any(|g| g.rtype() == Rtype::NS)
        && !authorities.iter().any(|g| g.rtype() == Rtype::SOA)
}

/// Builds the message handed out for a secure response.
///
/// The unsigned NS set of a referral is kept.
fn secure_message(
    msg: &Message,
    shape: ResponseShape,
    answers: &[ValidatedGroup],
    authorities: &[ValidatedGroup],
) -> Message {
    let mut res = Message::new();
    *res.header_mut() = msg.header();
    for question in msg.questions() {
        res.push_question(question.clone());
    }
    let sections = [(Section::Answer, answers), (Section::Authority, authorities)];
    for (section, groups) in sections {
        for g in groups {
            let delegation = shape == ResponseShape::Referral
                && section == Section::Authority
                && g.rtype() == Rtype::NS;
            if g.state() != ValidationState::Secure && !delegation {
                continue;
            }
            for rr in g.records(true) {
                res.push(section, rr);
            }
        }
    }
    res.set_opt(msg.opt().map(|opt| Opt::new(opt.dnssec_ok())));
    res
}

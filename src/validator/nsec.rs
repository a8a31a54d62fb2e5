// Helper functions for NSEC and NSEC3 validation.

use std::collections::VecDeque;
use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, trace};

use crate::base::iana::{ExtendedErrorCode, Nsec3HashAlgorithm, Rtype};
use crate::base::opt::ExtendedError;
use crate::base::Name;
use crate::crypto::AlgorithmError;
use crate::rdata::dnssec::RtypeBitmap;
use crate::rdata::nsec3::{Nsec3Salt, OwnerHash};
use crate::rdata::{AllRecordData, Nsec, Nsec3};

use super::base::nsec3_hash;
use super::context::Config;
use super::group::ValidatedGroup;
use super::types::ValidationState;
use super::utilities::{make_ede, star_closest_encloser};

//------------ NSEC ----------------------------------------------------------

#[derive(Debug)]
pub enum NsecState {
    /// The type does not exist at the name.
    ///
    /// Contains the type bitmap of the matching NSEC record, or `None` if
    /// the name is an empty non-terminal.
    NoData(Option<RtypeBitmap>),

    /// Nothing was proven.
    Nothing,
}

// NODATA proof for `target` and `rtype`.
//
// Either an NSEC owned by `target` whose bitmap lacks `rtype` and CNAME,
// or one showing that `target` is an empty non-terminal.
pub fn nsec_for_nodata(
    target: &Name,
    groups: &[ValidatedGroup],
    rtype: Rtype,
    signer_name: &Name,
) -> (NsecState, Option<ExtendedError>) {
    for g in groups.iter() {
        let Some(nsec) = get_checked_nsec(g, signer_name) else {
            continue;
        };

        let owner = g.owner();
        if target == owner {
            let types = nsec.types();

            if types.contains(rtype) || types.contains(Rtype::CNAME) {
                // The type exists after all.
                debug!("NSEC at {} has {} or CNAME", owner, rtype);
                return (
                    NsecState::Nothing,
                    make_ede(
                        ExtendedErrorCode::DNSSEC_BOGUS,
                        "NSEC shows that the type exists",
                    ),
                );
            }

            // Only the DS type lives on the parent side of a cut. For anything
            // else a record with NS but no SOA belongs to the parent zone, for DS
            // a record with SOA belongs to the child. The root has no parent, so
            // its apex record is fine for DS.
            if rtype == Rtype::DS && !target.is_root() {
                if types.contains(Rtype::NS) && types.contains(Rtype::SOA) {
                    // Child apex record used for DS.
                    return (
                        NsecState::Nothing,
                        make_ede(
                            ExtendedErrorCode::DNSSEC_BOGUS,
                            "NSEC from the child zone for DS",
                        ),
                    );
                }
            } else if types.contains(Rtype::NS) && !types.contains(Rtype::SOA)
            {
                // Parent side record used for a child type.
                return (
                    NsecState::Nothing,
                    make_ede(
                        ExtendedErrorCode::DNSSEC_BOGUS,
                        "NSEC from the parent zone",
                    ),
                );
            }

            // Regular node inside the zone.
            trace!("NSEC at {} proves no {}", owner, rtype);
            return (NsecState::NoData(Some(types.clone())), None);
        }

        // Empty non-terminal: `target` sorts before next_name and is an
        // ancestor of it.
        if target > owner
            && target < nsec.next_name()
            && nsec.next_name().is_below(target)
        {
            trace!("NSEC at {} proves {} is an empty non-terminal", owner, target);
            return (NsecState::NoData(None), None);
        }
    }
    (NsecState::Nothing, None)
}

// Wildcard NODATA proof.
//
// `target` itself must not exist and the wildcard at its closest
// encloser must have no `rtype` record, either directly or by being
// an empty non-terminal.
pub fn nsec_for_nodata_wildcard(
    target: &Name,
    groups: &[ValidatedGroup],
    rtype: Rtype,
    signer_name: &Name,
) -> (NsecState, Option<ExtendedError>) {
    let (state, ede) = nsec_for_not_exists(target, groups, signer_name);
    let ce = match state {
        NsecNXState::DoesNotExist(ce) => ce,
        NsecNXState::Nothing => return (NsecState::Nothing, ede),
        NsecNXState::Exists => {
            // The name exists, so this can't be a wildcard NODATA.
            return (NsecState::Nothing, ede);
        }
    };

    let star_name = match star_closest_encloser(&ce) {
        Ok(name) => name,
        Err(_) => {
            // No valid wildcard name.
            return (
                NsecState::Nothing,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "cannot create wildcard record",
                ),
            );
        }
    };
    nsec_for_nodata(&star_name, groups, rtype, signer_name)
}

#[derive(Debug)]
pub enum NsecNXState {
    Exists,
    DoesNotExist(Name),
    Nothing,
}

// Proves that `target` doesn't exist and returns its closest encloser.
pub fn nsec_for_not_exists(
    target: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
) -> (NsecNXState, Option<ExtendedError>) {
    for g in groups.iter() {
        let Some(nsec) = get_checked_nsec(g, signer_name) else {
            continue;
        };

        let owner = g.owner();
        if target == owner {
            // Exists.
            return (
                NsecNXState::Exists,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "found matching NSEC while trying to prove non-existence",
                ),
            );
        }

        if !nsec_in_range(target, owner, nsec.next_name()) {
            continue;
        }

        if nsec.next_name().is_below(target) {
            // Empty non-terminal, exists as well.
            return (
                NsecNXState::Exists,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "name is an empty non-terminal",
                ),
            );
        }

        if target.is_below(owner) {
            // An ancestor of target with a delegation or DNAME says nothing
            // about names below it (RFC 6672, Section 5.3.4.1).
            let types = nsec.types();
            if types.contains(Rtype::DNAME)
                || (types.contains(Rtype::NS) && !types.contains(Rtype::SOA))
            {
                debug!("NSEC at {} is a delegation or DNAME", owner);
                return (
                    NsecNXState::Nothing,
                    make_ede(
                        ExtendedErrorCode::DNSSEC_BOGUS,
                        "NSEC from delegation or DNAME proves nothing",
                    ),
                );
            }
        }

        let ce = nsec_closest_encloser(target, owner, nsec);
        trace!("NSEC at {} proves {} does not exist, ce {}", owner, target, ce);
        return (NsecNXState::DoesNotExist(ce), None);
    }
    (NsecNXState::Nothing, None)
}

// NXDOMAIN proof: neither `target` nor the wildcard at its closest
// encloser exist.
pub fn nsec_for_nxdomain(
    target: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
) -> (NsecNXState, Option<ExtendedError>) {
    let (state, ede) = nsec_for_not_exists(target, groups, signer_name);
    let ce = match state {
        NsecNXState::Exists => {
            // Exists. No proof.
            return (NsecNXState::Nothing, ede);
        }
        NsecNXState::DoesNotExist(ce) => ce,
        NsecNXState::Nothing => return (NsecNXState::Nothing, ede),
    };

    let star_name = match star_closest_encloser(&ce) {
        Ok(name) => name,
        Err(_) => {
            return (
                NsecNXState::Nothing,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "cannot create wildcard record",
                ),
            );
        }
    };
    match nsec_for_not_exists(&star_name, groups, signer_name) {
        (NsecNXState::DoesNotExist(_), _) => {
            (NsecNXState::DoesNotExist(ce), None)
        }
        (NsecNXState::Exists, _) => (
            NsecNXState::Nothing,
            make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "wildcard exists for NXDOMAIN",
            ),
        ),
        (NsecNXState::Nothing, ede) => (
            NsecNXState::Nothing,
            ede.or_else(|| {
                make_ede(
                    ExtendedErrorCode::NSEC_MISSING,
                    "no NSEC covers the wildcard",
                )
            }),
        ),
    }
}

// Whether `target` lies strictly between owner and next name.
fn nsec_in_range(target: &Name, owner: &Name, next_name: &Name) -> bool {
    if owner < next_name {
        target > owner && target < next_name
    } else {
        // Last record of the chain wraps around to the apex.
        target > owner && target.ends_with(next_name)
    }
}

fn get_checked_nsec<'a>(
    group: &'a ValidatedGroup,
    signer_name: &Name,
) -> Option<&'a Nsec> {
    if group.rtype() != Rtype::NSEC {
        return None;
    }

    let rrs = group.rr_set();
    if rrs.len() != 1 {
        // Duplicate owners make the whole set unusable.
        return None;
    }
    let AllRecordData::Nsec(nsec) = rrs[0].data() else {
        return None;
    };

    if group.state() != ValidationState::Secure {
        return None;
    }

    if group.signer_name() != signer_name {
        return None;
    }

    // A wildcard-expanded NSEC would prove things about the wrong name.
    // The wildcard owner itself has no closest encloser.
    if group.closest_encloser().is_some() {
        debug!("ignoring NSEC at {} expanded from wildcard", group.owner());
        return None;
    }

    Some(nsec)
}

fn nsec_closest_encloser(target: &Name, nsec_owner: &Name, nsec: &Nsec) -> Name {
    // Owner and next name both exist. The longer of their common
    // suffixes with target is the closest encloser.
    let owner_encloser = nsec_owner
        .iter_suffixes()
        .find(|n| target.ends_with(n))
        .unwrap_or_else(Name::root);

    let next_encloser = nsec
        .next_name()
        .iter_suffixes()
        .find(|n| target.ends_with(n))
        .unwrap_or_else(Name::root);

    if owner_encloser.label_count() > next_encloser.label_count() {
        owner_encloser
    } else {
        next_encloser
    }
}

//------------ NSEC3 ---------------------------------------------------------

#[derive(Debug)]
pub enum Nsec3State {
    /// The type does not exist at the name. Contains the type bitmap of
    /// the matching NSEC3 record.
    NoData(RtypeBitmap),

    /// The answer lies in an opt-out span or the NSEC3 records are too
    /// expensive to check.
    NoDataInsecure,

    Bogus,
    Nothing,
}

// NSEC3 NODATA proof for `target` and `rtype`.
//
// Needs a record whose owner hash matches `target` and whose bitmap
// lacks the type. For DS, an opt-out record covering `target` also does
// (RFC 5155, Section 8.6).
pub async fn nsec3_for_nodata(
    target: &Name,
    groups: &[ValidatedGroup],
    rtype: Rtype,
    signer_name: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Nsec3State, Option<ExtendedError>) {
    let checked = match get_checked_nsec3s(groups, signer_name, config) {
        Ok(checked) => checked,
        Err((ValidationState::Bogus, ede)) => return (Nsec3State::Bogus, ede),
        Err((_, ede)) => return (Nsec3State::NoDataInsecure, ede),
    };

    for (nsec3, ownerhash) in &checked {
        let Some(hash) = cached_nsec3_hash(target, nsec3, nsec3_cache).await
        else {
            continue;
        };

        if *ownerhash != *hash {
            continue;
        }

        let types = nsec3.types();

        if types.contains(rtype) || types.contains(Rtype::CNAME) {
            // The type exists after all.
            return (
                Nsec3State::Nothing,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "NSEC3 shows that the type exists",
                ),
            );
        }

        // Same parent and child side rules as for NSEC.
        if rtype == Rtype::DS && !target.is_root() {
            if types.contains(Rtype::NS) && types.contains(Rtype::SOA) {
                // Child apex record used for DS.
                return (
                    Nsec3State::Nothing,
                    make_ede(
                        ExtendedErrorCode::DNSSEC_BOGUS,
                        "NSEC3 from the child zone for DS",
                    ),
                );
            }
        } else if types.contains(Rtype::NS) && !types.contains(Rtype::SOA) {
            // Parent side record used for a child type.
            return (
                Nsec3State::Nothing,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "NSEC3 from the parent zone",
                ),
            );
        }

        trace!("NSEC3 proves no {} at {}", rtype, target);
        return (Nsec3State::NoData(types.clone()), None);
    }

    if rtype == Rtype::DS {
        // Unsigned delegations hide in opt-out spans.
        if let (Nsec3NXState::DoesNotExistInsecure(_), ede) =
            nsec3_for_not_exists(
                target,
                groups,
                signer_name,
                nsec3_cache,
                config,
            )
            .await
        {
            return (Nsec3State::NoDataInsecure, ede);
        }
    }
    (Nsec3State::Nothing, None)
}

// Wildcard NODATA via NSEC3: a closest encloser proof for `target`
// plus a matching record for the wildcard that lacks `rtype`.
pub async fn nsec3_for_nodata_wildcard(
    target: &Name,
    groups: &[ValidatedGroup],
    rtype: Rtype,
    signer_name: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Nsec3State, Option<ExtendedError>) {
    let (state, ede) =
        nsec3_for_not_exists(target, groups, signer_name, nsec3_cache, config)
            .await;
    let (ce, secure) = match state {
        Nsec3NXState::DoesNotExist(ce) => (ce, true),
        Nsec3NXState::DoesNotExistInsecure(ce) => (ce, false),
        Nsec3NXState::Insecure => return (Nsec3State::NoDataInsecure, ede),
        Nsec3NXState::Bogus => return (Nsec3State::Bogus, ede),
        Nsec3NXState::Nothing => return (Nsec3State::Nothing, ede),
    };

    let star_name = match star_closest_encloser(&ce) {
        Ok(name) => name,
        Err(_) => {
            // No valid wildcard name.
            return (
                Nsec3State::Bogus,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "cannot create wildcard record",
                ),
            );
        }
    };
    match nsec3_for_nodata(
        &star_name,
        groups,
        rtype,
        signer_name,
        nsec3_cache,
        config,
    )
    .await
    {
        (Nsec3State::NoData(types), _) => {
            if secure {
                (Nsec3State::NoData(types), None)
            } else {
                (Nsec3State::NoDataInsecure, ede)
            }
        }
        other => other,
    }
}

#[derive(Debug)]
pub enum Nsec3NXState {
    DoesNotExist(Name),
    DoesNotExistInsecure(Name),

    /// The NSEC3 records use too many iterations to be checked.
    Insecure,

    Bogus,
    Nothing,
}

// Closest encloser proof (RFC 5155, Section 8.3).
pub async fn nsec3_for_not_exists(
    target: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Nsec3NXState, Option<ExtendedError>) {
    let checked = match get_checked_nsec3s(groups, signer_name, config) {
        Ok(checked) => checked,
        Err((ValidationState::Bogus, ede)) => {
            return (Nsec3NXState::Bogus, ede)
        }
        Err((_, ede)) => return (Nsec3NXState::Insecure, ede),
    };

    // Walk down from the signer towards target. The last name with a
    // matching record right before one that is only covered is the closest
    // encloser. The covered one is the next closer name.
    let mut names = VecDeque::new();
    for n in target.iter_suffixes() {
        if !n.ends_with(signer_name) {
            break;
        }
        names.push_front(n);
    }

    let mut maybe_ce = signer_name.clone();
    let mut maybe_ce_exists = false;
    'next_name: for n in names {
        if n == *signer_name {
            maybe_ce = n;
            maybe_ce_exists = true;
            continue;
        }

        for (nsec3, ownerhash) in &checked {
            let Some(hash) = cached_nsec3_hash(&n, nsec3, nsec3_cache).await
            else {
                continue;
            };

            if *ownerhash == *hash {
                // Matches, so the name exists.
                if n == *target {
                    return (
                        Nsec3NXState::Nothing,
                        make_ede(
                            ExtendedErrorCode::DNSSEC_BOGUS,
                            "NSEC3 shows that the name exists",
                        ),
                    );
                }

                // No DNAME, and NS only together with SOA.
                let types = nsec3.types();
                if types.contains(Rtype::DNAME)
                    || (types.contains(Rtype::NS)
                        && !types.contains(Rtype::SOA))
                {
                    debug!("NSEC3 for {} is a delegation or DNAME", n);
                    return (
                        Nsec3NXState::Bogus,
                        make_ede(
                            ExtendedErrorCode::DNSSEC_BOGUS,
                            "NSEC3 shows delegation or DNAME above name",
                        ),
                    );
                }
                maybe_ce = n;
                maybe_ce_exists = true;
                continue 'next_name;
            }

            if nsec3_in_range(&hash, ownerhash, nsec3.next_owner()) {
                // Covered.
                if maybe_ce_exists {
                    if nsec3.opt_out() {
                        // Opt-out covers unsigned delegations. Insecure.
                        trace!("NSEC3 opt-out span covers {}", n);
                        return (
                            Nsec3NXState::DoesNotExistInsecure(maybe_ce),
                            make_ede(
                                ExtendedErrorCode::OTHER,
                                "NSEC3 with Opt-Out",
                            ),
                        );
                    }

                    trace!("NSEC3 proves {} does not exist, ce {}", n, maybe_ce);
                    return (Nsec3NXState::DoesNotExist(maybe_ce), None);
                }

                // Parent unproven. Keep going.
                maybe_ce_exists = false;
                continue 'next_name;
            }
        }

        // Neither matched nor covered.
        maybe_ce_exists = false;
    }

    (
        Nsec3NXState::Nothing,
        make_ede(
            ExtendedErrorCode::NSEC_MISSING,
            "no NSEC3 proves non-existence",
        ),
    )
}

#[derive(Debug)]
pub enum Nsec3NXStateNoCE {
    DoesNotExist,
    DoesNotExistInsecure,
    Bogus,
    Nothing,
}

// Proves that `target` doesn't exist when its closest encloser is
// already known, typically for the wildcard.
pub async fn nsec3_for_not_exists_no_ce(
    target: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Nsec3NXStateNoCE, Option<ExtendedError>) {
    let checked = match get_checked_nsec3s(groups, signer_name, config) {
        Ok(checked) => checked,
        Err((ValidationState::Bogus, ede)) => {
            return (Nsec3NXStateNoCE::Bogus, ede)
        }
        Err((_, ede)) => return (Nsec3NXStateNoCE::DoesNotExistInsecure, ede),
    };

    for (nsec3, ownerhash) in &checked {
        let Some(hash) = cached_nsec3_hash(target, nsec3, nsec3_cache).await
        else {
            continue;
        };

        if nsec3_in_range(&hash, ownerhash, nsec3.next_owner()) {
            // Covered.
            if nsec3.opt_out() {
                // Opt-out is insecure. Too common to deserve an EDE.
                return (Nsec3NXStateNoCE::DoesNotExistInsecure, None);
            }

            return (Nsec3NXStateNoCE::DoesNotExist, None);
        }
    }

    (Nsec3NXStateNoCE::Nothing, None)
}

// NXDOMAIN via NSEC3: closest encloser proof plus a covering record
// for the wildcard at the closest encloser.
pub async fn nsec3_for_nxdomain(
    target: &Name,
    groups: &[ValidatedGroup],
    signer_name: &Name,
    nsec3_cache: &Nsec3Cache,
    config: &Config,
) -> (Nsec3NXState, Option<ExtendedError>) {
    let (state, ede) =
        nsec3_for_not_exists(target, groups, signer_name, nsec3_cache, config)
            .await;
    let (ce, secure) = match state {
        Nsec3NXState::DoesNotExist(ce) => (ce, true),
        Nsec3NXState::DoesNotExistInsecure(ce) => (ce, false),
        Nsec3NXState::Insecure => return (Nsec3NXState::Insecure, ede),
        Nsec3NXState::Bogus => return (Nsec3NXState::Bogus, ede),
        Nsec3NXState::Nothing => return (Nsec3NXState::Nothing, ede),
    };

    let star_name = match star_closest_encloser(&ce) {
        Ok(name) => name,
        Err(_) => {
            // No valid wildcard name.
            return (
                Nsec3NXState::Bogus,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "cannot create wildcard record",
                ),
            );
        }
    };
    let (star_state, star_ede) = nsec3_for_not_exists_no_ce(
        &star_name,
        groups,
        signer_name,
        nsec3_cache,
        config,
    )
    .await;
    match star_state {
        Nsec3NXStateNoCE::DoesNotExist => {
            if secure {
                (Nsec3NXState::DoesNotExist(ce), None)
            } else {
                (Nsec3NXState::DoesNotExistInsecure(ce), ede)
            }
        }
        Nsec3NXStateNoCE::DoesNotExistInsecure => (
            Nsec3NXState::DoesNotExistInsecure(ce),
            ede.or(star_ede),
        ),
        Nsec3NXStateNoCE::Bogus => (Nsec3NXState::Bogus, star_ede),
        Nsec3NXStateNoCE::Nothing => (
            Nsec3NXState::Nothing,
            make_ede(
                ExtendedErrorCode::NSEC_MISSING,
                "no NSEC3 covers the wildcard",
            ),
        ),
    }
}

//------------ Nsec3Cache ----------------------------------------------------

type Nsec3CacheKey = (Name, Nsec3HashAlgorithm, u16, Nsec3Salt);

/// A cache of NSEC3 hashes of names.
///
/// Hashing with many iterations is expensive and the same names are hashed
/// over and over for the proofs of a zone.
pub struct Nsec3Cache {
    cache: Cache<Nsec3CacheKey, Arc<OwnerHash>>,
}

impl Nsec3Cache {
    pub fn new(size: u64) -> Self {
        Self {
            cache: Cache::new(size),
        }
    }
}

impl std::fmt::Debug for Nsec3Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nsec3Cache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

/// Returns the hash of `owner` with the parameters of an NSEC3 record.
///
/// Returns `None` if the hash algorithm is not supported.
async fn cached_nsec3_hash(
    owner: &Name,
    nsec3: &Nsec3,
    cache: &Nsec3Cache,
) -> Option<Arc<OwnerHash>> {
    let key = (
        owner.to_lowercase(),
        nsec3.hash_algorithm(),
        nsec3.iterations(),
        nsec3.salt().clone(),
    );
    if let Some(hash) = cache.cache.get(&key).await {
        return Some(hash);
    }
    let hash = match nsec3_hash(
        owner,
        nsec3.hash_algorithm(),
        nsec3.iterations(),
        nsec3.salt(),
    ) {
        Ok(hash) => Arc::new(hash),
        Err(AlgorithmError::Unsupported) => return None,
        Err(err) => {
            debug!("cannot hash {}: {}", owner, err);
            return None;
        }
    };
    cache.cache.insert(key, hash.clone()).await;
    Some(hash)
}

pub fn nsec3_in_range(
    targethash: &OwnerHash,
    ownerhash: &OwnerHash,
    nexthash: &OwnerHash,
) -> bool {
    if nexthash > ownerhash {
        ownerhash < targethash && targethash < nexthash
    } else {
        // Wraps.
        ownerhash < targethash || targethash < nexthash
    }
}

/// Returns the NSEC3 records that can be used as proof.
///
/// Records that aren't secure, belong to another zone, were expanded from
/// a wildcard, or use an unknown algorithm or flags are skipped. All
/// returned records share the parameters of the first usable one.
///
/// Fails if the iteration count is above the configured limits.
fn get_checked_nsec3s<'a>(
    groups: &'a [ValidatedGroup],
    signer_name: &Name,
    config: &Config,
) -> Result<
    Vec<(&'a Nsec3, OwnerHash)>,
    (ValidationState, Option<ExtendedError>),
> {
    let mut res: Vec<(&'a Nsec3, OwnerHash)> = Vec::new();
    for group in groups {
        let Some((nsec3, ownerhash)) = get_checked_nsec3(group, signer_name)?
        else {
            continue;
        };

        // RFC 9276, Appendix A.
        let iterations = nsec3.iterations();
        if iterations > config.nsec3_iter_bogus() {
            return Err((
                ValidationState::Bogus,
                make_ede(
                    ExtendedErrorCode::DNSSEC_BOGUS,
                    "NSEC3 with too high iteration count",
                ),
            ));
        }
        if iterations > config.nsec3_iter_insecure() {
            return Err((
                ValidationState::Insecure,
                make_ede(
                    ExtendedErrorCode::UNSUPPORTED_NSEC3_ITERATIONS_VALUE,
                    "NSEC3 with too high iteration count",
                ),
            ));
        }

        if let Some((first, _)) = res.first() {
            if first.hash_algorithm() != nsec3.hash_algorithm()
                || first.iterations() != nsec3.iterations()
                || first.salt() != nsec3.salt()
            {
                debug!("NSEC3 at {} with other parameters", group.owner());
                continue;
            }
        }
        res.push((nsec3, ownerhash));
    }
    Ok(res)
}

fn get_checked_nsec3<'a>(
    group: &'a ValidatedGroup,
    signer_name: &Name,
) -> Result<
    Option<(&'a Nsec3, OwnerHash)>,
    (ValidationState, Option<ExtendedError>),
> {
    if group.rtype() != Rtype::NSEC3 {
        return Ok(None);
    }
    let rrs = group.rr_set();
    if rrs.len() != 1 {
        // Duplicate owners make the whole set unusable.
        return Ok(None);
    }
    let AllRecordData::Nsec3(nsec3) = rrs[0].data() else {
        return Ok(None);
    };

    if group.state() != ValidationState::Secure {
        return Ok(None);
    }

    // Must come from the zone and sit directly below its apex.
    if group.signer_name() != signer_name
        || group.owner().parent().as_ref() != Some(signer_name)
    {
        return Ok(None);
    }

    // Expanded NSEC3 records are forged by definition.
    if group.closest_encloser().is_some() {
        return Ok(None);
    }

    // RFC 5155, Section 8.1: skip unknown algorithms and flags.
    if nsec3.hash_algorithm() != Nsec3HashAlgorithm::SHA1
        || nsec3.flags() & !1 != 0
    {
        return Ok(None);
    }

    let Some(ownerhash) = OwnerHash::from_label(group.owner().first()) else {
        return Err((
            ValidationState::Bogus,
            make_ede(
                ExtendedErrorCode::DNSSEC_BOGUS,
                "NSEC3 with bad owner hash",
            ),
        ));
    };

    // Skip records whose hash lengths disagree.
    if ownerhash.len() != nsec3.next_owner().len() {
        return Ok(None);
    }

    Ok(Some((nsec3, ownerhash)))
}

//============ Tests =========================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    fn hash(label: &str) -> OwnerHash {
        OwnerHash::from_label(label.as_bytes()).unwrap()
    }

    #[test]
    fn nsec_ranges() {
        let owner = name("b.example.");
        let next = name("d.example.");
        assert!(nsec_in_range(&name("c.example."), &owner, &next));
        assert!(nsec_in_range(&name("x.b.example."), &owner, &next));
        assert!(!nsec_in_range(&name("b.example."), &owner, &next));
        assert!(!nsec_in_range(&name("e.example."), &owner, &next));

        // The last record wraps around to the apex.
        let last = name("z.example.");
        let apex = name("example.");
        assert!(nsec_in_range(&name("zz.example."), &last, &apex));
        assert!(!nsec_in_range(&name("a.example."), &last, &apex));
        assert!(!nsec_in_range(&name("zz.example.net."), &last, &apex));
    }

    #[test]
    fn closest_encloser_from_nsec() {
        let nsec = Nsec::new(
            name("z.w.example."),
            RtypeBitmap::from_types([Rtype::A]),
        );
        assert_eq!(
            nsec_closest_encloser(
                &name("a.b.w.example."),
                &name("a.example."),
                &nsec
            ),
            name("w.example.")
        );
        assert_eq!(
            nsec_closest_encloser(
                &name("b.example."),
                &name("a.example."),
                &nsec
            ),
            name("example.")
        );
    }

    #[test]
    fn nsec3_ranges() {
        let a = hash("0p9mhaveqvm6t7vbl5lop2u3t2rp3tom");
        let b = hash("2t7b4g4vsa5smi47k61mv5bv1a22bojr");
        let c = hash("35mthgpgcu1qg68fab165klnsnk3dpvl");
        let z = hash("r53bq7cc2uvmubfu5ocmm6pers9tk9en");
        assert!(nsec3_in_range(&b, &a, &c));
        assert!(!nsec3_in_range(&z, &a, &c));
        assert!(!nsec3_in_range(&a, &a, &c));

        // Wrap around at the end of the chain.
        assert!(nsec3_in_range(&a, &z, &b));
        assert!(nsec3_in_range(&hash("vvvvvvvvvvvvvvvvvvvvvvvvvvvvvvvv"), &z, &b));
        assert!(!nsec3_in_range(&c, &z, &b));
    }

    #[tokio::test]
    async fn nsec3_hash_is_cached() {
        let cache = Nsec3Cache::new(10);
        let nsec3 = Nsec3::new(
            Nsec3HashAlgorithm::SHA1,
            0,
            12,
            Nsec3Salt::from_octets(Bytes::from_static(b"\xaa\xbb\xcc\xdd"))
                .unwrap(),
            hash("0p9mhaveqvm6t7vbl5lop2u3t2rp3tom"),
            RtypeBitmap::from_types([Rtype::A]),
        );
        let first = cached_nsec3_hash(&name("a.Example."), &nsec3, &cache)
            .await
            .unwrap();
        assert_eq!(first.to_label(), "35mthgpgcu1qg68fab165klnsnk3dpvl");
        let second = cached_nsec3_hash(&name("A.example."), &nsec3, &cache)
            .await
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}

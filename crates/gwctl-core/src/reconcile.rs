// ── Reconciliation engine ──
//
// Pure, synchronous functions that intersect stored ACL rules with the
// manifest capabilities of a connector app and with live announcements.
// Nothing in here touches the transport; `Acl` feeds it replies and ships
// its output.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace, warn};

use crate::metadata::{InternalMetadata, key_prefix};
use crate::model::{
    AnnouncementData, InterfaceSet, PathKey, RemotedApp, RuleInterface, RuleObjectDescription,
    RuleObjectPath, merge_interfaces,
};

/// Manifest rules touched by a conversion, with the interfaces taken
/// from each. A wildcard rule that was touched maps to an empty set.
pub type UsedRules = BTreeMap<PathKey, InterfaceSet>;

// ── Validation ──────────────────────────────────────────────────────

/// Whether a candidate path is covered by the manifest path `manifest`.
///
/// A prefix manifest entry covers every path that starts with it (plain
/// string test). An exact entry only covers an identical, non-prefix
/// candidate.
pub fn is_valid_obj_path(manifest: &RuleObjectPath, path: &str, is_prefix: bool) -> bool {
    if manifest.is_prefix {
        path.starts_with(manifest.path.as_str())
    } else {
        !is_prefix && path == manifest.path
    }
}

/// Classification of one candidate rule against a manifest list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleCheck {
    /// At least one interface (or a wildcard match) was accepted.
    pub accepted: bool,
    pub valid: InterfaceSet,
    pub invalid: InterfaceSet,
}

/// Split `candidate`'s interfaces into those the manifest grants and
/// those it does not.
///
/// Unconfigured candidates are never accepted. Accepted interfaces carry
/// the manifest's friendly name and secured flag, except under a wildcard
/// manifest rule, which accepts the candidate's interfaces as they are.
pub fn is_valid_rule(
    candidate: &RuleObjectDescription,
    capabilities: &[RuleObjectDescription],
) -> RuleCheck {
    if !candidate.configured {
        trace!(object_path = %candidate.path(), "unconfigured rule is not transmitted");
        return RuleCheck {
            accepted: false,
            valid: InterfaceSet::new(),
            invalid: candidate.interfaces.clone(),
        };
    }

    let mut pending = candidate.interfaces.clone();
    let mut valid = InterfaceSet::new();
    let mut accepted = false;

    for cap in capabilities {
        if !is_valid_obj_path(&cap.object_path, candidate.path(), candidate.object_path.is_prefix) {
            continue;
        }

        if cap.interfaces.is_empty() {
            trace!(
                object_path = %candidate.path(),
                manifest_path = %cap.path(),
                "wildcard manifest rule accepts every interface"
            );
            valid.append(&mut pending);
            return RuleCheck {
                accepted: true,
                valid,
                invalid: pending,
            };
        }

        let (matched, rest): (InterfaceSet, InterfaceSet) = pending
            .into_iter()
            .partition(|iface| cap.interfaces.contains(iface.name.as_str()));
        pending = rest;

        accepted |= !matched.is_empty();
        valid.extend(
            matched
                .iter()
                .filter_map(|iface| cap.interfaces.get(iface.name.as_str()))
                .cloned(),
        );

        if accepted && pending.is_empty() {
            break;
        }
    }

    RuleCheck {
        accepted,
        valid,
        invalid: pending,
    }
}

/// Outcome of validating a batch of candidate rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validated {
    /// Accepted candidates, pruned to their valid interfaces.
    pub valid: Vec<RuleObjectDescription>,
    /// One entry per rejected or partially rejected candidate, carrying
    /// exactly the rejected interfaces.
    pub invalid: Vec<RuleObjectDescription>,
}

/// Run [`is_valid_rule`] over every candidate.
///
/// A partially valid candidate lands in both lists.
pub fn validate_against_capabilities(
    candidates: Vec<RuleObjectDescription>,
    capabilities: &[RuleObjectDescription],
) -> Validated {
    let mut out = Validated::default();

    for mut candidate in candidates {
        let check = is_valid_rule(&candidate, capabilities);

        if !check.accepted || !check.invalid.is_empty() {
            debug!(
                object_path = %candidate.path(),
                rejected = check.invalid.len(),
                accepted = check.accepted,
                "rule does not match the manifest"
            );
            out.invalid.push(RuleObjectDescription::new(
                candidate.object_path.clone(),
                check.invalid,
                candidate.configured,
            ));
        }

        if check.accepted {
            candidate.interfaces = check.valid;
            out.valid.push(candidate);
        }
    }

    out
}

// ── Manifest intersection ───────────────────────────────────────────

/// Rewrite `descriptions` into the subset licensed by `manifest`.
///
/// Interface names from every description form one pool. Each description
/// starts from a fresh copy of it, and a name taken by one manifest rule is
/// not offered to a later manifest rule for the same description. Results
/// are keyed and merged by resulting object path and come back sorted by
/// that key, all marked configured. Manifest rules touched along the way
/// are recorded in `used`.
pub fn convert_object_description(
    descriptions: &[RuleObjectDescription],
    manifest: &[RuleObjectDescription],
    used: &mut UsedRules,
) -> Vec<RuleObjectDescription> {
    let names: BTreeSet<String> = descriptions
        .iter()
        .flat_map(|desc| desc.interface_names().map(str::to_owned))
        .collect();
    let mut results: BTreeMap<PathKey, (RuleObjectPath, InterfaceSet)> = BTreeMap::new();

    for desc in descriptions {
        let mut pool = names.clone();
        for rule in manifest {
            if pool.is_empty() {
                break;
            }
            if !is_valid_obj_path(&rule.object_path, desc.path(), desc.object_path.is_prefix) {
                continue;
            }

            let friendly_name = if rule.path() == desc.path() {
                rule.object_path.friendly_name.clone()
            } else {
                String::new()
            };
            let result_path = RuleObjectPath::new(
                desc.path(),
                friendly_name,
                desc.object_path.is_prefix,
                rule.object_path.prefix_allowed,
            );

            let converted: InterfaceSet = if rule.interfaces.is_empty() {
                used.entry(rule.object_path.key()).or_default();
                std::mem::take(&mut pool)
                    .into_iter()
                    .map(RuleInterface::named)
                    .collect()
            } else {
                let converted: InterfaceSet = rule
                    .interfaces
                    .iter()
                    .filter(|iface| pool.contains(iface.name.as_str()))
                    .cloned()
                    .collect();
                pool.retain(|name| !converted.contains(name.as_str()));
                if !converted.is_empty() {
                    merge_interfaces(
                        used.entry(rule.object_path.key()).or_default(),
                        converted.iter().cloned(),
                    );
                }
                converted
            };

            if converted.is_empty() {
                continue;
            }
            trace!(
                object_path = %result_path.path,
                manifest_path = %rule.path(),
                interfaces = converted.len(),
                "converted rule"
            );

            match results.entry(result_path.key()) {
                Entry::Vacant(slot) => {
                    slot.insert((result_path, converted));
                }
                Entry::Occupied(mut slot) => merge_interfaces(&mut slot.get_mut().1, converted),
            }
        }
    }

    results
        .into_values()
        .map(|(path, interfaces)| RuleObjectDescription::configured(path, interfaces))
        .collect()
}

/// Reconcile stored exposed services with the manifest.
///
/// The result holds the configured entries the manifest licenses, then one
/// unconfigured entry per manifest rule for whatever it offers that no
/// configured entry uses. Every manifest interface appears exactly once.
pub fn convert_exposed_services(
    acl: &[RuleObjectDescription],
    manifest: &[RuleObjectDescription],
) -> Vec<RuleObjectDescription> {
    let mut used = UsedRules::new();
    let mut result = convert_object_description(acl, manifest, &mut used);

    for rule in manifest {
        let leftover: InterfaceSet = match used.get(&rule.object_path.key()) {
            None => rule.interfaces.clone(),
            Some(taken) => {
                let leftover: InterfaceSet = rule
                    .interfaces
                    .iter()
                    .filter(|iface| !taken.contains(iface.name.as_str()))
                    .cloned()
                    .collect();
                if leftover.is_empty() {
                    continue;
                }
                leftover
            }
        };

        let store_path = RuleObjectPath::new(
            rule.path(),
            rule.object_path.friendly_name.clone(),
            false,
            rule.object_path.prefix_allowed,
        );
        result.push(RuleObjectDescription::unconfigured(store_path, leftover));
    }

    result
}

// ── Remoted apps ────────────────────────────────────────────────────

/// Fold an announced app's rules into its reconciled rules.
///
/// For each entry of `unconfigured`, interfaces already present on any
/// configured entry with the same path are dropped. What is left is
/// appended as an unconfigured placeholder, as is an entry whose path is
/// not configured at all.
pub fn add_unconfigured_remoted_app_rules(
    unconfigured: &[RuleObjectDescription],
    configured: &mut Vec<RuleObjectDescription>,
) {
    for rule in unconfigured {
        let mut leftover = rule.interfaces.clone();
        let mut matched = false;

        for existing in configured.iter().filter(|c| c.path() == rule.path()) {
            matched = true;
            leftover.retain(|iface| !existing.interfaces.contains(iface));
        }

        if !matched || !leftover.is_empty() {
            configured.push(RuleObjectDescription::unconfigured(
                rule.object_path.clone(),
                leftover,
            ));
        }
    }
}

/// Result of [`convert_remoted_apps`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotedAppsOutcome {
    pub apps: Vec<RemotedApp>,
    /// Cached display names were rewritten and should be pushed back.
    pub metadata_updated: bool,
}

/// Reconcile the stored remoted apps of an ACL with the manifest and with
/// the currently announced `configurable` apps.
///
/// Announced apps are consumed as they are matched; those never matched
/// are appended at the end. A stored app that is not announced survives
/// only if it still has licensed rules and cached display names.
pub fn convert_remoted_apps(
    stored: Vec<RemotedApp>,
    remoted_services: &[RuleObjectDescription],
    mut configurable: Vec<RemotedApp>,
    metadata: &mut InternalMetadata,
) -> RemotedAppsOutcome {
    let mut apps = Vec::with_capacity(stored.len() + configurable.len());
    let mut metadata_updated = false;

    for app in stored {
        if !app.has_app_id() {
            warn!(device_id = %app.device_id, "stored remoted app has no app id, skipping");
            continue;
        }

        let mut used = UsedRules::new();
        let mut rules = convert_object_description(&app.rules, remoted_services, &mut used);

        let prefix = key_prefix(&app.device_id, &app.app_id);
        let cached = metadata
            .display_names(&prefix)
            .map(|(app_name, device_name)| (app_name.to_owned(), device_name.to_owned()));
        if cached.is_none() {
            warn!(key = %prefix, "internal metadata for remoted app is missing or corrupted");
        }

        let live = configurable
            .iter()
            .position(|candidate| candidate.is_same_app(&app.device_id, &app.app_id))
            .map(|idx| configurable.remove(idx));

        match live {
            None => match cached {
                Some((app_name, device_name)) if !rules.is_empty() => {
                    trace!(key = %prefix, "remoted app not announced, using cached names");
                    apps.push(RemotedApp::new(
                        app.device_id,
                        app.app_id,
                        app_name,
                        device_name,
                        rules,
                    ));
                }
                _ => {
                    debug!(key = %prefix, "dropping remoted app that is neither announced nor cached");
                }
            },
            Some(live) => {
                metadata_updated |=
                    metadata.metadata_updated(&prefix, &live.app_name, &live.device_name);
                add_unconfigured_remoted_app_rules(&live.rules, &mut rules);
                if rules.is_empty() {
                    debug!(key = %prefix, "announced remoted app has no licensed rules");
                } else {
                    apps.push(RemotedApp { rules, ..live });
                }
            }
        }
    }

    apps.extend(configurable);

    RemotedAppsOutcome {
        apps,
        metadata_updated,
    }
}

/// Build the list of apps that could be configured right now: every
/// announced app with at least one object the manifest's remoted services
/// cover. Rules come back unconfigured.
pub fn extract_remoted_apps(
    remoted_services: &[RuleObjectDescription],
    announcements: &[AnnouncementData],
) -> Vec<RemotedApp> {
    let mut apps: Vec<RemotedApp> = Vec::new();

    for announcement in announcements {
        let about = &announcement.about;
        let Some(app_id) = announcement.app_id() else {
            warn!(device_id = %about.device_id, "announcement carries no usable app id");
            continue;
        };
        if about.device_id.is_empty() {
            warn!(app_name = %about.app_name, "announcement carries no device id");
            continue;
        }
        if apps.iter().any(|app| app.is_same_app(&about.device_id, &app_id)) {
            debug!(device_id = %about.device_id, %app_id, "duplicate announcement ignored");
            continue;
        }

        let mut per_path: BTreeMap<&str, (RuleObjectPath, InterfaceSet)> = BTreeMap::new();
        for object in &announcement.objects {
            for rule in remoted_services {
                if !is_valid_obj_path(&rule.object_path, &object.path, false) {
                    continue;
                }

                let matched: InterfaceSet = if rule.interfaces.is_empty() {
                    object.interfaces.iter().map(RuleInterface::named).collect()
                } else {
                    object
                        .interfaces
                        .iter()
                        .filter_map(|name| rule.interfaces.get(name.as_str()))
                        .cloned()
                        .collect()
                };
                if matched.is_empty() {
                    continue;
                }

                let friendly_name = if rule.path() == object.path {
                    rule.object_path.friendly_name.as_str()
                } else {
                    ""
                };
                let (path, interfaces) = per_path.entry(object.path.as_str()).or_insert_with(|| {
                    (
                        RuleObjectPath::new(
                            object.path.as_str(),
                            "",
                            false,
                            rule.object_path.prefix_allowed,
                        ),
                        InterfaceSet::new(),
                    )
                });
                if path.friendly_name.is_empty() && !friendly_name.is_empty() {
                    path.friendly_name = friendly_name.to_owned();
                }
                merge_interfaces(interfaces, matched);
            }
        }

        if per_path.is_empty() {
            trace!(device_id = %about.device_id, %app_id, "announced app offers nothing the manifest covers");
            continue;
        }

        let rules = per_path
            .into_values()
            .map(|(path, interfaces)| RuleObjectDescription::unconfigured(path, interfaces))
            .collect();
        apps.push(RemotedApp::new(
            about.device_id.as_str(),
            app_id,
            about.app_name.as_str(),
            about.device_name.as_str(),
            rules,
        ));
    }

    apps
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::model::{AboutData, AnnouncedObject, ManifestCapabilities};

    fn ifaces(names: &[&str]) -> InterfaceSet {
        names.iter().map(|n| RuleInterface::named(*n)).collect()
    }

    fn exact(path: &str, names: &[&str]) -> RuleObjectDescription {
        RuleObjectDescription::configured(RuleObjectPath::exact(path), ifaces(names))
    }

    fn prefix(path: &str, names: &[&str]) -> RuleObjectDescription {
        RuleObjectDescription::configured(RuleObjectPath::prefix(path), ifaces(names))
    }

    fn names(desc: &RuleObjectDescription) -> Vec<&str> {
        desc.interface_names().collect()
    }

    fn app_id(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    // ── is_valid_obj_path ──

    #[test]
    fn prefix_manifest_covers_nested_and_prefix_candidates() {
        let m = RuleObjectPath::prefix("/svc");
        assert!(is_valid_obj_path(&m, "/svc", false));
        assert!(is_valid_obj_path(&m, "/svc", true));
        assert!(is_valid_obj_path(&m, "/svc/x/y", false));
        // plain string prefix, not segment aware
        assert!(is_valid_obj_path(&m, "/svcfoo", false));
        assert!(!is_valid_obj_path(&m, "/sv", false));
    }

    #[test]
    fn exact_manifest_rejects_prefix_candidates() {
        let m = RuleObjectPath::exact("/ctrl");
        assert!(is_valid_obj_path(&m, "/ctrl", false));
        assert!(!is_valid_obj_path(&m, "/ctrl", true));
        assert!(!is_valid_obj_path(&m, "/ctrl/sub", false));
    }

    // ── is_valid_rule ──

    #[test]
    fn wildcard_manifest_accepts_any_interface() {
        let caps = [prefix("/svc", &[])];
        let candidate = exact("/svc/x", &["a.b.C", "z.y.X"]);
        let check = is_valid_rule(&candidate, &caps);
        assert!(check.accepted);
        assert_eq!(check.valid, ifaces(&["a.b.C", "z.y.X"]));
        assert!(check.invalid.is_empty());
    }

    #[test]
    fn unconfigured_candidate_is_rejected_outright() {
        let caps = [exact("/ctrl", &["org.x.A"])];
        let mut candidate = exact("/ctrl", &["org.x.A"]);
        candidate.configured = false;

        let check = is_valid_rule(&candidate, &caps);
        assert!(!check.accepted);
        assert!(check.valid.is_empty());
        assert_eq!(check.invalid, ifaces(&["org.x.A"]));
    }

    #[test]
    fn accepted_interfaces_take_manifest_metadata() {
        let caps = [RuleObjectDescription::configured(
            RuleObjectPath::exact("/ctrl"),
            [RuleInterface::new("org.x.A", "Switch", true)].into(),
        )];
        let candidate = RuleObjectDescription::configured(
            RuleObjectPath::exact("/ctrl"),
            [RuleInterface::new("org.x.A", "mine", false)].into(),
        );

        let check = is_valid_rule(&candidate, &caps);
        let iface = check.valid.get("org.x.A").unwrap();
        assert_eq!(iface.friendly_name, "Switch");
        assert!(iface.secured);
    }

    #[test]
    fn interfaces_are_collected_across_matching_rules() {
        let caps = [exact("/ctrl", &["org.x.A"]), prefix("/", &["org.x.B"])];
        let check = is_valid_rule(&exact("/ctrl", &["org.x.A", "org.x.B", "org.x.C"]), &caps);
        assert!(check.accepted);
        assert_eq!(check.valid, ifaces(&["org.x.A", "org.x.B"]));
        assert_eq!(check.invalid, ifaces(&["org.x.C"]));
    }

    #[test]
    fn no_matching_path_rejects_everything() {
        let caps = [exact("/ctrl", &["org.x.A"])];
        let check = is_valid_rule(&exact("/other", &["org.x.A"]), &caps);
        assert!(!check.accepted);
        assert_eq!(check.invalid, ifaces(&["org.x.A"]));
    }

    // ── validate_against_capabilities ──

    #[test]
    fn partially_valid_rule_lands_in_both_lists() {
        let caps = [exact("/ctrl", &["org.x.A"])];
        let out = validate_against_capabilities(
            vec![exact("/ctrl", &["org.x.A", "org.x.Z"]), exact("/nope", &["org.x.A"])],
            &caps,
        );

        assert_eq!(out.valid, vec![exact("/ctrl", &["org.x.A"])]);
        assert_eq!(
            out.invalid,
            vec![exact("/ctrl", &["org.x.Z"]), exact("/nope", &["org.x.A"])]
        );
    }

    // ── convert_object_description ──

    #[test]
    fn wildcard_prefix_conversion_has_no_friendly_name() {
        let manifest = [RuleObjectDescription::configured(
            RuleObjectPath::new("/svc", "Services", true, true),
            InterfaceSet::new(),
        )];
        let mut used = UsedRules::new();
        let out = convert_object_description(&[exact("/svc/x", &["a.b.C"])], &manifest, &mut used);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].path(), "/svc/x");
        assert_eq!(out[0].object_path.friendly_name, "");
        assert!(out[0].object_path.prefix_allowed);
        assert!(out[0].configured);
        assert_eq!(names(&out[0]), vec!["a.b.C"]);
        assert_eq!(used.get(&RuleObjectPath::prefix("/svc").key()), Some(&InterfaceSet::new()));
    }

    #[test]
    fn equal_paths_carry_manifest_friendly_name() {
        let manifest = [RuleObjectDescription::configured(
            RuleObjectPath::new("/ctrl", "Controller", false, false),
            [RuleInterface::new("org.x.A", "Switch", false)].into(),
        )];
        let mut used = UsedRules::new();
        let out = convert_object_description(&[exact("/ctrl", &["org.x.A"])], &manifest, &mut used);

        assert_eq!(out[0].object_path.friendly_name, "Controller");
        assert_eq!(out[0].interfaces.get("org.x.A").unwrap().friendly_name, "Switch");
        assert_eq!(used[&RuleObjectPath::exact("/ctrl").key()], ifaces(&["org.x.A"]));
    }

    #[test]
    fn same_interface_on_two_paths_survives_for_both() {
        let manifest = [exact("/a", &["org.x.I"]), exact("/b", &["org.x.I"])];
        let mut used = UsedRules::new();
        let out = convert_object_description(
            &[exact("/a", &["org.x.I"]), exact("/b", &["org.x.I"])],
            &manifest,
            &mut used,
        );

        assert_eq!(out, vec![exact("/a", &["org.x.I"]), exact("/b", &["org.x.I"])]);
        assert_eq!(used[&RuleObjectPath::exact("/a").key()], ifaces(&["org.x.I"]));
        assert_eq!(used[&RuleObjectPath::exact("/b").key()], ifaces(&["org.x.I"]));
    }

    #[test]
    fn stored_rules_on_two_paths_stay_configured() {
        let rules = vec![exact("/a", &["org.x.I"]), exact("/b", &["org.x.I"])];
        let out = convert_exposed_services(&rules, &rules);
        assert_eq!(out, rules);
    }

    #[test]
    fn interface_taken_by_one_manifest_rule_is_not_offered_to_the_next() {
        let manifest = [prefix("/", &["org.x.A"]), exact("/ctrl", &["org.x.A"])];
        let mut used = UsedRules::new();
        let out = convert_object_description(&[exact("/ctrl", &["org.x.A"])], &manifest, &mut used);

        assert_eq!(out.len(), 1);
        assert_eq!(used.len(), 1);
        assert!(used.contains_key(&RuleObjectPath::prefix("/").key()));
    }

    #[test]
    fn repeated_result_path_merges_interfaces() {
        let manifest = [exact("/ctrl", &["org.x.A"]), prefix("/", &["org.x.B"])];
        let mut used = UsedRules::new();
        let out =
            convert_object_description(&[exact("/ctrl", &["org.x.A", "org.x.B"])], &manifest, &mut used);

        assert_eq!(out, vec![exact("/ctrl", &["org.x.A", "org.x.B"])]);
        assert_eq!(used.len(), 2);
    }

    #[test]
    fn unlicensed_interfaces_are_dropped() {
        let manifest = [exact("/ctrl", &["org.x.A"])];
        let mut used = UsedRules::new();
        let out = convert_object_description(&[exact("/ctrl", &["org.x.Z"])], &manifest, &mut used);
        assert!(out.is_empty());
        assert!(used.is_empty());
    }

    // ── convert_exposed_services ──

    #[test]
    fn configured_and_leftover_interfaces_split_by_configuration() {
        let manifest = [exact("/ctrl", &["org.x.A", "org.x.B"])];
        let out = convert_exposed_services(&[exact("/ctrl", &["org.x.A"])], &manifest);

        assert_eq!(
            out,
            vec![
                exact("/ctrl", &["org.x.A"]),
                RuleObjectDescription::unconfigured(RuleObjectPath::exact("/ctrl"), ifaces(&["org.x.B"])),
            ]
        );
    }

    #[test]
    fn every_manifest_interface_appears_exactly_once() {
        let manifest = vec![
            exact("/ctrl", &["org.x.A", "org.x.B"]),
            prefix("/lights", &["org.x.L", "org.x.M"]),
            exact("/misc", &["org.x.Q"]),
        ];
        let acl = vec![exact("/ctrl", &["org.x.B"]), exact("/lights/1", &["org.x.L"])];
        let out = convert_exposed_services(&acl, &manifest);

        let mut seen: Vec<&str> = out.iter().flat_map(names).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec!["org.x.A", "org.x.B", "org.x.L", "org.x.M", "org.x.Q"]);

        let unconfigured: Vec<(&str, Vec<&str>)> = out
            .iter()
            .filter(|d| !d.configured)
            .map(|d| (d.path(), names(d)))
            .collect();
        assert_eq!(
            unconfigured,
            vec![
                ("/ctrl", vec!["org.x.A"]),
                ("/lights", vec!["org.x.M"]),
                ("/misc", vec!["org.x.Q"]),
            ]
        );
    }

    #[test]
    fn broader_prefix_rule_sorted_first_claims_the_interface() {
        let ctrl = RuleObjectDescription::configured(
            RuleObjectPath::new("/ctrl", "Controller", false, false),
            ifaces(&["org.x.A"]),
        );
        let caps = ManifestCapabilities::new(vec![ctrl, prefix("/", &["org.x.A", "org.x.B"])], Vec::new())
            .sorted();
        assert_eq!(caps.exposed_services[0].path(), "/");

        let out = convert_exposed_services(&[exact("/ctrl", &["org.x.A"])], &caps.exposed_services);

        assert_eq!(
            out,
            vec![
                exact("/ctrl", &["org.x.A"]),
                RuleObjectDescription::unconfigured(RuleObjectPath::exact("/"), ifaces(&["org.x.B"])),
                RuleObjectDescription::unconfigured(
                    RuleObjectPath::new("/ctrl", "Controller", false, false),
                    ifaces(&["org.x.A"]),
                ),
            ]
        );
    }

    #[test]
    fn untouched_wildcard_is_offered_unconfigured() {
        let manifest = [prefix("/any", &[])];
        let out = convert_exposed_services(&[], &manifest);
        assert_eq!(out.len(), 1);
        assert!(!out[0].configured);
        assert!(out[0].interfaces.is_empty());
        assert!(!out[0].object_path.is_prefix);
    }

    #[test]
    fn manifest_is_not_modified() {
        let manifest = vec![exact("/ctrl", &["org.x.A", "org.x.B"])];
        let before = manifest.clone();
        let _ = convert_exposed_services(&[exact("/ctrl", &["org.x.A"])], &manifest);
        assert_eq!(manifest, before);
    }

    // ── add_unconfigured_remoted_app_rules ──

    #[test]
    fn gap_fill_adds_only_missing_interfaces() {
        let unconfigured = vec![
            RuleObjectDescription::unconfigured(RuleObjectPath::exact("/svc"), ifaces(&["a.C", "a.D"])),
            RuleObjectDescription::unconfigured(RuleObjectPath::exact("/new"), ifaces(&["a.E"])),
        ];
        let mut configured = vec![exact("/svc", &["a.C"])];
        add_unconfigured_remoted_app_rules(&unconfigured, &mut configured);

        assert_eq!(
            configured,
            vec![
                exact("/svc", &["a.C"]),
                RuleObjectDescription::unconfigured(RuleObjectPath::exact("/svc"), ifaces(&["a.D"])),
                RuleObjectDescription::unconfigured(RuleObjectPath::exact("/new"), ifaces(&["a.E"])),
            ]
        );
    }

    #[test]
    fn gap_fill_is_idempotent() {
        let unconfigured = vec![
            RuleObjectDescription::unconfigured(RuleObjectPath::exact("/svc"), ifaces(&["a.C", "a.D"])),
            RuleObjectDescription::unconfigured(RuleObjectPath::exact("/empty"), InterfaceSet::new()),
        ];
        let mut configured = vec![exact("/svc", &["a.C"])];

        add_unconfigured_remoted_app_rules(&unconfigured, &mut configured);
        let once = configured.clone();
        add_unconfigured_remoted_app_rules(&unconfigured, &mut configured);
        assert_eq!(configured, once);
    }

    // ── convert_remoted_apps ──

    fn remoted_manifest() -> Vec<RuleObjectDescription> {
        vec![exact("/svc", &["a.b.C", "a.b.D"])]
    }

    fn cached(device_id: &str, id: Uuid, app_name: &str, device_name: &str) -> InternalMetadata {
        let mut meta = InternalMetadata::new();
        let prefix = key_prefix(device_id, &id);
        meta.set_app_name(&prefix, app_name);
        meta.set_device_name(&prefix, device_name);
        meta
    }

    #[test]
    fn changed_device_name_rewrites_metadata() {
        let id = app_id(7);
        let stored = vec![RemotedApp::new("dev", id, "", "", vec![exact("/svc", &["a.b.C"])])];
        let live = vec![RemotedApp::new(
            "dev",
            id,
            "Lamp",
            "Hallway",
            vec![RuleObjectDescription::unconfigured(
                RuleObjectPath::exact("/svc"),
                ifaces(&["a.b.C", "a.b.D"]),
            )],
        )];
        let mut meta = cached("dev", id, "Lamp", "Kitchen");

        let out = convert_remoted_apps(stored, &remoted_manifest(), live, &mut meta);

        assert!(out.metadata_updated);
        let prefix = key_prefix("dev", &id);
        assert_eq!(meta.device_name(&prefix), Some("Hallway"));
        assert_eq!(meta.app_name(&prefix), Some("Lamp"));

        assert_eq!(out.apps.len(), 1);
        let app = &out.apps[0];
        assert_eq!(app.device_name, "Hallway");
        assert_eq!(
            app.rules,
            vec![
                exact("/svc", &["a.b.C"]),
                RuleObjectDescription::unconfigured(RuleObjectPath::exact("/svc"), ifaces(&["a.b.D"])),
            ]
        );
    }

    #[test]
    fn unannounced_app_falls_back_to_cached_names() {
        let id = app_id(1);
        let stored = vec![RemotedApp::new("dev", id, "", "", vec![exact("/svc", &["a.b.C"])])];
        let mut meta = cached("dev", id, "Lamp", "Kitchen");

        let out = convert_remoted_apps(stored, &remoted_manifest(), Vec::new(), &mut meta);

        assert!(!out.metadata_updated);
        assert_eq!(out.apps.len(), 1);
        assert_eq!(out.apps[0].app_name, "Lamp");
        assert_eq!(out.apps[0].device_name, "Kitchen");
        assert_eq!(out.apps[0].rules, vec![exact("/svc", &["a.b.C"])]);
    }

    #[test]
    fn unannounced_app_without_cache_is_dropped() {
        let id = app_id(1);
        let stored = vec![RemotedApp::new("dev", id, "", "", vec![exact("/svc", &["a.b.C"])])];
        let mut meta = InternalMetadata::new();
        meta.set_app_name(&key_prefix("dev", &id), "Lamp");

        let out = convert_remoted_apps(stored, &remoted_manifest(), Vec::new(), &mut meta);
        assert!(out.apps.is_empty());
    }

    #[test]
    fn app_without_id_is_skipped_and_live_apps_are_appended() {
        let stored = vec![RemotedApp::new("dev", Uuid::nil(), "", "", vec![exact("/svc", &["a.b.C"])])];
        let fresh = RemotedApp::new(
            "dev2",
            app_id(2),
            "Fan",
            "Bedroom",
            vec![RuleObjectDescription::unconfigured(RuleObjectPath::exact("/svc"), ifaces(&["a.b.D"]))],
        );
        let mut meta = InternalMetadata::new();

        let out = convert_remoted_apps(stored, &remoted_manifest(), vec![fresh.clone()], &mut meta);
        assert_eq!(out.apps, vec![fresh]);
        assert!(meta.is_empty());
    }

    // ── extract_remoted_apps ──

    fn announcement(device_id: &str, id: Option<Uuid>, objects: Vec<AnnouncedObject>) -> AnnouncementData {
        AnnouncementData::new(
            900,
            AboutData {
                device_id: device_id.into(),
                app_id: id,
                app_name: "Lamp".into(),
                device_name: "Kitchen".into(),
                ..AboutData::default()
            },
            objects,
        )
    }

    #[test]
    fn announced_objects_are_intersected_with_manifest() {
        let manifest = vec![
            RuleObjectDescription::configured(
                RuleObjectPath::new("/svc", "Service", false, false),
                [RuleInterface::new("a.b.C", "Light", true)].into(),
            ),
            prefix("/any", &[]),
        ];
        let anns = vec![announcement(
            "dev",
            Some(app_id(3)),
            vec![
                AnnouncedObject::new("/svc", ["a.b.C", "a.b.Unknown"]),
                AnnouncedObject::new("/any/thing", ["x.y.Z"]),
                AnnouncedObject::new("/elsewhere", ["a.b.C"]),
            ],
        )];

        let apps = extract_remoted_apps(&manifest, &anns);
        assert_eq!(apps.len(), 1);
        let app = &apps[0];
        assert_eq!((app.app_name.as_str(), app.device_name.as_str()), ("Lamp", "Kitchen"));

        let rules: Vec<(&str, &str, Vec<&str>, bool)> = app
            .rules
            .iter()
            .map(|r| (r.path(), r.object_path.friendly_name.as_str(), names(r), r.configured))
            .collect();
        assert_eq!(
            rules,
            vec![
                ("/any/thing", "", vec!["x.y.Z"], false),
                ("/svc", "Service", vec!["a.b.C"], false),
            ]
        );
        assert!(app.rules[1].interfaces.get("a.b.C").unwrap().secured);
    }

    #[test]
    fn malformed_and_duplicate_announcements_are_skipped() {
        let manifest = vec![exact("/svc", &["a.b.C"])];
        let objects = || vec![AnnouncedObject::new("/svc", ["a.b.C"])];
        let mut second = announcement("dev", Some(app_id(4)), objects());
        second.about.app_name = "Other".into();

        let anns = vec![
            announcement("dev", None, objects()),
            announcement("dev", Some(Uuid::nil()), objects()),
            announcement("", Some(app_id(5)), objects()),
            announcement("dev", Some(app_id(4)), objects()),
            second,
            announcement("dev", Some(app_id(6)), vec![AnnouncedObject::new("/none", ["a.b.C"])]),
        ];

        let apps = extract_remoted_apps(&manifest, &anns);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app_id, app_id(4));
        assert_eq!(apps[0].app_name, "Lamp");
    }
}

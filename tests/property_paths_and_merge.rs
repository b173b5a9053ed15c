use proptest::prelude::*;

use troubleshooter::domain::models::{Investigation, InvestigationPath};
use troubleshooter::services::revision_merger;

fn identifier() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

fn resource() -> impl Strategy<Value = String> {
    "//[a-z]{1,8}\\.googleapis\\.com/[a-z0-9/]{1,12}"
}

proptest! {
    /// Property: full names built from components parse back to the same path
    #[test]
    fn prop_revision_name_round_trips(
        project in identifier(),
        investigation in identifier(),
        revision in identifier(),
    ) {
        let path = InvestigationPath::new(
            project.as_str(),
            Some(investigation.as_str()),
            Some(revision.as_str()),
        )
        .unwrap();

        let parsed = InvestigationPath::parse(&path.revision_name().unwrap()).unwrap();
        prop_assert_eq!(parsed, path);
    }

    /// Property: merging never duplicates resources and always keeps the
    /// prior ones first
    #[test]
    fn prop_merge_resources_form_ordered_set(
        prior in prop::collection::vec(resource(), 0..5),
        added in prop::collection::vec(resource(), 0..5),
    ) {
        let snapshot = Investigation::draft("t", "proj1", "first", prior.clone(), None);
        let merged = revision_merger::merge(Some(&snapshot), "second", &added).unwrap();
        let resources = &merged.snapshot().primary_observation().unwrap().relevant_resources;

        let mut seen = std::collections::HashSet::new();
        prop_assert!(resources.iter().all(|r| seen.insert(r.clone())));

        let mut expected: Vec<String> = Vec::new();
        for r in prior.iter().chain(added.iter()) {
            if !expected.contains(r) {
                expected.push(r.clone());
            }
        }
        prop_assert_eq!(resources, &expected);
    }

    /// Property: merging appends text and keeps exactly one primary
    /// observation
    #[test]
    fn prop_merge_appends_text(
        first in "[a-zA-Z0-9 ]{1,40}",
        second in "[a-zA-Z0-9 ]{1,40}",
    ) {
        let snapshot = Investigation::draft("t", "proj1", first.clone(), vec![], None);
        let merged = revision_merger::merge(Some(&snapshot), &second, &[]).unwrap();
        let merged = merged.snapshot();

        let primary = merged.primary_observation().unwrap();
        prop_assert_eq!(&primary.text, &format!("{first}\n{second}"));
        prop_assert_eq!(merged.user_observation_count(), snapshot.user_observation_count());
        // The input snapshot is left untouched
        prop_assert_eq!(&snapshot.primary_observation().unwrap().text, &first);
    }
}

//! Folds a new user observation into an investigation snapshot.
//!
//! The primary user observation accumulates: text is appended, never replaced,
//! and resource references are merged as an ordered set. The input snapshot is
//! never mutated.

use std::collections::BTreeMap;

use crate::domain::models::{Investigation, Observation, RevisionRequest, PRIMARY_OBSERVATION_ID};

/// Separator placed between previously accumulated text and new text.
pub const TEXT_DELIMITER: &str = "\n";

/// Build the body of a new revision from `prior` plus a new observation.
///
/// Returns `None` when there is no prior snapshot to merge into.
pub fn merge(
    prior: Option<&Investigation>,
    observation_text: &str,
    relevant_resources: &[String],
) -> Option<RevisionRequest> {
    let mut snapshot = prior?.clone();

    let observations = snapshot.observations.get_or_insert_with(BTreeMap::new);
    match observations.get_mut(PRIMARY_OBSERVATION_ID) {
        Some(primary) => {
            append_text(&mut primary.text, observation_text);
            merge_resources(&mut primary.relevant_resources, relevant_resources);
        }
        None => {
            observations.insert(
                PRIMARY_OBSERVATION_ID.to_string(),
                Observation::primary(observation_text, relevant_resources.to_vec(), None),
            );
        }
    }

    Some(RevisionRequest::new(snapshot))
}

fn append_text(existing: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !existing.is_empty() {
        existing.push_str(TEXT_DELIMITER);
    }
    existing.push_str(addition);
}

fn merge_resources(existing: &mut Vec<String>, additions: &[String]) {
    for resource in additions {
        if !existing.contains(resource) {
            existing.push(resource.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ObserverType, PROJECT_OBSERVATION_ID};

    fn snapshot_with_primary() -> Investigation {
        Investigation::draft(
            "Checkout errors",
            "proj1",
            "500s on /checkout",
            vec!["//run.googleapis.com/projects/proj1/services/checkout".to_string()],
            None,
        )
    }

    fn resources(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_merge_without_prior_returns_none() {
        assert!(merge(None, "anything", &[]).is_none());
    }

    #[test]
    fn test_merge_appends_text_and_resource() {
        let prior = snapshot_with_primary();
        let before = prior.user_observation_count();

        let request = merge(Some(&prior), "also 502s", &resources(&["//sql/db-1"])).unwrap();
        let merged = request.snapshot();
        let primary = merged.primary_observation().unwrap();

        assert_eq!(merged.user_observation_count(), before);
        assert_eq!(primary.text, "500s on /checkout\nalso 502s");
        assert!(primary.relevant_resources.contains(&"//sql/db-1".to_string()));
        assert_eq!(primary.relevant_resources.len(), 2);
    }

    #[test]
    fn test_merge_does_not_mutate_input() {
        let prior = snapshot_with_primary();
        let copy = prior.clone();
        let _ = merge(Some(&prior), "more", &resources(&["//x/y"]));
        assert_eq!(prior, copy);
    }

    #[test]
    fn test_duplicate_resources_are_not_repeated() {
        let prior = snapshot_with_primary();
        let existing = "//run.googleapis.com/projects/proj1/services/checkout";

        let request = merge(
            Some(&prior),
            "again",
            &resources(&[existing, "//new/one", "//new/one"]),
        )
        .unwrap();
        let primary = request.snapshot().primary_observation().unwrap();

        assert_eq!(
            primary.relevant_resources,
            resources(&[existing, "//new/one"])
        );
    }

    #[test]
    fn test_two_merges_keep_both_texts_in_order() {
        let prior = snapshot_with_primary();

        let first = merge(Some(&prior), "first note", &[]).unwrap().into_snapshot();
        let second = merge(Some(&first), "second note", &[]).unwrap();
        let text = &second.snapshot().primary_observation().unwrap().text;

        let first_at = text.find("first note").unwrap();
        let second_at = text.find("second note").unwrap();
        assert!(text.starts_with("500s on /checkout"));
        assert!(first_at < second_at);
        assert_eq!(
            second.snapshot().user_observation_count(),
            prior.user_observation_count()
        );
    }

    #[test]
    fn test_merge_into_snapshot_without_observations() {
        let prior = Investigation {
            title: "bare".to_string(),
            ..Investigation::default()
        };

        let request = merge(Some(&prior), "first words", &resources(&["//a/b"])).unwrap();
        let observations = request.snapshot().observations.as_ref().unwrap();

        assert_eq!(observations.len(), 1);
        let primary = &observations[PRIMARY_OBSERVATION_ID];
        assert_eq!(primary.text, "first words");
        assert_eq!(primary.observer_type, ObserverType::User);
        assert_eq!(primary.relevant_resources, resources(&["//a/b"]));
    }

    #[test]
    fn test_merge_leaves_project_observation_alone() {
        let prior = snapshot_with_primary();
        let request = merge(Some(&prior), "note", &[]).unwrap();
        assert_eq!(
            request.snapshot().observation(PROJECT_OBSERVATION_ID),
            prior.observation(PROJECT_OBSERVATION_ID)
        );
    }

    #[test]
    fn test_merge_into_empty_primary_text() {
        let mut prior = snapshot_with_primary();
        if let Some(obs) = prior.observations.as_mut() {
            obs.get_mut(PRIMARY_OBSERVATION_ID).unwrap().text.clear();
        }
        let request = merge(Some(&prior), "only this", &[]).unwrap();
        assert_eq!(
            request.snapshot().primary_observation().unwrap().text,
            "only this"
        );
    }
}

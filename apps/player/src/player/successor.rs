//! Successor prediction shared by Complete and Skip.
//!
//! Computed from the pre-mutation snapshot: the acted-upon resource is the only
//! one whose status is about to change, so its successor can be found before
//! the backend confirms. A stale prediction is corrected by the re-fetch that
//! follows every mutation.

use crate::models::roadmap::{ResourceRef, Roadmap};
use crate::player::gating::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct Successor {
    pub location: Location,
    pub target: ResourceRef,
    pub url: String,
}

/// First unresolved resource after `from` in its module; otherwise the head of
/// the first later module whose head is unresolved.
pub fn predict_successor(roadmap: &Roadmap, from: Location) -> Option<Successor> {
    let module = roadmap.modules.get(from.module_index)?;

    let in_module = module
        .resources
        .iter()
        .enumerate()
        .skip(from.resource_index + 1)
        .find(|(_, r)| !r.status.is_resolved())
        .map(|(resource_index, r)| Successor {
            location: Location {
                module_index: from.module_index,
                resource_index,
            },
            target: ResourceRef::new(&module.id, &r.id),
            url: r.url.clone(),
        });

    in_module.or_else(|| {
        roadmap
            .modules
            .iter()
            .enumerate()
            .skip(from.module_index + 1)
            .find_map(|(module_index, m)| {
                let head = m.resources.first()?;
                (!head.status.is_resolved()).then(|| Successor {
                    location: Location {
                        module_index,
                        resource_index: 0,
                    },
                    target: ResourceRef::new(&m.id, &head.id),
                    url: head.url.clone(),
                })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::roadmap::ResourceStatus::*;
    use crate::player::machine::tests::{resource, roadmap_with};

    fn at(module_index: usize, resource_index: usize) -> Location {
        Location {
            module_index,
            resource_index,
        }
    }

    #[test]
    fn test_next_in_same_module() {
        let roadmap = roadmap_with(vec![vec![
            resource("a", Completed, 1.0),
            resource("b", NotStarted, 1.0),
            resource("c", NotStarted, 1.0),
        ]]);
        let next = predict_successor(&roadmap, at(0, 1)).unwrap();
        assert_eq!(next.target, ResourceRef::new("m0", "c"));
        assert_eq!(next.location, at(0, 2));
    }

    #[test]
    fn test_last_resource_with_nothing_left_has_no_successor() {
        let roadmap = roadmap_with(vec![vec![
            resource("a", Completed, 1.0),
            resource("b", Completed, 1.0),
            resource("c", NotStarted, 1.0),
        ]]);
        assert_eq!(predict_successor(&roadmap, at(0, 2)), None);
    }

    #[test]
    fn test_skips_resolved_siblings() {
        let roadmap = roadmap_with(vec![vec![
            resource("a", InProgress, 1.0),
            resource("b", Skipped, 1.0),
            resource("c", Completed, 1.0),
            resource("d", NotStarted, 1.0),
        ]]);
        let next = predict_successor(&roadmap, at(0, 0)).unwrap();
        assert_eq!(next.target.resource_id, "d");
    }

    #[test]
    fn test_falls_through_to_next_module_head() {
        let roadmap = roadmap_with(vec![
            vec![resource("a", Completed, 1.0), resource("b", NotStarted, 1.0)],
            vec![resource("c", NotStarted, 1.0)],
        ]);
        let next = predict_successor(&roadmap, at(0, 1)).unwrap();
        assert_eq!(next.target, ResourceRef::new("m1", "c"));
        assert_eq!(next.location, at(1, 0));
    }

    #[test]
    fn test_later_modules_with_resolved_head_are_passed_over() {
        let roadmap = roadmap_with(vec![
            vec![resource("a", NotStarted, 1.0)],
            vec![resource("b", Completed, 1.0), resource("c", NotStarted, 1.0)],
            vec![],
            vec![resource("d", NotStarted, 1.0)],
        ]);
        let next = predict_successor(&roadmap, at(0, 0)).unwrap();
        assert_eq!(next.target, ResourceRef::new("m3", "d"));
    }

    #[test]
    fn test_earlier_unresolved_resources_are_not_considered() {
        let roadmap = roadmap_with(vec![vec![
            resource("a", NotStarted, 1.0),
            resource("b", NotStarted, 1.0),
        ]]);
        assert_eq!(predict_successor(&roadmap, at(0, 1)), None);
    }
}

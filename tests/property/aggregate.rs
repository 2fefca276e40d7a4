use proptest::prelude::*;
use menusync::contract::SyncResult;
use menusync::engine::{Observation, SyncAggregate};

fn replied_result() -> impl Strategy<Value = SyncResult> {
    prop_oneof![
        Just(SyncResult::NotSupported),
        Just(SyncResult::Ok),
        Just(SyncResult::PortalTemporarilyInaccessible),
        Just(SyncResult::IoException),
        Just(SyncResult::WrongCredentials),
        Just(SyncResult::UnknownPortalFormat),
    ]
}

fn fold(results: &[(i64, SyncResult)]) -> SyncAggregate {
    let mut aggregate = SyncAggregate::new(results.len());
    for (credential, _) in results {
        aggregate.expect((1, *credential), None, None);
    }
    for (credential, result) in results {
        aggregate
            .record_reply((1, *credential), *result, Observation::default())
            .unwrap();
    }
    aggregate
}

// Replies arrive in any order; the folded worst must not depend on it.
proptest! {
    #[test]
    fn test_worst_ignores_reply_order(
        (results, shuffled) in proptest::collection::vec(replied_result(), 1..12)
            .prop_flat_map(|results| {
                let keyed: Vec<(i64, SyncResult)> = results
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| (i as i64 + 10, r))
                    .collect();
                (Just(keyed.clone()), Just(keyed).prop_shuffle())
            })
    ) {
        let in_order = fold(&results);
        let any_order = fold(&shuffled);

        let expected = results.iter().map(|(_, r)| *r).max().unwrap();
        prop_assert!(in_order.is_complete());
        prop_assert_eq!(in_order.worst(), expected);
        prop_assert_eq!(any_order.worst(), expected);
        prop_assert_eq!(any_order.replied(), results.len());
    }

    #[test]
    fn test_expire_dominates_every_folded_result(
        results in proptest::collection::vec(replied_result(), 0..8),
        missing in 1usize..4,
    ) {
        let mut aggregate = SyncAggregate::new(results.len() + missing);
        for i in 0..(results.len() + missing) {
            aggregate.expect((1, i as i64), None, None);
        }
        for (i, result) in results.iter().enumerate() {
            aggregate.record_reply((1, i as i64), *result, Observation::default()).unwrap();
        }

        let never_replied = aggregate.expire();

        prop_assert_eq!(never_replied.len(), missing);
        prop_assert_eq!(aggregate.worst(), SyncResult::PluginTimeout);
        prop_assert!(aggregate.is_complete());
    }
}

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use menusync::contract::{SyncResult, TaskFlags, TASK_BITS};
use menusync::groups::{TaskFailure, TaskGroupRegistry};
use menusync::plugin::{NoopHooks, PluginExecutor};
use menusync_test_utils::doubles::{ctx, CountingGroup};

fn bit(i: usize) -> TaskFlags {
    TaskFlags::new(1i64 << i).unwrap()
}

// A random acyclic plugin: group i provides bit i and may only depend on
// bits of groups 0..i.
#[derive(Debug, Clone)]
struct PluginShape {
    depends: Vec<Vec<usize>>,
    failing: HashSet<usize>,
}

fn plugin_strategy() -> impl Strategy<Value = PluginShape> {
    (1..=TASK_BITS as usize).prop_flat_map(|groups| {
        (
            proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..3), groups),
            proptest::collection::hash_set(0..groups, 0..3),
        )
            .prop_map(|(raw_deps, failing)| {
                let depends = raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, raw)| {
                        if i == 0 {
                            Vec::new()
                        } else {
                            raw.into_iter().map(|d| d % i).collect()
                        }
                    })
                    .collect();
                PluginShape { depends, failing }
            })
    })
}

/// Group `i` and everything it transitively depends on.
fn closure(shape: &PluginShape, i: usize) -> HashSet<usize> {
    let mut seen = HashSet::new();
    let mut stack = vec![i];
    while let Some(g) = stack.pop() {
        if seen.insert(g) {
            stack.extend(shape.depends[g].iter().copied());
        }
    }
    seen
}

proptest! {
    #[test]
    fn test_every_requested_task_gets_exactly_one_result(
        shape in plugin_strategy(),
        requested_raw in 1i64..128,
    ) {
        let groups: Vec<Arc<CountingGroup>> = shape
            .depends
            .iter()
            .enumerate()
            .map(|(i, deps)| {
                let mut group = CountingGroup::new(&format!("g{i}"), bit(i))
                    .after(deps.iter().map(|d| bit(*d)).collect());
                if shape.failing.contains(&i) {
                    group = group.failing(TaskFailure::Io(format!("g{i} down")));
                }
                group.shared()
            })
            .collect();

        let mut registry = TaskGroupRegistry::new();
        for group in &groups {
            registry.register(group.clone()).unwrap();
        }
        let executor = PluginExecutor::new(registry, Arc::new(NoopHooks));
        let requested = TaskFlags::new(requested_raw).unwrap();

        let outcome = executor.execute(&ctx(1, 10), requested).unwrap();

        prop_assert_eq!(outcome.tasks(), requested);
        prop_assert_eq!(outcome.len() as u32, requested.bits().count_ones());

        let mut needed = HashSet::new();
        for i in 0..TASK_BITS as usize {
            let task = bit(i);
            if !requested.contains(task) {
                continue;
            }
            if i >= groups.len() {
                prop_assert_eq!(outcome.get(task), Some(SyncResult::NotSupported));
                continue;
            }
            let upstream = closure(&shape, i);
            let healthy = upstream.iter().all(|g| !shape.failing.contains(g));
            if healthy {
                prop_assert_eq!(outcome.get(task), Some(SyncResult::Ok));
            } else {
                prop_assert_ne!(outcome.get(task), Some(SyncResult::Ok));
            }
            needed.extend(upstream);
        }

        for (i, group) in groups.iter().enumerate() {
            prop_assert!(group.runs() <= 1, "g{} ran {} times", i, group.runs());
            if !needed.contains(&i) {
                prop_assert_eq!(group.runs(), 0);
            }
        }
    }
}

use proptest::prelude::*;
use menusync::contract::{is_valid_task_int, TaskFlags, TASK_BITS};

proptest! {
    #[test]
    fn test_new_accepts_exactly_the_valid_range(raw in any::<i64>()) {
        let valid = (0..(1i64 << TASK_BITS)).contains(&raw);
        prop_assert_eq!(is_valid_task_int(raw), valid);
        prop_assert_eq!(TaskFlags::new(raw).is_ok(), valid);
    }

    #[test]
    fn test_iter_splits_into_single_bits(raw in 0i64..128) {
        let flags = TaskFlags::new(raw).unwrap();
        let bits: Vec<TaskFlags> = flags.iter().collect();

        prop_assert_eq!(bits.len() as u32, flags.bits().count_ones());
        for bit in &bits {
            prop_assert_eq!(bit.bits().count_ones(), 1);
            prop_assert!(flags.contains(*bit));
        }
        prop_assert_eq!(bits.into_iter().collect::<TaskFlags>(), flags);
    }
}

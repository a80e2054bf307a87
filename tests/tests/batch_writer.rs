//! Batch writer behavior against the fixture hierarchy.
//!
//! Every test runs a writer backed by `ScriptedAllocator::standard()`, which
//! accepts at most one request for two incomplete keys.

use strata_tests::prelude::*;

fn writer(allocator: &ScriptedAllocator) -> BatchWriter<'_> {
    init_tracing();
    BatchWriter::new(allocator)
}

// ========== add ==========

mod add {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_resolves_incomplete_keys() {
        // GIVEN
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let named = Entity::builder_from(&entity2())
            .key(Key::builder_from(&key1()).name("name2").build().unwrap())
            .build()
            .unwrap();

        // WHEN
        let entities = writer
            .add([
                Record::from(entity1()),
                incomplete_entity_1().into(),
                incomplete_entity_2().into(),
                named.clone().into(),
            ])
            .unwrap();

        // THEN
        let allocated_1 = incomplete_entity_1().complete(key2());
        let allocated_2 = incomplete_entity_2().complete(key3());
        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Insert(entity1()),
                Mutation::Insert(named.clone()),
                Mutation::Insert(allocated_1.clone()),
                Mutation::Insert(allocated_2.clone()),
            ]
        );
        assert_eq!(entities, vec![entity1(), allocated_1, allocated_2, named]);
        assert_eq!(allocator.calls(), 1);
    }

    // Insert after delete cannot be told apart from an insert over an
    // existing entity on the wire, so it is sent as an upsert.
    #[test]
    fn test_add_after_delete_becomes_upsert() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.delete([key1()]).unwrap();
        writer.add([entity1()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity1())]);
    }

    #[test]
    fn test_add_duplicate() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.add([entity1()]).unwrap();

        let result = writer.add([entity1()]);

        assert_eq!(result, Err(MutationError::duplicate_key(key1())));
    }

    #[test]
    fn test_add_after_put() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.put([entity1()]).unwrap();

        let result = writer.add([entity1()]);

        assert_eq!(
            result,
            Err(MutationError::conflicting_operation(key1(), OpKind::Upsert, OpKind::Insert))
        );
    }

    #[test]
    fn test_add_after_update() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.update([entity1()]).unwrap();

        let result = writer.add([entity1()]);

        assert_eq!(
            result,
            Err(MutationError::conflicting_operation(key1(), OpKind::Update, OpKind::Insert))
        );
    }

    #[test]
    fn test_add_when_not_active() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.deactivate();

        assert_eq!(writer.add([entity1()]), Err(MutationError::SessionInactive));
        assert_eq!(allocator.calls(), 0);
    }

    #[test]
    fn test_allocated_key_colliding_with_pending_insert() {
        // GIVEN: key2 is already pending as an insert
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.add([entity2()]).unwrap();

        // WHEN: the allocator hands key2 out again
        let result = writer.add([incomplete_entity_1(), incomplete_entity_2()]);

        // THEN
        assert_eq!(result, Err(MutationError::duplicate_key(key2())));
        assert_eq!(writer.to_mutations(), vec![Mutation::Insert(entity2())]);
    }

    #[test]
    fn test_allocator_failure_is_atomic() {
        // GIVEN
        let allocator = ScriptedAllocator::new(
            vec![incomplete_key(), incomplete_key()],
            Err(strata_mutation::AllocatorError::request("deadline exceeded", true)),
        );
        let mut writer = writer(&allocator);
        writer.put([entity3()]).unwrap();

        // WHEN
        let result = writer.add([
            Record::from(entity1()),
            incomplete_entity_1().into(),
            incomplete_entity_2().into(),
        ]);

        // THEN
        assert_error_matches(result, "^Key allocation failed: .*deadline exceeded");
        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity3())]);
        assert!(writer.is_active());
    }

    #[test]
    fn test_short_allocation_is_rejected() {
        let allocator = ScriptedAllocator::new(
            vec![incomplete_key(), incomplete_key()],
            Ok(vec![key2()]),
        );
        let mut writer = writer(&allocator);

        let result = writer.add([incomplete_entity_1(), incomplete_entity_2()]);

        assert_error_matches(result, "returned 1 keys for 2 requested");
        assert!(writer.is_empty());
    }

    #[test]
    fn test_allocation_for_the_wrong_kind_is_rejected() {
        let foreign = Key::child_of(&key1(), "kind2").id(7).build().unwrap();
        let allocator = ScriptedAllocator::new(
            vec![incomplete_key(), incomplete_key()],
            Ok(vec![key2(), foreign]),
        );
        let mut writer = writer(&allocator);

        let result = writer.add([incomplete_entity_1(), incomplete_entity_2()]);

        assert_error_matches(result, "kind2\\(7\\) for requested .*kind1\\(\\?\\)");
        assert!(writer.is_empty());
    }
}

// ========== add_with_deferred_allocation ==========

mod add_with_deferred_allocation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_deferred_entities_follow_in_call_order() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer
            .add_with_deferred_allocation([Record::from(entity1()), incomplete_entity_1().into()])
            .unwrap();
        writer.add_with_deferred_allocation([incomplete_entity_2()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Insert(entity1()),
                Mutation::InsertAutoId(incomplete_entity_1()),
                Mutation::InsertAutoId(incomplete_entity_2()),
            ]
        );
        assert_eq!(allocator.calls(), 0);
    }

    #[test]
    fn test_identical_deferred_entities_are_kept() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer
            .add_with_deferred_allocation([incomplete_entity_1(), incomplete_entity_1()])
            .unwrap();

        assert_eq!(writer.len(), 2);
    }

    #[test]
    fn test_complete_keys_still_merge() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.add([entity1()]).unwrap();

        let result = writer.add_with_deferred_allocation([
            Record::from(incomplete_entity_1()),
            entity1().into(),
        ]);

        assert_eq!(result, Err(MutationError::duplicate_key(key1())));
        assert!(writer.deferred().is_empty());
    }

    #[test]
    fn test_add_with_deferred_allocation_when_not_active() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.deactivate();

        assert_eq!(
            writer.add_with_deferred_allocation([incomplete_entity_1()]),
            Err(MutationError::SessionInactive)
        );
    }
}

// ========== update ==========

mod update {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_update() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.update([entity1(), entity2()]).unwrap();
        writer.update([entity3()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Update(entity1()),
                Mutation::Update(entity2()),
                Mutation::Update(entity3()),
            ]
        );
    }

    #[test]
    fn test_update_after_update() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.update([entity1()]).unwrap();
        writer.update([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Update(entity)]);
    }

    #[test]
    fn test_update_after_add() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.add([entity1()]).unwrap();
        writer.update([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_update_after_put() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.put([entity1()]).unwrap();
        writer.update([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_update_after_delete() {
        // GIVEN
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.delete([key1()]).unwrap();

        // WHEN
        let result = writer.update([entity2(), entity1()]);

        // THEN: entity2 was valid on its own but the call applies nothing
        assert_eq!(
            result,
            Err(MutationError::conflicting_operation(key1(), OpKind::Delete, OpKind::Update))
        );
        assert_eq!(writer.to_mutations(), vec![Mutation::Delete(key1())]);
    }

    #[test]
    fn test_update_when_not_active() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.deactivate();

        assert_eq!(writer.update([entity1()]), Err(MutationError::SessionInactive));
    }
}

// ========== put ==========

mod put {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_put() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.put([entity1(), entity2()]).unwrap();
        writer.put([entity3()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Upsert(entity1()),
                Mutation::Upsert(entity2()),
                Mutation::Upsert(entity3()),
            ]
        );
    }

    #[test]
    fn test_put_after_put() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.put([entity1()]).unwrap();
        writer.put([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_put_after_add() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.add([entity1()]).unwrap();
        writer.put([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_put_after_update() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.update([entity1()]).unwrap();
        writer.put([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_put_after_delete() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.delete([key1()]).unwrap();
        writer.put([entity.clone()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Upsert(entity)]);
    }

    #[test]
    fn test_put_same_key_twice_in_one_call() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        let entity = with_foo(&entity1());

        writer.put([entity1(), entity2(), entity.clone()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![Mutation::Upsert(entity), Mutation::Upsert(entity2())]
        );
    }

    #[test]
    fn test_put_when_not_active() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.deactivate();

        assert_eq!(writer.put([entity1()]), Err(MutationError::SessionInactive));
    }
}

// ========== delete ==========

mod delete {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delete() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.delete([key1(), key2()]).unwrap();
        writer.delete([key3()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Delete(key1()),
                Mutation::Delete(key2()),
                Mutation::Delete(key3()),
            ]
        );
    }

    #[test]
    fn test_delete_after_add_keeps_slot() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.add([entity1()]).unwrap();
        writer.add_with_deferred_allocation([incomplete_entity_1()]).unwrap();
        writer.delete([key1()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::Delete(key1()),
                Mutation::InsertAutoId(incomplete_entity_1()),
            ]
        );
    }

    #[test]
    fn test_delete_after_add_grouped_layout() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator).with_layout(MutationLayout::GroupedByKind);

        writer.add([entity1()]).unwrap();
        writer.add_with_deferred_allocation([incomplete_entity_1()]).unwrap();
        writer.delete([key1()]).unwrap();

        assert_eq!(
            writer.to_mutations(),
            vec![
                Mutation::InsertAutoId(incomplete_entity_1()),
                Mutation::Delete(key1()),
            ]
        );
    }

    #[test]
    fn test_delete_after_update() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.update([entity1()]).unwrap();
        writer.delete([key1()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Delete(key1())]);
    }

    #[test]
    fn test_delete_after_put() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.put([entity1()]).unwrap();
        writer.delete([key1()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Delete(key1())]);
    }

    #[test]
    fn test_delete_twice() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.delete([key1()]).unwrap();
        writer.delete([key1()]).unwrap();

        assert_eq!(writer.to_mutations(), vec![Mutation::Delete(key1())]);
    }

    #[test]
    fn test_delete_when_not_active() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.deactivate();

        assert_eq!(writer.delete([key1()]), Err(MutationError::SessionInactive));
    }
}

// ========== Reads ==========

mod reads {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_to_mutations_is_repeatable() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.put([entity1()]).unwrap();
        writer.delete([key2()]).unwrap();

        assert_eq!(writer.to_mutations(), writer.to_mutations());
    }

    #[test]
    fn test_mutations_readable_after_deactivate() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);
        writer.update([entity2()]).unwrap();

        writer.deactivate();
        writer.deactivate();

        assert!(!writer.is_active());
        assert_eq!(writer.to_mutations(), vec![Mutation::Update(entity2())]);
    }

    #[test]
    fn test_pending_reports_the_merged_kind() {
        let allocator = ScriptedAllocator::standard();
        let mut writer = writer(&allocator);

        writer.add([entity1()]).unwrap();
        writer.update([entity1()]).unwrap();

        assert_eq!(writer.pending(&key1()).map(|op| op.kind()), Some(OpKind::Upsert));
        assert!(writer.pending(&key2()).is_none());
    }
}

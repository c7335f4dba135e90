use esnet_server::HostError;
use esnet_shared::{
    ClientRequest, ComponentFilter, ComponentValue, EntityId, HostMessage,
};
use esnet_test::{TestHost, HEALTH, NAME, POSITION};

const E1: EntityId = EntityId::new(1);
const E2: EntityId = EntityId::new(2);

fn populated_host() -> TestHost {
    let test = TestHost::new();
    test.store.set_component(E1, POSITION, 1i64);
    test.store.set_component(E1, NAME, "rock");
    test.store.set_component(E2, POSITION, 2i64);
    test.store.set_component(E2, HEALTH, 50i64);
    test.tick();
    test
}

fn single_reply(test: &TestHost) -> HostMessage {
    let mut messages = test.connection.take();
    assert_eq!(messages.len(), 1, "expected one reply, got {:?}", messages);
    messages.remove(0)
}

#[test]
fn get_components_reports_missing_kinds_as_none() {
    let test = populated_host();

    test.host
        .handle_request(ClientRequest::GetComponents {
            request_id: 11,
            entity: E1,
            kinds: vec![POSITION, HEALTH],
        })
        .unwrap();

    match single_reply(&test) {
        HostMessage::ResultComponents { request_id, entity } => {
            assert_eq!(request_id, 11);
            assert_eq!(
                entity.components,
                vec![(POSITION, Some(ComponentValue::Int(1))), (HEALTH, None)]
            );
            assert!(!entity.is_complete());
        }
        other => panic!("unexpected reply {:?}", other),
    }
}

#[test]
fn find_entities_applies_kinds_and_filter() {
    let test = populated_host();

    test.host.find_entities(1, None, &[POSITION]);
    assert_eq!(
        single_reply(&test),
        HostMessage::EntityIds {
            request_id: 1,
            entities: vec![E1, E2],
        }
    );

    let filter = ComponentFilter::not(ComponentFilter::has(HEALTH));
    test.host.find_entities(2, Some(&filter), &[POSITION]);
    assert_eq!(
        single_reply(&test),
        HostMessage::EntityIds {
            request_id: 2,
            entities: vec![E1],
        }
    );
}

#[test]
fn find_entity_replies_with_at_most_one_id() {
    let test = populated_host();

    test.host
        .handle_request(ClientRequest::FindEntity {
            request_id: 4,
            filter: None,
            kinds: vec![POSITION],
        })
        .unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::EntityIds {
            request_id: 4,
            entities: vec![E1],
        }
    );

    test.host
        .handle_request(ClientRequest::FindEntity {
            request_id: 5,
            filter: Some(ComponentFilter::equals(HEALTH, 99i64)),
            kinds: vec![],
        })
        .unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::EntityIds {
            request_id: 5,
            entities: vec![],
        }
    );
}

#[test]
fn string_lookup_works_in_both_directions() {
    let test = populated_host();
    let id = test.store.intern("player");

    test.host.get_string_info(1, Some(id), None).unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::StringId {
            request_id: 1,
            id: Some(id),
            string: Some("player".to_string()),
        }
    );

    test.host
        .get_string_info(2, None, Some("player".to_string()))
        .unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::StringId {
            request_id: 2,
            id: Some(id),
            string: Some("player".to_string()),
        }
    );
}

#[test]
fn unknown_string_is_not_interned() {
    let test = populated_host();

    test.host
        .get_string_info(3, None, Some("ghost".to_string()))
        .unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::StringId {
            request_id: 3,
            id: None,
            string: Some("ghost".to_string()),
        }
    );

    test.host.get_string_info(4, Some(77), None).unwrap();
    assert_eq!(
        single_reply(&test),
        HostMessage::StringId {
            request_id: 4,
            id: Some(77),
            string: None,
        }
    );
}

#[test]
fn malformed_string_request_is_rejected() {
    let test = populated_host();

    let neither = test.host.handle_request(ClientRequest::StringId {
        request_id: 1,
        id: None,
        string: None,
    });
    assert!(matches!(
        neither,
        Err(HostError::MalformedRequest {
            request: "StringId",
            ..
        })
    ));

    let both = test.host.handle_request(ClientRequest::StringId {
        request_id: 2,
        id: Some(0),
        string: Some("player".to_string()),
    });
    assert!(matches!(both, Err(HostError::MalformedRequest { .. })));
    assert!(test.connection.is_empty());
}

#[test]
fn duplicate_set_id_is_rejected_without_sending() {
    let test = populated_host();
    test.host.get_entity_set(1, None, vec![POSITION]).unwrap();
    test.connection.take();

    let result = test.host.handle_request(ClientRequest::GetEntitySet {
        set_id: 1,
        filter: None,
        kinds: vec![HEALTH],
    });

    assert_eq!(result, Err(HostError::DuplicateSetId { set_id: 1 }));
    assert!(test.connection.is_empty());
    assert_eq!(test.host.registry().set_count(), 1);
}

#[test]
fn releases_of_unknown_ids_are_tolerated() {
    let test = populated_host();

    assert!(test
        .host
        .handle_request(ClientRequest::ReleaseEntitySet { set_id: 42 })
        .is_ok());
    assert!(test
        .host
        .handle_request(ClientRequest::ReleaseWatchedEntity { watch_id: 42 })
        .is_ok());
    assert!(test.connection.is_empty());
}

#[test]
fn release_is_idempotent() {
    let test = populated_host();
    test.host.get_entity_set(1, None, vec![POSITION]).unwrap();

    assert!(test.host.registry().contains_set(&1));
    test.host.release_entity_set(1);
    test.host.release_entity_set(1);

    assert_eq!(test.host.registry().set_count(), 0);
}

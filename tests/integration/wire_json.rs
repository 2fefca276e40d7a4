// tests/integration/wire_json.rs

use menusync::contract::{
    ExtraFormat, SessionOutcome, SyncReply, SyncRequest, SyncResult, TaskFlags,
};
use menusync::engine::SyncEvent;
use menusync::errors::SyncError;

fn request() -> SyncRequest {
    SyncRequest {
        plugin: "demo".to_string(),
        portal_id: 1,
        credential_id: 10,
        tasks: TaskFlags::MENU_SYNC | TaskFlags::CREDIT_SYNC,
    }
}

#[test]
fn test_reply_carries_one_entry_per_task() {
    let mut outcome = SessionOutcome::new();
    outcome.record(TaskFlags::MENU_SYNC, SyncResult::Ok);
    outcome.record(TaskFlags::CREDIT_SYNC, SyncResult::WrongCredentials);
    outcome.note_error("wrong credentials: nope");

    let reply = SyncReply::from_outcome(&request(), &outcome);
    let json = reply.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["worst_result"], 400);
    assert_eq!(value["results"][0]["task"], 1);
    assert_eq!(value["results"][0]["result"], 200);
    assert_eq!(value["results"][1]["task"], 64);
    assert_eq!(value["error_message"], "wrong credentials: nope");

    let decoded = SyncReply::from_json(&json).unwrap();
    assert_eq!(decoded.worst().unwrap(), SyncResult::WrongCredentials);
    assert_eq!(
        decoded.task_results().unwrap(),
        vec![
            (TaskFlags::MENU_SYNC, SyncResult::Ok),
            (TaskFlags::CREDIT_SYNC, SyncResult::WrongCredentials),
        ]
    );
}

#[test]
fn test_not_supported_reply() {
    let reply = SyncReply::not_supported(&request(), "plugin 'demo' is not installed");

    assert_eq!(reply.results.len(), 2);
    assert_eq!(reply.worst().unwrap(), SyncResult::NotSupported);
    assert_eq!(reply.error_message.as_deref(), Some("plugin 'demo' is not installed"));
}

#[test]
fn test_unknown_codes_survive_decoding_until_checked() {
    let json = r#"{"portal_id":1,"credential_id":10,"results":[{"task":1,"result":250}],"worst_result":250,"error_message":null}"#;

    let reply = SyncReply::from_json(json).unwrap();

    match reply.worst() {
        Err(SyncError::UnknownResultCode(code)) => assert_eq!(code, 250),
        other => panic!("Expected UnknownResultCode, got: {:?}", other),
    }
}

#[test]
fn test_request_rejects_out_of_range_tasks() {
    let json = r#"{"plugin":"demo","portal_id":1,"credential_id":10,"tasks":128}"#;
    assert!(serde_json::from_str::<SyncRequest>(json).is_err());

    let json = r#"{"plugin":"demo","portal_id":1,"credential_id":10,"tasks":65}"#;
    let request: SyncRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.tasks, TaskFlags::MENU_SYNC | TaskFlags::CREDIT_SYNC);
}

#[test]
fn test_extra_formats_json_and_validation() {
    let json = r#"[
        {"code": "canteen", "name": "Canteen number", "pattern": "[0-9]{4}"},
        {"code": "site", "name": "Site", "valuesList": ["north", "south"], "description": "Pick one"}
    ]"#;

    let formats = ExtraFormat::list_from_json(json).unwrap();

    assert_eq!(formats.len(), 2);
    assert!(formats[0].validate("0042").unwrap());
    assert!(!formats[0].validate("42").unwrap());
    assert!(!formats[0].validate("00420").unwrap());

    assert_eq!(formats[1].pattern, ".*");
    assert!(formats[1].validate("north").unwrap());
    assert!(!formats[1].validate("east").unwrap());

    let back = ExtraFormat::list_to_json(&formats).unwrap();
    assert!(back.contains("\"valuesList\""));
    assert_eq!(ExtraFormat::list_from_json(&back).unwrap(), formats);
}

#[test]
fn test_events_are_tagged() {
    let event = SyncEvent::CreditChanged {
        credential_id: 10,
        previous: 500,
        current: 450,
    };

    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(value["type"], "CreditChanged");
    assert_eq!(value["payload"]["current"], 450);

    let finished = serde_json::to_value(SyncEvent::Finished {
        worst: SyncResult::PluginTimeout,
    })
    .unwrap();
    assert_eq!(finished["payload"]["worst"], 600);
}

#[test]
fn test_fatal_reply_is_flagged_on_the_wire() {
    let reply = SyncReply::fatal(&request(), "cycle detected");
    let value = serde_json::to_value(&reply).unwrap();

    assert_eq!(value["fatal_error"], "cycle detected");
    assert!(value["results"].as_array().unwrap().is_empty());

    let plain = serde_json::to_value(SyncReply::not_supported(&request(), "missing")).unwrap();
    assert!(plain.get("fatal_error").is_none());
}

#[test]
fn test_session_worst_covers_task_results() {
    let json = r#"{"portal_id":1,"credential_id":10,"results":[{"task":1,"result":400}],"worst_result":200,"error_message":null}"#;

    let reply = SyncReply::from_json(json).unwrap();

    assert_eq!(reply.worst().unwrap(), SyncResult::Ok);
    assert_eq!(reply.session_worst().unwrap(), SyncResult::WrongCredentials);
    assert_eq!(reply.fatal_error, None);
}

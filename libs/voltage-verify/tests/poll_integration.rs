//! End-to-end verification runs over a scripted transport

mod common;

use std::time::Duration;

use common::{plan_file, ScriptedTransport, PLAN_HEADER};
use voltage_verify::report::{EXIT_FAILURES, EXIT_OK};
use voltage_verify::{
    load_plan, AcquisitionPolicy, ByteEndian, DecodedValue, FunctionCode, PollOrchestrator,
    PollSettings, RegisterRequest, RequestFilter, ResultRecord, Status, Target, VerifyError,
    WordOrder,
};

fn settings(retries: u32) -> PollSettings {
    PollSettings::new(Target::new("127.0.0.1", 502))
        .with_policy(AcquisitionPolicy::new(retries, Duration::ZERO))
}

async fn run_collecting(
    orchestrator: &PollOrchestrator,
    plan: &[RegisterRequest],
    transport: ScriptedTransport,
) -> (voltage_verify::RunSummary, Vec<ResultRecord>) {
    let mut seen = Vec::new();
    let mut observer = |record: &ResultRecord| seen.push(record.clone());
    let summary = orchestrator.run_session(plan, transport, &mut observer).await;
    (summary, seen)
}

#[tokio::test]
async fn test_single_clean_read() {
    let plan = vec![RegisterRequest::new("model_id", 1, 3, 40069, 1, "uint16")];
    let transport = ScriptedTransport::new().respond(1, 40069, &[103]);
    let log = transport.log();

    let orchestrator = PollOrchestrator::new(settings(1));
    let (summary, seen) = run_collecting(&orchestrator, &plan, transport).await;

    assert_eq!((summary.summary.ok, summary.summary.warn, summary.summary.fail), (1, 0, 0));
    assert_eq!(summary.exit_code(), EXIT_OK);
    assert_eq!(summary.results[0].display, "103");
    assert_eq!(summary.results[0].value, Some(DecodedValue::UInt16(103)));
    assert_eq!(seen, summary.results);
    assert_eq!(log.count(), 1);
    assert_eq!(log.calls()[0].function, FunctionCode::ReadHolding);
    assert!(log.is_closed());
}

#[tokio::test]
async fn test_always_failing_transport_exhausts_retries() {
    let plan = vec![RegisterRequest::new("grid_freq", 1, 4, 30775, 1, "uint16")];
    let transport = ScriptedTransport::new().fail(1, 30775, VerifyError::timeout("no reply"));
    let log = transport.log();

    let orchestrator = PollOrchestrator::new(settings(2));
    let (summary, _) = run_collecting(&orchestrator, &plan, transport).await;

    let record = &summary.results[0];
    assert_eq!(record.status, Status::Fail);
    assert_eq!(record.value, None);
    assert_eq!(record.display, "");
    assert_eq!(record.error, "Timeout: no reply");
    assert_eq!(summary.exit_code(), EXIT_FAILURES);

    // retries + 1 attempts, all on FC 04
    assert_eq!(log.count(), 3);
    assert!(log
        .calls()
        .iter()
        .all(|c| c.function == FunctionCode::ReadInput));
    assert!(log.is_closed());
}

#[tokio::test]
async fn test_short_read_is_warning_with_raw_value() {
    let plan = vec![RegisterRequest::new("total_energy", 1, 3, 40093, 2, "uint32")];
    let transport = ScriptedTransport::new().respond(1, 40093, &[0x1234]);

    let orchestrator = PollOrchestrator::new(settings(3));
    let (summary, _) = run_collecting(&orchestrator, &plan, transport).await;

    let record = &summary.results[0];
    assert_eq!(record.status, Status::Warn);
    assert_eq!(record.value, Some(DecodedValue::Raw(vec![0x1234])));
    assert_eq!(record.display, "[4660]");
    assert_eq!(record.error, "Short read: expected 2, got 1");
    // WARN alone does not fail the run
    assert_eq!(summary.exit_code(), EXIT_OK);
}

#[tokio::test]
async fn test_transient_error_recovers() {
    let plan = vec![RegisterRequest::new("status", 1, 3, 100, 1, "int")];
    let transport = ScriptedTransport::new()
        .fail(1, 100, VerifyError::transport("connection reset"))
        .respond(1, 100, &[0x8000]);
    let log = transport.log();

    let orchestrator = PollOrchestrator::new(settings(1));
    let (summary, _) = run_collecting(&orchestrator, &plan, transport).await;

    assert_eq!(summary.results[0].status, Status::Ok);
    assert_eq!(summary.results[0].value, Some(DecodedValue::Int16(-32768)));
    assert_eq!(log.count(), 2);
}

#[tokio::test]
async fn test_unsupported_function_never_reaches_transport() {
    let plan = vec![
        RegisterRequest::new("coil", 1, 1, 10, 1, "int16"),
        RegisterRequest::new("voltage", 1, 3, 20, 1, "uint16"),
    ];
    let transport = ScriptedTransport::new().respond(1, 20, &[2301]);
    let log = transport.log();

    let orchestrator = PollOrchestrator::new(settings(5));
    let (summary, _) = run_collecting(&orchestrator, &plan, transport).await;

    assert_eq!(summary.results[0].status, Status::Fail);
    assert_eq!(summary.results[0].error, "Unsupported function code fc=1");
    assert_eq!(summary.results[1].status, Status::Ok);
    assert_eq!(log.addresses(), vec![(1, 20)]);
}

#[tokio::test]
async fn test_word_order_and_endian_applied() {
    let plan = vec![RegisterRequest::new("energy", 1, 3, 500, 2, "custom_acc32")];
    let transport = ScriptedTransport::new().respond(1, 500, &[0x0100, 0x0200]);

    let settings = settings(0).with_ordering(ByteEndian::Little, WordOrder::Little);
    let orchestrator = PollOrchestrator::new(settings);
    let (summary, _) = run_collecting(&orchestrator, &plan, transport).await;

    assert_eq!(summary.results[0].value, Some(DecodedValue::UInt32(0x0002_0001)));
    assert_eq!(summary.endian, ByteEndian::Little);
    assert_eq!(summary.word_order, WordOrder::Little);
}

#[tokio::test]
async fn test_filter_excludes_from_counts() {
    let plan = vec![
        RegisterRequest::new("inv_power", 1, 3, 100, 1, "int16").with_group("inverter"),
        RegisterRequest::new("meter_power", 200, 3, 100, 1, "int16").with_group("Smart_Meter"),
        RegisterRequest::new("meter_freq", 200, 3, 200, 1, "uint16").with_group("inverter"),
    ];
    let transport = ScriptedTransport::new()
        .respond(1, 100, &[1])
        .respond(200, 100, &[2])
        .respond(200, 200, &[3]);
    let log = transport.log();

    let settings = settings(1).with_filter(RequestFilter::new(200, "meter"));
    let orchestrator = PollOrchestrator::new(settings);
    let (summary, seen) = run_collecting(&orchestrator, &plan, transport).await;

    assert_eq!(summary.summary.total(), 1);
    assert_eq!(summary.results[0].name, "meter_power");
    assert_eq!(seen.len(), 1);
    assert_eq!(log.addresses(), vec![(200, 100)]);
}

#[tokio::test]
async fn test_plan_file_end_to_end() {
    let csv = format!(
        "{}\n\
         meter,meter_freq,2,3,50,1,uint16,Grid frequency,4990..5010\n\
         inverter,inv_status,1,3,100,1,int16,,\n\
         inverter,inv_energy,1,4,10,2,uint32,Lifetime energy,\n\
         inverter,inv_flags,1,3,200,2,uint32,,\n\
         inverter,inv_broken,1,3,300,1,uint16,,\n",
        PLAN_HEADER
    );
    let file = plan_file(&csv);
    let plan = load_plan(file.path()).unwrap();

    let names: Vec<_> = plan.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["inv_energy", "inv_status", "inv_flags", "inv_broken", "meter_freq"]
    );

    let transport = ScriptedTransport::new()
        .respond(1, 10, &[0x0001, 0x0002])
        .respond(1, 100, &[0xFFFF])
        .respond(1, 200, &[7])
        .fail(1, 300, VerifyError::transport("illegal data address"))
        .respond(2, 50, &[5000]);
    let log = transport.log();

    let orchestrator = PollOrchestrator::new(settings(1));
    let (summary, seen) = run_collecting(&orchestrator, &plan, transport).await;

    let statuses: Vec<_> = summary.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![Status::Ok, Status::Ok, Status::Warn, Status::Fail, Status::Ok]
    );
    assert_eq!(summary.results[0].display, "65538");
    assert_eq!(summary.results[1].display, "-1");
    assert_eq!(summary.results[2].display, "[7]");
    assert_eq!(summary.results[4].expected, "4990..5010");
    assert_eq!(
        (summary.summary.ok, summary.summary.warn, summary.summary.fail),
        (3, 1, 1)
    );
    assert_eq!(seen.len(), 5);

    // Requests reach the wire in sorted order; the failing one twice
    assert_eq!(
        log.addresses(),
        vec![(1, 10), (1, 100), (1, 200), (1, 300), (1, 300), (2, 50)]
    );
    assert_eq!(log.calls()[0].function, FunctionCode::ReadInput);
    assert_eq!(log.calls()[0].quantity, 2);

    // JSON report
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.json");
    summary.write_json(&out).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(doc["target"]["host"], "127.0.0.1");
    assert_eq!(doc["target"]["port"], 502);
    assert_eq!(doc["endian"], "big");
    assert_eq!(doc["wordorder"], "big");
    assert_eq!(doc["summary"]["fail"], 1);

    let results = doc["results"].as_array().unwrap();
    assert_eq!(results.len(), 5);
    assert_eq!(results[0]["value"], 65538);
    assert_eq!(results[0]["qty"], 2);
    assert_eq!(results[0]["type"], "uint32");
    assert_eq!(results[2]["value"], serde_json::json!([7]));
    assert_eq!(results[2]["status"], "WARN");
    assert_eq!(results[3]["value"], serde_json::Value::Null);
    assert_eq!(results[3]["error"], "Transport error: illegal data address");
    assert_eq!(results[4]["value_pretty"], "5000");
    assert_eq!(results[1]["error"], "");
}

#[tokio::test]
async fn test_out_of_range_row_fails_under_declared_slave() {
    let csv = format!(
        "{}\n\
         meter,meter_power,300,3,70000,1,int16,,\n\
         inverter,inv_status,1,3,70000,1,int16,,\n",
        PLAN_HEADER
    );
    let file = plan_file(&csv);
    let plan = load_plan(file.path()).unwrap();

    // Slave 300 never masquerades as slave 1
    let transport = ScriptedTransport::new().respond(1, 0, &[42]);
    let log = transport.log();
    let filtered = settings(1).with_filter(RequestFilter::new(1, ""));
    let (summary, _) = run_collecting(&PollOrchestrator::new(filtered), &plan, transport).await;

    assert_eq!(summary.summary.total(), 1);
    assert_eq!(summary.results[0].name, "inv_status");
    assert_eq!(summary.results[0].status, Status::Fail);
    assert_eq!(summary.results[0].error, "address 70000 out of range (max 65535)");
    assert_eq!(log.count(), 0);

    // Unfiltered, the row is reported as declared
    let transport = ScriptedTransport::new();
    let (summary, _) = run_collecting(&PollOrchestrator::new(settings(1)), &plan, transport).await;

    let record = summary.results.iter().find(|r| r.name == "meter_power").unwrap();
    assert_eq!(record.slave, 300);
    assert_eq!(record.address, 70000);
    assert_eq!(record.status, Status::Fail);
    assert_eq!(record.error, "slave 300 out of range (max 255)");
    assert_eq!(summary.exit_code(), EXIT_FAILURES);
}

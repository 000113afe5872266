//! End-to-end tests: JSONL export into the store, findings out of the aggregator.

use std::io::Cursor;

use ntsb_explorer::{
    aggregate, aggregate_with_limits, AggregateLimits, FindingsFilter, FindingsSummary, Storage,
};

const PERSONNEL: &str = "Personnel issues-Task performance-Aircraft control - C";
const ENGINE: &str = "Aircraft-Powerplant-Engine failure - F";

fn export_line(event_id: &str, findings: &str) -> String {
    serde_json::json!({
        "event_id": event_id,
        "ntsb_number": format!("NTSB-{event_id}"),
        "event_date": "03/14/2015",
        "contributing_factors": { "findings": findings }
    })
    .to_string()
}

fn import_store(lines: &[String]) -> Storage {
    let mut storage = Storage::open_in_memory().expect("in-memory store");
    let data = lines.join("\n");
    let report = storage
        .import_jsonl(Cursor::new(data))
        .expect("import succeeds");
    assert_eq!(report.errors, 0);
    storage
}

#[test]
fn personnel_and_aircraft_scenario() {
    let summary = aggregate([PERSONNEL, PERSONNEL, ENGINE]);

    assert_eq!(summary.total_findings, 3);
    assert_eq!(summary.total_causes, 2);
    assert_eq!(summary.total_factors, 1);

    assert_eq!(summary.categories.len(), 2);
    let personnel = &summary.categories[0];
    assert_eq!(personnel.category, "Personnel issues");
    assert_eq!((personnel.total, personnel.causes, personnel.factors), (2, 2, 0));
    assert_eq!(personnel.subcategories.len(), 1);
    assert_eq!(personnel.subcategories[0].name, "Task performance");
    assert_eq!(personnel.subcategories[0].count, 2);

    let aircraft = &summary.categories[1];
    assert_eq!(aircraft.category, "Aircraft");
    assert_eq!((aircraft.total, aircraft.causes, aircraft.factors), (1, 0, 1));
    assert_eq!(aircraft.subcategories[0].name, "Powerplant");

    assert_eq!(summary.findings.len(), 2);
    assert_eq!(
        summary.findings[0].full_path,
        "Personnel issues-Task performance-Aircraft control"
    );
    assert!(summary.findings[0].is_cause);
    assert_eq!(summary.findings[0].count, 2);
    assert_eq!(summary.findings[1].full_path, "Aircraft-Powerplant-Engine failure");
    assert!(!summary.findings[1].is_cause);
    assert_eq!(summary.findings[1].count, 1);
}

#[test]
fn scenario_serializes_camel_case() {
    let summary = aggregate([PERSONNEL, PERSONNEL, ENGINE]);
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["totalFindings"], 3);
    assert_eq!(json["totalCauses"], 2);
    assert_eq!(json["totalFactors"], 1);
    assert_eq!(json["categories"][0]["subcategories"][0]["name"], "Task performance");
    assert_eq!(json["findings"][0]["fullPath"], "Personnel issues-Task performance-Aircraft control");
    assert_eq!(json["findings"][0]["isCause"], true);
}

#[test]
fn empty_input_gives_zero_summary() {
    let summary = aggregate(Vec::<String>::new());
    assert_eq!(summary, FindingsSummary::default());

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["totalFindings"], 0);
    assert_eq!(json["categories"], serde_json::json!([]));
    assert_eq!(json["findings"], serde_json::json!([]));

    assert_eq!(aggregate(["", "   ", " | "]), FindingsSummary::default());
}

#[test]
fn repeated_runs_are_identical() {
    let texts = [
        "A-B-C - C | D-E - F",
        "D-E - F | A-X",
        "A-B-C - F | Q",
        "D-Y-Z - C",
    ];
    assert_eq!(aggregate(texts), aggregate(texts));
}

#[test]
fn sum_laws_hold() {
    let texts = [
        "A-B-C - C | A-B - F | A-D",
        "E-F - C | E - F | A-B-C - C",
        "G | G-H - C",
    ];
    let summary = aggregate(texts);

    assert!(summary.total_causes + summary.total_factors <= summary.total_findings);
    for category in &summary.categories {
        assert!(category.causes + category.factors <= category.total);
    }
    let category_total: u64 = summary.categories.iter().map(|c| c.total).sum();
    assert_eq!(category_total, summary.total_findings);
    let finding_total: u64 = summary.findings.iter().map(|f| f.count).sum();
    assert_eq!(finding_total, summary.total_findings);
}

#[test]
fn truncation_follows_limits() {
    let texts: Vec<String> = (0..30)
        .map(|i| format!("Cat-Sub{i}-Detail{i} - C"))
        .collect();

    let summary = aggregate(&texts);
    assert_eq!(summary.categories[0].subcategories.len(), 10);
    assert_eq!(summary.findings.len(), 30);

    let limits = AggregateLimits {
        max_subcategories: 3,
        max_findings: 7,
    };
    let summary = aggregate_with_limits(&texts, limits);
    assert_eq!(summary.categories[0].subcategories.len(), 3);
    assert_eq!(summary.findings.len(), 7);
    assert_eq!(summary.total_findings, 30);
}

#[test]
fn import_then_aggregate() {
    let storage = import_store(&[
        export_line("E1", &format!("{PERSONNEL} | {ENGINE}")),
        export_line("E2", PERSONNEL),
        export_line("E3", ""),
        // Same event again, must not be counted twice.
        export_line("E2", PERSONNEL),
    ]);

    let texts = storage.findings_texts().unwrap();
    assert_eq!(texts.len(), 2);

    let summary = aggregate(&texts);
    assert_eq!(summary, aggregate([PERSONNEL, ENGINE, PERSONNEL]));
    assert_eq!(summary.findings[0].count, 2);
}

#[test]
fn filtered_view_over_imported_findings() {
    let storage = import_store(&[
        export_line("E1", &format!("{PERSONNEL} | {ENGINE}")),
        export_line("E2", "Environmental issues-Conditions/weather/phenomena-Wind - F"),
    ]);
    let summary = aggregate(&storage.findings_texts().unwrap());

    let filter = FindingsFilter::new(None, Some("ENGINE"), false).unwrap();
    let matched = summary.filtered(&filter);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].category, "Aircraft");

    let filter = FindingsFilter::new(Some("Environmental issues".to_string()), None, false).unwrap();
    assert_eq!(summary.filtered(&filter).len(), 1);

    assert!(FindingsFilter::new(None, Some("(unclosed"), true).is_err());
}

#[test]
fn missing_database_is_source_unavailable() {
    let path = std::env::temp_dir().join(format!(
        "ntsb_explorer_pipeline_missing_{}.db",
        std::process::id()
    ));
    let err = Storage::open_read_only(&path).unwrap_err();
    assert!(err.is_source_unavailable());
}

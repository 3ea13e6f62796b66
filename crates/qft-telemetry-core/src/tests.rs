//! Integration and property tests for the listener and registry.
//!
//! These tests verify:
//! - Cumulative problem propagation across nested tracked scopes
//! - Counter reset on emission and per-iteration accounting epochs
//! - Path determinism for qualified names
//! - The full entered -> problem -> exited scenario end to end

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use crate::collector::RecordingCollector;
use crate::config::TelemetryConfig;
use crate::listener::{EnteredEvent, ExitedEvent, ProblemEvent, RunListener, TreeNode};
use crate::metric::RecordStatus;
use crate::node::TrackedNode;
use crate::registry::{NameSource, NodeRegistry};
use crate::signal::{ProblemState, Severity};

// ============================================================================
// Test Helpers
// ============================================================================

/// Host tree node stand-in with an optional parent link.
struct StubNode<'a> {
    id: String,
    node_type: &'static str,
    name: String,
    tree_name: String,
    qualified: Option<String>,
    parent: Option<&'a StubNode<'a>>,
}

impl<'a> StubNode<'a> {
    fn new(id: &str, node_type: &'static str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            node_type,
            name: name.to_string(),
            tree_name: name.to_string(),
            qualified: None,
            parent: None,
        }
    }

    fn qualified(mut self, qualified: &str) -> Self {
        self.qualified = Some(qualified.to_string());
        self
    }

    fn tree_name(mut self, tree_name: &str) -> Self {
        self.tree_name = tree_name.to_string();
        self
    }

    fn child_of(mut self, parent: &'a StubNode<'a>) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl TreeNode for StubNode<'_> {
    fn id(&self) -> &str {
        &self.id
    }

    fn node_type(&self) -> &str {
        self.node_type
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tree_name(&self) -> &str {
        &self.tree_name
    }

    fn qualified_name(&self) -> Option<String> {
        self.qualified.clone()
    }

    fn parent(&self) -> Option<&dyn TreeNode> {
        self.parent.map(|p| p as &dyn TreeNode)
    }
}

fn listener() -> RunListener<RecordingCollector> {
    RunListener::new(&TelemetryConfig::default(), RecordingCollector::new())
        .expect("default config compiles")
}

fn timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 29, 10, 0, 0).unwrap()
}

fn exit_event<'a>(
    node: &'a StubNode<'a>,
    realtime_s: f64,
    duration_s: f64,
) -> ExitedEvent<'a> {
    ExitedEvent {
        node,
        timestamp: timestamp(),
        status: RecordStatus::pass(),
        local_state: 0,
        realtime_s,
        duration_s,
    }
}

fn problem_event<'a>(
    node: &'a StubNode<'a>,
    state: ProblemState,
    current_test_case: Option<&'a StubNode<'a>>,
) -> ProblemEvent<'a> {
    ProblemEvent {
        node,
        state_code: state.state_code(),
        message: "component not found".to_string(),
        timestamp: timestamp(),
        current_test_case: current_test_case.map(|n| n as &dyn TreeNode),
    }
}

// ============================================================================
// Aggregation Across Nesting
// ============================================================================

#[test]
fn problem_increments_every_tracked_ancestor() {
    let mut listener = listener();

    let grandparent = StubNode::new("ts-1", "TestSet", "Regression").qualified("Regression");
    let parent = StubNode::new("tc-1", "TestCase", "Login")
        .qualified("Regression.Login")
        .child_of(&grandparent);
    let child = StubNode::new("pc-1", "ProcedureCall", "open").child_of(&parent);

    listener.node_entered(&EnteredEvent { node: &grandparent });
    listener.node_entered(&EnteredEvent { node: &parent });
    listener.node_entered(&EnteredEvent { node: &child });

    listener.problem_occurred(&problem_event(&child, ProblemState::Error, Some(&parent)));

    for id in ["ts-1", "tc-1", "pc-1"] {
        assert_eq!(
            listener.registry().get(id).unwrap().counters().errors,
            1,
            "{id} should have one error"
        );
    }

    // A second problem adds one more to each, independently.
    listener.problem_occurred(&problem_event(&child, ProblemState::Error, Some(&parent)));
    for id in ["ts-1", "tc-1", "pc-1"] {
        assert_eq!(listener.registry().get(id).unwrap().counters().errors, 2);
    }
}

#[test]
fn walk_skips_untracked_ancestors_without_stopping() {
    let mut listener = listener();

    let root = StubNode::new("ts-1", "TestSet", "Suite").qualified("Suite");
    // Untracked structural node between the tracked root and the child.
    let comment = StubNode::new("cm-1", "Comment", "note").child_of(&root);
    let child = StubNode::new("sq-1", "BasicSequence", "setup").child_of(&comment);

    listener.node_entered(&EnteredEvent { node: &root });
    listener.node_entered(&EnteredEvent { node: &comment });
    listener.node_entered(&EnteredEvent { node: &child });
    assert!(!listener.registry().contains("cm-1"));

    listener.problem_occurred(&problem_event(&child, ProblemState::Exception, None));
    assert_eq!(listener.registry().get("ts-1").unwrap().counters().exceptions, 1);
    assert_eq!(listener.registry().get("sq-1").unwrap().counters().exceptions, 1);
}

#[test]
fn informational_states_do_not_aggregate() {
    let mut listener = listener();
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    listener.node_entered(&EnteredEvent { node: &case });

    for state in [ProblemState::Ok, ProblemState::Skipped, ProblemState::NotImplemented] {
        listener.problem_occurred(&problem_event(&case, state, None));
    }
    assert!(listener.registry().get("tc-1").unwrap().counters().is_zero());
    assert!(listener.collector().records.is_empty());
}

// ============================================================================
// Incident Records
// ============================================================================

#[test]
fn unknown_state_code_is_a_no_op() {
    let mut listener = listener();
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    listener.node_entered(&EnteredEvent { node: &case });

    listener.problem_occurred(&ProblemEvent {
        node: &case,
        state_code: 99,
        message: "garbled".to_string(),
        timestamp: timestamp(),
        current_test_case: None,
    });

    assert!(listener.registry().get("tc-1").unwrap().counters().is_zero());
    assert!(listener.collector().records.is_empty());
}

#[test]
fn error_sends_immediate_incident_record() {
    let mut listener = listener();
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    let step = StubNode::new("st-1", "TestStep", "press button")
        .tree_name("Suite/Login/press button")
        .child_of(&case);
    listener.node_entered(&EnteredEvent { node: &case });
    listener.node_entered(&EnteredEvent { node: &step });

    listener.problem_occurred(&problem_event(&step, ProblemState::Error, Some(&case)));

    let records = &listener.collector().records;
    assert_eq!(records.len(), 1);
    let incident = &records[0];
    assert_eq!(
        incident.path,
        &["QF-Test", "Incidents", "Error", "Login", "Suite", "Login", "press button"]
    );
    assert_eq!(incident.unit, "error");
    assert_eq!(incident.value, 1.0);
    assert!(!incident.status.is_pass());
    assert_eq!(incident.status.code, "QF-Test.ERROR");
    assert_eq!(incident.status.message, "component not found");
}

#[test]
fn exception_incident_uses_exception_unit() {
    let mut listener = listener();
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    listener.node_entered(&EnteredEvent { node: &case });

    listener.problem_occurred(&problem_event(&case, ProblemState::Exception, Some(&case)));

    let incident = &listener.collector().records[0];
    assert_eq!(incident.unit, "exception");
    assert_eq!(incident.status.code, "QF-Test.EXCEPTION");
}

#[test]
fn warning_aggregates_without_incident_record() {
    let mut listener = listener();
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    listener.node_entered(&EnteredEvent { node: &case });

    listener.problem_occurred(&problem_event(&case, ProblemState::Warning, Some(&case)));

    assert_eq!(listener.registry().get("tc-1").unwrap().counters().warnings, 1);
    assert!(listener.collector().records.is_empty());
}

#[test]
fn collector_failure_is_swallowed_and_counters_stay_reset() {
    let mut listener =
        RunListener::new(&TelemetryConfig::default(), RecordingCollector::failing())
            .expect("default config compiles");
    let case = StubNode::new("tc-1", "TestCase", "Login").qualified("Suite.Login");
    listener.node_entered(&EnteredEvent { node: &case });
    listener.problem_occurred(&problem_event(&case, ProblemState::Error, Some(&case)));

    // Exit delivery fails; the reset must not be rolled back.
    listener.node_exited(&exit_event(&case, 1.0, 1.5));
    assert!(listener.registry().get("tc-1").unwrap().counters().is_zero());
    assert!(listener.collector().records.is_empty());
}

// ============================================================================
// End-to-End Scenario
// ============================================================================

#[test]
fn end_to_end_testset_with_failing_testcase() {
    let mut listener = listener();

    let set = StubNode::new("ts-1", "TestSet", "Regression").qualified("Regression");
    let case = StubNode::new("tc-1", "TestCase", "Login")
        .qualified("Regression.Login")
        .tree_name("Regression/Login")
        .child_of(&set);

    listener.run_started("2026-08-29+10:00");
    assert_eq!(listener.context().instance_id, "2026-08-29+10:00");

    listener.node_entered(&EnteredEvent { node: &set });
    listener.node_entered(&EnteredEvent { node: &case });

    listener.problem_occurred(&problem_event(&case, ProblemState::Error, Some(&case)));
    listener.problem_occurred(&problem_event(&case, ProblemState::Exception, Some(&case)));

    listener.node_exited(&exit_event(&case, 2.0, 2.5));
    listener.node_exited(&exit_event(&set, 9.0, 10.0));

    let records = &listener.collector().records;
    // 2 incidents + 6 test case records + 6 test set records.
    assert_eq!(records.len(), 14);

    let case_records = &records[2..8];
    assert_eq!(case_records[0].path_display(), "QF-Test/Testcase/Regression/Login/Duration");
    assert_eq!(case_records[0].value, 2.5);
    assert_eq!(case_records[1].value, 2.0);
    assert_eq!(case_records[3].path_display(), "QF-Test/Testcase/Regression/Login/Result/Exceptions");
    assert_eq!(case_records[3].value, 1.0);
    assert_eq!(case_records[4].value, 1.0);
    assert_eq!(case_records[5].value, 0.0);

    let set_records = &records[8..14];
    assert_eq!(set_records[0].path_display(), "QF-Test/Testset/Regression/Duration");
    assert_eq!(set_records[0].value, 10.0);
    assert_eq!(set_records[1].value, 9.0);
    // Inherited via ancestor propagation.
    assert_eq!(set_records[3].value, 1.0);
    assert_eq!(set_records[4].value, 1.0);
    assert_eq!(set_records[5].value, 0.0);

    assert!(listener.registry().get("tc-1").unwrap().counters().is_zero());
    assert!(listener.registry().get("ts-1").unwrap().counters().is_zero());
}

#[test]
fn sequence_enters_via_ancestor_chain() {
    let mut listener = listener();

    let set = StubNode::new("ts-1", "TestSet", "Regression")
        .qualified("Regression")
        .tree_name("suite/Regression");
    let case = StubNode::new("tc-1", "TestCase", "Login")
        .qualified("Regression.Login")
        .tree_name("suite/Regression/Login")
        .child_of(&set);
    let sequence = StubNode::new("sq-1", "BasicSequence", "setup")
        .tree_name("suite/Regression/Login/setup")
        .child_of(&case);

    listener.node_entered(&EnteredEvent { node: &sequence });

    let tracked = listener.registry().get("sq-1").unwrap();
    assert_eq!(
        tracked.base_path(),
        &[
            "QF-Test",
            "Testcase",
            "Regression",
            "Login",
            "suite/Regression/Login/setup"
        ]
    );

    listener.node_exited(&exit_event(&sequence, 0.5, 0.5));
    // Sequences report the full six-record set.
    assert_eq!(listener.collector().records.len(), 6);
}

#[test]
fn procedure_exit_emits_three_records() {
    let mut listener = listener();
    let call = StubNode::new("pc-1", "ProcedureCall", "lib.login.open");
    listener.node_entered(&EnteredEvent { node: &call });
    listener.node_exited(&exit_event(&call, 0.2, 0.3));

    let records = &listener.collector().records;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].path_display(), "QF-Test/Procedure/lib/login/open/Duration");
}

#[test]
fn untracked_exit_sends_nothing() {
    let mut listener = listener();
    let node = StubNode::new("cm-1", "Comment", "note");
    listener.node_exited(&exit_event(&node, 1.0, 1.0));
    assert!(listener.collector().records.is_empty());
}

#[test]
fn run_started_ignores_empty_run_id() {
    let mut listener = listener();
    listener.run_started("");
    assert_eq!(listener.context().instance_id, "unknown");
}

#[test]
fn run_id_reaches_the_collector_context() {
    let mut listener = listener();

    // Construction already announced the configured context.
    let announced = listener.collector().context.as_ref().unwrap();
    assert_eq!(announced.instance_id, "unknown");
    assert_eq!(listener.collector().context_changes, 1);

    listener.run_started("2026-08-29+10:00");
    let announced = listener.collector().context.as_ref().unwrap();
    assert_eq!(announced.instance_id, "2026-08-29+10:00");
    assert_eq!(listener.collector().context_changes, 2);

    // Re-announcing the same id leaves the collector untouched.
    listener.run_started("2026-08-29+10:00");
    assert_eq!(listener.collector().context_changes, 2);
}

// ============================================================================
// Property Tests
// ============================================================================

/// Generates dot-qualified names of 1 to 4 segments.
fn arb_qualified_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z][A-Za-z0-9]{0,7}", 1..=4).prop_map(|parts| parts.join("."))
}

fn arb_severity() -> impl Strategy<Value = Severity> {
    prop::sample::select(&[Severity::Error, Severity::Exception, Severity::Warning][..])
}

proptest! {
    /// Equal qualified names always produce equal base paths, and the
    /// path is the prefix plus one segment per name component.
    #[test]
    fn qualified_path_construction_is_deterministic(name in arb_qualified_name()) {
        let a = TrackedNode::test_case(&name);
        let b = TrackedNode::test_case(&name);
        prop_assert_eq!(a.base_path(), b.base_path());
        prop_assert_eq!(a.base_path().len(), 2 + name.split('.').count());
        prop_assert_eq!(&a.base_path()[0], "QF-Test");
        prop_assert_eq!(&a.base_path()[1], "Testcase");
    }

    /// Counter snapshots at emission equal the number of signals of each
    /// severity since the last emission, and reset afterwards.
    #[test]
    fn counters_match_signal_history(
        severities in prop::collection::vec(arb_severity(), 0..32)
    ) {
        let mut registry = NodeRegistry::default();
        registry.track("id-1", "TestCase", NameSource::Qualified("Suite.Login"));

        let mut expected_errors = 0u32;
        let mut expected_exceptions = 0u32;
        let mut expected_warnings = 0u32;
        for severity in &severities {
            registry.signal("id-1", *severity);
            match severity {
                Severity::Error => expected_errors += 1,
                Severity::Exception => expected_exceptions += 1,
                Severity::Warning => expected_warnings += 1,
            }
        }

        let records = registry
            .emit(
                "id-1",
                "TestCase",
                Utc::now(),
                &RecordStatus::pass(),
                1.0,
                1.0,
                0,
            )
            .unwrap();
        prop_assert_eq!(records[3].value, f64::from(expected_exceptions));
        prop_assert_eq!(records[4].value, f64::from(expected_errors));
        prop_assert_eq!(records[5].value, f64::from(expected_warnings));
        prop_assert!(registry.get("id-1").unwrap().counters().is_zero());
    }

    /// Tracking the same identity repeatedly never grows the registry.
    #[test]
    fn repeated_tracking_is_idempotent(
        name in arb_qualified_name(),
        repeats in 1usize..8
    ) {
        let mut registry = NodeRegistry::default();
        for _ in 0..repeats {
            registry.track("id-1", "TestCase", NameSource::Qualified(&name));
        }
        prop_assert_eq!(registry.len(), 1);
    }
}

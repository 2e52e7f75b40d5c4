use std::collections::BTreeMap;
use std::time::Duration;

use buildpulse_core::model::build::{BuildContext, BuildResult};
use buildpulse_core::model::custom::CustomData;
use buildpulse_core::model::point::FieldValue;
use buildpulse_core::model::report::{
    ChangeLog, ChangeSet, CoberturaReport, CoverageCounter, CoverageRatio, JacocoReport,
    PerfPublisherReport, PerfTest, PerformanceFile, PerformanceReport, RobotFrameworkReport,
    RobotSuite, RobotTag, SonarQubeReport, TestSummary,
};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};

pub fn run_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
}

/// `demo` #42, successful, one second long, no reports.
pub fn demo_build() -> BuildContext {
    BuildContext::new("demo", 42, BuildResult::Success, Duration::from_millis(1000))
}

pub fn demo_custom_data() -> CustomData {
    CustomData {
        data: BTreeMap::from([("field_a".to_string(), FieldValue::Integer(11))]),
        data_tags: BTreeMap::from([("tag_1".to_string(), "foo".to_string())]),
        ..CustomData::default()
    }
}

/// A build inside a folder with every optional report attached.
pub fn full_build() -> BuildContext {
    let base = run_timestamp();
    let mut build = BuildContext::new(
        "service",
        7,
        BuildResult::Unstable,
        Duration::from_millis(93_000),
    );
    build.job_path = Some("platform/service".to_string());
    build.started_at = Some(base - ChronoDuration::milliseconds(93_000));
    build.queue_time_ms = Some(1_500);
    build.agent_name = Some("linux-agent-1".to_string());
    build.cause = Some("Started by an SCM change".to_string());
    build.health_score = Some(80);
    build.last_successful_build = Some(5);
    build.last_stable_build = Some(4);
    build.env = BTreeMap::from([
        ("GIT_BRANCH".to_string(), "main".to_string()),
        ("NODE_NAME".to_string(), "linux-agent-1".to_string()),
    ]);
    build.test_summary = Some(TestSummary {
        total: 120,
        failed: 2,
        skipped: 3,
    });

    build.reports.cobertura = Some(CoberturaReport {
        packages: CoverageRatio::new(4.0, 5.0),
        files: CoverageRatio::new(18.0, 20.0),
        classes: CoverageRatio::new(30.0, 40.0),
        methods: CoverageRatio::new(150.0, 200.0),
        lines: CoverageRatio::new(800.0, 1000.0),
        conditionals: CoverageRatio::new(55.5, 100.0),
    });
    build.reports.jacoco = Some(JacocoReport {
        instruction: CoverageCounter::new(900, 100),
        branch: CoverageCounter::new(60, 40),
        complexity: CoverageCounter::new(70, 30),
        line: CoverageCounter::new(450, 50),
        method: CoverageCounter::new(95, 5),
        class: CoverageCounter::new(20, 0),
    });
    build.reports.performance = Some(PerformanceReport {
        files: vec![PerformanceFile {
            name: "checkout.jtl".to_string(),
            samples: 200,
            errors: 4,
            average_ms: 120.5,
            median_ms: 110.0,
            min_ms: 35.0,
            max_ms: 900.0,
            p90_ms: 210.0,
            p95_ms: 260.0,
            p99_ms: 700.0,
            total_traffic_kb: 5120.0,
            timestamp: None,
        }],
    });
    build.reports.robot_framework = Some(RobotFrameworkReport {
        passed: 18,
        failed: 2,
        skipped: 1,
        critical_passed: 10,
        critical_failed: 1,
        duration_ms: 65_000,
        suites: vec![
            RobotSuite {
                name: "Login".to_string(),
                passed: 8,
                failed: 0,
                skipped: 0,
                duration_ms: 20_000,
            },
            RobotSuite {
                name: "Checkout".to_string(),
                passed: 10,
                failed: 2,
                skipped: 1,
                duration_ms: 45_000,
            },
        ],
        tags: vec![RobotTag {
            name: "smoke".to_string(),
            passed: 5,
            failed: 1,
            skipped: 0,
            critical: true,
        }],
    });
    build.reports.sonarqube = Some(SonarQubeReport {
        project_key: "platform:service".to_string(),
        server_url: Some("https://sonar.example.com".to_string()),
        measures: BTreeMap::from([
            ("violations".to_string(), "42".to_string()),
            ("blocker_violations".to_string(), "0".to_string()),
            ("critical_violations".to_string(), "3".to_string()),
            ("major_violations".to_string(), "10".to_string()),
            ("minor_violations".to_string(), "25".to_string()),
            ("info_violations".to_string(), "4".to_string()),
            ("ncloc".to_string(), "15230".to_string()),
            ("coverage".to_string(), "81.4".to_string()),
            ("alert_status".to_string(), "OK".to_string()),
        ]),
    });
    build.reports.change_log = Some(ChangeLog {
        change_sets: vec![
            ChangeSet {
                commit_id: "a1b2c3".to_string(),
                author: "alice".to_string(),
                message: "Fix checkout timeout".to_string(),
                affected_paths: vec!["src/checkout.rs".to_string()],
            },
            ChangeSet {
                commit_id: "d4e5f6".to_string(),
                author: "bob".to_string(),
                message: "Bump client\n\nLonger body".to_string(),
                affected_paths: vec!["Cargo.toml".to_string(), "src/checkout.rs".to_string()],
            },
        ],
    });
    build.reports.perf_publisher = Some(PerfPublisherReport {
        tests: vec![
            PerfTest {
                name: "sort_large".to_string(),
                executed: true,
                successful: true,
                compile_time: Some(1.5),
                execution_time: Some(12.0),
                performance: Some(88.0),
                metrics: BTreeMap::from([("memory_mb".to_string(), 64.0)]),
            },
            PerfTest {
                name: "sort_small".to_string(),
                executed: true,
                successful: false,
                compile_time: Some(0.5),
                execution_time: Some(2.0),
                performance: None,
                metrics: BTreeMap::from([("memory_mb".to_string(), 16.0)]),
            },
            PerfTest {
                name: "sort_skipped".to_string(),
                executed: false,
                ..PerfTest::default()
            },
        ],
    });
    build
}

// Storage performance benchmarks.
//
// Run with: cargo bench
//
// Performance Targets:
// | Operation            | Target    | Description                          |
// |----------------------|-----------|--------------------------------------|
// | Create               | < 1ms     | Single issue with history            |
// | Update               | < 1ms     | Version-guarded update, one field    |
// | List (1k)            | < 10ms    | First page of 1000 issues            |
// | Timeline             | < 2ms     | History of one issue, 50 entries     |
// | Bulk status (500)    | < 50ms    | One transaction over 500 issues      |
// | Import (1k rows)     | < 500ms   | CSV import with per-row savepoints   |
// | Dashboard (10k)      | < 50ms    | Aggregates over 10000 issues         |

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use issuedb::import::import_csv_str;
use issuedb::model::{Priority, Status, User};
use issuedb::storage::{IssuePatch, ListFilters, NewIssue, NewUser, SqliteStorage};
use std::fmt::Write as _;
use std::hint::black_box;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

fn new_issue(i: usize, assignee: &User) -> NewIssue {
    NewIssue {
        title: format!("Benchmark issue {i}"),
        description: Some(format!("Description for benchmark issue {i}")),
        status: match i % 4 {
            0 => Status::Open,
            1 => Status::InProgress,
            2 => Status::Resolved,
            _ => Status::Closed,
        },
        priority: match i % 4 {
            0 => Priority::Low,
            1 => Priority::Medium,
            2 => Priority::High,
            _ => Priority::Critical,
        },
        assignee_id: (i % 3 == 0).then_some(assignee.id),
        label_ids: vec![],
    }
}

fn init_bench_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = issuedb::logging::init_logging(0, true, None);
    });
}

fn log_group_start(name: &str) {
    info!("benchmark_group_start: name={name}");
}

fn log_group_end(name: &str) {
    info!("benchmark_group_end: name={name}");
}

fn log_bench_start(name: &str) -> Instant {
    info!("benchmark_start: {name}");
    Instant::now()
}

fn log_bench_end(name: &str, started_at: Instant) {
    info!("benchmark_end: {name} duration={:?}", started_at.elapsed());
}

/// Open a fresh database with one registered user.
fn setup_db() -> (TempDir, SqliteStorage, User) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("bench.db");
    let mut storage = SqliteStorage::open(&db_path).expect("Failed to open db");
    let user = storage
        .create_user(&NewUser {
            email: "bench@example.com".to_string(),
            username: "bench".to_string(),
            full_name: None,
        })
        .expect("Failed to create user");
    (dir, storage, user)
}

/// Set up a database with a given number of issues.
fn setup_db_with_issues(count: usize) -> (TempDir, SqliteStorage, User) {
    let (dir, mut storage, user) = setup_db();
    for i in 0..count {
        storage
            .create_issue(&new_issue(i, &user), Some(user.id))
            .expect("Failed to create issue");
    }
    (dir, storage, user)
}

fn csv_batch(rows: usize) -> String {
    let mut csv = String::from("title,description,status,priority,assignee_email\n");
    for i in 0..rows {
        // Every tenth row fails validation.
        let priority = if i % 10 == 9 { "extreme" } else { "medium" };
        let _ = writeln!(csv, "Imported {i},row {i},open,{priority},bench@example.com");
    }
    csv
}

// =============================================================================
// Mutation Benchmarks
// =============================================================================

/// Benchmark single issue creation, including its `created` history entry.
fn bench_create_single(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "storage/create";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);

    group.bench_function("single", |b| {
        let bench_name = "storage/create/single";
        let bench_start = log_bench_start(bench_name);
        let (_dir, mut storage, user) = setup_db();
        let mut counter = 0usize;

        b.iter(|| {
            let issue = new_issue(counter, &user);
            storage
                .create_issue(black_box(&issue), Some(user.id))
                .unwrap();
            counter += 1;
        });
        log_bench_end(bench_name, bench_start);
    });

    group.finish();
    log_group_end(group_name);
}

/// Benchmark a version-guarded title update on one issue.
fn bench_update_issue(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "storage/update";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);

    group.bench_function("title", |b| {
        let bench_name = "storage/update/title";
        let bench_start = log_bench_start(bench_name);
        let (_dir, mut storage, user) = setup_db_with_issues(1);
        let mut version = 1;

        b.iter(|| {
            let mut patch = IssuePatch::new(version);
            patch.title = Some(format!("Renamed at v{version}"));
            let issue = storage
                .update_issue(1, black_box(&patch), Some(user.id))
                .unwrap();
            version = issue.version;
        });
        log_bench_end(bench_name, bench_start);
    });

    group.finish();
    log_group_end(group_name);
}

/// Benchmark atomic bulk status changes over growing id lists.
fn bench_bulk_status(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "storage/bulk_status";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);
    group.sample_size(20);

    for size in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let bench_name = format!("storage/bulk_status/size={size}");
            let bench_start = log_bench_start(&bench_name);
            let (_dir, mut storage, user) = setup_db_with_issues(size);
            let ids: Vec<i64> = (1..=size as i64).collect();
            let mut flip = false;

            b.iter(|| {
                let status = if flip { Status::Open } else { Status::Closed };
                flip = !flip;
                storage
                    .bulk_update_status(black_box(&ids), status, Some(user.id))
                    .unwrap();
            });
            log_bench_end(&bench_name, bench_start);
        });
    }

    group.finish();
    log_group_end(group_name);
}

/// Benchmark CSV import with a mix of valid and invalid rows.
fn bench_import(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "import/csv";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);
    group.sample_size(10);

    for rows in [100usize, 1000] {
        let csv = csv_batch(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &csv, |b, csv| {
            let bench_name = format!("import/csv/rows={rows}");
            let bench_start = log_bench_start(&bench_name);
            b.iter_with_setup(setup_db, |(_dir, mut storage, user)| {
                let result = import_csv_str(&mut storage, black_box(csv), Some(user.id)).unwrap();
                assert_eq!(result.failed, rows / 10);
            });
            log_bench_end(&bench_name, bench_start);
        });
    }

    group.finish();
    log_group_end(group_name);
}

// =============================================================================
// Query Benchmarks
// =============================================================================

/// Benchmark the first page of an unfiltered and a filtered listing.
fn bench_list_issues(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "storage/list";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);
    let (_dir, storage, user) = setup_db_with_issues(1000);

    group.bench_function("first_page", |b| {
        let bench_name = "storage/list/first_page";
        let bench_start = log_bench_start(bench_name);
        let filters = ListFilters::default();
        b.iter(|| storage.list_issues(black_box(&filters)).unwrap());
        log_bench_end(bench_name, bench_start);
    });

    group.bench_function("by_assignee", |b| {
        let bench_name = "storage/list/by_assignee";
        let bench_start = log_bench_start(bench_name);
        let filters = ListFilters {
            status: Some(Status::Open),
            assignee_id: Some(user.id),
            ..ListFilters::default()
        };
        b.iter(|| storage.list_issues(black_box(&filters)).unwrap());
        log_bench_end(bench_name, bench_start);
    });

    group.finish();
    log_group_end(group_name);
}

/// Benchmark reading the audit trail of a heavily edited issue.
fn bench_timeline(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "storage/timeline";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);

    let (_dir, mut storage, user) = setup_db_with_issues(1);
    for version in 1..50 {
        let mut patch = IssuePatch::new(version);
        patch.title = Some(format!("Edit {version}"));
        storage.update_issue(1, &patch, Some(user.id)).unwrap();
    }

    group.bench_function("50_entries", |b| {
        let bench_name = "storage/timeline/50_entries";
        let bench_start = log_bench_start(bench_name);
        b.iter(|| storage.timeline(black_box(1)).unwrap());
        log_bench_end(bench_name, bench_start);
    });

    group.finish();
    log_group_end(group_name);
}

/// Benchmark report aggregates at two sizes.
fn bench_reports(c: &mut Criterion) {
    init_bench_logging();
    let group_name = "reports";
    log_group_start(group_name);
    let mut group = c.benchmark_group(group_name);
    group.sample_size(20);

    for size in [1000usize, 10_000] {
        let (_dir, storage, _user) = setup_db_with_issues(size);

        group.bench_with_input(BenchmarkId::new("dashboard", size), &size, |b, _| {
            let bench_name = format!("reports/dashboard/size={size}");
            let bench_start = log_bench_start(&bench_name);
            b.iter(|| storage.dashboard().unwrap());
            log_bench_end(&bench_name, bench_start);
        });

        group.bench_with_input(BenchmarkId::new("resolution_time", size), &size, |b, _| {
            let bench_name = format!("reports/resolution_time/size={size}");
            let bench_start = log_bench_start(&bench_name);
            b.iter(|| storage.resolution_stats().unwrap());
            log_bench_end(&bench_name, bench_start);
        });

        group.bench_with_input(BenchmarkId::new("top_assignees", size), &size, |b, _| {
            let bench_name = format!("reports/top_assignees/size={size}");
            let bench_start = log_bench_start(&bench_name);
            b.iter(|| storage.top_assignees(black_box(10)).unwrap());
            log_bench_end(&bench_name, bench_start);
        });
    }

    group.finish();
    log_group_end(group_name);
}

// =============================================================================
// Criterion Groups
// =============================================================================

criterion_group!(
    mutation_benches,
    bench_create_single,
    bench_update_issue,
    bench_bulk_status,
    bench_import,
);

criterion_group!(
    query_benches,
    bench_list_issues,
    bench_timeline,
    bench_reports,
);

criterion_main!(mutation_benches, query_benches);

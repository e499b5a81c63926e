//! End-to-end run over a small AppScope log tree.

use std::path::Path;

use scope_core::models::Selector;
use scope_core::settings::AnalysisOptions;
use scope_data::analysis::analyze_logs;
use scope_data::packages::PackageRegistry;
use scope_data::reader::locate_log_files;
use scope_data::selector::{collect_pid_uids, monitored_apps, resolve_target, IdentityQuery};
use tempfile::TempDir;

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8" standalone="yes" ?>
<packages>
    <package name="com.example.mail" codePath="/data/app/mail.apk" userId="10021">
        <perms><item name="android.permission.INTERNET" /></perms>
    </package>
    <package name="com.example.maps" userId="10022" />
</packages>
"#;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Two sessions, three seconds. Mail runs two processes; maps one.
fn build_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "packages.xml", MANIFEST);

    write(
        dir.path(),
        "1/raw/9",
        "PID TGID UID TICKS DISP GPS WS WR 3GL 3GH CALL\n\
         300 300 10021 3 2 1 0 100 50 20 10 5 2 1 0\n\
         301 300 10021 1 1 1 1 10 0 0 0 0 0 0 0\n\
         400 400 10022 0 0 0 9 0 200 0 0 0 0 0 0\n\
         1 1 0 5 5 5 5 0 0 0 0 0 0 0 0\n",
    );
    write(
        dir.path(),
        "1/power/9.log",
        "1.0 2.0 0.5 0.25 0.1\n0.5 0.5 0 0 0\n0 0 3.0 0 0\n0.1 0 0 0 0\n9.99\n",
    );

    write(
        dir.path(),
        "1/raw/10",
        "header\n300 300 10021 1 0 0 0 1 0 0 0 0 0 0 0\n",
    );
    write(dir.path(), "1/power/10.log", "0.25 0 0 0 0\ntrailer\n");

    write(
        dir.path(),
        "2/raw/11",
        "header\n300 300 99999 0 0 0 0 7 0 0 0 0 0 0 0\n",
    );
    write(dir.path(), "2/power/11.log", "0.75 0 0 0 0\ntrailer\n");

    dir
}

#[test]
fn report_for_application_merges_its_processes() {
    let tree = build_tree();
    let source = tree.path();

    let registry = PackageRegistry::load(source).unwrap();
    let pids = collect_pid_uids(&locate_log_files(source).raw).unwrap();
    let target = resolve_target(
        IdentityQuery {
            app: Some("com.example.mail"),
            ..Default::default()
        },
        &pids,
        &registry,
        source,
    )
    .unwrap()
    .unwrap();
    assert_eq!(target.selector, Selector::Uid(10021));

    let result = analyze_logs(source, target.selector, &AnalysisOptions::default()).unwrap();
    let table = &result.table;

    assert_eq!(table.time(), &[9, 10]);
    assert_eq!(table.display(), &[110, 1]);
    assert_eq!(table.cpu_ticks()[0], vec![4, 3, 2, 1]);
    for i in 0..table.len() {
        assert!((table.total_energy()[i] - table.energy(i).total()).abs() < 1e-9);
    }
    assert!((table.total_energy()[0] - 4.85).abs() < 1e-9);
}

#[test]
fn report_for_pid_uses_first_seen_uid() {
    let tree = build_tree();
    let source = tree.path();

    let registry = PackageRegistry::load(source).unwrap();
    let pids = collect_pid_uids(&locate_log_files(source).raw).unwrap();
    let target = resolve_target(
        IdentityQuery {
            pid: Some(300),
            uid: Some(10022),
            app: Some("com.example.maps"),
        },
        &pids,
        &registry,
        source,
    )
    .unwrap()
    .unwrap();
    assert_eq!(target.uid, 10021);
    assert_eq!(target.app, "com.example.mail");

    let result = analyze_logs(source, target.selector, &AnalysisOptions::default()).unwrap();
    assert_eq!(result.table.time(), &[9, 10, 11]);
    assert_eq!(result.table.display(), &[100, 1, 7]);
}

#[test]
fn apps_listing_covers_all_pids() {
    let tree = build_tree();
    let source = tree.path();

    let registry = PackageRegistry::load(source).unwrap();
    let pids = collect_pid_uids(&locate_log_files(source).raw).unwrap();

    let apps = monitored_apps(&pids, &registry, false);
    let rows: Vec<(u32, &str)> = apps.iter().map(|a| (a.pid, a.app.as_str())).collect();
    assert_eq!(
        rows,
        vec![
            (300, "com.example.mail"),
            (301, "com.example.mail"),
            (400, "com.example.maps"),
        ]
    );

    let with_system = monitored_apps(&pids, &registry, true);
    assert_eq!(with_system[0].app, "system");
}

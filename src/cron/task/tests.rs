use super::*;
use tempfile::tempdir;

#[test]
fn round_trips_a_full_record() {
    let task = CronTask {
        id: "t1".to_string(),
        schedule: "0 9 * * *".to_string(),
        command: "echo hi".to_string(),
        enabled: true,
        last_run: 100,
        next_run: 200,
        prompt: String::new(),
    };
    let line = task.to_tsv_line();
    let parsed = CronTask::from_tsv_line(&line).unwrap();
    assert_eq!(parsed, task);
}

#[test]
fn short_records_default_trailing_fields() {
    let parsed = CronTask::from_tsv_line("t2\t0 * * * *").unwrap();
    assert!(parsed.enabled);
    assert_eq!(parsed.last_run, 0);
    assert_eq!(parsed.next_run, 0);
    assert_eq!(parsed.prompt, "");
}

#[test]
fn comment_and_blank_lines_are_skipped_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cron.tsv");
    std::fs::write(&path, "# a comment\n\nt1\t0 9 * * *\techo hi\t1\t0\t0\t\n").unwrap();

    let store = CronStore::new(&path);
    let tasks = store.load().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "t1");
}

#[test]
fn missing_file_loads_as_empty() {
    let dir = tempdir().unwrap();
    let store = CronStore::new(dir.path().join("nope.tsv"));
    assert_eq!(store.load().unwrap(), Vec::new());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let store = CronStore::new(dir.path().join("cron.tsv"));
    let tasks = vec![
        CronTask {
            id: "t1".to_string(),
            schedule: "0 9 * * *".to_string(),
            command: "echo one".to_string(),
            enabled: true,
            last_run: 0,
            next_run: 0,
            prompt: String::new(),
        },
        CronTask {
            id: "t2".to_string(),
            schedule: "@daily".to_string(),
            command: String::new(),
            enabled: false,
            last_run: 10,
            next_run: 20,
            prompt: "say hello".to_string(),
        },
    ];
    store.save(&tasks).unwrap();
    assert_eq!(store.load().unwrap(), tasks);
}

#[test]
fn next_id_continues_from_highest_existing() {
    let store = CronStore::new("/tmp/unused.tsv");
    let tasks = vec![
        CronTask {
            id: "t3".to_string(),
            schedule: String::new(),
            command: String::new(),
            enabled: true,
            last_run: 0,
            next_run: 0,
            prompt: String::new(),
        },
        CronTask {
            id: "t1".to_string(),
            schedule: String::new(),
            command: String::new(),
            enabled: true,
            last_run: 0,
            next_run: 0,
            prompt: String::new(),
        },
    ];
    assert_eq!(store.next_id(&tasks), "t4");
    assert_eq!(store.next_id(&[]), "t1");
}

//! Integration tests for the scaffold workflow
//!
//! These run the full five-step plan against a recording command runner.

mod common;

use bamboo_core::BambooConfig;
use bamboo_projects::sequencer::{NoOpObserver, StepStatus};
use bamboo_projects::{initialize, Error};
use common::{template_token, work_dir, RecordingObserver, RecordingRunner};
use std::sync::Arc;

const MODULE: &str = "github.com/XiaoLFeng/hello";

#[tokio::test]
async fn test_full_run_rewrites_and_reinitializes() {
    let (_temp, work) = work_dir();
    let config = BambooConfig::default();
    let runner = Arc::new(RecordingRunner::new());
    let observer = RecordingObserver::default();

    let target = initialize(
        MODULE,
        &work,
        &config,
        runner.clone(),
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap();

    let project = work.join("hello");
    assert_eq!(target.project_dir, project);

    let calls = runner.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0].line,
        format!("git clone --depth=1 {} {}", config.template.repo_url, project)
    );
    assert_eq!(calls[0].dir, None);
    assert_eq!(calls[1].line, "git init -b master");
    assert_eq!(calls[1].dir.as_deref(), Some(project.as_path()));
    assert_eq!(calls[2].line, "go mod tidy");
    assert_eq!(calls[2].dir.as_deref(), Some(project.as_path()));

    // Template history is gone; the fake init does not recreate it
    assert!(!project.join(".git").exists());

    let go_mod = std::fs::read_to_string(project.join("go.mod")).unwrap();
    assert_eq!(go_mod, format!("module {}\n\ngo 1.22\n", MODULE));
    let main_go = std::fs::read_to_string(project.join("cmd/server/main.go")).unwrap();
    assert!(main_go.contains(&format!("\"{}/internal\"", MODULE)));
    assert!(!main_go.contains(&template_token()));

    // Binary files keep the token
    let logo = std::fs::read(project.join("logo.png")).unwrap();
    assert_eq!(logo, template_token().into_bytes());

    assert_eq!(observer.final_statuses(5), vec![StepStatus::Done; 5]);
    assert_eq!(
        observer.started.lock().unwrap().clone().unwrap(),
        vec![
            "Clone template repository",
            "Remove template .git metadata",
            "Rewrite module path",
            "Initialize new Git repository (master)",
            "Run go mod tidy",
        ]
    );
    assert_eq!(*observer.finished.lock().unwrap(), Some(None));
}

#[tokio::test]
async fn test_status_transitions_are_ordered() {
    let (_temp, work) = work_dir();
    let runner = Arc::new(RecordingRunner::new());
    let observer = RecordingObserver::default();

    initialize(
        "example.com/acme/api.git",
        &work,
        &BambooConfig::default(),
        runner,
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap();

    let mut expected = Vec::new();
    for index in 0..5 {
        expected.push((index, StepStatus::Running));
        expected.push((index, StepStatus::Done));
    }
    assert_eq!(observer.events(), expected);
    assert!(work.join("api").is_dir());
}

#[tokio::test]
async fn test_existing_directory_fails_before_any_command() {
    let (_temp, work) = work_dir();
    std::fs::create_dir(work.join("hello")).unwrap();
    let runner = Arc::new(RecordingRunner::new());
    let observer = RecordingObserver::default();

    let err = initialize(
        MODULE,
        &work,
        &BambooConfig::default(),
        runner.clone(),
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::ProjectExists { .. }));
    assert!(err.to_string().contains("already exists"));
    assert!(runner.calls().is_empty());
    assert!(observer.started.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_invalid_module_path_runs_nothing() {
    let (_temp, work) = work_dir();
    let runner = Arc::new(RecordingRunner::new());

    let err = initialize(
        "hello",
        &work,
        &BambooConfig::default(),
        runner.clone(),
        &NoOpObserver,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert!(err.is_validation());
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_clone_failure_stops_the_run() {
    let (_temp, work) = work_dir();
    let config = BambooConfig::default();
    let clone_line = format!(
        "git clone --depth=1 {} {}",
        config.template.repo_url,
        work.join("hello")
    );
    let runner = Arc::new(RecordingRunner::new().failing(&clone_line));
    let observer = RecordingObserver::default();

    let err = initialize(
        MODULE,
        &work,
        &config,
        runner.clone(),
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        format!(
            "clone template repository failed: {} failed with exit code 1: boom",
            clone_line
        )
    );
    assert_eq!(runner.lines(), vec![clone_line]);
    assert_eq!(
        observer.final_statuses(5),
        vec![
            StepStatus::Failed,
            StepStatus::Pending,
            StepStatus::Pending,
            StepStatus::Pending,
            StepStatus::Pending,
        ]
    );
    assert_eq!(
        *observer.finished.lock().unwrap(),
        Some(Some(err.to_string()))
    );
}

#[tokio::test]
async fn test_tidy_failure_is_reported_last() {
    let (_temp, work) = work_dir();
    let runner = Arc::new(RecordingRunner::new().failing("go mod tidy"));
    let observer = RecordingObserver::default();

    let err = initialize(
        MODULE,
        &work,
        &BambooConfig::default(),
        runner,
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "run go mod tidy failed: go mod tidy failed with exit code 1: boom"
    );
    let mut expected = vec![StepStatus::Done; 4];
    expected.push(StepStatus::Failed);
    assert_eq!(observer.final_statuses(5), expected);

    // Earlier work stays on disk
    let go_mod = std::fs::read_to_string(work.join("hello/go.mod")).unwrap();
    assert!(go_mod.contains(MODULE));
}

#[tokio::test]
async fn test_custom_config_flows_into_commands() {
    let (_temp, work) = work_dir();
    let mut config = BambooConfig::default();
    config.template.clone_depth = 5;
    config.template.tidy_command = vec!["make".to_string(), "deps".to_string()];
    config.git.default_branch = "main".to_string();

    let runner = Arc::new(RecordingRunner::new());
    let observer = RecordingObserver::default();

    initialize(
        MODULE,
        &work,
        &config,
        runner.clone(),
        &observer,
        std::future::pending(),
    )
    .await
    .unwrap();

    let lines = runner.lines();
    assert!(lines[0].starts_with("git clone --depth=5 "));
    assert_eq!(lines[1], "git init -b main");
    assert_eq!(lines[2], "make deps");

    let names = observer.started.lock().unwrap().clone().unwrap();
    assert_eq!(names[3], "Initialize new Git repository (main)");
    assert_eq!(names[4], "Run make deps");
}

#[tokio::test]
async fn test_custom_tidy_failure_names_the_command() {
    let (_temp, work) = work_dir();
    let mut config = BambooConfig::default();
    config.template.tidy_command = vec!["make".to_string(), "deps".to_string()];
    let runner = Arc::new(RecordingRunner::new().failing("make deps"));

    let err = initialize(
        MODULE,
        &work,
        &config,
        runner,
        &NoOpObserver,
        std::future::pending(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "run make deps failed: make deps failed with exit code 1: boom"
    );
}

#[tokio::test]
async fn test_cancellation_during_tidy() {
    let (_temp, work) = work_dir();
    let runner = Arc::new(RecordingRunner::new().hanging("go mod tidy"));
    let observer = RecordingObserver::default();

    let waiter = runner.clone();
    let err = initialize(
        MODULE,
        &work,
        &BambooConfig::default(),
        runner.clone(),
        &observer,
        async move { waiter.hang_started.notified().await },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert_eq!(err.to_string(), "initialization cancelled");

    let mut expected = vec![StepStatus::Done; 4];
    expected.push(StepStatus::Failed);
    assert_eq!(observer.final_statuses(5), expected);
    assert_eq!(runner.lines().last().unwrap(), "go mod tidy");
}

#[cfg(unix)]
#[tokio::test]
async fn test_end_to_end_with_real_git() {
    use bamboo_projects::SystemCommandRunner;
    use std::process::Command;

    if which::which("git").is_err() {
        return;
    }

    let (_temp, work) = work_dir();
    let template = work.join("template");
    common::write_template_tree(&template);
    std::fs::remove_dir_all(template.join(".git")).unwrap();

    let git = |args: &[&str]| {
        let status = Command::new("git")
            .args([
                "-c",
                "user.name=bamboo",
                "-c",
                "user.email=bamboo@example.com",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(&template)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    };
    git(&["init", "-q"]);
    git(&["add", "."]);
    git(&["commit", "-q", "-m", "template"]);

    let mut config = BambooConfig::default();
    config.template.repo_url = format!("file://{}", template);
    config.template.tidy_command = vec!["true".to_string()];

    let projects = work.join("projects");
    std::fs::create_dir(&projects).unwrap();

    let target = initialize(
        MODULE,
        &projects,
        &config,
        Arc::new(SystemCommandRunner::new(config.command.timeout())),
        &NoOpObserver,
        std::future::pending(),
    )
    .await
    .unwrap();

    let project = target.project_dir;
    let head = std::fs::read_to_string(project.join(".git/HEAD")).unwrap();
    assert_eq!(head.trim(), "ref: refs/heads/master");
    assert!(std::fs::read_to_string(project.join("go.mod"))
        .unwrap()
        .contains(MODULE));

    // Fresh repository: no commits carried over from the template
    let log = Command::new("git")
        .args(["rev-parse", "--verify", "HEAD"])
        .current_dir(&project)
        .output()
        .unwrap();
    assert!(!log.status.success());
}

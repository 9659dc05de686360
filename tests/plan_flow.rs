mod common;

use std::sync::Arc;

use calendarBot::config::SessionConfig;
use calendarBot::error::{OrchestratorError, PlanError};
use calendarBot::service::orchestrator::Orchestrator;
use chrono::NaiveDate;
use common::{FakeCalendar, ScriptedOpenAI};

const EXTRACTION: &str =
    r#"{"Target_Task": "Select and present a deep learning paper", "Target_Time": "next Monday", "Max_Subtasks": 3}"#;

const DECOMPOSITION: &str = r#"```json
[
  {"task": "Selecting a Paper", "start": "2023-11-21T09:00:00+09:00", "end": "2023-11-21T12:00:00+09:00", "timeZone": "Asia/Seoul"},
  {"task": "Reading the Paper", "start": "2023-11-22T13:00:00+09:00", "end": "2023-11-22T16:00:00+09:00", "timeZone": "Asia/Seoul"},
  {"task": "Creating the Presentation", "start": "2023-11-24T20:00:00+09:00", "end": "2023-11-24T23:00:00+09:00", "timeZone": "Asia/Seoul"}
]
```"#;

fn bot(openai: Arc<ScriptedOpenAI>, calendar: Arc<FakeCalendar>) -> Orchestrator {
    Orchestrator::new(openai, calendar, SessionConfig::default())
        .with_today(NaiveDate::from_ymd_opt(2023, 11, 21).unwrap())
}

#[tokio::test]
async fn plan_inserts_one_event_per_subtask() {
    let openai = Arc::new(ScriptedOpenAI::new(&["3", EXTRACTION, DECOMPOSITION]));
    let calendar = Arc::new(FakeCalendar::default());
    let mut bot = bot(openai.clone(), calendar.clone());

    let reply = bot
        .prompt("I need to select and present a paper on deep learning by next Monday")
        .await
        .unwrap();

    let inserted = calendar.inserted();
    let summaries: Vec<_> = inserted.iter().map(|(_, draft)| draft.summary.as_str()).collect();
    assert_eq!(
        summaries,
        vec!["Selecting a Paper", "Reading the Paper", "Creating the Presentation"]
    );
    assert_eq!(inserted[1].1.start.time_zone, "Asia/Seoul");

    assert!(reply.starts_with("Added 3 events to your calendar:\n"));
    assert!(reply.contains("\"url\": \"https://calendar.test/event?eid=evt3\""));

    // Decomposition prompt carries the extracted triple.
    let decomposition = openai.last_prompt(2);
    assert!(decomposition.contains("Target Task: Select and present a deep learning paper"));
    assert!(decomposition.contains("Target Time: next Monday"));
    assert!(decomposition.contains("Maximum number of detailed tasks: 3"));
}

#[tokio::test]
async fn failed_insert_keeps_earlier_events_and_reports_them() {
    let openai = Arc::new(ScriptedOpenAI::new(&["3", EXTRACTION, DECOMPOSITION]));
    let calendar = Arc::new(FakeCalendar::failing_on_insert(2));
    let mut bot = bot(openai, calendar.clone());

    let err = bot.prompt("plan my paper presentation").await.unwrap_err();

    match err {
        OrchestratorError::Plan(PlanError::PartialInsert { created, failed_task, .. }) => {
            assert_eq!(created.len(), 1);
            assert_eq!(created[0].subtask.task, "Selecting a Paper");
            assert_eq!(created[0].url.as_deref(), Some("https://calendar.test/event?eid=evt1"));
            assert_eq!(failed_task, "Reading the Paper");
        }
        other => panic!("expected partial insert failure, got {other:?}"),
    }
    // No further inserts after the failure, and nothing was removed.
    assert_eq!(calendar.insert_attempts(), 2);
    assert_eq!(calendar.inserted().len(), 1);
}

#[tokio::test]
async fn subtask_during_lunch_aborts_before_any_insert() {
    let decomposition = r#"[
      {"task": "Draft", "start": "2023-11-21T09:00:00+09:00", "end": "2023-11-21T11:00:00+09:00"},
      {"task": "Review", "start": "2023-11-21T11:30:00+09:00", "end": "2023-11-21T12:30:00+09:00"}
    ]"#;
    let openai = Arc::new(ScriptedOpenAI::new(&["3", EXTRACTION, decomposition]));
    let calendar = Arc::new(FakeCalendar::default());
    let mut bot = bot(openai, calendar.clone());

    let err = bot.prompt("plan the report").await.unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Plan(PlanError::ConstraintViolated { ref task, .. }) if task == "Review"
    ));
    assert_eq!(calendar.insert_attempts(), 0);
}

#[tokio::test]
async fn extra_subtasks_beyond_the_requested_count_are_dropped() {
    let extraction = r#"{"target_task": "tidy garage", "target_time": "Sunday", "max_subtasks": 2}"#;
    let openai = Arc::new(ScriptedOpenAI::new(&["3", extraction, DECOMPOSITION]));
    let calendar = Arc::new(FakeCalendar::default());
    let mut bot = bot(openai, calendar.clone());

    let reply = bot.prompt("tidy the garage by Sunday in 2 steps").await.unwrap();

    assert_eq!(calendar.inserted().len(), 2);
    assert!(reply.starts_with("Added 2 events"));
}

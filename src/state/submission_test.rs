use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::net::TransportError;
use crate::net::test_helpers::{MockReply, MockTransport, api_over, json, text};
use serde_json::json as j;
use tokio::sync::Notify;

const TIMEOUT: Duration = Duration::from_secs(40);

fn complete_answers() -> SurveyAnswers {
    SurveyAnswers {
        work_history: "5 years backend".into(),
        skills: "Java, SQL".into(),
        personality: "Analytical".into(),
        location: "Remote".into(),
        role_preference: "Backend Developer".into(),
    }
}

fn controller(mock: &Arc<MockTransport>) -> SubmissionController {
    SubmissionController::new(api_over(mock), TIMEOUT)
}

// =============================================================
// validation
// =============================================================

#[test]
fn complete_answers_validate() {
    assert!(SubmissionController::validate(&complete_answers()).is_ok());
}

#[test]
fn validation_lists_every_blank_field_in_form_order() {
    let mut answers = complete_answers();
    answers.skills = String::new();
    answers.role_preference = "   ".into();
    let err = SubmissionController::validate(&answers).unwrap_err();
    assert_eq!(err.missing, vec![SurveyField::Skills, SurveyField::RolePreference]);
    assert_eq!(
        err.to_string(),
        "Please fill in the following required fields: Skills, Role Preference."
    );
}

#[test]
fn empty_form_names_all_five_labels() {
    let err = SubmissionController::validate(&SurveyAnswers::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Please fill in the following required fields: Work History, Skills, Personality Traits, Location Preference, Role Preference."
    );
}

#[tokio::test]
async fn invalid_submit_makes_no_request() {
    let mock = MockTransport::new();
    let ctl = controller(&mock);
    let mut answers = complete_answers();
    answers.location.clear();

    let err = ctl.submit(&answers).await.unwrap_err();
    assert!(matches!(err, SubmissionError::Validation(_)));
    assert_eq!(mock.request_count(), 0);
    assert_eq!(ctl.state(), SubmissionState::Failed(err));
}

// =============================================================
// outcomes
// =============================================================

#[tokio::test]
async fn successful_submit_posts_answers_and_succeeds() {
    let mock = MockTransport::new();
    mock.respond(json(200, j!({ "id": 1, "entryNumber": 1, "suggestions": "Backend Developer" })));
    let ctl = controller(&mock);

    let entry = ctl.submit(&complete_answers()).await.unwrap();
    assert_eq!(entry.id, 1);
    assert_eq!(entry.suggestions_text(), "Backend Developer");
    assert_eq!(ctl.state(), SubmissionState::Succeeded(entry));
    assert!(!ctl.is_busy());

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["answers"]["workHistory"], "5 years backend");
    assert_eq!(body["answers"]["rolePreference"], "Backend Developer");
}

#[tokio::test]
async fn server_error_field_is_prefixed() {
    let mock = MockTransport::new();
    mock.respond(json(500, j!({ "error": "AI service unavailable" })));
    let ctl = controller(&mock);
    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(
        err,
        SubmissionError::ServerRejected("Failed to submit form. AI service unavailable".into())
    );
}

#[tokio::test]
async fn server_body_without_error_field_reports_status() {
    let mock = MockTransport::new();
    mock.respond(json(400, j!({})));
    let ctl = controller(&mock);
    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to submit form. Server returned status 400.");
}

#[tokio::test]
async fn unparseable_failure_body_is_transport_error() {
    let mock = MockTransport::new();
    mock.respond(text(502, "<html>bad gateway</html>"));
    let ctl = controller(&mock);
    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Transport("Failed to submit form. Server returned status 502: Bad Gateway.".into())
    );
}

#[tokio::test]
async fn connection_failure_is_transport_error() {
    let mock = MockTransport::new();
    mock.push(MockReply::Fail(TransportError::Request("connection refused".into())));
    let ctl = controller(&mock);
    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(err, SubmissionError::Transport("connection refused".into()));
}

#[tokio::test]
async fn success_body_that_is_not_an_entry_is_malformed() {
    let mock = MockTransport::new();
    mock.respond(text(200, "ok"));
    let ctl = controller(&mock);
    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::MalformedResponse(_)));
}

#[tokio::test(start_paused = true)]
async fn hung_request_times_out_with_guidance() {
    let mock = MockTransport::new();
    mock.push(MockReply::Hang);
    let ctl = controller(&mock);

    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(err, SubmissionError::Timeout);
    assert!(err.to_string().starts_with("Request timed out."));
    assert!(!ctl.is_busy());
}

#[tokio::test(start_paused = true)]
async fn answer_before_deadline_wins() {
    let mock = MockTransport::new();
    let gate = Arc::new(Notify::new());
    mock.push(MockReply::Gated(Arc::clone(&gate), json(200, j!({ "id": 3 }))));
    let ctl = controller(&mock);

    let task = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.submit(&complete_answers()).await }
    });
    tokio::time::sleep(Duration::from_secs(39)).await;
    gate.notify_one();
    assert_eq!(task.await.unwrap().unwrap().id, 3);
}

// =============================================================
// concurrency
// =============================================================

#[tokio::test]
async fn second_submit_while_in_flight_is_busy() {
    let mock = MockTransport::new();
    let gate = Arc::new(Notify::new());
    mock.push(MockReply::Gated(Arc::clone(&gate), json(200, j!({ "id": 1 }))));
    let ctl = controller(&mock);
    let mut rx = ctl.subscribe();

    let first = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.submit(&complete_answers()).await }
    });
    rx.wait_for(|s| *s == SubmissionState::InFlight).await.unwrap();
    assert!(ctl.is_busy());

    let err = ctl.submit(&complete_answers()).await.unwrap_err();
    assert_eq!(err, SubmissionError::Busy);
    assert_eq!(ctl.state(), SubmissionState::InFlight);

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(mock.request_count(), 1);
}

#[tokio::test]
async fn cancel_aborts_in_flight_submission() {
    let mock = MockTransport::new();
    mock.push(MockReply::Hang);
    let ctl = controller(&mock);
    let mut rx = ctl.subscribe();

    let task = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.submit(&complete_answers()).await }
    });
    rx.wait_for(|s| *s == SubmissionState::InFlight).await.unwrap();
    ctl.cancel();

    assert_eq!(task.await.unwrap().unwrap_err(), SubmissionError::Cancelled);
    assert_eq!(ctl.state(), SubmissionState::Failed(SubmissionError::Cancelled));
    assert!(!ctl.is_busy());
}

#[tokio::test(start_paused = true)]
async fn dropped_submit_releases_the_controller() {
    let mock = MockTransport::new();
    mock.push(MockReply::Hang);
    mock.respond(json(200, j!({ "id": 7 })));
    let ctl = controller(&mock);

    let abandoned = tokio::time::timeout(Duration::from_secs(1), ctl.submit(&complete_answers())).await;
    assert!(abandoned.is_err());
    assert!(!ctl.is_busy());
    assert_eq!(ctl.state(), SubmissionState::Failed(SubmissionError::Cancelled));

    ctl.cancel();
    let entry = ctl.submit(&complete_answers()).await.unwrap();
    assert_eq!(entry.id, 7);
    assert_eq!(mock.request_count(), 2);
}

#[tokio::test]
async fn aborted_submit_task_can_be_reset() {
    let mock = MockTransport::new();
    mock.push(MockReply::Hang);
    let ctl = controller(&mock);
    let mut rx = ctl.subscribe();

    let task = tokio::spawn({
        let ctl = ctl.clone();
        async move { ctl.submit(&complete_answers()).await }
    });
    rx.wait_for(|s| *s == SubmissionState::InFlight).await.unwrap();
    task.abort();
    assert!(task.await.unwrap_err().is_cancelled());

    assert!(!ctl.is_busy());
    ctl.reset();
    assert_eq!(ctl.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn cancel_when_idle_is_a_no_op() {
    let mock = MockTransport::new();
    let ctl = controller(&mock);
    ctl.cancel();
    ctl.cancel();
    assert_eq!(ctl.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn next_attempt_after_failure_can_succeed() {
    let mock = MockTransport::new();
    mock.respond(json(500, j!({ "error": "boom" })));
    mock.respond(json(200, j!({ "id": 2 })));
    let ctl = controller(&mock);

    ctl.submit(&complete_answers()).await.unwrap_err();
    let entry = ctl.submit(&complete_answers()).await.unwrap();
    assert_eq!(entry.id, 2);
    assert!(matches!(ctl.state(), SubmissionState::Succeeded(_)));
}

#[tokio::test]
async fn reset_returns_to_idle() {
    let mock = MockTransport::new();
    mock.respond(json(200, j!({ "id": 1 })));
    let ctl = controller(&mock);
    ctl.submit(&complete_answers()).await.unwrap();
    ctl.reset();
    assert_eq!(ctl.state(), SubmissionState::Idle);
    assert!(!ctl.state().is_busy());
}

#[test]
fn api_errors_map_onto_submission_errors() {
    let rejected = ApiError::ServerRejected { status: 400, message: "nope".into() };
    assert_eq!(SubmissionError::from(rejected), SubmissionError::ServerRejected("nope".into()));
    assert_eq!(
        SubmissionError::from(ApiError::Transport("down".into())),
        SubmissionError::Transport("down".into())
    );
}

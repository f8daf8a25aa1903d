use super::*;
use shared::domain::{NodeId, NodeKind, User, UserId};

use crate::fake_api::{auth_response, Call, FakeApi};

fn session() -> Session {
    Session {
        token: "token-alice".to_string(),
        user: User {
            id: UserId(7),
            username: "alice".to_string(),
        },
    }
}

fn reply_target() -> ReplyTarget {
    ReplyTarget {
        parent_id: NodeId(2),
        parent_type: NodeKind::Operation,
    }
}

#[tokio::test]
async fn divide_by_zero_never_reaches_the_api() {
    let api = FakeApi::ok();
    let mut form = OperationForm::new(reply_target());
    form.open();
    form.operation_type = OperationType::Divide;
    form.operand_input = "0".to_string();
    let mut refreshed = false;

    let outcome = form
        .submit(&api, Some(&session()), || refreshed = true)
        .await;

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(api.calls().is_empty());
    assert_eq!(form.error(), Some("Division by zero is not allowed"));
    assert!(!refreshed);
    assert!(form.is_open());
    assert_eq!(form.operand_input, "0");
}

#[tokio::test]
async fn negative_zero_divisor_is_also_rejected() {
    let api = FakeApi::ok();
    let mut form = OperationForm::new(reply_target());
    form.operation_type = OperationType::Divide;
    form.operand_input = "-0.0".to_string();

    let outcome = form.submit(&api, Some(&session()), || {}).await;

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn non_numeric_operand_never_reaches_the_api() {
    let api = FakeApi::ok();
    let mut form = OperationForm::new(reply_target());
    form.operand_input = "five".to_string();

    let outcome = form.submit(&api, Some(&session()), || {}).await;

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert!(api.calls().is_empty());
    assert_eq!(form.error(), Some("Please enter a valid number"));
}

#[tokio::test]
async fn non_numeric_starting_number_never_reaches_the_api() {
    let api = FakeApi::ok();
    for input in ["", "   ", "abc", "NaN", "inf"] {
        let mut form = StartingNumberForm::new();
        form.input = input.to_string();

        let outcome = form.submit(&api, Some(&session()), || {}).await;

        assert_eq!(outcome, SubmitOutcome::Rejected, "input {input:?}");
        assert_eq!(form.error(), Some("Please enter a valid number"));
    }
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn zero_is_a_valid_operand_for_other_operators() {
    let api = FakeApi::ok();
    let mut form = OperationForm::new(reply_target());
    form.operation_type = OperationType::Multiply;
    form.operand_input = "0".to_string();

    let outcome = form.submit(&api, Some(&session()), || {}).await;

    assert_eq!(outcome, SubmitOutcome::Created);
}

#[tokio::test]
async fn successful_reply_clears_input_closes_form_and_refreshes() {
    let api = FakeApi::ok();
    let mut form = OperationForm::new(reply_target());
    form.open();
    form.operation_type = OperationType::Subtract;
    form.operand_input = " 2.5 ".to_string();
    let mut refreshed = 0;

    let outcome = form
        .submit(&api, Some(&session()), || refreshed += 1)
        .await;

    assert_eq!(outcome, SubmitOutcome::Created);
    assert_eq!(refreshed, 1);
    assert!(form.operand_input.is_empty());
    assert!(!form.is_open());
    assert_eq!(form.error(), None);
    assert_eq!(
        api.calls(),
        vec![Call::Operation {
            bearer: Some("token-alice".to_string()),
            request: CreateOperationRequest {
                parent_id: NodeId(2),
                parent_type: NodeKind::Operation,
                operation_type: OperationType::Subtract,
                right_operand: 2.5,
            },
        }]
    );
}

#[tokio::test]
async fn failed_reply_keeps_input_and_shows_server_message() {
    let api = FakeApi::ok().with_create_result(Err(ClientError::Validation(
        "Parent not found".to_string(),
    )));
    let mut form = OperationForm::new(reply_target());
    form.open();
    form.operand_input = "4".to_string();
    let mut refreshed = false;

    let outcome = form
        .submit(&api, Some(&session()), || refreshed = true)
        .await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert!(!refreshed);
    assert_eq!(form.error(), Some("Parent not found"));
    assert_eq!(form.operand_input, "4");
    assert!(form.is_open());
    assert!(!form.is_submitting());
}

#[tokio::test]
async fn network_failure_shows_generic_fallback() {
    let api = FakeApi::ok().with_create_result(Err(ClientError::Network(
        "connection refused".to_string(),
    )));
    let mut form = StartingNumberForm::new();
    form.input = "42".to_string();

    let outcome = form.submit(&api, Some(&session()), || {}).await;

    assert_eq!(outcome, SubmitOutcome::Failed);
    assert_eq!(form.error(), Some("An error occurred"));
    assert_eq!(form.input, "42");
}

#[tokio::test]
async fn starting_number_success_clears_input() {
    let api = FakeApi::ok();
    let mut form = StartingNumberForm::new();
    form.input = "42".to_string();
    let mut refreshed = false;

    let outcome = form
        .submit(&api, Some(&session()), || refreshed = true)
        .await;

    assert_eq!(outcome, SubmitOutcome::Created);
    assert!(refreshed);
    assert!(form.input.is_empty());
    assert_eq!(
        api.calls(),
        vec![Call::StartingNumber {
            bearer: Some("token-alice".to_string()),
            number: 42.0,
        }]
    );
}

#[test]
fn submit_is_refused_while_a_request_is_in_flight() {
    let mut form = StartingNumberForm::new();
    form.input = "1".to_string();

    assert!(form.begin_submit().is_ok());
    assert!(form.is_submitting());
    assert_eq!(form.submit_label(), "Creating…");
    assert_eq!(form.begin_submit(), Err(InputError::Busy));
    assert_eq!(form.error(), None);

    form.finish(Ok(CreatedNode::default()), || {});
    assert!(!form.is_submitting());
    assert_eq!(form.submit_label(), "Create starting number");
}

#[test]
fn cancel_hides_form_and_clears_error_and_input() {
    let mut form = OperationForm::new(reply_target());
    form.open();
    form.operand_input = "x".to_string();
    assert!(form.begin_submit().is_err());
    assert!(form.error().is_some());

    form.cancel();

    assert!(!form.is_open());
    assert_eq!(form.error(), None);
    assert!(form.operand_input.is_empty());
}

#[test]
fn operation_form_defaults_to_add() {
    let form = OperationForm::new(reply_target());
    assert_eq!(form.operation_type, OperationType::Add);
    assert_eq!(form.target(), reply_target());
    assert!(!form.is_open());
    assert_eq!(form.submit_label(), "Submit");
}

#[tokio::test]
async fn login_rejection_shows_exact_server_message() {
    let api = FakeApi::ok().with_auth_result(Err(ClientError::Auth(
        "Invalid credentials".to_string(),
    )));
    let mut form = AuthForm::new(AuthMode::Login);
    form.username = "testuser".to_string();
    form.password = "wrongpassword".to_string();

    let response = form.submit(&api).await;

    assert!(response.is_none());
    assert_eq!(form.error(), Some("Invalid credentials"));
    assert_eq!(form.username, "testuser");
}

#[tokio::test]
async fn login_calls_api_with_entered_credentials() {
    let api = FakeApi::ok().with_auth_result(Ok(auth_response("testuser")));
    let mut form = AuthForm::new(AuthMode::Login);
    form.username = "testuser".to_string();
    form.password = "password123".to_string();

    let response = form.submit(&api).await.expect("auth response");

    assert_eq!(response.user.username, "testuser");
    assert_eq!(
        api.calls(),
        vec![Call::Login(Credentials {
            username: "testuser".to_string(),
            password: "password123".to_string(),
        })]
    );
    assert!(form.username.is_empty());
    assert!(form.password.is_empty());
}

#[tokio::test]
async fn register_mode_calls_register_endpoint() {
    let api = FakeApi::ok();
    let mut form = AuthForm::new(AuthMode::Register);
    form.username = "newbie".to_string();
    form.password = "longenough".to_string();

    assert!(form.submit(&api).await.is_some());
    assert!(matches!(api.calls().as_slice(), [Call::Register(_)]));
}

#[tokio::test]
async fn short_password_is_rejected_locally() {
    let api = FakeApi::ok();
    let mut form = AuthForm::new(AuthMode::Register);
    form.username = "newbie".to_string();
    form.password = "12345".to_string();

    assert!(form.submit(&api).await.is_none());
    assert!(api.calls().is_empty());
    assert_eq!(form.error(), Some("Password must be at least 6 characters"));
}

#[test]
fn auth_labels_follow_mode() {
    let mut form = AuthForm::new(AuthMode::Register);
    assert_eq!(form.submit_label(), "Create account");
    assert_eq!(form.mode().title(), "Create your account");
    form.set_mode(AuthMode::Login);
    assert_eq!(form.submit_label(), "Sign in");
    form.username = "a".to_string();
    form.password = "secret1".to_string();
    assert!(form.begin_submit().is_ok());
    assert_eq!(form.submit_label(), "Please wait…");
}

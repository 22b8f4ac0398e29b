//! End-to-end dispatch flows against the mock provider.

use kasirise_core::{
    describe, AgentId, AssessmentQuestion, Conversation, Dispatcher, Role, CONNECTION_APOLOGY,
};
use kasirise_llm::{Error, GenerateResponse, MockProvider};
use std::sync::Arc;

fn dispatcher(mock: &Arc<MockProvider>) -> Dispatcher {
    Dispatcher::new(mock.clone()).with_model("gemini-2.5-flash")
}

/// Mentor flow: welcome -> user question -> assistant guidance, with the
/// dispatch receiving only the prior transcript.
#[tokio::test]
async fn mentor_session_round_trip() {
    let mock = Arc::new(MockProvider::new());
    mock.push_response(GenerateResponse::text(
        "What does it mean to split something into equal parts?",
    ));
    let dispatcher = dispatcher(&mock);

    let descriptor = describe(AgentId::Mentor);
    let mut conversation = Conversation::start(descriptor);
    assert_eq!(conversation.len(), 1);

    let user_message = "I don't understand fractions";
    let history = conversation.turns().to_vec();
    conversation.push_user(user_message);

    let turn = dispatcher
        .dispatch(conversation.agent(), &history, user_message)
        .await;
    conversation.push_assistant(turn);

    // The upstream request saw exactly the welcome turn plus the new message.
    let request = mock.last_request().unwrap();
    assert_eq!(request.messages.len(), 2);
    assert_eq!(request.messages[0].content, descriptor.welcome_message);
    assert_eq!(request.messages[1].content, user_message);

    let turns = conversation.turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].content, descriptor.welcome_message);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[1].content, user_message);
    assert_eq!(turns[2].role, Role::Assistant);
    assert_eq!(
        turns[2].content,
        "What does it mean to split something into equal parts?"
    );
}

/// Assessment flow: the payload is carried verbatim and decodes into three
/// labelled options; the explanation stays out of the rendered view.
#[tokio::test]
async fn assessment_session_round_trip() {
    let mock = Arc::new(MockProvider::new());
    let payload = r#"{"question":"2,4,8,16,?","options":["24","32","20"],"explanation":"doubling"}"#;
    mock.push_response(GenerateResponse::text(payload));
    let dispatcher = dispatcher(&mock);

    let mut conversation = Conversation::start(describe(AgentId::Assessment));
    let history = conversation.turns().to_vec();
    conversation.push_user("Start");

    let turn = dispatcher
        .dispatch(AgentId::Assessment, &history, "Start")
        .await;
    assert!(turn.is_json_assessment);
    assert_eq!(turn.content, payload);
    conversation.push_assistant(turn);

    let question = AssessmentQuestion::from_turn(&conversation.turns()[2]).unwrap();
    assert_eq!(question.question, "2,4,8,16,?");
    assert_eq!(question.options.len(), 3);

    let labelled: Vec<String> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, opt)| format!("{}. {}", kasirise_core::option_label(i), opt))
        .collect();
    assert_eq!(labelled, vec!["A. 24", "B. 32", "C. 20"]);
    // Grading data is decoded but not part of the displayable options
    assert!(!labelled.iter().any(|l| l.contains("doubling")));
}

/// A failed upstream call still grows the transcript by a normal assistant
/// turn, leaving the session open for retry.
#[tokio::test]
async fn upstream_failure_keeps_session_alive() {
    let mock = Arc::new(MockProvider::new());
    mock.push_error(Error::Api("boom".to_string()));
    mock.push_response(GenerateResponse::text("Back online. Where were we?"));
    let dispatcher = dispatcher(&mock);

    let mut conversation = Conversation::start(describe(AgentId::Mentor));

    let history = conversation.turns().to_vec();
    conversation.push_user("help");
    let turn = dispatcher.dispatch(AgentId::Mentor, &history, "help").await;
    assert!(turn.is_error);
    assert_eq!(turn.content, CONNECTION_APOLOGY);
    conversation.push_assistant(turn);

    // Retry succeeds on the same conversation
    let history = conversation.turns().to_vec();
    conversation.push_user("help again");
    let turn = dispatcher
        .dispatch(AgentId::Mentor, &history, "help again")
        .await;
    assert!(!turn.is_error);
    conversation.push_assistant(turn);

    assert_eq!(conversation.len(), 5);
    assert_eq!(conversation.turns()[0].content, describe(AgentId::Mentor).welcome_message);
}

/// Malformed assessment payloads degrade at render time, not dispatch time.
#[tokio::test]
async fn malformed_assessment_payload_degrades_to_text() {
    let mock = Arc::new(MockProvider::new());
    mock.push_response(GenerateResponse::text("Sorry, here is your puzzle: 2,4,8"));
    let dispatcher = dispatcher(&mock);

    let turn = dispatcher.dispatch(AgentId::Assessment, &[], "Start").await;
    assert!(turn.is_json_assessment);
    assert!(!turn.is_error);
    // Render-time decode fails; the literal text remains available
    assert!(AssessmentQuestion::from_turn(&turn).is_none());
    assert_eq!(turn.content, "Sorry, here is your puzzle: 2,4,8");
}
